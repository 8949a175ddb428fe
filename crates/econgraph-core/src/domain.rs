//! Domain definitions for kernel categorization.
//!
//! Kernels are grouped by the kind of signal they produce:
//! - Structural graph analytics (centrality, communities, cycles)
//! - Compliance heuristics (rule-based clusters, guild correlation)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Analytical domain for kernel categorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Domain {
    /// Graph analytics: graph construction, relationship strength, PageRank,
    /// community detection, cycle enumeration
    GraphAnalytics,

    /// Compliance: rule-based suspicious clusters and guild correlation
    Compliance,

    /// Core: orchestration and infrastructure
    Core,
}

impl Domain {
    /// All available domains.
    pub const ALL: &'static [Domain] = &[Domain::GraphAnalytics, Domain::Compliance, Domain::Core];

    /// Returns the domain name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Domain::GraphAnalytics => "GraphAnalytics",
            Domain::Compliance => "Compliance",
            Domain::Core => "Core",
        }
    }

    /// Short feature-style name used on the command line.
    #[must_use]
    pub const fn short_name(&self) -> &'static str {
        match self {
            Domain::GraphAnalytics => "graph",
            Domain::Compliance => "compliance",
            Domain::Core => "core",
        }
    }

    /// Parse a domain from its name or short name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let lower = s.to_lowercase();
        Domain::ALL
            .iter()
            .copied()
            .find(|d| d.as_str().to_lowercase() == lower || d.short_name() == lower)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
