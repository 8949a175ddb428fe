//! Kernel metadata.
//!
//! Every analysis kernel carries a `KernelMetadata` describing its identity,
//! domain and cost profile. The registry and the CLI catalogue read it.

use crate::domain::Domain;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kernel metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelMetadata {
    /// Unique kernel identifier (e.g., "graph/pagerank").
    pub id: String,

    /// Analytical domain.
    pub domain: Domain,

    /// Human-readable description.
    pub description: String,

    /// Worst-case complexity, as documentation (e.g., "O(iterations * edges)").
    pub complexity: String,

    /// Version of the kernel implementation.
    pub version: u32,
}

impl KernelMetadata {
    /// Create metadata for a kernel.
    #[must_use]
    pub fn new(id: impl Into<String>, domain: Domain) -> Self {
        Self {
            id: id.into(),
            domain,
            description: String::new(),
            complexity: String::new(),
            version: 1,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the documented complexity.
    #[must_use]
    pub fn with_complexity(mut self, complexity: impl Into<String>) -> Self {
        self.complexity = complexity.into();
        self
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Kernel name without its domain prefix ("graph/pagerank" -> "pagerank").
    #[must_use]
    pub fn name(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }
}

impl fmt::Display for KernelMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{} ({})", self.id, self.version, self.domain)
    }
}
