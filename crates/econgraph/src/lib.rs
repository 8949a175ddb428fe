//! # EconGraph
//!
//! Relationship network analysis for virtual-economy fraud detection.
//!
//! Given a target account, EconGraph fetches its 1-hop and 2-hop transaction
//! neighborhood, builds an undirected weighted graph and runs a fixed set of
//! kernels over it to surface collusion, circular flows and coordinated
//! multi-account behavior.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use econgraph::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> econgraph::core::error::Result<()> {
//! let provider = InMemoryProvider::from_file("snapshot.json")?;
//! let analyzer = NetworkAnalyzer::new(Arc::new(provider));
//!
//! let network = analyzer.analyze("user-42", None).await?;
//! for cluster in &network.suspicious_clusters {
//!     println!("{} scored {}", cluster.cluster_id, cluster.suspicion_score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Domains
//!
//! - **GraphAnalytics**: relationship strength, PageRank, local-move communities, circular flows
//! - **Compliance**: suspicious cluster rules, guild correlation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use econgraph_compliance as compliance;
pub use econgraph_core as core;
pub use econgraph_graph as graph;

pub mod network;
pub mod provider;
pub mod snapshot;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use econgraph_core::prelude::*;

    pub use crate::network::{NetworkAnalyzer, NetworkStats, RelationshipNetwork};
    pub use crate::provider::DataProvider;
    pub use crate::snapshot::{InMemoryProvider, Snapshot};
}

/// Version information.
pub mod version {
    /// Crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Kernel catalog providing an overview of all available kernels.
pub mod catalog {
    use econgraph_core::domain::Domain;

    /// Domain information.
    #[derive(Debug, Clone)]
    pub struct DomainInfo {
        /// Domain enum value.
        pub domain: Domain,
        /// Human-readable name.
        pub name: &'static str,
        /// Description.
        pub description: &'static str,
        /// Number of kernels.
        pub kernel_count: usize,
    }

    /// Get all domain information.
    pub fn domains() -> Vec<DomainInfo> {
        vec![
            DomainInfo {
                domain: Domain::GraphAnalytics,
                name: "Graph Analytics",
                description: "Relationship strength, PageRank, local-move communities, circular flows",
                kernel_count: 4,
            },
            DomainInfo {
                domain: Domain::Compliance,
                name: "Compliance",
                description: "Suspicious cluster rules and guild correlation",
                kernel_count: 2,
            },
        ]
    }

    /// Get total kernel count across all domains.
    pub fn total_kernel_count() -> usize {
        domains().iter().map(|d| d.kernel_count).sum()
    }
}

/// Register every kernel into a registry.
///
/// # Errors
///
/// Returns an error if any kernel registration fails.
pub fn register_all(
    registry: &econgraph_core::registry::KernelRegistry,
) -> econgraph_core::error::Result<()> {
    econgraph_graph::register_all(registry)?;
    econgraph_compliance::register_all(registry)?;
    Ok(())
}
