//! # EconGraph Graph Analytics
//!
//! Transaction-graph kernels used by the relationship network analysis.
//!
//! ## Kernels
//!
//! - `RelationshipStrengthScorer` - bounded closeness score per account pair
//! - `PageRank` - fixed-iteration power iteration over the undirected graph
//! - `LocalMoveCommunities` - single-level greedy communities with suspicion scoring
//! - `CycleDetector` - bounded DFS for circular flows of 3 or more accounts
//!
//! All kernels work on a [`graph::TransactionGraph`] built per analysis by
//! [`graph::GraphBuilder`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod centrality;
pub mod community;
pub mod cycles;
pub mod graph;
pub mod messages;
pub mod strength;
pub mod types;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::centrality::*;
    pub use crate::community::*;
    pub use crate::cycles::*;
    pub use crate::graph::*;
    pub use crate::messages::*;
    pub use crate::strength::*;
    pub use crate::types::*;
}

/// Register all graph kernels with a registry.
pub fn register_all(
    registry: &econgraph_core::registry::KernelRegistry,
) -> econgraph_core::error::Result<()> {
    use econgraph_core::traits::AnalysisKernel;

    tracing::info!("Registering graph analytics kernels");

    registry.register_metadata(strength::RelationshipStrengthScorer::default().metadata().clone())?;
    registry.register_metadata(centrality::PageRank::new().metadata().clone())?;
    registry.register_metadata(community::LocalMoveCommunities::new().metadata().clone())?;
    registry.register_metadata(cycles::CycleDetector::new().metadata().clone())?;

    tracing::info!("Registered 4 graph analytics kernels");
    Ok(())
}
