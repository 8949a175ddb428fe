//! # EconGraph Compliance
//!
//! Rule-based fraud heuristics layered on top of the graph kernels.
//!
//! ## Kernels
//!
//! - `SuspiciousClusterDetector` - high-frequency, high-amount and new-account burst rules
//!   over a target's direct relationships
//! - `GuildCorrelationAnalyzer` - circular pairs and high-frequency members among a
//!   guild's active members

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clusters;
pub mod guild;
pub mod messages;
pub mod types;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::clusters::*;
    pub use crate::guild::*;
    pub use crate::messages::*;
    pub use crate::types::*;
}

/// Register all compliance kernels with a registry.
pub fn register_all(
    registry: &econgraph_core::registry::KernelRegistry,
) -> econgraph_core::error::Result<()> {
    use econgraph_core::traits::AnalysisKernel;

    tracing::info!("Registering compliance kernels");

    registry.register_metadata(clusters::SuspiciousClusterDetector::new().metadata().clone())?;
    registry.register_metadata(guild::GuildCorrelationAnalyzer::new().metadata().clone())?;

    tracing::info!("Registered 2 compliance kernels");
    Ok(())
}
