//! # EconGraph Core
//!
//! Core abstractions shared by the EconGraph analytics kernels.
//!
//! This crate provides:
//! - Domain and kernel metadata definitions
//! - Trait definitions for analysis kernels
//! - Kernel registry used for discovery
//! - Error types for analysis and data-provider failures
//! - The versioned detection-threshold configuration
//! - Logging initialization and deadline/cancellation handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod deadline;
pub mod domain;
pub mod error;
pub mod kernel;
pub mod logging;
pub mod registry;
pub mod traits;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{AnalysisConfig, DetectionThresholds, RuntimeConfig};
    pub use crate::deadline::DeadlineContext;
    pub use crate::domain::Domain;
    pub use crate::error::{AnalysisError, ProviderError, Result};
    pub use crate::kernel::KernelMetadata;
    pub use crate::logging::{LogConfig, LogLevel};
    pub use crate::registry::{KernelRegistry, RegistryStats};
    pub use crate::traits::{AnalysisKernel, BatchKernel};
}

/// Divide two quantities, returning zero instead of NaN or infinity.
///
/// Every ratio that feeds a suspicion score goes through this helper so a
/// degenerate input (empty amount set, zero-length time span) can never
/// poison score comparisons or sorting.
#[inline]
#[must_use]
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_guards_zero_denominator() {
        assert_eq!(ratio(10.0, 0.0), 0.0);
        assert_eq!(ratio(0.0, 0.0), 0.0);
        assert_eq!(ratio(f64::NAN, 2.0), 0.0);
        assert_eq!(ratio(1.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_ratio_normal_division() {
        assert!((ratio(3.0, 4.0) - 0.75).abs() < f64::EPSILON);
    }
}
