//! Core kernel traits.
//!
//! - `AnalysisKernel`: base trait carrying metadata
//! - `BatchKernel`: async request/response execution over in-memory input

use crate::error::{AnalysisError, Result};
use crate::kernel::KernelMetadata;
use async_trait::async_trait;
use std::fmt::Debug;
use std::time::Duration;

/// Base trait for all analysis kernels.
pub trait AnalysisKernel: Send + Sync + Debug {
    /// Returns the kernel metadata.
    fn metadata(&self) -> &KernelMetadata;

    /// Returns the kernel ID.
    fn id(&self) -> &str {
        &self.metadata().id
    }

    /// Validate kernel configuration.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Trait for kernels that take a complete input and produce a complete output.
///
/// # Type Parameters
///
/// - `I`: Input type
/// - `O`: Output type
#[async_trait]
pub trait BatchKernel<I, O>: AnalysisKernel
where
    I: Send + Sync,
    O: Send + Sync,
{
    /// Execute the kernel with the given input.
    async fn execute(&self, input: I) -> Result<O>;

    /// Validate the input before execution.
    ///
    /// Override to provide custom input validation.
    fn validate_input(&self, _input: &I) -> Result<()> {
        Ok(())
    }

    /// Execute the kernel with a timeout.
    async fn execute_with_timeout(&self, input: I, timeout: Duration) -> Result<O>
    where
        I: 'async_trait,
    {
        match tokio::time::timeout(timeout, self.execute(input)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(AnalysisError::Timeout(timeout)),
        }
    }
}
