//! Error types for EconGraph.

use thiserror::Error;

/// Result type alias using `AnalysisError`.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Failures reported by a data provider.
///
/// A provider failure always aborts the analysis: falling back to empty data
/// would report a false "clean" verdict.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Backing store is unreachable.
    #[error("Data provider unavailable: {0}")]
    Unavailable(String),

    /// A query was rejected or failed while running.
    #[error("Data provider query failed: {0}")]
    Query(String),

    /// Rows came back in a shape that could not be decoded.
    #[error("Data provider returned undecodable rows: {0}")]
    Decode(String),

    /// A referenced account or guild does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Data provider failure.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The analysis deadline passed before computation finished.
    #[error("Analysis deadline exceeded")]
    DeadlineExceeded,

    /// The analysis was cancelled by its caller.
    #[error("Analysis cancelled")]
    Cancelled,

    /// Timeout waiting for an analysis to complete.
    #[error("Timeout waiting for analysis after {0:?}")]
    Timeout(std::time::Duration),

    /// Kernel not found in registry.
    #[error("Kernel not found: {0}")]
    KernelNotFound(String),

    /// Kernel already registered.
    #[error("Kernel already registered: {0}")]
    KernelAlreadyRegistered(String),

    /// Input validation failed.
    #[error("Input validation failed: {0}")]
    ValidationError(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AnalysisError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        AnalysisError::ValidationError(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        AnalysisError::InternalError(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        AnalysisError::ConfigError(msg.into())
    }

    /// Create a kernel not found error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        AnalysisError::KernelNotFound(id.into())
    }

    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::Timeout(_)
                | AnalysisError::DeadlineExceeded
                | AnalysisError::Provider(ProviderError::Unavailable(_))
        )
    }

    /// Returns true if this error came from the data provider.
    #[must_use]
    pub fn is_provider_error(&self) -> bool {
        matches!(self, AnalysisError::Provider(_))
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(err: serde_json::Error) -> Self {
        AnalysisError::SerializationError(err.to_string())
    }
}
