//! Deadline and cancellation handling.
//!
//! Graph algorithms run synchronously once their data is in memory. A
//! `DeadlineContext` travels with them and is polled between iteration and
//! traversal steps so a pathological graph or an abandoned request stops
//! early instead of occupying a worker thread.
//!
//! # Example
//!
//! ```rust
//! use econgraph_core::deadline::DeadlineContext;
//! use std::time::Duration;
//!
//! let deadline = DeadlineContext::new(Duration::from_secs(5));
//! assert!(deadline.check().is_ok());
//!
//! deadline.cancel();
//! assert!(deadline.check().is_err());
//! ```

use crate::error::{AnalysisError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Deadline plus a shared cancellation flag.
///
/// Clones share the cancellation flag, so cancelling any clone stops every
/// computation holding one.
#[derive(Debug, Clone)]
pub struct DeadlineContext {
    /// Absolute deadline, `None` for unbounded.
    deadline: Option<Instant>,
    /// Original timeout
    original_timeout: Option<Duration>,
    /// When the context was created
    created_at: Instant,
    cancelled: Arc<AtomicBool>,
}

impl DeadlineContext {
    /// Create a context that expires after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let now = Instant::now();
        Self {
            deadline: now.checked_add(timeout),
            original_timeout: Some(timeout),
            created_at: now,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a context with no deadline; it can still be cancelled.
    pub fn unbounded() -> Self {
        Self {
            deadline: None,
            original_timeout: None,
            created_at: Instant::now(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal cancellation to every holder of this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Check if deadline has passed
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Remaining time until the deadline; `Duration::MAX` when unbounded.
    pub fn remaining(&self) -> Duration {
        match self.deadline {
            Some(d) => d.saturating_duration_since(Instant::now()),
            None => Duration::MAX,
        }
    }

    /// Get the original timeout
    pub fn original_timeout(&self) -> Option<Duration> {
        self.original_timeout
    }

    /// Get elapsed time since context creation
    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Return an error if the context was cancelled or its deadline passed.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(AnalysisError::Cancelled);
        }
        if self.is_expired() {
            tracing::warn!(elapsed = ?self.elapsed(), "Analysis deadline exceeded");
            return Err(AnalysisError::DeadlineExceeded);
        }
        Ok(())
    }
}

impl Default for DeadlineContext {
    fn default() -> Self {
        Self::unbounded()
    }
}
