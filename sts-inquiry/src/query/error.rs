//! Query error types.

use thiserror::Error;

/// Errors returned to search callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Nothing has been published yet. Callers should report the service
    /// as temporarily unavailable rather than failed.
    #[error("Service not ready: no data published yet")]
    NotReady,

    #[error("Invalid cluster size {requested} (available: 1 to {max})")]
    InvalidClusterSize { requested: usize, max: usize },

    #[error("Too many sort keys: {given} (at most {max})")]
    TooManySortKeys { given: usize, max: usize },

    #[error("Invalid page {0} (pages start at 1)")]
    InvalidPage(usize),
}

impl SearchError {
    /// Whether the caller should retry later.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, SearchError::NotReady)
    }
}
