//! Pipeline error types.

use thiserror::Error;

/// Errors raised while turning source records into a world and its tables.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The source returned no regions at all.
    ///
    /// Publishing an empty world would be worse than keeping stale data, so
    /// the refresh attempt is abandoned.
    #[error("No regions found in landscape")]
    NoRegionsFound,

    /// The configured maximum cluster size is unusable.
    #[error("Invalid maximum cluster size {0} (must be at least 1)")]
    InvalidClusterSize(usize),
}
