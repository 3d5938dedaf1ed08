//! Source error types.

use thiserror::Error;

/// Errors reported by landscape and player sources.
///
/// All variants are recoverable: the refresh that hit them is abandoned and
/// retried on the next tick.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport level failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The source answered, but not with what was asked for.
    #[error("Failed to fetch {what}: {reason}")]
    Fetch { what: String, reason: String },

    /// A line of a text format could not be parsed.
    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// Structured landscape data could not be decoded.
    #[error("Invalid landscape data: {0}")]
    Json(#[from] serde_json::Error),

    /// The source requires a new login before it answers again.
    #[error("Authentication required: {0}")]
    Authentication(String),
}

impl SourceError {
    /// Whether the caller should re-authenticate before the next attempt.
    pub fn is_authentication(&self) -> bool {
        matches!(self, SourceError::Authentication(_))
    }
}
