//! Refresh error types.

use thiserror::Error;

use crate::pipeline::PipelineError;
use crate::source::SourceError;

/// Why a refresh tick failed.
///
/// These never escape the scheduler loop. The tick that produced one is
/// logged with its cause chain and the next tick runs as planned.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The landscape could not be fetched; the previous snapshot is kept.
    #[error("Failed to fetch landscape")]
    Landscape(#[source] SourceError),

    /// The player list could not be fetched; the previous snapshot is kept.
    #[error("Failed to fetch player list")]
    Players(#[source] SourceError),

    /// The new landscape was published with empty occupancy because the
    /// player list could not be fetched.
    #[error("Published new landscape without occupancy, player list unavailable")]
    PlayersUnavailableAfterPublish(#[source] SourceError),

    /// The landscape could not be turned into a world; the previous
    /// snapshot is kept.
    #[error("Landscape pipeline failed")]
    Pipeline(#[from] PipelineError),

    /// The blocking refresh task did not complete.
    #[error("Refresh task panicked: {0}")]
    TaskPanicked(String),
}

impl RefreshError {
    /// Whether the refresh still published a snapshot.
    pub fn published(&self) -> bool {
        matches!(self, RefreshError::PlayersUnavailableAfterPublish(_))
    }
}

/// Render an error and its chain of sources on one line.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": caused by: ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_chain_walks_sources() {
        let error = RefreshError::Players(SourceError::Fetch {
            what: "player list".to_string(),
            reason: "connection refused".to_string(),
        });

        assert_eq!(
            error_chain(&error),
            "Failed to fetch player list: caused by: Failed to fetch player list: connection refused"
        );
    }

    #[test]
    fn test_only_fallback_publish_counts_as_published() {
        let source = || SourceError::Http("down".to_string());

        assert!(RefreshError::PlayersUnavailableAfterPublish(source()).published());
        assert!(!RefreshError::Players(source()).published());
        assert!(!RefreshError::from(PipelineError::NoRegionsFound).published());
    }
}
