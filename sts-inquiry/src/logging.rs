//! Tracing subscriber setup.
//!
//! Log lines always go to stderr. With a log directory configured they are
//! also written to a daily rolling file through a non-blocking writer, whose
//! [`WorkerGuard`] must stay alive for buffered lines to be flushed.

use std::io;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// File name prefix of rolling log files.
pub const LOG_FILE_PREFIX: &str = "sts-inquiry.log";

/// Build the filter: `RUST_LOG` if set, otherwise the configured directives.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| configured_filter(config))
}

/// The configured directives, or [`DEFAULT_LOG_FILTER`] if they do not parse.
///
/// [`DEFAULT_LOG_FILTER`]: crate::config::DEFAULT_LOG_FILTER
fn configured_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_new(&config.filter)
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER))
}

/// Install the global subscriber.
///
/// Returns the file writer's guard when file logging is enabled.
///
/// # Errors
///
/// Fails if the log directory cannot be created or a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> io::Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer().with_writer(io::stderr).with_target(true);

    let (file_layer, guard) = match &config.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_filter_falls_back() {
        let config = LoggingConfig::default().with_filter("sts_inquiry=[");

        let filter = configured_filter(&config);

        assert_eq!(filter.to_string(), crate::config::DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_configured_filter_is_used() {
        let config = LoggingConfig::default().with_filter("warn");

        assert_eq!(configured_filter(&config).to_string(), "warn");
    }

    #[test]
    fn test_init_creates_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let config = LoggingConfig::default().with_directory(&logs);

        // A subscriber may already be installed by another test; the
        // directory is created either way.
        let _ = init_logging(&config);

        assert!(logs.is_dir());
    }
}
