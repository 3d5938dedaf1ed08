//! Service configuration.
//!
//! Settings are read from an INI file. Missing sections and keys fall back
//! to their defaults and unknown keys are ignored:
//!
//! ```ini
//! [clusters]
//! max_size = 5
//!
//! [search]
//! rows_per_page = 50
//!
//! [refresh]
//! fast_interval_secs = 60
//! full_interval_secs = 21600
//!
//! [source]
//! player_list_url = https://example.invalid/players.txt
//! user_agent = sts-inquiry
//! timeout_secs = 30
//!
//! [logging]
//! directory = /var/log/sts-inquiry
//! filter = info,sts_inquiry=debug
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::refresh::RefreshSchedule;
use crate::source::DEFAULT_TIMEOUT_SECS;

/// Default largest cluster size.
pub const DEFAULT_MAX_CLUSTER_SIZE: usize = 5;

/// Upper bound for the cluster size; enumeration grows exponentially with it.
pub const MAX_CLUSTER_SIZE_LIMIT: usize = 8;

/// Default number of result rows per page.
pub const DEFAULT_ROWS_PER_PAGE: usize = 50;

/// Default occupancy refresh period (in seconds).
pub const DEFAULT_FAST_INTERVAL_SECS: u64 = 60;

/// Default landscape refresh period (in seconds). Six hours.
pub const DEFAULT_FULL_INTERVAL_SECS: u64 = 6 * 60 * 60;

/// Default log filter when neither the config nor `RUST_LOG` sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(String),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error(
        "Full refresh interval ({full_ms} ms) must be a non-zero multiple of the fast refresh interval ({fast_ms} ms)"
    )]
    IntervalMismatch { fast_ms: u128, full_ms: u128 },
}

/// Cluster engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    pub max_size: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_CLUSTER_SIZE,
        }
    }
}

/// Query engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub rows_per_page: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

/// Refresh periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    pub fast_interval_secs: u64,
    pub full_interval_secs: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            fast_interval_secs: DEFAULT_FAST_INTERVAL_SECS,
            full_interval_secs: DEFAULT_FULL_INTERVAL_SECS,
        }
    }
}

impl RefreshConfig {
    /// The scheduler's view of these periods.
    pub fn schedule(&self) -> Result<RefreshSchedule, ConfigError> {
        RefreshSchedule::new(
            Duration::from_secs(self.fast_interval_secs),
            Duration::from_secs(self.full_interval_secs),
        )
    }
}

/// Where player data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// URL of the colon separated player list.
    pub player_list_url: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            player_list_url: None,
            user_agent: format!("sts-inquiry/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Directory for daily rolling log files. Stderr only if unset.
    pub directory: Option<PathBuf>,
    /// `EnvFilter` directives, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Write log files to `directory` in addition to stderr.
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Set the filter directives.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

/// All service settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    pub clusters: ClusterConfig,
    pub search: SearchConfig,
    pub refresh: RefreshConfig,
    pub source: SourceConfig,
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load and validate an INI file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_size = self.clusters.max_size;
        if !(1..=MAX_CLUSTER_SIZE_LIMIT).contains(&max_size) {
            return Err(invalid(
                "clusters.max_size",
                max_size,
                format!("must be between 1 and {}", MAX_CLUSTER_SIZE_LIMIT),
            ));
        }
        if self.search.rows_per_page == 0 {
            return Err(invalid("search.rows_per_page", 0, "must be at least 1"));
        }
        if self.refresh.fast_interval_secs == 0 {
            return Err(invalid("refresh.fast_interval_secs", 0, "must be at least 1"));
        }
        self.refresh.schedule()?;
        Ok(())
    }

    /// Build a configuration from parsed INI contents.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(v) = parse_key(ini, "clusters", "max_size")? {
            config.clusters.max_size = v;
        }
        if let Some(v) = parse_key(ini, "search", "rows_per_page")? {
            config.search.rows_per_page = v;
        }
        if let Some(v) = parse_key(ini, "refresh", "fast_interval_secs")? {
            config.refresh.fast_interval_secs = v;
        }
        if let Some(v) = parse_key(ini, "refresh", "full_interval_secs")? {
            config.refresh.full_interval_secs = v;
        }
        if let Some(v) = get_str(ini, "source", "player_list_url") {
            config.source.player_list_url = Some(v.to_string());
        }
        if let Some(v) = get_str(ini, "source", "user_agent") {
            config.source.user_agent = v.to_string();
        }
        if let Some(v) = parse_key(ini, "source", "timeout_secs")? {
            config.source.timeout_secs = v;
        }
        if let Some(v) = get_str(ini, "logging", "directory") {
            config.logging.directory = Some(PathBuf::from(v));
        }
        if let Some(v) = get_str(ini, "logging", "filter") {
            config.logging.filter = v.to_string();
        }

        config.validate()?;
        Ok(config)
    }
}

impl FromStr for ServiceConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ini = Ini::load_from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_ini(&ini)
    }
}

/// A trimmed, non-empty value.
fn get_str<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    ini.get_from(Some(section), key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_key<T>(ini: &Ini, section: &str, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_str(ini, section, key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| invalid(&format!("{}.{}", section, key), raw, e.to_string()))
        })
        .transpose()
}

fn invalid(key: &str, value: impl ToString, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServiceConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.clusters.max_size, 5);
        assert_eq!(config.search.rows_per_page, 50);
        assert_eq!(config.refresh.schedule().unwrap().ticks_per_full(), 360);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[clusters]\nmax_size = 3\n\n[search]\nrows_per_page = 20\n\n\
             [refresh]\nfast_interval_secs = 30\nfull_interval_secs = 300\n\n\
             [source]\nplayer_list_url = http://localhost/players.txt\nunknown = 1\n\n\
             [logging]\ndirectory = /tmp/logs\nfilter = debug"
        )
        .unwrap();

        let config = ServiceConfig::load(file.path()).unwrap();

        assert_eq!(config.clusters.max_size, 3);
        assert_eq!(config.search.rows_per_page, 20);
        assert_eq!(config.refresh.schedule().unwrap().ticks_per_full(), 10);
        assert_eq!(
            config.source.player_list_url.as_deref(),
            Some("http://localhost/players.txt")
        );
        assert_eq!(config.source.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.logging.directory, Some(PathBuf::from("/tmp/logs")));
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ServiceConfig::load(&dir.path().join("missing.ini"));

        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_interval_mismatch_rejected() {
        let result: Result<ServiceConfig, _> =
            "[refresh]\nfast_interval_secs = 60\nfull_interval_secs = 90".parse();

        assert!(matches!(result, Err(ConfigError::IntervalMismatch { .. })));
    }

    #[test]
    fn test_bad_values_rejected() {
        for text in [
            "[clusters]\nmax_size = 0",
            "[clusters]\nmax_size = 9",
            "[clusters]\nmax_size = many",
            "[search]\nrows_per_page = 0",
            "[refresh]\nfast_interval_secs = 0",
        ] {
            let result: Result<ServiceConfig, _> = text.parse();
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { .. })),
                "accepted: {}",
                text
            );
        }
    }

    #[test]
    fn test_logging_builders() {
        let logging = LoggingConfig::default()
            .with_directory("/var/log/sts")
            .with_filter("warn");

        assert_eq!(logging.directory, Some(PathBuf::from("/var/log/sts")));
        assert_eq!(logging.filter, "warn");
    }
}
