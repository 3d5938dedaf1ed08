//! HTTP client abstraction and the HTTP player source.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use super::{parse_player_list, PlayerRecord, PlayerSource, SourceError};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the response body.
    ///
    /// `401 Unauthorized` and `403 Forbidden` map to
    /// [`SourceError::Authentication`].
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the given user agent and timeout.
    pub fn new(user_agent: &str, timeout_secs: u64) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SourceError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| SourceError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SourceError::Authentication(format!(
                "HTTP {} from {}",
                status, url
            )));
        }
        if !status.is_success() {
            return Err(SourceError::Http(format!("HTTP {} from {}", status, url)));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| SourceError::Http(format!("Failed to read response: {}", e)))
    }
}

/// Fetches the player list over HTTP.
pub struct HttpPlayerSource {
    client: Arc<dyn HttpClient>,
    url: String,
}

impl HttpPlayerSource {
    /// Create a player source reading from `url`.
    pub fn new(client: Arc<dyn HttpClient>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// The player list URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl PlayerSource for HttpPlayerSource {
    fn fetch_players(&self) -> Result<Vec<PlayerRecord>, SourceError> {
        let body = self.client.get(&self.url)?;
        let text = String::from_utf8(body).map_err(|e| SourceError::Fetch {
            what: "player list".to_string(),
            reason: format!("response is not UTF-8: {}", e),
        })?;

        let players = parse_player_list(&text)?;
        debug!(url = %self.url, players = players.len(), "Fetched player list");
        Ok(players)
    }
}
