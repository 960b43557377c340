//! Client configuration, explicit or from environment variables.

use std::time::Duration;

use url::Url;

use crate::error::{Result, SyncError};
use crate::ws::ReconnectConfig;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_PUSH_URL: &str = "ws://localhost:8080/ws";
const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// What to do when the notification list cannot be fetched during bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFetchFailurePolicy {
    /// Any failure clears the session and returns to the login state.
    Logout,
    /// Only credential failures log out; other failures keep the session and
    /// retry the list fetch after the reconnect delay.
    #[default]
    RetryTransient,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API, e.g. `https://example.com`.
    pub api_base_url: Url,
    /// Push-channel endpoint; the credential is appended as a query parameter.
    pub push_url: Url,
    pub reconnect: ReconnectConfig,
    pub handshake_timeout: Duration,
    pub request_timeout: Duration,
    pub list_fetch_failure: ListFetchFailurePolicy,
}

impl ClientConfig {
    pub fn new(api_base_url: &str, push_url: &str) -> Result<Self> {
        Ok(Self {
            api_base_url: parse_url(api_base_url, &["http", "https"])?,
            push_url: parse_url(push_url, &["ws", "wss"])?,
            reconnect: ReconnectConfig::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            list_fetch_failure: ListFetchFailurePolicy::default(),
        })
    }

    /// Parse configuration from environment variables.
    ///
    /// Environment variables:
    /// - `NOTIFLOW_API_URL`: REST base URL (default: "http://localhost:8080")
    /// - `NOTIFLOW_PUSH_URL`: push endpoint (default: "ws://localhost:8080/ws")
    /// - `NOTIFLOW_RECONNECT_DELAY_MS`: flat reconnect delay (default: 5000)
    /// - `NOTIFLOW_HANDSHAKE_TIMEOUT_MS`: push handshake timeout (default: 5000)
    /// - `NOTIFLOW_LIST_FAILURE`: "logout" | "retry" (default: "retry")
    pub fn from_env() -> Result<Self> {
        let api = std::env::var("NOTIFLOW_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let push =
            std::env::var("NOTIFLOW_PUSH_URL").unwrap_or_else(|_| DEFAULT_PUSH_URL.to_string());

        let mut config = Self::new(&api, &push)?;

        if let Some(delay) = env_millis("NOTIFLOW_RECONNECT_DELAY_MS")? {
            config.reconnect = ReconnectConfig::Fixed { delay };
        }
        if let Some(timeout) = env_millis("NOTIFLOW_HANDSHAKE_TIMEOUT_MS")? {
            config.handshake_timeout = timeout;
        }

        let policy = std::env::var("NOTIFLOW_LIST_FAILURE")
            .unwrap_or_else(|_| "retry".to_string())
            .to_lowercase();
        config.list_fetch_failure = match policy.as_str() {
            "logout" => ListFetchFailurePolicy::Logout,
            _ => ListFetchFailurePolicy::RetryTransient,
        };

        Ok(config)
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn with_list_fetch_failure(mut self, policy: ListFetchFailurePolicy) -> Self {
        self.list_fetch_failure = policy;
        self
    }

    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}

fn parse_url(raw: &str, schemes: &[&str]) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| SyncError::Config(format!("{raw}: {e}")))?;
    if !schemes.contains(&url.scheme()) {
        return Err(SyncError::Config(format!(
            "{raw}: expected one of {schemes:?}, got {}",
            url.scheme()
        )));
    }
    Ok(url)
}

fn env_millis(name: &str) -> Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|e| SyncError::Config(format!("{name}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_validates_schemes() {
        assert!(ClientConfig::new("http://localhost:8080", "ws://localhost:8080/ws").is_ok());
        assert!(matches!(
            ClientConfig::new("ws://localhost:8080", "ws://localhost:8080/ws"),
            Err(SyncError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::new("https://example.com", "https://example.com/ws"),
            Err(SyncError::Config(_))
        ));
        assert!(matches!(
            ClientConfig::new("not a url", "ws://x"),
            Err(SyncError::Config(_))
        ));
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new("https://example.com", "wss://example.com/ws").unwrap();
        assert_eq!(config.reconnect, ReconnectConfig::default());
        assert_eq!(config.handshake_timeout, Duration::from_secs(5));
        assert_eq!(config.list_fetch_failure, ListFetchFailurePolicy::RetryTransient);
    }
}
