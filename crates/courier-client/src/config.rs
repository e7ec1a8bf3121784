//! Client configuration loaded from environment variables.
//!
//! All settings have defaults pointing at a local development backend so
//! the client runs with zero configuration.

use std::time::Duration;

use courier_net::{ConnectConfig, RetryPolicy};
use courier_shared::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_API_URL, DEFAULT_WS_URL, HISTORY_PAGE_SIZE,
};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API base for the chat list and history collaborator.
    /// Env: `COURIER_API_URL`
    /// Default: `http://localhost:8080/api/v1`
    pub api_url: String,

    /// WebSocket endpoint for per-chat sessions.
    /// Env: `COURIER_WS_URL`
    /// Default: `ws://localhost:8080/api/v1/ws/connect`
    pub ws_url: String,

    /// Bound on each connection establishment attempt.
    /// Env: `COURIER_CONNECT_TIMEOUT_SECS`
    /// Default: `10`
    pub connect_timeout: Duration,

    /// Retry policy between failed establishment attempts.
    /// Default: no in-loop retry (reopen is caller-driven).
    pub retry: RetryPolicy,

    /// Page size for history fetches.
    /// Default: `50`
    pub history_page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            retry: RetryPolicy::default(),
            history_page_size: HISTORY_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("COURIER_API_URL") {
            config.api_url = url;
        }

        if let Ok(url) = std::env::var("COURIER_WS_URL") {
            config.ws_url = url;
        }

        if let Ok(secs) = std::env::var("COURIER_CONNECT_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.connect_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// The connection-level view of this configuration.
    pub fn connect_config(&self) -> ConnectConfig {
        ConnectConfig {
            ws_url: self.ws_url.clone(),
            connect_timeout: self.connect_timeout,
            retry: self.retry.clone(),
        }
    }
}
