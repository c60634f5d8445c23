//! Client configuration.
//!
//! Base URLs and timeouts are an explicit struct handed to the client at
//! construction, never ambient process state. `from_env` exists for binaries
//! that want the conventional environment variables.

use std::time::Duration;

pub const DEFAULT_ASSETS_BASE_URL: &str = "https://apis.roblox.com/assets";
pub const DEFAULT_OAUTH_BASE_URL: &str = "https://apis.roblox.com/oauth";

/// Poll window after an initial submission.
pub const SUBMIT_POLL_TIMEOUT: Duration = Duration::from_secs(90);
/// Poll window behind a manual retry.
pub const RETRY_POLL_TIMEOUT: Duration = Duration::from_secs(60);
/// Fixed delay between operation polls.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Configuration for [`AssetsClient`](crate::client::AssetsClient) and
/// [`Publisher`](crate::publish::Publisher).
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Open Cloud assets API.
    pub assets_base_url: String,
    /// Base URL of the OAuth service (token refresh).
    pub oauth_base_url: String,
    /// Poll window after an initial submission.
    pub submit_poll_timeout: Duration,
    /// Poll window for a manual retry of an existing operation.
    pub retry_poll_timeout: Duration,
    /// Delay between consecutive operation polls.
    pub poll_interval: Duration,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            assets_base_url: DEFAULT_ASSETS_BASE_URL.to_string(),
            oauth_base_url: DEFAULT_OAUTH_BASE_URL.to_string(),
            submit_poll_timeout: SUBMIT_POLL_TIMEOUT,
            retry_poll_timeout: RETRY_POLL_TIMEOUT,
            poll_interval: POLL_INTERVAL,
            http_timeout: Duration::from_secs(120),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from `ROBLOX_ASSETS_URL` / `ROBLOX_OAUTH_URL`
    /// (a `.env` file is honored if present).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        if let Ok(url) = std::env::var("ROBLOX_ASSETS_URL") {
            config.assets_base_url = url;
        }
        if let Ok(url) = std::env::var("ROBLOX_OAUTH_URL") {
            config.oauth_base_url = url;
        }
        config
    }

    pub fn with_assets_base_url(mut self, url: impl Into<String>) -> Self {
        self.assets_base_url = url.into();
        self
    }

    pub fn with_oauth_base_url(mut self, url: impl Into<String>) -> Self {
        self.oauth_base_url = url.into();
        self
    }

    pub fn with_submit_poll_timeout(mut self, timeout: Duration) -> Self {
        self.submit_poll_timeout = timeout;
        self
    }

    pub fn with_retry_poll_timeout(mut self, timeout: Duration) -> Self {
        self.retry_poll_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
