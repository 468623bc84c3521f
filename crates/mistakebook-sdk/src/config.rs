//! Client configuration and base URL resolution.

use std::time::Duration;

/// Used when neither the caller nor the environment names a server
pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";

/// Per-request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variables consulted for the base URL, in order
pub const BASE_URL_ENV_VARS: &[&str] = &["API_BASE_URL", "VITE_API_BASE_URL"];

/// Settings for [`crate::MistakeClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Server root, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Config for an explicit server root
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Config from the environment, else the default server
    pub fn from_env() -> Self {
        env_base_url()
            .map(|url| Self::new(&url))
            .unwrap_or_default()
    }

    /// Override the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// First non-blank base URL among [`BASE_URL_ENV_VARS`]
pub fn env_base_url() -> Option<String> {
    first_base_url(BASE_URL_ENV_VARS.iter().map(|name| std::env::var(name).ok()))
}

fn first_base_url(candidates: impl IntoIterator<Item = Option<String>>) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}
