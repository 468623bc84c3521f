//! Error types for the Mistakebook SDK.

use thiserror::Error;

/// Message shown when the server could not be reached at all
pub const NETWORK_FAILURE_MESSAGE: &str = "网络请求失败，请检查服务器是否可用。";

/// SDK operation errors
#[derive(Debug, Error)]
pub enum SdkError {
    /// Server answered with a non-success status
    #[error("{detail} (HTTP {status})")]
    Api {
        /// HTTP status code
        status: u16,
        /// `detail` from the error body, or an operation-specific fallback
        detail: String,
    },

    /// Connection error (network, DNS, timeout, etc.)
    #[error("网络请求失败，请检查服务器是否可用。({0})")]
    Connection(String),

    /// Response body did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Local file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend has no endpoint for this operation yet
    #[error("{0}")]
    NotImplemented(&'static str),

    /// Client could not be built from the given settings
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SdkError {
    /// True for failures where the server was never reached
    pub fn is_connection(&self) -> bool {
        matches!(self, SdkError::Connection(_))
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() || e.is_request() {
            SdkError::Connection(e.to_string())
        } else if e.is_decode() {
            SdkError::Decode(e.to_string())
        } else if e.is_builder() {
            SdkError::InvalidConfig(e.to_string())
        } else if let Some(status) = e.status() {
            SdkError::Api {
                status: status.as_u16(),
                detail: e.to_string(),
            }
        } else {
            SdkError::Connection(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(e: serde_json::Error) -> Self {
        SdkError::Decode(format!("JSON parsing error: {}", e))
    }
}
