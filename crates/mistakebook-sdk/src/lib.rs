//! Mistakebook Rust SDK
//!
//! Async client for the mistake notebook backend, plus the upload and
//! detail flows built on top of it.
//!
//! # Example
//!
//! ```no_run
//! use mistakebook_sdk::{load_detail, ClientConfig, MistakeClient};
//!
//! # async fn run() -> Result<(), mistakebook_sdk::SdkError> {
//! let client = MistakeClient::new(ClientConfig::from_env())?;
//!
//! let loaded = load_detail(&client, "42", None).await;
//! println!("{}", loaded.detail.stem);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod detail;
mod error;
mod upload;

pub use client::{ListQuery, MistakeClient};
pub use config::{env_base_url, ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use detail::{load_detail, DetailOrigin, LoadedDetail};
pub use error::{SdkError, NETWORK_FAILURE_MESSAGE};
pub use upload::AnalyzedUpload;
