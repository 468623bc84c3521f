//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Implementations live in the SDK crate.

use serde_json::Value;
use std::future::Future;

/// Source of raw detail payloads
///
/// Implemented by the HTTP client (mistakebook-sdk). The payload is returned
/// untyped; callers run it through [`crate::normalize_mistake_detail`].
pub trait DetailSource {
    /// Error type for fetch operations
    type Error;

    /// Fetch the raw detail payload for a mistake id
    fn fetch_detail(&self, id: &str) -> impl Future<Output = Result<Value, Self::Error>> + Send;
}
