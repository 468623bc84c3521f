//! Detail loading: seed, fetch, or fall back to the sample record.

use mistakebook_domain::{fallback_detail, normalize_mistake_detail, DetailSource, MistakeDetail};
use std::fmt::Display;
use tracing::{debug, warn};

/// Where a loaded detail came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOrigin {
    /// Handed over by the caller; no request was made
    Seed,
    /// Fetched and normalized
    Fetched,
    /// Fetch failed; this is the sample record carrying the requested id
    Fallback {
        /// Why the fetch failed
        reason: String,
    },
}

/// A detail ready for display
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDetail {
    /// The detail itself
    pub detail: MistakeDetail,
    /// How it was obtained
    pub origin: DetailOrigin,
}

impl LoadedDetail {
    /// True when the detail is the sample record
    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, DetailOrigin::Fallback { .. })
    }
}

/// Load the detail for `id`.
///
/// A `seed` wins outright. Otherwise the payload is fetched from `source`
/// and normalized, taking `id` when the payload names none. Any fetch error yields a copy of the sample record with
/// `id` filled in, so this never fails.
pub async fn load_detail<S>(source: &S, id: &str, seed: Option<MistakeDetail>) -> LoadedDetail
where
    S: DetailSource,
    S::Error: Display,
{
    if let Some(detail) = seed {
        debug!(id = %detail.id, "using seed detail");
        return LoadedDetail {
            detail,
            origin: DetailOrigin::Seed,
        };
    }

    let id = id.trim();
    if id.is_empty() {
        warn!("no mistake id given, showing sample record");
        return LoadedDetail {
            detail: fallback_detail(id),
            origin: DetailOrigin::Fallback {
                reason: "错题 ID 为空".to_string(),
            },
        };
    }

    match source.fetch_detail(id).await {
        Ok(payload) => {
            let mut detail = normalize_mistake_detail(&payload);
            if detail.has_unknown_id() {
                detail.id = id.to_string();
            }
            LoadedDetail {
                detail,
                origin: DetailOrigin::Fetched,
            }
        }
        Err(e) => {
            warn!(id, error = %e, "detail fetch failed, showing sample record");
            LoadedDetail {
                detail: fallback_detail(id),
                origin: DetailOrigin::Fallback {
                    reason: e.to_string(),
                },
            }
        }
    }
}
