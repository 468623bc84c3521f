//! Host notification for embedded sessions.
//!
//! When the client runs inside a host shell, every location change is
//! announced with a [`PathChangeNotice`].

use serde::{Deserialize, Serialize};

/// Message type the host listens for
pub const PATH_CHANGE_MESSAGE_TYPE: &str = "chux-path-change";

/// Announcement of a location change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathChangeNotice {
    /// Always [`PATH_CHANGE_MESSAGE_TYPE`]
    #[serde(rename = "type")]
    pub message_type: String,
    /// `P-` plus the upper-cased path without its first slash
    pub page_id: String,
    /// Location path
    pub pathname: String,
    /// Query string including its leading `?`, or empty
    pub search: String,
}

impl PathChangeNotice {
    /// Build the notice for a location.
    ///
    /// Only the first `/` is removed, so `/error-book/list` becomes
    /// `P-ERROR-BOOK/LIST`.
    pub fn for_location(pathname: &str, search: &str) -> Self {
        let page_id = format!("P-{}", pathname.replacen('/', "", 1).to_uppercase());
        Self {
            message_type: PATH_CHANGE_MESSAGE_TYPE.to_string(),
            page_id,
            pathname: pathname.to_string(),
            search: search.to_string(),
        }
    }
}
