//! Command implementations.

pub mod analyze;
pub mod detail;
pub mod error_type;
pub mod list;
pub mod manage;
pub mod practice;
pub mod profile;
pub mod upload;
pub mod weak_points;

pub use self::analyze::execute_analyze;
pub use self::detail::execute_detail;
pub use self::error_type::execute_error_type;
pub use self::list::execute_list;
pub use self::manage::{execute_delete, execute_export};
pub use self::practice::execute_practice;
pub use self::profile::execute_profile;
pub use self::upload::execute_upload;
pub use self::weak_points::execute_weak_points;

use crate::config::Config;
use crate::error::Result;
use mistakebook_sdk::{ClientConfig, MistakeClient};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Client for the backend chosen by flag, environment, or active profile.
pub fn connect(config: &Config, api_url: Option<&str>) -> Result<MistakeClient> {
    let base_url = config.resolve_base_url(api_url);
    debug!(%base_url, "using backend");
    Ok(MistakeClient::new(ClientConfig::new(&base_url))?)
}

/// Read and parse a JSON file.
pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
