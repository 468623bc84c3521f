//! Detail command implementation.

use super::read_json;
use crate::cli::DetailArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use mistakebook_domain::{normalize_mistake_detail, MistakeDetail};
use mistakebook_sdk::{load_detail, DetailOrigin, MistakeClient};

/// Execute the detail command.
pub async fn execute_detail(
    args: DetailArgs,
    client: &MistakeClient,
    formatter: &Formatter,
) -> Result<()> {
    if args.legacy {
        return show_legacy(&args.id, client, formatter).await;
    }

    let seed = match &args.seed {
        Some(path) => Some(seed_detail(&read_json(path)?, &args.id)),
        None => None,
    };

    let loaded = load_detail(client, &args.id, seed).await;
    if let DetailOrigin::Fallback { reason } = &loaded.origin {
        eprintln!(
            "{}",
            formatter.warning(&format!("加载失败：{}，以下为示例数据", reason))
        );
    }

    println!("{}", formatter.format_detail(&loaded.detail)?);
    Ok(())
}

/// Normalize a seed payload; an unresolved id takes the requested one.
fn seed_detail(payload: &serde_json::Value, id: &str) -> MistakeDetail {
    let mut detail = normalize_mistake_detail(payload);
    if detail.has_unknown_id() && !id.trim().is_empty() {
        detail.id = id.trim().to_string();
    }
    detail
}

async fn show_legacy(id: &str, client: &MistakeClient, formatter: &Formatter) -> Result<()> {
    let record_id: i64 = id
        .trim()
        .parse()
        .map_err(|_| CliError::InvalidInput(format!("Legacy record id must be numeric: {}", id)))?;

    let record = client.fetch_legacy_record(record_id).await?;
    println!("{}", formatter.format_detail(&record.to_detail(id.trim()))?);

    let practices = record.practice_questions();
    if !practices.is_empty() {
        eprintln!(
            "{}",
            formatter.info(&format!("{} practice question(s) available", practices.len()))
        );
    }
    Ok(())
}
