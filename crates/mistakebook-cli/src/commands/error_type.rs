//! Error-type command implementation.

use crate::cli::ErrorTypeArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use mistakebook_domain::ErrorTypeUpdate;
use mistakebook_sdk::MistakeClient;

/// Execute the error-type command.
pub async fn execute_error_type(
    args: ErrorTypeArgs,
    client: &MistakeClient,
    formatter: &Formatter,
) -> Result<()> {
    let update = build_update(args)?;
    client.update_error_type(&update).await?;
    println!(
        "{}",
        formatter.success(&format!(
            "Record {} marked as '{}'",
            update.mistake_record_id, update.error_type
        ))
    );
    Ok(())
}

fn build_update(args: ErrorTypeArgs) -> Result<ErrorTypeUpdate> {
    let error_type = args.error_type.trim();
    if error_type.is_empty() {
        return Err(CliError::InvalidInput("Error type cannot be empty".to_string()));
    }
    Ok(ErrorTypeUpdate {
        mistake_record_id: args.record_id,
        error_type: error_type.to_string(),
        analysis_id: args.analysis_id,
    })
}
