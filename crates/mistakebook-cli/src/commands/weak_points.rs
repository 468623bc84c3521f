//! Weak-points command implementation.

use crate::cli::WeakPointsArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use mistakebook_sdk::MistakeClient;

/// Execute the weak-points command.
pub async fn execute_weak_points(
    args: WeakPointsArgs,
    client: &MistakeClient,
    formatter: &Formatter,
    default_subject: Option<&str>,
) -> Result<()> {
    if args.top_n == 0 {
        return Err(CliError::InvalidInput("--top-n must be at least 1".to_string()));
    }

    let subject = args.subject.as_deref().or(default_subject);
    let response = client.weak_points(args.top_n, subject).await?;
    println!("{}", formatter.format_weak_points(&response.weak_points)?);
    Ok(())
}
