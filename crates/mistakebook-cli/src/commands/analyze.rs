//! Analyze command implementation.

use super::read_json;
use crate::cli::AnalyzeArgs;
use crate::error::Result;
use crate::output::Formatter;
use mistakebook_sdk::AnalyzedUpload;
use tracing::debug;

/// Execute the analyze command.
pub async fn execute_analyze(args: AnalyzeArgs, formatter: &Formatter) -> Result<()> {
    let payload = read_json(&args.file)?;
    debug!(file = %args.file.display(), "normalizing saved analysis");

    let analyzed = AnalyzedUpload::from_saved(payload)?;
    println!("{}", super::upload::render(&analyzed, args.select, formatter)?);
    Ok(())
}
