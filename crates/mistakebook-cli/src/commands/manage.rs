//! Delete and export command implementations.
//!
//! The backend exposes neither operation yet, so both surface the SDK's
//! not-implemented error.

use crate::cli::IdsArgs;
use crate::error::Result;
use crate::output::Formatter;
use mistakebook_sdk::MistakeClient;

/// Execute the delete command.
pub async fn execute_delete(args: IdsArgs, client: &MistakeClient, formatter: &Formatter) -> Result<()> {
    match args.ids.as_slice() {
        [id] => client.delete_mistake(*id).await?,
        ids => client.batch_delete_mistakes(ids).await?,
    }
    println!("{}", formatter.success(&format!("Deleted {} record(s)", args.ids.len())));
    Ok(())
}

/// Execute the export command.
pub async fn execute_export(args: IdsArgs, client: &MistakeClient, formatter: &Formatter) -> Result<()> {
    client.export_mistakes(&args.ids).await?;
    println!("{}", formatter.success(&format!("Exported {} record(s)", args.ids.len())));
    Ok(())
}
