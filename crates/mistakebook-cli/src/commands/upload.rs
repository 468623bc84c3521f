//! Upload command implementation.

use crate::cli::UploadArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use mistakebook_domain::QuestionSelection;
use mistakebook_sdk::{AnalyzedUpload, MistakeClient};

/// Execute the upload command.
pub async fn execute_upload(
    args: UploadArgs,
    client: &MistakeClient,
    formatter: &Formatter,
) -> Result<()> {
    if !args.image.is_file() {
        return Err(CliError::InvalidInput(format!(
            "Image file not found: {}",
            args.image.display()
        )));
    }

    let analyzed = client.upload_and_analyze(&args.image).await?;
    eprintln!(
        "{}",
        formatter.success(&format!(
            "Uploaded {} (file id {})",
            analyzed.response.filename, analyzed.response.file_id
        ))
    );

    println!("{}", render(&analyzed, args.select, formatter)?);
    Ok(())
}

/// Render the section overview, or one question's detail when selected.
pub(crate) fn render(
    analyzed: &AnalyzedUpload,
    select: Option<QuestionSelection>,
    formatter: &Formatter,
) -> Result<String> {
    match select {
        None => formatter.format_analysis(&analyzed.analysis),
        Some(selection) => {
            let detail = analyzed.select(selection).ok_or_else(|| {
                CliError::InvalidInput(format!(
                    "No question {}:{} in the analysis",
                    selection.section_index + 1,
                    selection.question_index + 1
                ))
            })?;
            formatter.format_detail(&detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use serde_json::json;

    fn analyzed() -> AnalyzedUpload {
        AnalyzedUpload::from_saved(json!([
            {"section": "口算", "question": "7 × 8", "answer": "54", "is_correct": false}
        ]))
        .unwrap()
    }

    #[test]
    fn test_render_selected_question() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = render(&analyzed(), Some(QuestionSelection::new(0, 0)), &formatter).unwrap();
        assert_eq!(output, "preview-1-1");
    }

    #[test]
    fn test_render_missing_question() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let result = render(&analyzed(), Some(QuestionSelection::new(3, 0)), &formatter);
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }
}
