//! Practice command implementation.

use super::read_json;
use crate::cli::PracticeArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use mistakebook_domain::{parse_similar_questions, PracticeError, PracticeSession};
use serde_json::Value;
use tracing::debug;

/// Execute the practice command.
pub async fn execute_practice(args: PracticeArgs, formatter: &Formatter) -> Result<()> {
    let payload = read_json(&args.file)?;
    let mut session = build_session(&payload)?;
    debug!(questions = session.questions().len(), "practice session loaded");

    for (index, answer) in args.answers.iter().enumerate() {
        match session.submit(index, answer) {
            Ok(_) => {}
            Err(PracticeError::BlankAnswer) => {
                eprintln!(
                    "{}",
                    formatter.warning(&format!("第 {} 题：{}", index + 1, PracticeError::BlankAnswer))
                );
            }
            Err(PracticeError::OutOfRange { len, .. }) => {
                eprintln!(
                    "{}",
                    formatter.warning(&format!(
                        "Ignoring {} extra answer(s); there are only {} questions",
                        args.answers.len() - len,
                        len
                    ))
                );
                break;
            }
            Err(e) => return Err(CliError::InvalidInput(e.to_string())),
        }
    }

    println!("{}", formatter.format_practice(&session)?);
    Ok(())
}

/// Questions come either as a bare array or under `practices`/`questions`.
fn build_session(payload: &Value) -> Result<PracticeSession> {
    let raw = payload
        .get("practices")
        .or_else(|| payload.get("questions"))
        .unwrap_or(payload);

    let questions = parse_similar_questions(raw);
    if questions.is_empty() {
        return Err(CliError::InvalidInput(
            "No practice questions found in file".to_string(),
        ));
    }
    Ok(PracticeSession::new(questions))
}
