//! Similar-question practice sessions.

use crate::coerce::{first_present, trimmed};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// How a practice question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    /// Pick one option
    MultipleChoice,
    /// Type the answer
    FillBlank,
}

impl QuestionKind {
    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple-choice",
            QuestionKind::FillBlank => "fill-blank",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "multiple-choice" | "multiple_choice" | "choice" => Some(QuestionKind::MultipleChoice),
            "fill-blank" | "fill_blank" | "blank" => Some(QuestionKind::FillBlank),
            _ => None,
        }
    }
}

/// A selectable option of a multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    /// Option letter, e.g. `A`
    pub label: String,
    /// Answer text submitted when the option is picked
    pub value: String,
    /// Whether this option is the right one
    #[serde(default)]
    pub correct: bool,
}

/// A practice question similar to a recorded mistake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarQuestion {
    /// Question id
    pub id: String,
    /// Answering mode
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    /// Question text
    pub question: String,
    /// Options, empty for fill-blank questions
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    /// Exact expected answer
    #[serde(rename = "correctAnswer", alias = "correct_answer")]
    pub correct_answer: String,
    /// Worked explanation, steps separated by newlines
    #[serde(default)]
    pub explanation: String,
}

/// Parse loosely shaped practice questions; unusable entries are skipped.
///
/// Accepts string or numeric ids and both `correctAnswer` and
/// `correct_answer`. A question without text, answer, or a known type is
/// dropped.
pub fn parse_similar_questions(raw: &Value) -> Vec<SimilarQuestion> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let record = item.as_object()?;
            let kind = record
                .get("type")
                .and_then(Value::as_str)
                .and_then(QuestionKind::parse)?;
            let question = trimmed(record.get("question"));
            let correct_answer = trimmed(first_present(record, &["correctAnswer", "correct_answer"]));
            if question.is_empty() || correct_answer.is_empty() {
                return None;
            }
            let id = match record.get("id") {
                Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
                Some(Value::Number(n)) => n.to_string(),
                _ => (index + 1).to_string(),
            };
            let options = record
                .get("options")
                .and_then(Value::as_array)
                .map(|options| {
                    options
                        .iter()
                        .filter_map(|option| serde_json::from_value(option.clone()).ok())
                        .collect()
                })
                .unwrap_or_default();

            Some(SimilarQuestion {
                id,
                kind,
                question,
                options,
                correct_answer,
                explanation: trimmed(record.get("explanation")),
            })
        })
        .collect()
}

/// Why an answer was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PracticeError {
    /// Nothing was selected or typed
    #[error("请选择或输入答案")]
    BlankAnswer,

    /// The question was already graded
    #[error("Question {0} has already been answered")]
    AlreadyAnswered(usize),

    /// No question at that position
    #[error("Question index {index} out of range (session has {len})")]
    OutOfRange {
        /// Requested index
        index: usize,
        /// Number of questions
        len: usize,
    },
}

/// Graded answers for a sequence of practice questions
#[derive(Debug, Clone)]
pub struct PracticeSession {
    questions: Vec<SimilarQuestion>,
    answers: Vec<Option<(String, bool)>>,
}

impl PracticeSession {
    /// Start a session; nothing answered yet
    pub fn new(questions: Vec<SimilarQuestion>) -> Self {
        let answers = vec![None; questions.len()];
        Self { questions, answers }
    }

    /// Questions in order
    pub fn questions(&self) -> &[SimilarQuestion] {
        &self.questions
    }

    /// Submit an answer for question `index`, returning whether it is correct.
    ///
    /// Fill-blank answers are trimmed before comparison. Multiple-choice
    /// answers are compared as given.
    pub fn submit(&mut self, index: usize, answer: &str) -> Result<bool, PracticeError> {
        let len = self.questions.len();
        let question = self
            .questions
            .get(index)
            .ok_or(PracticeError::OutOfRange { index, len })?;

        if self.answers[index].is_some() {
            return Err(PracticeError::AlreadyAnswered(index));
        }

        let answer = match question.kind {
            QuestionKind::FillBlank => answer.trim(),
            QuestionKind::MultipleChoice => answer,
        };
        if answer.trim().is_empty() {
            return Err(PracticeError::BlankAnswer);
        }

        let correct = answer == question.correct_answer;
        self.answers[index] = Some((answer.to_string(), correct));
        Ok(correct)
    }

    /// The recorded answer and verdict for question `index`
    pub fn answer(&self, index: usize) -> Option<(&str, bool)> {
        self.answers
            .get(index)?
            .as_ref()
            .map(|(answer, correct)| (answer.as_str(), *correct))
    }

    /// Number of graded questions
    pub fn answered_count(&self) -> usize {
        self.answers.iter().flatten().count()
    }

    /// Number of correct answers
    pub fn correct_count(&self) -> usize {
        self.answers.iter().flatten().filter(|(_, correct)| *correct).count()
    }

    /// True when every question has been graded
    pub fn is_complete(&self) -> bool {
        self.answered_count() == self.questions.len()
    }

    /// Percentage of graded answers that were correct, rounded; 0 before any answer
    pub fn accuracy(&self) -> u32 {
        let answered = self.answered_count();
        if answered == 0 {
            return 0;
        }
        (self.correct_count() as f64 / answered as f64 * 100.0).round() as u32
    }
}
