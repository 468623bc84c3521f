//! Typed backend records.
//!
//! These mirror the REST payloads field for field. Every field defaults so
//! a partially populated response still decodes.

use crate::detail::{normalize_mistake_detail, MistakeDetail};
use crate::practice::{parse_similar_questions, SimilarQuestion};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Response of `POST /upload/image`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadImageResponse {
    /// Backend status word
    pub status: String,
    /// Human readable message
    pub message: String,
    /// Id of the stored file
    pub file_id: String,
    /// Original file name
    pub filename: String,
    /// Where the stored file can be fetched
    pub file_url: String,
    /// Upload timestamp
    pub upload_time: String,
    /// Size in bytes
    pub file_size: u64,
    /// MIME type
    pub file_type: String,
    /// Raw analysis engine output, fed to [`crate::normalize_analysis`]
    pub coze_analysis: Value,
}

/// File metadata attached to a stored mistake
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(missing_docs)]
pub struct FileInfo {
    pub file_id: String,
    pub filename: String,
    pub file_url: String,
    pub file_size: u64,
    pub file_type: String,
    pub upload_time: String,
    pub created_at: String,
}

/// One stored analysis row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordAnalysis {
    /// Row id
    pub id: i64,
    /// Subject
    pub subject: String,
    /// Section title
    pub section: String,
    /// Question text
    pub question: String,
    /// Student's answer
    pub answer: String,
    /// Whether the engine saw a question
    pub is_question: bool,
    /// Correctness verdict
    pub is_correct: bool,
    /// Reference answer
    pub correct_answer: String,
    /// Engine comment
    pub comment: String,
    /// Error classification set by the student
    pub error_type: Option<String>,
    /// Knowledge point label
    pub knowledge_point: Option<String>,
    /// Row creation time
    pub created_at: String,
}

/// One entry of the mistakes list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MistakeRecord {
    /// Record id used by the detail and error-type endpoints
    pub mistake_record_id: i64,
    /// Stored file
    pub file_info: FileInfo,
    /// Stored analysis
    pub analysis: RecordAnalysis,
}

impl MistakeRecord {
    /// Build a detail payload in alias vocabulary from this record.
    pub fn to_detail_candidate(&self) -> Value {
        analysis_candidate(&self.mistake_record_id.to_string(), &self.analysis, &self.file_info)
    }

    /// Normalized detail for this record
    pub fn to_detail(&self) -> MistakeDetail {
        normalize_mistake_detail(&self.to_detail_candidate())
    }

    /// Upload time, falling back to the row creation time
    pub fn upload_time(&self) -> &str {
        if self.file_info.upload_time.is_empty() {
            &self.analysis.created_at
        } else {
            &self.file_info.upload_time
        }
    }
}

/// Response of `GET /mistakes`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MistakesListResponse {
    /// Total matching rows on the server
    pub total_count: u64,
    /// Offset used
    pub skip: u64,
    /// Page size used
    pub limit: u64,
    /// Returned rows
    pub mistakes: Vec<MistakeRecord>,
}

/// Error statistics for one knowledge point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeakPointStat {
    /// Knowledge point label
    pub knowledge_point: String,
    /// Subject
    pub subject: String,
    /// Answered questions
    pub total_count: u64,
    /// Wrong answers
    pub incorrect_count: u64,
    /// `incorrect_count / total_count`
    pub error_rate: f64,
}

/// Response of `GET /stats/weak_points`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeakPointsResponse {
    /// Weakest points first
    pub weak_points: Vec<WeakPointStat>,
}

/// Body of `POST /mistake/error_type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTypeUpdate {
    /// Record to update
    pub mistake_record_id: i64,
    /// New error classification
    pub error_type: String,
    /// Specific analysis row, when the record has several
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<i64>,
}

/// Response of the legacy `GET /mistake/{id}` endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyMistakeRecord {
    /// Stored file
    pub file_info: FileInfo,
    /// All analysis rows for the file
    pub analysis: Vec<RecordAnalysis>,
    /// Practice questions generated for the mistake, loosely shaped
    pub practices: Vec<Value>,
}

impl LegacyMistakeRecord {
    /// Normalized detail built from the first incorrect row (or the first row).
    pub fn to_detail(&self, id: &str) -> MistakeDetail {
        let row = self
            .analysis
            .iter()
            .find(|row| row.is_question && !row.is_correct)
            .or_else(|| self.analysis.first());

        match row {
            Some(row) => normalize_mistake_detail(&analysis_candidate(id, row, &self.file_info)),
            None => normalize_mistake_detail(&json!({
                "id": id,
                "image_url": self.file_info.file_url,
                "upload_time": self.file_info.upload_time,
                "source": self.file_info.filename,
            })),
        }
    }

    /// Practice questions that parse as [`SimilarQuestion`]s
    pub fn practice_questions(&self) -> Vec<SimilarQuestion> {
        parse_similar_questions(&Value::Array(self.practices.clone()))
    }
}

fn analysis_candidate(id: &str, row: &RecordAnalysis, file: &FileInfo) -> Value {
    let mut candidate = Map::new();
    candidate.insert("id".into(), json!(id));
    candidate.insert("stem".into(), json!(row.question));
    candidate.insert("student_answer".into(), json!(row.answer));
    candidate.insert("correct_answer".into(), json!(row.correct_answer));
    candidate.insert("is_correct".into(), json!(row.is_correct));
    candidate.insert("analysis".into(), json!(row.comment));
    candidate.insert("subject".into(), json!(row.subject));
    candidate.insert("section".into(), json!(row.section));
    candidate.insert("image_url".into(), json!(file.file_url));
    candidate.insert("source".into(), json!(file.filename));

    let upload_time = if file.upload_time.is_empty() {
        &row.created_at
    } else {
        &file.upload_time
    };
    candidate.insert("upload_time".into(), json!(upload_time));

    if let Some(error_type) = &row.error_type {
        candidate.insert("error_reasons".into(), json!([error_type]));
    }
    if let Some(point) = &row.knowledge_point {
        candidate.insert("knowledge_points".into(), json!([point]));
    }

    Value::Object(candidate)
}
