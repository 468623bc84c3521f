//! Analysis normalization: raw `coze_analysis` payloads into sections.
//!
//! The analysis engine returns an array of loosely shaped records. A record
//! either wraps a list of sections in `output`, or is itself a single
//! question. Both forms end up as [`OutputSection`]s, merged on
//! `(title, id)` so repeated sections collapse into one.

use crate::coerce::{coerce_bool, first_present, split_trimmed, string_field, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Title given to question records that carry no usable `section`
pub const UNGROUPED_SECTION_TITLE: &str = "未分组结果";

/// One question inside a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    /// Backend identifier, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Question text, trimmed and never empty
    pub question: String,
    /// Student's answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Reference answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Correctness verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    /// Engine comment for this question
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// A titled group of questions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSection {
    /// Backend identifier, part of the merge key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Section title, trimmed and never empty
    pub section: String,
    /// Subject, trimmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Knowledge point names; absent rather than empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_points: Option<Vec<String>>,
    /// Questions, never empty
    pub questions: Vec<QuestionResult>,
}

/// Per-record view of the raw payload, kept for backfill on drill-down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisItem {
    /// Backend identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Section title, untrimmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Question text, untrimmed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Student's answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Whether the engine recognised a question in this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_question: Option<bool>,
    /// Correctness verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    /// Reference answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Engine comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Subject, trimmed; blank subjects are dropped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Knowledge point names, possibly empty
    #[serde(default)]
    pub knowledge_points: Vec<String>,
    /// Engine success flag
    #[serde(rename = "isSuccess", default, skip_serializing_if = "Option::is_none")]
    pub is_success: Option<bool>,
    /// Valid sections parsed from this record's `output`, as parsed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Vec<OutputSection>>,
}

/// Result of [`normalize_analysis`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationResult {
    /// Merged sections in first-seen order
    pub sections: Vec<OutputSection>,
    /// One item per object record in the input
    pub raw_items: Vec<AnalysisItem>,
}

impl NormalizationResult {
    /// True when no section survived normalization
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total questions across all sections
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    /// Section and question at the given indices
    pub fn question(
        &self,
        section_index: usize,
        question_index: usize,
    ) -> Option<(&OutputSection, &QuestionResult)> {
        let section = self.sections.get(section_index)?;
        let question = section.questions.get(question_index)?;
        Some((section, question))
    }

    /// Raw item a question came from: same `id`, or identical question text.
    pub fn find_raw_item(&self, question: &QuestionResult) -> Option<&AnalysisItem> {
        self.raw_items.iter().find(|item| {
            if question.id.is_some() && item.id == question.id {
                return true;
            }
            item.question.as_deref() == Some(question.question.as_str())
        })
    }
}

impl AnalysisItem {
    fn from_record(record: &Record) -> Self {
        Self {
            id: string_field(record, "id"),
            section: string_field(record, "section"),
            question: string_field(record, "question"),
            answer: string_field(record, "answer"),
            is_question: coerce_bool(record.get("is_question")),
            is_correct: coerce_bool(record.get("is_correct")),
            correct_answer: string_field(record, "correct_answer"),
            comment: string_field(record, "comment"),
            subject: string_field(record, "subject")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            knowledge_points: knowledge_point_names(record.get("knowledge_points")),
            is_success: coerce_bool(record.get("isSuccess")),
            output: None,
        }
    }

    /// Single-question section synthesized from a flat question record
    fn fallback_section(&self, question: QuestionResult) -> OutputSection {
        let title = self
            .section
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNGROUPED_SECTION_TITLE);

        OutputSection {
            id: self.id.clone(),
            section: title.to_string(),
            subject: self.subject.clone(),
            knowledge_points: (!self.knowledge_points.is_empty())
                .then(|| self.knowledge_points.clone()),
            questions: vec![question],
        }
    }
}

/// Normalize a raw analysis payload.
///
/// Anything other than an array yields an empty result. Non-object array
/// elements are skipped. The input is only borrowed.
///
/// # Examples
///
/// ```
/// use mistakebook_domain::normalize_analysis;
/// use serde_json::json;
///
/// let raw = json!([{"output": [{"section": "S1", "questions": [{"question": "Q1"}]}]}]);
/// let result = normalize_analysis(&raw);
/// assert_eq!(result.sections.len(), 1);
/// assert_eq!(result.sections[0].questions[0].question, "Q1");
/// ```
pub fn normalize_analysis(raw: &Value) -> NormalizationResult {
    let Some(entries) = raw.as_array() else {
        return NormalizationResult::default();
    };

    let mut merger = SectionMerger::default();
    let mut raw_items = Vec::with_capacity(entries.len());

    for record in entries.iter().filter_map(Value::as_object) {
        let mut item = AnalysisItem::from_record(record);

        let output: Vec<OutputSection> = record
            .get("output")
            .and_then(Value::as_array)
            .map(|list| list.iter().filter_map(to_output_section).collect())
            .unwrap_or_default();

        if !output.is_empty() {
            for section in &output {
                merger.merge(section.clone());
            }
            item.output = Some(output);
        } else if let Some(question) = question_from_record(record) {
            merger.merge(item.fallback_section(question));
        }

        raw_items.push(item);
    }

    NormalizationResult {
        sections: merger.sections,
        raw_items,
    }
}

/// Accumulates sections, merging on `(title, id)`.
#[derive(Default)]
struct SectionMerger {
    sections: Vec<OutputSection>,
    positions: HashMap<(String, Option<String>), usize>,
}

impl SectionMerger {
    fn merge(&mut self, incoming: OutputSection) {
        let key = (incoming.section.clone(), incoming.id.clone());

        if let Some(&position) = self.positions.get(&key) {
            let existing = &mut self.sections[position];
            existing.questions.extend(incoming.questions);
            if existing.subject.is_none() {
                existing.subject = incoming.subject;
            }
            if existing.knowledge_points.is_none() {
                existing.knowledge_points = incoming.knowledge_points;
            }
            return;
        }

        self.positions.insert(key, self.sections.len());
        self.sections.push(incoming);
    }
}

fn to_question(value: &Value) -> Option<QuestionResult> {
    value.as_object().and_then(question_from_record)
}

fn question_from_record(record: &Record) -> Option<QuestionResult> {
    let text = record.get("question").and_then(Value::as_str)?.trim();
    if text.is_empty() {
        return None;
    }

    Some(QuestionResult {
        id: string_field(record, "id"),
        question: text.to_string(),
        answer: string_field(record, "answer"),
        correct_answer: string_field(record, "correct_answer"),
        is_correct: coerce_bool(record.get("is_correct")),
        comment: string_field(record, "comment"),
    })
}

fn to_output_section(value: &Value) -> Option<OutputSection> {
    let record = value.as_object()?;

    let title = record.get("section").and_then(Value::as_str)?.trim();
    if title.is_empty() {
        return None;
    }

    let questions: Vec<QuestionResult> = record
        .get("questions")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(to_question).collect())
        .unwrap_or_default();
    if questions.is_empty() {
        return None;
    }

    let knowledge_points = knowledge_point_names(first_present(
        record,
        &["knowledge_points", "knowledgeTags", "tags"],
    ));
    let subject = record
        .get("subject")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(OutputSection {
        id: string_field(record, "id"),
        section: title.to_string(),
        subject,
        knowledge_points: (!knowledge_points.is_empty()).then_some(knowledge_points),
        questions,
    })
}

/// Knowledge point names from a string list, a list of named objects, or
/// one delimited string.
fn knowledge_point_names(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(record) => ["name", "label", "title"]
                    .iter()
                    .find_map(|key| record.get(*key).and_then(Value::as_str))
                    .map(|s| s.trim().to_string()),
                _ => None,
            })
            .filter(|name| !name.is_empty())
            .collect(),
        Some(Value::String(s)) => split_trimmed(s, &[',', ';', '\n']),
        _ => Vec::new(),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(Value::from),
            "[ a-zQ,;\n]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            let keys = prop::sample::select(vec![
                "output", "section", "questions", "question", "id", "subject",
                "knowledge_points", "tags", "is_correct", "comment",
            ]);
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map(keys.prop_map(|k| k.to_string()), inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        /// Property: normalization never panics and upholds the non-empty invariants
        #[test]
        fn test_sections_never_empty(raw in arb_json()) {
            let result = normalize_analysis(&raw);
            for section in &result.sections {
                prop_assert!(!section.section.trim().is_empty());
                prop_assert!(!section.questions.is_empty());
                prop_assert!(section.knowledge_points.as_ref().map_or(true, |k| !k.is_empty()));
                for question in &section.questions {
                    prop_assert!(!question.question.is_empty());
                }
            }
        }

        /// Property: raw items count every object element of an array input
        #[test]
        fn test_raw_items_cover_records(items in prop::collection::vec(arb_json(), 0..8)) {
            let expected = items.iter().filter(|v| v.is_object()).count();
            let result = normalize_analysis(&Value::Array(items));
            prop_assert_eq!(result.raw_items.len(), expected);
        }
    }
}
