//! Detail normalization: any payload into a fully defaulted [`MistakeDetail`].
//!
//! Each field is resolved through its own [`FieldAliases`] table. A
//! [`MistakeDetail`] has no "missing" state, only "empty": arrays default to
//! empty and `analysis.summary` always carries text.

use crate::coerce::{
    finite_number, non_blank, split_trimmed, strict_bool, trimmed, FieldAliases, Record,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

/// Id of a detail that could not be identified
pub const UNKNOWN_DETAIL_ID: &str = "unknown";

/// Stem shown when the payload has none
pub const STEM_PLACEHOLDER: &str = "题干待补充";

/// Summary shown when the payload has no analysis text
pub const SUMMARY_PLACEHOLDER: &str = "AI 解析待补充。";

const ID: FieldAliases = FieldAliases::new(&["id", "mistake_id", "file_id"], &["id"]);
const STEM: FieldAliases =
    FieldAliases::new(&["stem", "question_text", "question"], &["question_text"]);
const STUDENT_ANSWER: FieldAliases =
    FieldAliases::new(&["student_answer", "answer"], &["student_answer"]);
const CORRECT_ANSWER: FieldAliases = FieldAliases::new(
    &["correct_answer", "standard_answer", "ai_answer"],
    &["correct_answer"],
);
const IS_CORRECT: FieldAliases = FieldAliases::new(&["is_correct", "correct"], &["is_correct"]);
const AI_SCORE: FieldAliases = FieldAliases::new(&["ai_score", "score"], &["ai_score"]);
const JUDGEMENT: FieldAliases = FieldAliases::new(
    &["ai_judgement", "judgement", "ai_result", "result", "status"],
    &[],
);
const IMAGE_URL: FieldAliases =
    FieldAliases::new(&["image_url", "preview_url", "file_url"], &["image_url"]);
const TAGS: FieldAliases = FieldAliases::new(&["tags", "labels"], &["tags"]);
const ERROR_REASONS: FieldAliases =
    FieldAliases::new(&["error_reasons", "error_reason"], &["error_reasons"]);
const KNOWLEDGE_POINTS: FieldAliases = FieldAliases::new(
    &["knowledge_points", "knowledge_point"],
    &["knowledge_points"],
);
const ANALYSIS: FieldAliases = FieldAliases::new(
    &["analysis", "ai_analysis", "comment", "ai_comment"],
    &["analysis"],
);
const SUBJECT: FieldAliases = FieldAliases::new(&["subject"], &["subject"]);
const DIFFICULTY: FieldAliases = FieldAliases::new(&["difficulty"], &["difficulty"]);
const GRADE: FieldAliases = FieldAliases::new(&["grade"], &["grade"]);
const SECTION: FieldAliases = FieldAliases::new(&["section", "chapter"], &["section"]);
const UPLOAD_TIME: FieldAliases = FieldAliases::new(
    &["upload_time", "created_at", "timestamp"],
    &["upload_time"],
);
const SOURCE: FieldAliases = FieldAliases::new(&["source", "origin"], &["source"]);

// Analysis sub-fields; no meta fallback
const SUMMARY: &[&str] = &["summary", "overview", "comment", "analysis"];
const HIGHLIGHTS: &[&str] = &["highlights", "key_points", "focus"];
const STEPS: &[&str] = &["steps", "solution", "solution_hint", "process"];
const SUGGESTIONS: &[&str] = &["suggestions", "next_steps", "improvement", "recommendations"];

// Knowledge point sub-fields
const KP_NAME: &[&str] = &["name", "label", "title", "point", "text"];
const KP_ID: &[&str] = &["id", "code", "slug"];
const KP_MASTERY: &[&str] = &["mastery", "level", "status"];

// List items given as objects
const LIST_ITEM_TEXT: &[&str] = &["text", "title", "label", "content"];

const LIST_SEPARATORS: &[char] = &['\n', '\u{2022}', '\u{2023}', '\u{25E6}', '\u{2043}', '\u{2219}'];

/// Coarse proficiency for a knowledge point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MasteryLevel {
    /// Mastered
    Strong,
    /// Partly mastered
    Medium,
    /// Needs work
    Weak,
    /// Not yet assessed
    Unknown,
}

impl MasteryLevel {
    /// Get the level name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            MasteryLevel::Strong => "strong",
            MasteryLevel::Medium => "medium",
            MasteryLevel::Weak => "weak",
            MasteryLevel::Unknown => "unknown",
        }
    }

    /// Match a label against the English and Chinese vocabularies
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "strong" | "good" | "掌握" | "熟练" | "high" => Some(MasteryLevel::Strong),
            "medium" | "一般" | "中等" | "normal" => Some(MasteryLevel::Medium),
            "weak" | "薄弱" | "low" | "待加强" | "poor" => Some(MasteryLevel::Weak),
            "unknown" | "未掌握" | "未知" => Some(MasteryLevel::Unknown),
            _ => None,
        }
    }

    /// Threshold a score: `>= 80` strong, `>= 60` medium, `> 0` weak
    pub fn from_score(score: f64) -> Option<Self> {
        if score >= 80.0 {
            Some(MasteryLevel::Strong)
        } else if score >= 60.0 {
            Some(MasteryLevel::Medium)
        } else if score > 0.0 {
            Some(MasteryLevel::Weak)
        } else {
            None
        }
    }

    /// Resolve from a raw string or number
    pub fn from_value(value: Option<&Value>) -> Option<Self> {
        match value? {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => n.as_f64().and_then(Self::from_score),
            _ => None,
        }
    }
}

impl std::str::FromStr for MasteryLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid mastery level: {}", s))
    }
}

/// The analysis engine's verdict on a student answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiJudgement {
    /// Answer is correct
    Correct,
    /// Answer is partly correct
    Partial,
    /// Answer is wrong
    Incorrect,
}

impl AiJudgement {
    /// Get the judgement name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AiJudgement::Correct => "correct",
            AiJudgement::Partial => "partial",
            AiJudgement::Incorrect => "incorrect",
        }
    }

    /// Match a label against the English and Chinese vocabularies
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "correct" | "right" | "pass" | "优秀" | "正确" | "ok" => Some(AiJudgement::Correct),
            "partial" | "partially_correct" | "半对" | "部分正确" | "partial_correct" => {
                Some(AiJudgement::Partial)
            }
            "incorrect" | "wrong" | "fail" | "错误" | "不通过" => Some(AiJudgement::Incorrect),
            _ => None,
        }
    }

    /// Map a correctness flag to a verdict
    pub fn from_bool(correct: bool) -> Self {
        if correct {
            AiJudgement::Correct
        } else {
            AiJudgement::Incorrect
        }
    }

    /// Resolve an explicit judgement, else fall back to the correctness flag.
    pub fn from_value(value: Option<&Value>, fallback: Option<bool>) -> Option<Self> {
        let explicit = match value {
            Some(Value::String(s)) => Self::parse(s),
            Some(Value::Bool(b)) => Some(Self::from_bool(*b)),
            _ => None,
        };
        explicit.or_else(|| fallback.map(Self::from_bool))
    }
}

impl std::str::FromStr for AiJudgement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid judgement: {}", s))
    }
}

/// A knowledge point attached to a mistake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgePointTag {
    /// Stable id, `kp-{index}` when the payload has none
    pub id: String,
    /// Display name, never empty
    pub name: String,
    /// Mastery, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mastery: Option<MasteryLevel>,
}

/// Structured explanation of a mistake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailAnalysis {
    /// Never empty
    pub summary: String,
    /// Key observations
    #[serde(default)]
    pub highlights: Vec<String>,
    /// Solution steps
    #[serde(default)]
    pub steps: Vec<String>,
    /// Study suggestions
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl Default for DetailAnalysis {
    fn default() -> Self {
        Self {
            summary: SUMMARY_PLACEHOLDER.to_string(),
            highlights: Vec::new(),
            steps: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

/// Descriptive metadata about where a mistake came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailMeta {
    /// Subject, e.g. 数学
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Difficulty label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// School grade
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
    /// Section or chapter title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Upload timestamp as sent by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_time: Option<String>,
    /// Where the question came from (file name, quiz, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// The view model behind the detail view.
///
/// Serializes with snake_case keys that are themselves accepted aliases,
/// so a serialized detail normalizes back to an identical value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MistakeDetail {
    /// Mistake identifier, [`UNKNOWN_DETAIL_ID`] when unresolved
    pub id: String,
    /// Question stem, [`STEM_PLACEHOLDER`] when unresolved
    pub stem: String,
    /// Student's answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_answer: Option<String>,
    /// Reference answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Correctness flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    /// Engine score
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_score: Option<f64>,
    /// Engine verdict
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_judgement: Option<AiJudgement>,
    /// Preview of the uploaded image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Why the answer went wrong
    #[serde(default)]
    pub error_reasons: Vec<String>,
    /// Knowledge points with mastery
    #[serde(default)]
    pub knowledge_points: Vec<KnowledgePointTag>,
    /// Structured explanation
    #[serde(default)]
    pub analysis: DetailAnalysis,
    /// Provenance
    #[serde(default)]
    pub meta: DetailMeta,
}

impl Default for MistakeDetail {
    fn default() -> Self {
        Self {
            id: UNKNOWN_DETAIL_ID.to_string(),
            stem: STEM_PLACEHOLDER.to_string(),
            student_answer: None,
            correct_answer: None,
            is_correct: None,
            ai_score: None,
            ai_judgement: None,
            image_url: None,
            tags: Vec::new(),
            error_reasons: Vec::new(),
            knowledge_points: Vec::new(),
            analysis: DetailAnalysis::default(),
            meta: DetailMeta::default(),
        }
    }
}

impl MistakeDetail {
    /// True when the id could not be resolved from the payload
    pub fn has_unknown_id(&self) -> bool {
        self.id.is_empty() || self.id == UNKNOWN_DETAIL_ID
    }
}

/// Normalize any payload into a complete [`MistakeDetail`].
///
/// Non-object input returns the default detail.
///
/// # Examples
///
/// ```
/// use mistakebook_domain::{normalize_mistake_detail, AiJudgement};
/// use serde_json::json;
///
/// let detail = normalize_mistake_detail(&json!({"is_correct": true}));
/// assert_eq!(detail.ai_judgement, Some(AiJudgement::Correct));
/// ```
pub fn normalize_mistake_detail(payload: &Value) -> MistakeDetail {
    let Some(record) = payload.as_object() else {
        return MistakeDetail::default();
    };
    let meta = record.get("meta").and_then(Value::as_object);
    let field = |aliases: FieldAliases| aliases.resolve(record, meta);

    let is_correct = strict_bool(field(IS_CORRECT));
    let id = trimmed(field(ID));
    let stem = trimmed(field(STEM));

    MistakeDetail {
        id: if id.is_empty() { UNKNOWN_DETAIL_ID.to_string() } else { id },
        stem: if stem.is_empty() { STEM_PLACEHOLDER.to_string() } else { stem },
        student_answer: non_blank(field(STUDENT_ANSWER)),
        correct_answer: non_blank(field(CORRECT_ANSWER)),
        is_correct,
        ai_score: finite_number(field(AI_SCORE)),
        ai_judgement: AiJudgement::from_value(field(JUDGEMENT), is_correct),
        image_url: non_blank(field(IMAGE_URL)),
        tags: text_list(field(TAGS)),
        error_reasons: text_list(field(ERROR_REASONS)),
        knowledge_points: knowledge_points(field(KNOWLEDGE_POINTS)),
        analysis: build_analysis(field(ANALYSIS)),
        meta: DetailMeta {
            subject: non_blank(field(SUBJECT)),
            difficulty: non_blank(field(DIFFICULTY)),
            grade: non_blank(field(GRADE)),
            section: non_blank(field(SECTION)),
            upload_time: non_blank(field(UPLOAD_TIME)),
            source: non_blank(field(SOURCE)),
        },
    }
}

/// Independent copy of a detail; nothing is shared with the original.
pub fn clone_detail(detail: &MistakeDetail) -> MistakeDetail {
    detail.clone()
}

static MOCK_DETAIL: LazyLock<MistakeDetail> = LazyLock::new(|| MistakeDetail {
    id: "mock-detail".to_string(),
    stem: "计算：1/2 + 1/3 = ?".to_string(),
    student_answer: Some("1/5".to_string()),
    correct_answer: Some("5/6".to_string()),
    is_correct: Some(false),
    ai_score: Some(40.0),
    ai_judgement: Some(AiJudgement::Incorrect),
    image_url: None,
    tags: strings(&["基础运算", "易错题"]),
    error_reasons: strings(&["通分步骤错误", "忽略最小公倍数"]),
    knowledge_points: vec![
        KnowledgePointTag {
            id: "kp-1".to_string(),
            name: "分数加减".to_string(),
            mastery: Some(MasteryLevel::Weak),
        },
        KnowledgePointTag {
            id: "kp-2".to_string(),
            name: "最小公倍数".to_string(),
            mastery: Some(MasteryLevel::Medium),
        },
    ],
    analysis: DetailAnalysis {
        summary: "学生在通分步骤出现错误，导致最终结果偏差。".to_string(),
        highlights: strings(&["未求出 2 与 3 的最小公倍数", "通分后未正确相加分子"]),
        steps: strings(&[
            "确定 2 与 3 的最小公倍数为 6",
            "将 1/2 转换为 3/6，将 1/3 转换为 2/6",
            "相加得到 (3 + 2) / 6 = 5/6",
        ]),
        suggestions: strings(&[
            "复习分数加减法的通分方法",
            "完成 3 道与分数通分相关的巩固练习",
        ]),
    },
    meta: DetailMeta {
        subject: Some("数学".to_string()),
        difficulty: Some("中等".to_string()),
        grade: None,
        section: Some("分数计算".to_string()),
        upload_time: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        source: Some("课堂测验".to_string()),
    },
});

/// The built-in sample record. Copy it with [`clone_detail`] before changing anything.
pub fn mock_mistake_detail() -> &'static MistakeDetail {
    &MOCK_DETAIL
}

/// Sample record standing in for a detail that could not be fetched.
///
/// The copy carries `id` so the view still reflects what was requested.
pub fn fallback_detail(id: &str) -> MistakeDetail {
    let mut fallback = clone_detail(mock_mistake_detail());
    if !id.is_empty() {
        fallback.id = id.to_string();
    }
    fallback
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn first_in<'a>(record: &'a Record, keys: &[&str]) -> Option<&'a Value> {
    crate::coerce::first_present(record, keys)
}

/// Text list from a string array, an array of text-bearing objects, or one
/// string split on newlines and bullets.
fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.trim().to_string(),
                Value::Object(record) => trimmed(first_in(record, LIST_ITEM_TEXT)),
                _ => String::new(),
            })
            .filter(|text| !text.is_empty())
            .collect(),
        Some(Value::String(s)) => split_trimmed(s, LIST_SEPARATORS),
        _ => Vec::new(),
    }
}

fn knowledge_points(value: Option<&Value>) -> Vec<KnowledgePointTag> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::String(s) => {
                let name = s.trim();
                (!name.is_empty()).then(|| KnowledgePointTag {
                    id: format!("kp-{}", index),
                    name: name.to_string(),
                    mastery: None,
                })
            }
            Value::Object(record) => {
                let name = trimmed(first_in(record, KP_NAME));
                if name.is_empty() {
                    return None;
                }
                let id = trimmed(first_in(record, KP_ID));
                Some(KnowledgePointTag {
                    id: if id.is_empty() { format!("kp-{}", index) } else { id },
                    name,
                    mastery: MasteryLevel::from_value(first_in(record, KP_MASTERY)),
                })
            }
            _ => None,
        })
        .collect()
}

fn build_analysis(value: Option<&Value>) -> DetailAnalysis {
    match value {
        Some(Value::String(s)) => {
            let summary = s.trim();
            DetailAnalysis {
                summary: if summary.is_empty() {
                    SUMMARY_PLACEHOLDER.to_string()
                } else {
                    summary.to_string()
                },
                ..DetailAnalysis::default()
            }
        }
        Some(Value::Object(record)) => {
            let summary = trimmed(first_in(record, SUMMARY));
            DetailAnalysis {
                summary: if summary.is_empty() {
                    SUMMARY_PLACEHOLDER.to_string()
                } else {
                    summary
                },
                highlights: text_list(first_in(record, HIGHLIGHTS)),
                steps: text_list(first_in(record, STEPS)),
                suggestions: text_list(first_in(record, SUGGESTIONS)),
            }
        }
        _ => DetailAnalysis::default(),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (-100i32..200).prop_map(Value::from),
            prop::sample::select(vec![
                "correct", "部分正确", "wrong", "strong", "一般", "", "  ", "a\nb", "x • y", "kp",
            ])
            .prop_map(|s| Value::String(s.to_string())),
        ]
    }

    fn arb_payload() -> impl Strategy<Value = Value> {
        let keys = prop::sample::select(vec![
            "id", "mistake_id", "file_id", "stem", "question", "answer", "correct_answer",
            "is_correct", "correct", "score", "ai_judgement", "status", "tags", "labels",
            "error_reasons", "knowledge_points", "analysis", "comment", "subject", "section",
            "upload_time", "source", "meta", "summary", "steps", "name", "mastery", "level",
            "text", "highlights",
        ]);
        arb_leaf().prop_recursive(3, 40, 6, move |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                prop::collection::btree_map(keys.clone().prop_map(|k| k.to_string()), inner, 0..8)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        /// Property: normalizing a serialized detail reproduces it exactly
        #[test]
        fn test_normalize_is_idempotent(payload in arb_payload()) {
            let first = normalize_mistake_detail(&payload);
            let reserialized = serde_json::to_value(&first).unwrap();
            prop_assert_eq!(normalize_mistake_detail(&reserialized), first);
        }

        /// Property: placeholders keep the required fields populated
        #[test]
        fn test_required_fields_never_empty(payload in arb_payload()) {
            let detail = normalize_mistake_detail(&payload);
            prop_assert!(!detail.id.is_empty());
            prop_assert!(!detail.stem.is_empty());
            prop_assert!(!detail.analysis.summary.is_empty());
            prop_assert!(detail.knowledge_points.iter().all(|kp| !kp.name.is_empty()));
        }
    }
}
