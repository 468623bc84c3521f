//! Drill-down from an analyzed upload into a single question's detail.

use crate::analysis::NormalizationResult;
use crate::detail::{normalize_mistake_detail, KnowledgePointTag, MasteryLevel, MistakeDetail};
use crate::records::UploadImageResponse;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Position of a question inside normalized sections, zero-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionSelection {
    /// Index into `sections`
    pub section_index: usize,
    /// Index into that section's `questions`
    pub question_index: usize,
}

impl QuestionSelection {
    /// Create a selection
    pub fn new(section_index: usize, question_index: usize) -> Self {
        Self {
            section_index,
            question_index,
        }
    }

    /// Parse a one-based `S:Q` pair, as typed by a user
    pub fn parse(s: &str) -> Option<Self> {
        let (section, question) = s.split_once(':')?;
        let section: usize = section.trim().parse().ok()?;
        let question: usize = question.trim().parse().ok()?;
        Some(Self::new(section.checked_sub(1)?, question.checked_sub(1)?))
    }
}

impl std::str::FromStr for QuestionSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid selection '{}', expected SECTION:QUESTION (1-based)", s))
    }
}

/// Build the detail for a selected question, or `None` when the indices
/// point nowhere.
///
/// The raw item behind the question supplies subject, comment, and
/// knowledge points ahead of the section's. Knowledge points without
/// mastery inherit it from the question's correctness.
pub fn detail_for_selection(
    upload: &UploadImageResponse,
    analysis: &NormalizationResult,
    selection: QuestionSelection,
) -> Option<MistakeDetail> {
    let (section, question) = analysis.question(selection.section_index, selection.question_index)?;
    let raw_item = analysis.find_raw_item(question);

    let file_id = if upload.file_id.is_empty() {
        "preview"
    } else {
        upload.file_id.as_str()
    };
    let fallback_id = format!(
        "{}-{}-{}",
        file_id,
        selection.section_index + 1,
        selection.question_index + 1
    );
    let id = question
        .id
        .clone()
        .or_else(|| raw_item.and_then(|item| item.id.clone()))
        .unwrap_or(fallback_id);

    let subject = raw_item
        .and_then(|item| item.subject.clone())
        .or_else(|| section.subject.clone());
    let knowledge_point_names: Vec<String> = match raw_item {
        Some(item) if !item.knowledge_points.is_empty() => item.knowledge_points.clone(),
        _ => section.knowledge_points.clone().unwrap_or_default(),
    };
    let mastery = match question.is_correct {
        Some(false) => MasteryLevel::Weak,
        Some(true) => MasteryLevel::Strong,
        None => MasteryLevel::Unknown,
    };
    let comment = raw_item
        .and_then(|item| item.comment.clone())
        .or_else(|| question.comment.clone());

    let mut candidate = Map::new();
    candidate.insert("id".into(), json!(id));
    candidate.insert("question".into(), json!(question.question));
    candidate.insert("section".into(), json!(section.section));
    candidate.insert("image_url".into(), json!(upload.file_url));
    candidate.insert("knowledge_points".into(), json!(knowledge_point_names));
    candidate.insert("tags".into(), json!(knowledge_point_names));
    candidate.insert(
        "analysis".into(),
        json!(comment.clone().unwrap_or_else(|| section.section.clone())),
    );
    insert_opt(&mut candidate, "subject", subject.as_deref());
    insert_opt(&mut candidate, "answer", question.answer.as_deref());
    insert_opt(&mut candidate, "correct_answer", question.correct_answer.as_deref());
    insert_opt(&mut candidate, "comment", comment.as_deref());
    if let Some(is_correct) = question.is_correct {
        candidate.insert("is_correct".into(), json!(is_correct));
    }
    candidate.insert(
        "meta".into(),
        json!({
            "section": section.section,
            "subject": subject,
            "upload_time": upload.upload_time,
            "source": upload.filename,
        }),
    );

    let mut detail = normalize_mistake_detail(&Value::Object(candidate));

    if detail.knowledge_points.is_empty() {
        detail.knowledge_points = knowledge_point_names
            .iter()
            .enumerate()
            .map(|(index, name)| KnowledgePointTag {
                id: format!("kp-{}", index + 1),
                name: name.clone(),
                mastery: Some(mastery),
            })
            .collect();
    } else {
        for kp in &mut detail.knowledge_points {
            kp.mastery.get_or_insert(mastery);
        }
    }

    if detail.tags.is_empty() {
        detail.tags = knowledge_point_names;
    }
    if detail.meta.subject.is_none() {
        detail.meta.subject = subject;
    }

    Some(detail)
}

fn insert_opt(candidate: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        candidate.insert(key.to_string(), json!(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalize_analysis;
    use crate::detail::AiJudgement;

    fn upload(coze_analysis: Value) -> UploadImageResponse {
        UploadImageResponse {
            status: "success".to_string(),
            file_id: "f-42".to_string(),
            filename: "homework.jpg".to_string(),
            file_url: "/uploads/f-42.jpg".to_string(),
            upload_time: "2024-06-01T09:30:00".to_string(),
            coze_analysis,
            ..UploadImageResponse::default()
        }
    }

    #[test]
    fn test_selection_builds_detail_from_section() {
        let upload = upload(json!([{
            "output": [{
                "section": "分数计算",
                "subject": "数学",
                "knowledge_points": ["通分", "最小公倍数"],
                "questions": [
                    {"question": "1/2 + 1/3 = ?", "answer": "2/5", "correct_answer": "5/6", "is_correct": false, "comment": "通分错误"}
                ]
            }]
        }]));
        let analysis = normalize_analysis(&upload.coze_analysis);

        let detail = detail_for_selection(&upload, &analysis, QuestionSelection::new(0, 0)).unwrap();
        assert_eq!(detail.id, "f-42-1-1");
        assert_eq!(detail.stem, "1/2 + 1/3 = ?");
        assert_eq!(detail.student_answer.as_deref(), Some("2/5"));
        assert_eq!(detail.ai_judgement, Some(AiJudgement::Incorrect));
        assert_eq!(detail.analysis.summary, "通分错误");
        assert_eq!(detail.tags, vec!["通分", "最小公倍数"]);
        assert_eq!(detail.knowledge_points.len(), 2);
        assert!(detail
            .knowledge_points
            .iter()
            .all(|kp| kp.mastery == Some(MasteryLevel::Weak)));
        assert_eq!(detail.meta.subject.as_deref(), Some("数学"));
        assert_eq!(detail.meta.section.as_deref(), Some("分数计算"));
        assert_eq!(detail.meta.source.as_deref(), Some("homework.jpg"));
        assert_eq!(detail.image_url.as_deref(), Some("/uploads/f-42.jpg"));
    }

    #[test]
    fn test_raw_item_overrides_section() {
        let upload = upload(json!([
            {"id": "q-1", "section": "口算", "question": "3 × 4", "answer": "12", "is_correct": "true",
             "subject": "Math", "knowledge_points": "乘法口诀", "comment": "正确"}
        ]));
        let analysis = normalize_analysis(&upload.coze_analysis);

        let detail = detail_for_selection(&upload, &analysis, QuestionSelection::new(0, 0)).unwrap();
        assert_eq!(detail.id, "q-1");
        assert_eq!(detail.ai_judgement, Some(AiJudgement::Correct));
        assert_eq!(detail.knowledge_points[0].name, "乘法口诀");
        assert_eq!(detail.knowledge_points[0].mastery, Some(MasteryLevel::Strong));
        assert_eq!(detail.meta.subject.as_deref(), Some("Math"));
    }

    #[test]
    fn test_missing_comment_uses_section_title() {
        let mut upload = upload(json!([{"output": [{"section": "填空", "questions": [{"question": "x"}]}]}]));
        upload.file_id.clear();
        let analysis = normalize_analysis(&upload.coze_analysis);

        let detail = detail_for_selection(&upload, &analysis, QuestionSelection::new(0, 0)).unwrap();
        assert_eq!(detail.id, "preview-1-1");
        assert_eq!(detail.analysis.summary, "填空");
        assert_eq!(detail.ai_judgement, None);
        assert!(detail.knowledge_points.is_empty());
    }

    #[test]
    fn test_out_of_range_selection() {
        let upload = upload(json!([]));
        let analysis = normalize_analysis(&upload.coze_analysis);
        assert!(detail_for_selection(&upload, &analysis, QuestionSelection::new(0, 0)).is_none());
    }

    #[test]
    fn test_parse_one_based_pair() {
        assert_eq!(QuestionSelection::parse("2:3"), Some(QuestionSelection::new(1, 2)));
        assert_eq!(QuestionSelection::parse("0:1"), None);
        assert_eq!(QuestionSelection::parse("1"), None);
        assert!("a:b".parse::<QuestionSelection>().is_err());
    }
}
