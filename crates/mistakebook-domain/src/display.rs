//! Display cleaning for the detail view.
//!
//! Upstream extraction sometimes puts the whole stem into a tag or a
//! knowledge point. These helpers filter such entries out and clip the rest
//! to a displayable length. Lengths are counted in characters.

use crate::detail::{AiJudgement, KnowledgePointTag, MasteryLevel, MistakeDetail};

/// Longest knowledge point name shown
pub const MAX_KNOWLEDGE_POINT_CHARS: usize = 20;

/// Longest tag shown
pub const MAX_TAG_CHARS: usize = 16;

/// Label shown for a knowledge point without mastery
pub const UNLABELED_MASTERY: &str = "待标注";

/// How a judgement badge should be colored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Good news
    Positive,
    /// Mixed
    Neutral,
    /// Needs correcting
    Negative,
}

/// True when `text` is probably the stem pasted into a label.
///
/// Either it equals the stem once whitespace is removed, or it is longer
/// than `max(40, floor(0.8 * stem_len))` characters.
pub fn looks_like_stem(text: &str, stem: &str) -> bool {
    if text.is_empty() || stem.is_empty() {
        return false;
    }
    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    if strip(text) == strip(stem) {
        return true;
    }
    let stem_len = stem.chars().count();
    let limit = (MAX_KNOWLEDGE_POINT_CHARS * 2).max(stem_len * 4 / 5);
    text.chars().count() > limit
}

fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Knowledge points fit for display, names clipped.
pub fn clean_knowledge_points(detail: &MistakeDetail) -> Vec<KnowledgePointTag> {
    detail
        .knowledge_points
        .iter()
        .filter(|kp| !kp.name.is_empty() && !looks_like_stem(&kp.name, &detail.stem))
        .map(|kp| KnowledgePointTag {
            name: clip(&kp.name, MAX_KNOWLEDGE_POINT_CHARS),
            ..kp.clone()
        })
        .collect()
}

/// Tags fit for display, clipped.
pub fn clean_tags(detail: &MistakeDetail) -> Vec<String> {
    detail
        .tags
        .iter()
        .filter(|tag| !tag.is_empty() && !looks_like_stem(tag, &detail.stem))
        .map(|tag| clip(tag, MAX_TAG_CHARS))
        .collect()
}

/// Badge label and tone for a judgement
pub fn judgement_label(judgement: AiJudgement) -> (&'static str, Tone) {
    match judgement {
        AiJudgement::Correct => ("AI 判定：正确", Tone::Positive),
        AiJudgement::Partial => ("AI 判定：部分正确", Tone::Neutral),
        AiJudgement::Incorrect => ("AI 判定：待纠正", Tone::Negative),
    }
}

/// Legend label for a mastery level; absent mastery reads as unlabeled
pub fn mastery_label(mastery: Option<MasteryLevel>) -> &'static str {
    match mastery {
        Some(MasteryLevel::Strong) => "掌握良好",
        Some(MasteryLevel::Medium) => "基本掌握",
        Some(MasteryLevel::Weak) => "待加强",
        Some(MasteryLevel::Unknown) | None => UNLABELED_MASTERY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_with(stem: &str, tags: &[&str], kps: &[&str]) -> MistakeDetail {
        MistakeDetail {
            stem: stem.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            knowledge_points: kps
                .iter()
                .enumerate()
                .map(|(i, name)| KnowledgePointTag {
                    id: format!("kp-{}", i),
                    name: name.to_string(),
                    mastery: None,
                })
                .collect(),
            ..MistakeDetail::default()
        }
    }

    #[test]
    fn test_looks_like_stem_whitespace_insensitive() {
        assert!(looks_like_stem("1/2 + 1/3", "1/2+1/3"));
        assert!(!looks_like_stem("", "stem"));
        assert!(!looks_like_stem("text", ""));
        assert!(!looks_like_stem("分数", "计算：1/2 + 1/3 = ?"));
    }

    #[test]
    fn test_looks_like_stem_length_limit() {
        let stem = "x".repeat(100);
        // limit is max(40, 80) = 80
        assert!(!looks_like_stem(&"y".repeat(80), &stem));
        assert!(looks_like_stem(&"y".repeat(81), &stem));

        // short stems fall back to the 40 char floor
        assert!(!looks_like_stem(&"y".repeat(40), "short"));
        assert!(looks_like_stem(&"y".repeat(41), "short"));
    }

    #[test]
    fn test_clean_drops_stem_copies_and_clips() {
        let long_kp = "一二三四五六七八九十一二三四五六七八九十多出来";
        let detail = detail_with(
            "计算 1/2 + 1/3",
            &["计算1/2+1/3", "基础运算", "一个非常非常非常非常长的标签名字"],
            &["计算 1/2 +1/3", long_kp, "分数"],
        );

        let tags = clean_tags(&detail);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0], "基础运算");
        assert_eq!(tags[1].chars().count(), MAX_TAG_CHARS);

        let kps = clean_knowledge_points(&detail);
        assert_eq!(kps.len(), 2);
        assert_eq!(kps[0].name.chars().count(), MAX_KNOWLEDGE_POINT_CHARS);
        assert_eq!(kps[0].id, "kp-1");
        assert_eq!(kps[1].name, "分数");
    }

    #[test]
    fn test_labels() {
        assert_eq!(judgement_label(AiJudgement::Partial), ("AI 判定：部分正确", Tone::Neutral));
        assert_eq!(judgement_label(AiJudgement::Incorrect).1, Tone::Negative);
        assert_eq!(mastery_label(Some(MasteryLevel::Strong)), "掌握良好");
        assert_eq!(mastery_label(None), "待标注");
        assert_eq!(mastery_label(Some(MasteryLevel::Unknown)), "待标注");
    }
}
