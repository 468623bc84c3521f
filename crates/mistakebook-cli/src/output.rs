//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use mistakebook_domain::{
    clean_knowledge_points, clean_tags, judgement_label, mastery_label, MistakeDetail,
    MistakeRecord, NormalizationResult, Page, PracticeSession, Tone, WeakPointStat,
};
use serde_json::json;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Longest question text shown in list tables
const QUESTION_COLUMN_CHARS: usize = 30;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format normalized analysis sections.
    pub fn format_analysis(&self, analysis: &NormalizationResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&analysis.sections)?),
            OutputFormat::Quiet => Ok(analysis
                .sections
                .iter()
                .enumerate()
                .flat_map(|(si, section)| {
                    (0..section.questions.len()).map(move |qi| format!("{}:{}", si + 1, qi + 1))
                })
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => Ok(self.format_analysis_table(analysis)),
        }
    }

    fn format_analysis_table(&self, analysis: &NormalizationResult) -> String {
        if analysis.is_empty() {
            return self.colorize("暂未解析出结构化题目，请检查返回数据。", "yellow");
        }

        let mut out = Vec::new();
        for (si, section) in analysis.sections.iter().enumerate() {
            let mut heading = format!("[{}] {}", si + 1, section.section);
            if let Some(subject) = &section.subject {
                heading.push_str(&format!(" · {}", subject));
            }
            out.push(self.colorize(&heading, "cyan"));
            if let Some(points) = &section.knowledge_points {
                out.push(format!("知识点: {}", points.join("、")));
            }

            let mut builder = Builder::default();
            builder.push_record(["#", "Question", "Answer", "Correct answer", "Result"]);
            for (qi, question) in section.questions.iter().enumerate() {
                let verdict = match question.is_correct {
                    Some(true) => self.colorize("✓", "green"),
                    Some(false) => self.colorize("✗", "red"),
                    None => "-".to_string(),
                };
                builder.push_record([
                    format!("{}:{}", si + 1, qi + 1),
                    truncate(&question.question, QUESTION_COLUMN_CHARS),
                    question.answer.clone().unwrap_or_default(),
                    question.correct_answer.clone().unwrap_or_default(),
                    verdict,
                ]);
            }
            out.push(styled(builder));
        }

        out.push(format!(
            "{} section(s), {} question(s)",
            analysis.sections.len(),
            analysis.question_count()
        ));
        out.join("\n")
    }

    /// Format a mistake detail.
    pub fn format_detail(&self, detail: &MistakeDetail) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(detail)?),
            OutputFormat::Quiet => Ok(detail.id.clone()),
            OutputFormat::Table => Ok(self.format_detail_table(detail)),
        }
    }

    fn format_detail_table(&self, detail: &MistakeDetail) -> String {
        let mut builder = Builder::default();
        builder.push_record(["ID", detail.id.as_str()]);
        builder.push_record(["题干", detail.stem.as_str()]);
        if let Some(answer) = &detail.student_answer {
            builder.push_record(["学生答案", answer.as_str()]);
        }
        if let Some(answer) = &detail.correct_answer {
            builder.push_record(["正确答案", answer.as_str()]);
        }
        if let Some(judgement) = detail.ai_judgement {
            let (label, tone) = judgement_label(judgement);
            let color = match tone {
                Tone::Positive => "green",
                Tone::Neutral => "yellow",
                Tone::Negative => "red",
            };
            builder.push_record(["判定".to_string(), self.colorize(label, color)]);
        }
        if let Some(score) = detail.ai_score {
            builder.push_record(["得分".to_string(), format!("{}", score)]);
        }
        let meta = [
            ("科目", &detail.meta.subject),
            ("章节", &detail.meta.section),
            ("难度", &detail.meta.difficulty),
            ("年级", &detail.meta.grade),
            ("上传时间", &detail.meta.upload_time),
            ("来源", &detail.meta.source),
        ];
        for (label, value) in meta {
            if let Some(value) = value {
                builder.push_record([label, value.as_str()]);
            }
        }
        if let Some(url) = &detail.image_url {
            builder.push_record(["图片", url.as_str()]);
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        let mut out = vec![table.to_string()];

        let points = clean_knowledge_points(detail);
        if !points.is_empty() {
            out.push(self.colorize("知识点掌握", "cyan"));
            for point in points {
                out.push(format!("  • {} ({})", point.name, mastery_label(point.mastery)));
            }
        }

        let tags = clean_tags(detail);
        if !tags.is_empty() {
            out.push(format!("标签: {}", tags.join("、")));
        }
        if !detail.error_reasons.is_empty() {
            out.push(format!("错误原因: {}", detail.error_reasons.join("；")));
        }

        out.push(self.colorize("AI 解析", "cyan"));
        out.push(format!("  {}", detail.analysis.summary));
        let lists = [
            ("关键点", &detail.analysis.highlights),
            ("解题步骤", &detail.analysis.steps),
            ("学习建议", &detail.analysis.suggestions),
        ];
        for (title, items) in lists {
            if items.is_empty() {
                continue;
            }
            out.push(format!("{}:", title));
            for (i, item) in items.iter().enumerate() {
                out.push(format!("  {}. {}", i + 1, item));
            }
        }

        out.join("\n")
    }

    /// Format a page of stored mistakes.
    pub fn format_records(&self, page: &Page<&MistakeRecord>) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(page)?),
            OutputFormat::Quiet => Ok(page
                .items
                .iter()
                .map(|r| r.mistake_record_id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if page.items.is_empty() {
                    return Ok(self.colorize("No mistakes found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Subject", "Question", "Knowledge point", "Error type", "Uploaded"]);
                for record in &page.items {
                    builder.push_record([
                        record.mistake_record_id.to_string(),
                        record.analysis.subject.clone(),
                        truncate(&record.analysis.question, QUESTION_COLUMN_CHARS),
                        record.analysis.knowledge_point.clone().unwrap_or_default(),
                        record.analysis.error_type.clone().unwrap_or_default(),
                        record.upload_time().to_string(),
                    ]);
                }

                Ok(format!(
                    "{}\n第 {}/{} 页，共 {} 道错题",
                    styled(builder),
                    page.page,
                    page.total_pages.max(1),
                    page.total_items
                ))
            }
        }
    }

    /// Format weak knowledge point statistics.
    pub fn format_weak_points(&self, stats: &[WeakPointStat]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
            OutputFormat::Quiet => Ok(stats
                .iter()
                .map(|s| s.knowledge_point.clone())
                .collect::<Vec<_>>()
                .join("\n")),
            OutputFormat::Table => {
                if stats.is_empty() {
                    return Ok(self.colorize("No weak points found.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["Knowledge point", "Subject", "Wrong", "Total", "Error rate"]);
                for stat in stats {
                    builder.push_record([
                        stat.knowledge_point.clone(),
                        stat.subject.clone(),
                        stat.incorrect_count.to_string(),
                        stat.total_count.to_string(),
                        format!("{:.0}%", stat.error_rate * 100.0),
                    ]);
                }
                Ok(styled(builder))
            }
        }
    }

    /// Format a graded practice session.
    pub fn format_practice(&self, session: &PracticeSession) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let results: Vec<_> = session
                    .questions()
                    .iter()
                    .enumerate()
                    .map(|(i, q)| {
                        let answer = session.answer(i);
                        json!({
                            "id": q.id,
                            "question": q.question,
                            "answer": answer.map(|(a, _)| a),
                            "correct": answer.map(|(_, c)| c),
                            "correctAnswer": q.correct_answer,
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json!({
                    "results": results,
                    "answered": session.answered_count(),
                    "correct": session.correct_count(),
                    "accuracy": session.accuracy(),
                }))?)
            }
            OutputFormat::Quiet => Ok(session.accuracy().to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["#", "Question", "Your answer", "Correct answer", "Result"]);
                for (i, question) in session.questions().iter().enumerate() {
                    let (answer, verdict) = match session.answer(i) {
                        Some((answer, true)) => (answer.to_string(), self.colorize("✓", "green")),
                        Some((answer, false)) => (answer.to_string(), self.colorize("✗", "red")),
                        None => (String::new(), "-".to_string()),
                    };
                    builder.push_record([
                        (i + 1).to_string(),
                        truncate(&question.question, QUESTION_COLUMN_CHARS),
                        answer,
                        question.correct_answer.clone(),
                        verdict,
                    ]);
                }
                Ok(format!(
                    "{}\n正确 {}/{}，正确率 {}%",
                    styled(builder),
                    session.correct_count(),
                    session.answered_count(),
                    session.accuracy()
                ))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn styled(builder: Builder) -> String {
    let mut table = builder.build();
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

/// Clip to `max_chars` characters, marking the cut with `…`.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut clipped: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}
