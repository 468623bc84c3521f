//! Error-book browsing: filter, sort, and paginate stored mistakes.

use crate::records::MistakeRecord;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How far back to look, relative to now
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    /// No time restriction
    #[default]
    All,
    /// Same calendar day (UTC)
    Today,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
    /// Last 90 days
    Quarter,
}

impl TimeWindow {
    /// Get the window name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::All => "all",
            TimeWindow::Today => "today",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
            TimeWindow::Quarter => "quarter",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(TimeWindow::All),
            "today" => Some(TimeWindow::Today),
            "week" => Some(TimeWindow::Week),
            "month" => Some(TimeWindow::Month),
            "quarter" => Some(TimeWindow::Quarter),
            _ => None,
        }
    }

    /// Whether `timestamp` falls inside this window as seen at `now`
    pub fn contains(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let days = match self {
            TimeWindow::All => return true,
            TimeWindow::Today => return timestamp.date_naive() == now.date_naive(),
            TimeWindow::Week => 7,
            TimeWindow::Month => 30,
            TimeWindow::Quarter => 90,
        };
        timestamp >= now - Duration::days(days)
    }
}

impl std::str::FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid time window: {}", s))
    }
}

/// Column to sort the error book by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortField {
    /// Question text
    Question,
    /// Subject
    Subject,
    /// Knowledge point label
    KnowledgePoint,
    /// Error classification
    ErrorType,
    /// Upload time
    UploadTime,
}

impl SortField {
    /// Get the field name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Question => "question",
            SortField::Subject => "subject",
            SortField::KnowledgePoint => "knowledge-point",
            SortField::ErrorType => "error-type",
            SortField::UploadTime => "upload-time",
        }
    }

    /// Parse from string; `_` and `-` are interchangeable
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "question" => Some(SortField::Question),
            "subject" => Some(SortField::Subject),
            "knowledge-point" => Some(SortField::KnowledgePoint),
            "error-type" | "reason" => Some(SortField::ErrorType),
            "upload-time" | "date" => Some(SortField::UploadTime),
            _ => None,
        }
    }

    fn key<'a>(&self, record: &'a MistakeRecord) -> &'a str {
        match self {
            SortField::Question => &record.analysis.question,
            SortField::Subject => &record.analysis.subject,
            SortField::KnowledgePoint => record.analysis.knowledge_point.as_deref().unwrap_or(""),
            SortField::ErrorType => record.analysis.error_type.as_deref().unwrap_or(""),
            SortField::UploadTime => record.upload_time(),
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid sort field: {}", s))
    }
}

/// Sort order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// Criteria for narrowing the error book
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MistakeFilter {
    /// Case-insensitive substring of the question text
    pub search_term: Option<String>,
    /// Accepted subjects, compared case-insensitively; empty accepts all
    pub subjects: Vec<String>,
    /// Accepted error types, compared case-insensitively; empty accepts all
    pub error_types: Vec<String>,
    /// Upload-time window
    pub window: TimeWindow,
    /// Optional ordering
    pub sort: Option<(SortField, SortDirection)>,
}

impl MistakeFilter {
    /// Whether a record passes every criterion
    pub fn matches(&self, record: &MistakeRecord, now: DateTime<Utc>) -> bool {
        if let Some(term) = self.search_term.as_deref().filter(|t| !t.is_empty()) {
            if !record
                .analysis
                .question
                .to_lowercase()
                .contains(&term.to_lowercase())
            {
                return false;
            }
        }

        if !in_set(&self.subjects, Some(&record.analysis.subject)) {
            return false;
        }
        if !in_set(&self.error_types, record.analysis.error_type.as_deref()) {
            return false;
        }

        match self.window {
            TimeWindow::All => true,
            window => parse_timestamp(record.upload_time())
                .is_some_and(|timestamp| window.contains(timestamp, now)),
        }
    }

    /// Matching records, sorted if requested. Ties keep input order.
    pub fn apply<'a>(&self, records: &'a [MistakeRecord], now: DateTime<Utc>) -> Vec<&'a MistakeRecord> {
        let mut matched: Vec<&MistakeRecord> = records
            .iter()
            .filter(|record| self.matches(record, now))
            .collect();

        if let Some((field, direction)) = self.sort {
            matched.sort_by(|a, b| {
                let ordering = compare(field, a, b);
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        matched
    }
}

fn in_set(accepted: &[String], value: Option<&str>) -> bool {
    if accepted.is_empty() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    let value = value.to_lowercase();
    accepted.iter().any(|candidate| candidate.to_lowercase() == value)
}

fn compare(field: SortField, a: &MistakeRecord, b: &MistakeRecord) -> Ordering {
    // Unparseable times sort before parseable ones
    if field == SortField::UploadTime {
        let key = |record: &MistakeRecord| (parse_timestamp(record.upload_time()), field.key(record).to_string());
        return key(a).cmp(&key(b));
    }
    field.key(a).cmp(field.key(b))
}

/// Parse the timestamp formats the backend emits. Naive values are UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// 1-based page number
    pub page: usize,
    /// Requested page size
    pub page_size: usize,
    /// Items across all pages
    pub total_items: usize,
    /// `ceil(total_items / page_size)`
    pub total_pages: usize,
}

/// Slice out 1-based page `page`. Page 0 reads as page 1; a page past the
/// end is empty.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let start = (page - 1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());

    Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total_items: items.len(),
        total_pages: items.len().div_ceil(page_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{FileInfo, RecordAnalysis};
    use chrono::TimeZone;

    fn record(id: i64, question: &str, subject: &str, error_type: Option<&str>, uploaded: &str) -> MistakeRecord {
        MistakeRecord {
            mistake_record_id: id,
            file_info: FileInfo {
                upload_time: uploaded.to_string(),
                ..FileInfo::default()
            },
            analysis: RecordAnalysis {
                question: question.to_string(),
                subject: subject.to_string(),
                error_type: error_type.map(str::to_string),
                ..RecordAnalysis::default()
            },
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
    }

    fn records() -> Vec<MistakeRecord> {
        vec![
            record(1, "计算分数加法", "Math", Some("计算错误"), "2024-06-30T08:00:00"),
            record(2, "Reading comprehension", "English", Some("概念不清"), "2024-06-25 10:00:00"),
            record(3, "分数乘法", "math", None, "2024-05-15"),
            record(4, "Newton's laws", "Physics", Some("计算错误"), "2024-02-01T00:00:00Z"),
            record(5, "bad date", "Math", None, "yesterday"),
        ]
    }

    fn ids(matched: &[&MistakeRecord]) -> Vec<i64> {
        matched.iter().map(|r| r.mistake_record_id).collect()
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let records = records();
        assert_eq!(ids(&MistakeFilter::default().apply(&records, now())), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let records = records();
        let filter = MistakeFilter {
            search_term: Some("READING".to_string()),
            ..MistakeFilter::default()
        };
        assert_eq!(ids(&filter.apply(&records, now())), vec![2]);
    }

    #[test]
    fn test_subject_and_error_type_sets() {
        let records = records();
        let filter = MistakeFilter {
            subjects: vec!["math".to_string()],
            ..MistakeFilter::default()
        };
        assert_eq!(ids(&filter.apply(&records, now())), vec![1, 3, 5]);

        let filter = MistakeFilter {
            error_types: vec!["计算错误".to_string()],
            ..MistakeFilter::default()
        };
        assert_eq!(ids(&filter.apply(&records, now())), vec![1, 4]);
    }

    #[test]
    fn test_time_windows() {
        let records = records();
        let in_window = |window| {
            let filter = MistakeFilter {
                window,
                ..MistakeFilter::default()
            };
            ids(&filter.apply(&records, now()))
        };

        assert_eq!(in_window(TimeWindow::Today), vec![1]);
        assert_eq!(in_window(TimeWindow::Week), vec![1, 2]);
        assert_eq!(in_window(TimeWindow::Month), vec![1, 2]);
        assert_eq!(in_window(TimeWindow::Quarter), vec![1, 2, 3]);
    }

    #[test]
    fn test_sorting() {
        let records = records();
        let filter = MistakeFilter {
            sort: Some((SortField::UploadTime, SortDirection::Desc)),
            window: TimeWindow::Quarter,
            ..MistakeFilter::default()
        };
        assert_eq!(ids(&filter.apply(&records, now())), vec![1, 2, 3]);

        let filter = MistakeFilter {
            sort: Some((SortField::Subject, SortDirection::Asc)),
            ..MistakeFilter::default()
        };
        assert_eq!(ids(&filter.apply(&records, now())), vec![2, 1, 5, 4, 3]);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-01-15T10:00:00+08:00").is_some());
        assert!(parse_timestamp("2024-01-15T10:00:00.123456").is_some());
        assert!(parse_timestamp("2024-01-15 10:00:00").is_some());
        assert_eq!(
            parse_timestamp("2024-01-15"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("soon"), None);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=45).collect();

        let first = paginate(&items, 1, 20);
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 45);

        let last = paginate(&items, 3, 20);
        assert_eq!(last.items, (41..=45).collect::<Vec<_>>());

        assert!(paginate(&items, 9, 20).items.is_empty());
        assert_eq!(paginate(&items, 0, 20).page, 1);
        assert_eq!(paginate::<u32>(&[], 1, 20).total_pages, 0);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(TimeWindow::parse("Quarter"), Some(TimeWindow::Quarter));
        assert_eq!(SortField::parse("upload_time"), Some(SortField::UploadTime));
        assert_eq!("error-type".parse::<SortField>(), Ok(SortField::ErrorType));
        assert!("later".parse::<TimeWindow>().is_err());
    }
}
