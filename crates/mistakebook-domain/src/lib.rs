//! Mistakebook Domain Layer
//!
//! View models and the normalization layer for the mistake notebook client.
//! Everything here is pure: no I/O, no shared state. The backend speaks
//! loosely typed JSON, so this crate is the boundary where that JSON becomes
//! strict, fully defaulted types.
//!
//! ## Key Concepts
//!
//! - **Section**: a group of related questions in one analysis response
//! - **Analysis item**: the raw per-record view kept for later backfill
//! - **Mistake detail**: the fully defaulted record behind the detail view
//! - **Knowledge point**: a curriculum tag with an optional mastery level
//! - **AI judgement**: the engine's verdict (correct / partial / incorrect)
//!
//! ## Normalizers
//!
//! [`normalize_analysis`] and [`normalize_mistake_detail`] accept any
//! [`serde_json::Value`] and never fail. Shape mismatches degrade to empty
//! or placeholder values, field by field.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
mod coerce;
pub mod detail;
pub mod display;
pub mod error_book;
pub mod navigation;
pub mod practice;
pub mod records;
pub mod selection;
pub mod traits;

// Re-exports for convenience
pub use analysis::{
    normalize_analysis, AnalysisItem, NormalizationResult, OutputSection, QuestionResult,
};
pub use coerce::FieldAliases;
pub use detail::{
    clone_detail, fallback_detail, mock_mistake_detail, normalize_mistake_detail, AiJudgement,
    DetailAnalysis, DetailMeta, KnowledgePointTag, MasteryLevel, MistakeDetail,
};
pub use display::{clean_knowledge_points, clean_tags, judgement_label, looks_like_stem, mastery_label, Tone};
pub use error_book::{
    paginate, parse_timestamp, MistakeFilter, Page, SortDirection, SortField, TimeWindow,
};
pub use navigation::PathChangeNotice;
pub use practice::{
    parse_similar_questions, PracticeError, PracticeSession, QuestionKind, QuestionOption,
    SimilarQuestion,
};
pub use records::{
    ErrorTypeUpdate, FileInfo, LegacyMistakeRecord, MistakeRecord, MistakesListResponse,
    RecordAnalysis, UploadImageResponse, WeakPointStat, WeakPointsResponse,
};
pub use selection::{detail_for_selection, QuestionSelection};
pub use traits::DetailSource;
