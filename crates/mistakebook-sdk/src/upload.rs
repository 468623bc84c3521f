//! Upload flow: send an image, normalize the engine output, drill down.

use crate::client::MistakeClient;
use crate::error::SdkError;
use mistakebook_domain::{
    detail_for_selection, normalize_analysis, MistakeDetail, NormalizationResult,
    QuestionSelection, UploadImageResponse,
};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// An upload together with its normalized analysis
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedUpload {
    /// Backend response, `coze_analysis` untouched
    pub response: UploadImageResponse,
    /// Sections and raw items derived from `coze_analysis`
    pub analysis: NormalizationResult,
}

impl AnalyzedUpload {
    /// Normalize the analysis carried by an upload response
    pub fn from_response(response: UploadImageResponse) -> Self {
        let analysis = normalize_analysis(&response.coze_analysis);
        debug!(
            sections = analysis.sections.len(),
            questions = analysis.question_count(),
            raw_items = analysis.raw_items.len(),
            "analysis normalized"
        );
        Self { response, analysis }
    }

    /// Treat a saved payload as either a full upload response or a bare
    /// `coze_analysis` array.
    pub fn from_saved(payload: Value) -> Result<Self, SdkError> {
        if payload.is_object() && payload.get("coze_analysis").is_some() {
            let response: UploadImageResponse = serde_json::from_value(payload)?;
            return Ok(Self::from_response(response));
        }
        Ok(Self::from_response(UploadImageResponse {
            coze_analysis: payload,
            ..UploadImageResponse::default()
        }))
    }

    /// Detail for one question, `None` when the indices point nowhere
    pub fn select(&self, selection: QuestionSelection) -> Option<MistakeDetail> {
        detail_for_selection(&self.response, &self.analysis, selection)
    }
}

impl MistakeClient {
    /// Upload an image and normalize the analysis it comes back with
    pub async fn upload_and_analyze(&self, path: &Path) -> Result<AnalyzedUpload, SdkError> {
        let response = self.upload_image(path).await?;
        Ok(AnalyzedUpload::from_response(response))
    }
}
