//! Mistakebook REST client implementation.

use crate::config::ClientConfig;
use crate::error::SdkError;
use mistakebook_domain::{
    DetailSource, ErrorTypeUpdate, LegacyMistakeRecord, MistakesListResponse, UploadImageResponse,
    WeakPointsResponse,
};
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

const UPLOAD_FAILED: &str = "上传失败，请稍后再试。";
const DETAIL_FAILED: &str = "获取错题详情失败";
const LIST_FAILED: &str = "获取错题列表失败";
const WEAK_POINTS_FAILED: &str = "获取薄弱知识点失败";
const ERROR_TYPE_FAILED: &str = "保存错误原因失败";

/// Filters for the mistakes list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Subject filter
    pub subject: Option<String>,
    /// Error type filter
    pub error_type: Option<String>,
    /// Knowledge point filter
    pub knowledge_point: Option<String>,
    /// Rows to skip
    pub skip: u64,
    /// Maximum rows returned
    pub limit: u64,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            subject: None,
            error_type: None,
            knowledge_point: None,
            skip: 0,
            limit: 100,
        }
    }
}

impl ListQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(subject) = &self.subject {
            params.push(("subject", subject.clone()));
        }
        if let Some(error_type) = &self.error_type {
            params.push(("error_type", error_type.clone()));
        }
        if let Some(point) = &self.knowledge_point {
            params.push(("knowledge_point", point.clone()));
        }
        params.push(("skip", self.skip.to_string()));
        params.push(("limit", self.limit.to_string()));
        params
    }
}

/// Mistakebook SDK client
///
/// Holds one connection pool; clone it freely.
#[derive(Debug, Clone)]
pub struct MistakeClient {
    http: reqwest::Client,
    base_url: String,
}

impl MistakeClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self, SdkError> {
        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| SdkError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url,
        })
    }

    /// Server root this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL with each segment appended percent-encoded, so a `/` or `?`
    /// inside an id stays part of that segment.
    fn segment_url(&self, segments: &[&str]) -> Result<reqwest::Url, SdkError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| SdkError::InvalidConfig(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| SdkError::InvalidConfig(format!("Base URL cannot take a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Upload an image file for analysis
    pub async fn upload_image(&self, path: &Path) -> Result<UploadImageResponse, SdkError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let mime = mime_for_path(path);

        self.upload_image_bytes(&file_name, bytes, mime).await
    }

    /// Upload in-memory image data under the multipart field `image`
    pub async fn upload_image_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<UploadImageResponse, SdkError> {
        let url = self.url("/upload/image");
        debug!(%url, file_name, size = bytes.len(), "uploading image");

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| SdkError::InvalidConfig(format!("Invalid MIME type {}: {}", mime, e)))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self.http.post(&url).multipart(form).send().await?;
        let upload: UploadImageResponse = decode(response, UPLOAD_FAILED).await?;

        info!(file_id = %upload.file_id, status = %upload.status, "image uploaded");
        Ok(upload)
    }

    /// Raw detail payload from `GET /mistakes/{id}`
    pub async fn fetch_detail_raw(&self, id: &str) -> Result<Value, SdkError> {
        let url = self.segment_url(&["mistakes", id])?;
        debug!(%url, "fetching mistake detail");
        let response = self.http.get(url).send().await?;
        decode(response, DETAIL_FAILED).await
    }

    /// Record from the legacy `GET /mistake/{id}` endpoint
    pub async fn fetch_legacy_record(&self, id: i64) -> Result<LegacyMistakeRecord, SdkError> {
        let url = self.segment_url(&["mistake", &id.to_string()])?;
        debug!(%url, "fetching legacy mistake record");
        let response = self.http.get(url).send().await?;
        decode(response, DETAIL_FAILED).await
    }

    /// Page of stored mistakes
    pub async fn list_mistakes(&self, query: &ListQuery) -> Result<MistakesListResponse, SdkError> {
        let url = self.url("/mistakes");
        debug!(%url, ?query, "listing mistakes");
        let response = self.http.get(&url).query(&query.params()).send().await?;
        decode(response, LIST_FAILED).await
    }

    /// Knowledge points with the highest error rates
    pub async fn weak_points(
        &self,
        top_n: u32,
        subject: Option<&str>,
    ) -> Result<WeakPointsResponse, SdkError> {
        let url = self.url("/stats/weak_points");
        let mut params = vec![("top_n", top_n.to_string())];
        if let Some(subject) = subject {
            params.push(("subject", subject.to_string()));
        }
        debug!(%url, top_n, ?subject, "fetching weak points");

        let response = self.http.get(&url).query(&params).send().await?;
        decode(response, WEAK_POINTS_FAILED).await
    }

    /// Set the error classification of a stored mistake
    pub async fn update_error_type(&self, update: &ErrorTypeUpdate) -> Result<Value, SdkError> {
        let url = self.url("/mistake/error_type");
        debug!(%url, record = update.mistake_record_id, "updating error type");
        let response = self.http.post(&url).json(update).send().await?;
        decode(response, ERROR_TYPE_FAILED).await
    }

    /// Delete a stored mistake. The backend has no endpoint yet.
    pub async fn delete_mistake(&self, id: i64) -> Result<(), SdkError> {
        debug!(id, "delete requested");
        Err(SdkError::NotImplemented("删除功能暂未实现"))
    }

    /// Delete several stored mistakes. The backend has no endpoint yet.
    pub async fn batch_delete_mistakes(&self, ids: &[i64]) -> Result<(), SdkError> {
        debug!(?ids, "batch delete requested");
        Err(SdkError::NotImplemented("批量删除功能暂未实现"))
    }

    /// Export stored mistakes. The backend has no endpoint yet.
    pub async fn export_mistakes(&self, ids: &[i64]) -> Result<(), SdkError> {
        debug!(?ids, "export requested");
        Err(SdkError::NotImplemented("导出功能暂未实现"))
    }
}

impl DetailSource for MistakeClient {
    type Error = SdkError;

    fn fetch_detail(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Value, Self::Error>> + Send {
        self.fetch_detail_raw(id)
    }
}

/// Decode a success body, or turn an error body into [`SdkError::Api`].
async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback: &str,
) -> Result<T, SdkError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SdkError::Api {
            status: status.as_u16(),
            detail: error_detail(&body).unwrap_or_else(|| fallback.to_string()),
        });
    }

    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(SdkError::from)
}

/// The `detail` message of an error body, when it has one
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail.clone()),
        // Validation errors arrive as a list of objects
        Value::Array(items) if !items.is_empty() => Some(
            items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str).or_else(|| item.as_str()))
                .collect::<Vec<_>>()
                .join("; "),
        )
        .filter(|joined| !joined.is_empty()),
        _ => None,
    }
}

fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_defaults() {
        let params = ListQuery::default().params();
        assert_eq!(
            params,
            vec![("skip", "0".to_string()), ("limit", "100".to_string())]
        );
    }

    #[test]
    fn test_list_query_filters_in_order() {
        let query = ListQuery {
            subject: Some("数学".to_string()),
            knowledge_point: Some("分数".to_string()),
            ..ListQuery::default()
        };
        let keys: Vec<_> = query.params().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["subject", "knowledge_point", "skip", "limit"]);
    }

    #[test]
    fn test_error_detail_extraction() {
        assert_eq!(error_detail(r#"{"detail": "未找到"}"#).as_deref(), Some("未找到"));
        assert_eq!(
            error_detail(r#"{"detail": [{"msg": "field required"}, {"msg": "bad id"}]}"#).as_deref(),
            Some("field required; bad id")
        );
        assert_eq!(error_detail(r#"{"detail": ""}"#), None);
        assert_eq!(error_detail("Internal Server Error"), None);
    }

    #[test]
    fn test_segment_url_encodes_ids() {
        let client = MistakeClient::new(ClientConfig::default()).unwrap();
        let url = client.segment_url(&["mistakes", "a/b?c#d"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8001/mistakes/a%2Fb%3Fc%23d");

        let client = MistakeClient::new(ClientConfig::new("http://api.test/v1/")).unwrap();
        let url = client.segment_url(&["mistake", "12"]).unwrap();
        assert_eq!(url.as_str(), "http://api.test/v1/mistake/12");
    }

    #[test]
    fn test_segment_url_rejects_bad_base() {
        let client = MistakeClient::new(ClientConfig::new("not a url")).unwrap();
        assert!(matches!(
            client.segment_url(&["mistakes", "1"]),
            Err(SdkError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/b.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("photo.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("scan")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_unimplemented_operations() {
        let client = MistakeClient::new(ClientConfig::default()).unwrap();
        assert!(matches!(
            client.delete_mistake(1).await,
            Err(SdkError::NotImplemented("删除功能暂未实现"))
        ));
        assert!(matches!(
            client.batch_delete_mistakes(&[1, 2]).await,
            Err(SdkError::NotImplemented("批量删除功能暂未实现"))
        ));
        assert!(matches!(
            client.export_mistakes(&[]).await,
            Err(SdkError::NotImplemented("导出功能暂未实现"))
        ));
    }
}
