//! Integration tests for the Mistakebook SDK against a mock backend.

use mistakebook_domain::{AiJudgement, ErrorTypeUpdate, QuestionSelection};
use mistakebook_sdk::{load_detail, ClientConfig, DetailOrigin, ListQuery, MistakeClient, SdkError};
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> MistakeClient {
    MistakeClient::new(ClientConfig::new(&server.uri())).expect("client should build")
}

#[tokio::test]
async fn test_upload_image_sends_multipart_and_normalizes() {
    let mock_server = MockServer::start().await;

    let upload_response = json!({
        "status": "success",
        "message": "ok",
        "file_id": "f-100",
        "filename": "quiz.png",
        "file_url": "/uploads/f-100.png",
        "upload_time": "2024-06-01T09:00:00",
        "file_size": 4,
        "file_type": "image/png",
        "coze_analysis": [{
            "isSuccess": true,
            "output": [
                {"section": "一、计算", "subject": "数学", "questions": [
                    {"question": "1/2 + 1/3", "answer": "2/5", "correct_answer": "5/6", "is_correct": false}
                ]},
                {"section": "一、计算", "questions": [{"question": "2 × 3", "is_correct": true}]}
            ]
        }]
    });

    Mock::given(method("POST"))
        .and(path("/upload/image"))
        .and(header("Cache-Control", "no-cache"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&upload_response))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("temp file");
    file.write_all(b"\x89PNG").expect("write image");

    let client = client_for(&mock_server);
    let analyzed = client
        .upload_and_analyze(file.path())
        .await
        .expect("upload should succeed");

    assert_eq!(analyzed.response.file_id, "f-100");
    assert_eq!(analyzed.analysis.sections.len(), 1);
    assert_eq!(analyzed.analysis.question_count(), 2);

    let detail = analyzed
        .select(QuestionSelection::new(0, 0))
        .expect("question exists");
    assert_eq!(detail.id, "f-100-1-1");
    assert_eq!(detail.ai_judgement, Some(AiJudgement::Incorrect));
    assert_eq!(detail.meta.source.as_deref(), Some("quiz.png"));
}

#[tokio::test]
async fn test_upload_error_uses_detail_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/upload/image"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "仅支持图片文件"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .upload_image_bytes("a.txt", b"hello".to_vec(), "text/plain")
        .await
        .unwrap_err();

    match err {
        SdkError::Api { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail, "仅支持图片文件");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_load_detail_fetches_and_normalizes() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mistakes/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mistake_id": "42",
            "question_text": "3/4 - 1/2 = ?",
            "student_answer": "2/2",
            "ai_result": "wrong",
            "knowledge_points": [{"name": "分数减法", "mastery": 55}],
            "analysis": {"summary": "通分错误", "steps": "通分\n相减"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let loaded = load_detail(&client, "42", None).await;

    assert_eq!(loaded.origin, DetailOrigin::Fetched);
    assert_eq!(loaded.detail.id, "42");
    assert_eq!(loaded.detail.stem, "3/4 - 1/2 = ?");
    assert_eq!(loaded.detail.ai_judgement, Some(AiJudgement::Incorrect));
    assert_eq!(loaded.detail.analysis.steps, vec!["通分", "相减"]);
}

#[tokio::test]
async fn test_detail_id_is_sent_as_one_segment() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mistakes/a%2Fb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"question": "x"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let loaded = load_detail(&client, "a/b", None).await;

    assert_eq!(loaded.origin, DetailOrigin::Fetched);
    assert_eq!(loaded.detail.id, "a/b");
}

#[tokio::test]
async fn test_load_detail_falls_back_on_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mistakes/7"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let loaded = load_detail(&client, "7", None).await;

    assert!(loaded.is_fallback());
    assert_eq!(loaded.detail.id, "7");
    match loaded.origin {
        DetailOrigin::Fallback { reason } => assert!(reason.contains("获取错题详情失败")),
        other => panic!("expected fallback, got {:?}", other),
    }
}

#[tokio::test]
async fn test_list_mistakes_sends_filters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mistakes"))
        .and(query_param("subject", "数学"))
        .and(query_param("skip", "0"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 1,
            "skip": 0,
            "limit": 100,
            "mistakes": [{
                "mistake_record_id": 5,
                "file_info": {"file_id": "f-5", "filename": "a.jpg", "upload_time": "2024-06-01T00:00:00"},
                "analysis": {"id": 9, "subject": "数学", "question": "1+1", "is_correct": false, "error_type": null}
            }]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let query = ListQuery {
        subject: Some("数学".to_string()),
        ..ListQuery::default()
    };
    let list = client.list_mistakes(&query).await.expect("list should succeed");

    assert_eq!(list.total_count, 1);
    assert_eq!(list.mistakes[0].mistake_record_id, 5);
    assert_eq!(list.mistakes[0].analysis.question, "1+1");
}

#[tokio::test]
async fn test_list_error_without_detail_uses_fallback_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mistakes"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "down"})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client.list_mistakes(&ListQuery::default()).await.unwrap_err();
    assert!(matches!(err, SdkError::Api { status: 503, ref detail } if detail == "获取错题列表失败"));
}

#[tokio::test]
async fn test_weak_points_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stats/weak_points"))
        .and(query_param("top_n", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weak_points": [
                {"knowledge_point": "分数加减", "subject": "数学", "total_count": 10, "incorrect_count": 6, "error_rate": 0.6}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let stats = client.weak_points(5, None).await.expect("weak points");
    assert_eq!(stats.weak_points.len(), 1);
    assert_eq!(stats.weak_points[0].incorrect_count, 6);
}

#[tokio::test]
async fn test_update_error_type_posts_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/mistake/error_type"))
        .and(body_json(json!({"mistake_record_id": 3, "error_type": "计算错误", "analysis_id": 11})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let update = ErrorTypeUpdate {
        mistake_record_id: 3,
        error_type: "计算错误".to_string(),
        analysis_id: Some(11),
    };
    let body = client.update_error_type(&update).await.expect("update");
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_legacy_record_endpoint() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/mistake/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "file_info": {"filename": "hw.jpg"},
            "analysis": [{"id": 1, "question": "5 - 7", "is_question": true, "is_correct": false}],
            "practices": []
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let record = client.fetch_legacy_record(12).await.expect("legacy record");
    let detail = record.to_detail("12");
    assert_eq!(detail.stem, "5 - 7");
    assert_eq!(detail.meta.source.as_deref(), Some("hw.jpg"));
}

#[tokio::test]
async fn test_unreachable_server_is_connection_error() {
    // Nothing listens on port 1
    let client = MistakeClient::new(ClientConfig::new("http://127.0.0.1:1")).expect("client");
    let err = client.fetch_detail_raw("1").await.unwrap_err();
    assert!(err.is_connection(), "expected connection error, got {:?}", err);
}
