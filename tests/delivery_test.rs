//! Integration tests for delivering records to the backend.

use channel_video_relay::classifier::Category;
use channel_video_relay::config::Config;
use channel_video_relay::delivery::{DeliveryClient, DeliveryOutcome};
use channel_video_relay::record::{build, Attachment, VideoRecord, VideoSource};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/api/telegram/process-video";

fn create_test_config(backend: &MockServer) -> Config {
    Config {
        backend_url: format!("{}{ENDPOINT}", backend.uri()),
        ..Config::for_testing()
    }
}

fn source(message_id: i64, file_name: Option<&str>, caption: Option<&str>) -> VideoSource {
    VideoSource {
        attachment: Attachment {
            file_id: "BAACAgIAAxkBAAIB".to_string(),
            file_unique_id: None,
            file_name: file_name.map(ToString::to_string),
            file_size: None,
            duration: None,
            width: None,
            height: None,
            mime_type: None,
        },
        message_id,
        caption: caption.map(ToString::to_string),
        chat_id: -100_123,
        chat_title: None,
    }
}

async fn last_body(server: &MockServer) -> String {
    let requests = server.received_requests().await.expect("request recording");
    let request = requests.last().expect("no request received");
    String::from_utf8(request.body.clone()).expect("body is utf-8")
}

#[tokio::test]
async fn test_accepted_without_caption() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true,
            "message": "stored"
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let client = DeliveryClient::new(&create_test_config(&backend)).unwrap();
    let record = build(&source(42, None, None));
    assert_eq!(record.file_name, "video_42.mp4");
    assert_eq!(record.category, Category::SuddenEvent);

    let outcome = client.deliver(&record).await;
    assert_eq!(outcome, DeliveryOutcome::Accepted);

    let body = last_body(&backend).await;
    insta::assert_snapshot!(body, @"fileId=BAACAgIAAxkBAAIB&fileName=video_42.mp4&messageId=42&category=SUDDEN_EVENT");
    assert!(!body.contains("recordedDateTime"));
}

#[tokio::test]
async fn test_timestamp_and_category_are_sent() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(body_string_contains("category=AGGRESSION_TEACHER"))
        .and(body_string_contains("recordedDateTime=07-07-2025_12-12-12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let client = DeliveryClient::new(&create_test_config(&backend)).unwrap();
    let record = build(&source(
        7,
        Some("cam 1.mp4"),
        Some("#Aggression_Teacher 07-07-2025_12-12-12"),
    ));

    assert!(client.deliver(&record).await.is_accepted());
    assert!(last_body(&backend).await.contains("fileName=cam+1.mp4"));
}

#[tokio::test]
async fn test_rejected_carries_diagnostics() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": false,
            "message": "exists",
            "timestamp": "2025-07-07T12:12:12"
        })))
        .mount(&backend)
        .await;

    let client = DeliveryClient::new(&create_test_config(&backend)).unwrap();
    let outcome = client.deliver(&build(&source(1, None, None))).await;

    assert_eq!(
        outcome,
        DeliveryOutcome::Rejected {
            message: Some("exists".to_string()),
            timestamp: Some("2025-07-07T12:12:12".to_string()),
        }
    );
    assert_eq!(outcome.reason(), Some("exists"));
}

#[tokio::test]
async fn test_error_status_with_json_body_is_rejected() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "success": false,
            "message": "bad request"
        })))
        .mount(&backend)
        .await;

    let client = DeliveryClient::new(&create_test_config(&backend)).unwrap();
    let outcome = client.deliver(&build(&source(1, None, None))).await;

    assert_eq!(outcome.reason(), Some("bad request"));
    assert!(matches!(outcome, DeliveryOutcome::Rejected { .. }));
}

#[tokio::test]
async fn test_malformed_body_is_transport_failure() {
    let backend = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>"))
        .expect(1)
        .mount(&backend)
        .await;

    let client = DeliveryClient::new(&create_test_config(&backend)).unwrap();
    let outcome = client.deliver(&build(&source(1, None, None))).await;

    assert!(matches!(outcome, DeliveryOutcome::TransportFailed { .. }));
}

#[tokio::test]
async fn test_connection_refused_is_transport_failure() {
    // Config::for_testing points the backend at a closed port.
    let client = DeliveryClient::new(&Config::for_testing()).unwrap();
    let record = VideoRecord {
        file_id: "abc".to_string(),
        file_name: "video_1.mp4".to_string(),
        message_id: 1,
        category: Category::SuddenEvent,
        recorded_at: None,
    };

    let outcome = client.deliver(&record).await;
    assert!(matches!(outcome, DeliveryOutcome::TransportFailed { .. }));
    assert!(outcome.reason().is_some());
}
