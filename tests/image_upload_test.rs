//! Tests for the image-hosting client against a mock HTTP server.

use assert_matches::assert_matches;
use base64::Engine as _;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dealerdesk_api::config::ImageHostConfig;
use dealerdesk_api::errors::ServiceError;
use dealerdesk_api::services::ImageService;

fn sample_image_base64() -> String {
    base64::engine::general_purpose::STANDARD.encode(b"not-really-a-png")
}

fn service_for(server: &MockServer) -> ImageService {
    ImageService::new(ImageHostConfig {
        api_url: format!("{}/1/upload", server.uri()),
        api_key: Some("test-key".to_string()),
    })
}

#[tokio::test]
async fn upload_returns_the_hosted_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/upload"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "url": "https://images.example.com/abc123.png" },
            "success": true,
            "status": 200
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = service_for(&server)
        .upload(&sample_image_base64())
        .await
        .unwrap();
    assert_eq!(url, "https://images.example.com/abc123.png");
}

#[tokio::test]
async fn upstream_failure_is_an_external_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/upload"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .upload(&sample_image_base64())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ExternalServiceError(_));
}

#[tokio::test]
async fn malformed_upstream_body_is_an_external_service_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .upload(&sample_image_base64())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::ExternalServiceError(_));
}

#[tokio::test]
async fn invalid_base64_never_goes_external() {
    let server = MockServer::start().await;
    // No mock mounted: any request would fail the test via connection to a
    // path without an expectation at drop time.
    let err = service_for(&server)
        .upload("definitely not base64!!!")
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn missing_api_key_is_an_invalid_operation() {
    let service = ImageService::new(ImageHostConfig {
        api_url: "http://localhost:1/1/upload".to_string(),
        api_key: None,
    });
    let err = service.upload(&sample_image_base64()).await.unwrap_err();
    assert_matches!(err, ServiceError::InvalidOperation(_));
}
