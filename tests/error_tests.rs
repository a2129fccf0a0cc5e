// Error handling tests
// Author: kelexine (https://github.com/kelexine)

use axum::body::to_bytes;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use gemini_chat_relay::error::{RelayError, INTERNAL_ERROR_MESSAGE, RATE_LIMIT_MESSAGE};
use gemini_chat_relay::gemini::CompletionError;
use std::time::Duration;

async fn body_json(error: RelayError) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
    let response = error.into_response();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, serde_json::from_slice(&bytes).unwrap())
}

#[test]
fn test_error_display_messages() {
    let errors = vec![
        RelayError::Config("missing api key".to_string()),
        RelayError::InvalidRequest("prompt is empty".to_string()),
        RelayError::RateLimited {
            message: "quota".to_string(),
            retry_after: None,
        },
        RelayError::Generation("HTTP 500".to_string()),
        RelayError::Internal("poisoned".to_string()),
    ];

    for error in errors {
        let display = format!("{}", error);
        assert!(!display.is_empty(), "Error should have display message");
    }
}

#[test]
fn test_invalid_request_error() {
    let error = RelayError::InvalidRequest("prompt must not be empty".to_string());
    assert!(format!("{}", error).contains("prompt must not be empty"));
}

#[test]
fn test_completion_error_conversion() {
    let quota: RelayError = CompletionError::QuotaExhausted {
        message: "Resource has been exhausted".to_string(),
        retry_after: Some(Duration::from_secs(3)),
    }
    .into();
    assert!(matches!(
        quota,
        RelayError::RateLimited { retry_after: Some(d), .. } if d == Duration::from_secs(3)
    ));

    let failed: RelayError = CompletionError::Generation("timeout".to_string()).into();
    assert!(matches!(failed, RelayError::Generation(ref m) if m == "timeout"));
}

#[tokio::test]
async fn test_invalid_request_maps_to_400() {
    let (status, _, body) =
        body_json(RelayError::InvalidRequest("user_id is too long".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["type"], "error");
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("user_id is too long"));
}

#[tokio::test]
async fn test_rate_limit_maps_to_429_with_fixed_message() {
    let (status, headers, body) = body_json(RelayError::RateLimited {
        message: "Quota exceeded for project 1234".to_string(),
        retry_after: Some(Duration::from_millis(2500)),
    })
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["message"], RATE_LIMIT_MESSAGE);
    assert_eq!(headers.get(header::RETRY_AFTER).unwrap(), "3");
}

#[tokio::test]
async fn test_rate_limit_without_hint_has_no_header() {
    let (status, headers, _) = body_json(RelayError::RateLimited {
        message: "quota".to_string(),
        retry_after: None,
    })
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(headers.get(header::RETRY_AFTER).is_none());
}

#[tokio::test]
async fn test_generation_failure_is_opaque() {
    let (status, _, body) =
        body_json(RelayError::Generation("HTTP 500: key=AIzaSecret".to_string())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["type"], "api_error");
    assert_eq!(body["error"]["message"], INTERNAL_ERROR_MESSAGE);
    assert!(!body.to_string().contains("AIza"));
}

#[tokio::test]
async fn test_config_error_is_opaque() {
    let (status, _, body) = body_json(RelayError::Config("bad".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], INTERNAL_ERROR_MESSAGE);
}
