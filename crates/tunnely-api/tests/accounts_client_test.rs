#![allow(clippy::unwrap_used)]
// Integration tests for `AccountsClient` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tunnely_api::{AccountsClient, Error, INVALID_VOUCHER, VOUCHER_USED};

// ── Helpers ─────────────────────────────────────────────────────────

const SUBMIT_PATH: &str = "/accounts/v1/submit-voucher";

async fn setup() -> (MockServer, AccountsClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = AccountsClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn token() -> SecretString {
    SecretString::from("test-account-token".to_string())
}

// ── Success ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_submit_voucher_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .and(header("authorization", "Bearer test-account-token"))
        .and(body_json(json!({ "voucher_code": "ABCD-1234-EFGH-5678" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "time_added": 2_592_000,
            "new_expiry": "2026-11-18T12:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client
        .submit_voucher(&token(), "ABCD-1234-EFGH-5678")
        .await
        .unwrap();

    assert_eq!(resp.time_added, 2_592_000);
    assert_eq!(resp.new_expiry.to_rfc3339(), "2026-11-18T12:00:00+00:00");
}

// ── Rejections ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_submit_invalid_voucher() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "INVALID_VOUCHER",
            "error": "This voucher code is invalid"
        })))
        .mount(&server)
        .await;

    let err = client.submit_voucher(&token(), "NOPE").await.unwrap_err();

    assert_eq!(err.api_code(), Some(INVALID_VOUCHER));
    match err {
        Error::Api {
            status, message, ..
        } => {
            assert_eq!(status, 400);
            assert_eq!(message, "This voucher code is invalid");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_submit_used_voucher() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "VOUCHER_USED",
            "error": "This voucher code has already been used"
        })))
        .mount(&server)
        .await;

    let err = client.submit_voucher(&token(), "USED").await.unwrap_err();
    assert_eq!(err.api_code(), Some(VOUCHER_USED));
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "INVALID_ACCESS_TOKEN",
            "error": "Access token is invalid"
        })))
        .mount(&server)
        .await;

    let result = client.submit_voucher(&token(), "ANY").await;
    assert!(
        matches!(result, Err(Error::Authentication { ref message }) if message == "Access token is invalid"),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_server_error_without_json_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let err = client.submit_voucher(&token(), "ANY").await.unwrap_err();
    match err {
        Error::Api {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 503);
            assert!(code.is_none());
            assert!(message.contains("upstream unavailable"), "{message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_success_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path(SUBMIT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })))
        .mount(&server)
        .await;

    let result = client.submit_voucher(&token(), "ANY").await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    // Nothing listens on port 1 on loopback.
    let client = AccountsClient::with_client(
        reqwest::Client::new(),
        Url::parse("http://127.0.0.1:1").unwrap(),
    );

    let err = client.submit_voucher(&token(), "ANY").await.unwrap_err();
    assert!(err.is_transient(), "expected transient error, got: {err:?}");
}
