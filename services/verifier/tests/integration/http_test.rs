use axum::http::header::{
    ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, HeaderValue, ORIGIN,
};
use axum::http::{Method, StatusCode};
use axum_test::TestServer;
use serde_json::{Value, json};

use mailotp_testing::auth::MockApiKey;
use mailotp_verifier::infra::memory::MemoryStore;

use crate::helpers::{
    FailingNotifier, FailingStore, RecordingNotifier, TEST_EMAIL, address, other_code, test_server,
};

const APP_ORIGIN: &str = "https://app.example.com";

fn server() -> (TestServer, MemoryStore, RecordingNotifier) {
    let store = MemoryStore::new();
    let notifier = RecordingNotifier::default();
    (test_server(store.clone(), notifier.clone()), store, notifier)
}

async fn send_otp(server: &TestServer, email: &str) -> axum_test::TestResponse {
    let (name, value) = MockApiKey::valid().header();
    server
        .post("/send-otp")
        .add_header(name, value)
        .json(&json!({ "email": email }))
        .await
}

async fn verify_otp(server: &TestServer, email: &str, otp: &str) -> axum_test::TestResponse {
    let (name, value) = MockApiKey::valid().header();
    server
        .post("/verify-otp")
        .add_header(name, value)
        .json(&json!({ "email": email, "otp": otp }))
        .await
}

async fn status(server: &TestServer, email: &str) -> axum_test::TestResponse {
    let (name, value) = MockApiKey::valid().header();
    server
        .get(&format!("/verification-status/{email}"))
        .add_header(name, value)
        .await
}

// ── Health ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_serve_health_without_api_key() {
    let (server, _, _) = server();

    server.get("/healthz").await.assert_status_ok();
    server.get("/readyz").await.assert_status_ok();

    let resp = server.get("/health").await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "mailotp-verifier");
}

#[tokio::test]
async fn should_serve_service_info_without_api_key() {
    let (server, _, _) = server();

    let resp = server.get("/").await;

    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["endpoints"]["send_otp"], "/send-otp (POST) - Protected");
}

// ── CORS ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_answer_cors_preflight_without_api_key() {
    let (server, _, _) = server();

    let resp = server
        .method(Method::OPTIONS, "/send-otp")
        .add_header(ORIGIN, HeaderValue::from_static(APP_ORIGIN))
        .add_header(ACCESS_CONTROL_REQUEST_METHOD, HeaderValue::from_static("POST"))
        .add_header(
            ACCESS_CONTROL_REQUEST_HEADERS,
            HeaderValue::from_static("content-type,x-api-key"),
        )
        .await;

    resp.assert_status_ok();
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn should_allow_any_origin_on_gated_routes() {
    let (server, _, _) = server();
    let (name, value) = MockApiKey::valid().header();

    let resp = server
        .get(&format!("/verification-status/{TEST_EMAIL}"))
        .add_header(name, value)
        .add_header(ORIGIN, HeaderValue::from_static(APP_ORIGIN))
        .await;

    resp.assert_status_ok();
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
}

// ── Gate ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reject_otp_routes_without_api_key() {
    let (server, store, notifier) = server();

    let resp = server
        .post("/send-otp")
        .json(&json!({ "email": TEST_EMAIL }))
        .await;

    resp.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "UNAUTHORIZED");
    assert!(store.identities().is_empty());
    assert_eq!(notifier.sent_count(), 0);
}

#[tokio::test]
async fn should_reject_wrong_api_key() {
    let (server, _, _) = server();
    let (name, value) = MockApiKey::new("wrong-key").header();

    let resp = server
        .get(&format!("/verification-status/{TEST_EMAIL}"))
        .add_header(name, value)
        .await;

    resp.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn should_attach_request_id() {
    let (server, _, _) = server();

    let resp = send_otp(&server, TEST_EMAIL).await;

    assert!(resp.headers().contains_key("x-request-id"));
}

// ── End to end ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_verify_and_report_status() {
    let (server, _, notifier) = server();

    let before: Value = status(&server, TEST_EMAIL).await.json();
    assert_eq!(before["is_verified"], false);

    let sent = send_otp(&server, "User@Example.com").await;
    sent.assert_status_ok();
    let sent: Value = sent.json();
    assert_eq!(sent["success"], true);
    assert_eq!(sent["email"], TEST_EMAIL);
    assert!(sent["expires_at"].as_str().unwrap().ends_with('Z'));

    let code = notifier.last_code_for(TEST_EMAIL).unwrap();
    let verified = verify_otp(&server, TEST_EMAIL, &code).await;
    verified.assert_status_ok();
    let verified: Value = verified.json();
    assert_eq!(verified["success"], true);
    assert_eq!(verified["verified"], true);
    assert_eq!(verified["email"], TEST_EMAIL);

    let after = status(&server, TEST_EMAIL).await;
    after.assert_status_ok();
    let after: Value = after.json();
    assert_eq!(after["is_verified"], true);
    assert_eq!(after["message"], "Email is verified");

    let replay = verify_otp(&server, TEST_EMAIL, &code).await;
    replay.assert_status(StatusCode::BAD_REQUEST);
    let replay: Value = replay.json();
    assert_eq!(replay["kind"], "INVALID_CODE");
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_return_400_for_invalid_address() {
    let (server, store, notifier) = server();

    let resp = send_otp(&server, "invalid-email").await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "INVALID_ADDRESS");
    assert!(store.identities().is_empty());
    assert_eq!(notifier.sent_count(), 0);
}

#[tokio::test]
async fn should_answer_mismatch_and_missing_code_identically() {
    let (server, _, notifier) = server();

    let missing = verify_otp(&server, TEST_EMAIL, "123456").await;
    missing.assert_status(StatusCode::BAD_REQUEST);
    let missing: Value = missing.json();

    send_otp(&server, TEST_EMAIL).await.assert_status_ok();
    let code = notifier.last_code_for(TEST_EMAIL).unwrap();
    let wrong = verify_otp(&server, TEST_EMAIL, &other_code(&code)).await;
    wrong.assert_status(StatusCode::BAD_REQUEST);
    let wrong: Value = wrong.json();

    assert_eq!(missing, wrong);
    assert_eq!(wrong["kind"], "INVALID_CODE");
}

#[tokio::test]
async fn should_return_400_for_malformed_code() {
    let (server, _, _) = server();
    send_otp(&server, TEST_EMAIL).await.assert_status_ok();

    let resp = verify_otp(&server, TEST_EMAIL, "12ab56").await;

    resp.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "MALFORMED_CODE");
}

#[tokio::test]
async fn should_report_malformed_address_as_unverified() {
    let (server, _, _) = server();

    let resp = status(&server, "invalid-email").await;

    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["is_verified"], false);
    assert_eq!(body["message"], "Email is not verified");
}

#[tokio::test]
async fn should_echo_normalized_address_in_status() {
    let (server, _, _) = server();

    let body: Value = status(&server, "User@Example.COM").await.json();
    assert_eq!(body["email"], TEST_EMAIL);

    let body: Value = status(&server, "Invalid-Email").await.json();
    assert_eq!(body["email"], "invalid-email");
    assert_eq!(body["is_verified"], false);
}

#[tokio::test]
async fn should_return_502_when_delivery_fails_but_keep_code() {
    let store = MemoryStore::new();
    let server = test_server(store.clone(), FailingNotifier);

    let resp = send_otp(&server, TEST_EMAIL).await;

    resp.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "DELIVERY_FAILED");
    let records = store.records(&address(TEST_EMAIL));
    assert_eq!(records.iter().filter(|r| !r.consumed).count(), 1);
}

#[tokio::test]
async fn should_return_500_when_storage_fails() {
    let server = test_server(FailingStore, RecordingNotifier::default());

    let resp = send_otp(&server, TEST_EMAIL).await;

    resp.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json();
    assert_eq!(body["kind"], "STORAGE_FAILURE");
    assert_eq!(body["message"], "storage failure");
}
