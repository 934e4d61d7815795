//! Integration tests for the HTTP router (handle_execute, handle_health).

use std::sync::Arc;

use axum::body::Body;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use http::{header, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use sheetrun_runtime::{ExecutionService, RuntimeConfig};
use sheetrun_sandbox::CapabilityRegistry;
use sheetrun_transport_http::{build_router, AppState, ARTIFACT_FILENAME, XLSX_CONTENT_TYPE};

const HELLO: &str = r#"let wb = xlsx::workbook(); wb.add_sheet("Sheet1").write(0, 0, "hello"); wb.save(output_path);"#;

fn make_state(dir: &tempfile::TempDir, token: Option<&str>) -> AppState {
    let config = RuntimeConfig {
        scratch_dir: Some(dir.path().to_path_buf()),
        ..RuntimeConfig::default()
    };
    let service =
        ExecutionService::with_capabilities(&config, Arc::new(CapabilityRegistry::build()))
            .expect("service");
    AppState {
        service: Arc::new(service),
        token: token.map(String::from),
    }
}

fn execute_request(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/execute")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("req")
}

fn script_body(script: &str) -> String {
    serde_json::json!({ "script": script }).to_string()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

fn scratch_is_empty(dir: &tempfile::TempDir) -> bool {
    std::fs::read_dir(dir.path()).expect("list").next().is_none()
}

#[tokio::test]
async fn health_returns_ok_with_metrics() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(make_state(&dir, None));
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("req");
    let resp = app.oneshot(req).await.expect("resp");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "sheetrun");
    assert_eq!(body["executions"]["total_executions"], 0);
}

#[tokio::test]
async fn ready_endpoint_returns_ok() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(make_state(&dir, None));
    let req = Request::builder()
        .uri("/health/ready")
        .body(Body::empty())
        .expect("req");
    let resp = app.oneshot(req).await.expect("resp");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "ready");
}

#[tokio::test]
async fn missing_script_is_400_and_creates_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(make_state(&dir, None));
    let resp = app
        .oneshot(execute_request("{}".into()))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert!(body["error"].as_str().expect("error").contains("script"));
    assert!(scratch_is_empty(&dir));
}

#[tokio::test]
async fn malformed_body_is_400() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(make_state(&dir, None));
    let resp = app
        .oneshot(execute_request("not json".into()))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());
}

#[tokio::test]
async fn non_utf8_body_is_400_with_json_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(make_state(&dir, None));
    let req = Request::builder()
        .method("POST")
        .uri("/execute")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(&b"{\xff\xfe}"[..]))
        .expect("req");
    let resp = app.oneshot(req).await.expect("resp");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
    assert!(json_body(resp).await["error"].is_string());
    assert!(scratch_is_empty(&dir));
}

#[tokio::test]
async fn oversized_body_is_413_with_json_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = make_state(&dir, None);
    let service = state.service.clone();
    let app = build_router(state);
    let script = "x".repeat(3 * 1024 * 1024);
    let resp = app
        .oneshot(execute_request(script_body(&script)))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(json_body(resp).await["error"].is_string());
    assert_eq!(service.metrics().snapshot().rejected_requests, 1);
    assert!(scratch_is_empty(&dir));
}

#[tokio::test]
async fn successful_script_returns_xlsx_attachment() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(make_state(&dir, None));
    let resp = app
        .oneshot(execute_request(script_body(HELLO)))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
    let disposition = resp.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .expect("ascii");
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains(ARTIFACT_FILENAME));

    let bytes = axum::body::to_bytes(resp.into_body(), 1 << 20)
        .await
        .expect("body");
    let mut xlsx: Xlsx<_> =
        open_workbook_from_rs(std::io::Cursor::new(bytes.to_vec())).expect("decode");
    let range = xlsx.worksheet_range("Sheet1").expect("range");
    assert_eq!(range.get_value((0, 0)), Some(&Data::String("hello".into())));
    assert!(scratch_is_empty(&dir));
}

#[tokio::test]
async fn raising_script_is_500_with_diagnostic_payload() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(make_state(&dir, None));
    let script = "throw \"bad\";";
    let resp = app
        .oneshot(execute_request(script_body(script)))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(resp).await;
    assert!(body["error"].as_str().expect("error").contains("bad"));
    assert!(!body["traceback"].as_str().expect("traceback").is_empty());
    assert_eq!(body["failingScript"], script);
    assert!(scratch_is_empty(&dir));
}

#[tokio::test]
async fn silent_script_is_500_missing_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(make_state(&dir, None));
    let resp = app
        .oneshot(execute_request(script_body("let x = 1;")))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(resp).await;
    assert_eq!(
        body["error"],
        "script completed without producing the expected artifact"
    );
    assert!(scratch_is_empty(&dir));
}

#[tokio::test]
async fn auth_required_but_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(make_state(&dir, Some("secret")));
    let resp = app
        .oneshot(execute_request(script_body(HELLO)))
        .await
        .expect("resp");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(scratch_is_empty(&dir));
}

#[tokio::test]
async fn auth_valid_bearer_passes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(make_state(&dir, Some("s3cret")));
    let req = Request::builder()
        .method("POST")
        .uri("/execute")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::from(script_body(HELLO)))
        .expect("req");
    let resp = app.oneshot(req).await.expect("resp");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_does_not_require_auth() {
    let dir = tempfile::tempdir().expect("tempdir");
    let app = build_router(make_state(&dir, Some("s3cret")));
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("req");
    let resp = app.oneshot(req).await.expect("resp");
    assert_eq!(resp.status(), StatusCode::OK);
}
