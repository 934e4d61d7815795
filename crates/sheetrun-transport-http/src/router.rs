//! Axum router for the execution transport.
//! Routes: `POST /execute` (run a script), `GET /health` (liveness),
//! `GET /health/ready` (readiness).

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use sheetrun_runtime::{ExecutionResponse, ExecutionService};

use crate::auth;

/// Content type of a successful response.
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Attachment file name of a successful response.
pub const ARTIFACT_FILENAME: &str = "generated_sheet.xlsx";

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The execution orchestrator.
    pub service: Arc<ExecutionService>,
    /// Optional Bearer token (None = no authentication required).
    pub token: Option<String>,
}

/// Builds the axum `Router` with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/execute", post(handle_execute))
        .route("/health", get(handle_health))
        .route("/health/ready", get(handle_ready))
        .with_state(state)
}

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "sheetrun",
        "executions": state.service.metrics().snapshot(),
    }))
}

/// Readiness check: `200 OK` while the scratch directory is usable.
async fn handle_ready(State(state): State<AppState>) -> impl IntoResponse {
    if state.service.store().is_ready() {
        (
            StatusCode::OK,
            Json(json!({"status": "ready", "service": "sheetrun"})),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"status": "unavailable", "service": "sheetrun"})),
        )
    }
}

async fn handle_execute(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    if let Some(ref token) = state.token {
        if auth::validate_bearer(&headers, token).is_err() {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "unauthorized"})),
            )
                .into_response();
        }
    }

    // Oversized or unreadable bodies keep axum's status but get a JSON body.
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            state.service.metrics().record_rejected();
            tracing::warn!(error = %rejection.body_text(), "request body rejected");
            return (
                rejection.status(),
                Json(json!({"error": rejection.body_text()})),
            )
                .into_response();
        }
    };

    match state.service.execute_body(&body).await {
        ExecutionResponse::Artifact(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{ARTIFACT_FILENAME}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        ExecutionResponse::Failure { payload, .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
        ExecutionResponse::Rejected(e) => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": e.message}))).into_response()
        }
    }
}
