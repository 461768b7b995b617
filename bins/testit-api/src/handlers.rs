// HTTP route handlers for the TestIt API

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use testit_common::types::{Language, TestCase, TestCaseResult};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{metrics, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub code: String,
    pub language: Language,
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub execution_results: Vec<TestCaseResult>,
}

/// POST /execute - Run a program against its test cases and return verdicts
///
/// The engine is stateless between calls: the complete, order-preserving
/// result array travels back in the response and the caller owns persistence.
pub async fn execute_batch(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ExecuteRequest>,
) -> impl IntoResponse {
    if payload.code.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "code must not be empty" })),
        )
            .into_response();
    }
    if payload.test_cases.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "testCases must not be empty" })),
        )
            .into_response();
    }

    let request_id = Uuid::new_v4();
    info!(
        request_id = %request_id,
        language = %payload.language,
        test_cases = payload.test_cases.len(),
        source_size = payload.code.len(),
        "Batch execution requested"
    );
    metrics::BATCH_REQUESTS.inc();

    let results = testit_engine::batch::run_all(
        &state.config,
        &payload.code,
        payload.language,
        &payload.test_cases,
    )
    .await;
    metrics::JOBS_EXECUTED.inc_by(results.len() as u64);

    if let Err(e) = state.store.persist(request_id, &results).await {
        // Persistence is a collaborator concern; the caller still gets its
        // results.
        warn!(request_id = %request_id, error = %e, "Failed to persist execution results");
    }

    info!(request_id = %request_id, results = results.len(), "Batch execution completed");

    (
        StatusCode::OK,
        Json(ExecuteResponse {
            execution_results: results,
        }),
    )
        .into_response()
}

/// GET /results/{request_id} - Look up previously persisted results
pub async fn get_results(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> impl IntoResponse {
    let request_uuid = match Uuid::parse_str(&request_id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "Invalid request ID format" })),
            )
                .into_response();
        }
    };

    match state.store.fetch(request_uuid).await {
        Some(results) => (
            StatusCode::OK,
            Json(ExecuteResponse {
                execution_results: results,
            }),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "request_id": request_id,
                "error": "No results for this request"
            })),
        )
            .into_response(),
    }
}

/// GET /status - Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, metrics::render(&state.registry))
}
