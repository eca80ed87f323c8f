use axum::{extract::State, http::header, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use fileforge_core::Route;

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Shorthand for a JSON error body with a status.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}

#[derive(Serialize)]
pub struct FormatsResponse {
    pub routes: Vec<Route>,
}

pub async fn formats(State(state): State<Arc<AppState>>) -> Json<FormatsResponse> {
    Json(FormatsResponse {
        routes: state.engine().routes(),
    })
}
