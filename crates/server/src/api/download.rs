use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use super::handlers::{error_response, ErrorResponse};
use crate::metrics::DOWNLOADS_TOTAL;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn not_found() -> ApiError {
    DOWNLOADS_TOTAL.with_label_values(&["not_found"]).inc();
    error_response(StatusCode::NOT_FOUND, "File not found")
}

/// Streams a converted file as an attachment.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let resolved = state.resolver().resolve(&id).await.map_err(|_| {
        debug!(download_id = %id, "Download not found");
        not_found()
    })?;

    // The reaper may delete the file between resolve and open.
    let file = tokio::fs::File::open(&resolved.path)
        .await
        .map_err(|_| not_found())?;
    let length = file.metadata().await.ok().map(|m| m.len());

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, resolved.mime_type.as_str())
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                resolved.file_name.replace('"', "")
            ),
        );
    if let Some(length) = length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    let response = builder
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| {
            warn!(error = %e, "Failed to build download response");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to build response")
        })?;

    DOWNLOADS_TOTAL.with_label_values(&["served"]).inc();
    Ok(response)
}
