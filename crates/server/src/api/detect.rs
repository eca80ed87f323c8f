use axum::{extract::Multipart, http::StatusCode, Json};
use serde::Serialize;
use tracing::debug;

use fileforge_core::detect_format;

use super::handlers::{error_response, ErrorResponse};

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub format: String,
}

/// Reports the format of an uploaded file, judged by its name.
pub async fn detect(
    mut multipart: Multipart,
) -> Result<Json<DetectResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut filename: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid multipart body: {}", e),
                ))
            }
        };
        if field.name() == Some("file") {
            filename = Some(field.file_name().unwrap_or("").to_string());
            break;
        }
    }

    let filename = filename
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "No file provided"))?;
    if filename.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "No file selected"));
    }

    let format = detect_format(&filename);
    debug!(filename = %filename, format = %format, "Detected file format");
    Ok(Json(DetectResponse { format }))
}
