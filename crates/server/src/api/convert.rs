use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use fileforge_core::{
    BatchProgress, CompressionLevel, ConversionJob, ConversionOptions, ConversionResult,
    ConversionStatus,
};

use super::handlers::{error_response, ErrorResponse};
use crate::metrics::FILES_UPLOADED_TOTAL;
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResult {
    pub filename: String,
    pub status: ConversionStatus,
    pub download_url: Option<String>,
    pub error: Option<String>,
}

impl From<ConversionResult> for FileResult {
    fn from(result: ConversionResult) -> Self {
        Self {
            filename: result.original_filename,
            status: result.status,
            download_url: result.download_id.map(|id| format!("/download/{}", id)),
            error: result.error,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub results: Vec<FileResult>,
}

/// Form contents of a convert request.
#[derive(Debug, Default)]
struct ConvertForm {
    files: Vec<(String, Vec<u8>)>,
    formats: Vec<String>,
    options: ConversionOptions,
}

impl ConvertForm {
    /// Target for the file at `index`. A single format applies to every file.
    fn format_for(&self, index: usize) -> String {
        match self.formats.as_slice() {
            [only] => only.clone(),
            many => many.get(index).cloned().unwrap_or_default(),
        }
    }

    fn into_jobs(self) -> Vec<ConversionJob> {
        let targets: Vec<String> = (0..self.files.len()).map(|i| self.format_for(i)).collect();
        let options = self.options;
        self.files
            .into_iter()
            .zip(targets)
            .enumerate()
            .map(|(index, ((filename, data), target))| {
                ConversionJob::new(filename, data, target)
                    .with_options(options)
                    .with_sequence_index(index)
            })
            .collect()
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

async fn read_form(mut multipart: Multipart) -> Result<ConvertForm, ApiError> {
    let mut form = ConvertForm::default();

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

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" | "files" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(|e| {
                    error_response(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file: {}", e),
                    )
                })?;
                // Browsers send an empty part when no file was picked.
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                form.files.push((filename, data.to_vec()));
            }
            "format" | "target_format" => {
                let text = field.text().await.map_err(|e| {
                    error_response(
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read target format: {}", e),
                    )
                })?;
                let text = text.trim().to_string();
                if !text.is_empty() {
                    form.formats.push(text);
                }
            }
            "quality" => {
                let text = field.text().await.unwrap_or_default();
                let quality = text
                    .trim()
                    .parse::<u8>()
                    .ok()
                    .filter(|q| (1..=100).contains(q))
                    .ok_or_else(|| {
                        error_response(
                            StatusCode::BAD_REQUEST,
                            format!("Invalid quality: {:?} (expected 1-100)", text),
                        )
                    })?;
                form.options = form.options.with_quality(quality);
            }
            "compression" => {
                let text = field.text().await.unwrap_or_default();
                let level = text
                    .parse::<CompressionLevel>()
                    .map_err(|e| error_response(StatusCode::BAD_REQUEST, e))?;
                form.options = form.options.with_compression(level);
            }
            other => {
                debug!(field = other, "Ignoring unknown form field");
            }
        }
    }

    Ok(form)
}

/// Converts one or more uploaded files.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let form = read_form(multipart).await?;

    if form.files.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "No files provided"));
    }
    if form.formats.is_empty() {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "No target format provided",
        ));
    }

    let jobs = form.into_jobs();
    FILES_UPLOADED_TOTAL.inc_by(jobs.len() as u64);

    let (tx, mut rx) = mpsc::channel::<BatchProgress>(jobs.len() * 2);
    let progress_log = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            debug!(percent = event.percent(), ?event, "Batch progress");
        }
    });

    let results = state.dispatcher().convert_many(jobs, Some(tx)).await;
    // The sender is dropped with the batch, ending the log task.
    if let Err(e) = progress_log.await {
        warn!(error = %e, "Progress log task ended abnormally");
    }

    let succeeded = results.iter().filter(|r| r.is_success()).count();
    info!(
        files = results.len(),
        succeeded,
        failed = results.len() - succeeded,
        "Conversion request finished"
    );

    Ok(Json(ConvertResponse {
        results: results.into_iter().map(FileResult::from).collect(),
    }))
}
