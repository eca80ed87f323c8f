//! Types for the dispatcher module.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::converter::ConversionOptions;
use crate::format::FileFormat;
use crate::storage::StorageError;

/// One uploaded file awaiting conversion.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// Name the client sent, unsanitized.
    pub source_filename: String,
    /// Uploaded bytes.
    pub data: Vec<u8>,
    /// Requested target format, as sent by the client (`"JPEG"`, `"docx"`).
    pub target_format: String,
    pub options: ConversionOptions,
    /// Position within its batch.
    pub sequence_index: usize,
}

impl ConversionJob {
    pub fn new(
        source_filename: impl Into<String>,
        data: Vec<u8>,
        target_format: impl Into<String>,
    ) -> Self {
        Self {
            source_filename: source_filename.into(),
            data,
            target_format: target_format.into(),
            options: ConversionOptions::default(),
            sequence_index: 0,
        }
    }

    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_sequence_index(mut self, index: usize) -> Self {
        self.sequence_index = index;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionStatus {
    Success,
    Error,
}

/// Per-file outcome of a dispatch.
///
/// `download_id` is present iff the status is success, `error` iff it is not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    pub original_filename: String,
    pub status: ConversionStatus,
    pub download_id: Option<String>,
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn success(original_filename: impl Into<String>, download_id: impl Into<String>) -> Self {
        Self {
            original_filename: original_filename.into(),
            status: ConversionStatus::Success,
            download_id: Some(download_id.into()),
            error: None,
        }
    }

    pub fn error(original_filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            original_filename: original_filename.into(),
            status: ConversionStatus::Error,
            download_id: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ConversionStatus::Success
    }
}

/// Progress of a batch, as a best-effort UX hint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BatchProgress {
    JobStarted {
        index: usize,
        total: usize,
        filename: String,
        percent: f32,
    },
    JobFinished {
        index: usize,
        total: usize,
        filename: String,
        status: ConversionStatus,
        percent: f32,
    },
}

impl BatchProgress {
    pub fn percent(&self) -> f32 {
        match self {
            BatchProgress::JobStarted { percent, .. } | BatchProgress::JobFinished { percent, .. } => {
                *percent
            }
        }
    }
}

/// TTLs and concurrency for a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    pub input_ttl: Duration,
    pub output_ttl: Duration,
    pub max_parallel: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            input_ttl: Duration::from_secs(300),
            output_ttl: Duration::from_secs(600),
            max_parallel: 4,
        }
    }
}

impl DispatchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            input_ttl: config.lifecycle.input_ttl(),
            output_ttl: config.lifecycle.output_ttl(),
            max_parallel: config.conversion.max_parallel_conversions,
        }
    }
}

/// Why a single job failed.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The filename is empty after sanitization.
    #[error("Invalid filename: {0:?}")]
    InvalidFilename(String),

    /// No target format was given for the job.
    #[error("No target format provided")]
    MissingTargetFormat,

    /// The requested target is not a known format.
    #[error("Unknown target format: {0}")]
    UnknownTargetFormat(String),

    /// The input extension is not a known format.
    #[error("Unsupported input file type: {0}")]
    UnknownSourceFormat(String),

    /// No capability handles the pair.
    #[error("Conversion from {from} to {to} is not supported")]
    Unsupported { from: FileFormat, to: FileFormat },

    /// The capability reported a failure.
    #[error("{0}")]
    ConversionFailed(String),

    /// The dispatcher is shutting down.
    #[error("Dispatcher is shutting down")]
    Closed,

    #[error(transparent)]
    Storage(#[from] StorageError),
}
