//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

use crate::format::FileFormat;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// No capability is registered for the requested pair.
    #[error("Conversion from {from} to {to} is not supported")]
    UnsupportedRoute { from: FileFormat, to: FileFormat },

    /// Input bytes could not be decoded.
    #[error("Failed to decode {format} input: {reason}")]
    DecodeFailed { format: FileFormat, reason: String },

    /// Output could not be encoded.
    #[error("Failed to encode {format} output: {reason}")]
    EncodeFailed { format: FileFormat, reason: String },

    /// Invalid conversion options.
    #[error("Invalid options: {reason}")]
    InvalidOptions { reason: String },

    /// The blocking conversion task panicked or was cancelled.
    #[error("Conversion task failed: {reason}")]
    TaskFailed { reason: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a new decode failed error.
    pub fn decode_failed(format: FileFormat, reason: impl ToString) -> Self {
        Self::DecodeFailed {
            format,
            reason: reason.to_string(),
        }
    }

    /// Creates a new encode failed error.
    pub fn encode_failed(format: FileFormat, reason: impl ToString) -> Self {
        Self::EncodeFailed {
            format,
            reason: reason.to_string(),
        }
    }

    /// Creates a new invalid options error.
    pub fn invalid_options(reason: impl Into<String>) -> Self {
        Self::InvalidOptions {
            reason: reason.into(),
        }
    }
}

impl From<tokio::task::JoinError> for ConverterError {
    fn from(e: tokio::task::JoinError) -> Self {
        let reason = if e.is_panic() {
            "conversion panicked".to_string()
        } else {
            e.to_string()
        };
        Self::TaskFailed { reason }
    }
}
