//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::format::FileFormat;

/// How aggressively embedded images are recompressed before a document
/// conversion. Higher compression keeps less image quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    Low,
    Medium,
    High,
}

impl CompressionLevel {
    /// JPEG quality used when recompressing at this level.
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            CompressionLevel::Low => 85,
            CompressionLevel::Medium => 65,
            CompressionLevel::High => 40,
        }
    }
}

impl FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(CompressionLevel::Low),
            "medium" => Ok(CompressionLevel::Medium),
            "high" => Ok(CompressionLevel::High),
            other => Err(format!("Unknown compression level: {}", other)),
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompressionLevel::Low => "low",
            CompressionLevel::Medium => "medium",
            CompressionLevel::High => "high",
        };
        f.write_str(s)
    }
}

/// Optional tuning for one conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionOptions {
    /// Lossy image quality, 1-100. Ignored for lossless targets.
    #[serde(default)]
    pub quality: Option<u8>,
    /// Recompression of images embedded in documents.
    #[serde(default)]
    pub compression: Option<CompressionLevel>,
}

impl ConversionOptions {
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn with_compression(mut self, level: CompressionLevel) -> Self {
        self.compression = Some(level);
        self
    }
}

/// One invocation of a conversion capability.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub source: FileFormat,
    pub target: FileFormat,
    pub options: ConversionOptions,
}

/// What a capability reports after writing its output.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
}

/// Outcome of an engine conversion. Failures never escape as errors.
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub ok: bool,
    pub output_path: PathBuf,
    /// Human-readable failure reason when `ok` is false.
    pub error: Option<String>,
}

impl ConversionOutcome {
    pub fn success(output_path: PathBuf) -> Self {
        Self {
            ok: true,
            output_path,
            error: None,
        }
    }

    pub fn failure(output_path: PathBuf, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            output_path,
            error: Some(error.into()),
        }
    }
}

/// A supported `(source, target)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Route {
    pub from: FileFormat,
    pub to: FileFormat,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}
