//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConverterError;
use super::types::{ConversionReport, ConversionRequest};

/// A capability that turns one file into another format.
///
/// Implementations read `request.input_path` and write `request.output_path`.
/// They are registered with a [`ConversionEngine`](super::ConversionEngine)
/// for each `(source, target)` pair they handle.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts the input file and writes the output file.
    async fn convert(&self, request: &ConversionRequest)
        -> Result<ConversionReport, ConverterError>;
}
