//! Conversion capabilities and the route table that selects them.
//!
//! A [`Converter`] turns one file on disk into another. The
//! [`ConversionEngine`] maps each supported `(source, target)` pair to the
//! capability that handles it and never lets a capability failure escape as
//! an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use fileforge_core::converter::{ConversionEngine, ConversionOptions};
//! use fileforge_core::FileFormat;
//!
//! let engine = ConversionEngine::with_defaults(90);
//! assert!(engine.supports(FileFormat::Pdf, FileFormat::Docx));
//!
//! let outcome = engine
//!     .convert(&input, &output, FileFormat::Jpeg, ConversionOptions::default())
//!     .await;
//! if !outcome.ok {
//!     eprintln!("{}", outcome.error.unwrap_or_default());
//! }
//! ```

mod docx;
mod engine;
mod error;
mod pdf;
mod raster;
mod traits;
mod types;

use std::io::ErrorKind;
use std::path::Path;

pub use docx::DocxBuilder;
pub use engine::ConversionEngine;
pub use error::ConverterError;
pub use pdf::PdfToDocxConverter;
pub use raster::{flatten_onto_white, ImageConverter, IMAGE_SOURCES, IMAGE_TARGETS};
pub use traits::Converter;
pub use types::{
    CompressionLevel, ConversionOptions, ConversionOutcome, ConversionReport, ConversionRequest,
    Route,
};

/// Reads a capability's input file.
pub(crate) async fn read_input(path: &Path) -> Result<Vec<u8>, ConverterError> {
    match tokio::fs::read(path).await {
        Ok(data) => Ok(data),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ConverterError::InputNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Writes a capability's output file and reports its size.
pub(crate) async fn write_output(
    path: &Path,
    data: &[u8],
) -> Result<ConversionReport, ConverterError> {
    tokio::fs::write(path, data).await?;
    Ok(ConversionReport {
        output_path: path.to_path_buf(),
        output_size_bytes: data.len() as u64,
    })
}
