//! Route table dispatching conversions to capabilities.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use super::error::ConverterError;
use super::pdf::PdfToDocxConverter;
use super::raster::ImageConverter;
use super::traits::Converter;
use super::types::{ConversionOptions, ConversionOutcome, ConversionRequest, Route};
use crate::format::FileFormat;
use crate::metrics::{CONVERSIONS_TOTAL, CONVERSION_DURATION};
use crate::storage::remove_file;

/// Maps `(source, target)` pairs to the capability that handles them.
#[derive(Clone, Default)]
pub struct ConversionEngine {
    routes: HashMap<Route, Arc<dyn Converter>>,
}

impl std::fmt::Debug for ConversionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionEngine")
            .field("routes", &self.routes())
            .finish()
    }
}

impl ConversionEngine {
    /// An engine with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine with the built-in PDF and image capabilities.
    pub fn with_defaults(default_image_quality: u8) -> Self {
        let mut engine = Self::new();

        let pdf: Arc<dyn Converter> = Arc::new(PdfToDocxConverter::new());
        engine.register(FileFormat::Pdf, FileFormat::Docx, pdf);

        let image: Arc<dyn Converter> = Arc::new(ImageConverter::new(default_image_quality));
        for route in ImageConverter::routes() {
            engine.register(route.from, route.to, Arc::clone(&image));
        }

        engine
    }

    /// Adds or replaces the capability for a pair.
    pub fn register(&mut self, from: FileFormat, to: FileFormat, converter: Arc<dyn Converter>) {
        self.routes.insert(Route { from, to }, converter);
    }

    pub fn supports(&self, from: FileFormat, to: FileFormat) -> bool {
        self.routes.contains_key(&Route { from, to })
    }

    /// Every registered pair, sorted.
    pub fn routes(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self.routes.keys().copied().collect();
        routes.sort();
        routes
    }

    /// Converts `input` to `target`, writing `output`.
    ///
    /// The source format is taken from the input's extension. Every failure,
    /// including a panic inside the capability, is reported through the
    /// outcome and any partial output is removed.
    pub async fn convert(
        &self,
        input: &Path,
        output: &Path,
        target: FileFormat,
        options: ConversionOptions,
    ) -> ConversionOutcome {
        let Some(source) = FileFormat::from_path(input) else {
            let reason = format!("Unrecognized input format: {}", input.display());
            return ConversionOutcome::failure(output.to_path_buf(), reason);
        };

        let route = Route { from: source, to: target };
        let route_label = route.to_string();
        let Some(converter) = self.routes.get(&route) else {
            CONVERSIONS_TOTAL
                .with_label_values(&[&route_label, "unsupported"])
                .inc();
            let err = ConverterError::UnsupportedRoute {
                from: source,
                to: target,
            };
            return ConversionOutcome::failure(output.to_path_buf(), err.to_string());
        };

        let request = ConversionRequest {
            input_path: input.to_path_buf(),
            output_path: output.to_path_buf(),
            source,
            target,
            options,
        };

        debug!(route = %route, converter = converter.name(), "Starting conversion");
        let start = Instant::now();

        // Run the capability in its own task so a panic surfaces as a JoinError.
        let task_converter = Arc::clone(converter);
        let result = tokio::spawn(async move { task_converter.convert(&request).await })
            .await
            .map_err(ConverterError::from)
            .and_then(|r| r);

        let elapsed = start.elapsed();
        CONVERSION_DURATION
            .with_label_values(&[&route_label])
            .observe(elapsed.as_secs_f64());

        match result {
            Ok(report) => {
                CONVERSIONS_TOTAL
                    .with_label_values(&[&route_label, "success"])
                    .inc();
                info!(
                    route = %route,
                    output = %report.output_path.display(),
                    bytes = report.output_size_bytes,
                    duration_ms = elapsed.as_millis() as u64,
                    "Conversion completed"
                );
                ConversionOutcome::success(report.output_path)
            }
            Err(e) => {
                CONVERSIONS_TOTAL
                    .with_label_values(&[&route_label, "error"])
                    .inc();
                error!(
                    route = %route,
                    input = %input.display(),
                    error = %e,
                    "Conversion failed"
                );
                if let Err(cleanup) = remove_file(output).await {
                    debug!(error = %cleanup, "Could not remove partial output");
                }
                ConversionOutcome::failure(output.to_path_buf(), e.to_string())
            }
        }
    }
}
