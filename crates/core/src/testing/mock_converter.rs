//! Mock converter for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{
    read_input, ConversionReport, ConversionRequest, Converter, ConverterError,
};

/// A recorded conversion request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The request that was submitted.
    pub request: ConversionRequest,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion requests for assertions
/// - Simulate success or failure
/// - Simulate slow conversions
///
/// # Example
///
/// ```rust,ignore
/// use fileforge_core::testing::MockConverter;
///
/// let mock = Arc::new(MockConverter::new());
/// engine.register(FileFormat::Png, FileFormat::Jpeg, mock.clone());
///
/// dispatcher.convert_one(job).await;
///
/// assert_eq!(mock.conversion_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// If set, the next conversion will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// Simulated conversion duration.
    delay: Arc<RwLock<Duration>>,
    /// Whether to write placeholder bytes to the output path.
    write_output: Arc<RwLock<bool>>,
    /// Whether the next conversion panics.
    panic: Arc<RwLock<bool>>,
    /// Whether to read the input file before anything else.
    read_input: Arc<RwLock<bool>>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Placeholder bytes written as output.
    pub const OUTPUT_BYTES: &'static [u8] = b"mock-output";

    /// Create a new mock converter that writes output and succeeds.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            write_output: Arc::new(RwLock::new(true)),
            panic: Arc::new(RwLock::new(false)),
            read_input: Arc::new(RwLock::new(false)),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the submitted requests, in arrival order.
    pub async fn recorded_requests(&self) -> Vec<ConversionRequest> {
        self.conversions
            .read()
            .await
            .iter()
            .map(|c| c.request.clone())
            .collect()
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Configure the next conversion to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the simulated conversion duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Write placeholder output bytes before succeeding or failing.
    pub async fn set_write_output(&self, write: bool) {
        *self.write_output.write().await = write;
    }

    /// Make the next conversion panic.
    pub async fn set_panic(&self, panic: bool) {
        *self.panic.write().await = panic;
    }

    /// Read the input up front, failing like a real capability when it is gone.
    pub async fn set_read_input(&self, read: bool) {
        *self.read_input.write().await = read;
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<ConverterError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionReport, ConverterError> {
        if *self.read_input.read().await {
            read_input(&request.input_path).await?;
        }

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if std::mem::take(&mut *self.panic.write().await) {
            panic!("mock converter panic");
        }

        if *self.write_output.read().await {
            tokio::fs::write(&request.output_path, Self::OUTPUT_BYTES).await?;
        }

        if let Some(err) = self.take_error().await {
            self.conversions.write().await.push(RecordedConversion {
                request: request.clone(),
                success: false,
            });
            return Err(err);
        }

        self.conversions.write().await.push(RecordedConversion {
            request: request.clone(),
            success: true,
        });

        Ok(ConversionReport {
            output_path: request.output_path.clone(),
            output_size_bytes: Self::OUTPUT_BYTES.len() as u64,
        })
    }
}
