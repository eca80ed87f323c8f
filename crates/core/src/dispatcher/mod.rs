//! Conversion dispatch: naming, registration and per-file results.
//!
//! The dispatcher is the only component that creates artifacts. For each
//! job it checks the requested pair against the [`ConversionEngine`], waits
//! for a conversion slot, writes the upload under a unique name, registers
//! it with the [`FileRegistry`] for the input TTL, converts and, on success,
//! registers the output for the output TTL.
//! A failed job leaves nothing behind: its input is deleted and unregistered
//! at once instead of waiting for the reaper.

mod sanitize;
mod types;

pub use sanitize::sanitize_filename;
pub use types::{
    BatchProgress, ConversionJob, ConversionResult, ConversionStatus, DispatchError,
    DispatchSettings,
};

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::converter::ConversionEngine;
use crate::format::FileFormat;
use crate::lifecycle::{ArtifactKind, FileRegistry};
use crate::storage::{remove_file, StorageLayout};

/// Runs conversion jobs and owns the artifacts they create.
pub struct ConversionDispatcher {
    engine: Arc<ConversionEngine>,
    registry: Arc<FileRegistry>,
    layout: StorageLayout,
    settings: DispatchSettings,
    permits: Semaphore,
}

impl ConversionDispatcher {
    pub fn new(
        engine: Arc<ConversionEngine>,
        registry: Arc<FileRegistry>,
        layout: StorageLayout,
        settings: DispatchSettings,
    ) -> Self {
        let permits = Semaphore::new(settings.max_parallel.max(1));
        Self {
            engine,
            registry,
            layout,
            settings,
            permits,
        }
    }

    pub fn engine(&self) -> &ConversionEngine {
        &self.engine
    }

    pub fn registry(&self) -> &Arc<FileRegistry> {
        &self.registry
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Converts one uploaded file.
    pub async fn convert_one(&self, job: ConversionJob) -> ConversionResult {
        let original = job.source_filename.clone();
        let index = job.sequence_index;

        match self.run(job).await {
            Ok(download_id) => {
                info!(
                    index,
                    filename = %original,
                    download_id = %download_id,
                    "Conversion job succeeded"
                );
                ConversionResult::success(original, download_id)
            }
            Err(e) => {
                warn!(index, filename = %original, error = %e, "Conversion job failed");
                ConversionResult::error(original, e.to_string())
            }
        }
    }

    /// Converts a batch concurrently.
    ///
    /// Returns one result per job in submission order. Jobs fail
    /// independently. When `progress` is given, a `JobStarted` and a
    /// `JobFinished` event are offered for each job; events are dropped
    /// rather than waited on if the receiver falls behind.
    pub async fn convert_many(
        &self,
        jobs: Vec<ConversionJob>,
        progress: Option<mpsc::Sender<BatchProgress>>,
    ) -> Vec<ConversionResult> {
        let total = jobs.len();
        let finished = AtomicUsize::new(0);
        info!(total, "Dispatching conversion batch");

        let tasks = jobs.into_iter().enumerate().map(|(index, job)| {
            let progress = progress.as_ref();
            let finished = &finished;
            async move {
                let filename = job.source_filename.clone();
                let job = job.with_sequence_index(index);

                emit(
                    progress,
                    BatchProgress::JobStarted {
                        index,
                        total,
                        filename: filename.clone(),
                        percent: percent(finished.load(Ordering::SeqCst), total),
                    },
                );

                let result = self.convert_one(job).await;

                let done = finished.fetch_add(1, Ordering::SeqCst) + 1;
                emit(
                    progress,
                    BatchProgress::JobFinished {
                        index,
                        total,
                        filename,
                        status: result.status,
                        percent: percent(done, total),
                    },
                );
                result
            }
        });

        join_all(tasks).await
    }

    async fn run(&self, job: ConversionJob) -> Result<String, DispatchError> {
        let sanitized = sanitize_filename(&job.source_filename)
            .ok_or_else(|| DispatchError::InvalidFilename(job.source_filename.clone()))?;
        let (source, target) = self.route_for(&job)?;

        // The input TTL starts only once this job may run, so a queued job's
        // upload cannot expire before the engine reads it.
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| DispatchError::Closed)?;

        let input_name = format!("{}_{}", Uuid::new_v4(), sanitized);
        let input_path = self.layout.write_input(&input_name, &job.data).await?;
        self.registry
            .register(&input_path, ArtifactKind::Input, self.settings.input_ttl);
        debug!(path = %input_path.display(), bytes = job.data.len(), %source, "Stored upload");

        match self.convert_stored(&job, &sanitized, &input_path, target).await {
            Ok(download_id) => Ok(download_id),
            Err(e) => {
                self.discard(&input_path).await;
                Err(e)
            }
        }
    }

    /// Source and target formats of a job, checked against the engine.
    ///
    /// The source comes from the extension of the name the client sent.
    fn route_for(&self, job: &ConversionJob) -> Result<(FileFormat, FileFormat), DispatchError> {
        let original = Path::new(&job.source_filename);
        let source = FileFormat::from_path(original).ok_or_else(|| {
            let ext = original
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string();
            DispatchError::UnknownSourceFormat(ext)
        })?;
        if job.target_format.trim().is_empty() {
            return Err(DispatchError::MissingTargetFormat);
        }
        let target: FileFormat = job
            .target_format
            .parse()
            .map_err(|_| DispatchError::UnknownTargetFormat(job.target_format.clone()))?;

        if !self.engine.supports(source, target) {
            return Err(DispatchError::Unsupported {
                from: source,
                to: target,
            });
        }
        Ok((source, target))
    }

    async fn convert_stored(
        &self,
        job: &ConversionJob,
        sanitized: &str,
        input_path: &Path,
        target: FileFormat,
    ) -> Result<String, DispatchError> {
        let download_id = output_name(sanitized, target);
        let output_path = self.layout.output_path(&download_id);

        let outcome = self
            .engine
            .convert(input_path, &output_path, target, job.options)
            .await;

        if !outcome.ok {
            return Err(DispatchError::ConversionFailed(
                outcome
                    .error
                    .unwrap_or_else(|| "Conversion failed".to_string()),
            ));
        }

        self.registry
            .register(&outcome.output_path, ArtifactKind::Output, self.settings.output_ttl);
        Ok(download_id)
    }

    /// Deletes and unregisters an artifact ahead of its deadline.
    async fn discard(&self, path: &Path) {
        self.registry.unregister(path);
        if let Err(e) = remove_file(path).await {
            warn!(error = %e, "Failed to discard artifact");
        }
    }
}

/// Output and download name: `<uuid>_<stem>.<ext>`.
fn output_name(sanitized: &str, target: FileFormat) -> String {
    let stem = Path::new(sanitized)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("file");
    format!("{}_{}.{}", Uuid::new_v4(), stem, target.extension())
}

fn percent(done: usize, total: usize) -> f32 {
    if total == 0 {
        100.0
    } else {
        done as f32 / total as f32 * 100.0
    }
}

fn emit(progress: Option<&mpsc::Sender<BatchProgress>>, event: BatchProgress) {
    if let Some(tx) = progress {
        if let Err(e) = tx.try_send(event) {
            debug!(error = %e, "Dropped batch progress event");
        }
    }
}
