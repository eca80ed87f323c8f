//! Lifecycle integration tests.
//!
//! These tests drive the dispatcher, registry, reaper and download resolver
//! together against a temporary storage layout:
//! - Uploads and outputs expire and become unresolvable
//! - The background reaper reclaims files on its own
//! - Failed or unsupported jobs leave nothing behind

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tempfile::TempDir;

use fileforge_core::{
    testing::{fixtures, MockConverter},
    ArtifactKind, ConversionDispatcher, ConversionEngine, ConversionJob, ConverterError,
    DispatchSettings, DownloadError, DownloadResolver, FileFormat, FileRegistry, Reaper,
    StorageLayout,
};

struct TestHarness {
    dispatcher: ConversionDispatcher,
    registry: Arc<FileRegistry>,
    resolver: DownloadResolver,
    layout: StorageLayout,
    _temp_dir: TempDir,
}

impl TestHarness {
    async fn new(engine: ConversionEngine) -> Self {
        Self::with_settings(engine, DispatchSettings::default()).await
    }

    async fn with_settings(engine: ConversionEngine, settings: DispatchSettings) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let layout = StorageLayout::new(
            temp_dir.path().join("uploads"),
            temp_dir.path().join("converted"),
        );
        layout.ensure_dirs().await.expect("Failed to create dirs");

        let registry = Arc::new(FileRegistry::new());
        let resolver = DownloadResolver::new(layout.output_dir());
        let dispatcher = ConversionDispatcher::new(
            Arc::new(engine),
            Arc::clone(&registry),
            layout.clone(),
            settings,
        );

        Self {
            dispatcher,
            registry,
            resolver,
            layout,
            _temp_dir: temp_dir,
        }
    }

    fn file_count(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    fn uploads(&self) -> usize {
        Self::file_count(self.layout.upload_dir())
    }

    fn outputs(&self) -> usize {
        Self::file_count(self.layout.output_dir())
    }
}

fn mock_engine(mock: &Arc<MockConverter>) -> ConversionEngine {
    let mut engine = ConversionEngine::new();
    engine.register(FileFormat::Png, FileFormat::Jpeg, mock.clone());
    engine
}

#[tokio::test]
async fn test_output_resolves_until_swept() {
    let h = TestHarness::new(ConversionEngine::with_defaults(90)).await;

    let result = h
        .dispatcher
        .convert_one(ConversionJob::new(
            "scan.pdf",
            fixtures::sample_pdf("Invoice 42"),
            "DOCX",
        ))
        .await;
    assert!(result.is_success(), "{:?}", result.error);
    let id = result.download_id.expect("download id");

    let resolved = h.resolver.resolve(&id).await.expect("resolves");
    assert_eq!(resolved.file_name, "scan.docx");
    assert_eq!(resolved.mime_type, FileFormat::Docx.mime_type());
    assert_eq!(
        h.registry.get(&resolved.path).map(|e| e.kind),
        Some(ArtifactKind::Output)
    );
    assert_eq!(h.registry.len(), 2);

    // Nothing is due yet.
    let reaper = Reaper::new(Arc::clone(&h.registry), Duration::from_secs(60));
    let report = reaper.sweep_once(Utc::now()).await;
    assert_eq!(report.expired_count(), 0);

    // Past both default TTLs.
    let later = Utc::now() + TimeDelta::seconds(601);
    let report = reaper.sweep_once(later).await;
    assert_eq!(report.reclaimed.len(), 2);
    assert!(report.failed.is_empty());

    assert!(matches!(
        h.resolver.resolve(&id).await,
        Err(DownloadError::NotFound)
    ));
    assert_eq!(h.uploads(), 0);
    assert_eq!(h.outputs(), 0);
    assert!(h.registry.is_empty());
}

#[tokio::test]
async fn test_input_expires_before_output() {
    let h = TestHarness::new(ConversionEngine::with_defaults(90)).await;

    let result = h
        .dispatcher
        .convert_one(ConversionJob::new("pic.bmp", fixtures::bmp(4, 4), "PNG"))
        .await;
    let id = result.download_id.expect("download id");

    let reaper = Reaper::new(Arc::clone(&h.registry), Duration::from_secs(60));
    let between = Utc::now() + TimeDelta::seconds(301);
    let report = reaper.sweep_once(between).await;
    assert_eq!(report.reclaimed.len(), 1);

    assert_eq!(h.uploads(), 0);
    assert!(h.resolver.resolve(&id).await.is_ok());
}

#[tokio::test]
async fn test_background_reaper_reclaims_files() {
    let settings = DispatchSettings {
        input_ttl: Duration::from_millis(50),
        output_ttl: Duration::from_millis(50),
        max_parallel: 2,
    };
    let h = TestHarness::with_settings(ConversionEngine::with_defaults(90), settings).await;
    let handle = Reaper::new(Arc::clone(&h.registry), Duration::from_millis(25)).spawn();

    let result = h
        .dispatcher
        .convert_one(ConversionJob::new("a.png", fixtures::png_with_alpha(4, 4), "JPG"))
        .await;
    let id = result.download_id.expect("download id");

    let mut gone = false;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(25)).await;
        if h.resolver.resolve(&id).await.is_err() && h.registry.is_empty() {
            gone = true;
            break;
        }
    }
    assert!(gone, "reaper did not reclaim the output");
    assert_eq!(h.uploads(), 0);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_reaper_shutdown_stops_loop() {
    let registry = Arc::new(FileRegistry::new());
    let handle = Reaper::new(registry, Duration::from_secs(3600)).spawn();
    assert!(!handle.is_finished());

    tokio::time::timeout(Duration::from_secs(2), handle.shutdown())
        .await
        .expect("reaper did not stop");
}

#[tokio::test]
async fn test_reregistration_moves_deadline() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("kept.png");
    std::fs::write(&path, b"data").unwrap();

    let registry = Arc::new(FileRegistry::new());
    let now = Utc::now();
    registry.register_at(&path, ArtifactKind::Output, now - TimeDelta::seconds(1));
    registry.register_at(&path, ArtifactKind::Output, now + TimeDelta::hours(1));
    assert_eq!(registry.len(), 1);

    let report = Reaper::new(Arc::clone(&registry), Duration::from_secs(60))
        .sweep_once(now)
        .await;
    assert_eq!(report.expired_count(), 0);
    assert!(path.exists());
}

#[tokio::test]
async fn test_sweep_removes_exactly_due_entries() {
    let temp = TempDir::new().unwrap();
    let registry = Arc::new(FileRegistry::new());
    let now = Utc::now();

    let offsets = [-30i64, -1, 0, 1, 30];
    for offset in offsets {
        let path = temp.path().join(format!("f{}.bmp", offset));
        std::fs::write(&path, b"x").unwrap();
        registry.register_at(&path, ArtifactKind::Input, now + TimeDelta::seconds(offset));
    }

    let report = Reaper::new(Arc::clone(&registry), Duration::from_secs(60))
        .sweep_once(now)
        .await;

    // Entries due at or before `now` go; later ones stay.
    assert_eq!(report.reclaimed.len(), 3);
    assert_eq!(registry.len(), 2);
    for offset in offsets {
        let path = temp.path().join(format!("f{}.bmp", offset));
        assert_eq!(path.exists(), offset > 0, "offset {}", offset);
        assert_eq!(registry.get(&path).is_some(), offset > 0);
    }
}

#[tokio::test]
async fn test_sweep_tolerates_missing_files() {
    let temp = TempDir::new().unwrap();
    let registry = Arc::new(FileRegistry::new());
    registry.register_at(
        temp.path().join("never-written.jpg"),
        ArtifactKind::Output,
        Utc::now(),
    );

    let report = Reaper::new(Arc::clone(&registry), Duration::from_secs(60))
        .sweep_once(Utc::now())
        .await;
    assert_eq!(report.missing.len(), 1);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_unsupported_pair_never_reaches_converter() {
    let mock = Arc::new(MockConverter::new());
    let h = TestHarness::new(mock_engine(&mock)).await;

    let result = h
        .dispatcher
        .convert_one(ConversionJob::new("chart.bmp", fixtures::bmp(4, 4), "DOCX"))
        .await;

    assert!(!result.is_success());
    assert!(result.error.is_some());
    assert_eq!(mock.conversion_count().await, 0);
    assert_eq!(h.uploads(), 0);
    assert!(h.registry.is_empty());
}

#[tokio::test]
async fn test_output_extension_follows_target() {
    let mock = Arc::new(MockConverter::new());
    let h = TestHarness::new(mock_engine(&mock)).await;

    let result = h
        .dispatcher
        .convert_one(ConversionJob::new("logo.png", fixtures::png_with_alpha(4, 4), "jpeg"))
        .await;
    let id = result.download_id.expect("download id");
    assert!(id.ends_with("_logo.jpeg"));

    let requests = mock.recorded_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].target, FileFormat::Jpeg);

    let resolved = h.resolver.resolve(&id).await.expect("resolves");
    assert_eq!(resolved.mime_type, "image/jpeg");
    assert_eq!(
        std::fs::read(&resolved.path).unwrap(),
        MockConverter::OUTPUT_BYTES
    );
}

#[tokio::test]
async fn test_converter_failure_and_panic_leave_nothing() {
    let mock = Arc::new(MockConverter::new());
    let h = TestHarness::new(mock_engine(&mock)).await;

    mock.set_next_error(ConverterError::decode_failed(FileFormat::Png, "corrupt"))
        .await;
    let failed = h
        .dispatcher
        .convert_one(ConversionJob::new("a.png", fixtures::png_with_alpha(4, 4), "JPEG"))
        .await;
    assert!(!failed.is_success());

    mock.set_panic(true).await;
    let panicked = h
        .dispatcher
        .convert_one(ConversionJob::new("b.png", fixtures::png_with_alpha(4, 4), "JPEG"))
        .await;
    assert!(!panicked.is_success());

    assert_eq!(h.uploads(), 0);
    assert_eq!(h.outputs(), 0);
    assert!(h.registry.is_empty());
}

#[tokio::test]
async fn test_queued_input_survives_short_ttl() {
    let mock = Arc::new(MockConverter::new());
    mock.set_read_input(true).await;
    mock.set_delay(Duration::from_millis(300)).await;
    let mut engine = ConversionEngine::new();
    engine.register(FileFormat::Png, FileFormat::Png, mock.clone());

    let settings = DispatchSettings {
        input_ttl: Duration::from_millis(100),
        output_ttl: Duration::from_secs(60),
        max_parallel: 1,
    };
    let h = TestHarness::with_settings(engine, settings).await;
    let handle = Reaper::new(Arc::clone(&h.registry), Duration::from_millis(20)).spawn();

    let jobs = vec![
        ConversionJob::new("a.png", fixtures::png_with_alpha(4, 4), "PNG"),
        ConversionJob::new("b.png", fixtures::png_with_alpha(4, 4), "PNG"),
    ];
    let results = h.dispatcher.convert_many(jobs, None).await;
    handle.shutdown().await;

    for result in &results {
        assert!(
            result.is_success(),
            "{}: {:?}",
            result.original_filename,
            result.error
        );
    }
    assert_eq!(mock.conversion_count().await, 2);
}

#[tokio::test]
async fn test_non_ascii_upload_resolves() {
    let h = TestHarness::new(ConversionEngine::with_defaults(90)).await;

    let result = h
        .dispatcher
        .convert_one(ConversionJob::new("фото.bmp", fixtures::bmp(4, 4), "JPG"))
        .await;
    assert!(result.is_success(), "{:?}", result.error);

    let id = result.download_id.expect("download id");
    let resolved = h.resolver.resolve(&id).await.expect("resolves");
    assert_eq!(resolved.file_name, "file.jpg");
    assert_eq!(resolved.mime_type, "image/jpeg");
}
