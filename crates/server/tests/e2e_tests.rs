//! End-to-end tests through the in-process router.
//!
//! Conversions run against the real PDF and image backends; inputs are
//! generated by the core fixtures.

mod common;

use std::time::Duration;

use axum::http::{header, StatusCode};
use chrono::Utc;
use image::GenericImageView;

use fileforge_core::{LifecycleConfig, Reaper};

use common::{fixtures, MultipartForm, TestFixture};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The download URL of a successful result.
fn download_url(result: &serde_json::Value) -> String {
    result["download_url"]
        .as_str()
        .expect("download_url missing")
        .to_string()
}

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_formats_lists_routes() {
    let fixture = TestFixture::new().await;
    let response = fixture.get("/formats").await;
    assert_status!(response, StatusCode::OK);

    let routes = response.body["routes"].as_array().expect("routes array");
    assert!(routes
        .iter()
        .any(|r| r["from"] == "PDF" && r["to"] == "DOCX"));
    assert!(routes
        .iter()
        .any(|r| r["from"] == "PNG" && r["to"] == "JPEG"));
    assert!(!routes
        .iter()
        .any(|r| r["from"] == "BMP" && r["to"] == "DOCX"));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new().await;
    fixture.get("/").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response
        .header(header::CONTENT_TYPE)
        .unwrap_or_default()
        .starts_with("text/plain"));

    let text = String::from_utf8_lossy(&response.bytes);
    assert!(text.contains("fileforge_http_requests_total"));
    assert!(text.contains("fileforge_reaper_sweeps_total"));
}

// =============================================================================
// Detection
// =============================================================================

#[tokio::test]
async fn test_detect_by_filename() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form(
            "/detect",
            MultipartForm::new().file("file", "report.pdf", b"not really a pdf"),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["format"], "PDF");

    let response = fixture
        .post_form("/detect", MultipartForm::new().file("file", "photo.png", b""))
        .await;
    assert_eq!(response.body["format"], "PNG");

    let response = fixture
        .post_form("/detect", MultipartForm::new().file("file", "README", b"x"))
        .await;
    assert_eq!(response.body["format"], "UNKNOWN");
}

#[tokio::test]
async fn test_detect_requires_file() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form("/detect", MultipartForm::new().text("other", "value"))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "No file provided");

    let response = fixture
        .post_form("/detect", MultipartForm::new().file("file", "", b""))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "No file selected");
}

// =============================================================================
// Conversion and download
// =============================================================================

#[tokio::test]
async fn test_pdf_to_docx_and_download() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form(
            "/convert",
            MultipartForm::new()
                .file("files", "report.pdf", &fixtures::sample_pdf("Quarterly numbers"))
                .text("format", "DOCX"),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let result = &response.body["results"][0];
    assert_eq!(result["filename"], "report.pdf");
    assert_eq!(result["status"], "success");
    assert!(result["error"].is_null());

    let url = download_url(result);
    assert!(url.starts_with("/download/"));
    assert!(url.ends_with("_report.docx"));

    let download = fixture.get(&url).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.header(header::CONTENT_TYPE), Some(DOCX_MIME));
    assert_eq!(
        download.header(header::CONTENT_DISPOSITION),
        Some("attachment; filename=\"report.docx\"")
    );
    // A DOCX is a zip package.
    assert!(download.bytes.starts_with(b"PK"));
}

#[tokio::test]
async fn test_png_with_alpha_to_jpeg_is_flattened() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form(
            "/convert",
            MultipartForm::new()
                .file("files", "photo.png", &fixtures::png_with_alpha(32, 16))
                .text("format", "JPEG"),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let result = &response.body["results"][0];
    assert_eq!(result["status"], "success");
    let url = download_url(result);
    assert!(url.ends_with("_photo.jpeg"));

    let download = fixture.get(&url).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.header(header::CONTENT_TYPE), Some("image/jpeg"));

    let decoded = image::load_from_memory(&download.bytes).expect("valid jpeg");
    assert_eq!(decoded.dimensions(), (32, 16));
    assert!(!decoded.color().has_alpha());

    // The transparent half lands on white.
    let corner = decoded.get_pixel(0, 0);
    assert!(corner.0[..3].iter().all(|c| *c > 230), "got {:?}", corner);
}

#[tokio::test]
async fn test_batch_keeps_order_and_isolates_failures() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form(
            "/convert",
            MultipartForm::new()
                .file("files", "a.png", &fixtures::png_with_alpha(8, 8))
                .file("files", "b.bmp", &fixtures::bmp(8, 8))
                .file("files", "c.jpg", &fixtures::jpeg(8, 8))
                .text("format", "PNG")
                .text("format", "DOCX")
                .text("format", "PNG"),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let results = response.body["results"].as_array().expect("results");
    assert_eq!(results.len(), 3);

    assert_eq!(results[0]["filename"], "a.png");
    assert_eq!(results[0]["status"], "success");

    assert_eq!(results[1]["filename"], "b.bmp");
    assert_eq!(results[1]["status"], "error");
    assert!(results[1]["download_url"].is_null());
    assert!(results[1]["error"].as_str().is_some_and(|e| !e.is_empty()));

    assert_eq!(results[2]["filename"], "c.jpg");
    assert_eq!(results[2]["status"], "success");
    assert!(download_url(&results[2]).ends_with("_c.png"));
}

#[tokio::test]
async fn test_single_format_applies_to_every_file() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form(
            "/convert",
            MultipartForm::new()
                .file("files", "one.png", &fixtures::png_with_alpha(4, 4))
                .file("files", "two.bmp", &fixtures::bmp(4, 4))
                .text("format", "JPG"),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let results = response.body["results"].as_array().expect("results");
    assert_eq!(results.len(), 2);
    assert!(download_url(&results[0]).ends_with("_one.jpg"));
    assert!(download_url(&results[1]).ends_with("_two.jpg"));
}

#[tokio::test]
async fn test_unknown_source_type_is_reported_per_file() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form(
            "/convert",
            MultipartForm::new()
                .file("files", "notes.txt", b"plain text")
                .text("format", "PDF"),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let result = &response.body["results"][0];
    assert_eq!(result["status"], "error");
    assert_eq!(result["error"], "Unsupported input file type: txt");
}

#[tokio::test]
async fn test_failed_conversion_leaves_no_files() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form(
            "/convert",
            MultipartForm::new()
                .file("files", "broken.pdf", b"%PDF-1.4 garbage")
                .text("format", "DOCX"),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["results"][0]["status"], "error");

    let uploads = std::fs::read_dir(fixture.upload_dir()).unwrap().count();
    let outputs = std::fs::read_dir(fixture.output_dir()).unwrap().count();
    assert_eq!(uploads, 0);
    assert_eq!(outputs, 0);
    assert!(fixture.registry.is_empty());
}

#[tokio::test]
async fn test_convert_requires_files_and_format() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form("/convert", MultipartForm::new().text("format", "PNG"))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "No files provided");

    let response = fixture
        .post_form(
            "/convert",
            MultipartForm::new().file("files", "a.png", &fixtures::png_with_alpha(4, 4)),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "No target format provided");
}

#[tokio::test]
async fn test_unreadable_format_field_is_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_truncated_form(
            "/convert",
            MultipartForm::new()
                .file("files", "a.png", &fixtures::png_with_alpha(4, 4))
                .cut_text("format", "JP"),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .is_some_and(|e| e.starts_with("Failed to read target format")));
    assert!(fixture.registry.is_empty());
}

#[tokio::test]
async fn test_non_ascii_filename_keeps_source_format() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form(
            "/convert",
            MultipartForm::new()
                .file("files", "写真.png", &fixtures::png_with_alpha(4, 4))
                .text("format", "JPEG"),
        )
        .await;
    assert_status!(response, StatusCode::OK);

    let result = &response.body["results"][0];
    assert_eq!(result["filename"], "写真.png");
    assert_eq!(result["status"], "success");
    let url = download_url(result);
    assert!(url.ends_with("_file.jpeg"));

    let download = fixture.get(&url).await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(
        download.header(header::CONTENT_DISPOSITION),
        Some("attachment; filename=\"file.jpeg\"")
    );
}

#[tokio::test]
async fn test_convert_rejects_bad_quality() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .post_form(
            "/convert",
            MultipartForm::new()
                .file("files", "a.png", &fixtures::png_with_alpha(4, 4))
                .text("format", "JPEG")
                .text("quality", "0"),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_download_unknown_id_is_404() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/download/does-not-exist.docx").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "File not found");
}

#[tokio::test]
async fn test_download_gone_after_expiry() {
    let fixture = TestFixture::with_lifecycle(LifecycleConfig {
        input_ttl_secs: 0,
        output_ttl_secs: 0,
        sweep_interval_secs: 1,
    })
    .await;

    let response = fixture
        .post_form(
            "/convert",
            MultipartForm::new()
                .file("files", "photo.bmp", &fixtures::bmp(4, 4))
                .text("format", "PNG"),
        )
        .await;
    let url = download_url(&response.body["results"][0]);

    let reaper = Reaper::new(fixture.registry.clone(), Duration::from_secs(1));
    let report = reaper.sweep_once(Utc::now()).await;
    assert_eq!(report.expired_count(), 2);

    let download = fixture.get(&url).await;
    assert_status!(download, StatusCode::NOT_FOUND);
    assert!(fixture.registry.is_empty());
}
