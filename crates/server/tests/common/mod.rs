//! Common test utilities for end-to-end testing.
//!
//! The fixture builds the real router around temp storage directories, so
//! requests run through multipart parsing, the dispatcher, the conversion
//! backends and the download handler without binding a socket.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use fileforge_core::{Config, FileRegistry, LifecycleConfig, StorageConfig};
use fileforge_server::api::create_router;
use fileforge_server::state::AppState;

/// Re-export fixtures for test convenience
pub use fileforge_core::testing::fixtures;

const BOUNDARY: &str = "fileforge-test-boundary";

/// In-process server backed by temporary directories.
pub struct TestFixture {
    pub router: Router,
    pub state: Arc<AppState>,
    pub registry: Arc<FileRegistry>,
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub bytes: Bytes,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    pub async fn new() -> Self {
        Self::with_lifecycle(LifecycleConfig::default()).await
    }

    pub async fn with_lifecycle(lifecycle: LifecycleConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = Config {
            storage: StorageConfig {
                upload_dir: temp_dir.path().join("uploads"),
                output_dir: temp_dir.path().join("converted"),
            },
            lifecycle,
            ..Default::default()
        };

        std::fs::create_dir_all(&config.storage.upload_dir).expect("Failed to create upload dir");
        std::fs::create_dir_all(&config.storage.output_dir).expect("Failed to create output dir");

        let registry = Arc::new(FileRegistry::new());
        let state = Arc::new(AppState::with_default_engine(config, Arc::clone(&registry)));
        let router = create_router(Arc::clone(&state));

        Self {
            router,
            state,
            registry,
            temp_dir,
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.temp_dir.path().join("uploads")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("converted")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a multipart POST request.
    pub async fn post_form(&self, path: &str, form: MultipartForm) -> TestResponse {
        self.post_multipart_body(path, form.finish()).await
    }

    /// Send a multipart POST whose body stops without the closing boundary.
    pub async fn post_truncated_form(&self, path: &str, form: MultipartForm) -> TestResponse {
        self.post_multipart_body(path, form.body).await
    }

    async fn post_multipart_body(&self, path: &str, body: Vec<u8>) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            bytes,
            body,
        }
    }
}

/// Builds a `multipart/form-data` body by hand.
#[derive(Debug, Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, field: &str, filename: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, field, filename
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, field: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, field, value
            )
            .as_bytes(),
        );
        self
    }

    /// Starts a text field and cuts the body off inside its value.
    pub fn cut_text(mut self, field: &str, partial: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}",
                BOUNDARY, field, partial
            )
            .as_bytes(),
        );
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
