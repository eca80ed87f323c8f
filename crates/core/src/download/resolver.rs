use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::format::FileFormat;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DownloadError {
    /// The id is malformed or the file is gone.
    #[error("File not found")]
    NotFound,
}

/// A download id mapped to a live file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDownload {
    pub path: PathBuf,
    pub mime_type: String,
    /// Name offered to the client, without the unique prefix.
    pub file_name: String,
}

/// Maps download ids to files in the output directory.
///
/// Existence is checked on storage rather than in the registry, so a file
/// stays downloadable until the reaper actually deletes it.
#[derive(Debug, Clone)]
pub struct DownloadResolver {
    output_dir: PathBuf,
}

impl DownloadResolver {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub async fn resolve(&self, download_id: &str) -> Result<ResolvedDownload, DownloadError> {
        if !is_plain_name(download_id) {
            debug!(download_id, "Rejected malformed download id");
            return Err(DownloadError::NotFound);
        }

        let path = self.output_dir.join(download_id);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => {}
            _ => return Err(DownloadError::NotFound),
        }

        Ok(ResolvedDownload {
            mime_type: mime_type_for(&path),
            file_name: display_name(download_id).to_string(),
            path,
        })
    }
}

/// A single normal path component with no separators.
fn is_plain_name(id: &str) -> bool {
    if id.is_empty() || id.contains(['/', '\\', '\0']) {
        return false;
    }
    let mut components = Path::new(id).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// MIME type for a converted file. Known formats use fixed types.
pub fn mime_type_for(path: &Path) -> String {
    match FileFormat::from_path(path) {
        Some(format) => format.mime_type().to_string(),
        None => mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string(),
    }
}

/// Strips a leading `<uuid>_` from a stored name.
fn display_name(id: &str) -> &str {
    match id.split_once('_') {
        Some((prefix, rest)) if !rest.is_empty() && Uuid::parse_str(prefix).is_ok() => rest,
        _ => id,
    }
}
