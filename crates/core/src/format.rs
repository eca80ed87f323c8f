//! File formats known to the conversion service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

/// A file format the service can read or produce.
///
/// JPG and JPEG are kept distinct so a request for `JPEG` yields a `.jpeg`
/// file and a request for `JPG` yields a `.jpg` file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileFormat {
    Pdf,
    Docx,
    Jpg,
    Jpeg,
    Png,
    Bmp,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown file format: {0}")]
pub struct UnknownFormat(pub String);

impl FileFormat {
    pub const ALL: [FileFormat; 6] = [
        FileFormat::Pdf,
        FileFormat::Docx,
        FileFormat::Jpg,
        FileFormat::Jpeg,
        FileFormat::Png,
        FileFormat::Bmp,
    ];

    /// Canonical upper-case name (`"PDF"`, `"JPEG"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "PDF",
            FileFormat::Docx => "DOCX",
            FileFormat::Jpg => "JPG",
            FileFormat::Jpeg => "JPEG",
            FileFormat::Png => "PNG",
            FileFormat::Bmp => "BMP",
        }
    }

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "pdf",
            FileFormat::Docx => "docx",
            FileFormat::Jpg => "jpg",
            FileFormat::Jpeg => "jpeg",
            FileFormat::Png => "png",
            FileFormat::Bmp => "bmp",
        }
    }

    /// MIME type served for files of this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "application/pdf",
            FileFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileFormat::Jpg | FileFormat::Jpeg => "image/jpeg",
            FileFormat::Png => "image/png",
            FileFormat::Bmp => "image/bmp",
        }
    }

    /// Whether this is a raster image format.
    pub fn is_image(&self) -> bool {
        matches!(
            self,
            FileFormat::Jpg | FileFormat::Jpeg | FileFormat::Png | FileFormat::Bmp
        )
    }

    /// Whether this is a member of the JPEG family (no alpha channel).
    pub fn is_jpeg(&self) -> bool {
        matches!(self, FileFormat::Jpg | FileFormat::Jpeg)
    }

    /// Parses an extension such as `"png"`, `".PNG"` or `"Jpeg"`.
    pub fn from_extension(ext: &str) -> Option<Self> {
        ext.trim_start_matches('.').parse().ok()
    }

    /// Derives the format from a path's extension, case-insensitively.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl FromStr for FileFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        FileFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == upper)
            .ok_or_else(|| UnknownFormat(s.to_string()))
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("pdf".parse::<FileFormat>().unwrap(), FileFormat::Pdf);
        assert_eq!("Jpeg".parse::<FileFormat>().unwrap(), FileFormat::Jpeg);
        assert_eq!(" PNG ".parse::<FileFormat>().unwrap(), FileFormat::Png);
        assert!("gif".parse::<FileFormat>().is_err());
    }

    #[test]
    fn test_from_path() {
        assert_eq!(FileFormat::from_path("report.PDF"), Some(FileFormat::Pdf));
        assert_eq!(FileFormat::from_path("a/b/photo.jpg"), Some(FileFormat::Jpg));
        assert_eq!(FileFormat::from_path("archive.tar.gz"), None);
        assert_eq!(FileFormat::from_path("no_extension"), None);
    }

    #[test]
    fn test_from_extension_with_dot() {
        assert_eq!(FileFormat::from_extension(".bmp"), Some(FileFormat::Bmp));
    }

    #[test]
    fn test_extension_roundtrips_to_same_format() {
        for format in FileFormat::ALL {
            assert_eq!(FileFormat::from_extension(format.extension()), Some(format));
        }
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(
            FileFormat::Docx.mime_type(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(FileFormat::Jpg.mime_type(), "image/jpeg");
        assert_eq!(FileFormat::Png.mime_type(), "image/png");
    }

    #[test]
    fn test_serde_uses_uppercase() {
        let json = serde_json::to_string(&FileFormat::Jpeg).unwrap();
        assert_eq!(json, "\"JPEG\"");
    }
}
