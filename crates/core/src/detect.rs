//! Filename-based format detection.

use std::path::Path;

/// Name reported when neither MIME lookup nor extension applies.
pub const UNKNOWN_FORMAT: &str = "UNKNOWN";

/// Guesses a display format from a filename alone.
///
/// Uses the subtype of the guessed MIME type, upper-cased (`report.pdf` gives
/// `PDF`, `photo.jpg` gives `JPEG`). Names with no known MIME type fall back
/// to the upper-cased extension, and names without one give `UNKNOWN`.
/// File contents are never inspected.
pub fn detect_format(filename: &str) -> String {
    if let Some(mime) = mime_guess::from_path(filename).first() {
        return mime.subtype().as_str().to_ascii_uppercase();
    }

    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_uppercase())
        .unwrap_or_else(|| UNKNOWN_FORMAT.to_string())
}
