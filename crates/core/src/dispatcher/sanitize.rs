//! Upload filename sanitization.

use once_cell::sync::Lazy;
use regex_lite::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));
static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("valid regex"));

/// Stem used when nothing of the original stem survives.
const FALLBACK_STEM: &str = "file";

/// Reduces a client-supplied filename to a safe single path component.
///
/// Directory parts are dropped, whitespace becomes `_`, anything outside
/// `[A-Za-z0-9_.-]` is removed and leading or trailing dots and underscores
/// are trimmed from the stem. The extension is kept; a stem with nothing
/// left becomes `file`, so `写真.png` gives `file.png`. Returns `None` when
/// neither a stem nor an extension remains.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem, ext),
        None => (base, ""),
    };

    let stem = clean(stem);
    let ext = UNSAFE_CHARS.replace_all(ext, "");

    match (stem.is_empty(), ext.is_empty()) {
        (true, true) => None,
        (false, true) => Some(stem),
        (true, false) => Some(format!("{}.{}", FALLBACK_STEM, ext)),
        (false, false) => Some(format!("{}.{}", stem, ext)),
    }
}

fn clean(part: &str) -> String {
    let spaced = WHITESPACE.replace_all(part.trim(), "_");
    let safe = UNSAFE_CHARS.replace_all(&spaced, "");
    safe.trim_matches(|c| c == '.' || c == '_').to_string()
}
