//! Resolution of download identifiers to converted files.

mod resolver;

pub use resolver::{mime_type_for, DownloadError, DownloadResolver, ResolvedDownload};
