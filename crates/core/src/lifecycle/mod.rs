//! Ephemeral file lifecycle.
//!
//! Every file the service writes (uploads and conversion outputs) is tracked
//! by a [`FileRegistry`] together with the instant after which it may be
//! deleted. A [`Reaper`] periodically sweeps the registry and removes expired
//! files from disk.
//!
//! The registry, not the filesystem, decides whether an artifact is alive.
//! Selection and removal of expired entries happen under one lock, so a path
//! is handed to the deleter exactly once and never left behind in the map.
//!
//! # Example
//!
//! ```ignore
//! use fileforge_core::lifecycle::{ArtifactKind, FileRegistry, Reaper};
//!
//! let registry = Arc::new(FileRegistry::new());
//! registry.register("uploads/abc_photo.png", ArtifactKind::Input, Duration::from_secs(300));
//!
//! let handle = Reaper::new(Arc::clone(&registry), Duration::from_secs(60)).spawn();
//! // ...
//! handle.shutdown().await;
//! ```

mod reaper;
mod registry;

pub use reaper::{Reaper, ReaperHandle, SweepReport};
pub use registry::{Artifact, ArtifactKind, FileRegistry, RegistryEntry};
