//! In-memory expiry registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::{ARTIFACTS_REGISTERED, REGISTRY_ENTRIES};

/// Whether an artifact was uploaded or produced by a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Input,
    Output,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Input => "input",
            ArtifactKind::Output => "output",
        }
    }
}

/// The registry's record of one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub kind: ArtifactKind,
    pub expires_at: DateTime<Utc>,
}

/// A file on storage together with its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
    pub expires_at: DateTime<Utc>,
}

/// Tracks which files are alive and when they expire.
///
/// All operations take a single mutex and never hold it across an await, so
/// registrations from request handlers and sweeps from the reaper are
/// serialized with respect to each other.
#[derive(Debug, Default)]
pub struct FileRegistry {
    entries: Mutex<HashMap<PathBuf, RegistryEntry>>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, RegistryEntry>> {
        // The map holds plain values; a panic mid-operation cannot leave a torn entry.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers `path` to expire `ttl` from now, replacing any earlier entry.
    pub fn register(&self, path: impl Into<PathBuf>, kind: ArtifactKind, ttl: Duration) -> Artifact {
        let delta = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        let expires_at = Utc::now()
            .checked_add_signed(delta)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.register_at(path, kind, expires_at)
    }

    /// Registers `path` with an absolute expiry, replacing any earlier entry.
    pub fn register_at(
        &self,
        path: impl Into<PathBuf>,
        kind: ArtifactKind,
        expires_at: DateTime<Utc>,
    ) -> Artifact {
        let path = path.into();
        let len = {
            let mut entries = self.lock();
            entries.insert(path.clone(), RegistryEntry { kind, expires_at });
            entries.len()
        };

        ARTIFACTS_REGISTERED.with_label_values(&[kind.as_str()]).inc();
        REGISTRY_ENTRIES.set(len as i64);
        debug!(path = %path.display(), kind = kind.as_str(), %expires_at, "Registered artifact");

        Artifact {
            path,
            kind,
            expires_at,
        }
    }

    /// Returns the entry for `path`, if it is registered.
    pub fn get(&self, path: &Path) -> Option<RegistryEntry> {
        self.lock().get(path).copied()
    }

    /// Returns the expiry of `path`, if it is registered.
    pub fn expires_at(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.get(path).map(|e| e.expires_at)
    }

    /// Removes `path` from the registry. Returns whether an entry existed.
    pub fn unregister(&self, path: &Path) -> bool {
        let (removed, len) = {
            let mut entries = self.lock();
            let removed = entries.remove(path).is_some();
            (removed, entries.len())
        };
        REGISTRY_ENTRIES.set(len as i64);
        removed
    }

    /// Removes and returns every entry whose deadline is at or before `now`.
    ///
    /// Selection and removal happen under one lock acquisition: a path is
    /// returned by at most one sweep.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Vec<PathBuf> {
        let (expired, len) = {
            let mut entries = self.lock();
            let expired: Vec<PathBuf> = entries
                .iter()
                .filter(|(_, entry)| entry.expires_at <= now)
                .map(|(path, _)| path.clone())
                .collect();
            for path in &expired {
                entries.remove(path);
            }
            (expired, entries.len())
        };
        REGISTRY_ENTRIES.set(len as i64);
        expired
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
