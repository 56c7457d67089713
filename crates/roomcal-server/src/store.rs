//! Snapshot persistence.
//!
//! The snapshot is saved as one JSON document per storage key, in the same
//! nested shape the snapshot serializes to:
//!
//! ```text
//! {"dept-1":{"2024-06-10":"BLOCKED"},"dept-2":{}}
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use roomcal_core::Snapshot;
use tracing::debug;

use crate::error::StoreError;

/// Key the snapshot is stored under unless configured otherwise.
pub const DEFAULT_KEY: &str = "calendar_availability";

/// Loads and saves the availability snapshot.
///
/// Only the sync engine and the CLI talk to a store; the merge itself works
/// on plain values.
pub trait SnapshotStore: Send + Sync {
    /// Loads the last saved snapshot. A store that was never written to
    /// yields an empty snapshot.
    fn load(&self) -> Result<Snapshot, StoreError>;

    /// Replaces the stored snapshot.
    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Stores the snapshot as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    key: String,
}

impl JsonFileStore {
    /// Creates a store for `key` under `dir`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidKey` if the key is empty, starts with a
    /// dot, or contains anything but ASCII letters, digits, `-`, `_` and `.`.
    pub fn new(dir: impl Into<PathBuf>, key: impl Into<String>) -> Result<Self, StoreError> {
        let key = key.into();
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StoreError::InvalidKey(key));
        }
        Ok(Self {
            dir: dir.into(),
            key,
        })
    }

    /// Creates a store with the default key.
    pub fn with_default_key(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            key: DEFAULT_KEY.to_string(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Path of the snapshot file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }

    fn temp_path(path: &Path) -> PathBuf {
        path.with_extension("json.tmp")
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No stored snapshot");
                return Ok(Snapshot::new());
            }
            Err(e) => return Err(StoreError::io(path, e)),
        };

        let snapshot: Snapshot = serde_json::from_str(&content)
            .map_err(|source| StoreError::Decode { path: path.clone(), source })?;
        debug!(
            path = %path.display(),
            resources = snapshot.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;

        let path = self.path();
        let content = serde_json::to_string(snapshot).map_err(StoreError::Encode)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = Self::temp_path(&path);
        fs::write(&temp_path, &content).map_err(|e| StoreError::io(&temp_path, e))?;
        fs::rename(&temp_path, &path).map_err(|e| StoreError::io(&path, e))?;

        debug!(path = %path.display(), bytes = content.len(), "Saved snapshot");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path().display().to_string()
    }
}

/// Keeps the snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: Option<Snapshot>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `snapshot`.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            inner: Mutex::new(MemoryState {
                snapshot: Some(snapshot),
                saves: 0,
            }),
        }
    }

    /// Number of times `save` was called.
    pub fn save_count(&self) -> usize {
        self.state().saves
    }

    /// The last saved snapshot, if any.
    pub fn saved(&self) -> Option<Snapshot> {
        self.state().snapshot.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(self.state().snapshot.clone().unwrap_or_default())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let mut state = self.state();
        state.snapshot = Some(snapshot.clone());
        state.saves += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
