use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;
use session_model::SessionSnapshot;

use crate::error::SessionStoreError;
use crate::paths::snapshot_file_name;

/// Load/save persistence for session snapshots.
///
/// `load` never fails: missing or corrupt records read as defaults.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, session_id: &str) -> SessionSnapshot;

    fn save(&self, session_id: &str, snapshot: &SessionSnapshot) -> Result<(), SessionStoreError>;
}

/// One JSON file per session under a root directory.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        self.root.join(snapshot_file_name(session_id))
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self, session_id: &str) -> SessionSnapshot {
        if session_id.is_empty() {
            return SessionSnapshot::new("");
        }

        let path = self.path_for(session_id);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return SessionSnapshot::new(session_id);
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "unreadable snapshot, using defaults");
                return SessionSnapshot::new(session_id);
            }
        };

        decode_snapshot(session_id, &text)
    }

    fn save(&self, session_id: &str, snapshot: &SessionSnapshot) -> Result<(), SessionStoreError> {
        if session_id.is_empty() {
            return Ok(());
        }

        fs::create_dir_all(&self.root).map_err(|source| {
            SessionStoreError::io("creating snapshot directory", &self.root, source)
        })?;

        let text = encode_snapshot(session_id, snapshot)?;
        let path = self.path_for(session_id);
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, text)
            .map_err(|source| SessionStoreError::io("writing snapshot", &tmp_path, source))?;
        fs::rename(&tmp_path, &path)
            .map_err(|source| SessionStoreError::io("replacing snapshot", &path, source))?;

        tracing::debug!(session_id, path = %path.display(), "snapshot saved");
        Ok(())
    }
}

/// In-process store holding serialized records, so round trips behave like
/// the file store.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    records: Mutex<HashMap<String, String>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw text under a session key, bypassing serialization.
    pub fn insert_raw(&self, session_id: impl Into<String>, text: impl Into<String>) {
        lock_unpoisoned(&self.records).insert(session_id.into(), text.into());
    }

    #[must_use]
    pub fn raw(&self, session_id: &str) -> Option<String> {
        lock_unpoisoned(&self.records).get(session_id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock_unpoisoned(&self.records).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, session_id: &str) -> SessionSnapshot {
        if session_id.is_empty() {
            return SessionSnapshot::new("");
        }

        match self.raw(session_id) {
            Some(text) => decode_snapshot(session_id, &text),
            None => SessionSnapshot::new(session_id),
        }
    }

    fn save(&self, session_id: &str, snapshot: &SessionSnapshot) -> Result<(), SessionStoreError> {
        if session_id.is_empty() {
            return Ok(());
        }

        let text = encode_snapshot(session_id, snapshot)?;
        self.insert_raw(session_id, text);
        Ok(())
    }
}

fn encode_snapshot(
    session_id: &str,
    snapshot: &SessionSnapshot,
) -> Result<String, SessionStoreError> {
    serde_json::to_string(snapshot)
        .map_err(|source| SessionStoreError::json_serialize(session_id, source))
}

fn decode_snapshot(session_id: &str, text: &str) -> SessionSnapshot {
    match serde_json::from_str::<Value>(text) {
        Ok(raw) => SessionSnapshot::normalize(&raw, session_id),
        Err(error) => {
            tracing::warn!(session_id, %error, "corrupt snapshot, using defaults");
            SessionSnapshot::new(session_id)
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
