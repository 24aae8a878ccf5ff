use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use catalog_core::{CatalogError, CatalogResult, RecordStore, Snapshot, SnapshotRepository};

pub const STATE_FILE_VERSION: u32 = 1;

/// On-disk envelope around a [`Snapshot`].
#[derive(Debug, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub snapshot: Snapshot,
}

/// Persists the whole store as one JSON file, overwritten on every save.
#[derive(Debug, Clone)]
pub struct FileRepository {
    path: PathBuf,
}

impl FileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the envelope without rebuilding the store.
    pub fn read_state(&self) -> CatalogResult<Option<StateFile>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let state: StateFile = serde_json::from_str(&content)?;
        if state.version != STATE_FILE_VERSION {
            return Err(CatalogError::Persistence(format!(
                "unsupported state file version {} in {}",
                state.version,
                self.path.display()
            )));
        }
        Ok(Some(state))
    }

    /// Move the current state file aside to `<name>.<timestamp>.bak` so the
    /// next save cannot overwrite it. Returns the backup path.
    pub fn back_up(&self) -> CatalogResult<PathBuf> {
        let name = self.file_name();
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
        let backup = self.path.with_file_name(format!("{name}.{stamp}.bak"));
        fs::rename(&self.path, &backup).map_err(|e| {
            CatalogError::Persistence(format!(
                "cannot move {} to {}: {e}",
                self.path.display(),
                backup.display()
            ))
        })?;
        Ok(backup)
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "state".into())
    }

    fn tmp_path(&self) -> PathBuf {
        let name = self.file_name();
        self.path
            .with_file_name(format!(".{name}.{}.tmp", std::process::id()))
    }
}

impl SnapshotRepository for FileRepository {
    fn try_load(&self) -> CatalogResult<Option<RecordStore>> {
        match self.read_state()? {
            Some(state) => {
                let store = RecordStore::from_snapshot(state.snapshot)?;
                debug!(
                    path = %self.path.display(),
                    records = store.len(),
                    saved_at = %state.saved_at,
                    "loaded store"
                );
                Ok(Some(store))
            }
            None => {
                debug!(path = %self.path.display(), "no state file yet");
                Ok(None)
            }
        }
    }

    /// An unreadable state file is moved aside before starting empty, so a
    /// later save never replaces it.
    fn load(&self) -> Option<RecordStore> {
        let err = match self.try_load() {
            Ok(store) => return store,
            Err(e) => e,
        };
        match self.back_up() {
            Ok(backup) => warn!(
                path = %self.path.display(),
                backup = %backup.display(),
                "cannot load state file, starting empty: {err}"
            ),
            Err(e) => warn!(
                path = %self.path.display(),
                "cannot load state file, starting empty: {err}; {e}"
            ),
        }
        None
    }

    fn save(&self, store: &RecordStore) -> CatalogResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                CatalogError::Persistence(format!("cannot create {}: {e}", parent.display()))
            })?;
        }

        let state = StateFile {
            version: STATE_FILE_VERSION,
            saved_at: Utc::now(),
            snapshot: store.to_snapshot(),
        };
        let content = serde_json::to_string_pretty(&state)?;

        // Write next to the target, then rename over it.
        let tmp = self.tmp_path();
        fs::write(&tmp, content)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(path = %self.path.display(), records = store.len(), "saved store");
        Ok(())
    }
}
