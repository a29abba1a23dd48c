use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{diff, DiffResult, Snapshot};
use crate::common::config::Config;
use crate::common::errors::{ReclaimError, Result};

/// The single on-disk snapshot file. Each save overwrites the last one.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_local_dir>/reclaim/last-scan.json`
    pub fn default_location() -> Self {
        Self::new(Config::snapshot_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `snapshot` as indented JSON, creating parent directories
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ReclaimError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(snapshot).map_err(ReclaimError::SnapshotEncode)?;
        std::fs::write(&self.path, json).map_err(|e| ReclaimError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }

    pub fn load(&self) -> Result<Snapshot> {
        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| ReclaimError::io(&self.path, e))?;
        serde_json::from_str(&contents).map_err(|source| ReclaimError::SnapshotParse {
            path: self.path.clone(),
            source,
        })
    }

    /// The stored snapshot, or `None` when there is no usable one
    pub fn load_previous(&self) -> Option<Snapshot> {
        match self.load() {
            Ok(snapshot) => Some(snapshot),
            Err(ReclaimError::Io { ref source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!(path = %self.path.display(), "no previous snapshot");
                None
            }
            Err(e) => {
                warn!(error = %e, "ignoring unreadable snapshot");
                None
            }
        }
    }

    /// Diff `current` against the stored snapshot, then replace it.
    ///
    /// Returns `None` when there was nothing to compare against.
    pub fn record(&self, current: &Snapshot) -> Result<Option<DiffResult>> {
        let result = self
            .load_previous()
            .map(|previous| diff(&previous, current));
        self.save(current)?;
        Ok(result)
    }
}
