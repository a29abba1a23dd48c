use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

use crate::common::cancel::CancelToken;
use crate::common::errors::{ReclaimError, Result};

/// A top-level entry of a probe root, sized and timestamped
#[derive(Debug, Clone)]
pub struct RootEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified_at: Option<DateTime<Utc>>,
    pub is_dir: bool,
}

/// Replace a leading `~` with the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    PathBuf::from(resolve_home(path, dirs::home_dir().as_deref()))
}

/// Only a bare `~` or a `~/` prefix names the home directory; `~user` is left alone
pub(crate) fn resolve_home(path: &str, home: Option<&Path>) -> String {
    match home {
        Some(home) if path == "~" => home.display().to_string(),
        Some(home) if path.starts_with("~/") => format!("{}{}", home.display(), &path[1..]),
        _ => path.to_string(),
    }
}

/// Expand ~ and glob patterns in paths
pub fn expand_paths(paths: &[String]) -> Vec<PathBuf> {
    let home = dirs::home_dir();
    let mut expanded = Vec::new();

    for path_str in paths {
        let resolved = resolve_home(path_str, home.as_deref());

        if resolved.contains('*') {
            if let Ok(entries) = glob::glob(&resolved) {
                expanded.extend(entries.filter_map(|e| e.ok()));
            }
        } else {
            expanded.push(PathBuf::from(resolved));
        }
    }

    expanded
}

/// Total size of all files below `path`, polling `cancel` per entry.
///
/// Unreadable entries count as zero. Symlinks are not followed.
pub fn dir_size(path: &Path, cancel: &CancelToken) -> Result<u64> {
    let mut total = 0u64;
    for entry in WalkDir::new(path).follow_links(false) {
        cancel.check()?;
        let Ok(entry) = entry else { continue };
        if entry.file_type().is_file() {
            if let Ok(meta) = entry.metadata() {
                total = total.saturating_add(meta.len());
            }
        }
    }
    Ok(total)
}

/// List and size the direct children of `root`.
///
/// A missing or unreadable root yields no entries. Zero-byte entries are
/// skipped, as are entries modified more recently than `min_age`. On
/// cancellation the entries gathered so far come back with the error.
pub fn list_root(
    root: &Path,
    min_age: Option<Duration>,
    cancel: &CancelToken,
) -> (Vec<RootEntry>, Option<ReclaimError>) {
    let mut entries = Vec::new();

    let read_dir = match std::fs::read_dir(root) {
        Ok(rd) => rd,
        Err(_) => return (entries, None),
    };

    for entry in read_dir {
        if let Err(e) = cancel.check() {
            return (entries, Some(e));
        }
        let Ok(entry) = entry else { continue };
        let Ok(meta) = entry.metadata() else { continue };
        let modified = meta.modified().ok();

        if let (Some(min_age), Some(modified)) = (min_age, modified) {
            let age = SystemTime::now()
                .duration_since(modified)
                .unwrap_or_default();
            if age < min_age {
                continue;
            }
        }

        let path = entry.path();
        let size_bytes = if meta.is_dir() {
            match dir_size(&path, cancel) {
                Ok(size) => size,
                Err(e) => return (entries, Some(e)),
            }
        } else {
            meta.len()
        };

        if size_bytes == 0 {
            continue;
        }

        entries.push(RootEntry {
            path,
            size_bytes,
            modified_at: modified.map(DateTime::<Utc>::from),
            is_dir: meta.is_dir(),
        });
    }

    (entries, None)
}
