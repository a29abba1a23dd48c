use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use super::hasher::{self, HashScope};
use crate::common::cancel::CancelToken;
use crate::common::errors::Result;

/// Version-control metadata directory; also marks a repository root
const VCS_DIR: &str = ".git";

/// Files confirmed byte-identical by full-content hash.
///
/// `files[0]` is whichever copy the walk reached first. It is the one
/// conventionally kept, but the choice depends on directory iteration
/// order and is not stable across filesystems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub size_bytes: u64,
    pub hash: String,
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Bytes freed by keeping one copy
    pub fn wasted_bytes(&self) -> u64 {
        self.size_bytes
            .saturating_mul(self.files.len().saturating_sub(1) as u64)
    }
}

/// Totals over a set of groups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateReport {
    pub groups: Vec<DuplicateGroup>,
    pub total_wasted: u64,
    pub total_files: usize,
}

impl From<Vec<DuplicateGroup>> for DuplicateReport {
    fn from(groups: Vec<DuplicateGroup>) -> Self {
        let total_wasted = groups.iter().map(|g| g.wasted_bytes()).sum();
        let total_files = groups.iter().map(|g| g.files.len()).sum();
        Self {
            groups,
            total_wasted,
            total_files,
        }
    }
}

/// Files that matched on some criterion so far
#[derive(Debug)]
struct Candidates {
    size: u64,
    hash: String,
    files: Vec<PathBuf>,
}

/// Find duplicate files at least `min_size` bytes long under `dirs`
pub fn find(cancel: &CancelToken, dirs: &[PathBuf], min_size: u64) -> Result<Vec<DuplicateGroup>> {
    find_with_progress(cancel, dirs, min_size, |_| {})
}

/// Like [`find`], calling `on_file` for every file considered during the walk.
///
/// Three passes: group by exact size, then by SHA-256 of the first 4KB,
/// then by SHA-256 of the full content. Cancellation fails the whole call.
/// Roots are canonicalized and a file reached from two overlapping roots is
/// only considered once.
pub fn find_with_progress<F>(
    cancel: &CancelToken,
    dirs: &[PathBuf],
    min_size: u64,
    on_file: F,
) -> Result<Vec<DuplicateGroup>>
where
    F: FnMut(&Path),
{
    cancel.check()?;

    // ── Pass 1: Group by file size ────────────────────────────────────────
    let by_size = group_by_size(cancel, dirs, min_size, on_file)?;
    debug!(groups = by_size.len(), "pass 1: size groups");

    // ── Pass 2: Partial hash (first 4KB) ──────────────────────────────────
    let by_prefix = refine_by_hash(cancel, by_size, HashScope::Prefix)?;
    debug!(groups = by_prefix.len(), "pass 2: partial hash groups");

    // ── Pass 3: Full SHA-256 hash ─────────────────────────────────────────
    let confirmed = refine_by_hash(cancel, by_prefix, HashScope::Full)?;
    debug!(groups = confirmed.len(), "pass 3: confirmed duplicate groups");

    let mut groups: Vec<DuplicateGroup> = confirmed
        .into_iter()
        .map(|c| DuplicateGroup {
            size_bytes: c.size,
            hash: c.hash,
            files: c.files,
        })
        .collect();
    groups.sort_by(|a, b| b.wasted_bytes().cmp(&a.wasted_bytes()));
    Ok(groups)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Directories that are (or contain, at their top) version-control metadata
fn is_repository_boundary(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && (entry.file_name() == VCS_DIR || entry.path().join(VCS_DIR).exists())
}

/// Resolve each root so that the same directory named two ways walks to
/// identical paths. Roots that cannot be resolved are kept as given.
fn canonical_roots(dirs: &[PathBuf]) -> Vec<PathBuf> {
    dirs.iter()
        .map(|dir| std::fs::canonicalize(dir).unwrap_or_else(|_| dir.clone()))
        .collect()
}

fn group_by_size<F>(
    cancel: &CancelToken,
    dirs: &[PathBuf],
    min_size: u64,
    mut on_file: F,
) -> Result<Vec<Candidates>>
where
    F: FnMut(&Path),
{
    let mut by_size: BTreeMap<u64, Vec<PathBuf>> = BTreeMap::new();
    // overlapping roots reach the same file more than once
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for dir in canonical_roots(dirs) {
        let walker = WalkDir::new(&dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !is_repository_boundary(e));

        for entry in walker {
            cancel.check()?;
            let Ok(entry) = entry else { continue };

            // symlinks report their own type since links are not followed
            if !entry.file_type().is_file() || is_hidden(&entry) {
                continue;
            }
            let Ok(meta) = entry.metadata() else { continue };
            let size = meta.len();
            if size < min_size || seen.contains(entry.path()) {
                continue;
            }

            on_file(entry.path());
            let path = entry.into_path();
            seen.insert(path.clone());
            by_size.entry(size).or_default().push(path);
        }
    }

    Ok(by_size
        .into_iter()
        .filter(|(_, files)| files.len() >= 2)
        .map(|(size, files)| Candidates {
            size,
            hash: String::new(),
            files,
        })
        .collect())
}

/// Sub-group each candidate set by hash, keeping sub-groups of 2+ files.
/// Unreadable files drop out silently.
fn refine_by_hash(
    cancel: &CancelToken,
    candidates: Vec<Candidates>,
    scope: HashScope,
) -> Result<Vec<Candidates>> {
    let mut refined = Vec::new();

    for candidate in candidates {
        cancel.check()?;

        let mut by_hash: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for file in candidate.files {
            cancel.check()?;
            match hasher::hash_file(&file, scope) {
                Ok(hash) => by_hash.entry(hash).or_default().push(file),
                Err(e) => debug!(error = %e, "skipping unreadable file"),
            }
        }

        refined.extend(
            by_hash
                .into_iter()
                .filter(|(_, files)| files.len() >= 2)
                .map(|(hash, files)| Candidates {
                    size: candidate.size,
                    hash,
                    files,
                }),
        );
    }

    Ok(refined)
}
