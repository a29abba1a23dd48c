use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::common::errors::{ReclaimError, Result};

/// Size of the partial hash prefix (first 4KB)
pub const PARTIAL_HASH_SIZE: u64 = 4096;

/// Which part of a file to hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScope {
    /// Only the first `PARTIAL_HASH_SIZE` bytes
    Prefix,
    Full,
}

/// SHA-256 of the first 4KB of a file
pub fn partial_hash(path: &Path) -> Result<String> {
    hash_file(path, HashScope::Prefix)
}

/// SHA-256 of the whole file
pub fn full_hash(path: &Path) -> Result<String> {
    hash_file(path, HashScope::Full)
}

pub fn hash_file(path: &Path, scope: HashScope) -> Result<String> {
    let file = File::open(path).map_err(|e| ReclaimError::io(path, e))?;
    let mut reader = BufReader::with_capacity(1024 * 1024, file);
    let mut hasher = Sha256::new();

    match scope {
        HashScope::Prefix => io::copy(&mut reader.take(PARTIAL_HASH_SIZE), &mut hasher),
        HashScope::Full => io::copy(&mut reader, &mut hasher),
    }
    .map_err(|e| ReclaimError::io(path, e))?;

    Ok(format!("{:x}", hasher.finalize()))
}
