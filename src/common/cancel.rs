use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::errors::{ReclaimError, Result};

/// Shared cancellation flag threaded through every scan and duplicate search.
///
/// Clones observe the same flag. Work checks it per directory entry and
/// before each file hash, so a cancel takes effect at the next check point.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that all holders stop as soon as possible
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once the token has fired
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ReclaimError::Cancelled)
        } else {
            Ok(())
        }
    }
}
