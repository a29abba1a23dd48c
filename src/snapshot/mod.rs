//! Point-in-time rollups of scan results.
//!
//! One snapshot is kept on disk (see [`store`]). Each new scan is diffed
//! against it (see [`diff`]) and then replaces it.

pub mod diff;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scanner::{self, Candidate, CategoryTotal};

pub use diff::{diff, CategoryDiff, DiffResult};
pub use store::SnapshotStore;

/// Size and item count of one category at one instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySnapshot {
    pub name: String,
    pub size_bytes: u64,
    pub item_count: usize,
}

/// Everything persisted about one scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub categories: Vec<CategorySnapshot>,
    pub total_bytes: u64,
}

impl Snapshot {
    pub fn from_totals(timestamp: DateTime<Utc>, totals: &[CategoryTotal]) -> Self {
        let categories: Vec<CategorySnapshot> = totals
            .iter()
            .map(|t| CategorySnapshot {
                name: t.name.clone(),
                size_bytes: t.total_bytes,
                item_count: t.item_count,
            })
            .collect();
        let total_bytes = categories
            .iter()
            .fold(0u64, |sum, c| sum.saturating_add(c.size_bytes));

        Self {
            timestamp,
            categories,
            total_bytes,
        }
    }

    /// Roll up a finished scan as of now
    pub fn capture(items: &[Candidate]) -> Self {
        Self::from_totals(Utc::now(), &scanner::summarize(items))
    }
}
