//! Category-level comparison of two snapshots.
//!
//! Categories are matched by name. A category that only exists in the
//! new snapshot is flagged `is_new`; one that disappeared is reported
//! with `current_bytes = 0` and a negative delta.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::Snapshot;

/// How one category changed between two snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDiff {
    pub previous_bytes: u64,
    pub current_bytes: u64,
    pub delta: i64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffResult {
    pub previous_timestamp: DateTime<Utc>,
    pub total_delta: i64,
    pub categories: BTreeMap<String, CategoryDiff>,
}

impl DiffResult {
    /// Categories that changed size, biggest movement first
    pub fn changed(&self) -> Vec<(&str, &CategoryDiff)> {
        let mut changed: Vec<(&str, &CategoryDiff)> = self
            .categories
            .iter()
            .filter(|(_, d)| d.delta != 0 || d.is_new)
            .map(|(name, d)| (name.as_str(), d))
            .collect();
        changed.sort_by(|a, b| b.1.delta.unsigned_abs().cmp(&a.1.delta.unsigned_abs()));
        changed
    }
}

fn signed_delta(current: u64, previous: u64) -> i64 {
    let current = i64::try_from(current).unwrap_or(i64::MAX);
    let previous = i64::try_from(previous).unwrap_or(i64::MAX);
    current.saturating_sub(previous)
}

/// Compare `current` against `previous`
pub fn diff(previous: &Snapshot, current: &Snapshot) -> DiffResult {
    let mut remaining: HashMap<&str, u64> = previous
        .categories
        .iter()
        .map(|c| (c.name.as_str(), c.size_bytes))
        .collect();
    let mut categories = BTreeMap::new();

    for category in &current.categories {
        let previous_bytes = remaining.remove(category.name.as_str());
        categories.insert(
            category.name.clone(),
            CategoryDiff {
                previous_bytes: previous_bytes.unwrap_or(0),
                current_bytes: category.size_bytes,
                delta: signed_delta(category.size_bytes, previous_bytes.unwrap_or(0)),
                is_new: previous_bytes.is_none(),
            },
        );
    }

    // whatever was not consumed above has disappeared
    for (name, previous_bytes) in remaining {
        categories.insert(
            name.to_string(),
            CategoryDiff {
                previous_bytes,
                current_bytes: 0,
                delta: signed_delta(0, previous_bytes),
                is_new: false,
            },
        );
    }

    DiffResult {
        previous_timestamp: previous.timestamp,
        total_delta: signed_delta(current.total_bytes, previous.total_bytes),
        categories,
    }
}
