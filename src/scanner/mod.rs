pub mod engine;
pub mod targets;
pub mod walker;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::common::cancel::CancelToken;
use crate::common::errors::ReclaimError;

pub use engine::{Engine, ExcludeFn, MergedScan, ScanEvent, ScanOutcome, ScanStatus};

// ─── Core types ───────────────────────────────────────────────────────────────

/// How safe it is to remove a candidate. Ordering is meaningful:
/// a category's risk is the highest risk among its items.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Caches and temp files, regenerated on demand
    #[default]
    Safe,
    /// Review recommended before removing
    Moderate,
    /// May lose data or break applications
    Risky,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Safe => write!(f, "Safe"),
            RiskLevel::Moderate => write!(f, "Moderate"),
            RiskLevel::Risky => write!(f, "Risky"),
        }
    }
}

impl RiskLevel {
    /// Whether the UI should flag this level for review
    pub fn needs_review(self) -> bool {
        self >= RiskLevel::Moderate
    }
}

/// A single removable item reported by a probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Always the owning probe's name
    pub category: String,
    pub description: String,
    pub risk: RiskLevel,
    pub modified_at: Option<DateTime<Utc>>,
    pub is_dir: bool,
}

/// What a probe hands back: whatever it found, plus the error that stopped it, if any.
///
/// A cancelled probe returns the items it collected before the check point
/// together with `ReclaimError::Cancelled`.
#[derive(Debug, Default)]
pub struct ProbeReport {
    pub items: Vec<Candidate>,
    pub error: Option<ReclaimError>,
}

impl ProbeReport {
    pub fn ok(items: Vec<Candidate>) -> Self {
        Self { items, error: None }
    }

    pub fn partial(items: Vec<Candidate>, error: ReclaimError) -> Self {
        Self {
            items,
            error: Some(error),
        }
    }

    pub fn failed(error: ReclaimError) -> Self {
        Self::partial(Vec::new(), error)
    }
}

/// A named unit that inspects one category of disk usage.
///
/// Implementations poll `cancel` before and during any recursive walk,
/// treat a missing target directory as "nothing found", and stamp every
/// candidate's `category` with their own `name()`.
pub trait Probe: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn risk(&self) -> RiskLevel;
    fn scan(&self, cancel: &CancelToken) -> ProbeReport;
}

/// Per-category rollup of candidates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub name: String,
    pub total_bytes: u64,
    pub item_count: usize,
    /// Highest risk among the category's items
    pub risk: RiskLevel,
}

/// Group candidates by category, largest category first
pub fn summarize(items: &[Candidate]) -> Vec<CategoryTotal> {
    let mut by_name: HashMap<&str, CategoryTotal> = HashMap::new();
    for item in items {
        let total = by_name
            .entry(item.category.as_str())
            .or_insert_with(|| CategoryTotal {
                name: item.category.clone(),
                total_bytes: 0,
                item_count: 0,
                risk: item.risk,
            });
        total.total_bytes = total.total_bytes.saturating_add(item.size_bytes);
        total.item_count += 1;
        total.risk = total.risk.max(item.risk);
    }

    let mut totals: Vec<CategoryTotal> = by_name.into_values().collect();
    totals.sort_by(|a, b| b.total_bytes.cmp(&a.total_bytes).then_with(|| a.name.cmp(&b.name)));
    totals
}

/// Keep only candidates at or above `min_bytes`
pub fn filter_by_threshold(items: Vec<Candidate>, min_bytes: u64) -> Vec<Candidate> {
    items
        .into_iter()
        .filter(|c| c.size_bytes >= min_bytes)
        .collect()
}
