use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::{Candidate, Probe, ProbeReport};
use crate::common::cancel::CancelToken;
use crate::common::errors::{ProbeFailure, ReclaimError, Result};

/// Predicate deciding whether a candidate path is hidden from results
pub type ExcludeFn = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Lifecycle of one probe during a progress-reporting scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// Queued, waiting for a concurrency slot
    Waiting,
    /// Slot acquired, probe about to run
    Started,
    /// Probe returned
    Done,
}

/// Progress notification for one probe
#[derive(Debug, Clone, Serialize)]
pub struct ScanEvent {
    pub category: String,
    pub status: ScanStatus,
    /// Only meaningful for `Done`
    pub item_count: usize,
    pub total_bytes: u64,
    pub error: Option<String>,
}

impl ScanEvent {
    fn status(category: &str, status: ScanStatus) -> Self {
        Self {
            category: category.to_string(),
            status,
            item_count: 0,
            total_bytes: 0,
            error: None,
        }
    }
}

/// Result of one probe in a grouped scan. Items are already filtered.
#[derive(Debug)]
pub struct ScanOutcome {
    pub category: String,
    pub items: Vec<Candidate>,
    pub error: Option<ReclaimError>,
}

impl ScanOutcome {
    pub fn total_bytes(&self) -> u64 {
        self.items.iter().map(|c| c.size_bytes).sum()
    }
}

/// Flat result of a whole-registry or single-category scan.
///
/// `failures` never aborts the scan: the items of every probe that
/// succeeded are in `items` regardless.
#[derive(Debug, Default)]
pub struct MergedScan {
    pub items: Vec<Candidate>,
    pub failures: Vec<ProbeFailure>,
}

impl MergedScan {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.items.iter().map(|c| c.size_bytes).sum()
    }

    /// Combined error naming every failed probe, if any failed
    pub fn into_parts(self) -> (Vec<Candidate>, Option<ReclaimError>) {
        let error = if self.failures.is_empty() {
            None
        } else {
            Some(ReclaimError::ProbesFailed(self.failures))
        };
        (self.items, error)
    }
}

/// Owns the probe registry and runs probes concurrently
#[derive(Default)]
pub struct Engine {
    probes: Vec<Box<dyn Probe>>,
    exclude: Option<ExcludeFn>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exclude(exclude: ExcludeFn) -> Self {
        Self {
            probes: Vec::new(),
            exclude: Some(exclude),
        }
    }

    pub fn register(&mut self, probe: Box<dyn Probe>) {
        self.probes.push(probe);
    }

    pub fn set_exclude_func(&mut self, exclude: ExcludeFn) {
        self.exclude = Some(exclude);
    }

    pub fn probes(&self) -> &[Box<dyn Probe>] {
        &self.probes
    }

    pub fn categories(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    fn filter_excluded(&self, items: Vec<Candidate>) -> Vec<Candidate> {
        match &self.exclude {
            None => items,
            Some(exclude) => items.into_iter().filter(|c| !exclude(&c.path)).collect(),
        }
    }

    fn run_probe(&self, probe: &dyn Probe, cancel: &CancelToken) -> ProbeReport {
        let start = Instant::now();
        debug!(probe = probe.name(), "probe started");
        let mut report = probe.scan(cancel);
        report.items = self.filter_excluded(report.items);
        match &report.error {
            Some(e) => warn!(probe = probe.name(), error = %e, "probe failed"),
            None => debug!(
                probe = probe.name(),
                items = report.items.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "probe finished"
            ),
        }
        report
    }

    /// Run every registered probe at once and merge their candidates.
    ///
    /// A failed probe contributes a `ProbeFailure` instead of items; the
    /// other probes' results are returned regardless.
    pub fn scan_all(&self, cancel: &CancelToken) -> MergedScan {
        let merged = Mutex::new(MergedScan::default());

        thread::scope(|scope| {
            for probe in &self.probes {
                let merged = &merged;
                scope.spawn(move || {
                    let report = self.run_probe(probe.as_ref(), cancel);
                    let mut merged = merged.lock();
                    match report.error {
                        Some(error) => merged.failures.push(ProbeFailure {
                            category: probe.name().to_string(),
                            error,
                        }),
                        None => merged.items.extend(report.items),
                    }
                });
            }
        });

        let merged = merged.into_inner();
        info!(
            probes = self.probes.len(),
            items = merged.items.len(),
            failed = merged.failures.len(),
            "scan finished"
        );
        merged
    }

    /// Run the single probe whose name equals `category`.
    ///
    /// Unlike `scan_all`, a probe error keeps the probe's partial items.
    pub fn scan_by_category(&self, cancel: &CancelToken, category: &str) -> Result<MergedScan> {
        let probe = self
            .probes
            .iter()
            .find(|p| p.name() == category)
            .ok_or_else(|| ReclaimError::UnknownCategory(category.to_string()))?;

        let report = self.run_probe(probe.as_ref(), cancel);
        Ok(MergedScan {
            items: report.items,
            failures: report
                .error
                .map(|error| ProbeFailure {
                    category: category.to_string(),
                    error,
                })
                .into_iter()
                .collect(),
        })
    }

    /// Run every probe at once, keeping results separated per probe
    pub fn scan_grouped(&self, cancel: &CancelToken) -> Vec<ScanOutcome> {
        self.scan_grouped_with_progress(cancel, self.probes.len().max(1), None)
    }

    /// Run probes with at most `max_concurrency` in flight, reporting progress.
    ///
    /// Events go out with `try_send`: when the receiver lags and the channel
    /// is full, events are dropped rather than stalling the scan. The returned
    /// outcomes are always complete. A slot is released only after the probe's
    /// `Done` event is sent, so a listener never sees more than
    /// `max_concurrency` probes between `Started` and `Done`.
    pub fn scan_grouped_with_progress(
        &self,
        cancel: &CancelToken,
        max_concurrency: usize,
        events: Option<&Sender<ScanEvent>>,
    ) -> Vec<ScanOutcome> {
        let max_concurrency = max_concurrency.max(1);
        let (slots, slot_returns) = crossbeam_channel::bounded::<()>(max_concurrency);
        let outcomes = Mutex::new(Vec::with_capacity(self.probes.len()));

        let emit = |event: ScanEvent| {
            if let Some(tx) = events {
                let _ = tx.try_send(event);
            }
        };

        thread::scope(|scope| {
            for probe in &self.probes {
                let (slots, slot_returns) = (&slots, &slot_returns);
                let (outcomes, emit) = (&outcomes, &emit);
                scope.spawn(move || {
                    let name = probe.name();
                    emit(ScanEvent::status(name, ScanStatus::Waiting));

                    // acquire; the channel lives as long as the scope
                    if slots.send(()).is_err() {
                        return;
                    }
                    emit(ScanEvent::status(name, ScanStatus::Started));

                    let report = self.run_probe(probe.as_ref(), cancel);
                    emit(ScanEvent {
                        category: name.to_string(),
                        status: ScanStatus::Done,
                        item_count: report.items.len(),
                        total_bytes: report.items.iter().map(|c| c.size_bytes).sum(),
                        error: report.error.as_ref().map(|e| e.to_string()),
                    });

                    // release only after Done is out
                    let _ = slot_returns.recv();

                    outcomes.lock().push(ScanOutcome {
                        category: name.to_string(),
                        items: report.items,
                        error: report.error,
                    });
                });
            }
        });

        outcomes.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::RiskLevel;
    use std::path::PathBuf;

    struct Fixed(&'static str, Vec<&'static str>);

    impl Probe for Fixed {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "fixed"
        }
        fn risk(&self) -> RiskLevel {
            RiskLevel::Safe
        }
        fn scan(&self, _cancel: &CancelToken) -> ProbeReport {
            ProbeReport::ok(
                self.1
                    .iter()
                    .map(|p| Candidate {
                        path: PathBuf::from(p),
                        size_bytes: 1,
                        category: self.0.to_string(),
                        description: String::new(),
                        risk: RiskLevel::Safe,
                        modified_at: None,
                        is_dir: false,
                    })
                    .collect(),
            )
        }
    }

    #[test]
    fn test_empty_engine_scans_nothing() {
        let engine = Engine::new();
        let merged = engine.scan_all(&CancelToken::new());
        assert!(merged.items.is_empty());
        assert!(merged.is_complete());
        assert!(engine.scan_grouped(&CancelToken::new()).is_empty());
    }

    #[test]
    fn test_exclusion_hides_paths_not_probes() {
        let mut engine = Engine::with_exclude(Arc::new(|p: &Path| p.starts_with("/keep")));
        engine.register(Box::new(Fixed("A", vec!["/keep/a", "/tmp/a"])));

        let merged = engine.scan_all(&CancelToken::new());
        assert_eq!(merged.items.len(), 1);
        assert_eq!(merged.items[0].path, PathBuf::from("/tmp/a"));
        assert_eq!(engine.categories(), vec!["A"]);
    }

    #[test]
    fn test_zero_concurrency_is_clamped() {
        let mut engine = Engine::new();
        engine.register(Box::new(Fixed("A", vec!["/a"])));
        engine.register(Box::new(Fixed("B", vec!["/b"])));
        let outcomes = engine.scan_grouped_with_progress(&CancelToken::new(), 0, None);
        assert_eq!(outcomes.len(), 2);
    }
}
