use std::path::PathBuf;
use std::time::Duration;

use super::walker;
use super::{Candidate, Engine, Probe, ProbeReport, RiskLevel};
use crate::common::cancel::CancelToken;
use crate::common::config::Config;

// ─── Scan target definitions ──────────────────────────────────────────────────

/// A probe that reports every top-level entry under a fixed set of roots.
///
/// Roots may use `~` and glob patterns. Roots that do not exist are skipped.
#[derive(Debug, Clone)]
pub struct TargetProbe {
    /// Config toggle key
    pub key: &'static str,
    /// Category name, stamped on every candidate
    pub name: String,
    pub description: String,
    pub risk: RiskLevel,
    pub paths: Vec<String>,
    /// Only report entries older than this many days
    pub min_age_days: Option<u32>,
}

impl TargetProbe {
    pub fn new(key: &'static str, name: &str, description: &str, risk: RiskLevel) -> Self {
        Self {
            key,
            name: name.to_string(),
            description: description.to_string(),
            risk,
            paths: Vec::new(),
            min_age_days: None,
        }
    }

    pub fn paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn min_age_days(mut self, days: u32) -> Self {
        self.min_age_days = Some(days);
        self
    }

    fn roots(&self) -> Vec<PathBuf> {
        walker::expand_paths(&self.paths)
    }
}

impl Probe for TargetProbe {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn risk(&self) -> RiskLevel {
        self.risk
    }

    fn scan(&self, cancel: &CancelToken) -> ProbeReport {
        let min_age = self
            .min_age_days
            .map(|days| Duration::from_secs(u64::from(days) * 86_400));
        let mut items = Vec::new();

        for root in self.roots() {
            if let Err(e) = cancel.check() {
                return ProbeReport::partial(items, e);
            }
            if !root.is_dir() {
                continue;
            }

            let (entries, error) = walker::list_root(&root, min_age, cancel);
            items.extend(entries.into_iter().map(|entry| Candidate {
                path: entry.path,
                size_bytes: entry.size_bytes,
                category: self.name.clone(),
                description: self.description.clone(),
                risk: self.risk,
                modified_at: entry.modified_at,
                is_dir: entry.is_dir,
            }));
            if let Some(e) = error {
                return ProbeReport::partial(items, e);
            }
        }

        ProbeReport::ok(items)
    }
}

/// Default probe set
pub fn builtin_probes() -> Vec<TargetProbe> {
    vec![
        TargetProbe::new(
            "system",
            "System Junk",
            "Application caches and logs",
            RiskLevel::Safe,
        )
        .paths(["~/Library/Caches", "~/Library/Logs"]),
        TargetProbe::new(
            "browser",
            "Browser Cache",
            "Safari, Chrome and Firefox caches",
            RiskLevel::Safe,
        )
        .paths([
            "~/Library/Caches/com.apple.Safari",
            "~/Library/Caches/Google/Chrome",
            "~/Library/Caches/Firefox/Profiles",
            "~/.cache/google-chrome",
            "~/.cache/mozilla/firefox",
        ]),
        TargetProbe::new(
            "xcode",
            "Xcode Junk",
            "DerivedData build artifacts and old archives",
            RiskLevel::Moderate,
        )
        .paths([
            "~/Library/Developer/Xcode/DerivedData",
            "~/Library/Developer/Xcode/Archives",
        ]),
        TargetProbe::new(
            "ios_simulators",
            "iOS Simulators",
            "Simulator device data, re-created on demand",
            RiskLevel::Moderate,
        )
        .paths(["~/Library/Developer/CoreSimulator/Devices"]),
        TargetProbe::new(
            "homebrew",
            "Homebrew Cache",
            "Downloaded bottles and source archives",
            RiskLevel::Safe,
        )
        .paths(["~/Library/Caches/Homebrew"]),
        TargetProbe::new("node", "npm Cache", "npm package cache", RiskLevel::Safe)
            .paths(["~/.npm/_cacache"]),
        TargetProbe::new(
            "python",
            "pip Cache",
            "Python package download cache",
            RiskLevel::Safe,
        )
        .paths(["~/Library/Caches/pip", "~/.cache/pip"]),
        TargetProbe::new(
            "rust",
            "Cargo Cache",
            "Crate downloads and extracted sources",
            RiskLevel::Safe,
        )
        .paths(["~/.cargo/registry/cache", "~/.cargo/registry/src"]),
        TargetProbe::new(
            "gradle",
            "Gradle Cache",
            "Gradle build cache and dependency downloads",
            RiskLevel::Safe,
        )
        .paths(["~/.gradle/caches"]),
        TargetProbe::new(
            "maven",
            "Maven Repository",
            "Local Maven repository; may hold locally installed artifacts",
            RiskLevel::Moderate,
        )
        .paths(["~/.m2/repository"]),
        TargetProbe::new(
            "cocoapods",
            "CocoaPods Cache",
            "CocoaPods spec and download cache",
            RiskLevel::Safe,
        )
        .paths(["~/Library/Caches/CocoaPods"]),
        TargetProbe::new(
            "trash",
            "Trash",
            "Files already moved to the trash",
            RiskLevel::Risky,
        )
        .paths(["~/.Trash", "~/.local/share/Trash/files"]),
    ]
}

/// Config keys of the built-in probes
pub fn builtin_keys() -> Vec<&'static str> {
    builtin_probes().iter().map(|p| p.key).collect()
}

/// Engine with every enabled built-in probe and the configured exclusions
pub fn build_engine(config: &Config) -> Engine {
    let mut engine = Engine::with_exclude(config.exclude_fn());
    for probe in builtin_probes() {
        if config.scanner_enabled(probe.key) {
            engine.register(Box::new(probe));
        }
    }
    engine
}
