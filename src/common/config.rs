use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::format;
use crate::scanner::engine::ExcludeFn;
use crate::scanner::{targets, walker};

/// Global reclaim configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Glob patterns for paths that must never be surfaced
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Per-probe toggles keyed by probe key; missing keys are enabled
    #[serde(default)]
    pub scanners: BTreeMap<String, bool>,

    #[serde(default)]
    pub scan: ScanSettings,

    #[serde(default)]
    pub duplicates: DuplicateSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Maximum number of probes running at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Hide candidates smaller than this (e.g. "10MB")
    #[serde(default)]
    pub threshold: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateSettings {
    /// Files smaller than this are never compared
    #[serde(default = "default_dup_min_size")]
    pub min_size: String,

    /// Directories searched when none are given on the command line
    #[serde(default = "default_dup_paths")]
    pub paths: Vec<String>,
}

/// A non-fatal configuration problem
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub field: String,
    pub message: String,
}

fn default_concurrency() -> usize {
    4
}
fn default_dup_min_size() -> String {
    "1KB".to_string()
}
fn default_dup_paths() -> Vec<String> {
    vec!["~/Downloads".into(), "~/Desktop".into(), "~/Documents".into()]
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            threshold: None,
        }
    }
}

impl Default for DuplicateSettings {
    fn default() -> Self {
        Self {
            min_size: default_dup_min_size(),
            paths: default_dup_paths(),
        }
    }
}

impl Config {
    /// Local data directory (~/.local/share/reclaim or platform equivalent)
    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("reclaim")
    }

    /// Default config file path (~/.config/reclaim/config.toml)
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join("reclaim"))
            .unwrap_or_else(Self::data_dir)
            .join("config.toml")
    }

    /// Where the most recent scan snapshot lives
    pub fn snapshot_path() -> PathBuf {
        Self::data_dir().join("last-scan.json")
    }

    /// Load config from the default path, or defaults if the file does not exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to file, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Whether the probe with this key should be registered
    pub fn scanner_enabled(&self, key: &str) -> bool {
        self.scanners.get(key).copied().unwrap_or(true)
    }

    pub fn threshold_bytes(&self) -> Result<Option<u64>> {
        self.scan
            .threshold
            .as_deref()
            .map(format::parse_size)
            .transpose()
    }

    pub fn dup_min_size_bytes(&self) -> Result<u64> {
        format::parse_size(&self.duplicates.min_size)
    }

    /// Check if a path matches any exclude pattern.
    ///
    /// Patterns are matched against the full path and the base name.
    /// `dir/**` matches `dir` itself and everything below it.
    pub fn is_excluded(&self, path: &Path) -> bool {
        self.exclude_rules().matches(path)
    }

    /// Exclude patterns with `~` expanded and globs compiled
    pub fn exclude_rules(&self) -> ExcludeRules {
        ExcludeRules::compile(&self.exclude, dirs::home_dir().as_deref())
    }

    /// The compiled exclusion rules as an engine predicate
    pub fn exclude_fn(&self) -> ExcludeFn {
        let rules = self.exclude_rules();
        Arc::new(move |path: &Path| rules.matches(path))
    }

    /// Collect configuration problems that do not prevent running
    pub fn validate(&self) -> Vec<Warning> {
        let mut warnings = Vec::new();

        for pattern in &self.exclude {
            if pattern.ends_with("/**") {
                continue;
            }
            if let Err(e) = glob::Pattern::new(pattern) {
                warnings.push(Warning {
                    field: "exclude".into(),
                    message: format!("invalid exclude pattern {:?}: {}", pattern, e),
                });
            }
        }

        let known = targets::builtin_keys();
        for key in self.scanners.keys() {
            if !known.contains(&key.as_str()) {
                warnings.push(Warning {
                    field: format!("scanners.{}", key),
                    message: format!("unknown scanner {:?}; valid: {}", key, known.join(", ")),
                });
            }
        }

        if self.scan.concurrency == 0 {
            warnings.push(Warning {
                field: "scan.concurrency".into(),
                message: "concurrency must be at least 1; 1 will be used".into(),
            });
        }

        if let Err(e) = self.threshold_bytes() {
            warnings.push(Warning {
                field: "scan.threshold".into(),
                message: e.to_string(),
            });
        }

        if let Err(e) = self.dup_min_size_bytes() {
            warnings.push(Warning {
                field: "duplicates.min_size".into(),
                message: e.to_string(),
            });
        }

        warnings
    }
}

#[derive(Debug, Clone)]
enum ExcludeRule {
    /// `dir/**`: the directory itself and everything below it
    Prefix(PathBuf),
    /// Matched against the full path and the base name
    Glob(glob::Pattern),
}

/// Exclude patterns compiled once, ready to test many paths
#[derive(Debug, Clone, Default)]
pub struct ExcludeRules {
    rules: Vec<ExcludeRule>,
}

impl ExcludeRules {
    /// Invalid globs are dropped; `Config::validate` reports them
    pub fn compile(patterns: &[String], home: Option<&Path>) -> Self {
        let rules = patterns
            .iter()
            .map(|pattern| walker::resolve_home(pattern, home))
            .filter_map(|pattern| match pattern.strip_suffix("/**") {
                Some(prefix) => Some(ExcludeRule::Prefix(PathBuf::from(prefix))),
                None => glob::Pattern::new(&pattern).ok().map(ExcludeRule::Glob),
            })
            .collect();
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.rules.iter().any(|rule| match rule {
            ExcludeRule::Prefix(prefix) => path.starts_with(prefix),
            ExcludeRule::Glob(glob) => {
                glob.matches_path(path)
                    || path
                        .file_name()
                        .map(|name| glob.matches(&name.to_string_lossy()))
                        .unwrap_or(false)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_exclude(patterns: &[&str]) -> Config {
        Config {
            exclude: patterns.iter().map(|p| p.to_string()).collect(),
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scan.concurrency, 4);
        assert_eq!(config.dup_min_size_bytes().unwrap(), 1024);
        assert!(config.scanner_enabled("xcode"));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_exclude_prefix_pattern() {
        let config = with_exclude(&["/data/keep/**"]);
        assert!(config.is_excluded(Path::new("/data/keep")));
        assert!(config.is_excluded(Path::new("/data/keep/a/b.bin")));
        assert!(!config.is_excluded(Path::new("/data/keeper/b.bin")));
    }

    #[test]
    fn test_exclude_basename_glob() {
        let config = with_exclude(&["*.log"]);
        assert!(config.is_excluded(Path::new("/var/tmp/app.log")));
        assert!(!config.is_excluded(Path::new("/var/tmp/app.txt")));
    }

    #[test]
    fn test_exclude_fn_matches_config() {
        let config = with_exclude(&["/cache/**"]);
        let exclude = config.exclude_fn();
        assert!(exclude(Path::new("/cache/x")));
        assert!(!exclude(Path::new("/other/x")));
    }

    #[test]
    fn test_exclude_rules_expand_home_once() {
        let patterns = vec![
            "~/Projects/**".to_string(),
            "*.tmp".to_string(),
            "[unclosed".to_string(),
        ];
        let rules = ExcludeRules::compile(&patterns, Some(Path::new("/Users/me")));
        assert!(!rules.is_empty());
        assert!(rules.matches(Path::new("/Users/me/Projects")));
        assert!(rules.matches(Path::new("/Users/me/Projects/app/target")));
        assert!(rules.matches(Path::new("/var/cache/x.tmp")));
        assert!(!rules.matches(Path::new("/Users/me/Documents")));
        assert!(!rules.matches(Path::new("/Users/me/ProjectsOld")));
    }

    #[test]
    fn test_exclude_rules_ignore_other_users_home() {
        let rules = ExcludeRules::compile(&["~other/**".to_string()], Some(Path::new("/Users/me")));
        assert!(!rules.matches(Path::new("/Users/me/other")));
        assert!(rules.matches(Path::new("~other/cache")));
    }

    #[test]
    fn test_no_patterns_exclude_nothing() {
        let rules = Config::default().exclude_rules();
        assert!(rules.is_empty());
        assert!(!rules.matches(Path::new("/anything")));
    }

    #[test]
    fn test_parse_partial_config() {
        let config = Config::parse(
            r#"
            exclude = ["~/Projects/**"]

            [scanners]
            docker = false

            [scan]
            concurrency = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.scan.concurrency, 2);
        assert!(!config.scanner_enabled("docker"));
        assert!(config.scanner_enabled("system"));
        assert_eq!(config.duplicates.paths.len(), 3);
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut config = with_exclude(&["[unclosed"]);
        config.scanners.insert("floppy".into(), true);
        config.scan.concurrency = 0;
        config.duplicates.min_size = "lots".into();

        let fields: Vec<String> = config.validate().into_iter().map(|w| w.field).collect();
        assert!(fields.contains(&"exclude".to_string()));
        assert!(fields.contains(&"scanners.floppy".to_string()));
        assert!(fields.contains(&"scan.concurrency".to_string()));
        assert!(fields.contains(&"duplicates.min_size".to_string()));
    }
}
