use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Sandboxed home so tests never read or write the real config and snapshot
struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.home.path()
    }

    fn reclaim(&self) -> Command {
        let mut cmd = Command::cargo_bin("reclaim").unwrap();
        cmd.env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env("XDG_DATA_HOME", self.path().join(".local/share"))
            .env("NO_COLOR", "1");
        cmd
    }

    /// Where the binary looks for its config under this sandbox
    fn config_path(&self) -> PathBuf {
        let output = self.reclaim().args(["config", "path"]).output().unwrap();
        PathBuf::from(String::from_utf8(output.stdout).unwrap().trim())
    }

    fn write_config(&self, contents: &str) {
        let path = self.config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn write(&self, rel: &str, content: &[u8]) {
        let path = self.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
}

fn json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

// ─── Help & version ──────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    Sandbox::new()
        .reclaim()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("duplicate files"))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("dup"))
        .stdout(predicate::str::contains("categories"));
}

#[test]
fn test_version_flag() {
    Sandbox::new()
        .reclaim()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("reclaim"));
}

#[test]
fn test_no_subcommand_shows_help() {
    Sandbox::new()
        .reclaim()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

// ─── Scan command ────────────────────────────────────────────────────────────

#[test]
fn test_scan_empty_home() {
    let sandbox = Sandbox::new();
    let output = sandbox.reclaim().args(["scan", "--json"]).output().unwrap();
    assert!(output.status.success());

    let report = json(&output.stdout);
    assert_eq!(report["total_bytes"], 0);
    assert_eq!(report["items"].as_array().unwrap().len(), 0);
}

#[test]
fn test_scan_finds_cache_and_diffs_next_run() {
    let sandbox = Sandbox::new();
    sandbox.write(".npm/_cacache/index-v5/entry", &[0u8; 2048]);

    let first = sandbox.reclaim().args(["scan", "--json"]).output().unwrap();
    assert!(first.status.success());
    let report = json(&first.stdout);
    let categories = report["categories"].as_array().unwrap();
    assert!(categories.iter().any(|c| c["name"] == "npm Cache"));
    assert!(report.get("diff").is_none());

    sandbox.write(".npm/_cacache/index-v5/more", &[0u8; 1024]);

    let second = sandbox.reclaim().args(["scan", "--json"]).output().unwrap();
    let report = json(&second.stdout);
    assert_eq!(report["diff"]["total_delta"], 1024);
    assert_eq!(report["diff"]["categories"]["npm Cache"]["delta"], 1024);
}

#[test]
fn test_scan_no_save_leaves_no_snapshot() {
    let sandbox = Sandbox::new();
    sandbox.write(".npm/_cacache/blob", b"data");

    sandbox
        .reclaim()
        .args(["scan", "--no-save", "--quiet"])
        .assert()
        .success();

    let output = sandbox.reclaim().args(["scan", "--json"]).output().unwrap();
    assert!(json(&output.stdout).get("diff").is_none());
}

#[test]
fn test_scan_threshold_hides_small_items() {
    let sandbox = Sandbox::new();
    sandbox.write(".npm/_cacache/small", b"tiny");

    let output = sandbox
        .reclaim()
        .args(["scan", "--json", "--threshold", "1KB"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(json(&output.stdout)["items"].as_array().unwrap().len(), 0);
}

#[test]
fn test_scan_invalid_threshold() {
    Sandbox::new()
        .reclaim()
        .args(["scan", "--threshold", "lots"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid threshold"));
}

#[test]
fn test_scan_single_category() {
    let sandbox = Sandbox::new();
    sandbox.write(".npm/_cacache/blob", b"npm data");
    sandbox.write(".gradle/caches/blob", b"gradle data");

    let output = sandbox
        .reclaim()
        .args(["scan", "--json", "--category", "npm Cache"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report = json(&output.stdout);
    let items = report["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items.iter().all(|i| i["category"] == "npm Cache"));
}

#[test]
fn test_scan_unknown_category() {
    Sandbox::new()
        .reclaim()
        .args(["scan", "--category", "Nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown category: Nope"));
}

#[test]
fn test_scan_exclude_flag() {
    let sandbox = Sandbox::new();
    sandbox.write(".npm/_cacache/index-v5/blob", b"npm data");
    sandbox.write(".npm/_cacache/content-v2/blob", b"npm data");

    let scan = |pattern: &str| {
        let output = sandbox
            .reclaim()
            .args(["scan", "--json", "--no-save", "--exclude", pattern])
            .output()
            .unwrap();
        json(&output.stdout)["items"].as_array().unwrap().len()
    };

    assert_eq!(scan("index-*"), 1);
    assert_eq!(scan("~/.npm/**"), 0);
}

// ─── Dup command ─────────────────────────────────────────────────────────────

#[test]
fn test_dup_finds_copies() {
    let sandbox = Sandbox::new();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.bin"), [5u8; 4000]).unwrap();
    std::fs::write(dir.path().join("b.bin"), [5u8; 4000]).unwrap();
    std::fs::write(dir.path().join("c.bin"), [6u8; 4000]).unwrap();

    let output = sandbox
        .reclaim()
        .args(["dup", "--json"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report = json(&output.stdout);
    assert_eq!(report["groups"].as_array().unwrap().len(), 1);
    assert_eq!(report["total_wasted"], 4000);
    assert_eq!(report["total_files"], 2);
}

#[test]
fn test_dup_respects_min_size() {
    let sandbox = Sandbox::new();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("a.txt"), b"same").unwrap();
    std::fs::write(dir.path().join("b.txt"), b"same").unwrap();

    sandbox
        .reclaim()
        .args(["dup", "--min-size", "1KB"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No duplicates found"));
}

#[test]
fn test_dup_nonexistent_path() {
    Sandbox::new()
        .reclaim()
        .args(["dup", "/nonexistent/path/abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

// ─── Categories & config ─────────────────────────────────────────────────────

#[test]
fn test_categories_lists_builtins() {
    Sandbox::new()
        .reclaim()
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("Xcode Junk"))
        .stdout(predicate::str::contains("npm Cache"));
}

#[test]
fn test_disabled_scanner_is_not_listed() {
    let sandbox = Sandbox::new();
    sandbox.write_config("[scanners]\ntrash = false\n");

    sandbox
        .reclaim()
        .arg("categories")
        .assert()
        .success()
        .stdout(predicate::str::contains("Trash").not());
}

#[test]
fn test_config_init_then_show() {
    let sandbox = Sandbox::new();
    sandbox
        .reclaim()
        .args(["config", "init"])
        .assert()
        .success();
    assert!(sandbox.config_path().exists());

    sandbox
        .reclaim()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("concurrency = 4"));
}

#[test]
fn test_config_validate_flags_unknown_scanner() {
    let sandbox = Sandbox::new();
    sandbox.write_config("[scanners]\nbogus = true\n");

    sandbox
        .reclaim()
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bogus"));
}

#[test]
fn test_completions_bash() {
    Sandbox::new()
        .reclaim()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reclaim"));
}
