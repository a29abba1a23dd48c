use colored::*;
use serde::Serialize;

use crate::common::config::Warning;
use crate::common::format::{self, format_path, format_size, format_size_colored};
use crate::duplicates::DuplicateReport;
use crate::scanner::{Candidate, CategoryTotal, Probe};
use crate::snapshot::DiffResult;

/// Everything the scan command shows
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub duration_secs: f64,
    pub total_bytes: u64,
    pub categories: Vec<CategoryTotal>,
    pub items: Vec<Candidate>,
    /// One line per failed probe
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffResult>,
}

/// Print scan results in human-readable format
pub fn print_scan_results(report: &ScanReport, detailed: bool) {
    println!();
    println!("  {} Scan Results", "🧹");
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  Scanned in {}  •  {} reclaimable  •  {}",
        format::format_duration(report.duration_secs).cyan(),
        format_size_colored(report.total_bytes),
        format::format_count(report.items.len()).dimmed()
    );
    println!("{}", "─".repeat(60).dimmed());
    println!();

    if report.categories.is_empty() {
        println!("  {} Nothing to reclaim!", "✨");
        println!();
    }

    for total in &report.categories {
        let marker = if total.risk.needs_review() {
            "●".yellow()
        } else {
            "●".green()
        };
        let change = report
            .diff
            .as_ref()
            .and_then(|d| d.categories.get(&total.name))
            .map(|d| {
                if d.is_new {
                    "new".cyan().to_string()
                } else {
                    format::format_delta_colored(d.delta).to_string()
                }
            })
            .unwrap_or_default();

        println!(
            "  {} {:<24} {:>10}  {:<10} {}  {}",
            marker,
            format::truncate(&total.name, 24),
            format_size(total.total_bytes),
            format::format_risk(total.risk),
            format::format_count(total.item_count).dimmed(),
            change
        );

        if detailed {
            let mut items: Vec<&Candidate> = report
                .items
                .iter()
                .filter(|c| c.category == total.name)
                .collect();
            items.sort_by(|a, b| b.size_bytes.cmp(&a.size_bytes));
            for item in items.iter().take(10) {
                println!(
                    "      {} {} ({})",
                    "↳".dimmed(),
                    format_path(&item.path).dimmed(),
                    format_size(item.size_bytes).dimmed()
                );
            }
            if items.len() > 10 {
                println!("      {} ... and {} more", "↳".dimmed(), items.len() - 10);
            }
        }
    }

    if let Some(diff) = &report.diff {
        let gone: Vec<(&str, u64)> = diff
            .changed()
            .into_iter()
            .filter(|(_, d)| d.current_bytes == 0)
            .map(|(name, d)| (name, d.previous_bytes))
            .collect();
        for (name, previous) in gone {
            println!(
                "  {} {:<24} {:>10}  {}",
                "○".dimmed(),
                format::truncate(name, 24).dimmed(),
                "0 B".dimmed(),
                format!("cleared {}", format_size(previous)).green()
            );
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!(
            "  {} {}",
            "⚠".yellow(),
            format!("{} probes failed:", report.errors.len()).yellow()
        );
        for error in &report.errors {
            println!("    {} {}", "→".dimmed(), error.dimmed());
        }
    }

    println!();
    println!("{}", "─".repeat(60).dimmed());
    print!(
        "  {} Total reclaimable: {}",
        "💾",
        format_size_colored(report.total_bytes)
    );
    match &report.diff {
        Some(diff) => println!(
            "  ({} since {})",
            format::format_delta_colored(diff.total_delta),
            diff.previous_timestamp.format("%Y-%m-%d %H:%M")
        ),
        None => println!(),
    }
    println!();
}

/// Print scan results as JSON
pub fn print_scan_json(report: &ScanReport) {
    print_json(report);
}

/// Print a minimal summary
pub fn print_scan_quiet(report: &ScanReport) {
    println!(
        "{}  {}  {}",
        format_size(report.total_bytes),
        report.items.len(),
        report.categories.len()
    );
}

pub fn print_dup_results(report: &DuplicateReport, files_scanned: usize, detailed: bool) {
    println!();
    println!("  {} Duplicate Scan", "👯");
    println!("{}", "─".repeat(60).dimmed());
    println!("  Scanned {} files", files_scanned.to_string().cyan());
    println!("{}", "─".repeat(60).dimmed());
    println!();

    if report.groups.is_empty() {
        println!("  {} No duplicates found!", "✨");
        println!();
        return;
    }

    for (i, group) in report.groups.iter().enumerate() {
        println!(
            "    Group {} — {} files of {}, {} wasted",
            (i + 1).to_string().bold(),
            group.files.len(),
            format_size(group.size_bytes),
            format_size(group.wasted_bytes()),
        );

        if detailed {
            println!("      {} {}", "hash".dimmed(), short_hash(&group.hash).dimmed());
            for (j, path) in group.files.iter().enumerate() {
                let (label, shown) = if j == 0 {
                    ("keep →", format_path(path).green().to_string())
                } else {
                    ("  dup →", format_path(path).dimmed().to_string())
                };
                println!("      {} {}", label.dimmed(), shown);
            }
            println!();
        }
    }

    if !detailed {
        println!();
        println!("      Run with {} to see file paths", "--detailed".cyan());
    }

    println!();
    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  {} {} duplicate groups, {} total wasted space",
        "💾",
        report.groups.len().to_string().cyan(),
        format_size_colored(report.total_wasted),
    );
    println!();
}

pub fn print_dup_json(report: &DuplicateReport) {
    print_json(report);
}

pub fn print_categories(probes: &[Box<dyn Probe>]) {
    println!();
    for probe in probes {
        println!(
            "  {:<20} {:<10} {}",
            probe.name().bold(),
            format::format_risk(probe.risk()),
            probe.description().dimmed()
        );
    }
    println!();
}

pub fn print_categories_json(probes: &[Box<dyn Probe>]) {
    let json: Vec<serde_json::Value> = probes
        .iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name(),
                "description": p.description(),
                "risk": p.risk(),
            })
        })
        .collect();
    print_json(&json);
}

pub fn print_warnings(warnings: &[Warning]) {
    if warnings.is_empty() {
        println!("  {} Config looks good", "✓".green());
        return;
    }
    for w in warnings {
        println!("  {} {}: {}", "⚠".yellow(), w.field.bold(), w.message);
    }
}

/// First 16 hex digits of a content hash, with an ellipsis
fn short_hash(hash: &str) -> String {
    format::truncate(hash, 19)
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results: {}", e),
    }
}
