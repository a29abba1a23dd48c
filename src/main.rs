use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::thread;
use std::time::Instant;
use tracing::warn;

use reclaim::cli::args::{Cli, Commands, CompletionShell, ConfigAction, OutputFormat};
use reclaim::cli::output::{self, ScanReport};
use reclaim::common::cancel::CancelToken;
use reclaim::common::config::Config;
use reclaim::common::format;
use reclaim::duplicates;
use reclaim::scanner::{self, targets, walker, Candidate, ScanStatus};
use reclaim::snapshot::{diff, Snapshot, SnapshotStore};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("reclaim=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Scan {
            ref category,
            ref exclude,
            concurrency,
            ref threshold,
            no_save,
            detailed,
        } => cmd_scan(
            &cli,
            category.as_deref(),
            exclude,
            concurrency,
            threshold.as_deref(),
            no_save,
            detailed,
        ),

        Commands::Dup {
            ref paths,
            ref min_size,
            detailed,
        } => cmd_dup(&cli, paths, min_size.as_deref(), detailed),

        Commands::Categories => cmd_categories(&cli),

        Commands::Config { ref action } => cmd_config(action),

        Commands::Completions { ref shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            let shell = match shell {
                CompletionShell::Bash => clap_complete::Shell::Bash,
                CompletionShell::Zsh => clap_complete::Shell::Zsh,
                CompletionShell::Fish => clap_complete::Shell::Fish,
            };
            clap_complete::generate(shell, &mut cmd, "reclaim", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn show_progress(cli: &Cli) -> bool {
    !cli.quiet && cli.output_format() == OutputFormat::Human
}

// ─── Scan ─────────────────────────────────────────────────────────────────────

fn cmd_scan(
    cli: &Cli,
    category: Option<&str>,
    exclude: &[String],
    concurrency: Option<usize>,
    threshold: Option<&str>,
    no_save: bool,
    detailed: bool,
) -> Result<()> {
    let mut config = Config::load()?;
    config.exclude.extend(exclude.iter().cloned());

    let threshold = match threshold {
        Some(t) => Some(format::parse_size(t).with_context(|| format!("Invalid threshold {t:?}"))?),
        None => config.threshold_bytes()?,
    };
    let concurrency = concurrency.unwrap_or(config.scan.concurrency);

    let engine = targets::build_engine(&config);
    let cancel = CancelToken::new();
    let start = Instant::now();

    let (mut items, errors) = match category {
        Some(name) => {
            let merged = engine
                .scan_by_category(&cancel, name)
                .context("Run `reclaim categories` to list valid names")?;
            let errors = merged.failures.iter().map(|f| f.to_string()).collect();
            (merged.items, errors)
        }
        None => scan_with_progress(&engine, &cancel, concurrency, show_progress(cli))?,
    };

    if let Some(min) = threshold {
        items = scanner::filter_by_threshold(items, min);
    }
    items.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then(b.size_bytes.cmp(&a.size_bytes))
    });

    let current = Snapshot::capture(&items);
    let store = SnapshotStore::default_location();
    // a single-category snapshot would make every other category look cleared
    let changes = if no_save || category.is_some() {
        store.load_previous().map(|previous| diff(&previous, &current))
    } else {
        store.record(&current).unwrap_or_else(|e| {
            warn!(error = %e, "could not save snapshot");
            None
        })
    };

    let report = ScanReport {
        duration_secs: start.elapsed().as_secs_f64(),
        total_bytes: current.total_bytes,
        categories: scanner::summarize(&items),
        items,
        errors,
        diff: changes,
    };

    match cli.output_format() {
        OutputFormat::Human => output::print_scan_results(&report, detailed),
        OutputFormat::Json => output::print_scan_json(&report),
        OutputFormat::Quiet => output::print_scan_quiet(&report),
    }

    Ok(())
}

/// Run every probe on a worker thread while this thread draws the progress bar
fn scan_with_progress(
    engine: &scanner::Engine,
    cancel: &CancelToken,
    concurrency: usize,
    show: bool,
) -> Result<(Vec<Candidate>, Vec<String>)> {
    let probe_count = engine.probes().len();
    let (tx, rx) = crossbeam_channel::bounded(probe_count.max(1) * 3);

    let pb = if show {
        let pb = ProgressBar::new(probe_count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("━━░"),
        );
        Some(pb)
    } else {
        None
    };

    let outcomes = thread::scope(|scope| {
        let worker = scope.spawn(move || {
            let events = if show { Some(&tx) } else { None };
            engine.scan_grouped_with_progress(cancel, concurrency, events)
        });

        // ends once the worker drops its sender
        for event in rx.iter() {
            if let Some(ref pb) = pb {
                match event.status {
                    ScanStatus::Started => pb.set_message(event.category),
                    ScanStatus::Done => pb.inc(1),
                    ScanStatus::Waiting => {}
                }
            }
        }

        worker.join()
    })
    .map_err(|_| anyhow::anyhow!("scan worker panicked"))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let mut items = Vec::new();
    let mut errors = Vec::new();
    for outcome in outcomes {
        if let Some(e) = &outcome.error {
            errors.push(format!("{}: {}", outcome.category, e));
        }
        items.extend(outcome.items);
    }
    errors.sort();

    Ok((items, errors))
}

// ─── Dup ──────────────────────────────────────────────────────────────────────

fn cmd_dup(cli: &Cli, paths: &[String], min_size: Option<&str>, detailed: bool) -> Result<()> {
    let config = Config::load()?;

    let dirs = if paths.is_empty() {
        walker::expand_paths(&config.duplicates.paths)
    } else {
        let mut dirs = Vec::with_capacity(paths.len());
        for path in paths {
            let expanded = walker::expand_tilde(path);
            if !expanded.exists() {
                anyhow::bail!("Path does not exist: {}", expanded.display());
            }
            dirs.push(expanded);
        }
        dirs
    };

    let min_size = match min_size {
        Some(s) => format::parse_size(s).with_context(|| format!("Invalid min size {s:?}"))?,
        None => config.dup_min_size_bytes()?,
    };

    let pb = if show_progress(cli) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Walking files...");
        Some(pb)
    } else {
        None
    };

    let mut scanned = 0usize;
    let groups = duplicates::find_with_progress(&CancelToken::new(), &dirs, min_size, |path| {
        scanned += 1;
        if let Some(ref pb) = pb {
            if scanned % 64 == 0 {
                pb.set_message(format!("{} files — {}", scanned, format::format_path(path)));
            }
            pb.tick();
        }
    })?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let report = duplicates::DuplicateReport::from(groups);
    match cli.output_format() {
        OutputFormat::Human => output::print_dup_results(&report, scanned, detailed),
        OutputFormat::Json => output::print_dup_json(&report),
        OutputFormat::Quiet => {
            println!(
                "{}  {}  {}",
                report.groups.len(),
                report.total_files,
                format::format_size(report.total_wasted)
            );
        }
    }

    Ok(())
}

// ─── Categories ───────────────────────────────────────────────────────────────

fn cmd_categories(cli: &Cli) -> Result<()> {
    let config = Config::load()?;
    let engine = targets::build_engine(&config);
    match cli.output_format() {
        OutputFormat::Json => output::print_categories_json(engine.probes()),
        _ => output::print_categories(engine.probes()),
    }
    Ok(())
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", Config::config_path().display());
            Ok(())
        }
        ConfigAction::Init => {
            let path = Config::config_path();
            if path.exists() {
                println!("  {} Config already exists at {}", "✓".green(), path.display());
                return Ok(());
            }
            Config::default().save_to(&path)?;
            println!("  {} Wrote default config to {}", "✓".green(), path.display());
            Ok(())
        }
        ConfigAction::Validate => {
            let config = Config::load()?;
            output::print_warnings(&config.validate());
            Ok(())
        }
    }
}
