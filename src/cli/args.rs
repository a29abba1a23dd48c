use clap::{Parser, Subcommand, ValueEnum};

/// reclaim — find reclaimable disk space
#[derive(Parser, Debug)]
#[command(
    name = "reclaim",
    version,
    about = "Find reclaimable disk space: caches, build artifacts and duplicate files",
    long_about = "reclaim runs a set of cache probes concurrently, remembers the totals of\n\
                  the last scan to show what grew, and finds byte-identical duplicate files.",
    after_help = "EXAMPLES:\n  \
        reclaim scan                            Scan every enabled category\n  \
        reclaim scan --category 'Xcode Junk'    Scan a single category\n  \
        reclaim scan --threshold 100MB --json   Large items only, as JSON\n  \
        reclaim dup ~/Downloads ~/Desktop       Find duplicate files\n  \
        reclaim categories                      List scan categories\n  \
        reclaim config validate                 Check the config file"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Shorthand for --format json
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output (debug logging to stderr)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode — minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

impl Cli {
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.format
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan for reclaimable space
    Scan {
        /// Only scan this category (see `reclaim categories`)
        #[arg(long, short)]
        category: Option<String>,

        /// Additional exclude patterns (glob or dir/**)
        #[arg(long, value_name = "PATTERN")]
        exclude: Vec<String>,

        /// Maximum number of probes running at once
        #[arg(long, value_name = "N")]
        concurrency: Option<usize>,

        /// Only show items at least this large (e.g. 100MB)
        #[arg(long, value_name = "SIZE")]
        threshold: Option<String>,

        /// Do not store this scan as the comparison point for the next one
        #[arg(long)]
        no_save: bool,

        /// Show individual items in results
        #[arg(long)]
        detailed: bool,
    },

    /// Find duplicate files
    Dup {
        /// Directories to search (defaults to duplicates.paths from config)
        paths: Vec<String>,

        /// Minimum file size to consider (e.g. 1KB, 10MB)
        #[arg(long, value_name = "SIZE")]
        min_size: Option<String>,

        /// Show individual files in each group
        #[arg(long)]
        detailed: bool,
    },

    /// List scan categories
    Categories,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
    /// Check the config file for problems
    Validate,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
