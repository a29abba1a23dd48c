use std::path::PathBuf;

use thiserror::Error;

/// Error types for reclaim operations.
/// The binary wraps these in `anyhow` for reporting, but the library
/// stays precise so callers can tell a failed call from a partial scan.
#[derive(Debug, Error)]
pub enum ReclaimError {
    /// No registered probe carries this category name
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// The cancellation token fired before the operation finished
    #[error("operation cancelled")]
    Cancelled,

    /// One or more probes failed; their siblings' results are still valid
    #[error("scan errors: {}", summarize_failures(.0))]
    ProbesFailed(Vec<ProbeFailure>),

    /// File system operation failed
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file exists but could not be decoded
    #[error("corrupt snapshot '{}': {source}", path.display())]
    SnapshotParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Snapshot could not be encoded
    #[error("failed to encode snapshot: {0}")]
    SnapshotEncode(#[source] serde_json::Error),

    /// A probe reported a failure of its own
    #[error("{message}")]
    Probe { category: String, message: String },
}

/// A single probe's failure, kept next to the results of the probes that succeeded.
#[derive(Debug)]
pub struct ProbeFailure {
    pub category: String,
    pub error: ReclaimError,
}

impl std::fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.category, self.error)
    }
}

impl ReclaimError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReclaimError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn probe(category: impl Into<String>, message: impl Into<String>) -> Self {
        ReclaimError::Probe {
            category: category.into(),
            message: message.into(),
        }
    }

    /// True for cancellation, including a combined error whose only cause was cancellation
    pub fn is_cancelled(&self) -> bool {
        match self {
            ReclaimError::Cancelled => true,
            ReclaimError::ProbesFailed(failures) => {
                !failures.is_empty() && failures.iter().all(|f| f.error.is_cancelled())
            }
            _ => false,
        }
    }
}

fn summarize_failures(failures: &[ProbeFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ReclaimError>;
