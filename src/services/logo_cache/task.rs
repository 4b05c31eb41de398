//! Work units exchanged with the fetch worker pool

use std::fmt;
use std::path::PathBuf;

use crate::errors::{FailureKind, FetchError};

/// Download-and-transcode job for one show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTask {
    pub show_name: String,
    pub source_url: String,
    pub destination: PathBuf,
}

/// How a task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Destination already existed; nothing was requested
    Cached,
    /// Downloaded, normalized and written
    Fetched { bytes_downloaded: u64 },
    /// No asset could be produced
    Failed { kind: FailureKind, message: String },
}

impl FetchOutcome {
    pub fn failed(err: &FetchError) -> Self {
        FetchOutcome::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Whether the destination asset exists after the task
    pub fn is_available(&self) -> bool {
        matches!(self, FetchOutcome::Cached | FetchOutcome::Fetched { .. })
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::Cached => f.write_str("cached"),
            FetchOutcome::Fetched { .. } => f.write_str("fetched"),
            FetchOutcome::Failed { kind, .. } => write!(f, "failed ({kind})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub show_name: String,
    pub source_url: String,
    pub destination: PathBuf,
    pub outcome: FetchOutcome,
}

impl FetchResult {
    pub fn new(task: FetchTask, outcome: FetchOutcome) -> Self {
        Self {
            show_name: task.show_name,
            source_url: task.source_url,
            destination: task.destination,
            outcome,
        }
    }
}
