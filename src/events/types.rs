//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted during an aggregation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// File enumeration events
    Scan(ScanEvent),
    /// Per-file extraction events
    Extract(ExtractEvent),
    /// Embedded image writing events
    Materialize(MaterializeEvent),
    /// Run-level events
    Pipeline(PipelineEvent),
}

/// Events while enumerating candidate files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    Started { root: PathBuf },
    /// A directory entry couldn't be read; enumeration continues
    Error { path: PathBuf, message: String },
    Completed { total_files: usize },
}

/// Events while dispatching files to the extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractEvent {
    Started { total_files: usize },
    Progress(ExtractProgress),
    /// A file failed in a reportable way and was skipped
    Error { path: PathBuf, message: String },
    Completed { total_files: usize },
}

/// Progress information during extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractProgress {
    /// Files processed so far, in completion order
    pub completed: usize,
    pub total: usize,
    pub current_path: PathBuf,
}

/// Events while writing distinct embedded images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MaterializeEvent {
    Written { path: PathBuf },
    Failed { path: PathBuf, message: String },
    Completed { written: usize, failed: usize },
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    Started,
    PhaseChanged { phase: PipelinePhase },
    Completed { duration_ms: u64 },
}

/// Phases of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Extracting,
    Materializing,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Extracting => write!(f, "Extracting"),
            PipelinePhase::Materializing => write!(f, "Writing images"),
        }
    }
}
