//! # Scanner Module
//!
//! Produces the sorted list of candidate files that drives a run.
//!
//! ## Example
//! ```rust,ignore
//! use image_data_aggregator::core::scanner::{FileEnumerator, ScanConfig, WalkDirScanner};
//!
//! let config = ScanConfig { extensions: vec!["dng".into()], ..Default::default() };
//! let result = WalkDirScanner::new(config).enumerate(root, &null_sender())?;
//! ```

mod filter;
mod walker;

pub use filter::{normalize_pattern, ExtensionFilter};
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::EventSender;
use std::path::{Path, PathBuf};

/// Extensions enumerated in embedded-image mode when no filter is given
pub const AUDIO_EXTENSIONS: &[&str] = &["flac", "mp3"];

/// Result of an enumeration
#[derive(Debug)]
pub struct ScanResult {
    /// Matching files, sorted
    pub files: Vec<PathBuf>,
    /// Entries that couldn't be read (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Trait for file enumerators
///
/// Implement this trait to feed a run from somewhere other than a
/// directory tree (e.g., in tests).
pub trait FileEnumerator: Send + Sync {
    /// List matching files under `root`
    fn enumerate(&self, root: &Path, events: &EventSender) -> Result<ScanResult, ScanError>;
}
