//! Directory walking implementation using walkdir.

use super::{filter::ExtensionFilter, FileEnumerator, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::path::Path;
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Extension patterns (empty = every file)
    pub extensions: Vec<String>,
}

/// Recursive enumerator using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ExtensionFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = ExtensionFilter::with_patterns(&config.extensions)
            .with_hidden(config.include_hidden);
        Self { config, filter }
    }

    fn is_hidden_dir(&self, path: &Path, root: &Path) -> bool {
        !self.config.include_hidden
            && path != root
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'))
    }
}

impl FileEnumerator for WalkDirScanner {
    fn enumerate(&self, root: &Path, events: &EventSender) -> Result<ScanResult, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let mut files = Vec::new();
        let mut errors = Vec::new();

        let entries = walker
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && self.is_hidden_dir(e.path(), root)));

        for entry_result in entries {
            match entry_result {
                Ok(entry) => {
                    if !entry.file_type().is_file() && !entry.path().is_file() {
                        continue;
                    }
                    if self.filter.should_include(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();

                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    tracing::warn!(path = %path.display(), "{}", error);
                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));

                    errors.push(error);
                }
            }
        }

        files.sort();

        events.send(Event::Scan(ScanEvent::Completed {
            total_files: files.len(),
        }));

        Ok(ScanResult { files, errors })
    }
}
