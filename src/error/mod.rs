//! # Error Module
//!
//! Error types for the image data aggregator.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, offsets, what went wrong
//! - **Per-file failures are local** - they are reported and the run goes on,
//!   so `ExtractError` and `MaterializeError` end up in the run report rather
//!   than in `AidError`

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AidError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while enumerating candidate files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while lifting bytes out of a container file
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Can't open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Range {offset}+{length} is past the end of {path} ({file_len} bytes)")]
    RangeOutOfBounds {
        path: PathBuf,
        offset: u64,
        length: u64,
        file_len: u64,
    },

    #[error("Short read from {path} at offset {offset}: {source}")]
    ShortRead {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while writing distinct embedded images to disk
#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("Can't create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Can't write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Source {path} has no usable file name")]
    NoFileName { path: PathBuf },

    #[error("Embedded image in {path} changed since it was aggregated")]
    ContentChanged { path: PathBuf },

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, AidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_error_includes_path() {
        let error = ExtractError::Open {
            path: PathBuf::from("/music/album/track01.flac"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        let message = error.to_string();
        assert!(message.contains("/music/album/track01.flac"));
        assert!(message.contains("gone"));
    }

    #[test]
    fn out_of_bounds_error_describes_range() {
        let error = ExtractError::RangeOutOfBounds {
            path: PathBuf::from("/music/a.mp3"),
            offset: 100,
            length: 50,
            file_len: 120,
        };
        let message = error.to_string();
        assert!(message.contains("100+50"));
        assert!(message.contains("120 bytes"));
    }

    #[test]
    fn materialize_error_wraps_extract_error() {
        let error: MaterializeError = ExtractError::RangeOutOfBounds {
            path: PathBuf::from("/x.flac"),
            offset: 1,
            length: 2,
            file_len: 0,
        }
        .into();
        assert!(error.to_string().contains("/x.flac"));
    }
}
