//! # Core Module
//!
//! The aggregation engine, independent of any front end.
//!
//! ## Modules
//! - `hasher` - SHA-256 content fingerprints
//! - `tracker` - Thread-safe deduplicating counters
//! - `records` - The record kinds the trackers count
//! - `reader` - Bounded byte-range reads
//! - `metadata` - Metadata queries (EXIF, XMP, audio artwork)
//! - `dispatch` - Per-file, per-mode extraction
//! - `pipeline` - Enumeration and fan-out over a worker pool
//! - `materializer` - Writes distinct embedded images
//! - `scanner` - Finds candidate files
//! - `reporter` - Text and JSON reports

pub mod dispatch;
pub mod hasher;
pub mod materializer;
pub mod metadata;
pub mod pipeline;
pub mod reader;
pub mod records;
pub mod reporter;
pub mod scanner;
pub mod tracker;

// Re-export commonly used types
pub use dispatch::Mode;
pub use hasher::{ContentHash, ContentHasher};
pub use pipeline::{Aggregator, Execution, RunReport};
pub use records::Record;
pub use tracker::{Dedup, Entry, EntryTracker, SortOrder};
