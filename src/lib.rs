//! # Image Data Aggregator
//!
//! Counts camera, lens and image metadata across large media libraries.
//!
//! One run extracts one kind of metadata (serial numbers, lens models,
//! focal lengths, ratings, GPS presence, editor edits, embedded images) from
//! every matching file and reports each distinct value with the number of
//! files it was seen in. Embedded images are identified by their SHA-256,
//! so the same cover art in a thousand tracks is reported, and optionally
//! written out, once.
//!
//! ## Architecture
//! - `core` - The aggregation engine
//! - `events` - Progress events for front ends
//! - `error` - Error types

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{AidError, Result};

/// Initialize tracing for the library
///
/// Filtering follows `RUST_LOG`; output goes to stderr so reports on stdout
/// stay clean. Calling this more than once is harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
