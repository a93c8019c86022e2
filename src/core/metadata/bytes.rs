//! Whole-file access for the container walkers.
//!
//! Large audio files are memory mapped so that walking their metadata
//! blocks only faults in the pages actually touched.

use memmap2::Mmap;
use std::fs::File;
use std::io;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    Vec(Vec<u8>),
    Mmap(Mmap),
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

/// Read a file, mapping it when it is at least [`MMAP_THRESHOLD`] bytes
pub fn read_file_bytes(path: &Path) -> io::Result<FileBytes> {
    let file = File::open(path)?;
    if file.metadata()?.len() < MMAP_THRESHOLD {
        return std::fs::read(path).map(FileBytes::Vec);
    }

    // SAFETY: the mapping is read-only and the handle outlives no borrow of
    // it; a concurrent truncation by another process is outside our control
    // and would surface as SIGBUS, as with any mmap reader.
    let mmap = unsafe { Mmap::map(&file) }?;
    Ok(FileBytes::Mmap(mmap))
}
