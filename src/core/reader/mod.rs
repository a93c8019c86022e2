//! Byte-range reads out of container files.
//!
//! The metadata query reports where an embedded image lives; this module
//! lifts exactly those bytes into memory. The range is checked against the
//! file length first so a bogus offset from a damaged tag fails cleanly
//! instead of returning a truncated buffer.

use crate::error::ExtractError;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Read `length` bytes starting at `offset` from the file at `path`
pub fn read_range(path: &Path, offset: u64, length: u64) -> Result<Vec<u8>, ExtractError> {
    let file = File::open(path).map_err(|source| ExtractError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let file_len = file
        .metadata()
        .map_err(|source| ExtractError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    let end = offset.checked_add(length);
    if end.map_or(true, |end| end > file_len) {
        return Err(ExtractError::RangeOutOfBounds {
            path: path.to_path_buf(),
            offset,
            length,
            file_len,
        });
    }

    let short_read = |source| ExtractError::ShortRead {
        path: path.to_path_buf(),
        offset,
        source,
    };

    let mut reader = BufReader::new(file);
    reader.seek(SeekFrom::Start(offset)).map_err(short_read)?;

    let mut buffer = vec![0u8; length as usize];
    reader.read_exact(&mut buffer).map_err(short_read)?;

    Ok(buffer)
}
