//! # Materializer Module
//!
//! Writes each distinct embedded image once, named after the file it was
//! first found in, with an extension sniffed from its leading bytes.
//!
//! The bytes are read back from the recorded source range rather than kept
//! in memory for the whole run, and are re-hashed before writing so a source
//! edited since aggregation can't produce an image that disagrees with the
//! report.

use crate::core::hasher::ContentHasher;
use crate::core::reader::read_range;
use crate::core::records::EmbeddedAssetRecord;
use crate::core::tracker::Entry;
use crate::error::MaterializeError;
use crate::events::{Event, EventSender, MaterializeEvent};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default output directory, relative to the working directory
pub const DEFAULT_OUT_DIR: &str = "out";

/// Image container recognized by its leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Bmp,
    Heif,
}

impl ImageKind {
    /// Sniff the container from the first 8 bytes; anything unknown is JPEG
    pub fn sniff(bytes: &[u8]) -> Self {
        match bytes {
            [0xFF, 0xD8, ..] => ImageKind::Jpeg,
            [0x89, 0x50, ..] => ImageKind::Png,
            [0x42, 0x4D, ..] => ImageKind::Bmp,
            [_, _, _, _, b'f', b't', b'y', b'p', ..] => ImageKind::Heif,
            _ => ImageKind::Jpeg,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Bmp => "bmp",
            ImageKind::Heif => "heif",
        }
    }
}

/// Outcome of writing the distinct images
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MaterializeReport {
    pub out_dir: PathBuf,
    pub written: Vec<PathBuf>,
    /// `(output or source path, message)` for each image that wasn't written
    pub failed: Vec<(PathBuf, String)>,
}

/// Output file name for an image found in `source`
fn output_path(out_dir: &Path, source: &Path, kind: ImageKind) -> Result<PathBuf, MaterializeError> {
    let stem = source
        .file_stem()
        .ok_or_else(|| MaterializeError::NoFileName {
            path: source.to_path_buf(),
        })?;

    let mut path = out_dir.join(stem);
    path.set_extension(kind.extension());
    Ok(path)
}

fn write_one(
    out_dir: &Path,
    record: &EmbeddedAssetRecord,
    hasher: &mut ContentHasher,
) -> Result<PathBuf, MaterializeError> {
    let bytes = read_range(&record.path, record.offset, record.length)?;
    if hasher.digest(&bytes) != record.hash {
        return Err(MaterializeError::ContentChanged {
            path: record.path.clone(),
        });
    }

    let target = output_path(out_dir, &record.path, ImageKind::sniff(&bytes))?;

    fs::write(&target, &bytes).map_err(|source| MaterializeError::WriteFailed {
        path: target.clone(),
        source,
    })?;

    Ok(target)
}

/// Write one file per distinct entry into `out_dir`
///
/// Only a failure to create `out_dir` is returned as an error; a failure
/// for one image is recorded in the report and the rest are still written.
/// Existing files with the same name are overwritten. When two distinct
/// images map to one name the later one wins and the path is listed once.
pub fn materialize(
    entries: &[Entry<EmbeddedAssetRecord>],
    out_dir: &Path,
    events: &EventSender,
) -> Result<MaterializeReport, MaterializeError> {
    fs::create_dir_all(out_dir).map_err(|source| MaterializeError::CreateDirectory {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut report = MaterializeReport {
        out_dir: out_dir.to_path_buf(),
        ..Default::default()
    };

    let mut hasher = ContentHasher::new();

    for entry in entries {
        let record = entry.record();
        match write_one(out_dir, record, &mut hasher) {
            Ok(path) => {
                tracing::debug!(path = %path.display(), hash = %record.hash, "wrote embedded image");
                events.send(Event::Materialize(MaterializeEvent::Written { path: path.clone() }));
                if report.written.contains(&path) {
                    tracing::warn!(
                        path = %path.display(),
                        source = %record.path.display(),
                        "overwrote an image from another file with the same name"
                    );
                } else {
                    report.written.push(path);
                }
            }
            Err(e) => {
                let path = match &e {
                    MaterializeError::WriteFailed { path, .. } => path.clone(),
                    _ => record.path.clone(),
                };
                tracing::warn!(path = %path.display(), "{}", e);
                events.send(Event::Materialize(MaterializeEvent::Failed {
                    path: path.clone(),
                    message: e.to_string(),
                }));
                report.failed.push((path, e.to_string()));
            }
        }
    }

    events.send(Event::Materialize(MaterializeEvent::Completed {
        written: report.written.len(),
        failed: report.failed.len(),
    }));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tracker::{EntryTracker, SortOrder};
    use crate::events::null_sender;
    use tempfile::TempDir;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

    fn host_file(dir: &Path, name: &str, prefix: usize, image: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut bytes = vec![0xAAu8; prefix];
        bytes.extend_from_slice(image);
        bytes.extend_from_slice(&[0x55; 16]);
        fs::write(&path, bytes).unwrap();
        path
    }

    fn tracked(images: &[(PathBuf, u64, &[u8])]) -> Vec<Entry<EmbeddedAssetRecord>> {
        let tracker = EntryTracker::new();
        let mut hasher = ContentHasher::new();
        for (path, offset, image) in images {
            tracker.add_or_update(EmbeddedAssetRecord::new(
                hasher.digest(image),
                path,
                *offset,
                image.len() as u64,
            ));
        }
        tracker.into_sorted(SortOrder::Key)
    }

    #[test]
    fn sniffs_known_signatures() {
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8, 0, 0, 0, 0, 0, 0]).extension(), "jpg");
        assert_eq!(ImageKind::sniff(&[0x89, 0x50, 0x4E, 0x47]).extension(), "png");
        assert_eq!(ImageKind::sniff(&[0x42, 0x4D, 0, 0]).extension(), "bmp");
        assert_eq!(
            ImageKind::sniff(&[0, 0, 0, 0x18, b'f', b't', b'y', b'p', b'h', b'e', b'i', b'c']),
            ImageKind::Heif
        );
    }

    #[test]
    fn unknown_signature_defaults_to_jpeg() {
        assert_eq!(ImageKind::sniff(&[0x00, 0x01, 0x02]), ImageKind::Jpeg);
        assert_eq!(ImageKind::sniff(&[]), ImageKind::Jpeg);
    }

    #[test]
    fn writes_one_file_per_distinct_image() {
        let dir = TempDir::new().unwrap();
        let a = host_file(dir.path(), "first.flac", 40, JPEG);
        let b = host_file(dir.path(), "second.flac", 12, JPEG);
        let c = host_file(dir.path(), "third.mp3", 20, PNG);

        let entries = tracked(&[(a, 40, JPEG), (b, 12, JPEG), (c, 20, PNG)]);
        assert_eq!(entries.len(), 2);

        let out = dir.path().join("out");
        let report = materialize(&entries, &out, &null_sender()).unwrap();

        assert!(report.failed.is_empty());
        assert_eq!(report.written.len(), 2);
        assert!(out.join("first.jpg").is_file());
        assert!(out.join("third.png").is_file());
        assert!(!out.join("second.jpg").exists());
    }

    #[test]
    fn written_file_rehashes_to_tracked_hash() {
        let dir = TempDir::new().unwrap();
        let source = host_file(dir.path(), "album.flac", 100, PNG);
        let entries = tracked(&[(source, 100, PNG)]);

        let report = materialize(&entries, &dir.path().join("out"), &null_sender()).unwrap();

        let written = fs::read(&report.written[0]).unwrap();
        let rehash = ContentHasher::new().digest(&written);
        assert_eq!(rehash, entries[0].record().hash);
    }

    #[test]
    fn existing_output_is_overwritten() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("cover.jpg"), b"stale").unwrap();

        let source = host_file(dir.path(), "cover.flac", 8, JPEG);
        let entries = tracked(&[(source, 8, JPEG)]);
        materialize(&entries, &out, &null_sender()).unwrap();

        assert_eq!(fs::read(out.join("cover.jpg")).unwrap(), JPEG);
    }

    #[test]
    fn unreadable_source_does_not_stop_other_writes() {
        let dir = TempDir::new().unwrap();
        let good = host_file(dir.path(), "good.flac", 4, JPEG);
        let shrunk = host_file(dir.path(), "shrunk.flac", 4, PNG);
        let entries = tracked(&[(good, 4, JPEG), (shrunk.clone(), 4, PNG)]);
        fs::write(&shrunk, b"tiny").unwrap();

        let report = materialize(&entries, &dir.path().join("out"), &null_sender()).unwrap();

        assert_eq!(report.written.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, shrunk);
    }

    #[test]
    fn source_edited_after_tracking_is_not_written() {
        let dir = TempDir::new().unwrap();
        let source = host_file(dir.path(), "album.flac", 4, JPEG);
        let entries = tracked(&[(source.clone(), 4, JPEG)]);

        // same range, different picture
        let mut edited = fs::read(&source).unwrap();
        edited[4..4 + PNG.len()].copy_from_slice(PNG);
        fs::write(&source, edited).unwrap();

        let out = dir.path().join("out");
        let report = materialize(&entries, &out, &null_sender()).unwrap();

        assert!(report.written.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, source);
        assert!(report.failed[0].1.contains("changed"));
        assert!(!out.join("album.png").exists());
        assert!(!out.join("album.jpg").exists());
    }

    #[test]
    fn same_stem_in_two_folders_is_listed_once() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        let a = host_file(&dir.path().join("a"), "track1.flac", 4, JPEG);
        let b = host_file(&dir.path().join("b"), "track1.flac", 4, &JPEG[..8]);

        let entries = tracked(&[(a, 4, JPEG), (b, 4, &JPEG[..8])]);
        assert_eq!(entries.len(), 2);

        let report = materialize(&entries, &dir.path().join("out"), &null_sender()).unwrap();

        assert!(report.failed.is_empty());
        assert_eq!(report.written, vec![dir.path().join("out").join("track1.jpg")]);

        let rehash = ContentHasher::new().digest(&fs::read(&report.written[0]).unwrap());
        assert!(entries.iter().any(|e| e.record().hash == rehash));
    }

    #[test]
    fn uncreatable_directory_aborts() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not a directory").unwrap();

        let result = materialize(&[], &blocker.join("out"), &null_sender());
        assert!(matches!(result, Err(MaterializeError::CreateDirectory { .. })));
    }
}
