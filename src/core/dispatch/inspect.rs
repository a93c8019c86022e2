//! Single-file inspection: run one mode's query and print every field.

use super::Mode;
use crate::core::hasher::ContentHasher;
use crate::core::metadata::{CameraIdentity, EmbeddedImage, MetadataSource};
use crate::core::reader::read_range;
use std::io::{self, Write};
use std::path::Path;

fn write_identity<W: Write>(writer: &mut W, id: &CameraIdentity) -> io::Result<()> {
    writeln!(writer, "make:          {}", id.make)?;
    writeln!(writer, "model:         {}", id.model)?;
    writeln!(writer, "serial #:      {}", id.serial_number)?;
    writeln!(writer, "lens make:     {}", id.lens_make)?;
    writeln!(writer, "lens model:    {}", id.lens_model)?;
    writeln!(writer, "lens serial #: {}", id.lens_serial_number)
}

fn write_image<W: Write>(writer: &mut W, image: &EmbeddedImage) -> io::Result<()> {
    writeln!(writer, "offset:        {}", image.offset)?;
    writeln!(writer, "length:        {}", image.length)?;
    writeln!(writer, "orientation:   {}", image.orientation)?;
    writeln!(writer, "width:         {}", image.width)?;
    writeln!(writer, "height:        {}", image.height)?;
    writeln!(writer, "full width:    {}", image.full_width)?;
    writeln!(writer, "full height:   {}", image.full_height)
}

/// Print what `mode` finds in `path`, or a "not found" line
///
/// `verbose` adds the auxiliary focal length estimates.
pub fn inspect_file<W: Write>(
    source: &dyn MetadataSource,
    mode: Mode,
    path: &Path,
    verbose: bool,
    mut writer: W,
) -> io::Result<()> {
    let w = &mut writer;
    match mode {
        Mode::Serials => match source.camera_identity(path) {
            Some(id) => write_identity(w, &id)?,
            None => writeln!(w, "neither camera or lens serial number information found")?,
        },
        Mode::Lenses => match source.camera_identity(path) {
            Some(id) if !id.lens_make.is_empty() || !id.lens_model.is_empty() => {
                writeln!(w, "lens make:     {}", id.lens_make)?;
                writeln!(w, "lens model:    {}", id.lens_model)?;
                writeln!(w, "lens serial #: {}", id.lens_serial_number)?;
            }
            _ => writeln!(w, "lens model unavailable")?,
        },
        Mode::FocalLengths => match source.focal_length(path) {
            Some(estimate) if estimate.best_guess != 0.0 => {
                writeln!(w, "equivalent focal length: {:.1}", estimate.best_guess)?;
                if verbose {
                    if estimate.lens != 0.0 {
                        writeln!(w, "  focal length of lens: {:.1}", estimate.lens)?;
                    }
                    if estimate.in_35mm_film != 0 {
                        writeln!(w, "  in 35mmfilm: {}", estimate.in_35mm_film)?;
                    }
                    if estimate.approximate != 0.0 {
                        writeln!(w, "  approximate equivalent: {:.1}", estimate.approximate)?;
                    }
                    if estimate.computed != 0.0 {
                        writeln!(w, "  computed based on sensor size: {:.1}", estimate.computed)?;
                    }
                }
            }
            _ => writeln!(w, "no focal length information found")?,
        },
        Mode::Models => match source.camera_info(path) {
            Some(info) if !info.make.is_empty() || !info.model.is_empty() => {
                writeln!(w, "make:          {}", info.make)?;
                writeln!(w, "model:         {}", info.model)?;
            }
            _ => writeln!(w, "camera model unavailable")?,
        },
        Mode::Ratings => match source.rating(path) {
            Some(rating) => writeln!(w, "rating: {}", rating)?,
            None => writeln!(w, "no rating information found")?,
        },
        Mode::Gps => match source.gps_location(path) {
            Some(location) => {
                writeln!(w, "has gps coordinates: yes")?;
                writeln!(w, "latitude:   {:.6}", location.latitude)?;
                writeln!(w, "longitude:  {:.6}", location.longitude)?;
                writeln!(w, "{}", location.map_url())?;
            }
            None => writeln!(w, "has gps coordinates: no")?,
        },
        Mode::EditorEdits => match source.editor_edits(path) {
            Some(edits) => writeln!(w, "holds editor edits: {}", if edits { "yes" } else { "no" })?,
            None => writeln!(w, "no XMP information found")?,
        },
        Mode::HasImage | Mode::Embedded => match source.embedded_image(path) {
            Some(image) => {
                writeln!(w, "has an embedded image: yes")?;
                write_image(w, &image)?;
                if mode == Mode::Embedded {
                    match read_range(path, image.offset, image.length) {
                        Ok(bytes) => {
                            let hash = ContentHasher::new().digest(&bytes);
                            writeln!(w, "sha256:        {}", hash)?;
                        }
                        Err(e) => writeln!(w, "can't open the stream {}: {}", path.display(), e)?,
                    }
                }
            }
            None => writeln!(w, "has an embedded image: no")?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::testing::{identity, Canned, ScriptedSource};
    use super::*;
    use crate::core::metadata::{CameraIdentity, FocalLengthEstimate, GpsLocation};
    use tempfile::TempDir;

    fn inspect(source: &ScriptedSource, mode: Mode, path: &Path, verbose: bool) -> String {
        let mut output = Vec::new();
        inspect_file(source, mode, path, verbose, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn prints_identity_fields() {
        let source = ScriptedSource::default().with(
            "whitney.jpg",
            Canned {
                identity: Some(CameraIdentity {
                    lens_model: "APO-Summicron 50".into(),
                    ..identity("Leica", "M11", "5512345")
                }),
                ..Default::default()
            },
        );
        let text = inspect(&source, Mode::Serials, Path::new("whitney.jpg"), false);

        assert!(text.contains("serial #:      5512345"));
        assert!(text.contains("lens model:    APO-Summicron 50"));
    }

    #[test]
    fn missing_data_prints_not_found() {
        let source = ScriptedSource::default();
        let path = Path::new("blank.jpg");

        assert!(inspect(&source, Mode::Ratings, path, false).contains("no rating information found"));
        assert!(inspect(&source, Mode::Models, path, false).contains("camera model unavailable"));
        assert!(inspect(&source, Mode::Gps, path, false).contains("has gps coordinates: no"));
    }

    #[test]
    fn verbose_adds_auxiliary_focal_lengths() {
        let source = ScriptedSource::default().with(
            "a.rw2",
            Canned {
                focal: Some(FocalLengthEstimate {
                    best_guess: 50.0,
                    lens: 25.0,
                    computed: 50.0,
                    approximate: 25.0,
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        let path = Path::new("a.rw2");

        let quiet = inspect(&source, Mode::FocalLengths, path, false);
        assert_eq!(quiet, "equivalent focal length: 50.0\n");

        let verbose = inspect(&source, Mode::FocalLengths, path, true);
        assert!(verbose.contains("  focal length of lens: 25.0"));
        assert!(verbose.contains("  computed based on sensor size: 50.0"));
        assert!(!verbose.contains("in 35mmfilm"));
    }

    #[test]
    fn gps_prints_map_url() {
        let source = ScriptedSource::default().with(
            "a.jpg",
            Canned {
                gps: Some(GpsLocation {
                    latitude: 47.5,
                    longitude: -122.25,
                }),
                ..Default::default()
            },
        );
        let text = inspect(&source, Mode::Gps, Path::new("a.jpg"), false);

        assert!(text.contains("query=47.500000,-122.250000"));
    }

    #[test]
    fn embedded_mode_prints_hash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("song.flac");
        std::fs::write(&path, b"....abc....").unwrap();

        let source = ScriptedSource::default().with(
            "song.flac",
            Canned {
                image: Some(EmbeddedImage {
                    offset: 4,
                    length: 3,
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        let text = inspect(&source, Mode::Embedded, &path, false);

        assert!(text.contains("has an embedded image: yes"));
        assert!(text.contains(
            "sha256:        ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        ));
    }
}
