//! # Metadata Module
//!
//! The metadata query boundary consumed by the extraction dispatcher.
//!
//! Every query either returns data or `None` ("not found"); a file that
//! can't be opened or parsed is simply "not found". The dispatcher never
//! sees a partial result.
//!
//! ## Queries
//! - Camera and lens identity (make, model, serial numbers)
//! - Focal length estimates
//! - Rating
//! - Embedded image byte range and geometry
//! - GPS coordinates
//! - Editor (Camera Raw) fingerprint
//!
//! [`ExifMetadataSource`] answers these from EXIF (via `kamadak-exif`), XMP
//! packets and audio cover art. Tests substitute their own
//! [`MetadataSource`].

mod artwork;
mod bytes;
pub mod xmp;

pub use artwork::{find_artwork, ArtworkLocation};
pub use bytes::{read_file_bytes, FileBytes};

#[cfg(test)]
pub(crate) use artwork::fixtures;

use exif::{Context, Exif, In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::path::Path;

/// Diagonal of a 36x24mm frame
const FULL_FRAME_DIAGONAL_MM: f64 = 43.266_615;

/// TIFF tag 0x4746 (Rating), written by Windows and most DAMs
const TAG_RATING: Tag = Tag(Context::Tiff, 0x4746);

/// Body and lens identity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraIdentity {
    pub make: String,
    pub model: String,
    pub serial_number: String,
    pub lens_make: String,
    pub lens_model: String,
    pub lens_serial_number: String,
}

/// Body make and model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub make: String,
    pub model: String,
}

/// Focal length estimates in millimetres; 0 means unknown
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FocalLengthEstimate {
    /// Preferred 35mm-equivalent value
    pub best_guess: f64,
    /// Actual focal length of the lens
    pub lens: f64,
    /// `FocalLengthIn35mmFilm` as recorded by the camera
    pub in_35mm_film: u32,
    /// Lens focal length taken as-is, assuming a full-frame sensor
    pub approximate: f64,
    /// Lens focal length scaled by the crop factor derived from the
    /// focal plane resolution and pixel dimensions
    pub computed: f64,
    /// Camera model, for filtering
    pub model: String,
}

/// An image embedded in a host file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub offset: u64,
    pub length: u64,
    pub orientation: u16,
    pub width: u32,
    pub height: u32,
    pub full_width: u32,
    pub full_height: u32,
}

/// Decimal degrees, south and west negative
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsLocation {
    /// A map search URL for these coordinates
    pub fn map_url(&self) -> String {
        format!(
            "https://www.google.com/maps/search/?api=1&query={:.6},{:.6}",
            self.latitude, self.longitude
        )
    }
}

/// Metadata queries, one per operating mode
///
/// Implementations must be usable from many worker threads at once.
pub trait MetadataSource: Send + Sync {
    fn camera_identity(&self, path: &Path) -> Option<CameraIdentity>;

    fn camera_info(&self, path: &Path) -> Option<CameraInfo>;

    fn focal_length(&self, path: &Path) -> Option<FocalLengthEstimate>;

    fn rating(&self, path: &Path) -> Option<i32>;

    fn embedded_image(&self, path: &Path) -> Option<EmbeddedImage>;

    fn gps_location(&self, path: &Path) -> Option<GpsLocation>;

    /// `Some(true)` when editor settings are present, `Some(false)` when the
    /// file was readable but carries none
    fn editor_edits(&self, path: &Path) -> Option<bool>;
}

/// [`MetadataSource`] backed by EXIF, XMP and audio cover art
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifMetadataSource;

impl ExifMetadataSource {
    pub fn new() -> Self {
        Self
    }

    fn load(path: &Path) -> Option<(FileBytes, Exif)> {
        let bytes = read_file_bytes(path).ok()?;
        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(&bytes[..]))
            .ok()?;
        Some((bytes, exif))
    }

    fn read_exif(path: &Path) -> Option<Exif> {
        Self::load(path).map(|(_, exif)| exif)
    }
}

impl MetadataSource for ExifMetadataSource {
    fn camera_identity(&self, path: &Path) -> Option<CameraIdentity> {
        let exif = Self::read_exif(path)?;
        let text = |tag| string_field(&exif, tag, In::PRIMARY).unwrap_or_default();

        let identity = CameraIdentity {
            make: text(Tag::Make),
            model: text(Tag::Model),
            serial_number: text(Tag::BodySerialNumber),
            lens_make: text(Tag::LensMake),
            lens_model: text(Tag::LensModel),
            lens_serial_number: text(Tag::LensSerialNumber),
        };

        (identity != CameraIdentity::default()).then_some(identity)
    }

    fn camera_info(&self, path: &Path) -> Option<CameraInfo> {
        let exif = Self::read_exif(path)?;
        let info = CameraInfo {
            make: string_field(&exif, Tag::Make, In::PRIMARY).unwrap_or_default(),
            model: string_field(&exif, Tag::Model, In::PRIMARY).unwrap_or_default(),
        };

        (info != CameraInfo::default()).then_some(info)
    }

    fn focal_length(&self, path: &Path) -> Option<FocalLengthEstimate> {
        let exif = Self::read_exif(path)?;
        let estimate = estimate_focal_length(&exif);
        (estimate.best_guess > 0.0).then_some(estimate)
    }

    fn rating(&self, path: &Path) -> Option<i32> {
        let bytes = read_file_bytes(path).ok()?;

        let from_exif = Reader::new()
            .read_from_container(&mut Cursor::new(&bytes[..]))
            .ok()
            .and_then(|exif| {
                exif.get_field(TAG_RATING, In::PRIMARY)
                    .and_then(|f| f.value.get_uint(0))
            })
            .map(|r| r as i32);

        from_exif.or_else(|| xmp::find_packet(&bytes).and_then(xmp::rating))
    }

    fn embedded_image(&self, path: &Path) -> Option<EmbeddedImage> {
        let bytes = read_file_bytes(path).ok()?;

        if let Some(art) = find_artwork(&bytes) {
            return Some(EmbeddedImage {
                offset: art.offset,
                length: art.length,
                orientation: 1,
                width: art.width,
                height: art.height,
                full_width: art.width,
                full_height: art.height,
            });
        }

        let exif = Reader::new()
            .read_from_container(&mut Cursor::new(&bytes[..]))
            .ok()?;
        exif_thumbnail(&bytes, &exif)
    }

    fn gps_location(&self, path: &Path) -> Option<GpsLocation> {
        let exif = Self::read_exif(path)?;
        let latitude = gps_coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
        let longitude = gps_coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;
        Some(GpsLocation {
            latitude,
            longitude,
        })
    }

    fn editor_edits(&self, path: &Path) -> Option<bool> {
        let bytes = read_file_bytes(path).ok()?;
        let embedded = xmp::find_packet(&bytes).is_some_and(xmp::has_editor_settings);
        if embedded {
            return Some(true);
        }

        let sidecar = path.with_extension("xmp");
        if sidecar != path {
            if let Ok(side) = read_file_bytes(&sidecar) {
                if xmp::find_packet(&side).is_some_and(xmp::has_editor_settings) {
                    return Some(true);
                }
            }
        }

        Some(false)
    }
}

fn estimate_focal_length(exif: &Exif) -> FocalLengthEstimate {
    let lens = rational_field(exif, Tag::FocalLength).unwrap_or(0.0);
    let in_35mm_film = exif
        .get_field(Tag::FocalLengthIn35mmFilm, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(0);

    let computed = crop_factor(exif).map_or(0.0, |crop| lens * crop);
    let approximate = lens;

    let best_guess = if in_35mm_film > 0 {
        f64::from(in_35mm_film)
    } else if computed > 0.0 {
        computed
    } else {
        approximate
    };

    FocalLengthEstimate {
        best_guess,
        lens,
        in_35mm_film,
        approximate,
        computed,
        model: string_field(exif, Tag::Model, In::PRIMARY).unwrap_or_default(),
    }
}

/// Full-frame diagonal over the sensor diagonal implied by the focal plane
/// resolution tags
fn crop_factor(exif: &Exif) -> Option<f64> {
    let x_res = rational_field(exif, Tag::FocalPlaneXResolution)?;
    let y_res = rational_field(exif, Tag::FocalPlaneYResolution).unwrap_or(x_res);
    let width = uint_field(exif, Tag::PixelXDimension)?;
    let height = uint_field(exif, Tag::PixelYDimension)?;

    let unit_mm = match uint_field(exif, Tag::FocalPlaneResolutionUnit).unwrap_or(2) {
        3 => 10.0,
        4 => 1.0,
        _ => 25.4,
    };

    if x_res <= 0.0 || y_res <= 0.0 {
        return None;
    }

    let sensor_w = f64::from(width) / x_res * unit_mm;
    let sensor_h = f64::from(height) / y_res * unit_mm;
    let diagonal = sensor_w.hypot(sensor_h);

    (diagonal > 0.0).then(|| FULL_FRAME_DIAGONAL_MM / diagonal)
}

/// Locate the EXIF thumbnail, rebasing its TIFF-relative offset onto the file
fn exif_thumbnail(file: &[u8], exif: &Exif) -> Option<EmbeddedImage> {
    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, In::THUMBNAIL)?
        .value
        .get_uint(0)?;
    let length = exif
        .get_field(Tag::JPEGInterchangeFormatLength, In::THUMBNAIL)?
        .value
        .get_uint(0)?;
    if length == 0 {
        return None;
    }

    let tiff = exif.buf();
    let probe = &tiff[..tiff.len().min(32)];
    if probe.len() < 8 {
        return None;
    }
    let base = file.windows(probe.len()).position(|w| w == probe)? as u64;

    Some(EmbeddedImage {
        offset: base + u64::from(offset),
        length: u64::from(length),
        orientation: uint_field(exif, Tag::Orientation).unwrap_or(1) as u16,
        width: exif
            .get_field(Tag::ImageWidth, In::THUMBNAIL)
            .and_then(|f| f.value.get_uint(0))
            .unwrap_or(0),
        height: exif
            .get_field(Tag::ImageLength, In::THUMBNAIL)
            .and_then(|f| f.value.get_uint(0))
            .unwrap_or(0),
        full_width: uint_field(exif, Tag::PixelXDimension).unwrap_or(0),
        full_height: uint_field(exif, Tag::PixelYDimension).unwrap_or(0),
    })
}

fn gps_coordinate(exif: &Exif, value_tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        return None;
    };
    if parts.is_empty() {
        return None;
    }

    let degrees = parts
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(r, divisor)| r.to_f64() / divisor)
        .sum::<f64>();

    let negative = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Ascii(v) => v.first().and_then(|s| s.first().copied()),
            _ => None,
        })
        .is_some_and(|c| c.to_ascii_uppercase() == negative_ref);

    degrees
        .is_finite()
        .then_some(if negative { -degrees } else { degrees })
}

fn rational_field(exif: &Exif, tag: Tag) -> Option<f64> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(v) => v.first().map(|r| r.to_f64()).filter(|f| f.is_finite()),
        Value::SRational(v) => v.first().map(|r| r.to_f64()).filter(|f| f.is_finite()),
        other => other.get_uint(0).map(f64::from),
    }
}

fn uint_field(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

/// Trimmed ASCII value, `None` when absent or blank
fn string_field(exif: &Exif, tag: Tag, ifd: In) -> Option<String> {
    if let Value::Ascii(ref vec) = exif.get_field(tag, ifd)?.value {
        let bytes = vec.first()?;
        let text = String::from_utf8_lossy(bytes);
        let trimmed = text.trim_end_matches('\0').trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(bytes)
            .unwrap();
        path
    }

    #[test]
    fn nonexistent_file_is_not_found_for_every_query() {
        let source = ExifMetadataSource::new();
        let path = Path::new("/nonexistent/file.jpg");

        assert!(source.camera_identity(path).is_none());
        assert!(source.camera_info(path).is_none());
        assert!(source.focal_length(path).is_none());
        assert!(source.rating(path).is_none());
        assert!(source.embedded_image(path).is_none());
        assert!(source.gps_location(path).is_none());
        assert!(source.editor_edits(path).is_none());
    }

    #[test]
    fn non_image_has_no_exif() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "notes.jpg", b"this is not an image");
        let source = ExifMetadataSource::new();

        assert!(source.camera_identity(&path).is_none());
        assert!(source.focal_length(&path).is_none());
        assert!(source.gps_location(&path).is_none());
    }

    #[test]
    fn flac_cover_is_reported_as_embedded_image() {
        let dir = TempDir::new().unwrap();
        let cover = [0xFFu8, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0xFF, 0xD9];
        let path = write(&dir, "track.flac", &fixtures::flac_with_pictures(&[(3, &cover)]));

        let image = ExifMetadataSource::new().embedded_image(&path).unwrap();
        assert_eq!(image.length, cover.len() as u64);
        assert_eq!((image.width, image.height), (640, 480));
    }

    #[test]
    fn editor_settings_found_in_sidecar() {
        let dir = TempDir::new().unwrap();
        let raw = write(&dir, "IMG_0001.dng", b"II*\0 raw body without xmp");
        write(
            &dir,
            "IMG_0001.xmp",
            br#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:Description crs:HasSettings="True"/></x:xmpmeta>"#,
        );

        assert_eq!(ExifMetadataSource::new().editor_edits(&raw), Some(true));
    }

    #[test]
    fn readable_file_without_settings_reports_no_edits() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "plain.jpg", &[0xFF, 0xD8, 0xFF, 0xD9]);
        assert_eq!(ExifMetadataSource::new().editor_edits(&path), Some(false));
    }

    #[test]
    fn rating_falls_back_to_xmp() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "rated.jpg",
            br#"....<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:Description xmp:Rating="5"/></x:xmpmeta>"#,
        );
        assert_eq!(ExifMetadataSource::new().rating(&path), Some(5));
    }

    #[test]
    fn map_url_contains_coordinates() {
        let location = GpsLocation {
            latitude: 47.6,
            longitude: -122.3,
        };
        assert!(location.map_url().ends_with("query=47.600000,-122.300000"));
    }
}
