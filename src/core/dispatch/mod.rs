//! # Dispatch Module
//!
//! Turns one file into at most one tracker update for the active mode.
//!
//! ## Flow
//! 1. Run the metadata query for the mode
//! 2. "Not found" means the file contributes nothing
//! 3. Apply the model filter where the mode has a camera model
//! 4. Build the record and hand it to the mode's tracker (or bump a counter)
//!
//! In embedded-image mode the reported byte range is read back, hashed, and
//! only the hash-keyed record reaches the tracker: two files can store
//! different pictures at the same offset, so position alone is no identity.

mod diagnostics;
mod inspect;

pub use inspect::inspect_file;

use diagnostics::Diagnostics;

use crate::core::hasher::ContentHasher;
use crate::core::metadata::MetadataSource;
use crate::core::reader::read_range;
use crate::core::records::{
    EmbeddedAssetRecord, FocalLengthRecord, IdentityRecord, ModelRecord, RatingRecord,
};
use crate::core::tracker::EntryTracker;
use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What a run aggregates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Body and lens serial numbers
    #[default]
    Serials,
    /// Lens models
    Lenses,
    /// 35mm-equivalent focal lengths
    FocalLengths,
    /// Camera models
    Models,
    /// Star ratings
    Ratings,
    /// Count files with an embedded image
    HasImage,
    /// Count files with GPS coordinates
    Gps,
    /// Deduplicate embedded images by content
    Embedded,
    /// Count files with and without editor settings
    EditorEdits,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Serials => "serial numbers",
            Mode::Lenses => "lens models",
            Mode::FocalLengths => "focal lengths",
            Mode::Models => "models",
            Mode::Ratings => "ratings",
            Mode::HasImage => "embedded image presence",
            Mode::Gps => "GPS presence",
            Mode::Embedded => "embedded images",
            Mode::EditorEdits => "editor edits",
        };
        f.write_str(name)
    }
}

/// Case-insensitive camera model substring; empty matches everything
///
/// The substring is taken as given, surrounding whitespace included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelFilter {
    needle: String,
}

impl ModelFilter {
    pub fn new(substring: &str) -> Self {
        Self {
            needle: substring.to_lowercase(),
        }
    }

    pub fn matches(&self, model: &str) -> bool {
        self.needle.is_empty() || model.to_lowercase().contains(&self.needle)
    }
}

/// One tracker per record kind; only the active mode's are touched
#[derive(Debug, Default)]
pub struct Trackers {
    pub bodies: EntryTracker<IdentityRecord>,
    pub lenses: EntryTracker<IdentityRecord>,
    /// Camera models, or lens models in [`Mode::Lenses`]
    pub models: EntryTracker<ModelRecord>,
    pub focal_lengths: EntryTracker<FocalLengthRecord>,
    pub ratings: EntryTracker<RatingRecord>,
    pub assets: EntryTracker<EmbeddedAssetRecord>,
}

/// Presence counters, bumped with atomic increments outside any lock
#[derive(Debug, Default)]
pub struct Counters {
    has_image: AtomicUsize,
    has_gps: AtomicUsize,
    with_edits: AtomicUsize,
    without_edits: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            has_image: self.has_image.load(Ordering::Relaxed),
            has_gps: self.has_gps.load(Ordering::Relaxed),
            with_edits: self.with_edits.load(Ordering::Relaxed),
            without_edits: self.without_edits.load(Ordering::Relaxed),
        }
    }
}

/// Counter values once fan-out is over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub has_image: usize,
    pub has_gps: usize,
    pub with_edits: usize,
    pub without_edits: usize,
}

/// Per-file extraction for one mode
pub struct Dispatcher<'a> {
    mode: Mode,
    filter: ModelFilter,
    source: &'a dyn MetadataSource,
    diagnostics: Diagnostics,
    trackers: Trackers,
    counters: Counters,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        mode: Mode,
        filter: ModelFilter,
        source: &'a dyn MetadataSource,
        verbose: bool,
    ) -> Self {
        Self {
            mode,
            filter,
            source,
            diagnostics: Diagnostics::new(verbose),
            trackers: Trackers::default(),
            counters: Counters::default(),
        }
    }

    pub fn trackers(&self) -> &Trackers {
        &self.trackers
    }

    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    /// Release the trackers once every worker has finished
    pub fn into_results(self) -> (Trackers, CounterSnapshot) {
        let counters = self.counters.snapshot();
        (self.trackers, counters)
    }

    /// Extract from one file; `hasher` is the calling worker's own
    ///
    /// An `Err` is a reportable per-file failure. Absent metadata and
    /// filtered-out models are `Ok`.
    pub fn process_file(&self, path: &Path, hasher: &mut ContentHasher) -> Result<(), ExtractError> {
        match self.mode {
            Mode::Serials => self.serials(path),
            Mode::Lenses => self.lens_models(path),
            Mode::FocalLengths => self.focal_length(path),
            Mode::Models => self.models(path),
            Mode::Ratings => self.rating(path),
            Mode::HasImage => self.has_image(path),
            Mode::Gps => self.gps(path),
            Mode::Embedded => return self.embedded(path, hasher),
            Mode::EditorEdits => self.editor_edits(path),
        }
        Ok(())
    }

    fn serials(&self, path: &Path) {
        let Some(id) = self.source.camera_identity(path) else {
            return;
        };
        if !self.filter.matches(&id.model) {
            return;
        }

        self.diagnostics.block(|| {
            let mut lines = vec![
                format!("serial number information for {}", path.display()),
                format!("  make:          {}", id.make),
                format!("  model:         {}", id.model),
                format!("  serial #:      {}", id.serial_number),
                format!("  lens make:     {}", id.lens_make),
                format!("  lens model:    {}", id.lens_model),
                format!("  lens serial #: {}", id.lens_serial_number),
            ];
            if !id.serial_number.is_empty() && id.make.is_empty() && id.model.is_empty() {
                lines.push("serial number with no camera make/model!".to_string());
            }
            if !id.lens_serial_number.is_empty()
                && id.lens_make.is_empty()
                && id.lens_model.is_empty()
            {
                lines.push("serial number with no lens make/model!".to_string());
            }
            lines
        });

        if !id.serial_number.is_empty() {
            self.trackers
                .bodies
                .add_or_update(IdentityRecord::new(id.make, id.model, id.serial_number));
        }

        if !id.lens_serial_number.is_empty() {
            self.trackers.lenses.add_or_update(IdentityRecord::new(
                id.lens_make,
                id.lens_model,
                id.lens_serial_number,
            ));
        }
    }

    fn lens_models(&self, path: &Path) {
        let Some(id) = self.source.camera_identity(path) else {
            return;
        };
        if !self.filter.matches(&id.model) {
            return;
        }

        self.diagnostics.block(|| {
            vec![
                format!("lens model information for {}", path.display()),
                format!("  lens make:     {}", id.lens_make),
                format!("  lens model:    {}", id.lens_model),
            ]
        });

        if !id.lens_model.is_empty() {
            self.trackers
                .models
                .add_or_update(ModelRecord::new(id.lens_make, id.lens_model));
        }
    }

    fn focal_length(&self, path: &Path) {
        let Some(estimate) = self.source.focal_length(path) else {
            return;
        };
        if estimate.best_guess == 0.0 || !self.filter.matches(&estimate.model) {
            return;
        }

        self.diagnostics.block(|| {
            vec![format!(
                "focal length {:.1} (lens {:.1}, 35mm {}, computed {:.1}) for {}",
                estimate.best_guess,
                estimate.lens,
                estimate.in_35mm_film,
                estimate.computed,
                path.display()
            )]
        });

        self.trackers
            .focal_lengths
            .add_or_update(FocalLengthRecord::from_estimate(estimate.best_guess));
    }

    fn models(&self, path: &Path) {
        let Some(info) = self.source.camera_info(path) else {
            return;
        };
        if !self.filter.matches(&info.model) {
            return;
        }

        self.diagnostics.block(|| {
            vec![
                format!("model information for {}", path.display()),
                format!("  make:          {}", info.make),
                format!("  model:         {}", info.model),
            ]
        });

        if !info.model.is_empty() {
            self.trackers
                .models
                .add_or_update(ModelRecord::new(info.make, info.model));
        }
    }

    fn rating(&self, path: &Path) {
        if let Some(rating) = self.source.rating(path) {
            self.trackers.ratings.add_or_update(RatingRecord { rating });
        }
    }

    fn has_image(&self, path: &Path) {
        if self.source.embedded_image(path).is_some() {
            Counters::bump(&self.counters.has_image);
        }
    }

    fn gps(&self, path: &Path) {
        let Some(location) = self.source.gps_location(path) else {
            return;
        };
        Counters::bump(&self.counters.has_gps);

        self.diagnostics.block(|| {
            vec![
                format!("file with GPS: {}", path.display()),
                format!("    {}", location.map_url()),
            ]
        });
    }

    fn editor_edits(&self, path: &Path) {
        let Some(edits) = self.source.editor_edits(path) else {
            return;
        };

        self.diagnostics.block(|| {
            vec![format!(
                "editor edits: {} in file {}",
                if edits { "yes" } else { "no " },
                path.display()
            )]
        });

        if edits {
            Counters::bump(&self.counters.with_edits);
        } else {
            Counters::bump(&self.counters.without_edits);
        }
    }

    fn embedded(&self, path: &Path, hasher: &mut ContentHasher) -> Result<(), ExtractError> {
        let Some(image) = self.source.embedded_image(path) else {
            return Ok(());
        };
        Counters::bump(&self.counters.has_image);

        self.diagnostics.block(|| {
            vec![format!(
                "has image, offset {}, length {}",
                image.offset, image.length
            )]
        });

        let bytes = read_range(path, image.offset, image.length)?;
        let hash = hasher.digest(&bytes);

        self.diagnostics
            .block(|| vec![format!("added entry for {}, {}", hash, path.display())]);
        tracing::debug!(path = %path.display(), %hash, length = image.length, "embedded image");

        self.trackers.assets.add_or_update(EmbeddedAssetRecord::new(
            hash,
            path,
            image.offset,
            image.length,
        ));
        Ok(())
    }
}
