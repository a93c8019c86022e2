//! # Records Module
//!
//! One observation of a metadata value extracted from one file.
//!
//! ## Variants
//! - [`IdentityRecord`] - make, model and serial number of a body or lens
//! - [`ModelRecord`] - make and model, merged on the model string alone
//! - [`FocalLengthRecord`] - rounded 35mm-equivalent focal length
//! - [`RatingRecord`] - star rating
//! - [`EmbeddedAssetRecord`] - content hash of an embedded image
//!
//! Each variant implements [`Dedup`] so it can be counted in its own
//! [`EntryTracker`](crate::core::tracker::EntryTracker). The closed
//! [`Record`] sum type carries any of them through reporting.

use crate::core::hasher::ContentHash;
use crate::core::tracker::{Dedup, Entry};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Camera body or lens identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub make: String,
    pub model: String,
    pub serial_number: String,
}

impl IdentityRecord {
    pub fn new(
        make: impl Into<String>,
        model: impl Into<String>,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            make: make.into(),
            model: model.into(),
            serial_number: serial_number.into(),
        }
    }
}

impl Dedup for IdentityRecord {
    fn same(&self, other: &Self) -> bool {
        self.serial_number == other.serial_number
            && self.model == other.model
            && self.make == other.make
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        self.make
            .cmp(&other.make)
            .then_with(|| self.model.cmp(&other.model))
            .then_with(|| self.serial_number.cmp(&other.serial_number))
    }
}

/// Camera or lens model.
///
/// Two records are the same model when their model strings match ignoring
/// case; the make is kept for display only, so identical model names from
/// different manufacturers merge into one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub make: String,
    pub model: String,
    #[serde(skip)]
    folded_model: String,
}

impl ModelRecord {
    pub fn new(make: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self {
            make: make.into(),
            folded_model: model.to_lowercase(),
            model,
        }
    }
}

impl Dedup for ModelRecord {
    fn same(&self, other: &Self) -> bool {
        self.folded_model == other.folded_model
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        self.model.cmp(&other.model)
    }
}

/// Focal length in whole millimetres
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocalLengthRecord {
    pub millimetres: u32,
}

impl FocalLengthRecord {
    /// Round a fractional estimate half away from zero
    pub fn from_estimate(estimate: f64) -> Self {
        Self {
            millimetres: estimate.round().max(0.0) as u32,
        }
    }
}

impl Dedup for FocalLengthRecord {
    fn same(&self, other: &Self) -> bool {
        self.millimetres == other.millimetres
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        self.millimetres.cmp(&other.millimetres)
    }
}

/// Star rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub rating: i32,
}

impl Dedup for RatingRecord {
    fn same(&self, other: &Self) -> bool {
        self.rating == other.rating
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        self.rating.cmp(&other.rating)
    }
}

/// An image embedded in a container file, addressed by content.
///
/// `path` and `offset` record where the first copy was found so it can be
/// written out later; they play no part in equivalence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddedAssetRecord {
    pub length: u64,
    pub hash: ContentHash,
    pub path: PathBuf,
    pub offset: u64,
}

impl EmbeddedAssetRecord {
    pub fn new(hash: ContentHash, path: &Path, offset: u64, length: u64) -> Self {
        Self {
            length,
            hash,
            path: path.to_path_buf(),
            offset,
        }
    }
}

impl Dedup for EmbeddedAssetRecord {
    fn same(&self, other: &Self) -> bool {
        // length first: it rules out most pairs without touching the hash
        self.length == other.length && self.hash == other.hash
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        self.length
            .cmp(&other.length)
            .then_with(|| self.hash.cmp(&other.hash))
    }
}

/// Any record variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Record {
    Identity(IdentityRecord),
    Model(ModelRecord),
    FocalLength(FocalLengthRecord),
    Rating(RatingRecord),
    EmbeddedAsset(EmbeddedAssetRecord),
}

impl Record {
    fn variant_rank(&self) -> u8 {
        match self {
            Record::Identity(_) => 0,
            Record::Model(_) => 1,
            Record::FocalLength(_) => 2,
            Record::Rating(_) => 3,
            Record::EmbeddedAsset(_) => 4,
        }
    }
}

impl Dedup for Record {
    fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Record::Identity(a), Record::Identity(b)) => a.same(b),
            (Record::Model(a), Record::Model(b)) => a.same(b),
            (Record::FocalLength(a), Record::FocalLength(b)) => a.same(b),
            (Record::Rating(a), Record::Rating(b)) => a.same(b),
            (Record::EmbeddedAsset(a), Record::EmbeddedAsset(b)) => a.same(b),
            _ => false,
        }
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Record::Identity(a), Record::Identity(b)) => a.cmp_key(b),
            (Record::Model(a), Record::Model(b)) => a.cmp_key(b),
            (Record::FocalLength(a), Record::FocalLength(b)) => a.cmp_key(b),
            (Record::Rating(a), Record::Rating(b)) => a.cmp_key(b),
            (Record::EmbeddedAsset(a), Record::EmbeddedAsset(b)) => a.cmp_key(b),
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }
}

macro_rules! impl_into_record {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Record {
                fn from(record: $ty) -> Self {
                    Record::$variant(record)
                }
            }
        )*
    };
}

impl_into_record! {
    IdentityRecord => Identity,
    ModelRecord => Model,
    FocalLengthRecord => FocalLength,
    RatingRecord => Rating,
    EmbeddedAssetRecord => EmbeddedAsset,
}

impl<T: Into<Record>> Entry<T> {
    /// Erase the variant type, keeping the count
    pub fn into_record_entry(self) -> (Record, usize) {
        let count = self.count();
        (self.into_record().into(), count)
    }
}
