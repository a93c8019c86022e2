//! # Reporter Module
//!
//! Renders a finished run as text tables or JSON.
//!
//! Each tracker becomes a [`Section`]: a label plus the sorted
//! `(record, count)` pairs. Counter modes have no sections, only the
//! counter summary lines.

mod export;
mod table;

pub use export::write_json;
pub use table::write_text;

use crate::core::records::Record;
use serde::Serialize;

/// One distinct record and how many files it was observed in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub count: usize,
    pub record: Record,
}

/// The sorted contents of one tracker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    /// Plural noun for the record kind, e.g. "bodies"
    pub label: String,
    pub entries: Vec<ReportEntry>,
}

impl Section {
    pub fn new(label: &str, entries: Vec<(Record, usize)>) -> Self {
        Self {
            label: label.to_string(),
            entries: entries
                .into_iter()
                .map(|(record, count)| ReportEntry { count, record })
                .collect(),
        }
    }

    /// Number of files that contributed a record to this section
    pub fn files_with_data(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }
}
