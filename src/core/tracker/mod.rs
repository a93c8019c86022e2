//! # Tracker Module
//!
//! Thread-safe deduplicating counters.
//!
//! An [`EntryTracker`] holds the distinct records of one kind seen during a
//! run, each with the number of files it was observed in. Workers call
//! [`EntryTracker::add_or_update`] concurrently; reporting reads the tracker
//! once every worker is done.
//!
//! ## Strategy
//! One mutex guards the whole entry list and the lookup is a linear scan
//! with [`Dedup::same`]. The number of distinct values (bodies, lenses,
//! focal lengths) stays small next to the number of files, and doing the
//! check and the increment-or-append under one lock guarantees at most one
//! slot per distinct value no matter how workers interleave.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::{Mutex, PoisonError};

/// Equivalence and natural ordering for a record kind
pub trait Dedup {
    /// Whether two observations describe the same entity
    fn same(&self, other: &Self) -> bool;

    /// Natural ascending order used for key-sorted reports
    fn cmp_key(&self, other: &Self) -> Ordering;
}

/// Report ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending by the record's natural key
    #[default]
    Key,
    /// Descending by observation count
    Count,
}

/// One distinct record and how many times it was observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<T> {
    record: T,
    count: usize,
}

impl<T> Entry<T> {
    fn new(record: T) -> Self {
        Self { record, count: 1 }
    }

    /// The first observation of this entity
    pub fn record(&self) -> &T {
        &self.record
    }

    /// Number of observations merged into this entry
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_record(self) -> T {
        self.record
    }
}

/// Append-or-merge collection of records of one kind
#[derive(Debug)]
pub struct EntryTracker<T> {
    entries: Mutex<Vec<Entry<T>>>,
}

impl<T> Default for EntryTracker<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Dedup> EntryTracker<T> {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `record` into its existing slot, or append it with count 1
    pub fn add_or_update(&self, record: T) {
        // A panicking worker can't leave the list half-updated: the only
        // mutations are an increment and a push.
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.iter_mut().find(|e| e.record.same(&record)) {
            entry.count += 1;
            return;
        }

        entries.push(Entry::new(record));
    }

    /// Number of distinct entries
    pub fn count(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Sum of all entry counts, i.e. files that contributed a record
    pub fn total_observations(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|e| e.count)
            .sum()
    }

    /// Sort in place; requires exclusive access, so no worker can remain
    pub fn sort(&mut self, order: SortOrder) {
        let entries = self
            .entries
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        sort_entries(entries, order);
    }

    /// Entries in their current order
    pub fn entries(&mut self) -> &[Entry<T>] {
        self.entries
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Consume the tracker, yielding its entries in the requested order
    pub fn into_sorted(self, order: SortOrder) -> Vec<Entry<T>> {
        let mut entries = self
            .entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        sort_entries(&mut entries, order);
        entries
    }
}

fn sort_entries<T: Dedup>(entries: &mut [Entry<T>], order: SortOrder) {
    match order {
        SortOrder::Key => entries.sort_by(|a, b| a.record.cmp_key(&b.record)),
        // ties fall back to the key so reports are stable across runs
        SortOrder::Count => entries.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.record.cmp_key(&b.record))
        }),
    }
}
