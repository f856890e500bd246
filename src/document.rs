//! The in-memory catalog: an alphabetically ordered sequence of records.
//!
//! # Ordering invariant
//!
//! Records are sorted ascending by `name` using plain ordinal (code point)
//! comparison, and no two records share a case-insensitively equal name.
//! Every mutation here preserves that without re-sorting: insertion finds
//! the single correct slot, removal cannot break order, and a rename is a
//! removal followed by an insertion at the slot for the new name.
//!
//! Names are stored lower-cased, so ordinal order on stored names and
//! case-insensitive identity agree.

use serde::Serialize;

use crate::error::DbError;
use crate::model::Instruction;

// ---------------------------------------------------------------------------
// ListEntry
// ---------------------------------------------------------------------------

/// One row of a listing.
///
/// Field order matters: the derived `Ord` sorts by `(name, category)`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ListEntry {
    pub name: String,
    pub category: String,
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    /// Attributes of the root element, carried through unchanged.
    pub root_attributes: Vec<(String, String)>,
    records: Vec<Instruction>,
}

impl Document {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from records already known to satisfy the ordering
    /// invariant. Use [`Document::from_unsorted`] for anything else.
    #[must_use]
    pub(crate) const fn from_sorted(
        root_attributes: Vec<(String, String)>,
        records: Vec<Instruction>,
    ) -> Self {
        Self {
            root_attributes,
            records,
        }
    }

    /// Build a catalog from arbitrary records by inserting them one by one.
    ///
    /// # Errors
    /// [`DbError::DuplicateName`] on the first case-insensitive collision.
    pub fn from_unsorted(records: impl IntoIterator<Item = Instruction>) -> Result<Self, DbError> {
        let mut doc = Self::new();
        for record in records {
            doc.insert(record)?;
        }
        Ok(doc)
    }

    /// Records in stored order.
    #[must_use]
    pub fn records(&self) -> &[Instruction] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stored names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    /// `true` when names are non-decreasing in ordinal order.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.records.windows(2).all(|w| w[0].name <= w[1].name)
    }

    // -- Lookup --------------------------------------------------------------

    /// Index of the record whose name equals `name`, ignoring case.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        let wanted = name.to_lowercase();
        self.records
            .iter()
            .position(|r| r.name.to_lowercase() == wanted)
    }

    /// Case-insensitive exact lookup.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Instruction> {
        self.position(name).map(|i| &self.records[i])
    }

    /// Records whose name contains `pattern` (case-insensitively), as
    /// `(name, category)` rows sorted for display.
    ///
    /// `None` lists everything. The display sort is independent of the
    /// stored order.
    #[must_use]
    pub fn list_by_pattern(&self, pattern: Option<&str>) -> Vec<ListEntry> {
        let needle = pattern.map(str::to_lowercase);
        let mut entries: Vec<ListEntry> = self
            .records
            .iter()
            .filter(|r| {
                needle
                    .as_deref()
                    .is_none_or(|n| r.name.to_lowercase().contains(n))
            })
            .map(|r| ListEntry {
                name: r.name.clone(),
                category: r.category_or_unknown().to_owned(),
            })
            .collect();
        entries.sort();
        entries
    }

    // -- Ordered mutation ----------------------------------------------------

    /// Insert `record` at its alphabetical slot and return the index.
    ///
    /// The name is lower-cased first. The slot is found by scanning for the
    /// first record whose name is ordinally greater; the record goes
    /// immediately before it (or at the end).
    ///
    /// # Errors
    /// [`DbError::DuplicateName`] if a record with the same name exists;
    /// the document is left untouched.
    pub fn insert(&mut self, mut record: Instruction) -> Result<usize, DbError> {
        record.name = record.name.to_lowercase();
        if self.position(&record.name).is_some() {
            return Err(DbError::DuplicateName { name: record.name });
        }
        let index = self
            .records
            .iter()
            .position(|existing| existing.name > record.name)
            .unwrap_or(self.records.len());
        tracing::debug!(name = %record.name, index, "inserting record");
        self.records.insert(index, record);
        Ok(index)
    }

    /// Remove the record named `name` (case-insensitively) and return it.
    ///
    /// # Errors
    /// [`DbError::RecordNotFound`] if there is no such record.
    pub fn remove(&mut self, name: &str) -> Result<Instruction, DbError> {
        let index = self.position(name).ok_or_else(|| DbError::RecordNotFound {
            name: name.to_owned(),
        })?;
        Ok(self.records.remove(index))
    }

    /// Replace the record named `old_name` with `record`, which may carry a
    /// different name. The replacement is re-inserted at the slot for its
    /// own name; it is never written back at the old index.
    ///
    /// # Errors
    /// - [`DbError::RecordNotFound`] if `old_name` does not exist.
    /// - [`DbError::DuplicateName`] if `record` is renamed onto another
    ///   existing record.
    ///
    /// On error the document is left untouched.
    pub fn replace(&mut self, old_name: &str, record: Instruction) -> Result<usize, DbError> {
        let old_index = self.position(old_name).ok_or_else(|| DbError::RecordNotFound {
            name: old_name.to_owned(),
        })?;
        if let Some(clash) = self.position(&record.name)
            && clash != old_index
        {
            return Err(DbError::DuplicateName {
                name: record.name.to_lowercase(),
            });
        }
        let previous = self.records.remove(old_index);
        if previous.name != record.name.to_lowercase() {
            tracing::info!(from = %previous.name, to = %record.name, "record renamed");
        }
        self.insert(record)
    }

    /// Restore the ordering invariant on a catalog loaded from elsewhere.
    ///
    /// Returns `true` if a re-sort was needed. The sort is stable.
    pub(crate) fn repair_order(&mut self) -> bool {
        if self.is_sorted() {
            return false;
        }
        self.records.sort_by(|a, b| a.name.cmp(&b.name));
        true
    }

    /// First name that occurs twice (case-insensitively), if any.
    #[must_use]
    pub(crate) fn first_duplicate(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .map(|r| r.name.as_str())
            .find(|name| !seen.insert(name.to_lowercase()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
