//! Top-level catalog operations.
//!
//! Each operation takes the loaded [`Document`] by value, works on it in
//! memory and hands the updated document back. Nothing here touches the
//! filesystem; the caller saves the result with [`crate::store::Store`]
//! once the operation has succeeded. A failed operation returns an error
//! and no document, so there is nothing to save.

use tracing::instrument;

use crate::document::Document;
use crate::error::DbError;
use crate::merge::MergeMode;
use crate::model::Instruction;
use crate::patch::{self, Patch, PatchOutcome};

/// Result of applying an edited record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditResult {
    /// The edited record is identical to the stored one.
    Unchanged,
    /// The record was updated; `renamed_from` is set when its name changed.
    Updated {
        name: String,
        renamed_from: Option<String>,
    },
}

/// Add a new record.
///
/// # Errors
/// [`DbError::DuplicateName`] if a record with the same name exists.
#[instrument(skip_all, fields(name = %record.name))]
pub fn add(mut doc: Document, record: Instruction) -> Result<Document, DbError> {
    let index = doc.insert(record)?;
    tracing::info!(index, "instruction added");
    Ok(doc)
}

/// Delete the record named `name`, returning the document and the removed
/// record.
///
/// # Errors
/// [`DbError::RecordNotFound`] if there is no such record.
#[instrument(skip_all, fields(name = name))]
pub fn delete(mut doc: Document, name: &str) -> Result<(Document, Instruction), DbError> {
    let removed = doc.remove(name)?;
    tracing::info!("instruction deleted");
    Ok((doc, removed))
}

/// Apply a parsed patch. Per-record problems become `Skipped` outcomes;
/// this never fails as a whole.
#[must_use]
pub fn apply_patch(doc: Document, patch: &Patch, mode: MergeMode) -> (Document, Vec<PatchOutcome>) {
    patch::apply(doc, patch, mode)
}

/// Substitute the stored record `original_name` with `edited`.
///
/// The edited record may carry a new name, in which case it moves to the
/// slot for that name.
///
/// # Errors
/// - [`DbError::RecordNotFound`] if `original_name` is gone.
/// - [`DbError::DuplicateName`] if the new name belongs to another record.
#[instrument(skip_all, fields(name = original_name))]
pub fn apply_edit(
    mut doc: Document,
    original_name: &str,
    mut edited: Instruction,
) -> Result<(Document, EditResult), DbError> {
    edited.name = edited.name.to_lowercase();
    let current = doc
        .find_by_name(original_name)
        .ok_or_else(|| DbError::RecordNotFound {
            name: original_name.to_owned(),
        })?;
    if *current == edited {
        return Ok((doc, EditResult::Unchanged));
    }

    let previous_name = current.name.clone();
    let name = edited.name.clone();
    doc.replace(original_name, edited)?;
    let renamed_from = (previous_name != name).then_some(previous_name);
    Ok((doc, EditResult::Updated { name, renamed_from }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
