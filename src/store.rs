//! Document persistence.
//!
//! The catalog lives in a single XML file:
//!
//! ```xml
//! <?xml version='1.0' encoding='UTF-8'?>
//! <instructions>
//!   <instruction name="add" category="ARITHMETIC">
//!     <description>Add</description>
//!   </instruction>
//! </instructions>
//! ```
//!
//! Saving regenerates the whole file from the model, applies canonical
//! indentation and overwrites the path in place. The write is not atomic:
//! an interrupted save can leave a truncated file.

use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::error::DbError;
use crate::model::{INSTRUCTION_TAG, Instruction, ROOT_TAG};
use crate::xml::{self, Element};

const ORIGIN: &str = "database";

// ---------------------------------------------------------------------------
// Pure conversions
// ---------------------------------------------------------------------------

/// Parse document text into a [`Document`].
///
/// Record names are lower-cased, and an out-of-order document is re-sorted
/// (stable) with a warning.
///
/// # Errors
/// [`DbError::MalformedDocument`] if the text is not well-formed XML, the
/// root is not `<instructions>`, the root holds anything but
/// `<instruction>` elements, a record has no name, or two records share a
/// name.
pub fn parse_document(text: &str) -> Result<Document, DbError> {
    let root = xml::parse(text).map_err(|e| DbError::malformed(ORIGIN, e.message))?;
    if root.tag != ROOT_TAG {
        return Err(DbError::malformed(
            ORIGIN,
            format!("root element must be <{ROOT_TAG}>, got <{}>", root.tag),
        ));
    }

    let mut records = Vec::with_capacity(root.children.len());
    for (i, child) in root.children.iter().enumerate() {
        if child.tag != INSTRUCTION_TAG {
            return Err(DbError::malformed(
                ORIGIN,
                format!("unexpected <{}> at position {} in <{ROOT_TAG}>", child.tag, i + 1),
            ));
        }
        let mut record = Instruction::from_element(child)
            .map_err(|e| DbError::malformed(ORIGIN, format!("record #{}: {e}", i + 1)))?;
        let lowered = record.name.to_lowercase();
        if lowered != record.name {
            tracing::info!(name = %record.name, "record name lower-cased");
            record.name = lowered;
        }
        records.push(record);
    }

    let mut doc = Document::from_sorted(root.attributes, records);
    if let Some(name) = doc.first_duplicate() {
        return Err(DbError::malformed(
            ORIGIN,
            format!("instruction '{name}' appears more than once"),
        ));
    }
    if doc.repair_order() {
        tracing::warn!("database was not in alphabetical order; records have been re-sorted");
    }
    Ok(doc)
}

/// Render a [`Document`] as canonical document text.
#[must_use]
pub fn render_document(doc: &Document) -> String {
    let mut root = Element::new(ROOT_TAG);
    root.attributes.clone_from(&doc.root_attributes);
    root.children = doc.records().iter().map(Instruction::to_element).collect();
    xml::indent(&mut root, 0);
    xml::to_document_string(&root)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// The on-disk location of a catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the catalog.
    ///
    /// # Errors
    /// [`DbError::DocumentNotFound`] if the file does not exist,
    /// [`DbError::Io`] on other read failures, and anything
    /// [`parse_document`] returns.
    pub fn load(&self) -> Result<Document, DbError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DbError::DocumentNotFound {
                    path: self.path.clone(),
                }
            } else {
                DbError::io(&self.path, e)
            }
        })?;
        let doc = parse_document(&text)?;
        tracing::debug!(path = %self.path.display(), records = doc.len(), "database loaded");
        Ok(doc)
    }

    /// Overwrite the file with the canonical rendering of `doc`.
    ///
    /// # Errors
    /// [`DbError::Io`] if the file cannot be written.
    pub fn save(&self, doc: &Document) -> Result<(), DbError> {
        std::fs::write(&self.path, render_document(doc)).map_err(|e| DbError::io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), records = doc.len(), "database saved");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
