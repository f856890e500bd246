//! Catalog data model.
//!
//! Key types:
//! - [`Instruction`] : one catalog record (name, category, description,
//!   optional documentation and operand variants)
//! - [`Documentation`] : the named text fields of a record's documentation
//! - [`TextField`] : a text-valued field, inline markup included
//! - [`Variants`] / [`Variant`] / [`Operand`] : accepted operand combinations
//!
//! Records are extracted from and projected back to [`crate::xml::Element`]
//! trees. Extraction is shallow: only the fields above are typed, and
//! anything else (unknown attributes, children, inline markup) is carried
//! through verbatim so a save never drops content it did not touch.

mod documentation;
mod instruction;
mod text;
mod variant;

use std::fmt;

pub use documentation::{DocField, Documentation};
pub use instruction::Instruction;
pub use text::TextField;
pub use variant::{Operand, Variant, Variants};

/// Tag of the document root.
pub const ROOT_TAG: &str = "instructions";
/// Tag of one record.
pub const INSTRUCTION_TAG: &str = "instruction";

/// Why an element could not be read as a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelError {
    /// The element is not an `<instruction>`.
    WrongTag {
        /// The tag that was found instead.
        found: String,
    },
    /// The `name` attribute is absent or empty.
    MissingName,
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongTag { found } => {
                write!(f, "expected <{INSTRUCTION_TAG}>, found <{found}>")
            }
            Self::MissingName => write!(f, "<{INSTRUCTION_TAG}> has no 'name' attribute"),
        }
    }
}

impl std::error::Error for ModelError {}
