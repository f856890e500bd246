//! Patch input and batch application.
//!
//! A patch is either a single `<instruction>` or an `<instructions>` wrapper
//! around several. Each record is applied independently, in input order:
//! an unknown name is inserted, a known one is reconciled under the chosen
//! [`MergeMode`]. One [`PatchOutcome`] is produced per input record.
//!
//! Parsing is all-or-nothing (malformed input fails before anything is
//! applied); application is not (a record that cannot be applied is
//! reported and skipped, the rest of the batch still goes in).

use std::fmt;

use serde::Serialize;
use tracing::instrument;

use crate::document::Document;
use crate::error::DbError;
use crate::merge::{MergeMode, reconcile};
use crate::model::{INSTRUCTION_TAG, Instruction, ModelError, ROOT_TAG};
use crate::xml;

const ORIGIN: &str = "patch input";

// ---------------------------------------------------------------------------
// Patch
// ---------------------------------------------------------------------------

/// One record of a patch, as read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatchEntry {
    /// A record with a usable name.
    Record(Instruction),
    /// A record without a `name` attribute; it will be skipped.
    Nameless,
}

/// A parsed patch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Patch {
    pub entries: Vec<PatchEntry>,
}

impl Patch {
    /// Parse patch text.
    ///
    /// # Errors
    /// - [`DbError::MalformedDocument`] if the text is not well-formed.
    /// - [`DbError::InvalidPatchRoot`] if the root is neither
    ///   `<instruction>` nor `<instructions>`.
    pub fn parse(text: &str) -> Result<Self, DbError> {
        let root = xml::parse(text).map_err(|e| DbError::malformed(ORIGIN, e.message))?;
        let elements: Vec<&xml::Element> = match root.tag.as_str() {
            INSTRUCTION_TAG => vec![&root],
            ROOT_TAG => root.children_named(INSTRUCTION_TAG).collect(),
            _ => return Err(DbError::InvalidPatchRoot { tag: root.tag }),
        };

        let mut entries = Vec::with_capacity(elements.len());
        for element in elements {
            let entry = match Instruction::from_element(element) {
                Ok(record) => PatchEntry::Record(record),
                Err(ModelError::MissingName) => PatchEntry::Nameless,
                Err(e) => return Err(DbError::malformed(ORIGIN, e.to_string())),
            };
            entries.push(entry);
        }
        Ok(Self { entries })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// PatchOutcome
// ---------------------------------------------------------------------------

/// What happened to one patch record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum PatchOutcome {
    /// The name was new; the record was inserted.
    Added { name: String },
    /// The record was reconciled field by field with the existing one.
    Merged { name: String },
    /// The existing record was substituted.
    Replaced { name: String },
    /// The record was not applied.
    Skipped {
        /// 1-based position in the patch.
        position: usize,
        name: Option<String>,
        reason: String,
    },
}

impl PatchOutcome {
    /// `true` for outcomes that changed the document.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { name } => write!(f, "Added: {name}"),
            Self::Merged { name } => write!(f, "Merged: {name}"),
            Self::Replaced { name } => write!(f, "Replaced: {name}"),
            Self::Skipped {
                position, reason, ..
            } => write!(f, "Skipped: #{position} ({reason})"),
        }
    }
}

// ---------------------------------------------------------------------------
// apply
// ---------------------------------------------------------------------------

/// Apply every record of `patch` to `doc`, returning the updated document
/// and one outcome per record in input order.
#[instrument(skip_all, fields(records = patch.len(), mode = %mode))]
pub fn apply(mut doc: Document, patch: &Patch, mode: MergeMode) -> (Document, Vec<PatchOutcome>) {
    let mut outcomes = Vec::with_capacity(patch.len());

    for (i, entry) in patch.entries.iter().enumerate() {
        let position = i + 1;
        let PatchEntry::Record(incoming) = entry else {
            tracing::warn!(position, "skipping patch record without 'name' attribute");
            outcomes.push(PatchOutcome::Skipped {
                position,
                name: None,
                reason: "missing 'name' attribute".to_owned(),
            });
            continue;
        };

        let name = incoming.name.to_lowercase();
        let result = match doc.find_by_name(&name) {
            None => doc
                .insert(incoming.clone())
                .map(|_| PatchOutcome::Added { name: name.clone() }),
            Some(existing) => {
                let updated = reconcile(existing, incoming, mode);
                doc.replace(&name, updated).map(|_| match mode {
                    MergeMode::Merge => PatchOutcome::Merged { name: name.clone() },
                    MergeMode::Replace => PatchOutcome::Replaced { name: name.clone() },
                })
            }
        };

        match result {
            Ok(outcome) => {
                tracing::debug!(%outcome, "patch record applied");
                outcomes.push(outcome);
            }
            Err(err) => {
                tracing::warn!(position, name = %name, error = %err, "patch record not applied");
                outcomes.push(PatchOutcome::Skipped {
                    position,
                    name: Some(name),
                    reason: skip_reason(&err),
                });
            }
        }
    }

    (doc, outcomes)
}

fn skip_reason(err: &DbError) -> String {
    match err {
        DbError::DuplicateName { name } => format!("'{name}' already exists"),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Document {
        crate::store::parse_document(
            r#"<instructions>
  <instruction name="add" category="ARITHMETIC">
    <description>Add</description>
    <documentation><notes>old</notes></documentation>
  </instruction>
  <instruction name="mov" category="DATA_TRANSFER">
    <description>Move</description>
  </instruction>
  <instruction name="xor" category="LOGICAL">
    <description>Exclusive or</description>
  </instruction>
</instructions>"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_single_and_wrapped_roots() {
        let single = Patch::parse(r#"<instruction name="nop"><description>x</description></instruction>"#).unwrap();
        assert_eq!(single.len(), 1);

        let batch = Patch::parse(
            r#"<instructions><instruction name="push"/><comment/><instruction name="pop"/></instructions>"#,
        )
        .unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn unknown_root_is_rejected() {
        let err = Patch::parse("<instructionset><instruction name=\"a\"/></instructionset>").unwrap_err();
        assert!(matches!(err, DbError::InvalidPatchRoot { ref tag } if tag == "instructionset"));
    }

    #[test]
    fn malformed_input_is_rejected() {
        let err = Patch::parse("<instruction name=\"a\">").unwrap_err();
        assert!(matches!(err, DbError::MalformedDocument { .. }));
    }

    #[test]
    fn nameless_records_are_parsed_as_skippable() {
        let patch = Patch::parse(
            r#"<instructions><instruction name="jmp"/><instruction category="X"/></instructions>"#,
        )
        .unwrap();
        assert!(matches!(patch.entries[0], PatchEntry::Record(_)));
        assert_eq!(patch.entries[1], PatchEntry::Nameless);
    }

    #[test]
    fn new_name_is_added_in_order() {
        let patch = Patch::parse(r#"<instruction name="JMP" category="CONTROL"><description>Jump</description></instruction>"#).unwrap();
        let (doc, outcomes) = apply(base(), &patch, MergeMode::Merge);
        assert_eq!(outcomes, vec![PatchOutcome::Added { name: "jmp".to_owned() }]);
        assert_eq!(doc.names().collect::<Vec<_>>(), vec!["add", "jmp", "mov", "xor"]);
    }

    #[test]
    fn merge_preserves_unmentioned_fields() {
        let patch = Patch::parse(
            r#"<instruction name="add"><documentation><operation>DEST := DEST + SRC</operation></documentation></instruction>"#,
        )
        .unwrap();
        let (doc, outcomes) = apply(base(), &patch, MergeMode::Merge);
        assert_eq!(outcomes, vec![PatchOutcome::Merged { name: "add".to_owned() }]);
        let add = doc.find_by_name("add").unwrap();
        let docs = add.documentation.as_ref().unwrap();
        assert_eq!(docs.notes.as_deref(), Some("old"));
        assert_eq!(docs.operation.as_deref(), Some("DEST := DEST + SRC"));
        assert_eq!(add.description.as_deref(), Some("Add"));
    }

    #[test]
    fn replace_discards_unmentioned_fields() {
        let patch = Patch::parse(r#"<instruction name="ADD" category="ARITHMETIC"/>"#).unwrap();
        let (doc, outcomes) = apply(base(), &patch, MergeMode::Replace);
        assert_eq!(outcomes, vec![PatchOutcome::Replaced { name: "add".to_owned() }]);
        let add = doc.find_by_name("add").unwrap();
        assert_eq!(add.name, "add");
        assert_eq!(add.description, None);
        assert_eq!(add.documentation, None);
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn batch_skips_nameless_records_and_keeps_going() {
        let patch = Patch::parse(
            r#"<instructions>
                 <instruction name="nop" category="CONTROL"><description>No operation</description></instruction>
                 <instruction category="CONTROL"><description>orphan</description></instruction>
                 <instruction name="mov"><description>Move data</description></instruction>
               </instructions>"#,
        )
        .unwrap();
        let (doc, outcomes) = apply(base(), &patch, MergeMode::Merge);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0], PatchOutcome::Added { name: "nop".to_owned() });
        assert!(!outcomes[1].is_applied());
        assert_eq!(outcomes[1].to_string(), "Skipped: #2 (missing 'name' attribute)");
        assert_eq!(outcomes[2], PatchOutcome::Merged { name: "mov".to_owned() });
        assert_eq!(doc.names().collect::<Vec<_>>(), vec!["add", "mov", "nop", "xor"]);
        assert_eq!(
            doc.find_by_name("mov").unwrap().description.as_deref(),
            Some("Move data")
        );
    }

    #[test]
    fn repeated_name_in_one_batch_merges_into_the_first() {
        let patch = Patch::parse(
            r#"<instructions>
                 <instruction name="cpuid" category="SYSTEM"><description>CPU id</description></instruction>
                 <instruction name="CPUID"><documentation><summary>Identify</summary></documentation></instruction>
               </instructions>"#,
        )
        .unwrap();
        let (doc, outcomes) = apply(base(), &patch, MergeMode::Merge);
        assert_eq!(
            outcomes,
            vec![
                PatchOutcome::Added { name: "cpuid".to_owned() },
                PatchOutcome::Merged { name: "cpuid".to_owned() },
            ]
        );
        let cpuid = doc.find_by_name("cpuid").unwrap();
        assert_eq!(cpuid.name, "cpuid");
        assert_eq!(cpuid.description.as_deref(), Some("CPU id"));
        assert!(doc.is_sorted());
    }

    #[test]
    fn outcome_lines() {
        assert_eq!(PatchOutcome::Added { name: "a".to_owned() }.to_string(), "Added: a");
        assert_eq!(PatchOutcome::Merged { name: "a".to_owned() }.to_string(), "Merged: a");
        assert_eq!(PatchOutcome::Replaced { name: "a".to_owned() }.to_string(), "Replaced: a");
        let skipped = PatchOutcome::Skipped {
            position: 3,
            name: Some("a".to_owned()),
            reason: "'a' already exists".to_owned(),
        };
        assert_eq!(skipped.to_string(), "Skipped: #3 ('a' already exists)");
    }
}
