//! Record reconciliation.
//!
//! [`reconcile`] combines an existing record with a patch record under one
//! of two modes:
//!
//! - [`MergeMode::Replace`]: the patch is the result; nothing of the
//!   existing record survives.
//! - [`MergeMode::Merge`]: field-by-field, top-down. Each field is
//!   reconciled by its kind:
//!
//! | Kind | Fields | Patch supplies it | Patch omits it |
//! |---|---|---|---|
//! | attribute | `name`, `category`, others | overwrite | keep |
//! | leaf text | `description`, every documentation field | replace whole element | keep |
//! | nested | `documentation` | adopt if absent, else attributes and fields as above | keep |
//! | atomic | `variants` | replace whole list | keep |
//! | unknown | any other child, by tag | replace same-tag child, or append | keep |
//!
//! Everything here is pure; callers decide what to persist.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::model::{DocField, Documentation, Instruction};
use crate::xml::Element;

// ---------------------------------------------------------------------------
// MergeMode
// ---------------------------------------------------------------------------

/// How a patch record is applied to an existing record with the same name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
#[clap(rename_all = "kebab-case")]
pub enum MergeMode {
    /// Reconcile field by field, keeping whatever the patch leaves out.
    #[default]
    Merge,
    /// Substitute the patch record wholesale.
    Replace,
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => write!(f, "merge"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

/// Produce the record that results from applying `patch` to `existing`.
#[must_use]
pub fn reconcile(existing: &Instruction, patch: &Instruction, mode: MergeMode) -> Instruction {
    match mode {
        MergeMode::Replace => patch.clone(),
        MergeMode::Merge => merge(existing, patch),
    }
}

fn merge(existing: &Instruction, patch: &Instruction) -> Instruction {
    let mut out = existing.clone();

    out.set_attr("name", &patch.name);
    if let Some(category) = &patch.category {
        out.set_attr("category", category);
    }
    for (key, value) in &patch.attributes {
        out.set_attr(key, value);
    }

    overlay(&mut out.description, patch.description.as_ref());
    out.documentation = merge_documentation(out.documentation.take(), patch.documentation.as_ref());
    overlay(&mut out.variants, patch.variants.as_ref());
    merge_unknown(&mut out.extra, &patch.extra);
    out
}

/// Leaf and atomic fields: the patch value, when present, wins outright.
fn overlay<T: Clone>(slot: &mut Option<T>, patch: Option<&T>) {
    if let Some(value) = patch {
        *slot = Some(value.clone());
    }
}

fn merge_documentation(
    existing: Option<Documentation>,
    patch: Option<&Documentation>,
) -> Option<Documentation> {
    match (existing, patch) {
        (existing, None) => existing,
        (None, Some(patch)) => Some(patch.clone()),
        (Some(mut doc), Some(patch)) => {
            for (key, value) in &patch.attributes {
                match doc.attributes.iter_mut().find(|(k, _)| k == key) {
                    Some(slot) => value.clone_into(&mut slot.1),
                    None => doc.attributes.push((key.clone(), value.clone())),
                }
            }
            for field in DocField::ALL {
                overlay(doc.field_mut(field), patch.field(field));
            }
            merge_unknown(&mut doc.extra, &patch.extra);
            Some(doc)
        }
    }
}

/// Unknown children: the n-th patch child with a given tag replaces the
/// n-th existing child with that tag; surplus patch children are appended.
fn merge_unknown(target: &mut Vec<Element>, patch: &[Element]) {
    let mut replaced = vec![false; target.len()];
    for incoming in patch {
        let slot = target
            .iter()
            .zip(&replaced)
            .position(|(t, done)| !done && t.tag == incoming.tag);
        match slot {
            Some(i) => {
                target[i] = incoming.clone();
                replaced[i] = true;
            }
            None => target.push(incoming.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
