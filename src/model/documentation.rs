//! The `<documentation>` substructure.

use serde::Serialize;

use super::TextField;
use crate::xml::Element;

/// Tag of the documentation block.
pub const DOCUMENTATION_TAG: &str = "documentation";

/// The named text fields a documentation block may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocField {
    /// `<summary>`
    Summary,
    /// `<description>` (the long form; the record's own description is separate)
    Description,
    /// `<operation>`, usually pseudocode
    Operation,
    /// `<flags-affected>`
    FlagsAffected,
    /// `<notes>`
    Notes,
}

impl DocField {
    /// Every field, in canonical output order.
    pub const ALL: [Self; 5] = [
        Self::Summary,
        Self::Description,
        Self::Operation,
        Self::FlagsAffected,
        Self::Notes,
    ];

    /// XML tag for this field.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Description => "description",
            Self::Operation => "operation",
            Self::FlagsAffected => "flags-affected",
            Self::Notes => "notes",
        }
    }

    /// Field for an XML tag, if it is one of the known ones.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.tag() == tag)
    }

    /// Display label: the tag with dashes as spaces, each word capitalised.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::Description => "Description",
            Self::Operation => "Operation",
            Self::FlagsAffected => "Flags Affected",
            Self::Notes => "Notes",
        }
    }
}

/// Long-form documentation for a record.
///
/// Each field is `None` when its element is absent; an element that is
/// present but empty is `Some("")`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Documentation {
    /// Attributes of the `<documentation>` element.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TextField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<TextField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<TextField>,
    #[serde(rename = "flags-affected", skip_serializing_if = "Option::is_none")]
    pub flags_affected: Option<TextField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<TextField>,
    /// Children that are not one of the known fields, in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<Element>,
}

impl Documentation {
    #[must_use]
    pub fn field(&self, field: DocField) -> Option<&TextField> {
        match field {
            DocField::Summary => self.summary.as_ref(),
            DocField::Description => self.description.as_ref(),
            DocField::Operation => self.operation.as_ref(),
            DocField::FlagsAffected => self.flags_affected.as_ref(),
            DocField::Notes => self.notes.as_ref(),
        }
    }

    pub fn field_mut(&mut self, field: DocField) -> &mut Option<TextField> {
        match field {
            DocField::Summary => &mut self.summary,
            DocField::Description => &mut self.description,
            DocField::Operation => &mut self.operation,
            DocField::FlagsAffected => &mut self.flags_affected,
            DocField::Notes => &mut self.notes,
        }
    }

    /// `true` when no field, attribute or extra child is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        DocField::ALL.into_iter().all(|f| self.field(f).is_none())
            && self.attributes.is_empty()
            && self.extra.is_empty()
    }

    /// Read a `<documentation>` element.
    ///
    /// The first occurrence of each known field wins; repeats and unknown
    /// children are kept in `extra`.
    #[must_use]
    pub fn from_element(element: &Element) -> Self {
        let mut doc = Self {
            attributes: element.attributes.clone(),
            ..Self::default()
        };
        for child in &element.children {
            match DocField::from_tag(&child.tag) {
                Some(field) if doc.field(field).is_none() => {
                    *doc.field_mut(field) = Some(TextField::from_element(child));
                }
                _ => {
                    let mut kept = child.clone();
                    kept.strip_layout();
                    doc.extra.push(kept);
                }
            }
        }
        doc
    }

    /// Project back to a `<documentation>` element (no layout whitespace).
    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(DOCUMENTATION_TAG);
        element.attributes.clone_from(&self.attributes);
        for field in DocField::ALL {
            if let Some(text) = self.field(field) {
                element.children.push(text.to_element(field.tag()));
            }
        }
        element.children.extend(self.extra.iter().cloned());
        element
    }
}
