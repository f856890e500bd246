//! The catalog record.

use serde::Serialize;

use super::documentation::{DOCUMENTATION_TAG, Documentation};
use super::variant::{VARIANTS_TAG, Variants};
use super::{INSTRUCTION_TAG, ModelError, TextField};
use crate::xml::Element;

const DESCRIPTION_TAG: &str = "description";

/// How a child of `<instruction>` is read.
enum Child {
    Description,
    Documentation,
    Variants,
    Other,
}

impl Child {
    fn of(tag: &str) -> Self {
        match tag {
            DESCRIPTION_TAG => Self::Description,
            DOCUMENTATION_TAG => Self::Documentation,
            VARIANTS_TAG => Self::Variants,
            _ => Self::Other,
        }
    }
}

/// One catalog record.
///
/// `name` is the identity key and compares case-insensitively; the document
/// stores it lower-cased. `documentation` and `variants` are whole
/// substructures: `None` means the element is absent, not empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Instruction {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Attributes other than `name` and `category`, in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<TextField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<Documentation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Variants>,
    /// Children that are not one of the known fields, in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<Element>,
}

impl Instruction {
    /// A minimal record: name (lower-cased), category (upper-cased) and a
    /// short description.
    #[must_use]
    pub fn simple(name: &str, category: &str, description: impl Into<String>) -> Self {
        Self {
            name: name.to_lowercase(),
            category: Some(category.to_uppercase()),
            description: Some(TextField::plain(description)),
            ..Self::default()
        }
    }

    /// Case-insensitive identity comparison.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// Category for display, `UNKNOWN` when absent.
    #[must_use]
    pub fn category_or_unknown(&self) -> &str {
        self.category.as_deref().unwrap_or("UNKNOWN")
    }

    /// Look up an attribute, including `name` and `category`.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "category" => self.category.as_deref(),
            _ => self
                .attributes
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
        }
    }

    /// Set an attribute, routing `name` and `category` to their fields.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match name {
            "name" => value.clone_into(&mut self.name),
            "category" => self.category = Some(value.to_owned()),
            _ => match self.attributes.iter_mut().find(|(k, _)| k == name) {
                Some(slot) => value.clone_into(&mut slot.1),
                None => self.attributes.push((name.to_owned(), value.to_owned())),
            },
        }
    }

    /// Read an `<instruction>` element.
    ///
    /// # Errors
    /// [`ModelError::WrongTag`] if the element is not `<instruction>`,
    /// [`ModelError::MissingName`] if it has no non-empty `name`.
    pub fn from_element(element: &Element) -> Result<Self, ModelError> {
        if element.tag != INSTRUCTION_TAG {
            return Err(ModelError::WrongTag {
                found: element.tag.clone(),
            });
        }

        let mut record = Self::default();
        for (key, value) in &element.attributes {
            record.set_attr(key, value);
        }
        if record.name.is_empty() {
            return Err(ModelError::MissingName);
        }

        for child in &element.children {
            match Child::of(&child.tag) {
                Child::Description if record.description.is_none() => {
                    record.description = Some(TextField::from_element(child));
                }
                Child::Documentation if record.documentation.is_none() => {
                    record.documentation = Some(Documentation::from_element(child));
                }
                Child::Variants if record.variants.is_none() => {
                    record.variants = Some(Variants::from_element(child));
                }
                _ => {
                    let mut kept = child.clone();
                    kept.strip_layout();
                    record.extra.push(kept);
                }
            }
        }
        Ok(record)
    }

    /// Project to an `<instruction>` element with no layout whitespace.
    ///
    /// Children are written in canonical order: description, documentation,
    /// variants, then any unknown children.
    #[must_use]
    pub fn to_element(&self) -> Element {
        let mut element = Element::new(INSTRUCTION_TAG).with_attr("name", self.name.clone());
        if let Some(category) = &self.category {
            element.set_attr("category", category.clone());
        }
        for (key, value) in &self.attributes {
            element.set_attr(key, value.clone());
        }

        if let Some(description) = &self.description {
            element.children.push(description.to_element(DESCRIPTION_TAG));
        }
        if let Some(documentation) = &self.documentation {
            element.children.push(documentation.to_element());
        }
        if let Some(variants) = &self.variants {
            element.children.push(variants.to_element());
        }
        element.children.extend(self.extra.iter().cloned());
        element
    }
}
