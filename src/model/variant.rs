//! Operand variants.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::xml::Element;

pub const VARIANTS_TAG: &str = "variants";
const VARIANT_TAG: &str = "variant";
const OPERAND_TAG: &str = "operand";

/// One operand slot: a type tag such as `REG`, `R_M` or `IMM8`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Operand {
    /// The operand type tag, verbatim.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the operand may be omitted.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl Operand {
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            optional: false,
        }
    }

    #[must_use]
    pub fn optional(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            optional: true,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.kind.is_empty() {
            "UNKNOWN"
        } else {
            &self.kind
        };
        if self.optional {
            write!(f, "[{kind}]")
        } else {
            f.write_str(kind)
        }
    }
}

/// One accepted operand combination, in operand order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Variant {
    pub operands: Vec<Operand>,
}

impl Variant {
    #[must_use]
    pub fn new(operands: impl IntoIterator<Item = Operand>) -> Self {
        Self {
            operands: operands.into_iter().collect(),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, operand) in self.operands.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{operand}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

/// The `<variants>` block of a record.
///
/// The block is stored as its element, so attributes and children beyond
/// `type`/`optional` operands survive a load/save cycle. [`Variants::list`]
/// gives the typed view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variants {
    element: Element,
}

impl Variants {
    /// The operand combinations, in document order. Children other than
    /// `<variant>`/`<operand>` are not part of this view.
    #[must_use]
    pub fn list(&self) -> Vec<Variant> {
        self.element
            .children_named(VARIANT_TAG)
            .map(|variant| {
                Variant::new(variant.children_named(OPERAND_TAG).map(|op| Operand {
                    kind: op.attr("type").unwrap_or_default().to_owned(),
                    optional: op.attr("optional") == Some("true"),
                }))
            })
            .collect()
    }

    /// Number of `<variant>` children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.element.children_named(VARIANT_TAG).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn from_element(element: &Element) -> Self {
        let mut element = element.clone();
        element.tail = None;
        element.strip_layout();
        Self { element }
    }

    pub(crate) fn to_element(&self) -> Element {
        self.element.clone()
    }
}

impl FromIterator<Variant> for Variants {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        let mut element = Element::new(VARIANTS_TAG);
        for variant in iter {
            let mut v = Element::new(VARIANT_TAG);
            for operand in &variant.operands {
                let mut op = Element::new(OPERAND_TAG);
                if !operand.kind.is_empty() {
                    op.set_attr("type", operand.kind.clone());
                }
                if operand.optional {
                    op.set_attr("optional", "true");
                }
                v.children.push(op);
            }
            element.children.push(v);
        }
        Self { element }
    }
}

impl From<Vec<Variant>> for Variants {
    fn from(variants: Vec<Variant>) -> Self {
        variants.into_iter().collect()
    }
}

impl Serialize for Variants {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.list())
    }
}
