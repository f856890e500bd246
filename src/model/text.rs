//! Text-valued fields (`<description>`, `<summary>`, `<notes>`, ...).

use std::fmt;
use std::ops::Deref;

use serde::{Serialize, Serializer};

use crate::xml::Element;

/// The content of a text field.
///
/// Most fields are plain character data. A field may also carry attributes
/// or inline markup (`See <ref>ADC</ref> for carry-in.`); that element is
/// kept whole so saving writes it back unchanged. Either way the field
/// dereferences to its character data in reading order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextField {
    text: String,
    /// The source element, when plain text would not reproduce it. Its tag
    /// is cleared; the field's position decides the tag on output.
    markup: Option<Element>,
}

impl TextField {
    /// A field holding only character data.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markup: None,
        }
    }

    /// `true` when the field has attributes or inline elements.
    #[must_use]
    pub const fn has_markup(&self) -> bool {
        self.markup.is_some()
    }

    pub(crate) fn from_element(element: &Element) -> Self {
        if element.attributes.is_empty() && element.children.is_empty() {
            return Self::plain(element.text_or_empty());
        }
        let mut markup = element.clone();
        markup.tag.clear();
        markup.tail = None;
        if markup.text.as_deref() == Some("") {
            markup.text = None;
        }
        markup.strip_layout();
        Self {
            text: markup.text_content(),
            markup: Some(markup),
        }
    }

    pub(crate) fn to_element(&self, tag: &str) -> Element {
        match &self.markup {
            Some(markup) => Element {
                tag: tag.to_owned(),
                ..markup.clone()
            },
            None => Element::new(tag).with_text(self.text.clone()),
        }
    }
}

impl Deref for TextField {
    type Target = str;

    fn deref(&self) -> &str {
        &self.text
    }
}

impl AsRef<str> for TextField {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl From<String> for TextField {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

impl From<&str> for TextField {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for TextField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}
