//! Minimal XML element tree.
//!
//! The catalog is stored as XML, but the tool only ever needs a small slice
//! of it: elements, ordered attributes, character data. [`Element`] models
//! exactly that, using the `text`/`tail` convention for character data:
//! `text` is the data between an element's start tag and its first child,
//! `tail` is the data between its end tag and the next sibling. Structural
//! whitespace therefore lives in `text`/`tail` and can be rewritten by
//! [`indent`] without touching content.
//!
//! Parsing is done with `quick-xml`'s pull reader. Comments, processing
//! instructions and doctypes are dropped on the way in.

mod indent;

pub use indent::indent;

use std::fmt;

use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::Serialize;

/// XML declaration written at the top of every saved document.
pub const DECLARATION: &str = "<?xml version='1.0' encoding='UTF-8'?>";

// ---------------------------------------------------------------------------
// Element
// ---------------------------------------------------------------------------

/// One XML element with its attributes, character data and children.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Element {
    /// Tag name.
    pub tag: String,
    /// Attributes in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<(String, String)>,
    /// Character data before the first child.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Character data after the end tag (belongs to the parent's content).
    #[serde(skip)]
    pub tail: Option<String>,
    /// Child elements in document order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
}

impl Element {
    /// Create an empty element.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Builder: set an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: set the text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: append a child.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Look up an attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, overwriting in place or appending.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_owned(), value)),
        }
    }

    /// First child with the given tag.
    #[must_use]
    pub fn find(&self, tag: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All children with the given tag.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Text content, empty if there is none.
    #[must_use]
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// All character data inside the element in reading order: its text,
    /// then each child's content followed by that child's tail.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = self.text_or_empty().to_owned();
        for child in &self.children {
            out.push_str(&child.text_content());
            out.push_str(child.tail.as_deref().unwrap_or(""));
        }
        out
    }

    /// Drop structural whitespace so the subtree compares by content only.
    ///
    /// Whitespace-only `text` of elements that have children and
    /// whitespace-only `tail`s are cleared. Leaf text is content and is kept.
    pub fn strip_layout(&mut self) {
        if is_blank(self.tail.as_deref()) {
            self.tail = None;
        }
        if !self.children.is_empty() && is_blank(self.text.as_deref()) {
            self.text = None;
        }
        for child in &mut self.children {
            child.strip_layout();
        }
    }
}

/// `true` for absent or whitespace-only character data.
pub(crate) fn is_blank(s: Option<&str>) -> bool {
    s.is_none_or(|s| s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// ParseError
// ---------------------------------------------------------------------------

/// The input is not a well-formed single-root XML fragment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable description, including the byte offset when known.
    pub message: String,
}

impl ParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse `input` into its root element.
///
/// Character data is kept verbatim (no trimming) so that content survives
/// round trips; layout whitespace ends up in `text`/`tail`.
///
/// # Errors
/// Returns [`ParseError`] on malformed markup, unclosed elements, text or
/// elements outside the root, or an empty input.
pub fn parse(input: &str) -> Result<Element, ParseError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(false);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            ParseError::new(format!("{e} (at byte {})", reader.buffer_position()))
        })?;
        match event {
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(ParseError::new("junk after document element"));
                }
                stack.push(open_element(&start)?);
            }
            Event::Empty(start) => {
                let element = open_element(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::new("closing tag without matching opening tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| ParseError::new(format!("bad character data: {e}")))?;
                append_text(&mut stack, &text)?;
            }
            Event::CData(data) => {
                let text = String::from_utf8(data.into_inner().into_owned())
                    .map_err(|e| ParseError::new(format!("CDATA is not UTF-8: {e}")))?;
                append_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::new(format!(
            "unexpected end of input: <{}> is not closed",
            open.tag
        )));
    }
    root.ok_or_else(|| ParseError::new("no element found"))
}

fn open_element(start: &BytesStart<'_>) -> Result<Element, ParseError> {
    let tag = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| ParseError::new(format!("tag name is not UTF-8: {e}")))?
        .to_owned();
    let mut element = Element::new(tag);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::new(format!("bad attribute on <{}>: {e}", element.tag)))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| ParseError::new(format!("attribute name is not UTF-8: {e}")))?
            .to_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| ParseError::new(format!("bad value for attribute '{key}': {e}")))?
            .into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::new("junk after document element"));
    }
    *root = Some(element);
    Ok(())
}

fn append_text(stack: &mut [Element], text: &str) -> Result<(), ParseError> {
    let Some(current) = stack.last_mut() else {
        if text.trim().is_empty() {
            return Ok(());
        }
        return Err(ParseError::new("text outside of the document element"));
    };
    let slot = match current.children.last_mut() {
        Some(last) => &mut last.tail,
        None => &mut current.text,
    };
    slot.get_or_insert_with(String::new).push_str(text);
    Ok(())
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Serialize a whole document: declaration line, root element, root tail.
#[must_use]
pub fn to_document_string(root: &Element) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(DECLARATION);
    out.push('\n');
    write_element(&mut out, root, true);
    out
}

/// Serialize a single element without its tail.
#[must_use]
pub fn to_fragment_string(element: &Element) -> String {
    let mut out = String::new();
    write_element(&mut out, element, false);
    out
}

fn write_element(out: &mut String, element: &Element, with_tail: bool) {
    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }

    let text = element.text_or_empty();
    if element.children.is_empty() && text.is_empty() {
        out.push_str(" />");
    } else {
        out.push('>');
        out.push_str(&partial_escape(text));
        for child in &element.children {
            write_element(out, child, true);
        }
        out.push_str("</");
        out.push_str(&element.tag);
        out.push('>');
    }

    if with_tail && let Some(tail) = &element.tail {
        out.push_str(&partial_escape(tail.as_str()));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
