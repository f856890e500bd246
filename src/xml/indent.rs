//! Canonical indentation.

use super::{Element, is_blank};

/// Rewrite structural whitespace under `element` to two spaces per level.
///
/// - An element with children gets `"\n" + indent + "  "` as its text and
///   `"\n" + indent` as its tail; its last child's tail closes back to the
///   element's own depth.
/// - A leaf below the root gets `"\n" + indent` as its tail.
///
/// Only blank (absent or whitespace-only) `text`/`tail` slots are written,
/// so content is never altered and a second pass changes nothing.
pub fn indent(element: &mut Element, level: usize) {
    let pad = format!("\n{}", "  ".repeat(level));

    if element.children.is_empty() {
        if level > 0 && is_blank(element.tail.as_deref()) {
            element.tail = Some(pad);
        }
        return;
    }

    if is_blank(element.text.as_deref()) {
        element.text = Some(format!("{pad}  "));
    }
    if is_blank(element.tail.as_deref()) {
        element.tail = Some(pad.clone());
    }
    for child in &mut element.children {
        indent(child, level + 1);
    }
    if let Some(last) = element.children.last_mut()
        && is_blank(last.tail.as_deref())
    {
        last.tail = Some(pad);
    }
}
