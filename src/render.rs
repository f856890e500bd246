//! Human-readable output for `read` and `list`.

use std::fmt::Write as _;

use crate::document::{Document, ListEntry};
use crate::model::{DocField, Instruction};
use crate::xml::Element;

const RULE_WIDTH: usize = 60;
const NAME_COLUMN: usize = 20;

/// Full description of one record.
#[must_use]
pub fn render_record(record: &Instruction) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\nInstruction: {}", record.name);
    let _ = writeln!(out, "Category: {}", record.category_or_unknown());
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    if let Some(description) = record.description.as_deref().map(str::trim)
        && !description.is_empty()
    {
        let _ = writeln!(out, "\nDescription: {description}");
    }

    if let Some(doc) = &record.documentation {
        out.push_str("\nDocumentation:\n");
        for field in DocField::ALL {
            if let Some(text) = doc.field(field).map(|t| t.trim())
                && !text.is_empty()
            {
                let _ = writeln!(out, "  {}: {text}", field.label());
            }
        }
        for extra in &doc.extra {
            render_extra(&mut out, extra);
        }
    }

    if let Some(variants) = &record.variants {
        out.push_str("\nVariants:\n");
        for (i, variant) in variants.list().iter().enumerate() {
            let _ = writeln!(out, "  {}. {variant}", i + 1);
        }
    }

    out.push('\n');
    out
}

fn render_extra(out: &mut String, element: &Element) {
    let text = element.text_content();
    let text = text.trim();
    if !text.is_empty() {
        let _ = writeln!(out, "  {}: {text}", title_case(&element.tag));
    }
}

/// `flags-affected` -> `Flags Affected`.
fn title_case(tag: &str) -> String {
    tag.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A listing with a count header.
#[must_use]
pub fn render_listing(entries: &[ListEntry]) -> String {
    let mut out = format!("Found {} instruction(s):\n\n", entries.len());
    for entry in entries {
        let _ = writeln!(out, "  {:<NAME_COLUMN$} [{}]", entry.name, entry.category);
    }
    out
}

/// Records whose name contains the first three characters of `query`.
#[must_use]
pub fn similar_names(doc: &Document, query: &str) -> Vec<ListEntry> {
    let prefix: String = query.chars().take(3).collect();
    doc.list_by_pattern(Some(&prefix))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Documentation, Operand, TextField, Variant, Variants};
    use crate::xml::parse;

    #[test]
    fn record_layout() {
        let record = Instruction {
            documentation: Some(Documentation {
                summary: Some("  Add  ".into()),
                flags_affected: Some("OF, SF, ZF, CF".into()),
                notes: Some("   ".into()),
                extra: vec![Element::new("cpu-level").with_text("8086")],
                ..Documentation::default()
            }),
            variants: Some(Variants::from(vec![
                Variant::new([Operand::new("REG"), Operand::new("R_M")]),
                Variant::new([Operand::new("R_M"), Operand::optional("IMM")]),
            ])),
            ..Instruction::simple("add", "ARITHMETIC", "Integer addition\n")
        };
        let expected = format!(
            "\nInstruction: add\nCategory: ARITHMETIC\n{}\n\
             \nDescription: Integer addition\n\
             \nDocumentation:\n  Summary: Add\n  Flags Affected: OF, SF, ZF, CF\n  Cpu Level: 8086\n\
             \nVariants:\n  1. REG | R_M\n  2. R_M | [IMM]\n\n",
            "-".repeat(60)
        );
        assert_eq!(render_record(&record), expected);
    }

    #[test]
    fn markup_renders_as_its_text() {
        let notes = parse("<notes>See <ref>ADC</ref> for carry-in.</notes>").unwrap();
        let record = Instruction {
            documentation: Some(Documentation {
                notes: Some(TextField::from_element(&notes)),
                extra: vec![parse("<example><code>add rax, 1</code></example>").unwrap()],
                ..Documentation::default()
            }),
            ..Instruction::simple("add", "ARITHMETIC", "Add")
        };
        let out = render_record(&record);
        assert!(out.contains("  Notes: See ADC for carry-in.\n"));
        assert!(out.contains("  Example: add rax, 1\n"));
    }

    #[test]
    fn missing_category_is_unknown() {
        let record = Instruction {
            name: "ud2".to_owned(),
            ..Instruction::default()
        };
        let out = render_record(&record);
        assert!(out.contains("Category: UNKNOWN"));
        assert!(!out.contains("Description:"));
        assert!(!out.contains("Variants:"));
    }

    #[test]
    fn listing_pads_names() {
        let entries = vec![
            ListEntry {
                name: "add".to_owned(),
                category: "ARITHMETIC".to_owned(),
            },
            ListEntry {
                name: "cmpxchg16b".to_owned(),
                category: "UNKNOWN".to_owned(),
            },
        ];
        assert_eq!(
            render_listing(&entries),
            "Found 2 instruction(s):\n\n  add                  [ARITHMETIC]\n  cmpxchg16b           [UNKNOWN]\n"
        );
        assert_eq!(render_listing(&[]), "Found 0 instruction(s):\n\n");
    }

    #[test]
    fn similar_uses_three_character_prefix() {
        let doc = Document::from_unsorted([
            Instruction::simple("mov", "DATA_TRANSFER", "Move"),
            Instruction::simple("movsx", "DATA_TRANSFER", "Move with sign extension"),
            Instruction::simple("add", "ARITHMETIC", "Add"),
        ])
        .unwrap();
        let names: Vec<_> = similar_names(&doc, "MOVX")
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["mov", "movsx"]);
        assert_eq!(title_case("flags-affected"), "Flags Affected");
    }
}
