//! proptest strategies shared by unit tests.

use proptest::collection::{btree_map, vec};
use proptest::option;
use proptest::prelude::*;

use crate::model::{Documentation, Instruction, Operand, TextField, Variant, Variants};
use crate::xml::Element;

fn arb_text() -> impl Strategy<Value = String> {
    "[ -~]{0,16}"
}

fn arb_attributes() -> impl Strategy<Value = Vec<(String, String)>> {
    btree_map("x[a-z]{1,4}", "[a-z0-9]{0,4}", 0..3).prop_map(|m| m.into_iter().collect())
}

fn arb_extra() -> impl Strategy<Value = Element> {
    ("x[a-z]{1,4}", option::of("[a-z ]{1,6}")).prop_map(|(tag, text)| {
        let mut e = Element::new(tag);
        e.text = text;
        e
    })
}

/// Text with inline `<ref>` markup, e.g. `See <ref>ADC</ref> for carry-in.`
fn arb_markup() -> impl Strategy<Value = TextField> {
    (
        arb_attributes(),
        option::of("[a-zA-Z][a-z ,.]{0,8}"),
        vec(
            (option::of("[A-Z]{1,5}"), option::of("[a-z][a-z .]{0,6}")),
            1..3,
        ),
    )
        .prop_map(|(attributes, text, refs)| {
            let mut element = Element::new("field");
            element.attributes = attributes;
            element.text = text;
            for (inner, tail) in refs {
                let mut r = Element::new("ref");
                r.text = inner;
                r.tail = tail;
                element.children.push(r);
            }
            TextField::from_element(&element)
        })
}

fn arb_field() -> impl Strategy<Value = TextField> {
    prop_oneof![
        3 => arb_text().prop_map(TextField::from),
        1 => arb_markup(),
    ]
}

fn arb_documentation() -> impl Strategy<Value = Documentation> {
    (
        arb_attributes(),
        option::of(arb_field()),
        option::of(arb_field()),
        option::of(arb_field()),
        option::of(arb_field()),
        option::of(arb_field()),
        vec(arb_extra(), 0..2),
    )
        .prop_map(
            |(attributes, summary, description, operation, flags_affected, notes, extra)| {
                Documentation {
                    attributes,
                    summary,
                    description,
                    operation,
                    flags_affected,
                    notes,
                    extra,
                }
            },
        )
}

/// Typed variants, sometimes decorated with attributes and children the
/// typed view does not cover.
fn arb_variants() -> impl Strategy<Value = Variants> {
    let list = vec(
        vec(
            ("[A-Z][A-Z0-9_]{0,4}", any::<bool>())
                .prop_map(|(kind, optional)| Operand { kind, optional }),
            0..4,
        )
        .prop_map(Variant::new),
        0..4,
    );
    (list, arb_attributes(), option::of("[0-9]{1,2}"), vec(arb_extra(), 0..2)).prop_map(
        |(list, attributes, size, extra)| {
            let mut element = Variants::from(list).to_element();
            element.attributes = attributes;
            if let Some(size) = size
                && let Some(operand) = element
                    .children
                    .first_mut()
                    .and_then(|v| v.children.first_mut())
            {
                operand.set_attr("size", size);
            }
            element.children.extend(extra);
            Variants::from_element(&element)
        },
    )
}

/// A record with a lower-case name and every optional part exercised.
pub fn arb_instruction() -> impl Strategy<Value = Instruction> {
    (
        "[a-z][a-z0-9]{0,6}",
        option::of("[A-Z_]{1,10}"),
        arb_attributes(),
        option::of(arb_field()),
        option::of(arb_documentation()),
        option::of(arb_variants()),
        vec(arb_extra(), 0..3),
    )
        .prop_map(
            |(name, category, attributes, description, documentation, variants, extra)| {
                Instruction {
                    name,
                    category,
                    attributes,
                    description,
                    documentation,
                    variants,
                    extra,
                }
            },
        )
}
