//! Interactive record collection for `add-complex`.
//!
//! Generic over the input and output streams so the whole dialogue can be
//! driven from a script in tests.

use std::io::{BufRead, Write};

use crate::error::DbError;
use crate::model::{DocField, Documentation, Instruction, Operand, Variant, Variants};

const RULE_WIDTH: usize = 60;

/// Collect a record interactively.
///
/// `name` and `category` skip their prompts when given. Required fields
/// are asked again until non-empty. The returned record has a lower-cased
/// name and an upper-cased category.
///
/// # Errors
/// - [`DbError::UserCancelled`] if the user declines the confirmation or
///   input ends early.
/// - [`DbError::Io`] if the streams fail.
pub fn collect_instruction<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    name: Option<&str>,
    category: Option<&str>,
) -> Result<Instruction, DbError> {
    let mut dialogue = Dialogue { input, output };

    dialogue.say("Add Complex Instruction - Interactive Mode")?;
    dialogue.say(&"=".repeat(RULE_WIDTH))?;

    let name = match name.filter(|n| !n.trim().is_empty()) {
        Some(n) => n.trim().to_owned(),
        None => dialogue.ask_required("Instruction name")?,
    };
    let category = match category.filter(|c| !c.trim().is_empty()) {
        Some(c) => c.trim().to_owned(),
        None => dialogue.ask_required("Category (ARITHMETIC/LOGICAL/DATA_TRANSFER/CONTROL/SYSTEM/etc.)")?,
    };
    let description = dialogue.ask_required("Short description")?;

    dialogue.say("\nDocumentation (press Enter to skip any field):")?;
    let mut documentation = Documentation::default();
    for field in DocField::ALL {
        let answer = dialogue.ask(&format!("  {}", doc_prompt(field)))?;
        if !answer.is_empty() {
            *documentation.field_mut(field) = Some(answer.into());
        }
    }

    dialogue.say("\nVariants (press Enter when done):")?;
    dialogue.say("Available operand types: REG, R_M, IMM, MEM, LABEL, etc.")?;
    let mut variants = Vec::new();
    loop {
        dialogue.say(&format!("\n  Variant {}:", variants.len() + 1))?;
        let mut operands = Vec::new();
        loop {
            let op = dialogue.ask(&format!(
                "    Operand {} type (or Enter to finish variant)",
                operands.len() + 1
            ))?;
            if op.is_empty() {
                break;
            }
            operands.push(Operand::new(op.to_uppercase()));
        }
        if operands.is_empty() {
            break;
        }
        variants.push(Variant::new(operands));
    }

    let record = Instruction {
        documentation: (!documentation.is_empty()).then_some(documentation),
        variants: (!variants.is_empty()).then(|| Variants::from(variants)),
        ..Instruction::simple(&name, &category, description)
    };

    dialogue.summarize(&record)?;
    let confirm = dialogue.ask("\nAdd this instruction? (y/n)")?;
    if confirm.eq_ignore_ascii_case("y") {
        Ok(record)
    } else {
        dialogue.say("Cancelled.")?;
        Err(DbError::UserCancelled)
    }
}

const fn doc_prompt(field: DocField) -> &'static str {
    match field {
        DocField::Summary => "Summary",
        DocField::Description => "Detailed description",
        DocField::Operation => "Operation (e.g., 'DEST := SRC')",
        DocField::FlagsAffected => "Flags affected (e.g., 'OF, SF, ZF, CF')",
        DocField::Notes => "Notes",
    }
}

// ---------------------------------------------------------------------------
// Dialogue
// ---------------------------------------------------------------------------

struct Dialogue<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<R: BufRead, W: Write> Dialogue<'_, R, W> {
    fn say(&mut self, line: &str) -> Result<(), DbError> {
        writeln!(self.output, "{line}").map_err(stdout_error)
    }

    /// Prompt once; the answer is trimmed. End of input cancels.
    fn ask(&mut self, prompt: &str) -> Result<String, DbError> {
        write!(self.output, "{prompt}: ")
            .and_then(|()| self.output.flush())
            .map_err(stdout_error)?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| DbError::io("<stdin>", e))?;
        if read == 0 {
            return Err(DbError::UserCancelled);
        }
        Ok(line.trim().to_owned())
    }

    fn ask_required(&mut self, prompt: &str) -> Result<String, DbError> {
        loop {
            let answer = self.ask(prompt)?;
            if !answer.is_empty() {
                return Ok(answer);
            }
            self.say("  A value is required.")?;
        }
    }

    fn summarize(&mut self, record: &Instruction) -> Result<(), DbError> {
        self.say(&format!("\n{}", "=".repeat(RULE_WIDTH)))?;
        self.say(&format!("Adding instruction: {}", record.name))?;
        self.say(&format!("Category: {}", record.category_or_unknown()))?;
        self.say(&format!(
            "Description: {}",
            record.description.as_deref().unwrap_or_default()
        ))?;
        if let Some(doc) = &record.documentation {
            let present: Vec<&str> = DocField::ALL
                .into_iter()
                .filter(|f| doc.field(*f).is_some())
                .map(DocField::tag)
                .collect();
            self.say(&format!("Documentation fields: {}", present.join(", ")))?;
        }
        if let Some(variants) = &record.variants {
            self.say(&format!("Variants: {}", variants.len()))?;
            for (i, variant) in variants.list().iter().enumerate() {
                self.say(&format!("  {}. {variant}", i + 1))?;
            }
        }
        Ok(())
    }
}

fn stdout_error(e: std::io::Error) -> DbError {
    DbError::io("<stdout>", e)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
