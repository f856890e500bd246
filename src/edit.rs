//! Interactive edit round-trip.
//!
//! A record is written to a scratch file as a standalone, indented
//! `<instruction>` fragment behind a short framing header, an [`Editor`] is
//! run on that file, and the result is read back and parsed. If anything
//! fails after the editor has returned, or the editor fails after the file
//! was modified, the scratch file is kept on disk and its path is reported
//! so the user's edits are not lost.
//!
//! ```text
//! begin_edit ──► scratch file ──► Editor::edit ──► end_edit ──► catalog::apply_edit
//!                     │                                │ error
//!                     └──── kept on disk ◄─────────────┘
//! ```

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::instrument;

use crate::catalog::{self, EditResult};
use crate::document::Document;
use crate::error::DbError;
use crate::model::{Instruction, ModelError};
use crate::xml;

const ORIGIN: &str = "edited instruction";
const FRAME_COMMENT: &str = "<!-- Edit the instruction below. Save and close to apply changes. -->";
const DEFAULT_EDITOR: &str = "vim";

// ---------------------------------------------------------------------------
// Buffer conversion
// ---------------------------------------------------------------------------

/// Render `record` as scratch-buffer text.
#[must_use]
pub fn begin_edit(record: &Instruction) -> String {
    let mut element = record.to_element();
    xml::indent(&mut element, 0);
    format!(
        "{}\n{FRAME_COMMENT}\n{}\n",
        xml::DECLARATION,
        xml::to_fragment_string(&element)
    )
}

/// Parse an edited scratch buffer back into a record.
///
/// Lines whose trimmed form starts with `<?xml` or `<!--` are dropped first.
///
/// # Errors
/// [`DbError::MalformedDocument`] if what remains is not a single
/// `<instruction>` element with a non-empty `name`.
pub fn end_edit(buffer: &str) -> Result<Instruction, DbError> {
    let body: Vec<&str> = buffer
        .lines()
        .filter(|line| {
            let line = line.trim_start();
            !line.starts_with("<?xml") && !line.starts_with("<!--")
        })
        .collect();
    let element = xml::parse(&body.join("\n")).map_err(|e| DbError::malformed(ORIGIN, e.message))?;
    Instruction::from_element(&element).map_err(|e| match e {
        ModelError::WrongTag { found } => DbError::malformed(
            ORIGIN,
            format!("root element must be <instruction>, got <{found}>"),
        ),
        ModelError::MissingName => DbError::malformed(ORIGIN, "the 'name' attribute is missing or empty"),
    })
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// Something that lets the user modify a file in place.
///
/// Returning `Ok(())` means the edits are complete and the file should be
/// read back.
pub trait Editor {
    /// Edit the file at `path`, blocking until done.
    ///
    /// # Errors
    /// [`DbError::UserCancelled`] if the user abandoned the edit, or
    /// [`DbError::Editor`] if the editor could not be run.
    fn edit(&self, path: &Path) -> Result<(), DbError>;
}

impl<F> Editor for F
where
    F: Fn(&Path) -> Result<(), DbError>,
{
    fn edit(&self, path: &Path) -> Result<(), DbError> {
        self(path)
    }
}

/// An editor process launched with the scratch path as its last argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalEditor {
    program: String,
    args: Vec<String>,
}

impl ExternalEditor {
    /// Pick the editor command: `configured`, then `$VISUAL`, then
    /// `$EDITOR`, then `vim`. The command is split on whitespace.
    #[must_use]
    pub fn resolve(configured: Option<&str>) -> Self {
        let from_env = |key: &str| std::env::var(key).ok();
        let command = configured
            .map(str::to_owned)
            .into_iter()
            .chain(from_env("VISUAL"))
            .chain(from_env("EDITOR"))
            .find(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EDITOR.to_owned());
        Self::from_command_line(&command)
    }

    fn from_command_line(command: &str) -> Self {
        let mut words = command.split_whitespace().map(str::to_owned);
        let program = words.next().unwrap_or_else(|| DEFAULT_EDITOR.to_owned());
        Self {
            program,
            args: words.collect(),
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Editor for ExternalEditor {
    fn edit(&self, path: &Path) -> Result<(), DbError> {
        tracing::debug!(program = %self.program, path = %path.display(), "launching editor");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()
            .map_err(|e| DbError::Editor {
                program: self.program.clone(),
                detail: e.to_string(),
            })?;
        if status.success() {
            Ok(())
        } else {
            tracing::warn!(program = %self.program, %status, "editor exited unsuccessfully; edit abandoned");
            Err(DbError::UserCancelled)
        }
    }
}

// ---------------------------------------------------------------------------
// EditSession
// ---------------------------------------------------------------------------

/// A scratch file holding one record under edit.
///
/// Dropping the session deletes the file; [`EditSession::keep`] leaves it
/// on disk.
#[derive(Debug)]
pub struct EditSession {
    file: NamedTempFile,
}

impl EditSession {
    /// Create a scratch file (`insdb-*.xml` in the temp dir) holding `contents`.
    ///
    /// # Errors
    /// [`DbError::Io`] if the file cannot be created or written.
    pub fn create(contents: &str) -> Result<Self, DbError> {
        let mut file = tempfile::Builder::new()
            .prefix("insdb-")
            .suffix(".xml")
            .tempfile()
            .map_err(|e| DbError::io(std::env::temp_dir(), e))?;
        let written = file.write_all(contents.as_bytes()).and_then(|()| file.flush());
        written.map_err(|e| DbError::io(file.path(), e))?;
        Ok(Self { file })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the current contents by path (editors may replace the file).
    ///
    /// # Errors
    /// [`DbError::Io`] if the file cannot be read.
    pub fn read(&self) -> Result<String, DbError> {
        std::fs::read_to_string(self.path()).map_err(|e| DbError::io(self.path(), e))
    }

    /// Stop managing the file and return its path.
    pub fn keep(self) -> PathBuf {
        let path = self.file.path().to_path_buf();
        match self.file.into_temp_path().keep() {
            Ok(kept) => kept,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not keep scratch file");
                path
            }
        }
    }
}

// ---------------------------------------------------------------------------
// run_edit
// ---------------------------------------------------------------------------

/// Edit the record `name` with `editor` and apply the result to `doc`.
///
/// # Errors
/// - [`DbError::RecordNotFound`] if there is no such record.
/// - [`DbError::EditAbandoned`] if the editor reports
///   [`DbError::UserCancelled`] after the scratch file was modified; the
///   file is kept.
/// - Whatever else the editor returns; the scratch file is discarded.
/// - [`DbError::MalformedDocument`] (with `scratch` set) if the edited
///   buffer does not parse; any other failure after the editor returned
///   also keeps the scratch file.
#[instrument(skip_all, fields(name = name))]
pub fn run_edit(
    doc: Document,
    name: &str,
    editor: &dyn Editor,
) -> Result<(Document, EditResult), DbError> {
    let record = doc.find_by_name(name).ok_or_else(|| DbError::RecordNotFound {
        name: name.to_owned(),
    })?;
    let buffer = begin_edit(record);
    let session = EditSession::create(&buffer)?;
    if let Err(err) = editor.edit(session.path()) {
        let modified = session.read().is_ok_and(|text| text != buffer);
        return Err(match err {
            DbError::UserCancelled if modified => {
                let scratch = session.keep();
                tracing::warn!(path = %scratch.display(), "editor failed; modified instruction kept on disk");
                DbError::EditAbandoned { scratch }
            }
            other => other,
        });
    }

    let outcome = session
        .read()
        .and_then(|text| end_edit(&text))
        .and_then(|edited| catalog::apply_edit(doc, name, edited));

    match outcome {
        Ok(done) => Ok(done),
        Err(err) => {
            let kept = session.keep();
            tracing::warn!(path = %kept.display(), "edited instruction kept on disk");
            Err(match err {
                DbError::MalformedDocument { origin, detail, .. } => DbError::MalformedDocument {
                    origin,
                    detail,
                    scratch: Some(kept),
                },
                other => other,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Documentation, Operand, Variant, Variants};
    use crate::testing::arb_instruction;
    use proptest::prelude::*;

    fn mov() -> Instruction {
        Instruction {
            documentation: Some(Documentation {
                operation: Some("DEST := SRC".into()),
                ..Documentation::default()
            }),
            variants: Some(Variants::from(vec![Variant::new([
                Operand::new("REG"),
                Operand::optional("IMM"),
            ])])),
            ..Instruction::simple("mov", "DATA_TRANSFER", "Move")
        }
    }

    fn doc() -> Document {
        Document::from_unsorted([
            Instruction::simple("add", "ARITHMETIC", "Add"),
            mov(),
        ])
        .unwrap()
    }

    fn rewrite(from: &'static str, to: &'static str) -> impl Fn(&Path) -> Result<(), DbError> {
        move |path: &Path| {
            let text = std::fs::read_to_string(path).unwrap();
            std::fs::write(path, text.replace(from, to)).unwrap();
            Ok(())
        }
    }

    #[test]
    fn buffer_has_framing_and_indented_fragment() {
        let buffer = begin_edit(&Instruction::simple("add", "ARITHMETIC", "Add"));
        let expected = concat!(
            "<?xml version='1.0' encoding='UTF-8'?>\n",
            "<!-- Edit the instruction below. Save and close to apply changes. -->\n",
            "<instruction name=\"add\" category=\"ARITHMETIC\">\n",
            "  <description>Add</description>\n",
            "</instruction>\n",
        );
        assert_eq!(buffer, expected);
    }

    #[test]
    fn round_trip_preserves_record() {
        assert_eq!(end_edit(&begin_edit(&mov())).unwrap(), mov());
    }

    proptest! {
        #[test]
        fn any_record_survives_the_scratch_buffer(record in arb_instruction()) {
            prop_assert_eq!(end_edit(&begin_edit(&record)).unwrap(), record);
        }
    }

    #[test]
    fn end_edit_rejects_wrong_root_and_missing_name() {
        let err = end_edit("<instructions/>").unwrap_err();
        assert!(err.to_string().contains("got <instructions>"));
        let err = end_edit("<instruction category=\"X\"/>").unwrap_err();
        assert!(err.to_string().contains("'name'"));
    }

    #[test]
    fn resolve_splits_configured_command() {
        let editor = ExternalEditor::resolve(Some("code --wait"));
        assert_eq!(editor.program(), "code");
        assert_eq!(editor.args, vec!["--wait".to_owned()]);
    }

    #[test]
    fn unmodified_buffer_is_unchanged() {
        let noop = |_: &Path| -> Result<(), DbError> { Ok(()) };
        let (after, result) = run_edit(doc(), "MOV", &noop).unwrap();
        assert_eq!(result, EditResult::Unchanged);
        assert_eq!(after, doc());
    }

    #[test]
    fn edit_updates_record() {
        let editor = rewrite("DEST := SRC", "DEST := SRC (no flags)");
        let (after, result) = run_edit(doc(), "mov", &editor).unwrap();
        assert_eq!(
            result,
            EditResult::Updated {
                name: "mov".to_owned(),
                renamed_from: None
            }
        );
        let docs = after.find_by_name("mov").unwrap().documentation.clone().unwrap();
        assert_eq!(docs.operation.as_deref(), Some("DEST := SRC (no flags)"));
    }

    #[test]
    fn edit_rename_moves_record() {
        let editor = rewrite("name=\"add\"", "name=\"ZERO\"");
        let (after, result) = run_edit(doc(), "add", &editor).unwrap();
        assert_eq!(
            result,
            EditResult::Updated {
                name: "zero".to_owned(),
                renamed_from: Some("add".to_owned())
            }
        );
        assert_eq!(after.names().collect::<Vec<_>>(), vec!["mov", "zero"]);
    }

    #[test]
    fn malformed_edit_keeps_scratch_file() {
        let editor = rewrite("</instruction>", "");
        let err = run_edit(doc(), "mov", &editor).unwrap_err();
        let path = match err {
            DbError::MalformedDocument {
                scratch: Some(path), ..
            } => path,
            other => panic!("expected a kept scratch file, got {other:?}"),
        };
        let kept = std::fs::read_to_string(&path).unwrap();
        assert!(kept.contains("DEST := SRC"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn cancelled_editor_aborts() {
        let cancel = |_: &Path| -> Result<(), DbError> { Err(DbError::UserCancelled) };
        assert!(matches!(
            run_edit(doc(), "mov", &cancel),
            Err(DbError::UserCancelled)
        ));
    }

    #[test]
    fn failing_editor_keeps_modified_scratch_file() {
        let save_then_fail = |path: &Path| -> Result<(), DbError> {
            rewrite("Move", "Copy")(path)?;
            Err(DbError::UserCancelled)
        };
        let path = match run_edit(doc(), "mov", &save_then_fail) {
            Err(DbError::EditAbandoned { scratch }) => scratch,
            other => panic!("expected a kept scratch file, got {other:?}"),
        };
        let kept = std::fs::read_to_string(&path).unwrap();
        assert!(kept.contains("<description>Copy</description>"));
        assert_eq!(end_edit(&kept).unwrap().description.as_deref(), Some("Copy"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_record_is_not_found() {
        let noop = |_: &Path| -> Result<(), DbError> { Ok(()) };
        assert!(matches!(
            run_edit(doc(), "jmp", &noop),
            Err(DbError::RecordNotFound { .. })
        ));
    }
}
