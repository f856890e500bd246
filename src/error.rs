//! Error types for catalog operations.
//!
//! [`DbError`] is the single error type returned by the library. Each variant
//! names one failure category so callers can match on it (the batch patch path
//! downgrades [`DbError::DuplicateName`] to a result line, everything else is
//! surfaced to the user). Messages are written to be acted on: where there is
//! an obvious next step, the message says what it is.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by catalog operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// The document file does not exist.
    #[error(
        "instruction database not found: {}\n  To fix: pass the right path with --db, or set [database] path in insdb.toml.",
        path.display()
    )]
    DocumentNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// No record with this name exists in the document.
    #[error("instruction '{name}' not found in database.\n  To fix: check available names:\n    insdb list")]
    RecordNotFound {
        /// The name as the caller spelled it.
        name: String,
    },

    /// Input could not be parsed, or did not have the expected shape.
    ///
    /// `scratch` is set when the input came from an edit session: the user's
    /// edited buffer is kept on disk at that path.
    #[error("malformed {origin}: {detail}{}", scratch_hint(scratch.as_ref()))]
    MalformedDocument {
        /// What was being parsed (`"database"`, `"patch input"`, `"edited instruction"`).
        origin: String,
        /// Parser or extraction message.
        detail: String,
        /// Where the user's edits were preserved, if anywhere.
        scratch: Option<PathBuf>,
    },

    /// A record with this name (case-insensitively) already exists.
    #[error("instruction '{name}' already exists in database.\n  To fix: use `insdb edit {name}` or `insdb patch` to change it.")]
    DuplicateName {
        /// The colliding name.
        name: String,
    },

    /// The patch input root is neither `<instruction>` nor `<instructions>`.
    #[error("root element must be <instruction> or <instructions>, got <{tag}>")]
    InvalidPatchRoot {
        /// The unrecognised root tag.
        tag: String,
    },

    /// The user declined a confirmation or closed the input.
    #[error("cancelled by user")]
    UserCancelled,

    /// The editor failed after the scratch file had been modified.
    #[error(
        "edit abandoned: the editor exited unsuccessfully, nothing was written.{}\n  To fix: apply the kept file with `insdb patch -m replace <file>`.",
        scratch_hint(Some(scratch))
    )]
    EditAbandoned {
        /// Where the modified buffer was kept.
        scratch: PathBuf,
    },

    /// The external editor could not be run.
    #[error("could not run editor '{program}': {detail}\n  To fix: set $EDITOR or [editor] command in insdb.toml.")]
    Editor {
        /// The program that was launched.
        program: String,
        /// What went wrong.
        detail: String,
    },

    /// An I/O error against a specific path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl DbError {
    /// Build a [`DbError::MalformedDocument`] with no scratch file attached.
    pub fn malformed(origin: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::MalformedDocument {
            origin: origin.into(),
            detail: detail.into(),
            scratch: None,
        }
    }

    /// Build a [`DbError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn scratch_hint(scratch: Option<&PathBuf>) -> String {
    scratch.map_or_else(String::new, |p| {
        format!("\n  Your changes are saved in: {}", p.display())
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
