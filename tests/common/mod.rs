//! Shared test helpers for insdb integration tests.
//!
//! All tests use temp directories, so there are no side effects on the real
//! repo. Each test gets its own working directory with a database at the
//! default location via `setup_db()`.

#![allow(dead_code)]

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Database location relative to the working directory.
pub const DB_PATH: &str = "src/main/resources/nasm/instructions.xml";

/// A small catalog: add, mov, xor.
pub const SAMPLE_DB: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<instructions>
  <instruction name="add" category="ARITHMETIC">
    <description>Add</description>
    <documentation>
      <notes>old</notes>
    </documentation>
    <variants>
      <variant>
        <operand type="REG" />
        <operand type="R_M" />
      </variant>
    </variants>
  </instruction>
  <instruction name="mov" category="DATA_TRANSFER">
    <description>Move</description>
  </instruction>
  <instruction name="xor" category="LOGICAL">
    <description>Exclusive or</description>
  </instruction>
</instructions>
"#;

/// Create a temp working directory holding `SAMPLE_DB` at [`DB_PATH`].
pub fn setup_db() -> TempDir {
    setup_db_with(SAMPLE_DB)
}

/// Create a temp working directory holding `contents` at [`DB_PATH`].
pub fn setup_db_with(contents: &str) -> TempDir {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = db_path(dir.path());
    std::fs::create_dir_all(path.parent().expect("db path has a parent"))
        .expect("failed to create db directory");
    std::fs::write(&path, contents).expect("failed to write db");
    dir
}

/// Absolute path of the database inside `dir`.
pub fn db_path(dir: &Path) -> PathBuf {
    dir.join(DB_PATH)
}

/// Current database text.
pub fn read_db(dir: &Path) -> String {
    std::fs::read_to_string(db_path(dir)).expect("failed to read db")
}

/// Record names in file order, scraped from the database text.
pub fn stored_names(dir: &Path) -> Vec<String> {
    read_db(dir)
        .lines()
        .filter_map(|line| line.trim_start().strip_prefix("<instruction name=\""))
        .filter_map(|rest| rest.split('"').next())
        .map(str::to_owned)
        .collect()
}

fn command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_insdb"));
    cmd.args(args)
        .current_dir(dir)
        .env_remove("INSDB_PATH")
        .env_remove("INSDB_CONFIG")
        .env_remove("INSDB_LOG_FORMAT")
        .env_remove("VISUAL")
        .env("INSDB_LOG", "warn")
        .env("EDITOR", "true");
    cmd
}

/// Run insdb in `dir`.
pub fn insdb_in(dir: &Path, args: &[&str]) -> Output {
    command(dir, args).output().expect("failed to execute insdb")
}

/// Run insdb in `dir` with `stdin` piped in.
pub fn insdb_with_stdin(dir: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = command(dir, args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn insdb");
    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(stdin.as_bytes())
        .expect("failed to write stdin");
    child.wait_with_output().expect("failed to wait for insdb")
}

/// Run insdb and assert it succeeds. Returns stdout as string.
pub fn insdb_ok(dir: &Path, args: &[&str]) -> String {
    check_ok(args, &insdb_in(dir, args))
}

/// Run insdb and assert it fails. Returns stderr as string.
pub fn insdb_fails(dir: &Path, args: &[&str]) -> String {
    check_fails(args, &insdb_in(dir, args))
}

/// Assert `out` is a success. Returns stdout as string.
pub fn check_ok(args: &[&str], out: &Output) -> String {
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        out.status.success(),
        "insdb {} failed:\nstdout: {stdout}\nstderr: {stderr}",
        args.join(" "),
    );
    stdout.to_string()
}

/// Assert `out` is a failure. Returns stderr as string.
pub fn check_fails(args: &[&str], out: &Output) -> String {
    let stderr = String::from_utf8_lossy(&out.stderr);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        !out.status.success(),
        "insdb {} should have failed:\nstdout: {stdout}\nstderr: {stderr}",
        args.join(" "),
    );
    stderr.to_string()
}
