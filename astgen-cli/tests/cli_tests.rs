//! End-to-end tests for the `astgen` binary.
//!
//! These tests run the built executable and check exit codes, output and
//! the files it leaves behind.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Path to the bundled Lox schema.
fn lox_schema() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../schemas/lox.toml")
}

/// Run the binary inside `cwd` with colours disabled.
fn astgen(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_astgen"))
        .args(args)
        .current_dir(cwd)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run astgen")
}

fn code(output: &Output) -> i32 {
    output.status.code().expect("terminated by signal")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// A workspace with an `out/` directory and the Lox schema as `ast.toml`.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("out")).unwrap();
    fs::copy(lox_schema(), dir.path().join("ast.toml")).unwrap();
    dir
}

// =============================================================================
// Usage
// =============================================================================

#[test]
fn test_missing_output_dir_is_usage_error() {
    let dir = workspace();
    let output = astgen(dir.path(), &[]);
    assert_eq!(code(&output), 64);
    assert!(stderr(&output).contains("OUTPUT_DIR"));
}

#[test]
fn test_extra_argument_is_usage_error() {
    let dir = workspace();
    let output = astgen(dir.path(), &["out", "extra"]);
    assert_eq!(code(&output), 64);
}

#[test]
fn test_dry_run_conflicts_with_check() {
    let dir = workspace();
    let output = astgen(dir.path(), &["--dry-run", "--check", "out"]);
    assert_eq!(code(&output), 64);
}

#[test]
fn test_help_succeeds() {
    let dir = workspace();
    let output = astgen(dir.path(), &["--help"]);
    assert_eq!(code(&output), 0);
    assert!(stdout(&output).contains("--dialect"));
}

#[test]
fn test_unknown_dialect_is_usage_error() {
    let dir = workspace();
    let output = astgen(dir.path(), &["--dialect", "java", "out"]);
    assert_eq!(code(&output), 64);
    assert!(stderr(&output).contains("unknown dialect 'java'"));
}

// =============================================================================
// Generation
// =============================================================================

#[test]
fn test_generate_default_schema() {
    let dir = workspace();
    let output = astgen(dir.path(), &["out"]);

    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    assert!(dir.path().join("out/Expr.h").is_file());
    assert!(dir.path().join("out/Stmt.h").is_file());
    assert!(stdout(&output).contains("Written"));
}

#[test]
fn test_generate_rust_dialect() {
    let dir = workspace();
    let output = astgen(dir.path(), &["-d", "rust", "out"]);

    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    let stmt = fs::read_to_string(dir.path().join("out/stmt.rs")).unwrap();
    assert!(stmt.contains("pub enum Stmt {"));
}

#[test]
fn test_dry_run_prints_without_writing() {
    let dir = workspace();
    let output = astgen(dir.path(), &["--dry-run", "out"]);

    assert_eq!(code(&output), 0);
    assert!(stdout(&output).contains("[dry-run] Would write to"));
    assert!(stdout(&output).contains("struct Binary : public Expr"));
    assert_eq!(fs::read_dir(dir.path().join("out")).unwrap().count(), 0);
}

#[test]
fn test_check_mode() {
    let dir = workspace();
    assert_eq!(code(&astgen(dir.path(), &["out"])), 0);

    let output = astgen(dir.path(), &["--check", "out"]);
    assert_eq!(code(&output), 0);
    assert!(stdout(&output).contains("up to date"));

    fs::write(dir.path().join("out/Expr.h"), "// stale\n").unwrap();
    let output = astgen(dir.path(), &["--check", "out"]);
    assert_eq!(code(&output), 1);
    assert!(stdout(&output).contains("is out of date"));
    assert!(stderr(&output).contains("1 generated file(s) are out of date"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_file_is_picked_up() {
    let dir = workspace();
    fs::write(
        dir.path().join("astgen.toml"),
        "[output]\ndialect = \"cpp\"\nnamespace = \"lox\"\n\n[naming]\naccessor_prefix = \"fetch\"\n",
    )
    .unwrap();

    assert_eq!(code(&astgen(dir.path(), &["out"])), 0);
    let expr = fs::read_to_string(dir.path().join("out/Expr.h")).unwrap();
    assert!(expr.contains("namespace lox"));
    assert!(expr.contains("fetchLeft()"));
}

#[test]
fn test_flags_override_config() {
    let dir = workspace();
    fs::write(dir.path().join("astgen.toml"), "[output]\ndialect = \"cpp\"\n").unwrap();

    assert_eq!(code(&astgen(dir.path(), &["--dialect", "rust", "out"])), 0);
    assert!(dir.path().join("out/expr.rs").is_file());
    assert!(!dir.path().join("out/Expr.h").exists());
}

#[test]
fn test_missing_explicit_config() {
    let dir = workspace();
    let output = astgen(dir.path(), &["-c", "missing.toml", "out"]);
    assert_eq!(code(&output), 78);
    assert!(stderr(&output).contains("Configuration file not found"));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_invalid_schema() {
    let dir = workspace();
    fs::write(
        dir.path().join("bad.toml"),
        "[[base]]\nname = \"Expr\"\n",
    )
    .unwrap();

    let output = astgen(dir.path(), &["-s", "bad.toml", "out"]);
    assert_eq!(code(&output), 65);
    assert!(stderr(&output).contains("Base type 'Expr' declares no variants"));
    assert_eq!(fs::read_dir(dir.path().join("out")).unwrap().count(), 0);
}

#[test]
fn test_missing_schema_file() {
    let dir = workspace();
    let output = astgen(dir.path(), &["-s", "nope.toml", "out"]);
    assert_eq!(code(&output), 65);
}

#[test]
fn test_broken_skeleton() {
    let dir = workspace();
    fs::write(dir.path().join("skel.tmpl"), "{{ nonsense }}\n").unwrap();

    let output = astgen(dir.path(), &["--template", "skel.tmpl", "out"]);
    assert_eq!(code(&output), 70);
    assert!(stderr(&output).contains("Unknown placeholder 'nonsense'"));
    assert_eq!(fs::read_dir(dir.path().join("out")).unwrap().count(), 0);
}

#[test]
fn test_missing_output_directory() {
    let dir = workspace();
    let output = astgen(dir.path(), &["does-not-exist"]);
    assert_eq!(code(&output), 74);
    assert!(stderr(&output).contains("Output directory does not exist"));
    assert!(!dir.path().join("does-not-exist").exists());
}
