//! End-to-end tests of the `tugtype` binary.
//!
//! Tests that need the mypy daemon look for a Python with mypy installed and
//! return early with a message when none is available.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

use tugtype::python::{resolve_python, ResolutionOptions};

// ============================================================================
// Test Infrastructure
// ============================================================================

fn tugtype_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tugtype"))
}

fn run_in(dir: &Path, args: &[&str]) -> Output {
    Command::new(tugtype_binary())
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run tugtype")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({}): {}",
            e,
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

/// A Python interpreter with mypy, if one can be found.
fn find_python_with_mypy() -> Option<PathBuf> {
    resolve_python(&ResolutionOptions::default().require_mypy())
        .ok()
        .map(|env| env.interpreter_path)
}

// ============================================================================
// Without the daemon
// ============================================================================

#[test]
fn missing_target_exits_with_resolution_error() {
    let dir = TempDir::new().unwrap();
    let output = run_in(dir.path(), &["missing.py"]);

    assert_eq!(output.status.code(), Some(3));
    let json = stdout_json(&output);
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 3);
    assert_eq!(json["error"]["file"], "missing.py");
}

#[test]
fn annotated_tree_reports_nothing_to_do() {
    let dir = TempDir::new().unwrap();
    let source = "def f(x: int) -> int:\n    return x\n";
    fs::write(dir.path().join("t.py"), source).unwrap();

    let output = run_in(
        dir.path(),
        &["--python", "/nonexistent/python", "--format", "json", "t.py"],
    );

    assert!(output.status.success(), "{:?}", output);
    let json = stdout_json(&output);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["summary"]["files_scanned"], 1);
    assert_eq!(json["summary"]["candidates"], 0);
    assert_eq!(json["files"][0]["changed"], false);
    assert_eq!(fs::read_to_string(dir.path().join("t.py")).unwrap(), source);
}

#[test]
fn unusable_interpreter_is_reported_when_needed() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("t.py"), "def f():\n    pass\n").unwrap();

    let output = run_in(dir.path(), &["--python", "/nonexistent/python", "t.py"]);

    assert_eq!(output.status.code(), Some(3));
    let json = stdout_json(&output);
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("/nonexistent/python"));
}

#[test]
fn zero_timeout_is_invalid() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("t.py"), "").unwrap();
    let output = run_in(dir.path(), &["--timeout", "0", "t.py"]);
    assert_eq!(output.status.code(), Some(2));
}

// ============================================================================
// With the daemon
// ============================================================================

#[test]
fn annotates_return_type() {
    let Some(python) = find_python_with_mypy() else {
        eprintln!("Skipping test: no Python with mypy available");
        return;
    };
    let dir = TempDir::new().unwrap();
    let t_py = dir.path().join("t.py");
    fs::write(&t_py, "def f():\n    print('hello hello world')\n").unwrap();

    let python = python.to_string_lossy().into_owned();
    let output = run_in(dir.path(), &["--python", &python, "t.py"]);

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(
        fs::read_to_string(&t_py).unwrap(),
        "def f() -> None:\n    print('hello hello world')\n"
    );
}

#[test]
fn resolves_class_under_src_layout() {
    let Some(python) = find_python_with_mypy() else {
        eprintln!("Skipping test: no Python with mypy available");
        return;
    };
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    let t_py = dir.path().join("src/t.py");
    fs::write(&t_py, "class C: pass\n\ndef f():\n    return C()\n").unwrap();

    let dirs = std::env::join_paths([".", "src"]).unwrap();
    let dirs = dirs.to_string_lossy().into_owned();
    let python = python.to_string_lossy().into_owned();
    let output = run_in(
        dir.path(),
        &[
            "--python",
            &python,
            "--application-directories",
            &dirs,
            "src/t.py",
        ],
    );

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(
        fs::read_to_string(&t_py).unwrap(),
        "class C: pass\n\ndef f() -> C:\n    return C()\n"
    );
}

#[test]
fn dry_run_prints_diff_and_keeps_file() {
    let Some(python) = find_python_with_mypy() else {
        eprintln!("Skipping test: no Python with mypy available");
        return;
    };
    let dir = TempDir::new().unwrap();
    let original = "def f():\n    return 1\n";
    let t_py = dir.path().join("t.py");
    fs::write(&t_py, original).unwrap();

    let python = python.to_string_lossy().into_owned();
    let output = run_in(dir.path(), &["--python", &python, "--dry-run", "t.py"]);

    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("+def f() -> int:"), "{}", stdout);
    assert!(stdout.contains("Dry run: would annotate 1 of 1 file(s)"));
    assert_eq!(fs::read_to_string(&t_py).unwrap(), original);
}
