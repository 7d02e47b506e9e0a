//! The annotate driver behind the `tugtype` binary.
//!
//! A run has three stages:
//! 1. Scan: collect target files, resolve each to a module and find the
//!    definitions with incomplete annotations.
//! 2. Query: ask the oracle for a signature at every candidate (one daemon
//!    for the whole run, started only when there is something to ask).
//! 3. Apply: rewrite every file that received suggestions, then write the
//!    changed files back (or render a diff when `dry_run` is set).
//!
//! No file is written until every rewrite has been computed, so an oracle
//! failure leaves the tree untouched.
//!
//! ## Error Handling
//!
//! All functions return `Result<T, TugError>`. Problems local to a single
//! file or candidate are logged and skipped; only failures that make the run
//! meaningless surface as errors.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};
use tugtype_core::diff::generate_unified_diff;
use tugtype_core::error::TugError;
use tugtype_core::fs::atomic_write;
use tugtype_core::output::{AnnotateResponse, FileReport};
use tugtype_core::patch::{ContentHash, OutputEdit};
use tugtype_python::{
    collect_python_files, find_untyped, rewrite_source, Candidate, FileSuggestions, ModuleId,
    ModuleResolver, SuggestionMap,
};

use crate::oracle::dmypy::DEFAULT_TIMEOUT_SECS;
use crate::oracle::{DaemonHandle, DmypyConfig, DmypyOracle, Oracle};
use crate::python::{resolve_python, ResolutionOptions};

// ============================================================================
// Options and Results
// ============================================================================

/// Everything a run needs to know.
#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    /// Files or directories to annotate.
    pub targets: Vec<PathBuf>,
    /// Search roots for module resolution, in priority order.
    pub application_directories: Vec<PathBuf>,
    /// Explicit interpreter; otherwise resolved from the environment.
    pub python: Option<PathBuf>,
    /// Project root the daemon checks and runs in.
    pub root: PathBuf,
    /// Per-command daemon timeout.
    pub timeout: Duration,
    /// Compute the edits but leave files untouched.
    pub dry_run: bool,
}

impl AnnotateOptions {
    /// Options for `targets` with every other setting at its default.
    pub fn new(targets: Vec<PathBuf>) -> Self {
        AnnotateOptions {
            targets,
            application_directories: vec![PathBuf::from(".")],
            python: None,
            root: PathBuf::from("."),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            dry_run: false,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct AnnotateRun {
    /// Per-file reports and totals.
    pub response: AnnotateResponse,
    /// Unified diff of every change, in file order.
    pub diff: String,
}

/// A target file after the scan stage.
#[derive(Debug)]
struct ScannedFile {
    path: PathBuf,
    module: ModuleId,
    source: String,
    candidates: Vec<Candidate>,
}

/// A rewrite computed but not yet written.
struct PendingWrite {
    path: PathBuf,
    source: String,
}

// ============================================================================
// Entry Points
// ============================================================================

/// Annotate the targets using the mypy daemon as the oracle.
///
/// The interpreter is resolved and the daemon started only when the scan
/// finds at least one candidate. The daemon is stopped before any file is
/// written.
pub fn run_annotate(options: &AnnotateOptions) -> Result<AnnotateRun, TugError> {
    let files = scan_targets(options)?;
    let candidates = all_candidates(&files);

    let suggestions = if candidates.is_empty() {
        info!("no under-annotated definitions found");
        SuggestionMap::new()
    } else {
        query_daemon(options, &candidates)?
    };

    apply_suggestions(files, &suggestions, options.dry_run)
}

/// Annotate the targets using any [`Oracle`].
pub fn annotate_with_oracle(
    options: &AnnotateOptions,
    oracle: &mut dyn Oracle,
) -> Result<AnnotateRun, TugError> {
    let files = scan_targets(options)?;
    let candidates = all_candidates(&files);
    let suggestions = oracle.suggest_all(&candidates)?;
    apply_suggestions(files, &suggestions, options.dry_run)
}

// ============================================================================
// Stages
// ============================================================================

/// Collect, read and scan every target file.
///
/// Files that are not UTF-8 or do not parse are skipped with a warning.
fn scan_targets(options: &AnnotateOptions) -> Result<Vec<ScannedFile>, TugError> {
    if options.targets.is_empty() {
        return Err(TugError::invalid_args("no files given"));
    }

    let paths = collect_python_files(options.targets.as_slice())?;
    let cwd = std::env::current_dir()?;
    let resolver = ModuleResolver::new(
        options
            .application_directories
            .iter()
            .map(|dir| dir.to_string_lossy().into_owned()),
    )
    .with_base(cwd.to_string_lossy().into_owned());

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!("{}: not valid UTF-8, skipping", path.display());
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let module = resolver.resolve(&path.to_string_lossy());
        let candidates = match find_untyped(&module, &source) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("{}: {}, skipping", path.display(), e);
                continue;
            }
        };
        debug!(
            "{}: module {}, {} candidate(s)",
            path.display(),
            module.name,
            candidates.len()
        );

        files.push(ScannedFile {
            path,
            module,
            source,
            candidates,
        });
    }
    Ok(files)
}

fn all_candidates(files: &[ScannedFile]) -> Vec<Candidate> {
    files
        .iter()
        .flat_map(|file| file.candidates.iter().cloned())
        .collect()
}

/// Start the daemon, query every candidate, and stop it again.
fn query_daemon(
    options: &AnnotateOptions,
    candidates: &[Candidate],
) -> Result<SuggestionMap, TugError> {
    let resolution = match &options.python {
        Some(path) => ResolutionOptions::with_python(path.clone()),
        None => ResolutionOptions::default(),
    };
    let env = resolve_python(&resolution.require_mypy())?;
    info!(
        "using {} (Python {}, mypy {})",
        env.interpreter().display(),
        env.version,
        env.mypy_version.as_deref().unwrap_or("unknown")
    );

    let config = DmypyConfig::new(env.interpreter(), options.root.clone())
        .with_timeout(options.timeout);
    let mut daemon = DaemonHandle::start(config)?;

    info!("querying {} candidate(s)", candidates.len());
    let suggestions = DmypyOracle::new(&daemon).suggest_all(candidates);
    let stopped = daemon.stop();

    let suggestions = suggestions?;
    stopped?;
    Ok(suggestions)
}

/// Rewrite every scanned file, then write the changed ones.
fn apply_suggestions(
    files: Vec<ScannedFile>,
    suggestions: &SuggestionMap,
    dry_run: bool,
) -> Result<AnnotateRun, TugError> {
    let empty = FileSuggestions::new();
    let mut reports = Vec::with_capacity(files.len());
    let mut edits: Vec<OutputEdit> = Vec::new();
    let mut writes = Vec::new();

    for file in files {
        let file_suggestions = suggestions.get(&file.module).unwrap_or(&empty);
        let outcome = rewrite_source(&file.source, &file.module, file_suggestions)?;
        let changed = outcome.changed();

        reports.push(FileReport {
            path: file.module.path.clone(),
            module: file.module.name.clone(),
            candidates: file.candidates.len(),
            suggestions: file_suggestions.len(),
            annotations_added: outcome.annotations_added,
            imports_added: outcome.imports_added.clone(),
            changed,
            before_hash: ContentHash::compute(file.source.as_bytes()),
            after_hash: changed.then(|| ContentHash::compute(outcome.source.as_bytes())),
        });

        if changed {
            edits.extend(outcome.edits);
            writes.push(PendingWrite {
                path: file.path,
                source: outcome.source,
            });
        }
    }

    if dry_run {
        info!("dry run: {} file(s) would change", writes.len());
    } else {
        for write in &writes {
            atomic_write(&write.path, write.source.as_bytes()).map_err(|e| {
                TugError::ApplyError {
                    message: e.to_string(),
                    file: Some(write.path.display().to_string()),
                }
            })?;
            info!("annotated {}", write.path.display());
        }
    }

    Ok(AnnotateRun {
        response: AnnotateResponse::new(reports, dry_run),
        diff: generate_unified_diff(&edits),
    })
}

// ============================================================================
// Text Output
// ============================================================================

/// Human-readable summary of a run.
pub fn format_summary(response: &AnnotateResponse) -> String {
    let summary = &response.summary;
    let mut out = if response.dry_run {
        format!(
            "Dry run: would annotate {} of {} file(s)\n",
            summary.files_changed, summary.files_scanned
        )
    } else {
        format!(
            "Annotated {} of {} file(s)\n",
            summary.files_changed, summary.files_scanned
        )
    };
    out.push_str(&format!(
        "  {} candidate(s), {} annotation(s), {} import(s)\n",
        summary.candidates, summary.annotations_added, summary.imports_added
    ));

    for file in response.files.iter().filter(|f| f.changed) {
        out.push_str(&format!(
            "  {}: {} annotation(s)",
            file.path, file.annotations_added
        ));
        if !file.imports_added.is_empty() {
            out.push_str(&format!(", {} import(s)", file.imports_added.len()));
        }
        out.push('\n');
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;
    use tempfile::TempDir;
    use tugtype_core::error::OutputErrorCode;
    use tugtype_python::Signature;

    use crate::oracle::{OracleError, OracleResult};

    /// Answers by qualified name and remembers what it was asked.
    struct TableOracle {
        answers: HashMap<&'static str, Signature>,
        asked: Vec<String>,
    }

    impl TableOracle {
        fn new(answers: Vec<(&'static str, Signature)>) -> Self {
            TableOracle {
                answers: answers.into_iter().collect(),
                asked: Vec::new(),
            }
        }
    }

    impl Oracle for TableOracle {
        fn suggest(&mut self, candidate: &Candidate) -> OracleResult<Option<Signature>> {
            self.asked.push(candidate.qualified_name.clone());
            Ok(self.answers.get(candidate.qualified_name.as_str()).cloned())
        }
    }

    struct DeadOracle;

    impl Oracle for DeadOracle {
        fn suggest(&mut self, _candidate: &Candidate) -> OracleResult<Option<Signature>> {
            Err(OracleError::Timeout {
                command: "dmypy suggest".to_string(),
                timeout_secs: 1,
            })
        }
    }

    fn options_for(dir: &Path) -> AnnotateOptions {
        let mut options = AnnotateOptions::new(vec![dir.to_path_buf()]);
        options.application_directories = vec![dir.to_path_buf()];
        options.root = dir.to_path_buf();
        options
    }

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    mod annotate {
        use super::*;

        #[test]
        fn annotates_then_reaches_fixed_point() {
            let dir = TempDir::new().unwrap();
            let util = write(
                dir.path(),
                "pkg/util.py",
                "def scale(x, factor=2):\n    return x * factor\n",
            );
            write(dir.path(), "pkg/__init__.py", "");
            let options = options_for(dir.path());

            let mut oracle = TableOracle::new(vec![(
                "scale",
                Signature::new(["int", "int"], "builtins.int"),
            )]);
            let run = annotate_with_oracle(&options, &mut oracle).unwrap();
            assert_eq!(run.response.summary.files_scanned, 2);
            assert_eq!(run.response.summary.files_changed, 1);
            assert_eq!(run.response.summary.annotations_added, 3);
            assert_eq!(
                fs::read_to_string(&util).unwrap(),
                "def scale(x: int, factor: int=2) -> int:\n    return x * factor\n"
            );

            let mut oracle = TableOracle::new(vec![]);
            let run = annotate_with_oracle(&options, &mut oracle).unwrap();
            assert!(oracle.asked.is_empty());
            assert_eq!(run.response.summary.files_changed, 0);
            assert!(run.diff.is_empty());
        }

        #[test]
        fn module_names_follow_application_directories() {
            let dir = TempDir::new().unwrap();
            write(dir.path(), "src/app/models.py", "class User: pass\n");
            write(
                dir.path(),
                "src/app/views.py",
                "def current():\n    return None\n",
            );
            let mut options = options_for(dir.path());
            options.application_directories = vec![dir.path().to_path_buf(), dir.path().join("src")];

            let mut oracle = TableOracle::new(vec![(
                "current",
                Signature::new(Vec::<String>::new(), "app.models.User"),
            )]);
            let run = annotate_with_oracle(&options, &mut oracle).unwrap();

            let views = run
                .response
                .files
                .iter()
                .find(|f| f.path.ends_with("views.py"))
                .unwrap();
            assert_eq!(views.module, "app.views");
            assert_eq!(views.imports_added, vec!["from app.models import User"]);
            assert_eq!(
                fs::read_to_string(dir.path().join("src/app/views.py")).unwrap(),
                "from app.models import User\ndef current() -> User:\n    return None\n"
            );
        }

        #[test]
        fn dry_run_leaves_files_and_renders_diff() {
            let dir = TempDir::new().unwrap();
            let original = "def f(x):\n    return x\n";
            let path = write(dir.path(), "t.py", original);
            let mut options = options_for(dir.path());
            options.dry_run = true;

            let mut oracle = TableOracle::new(vec![("f", Signature::new(["str"], "str"))]);
            let run = annotate_with_oracle(&options, &mut oracle).unwrap();

            assert_eq!(fs::read_to_string(&path).unwrap(), original);
            assert!(run.response.dry_run);
            assert_eq!(run.response.summary.files_changed, 1);
            assert!(run.diff.contains("-def f(x):\n"));
            assert!(run.diff.contains("+def f(x: str) -> str:\n"));
            assert!(run.response.files[0].after_hash.is_some());
        }

        #[test]
        fn syntax_error_file_is_skipped() {
            let dir = TempDir::new().unwrap();
            write(dir.path(), "bad.py", "def broken(x:\n    pass\n");
            let good = write(dir.path(), "good.py", "def f():\n    pass\n");
            let options = options_for(dir.path());

            let mut oracle =
                TableOracle::new(vec![("f", Signature::new(Vec::<String>::new(), "None"))]);
            let run = annotate_with_oracle(&options, &mut oracle).unwrap();

            assert_eq!(run.response.summary.files_scanned, 1);
            assert_eq!(
                fs::read_to_string(good).unwrap(),
                "def f() -> None:\n    pass\n"
            );
        }
    }

    mod failures {
        use super::*;

        #[test]
        fn missing_target_is_file_not_found() {
            let dir = TempDir::new().unwrap();
            let options = AnnotateOptions::new(vec![dir.path().join("missing.py")]);
            let err = annotate_with_oracle(&options, &mut DeadOracle).unwrap_err();
            assert!(matches!(err, TugError::FileNotFound { .. }));
            assert_eq!(OutputErrorCode::from(&err).code(), 3);
        }

        #[test]
        fn no_targets_is_invalid_arguments() {
            let options = AnnotateOptions::new(Vec::new());
            let err = annotate_with_oracle(&options, &mut DeadOracle).unwrap_err();
            assert_eq!(OutputErrorCode::from(&err).code(), 2);
        }

        #[test]
        fn oracle_failure_writes_nothing() {
            let dir = TempDir::new().unwrap();
            let original = "def f(x):\n    return x\n";
            let path = write(dir.path(), "t.py", original);
            let options = options_for(dir.path());

            let err = annotate_with_oracle(&options, &mut DeadOracle).unwrap_err();
            assert_eq!(OutputErrorCode::from(&err).code(), 6);
            assert_eq!(fs::read_to_string(path).unwrap(), original);
        }

        #[test]
        fn annotated_tree_never_needs_an_interpreter() {
            let dir = TempDir::new().unwrap();
            write(dir.path(), "t.py", "def f(x: int) -> int:\n    return x\n");
            let mut options = options_for(dir.path());
            options.python = Some(dir.path().join("no-such-python"));

            let run = run_annotate(&options).unwrap();
            assert_eq!(run.response.summary.candidates, 0);
            assert_eq!(run.response.summary.files_changed, 0);
        }
    }

    mod text_output {
        use super::*;

        #[test]
        fn summary_lists_changed_files() {
            let report = |path: &str, changed: bool| FileReport {
                path: path.to_string(),
                module: path.trim_end_matches(".py").to_string(),
                candidates: 2,
                suggestions: 2,
                annotations_added: if changed { 3 } else { 0 },
                imports_added: if changed {
                    vec!["from typing import Any".to_string()]
                } else {
                    Vec::new()
                },
                changed,
                before_hash: ContentHash::compute(path.as_bytes()),
                after_hash: None,
            };
            let response = AnnotateResponse::new(vec![report("b.py", false), report("a.py", true)], false);

            let text = format_summary(&response);
            assert!(text.starts_with("Annotated 1 of 2 file(s)\n"));
            assert!(text.contains("  4 candidate(s), 3 annotation(s), 1 import(s)\n"));
            assert!(text.contains("  a.py: 3 annotation(s), 1 import(s)\n"));
            assert!(!text.contains("b.py"));
        }
    }
}
