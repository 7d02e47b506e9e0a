//! Python environment resolution.
//!
//! Finds the interpreter used to run the mypy daemon.
//!
//! ## Resolution Order
//!
//! 1. Explicit `--python` flag (CLI override)
//! 2. `$TUGTYPE_PYTHON` environment variable
//! 3. `$VIRTUAL_ENV/bin/python` (user's active venv)
//! 4. `python3` / `python` from `$PATH` (fallback)
//!
//! ## Validation
//!
//! - Python version >= 3.9
//! - mypy importable (when `require_mypy` is set)

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Interpreter names tried in each location, in order.
const PYTHON_NAMES: &[&str] = &["python3", "python"];

/// Directory holding executables inside a virtual environment.
#[cfg(windows)]
const VENV_BIN_DIR: &str = "Scripts";
#[cfg(not(windows))]
const VENV_BIN_DIR: &str = "bin";

/// Environment variable naming an interpreter explicitly.
pub const PYTHON_ENV_VAR: &str = "TUGTYPE_PYTHON";

// ============================================================================
// Error Types
// ============================================================================

/// A single step in the resolution process.
#[derive(Debug, Clone)]
pub struct ResolutionStep {
    /// Source being checked (e.g., "$TUGTYPE_PYTHON", "$PATH").
    pub source: String,
    /// What was found (if anything).
    pub found: Option<PathBuf>,
    /// Why this step failed.
    pub failure_reason: String,
}

impl ResolutionStep {
    /// A source that was not configured (env var not set, etc).
    pub fn not_set(source: impl Into<String>) -> Self {
        ResolutionStep {
            source: source.into(),
            found: None,
            failure_reason: "not set".to_string(),
        }
    }

    /// A source that was configured but held no interpreter.
    pub fn not_found(source: impl Into<String>) -> Self {
        ResolutionStep {
            source: source.into(),
            found: None,
            failure_reason: "not found".to_string(),
        }
    }

    /// An interpreter that was found but rejected.
    pub fn rejected(source: impl Into<String>, path: PathBuf, reason: impl Into<String>) -> Self {
        ResolutionStep {
            source: source.into(),
            found: Some(path),
            failure_reason: reason.into(),
        }
    }
}

impl std::fmt::Display for ResolutionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: ", self.source)?;
        if let Some(ref path) = self.found {
            write!(f, "found {} - ", path.display())?;
        }
        write!(f, "{}", self.failure_reason)
    }
}

/// Errors that can occur during Python environment resolution.
#[derive(Debug, Error)]
pub enum PythonEnvError {
    /// No usable Python interpreter found.
    #[error("{}", format_python_not_found_error(.trace))]
    PythonNotFound { trace: Vec<ResolutionStep> },

    /// Python version is too old.
    #[error("Python version {found} is too old (minimum: {minimum})")]
    VersionTooOld { found: String, minimum: String },

    /// mypy is not importable from the interpreter.
    #[error("mypy is not installed for {}; run: {} -m pip install mypy", .python_path.display(), .python_path.display())]
    MypyNotAvailable { python_path: PathBuf },

    /// Failed to execute Python.
    #[error("failed to execute Python at {path}: {reason}")]
    ExecutionFailed { path: PathBuf, reason: String },

    /// Invalid Python version string.
    #[error("invalid Python version string: {version}")]
    InvalidVersion { version: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Format the "Python not found" error with the steps that were tried.
fn format_python_not_found_error(trace: &[ResolutionStep]) -> String {
    let mut msg = String::from("no usable Python interpreter found\n\n");
    msg.push_str("tugtype runs the mypy daemon and needs Python 3.9+ with mypy installed.\n\n");
    if !trace.is_empty() {
        msg.push_str("Resolution attempted:\n");
        for (i, step) in trace.iter().enumerate() {
            msg.push_str(&format!("  {}. {}\n", i + 1, step));
        }
        msg.push('\n');
    }
    msg.push_str("Remediation:\n");
    msg.push_str("  a) Activate a virtualenv with mypy installed\n");
    msg.push_str("  b) Or: export TUGTYPE_PYTHON=/path/to/python3\n");
    msg.push_str("  c) Or: tugtype --python /path/to/python3 ...\n");
    msg
}

/// Result type for Python environment operations.
pub type PythonEnvResult<T> = Result<T, PythonEnvError>;

// ============================================================================
// Python Version
// ============================================================================

/// Parsed Python version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PythonVersion {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        PythonVersion {
            major,
            minor,
            patch,
        }
    }

    /// Minimum required Python version (3.9.0).
    pub fn minimum() -> Self {
        PythonVersion::new(3, 9, 0)
    }

    /// Parse a version string like "3.11.4" or "Python 3.11.4".
    pub fn parse(version_str: &str) -> PythonEnvResult<Self> {
        let version_str = version_str
            .strip_prefix("Python ")
            .unwrap_or(version_str)
            .trim();
        let invalid = || PythonEnvError::InvalidVersion {
            version: version_str.to_string(),
        };

        let parts: Vec<&str> = version_str.split('.').collect();
        if parts.len() < 2 {
            return Err(invalid());
        }
        let major = parts[0].parse::<u32>().map_err(|_| invalid())?;
        let minor = parts[1].parse::<u32>().map_err(|_| invalid())?;

        // Patch might carry a suffix like "3.11.4+" or "3.13.0rc1"
        let patch_digits: String = parts
            .get(2)
            .unwrap_or(&"0")
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let patch = patch_digits.parse::<u32>().unwrap_or(0);

        Ok(PythonVersion::new(major, minor, patch))
    }

    /// Check if this version meets the minimum requirement.
    pub fn meets_minimum(&self) -> bool {
        *self >= Self::minimum()
    }
}

impl std::fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// ============================================================================
// Resolution Source
// ============================================================================

/// Where the Python interpreter was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// From explicit `--python` flag.
    CliFlag,
    /// From `$TUGTYPE_PYTHON`.
    EnvVar,
    /// From `$VIRTUAL_ENV`.
    VirtualEnv,
    /// From `$PATH`.
    Path,
}

impl std::fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionSource::CliFlag => write!(f, "--python flag"),
            ResolutionSource::EnvVar => write!(f, "${}", PYTHON_ENV_VAR),
            ResolutionSource::VirtualEnv => write!(f, "$VIRTUAL_ENV"),
            ResolutionSource::Path => write!(f, "$PATH"),
        }
    }
}

// ============================================================================
// Python Environment
// ============================================================================

/// A validated Python interpreter.
#[derive(Debug, Clone)]
pub struct PythonEnv {
    /// Absolute path to the interpreter.
    pub interpreter_path: PathBuf,
    /// Interpreter version.
    pub version: PythonVersion,
    /// mypy version, when it was checked and found.
    pub mypy_version: Option<String>,
    /// Where the interpreter was found.
    pub source: ResolutionSource,
}

impl PythonEnv {
    pub fn interpreter(&self) -> &Path {
        &self.interpreter_path
    }
}

/// Options for resolving the Python environment.
#[derive(Debug, Clone, Default)]
pub struct ResolutionOptions {
    /// Explicit Python path (from --python flag).
    pub python_path: Option<PathBuf>,
    /// Require mypy to be importable.
    pub require_mypy: bool,
}

impl ResolutionOptions {
    /// Create options with explicit Python path.
    pub fn with_python(path: impl Into<PathBuf>) -> Self {
        ResolutionOptions {
            python_path: Some(path.into()),
            require_mypy: false,
        }
    }

    /// Require mypy to be installed.
    pub fn require_mypy(mut self) -> Self {
        self.require_mypy = true;
        self
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the Python interpreter.
///
/// An explicit `--python` path is authoritative: if it fails validation
/// the error is returned instead of falling back to other sources.
pub fn resolve_python(options: &ResolutionOptions) -> PythonEnvResult<PythonEnv> {
    if let Some(ref path) = options.python_path {
        let canonical = path
            .canonicalize()
            .map_err(|_| PythonEnvError::ExecutionFailed {
                path: path.clone(),
                reason: "path does not exist".to_string(),
            })?;
        return validate_python(canonical, ResolutionSource::CliFlag, options);
    }

    let mut trace = vec![ResolutionStep::not_set("--python flag")];

    match std::env::var_os(PYTHON_ENV_VAR) {
        Some(value) => {
            let path = PathBuf::from(value);
            if let Some(env) = try_candidate(&path, ResolutionSource::EnvVar, options, &mut trace) {
                return Ok(env);
            }
        }
        None => trace.push(ResolutionStep::not_set(format!("${}", PYTHON_ENV_VAR))),
    }

    match std::env::var_os("VIRTUAL_ENV") {
        Some(venv) => {
            let bin_dir = PathBuf::from(venv).join(VENV_BIN_DIR);
            let mut found_any = false;
            for name in PYTHON_NAMES {
                let path = bin_dir.join(executable_name(name));
                if path.exists() {
                    found_any = true;
                    if let Some(env) =
                        try_candidate(&path, ResolutionSource::VirtualEnv, options, &mut trace)
                    {
                        return Ok(env);
                    }
                }
            }
            if !found_any {
                trace.push(ResolutionStep::not_found("$VIRTUAL_ENV"));
            }
        }
        None => trace.push(ResolutionStep::not_set("$VIRTUAL_ENV")),
    }

    let mut found_any = false;
    for name in PYTHON_NAMES {
        if let Ok(path) = which::which(name) {
            found_any = true;
            if let Some(env) = try_candidate(&path, ResolutionSource::Path, options, &mut trace) {
                return Ok(env);
            }
        }
    }
    if !found_any {
        trace.push(ResolutionStep::not_found("$PATH (python3/python)"));
    }

    Err(PythonEnvError::PythonNotFound { trace })
}

/// Validate one candidate, recording the failure in `trace`.
fn try_candidate(
    path: &Path,
    source: ResolutionSource,
    options: &ResolutionOptions,
    trace: &mut Vec<ResolutionStep>,
) -> Option<PythonEnv> {
    let canonical = match path.canonicalize() {
        Ok(canonical) => canonical,
        Err(_) => {
            trace.push(ResolutionStep::rejected(
                source.to_string(),
                path.to_path_buf(),
                "path does not exist",
            ));
            return None;
        }
    };
    if !is_executable(&canonical) {
        trace.push(ResolutionStep::rejected(
            source.to_string(),
            canonical,
            "not executable",
        ));
        return None;
    }
    match validate_python(canonical.clone(), source, options) {
        Ok(env) => Some(env),
        Err(e) => {
            debug!("rejected {} from {}: {}", canonical.display(), source, e);
            trace.push(ResolutionStep::rejected(
                source.to_string(),
                canonical,
                e.to_string(),
            ));
            None
        }
    }
}

/// Check version (and mypy, if required) of an interpreter.
fn validate_python(
    path: PathBuf,
    source: ResolutionSource,
    options: &ResolutionOptions,
) -> PythonEnvResult<PythonEnv> {
    let version = get_python_version(&path)?;
    if !version.meets_minimum() {
        return Err(PythonEnvError::VersionTooOld {
            found: version.to_string(),
            minimum: PythonVersion::minimum().to_string(),
        });
    }

    let mypy_version = if options.require_mypy {
        match check_mypy(&path)? {
            Some(v) => Some(v),
            None => return Err(PythonEnvError::MypyNotAvailable { python_path: path }),
        }
    } else {
        None
    };

    info!(
        "using Python {} at {} (from {})",
        version,
        path.display(),
        source
    );
    Ok(PythonEnv {
        interpreter_path: path,
        version,
        mypy_version,
        source,
    })
}

/// Get Python version by running `python --version`.
pub fn get_python_version(python_path: &Path) -> PythonEnvResult<PythonVersion> {
    let output = Command::new(python_path)
        .arg("--version")
        .output()
        .map_err(|e| PythonEnvError::ExecutionFailed {
            path: python_path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(PythonEnvError::ExecutionFailed {
            path: python_path.to_path_buf(),
            reason: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    // Python --version writes to stdout (3.4+) or stderr (older)
    let version_output = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr)
    } else {
        String::from_utf8_lossy(&output.stdout)
    };

    PythonVersion::parse(version_output.trim())
}

/// Return the installed mypy version, or `None` when mypy cannot be imported.
pub fn check_mypy(python_path: &Path) -> PythonEnvResult<Option<String>> {
    let output = Command::new(python_path)
        .args(["-c", "import mypy.version; print(mypy.version.__version__)"])
        .output()
        .map_err(|e| PythonEnvError::ExecutionFailed {
            path: python_path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if output.status.success() {
        Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
    } else {
        Ok(None)
    }
}

fn executable_name(name: &str) -> String {
    if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// Check if a path is executable.
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}

// ============================================================================
// Tests
// ============================================================================
