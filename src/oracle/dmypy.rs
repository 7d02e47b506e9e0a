//! The mypy daemon as a type oracle.
//!
//! Protocol (all commands run with the project root as working directory):
//!
//! - start: `python -m mypy.dmypy run -- .`
//! - query: `python -m mypy.dmypy suggest --json <path>:<line>`, whose stdout
//!   is a JSON array of `{"signature": {"arg_types": [...], "return_type": ...}}`
//! - stop:  `python -m mypy.dmypy stop`
//!
//! Every command is bounded by the configured timeout. Command output goes
//! to anonymous temporary files rather than pipes: the daemon process forks
//! off `run` and may keep the inherited handles open indefinitely.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};
use tugtype_python::{Candidate, Signature};
use wait_timeout::ChildExt;

use super::{Oracle, OracleError, OracleResult};

/// Default per-command timeout (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Output fragments that mean the daemon itself is gone, as opposed to a
/// definition it cannot answer for.
const DAEMON_FAILURE_MARKERS: &[&str] = &[
    "Daemon is not running",
    "Daemon has died",
    "Daemon crashed",
    "No status file found",
    "Connection refused",
    "Broken pipe",
];

// ============================================================================
// Configuration
// ============================================================================

/// How to run the daemon.
#[derive(Debug, Clone)]
pub struct DmypyConfig {
    /// Interpreter with mypy installed.
    pub python: PathBuf,
    /// Project root; working directory of every daemon command.
    pub root: PathBuf,
    /// Per-command timeout.
    pub timeout: Duration,
}

impl DmypyConfig {
    pub fn new(python: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        DmypyConfig {
            python: python.into(),
            root: root.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Captured result of one daemon command.
#[derive(Debug)]
struct CommandOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl CommandOutput {
    fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

// ============================================================================
// Daemon Handle
// ============================================================================

/// A running mypy daemon.
///
/// Started by [`DaemonHandle::start`]; stopped by [`DaemonHandle::stop`] or,
/// failing that, when the handle is dropped (including during unwinding).
#[derive(Debug)]
pub struct DaemonHandle {
    config: DmypyConfig,
    root_abs: PathBuf,
    running: bool,
}

impl DaemonHandle {
    /// Start (or reuse) the daemon for `config.root` and wait for its initial check.
    pub fn start(config: DmypyConfig) -> OracleResult<Self> {
        let root_abs = std::path::absolute(&config.root)?;
        info!("starting mypy daemon in {}", root_abs.display());
        // Marked running before the command so a timeout still stops it on drop.
        let handle = DaemonHandle {
            config,
            root_abs,
            running: true,
        };

        let args = ["run", "--", "."];
        let output = handle.run(&args)?;
        // `run` exits 1 when the project has type errors; that is not a failure.
        if !matches!(output.status.code(), Some(0) | Some(1)) {
            return Err(handle.failure(&args, &output));
        }
        debug!("mypy daemon ready: {}", output.stdout.trim());
        Ok(handle)
    }

    /// Stop the daemon. Further calls are no-ops.
    pub fn stop(&mut self) -> OracleResult<()> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        let args = ["stop"];
        let output = self.run(&args)?;
        if !output.status.success() {
            return Err(self.failure(&args, &output));
        }
        info!("stopped mypy daemon");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &DmypyConfig {
        &self.config
    }

    /// `path:line` for a candidate, relative to the root when it lies inside it.
    pub fn location(&self, candidate: &Candidate) -> String {
        let path = Path::new(&candidate.module.path);
        let abs = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let shown = match abs.strip_prefix(&self.root_abs) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => abs,
        };
        format!("{}:{}", shown.display(), candidate.line)
    }

    fn describe(&self, args: &[&str]) -> String {
        format!(
            "{} -m mypy.dmypy {}",
            self.config.python.display(),
            args.join(" ")
        )
    }

    fn failure(&self, args: &[&str], output: &CommandOutput) -> OracleError {
        OracleError::DaemonFailed {
            command: self.describe(args),
            status: output.status.to_string(),
            stderr: output.combined().trim().to_string(),
        }
    }

    /// Run one daemon command to completion or timeout.
    fn run(&self, args: &[&str]) -> OracleResult<CommandOutput> {
        let command = self.describe(args);
        debug!("running {}", command);

        let mut stdout = tempfile::tempfile()?;
        let mut stderr = tempfile::tempfile()?;
        let mut child = Command::new(&self.config.python)
            .args(["-m", "mypy.dmypy"])
            .args(args)
            .current_dir(&self.root_abs)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout.try_clone()?))
            .stderr(Stdio::from(stderr.try_clone()?))
            .spawn()
            .map_err(|source| OracleError::Spawn {
                command: command.clone(),
                source,
            })?;

        // OS-level wait, no polling
        let status = match child.wait_timeout(self.config.timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(OracleError::Timeout {
                    command,
                    timeout_secs: self.config.timeout.as_secs(),
                });
            }
        };

        Ok(CommandOutput {
            status,
            stdout: read_back(&mut stdout)?,
            stderr: read_back(&mut stderr)?,
        })
    }
}

impl Drop for DaemonHandle {
    fn drop(&mut self) {
        if self.running {
            if let Err(e) = self.stop() {
                warn!("failed to stop mypy daemon: {}", e);
            }
        }
    }
}

fn read_back(file: &mut File) -> OracleResult<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// ============================================================================
// Oracle
// ============================================================================

/// Queries a running daemon, one candidate at a time.
pub struct DmypyOracle<'d> {
    daemon: &'d DaemonHandle,
}

impl<'d> DmypyOracle<'d> {
    pub fn new(daemon: &'d DaemonHandle) -> Self {
        DmypyOracle { daemon }
    }
}

impl Oracle for DmypyOracle<'_> {
    fn suggest(&mut self, candidate: &Candidate) -> OracleResult<Option<Signature>> {
        let location = self.daemon.location(candidate);
        let args = ["suggest", "--json", location.as_str()];
        let output = self.daemon.run(&args)?;

        if output.status.success() {
            return parse_suggestion(&location, &output.stdout);
        }
        let combined = output.combined();
        if is_daemon_failure(&combined) {
            return Err(self.daemon.failure(&args, &output));
        }
        debug!(
            "{}: daemon has no suggestion for {}: {}",
            location,
            candidate.qualified_name,
            combined.trim()
        );
        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
struct SuggestEntry {
    signature: Signature,
}

/// Parse the stdout of `suggest --json`.
fn parse_suggestion(location: &str, stdout: &str) -> OracleResult<Option<Signature>> {
    let entries: Vec<SuggestEntry> =
        serde_json::from_str(stdout.trim()).map_err(|e| OracleError::Protocol {
            location: location.to_string(),
            message: e.to_string(),
        })?;
    Ok(entries.into_iter().next().map(|entry| entry.signature))
}

fn is_daemon_failure(output: &str) -> bool {
    DAEMON_FAILURE_MARKERS.iter().any(|m| output.contains(m))
}

// ============================================================================
// Tests
// ============================================================================
