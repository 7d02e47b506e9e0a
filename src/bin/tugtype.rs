//! Binary entry point for the tugtype CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Annotate every Python file under src/, resolving modules against src/
//! tugtype src --application-directories src
//!
//! # Preview the edits as a unified diff without touching any file
//! tugtype --dry-run pkg/module.py
//!
//! # Machine-readable summary
//! tugtype --format json pkg
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use tugtype::cli::{format_summary, run_annotate, AnnotateOptions};
use tugtype::error::{OutputErrorCode, TugError};
use tugtype::oracle::dmypy::DEFAULT_TIMEOUT_SECS;
use tugtype::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Insert mypy-inferred type annotations into Python source.
///
/// Finds functions and methods with missing parameter or return
/// annotations, asks the mypy daemon for their signatures, and inserts the
/// suggested types in place.
#[derive(Parser, Debug)]
#[command(
    name = "tugtype",
    version,
    about = "Insert mypy-inferred type annotations into Python source"
)]
struct Cli {
    /// Python files or directories to annotate.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Search roots for module names, separated like `PATH` entries.
    #[arg(long, default_value = ".", value_parser = parse_path_list)]
    application_directories: PathList,

    /// Python interpreter with mypy installed.
    #[arg(long)]
    python: Option<PathBuf>,

    /// Project root the mypy daemon runs in (default: current directory).
    #[arg(long)]
    root: Option<PathBuf>,

    /// Timeout in seconds for each mypy daemon command.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Show the edits as a unified diff instead of writing files.
    #[arg(long)]
    dry_run: bool,

    /// Output format for the run summary.
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Log level for tracing output.
    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

/// Parsed `--application-directories` value.
#[derive(Clone, Debug)]
struct PathList(Vec<PathBuf>);

/// Split a platform path list (`:` on Unix, `;` on Windows).
fn parse_path_list(s: &str) -> Result<PathList, String> {
    let dirs: Vec<PathBuf> = std::env::split_paths(s)
        .filter(|p| !p.as_os_str().is_empty())
        .collect();
    if dirs.is_empty() {
        return Err(format!("no directories in '{}'", s));
    }
    Ok(PathList(dirs))
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Output format for the run summary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Human-readable text summary (default).
    #[default]
    Text,
    /// Full JSON response.
    Json,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON, like successful responses
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), TugError> {
    if cli.timeout == 0 {
        return Err(TugError::invalid_args("--timeout must be at least 1 second"));
    }

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(TugError::invalid_args(format!(
            "--root {} is not a directory",
            root.display()
        )));
    }

    let options = AnnotateOptions {
        targets: cli.files,
        application_directories: cli.application_directories.0,
        python: cli.python,
        root,
        timeout: Duration::from_secs(cli.timeout),
        dry_run: cli.dry_run,
    };

    let run = run_annotate(&options)?;

    let mut stdout = io::stdout();
    if options.dry_run && !run.diff.is_empty() && cli.format == OutputFormat::Text {
        write!(stdout, "{}", run.diff).map_err(|e| TugError::internal(e.to_string()))?;
    }
    match cli.format {
        OutputFormat::Json => {
            emit_response(&run.response, &mut stdout)
                .map_err(|e| TugError::internal(e.to_string()))?;
        }
        OutputFormat::Text => {
            write!(stdout, "{}", format_summary(&run.response))
                .map_err(|e| TugError::internal(e.to_string()))?;
        }
    }
    stdout
        .flush()
        .map_err(|e| TugError::internal(e.to_string()))?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
