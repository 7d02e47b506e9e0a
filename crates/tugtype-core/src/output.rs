//! JSON output types and serialization for CLI responses.
//!
//! ## Design Principles
//!
//! 1. **Status first:** Every response has `status` as first field
//! 2. **Deterministic:** Same input -> same output (field order, array ordering)
//! 3. **Versioned:** Schema version in response enables forward compatibility

use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::error::{OutputErrorCode, TugError};
use crate::patch::ContentHash;

/// Current schema version for all responses.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Annotate Response
// ============================================================================

/// Per-file result of an annotate run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// File path as given on the command line.
    pub path: String,
    /// Dotted module name the file resolved to.
    pub module: String,
    /// Number of under-annotated definitions found by the scanner.
    pub candidates: usize,
    /// Number of definitions the oracle returned a signature for.
    pub suggestions: usize,
    /// Number of `: T` / `-> T` annotations inserted.
    pub annotations_added: usize,
    /// Import lines inserted, in insertion order.
    pub imports_added: Vec<String>,
    /// Whether the file content changed.
    pub changed: bool,
    /// Hash of the original content.
    pub before_hash: ContentHash,
    /// Hash of the new content (present only when `changed`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_hash: Option<ContentHash>,
}

/// Totals across all files of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotateSummary {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub candidates: usize,
    pub annotations_added: usize,
    pub imports_added: usize,
}

impl AnnotateSummary {
    /// Sum up per-file reports.
    pub fn from_reports(reports: &[FileReport]) -> Self {
        AnnotateSummary {
            files_scanned: reports.len(),
            files_changed: reports.iter().filter(|r| r.changed).count(),
            candidates: reports.iter().map(|r| r.candidates).sum(),
            annotations_added: reports.iter().map(|r| r.annotations_added).sum(),
            imports_added: reports.iter().map(|r| r.imports_added.len()).sum(),
        }
    }
}

/// Response for an annotate run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotateResponse {
    /// Status: "ok".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Whether files were left untouched (`--dry-run`).
    pub dry_run: bool,
    /// Totals.
    pub summary: AnnotateSummary,
    /// Per-file results, in path order.
    pub files: Vec<FileReport>,
}

impl AnnotateResponse {
    /// Build a response from per-file reports.
    pub fn new(mut files: Vec<FileReport>, dry_run: bool) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        AnnotateResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            dry_run,
            summary: AnnotateSummary::from_reports(&files),
            files,
        }
    }
}

// ============================================================================
// Error Response
// ============================================================================

/// Error details for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Numeric error code.
    pub code: u8,
    /// Human-readable message.
    pub message: String,
    /// Error-specific structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// File the error relates to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ErrorInfo {
    /// Create from a TugError.
    pub fn from_error(err: &TugError) -> Self {
        let code = OutputErrorCode::from(err).code();
        let message = err.to_string();

        let (details, file) = match err {
            TugError::InvalidArguments { details, .. } => (details.clone(), None),
            TugError::FileNotFound { path } => (None, Some(path.clone())),
            TugError::ApplyError { file, .. } => (None, file.clone()),
            _ => (None, None),
        };

        ErrorInfo {
            code,
            message,
            details,
            file,
        }
    }
}

/// Error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Status: "error".
    pub status: String,
    /// Schema version for compatibility.
    pub schema_version: String,
    /// Error details.
    pub error: ErrorInfo,
}

impl ErrorResponse {
    /// Wrap a TugError.
    pub fn from_error(err: &TugError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Emitters
// ============================================================================

/// Emit a response as pretty-printed JSON to a writer.
///
/// This is the single JSON output path for the CLI.
/// The output is deterministic: same input produces identical bytes.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

// ============================================================================
// Tests
// ============================================================================
