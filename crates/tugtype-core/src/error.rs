//! Error types and error code constants for tugtype.
//!
//! This module provides a unified error type (`TugError`) that bridges
//! domain-specific errors from different subsystems (oracle, interpreter
//! discovery, file writes) into a common format suitable for CLI output.
//!
//! ## Error Code Mapping
//!
//! - `2`: Invalid arguments (bad input from caller)
//! - `3`: Resolution errors (target file or interpreter not found)
//! - `4`: Apply errors (failed to write rewritten files)
//! - `6`: Oracle errors (daemon unreachable, protocol failure)
//! - `10`: Internal errors (bugs, unexpected state)
//!
//! Per-candidate problems (unresolvable definitions, malformed type strings,
//! files with syntax errors) never surface here; they are logged and skipped.

use std::fmt;

use thiserror::Error;

// ============================================================================
// Output Error Codes
// ============================================================================

/// Error codes for JSON output.
///
/// These codes map to CLI exit codes and appear in JSON error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OutputErrorCode {
    /// Invalid arguments from caller (bad input, malformed request).
    InvalidArguments = 2,
    /// Resolution errors (file not found, no interpreter).
    ResolutionError = 3,
    /// Apply errors (failed to write changes).
    ApplyError = 4,
    /// The inference oracle failed or could not be reached.
    OracleError = 6,
    /// Internal errors (bugs, unexpected state).
    InternalError = 10,
}

impl OutputErrorCode {
    /// Get the numeric code value.
    pub fn code(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for OutputErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ============================================================================
// Unified Error Type
// ============================================================================

/// Unified error type for CLI output.
///
/// This is the canonical error type that all subsystem errors are converted to
/// before being rendered. Each variant includes enough context to produce a
/// helpful error message.
#[derive(Debug, Error)]
pub enum TugError {
    /// Invalid arguments from caller.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        message: String,
        details: Option<serde_json::Value>,
    },

    /// Target file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// No usable Python interpreter.
    #[error("python interpreter not found: {message}")]
    InterpreterNotFound { message: String },

    /// Failed to write changes.
    #[error("apply error: {message}")]
    ApplyError {
        message: String,
        file: Option<String>,
    },

    /// The inference oracle failed; the run cannot complete.
    #[error("oracle error: {message}")]
    OracleFailed { message: String },

    /// Internal error (bug or unexpected state).
    #[error("internal error: {message}")]
    InternalError { message: String },
}

impl TugError {
    /// Create an invalid-arguments error without details.
    pub fn invalid_args(message: impl Into<String>) -> Self {
        TugError::InvalidArguments {
            message: message.into(),
            details: None,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        TugError::InternalError {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Code Mapping
// ============================================================================

impl From<&TugError> for OutputErrorCode {
    fn from(err: &TugError) -> Self {
        match err {
            TugError::InvalidArguments { .. } => OutputErrorCode::InvalidArguments,
            TugError::FileNotFound { .. } => OutputErrorCode::ResolutionError,
            TugError::InterpreterNotFound { .. } => OutputErrorCode::ResolutionError,
            TugError::ApplyError { .. } => OutputErrorCode::ApplyError,
            TugError::OracleFailed { .. } => OutputErrorCode::OracleError,
            TugError::InternalError { .. } => OutputErrorCode::InternalError,
        }
    }
}

impl From<TugError> for OutputErrorCode {
    fn from(err: TugError) -> Self {
        OutputErrorCode::from(&err)
    }
}

// ============================================================================
// Bridge: io::Error -> TugError
// ============================================================================

impl From<std::io::Error> for TugError {
    fn from(err: std::io::Error) -> Self {
        TugError::InternalError {
            message: format!("IO error: {}", err),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_exit_statuses() {
        assert_eq!(OutputErrorCode::InvalidArguments.code(), 2);
        assert_eq!(OutputErrorCode::ResolutionError.code(), 3);
        assert_eq!(OutputErrorCode::ApplyError.code(), 4);
        assert_eq!(OutputErrorCode::OracleError.code(), 6);
        assert_eq!(OutputErrorCode::InternalError.code(), 10);
    }

    #[test]
    fn oracle_failure_maps_to_oracle_code() {
        let err = TugError::OracleFailed {
            message: "Daemon is not running".to_string(),
        };
        assert_eq!(OutputErrorCode::from(&err), OutputErrorCode::OracleError);
        assert_eq!(err.to_string(), "oracle error: Daemon is not running");
    }

    #[test]
    fn file_not_found_is_resolution_error() {
        let err = TugError::FileNotFound {
            path: "missing.py".to_string(),
        };
        assert_eq!(OutputErrorCode::from(err), OutputErrorCode::ResolutionError);
    }

    #[test]
    fn io_errors_become_internal() {
        let io = std::io::Error::other("disk on fire");
        let err = TugError::from(io);
        assert!(matches!(err, TugError::InternalError { .. }));
        assert!(err.to_string().contains("disk on fire"));
    }
}
