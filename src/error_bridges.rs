//! Error bridge implementations for subsystem errors.
//!
//! This module provides `impl From<X> for TugError` conversions from the
//! oracle and interpreter discovery errors to the unified `TugError` type.
//! The file discovery and rewriting bridges live next to their error types
//! in `tugtype-python` (orphan rule); they are exercised by the tests here.
//!
//! These bridges live in the root crate rather than `tugtype-core` because
//! they depend on types (oracle, Python environment) that are not part of core.

use tugtype_core::error::TugError;
use crate::oracle::OracleError;
use crate::python::PythonEnvError;

// ============================================================================
// Bridge: OracleError -> TugError
// ============================================================================

impl From<OracleError> for TugError {
    fn from(err: OracleError) -> Self {
        TugError::OracleFailed {
            message: err.to_string(),
        }
    }
}

// ============================================================================
// Bridge: PythonEnvError -> TugError
// ============================================================================

impl From<PythonEnvError> for TugError {
    fn from(err: PythonEnvError) -> Self {
        match err {
            PythonEnvError::Io(io_err) => TugError::InternalError {
                message: format!("IO error: {}", io_err),
            },
            other => TugError::InterpreterNotFound {
                message: other.to_string(),
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
