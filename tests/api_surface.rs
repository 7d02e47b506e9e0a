//! Compile-only test to verify public API surface.
//!
//! This file serves as a compile-time contract for the public API.
//! If this file fails to compile, the public API has regressed.
//!
//! Run with: cargo test -- api_surface

// Allow unused imports - this test is about compile-time verification, not runtime usage
#![allow(unused_imports)]

// ============================================================================
// Core Infrastructure Types
// ============================================================================

use tugtype::diff::generate_unified_diff;
use tugtype::error::{OutputErrorCode, TugError};
use tugtype::fs::atomic_write;
use tugtype::output::{
    emit_response, AnnotateResponse, AnnotateSummary, ErrorInfo, ErrorResponse, FileReport,
    SCHEMA_VERSION,
};
use tugtype::patch::{ContentHash, OutputEdit, Span};
use tugtype::text::{line_of_offset, line_start};

// ============================================================================
// Driver, Oracle and Interpreter Types
// ============================================================================

use tugtype::cli::{annotate_with_oracle, format_summary, run_annotate, AnnotateOptions, AnnotateRun};
use tugtype::oracle::dmypy::DEFAULT_TIMEOUT_SECS;
use tugtype::oracle::{
    DaemonHandle, DmypyConfig, DmypyOracle, Oracle, OracleError, OracleResult,
};
use tugtype::python::{resolve_python, PythonEnv, PythonEnvError, ResolutionOptions, ResolutionSource};

// ============================================================================
// Language Crate Types
// ============================================================================

use tugtype_python::{
    add_imports, collect_python_files, find_untyped, normalize_type, rewrite_source,
    Candidate, FileSuggestions, ModuleId, ModuleResolver, NormalizeContext, Signature,
    SuggestionMap,
};

#[test]
fn api_surface_compiles() {
    // This test exists only to verify the imports above compile.
}
