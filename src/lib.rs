//! Tugtype: mypy-driven type annotation for Python source
//!
//! Finds under-annotated functions and methods, asks the mypy daemon for
//! their signatures, and inserts the suggested annotations (and the imports
//! they need) with minimal, formatting-preserving edits.

// Core infrastructure - re-exported from tugtype-core
pub use tugtype_core::diff;
pub use tugtype_core::error;
pub use tugtype_core::fs;
pub use tugtype_core::output;
pub use tugtype_core::patch;
pub use tugtype_core::text;

// Annotate driver
pub mod cli;

// Inference oracle and interpreter discovery
pub mod oracle;
pub mod python;

// Error bridges - converts subsystem errors to TugError
// (must be after oracle and python modules for From impls to work)
mod error_bridges;
