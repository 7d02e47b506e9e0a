//! Type-inference oracles.
//!
//! An [`Oracle`] answers "what signature does this definition have?" for
//! each scanned [`Candidate`]. The production oracle is the mypy daemon
//! ([`dmypy`]); tests substitute in-memory tables.

pub mod dmypy;

use std::io;

use thiserror::Error;
use tracing::debug;
use tugtype_python::{Candidate, Signature, SuggestionMap};

pub use dmypy::{DaemonHandle, DmypyConfig, DmypyOracle};

// ============================================================================
// Error Types
// ============================================================================

/// Failures of the oracle itself. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The daemon process could not be launched.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The daemon reported a failure of its own.
    #[error("`{command}` failed ({status}): {stderr}")]
    DaemonFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// A daemon command did not finish in time.
    #[error("`{command}` timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },

    /// The daemon answered with something other than the expected JSON.
    #[error("unexpected reply for {location}: {message}")]
    Protocol { location: String, message: String },

    /// IO error talking to the daemon.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for oracle operations.
pub type OracleResult<T> = Result<T, OracleError>;

// ============================================================================
// Oracle Trait
// ============================================================================

/// A source of suggested signatures.
pub trait Oracle {
    /// Suggest a signature for one candidate.
    ///
    /// `Ok(None)` means the oracle has no answer for this definition; the
    /// candidate is left as it is.
    fn suggest(&mut self, candidate: &Candidate) -> OracleResult<Option<Signature>>;

    /// Query every candidate, in order, and group the answers by module and line.
    fn suggest_all(&mut self, candidates: &[Candidate]) -> OracleResult<SuggestionMap> {
        let mut map = SuggestionMap::new();
        for candidate in candidates {
            match self.suggest(candidate)? {
                Some(signature) => {
                    map.entry(candidate.module.clone())
                        .or_default()
                        .insert(candidate.line, signature);
                }
                None => debug!(
                    "{}: no suggestion for {}",
                    candidate.location(),
                    candidate.qualified_name
                ),
            }
        }
        Ok(map)
    }
}
