// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Structural parser.
//!
//! Builds the statement tree from the token stream with a PEG grammar over
//! tokens. Block structure comes from `INDENT`/`DEDENT`; within a logical
//! line only the pieces tugtype edits are parsed in detail (definition
//! headers, parameter lists, annotations, imports, assignment targets).
//! Everything else is kept as spans.

mod errors;
mod grammar;

pub use errors::{ParserError, ParserResult};

use crate::nodes::Module;
use crate::tokenizer::tokenize;

/// Parse a module into its statement tree.
///
/// # Errors
///
/// Returns [`ParserError::Tokenizer`] for lexical errors and
/// [`ParserError::Syntax`] for malformed statements.
pub fn parse_module(source: &str) -> ParserResult<Module> {
    let tokens = tokenize(source)?;
    grammar::parse_tokens(source, &tokens)
}
