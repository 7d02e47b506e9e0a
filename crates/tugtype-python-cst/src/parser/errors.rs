// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

use crate::tokenizer::TokError;

/// Errors from tokenizing or parsing a module.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParserError {
    #[error("tokenizer error at line {line}: {message}")]
    Tokenizer { line: u32, message: String },
    #[error("syntax error at line {line}: {message}")]
    Syntax { line: u32, message: String },
}

impl ParserError {
    /// Line the error was reported at.
    pub fn line(&self) -> u32 {
        match self {
            ParserError::Tokenizer { line, .. } | ParserError::Syntax { line, .. } => *line,
        }
    }
}

impl From<TokError> for ParserError {
    fn from(err: TokError) -> Self {
        ParserError::Tokenizer {
            line: err.line,
            message: err.message,
        }
    }
}

pub type ParserResult<T> = Result<T, ParserError>;
