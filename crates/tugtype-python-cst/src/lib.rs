// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! A span-preserving Python parser for source-to-source edits.
//!
//! This crate tokenizes Python source and builds a statement-level tree in
//! which every definition header, parameter, annotation, default and import
//! carries the byte span it came from. Edits are made against those spans,
//! so the untouched parts of a file are preserved byte for byte.
//!
//! # Overview
//!
//! - **Tokenizing**: [`tokenize`] produces tokens with spans and line numbers.
//! - **Parsing**: [`parse_module`] builds a [`Module`] of statements.
//! - **Collecting**: [`SignatureCollector`], [`ImportCollector`] and
//!   [`BindingCollector`] extract definition signatures, module-level imports
//!   and the names the module namespace binds.
//! - **Editing**: [`BatchSpanEditor`] applies a batch of span edits.
//!
//! # Quick Start
//!
//! ```
//! use tugtype_python_cst::{parse_module, SignatureCollector};
//!
//! let source = "def hello(name):\n    print(name)\n";
//! let module = parse_module(source).expect("parse error");
//!
//! let signatures = SignatureCollector::collect(&module);
//! assert_eq!(signatures[0].params[0].name, "name");
//! assert!(signatures[0].params[0].annotation.is_none());
//! ```

pub mod nodes;
pub mod parser;
pub mod tokenizer;
pub mod visitor;

pub use nodes::{Module, ParamKind, Span, Statement};
pub use parser::{parse_module, ParserError, ParserResult};
pub use tokenizer::{tokenize, TokError, TokType, Token};
pub use visitor::{
    BatchEditError, BatchSpanEditor, BindingCollector, BindingInfo, BindingKind, EditPrimitive,
    ImportCollector, ImportInfo, ImportKind, Modifier, ParamInfo, SignatureCollector,
    SignatureInfo, VisitResult, Visitor,
};
