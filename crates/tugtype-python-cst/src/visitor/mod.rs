// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor infrastructure and collectors for tree traversal.
//!
//! # Traversal Order
//!
//! - **Depth-first, pre-order** for `visit_*` methods
//! - **Post-order** for `leave_*` methods
//! - Children are visited in source order
//!
//! ```
//! use tugtype_python_cst::nodes::FunctionDef;
//! use tugtype_python_cst::parse_module;
//! use tugtype_python_cst::visitor::{walk_module, VisitResult, Visitor};
//!
//! struct DefCounter {
//!     count: usize,
//! }
//!
//! impl Visitor for DefCounter {
//!     fn visit_function_def(&mut self, _node: &FunctionDef) -> VisitResult {
//!         self.count += 1;
//!         VisitResult::Continue
//!     }
//! }
//!
//! let module = parse_module("def f():\n    def g(): pass\n").unwrap();
//! let mut counter = DefCounter { count: 0 };
//! walk_module(&mut counter, &module);
//! assert_eq!(counter.count, 2);
//! ```

mod batch_edit;
mod binding;
mod dispatch;
mod import;
mod signature;
mod traits;

pub use batch_edit::{BatchEditError, BatchEditResult, BatchSpanEditor, EditPrimitive};
pub use binding::{BindingCollector, BindingInfo, BindingKind};
pub use dispatch::{walk_module, walk_statement, walk_statements};
pub use import::{ImportCollector, ImportInfo, ImportKind, ImportedName};
pub use signature::{Modifier, ParamInfo, SignatureCollector, SignatureInfo};
pub use traits::{VisitResult, Visitor};
