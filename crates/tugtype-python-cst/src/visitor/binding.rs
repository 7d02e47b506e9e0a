// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! BindingCollector visitor for module-level name bindings.
//!
//! A binding is a name the module namespace defines:
//! - **Function definitions**: `def foo():`
//! - **Class definitions**: `class Foo:`
//! - **Variables**: assignment, annotated and augmented assignment targets,
//!   including tuple unpacking and `type X = ...` aliases
//! - **Imports**: `import foo` binds `foo`, `from bar import baz as b` binds `b`
//!
//! Bindings inside module-level `if`/`try`/`with`/`for` blocks count; bodies of
//! functions and classes do not, since they bind in their own namespace.
//!
//! # Usage
//!
//! ```
//! use tugtype_python_cst::{parse_module, BindingCollector, BindingKind};
//!
//! let module = parse_module("import os\nclass C: pass\nX = 1\n").unwrap();
//! let bindings = BindingCollector::collect(&module);
//! let names: Vec<&str> = bindings.iter().map(|b| b.name.as_str()).collect();
//! assert_eq!(names, vec!["os", "C", "X"]);
//! assert_eq!(bindings[1].kind, BindingKind::Class);
//! ```

use super::dispatch::walk_module;
use super::traits::{VisitResult, Visitor};
use crate::nodes::{ClassDef, FunctionDef, Module, SmallStatement, SmallStatementKind};

/// The kind of binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Function definition (`def foo():`).
    Function,
    /// Class definition (`class Foo:`).
    Class,
    /// Variable assignment target.
    Variable,
    /// Name bound by an import statement.
    Import,
}

/// A single module-level binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    /// The name being bound.
    pub name: String,
    /// The kind of binding.
    pub kind: BindingKind,
    /// Line of the binding statement (1-indexed).
    pub line: u32,
}

/// A visitor that collects the names bound in a module's namespace.
#[derive(Default)]
pub struct BindingCollector {
    bindings: Vec<BindingInfo>,
}

impl BindingCollector {
    /// Collect module-level bindings, in source order.
    ///
    /// A name bound more than once appears once per binding.
    pub fn collect(module: &Module) -> Vec<BindingInfo> {
        let mut collector = BindingCollector::default();
        walk_module(&mut collector, module);
        collector.bindings
    }

    fn add(&mut self, name: &str, kind: BindingKind, line: u32) {
        self.bindings.push(BindingInfo {
            name: name.to_string(),
            kind,
            line,
        });
    }
}

impl Visitor for BindingCollector {
    fn visit_function_def(&mut self, node: &FunctionDef) -> VisitResult {
        self.add(&node.name, BindingKind::Function, node.line);
        VisitResult::SkipChildren
    }

    fn visit_class_def(&mut self, node: &ClassDef) -> VisitResult {
        self.add(&node.name, BindingKind::Class, node.line);
        VisitResult::SkipChildren
    }

    fn visit_small_statement(&mut self, node: &SmallStatement) {
        match &node.kind {
            SmallStatementKind::Import(import) => {
                for alias in &import.names {
                    self.add(alias.bound_name(), BindingKind::Import, node.line);
                }
            }
            SmallStatementKind::ImportFrom(from) if !from.is_star => {
                for alias in &from.names {
                    let bound = alias.alias.as_deref().unwrap_or(&alias.name);
                    self.add(bound, BindingKind::Import, node.line);
                }
            }
            SmallStatementKind::Assign { targets } => {
                for target in targets {
                    self.add(target, BindingKind::Variable, node.line);
                }
            }
            _ => {}
        }
    }
}
