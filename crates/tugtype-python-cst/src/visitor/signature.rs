// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! SignatureCollector visitor for Python function signature extraction.
//!
//! This module provides a [`SignatureCollector`] visitor that traverses a
//! parsed module and collects function/method signatures with parameter
//! kinds, annotations and the positions needed to edit them.
//!
//! # What is Collected?
//!
//! - **Parameters**: names, kinds (regular, positional-only, keyword-only, *args, **kwargs)
//! - **Annotations**: parameter annotations and the return annotation, as source text
//! - **Modifiers**: async and `@staticmethod`
//! - **Scope**: the enclosing classes and functions of every definition
//!
//! Every `def` in the module is collected, including nested ones; callers
//! filter on [`SignatureInfo::class_depth`] and [`SignatureInfo::function_depth`].
//!
//! # Usage
//!
//! ```
//! use tugtype_python_cst::{parse_module, SignatureCollector};
//!
//! let source = "def foo(x: int, /, y, *args, z=1, **kwargs) -> str: pass";
//! let module = parse_module(source).unwrap();
//!
//! let signatures = SignatureCollector::collect(&module);
//! assert_eq!(signatures[0].name, "foo");
//! assert_eq!(signatures[0].params.len(), 5);
//! ```

use super::dispatch::walk_module;
use super::traits::{VisitResult, Visitor};
use crate::nodes::{ClassDef, FunctionDef, Module, ParamKind, Span};

/// Function/method modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Async function/method.
    Async,
    /// Static method (`@staticmethod`); takes no receiver.
    Static,
}

/// Information about a single parameter in a function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    /// Parameter name.
    pub name: String,
    /// Parameter kind (regular, positional-only, keyword-only, etc.).
    pub kind: ParamKind,
    /// Type annotation string (if present).
    pub annotation: Option<String>,
    /// Source span for the parameter name.
    pub span: Span,
}

/// Information about a function/method signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    /// Function/method name.
    pub name: String,
    /// Parameters in declaration order.
    pub params: Vec<ParamInfo>,
    /// Return type annotation string (if present).
    pub returns: Option<String>,
    /// Modifiers (async, `@staticmethod`).
    pub modifiers: Vec<Modifier>,
    /// Decorator expressions without call arguments, in source order.
    pub decorators: Vec<String>,
    /// Names of enclosing classes and functions, outermost first.
    pub scope_path: Vec<String>,
    /// Whether this function is defined directly in a class body.
    pub is_method: bool,
    /// Number of enclosing classes.
    pub class_depth: usize,
    /// Number of enclosing functions.
    pub function_depth: usize,
    /// Source span for the function name.
    pub span: Span,
    /// Span of the `)` closing the parameter list.
    pub close_paren_span: Span,
    /// Span of the `:` that ends the header.
    pub colon_span: Span,
    /// Line of the `def` keyword.
    pub line: u32,
}

impl SignatureInfo {
    /// Dotted name within the module: `C.f` for a method, `f` for a function.
    pub fn qualified_name(&self) -> String {
        let mut parts = self.scope_path.clone();
        parts.push(self.name.clone());
        parts.join(".")
    }

    /// Returns true if the given modifier applies.
    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    Class,
    Function,
}

/// A visitor that collects function signatures from a parsed module.
pub struct SignatureCollector {
    /// Collected signatures.
    signatures: Vec<SignatureInfo>,
    /// Enclosing definitions of the current position.
    scopes: Vec<(String, ScopeKind)>,
}

impl Default for SignatureCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureCollector {
    /// Create a new SignatureCollector.
    pub fn new() -> Self {
        Self {
            signatures: Vec::new(),
            scopes: Vec::new(),
        }
    }

    /// Collect signatures from a parsed module, in source order.
    pub fn collect(module: &Module) -> Vec<SignatureInfo> {
        let mut collector = SignatureCollector::new();
        walk_module(&mut collector, module);
        collector.signatures
    }

    fn depth_of(&self, kind: ScopeKind) -> usize {
        self.scopes.iter().filter(|(_, k)| *k == kind).count()
    }
}

impl Visitor for SignatureCollector {
    fn visit_function_def(&mut self, node: &FunctionDef) -> VisitResult {
        let decorators: Vec<String> = node
            .decorators
            .iter()
            .map(|d| d.target().to_string())
            .collect();

        let mut modifiers = Vec::new();
        if node.is_async {
            modifiers.push(Modifier::Async);
        }
        if decorators.iter().any(|d| d == "staticmethod") {
            modifiers.push(Modifier::Static);
        }

        let params = node
            .params
            .iter()
            .map(|p| ParamInfo {
                name: p.name.clone(),
                kind: p.kind,
                annotation: p.annotation.as_ref().map(|a| a.text.clone()),
                span: p.name_span,
            })
            .collect();

        self.signatures.push(SignatureInfo {
            name: node.name.clone(),
            params,
            returns: node.returns.as_ref().map(|a| a.text.clone()),
            modifiers,
            decorators,
            scope_path: self.scopes.iter().map(|(name, _)| name.clone()).collect(),
            is_method: matches!(self.scopes.last(), Some((_, ScopeKind::Class))),
            class_depth: self.depth_of(ScopeKind::Class),
            function_depth: self.depth_of(ScopeKind::Function),
            span: node.name_span,
            close_paren_span: node.close_paren_span,
            colon_span: node.colon_span,
            line: node.line,
        });

        self.scopes.push((node.name.clone(), ScopeKind::Function));
        VisitResult::Continue
    }

    fn leave_function_def(&mut self, _node: &FunctionDef) {
        self.scopes.pop();
    }

    fn visit_class_def(&mut self, node: &ClassDef) -> VisitResult {
        self.scopes.push((node.name.clone(), ScopeKind::Class));
        VisitResult::Continue
    }

    fn leave_class_def(&mut self, _node: &ClassDef) {
        self.scopes.pop();
    }
}
