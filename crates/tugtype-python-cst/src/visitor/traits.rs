// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Visitor trait definitions for tree traversal.

use crate::nodes::{ClassDef, CompoundStatement, FunctionDef, SimpleStatementLine, SmallStatement};

/// Result of visiting a node - controls traversal behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VisitResult {
    /// Continue traversal into children.
    ///
    /// After visiting children, `leave_*` will be called for this node.
    #[default]
    Continue,

    /// Skip children, continue with siblings.
    ///
    /// `leave_*` is still called for this node.
    SkipChildren,
}

/// Read-only traversal over a parsed module.
///
/// `visit_*` methods are called pre-order and `leave_*` methods post-order.
/// Every method has a default that continues traversal.
pub trait Visitor {
    fn visit_function_def(&mut self, _node: &FunctionDef) -> VisitResult {
        VisitResult::Continue
    }

    fn leave_function_def(&mut self, _node: &FunctionDef) {}

    fn visit_class_def(&mut self, _node: &ClassDef) -> VisitResult {
        VisitResult::Continue
    }

    fn leave_class_def(&mut self, _node: &ClassDef) {}

    fn visit_compound_statement(&mut self, _node: &CompoundStatement) -> VisitResult {
        VisitResult::Continue
    }

    fn leave_compound_statement(&mut self, _node: &CompoundStatement) {}

    fn visit_simple_statement_line(&mut self, _node: &SimpleStatementLine) -> VisitResult {
        VisitResult::Continue
    }

    fn visit_small_statement(&mut self, _node: &SmallStatement) {}
}
