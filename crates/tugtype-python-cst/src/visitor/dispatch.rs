// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Walk functions driving a [`Visitor`] over the tree in source order.

use super::traits::{VisitResult, Visitor};
use crate::nodes::{Module, Statement};

/// Walk every statement of a module.
pub fn walk_module<V: Visitor + ?Sized>(visitor: &mut V, module: &Module) {
    walk_statements(visitor, &module.body);
}

/// Walk a statement list.
pub fn walk_statements<V: Visitor + ?Sized>(visitor: &mut V, body: &[Statement]) {
    for statement in body {
        walk_statement(visitor, statement);
    }
}

/// Walk one statement and, unless the visitor skips them, its children.
pub fn walk_statement<V: Visitor + ?Sized>(visitor: &mut V, statement: &Statement) {
    match statement {
        Statement::FunctionDef(node) => {
            if visitor.visit_function_def(node) == VisitResult::Continue {
                walk_statements(visitor, &node.body);
            }
            visitor.leave_function_def(node);
        }
        Statement::ClassDef(node) => {
            if visitor.visit_class_def(node) == VisitResult::Continue {
                walk_statements(visitor, &node.body);
            }
            visitor.leave_class_def(node);
        }
        Statement::Compound(node) => {
            if visitor.visit_compound_statement(node) == VisitResult::Continue {
                walk_statements(visitor, &node.body);
            }
            visitor.leave_compound_statement(node);
        }
        Statement::Simple(node) => {
            if visitor.visit_simple_statement_line(node) == VisitResult::Continue {
                for small in &node.body {
                    visitor.visit_small_statement(small);
                }
            }
        }
    }
}
