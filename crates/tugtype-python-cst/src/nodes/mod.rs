// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

mod statement;

pub use statement::{
    Annotation, ClassDef, CompoundStatement, Decorator, FunctionDef, Import, ImportAlias,
    ImportFrom, Module, Param, ParamKind, SimpleStatementLine, SmallStatement, SmallStatementKind,
    Statement,
};
pub use tugtype_core::patch::Span;
