// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Statement-level syntax tree.
//!
//! Nodes record where things are rather than re-deriving Python's full
//! expression grammar: every node keeps the byte span of the source it came
//! from and its first line, and expressions are kept as raw source text.

use tugtype_core::patch::Span;

/// A parsed Python module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub body: Vec<Statement>,
}

/// A top-level or block-level statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    FunctionDef(FunctionDef),
    ClassDef(ClassDef),
    Simple(SimpleStatementLine),
    Compound(CompoundStatement),
}

impl Statement {
    /// Span from the first token (including decorators) to the last token of the body.
    pub fn span(&self) -> Span {
        match self {
            Statement::FunctionDef(f) => f.span,
            Statement::ClassDef(c) => c.span,
            Statement::Simple(s) => s.span,
            Statement::Compound(c) => c.span,
        }
    }

    /// Line of the first token.
    pub fn line(&self) -> u32 {
        match self {
            Statement::FunctionDef(f) => f.decorators.first().map_or(f.line, |d| d.line),
            Statement::ClassDef(c) => c.decorators.first().map_or(c.line, |d| d.line),
            Statement::Simple(s) => s.line,
            Statement::Compound(c) => c.line,
        }
    }
}

/// A decorator line (`@expr`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decorator {
    /// Expression text after `@`, trimmed.
    pub expr: String,
    pub span: Span,
    pub line: u32,
}

impl Decorator {
    /// The decorator expression without call arguments: `a.b(c)` -> `a.b`.
    pub fn target(&self) -> &str {
        match self.expr.find('(') {
            Some(idx) => self.expr[..idx].trim_end(),
            None => &self.expr,
        }
    }
}

/// Parameter kind classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Standard named parameter.
    Regular,
    /// Before a `/` separator.
    PositionalOnly,
    /// After `*` or `*args`.
    KeywordOnly,
    /// `*args`.
    VarArgs,
    /// `**kwargs`.
    KwArgs,
}

impl ParamKind {
    /// Returns the string representation used in output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Regular => "regular",
            ParamKind::PositionalOnly => "positional_only",
            ParamKind::KeywordOnly => "keyword_only",
            ParamKind::VarArgs => "var_args",
            ParamKind::KwArgs => "kwargs",
        }
    }

    /// Whether the parameter can be passed positionally as a single value.
    pub fn is_positional(&self) -> bool {
        matches!(self, ParamKind::Regular | ParamKind::PositionalOnly)
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An annotation expression (`: T` or `-> T`), without the punctuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub text: String,
    pub span: Span,
}

/// A single function parameter. Bare `*` and `/` separators are not parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    /// Span of the name only (no `*`/`**` prefix).
    pub name_span: Span,
    pub kind: ParamKind,
    pub annotation: Option<Annotation>,
}

/// `def` / `async def`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    pub decorators: Vec<Decorator>,
    pub is_async: bool,
    pub name: String,
    pub name_span: Span,
    pub params: Vec<Param>,
    pub returns: Option<Annotation>,
    /// The `)` closing the parameter list.
    pub close_paren_span: Span,
    /// The `:` ending the header.
    pub colon_span: Span,
    pub body: Vec<Statement>,
    pub span: Span,
    /// Line of the `def` keyword (of `async` for `async def`).
    pub line: u32,
}

/// `class`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    pub decorators: Vec<Decorator>,
    pub name: String,
    pub name_span: Span,
    pub body: Vec<Statement>,
    pub span: Span,
    pub line: u32,
}

/// Any other block statement: `if`, `elif`, `else`, `for`, `while`, `try`,
/// `except`, `finally`, `with`, `match`, `case`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundStatement {
    /// The leading keyword (`if`, `else`, `async`, ...).
    pub keyword: String,
    pub body: Vec<Statement>,
    pub span: Span,
    pub line: u32,
}

/// One logical line of `;`-separated small statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleStatementLine {
    pub body: Vec<SmallStatement>,
    pub span: Span,
    pub line: u32,
}

/// A name in an import statement with its optional `as` alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportAlias {
    /// Dotted name as written.
    pub name: String,
    pub alias: Option<String>,
}

impl ImportAlias {
    /// The name this alias binds in the importing namespace.
    ///
    /// `import a.b` binds `a`; `import a.b as c` binds `c`.
    pub fn bound_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.name.split('.').next().unwrap_or(&self.name),
        }
    }
}

/// `import a, b.c as d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub names: Vec<ImportAlias>,
}

/// `from m import a, b as c` / `from . import x` / `from m import *`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFrom {
    /// Module path without leading dots (empty for `from . import x`).
    pub module: String,
    pub relative_level: usize,
    pub names: Vec<ImportAlias>,
    pub is_star: bool,
}

/// Kind of a small statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmallStatementKind {
    Import(Import),
    ImportFrom(ImportFrom),
    /// An expression statement. `plain_string` when it is a `str` literal
    /// (possibly parenthesized or implicitly concatenated); bytes and
    /// formatted strings do not count.
    Expr { plain_string: bool },
    /// An assignment (`=`, augmented or annotated) and the plain names it binds.
    Assign { targets: Vec<String> },
    Other,
}

/// A single statement of a [`SimpleStatementLine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmallStatement {
    pub kind: SmallStatementKind,
    pub span: Span,
    pub line: u32,
}
