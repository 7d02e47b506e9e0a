//! Type name normalization.
//!
//! The inference daemon reports fully qualified type names (`pkg.mod.Name`,
//! `pkg.mod:Name`, `typing.List[...]`). Before insertion each one is parsed
//! into a small [`TypeExpr`] tree and rendered back in the form a person
//! would write in the file being edited, together with the
//! `from m import N` lines the rendering depends on.

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;
use tugtype_python_cst::{BindingCollector, ImportCollector, ImportKind, Module};

/// Names reported in place of a real type; never inserted at the top level.
const ANY_SPELLINGS: &[&str] = &["Any", "typing.Any", "typing:Any"];

/// `typing` aliases with a builtin generic replacement.
const BUILTIN_GENERICS: &[(&str, &str)] = &[
    ("List", "list"),
    ("Dict", "dict"),
    ("Set", "set"),
    ("FrozenSet", "frozenset"),
    ("Tuple", "tuple"),
    ("Type", "type"),
];

/// Names the daemon reports unqualified that live in `typing`.
const TYPING_NAMES: &[&str] = &[
    "AbstractSet",
    "Any",
    "AsyncGenerator",
    "AsyncIterable",
    "AsyncIterator",
    "Awaitable",
    "Callable",
    "ClassVar",
    "Collection",
    "Coroutine",
    "Generator",
    "Iterable",
    "Iterator",
    "Literal",
    "Mapping",
    "MutableMapping",
    "MutableSequence",
    "MutableSet",
    "Never",
    "NoReturn",
    "Optional",
    "Sequence",
    "Union",
];

// ============================================================================
// Errors
// ============================================================================

/// A type string that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed type {input:?}: {message}")]
pub struct NormalizeError {
    pub input: String,
    pub message: String,
}

impl NormalizeError {
    fn new(input: &str, message: impl Into<String>) -> Self {
        NormalizeError {
            input: input.to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Type Expressions
// ============================================================================

/// Parsed form of a reported type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// A dotted or colon-qualified name.
    Name(String),
    /// `base[args]`.
    Subscript { base: String, args: Vec<TypeExpr> },
    /// A bracketed argument list, as in `Callable[[int], str]`.
    List(Vec<TypeExpr>),
    /// `a | b`.
    Union(Vec<TypeExpr>),
    /// A string or number literal, or `...`, kept verbatim.
    Literal(String),
}

/// Parse a type string. A leading `*` or `**` (variadic parameters) is ignored.
pub fn parse_type(input: &str) -> Result<TypeExpr, NormalizeError> {
    let trimmed = input.trim().trim_start_matches('*');
    let tokens = lex(input, trimmed)?;
    if tokens.is_empty() {
        return Err(NormalizeError::new(input, "empty type"));
    }
    let mut parser = TypeParser {
        input,
        tokens,
        pos: 0,
    };
    let expr = parser.union()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some(tok) => Err(NormalizeError::new(
            input,
            format!("unexpected {}", tok.describe()),
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Name(String),
    Literal(String),
    LBracket,
    RBracket,
    Comma,
    Pipe,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Name(s) | Tok::Literal(s) => format!("'{}'", s),
            Tok::LBracket => "'['".to_string(),
            Tok::RBracket => "']'".to_string(),
            Tok::Comma => "','".to_string(),
            Tok::Pipe => "'|'".to_string(),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.' || c == ':'
}

fn lex(input: &str, text: &str) -> Result<Vec<Tok>, NormalizeError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '[' => {
                tokens.push(Tok::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Tok::RBracket);
                i += 1;
            }
            ',' => {
                tokens.push(Tok::Comma);
                i += 1;
            }
            '|' => {
                tokens.push(Tok::Pipe);
                i += 1;
            }
            '.' if chars[i..].starts_with(&['.', '.', '.']) => {
                tokens.push(Tok::Literal("...".to_string()));
                i += 3;
            }
            '\'' | '"' => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i] != c {
                    if chars[i] == '\\' {
                        i += 1;
                    }
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(NormalizeError::new(input, "unterminated string"));
                }
                i += 1;
                tokens.push(Tok::Literal(chars[start..i].iter().collect()));
            }
            '-' | '0'..='9' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '.') {
                    i += 1;
                }
                let number: String = chars[start..i].iter().collect();
                if number == "-" {
                    return Err(NormalizeError::new(input, "unexpected '-'"));
                }
                tokens.push(Tok::Literal(number));
            }
            c if is_name_char(c) => {
                let start = i;
                while i < chars.len() && is_name_char(chars[i]) {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect();
                if name.starts_with(['.', ':']) || name.ends_with(['.', ':']) {
                    return Err(NormalizeError::new(input, format!("bad name '{}'", name)));
                }
                tokens.push(Tok::Name(name));
            }
            other => {
                return Err(NormalizeError::new(
                    input,
                    format!("unexpected character '{}'", other),
                ))
            }
        }
    }
    Ok(tokens)
}

struct TypeParser<'a> {
    input: &'a str,
    tokens: Vec<Tok>,
    pos: usize,
}

impl TypeParser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == Some(tok) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> NormalizeError {
        NormalizeError::new(self.input, message)
    }

    fn union(&mut self) -> Result<TypeExpr, NormalizeError> {
        let mut members = vec![self.atom()?];
        while self.eat(&Tok::Pipe) {
            members.push(self.atom()?);
        }
        if members.len() == 1 {
            Ok(members.remove(0))
        } else {
            Ok(TypeExpr::Union(members))
        }
    }

    fn atom(&mut self) -> Result<TypeExpr, NormalizeError> {
        let Some(tok) = self.peek().cloned() else {
            return Err(self.error("unexpected end of type"));
        };
        self.pos += 1;
        match tok {
            Tok::Name(name) => {
                if self.eat(&Tok::LBracket) {
                    let args = self.arguments()?;
                    if args.is_empty() {
                        return Err(self.error(format!("empty subscript on '{}'", name)));
                    }
                    Ok(TypeExpr::Subscript { base: name, args })
                } else {
                    Ok(TypeExpr::Name(name))
                }
            }
            Tok::Literal(text) => Ok(TypeExpr::Literal(text)),
            Tok::LBracket => Ok(TypeExpr::List(self.arguments()?)),
            other => Err(self.error(format!("unexpected {}", other.describe()))),
        }
    }

    /// Comma-separated expressions up to and including the closing `]`.
    fn arguments(&mut self) -> Result<Vec<TypeExpr>, NormalizeError> {
        let mut args = Vec::new();
        loop {
            if self.eat(&Tok::RBracket) {
                return Ok(args);
            }
            args.push(self.union()?);
            if self.eat(&Tok::RBracket) {
                return Ok(args);
            }
            if !self.eat(&Tok::Comma) {
                return Err(match self.peek() {
                    Some(tok) => self.error(format!("expected ',' or ']', found {}", tok.describe())),
                    None => self.error("'[' was never closed"),
                });
            }
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// What the renderer needs to know about the file being edited.
#[derive(Debug, Clone, Default)]
pub struct NormalizeContext {
    /// Dotted name of the module being edited.
    pub module: String,
    /// Names bound by plain `import X` statements.
    pub imported_modules: HashSet<String>,
    /// Names bound in the module namespace: definitions, assignments, imports.
    pub local_names: HashSet<String>,
}

impl NormalizeContext {
    pub fn new(module: impl Into<String>) -> Self {
        NormalizeContext {
            module: module.into(),
            imported_modules: HashSet::new(),
            local_names: HashSet::new(),
        }
    }

    /// Context for `module`, already parsed as `parsed`.
    pub fn for_module(module: impl Into<String>, parsed: &Module) -> Self {
        let mut ctx = NormalizeContext::new(module);
        ctx.imported_modules = ImportCollector::collect(parsed)
            .iter()
            .filter(|i| i.kind == ImportKind::Import)
            .filter_map(|i| i.bound_name())
            .map(str::to_string)
            .collect();
        ctx.local_names = BindingCollector::collect(parsed)
            .into_iter()
            .map(|b| b.name)
            .collect();
        ctx
    }

    /// Whether `<module>.rest` names something the file itself binds.
    fn binds(&self, rest: &str) -> bool {
        let head = rest.split('.').next().unwrap_or(rest);
        self.local_names.contains(head)
    }
}

/// A rendered type and the import lines it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedType {
    pub text: String,
    pub imports: BTreeSet<String>,
}

/// Normalize one reported type.
///
/// Returns `Ok(None)` when the whole type is `Any`, which carries no
/// information and is never inserted.
pub fn normalize_type(
    input: &str,
    ctx: &NormalizeContext,
) -> Result<Option<NormalizedType>, NormalizeError> {
    let expr = parse_type(input)?;
    if let TypeExpr::Name(name) = &expr {
        if ANY_SPELLINGS.contains(&name.as_str()) {
            return Ok(None);
        }
    }
    let mut imports = BTreeSet::new();
    let text = render(&expr, ctx, &mut imports);
    Ok(Some(NormalizedType { text, imports }))
}

fn render(expr: &TypeExpr, ctx: &NormalizeContext, imports: &mut BTreeSet<String>) -> String {
    match expr {
        TypeExpr::Name(name) => render_name(name, ctx, imports),
        TypeExpr::Subscript { base, args } => format!(
            "{}[{}]",
            render_name(base, ctx, imports),
            render_all(args, ctx, imports, ", ")
        ),
        TypeExpr::List(items) => format!("[{}]", render_all(items, ctx, imports, ", ")),
        TypeExpr::Union(members) => render_all(members, ctx, imports, " | "),
        TypeExpr::Literal(text) => text.clone(),
    }
}

fn render_all(
    exprs: &[TypeExpr],
    ctx: &NormalizeContext,
    imports: &mut BTreeSet<String>,
    sep: &str,
) -> String {
    exprs
        .iter()
        .map(|e| render(e, ctx, imports))
        .collect::<Vec<_>>()
        .join(sep)
}

fn render_name(name: &str, ctx: &NormalizeContext, imports: &mut BTreeSet<String>) -> String {
    if let Some((module, rest)) = name.split_once(':') {
        return render_qualified(module, rest, ctx, imports);
    }

    if !ctx.module.is_empty() {
        // `<module>.sub.Thing` may name a submodule of a package.
        if let Some(rest) = name
            .strip_prefix(ctx.module.as_str())
            .and_then(|r| r.strip_prefix('.'))
            .filter(|rest| ctx.binds(rest))
        {
            return same_module(rest, ctx);
        }
    }
    if let Some(rest) = name.strip_prefix("typing.") {
        return typing_name(rest, imports);
    }
    if let Some(rest) = name.strip_prefix("builtins.") {
        return rest.to_string();
    }

    match name.rsplit_once('.') {
        Some((module, short)) => {
            imports.insert(format!("from {} import {}", module, short));
            short.to_string()
        }
        None => bare_name(name, imports),
    }
}

/// `module:Name`, where the split between module and attribute path is explicit,
/// so a `module` equal to the edited one always names a local attribute.
fn render_qualified(
    module: &str,
    rest: &str,
    ctx: &NormalizeContext,
    imports: &mut BTreeSet<String>,
) -> String {
    if module == ctx.module {
        return same_module(rest, ctx);
    }
    match module {
        "typing" => typing_name(rest, imports),
        "builtins" => rest.to_string(),
        _ => {
            let head = rest.split('.').next().unwrap_or(rest);
            imports.insert(format!("from {} import {}", module, head));
            rest.to_string()
        }
    }
}

/// A name defined in the file itself. A name that collides with a plainly
/// imported module refers to that module's attribute.
fn same_module(rest: &str, ctx: &NormalizeContext) -> String {
    let head = rest.split('.').next().unwrap_or(rest);
    if ctx.imported_modules.contains(head) {
        format!("{}.{}", head, rest)
    } else {
        rest.to_string()
    }
}

fn typing_name(rest: &str, imports: &mut BTreeSet<String>) -> String {
    if let Some(builtin) = builtin_generic(rest) {
        return builtin.to_string();
    }
    let head = rest.split('.').next().unwrap_or(rest);
    imports.insert(format!("from typing import {}", head));
    rest.to_string()
}

fn bare_name(name: &str, imports: &mut BTreeSet<String>) -> String {
    if let Some(builtin) = builtin_generic(name) {
        return builtin.to_string();
    }
    if TYPING_NAMES.contains(&name) {
        imports.insert(format!("from typing import {}", name));
    }
    name.to_string()
}

fn builtin_generic(name: &str) -> Option<&'static str> {
    BUILTIN_GENERICS
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, builtin)| *builtin)
}

// ============================================================================
// Tests
// ============================================================================
