// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! PEG grammar over the token stream.
//!
//! Block structure, definition headers, parameter lists and imports are
//! parsed rule by rule. Expressions are matched as balanced token runs and
//! kept as spans of the source.

use peg::error::ParseError;

use super::errors::{ParserError, ParserResult};
use crate::nodes::{
    Annotation, ClassDef, CompoundStatement, Decorator, FunctionDef, Import, ImportAlias,
    ImportFrom, Module, Param, ParamKind, SimpleStatementLine, SmallStatement, SmallStatementKind,
    Span, Statement,
};
use crate::tokenizer::{TokType, Token};

/// Keywords that always open a block statement.
const BLOCK_KEYWORDS: &[&str] = &[
    "if", "elif", "else", "for", "while", "try", "except", "finally", "with",
];

/// Keywords a simple statement never starts with.
const RESERVED_HEADS: &[&str] = &[
    "def", "class", "if", "elif", "else", "for", "while", "try", "except", "finally", "with",
    "async", "import", "from",
];

/// Keywords that start a small statement which is never an expression.
const STATEMENT_KEYWORDS: &[&str] = &[
    "pass", "break", "continue", "return", "raise", "del", "global", "nonlocal", "assert",
];

const AUGMENTED_ASSIGN_OPS: &[&str] = &[
    "+=", "-=", "*=", "/=", "//=", "%=", "**=", ">>=", "<<=", "&=", "|=", "^=", "@=",
];

/// Parse a token stream produced from `source`.
pub(super) fn parse_tokens(source: &str, tokens: &[Token]) -> ParserResult<Module> {
    python::file(tokens, source).map_err(|err| syntax_error(&err, tokens))
}

fn syntax_error(err: &ParseError<usize>, tokens: &[Token]) -> ParserError {
    let line = tokens
        .get(err.location)
        .or(tokens.last())
        .map_or(1, |t| t.line);
    ParserError::Syntax {
        line,
        message: format!("expected {}", err.expected),
    }
}

/// A parameter list entry before keyword-only and positional-only markers
/// are resolved.
enum ParamPiece {
    PositionalOnlyMarker,
    KeywordOnlyMarker,
    Named {
        name: Token,
        kind: ParamKind,
        annotation: Option<Annotation>,
    },
}

peg::parser! {
    grammar python<'a>(src: &'a str) for [Token] {
        pub rule file() -> Module
            = newline()* body:statements()? end_marker()
            { Module { body: body.unwrap_or_default() } }

        rule statements() -> Vec<Statement>
            = body:(s:statement() newline()* { s })+ { body }

        rule statement() -> Statement
            = decorated()
            / f:function_def() { Statement::FunctionDef(f) }
            / c:class_def() { Statement::ClassDef(c) }
            / m:match_stmt() { Statement::Compound(m) }
            / c:compound() { Statement::Compound(c) }
            / l:simple_line() { Statement::Simple(l) }

        rule suite() -> Vec<Statement>
            = newline() indent() body:statements() dedent() { body }
            / l:simple_line() { vec![Statement::Simple(l)] }

        // --------------------------------------------------------------------
        // Definitions
        // --------------------------------------------------------------------

        rule decorated() -> Statement
            = decorators:decorator()+ target:(
                f:function_def() { Statement::FunctionDef(f) }
                / c:class_def() { Statement::ClassDef(c) }
            ) { attach_decorators(target, decorators) }

        rule decorator() -> Decorator
            = at:op("@") expr:$(line_token()+) newline() {
                let end = covering_span(expr).end;
                Decorator {
                    expr: src[at.span.end..end].trim().to_string(),
                    span: Span::new(at.span.start, end),
                    line: at.line,
                }
            }

        rule function_def() -> FunctionDef
            = is_async:lit("async")? kw:lit("def") name:name() type_params()?
              op("(") params:parameters() close:op(")")
              returns:(op("->") r:return_annotation() { r })?
              colon:op(":") body:suite()
            {
                let first = is_async.unwrap_or(kw);
                let end = body.last().map_or(colon.span.end, |s| s.span().end);
                FunctionDef {
                    decorators: Vec::new(),
                    is_async: is_async.is_some(),
                    name: name.text(src).to_string(),
                    name_span: name.span,
                    params,
                    returns,
                    close_paren_span: close.span,
                    colon_span: colon.span,
                    body,
                    span: Span::new(first.span.start, end),
                    line: first.line,
                }
            }

        rule type_params() = &op("[") group()

        rule parameters() -> Vec<Param>
            = pieces:param() ** op(",") op(",")? { resolve_params(pieces, src) }

        rule param() -> ParamPiece
            = op("/") { ParamPiece::PositionalOnlyMarker }
            / op("**") name:name() annotation:param_annotation()? {
                ParamPiece::Named { name, kind: ParamKind::KwArgs, annotation }
            }
            / op("*") name:name() annotation:param_annotation()? {
                ParamPiece::Named { name, kind: ParamKind::VarArgs, annotation }
            }
            / op("*") { ParamPiece::KeywordOnlyMarker }
            / name:name() annotation:param_annotation()? param_default()? {
                ParamPiece::Named { name, kind: ParamKind::Regular, annotation }
            }

        rule param_annotation() -> Annotation
            = op(":") toks:$(param_item()+) { annotation(toks, src) }

        rule param_default() = op("=") param_item()+

        rule param_item() = lambda_head() / group() / !op(",") !op("=") !close() line_token()

        rule return_annotation() -> Annotation
            = toks:$(header_item()+) { annotation(toks, src) }

        rule class_def() -> ClassDef
            = kw:lit("class") name:name() header_item()* colon:op(":") body:suite() {
                let end = body.last().map_or(colon.span.end, |s| s.span().end);
                ClassDef {
                    decorators: Vec::new(),
                    name: name.text(src).to_string(),
                    name_span: name.span,
                    body,
                    span: Span::new(kw.span.start, end),
                    line: kw.line,
                }
            }

        // --------------------------------------------------------------------
        // Other blocks
        // --------------------------------------------------------------------

        rule compound() -> CompoundStatement
            = kw:block_keyword() header_item()* colon:op(":") body:suite() {
                compound_statement(kw, colon, body, src)
            }
            / kw:lit("async") (lit("for") / lit("with")) header_item()* colon:op(":")
              body:suite() {
                compound_statement(kw, colon, body, src)
            }

        // `match` and `case` are keywords only where they open a block.
        rule match_stmt() -> CompoundStatement
            = kw:lit("match") header_item()+ colon:op(":") newline() indent()
              cases:case_block()+ dedent() {
                compound_statement(kw, colon, cases, src)
            }

        rule case_block() -> Statement
            = kw:lit("case") header_item()+ colon:op(":") body:suite() {
                Statement::Compound(compound_statement(kw, colon, body, src))
            }

        // Anything up to the header colon; colons of lambdas and of
        // bracketed expressions do not end the header.
        rule header_item() = lambda_head() / group() / !op(":") !close() line_token()

        rule lambda_head() = lit("lambda") (group() / !op(":") !close() line_token())* op(":")

        // --------------------------------------------------------------------
        // Simple statements
        // --------------------------------------------------------------------

        rule simple_line() -> SimpleStatementLine
            = first:small_statement() rest:(op(";") s:small_statement() { s })* op(";")?
              newline()
            {
                let start = first.span.start;
                let line = first.line;
                let end = rest.last().map_or(first.span.end, |s| s.span.end);
                let mut body = vec![first];
                body.extend(rest);
                SimpleStatementLine {
                    body,
                    span: Span::new(start, end),
                    line,
                }
            }

        rule small_statement() -> SmallStatement
            = import_name()
            / import_from()
            / !reserved_head() toks:$(small_item()+) { classify(toks, src) }

        rule small_item() = group() / !op(";") !close() line_token()

        rule import_name() -> SmallStatement
            = kw:lit("import") first:dotted_as_name() rest:(op(",") n:dotted_as_name() { n })* {
                let (names, last) = aliases(first, rest);
                SmallStatement {
                    kind: SmallStatementKind::Import(Import { names }),
                    span: Span::new(kw.span.start, last.span.end),
                    line: kw.line,
                }
            }

        rule import_from() -> SmallStatement
            = kw:lit("from") level:relative_level() module:(!lit("import") m:dotted_name() { m })?
              lit("import") targets:import_targets()
            {?
                if level == 0 && module.is_none() {
                    Err("module name")
                } else {
                    let (names, is_star, last) = targets;
                    Ok(SmallStatement {
                        kind: SmallStatementKind::ImportFrom(ImportFrom {
                            module: module.map(|(name, _)| name).unwrap_or_default(),
                            relative_level: level,
                            names,
                            is_star,
                        }),
                        span: Span::new(kw.span.start, last.span.end),
                        line: kw.line,
                    })
                }
            }

        rule relative_level() -> usize
            = dots:(op(".") { 1usize } / op("...") { 3usize })* { dots.iter().sum() }

        rule import_targets() -> (Vec<ImportAlias>, bool, Token)
            = star:op("*") { (Vec::new(), true, star) }
            / op("(") first:import_as_name() rest:(op(",") n:import_as_name() { n })* op(",")?
              close:op(")") {
                let (names, _) = aliases(first, rest);
                (names, false, close)
            }
            / first:import_as_name() rest:(op(",") n:import_as_name() { n })* {
                let (names, last) = aliases(first, rest);
                (names, false, last)
            }

        rule dotted_as_name() -> (ImportAlias, Token)
            = dotted:dotted_name() alias:(lit("as") a:name() { a })? {
                let (name, last) = dotted;
                let alias_text = alias.map(|a| a.text(src).to_string());
                (ImportAlias { name, alias: alias_text }, alias.unwrap_or(last))
            }

        rule import_as_name() -> (ImportAlias, Token)
            = name:name() alias:(lit("as") a:name() { a })? {
                let alias_text = alias.map(|a| a.text(src).to_string());
                (
                    ImportAlias { name: name.text(src).to_string(), alias: alias_text },
                    alias.unwrap_or(name),
                )
            }

        rule dotted_name() -> (String, Token)
            = first:name() rest:(op(".") n:name() { n })* {
                let mut dotted = first.text(src).to_string();
                for part in &rest {
                    dotted.push('.');
                    dotted.push_str(part.text(src));
                }
                (dotted, rest.last().copied().unwrap_or(first))
            }

        // --------------------------------------------------------------------
        // Tokens
        // --------------------------------------------------------------------

        rule group() = open() (group() / !close() line_token())* close()

        rule open() = [t] {?
            if t.kind == TokType::Op && matches!(t.text(src), "(" | "[" | "{") {
                Ok(())
            } else {
                Err("opening bracket")
            }
        }

        rule close() = [t] {?
            if t.kind == TokType::Op && matches!(t.text(src), ")" | "]" | "}") {
                Ok(())
            } else {
                Err("closing bracket")
            }
        }

        rule line_token() -> Token = [t] {?
            match t.kind {
                TokType::Newline | TokType::Indent | TokType::Dedent | TokType::EndMarker => {
                    Err("expression")
                }
                _ => Ok(t),
            }
        }

        rule block_keyword() -> Token = [t] {?
            if t.kind == TokType::Name && BLOCK_KEYWORDS.contains(&t.text(src)) {
                Ok(t)
            } else {
                Err("compound statement")
            }
        }

        rule reserved_head() = [t] {?
            if (t.kind == TokType::Name && RESERVED_HEADS.contains(&t.text(src)))
                || t.is_op(src, "@")
            {
                Ok(())
            } else {
                Err("statement")
            }
        }

        rule lit(keyword: &'static str) -> Token
            = [t] {? if t.is_name(src, keyword) { Ok(t) } else { Err(keyword) } }

        rule op(text: &'static str) -> Token
            = [t] {? if t.is_op(src, text) { Ok(t) } else { Err(text) } }

        rule tok(kind: TokType, err: &'static str) -> Token
            = [t] {? if t.kind == kind { Ok(t) } else { Err(err) } }

        rule name() -> Token = tok(TokType::Name, "NAME")
        rule newline() = tok(TokType::Newline, "NEWLINE")
        rule indent() = tok(TokType::Indent, "INDENT")
        rule dedent() = tok(TokType::Dedent, "DEDENT")
        rule end_marker() = tok(TokType::EndMarker, "EOF")
    }
}

fn attach_decorators(target: Statement, decorators: Vec<Decorator>) -> Statement {
    let start = decorators.first().map(|d| d.span.start);
    match target {
        Statement::FunctionDef(mut f) => {
            if let Some(start) = start {
                f.span.start = start;
            }
            f.decorators = decorators;
            Statement::FunctionDef(f)
        }
        Statement::ClassDef(mut c) => {
            if let Some(start) = start {
                c.span.start = start;
            }
            c.decorators = decorators;
            Statement::ClassDef(c)
        }
        other => other,
    }
}

fn resolve_params(pieces: Vec<ParamPiece>, src: &str) -> Vec<Param> {
    let mut params: Vec<Param> = Vec::new();
    let mut keyword_only = false;
    for piece in pieces {
        match piece {
            ParamPiece::PositionalOnlyMarker => {
                for p in params.iter_mut().filter(|p| p.kind == ParamKind::Regular) {
                    p.kind = ParamKind::PositionalOnly;
                }
            }
            ParamPiece::KeywordOnlyMarker => keyword_only = true,
            ParamPiece::Named {
                name,
                kind,
                annotation,
            } => {
                let kind = match kind {
                    ParamKind::Regular if keyword_only => ParamKind::KeywordOnly,
                    ParamKind::VarArgs => {
                        keyword_only = true;
                        kind
                    }
                    other => other,
                };
                params.push(Param {
                    name: name.text(src).to_string(),
                    name_span: name.span,
                    kind,
                    annotation,
                });
            }
        }
    }
    params
}

fn annotation(toks: &[Token], src: &str) -> Annotation {
    let span = covering_span(toks);
    Annotation {
        text: src[span.start..span.end].to_string(),
        span,
    }
}

fn compound_statement(
    kw: Token,
    colon: Token,
    body: Vec<Statement>,
    src: &str,
) -> CompoundStatement {
    let end = body.last().map_or(colon.span.end, |s| s.span().end);
    CompoundStatement {
        keyword: kw.text(src).to_string(),
        body,
        span: Span::new(kw.span.start, end),
        line: kw.line,
    }
}

fn aliases(
    first: (ImportAlias, Token),
    rest: Vec<(ImportAlias, Token)>,
) -> (Vec<ImportAlias>, Token) {
    let mut last = first.1;
    let mut names = vec![first.0];
    for (alias, end) in rest {
        names.push(alias);
        last = end;
    }
    (names, last)
}

// ============================================================================
// Small statement classification
// ============================================================================

fn classify(toks: &[Token], src: &str) -> SmallStatement {
    let kind = match toks.first() {
        Some(head) if head.kind == TokType::Name && STATEMENT_KEYWORDS.contains(&head.text(src)) => {
            SmallStatementKind::Other
        }
        _ => match assignment_targets(toks, src) {
            Some(targets) => SmallStatementKind::Assign { targets },
            None => SmallStatementKind::Expr {
                plain_string: is_plain_string(toks, src),
            },
        },
    };
    SmallStatement {
        kind,
        span: covering_span(toks),
        line: toks.first().map_or(1, |t| t.line),
    }
}

/// Plain names bound by an assignment, or `None` when `toks` is not one.
fn assignment_targets(toks: &[Token], src: &str) -> Option<Vec<String>> {
    // `type X = ...` and `type X[T] = ...`
    if let [head, alias, next, ..] = toks {
        if head.is_name(src, "type")
            && alias.kind == TokType::Name
            && (next.is_op(src, "=") || next.is_op(src, "["))
        {
            return Some(vec![alias.text(src).to_string()]);
        }
    }

    let mut depth = 0usize;
    let mut segment_start = 0;
    let mut targets = Vec::new();
    let mut is_assignment = false;
    for (idx, tok) in toks.iter().enumerate() {
        if tok.is_name(src, "lambda") && depth == 0 {
            break;
        }
        if tok.kind != TokType::Op {
            continue;
        }
        match tok.text(src) {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            "=" if depth == 0 => {
                bound_names(&toks[segment_start..idx], src, &mut targets);
                segment_start = idx + 1;
                is_assignment = true;
            }
            ":" if depth == 0 && !is_assignment => {
                // Annotated assignment: the target precedes the colon.
                bound_names(&toks[..idx], src, &mut targets);
                return Some(targets);
            }
            op if depth == 0 && !is_assignment && AUGMENTED_ASSIGN_OPS.contains(&op) => {
                bound_names(&toks[..idx], src, &mut targets);
                return Some(targets);
            }
            _ => {}
        }
    }
    is_assignment.then_some(targets)
}

/// Names bound by one assignment target: `x`, `a, *b`, `(a, [b, c])`.
fn bound_names(target: &[Token], src: &str, out: &mut Vec<String>) {
    for item in split_top_level(target, src, ",") {
        let item = match item.split_first() {
            Some((star, rest)) if star.is_op(src, "*") => rest,
            _ => item,
        };
        match item {
            [name] if name.kind == TokType::Name => out.push(name.text(src).to_string()),
            _ => {
                if let Some(inner) = unwrap_brackets(item, src, &["(", "["]) {
                    bound_names(inner, src, out);
                }
            }
        }
    }
}

fn split_top_level<'t>(toks: &'t [Token], src: &str, sep: &str) -> Vec<&'t [Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, tok) in toks.iter().enumerate() {
        if tok.kind != TokType::Op {
            continue;
        }
        match tok.text(src) {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            text if depth == 0 && text == sep => {
                parts.push(&toks[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if start < toks.len() {
        parts.push(&toks[start..]);
    }
    parts
}

/// The tokens inside `toks` when the whole run is one bracketed group
/// opened by one of `openers`.
fn unwrap_brackets<'t>(toks: &'t [Token], src: &str, openers: &[&str]) -> Option<&'t [Token]> {
    let first = toks.first()?;
    if first.kind != TokType::Op || !openers.contains(&first.text(src)) {
        return None;
    }
    let mut depth = 0usize;
    for (idx, tok) in toks.iter().enumerate() {
        if tok.kind != TokType::Op {
            continue;
        }
        match tok.text(src) {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (idx == toks.len() - 1).then(|| &toks[1..idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// A `str` literal, possibly parenthesized or implicitly concatenated.
fn is_plain_string(toks: &[Token], src: &str) -> bool {
    let mut toks = toks;
    while let Some(inner) = unwrap_brackets(toks, src, &["("]) {
        toks = inner;
    }
    !toks.is_empty()
        && toks.iter().all(|t| {
            t.kind == TokType::String
                && !t
                    .text(src)
                    .chars()
                    .take_while(|c| c.is_ascii_alphabetic())
                    .any(|c| c.eq_ignore_ascii_case(&'b'))
        })
}

fn covering_span(toks: &[Token]) -> Span {
    match (toks.first(), toks.last()) {
        (Some(first), Some(last)) => Span::new(first.span.start, last.span.end),
        _ => Span::empty_at(0),
    }
}
