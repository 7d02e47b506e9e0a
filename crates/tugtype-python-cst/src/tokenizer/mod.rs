// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Python tokenizer.
//!
//! Produces the token stream the grammar consumes. Every token carries the
//! byte span it covers in the original source and the 1-indexed line it
//! starts on, so later passes can edit the source text in place.
//!
//! Differences from CPython's tokenizer that matter to callers:
//!
//! - Comments and blank lines produce no tokens.
//! - `INDENT`/`DEDENT`/`NEWLINE` tokens have zero-width or newline-only spans.
//! - A leading UTF-8 byte order mark is skipped.
//!
//! Formatted and template strings are split the way Python 3.12 does it: a
//! start token for the prefix and opening quote, literal text tokens,
//! ordinary tokens for every replacement field, and an end token for the
//! closing quote. Replacement fields may reuse the enclosing quote
//! character (`f"{d["key"]}"`) and may nest to any depth.

use std::sync::LazyLock;

use memchr::{memchr2, memchr2_iter};
use regex::Regex;
use thiserror::Error;
use tugtype_core::patch::Span;

#[cfg(test)]
mod tests;

/// Kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokType {
    Name,
    Number,
    String,
    Op,
    Newline,
    Indent,
    Dedent,
    FStringStart,
    FStringString,
    FStringEnd,
    TStringStart,
    TStringString,
    TStringEnd,
    EndMarker,
}

/// One token of Python source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokType,
    pub span: Span,
    /// 1-indexed line of the first byte.
    pub line: u32,
}

impl Token {
    /// Source text covered by this token.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }

    /// True for an operator token with exactly this text.
    pub fn is_op(&self, source: &str, op: &str) -> bool {
        self.kind == TokType::Op && self.text(source) == op
    }

    /// True for a name token with exactly this text.
    pub fn is_name(&self, source: &str, name: &str) -> bool {
        self.kind == TokType::Name && self.text(source) == name
    }
}

/// Tokenizer failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct TokError {
    pub line: u32,
    pub message: String,
}

impl TokError {
    fn new(line: u32, message: impl Into<String>) -> Self {
        TokError {
            line,
            message: message.into(),
        }
    }
}

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\A[\p{L}\p{Nl}_][\p{L}\p{Nl}\p{Mn}\p{Mc}\p{Nd}\p{Pc}]*").expect("name pattern")
});

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\A(?:",
        r"0[xX](?:_?[0-9a-fA-F])+",
        r"|0[bB](?:_?[01])+",
        r"|0[oO](?:_?[0-7])+",
        r"|(?:(?:[0-9](?:_?[0-9])*)?\.[0-9](?:_?[0-9])*|[0-9](?:_?[0-9])*\.?)",
        r"(?:[eE][-+]?[0-9](?:_?[0-9])*)?[jJ]?",
        r")",
    ))
    .expect("number pattern")
});

// Longest operators first so the alternation prefers them.
static OPERATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\A(?:\*\*=|//=|>>=|<<=|\.\.\.",
        r"|\*\*|//|>>|<<|<=|>=|==|!=|->|\+=|-=|\*=|/=|%=|&=|\|=|\^=|@=|:=",
        r"|[-+*/%&|^~<>=@!.,:;()\[\]{}])",
    ))
    .expect("operator pattern")
});

const STRING_PREFIXES: &[&str] = &[
    "r", "u", "b", "f", "t", "br", "rb", "fr", "rf", "tr", "rt",
];

const TAB_SIZE: usize = 8;

/// Tokenize Python source.
///
/// # Errors
///
/// Unterminated strings, dedents that match no enclosing indentation level,
/// unbalanced brackets and characters that cannot start a token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TokError> {
    TokState::new(source).run()
}

/// An f-string or t-string being scanned.
#[derive(Debug, Clone, Copy)]
struct FormattedString {
    template: bool,
    quote: u8,
    triple: bool,
    raw: bool,
    line: u32,
}

impl FormattedString {
    fn middle_kind(&self) -> TokType {
        if self.template {
            TokType::TStringString
        } else {
            TokType::FStringString
        }
    }

    fn end_kind(&self) -> TokType {
        if self.template {
            TokType::TStringEnd
        } else {
            TokType::FStringEnd
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Literal text of a formatted string.
    Literal(FormattedString),
    /// Format spec after a top-level `:` in a replacement field.
    Spec(FormattedString),
    /// Expression part of a replacement field. `depth` is the bracket depth
    /// including the field's own `{`.
    Field { depth: usize },
}

struct TokState<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    indents: Vec<usize>,
    /// Open brackets, with the line each was opened on.
    brackets: Vec<(u8, u32)>,
    frames: Vec<Frame>,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl<'a> TokState<'a> {
    fn new(source: &'a str) -> Self {
        TokState {
            source,
            bytes: source.as_bytes(),
            pos: if source.starts_with('\u{feff}') { 3 } else { 0 },
            line: 1,
            indents: vec![0],
            brackets: Vec::new(),
            frames: Vec::new(),
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn push(&mut self, kind: TokType, start: usize, end: usize, line: u32) {
        self.tokens.push(Token {
            kind,
            span: Span::new(start, end),
            line,
        });
    }

    fn run(mut self) -> Result<Vec<Token>, TokError> {
        while self.pos < self.bytes.len() {
            match self.frames.last().copied() {
                Some(Frame::Literal(fstr)) => self.lex_formatted_text(fstr, false)?,
                Some(Frame::Spec(fstr)) => self.lex_formatted_text(fstr, true)?,
                Some(Frame::Field { .. }) => self.next_token()?,
                None => {
                    if self.at_line_start && self.brackets.is_empty() {
                        self.at_line_start = false;
                        if self.handle_indentation()? {
                            continue;
                        }
                    }
                    self.next_token()?;
                }
            }
        }

        if let Some(fstr) = self.frames.iter().find_map(|frame| match frame {
            Frame::Literal(fstr) | Frame::Spec(fstr) => Some(*fstr),
            Frame::Field { .. } => None,
        }) {
            return Err(TokError::new(fstr.line, "unterminated f-string literal"));
        }
        if let Some(&(open, line)) = self.brackets.last() {
            return Err(TokError::new(
                line,
                format!("'{}' was never closed", open as char),
            ));
        }

        let end = self.bytes.len();
        if matches!(
            self.tokens.last().map(|t| t.kind),
            Some(
                TokType::Name
                    | TokType::Number
                    | TokType::String
                    | TokType::Op
                    | TokType::FStringEnd
                    | TokType::TStringEnd
            )
        ) {
            self.push(TokType::Newline, end, end, self.line);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokType::Dedent, end, end, self.line);
        }
        self.push(TokType::EndMarker, end, end, self.line);
        Ok(self.tokens)
    }

    /// Measure indentation at the start of a physical line.
    ///
    /// Returns `true` when the line was blank or comment-only and has been
    /// consumed entirely.
    fn handle_indentation(&mut self) -> Result<bool, TokError> {
        let mut col = 0usize;
        while let Some(b) = self.peek(0) {
            match b {
                b' ' => col += 1,
                b'\t' => col = (col / TAB_SIZE + 1) * TAB_SIZE,
                b'\x0c' => col = 0,
                _ => break,
            }
            self.pos += 1;
        }

        match self.peek(0) {
            None => return Ok(true),
            Some(b'#') => {
                self.skip_comment();
                self.consume_newline();
                self.at_line_start = true;
                return Ok(true);
            }
            Some(b'\n') | Some(b'\r') => {
                self.consume_newline();
                self.at_line_start = true;
                return Ok(true);
            }
            Some(b'\\') if matches!(self.peek(1), Some(b'\n') | Some(b'\r')) => {
                // Continuation from an otherwise empty line: keep measuring.
                self.pos += 1;
                self.consume_newline();
                self.at_line_start = true;
                return Ok(true);
            }
            _ => {}
        }

        let current = self.indents.last().copied().unwrap_or(0);
        if col > current {
            self.indents.push(col);
            self.push(TokType::Indent, self.pos, self.pos, self.line);
        } else if col < current {
            while self.indents.last().is_some_and(|&top| top > col) {
                self.indents.pop();
                self.push(TokType::Dedent, self.pos, self.pos, self.line);
            }
            if self.indents.last().copied().unwrap_or(0) != col {
                return Err(TokError::new(
                    self.line,
                    "unindent does not match any outer indentation level",
                ));
            }
        }
        Ok(false)
    }

    fn skip_comment(&mut self) {
        self.pos = match memchr2(b'\n', b'\r', &self.bytes[self.pos..]) {
            Some(offset) => self.pos + offset,
            None => self.bytes.len(),
        };
    }

    /// Consume one `\n`, `\r\n` or `\r` and advance the line counter.
    fn consume_newline(&mut self) {
        match self.peek(0) {
            Some(b'\r') => {
                self.pos += 1;
                if self.peek(0) == Some(b'\n') {
                    self.pos += 1;
                }
            }
            Some(b'\n') => self.pos += 1,
            _ => return,
        }
        self.line += 1;
    }

    fn next_token(&mut self) -> Result<(), TokError> {
        let Some(b) = self.peek(0) else {
            return Ok(());
        };
        let start = self.pos;
        let line = self.line;

        match b {
            b' ' | b'\t' | b'\x0c' => self.pos += 1,
            b'#' => self.skip_comment(),
            b'\n' | b'\r' => {
                self.consume_newline();
                if self.brackets.is_empty() {
                    self.push(TokType::Newline, start, self.pos, line);
                    self.at_line_start = true;
                }
            }
            b'\\' => {
                self.pos += 1;
                if matches!(self.peek(0), Some(b'\n') | Some(b'\r')) {
                    self.consume_newline();
                } else {
                    return Err(TokError::new(
                        line,
                        "unexpected character after line continuation character",
                    ));
                }
            }
            b'\'' | b'"' => self.lex_string(start, "")?,
            b'0'..=b'9' => self.lex_number(),
            b'.' if self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.lex_number(),
            _ => {
                if let Some(m) = NAME_RE.find(self.rest()) {
                    let word = m.as_str();
                    let quoted = matches!(self.bytes.get(start + m.end()), Some(b'\'' | b'"'));
                    let prefix = word.to_ascii_lowercase();
                    self.pos = start + m.end();
                    if quoted && STRING_PREFIXES.contains(&prefix.as_str()) {
                        self.lex_string(start, &prefix)?;
                    } else {
                        self.push(TokType::Name, start, self.pos, line);
                    }
                } else {
                    self.lex_op()?;
                }
            }
        }
        Ok(())
    }

    /// Lex a string literal whose prefix starts at `start`; the opening
    /// quote is at the current position.
    fn lex_string(&mut self, start: usize, prefix: &str) -> Result<(), TokError> {
        let line = self.line;
        let quote = self.bytes[self.pos];
        let triple = self.peek(1) == Some(quote) && self.peek(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        let formatted = prefix.contains('f') || prefix.contains('t');
        if formatted {
            let fstr = FormattedString {
                template: prefix.contains('t'),
                quote,
                triple,
                raw: prefix.contains('r'),
                line,
            };
            let kind = if fstr.template {
                TokType::TStringStart
            } else {
                TokType::FStringStart
            };
            self.push(kind, start, self.pos, line);
            self.frames.push(Frame::Literal(fstr));
            return Ok(());
        }

        loop {
            let Some(offset) = memchr2(quote, b'\\', &self.bytes[self.pos..]) else {
                return Err(TokError::new(line, "unterminated string literal"));
            };
            let found = self.pos + offset;
            if !triple && memchr2(b'\n', b'\r', &self.bytes[self.pos..found]).is_some() {
                return Err(TokError::new(line, "unterminated string literal"));
            }
            if self.bytes[found] == b'\\' {
                // The escaped character never terminates the literal.
                self.pos = found + 2;
                if self.bytes.get(found + 1..found + 3) == Some(b"\r\n".as_slice()) {
                    self.pos += 1;
                }
                if self.pos > self.bytes.len() {
                    return Err(TokError::new(line, "unterminated string literal"));
                }
                continue;
            }
            if !triple {
                self.pos = found + 1;
                break;
            }
            if self.bytes.get(found + 1) == Some(&quote) && self.bytes.get(found + 2) == Some(&quote)
            {
                self.pos = found + 3;
                break;
            }
            self.pos = found + 1;
        }

        self.push(TokType::String, start, self.pos, line);
        self.line += count_line_breaks(&self.bytes[start..self.pos]);
        Ok(())
    }

    /// Scan literal text of a formatted string up to the next replacement
    /// field, the end of a format spec, or the closing quote.
    fn lex_formatted_text(&mut self, fstr: FormattedString, in_spec: bool) -> Result<(), TokError> {
        let start = self.pos;
        let line = self.line;

        loop {
            let Some(b) = self.peek(0) else {
                return Err(TokError::new(fstr.line, "unterminated f-string literal"));
            };
            match b {
                b'\\' => {
                    self.pos += 1;
                    match self.peek(0) {
                        // `\{` leaves the brace to open a field.
                        Some(b'{') | Some(b'}') | None => {}
                        Some(b'N') if !fstr.raw && self.peek(1) == Some(b'{') => {
                            self.pos += match memchr::memchr(b'}', &self.bytes[self.pos..]) {
                                Some(offset) => offset + 1,
                                None => 1,
                            };
                        }
                        Some(b'\n') | Some(b'\r') => self.consume_newline(),
                        Some(_) => self.pos += 1,
                    }
                }
                b'\n' | b'\r' => {
                    if !fstr.triple || in_spec {
                        return Err(TokError::new(fstr.line, "unterminated f-string literal"));
                    }
                    self.consume_newline();
                }
                b'{' if !in_spec && self.peek(1) == Some(b'{') => self.pos += 2,
                b'}' if !in_spec && self.peek(1) == Some(b'}') => self.pos += 2,
                b'{' => {
                    self.flush_text(fstr, start, line);
                    let open = self.pos;
                    self.pos += 1;
                    self.brackets.push((b'{', self.line));
                    self.push(TokType::Op, open, self.pos, self.line);
                    self.frames.push(Frame::Field {
                        depth: self.brackets.len(),
                    });
                    return Ok(());
                }
                b'}' if in_spec => {
                    // The field's closing brace is lexed as an operator.
                    self.flush_text(fstr, start, line);
                    self.frames.pop();
                    return Ok(());
                }
                b'}' => {
                    return Err(TokError::new(
                        self.line,
                        "f-string: single '}' is not allowed",
                    ))
                }
                _ if b == fstr.quote && self.closes(fstr) => {
                    if in_spec {
                        return Err(TokError::new(self.line, "f-string: expecting '}'"));
                    }
                    self.flush_text(fstr, start, line);
                    let end = self.pos + if fstr.triple { 3 } else { 1 };
                    self.push(fstr.end_kind(), self.pos, end, self.line);
                    self.pos = end;
                    self.frames.pop();
                    return Ok(());
                }
                _ => self.pos += 1,
            }
        }
    }

    fn closes(&self, fstr: FormattedString) -> bool {
        !fstr.triple || (self.peek(1) == Some(fstr.quote) && self.peek(2) == Some(fstr.quote))
    }

    fn flush_text(&mut self, fstr: FormattedString, start: usize, line: u32) {
        if self.pos > start {
            self.push(fstr.middle_kind(), start, self.pos, line);
        }
    }

    fn lex_number(&mut self) {
        let start = self.pos;
        let len = NUMBER_RE.find(self.rest()).map_or(1, |m| m.end());
        self.pos = start + len;
        self.push(TokType::Number, start, self.pos, self.line);
    }

    fn lex_op(&mut self) -> Result<(), TokError> {
        let start = self.pos;
        let Some(m) = OPERATOR_RE.find(self.rest()) else {
            let ch = self.rest().chars().next().unwrap_or('?');
            return Err(TokError::new(
                self.line,
                format!("invalid character '{}'", ch),
            ));
        };

        let b = self.bytes[start];
        let mut len = m.end();
        match b {
            b':' if self.field_depth() == Some(self.brackets.len()) => {
                // A top-level colon in a replacement field starts the format
                // spec, even when followed by `=`.
                len = 1;
            }
            b'(' | b'[' | b'{' => self.brackets.push((b, self.line)),
            b')' | b']' | b'}' => {
                let expected = match b {
                    b')' => b'(',
                    b']' => b'[',
                    _ => b'{',
                };
                match self.brackets.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => {
                        return Err(TokError::new(
                            self.line,
                            format!("unmatched '{}'", b as char),
                        ))
                    }
                }
            }
            _ => {}
        }

        self.pos = start + len;
        self.push(TokType::Op, start, self.pos, self.line);

        if let Some(depth) = self.field_depth() {
            if b == b'}' && self.brackets.len() < depth {
                self.frames.pop();
            } else if b == b':' && len == 1 && self.brackets.len() == depth {
                if let Some(fstr) = self.enclosing_string() {
                    self.frames.push(Frame::Spec(fstr));
                }
            }
        }
        Ok(())
    }

    /// Bracket depth of the innermost replacement field, if lexing one.
    fn field_depth(&self) -> Option<usize> {
        match self.frames.last() {
            Some(Frame::Field { depth }) => Some(*depth),
            _ => None,
        }
    }

    fn enclosing_string(&self) -> Option<FormattedString> {
        self.frames.iter().rev().find_map(|frame| match frame {
            Frame::Literal(fstr) | Frame::Spec(fstr) => Some(*fstr),
            Frame::Field { .. } => None,
        })
    }
}

/// Number of line breaks in `bytes`, counting `\r\n` once.
fn count_line_breaks(bytes: &[u8]) -> u32 {
    let mut count = 0;
    for idx in memchr2_iter(b'\n', b'\r', bytes) {
        if bytes[idx] == b'\n' && idx > 0 && bytes[idx - 1] == b'\r' {
            continue;
        }
        count += 1;
    }
    count
}
