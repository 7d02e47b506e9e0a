// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use super::{tokenize, TokType};

fn kinds_and_text(source: &str) -> Vec<(TokType, &str)> {
    tokenize(source)
        .unwrap()
        .into_iter()
        .map(|t| (t.kind, t.text(source)))
        .collect()
}

#[test]
fn test_identifiers_and_ops() {
    assert_eq!(
        kinds_and_text("x = y"),
        vec![
            (TokType::Name, "x"),
            (TokType::Op, "="),
            (TokType::Name, "y"),
            (TokType::Newline, ""),
            (TokType::EndMarker, ""),
        ]
    );
}

#[test]
fn test_longest_operator_wins() {
    let toks = kinds_and_text("def f() -> None: ...\n");
    assert!(toks.contains(&(TokType::Op, "->")));
    assert!(toks.contains(&(TokType::Op, "...")));
    let toks = kinds_and_text("x **= 2\n");
    assert!(toks.contains(&(TokType::Op, "**=")));
}

#[test]
fn test_indent_and_dedent() {
    let source = "def f():\n    pass\nx = 1\n";
    let kinds: Vec<TokType> = tokenize(source).unwrap().iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokType::Name,
            TokType::Name,
            TokType::Op,
            TokType::Op,
            TokType::Op,
            TokType::Newline,
            TokType::Indent,
            TokType::Name,
            TokType::Newline,
            TokType::Dedent,
            TokType::Name,
            TokType::Op,
            TokType::Number,
            TokType::Newline,
            TokType::EndMarker,
        ]
    );
}

#[test]
fn test_blank_and_comment_lines_produce_no_tokens() {
    let source = "# header\n\n   \nx = 1  # trailing\n";
    let toks = kinds_and_text(source);
    assert_eq!(toks[0], (TokType::Name, "x"));
    assert_eq!(toks.len(), 5);
}

#[test]
fn test_dedent_at_end_of_file() {
    let source = "class C:\n    def f(self):\n        pass";
    let toks = tokenize(source).unwrap();
    let dedents = toks.iter().filter(|t| t.kind == TokType::Dedent).count();
    assert_eq!(dedents, 2);
    assert_eq!(toks.last().unwrap().kind, TokType::EndMarker);
}

#[test]
fn test_newlines_inside_brackets_are_ignored() {
    let source = "def f(\n    x,\n    y,\n):\n    pass\n";
    let toks = tokenize(source).unwrap();
    let first_newline = toks.iter().position(|t| t.kind == TokType::Newline).unwrap();
    // `def f ( x , y , ) :` then NEWLINE
    assert_eq!(first_newline, 9);
    assert_eq!(toks[first_newline].line, 4);
}

#[test]
fn test_backslash_continuation() {
    let source = "x = 1 + \\\n    2\n";
    let kinds: Vec<TokType> = tokenize(source).unwrap().iter().map(|t| t.kind).collect();
    assert!(!kinds.contains(&TokType::Indent));
    assert_eq!(kinds.iter().filter(|k| **k == TokType::Newline).count(), 1);
}

#[test]
fn test_string_prefixes() {
    let toks = kinds_and_text("a = rb'x' + Rf\"{y}\" + u'z'\n");
    assert!(toks.contains(&(TokType::String, "rb'x'")));
    assert!(toks.contains(&(TokType::FStringStart, "Rf\"")));
    assert!(toks.contains(&(TokType::String, "u'z'")));
}

#[test]
fn test_triple_quoted_string_spans_lines() {
    let source = "\"\"\"doc\nstring\"\"\"\nx = 1\n";
    let toks = tokenize(source).unwrap();
    assert_eq!(toks[0].kind, TokType::String);
    assert_eq!(toks[0].text(source), "\"\"\"doc\nstring\"\"\"");
    assert_eq!(toks[0].line, 1);
    assert_eq!(toks[2].line, 3);
}

#[test]
fn test_escaped_quote_does_not_terminate() {
    let toks = kinds_and_text("s = 'it\\'s'\n");
    assert!(toks.contains(&(TokType::String, "'it\\'s'")));
}

#[test]
fn test_hash_inside_string_is_not_comment() {
    let toks = kinds_and_text("s = '# not a comment'\n");
    assert!(toks.contains(&(TokType::String, "'# not a comment'")));
}

#[test]
fn test_numbers() {
    let toks = kinds_and_text("x = 1e-5 + 0xFF + .5 + 1_000j\n");
    assert!(toks.contains(&(TokType::Number, "1e-5")));
    assert!(toks.contains(&(TokType::Number, "0xFF")));
    assert!(toks.contains(&(TokType::Number, ".5")));
    assert!(toks.contains(&(TokType::Number, "1_000j")));
}

#[test]
fn test_crlf_line_endings() {
    let source = "def f():\r\n    pass\r\n";
    let toks = tokenize(source).unwrap();
    assert_eq!(toks[5].kind, TokType::Newline);
    assert_eq!(toks[5].text(source), "\r\n");
    assert_eq!(toks[6].kind, TokType::Indent);
    assert_eq!(toks[7].line, 2);
}

#[test]
fn test_unterminated_string_is_error() {
    let err = tokenize("s = 'oops\nx = 1\n").unwrap_err();
    assert_eq!(err.line, 1);
    assert!(err.message.contains("unterminated"));
}

#[test]
fn test_bad_dedent_is_error() {
    let err = tokenize("if x:\n        a\n    b\n").unwrap_err();
    assert_eq!(err.line, 3);
}

#[test]
fn test_unmatched_bracket_is_error() {
    assert!(tokenize("x = (1\n").is_err());
    assert!(tokenize("x = 1)\n").is_err());
    assert!(tokenize("x = [1)\n").is_err());
}

#[test]
fn test_empty_source() {
    let toks = tokenize("").unwrap();
    assert_eq!(toks.len(), 1);
    assert_eq!(toks[0].kind, TokType::EndMarker);
}

fn fstring_tokens(source: &str) -> Vec<(TokType, &str)> {
    let mut toks = kinds_and_text(source);
    // Drop the trailing NEWLINE and ENDMARKER.
    toks.truncate(toks.len() - 2);
    toks
}

#[test]
fn test_fstring_is_split_into_parts() {
    assert_eq!(
        fstring_tokens("f'a {value} b'"),
        vec![
            (TokType::FStringStart, "f'"),
            (TokType::FStringString, "a "),
            (TokType::Op, "{"),
            (TokType::Name, "value"),
            (TokType::Op, "}"),
            (TokType::FStringString, " b"),
            (TokType::FStringEnd, "'"),
        ]
    );
}

#[test]
fn test_fstring_doubled_braces_are_text() {
    assert_eq!(
        fstring_tokens("f'{{just text}}'"),
        vec![
            (TokType::FStringStart, "f'"),
            (TokType::FStringString, "{{just text}}"),
            (TokType::FStringEnd, "'"),
        ]
    );
}

#[test]
fn test_fstring_format_spec_and_conversion() {
    assert_eq!(
        fstring_tokens("f'{value!r:>{width}}'"),
        vec![
            (TokType::FStringStart, "f'"),
            (TokType::Op, "{"),
            (TokType::Name, "value"),
            (TokType::Op, "!"),
            (TokType::Name, "r"),
            (TokType::Op, ":"),
            (TokType::FStringString, ">"),
            (TokType::Op, "{"),
            (TokType::Name, "width"),
            (TokType::Op, "}"),
            (TokType::Op, "}"),
            (TokType::FStringEnd, "'"),
        ]
    );
}

#[test]
fn test_fstring_colon_inside_brackets_is_not_a_spec() {
    let toks = fstring_tokens("f'{ {1: 2}[1] }'");
    assert!(toks.iter().all(|(kind, _)| *kind != TokType::FStringString));
    assert_eq!(toks.last(), Some(&(TokType::FStringEnd, "'")));
}

#[test]
fn test_fstring_field_reuses_enclosing_quote() {
    assert_eq!(
        fstring_tokens(r#"f"{d["]"]}""#),
        vec![
            (TokType::FStringStart, "f\""),
            (TokType::Op, "{"),
            (TokType::Name, "d"),
            (TokType::Op, "["),
            (TokType::String, "\"]\""),
            (TokType::Op, "]"),
            (TokType::Op, "}"),
            (TokType::FStringEnd, "\""),
        ]
    );
}

#[test]
fn test_nested_fstrings_with_same_quote() {
    assert_eq!(
        fstring_tokens("f'{f'{2}'}'"),
        vec![
            (TokType::FStringStart, "f'"),
            (TokType::Op, "{"),
            (TokType::FStringStart, "f'"),
            (TokType::Op, "{"),
            (TokType::Number, "2"),
            (TokType::Op, "}"),
            (TokType::FStringEnd, "'"),
            (TokType::Op, "}"),
            (TokType::FStringEnd, "'"),
        ]
    );
}

#[test]
fn test_fstring_escapes_keep_braces_structural() {
    assert_eq!(
        fstring_tokens(r"f'\N{BULLET} \{x}'"),
        vec![
            (TokType::FStringStart, "f'"),
            (TokType::FStringString, r"\N{BULLET} \"),
            (TokType::Op, "{"),
            (TokType::Name, "x"),
            (TokType::Op, "}"),
            (TokType::FStringEnd, "'"),
        ]
    );
}

#[test]
fn test_triple_quoted_fstring_spans_lines() {
    let source = "s = f'''a\n{b}\n'''\nx = 1\n";
    let toks = tokenize(source).unwrap();
    let end = toks
        .iter()
        .find(|t| t.kind == TokType::FStringEnd)
        .unwrap();
    assert_eq!(end.line, 3);
    let x = toks.iter().find(|t| t.text(source) == "x").unwrap();
    assert_eq!(x.line, 4);
}

#[test]
fn test_template_string_tokens() {
    assert_eq!(
        fstring_tokens("t'hi {name}'"),
        vec![
            (TokType::TStringStart, "t'"),
            (TokType::TStringString, "hi "),
            (TokType::Op, "{"),
            (TokType::Name, "name"),
            (TokType::Op, "}"),
            (TokType::TStringEnd, "'"),
        ]
    );
}

#[test]
fn test_unterminated_fstring_is_error() {
    let err = tokenize("s = f'{x}\ny = 1\n").unwrap_err();
    assert_eq!(err.line, 1);
    assert!(err.message.contains("unterminated"));
}

#[test]
fn test_single_closing_brace_in_fstring_is_error() {
    assert!(tokenize("s = f'a } b'\n").is_err());
}
