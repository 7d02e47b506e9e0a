//! Import insertion.
//!
//! New import lines go in one sorted block right before the first statement
//! that is neither the module docstring nor a `from __future__` import, or
//! at the end of the file when there is no such statement. Lines already in
//! the file are not added again.

use std::collections::{BTreeSet, HashSet};

use tugtype_core::text::line_start;
use tugtype_python_cst::nodes::{SmallStatementKind, Statement};
use tugtype_python_cst::{parse_module, Module, ParserResult};

const FUTURE_MODULE: &str = "__future__";

/// Where and what to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInsertion {
    /// Byte offset in the original source.
    pub position: usize,
    /// Text to insert, including line terminators.
    pub text: String,
    /// The import lines being added, sorted.
    pub lines: Vec<String>,
}

/// Plan the insertion of `imports` into `source`, already parsed as `module`.
///
/// Returns `None` when every requested line is already present.
pub fn plan_import_insertion(
    source: &str,
    module: &Module,
    imports: &BTreeSet<String>,
) -> Option<ImportInsertion> {
    let existing: HashSet<&str> = source.lines().map(|l| l.trim_end_matches('\r')).collect();
    let lines: Vec<String> = imports
        .iter()
        .filter(|line| !existing.contains(line.as_str()))
        .cloned()
        .collect();
    if lines.is_empty() {
        return None;
    }

    let eol = if source.contains("\r\n") { "\r\n" } else { "\n" };
    let mut block = String::new();
    for line in &lines {
        block.push_str(line);
        block.push_str(eol);
    }

    let anchor = module
        .body
        .iter()
        .enumerate()
        .find(|(idx, stmt)| !(*idx == 0 && is_docstring(stmt)) && !is_future_import(stmt));

    let (position, text) = match anchor {
        Some((_, stmt)) => (line_start(source, stmt.span().start), block),
        None if source.is_empty() || source.ends_with('\n') => (source.len(), block),
        None => (source.len(), format!("{}{}", eol, block)),
    };

    Some(ImportInsertion {
        position,
        text,
        lines,
    })
}

/// Insert `imports` into `source`.
pub fn add_imports(source: &str, imports: &BTreeSet<String>) -> ParserResult<String> {
    if imports.is_empty() {
        return Ok(source.to_string());
    }
    let module = parse_module(source)?;
    Ok(match plan_import_insertion(source, &module, imports) {
        Some(insertion) => {
            let mut out = String::with_capacity(source.len() + insertion.text.len());
            out.push_str(&source[..insertion.position]);
            out.push_str(&insertion.text);
            out.push_str(&source[insertion.position..]);
            out
        }
        None => source.to_string(),
    })
}

fn is_docstring(stmt: &Statement) -> bool {
    match stmt {
        Statement::Simple(line) => matches!(
            line.body.as_slice(),
            [small] if small.kind == SmallStatementKind::Expr { plain_string: true }
        ),
        _ => false,
    }
}

fn is_future_import(stmt: &Statement) -> bool {
    match stmt {
        Statement::Simple(line) => line.body.iter().any(|small| {
            matches!(
                &small.kind,
                SmallStatementKind::ImportFrom(from)
                    if from.module == FUTURE_MODULE && from.relative_level == 0
            )
        }),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(lines: &[&str]) -> BTreeSet<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_set_is_a_no_op() {
        assert_eq!(add_imports("", &set(&[])).unwrap(), "");
        assert_eq!(add_imports("x = (\n", &set(&[])).unwrap(), "x = (\n");
    }

    #[test]
    fn before_first_non_future_import() {
        let source = "from __future__ import annotations\n\nimport os\n";
        let expected =
            "from __future__ import annotations\n\nfrom baz import womp\nfrom foo import bar\nimport os\n";
        let imports = set(&["from foo import bar", "from baz import womp"]);
        assert_eq!(add_imports(source, &imports).unwrap(), expected);
    }

    #[test]
    fn body_is_only_future_import() {
        assert_eq!(
            add_imports("from __future__ import annotations", &set(&["from foo import bar"]))
                .unwrap(),
            "from __future__ import annotations\nfrom foo import bar\n"
        );
    }

    #[test]
    fn trivial_body() {
        assert_eq!(
            add_imports("# comment!\n", &set(&["from foo import bar"])).unwrap(),
            "# comment!\nfrom foo import bar\n"
        );
        assert_eq!(
            add_imports("", &set(&["from foo import bar"])).unwrap(),
            "from foo import bar\n"
        );
    }

    #[test]
    fn after_docstring() {
        let source = "\"\"\"hello world\"\"\"\nfrom __future__ import annotations\n";
        assert_eq!(
            add_imports(source, &set(&["from foo import bar"])).unwrap(),
            "\"\"\"hello world\"\"\"\nfrom __future__ import annotations\nfrom foo import bar\n"
        );
    }

    #[test]
    fn second_string_is_not_a_docstring() {
        let source = "\"\"\"doc\"\"\"\n'not a docstring'\n";
        assert_eq!(
            add_imports(source, &set(&["from foo import bar"])).unwrap(),
            "\"\"\"doc\"\"\"\nfrom foo import bar\n'not a docstring'\n"
        );
    }

    #[test]
    fn formatted_and_bytes_literals_are_not_docstrings() {
        for source in ["f\"{x}\"\nimport os\n", "b'raw'\nimport os\n", "Rb'x'\nimport os\n"] {
            let expected = format!("from foo import bar\n{}", source);
            assert_eq!(
                add_imports(source, &set(&["from foo import bar"])).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn parenthesized_and_prefixed_strings_are_docstrings() {
        for source in ["(\"doc\")\nimport os\n", "r'''doc'''\nimport os\n", "u'a' 'b'\nimport os\n"] {
            let split = source.find("import os").unwrap();
            let expected = format!("{}from foo import bar\n{}", &source[..split], &source[split..]);
            assert_eq!(
                add_imports(source, &set(&["from foo import bar"])).unwrap(),
                expected
            );
        }
    }

    #[test]
    fn before_decorators_of_first_definition() {
        let source = "@dataclass\nclass C:\n    x: int\n";
        assert_eq!(
            add_imports(source, &set(&["from foo import bar"])).unwrap(),
            "from foo import bar\n@dataclass\nclass C:\n    x: int\n"
        );
    }

    #[test]
    fn existing_lines_are_not_duplicated() {
        let source = "from b import C\n\ndef f(): ...\n";
        assert_eq!(
            add_imports(source, &set(&["from b import C"])).unwrap(),
            source
        );
        let once = add_imports(source, &set(&["from b import D", "from b import C"])).unwrap();
        assert_eq!(once, "from b import D\nfrom b import C\n\ndef f(): ...\n");
        assert_eq!(
            add_imports(&once, &set(&["from b import D", "from b import C"])).unwrap(),
            once
        );
    }

    #[test]
    fn crlf_sources_keep_their_line_endings() {
        let source = "import os\r\n";
        assert_eq!(
            add_imports(source, &set(&["from foo import bar"])).unwrap(),
            "from foo import bar\r\nimport os\r\n"
        );
    }

    #[test]
    fn plan_reports_position_and_lines() {
        let source = "\"\"\"doc\"\"\"\nimport os\n";
        let module = parse_module(source).unwrap();
        let plan =
            plan_import_insertion(source, &module, &set(&["from a import b", "import os"])).unwrap();
        assert_eq!(plan.position, source.find("import os").unwrap());
        assert_eq!(plan.lines, vec!["from a import b"]);
        assert_eq!(plan.text, "from a import b\n");
    }

    #[test]
    fn syntax_errors_propagate() {
        assert!(add_imports("def f(:\n", &set(&["from a import b"])).is_err());
    }
}
