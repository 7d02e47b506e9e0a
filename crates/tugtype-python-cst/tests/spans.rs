// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Span fidelity tests for the tugtype-python-cst parser.
//!
//! Every span the parser reports must slice exactly the source text it
//! describes; the rewriting passes depend on it.

use tugtype_python_cst::nodes::{SmallStatementKind, Statement};
use tugtype_python_cst::{parse_module, ImportCollector, SignatureCollector};

const SAMPLE: &str = r#""""Module docstring."""
from __future__ import annotations

import abc
from typing import (
    Any,
    Optional,
)

CONSTANT = {"a": 1, "b": [1, 2, 3]}


class Base(abc.ABC):
    """Class docstring with a def f(x): inside."""

    @abc.abstractmethod
    def run(self, job): ...

    @property
    def name(self) -> str:
        return "base"


def process(items, *, limit: int = 10, key=lambda v: v, **options):
    # A comment with (unbalanced brackets
    def helper(x):
        return x
    return [helper(i) for i in items][:limit]


async def fetch(url: str,
                timeout=None) -> Optional[bytes]:
    s = f"{url!r:>10}"
    return None

if __name__ == "__main__":
    process([1, 2, 3])
"#;

fn slice(span: tugtype_python_cst::Span) -> &'static str {
    &SAMPLE[span.start..span.end]
}

#[test]
fn sample_parses_into_top_level_statements() {
    let module = parse_module(SAMPLE).unwrap();
    assert_eq!(module.body.len(), 9);

    let Statement::Simple(doc) = &module.body[0] else {
        panic!("expected docstring line");
    };
    assert_eq!(doc.body[0].kind, SmallStatementKind::Expr { plain_string: true });
    assert!(matches!(module.body[5], Statement::ClassDef(_)));
    assert!(matches!(module.body[8], Statement::Compound(_)));
}

#[test]
fn statement_spans_start_at_their_first_token() {
    let module = parse_module(SAMPLE).unwrap();
    let firsts: Vec<&str> = module
        .body
        .iter()
        .map(|s| slice(s.span()).split_whitespace().next().unwrap_or(""))
        .collect();
    assert_eq!(
        firsts,
        vec![
            "\"\"\"Module",
            "from",
            "import",
            "from",
            "CONSTANT",
            "class",
            "def",
            "async",
            "if"
        ]
    );
}

#[test]
fn parameter_and_annotation_spans_slice_source() {
    let module = parse_module(SAMPLE).unwrap();
    let signatures = SignatureCollector::collect(&module);
    let names: Vec<String> = signatures.iter().map(|s| s.qualified_name()).collect();
    assert_eq!(
        names,
        vec!["Base.run", "Base.name", "process", "process.helper", "fetch"]
    );

    let process = &signatures[2];
    let params: Vec<&str> = process.params.iter().map(|p| slice(p.span)).collect();
    assert_eq!(params, vec!["items", "limit", "key", "options"]);
    assert_eq!(process.params[1].annotation.as_deref(), Some("int"));
    assert!(process.params[2].annotation.is_none());
    assert_eq!(slice(process.close_paren_span), ")");

    let fetch = &signatures[4];
    assert_eq!(fetch.returns.as_deref(), Some("Optional[bytes]"));
    assert_eq!(slice(fetch.params[1].span), "timeout");
    assert_eq!(slice(fetch.colon_span), ":");
    assert_eq!(fetch.line, SAMPLE[..SAMPLE.find("async def").unwrap()].lines().count() as u32 + 1);
}

#[test]
fn decorators_are_recorded_in_order() {
    let module = parse_module(SAMPLE).unwrap();
    let signatures = SignatureCollector::collect(&module);
    assert_eq!(signatures[0].decorators, vec!["abc.abstractmethod"]);
    assert_eq!(signatures[1].decorators, vec!["property"]);
}

#[test]
fn module_level_imports() {
    let module = parse_module(SAMPLE).unwrap();
    let imports = ImportCollector::collect(&module);
    let modules: Vec<&str> = imports.iter().map(|i| i.module.as_str()).collect();
    assert_eq!(modules, vec!["__future__", "abc", "typing"]);
    assert_eq!(slice(imports[2].span), "from typing import (\n    Any,\n    Optional,\n)");
}

#[test]
fn syntax_errors_report_a_line() {
    let err = parse_module("def f(x:\n    pass\n").unwrap_err();
    assert!(err.line() >= 1);
    let err = parse_module("x = 1\n  y = 2\n").unwrap_err();
    assert_eq!(err.line(), 2);
}
