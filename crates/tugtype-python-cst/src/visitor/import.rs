// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! ImportCollector visitor for module-level import extraction.
//!
//! Collects the imports that bind names in the module namespace: statements
//! at module level, including those nested in module-level `if`/`try`/`with`
//! blocks. Imports inside function and class bodies are not collected.
//!
//! - **import statements**: `import os`, `import os.path`, `import os as o`
//! - **from imports**: `from os import path`, `from os import path as p`
//! - **star imports**: `from os import *`
//! - **relative imports**: `from . import foo`, `from ..utils import bar`

use super::dispatch::walk_module;
use super::traits::{VisitResult, Visitor};
use crate::nodes::{ClassDef, FunctionDef, Module, SmallStatement, SmallStatementKind, Span};

/// The kind of import statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// Regular import (`import os`).
    Import,
    /// From import (`from os import path`).
    From,
}

/// A single imported name within a from-import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    /// The imported name.
    pub name: String,
    /// The alias if using `as` clause.
    pub alias: Option<String>,
}

impl ImportedName {
    /// The name bound in the importing module.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// One imported module or one from-import statement.
///
/// `import a, b` yields two entries; `from m import a, b` yields one entry
/// with two names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportInfo {
    /// The kind of import.
    pub kind: ImportKind,
    /// The module being imported (full dotted path, without leading dots).
    pub module: String,
    /// Alias for the whole module (for `import x as y`).
    pub alias: Option<String>,
    /// Individual names being imported (for from imports).
    pub names: Option<Vec<ImportedName>>,
    /// Whether this is a star import (`from x import *`).
    pub is_star: bool,
    /// Number of leading dots for relative imports.
    pub relative_level: usize,
    /// Source span for the import statement.
    pub span: Span,
    /// Line number (1-indexed).
    pub line: u32,
}

impl ImportInfo {
    /// The name a plain `import` binds: the alias, or the first dotted component.
    pub fn bound_name(&self) -> Option<&str> {
        if self.kind != ImportKind::Import {
            return None;
        }
        match &self.alias {
            Some(alias) => Some(alias),
            None => self.module.split('.').next(),
        }
    }
}

/// A visitor that collects module-level imports.
pub struct ImportCollector {
    /// Collected imports.
    imports: Vec<ImportInfo>,
}

impl Default for ImportCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportCollector {
    /// Create a new ImportCollector.
    pub fn new() -> Self {
        Self {
            imports: Vec::new(),
        }
    }

    /// Collect imports from a parsed module, in the order they were encountered.
    pub fn collect(module: &Module) -> Vec<ImportInfo> {
        let mut collector = ImportCollector::new();
        walk_module(&mut collector, module);
        collector.imports
    }
}

impl Visitor for ImportCollector {
    fn visit_function_def(&mut self, _node: &FunctionDef) -> VisitResult {
        VisitResult::SkipChildren
    }

    fn visit_class_def(&mut self, _node: &ClassDef) -> VisitResult {
        VisitResult::SkipChildren
    }

    fn visit_small_statement(&mut self, node: &SmallStatement) {
        match &node.kind {
            SmallStatementKind::Import(import) => {
                for alias in &import.names {
                    self.imports.push(ImportInfo {
                        kind: ImportKind::Import,
                        module: alias.name.clone(),
                        alias: alias.alias.clone(),
                        names: None,
                        is_star: false,
                        relative_level: 0,
                        span: node.span,
                        line: node.line,
                    });
                }
            }
            SmallStatementKind::ImportFrom(from) => {
                let names = (!from.is_star).then(|| {
                    from.names
                        .iter()
                        .map(|n| ImportedName {
                            name: n.name.clone(),
                            alias: n.alias.clone(),
                        })
                        .collect()
                });
                self.imports.push(ImportInfo {
                    kind: ImportKind::From,
                    module: from.module.clone(),
                    alias: None,
                    names,
                    is_star: from.is_star,
                    relative_level: from.relative_level,
                    span: node.span,
                    line: node.line,
                });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_module;

    fn collect(source: &str) -> Vec<ImportInfo> {
        ImportCollector::collect(&parse_module(source).unwrap())
    }

    #[test]
    fn test_plain_imports() {
        let imports = collect("import os, os.path as p\nimport abc\n");
        assert_eq!(imports.len(), 3);
        assert_eq!(imports[0].bound_name(), Some("os"));
        assert_eq!(imports[1].bound_name(), Some("p"));
        assert_eq!(imports[2].module, "abc");
        assert_eq!(imports[2].line, 2);
    }

    #[test]
    fn test_from_imports() {
        let imports = collect("from abc import abstractmethod as am, ABC\n");
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].kind, ImportKind::From);
        assert_eq!(imports[0].bound_name(), None);
        let names = imports[0].names.as_ref().unwrap();
        assert_eq!(names[0].local_name(), "am");
        assert_eq!(names[1].local_name(), "ABC");
    }

    #[test]
    fn test_star_import_has_no_names() {
        let imports = collect("from os import *\n");
        assert!(imports[0].is_star);
        assert!(imports[0].names.is_none());
    }

    #[test]
    fn test_nested_scopes_are_skipped() {
        let source = "try:\n    import json\nexcept ImportError:\n    json = None\n\ndef f():\n    import sys\n\nclass C:\n    import re\n";
        let imports = collect(source);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].module, "json");
    }
}
