//! Data model shared by the scanner, the oracle client and the rewriter.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A Python source file and its canonical dotted module name.
///
/// Computed once per file by the resolver and used as a grouping key
/// everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    /// File path as given by the caller.
    pub path: String,
    /// Dotted module name (`pkg.mod`).
    pub name: String,
}

impl ModuleId {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        ModuleId {
            path: path.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.path)
    }
}

/// An under-annotated definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub module: ModuleId,
    /// `f` for a function, `C.f` for a method.
    pub qualified_name: String,
    /// Line of the `def` keyword.
    pub line: u32,
}

impl Candidate {
    /// `path:line`, the location form the inference daemon accepts.
    pub fn location(&self) -> String {
        format!("{}:{}", self.module.path, self.line)
    }
}

/// Suggested types for one definition.
///
/// `arg_types` excludes the bound receiver. Type strings are as reported by
/// the oracle and are normalized before insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub arg_types: Vec<String>,
    pub return_type: String,
}

impl Signature {
    pub fn new<S: Into<String>>(args: impl IntoIterator<Item = S>, ret: impl Into<String>) -> Self {
        Signature {
            arg_types: args.into_iter().map(Into::into).collect(),
            return_type: ret.into(),
        }
    }
}

/// Signatures of one file, keyed by definition line.
pub type FileSuggestions = BTreeMap<u32, Signature>;

/// Signatures of every file, keyed by module then line.
pub type SuggestionMap = BTreeMap<ModuleId, FileSuggestions>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_location_uses_path() {
        let candidate = Candidate {
            module: ModuleId::new("src/t.py", "t"),
            qualified_name: "C.f".to_string(),
            line: 12,
        };
        assert_eq!(candidate.location(), "src/t.py:12");
    }

    #[test]
    fn signature_deserializes_from_daemon_shape() {
        let sig: Signature =
            serde_json::from_str(r#"{"arg_types": ["int", "str"], "return_type": "None"}"#)
                .unwrap();
        assert_eq!(sig, Signature::new(["int", "str"], "None"));
    }

    #[test]
    fn suggestion_map_iterates_in_module_order() {
        let mut map = SuggestionMap::new();
        map.entry(ModuleId::new("b.py", "b")).or_default();
        map.entry(ModuleId::new("a.py", "a")).or_default();
        let names: Vec<&str> = map.keys().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
