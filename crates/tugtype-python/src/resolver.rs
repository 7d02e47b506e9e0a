//! Module resolution: canonical dotted names for source files.
//!
//! A file's module name is derived lexically from its path relative to the
//! configured application directories (search roots). No filesystem access
//! is performed; `/` and `\` are both accepted as separators.

use tracing::debug;

use crate::types::ModuleId;

/// Resolves file paths to dotted module names against ordered roots.
#[derive(Debug, Clone)]
pub struct ModuleResolver {
    roots: Vec<String>,
    base: Option<String>,
}

impl ModuleResolver {
    /// Create a resolver over `roots`, in priority order. An empty list means `.`.
    pub fn new<S: Into<String>>(roots: impl IntoIterator<Item = S>) -> Self {
        let mut roots: Vec<String> = roots.into_iter().map(Into::into).collect();
        if roots.is_empty() {
            roots.push(".".to_string());
        }
        ModuleResolver { roots, base: None }
    }

    /// Directory that relative paths are relative to, used when a path and a
    /// root disagree on being absolute.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Resolve `path` to a [`ModuleId`].
    pub fn resolve(&self, path: &str) -> ModuleId {
        ModuleId::new(path, self.module_name(path))
    }

    /// Dotted module name for `path`.
    ///
    /// Roots containing the file are preferred; among them the shortest
    /// relative path wins and ties go to the earliest root. When no root
    /// contains the file, the shortest relative path overall is used.
    pub fn module_name(&self, path: &str) -> String {
        let file = self.absolutize(path);
        let relatives: Vec<Vec<String>> = self
            .roots
            .iter()
            .map(|root| relative_components(&file, &self.absolutize(root)))
            .collect();

        let inside: Vec<&Vec<String>> = relatives
            .iter()
            .filter(|rel| !rel.iter().any(|c| c == ".."))
            .collect();
        let pool: Vec<&Vec<String>> = if inside.is_empty() {
            debug!("{} is outside every application directory", path);
            relatives.iter().collect()
        } else {
            inside
        };

        let Some(best) = pool.iter().copied().min_by_key(|rel| rendered_len(rel)) else {
            return String::new();
        };
        let ties = pool
            .iter()
            .filter(|rel| rendered_len(rel) == rendered_len(best))
            .count();
        if ties > 1 {
            debug!(
                "{} resolves equally under {} roots; using the earliest",
                path, ties
            );
        }

        dotted(best)
    }

    fn absolutize(&self, path: &str) -> Vec<String> {
        let parts = normalize_components(path);
        match &self.base {
            Some(base) if !is_absolute(path) => {
                let mut joined = format!("{}/", base);
                joined.push_str(path);
                normalize_components(&joined)
            }
            _ => parts,
        }
    }
}

/// Resolve `path` against `roots` without a base directory.
pub fn to_module_name(path: &str, roots: &[&str]) -> String {
    ModuleResolver::new(roots.iter().copied()).module_name(path)
}

fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/')
        || path.starts_with('\\')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

/// Split on both separators and fold `.` and `..` lexically.
fn normalize_components(path: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                if out.last().is_some_and(|last| last != "..") {
                    out.pop();
                } else {
                    out.push("..".to_string());
                }
            }
            _ => out.push(part.to_string()),
        }
    }
    out
}

/// Lexical relative path from `root` to `file`, both already normalized.
fn relative_components(file: &[String], root: &[String]) -> Vec<String> {
    let common = file
        .iter()
        .zip(root.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut rel: Vec<String> = std::iter::repeat_n("..".to_string(), root.len() - common).collect();
    rel.extend(file[common..].iter().cloned());
    rel
}

fn rendered_len(components: &[String]) -> usize {
    components.iter().map(|c| c.len()).sum::<usize>() + components.len().saturating_sub(1)
}

fn dotted(components: &[String]) -> String {
    let mut parts: Vec<&str> = components
        .iter()
        .map(String::as_str)
        .filter(|c| *c != "..")
        .collect();
    if let Some(last) = parts.last_mut() {
        *last = last
            .strip_suffix(".pyi")
            .or_else(|| last.strip_suffix(".py"))
            .unwrap_or(last);
    }
    if parts.len() > 1 && parts.last() == Some(&"__init__") {
        parts.pop();
    }
    parts.join(".")
}
