//! Python file collection utilities.
//!
//! Expands the command-line targets into the list of Python files to
//! annotate.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tugtype_core::error::TugError;
use walkdir::{DirEntry, WalkDir};

/// Directory names never descended into.
const EXCLUDED_DIRS: &[&str] = &["__pycache__", "node_modules", "venv", "target"];

// ============================================================================
// Error Types
// ============================================================================

/// Error type for file operations.
#[derive(Debug, Error)]
pub enum FileError {
    /// File not found.
    #[error("file not found: {path}")]
    NotFound { path: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ============================================================================
// Bridge: FileError -> TugError
// ============================================================================

impl From<FileError> for TugError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound { path } => TugError::FileNotFound { path },
            FileError::Io(io_err) => TugError::InternalError {
                message: format!("IO error: {}", io_err),
            },
        }
    }
}


/// Result type for file operations.
pub type FileResult<T> = Result<T, FileError>;

// ============================================================================
// File Collection
// ============================================================================

/// Collect Python files from files and directories.
///
/// Explicit files are taken as given, whatever their extension. Directories
/// are walked for `*.py`, skipping hidden directories and the usual
/// environment and build directories; each directory's files are sorted.
/// A path named twice is returned once, at its first position.
pub fn collect_python_files<P: AsRef<Path>>(targets: &[P]) -> FileResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for target in targets {
        let target = target.as_ref();
        if target.is_file() {
            push_unique(&mut files, target.to_path_buf());
        } else if target.is_dir() {
            for path in walk_python_files(target)? {
                push_unique(&mut files, path);
            }
        } else {
            return Err(FileError::NotFound {
                path: target.display().to_string(),
            });
        }
    }
    Ok(files)
}

fn walk_python_files(root: &Path) -> FileResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded(e));
    for entry in walker {
        let entry = entry.map_err(|e| {
            FileError::Io(e.into_io_error().unwrap_or_else(|| {
                io::Error::other("filesystem loop while walking directory")
            }))
        })?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "py") {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn is_excluded(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || EXCLUDED_DIRS.contains(&name.as_ref())
}

fn push_unique(files: &mut Vec<PathBuf>, path: PathBuf) {
    if !files.contains(&path) {
        files.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "").unwrap();
    }

    fn relative(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn walks_directories_with_exclusions() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "b.py");
        touch(root, "a.py");
        touch(root, "pkg/__init__.py");
        touch(root, "pkg/mod.py");
        touch(root, "pkg/notes.txt");
        touch(root, ".git/hook.py");
        touch(root, ".venv/lib/x.py");
        touch(root, "venv/lib/x.py");
        touch(root, "pkg/__pycache__/mod.py");
        touch(root, "node_modules/x.py");
        touch(root, "target/x.py");

        let files = collect_python_files(&[root]).unwrap();
        assert_eq!(
            relative(root, &files),
            vec!["a.py", "b.py", "pkg/__init__.py", "pkg/mod.py"]
        );
    }

    #[test]
    fn explicit_files_are_kept_in_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "z.py");
        touch(root, "script");
        touch(root, "a.py");

        let targets = [root.join("z.py"), root.join("script"), root.join("z.py")];
        let files = collect_python_files(&targets).unwrap();
        assert_eq!(relative(root, &files), vec!["z.py", "script"]);
    }

    #[test]
    fn hidden_root_is_still_walked() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join(".project");
        touch(&root, "m.py");
        let files = collect_python_files(&[&root]).unwrap();
        assert_eq!(relative(&root, &files), vec!["m.py"]);
    }

    #[test]
    fn missing_target_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = collect_python_files(&[dir.path().join("missing.py")]).unwrap_err();
        assert!(matches!(err, FileError::NotFound { .. }));
        assert!(err.to_string().contains("missing.py"));
    }
}
