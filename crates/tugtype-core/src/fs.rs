//! File replacement helpers.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Write content to a file atomically using temp + rename.
///
/// The temp file is created in the target's directory so the final rename
/// stays on one filesystem. Readers see either the old or the new content,
/// never a partial write. Existing permissions are carried over.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())?;
    }

    temp.persist(path).map_err(|e| e.error)?;
    tracing::debug!("replaced {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.py");
        fs::write(&path, "def f(x):\n    pass\n").unwrap();

        atomic_write(&path, b"def f(x: int) -> None:\n    pass\n").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "def f(x: int) -> None:\n    pass\n"
        );
    }

    #[test]
    fn leaves_no_temp_files_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.py");
        fs::write(&path, "x = 1\n").unwrap();

        atomic_write(&path, b"x = 2\n").unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
