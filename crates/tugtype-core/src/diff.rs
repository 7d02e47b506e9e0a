//! Unified diff generation utilities.
//!
//! Provides functions to generate standard unified diff format from edit information.
//! Hunks carry no context lines; each edit becomes one hunk.

use std::collections::BTreeMap;

use crate::patch::OutputEdit;
use crate::text::with_trailing_newline;

/// Generate a unified diff from edit information.
///
/// Groups edits by file (in path order) and produces one hunk per edit, with
/// new-side line numbers shifted by the net line delta of earlier hunks.
pub fn generate_unified_diff(edits: &[OutputEdit]) -> String {
    let mut by_file: BTreeMap<&str, Vec<&OutputEdit>> = BTreeMap::new();
    for edit in edits {
        by_file.entry(&edit.file).or_default().push(edit);
    }

    let mut diff = String::new();
    for (file, mut file_edits) in by_file {
        file_edits.sort_by_key(|e| e.line);
        diff.push_str(&format!("--- a/{}\n", file));
        diff.push_str(&format!("+++ b/{}\n", file));

        let mut delta: i64 = 0;
        for edit in file_edits {
            let old_count = edit.old_line_count();
            let new_count = edit.new_line_count();
            // Zero-length ranges name the line *before* the change.
            let old_start = if old_count == 0 {
                edit.line.saturating_sub(1)
            } else {
                edit.line
            };
            let new_start = if new_count == 0 {
                (i64::from(edit.line) - 1 + delta).max(0)
            } else {
                i64::from(edit.line) + delta
            };

            diff.push_str(&format!(
                "@@ -{},{} +{},{} @@\n",
                old_start, old_count, new_start, new_count
            ));
            for line in with_trailing_newline(&edit.old_text).lines() {
                diff.push_str(&format!("-{}\n", line));
            }
            for line in with_trailing_newline(&edit.new_text).lines() {
                diff.push_str(&format!("+{}\n", line));
            }

            delta += i64::from(new_count) - i64::from(old_count);
        }
    }

    diff
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(file: &str, line: u32, old_text: &str, new_text: &str) -> OutputEdit {
        OutputEdit {
            file: file.to_string(),
            line,
            old_text: old_text.to_string(),
            new_text: new_text.to_string(),
        }
    }

    #[test]
    fn generate_diff_single_replacement() {
        let edits = vec![edit("t.py", 1, "def f(x):\n", "def f(x: str) -> str:\n")];

        let diff = generate_unified_diff(&edits);

        assert_eq!(
            diff,
            "--- a/t.py\n+++ b/t.py\n@@ -1,1 +1,1 @@\n-def f(x):\n+def f(x: str) -> str:\n"
        );
    }

    #[test]
    fn insertion_shifts_later_hunks() {
        let edits = vec![
            edit("t.py", 3, "def f():\n", "def f() -> D:\n"),
            edit("t.py", 1, "", "from b import D\n"),
        ];

        let diff = generate_unified_diff(&edits);

        assert!(diff.contains("@@ -0,0 +1,1 @@\n+from b import D\n"));
        assert!(diff.contains("@@ -3,1 +4,1 @@\n-def f():\n+def f() -> D:\n"));
        // Hunks are emitted in line order regardless of input order.
        assert!(diff.find("+from b import D").unwrap() < diff.find("-def f():").unwrap());
    }

    #[test]
    fn files_are_grouped_in_path_order() {
        let edits = vec![
            edit("b.py", 1, "def g(y):\n", "def g(y: int):\n"),
            edit("a.py", 1, "def f(x):\n", "def f(x: int):\n"),
        ];

        let diff = generate_unified_diff(&edits);

        assert!(diff.find("--- a/a.py").unwrap() < diff.find("--- a/b.py").unwrap());
    }

    #[test]
    fn empty_edit_list_produces_empty_diff() {
        assert_eq!(generate_unified_diff(&[]), "");
    }
}
