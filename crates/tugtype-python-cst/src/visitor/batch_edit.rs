// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Batch edit infrastructure for applying multiple span-based edits at once.
//!
//! Every edit is an insertion at a byte offset of the original source;
//! annotations and import blocks are only ever added, never replaced.
//!
//! # Example
//!
//! ```
//! use tugtype_python_cst::visitor::{BatchSpanEditor, EditPrimitive};
//!
//! let source = "def f(x):\n    return x\n";
//!
//! let mut editor = BatchSpanEditor::new(source);
//! editor.add(EditPrimitive::InsertAt {
//!     position: 7,
//!     text: ": int".to_string(),
//! });
//! editor.add(EditPrimitive::InsertAt {
//!     position: 8,
//!     text: " -> int".to_string(),
//! });
//!
//! let result = editor.apply().unwrap();
//! assert_eq!(result, "def f(x: int) -> int:\n    return x\n");
//! ```

use tugtype_core::patch::Span;

/// An atomic edit operation on source text.
///
/// Edit primitives are collected and applied in reverse position order
/// so that earlier offsets stay valid as text lengths change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPrimitive {
    /// Insert text at an absolute byte position.
    InsertAt { position: usize, text: String },
}

impl EditPrimitive {
    /// Returns the insertion point (byte offset where new text begins).
    pub fn insertion_point(&self) -> usize {
        match self {
            EditPrimitive::InsertAt { position, .. } => *position,
        }
    }

    fn text(&self) -> &str {
        match self {
            EditPrimitive::InsertAt { text, .. } => text,
        }
    }
}

/// Error type for batch edit operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEditError {
    /// Two edits touch the same source text, or insert at the same position.
    OverlappingEdits { edit1_span: Span, edit2_span: Span },

    /// An edit span extends beyond source length.
    SpanOutOfBounds { span: Span, source_len: usize },

    /// An edit position falls inside a multi-byte character.
    NotCharBoundary { position: usize },
}

impl std::fmt::Display for BatchEditError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchEditError::OverlappingEdits {
                edit1_span,
                edit2_span,
            } => {
                write!(f, "overlapping edits: {} and {}", edit1_span, edit2_span)
            }
            BatchEditError::SpanOutOfBounds { span, source_len } => {
                write!(
                    f,
                    "span {} is out of bounds for source of length {}",
                    span, source_len
                )
            }
            BatchEditError::NotCharBoundary { position } => {
                write!(f, "position {} is not a character boundary", position)
            }
        }
    }
}

impl std::error::Error for BatchEditError {}

/// Result type for batch edit operations.
pub type BatchEditResult<T> = Result<T, BatchEditError>;

/// A batch editor that collects edit primitives and applies them in one pass.
///
/// All spans refer to the original source. An empty batch returns the
/// source unchanged.
pub struct BatchSpanEditor<'src> {
    source: &'src str,
    edits: Vec<EditPrimitive>,
}

impl<'src> BatchSpanEditor<'src> {
    /// Create a new BatchSpanEditor for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            edits: Vec::new(),
        }
    }

    /// Add an edit primitive to the batch.
    pub fn add(&mut self, edit: EditPrimitive) {
        self.edits.push(edit);
    }

    /// Returns true if no edits are queued.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Apply all queued edits and return the transformed source.
    ///
    /// # Errors
    ///
    /// - `BatchEditError::SpanOutOfBounds` if any position exceeds source length
    /// - `BatchEditError::NotCharBoundary` if any position splits a character
    /// - `BatchEditError::OverlappingEdits` if two insertions share a position
    pub fn apply(mut self) -> BatchEditResult<String> {
        let source_len = self.source.len();
        for edit in &self.edits {
            let position = edit.insertion_point();
            if position > source_len {
                return Err(BatchEditError::SpanOutOfBounds {
                    span: Span::empty_at(position),
                    source_len,
                });
            }
            if !self.source.is_char_boundary(position) {
                return Err(BatchEditError::NotCharBoundary { position });
            }
        }

        self.edits
            .sort_by_key(|edit| std::cmp::Reverse(edit.insertion_point()));
        for pair in self.edits.windows(2) {
            let (later, earlier) = (pair[0].insertion_point(), pair[1].insertion_point());
            if later == earlier {
                return Err(BatchEditError::OverlappingEdits {
                    edit1_span: Span::empty_at(earlier),
                    edit2_span: Span::empty_at(later),
                });
            }
        }

        let mut result = self.source.to_string();
        for edit in &self.edits {
            result.insert_str(edit.insertion_point(), edit.text());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_at(position: usize, text: &str) -> EditPrimitive {
        EditPrimitive::InsertAt {
            position,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_multiple_insertions_in_any_order() {
        let source = "def f(a, b=1):\n    pass\n";
        let mut editor = BatchSpanEditor::new(source);
        editor.add(insert_at(13, " -> int"));
        editor.add(insert_at(7, ": str"));
        editor.add(insert_at(10, ": int"));
        assert_eq!(
            editor.apply().unwrap(),
            "def f(a: str, b: int=1) -> int:\n    pass\n"
        );
    }

    #[test]
    fn test_insert_at_file_start_and_end() {
        let source = "x = 1\n";
        let mut editor = BatchSpanEditor::new(source);
        editor.add(insert_at(0, "import os\n"));
        editor.add(insert_at(source.len(), "y = 2\n"));
        assert_eq!(editor.apply().unwrap(), "import os\nx = 1\ny = 2\n");
    }

    #[test]
    fn test_same_point_insertions_rejected() {
        let mut editor = BatchSpanEditor::new("def f(x): pass");
        editor.add(insert_at(7, ": int"));
        editor.add(insert_at(7, ": str"));
        assert!(matches!(
            editor.apply(),
            Err(BatchEditError::OverlappingEdits { .. })
        ));
    }

    #[test]
    fn test_adjacent_insertions_allowed() {
        let mut editor = BatchSpanEditor::new("ab");
        editor.add(insert_at(1, "X"));
        editor.add(insert_at(2, "Y"));
        assert_eq!(editor.apply().unwrap(), "aXbY");
    }

    #[test]
    fn test_position_out_of_bounds_error() {
        let mut editor = BatchSpanEditor::new("short");
        editor.add(insert_at(10, "x"));
        assert!(matches!(
            editor.apply(),
            Err(BatchEditError::SpanOutOfBounds { source_len: 5, .. })
        ));
    }

    #[test]
    fn test_unicode_multibyte_positions() {
        let source = "def f(é): pass";
        let name = source.find('é').unwrap();
        let mut editor = BatchSpanEditor::new(source);
        editor.add(insert_at(name + 'é'.len_utf8(), ": str"));
        assert_eq!(editor.apply().unwrap(), "def f(é: str): pass");

        let mut editor = BatchSpanEditor::new(source);
        editor.add(insert_at(name + 1, "x"));
        assert!(matches!(
            editor.apply(),
            Err(BatchEditError::NotCharBoundary { .. })
        ));
    }

    #[test]
    fn test_empty_batch_returns_source() {
        let editor = BatchSpanEditor::new("x = 1\n");
        assert!(editor.is_empty());
        assert_eq!(editor.apply().unwrap(), "x = 1\n");
    }
}
