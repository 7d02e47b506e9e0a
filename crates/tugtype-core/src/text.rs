//! Text position utilities for byte offset and line:column conversions.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count bytes, not characters

use crate::patch::Span;

// ============================================================================
// Position Conversions
// ============================================================================

/// Convert a byte offset to 1-indexed line and column.
///
/// If `offset` exceeds content length, returns position at end of content.
pub fn byte_offset_to_position(content: &[u8], offset: usize) -> (u32, u32) {
    let offset = offset.min(content.len());
    let mut line = 1u32;
    let mut col = 1u32;

    for &byte in &content[..offset] {
        if byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Convert a byte offset to its 1-indexed line number.
pub fn line_of_offset(content: &str, offset: usize) -> u32 {
    byte_offset_to_position(content.as_bytes(), offset).0
}

// ============================================================================
// Line Utilities
// ============================================================================

/// Byte offset of the start of the line containing `offset`.
pub fn line_start(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content.as_bytes()[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0)
}

/// Byte offset just past the line containing `offset` (after its `\n`, or end of content).
pub fn line_end_inclusive(content: &str, offset: usize) -> usize {
    let offset = offset.min(content.len());
    content.as_bytes()[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|i| offset + i + 1)
        .unwrap_or(content.len())
}

/// Expand a span to cover the full lines it touches, including the final newline.
pub fn full_lines(content: &str, span: &Span) -> Span {
    let start = line_start(content, span.start);
    let last = if span.end > span.start {
        span.end - 1
    } else {
        span.start
    };
    Span::new(start, line_end_inclusive(content, last.max(start)))
}

/// Extract the text content of a span as a string.
///
/// Returns `None` if the span extends beyond content bounds or splits a character.
pub fn extract_span_str<'a>(content: &'a str, span: &Span) -> Option<&'a str> {
    content.get(span.start..span.end)
}

/// Count the number of lines in the content.
pub fn line_count(content: &[u8]) -> u32 {
    let newlines = content.iter().filter(|&&b| b == b'\n').count() as u32;
    if content.is_empty() {
        0
    } else if content.last() == Some(&b'\n') {
        newlines
    } else {
        newlines + 1
    }
}

/// Ensure text ends with a newline (used when rendering whole-line diff hunks).
pub fn with_trailing_newline(text: &str) -> String {
    if text.is_empty() || text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{}\n", text)
    }
}

// ============================================================================
// Tests
// ============================================================================
