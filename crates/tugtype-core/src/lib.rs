//! Core infrastructure for tugtype.
//!
//! This crate provides language-agnostic infrastructure:
//! - Span and content-hash primitives for text edits
//! - Text position utilities and unified diff generation
//! - Atomic file replacement
//! - Error types and error codes
//! - JSON output types for CLI responses

pub mod diff;
pub mod error;
pub mod fs;
pub mod output;
pub mod patch;
pub mod text;
