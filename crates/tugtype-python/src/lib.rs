//! Python annotation support for tugtype.
//!
//! This crate holds the language side of the annotate pipeline:
//! - Module resolution against application directories
//! - Scanning for definitions with incomplete annotations
//! - Normalizing oracle-reported type names for insertion
//! - Import insertion and header rewriting

pub mod files;
pub mod imports;
pub mod normalize;
pub mod resolver;
pub mod rewrite;
pub mod scanner;
pub mod types;

pub use files::{collect_python_files, FileError, FileResult};
pub use imports::{add_imports, plan_import_insertion, ImportInsertion};
pub use normalize::{normalize_type, NormalizeContext, NormalizeError, NormalizedType, TypeExpr};
pub use resolver::{to_module_name, ModuleResolver};
pub use rewrite::{rewrite_source, RewriteError, RewriteOutcome};
pub use scanner::{find_untyped, untyped_definitions};
pub use types::{Candidate, FileSuggestions, ModuleId, Signature, SuggestionMap};
