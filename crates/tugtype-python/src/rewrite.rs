//! Source rewriting: insert suggested annotations into definition headers.
//!
//! Every change is an insertion at a parser-reported offset (after a
//! parameter name, after the closing parenthesis, or at the import anchor),
//! applied in one [`BatchSpanEditor`] pass. Bytes outside those points are
//! never touched.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::{debug, warn};
use tugtype_core::error::TugError;
use tugtype_core::patch::{OutputEdit, Span};
use tugtype_core::text::{full_lines, line_of_offset, line_start, with_trailing_newline};
use tugtype_python_cst::{
    parse_module, BatchEditError, BatchSpanEditor, EditPrimitive, ParserError, SignatureInfo,
};

use crate::imports::plan_import_insertion;
use crate::normalize::{normalize_type, NormalizeContext, NormalizeError, NormalizedType};
use crate::scanner::{non_receiver_params, untyped_definitions};
use crate::types::{FileSuggestions, ModuleId, Signature};

/// Errors that stop a file from being rewritten.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("parse error: {0}")]
    Parse(#[from] ParserError),

    #[error("edit error: {0}")]
    Edit(#[from] BatchEditError),
}

// ============================================================================
// Bridge: RewriteError -> TugError
// ============================================================================

impl From<RewriteError> for TugError {
    fn from(err: RewriteError) -> Self {
        match err {
            RewriteError::Parse(parse_err) => TugError::InternalError {
                message: format!("rewritten source failed to parse: {}", parse_err),
            },
            RewriteError::Edit(edit_err) => TugError::ApplyError {
                message: edit_err.to_string(),
                file: None,
            },
        }
    }
}


/// Result of rewriting one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// The rewritten source (identical to the input when nothing applied).
    pub source: String,
    /// Parameter and return annotations inserted.
    pub annotations_added: usize,
    /// Import lines inserted, sorted.
    pub imports_added: Vec<String>,
    /// Line-level view of the changes, for diffs.
    pub edits: Vec<OutputEdit>,
    /// Suggestions matched to a definition and applied.
    pub signatures_applied: usize,
    /// Suggestions matched to a definition but rejected as malformed.
    pub signatures_skipped: usize,
}

impl RewriteOutcome {
    pub fn changed(&self) -> bool {
        self.annotations_added > 0 || !self.imports_added.is_empty()
    }
}

/// Why a suggestion was not applied.
#[derive(Debug, Error)]
enum SkipReason {
    #[error("oracle reported {found} argument types for {expected} parameters")]
    ArgumentCount { expected: usize, found: usize },

    #[error(transparent)]
    Malformed(#[from] NormalizeError),
}

/// Insertions planned for one definition header.
struct HeaderPlan {
    /// From the function name to the end of the header colon.
    header: Span,
    insertions: Vec<(usize, String)>,
    imports: BTreeSet<String>,
}

/// Apply `suggestions` (keyed by `def` line) to `source`.
pub fn rewrite_source(
    source: &str,
    module: &ModuleId,
    suggestions: &FileSuggestions,
) -> Result<RewriteOutcome, RewriteError> {
    let parsed = parse_module(source)?;
    let ctx = NormalizeContext::for_module(&module.name, &parsed);

    let mut by_line: BTreeMap<u32, SignatureInfo> = BTreeMap::new();
    for def in untyped_definitions(&parsed) {
        by_line.entry(def.line).or_insert(def);
    }

    let mut outcome = RewriteOutcome {
        source: source.to_string(),
        annotations_added: 0,
        imports_added: Vec::new(),
        edits: Vec::new(),
        signatures_applied: 0,
        signatures_skipped: 0,
    };
    let mut plans = Vec::new();
    let mut imports = BTreeSet::new();

    for (line, signature) in suggestions {
        let Some(def) = by_line.get(line) else {
            debug!("{}:{}: no untyped definition, ignoring suggestion", module.path, line);
            continue;
        };
        match plan_header(def, signature, &ctx) {
            Ok(plan) => {
                outcome.signatures_applied += 1;
                outcome.annotations_added += plan.insertions.len();
                imports.extend(plan.imports.iter().cloned());
                if !plan.insertions.is_empty() {
                    plans.push(plan);
                }
            }
            Err(reason) => {
                outcome.signatures_skipped += 1;
                warn!(
                    "{}:{}: skipping {}: {}",
                    module.path,
                    line,
                    def.qualified_name(),
                    reason
                );
            }
        }
    }

    let mut editor = BatchSpanEditor::new(source);
    for plan in &plans {
        for (position, text) in &plan.insertions {
            editor.add(EditPrimitive::InsertAt {
                position: *position,
                text: text.clone(),
            });
        }
    }

    if let Some(insertion) = plan_import_insertion(source, &parsed, &imports) {
        outcome.edits.push(import_output_edit(
            source,
            &module.path,
            insertion.position,
            &insertion.text,
        ));
        editor.add(EditPrimitive::InsertAt {
            position: insertion.position,
            text: insertion.text,
        });
        outcome.imports_added = insertion.lines;
    }

    if editor.is_empty() {
        return Ok(outcome);
    }

    outcome
        .edits
        .extend(plans.iter().map(|plan| header_output_edit(source, &module.path, plan)));
    outcome.source = editor.apply()?;
    Ok(outcome)
}

fn plan_header(
    def: &SignatureInfo,
    signature: &Signature,
    ctx: &NormalizeContext,
) -> Result<HeaderPlan, SkipReason> {
    let params = non_receiver_params(def);
    if params.len() != signature.arg_types.len() {
        return Err(SkipReason::ArgumentCount {
            expected: params.len(),
            found: signature.arg_types.len(),
        });
    }

    let arg_types = signature
        .arg_types
        .iter()
        .map(|t| normalize_type(t, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    let return_type = normalize_type(&signature.return_type, ctx)?;

    let mut plan = HeaderPlan {
        header: def.span.cover(&def.colon_span),
        insertions: Vec::new(),
        imports: BTreeSet::new(),
    };
    let mut add = |position: usize, prefix: &str, ty: NormalizedType| {
        plan.insertions.push((position, format!("{}{}", prefix, ty.text)));
        plan.imports.extend(ty.imports);
    };

    for (param, ty) in params.iter().zip(arg_types) {
        if param.annotation.is_some() {
            continue;
        }
        match ty {
            Some(ty) => add(param.span.end, ": ", ty),
            None => debug!("{}: no information for parameter {}", def.qualified_name(), param.name),
        }
    }
    if def.returns.is_none() {
        match return_type {
            Some(ty) => add(def.close_paren_span.end, " -> ", ty),
            None => debug!("{}: no information for return type", def.qualified_name()),
        }
    }

    Ok(plan)
}

/// Whole-line view of one rewritten header.
fn header_output_edit(source: &str, file: &str, plan: &HeaderPlan) -> OutputEdit {
    let lines = full_lines(source, &plan.header);
    let old_text = &source[lines.start..lines.end];

    let mut insertions: Vec<&(usize, String)> = plan.insertions.iter().collect();
    insertions.sort_by_key(|(position, _)| *position);
    let mut new_text = String::with_capacity(old_text.len());
    let mut cursor = lines.start;
    for (position, text) in insertions {
        new_text.push_str(&source[cursor..*position]);
        new_text.push_str(text);
        cursor = *position;
    }
    new_text.push_str(&source[cursor..lines.end]);

    OutputEdit {
        file: file.to_string(),
        line: line_of_offset(source, lines.start),
        old_text: with_trailing_newline(old_text),
        new_text: with_trailing_newline(&new_text),
    }
}

/// Whole-line view of the import block. An append to a file without a final
/// newline rewrites the last line.
fn import_output_edit(source: &str, file: &str, position: usize, text: &str) -> OutputEdit {
    if position == source.len() && !source.is_empty() && !source.ends_with('\n') {
        let start = line_start(source, position);
        let last = &source[start..];
        return OutputEdit {
            file: file.to_string(),
            line: line_of_offset(source, start),
            old_text: with_trailing_newline(last),
            new_text: format!("{}{}", last, text),
        };
    }
    OutputEdit {
        file: file.to_string(),
        line: line_of_offset(source, position),
        old_text: String::new(),
        new_text: text.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
