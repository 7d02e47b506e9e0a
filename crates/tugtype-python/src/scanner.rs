//! Untyped-definition scanner.
//!
//! Finds the module-level functions and methods of module-level classes
//! whose signatures are incomplete. Each rule is a small predicate over
//! [`SignatureInfo`], so callers can combine or test them independently.

use tracing::debug;
use tugtype_python_cst::{
    parse_module, ImportCollector, ImportInfo, ImportKind, Modifier, Module, ParamInfo,
    ParserResult, SignatureCollector, SignatureInfo,
};

use crate::types::{Candidate, ModuleId};

const ABC_MODULE: &str = "abc";
const ABSTRACT_METHOD: &str = "abstractmethod";
const INITIALIZER: &str = "__init__";

// ============================================================================
// Predicates
// ============================================================================

/// Definitions the oracle can answer for: not inside a function body, and at
/// most one class deep.
pub fn is_visible(sig: &SignatureInfo) -> bool {
    sig.function_depth == 0 && sig.class_depth <= 1
}

/// The bound receiver (`self`/`cls`), if the definition has one.
pub fn receiver(sig: &SignatureInfo) -> Option<&ParamInfo> {
    if !sig.is_method || sig.has_modifier(Modifier::Static) {
        return None;
    }
    sig.params.first().filter(|p| p.kind.is_positional())
}

/// Parameters excluding the bound receiver.
pub fn non_receiver_params(sig: &SignatureInfo) -> &[ParamInfo] {
    match receiver(sig) {
        Some(_) => &sig.params[1..],
        None => &sig.params,
    }
}

/// `__init__` with parameters besides the receiver needs no return annotation.
pub fn is_initializer_exempt(sig: &SignatureInfo) -> bool {
    sig.name == INITIALIZER && !non_receiver_params(sig).is_empty()
}

/// Decorator spellings that mark a definition abstract in this module.
pub fn abstract_markers(imports: &[ImportInfo]) -> Vec<String> {
    let mut markers = Vec::new();
    for import in imports.iter().filter(|i| i.module == ABC_MODULE) {
        match import.kind {
            ImportKind::Import => {
                if let Some(bound) = import.bound_name() {
                    markers.push(format!("{}.{}", bound, ABSTRACT_METHOD));
                }
            }
            ImportKind::From => {
                if import.relative_level > 0 {
                    continue;
                }
                let names = import.names.iter().flatten();
                markers.extend(
                    names
                        .filter(|n| n.name == ABSTRACT_METHOD)
                        .map(|n| n.local_name().to_string()),
                );
            }
        }
    }
    markers
}

/// Whether the definition carries one of the abstract markers.
pub fn is_abstract(sig: &SignatureInfo, markers: &[String]) -> bool {
    sig.decorators.iter().any(|d| markers.contains(d))
}

/// Whether the signature is missing annotations the oracle could supply.
pub fn needs_annotation(sig: &SignatureInfo) -> bool {
    let params = non_receiver_params(sig);
    if params.iter().any(|p| p.annotation.is_none()) {
        return true;
    }
    sig.returns.is_none() && !is_initializer_exempt(sig)
}

// ============================================================================
// Scanning
// ============================================================================

/// Definitions of an already-parsed module that need annotations, in
/// encounter order.
pub fn untyped_definitions(module: &Module) -> Vec<SignatureInfo> {
    let markers = abstract_markers(&ImportCollector::collect(module));
    SignatureCollector::collect(module)
        .into_iter()
        .filter(|sig| {
            if !is_visible(sig) {
                return false;
            }
            if is_abstract(sig, &markers) {
                debug!("skipping abstract {}", sig.qualified_name());
                return false;
            }
            needs_annotation(sig)
        })
        .collect()
}

/// Parse `source` and list its untyped definitions as candidates.
pub fn find_untyped(module: &ModuleId, source: &str) -> ParserResult<Vec<Candidate>> {
    let parsed = parse_module(source)?;
    Ok(untyped_definitions(&parsed)
        .into_iter()
        .map(|sig| Candidate {
            module: module.clone(),
            qualified_name: sig.qualified_name(),
            line: sig.line,
        })
        .collect())
}

// ============================================================================
// Tests
// ============================================================================
