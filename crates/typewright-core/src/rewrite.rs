//! Span-anchored textual edits applied against one immutable snapshot of
//! each file. The boxing plan is computed for the whole corpus before any
//! write happens, so results are order-independent within one run and the
//! dry-run path shares the exact decision logic.

use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CoreError;
use crate::extract::ScannedFile;
use crate::graph::{NestingDepths, TypeGraph};
use crate::policy::{BoxConfig, BoxDecision, PolicyEngine};
use crate::types::{Field, WrapperKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub span: Range<usize>,
    pub replacement: String,
}

/// Applies edits in reverse offset order so earlier spans stay valid.
pub fn apply_edits(original: &str, edits: &[Edit]) -> String {
    let mut sorted: Vec<&Edit> = edits.iter().collect();
    sorted.sort_by_key(|e| e.span.start);
    let mut out = original.to_string();
    for edit in sorted.iter().rev() {
        out.replace_range(edit.span.clone(), &edit.replacement);
    }
    out
}

/// The rewritten declaration for a boxed field, or None when the declared
/// shape has no boxing rule (bare optional fields keep their shape).
pub fn boxed_type_expr(field: &Field) -> Option<String> {
    match field.wrapper {
        WrapperKind::Sequence | WrapperKind::OptionalSequence => {
            let from = format!("Vec<{}>", field.core_type);
            let to = format!("Vec<Box<{}>>", field.core_type);
            field
                .type_expr
                .contains(&from)
                .then(|| field.type_expr.replacen(&from, &to, 1))
        }
        WrapperKind::None if field.type_expr == field.core_type => {
            Some(format!("Box<{}>", field.core_type))
        }
        _ => None,
    }
}

/// One file's planned rewrite for the boxing pass. Carries the snapshot it
/// was computed against, so the eventual write diffs against that snapshot
/// and never against a re-read or a stand-in.
#[derive(Debug)]
pub struct FileRewrite {
    pub path: PathBuf,
    pub original: String,
    pub new_text: String,
    /// Human-readable per-field change lines.
    pub changes: Vec<String>,
    pub decisions: Vec<BoxDecision>,
}

/// Computes the full boxing plan for a corpus read up front: build the type
/// graph, precompute depths, evaluate the policy per field, and anchor each
/// edit to the exact (type, field) span so an unrelated same-named field is
/// never rewritten.
pub fn plan_boxing(files: &[ScannedFile], config: &BoxConfig) -> Result<Vec<FileRewrite>, CoreError> {
    let graph = TypeGraph::build(files);
    let depths = NestingDepths::compute(&graph);
    let engine = PolicyEngine::new(config, &graph, &depths)?;

    let mut rewrites = Vec::new();
    for file in files {
        let mut edits = Vec::new();
        let mut changes = Vec::new();
        let mut decisions = Vec::new();
        for def in &file.defs {
            for field in &def.fields {
                let Some(strategy) = engine.evaluate(def, field) else {
                    continue;
                };
                let Some(replacement) = boxed_type_expr(field) else {
                    debug!(
                        "{}.{}: `{}` has no boxing rule for its declared shape",
                        def.name, field.name, field.type_expr
                    );
                    continue;
                };
                changes.push(format!(
                    "  {}.{}: {} -> {} ({})",
                    def.name, field.name, field.type_expr, replacement, strategy
                ));
                decisions.push(BoxDecision {
                    type_name: def.name.clone(),
                    field_name: field.name.clone(),
                    strategy,
                });
                edits.push(Edit {
                    span: field.type_span.clone(),
                    replacement,
                });
            }
        }
        if edits.is_empty() {
            continue;
        }
        rewrites.push(FileRewrite {
            path: file.path.clone(),
            original: file.text.clone(),
            new_text: apply_edits(&file.text, &edits),
            changes,
            decisions,
        });
    }
    Ok(rewrites)
}

/// Writes only when the text differs from the in-memory snapshot of the
/// original; returns whether a write happened.
pub fn write_if_changed(path: &Path, original: &str, new_text: &str) -> Result<bool, CoreError> {
    if new_text == original {
        return Ok(false);
    }
    std::fs::write(path, new_text)?;
    Ok(true)
}
