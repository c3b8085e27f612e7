//! Cross-file duplicate detection and canonical-module consolidation.
//!
//! Duplicate grouping keys purely on the type name: two same-named
//! definitions are assumed verbatim copies of one generated type, so no
//! structural equality check is performed. Lowercase-named definitions are
//! generator-private helpers and are deleted rather than relocated.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::path::PathBuf;

use crate::extract::ScannedFile;
use crate::rewrite::{apply_edits, Edit};
use crate::types::TypeDefinition;

/// One definition site of a duplicated name.
#[derive(Debug, Clone)]
pub struct Occurrence {
    pub file: PathBuf,
    pub span: Range<usize>,
    /// Canonical text: definition plus validation block.
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub name: String,
    pub occurrences: Vec<Occurrence>,
    /// Field-reference count across the corpus; reporting and ordering only.
    pub usage_count: usize,
}

impl DuplicateGroup {
    pub fn file_count(&self) -> usize {
        self.occurrences
            .iter()
            .map(|o| &o.file)
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// One file's contents after the planned removals, paired with the snapshot
/// the removals were computed against.
#[derive(Debug, Clone)]
pub struct RewrittenFile {
    pub path: PathBuf,
    pub original: String,
    pub new_text: String,
}

/// Planned outcome of one consolidation pass. Built entirely from the
/// in-memory corpus; applying it is a separate step.
#[derive(Debug)]
pub struct ConsolidationPlan {
    /// Relocation candidates, sorted by (file count, usage) descending.
    pub frequent: Vec<DuplicateGroup>,
    /// Names kept in place by the root heuristic.
    pub roots: BTreeSet<String>,
    /// Names newly appended to the shared module, in append order.
    pub added: Vec<String>,
    /// Full shared-module text after the merge; None when nothing is added.
    pub shared_text: Option<String>,
    /// Per-file rewritten text with relocated and helper spans removed.
    pub file_texts: Vec<RewrittenFile>,
    /// (file, name) pairs of deleted lowercase private helpers.
    pub removed_helpers: Vec<(PathBuf, String)>,
}

/// Version-suffix token: `V` plus two digits, e.g. `FIToFICustomerCreditTransferV08`.
fn has_version_suffix(name: &str) -> bool {
    let b = name.as_bytes();
    b.len() >= 3
        && b[b.len() - 3] == b'V'
        && b[b.len() - 2].is_ascii_digit()
        && b[b.len() - 1].is_ascii_digit()
}

/// Document, message and proprietary-message entry-point markers.
fn has_entry_point_marker(name: &str) -> bool {
    let upper = name.to_uppercase();
    upper.contains("DOCUMENT") || upper.contains("MESSAGE") || upper.contains("PRTRY")
}

fn canonical_text(file: &ScannedFile, def: &TypeDefinition) -> String {
    let mut text = file.text[def.span.clone()].to_string();
    if let Some(v) = &def.validation_span {
        text.push_str("\n\n");
        text.push_str(&file.text[v.clone()]);
    }
    text
}

/// Extends a removal span through the blank lines that followed the
/// definition, so deletions leave no stacked empty lines behind.
fn extend_through_newlines(text: &str, span: Range<usize>) -> Range<usize> {
    let bytes = text.as_bytes();
    let mut end = span.end;
    while end < bytes.len() && bytes[end] == b'\n' {
        end += 1;
    }
    span.start..end
}

/// File prologue (license comment and `use` lines) taken from the first
/// corpus file with a definition; used when the shared module is created
/// fresh so it matches the corpus being processed.
fn prologue(files: &[ScannedFile]) -> String {
    files
        .iter()
        .find_map(|f| f.defs.first().map(|d| f.text[..d.span.start].to_string()))
        .unwrap_or_default()
}

/// Plans one consolidation pass over a corpus read up front.
///
/// `min_files` is the file-count floor: a name must occur in more than
/// `min_files` distinct files (and escape the root heuristic) to be
/// relocated. Removal spans are only planned for names the shared module is
/// guaranteed to contain after the merge, so a definition is always either
/// relocated-and-removed or left untouched everywhere.
pub fn plan_consolidation(
    files: &[ScannedFile],
    shared: Option<&ScannedFile>,
    min_files: usize,
) -> ConsolidationPlan {
    // Group every non-helper definition by name.
    let mut groups: BTreeMap<String, Vec<(&ScannedFile, &TypeDefinition)>> = BTreeMap::new();
    for file in files {
        for def in &file.defs {
            if def.is_private_helper() {
                continue;
            }
            groups.entry(def.name.clone()).or_default().push((file, def));
        }
    }

    // Corpus-wide field-reference counts, for reporting and ordering only.
    let mut usage: BTreeMap<&str, usize> = groups.keys().map(|n| (n.as_str(), 0)).collect();
    for file in files {
        for def in &file.defs {
            for field in &def.fields {
                if let Some(count) = usage.get_mut(field.core_type.as_str()) {
                    *count += 1;
                }
            }
        }
    }

    // Root heuristic: version-suffixed, entry-point-marked, or sole
    // occurrence. Roots are never relocated.
    let mut roots = BTreeSet::new();
    for (name, defs) in &groups {
        let file_count = defs.iter().map(|(f, _)| &f.path).collect::<BTreeSet<_>>().len();
        if has_version_suffix(name) || has_entry_point_marker(name) || file_count < 2 {
            roots.insert(name.clone());
        }
    }

    let mut frequent: Vec<DuplicateGroup> = Vec::new();
    for (name, defs) in &groups {
        if roots.contains(name) {
            continue;
        }
        let group = DuplicateGroup {
            name: name.clone(),
            occurrences: defs
                .iter()
                .map(|(file, def)| Occurrence {
                    file: file.path.clone(),
                    span: def.full_span(),
                    text: canonical_text(file, def),
                })
                .collect(),
            usage_count: usage.get(name.as_str()).copied().unwrap_or(0),
        };
        if group.file_count() > min_files {
            frequent.push(group);
        }
    }
    frequent.sort_by(|a, b| {
        (b.file_count(), b.usage_count, &a.name).cmp(&(a.file_count(), a.usage_count, &b.name))
    });

    // Merge into the shared module: skip names it already defines, append
    // the rest sorted by name, preserving pre-existing content.
    let existing: BTreeSet<&str> = shared
        .map(|s| s.defs.iter().map(|d| d.name.as_str()).collect())
        .unwrap_or_default();
    let mut by_name: Vec<&DuplicateGroup> = frequent.iter().collect();
    by_name.sort_by(|a, b| a.name.cmp(&b.name));
    let mut added = Vec::new();
    let mut blocks = Vec::new();
    for group in by_name {
        if existing.contains(group.name.as_str()) {
            continue;
        }
        added.push(group.name.clone());
        blocks.push(group.occurrences[0].text.trim_end().to_string());
    }
    let shared_text = if blocks.is_empty() {
        None
    } else {
        let base = match shared {
            Some(s) => s.text.trim_end().to_string(),
            None => prologue(files).trim_end().to_string(),
        };
        Some(format!("{}\n\n{}\n", base, blocks.join("\n\n")))
    };

    // Removals: every occurrence of every relocated name, plus every
    // lowercase helper; spans are applied in reverse offset order.
    let frequent_names: BTreeSet<&str> = frequent.iter().map(|g| g.name.as_str()).collect();
    let mut file_texts = Vec::new();
    let mut removed_helpers = Vec::new();
    for file in files {
        let mut edits = Vec::new();
        for def in &file.defs {
            let is_helper = def.is_private_helper();
            if is_helper {
                removed_helpers.push((file.path.clone(), def.name.clone()));
            }
            if is_helper || frequent_names.contains(def.name.as_str()) {
                edits.push(Edit {
                    span: extend_through_newlines(&file.text, def.full_span()),
                    replacement: String::new(),
                });
            }
        }
        if edits.is_empty() {
            continue;
        }
        file_texts.push(RewrittenFile {
            path: file.path.clone(),
            original: file.text.clone(),
            new_text: apply_edits(&file.text, &edits),
        });
    }

    ConsolidationPlan {
        frequent,
        roots,
        added,
        shared_text,
        file_texts,
        removed_helpers,
    }
}
