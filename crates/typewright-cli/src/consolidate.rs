//! Consolidation pass driver: relocate duplicated definitions into the
//! shared module and remove the originals.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use typewright_core::consolidate::plan_consolidation;
use typewright_core::extract::Extractor;
use typewright_core::rewrite::write_if_changed;

use crate::corpus;

#[derive(Debug, Default, Clone)]
pub struct ConsolidateOptions {
    pub directory: PathBuf,
    /// File-count floor: a type must appear in more than this many files to
    /// be relocated.
    pub typecount: usize,
}

#[derive(Debug, Default)]
pub struct ConsolidateSummary {
    pub added: Vec<String>,
    pub rewritten_files: usize,
    pub removed_helpers: usize,
}

pub fn run(opts: &ConsolidateOptions) -> Result<ConsolidateSummary> {
    corpus::ensure_directory(&opts.directory)?;
    let paths: Vec<PathBuf> = corpus::source_files(&opts.directory)?
        .into_iter()
        .filter(|p| corpus::in_family(p))
        .collect();
    let files = corpus::read_corpus(&paths)?;

    println!("Found {} source files", files.len());
    for file in &files {
        println!(
            "Found {} type definitions in {}",
            file.defs.len(),
            file.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
    }

    let shared_path = opts.directory.join(corpus::SHARED_MODULE);
    let shared = match std::fs::read_to_string(&shared_path) {
        Ok(text) => Some(Extractor::new().scan(shared_path.clone(), text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", shared_path.display()))
        }
    };
    if let Some(s) = &shared {
        println!(
            "Found {} existing types in {}",
            s.defs.len(),
            corpus::SHARED_MODULE
        );
    }

    let plan = plan_consolidation(&files, shared.as_ref(), opts.typecount.max(1));

    if !plan.roots.is_empty() {
        println!(
            "\nRoot types kept in their original files: {}",
            plan.roots.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }
    if plan.frequent.is_empty() {
        println!("\nNo types found that appear in multiple files (excluding root types).");
    } else {
        println!("\nTypes that appear in multiple files (excluding root types):");
        println!("{}", "-".repeat(70));
        for group in &plan.frequent {
            println!(
                "{}: appears in {} files, used {} times total",
                group.name,
                group.file_count(),
                group.usage_count
            );
        }
    }

    // The shared module is written before any removal, so a definition is
    // never deleted without its copy existing first.
    if let Some(text) = &plan.shared_text {
        let original = shared.as_ref().map(|s| s.text.as_str()).unwrap_or_default();
        write_if_changed(&shared_path, original, text)
            .with_context(|| format!("failed to write {}", shared_path.display()))?;
    }
    for f in &plan.file_texts {
        write_if_changed(&f.path, &f.original, &f.new_text)
            .with_context(|| format!("failed to write {}", f.path.display()))?;
    }

    if plan.added.is_empty() {
        println!("\nNo new types to add");
    } else {
        println!(
            "\nAdded {} new types to {}",
            plan.added.len(),
            corpus::SHARED_MODULE
        );
        println!("New types: {}", plan.added.join(", "));
    }
    if !plan.removed_helpers.is_empty() {
        println!(
            "Removed {} private helper types from original files",
            plan.removed_helpers.len()
        );
    }
    if !plan.file_texts.is_empty() {
        println!("Removed duplicate types from original files");
    }
    info!(
        "consolidation pass complete: {} new types, {} files rewritten",
        plan.added.len(),
        plan.file_texts.len()
    );

    Ok(ConsolidateSummary {
        added: plan.added,
        rewritten_files: plan.file_texts.len(),
        removed_helpers: plan.removed_helpers.len(),
    })
}
