//! Boxing pass driver: decide and apply heap indirection per field.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use typewright_core::policy::BoxConfig;
use typewright_core::rewrite::{plan_boxing, write_if_changed};

use crate::corpus;

#[derive(Debug, Default, Clone)]
pub struct BoxingOptions {
    pub directory: PathBuf,
    pub config: Option<PathBuf>,
    pub save_config: Option<PathBuf>,
    pub dry_run: bool,
    pub verbose: bool,
    pub min_fields: Option<usize>,
    pub max_depth: Option<u32>,
    pub no_patterns: bool,
    pub no_size: bool,
    pub no_nesting: bool,
}

#[derive(Debug, Default)]
pub struct BoxingSummary {
    pub total_changes: usize,
    pub modified_files: Vec<String>,
}

pub fn run(opts: &BoxingOptions) -> Result<BoxingSummary> {
    let mut config = match &opts.config {
        Some(path) => BoxConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => BoxConfig::default(),
    };
    if let Some(n) = opts.min_fields {
        config.min_fields_to_box = n;
    }
    if let Some(n) = opts.max_depth {
        config.max_nesting_depth = n;
    }
    if opts.no_patterns {
        config.use_element_patterns = false;
        config.use_parent_patterns = false;
    }
    if opts.no_size {
        config.use_size_heuristic = false;
    }
    if opts.no_nesting {
        config.use_nesting_analysis = false;
    }

    if let Some(path) = &opts.save_config {
        config.save(path)?;
        println!("Configuration saved to {}", path.display());
    }

    corpus::ensure_directory(&opts.directory)?;
    let paths = corpus::source_files(&opts.directory)?;
    let files = corpus::read_corpus(&paths)?;

    println!(
        "Processing {} source files in {}...",
        files.len(),
        opts.directory.display()
    );
    if opts.dry_run {
        println!("DRY RUN MODE - no files will be modified\n");
    }
    if opts.verbose {
        println!("Configuration:");
        println!("  Always-box types: {}", config.always_box_types.len());
        println!(
            "  Element patterns: {} ({} patterns)",
            config.use_element_patterns,
            config.box_in_vec_patterns.len()
        );
        println!(
            "  Parent patterns: {} ({} patterns)",
            config.use_parent_patterns,
            config.box_vec_if_parent_matches.len()
        );
        println!(
            "  Size heuristic: {} (threshold: {} fields)",
            config.use_size_heuristic, config.min_fields_to_box
        );
        println!(
            "  Nesting analysis: {} (threshold: depth {})",
            config.use_nesting_analysis, config.max_nesting_depth
        );
        println!();
    }

    let rewrites = plan_boxing(&files, &config)?;

    let mut summary = BoxingSummary::default();
    for rewrite in &rewrites {
        let name = rewrite
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("{}: {} fields boxed", name, rewrite.changes.len());
        if opts.verbose {
            for change in &rewrite.changes {
                println!("{change}");
            }
        }
        summary.total_changes += rewrite.changes.len();
        summary.modified_files.push(name);
    }

    if !opts.dry_run {
        for rewrite in &rewrites {
            write_if_changed(&rewrite.path, &rewrite.original, &rewrite.new_text)
                .with_context(|| format!("failed to write {}", rewrite.path.display()))?;
        }
    }

    println!("\n{}", "=".repeat(60));
    println!(
        "Summary: {} fields boxed across {} files",
        summary.total_changes,
        summary.modified_files.len()
    );
    if !summary.modified_files.is_empty() && !opts.dry_run {
        println!("\nModified files:");
        for file in &summary.modified_files {
            println!("  {file}");
        }
    }
    info!(
        "boxing pass complete: {} fields in {} files",
        summary.total_changes,
        summary.modified_files.len()
    );
    Ok(summary)
}
