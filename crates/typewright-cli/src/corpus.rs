//! Corpus enumeration and up-front reading for the pass drivers.
//!
//! Both passes follow a read-all-then-analyze-then-write-all discipline: the
//! whole corpus is read into memory here before any analysis, and no file is
//! re-read after another file's write.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use typewright_core::extract::{Extractor, ScannedFile};

/// The consolidated shared module within a corpus directory.
pub const SHARED_MODULE: &str = "mod.rs";

/// Message-family prefixes the consolidation pass is restricted to.
pub const FAMILY_PREFIXES: [&str; 2] = ["camt_", "pacs_"];

pub fn ensure_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }
    Ok(())
}

/// Sorted `.rs` files directly inside `dir`, excluding the shared module.
pub fn source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }
        if path.file_name().and_then(|n| n.to_str()) == Some(SHARED_MODULE) {
            continue;
        }
        files.push(path.to_path_buf());
    }
    files.sort();
    Ok(files)
}

/// True for file names carrying one of the consolidation family prefixes.
pub fn in_family(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| FAMILY_PREFIXES.iter().any(|prefix| name.starts_with(prefix)))
}

/// Reads and scans every path up front.
pub fn read_corpus(paths: &[PathBuf]) -> Result<Vec<ScannedFile>> {
    let extractor = Extractor::new();
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        files.push(extractor.scan(path.clone(), text));
    }
    Ok(files)
}
