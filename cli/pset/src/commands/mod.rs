//! CLI command implementations.
//!
//! Each command has a `render` function returning its stdout text, which
//! `run` prints; tests exercise `render` directly.

pub mod check;
pub mod get;
pub mod id;
pub mod keys;
pub mod parse;

use std::path::Path;

use anyhow::{Context, Result};

use pset_core::Document;
use pset_parse::ParseOptions;
use pset_registry::{ParameterSet, Registry};

/// Read and parse one source file.
pub fn load_document(file: &Path, options: &ParseOptions) -> Result<Document> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    pset_parse::parse_document_with(&source, options)
        .with_context(|| format!("parsing {}", file.display()))
}

/// Read, parse and materialize one source file, reporting diagnostics and
/// deferred references on stderr.
pub fn load_parameter_set(
    file: &Path,
    options: &ParseOptions,
    registry: &Registry,
) -> Result<ParameterSet> {
    let document = load_document(file, options)?;
    report(file, &document);
    pset_materialize::make_parameter_set(&document, registry)
        .with_context(|| format!("materializing {}", file.display()))
}

pub fn report(file: &Path, document: &Document) {
    for diagnostic in document.diagnostics() {
        eprintln!("warning: {}:{diagnostic}", file.display());
    }
    for deferred in document.deferred() {
        eprintln!(
            "note: {}:{}: '{}' is deferred to {}",
            file.display(),
            deferred.position,
            deferred.reference,
            deferred.source
        );
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;

    /// Write `source` to a fresh temp file; keep the dir alive.
    pub fn source_file(source: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.pset");
        std::fs::write(&path, source).unwrap();
        (dir, path)
    }
}
