//! A parsed document: the ordered sequence of top-level bindings.
//!
//! Bindings are append-only. Duplicate names are redefinitions, not errors:
//! plain lookup sees the most recent one while earlier ones remain
//! reachable by version number.

use std::fmt;

use crate::value::{ExtendedValue, Table};

/// 1-based line/column of a token in the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A top-level `(name, value)` pair. Unnamed bindings have no name.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: Option<String>,
    pub value: ExtendedValue,
    pub position: Position,
}

/// External source a reference was deferred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredSource {
    File,
    Db,
}

impl fmt::Display for DeferredSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferredSource::File => f.write_str("@file"),
            DeferredSource::Db => f.write_str("@DB"),
        }
    }
}

/// A reference carrying an `@file` / `@DB` marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredReference {
    /// Reference text without the marker, e.g. `base.tag[0]`.
    pub reference: String,
    pub source: DeferredSource,
    pub position: Position,
}

/// A non-fatal problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub position: Position,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    bindings: Vec<Binding>,
    diagnostics: Vec<Diagnostic>,
    deferred: Vec<DeferredReference>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, binding: Binding) {
        self.bindings.push(binding);
    }

    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn push_deferred(&mut self, deferred: DeferredReference) {
        self.deferred.push(deferred);
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn deferred(&self) -> &[DeferredReference] {
        &self.deferred
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Most recent binding with this name.
    pub fn lookup(&self, name: &str) -> Option<&ExtendedValue> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.name.as_deref() == Some(name))
            .map(|b| &b.value)
    }

    /// The `version`-th binding with this name, in declaration order.
    pub fn lookup_version(&self, name: &str, version: usize) -> Option<&ExtendedValue> {
        self.bindings
            .iter()
            .filter(|b| b.name.as_deref() == Some(name))
            .nth(version)
            .map(|b| &b.value)
    }

    /// Distinct binding names in order of first appearance.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.bindings.iter().filter_map(|b| b.name.as_deref()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Collapse into a table: later bindings win, unnamed ones are dropped.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        for binding in &self.bindings {
            if let Some(name) = &binding.name {
                table.set(name.clone(), binding.value.clone());
            }
        }
        table
    }
}
