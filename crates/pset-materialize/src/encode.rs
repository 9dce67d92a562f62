//! Value-model to cell encoding.

use pset_core::codec;
use pset_core::{Result, Table, Value};
use pset_registry::{AtomKind, Cell, ParameterSet, Registry};

/// Counters for one materialization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeStats {
    /// Named, non-prolog top-level bindings written (including overwrites).
    pub bindings: usize,
    pub prolog_skipped: usize,
    pub unnamed_skipped: usize,
    /// Nested tables built and handed to the registry.
    pub tables: usize,
}

pub(crate) struct Encoder<'r> {
    registry: &'r Registry,
    pub(crate) stats: MaterializeStats,
}

impl<'r> Encoder<'r> {
    pub(crate) fn new(registry: &'r Registry) -> Self {
        Encoder {
            registry,
            stats: MaterializeStats::default(),
        }
    }

    pub(crate) fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub(crate) fn encode(&mut self, value: &Value) -> Result<Cell> {
        Ok(match value {
            Value::Nil => Cell::nil(),
            Value::Bool(b) => Cell::atom(AtomKind::Bool, codec::encode_bool(*b)),
            Value::Number(n) => Cell::atom(AtomKind::from(n.kind()), n.text()),
            Value::Complex(re, im) => {
                Cell::atom(AtomKind::Complex, codec::join_complex(re.text(), im.text()))
            }
            Value::String(s) => Cell::atom(AtomKind::String, s.as_str()),
            Value::Sequence(items) => Cell::Sequence(
                items
                    .iter()
                    .map(|item| self.encode(&item.value))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Table(table) => {
                // Children first, so the parent digest sees stable ids.
                let child = self.table(table)?;
                let id = self.registry.put(&child)?;
                self.stats.tables += 1;
                tracing::trace!(%id, keys = child.len(), "materialized nested table");
                Cell::Table(id)
            }
        })
    }

    /// Build a set from a table, dropping prolog entries.
    pub(crate) fn table(&mut self, table: &Table) -> Result<ParameterSet> {
        let mut pset = ParameterSet::with_registry(self.registry);
        for (key, entry) in table.iter() {
            if entry.in_prolog {
                self.stats.prolog_skipped += 1;
                continue;
            }
            let cell = self.encode(&entry.value)?;
            pset.insert(key, cell)?;
        }
        Ok(pset)
    }
}
