//! Materialization of parsed pset documents.
//!
//! Walks a [`Document`] in binding order and produces a [`ParameterSet`]:
//! prolog and unnamed bindings are dropped, a later binding of the same
//! name replaces an earlier one, and nested tables are built bottom-up and
//! interned into the registry before their parent.

mod encode;

pub use encode::MaterializeStats;
pub use pset_core::{Error, Result};

use pset_core::{Document, Table};
use pset_parse::ParseOptions;
use pset_registry::{ParameterSet, Registry};

use encode::Encoder;

/// Materialize a parsed document.
pub fn make_parameter_set(document: &Document, registry: &Registry) -> Result<ParameterSet> {
    make_parameter_set_with_stats(document, registry).map(|(pset, _)| pset)
}

/// Like [`make_parameter_set`], also reporting what was kept and skipped.
pub fn make_parameter_set_with_stats(
    document: &Document,
    registry: &Registry,
) -> Result<(ParameterSet, MaterializeStats)> {
    let mut encoder = Encoder::new(registry);
    let mut pset = ParameterSet::with_registry(encoder.registry());

    for binding in document.bindings() {
        let Some(name) = &binding.name else {
            encoder.stats.unnamed_skipped += 1;
            continue;
        };
        if binding.value.in_prolog {
            tracing::trace!(name = %name, "skipping prolog binding");
            encoder.stats.prolog_skipped += 1;
            continue;
        }
        let cell = encoder.encode(&binding.value.value)?;
        pset.insert(name, cell)?;
        encoder.stats.bindings += 1;
    }

    let stats = encoder.stats;
    tracing::debug!(
        id = %pset.id(),
        keys = pset.len(),
        bindings = stats.bindings,
        prolog_skipped = stats.prolog_skipped,
        unnamed_skipped = stats.unnamed_skipped,
        tables = stats.tables,
        "materialized parameter set"
    );
    Ok((pset, stats))
}

/// Materialize an intermediate table directly. Prolog entries are dropped.
pub fn make_parameter_set_from_table(table: &Table, registry: &Registry) -> Result<ParameterSet> {
    Encoder::new(registry).table(table)
}

/// Parse `source` and materialize the result in one step.
pub fn parse_and_materialize(
    source: &str,
    options: &ParseOptions,
    registry: &Registry,
) -> Result<ParameterSet> {
    let document = pset_parse::parse_document_with(source, options)?;
    make_parameter_set(&document, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pset_core::{Binding, ExtendedValue, Number, Position, Value};

    fn materialize(source: &str) -> (ParameterSet, MaterializeStats) {
        let document = pset_parse::parse_document(source).unwrap();
        make_parameter_set_with_stats(&document, &Registry::new()).unwrap()
    }

    #[test]
    fn later_bindings_overwrite() {
        let (pset, stats) = materialize("x: 1 x: 2");
        assert_eq!(pset.get::<i32>("x").unwrap(), 2);
        assert_eq!(stats.bindings, 2);
        assert_eq!(pset.len(), 1);
    }

    #[test]
    fn prolog_and_unnamed_are_dropped() {
        let (pset, stats) = materialize("BEGIN_PROLOG p: 1 END_PROLOG a: p a");
        assert_eq!(pset.get_keys(), vec!["a"]);
        assert_eq!(pset.get::<i32>("a").unwrap(), 1);
        assert_eq!(stats.prolog_skipped, 1);
        assert_eq!(stats.unnamed_skipped, 1);
    }

    #[test]
    fn nested_tables_are_interned_first() {
        let registry = Registry::new();
        let pset = parse_and_materialize(
            "outer: { inner: { v: [1, { w: 2 }] } }",
            &ParseOptions::default(),
            &registry,
        )
        .unwrap();
        // outer, inner, and the table inside the sequence.
        assert_eq!(registry.len(), 3);
        assert_eq!(pset.get::<i32>("outer.inner.v[1].w").unwrap(), 2);
        let outer = pset.get::<ParameterSet>("outer").unwrap();
        assert!(registry.contains(outer.id()));
        assert!(!registry.contains(pset.id()));
    }

    #[test]
    fn prolog_entries_inside_tables_are_dropped() {
        let mut table = Table::new();
        table.put_int("keep", 1, false).unwrap();
        table.put_int("hide", 2, true).unwrap();
        table.put_int("t.visible", 3, false).unwrap();
        table.put_int("t.hidden", 4, true).unwrap();
        let pset = make_parameter_set_from_table(&table, &Registry::new()).unwrap();
        assert_eq!(pset.get_keys(), vec!["keep", "t"]);
        assert_eq!(
            pset.get::<ParameterSet>("t").unwrap().get_keys(),
            vec!["visible"]
        );
    }

    #[test]
    fn hand_built_document() {
        let mut document = Document::new();
        document.push(Binding {
            name: Some("n".into()),
            value: ExtendedValue::new(Value::Number(Number::from_int(5))),
            position: Position::default(),
        });
        let pset = make_parameter_set(&document, &Registry::new()).unwrap();
        assert_eq!(pset.get::<u8>("n").unwrap(), 5);
    }
}
