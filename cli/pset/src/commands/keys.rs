//! `pset keys`: list top-level keys.

use std::path::Path;

use anyhow::Result;

use pset_registry::{ParameterSet, Registry};

use crate::config::{OutputFormat, PsetConfig};

pub fn run(config: &PsetConfig, file: &Path, psets_only: bool) -> Result<()> {
    let out = render(config, file, psets_only)?;
    if !out.is_empty() {
        println!("{out}");
    }
    Ok(())
}

pub fn render(config: &PsetConfig, file: &Path, psets_only: bool) -> Result<String> {
    let registry = Registry::new();
    let pset = super::load_parameter_set(file, &config.parse, &registry)?;
    let keys = if psets_only {
        pset.get_pset_keys()
    } else {
        pset.get_keys()
    };

    if config.output.format == OutputFormat::Json {
        return Ok(serde_json::to_string(&keys)?);
    }

    let mut lines = Vec::with_capacity(keys.len());
    for key in keys {
        match nested_id(&pset, &key, config.output.show_ids)? {
            Some(id) => lines.push(format!("{key}\t{id}")),
            None => lines.push(key),
        }
    }
    Ok(lines.join("\n"))
}

fn nested_id(pset: &ParameterSet, key: &str, show_ids: bool) -> Result<Option<String>> {
    if !show_ids || !pset.get_pset_keys().iter().any(|k| k == key) {
        return Ok(None);
    }
    Ok(Some(pset.get::<ParameterSet>(key)?.id().to_string()))
}
