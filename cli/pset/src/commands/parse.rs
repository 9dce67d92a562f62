//! `pset parse`: parse, materialize and print a document.

use std::path::Path;

use anyhow::Result;

use pset_registry::Registry;

use crate::config::{OutputFormat, PsetConfig};

pub fn run(config: &PsetConfig, file: &Path, json: bool) -> Result<()> {
    println!("{}", render(config, file, json)?);
    Ok(())
}

pub fn render(config: &PsetConfig, file: &Path, json: bool) -> Result<String> {
    let registry = Registry::new();
    let pset = super::load_parameter_set(file, &config.parse, &registry)?;

    if json || config.output.format == OutputFormat::Json {
        let parameters = pset.to_json()?;
        let value = if config.output.show_ids {
            serde_json::json!({ "id": pset.id().to_string(), "parameters": parameters })
        } else {
            parameters
        };
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    let mut out = pset.to_string();
    if config.output.show_ids {
        out.push_str(&format!("\n# id: {}", pset.id()));
    }
    Ok(out)
}
