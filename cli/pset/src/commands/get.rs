//! `pset get`: typed lookup of one value.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;

use pset_registry::{Cell, ParameterSet, Registry};

use crate::config::{OutputFormat, PsetConfig};

/// Type to decode the value as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValueType {
    Bool,
    Int,
    Float,
    String,
    Pset,
}

pub fn run(config: &PsetConfig, file: &Path, path: &str, ty: Option<ValueType>) -> Result<()> {
    println!("{}", render(config, file, path, ty)?);
    Ok(())
}

pub fn render(
    config: &PsetConfig,
    file: &Path,
    path: &str,
    ty: Option<ValueType>,
) -> Result<String> {
    let registry = Registry::new();
    let pset = super::load_parameter_set(file, &config.parse, &registry)?;
    lookup(&pset, path, ty, config.output.format)
        .with_context(|| format!("looking up '{path}' in {}", file.display()))
}

fn lookup(
    pset: &ParameterSet,
    path: &str,
    ty: Option<ValueType>,
    format: OutputFormat,
) -> Result<String> {
    let json = format == OutputFormat::Json;
    Ok(match ty {
        None => pset.render_cell(&pset.get::<Cell>(path)?),
        Some(ValueType::Bool) => pset.get::<bool>(path)?.to_string(),
        Some(ValueType::Int) => pset.get::<i128>(path)?.to_string(),
        Some(ValueType::Float) => pset.get::<f64>(path)?.to_string(),
        Some(ValueType::String) if json => serde_json::to_string(&pset.get::<String>(path)?)?,
        Some(ValueType::String) => pset.get::<String>(path)?,
        Some(ValueType::Pset) if json => {
            serde_json::to_string_pretty(&pset.get::<ParameterSet>(path)?.to_json()?)?
        }
        Some(ValueType::Pset) => pset.get::<ParameterSet>(path)?.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::source_file;
    use pset_core::ErrorKind;

    const SOURCE: &str = "a: 1 b: { c: 2.5 } d: [1,2,3] s: 'it is' big: 12345678";

    fn get(path: &str, ty: Option<ValueType>) -> Result<String> {
        let (_dir, file) = source_file(SOURCE);
        render(&PsetConfig::default(), &file, path, ty)
    }

    #[test]
    fn typed_lookups() {
        assert_eq!(get("a", Some(ValueType::Int)).unwrap(), "1");
        assert_eq!(get("big", Some(ValueType::Int)).unwrap(), "12345678");
        assert_eq!(get("b.c", Some(ValueType::Float)).unwrap(), "2.5");
        assert_eq!(get("s", Some(ValueType::String)).unwrap(), "it is");
        assert_eq!(get("b", Some(ValueType::Pset)).unwrap(), "c:2.5");
    }

    #[test]
    fn raw_lookups() {
        assert_eq!(get("d", None).unwrap(), "[+1,+2,+3]");
        assert_eq!(get("big", None).unwrap(), "+1.2345678e+07");
        assert_eq!(get("b", None).unwrap(), "{c:2.5}");
        assert_eq!(get("d[2]", None).unwrap(), "+3");
    }

    #[test]
    fn errors_keep_their_kind() {
        let err = get("a", Some(ValueType::Float)).unwrap_err();
        let kind = err.downcast_ref::<pset_core::Error>().map(|e| e.kind());
        assert_eq!(kind, Some(ErrorKind::TypeMismatch));
        let err = get("zz", None).unwrap_err();
        assert!(format!("{err:#}").contains("can't find key"));
    }

    #[test]
    fn json_strings_are_quoted() {
        let (_dir, file) = source_file(SOURCE);
        let mut config = PsetConfig::default();
        config.output.format = OutputFormat::Json;
        assert_eq!(
            render(&config, &file, "s", Some(ValueType::String)).unwrap(),
            "\"it is\""
        );
    }
}
