//! `pset id`: content identifier of a document or one of its tables.

use std::path::Path;

use anyhow::{Context, Result};

use pset_registry::{ParameterSet, Registry};

use crate::config::PsetConfig;

pub fn run(config: &PsetConfig, file: &Path, path: Option<&str>) -> Result<()> {
    println!("{}", render(config, file, path)?);
    Ok(())
}

pub fn render(config: &PsetConfig, file: &Path, path: Option<&str>) -> Result<String> {
    let registry = Registry::new();
    let pset = super::load_parameter_set(file, &config.parse, &registry)?;
    let id = match path {
        None => pset.id(),
        Some(path) => pset
            .get::<ParameterSet>(path)
            .with_context(|| format!("'{path}' is not a table"))?
            .id(),
    };
    Ok(id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::source_file;

    #[test]
    fn equal_tables_share_ids() {
        let (_dir, first) = source_file("t: { a: 1, b: [true] } u: 2");
        let (_dir2, second) = source_file("x: 0 t: {b: [true] a: 1}");
        let config = PsetConfig::default();
        let t1 = render(&config, &first, Some("t")).unwrap();
        let t2 = render(&config, &second, Some("t")).unwrap();
        assert_eq!(t1, t2);
        assert_ne!(
            render(&config, &first, None).unwrap(),
            render(&config, &second, None).unwrap()
        );
    }

    #[test]
    fn non_table_path_fails() {
        let (_dir, file) = source_file("a: 1");
        let err = render(&PsetConfig::default(), &file, Some("a")).unwrap_err();
        assert!(err.to_string().contains("not a table"));
    }
}
