//! `pset.toml` loading.
//!
//! ```toml
//! [parse]
//! strict_references = true
//! allow_prolog = true
//!
//! [output]
//! format = "json"     # or "text"
//! show_ids = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use pset_parse::ParseOptions;

pub const CONFIG_FILE: &str = "pset.toml";

/// Tool configuration. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PsetConfig {
    pub parse: ParseOptions,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Print content identifiers next to parameter sets.
    pub show_ids: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl PsetConfig {
    /// Search upward from `start_dir` for a `pset.toml`, returning it and
    /// the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                return Ok(Some((Self::load(&candidate)?, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// An explicit `--config` path wins; otherwise search from `cwd`, and
    /// fall back to defaults.
    pub fn resolve(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::find_and_load(cwd)? {
            Some((config, dir)) => {
                tracing::debug!(dir = %dir.display(), "using {CONFIG_FILE}");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing pset.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config = PsetConfig::from_str(
            r#"
[parse]
strict_references = true
allow_prolog = false

[output]
format = "json"
show_ids = true
"#,
        )
        .unwrap();
        assert!(config.parse.strict_references);
        assert!(!config.parse.allow_prolog);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.show_ids);
    }

    #[test]
    fn empty_config_is_default() {
        let config = PsetConfig::from_str("").unwrap();
        assert_eq!(config, PsetConfig::default());
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(config.parse.allow_prolog);
    }

    #[test]
    fn reject_unknown_keys() {
        assert!(PsetConfig::from_str("[output]\nformat = \"yaml\"\n").is_err());
        assert!(PsetConfig::from_str("[parse]\nstrict = true\n").is_err());
        assert!(PsetConfig::from_str("[extra]\n").is_err());
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[output]\nshow_ids = true\n",
        )
        .unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, found) = PsetConfig::find_and_load(&nested).unwrap().unwrap();
        assert!(config.output.show_ids);
        assert_eq!(found, dir.path());
    }

    #[test]
    fn explicit_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[output]\nshow_ids = true\n").unwrap();
        let other = dir.path().join("other.toml");
        std::fs::write(&other, "[output]\nformat = \"json\"\n").unwrap();

        let config = PsetConfig::resolve(Some(&other), dir.path()).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.output.show_ids);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PsetConfig::resolve(Some(&dir.path().join("nope.toml")), dir.path());
        assert!(err.is_err());
    }
}
