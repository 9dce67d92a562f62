//! Parser configuration.

use serde::Deserialize;

/// Knobs for [`crate::parse_document_with`].
///
/// Deserializable so front-ends can load it from a `[parse]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParseOptions {
    /// Fail on references to unknown names instead of substituting `nil`.
    pub strict_references: bool,
    /// Accept `BEGIN_PROLOG` / `END_PROLOG` blocks.
    pub allow_prolog: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            strict_references: false,
            allow_prolog: true,
        }
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        ParseOptions {
            strict_references: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ParseOptions::default();
        assert!(!options.strict_references);
        assert!(options.allow_prolog);
    }

    #[test]
    fn from_toml_with_missing_fields() {
        let options: ParseOptions = toml::from_str("strict_references = true").unwrap();
        assert_eq!(options, ParseOptions::strict());
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(toml::from_str::<ParseOptions>("strict = true").is_err());
    }
}
