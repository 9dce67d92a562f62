//! Encoded values stored in a parameter set.

use std::fmt;

use serde::Serialize;

use pset_core::codec::{self, NumberKind};
use pset_core::{ContentHasher, Error, Result};

use crate::registry::ParameterSetId;

/// What an atom's canonical text encodes.
///
/// Part of the content digest: `1` and `1.0` share the text `+1` but are
/// different values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AtomKind {
    Nil,
    Bool,
    Integer,
    Float,
    Complex,
    String,
}

impl From<NumberKind> for AtomKind {
    fn from(kind: NumberKind) -> Self {
        match kind {
            NumberKind::Integer => AtomKind::Integer,
            NumberKind::Float => AtomKind::Float,
        }
    }
}

impl AtomKind {
    fn code(self) -> u8 {
        match self {
            AtomKind::Nil => 0,
            AtomKind::Bool => 1,
            AtomKind::Integer => 2,
            AtomKind::Float => 3,
            AtomKind::Complex => 4,
            AtomKind::String => 5,
        }
    }
}

impl fmt::Display for AtomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AtomKind::Nil => "nil",
            AtomKind::Bool => "bool",
            AtomKind::Integer => "integer",
            AtomKind::Float => "float",
            AtomKind::Complex => "complex",
            AtomKind::String => "string",
        };
        f.write_str(name)
    }
}

/// A primitive in canonical text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Atom {
    kind: AtomKind,
    text: String,
}

impl Atom {
    /// Wrap text that is already canonical for `kind`.
    pub fn new(kind: AtomKind, text: impl Into<String>) -> Self {
        Atom {
            kind,
            text: text.into(),
        }
    }

    pub fn nil() -> Self {
        Atom::new(AtomKind::Nil, codec::NIL)
    }

    pub fn kind(&self) -> AtomKind {
        self.kind
    }

    /// Canonical text, exactly as stored.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text handed to custom converters: strings are unquoted and
    /// unescaped, everything else is the canonical text.
    pub fn plain_text(&self) -> Result<String> {
        match self.kind {
            AtomKind::String => codec::decode_string(&self.text),
            _ => Ok(self.text.clone()),
        }
    }
}

/// One stored value: an atom, a sequence, or a nested set by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Cell {
    Atom(Atom),
    Sequence(Vec<Cell>),
    Table(ParameterSetId),
}

impl Cell {
    pub fn atom(kind: AtomKind, text: impl Into<String>) -> Self {
        Cell::Atom(Atom::new(kind, text))
    }

    pub fn nil() -> Self {
        Cell::Atom(Atom::nil())
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Cell::Atom(atom) if atom.kind == AtomKind::Nil)
    }

    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Cell::Atom(atom) => Some(atom),
            _ => None,
        }
    }

    /// Short shape name for error messages.
    pub fn describe(&self) -> String {
        match self {
            Cell::Atom(atom) => atom.kind.to_string(),
            Cell::Sequence(_) => "sequence".to_string(),
            Cell::Table(_) => "table".to_string(),
        }
    }

    pub(crate) fn digest(&self, hasher: &mut ContentHasher) {
        match self {
            Cell::Atom(atom) => {
                hasher.tag(0).tag(atom.kind.code()).text(&atom.text);
            }
            Cell::Sequence(items) => {
                hasher.tag(1).count(items.len());
                for item in items {
                    item.digest(hasher);
                }
            }
            Cell::Table(id) => {
                hasher.tag(2).digest(id.as_bytes());
            }
        }
    }

    pub(crate) fn expect_atom(&self, kind: AtomKind) -> Result<&str> {
        match self {
            Cell::Atom(atom) if atom.kind == kind => Ok(&atom.text),
            other => Err(Error::type_mismatch(format!(
                "expected {kind}, found {}",
                other.describe()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_mismatch_is_reported() {
        let cell = Cell::atom(AtomKind::Integer, "+1");
        assert_eq!(cell.expect_atom(AtomKind::Integer).unwrap(), "+1");
        let err = cell.expect_atom(AtomKind::Float).unwrap_err();
        assert!(err.to_string().contains("expected float, found integer"));
    }

    #[test]
    fn plain_text_unquotes_strings() {
        let atom = Atom::new(AtomKind::String, "\"a b\"");
        assert_eq!(atom.plain_text().unwrap(), "a b");
        let atom = Atom::new(AtomKind::Integer, "+17");
        assert_eq!(atom.plain_text().unwrap(), "+17");
    }

    #[test]
    fn nil_cells() {
        assert!(Cell::nil().is_nil());
        assert!(!Cell::Sequence(Vec::new()).is_nil());
    }
}
