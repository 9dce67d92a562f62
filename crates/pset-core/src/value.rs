//! Parse-time value model.
//!
//! Values keep every primitive in canonical string form so nothing is lost
//! before the consumer picks a target type. Tables are ordered by key and
//! can be edited through dotted/indexed paths before materialization.

use std::collections::BTreeMap;
use std::fmt;

use crate::codec::{self, Complex, NumberKind};
use crate::error::{Error, Result};
use crate::path::{join_path, parse_path, Segment};

/// A number in canonical text form, tagged with its lexical kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Number {
    kind: NumberKind,
    text: String,
}

impl Number {
    /// Canonicalize a raw numeric literal.
    pub fn from_literal(literal: &str) -> Result<Self> {
        let (kind, text) = codec::canonicalize_number(literal)?;
        Ok(Number { kind, text })
    }

    pub fn from_int(value: i128) -> Self {
        Number {
            kind: NumberKind::Integer,
            text: codec::encode_int(value),
        }
    }

    pub fn from_float(value: f64) -> Result<Self> {
        Ok(Number {
            kind: NumberKind::Float,
            text: codec::encode_float(value)?,
        })
    }

    pub fn kind(&self) -> NumberKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Discriminant of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    Nil,
    Bool,
    Number,
    Complex,
    String,
    Sequence,
    Table,
}

impl fmt::Display for ValueTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueTag::Nil => "nil",
            ValueTag::Bool => "bool",
            ValueTag::Number => "number",
            ValueTag::Complex => "complex",
            ValueTag::String => "string",
            ValueTag::Sequence => "sequence",
            ValueTag::Table => "table",
        };
        f.write_str(name)
    }
}

/// A parsed value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(Number),
    /// (real, imaginary)
    Complex(Number, Number),
    /// Canonical (escaped, quoted-iff-needed) form.
    String(String),
    Sequence(Vec<ExtendedValue>),
    Table(Table),
}

impl Value {
    pub fn tag(&self) -> ValueTag {
        match self {
            Value::Nil => ValueTag::Nil,
            Value::Bool(_) => ValueTag::Bool,
            Value::Number(_) => ValueTag::Number,
            Value::Complex(..) => ValueTag::Complex,
            Value::String(_) => ValueTag::String,
            Value::Sequence(_) => ValueTag::Sequence,
            Value::Table(_) => ValueTag::Table,
        }
    }

    /// Build a string value from raw text, canonicalizing it.
    pub fn string(raw: &str) -> Result<Self> {
        Ok(Value::String(codec::encode_string(raw)?))
    }

    pub fn complex(value: Complex) -> Result<Self> {
        Ok(Value::Complex(
            Number::from_float(value.re)?,
            Number::from_float(value.im)?,
        ))
    }

    /// Render in source syntax; the output parses back to an equal value.
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        self.write_source(&mut out);
        out
    }

    fn write_source(&self, out: &mut String) {
        match self {
            Value::Nil => out.push_str(codec::NIL),
            Value::Bool(b) => out.push_str(&codec::encode_bool(*b)),
            Value::Number(n) => out.push_str(n.text()),
            Value::Complex(re, im) => out.push_str(&codec::join_complex(re.text(), im.text())),
            Value::String(s) => {
                // Bare canonical strings would read back as references.
                if s.starts_with('"') {
                    out.push_str(s);
                } else {
                    out.push('"');
                    out.push_str(s);
                    out.push('"');
                }
            }
            Value::Sequence(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.value.write_source(out);
                }
                out.push(']');
            }
            Value::Table(table) => {
                out.push('{');
                for (i, (key, item)) in table.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key);
                    out.push_str(": ");
                    item.value.write_source(out);
                }
                out.push('}');
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_source())
    }
}

/// A value plus its prolog flag.
///
/// Prolog values exist only to be referenced while parsing and never reach
/// a materialized parameter set.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedValue {
    pub in_prolog: bool,
    pub value: Value,
}

impl ExtendedValue {
    pub fn new(value: Value) -> Self {
        ExtendedValue {
            in_prolog: false,
            value,
        }
    }

    pub fn prolog(value: Value) -> Self {
        ExtendedValue {
            in_prolog: true,
            value,
        }
    }

    pub fn with_prolog(value: Value, in_prolog: bool) -> Self {
        ExtendedValue { in_prolog, value }
    }

    pub fn tag(&self) -> ValueTag {
        self.value.tag()
    }

    /// `.key` navigation.
    pub fn member(&self, key: &str) -> Result<&ExtendedValue> {
        match &self.value {
            Value::Table(table) => table.get(key).ok_or_else(|| Error::cant_find(key)),
            other => Err(Error::type_mismatch(format!(
                "cannot look up '{key}' in a {}",
                other.tag()
            ))),
        }
    }

    /// `[index]` navigation.
    pub fn element(&self, index: usize) -> Result<&ExtendedValue> {
        match &self.value {
            Value::Sequence(items) => items
                .get(index)
                .ok_or_else(|| Error::cant_find(format!("[{index}]"))),
            other => Err(Error::type_mismatch(format!(
                "cannot index [{index}] into a {}",
                other.tag()
            ))),
        }
    }
}

/// Ordered (by key) mapping from name to value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    entries: BTreeMap<String, ExtendedValue>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExtendedValue)> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Direct child lookup (no path parsing).
    pub fn get(&self, key: &str) -> Option<&ExtendedValue> {
        self.entries.get(key)
    }

    /// Direct child insertion, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: ExtendedValue) -> Option<ExtendedValue> {
        self.entries.insert(key.into(), value)
    }

    // -- path interface ----------------------------------------------------

    pub fn exists(&self, path: &str) -> bool {
        self.find(path).is_ok()
    }

    /// Resolve a dotted/indexed path.
    pub fn find(&self, path: &str) -> Result<&ExtendedValue> {
        let segments = parse_path(path)?;
        let (first, rest) = split_root(&segments)?;
        let mut current = self.get(first).ok_or_else(|| Error::cant_find(path))?;
        for segment in rest {
            current = match segment {
                Segment::Key(key) => current.member(key),
                Segment::Index(index) => current.element(*index),
            }
            .map_err(|e| match e {
                Error::CantFind { .. } => Error::cant_find(path),
                other => other,
            })?;
        }
        Ok(current)
    }

    /// Insert at a path, creating intermediate tables (or sequences when
    /// the next segment is an index) as needed. An index equal to the
    /// sequence length appends.
    pub fn insert(&mut self, path: &str, value: ExtendedValue) -> Result<()> {
        let segments = parse_path(path)?;
        let mut root = Value::Table(std::mem::take(self));
        let outcome = insert_at(&mut root, &segments, value, path);
        if let Value::Table(table) = root {
            *self = table;
        }
        outcome
    }

    /// Remove the value at a path. Returns whether anything was removed.
    pub fn erase(&mut self, path: &str) -> bool {
        let Ok(segments) = parse_path(path) else {
            return false;
        };
        let mut root = Value::Table(std::mem::take(self));
        let removed = erase_at(&mut root, &segments);
        if let Value::Table(table) = root {
            *self = table;
        }
        removed
    }

    pub fn put_nil(&mut self, path: &str, in_prolog: bool) -> Result<()> {
        self.insert(path, ExtendedValue::with_prolog(Value::Nil, in_prolog))
    }

    pub fn put_bool(&mut self, path: &str, value: bool, in_prolog: bool) -> Result<()> {
        self.insert(path, ExtendedValue::with_prolog(Value::Bool(value), in_prolog))
    }

    pub fn put_int(&mut self, path: &str, value: i128, in_prolog: bool) -> Result<()> {
        let number = Value::Number(Number::from_int(value));
        self.insert(path, ExtendedValue::with_prolog(number, in_prolog))
    }

    pub fn put_float(&mut self, path: &str, value: f64, in_prolog: bool) -> Result<()> {
        let number = Value::Number(Number::from_float(value)?);
        self.insert(path, ExtendedValue::with_prolog(number, in_prolog))
    }

    pub fn put_complex(&mut self, path: &str, value: Complex, in_prolog: bool) -> Result<()> {
        self.insert(path, ExtendedValue::with_prolog(Value::complex(value)?, in_prolog))
    }

    pub fn put_string(&mut self, path: &str, value: &str, in_prolog: bool) -> Result<()> {
        self.insert(path, ExtendedValue::with_prolog(Value::string(value)?, in_prolog))
    }

    pub fn put_empty_sequence(&mut self, path: &str, in_prolog: bool) -> Result<()> {
        let seq = Value::Sequence(Vec::new());
        self.insert(path, ExtendedValue::with_prolog(seq, in_prolog))
    }

    pub fn put_empty_table(&mut self, path: &str, in_prolog: bool) -> Result<()> {
        let table = Value::Table(Table::new());
        self.insert(path, ExtendedValue::with_prolog(table, in_prolog))
    }
}

impl FromIterator<(String, ExtendedValue)> for Table {
    fn from_iter<I: IntoIterator<Item = (String, ExtendedValue)>>(iter: I) -> Self {
        Table {
            entries: iter.into_iter().collect(),
        }
    }
}

fn split_root(segments: &[Segment]) -> Result<(&str, &[Segment])> {
    match segments.split_first() {
        Some((Segment::Key(key), rest)) => Ok((key.as_str(), rest)),
        _ => Err(Error::cant_happen("path does not start with a key")),
    }
}

fn insert_at(
    target: &mut Value,
    segments: &[Segment],
    value: ExtendedValue,
    path: &str,
) -> Result<()> {
    let Some((first, rest)) = segments.split_first() else {
        return Err(Error::cant_happen("empty path"));
    };

    match (first, target) {
        (Segment::Key(key), Value::Table(table)) => {
            if rest.is_empty() {
                table.entries.insert(key.clone(), value);
                return Ok(());
            }
            let fresh = match rest[0] {
                Segment::Index(_) => Value::Sequence(Vec::new()),
                Segment::Key(_) => Value::Table(Table::new()),
            };
            let slot = table
                .entries
                .entry(key.clone())
                .or_insert_with(|| ExtendedValue::with_prolog(fresh, value.in_prolog));
            insert_at(&mut slot.value, rest, value, path)
        }
        (Segment::Index(index), Value::Sequence(items)) => {
            if rest.is_empty() {
                match (*index).cmp(&items.len()) {
                    std::cmp::Ordering::Less => items[*index] = value,
                    std::cmp::Ordering::Equal => items.push(value),
                    std::cmp::Ordering::Greater => return Err(Error::cant_find(path)),
                }
                return Ok(());
            }
            let slot = items.get_mut(*index).ok_or_else(|| Error::cant_find(path))?;
            insert_at(&mut slot.value, rest, value, path)
        }
        (segment, other) => Err(Error::type_mismatch(format!(
            "cannot insert '{}' of path '{path}' into a {}",
            join_path(std::slice::from_ref(segment)),
            other.tag()
        ))),
    }
}

fn erase_at(target: &mut Value, segments: &[Segment]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };
    match (first, target) {
        (Segment::Key(key), Value::Table(table)) => {
            if rest.is_empty() {
                table.entries.remove(key).is_some()
            } else {
                table
                    .entries
                    .get_mut(key)
                    .is_some_and(|slot| erase_at(&mut slot.value, rest))
            }
        }
        (Segment::Index(index), Value::Sequence(items)) => {
            if rest.is_empty() {
                if *index < items.len() {
                    items.remove(*index);
                    true
                } else {
                    false
                }
            } else {
                items
                    .get_mut(*index)
                    .is_some_and(|slot| erase_at(&mut slot.value, rest))
            }
        }
        _ => false,
    }
}
