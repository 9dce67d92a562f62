//! Typed, path-navigating query API over a registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use pset_core::codec;
use pset_core::path::{is_key, parse_path, Segment};
use pset_core::{Error, ErrorKind, Result};

use crate::cell::{AtomKind, Cell};
use crate::convert::{FromCell, IntoCell};
use crate::registry::{Entries, ParameterSetId, Registry};

/// A table of named cells.
///
/// Nested tables are stored as identifiers into the set's registry.
/// Mutation never touches stored entries: changing a nested value builds
/// and interns new nested sets.
#[derive(Clone)]
pub struct ParameterSet {
    entries: Entries,
    registry: Registry,
    id: OnceLock<ParameterSetId>,
}

impl ParameterSet {
    /// An empty set backed by [`Registry::global`].
    pub fn new() -> Self {
        Self::with_registry(Registry::global())
    }

    pub fn with_registry(registry: &Registry) -> Self {
        ParameterSet {
            entries: BTreeMap::new(),
            registry: registry.clone(),
            id: OnceLock::new(),
        }
    }

    pub(crate) fn from_parts(entries: Entries, registry: Registry, id: ParameterSetId) -> Self {
        ParameterSet {
            entries,
            registry,
            id: OnceLock::from(id),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn entries(&self) -> &Entries {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Content identifier. Computed on first use and cached until the
    /// next mutation.
    pub fn id(&self) -> ParameterSetId {
        *self.id.get_or_init(|| ParameterSetId::of(&self.entries))
    }

    /// Top-level keys, sorted.
    pub fn get_keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Top-level keys bound to nested tables, sorted.
    pub fn get_pset_keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, cell)| matches!(cell, Cell::Table(_)))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn has_key(&self, path: &str) -> bool {
        self.find(path).is_ok()
    }

    /// Raw cell at a dotted/indexed path.
    pub fn find(&self, path: &str) -> Result<Cell> {
        let segments = parse_path(path)?;
        let mut current: Option<Cell> = None;
        for segment in &segments {
            let next = match (segment, &current) {
                (Segment::Key(key), None) => self.entries.get(key).cloned(),
                (Segment::Key(key), Some(Cell::Table(id))) => {
                    self.registry.entries(*id)?.get(key).cloned()
                }
                (Segment::Index(index), Some(Cell::Sequence(items))) => items.get(*index).cloned(),
                (segment, Some(other)) => {
                    return Err(Error::type_mismatch(format!(
                        "cannot apply '{segment}' of '{path}' to a {}",
                        other.describe()
                    )))
                }
                (Segment::Index(_), None) => {
                    return Err(Error::cant_happen("path does not start with a key"))
                }
            };
            current = Some(next.ok_or_else(|| Error::cant_find(path))?);
        }
        current.ok_or_else(|| Error::cant_find(path))
    }

    // -- typed retrieval -----------------------------------------------------

    pub fn get<T: FromCell>(&self, path: &str) -> Result<T> {
        let cell = self.find(path)?;
        T::from_cell(&cell, &self.registry).map_err(|e| annotate(e, path))
    }

    /// `default` when the path is absent or holds a value of another kind.
    pub fn get_or<T: FromCell>(&self, path: &str, default: T) -> Result<T> {
        match self.find(path) {
            Ok(cell) if T::accepts(&cell) => {
                T::from_cell(&cell, &self.registry).map_err(|e| annotate(e, path))
            }
            Ok(_) => Ok(default),
            Err(e) if matches!(e.kind(), ErrorKind::CantFind | ErrorKind::TypeMismatch) => {
                Ok(default)
            }
            Err(e) => Err(e),
        }
    }

    /// Writes `out` and returns `true` if the path exists. Absence is not
    /// an error; a present value of the wrong type is.
    pub fn get_if_present<T: FromCell>(&self, path: &str, out: &mut T) -> Result<bool> {
        match self.find(path) {
            Ok(cell) => {
                *out = T::from_cell(&cell, &self.registry).map_err(|e| annotate(e, path))?;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::CantFind => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Decode an atom with a caller-supplied converter. Strings reach the
    /// converter unquoted; other atoms as canonical text.
    pub fn get_with<T, E, F>(&self, path: &str, convert: F) -> Result<T>
    where
        F: Fn(&str) -> std::result::Result<T, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let cell = self.find(path)?;
        self.convert(&cell, path, &convert)
    }

    pub fn get_if_present_with<T, E, F>(&self, path: &str, out: &mut T, convert: F) -> Result<bool>
    where
        F: Fn(&str) -> std::result::Result<T, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        match self.find(path) {
            Ok(cell) => {
                *out = self.convert(&cell, path, &convert)?;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::CantFind => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn convert<T, E, F>(&self, cell: &Cell, path: &str, convert: &F) -> Result<T>
    where
        F: Fn(&str) -> std::result::Result<T, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let atom = cell.as_atom().ok_or_else(|| {
            Error::type_mismatch(format!(
                "'{path}' holds a {}, not a single value",
                cell.describe()
            ))
        })?;
        let text = atom.plain_text()?;
        convert(&text).map_err(|e| Error::Conversion {
            key: path.to_string(),
            source: e.into(),
        })
    }

    // -- mutation ------------------------------------------------------------

    /// Store `value` at `path`, replacing what was there. Missing
    /// intermediate tables are created.
    pub fn put<T: IntoCell>(&mut self, path: &str, value: T) -> Result<()> {
        let cell = value.into_cell(&self.registry)?;
        self.place(path, cell, true)
    }

    /// Like [`put`](Self::put) but fails with `CantInsert` if `path` is
    /// already bound.
    pub fn put_new<T: IntoCell>(&mut self, path: &str, value: T) -> Result<()> {
        let cell = value.into_cell(&self.registry)?;
        self.place(path, cell, false)
    }

    /// Store a raw cell under a top-level key. Any table it references must
    /// already be interned in this set's registry.
    pub fn insert(&mut self, key: &str, cell: Cell) -> Result<()> {
        if !is_key(key) {
            return Err(Error::type_mismatch(format!("invalid key '{key}'")));
        }
        let cell = cell.into_cell(&self.registry)?;
        self.entries.insert(key.to_string(), cell);
        self.id = OnceLock::new();
        Ok(())
    }

    /// Remove a top-level key. Returns whether it was present.
    pub fn erase(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.id = OnceLock::new();
        }
        removed
    }

    fn place(&mut self, path: &str, cell: Cell, overwrite: bool) -> Result<()> {
        let segments = parse_path(path)?;
        let Some((Segment::Key(key), rest)) = segments.split_first() else {
            return Err(Error::cant_happen("path does not start with a key"));
        };
        let existing = self.entries.get(key).cloned();
        let placed = place_in(&self.registry, existing, rest, cell, overwrite, path)?;
        self.entries.insert(key.clone(), placed);
        self.id = OnceLock::new();
        Ok(())
    }

    // -- rendering -----------------------------------------------------------

    /// JSON view: tables become objects, sequences arrays, numbers and
    /// booleans native JSON where they fit, everything else strings.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut object = serde_json::Map::new();
        for (key, cell) in &self.entries {
            object.insert(key.clone(), self.cell_to_json(cell)?);
        }
        Ok(serde_json::Value::Object(object))
    }

    fn cell_to_json(&self, cell: &Cell) -> Result<serde_json::Value> {
        use serde_json::Value as Json;
        Ok(match cell {
            Cell::Atom(atom) => match atom.kind() {
                AtomKind::Nil => Json::Null,
                AtomKind::Bool => Json::Bool(codec::decode_bool(atom.text())?),
                AtomKind::Integer => {
                    let wide = codec::decode_int(atom.text())?;
                    if let Ok(v) = i64::try_from(wide) {
                        Json::from(v)
                    } else if let Ok(v) = u64::try_from(wide) {
                        Json::from(v)
                    } else {
                        Json::String(atom.text().to_string())
                    }
                }
                AtomKind::Float => serde_json::Number::from_f64(codec::decode_float(atom.text())?)
                    .map_or_else(|| Json::String(atom.text().to_string()), Json::Number),
                AtomKind::Complex => Json::String(atom.text().to_string()),
                AtomKind::String => Json::String(codec::decode_string(atom.text())?),
            },
            Cell::Sequence(items) => Json::Array(
                items
                    .iter()
                    .map(|item| self.cell_to_json(item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Cell::Table(id) => self.registry.get(*id)?.to_json()?,
        })
    }

    /// Render one cell the way [`Display`](fmt::Display) renders values:
    /// atoms as canonical text, sequences as `[a,b]`, nested sets as
    /// `{key:value ...}`.
    pub fn render_cell(&self, cell: &Cell) -> String {
        let mut out = String::new();
        self.write_cell(&mut out, cell);
        out
    }

    fn write_cell(&self, out: &mut String, cell: &Cell) {
        match cell {
            Cell::Atom(atom) => out.push_str(atom.text()),
            Cell::Sequence(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    self.write_cell(out, item);
                }
                out.push(']');
            }
            Cell::Table(id) => match self.registry.get(*id) {
                Ok(child) => {
                    out.push('{');
                    out.push_str(&child.to_string());
                    out.push('}');
                }
                // Only reachable if the registry lost an entry.
                Err(_) => out.push_str(&format!("{{@{id}}}")),
            },
        }
    }
}

/// Rebuild the value in `slot` with `cell` placed at `segments`.
fn place_in(
    registry: &Registry,
    slot: Option<Cell>,
    segments: &[Segment],
    cell: Cell,
    overwrite: bool,
    path: &str,
) -> Result<Cell> {
    let Some((first, rest)) = segments.split_first() else {
        if slot.is_some() && !overwrite {
            return Err(Error::CantInsert {
                key: path.to_string(),
            });
        }
        return Ok(cell);
    };

    match first {
        Segment::Key(key) => {
            let mut entries = match slot {
                None => Entries::new(),
                Some(Cell::Table(id)) => registry.entries(id)?.as_ref().clone(),
                Some(other) => {
                    return Err(Error::type_mismatch(format!(
                        "cannot insert '{path}': '{key}' would go inside a {}",
                        other.describe()
                    )))
                }
            };
            let existing = entries.get(key).cloned();
            let placed = place_in(registry, existing, rest, cell, overwrite, path)?;
            entries.insert(key.clone(), placed);
            Ok(Cell::Table(registry.intern(entries)))
        }
        Segment::Index(index) => {
            let mut items = match slot {
                None => Vec::new(),
                Some(Cell::Sequence(items)) => items,
                Some(other) => {
                    return Err(Error::type_mismatch(format!(
                        "cannot insert '{path}': [{index}] would go inside a {}",
                        other.describe()
                    )))
                }
            };
            if *index > items.len() {
                return Err(Error::cant_find(path));
            }
            let existing = items.get(*index).cloned();
            let placed = place_in(registry, existing, rest, cell, overwrite, path)?;
            if *index == items.len() {
                items.push(placed);
            } else {
                items[*index] = placed;
            }
            Ok(Cell::Sequence(items))
        }
    }
}

/// Prefix decode failures with the path they came from.
fn annotate(error: Error, path: &str) -> Error {
    match error {
        Error::TypeMismatch { message } => Error::type_mismatch(format!("'{path}': {message}")),
        other => other,
    }
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Equal when the contents are equal, whichever registry backs them.
impl PartialEq for ParameterSet {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for ParameterSet {}

/// Space-separated `key:value` pairs in key order; nested sets in braces.
impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, cell)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{key}:{}", self.render_cell(cell))?;
        }
        Ok(())
    }
}

impl fmt::Debug for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterSet")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pset_core::{Complex, Nil};

    fn pset() -> ParameterSet {
        ParameterSet::with_registry(&Registry::new())
    }

    #[test]
    fn put_and_get() {
        let mut p = pset();
        p.put("a", 1i32).unwrap();
        p.put("b", 2.5f64).unwrap();
        p.put("c", "rain").unwrap();
        p.put("d", vec![1i32, 2, 3]).unwrap();
        assert_eq!(p.get::<i32>("a").unwrap(), 1);
        assert_eq!(p.get::<f64>("b").unwrap(), 2.5);
        assert_eq!(p.get::<String>("c").unwrap(), "rain");
        assert_eq!(p.get::<Vec<i32>>("d").unwrap(), vec![1, 2, 3]);
        assert_eq!(p.get::<i32>("d[1]").unwrap(), 2);
        assert_eq!(p.get_keys(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn missing_and_mismatched() {
        let mut p = pset();
        p.put("a", 1i32).unwrap();
        assert_eq!(p.get::<i32>("zz").unwrap_err().kind(), ErrorKind::CantFind);
        assert_eq!(p.get::<f64>("a").unwrap_err().kind(), ErrorKind::TypeMismatch);
        assert_eq!(p.get::<String>("a").unwrap_err().kind(), ErrorKind::TypeMismatch);
        assert_eq!(p.get::<i32>("a.b").unwrap_err().kind(), ErrorKind::TypeMismatch);
        assert_eq!(p.get::<i32>("bad..path").unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn defaults() {
        let mut p = pset();
        p.put("a", 1i32).unwrap();
        p.put("big", 1000i32).unwrap();
        assert_eq!(p.get_or("a", 9.0f64).unwrap(), 9.0);
        assert_eq!(p.get_or("missing", 4i32).unwrap(), 4);
        assert_eq!(p.get_or("a", 0i32).unwrap(), 1);
        assert_eq!(p.get_or("a.nested", 3i32).unwrap(), 3);
        let err = p.get_or("big", 0u8).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NumberTooLarge);
    }

    #[test]
    fn get_if_present_distinguishes_absence() {
        let mut p = pset();
        p.put("a", 5i32).unwrap();
        let mut out = 0i32;
        assert!(p.get_if_present("a", &mut out).unwrap());
        assert_eq!(out, 5);
        let mut untouched = 7i32;
        assert!(!p.get_if_present("b", &mut untouched).unwrap());
        assert_eq!(untouched, 7);
        let mut text = String::new();
        assert!(p.get_if_present("a", &mut text).is_err());
    }

    #[test]
    fn custom_converters() {
        let mut p = pset();
        p.put("n", "ff").unwrap();
        let parse_hex = |s: &str| u32::from_str_radix(s, 16);
        assert_eq!(p.get_with("n", parse_hex).unwrap(), 255);

        p.put("bad", "zz").unwrap();
        let err = p.get_with("bad", parse_hex).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conversion);

        let mut out = 0u32;
        assert!(!p.get_if_present_with("nope", &mut out, parse_hex).unwrap());
        assert!(p.get_if_present_with("n", &mut out, parse_hex).unwrap());
        assert_eq!(out, 255);
        assert!(p.get_if_present_with("bad", &mut out, parse_hex).is_err());
    }

    #[test]
    fn nested_sets() {
        let registry = Registry::new();
        let mut child = ParameterSet::with_registry(&registry);
        child.put("c", 2.5f64).unwrap();
        let mut p = ParameterSet::with_registry(&registry);
        p.put("b", child.clone()).unwrap();
        p.put("x", 1i32).unwrap();

        assert_eq!(p.get_pset_keys(), vec!["b"]);
        assert_eq!(p.get::<f64>("b.c").unwrap(), 2.5);
        assert_eq!(p.get::<ParameterSet>("b").unwrap(), child);
        assert_eq!(p.get::<ParameterSet>("b").unwrap().id(), child.id());
    }

    #[test]
    fn dotted_put_rebuilds_nested_tables() {
        let mut p = pset();
        p.put("a.b.c", 1i32).unwrap();
        p.put("a.b.d", 2i32).unwrap();
        p.put("a.list[0]", "first").unwrap();
        p.put("a.list[1]", "second").unwrap();

        assert_eq!(p.get::<i32>("a.b.c").unwrap(), 1);
        assert_eq!(p.get::<i32>("a.b.d").unwrap(), 2);
        assert_eq!(p.get::<Vec<String>>("a.list").unwrap(), vec!["first", "second"]);
        assert_eq!(p.put("a.list[5]", 0i32).unwrap_err().kind(), ErrorKind::CantFind);
        assert_eq!(p.put("a.b.c.d", 0i32).unwrap_err().kind(), ErrorKind::TypeMismatch);

        let mut direct = pset();
        let mut b = ParameterSet::with_registry(direct.registry());
        b.put("c", 1i32).unwrap();
        b.put("d", 2i32).unwrap();
        direct.put("b", b).unwrap();
        let rebuilt = p.get::<ParameterSet>("a.b").unwrap();
        assert_eq!(rebuilt.id(), direct.get::<ParameterSet>("b").unwrap().id());
    }

    #[test]
    fn put_new_refuses_overwrite() {
        let mut p = pset();
        p.put_new("a", 1i32).unwrap();
        assert_eq!(p.put_new("a", 2i32).unwrap_err().kind(), ErrorKind::CantInsert);
        p.put_new("t.x", 1i32).unwrap();
        assert_eq!(p.put_new("t.x", 1i32).unwrap_err().kind(), ErrorKind::CantInsert);
        p.put_new("t.y", 1i32).unwrap();
        assert_eq!(p.get::<i32>("a").unwrap(), 1);
    }

    #[test]
    fn insert_and_erase() {
        let mut p = pset();
        p.insert("raw", Cell::atom(AtomKind::Integer, "+12")).unwrap();
        assert_eq!(p.get::<i64>("raw").unwrap(), 12);
        assert!(p.insert("not a key", Cell::nil()).is_err());

        let before = p.id();
        p.put("tmp", true).unwrap();
        assert_ne!(p.id(), before);
        assert!(p.erase("tmp"));
        assert!(!p.erase("tmp"));
        assert_eq!(p.id(), before);
    }

    #[test]
    fn id_tracks_content_not_history() {
        let mut a = pset();
        a.put("x", 1i32).unwrap();
        a.put("y", 2i32).unwrap();
        let mut b = pset();
        b.put("y", 2i32).unwrap();
        b.put("x", 0i32).unwrap();
        b.put("x", 1i32).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a, b);
    }

    #[test]
    fn integer_and_float_differ() {
        let mut a = pset();
        a.put("v", 1i32).unwrap();
        let mut b = pset();
        b.put("v", 1.0f64).unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn nil_and_options() {
        let mut p = pset();
        p.put("n", Nil).unwrap();
        p.put("o", Some(3i32)).unwrap();
        assert_eq!(p.get::<Option<i32>>("n").unwrap(), None);
        assert_eq!(p.get::<Option<i32>>("o").unwrap(), Some(3));
        assert_eq!(p.get::<Nil>("n").unwrap(), Nil);
        assert_eq!(p.get_or("n", 5i32).unwrap(), 5);
    }

    #[test]
    fn display_form() {
        let registry = Registry::new();
        let mut child = ParameterSet::with_registry(&registry);
        child.put("c", 2.5f64).unwrap();
        let mut p = ParameterSet::with_registry(&registry);
        p.put("a", 1i32).unwrap();
        p.put("b", child).unwrap();
        p.put("d", vec![1i32, 2, 3]).unwrap();
        p.put("s", "a b").unwrap();
        p.put("z", Complex::new(1.0, 2.0)).unwrap();
        assert_eq!(p.to_string(), "a:+1 b:{c:2.5} d:[+1,+2,+3] s:\"a b\" z:(+1,+2)");
        assert_eq!(registry.to_string(p.get::<ParameterSet>("b").unwrap().id()).unwrap(), "c:2.5");
        assert_eq!(pset().to_string(), "");
    }

    #[test]
    fn json_view() {
        let mut p = pset();
        p.put("a", 1i32).unwrap();
        p.put("b.c", 2.5f64).unwrap();
        p.put("s", "it's").unwrap();
        p.put("n", Nil).unwrap();
        p.put("huge", u64::MAX).unwrap();
        p.put("inf", f64::INFINITY).unwrap();
        let json = p.to_json().unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "a": 1,
                "b": { "c": 2.5 },
                "s": "it's",
                "n": null,
                "huge": u64::MAX,
                "inf": "+infinity",
            })
        );
    }
}
