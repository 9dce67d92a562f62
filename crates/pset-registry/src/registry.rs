//! Content-addressed store of parameter-set contents.
//!
//! Identifiers are SHA-256 digests of the canonical serialized content, so
//! equal content always yields the same identifier, across registries and
//! across processes. Entries are immutable once stored.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Serialize, Serializer};

use pset_core::hash::parse_hash_hex;
use pset_core::{hash_hex, ContentHash, ContentHasher, Error, Result};

use crate::cell::Cell;
use crate::pset::ParameterSet;

/// Contents of one parameter set, ordered by key.
pub(crate) type Entries = BTreeMap<String, Cell>;

/// Identifier of a stored parameter set.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterSetId(ContentHash);

impl ParameterSetId {
    pub(crate) fn of(entries: &Entries) -> Self {
        let mut hasher = ContentHasher::new();
        hasher.count(entries.len());
        for (key, cell) in entries {
            hasher.text(key);
            cell.digest(&mut hasher);
        }
        ParameterSetId(hasher.finish())
    }

    pub fn as_bytes(&self) -> &ContentHash {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hash_hex(&self.0)
    }
}

impl fmt::Display for ParameterSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ParameterSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParameterSetId({self})")
    }
}

impl FromStr for ParameterSetId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_hash_hex(s)
            .map(ParameterSetId)
            .ok_or_else(|| Error::type_mismatch(format!("invalid parameter set id: {s}")))
    }
}

impl Serialize for ParameterSetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Shared, cloneable handle to a set of interned parameter sets.
///
/// Clones share storage. Lookups take a read lock; insertion is a single
/// check-and-insert under the write lock, so concurrent `put`s of equal
/// content store it once.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<HashMap<ParameterSetId, Arc<Entries>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry, created on first use and never torn down.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    /// Whether both handles share the same storage.
    pub fn same_as(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Intern a parameter set and return its identifier.
    ///
    /// Nested tables that live in another registry are copied in first.
    pub fn put(&self, pset: &ParameterSet) -> Result<ParameterSetId> {
        let id = pset.id();
        if self.contains(id) {
            tracing::trace!(%id, "parameter set already interned");
            return Ok(id);
        }
        if !self.same_as(pset.registry()) {
            for cell in pset.entries().values() {
                self.adopt(cell, pset.registry())?;
            }
        }
        self.insert(id, Arc::new(pset.entries().clone()));
        Ok(id)
    }

    /// Intern raw contents. Children must already be present.
    pub(crate) fn intern(&self, entries: Entries) -> ParameterSetId {
        let id = ParameterSetId::of(&entries);
        self.insert(id, Arc::new(entries));
        id
    }

    pub fn get(&self, id: ParameterSetId) -> Result<ParameterSet> {
        let entries = self.entries(id)?;
        Ok(ParameterSet::from_parts(
            entries.as_ref().clone(),
            self.clone(),
            id,
        ))
    }

    pub fn contains(&self, id: ParameterSetId) -> bool {
        self.read().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// `key:value` rendering of a stored set.
    pub fn to_string(&self, id: ParameterSetId) -> Result<String> {
        Ok(self.get(id)?.to_string())
    }

    pub(crate) fn entries(&self, id: ParameterSetId) -> Result<Arc<Entries>> {
        self.read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::cant_find(id.to_string()))
    }

    fn insert(&self, id: ParameterSetId, entries: Arc<Entries>) {
        match self.write().entry(id) {
            Entry::Occupied(_) => tracing::trace!(%id, "parameter set already interned"),
            Entry::Vacant(slot) => {
                tracing::debug!(%id, keys = entries.len(), "interned parameter set");
                slot.insert(entries);
            }
        }
    }

    /// Copy every table reachable from `cell` out of `source`.
    fn adopt(&self, cell: &Cell, source: &Registry) -> Result<()> {
        match cell {
            Cell::Atom(_) => Ok(()),
            Cell::Sequence(items) => items.iter().try_for_each(|item| self.adopt(item, source)),
            Cell::Table(id) => {
                if self.contains(*id) {
                    return Ok(());
                }
                let entries = source.entries(*id)?;
                for child in entries.values() {
                    self.adopt(child, source)?;
                }
                tracing::trace!(%id, "adopting nested parameter set");
                self.insert(*id, entries);
                Ok(())
            }
        }
    }

    // Entries are inserted whole, so a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ParameterSetId, Arc<Entries>>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ParameterSetId, Arc<Entries>>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("len", &self.len()).finish()
    }
}
