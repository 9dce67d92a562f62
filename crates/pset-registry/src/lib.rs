//! Content-addressed parameter sets and their registry.
//!
//! A [`ParameterSet`] is an immutable-by-identity table of named cells:
//! atoms in canonical text form, sequences, or nested sets referenced by
//! [`ParameterSetId`]. Nested sets live in a [`Registry`], which interns
//! each distinct content exactly once:
//!
//! - equal content, built anywhere, gets the same identifier
//! - `registry.get(registry.put(&a)?)? == a`
//! - mutating a set yields a new identifier; stored entries never change
//!
//! Values move in and out through the [`FromCell`] / [`IntoCell`] traits,
//! implemented for the primitive types, `Option`, `Vec` and nested sets.

pub mod cell;
pub mod convert;
pub mod pset;
pub mod registry;

pub use cell::{Atom, AtomKind, Cell};
pub use convert::{FromCell, IntoCell};
pub use pset::ParameterSet;
pub use registry::{ParameterSetId, Registry};

pub use pset_core::{Error, ErrorKind, Result};
