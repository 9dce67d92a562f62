//! Core types for the pset configuration language.
//!
//! - [`value`]: the parse-time value model (values, prolog flag, tables)
//! - [`document`]: ordered top-level bindings with versioned lookup
//! - [`codec`]: canonical string forms for every primitive type
//! - [`path`]: dotted/indexed parameter paths
//! - [`hash`]: SHA-256 content addressing
//! - [`error`]: error kinds shared by all pset crates

pub mod codec;
pub mod document;
pub mod error;
pub mod hash;
pub mod path;
pub mod value;

pub use codec::{Complex, Nil, NumberKind};
pub use document::{Binding, DeferredReference, DeferredSource, Diagnostic, Document, Position};
pub use error::{Error, ErrorKind, Result};
pub use hash::{hash_hex, ContentHash, ContentHasher};
pub use path::{parse_path, Segment};
pub use value::{ExtendedValue, Number, Table, Value, ValueTag};
