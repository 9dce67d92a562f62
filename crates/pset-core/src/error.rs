//! Error kinds shared by every pset crate.

use std::fmt;

/// Category code of an [`Error`], independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    CantFind,
    CantInsert,
    CantHappen,
    NumberTooLarge,
    TypeMismatch,
    ParseError,
    Conversion,
}

impl ErrorKind {
    /// Short human-readable description of the category.
    pub fn describe(&self) -> &'static str {
        match self {
            ErrorKind::CantFind => "Can't find key",
            ErrorKind::CantInsert => "Can't insert key",
            ErrorKind::CantHappen => "Can't happen",
            ErrorKind::NumberTooLarge => "Excessive value",
            ErrorKind::TypeMismatch => "Type mismatch",
            ErrorKind::ParseError => "Parse error",
            ErrorKind::Conversion => "Conversion failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Errors raised while parsing, encoding, decoding, or querying parameters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed source text.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// Missing key, missing registry entry, or missing reference target.
    #[error("can't find key: {key}")]
    CantFind { key: String },

    /// A present value has the wrong shape or fails to decode.
    #[error("type mismatch: {message}")]
    TypeMismatch { message: String },

    /// Insertion refused because the key already exists.
    #[error("can't insert key: {key}")]
    CantInsert { key: String },

    /// The value does not fit the requested numeric type.
    #[error("excessive value: {text} does not fit in {target}")]
    NumberTooLarge { text: String, target: &'static str },

    /// Internal inconsistency.
    #[error("can't happen: {message}")]
    CantHappen { message: String },

    /// A caller-supplied converter rejected the value stored at `key`.
    #[error("conversion of '{key}' failed: {source}")]
    Conversion {
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Category code of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse { .. } => ErrorKind::ParseError,
            Error::CantFind { .. } => ErrorKind::CantFind,
            Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Error::CantInsert { .. } => ErrorKind::CantInsert,
            Error::NumberTooLarge { .. } => ErrorKind::NumberTooLarge,
            Error::CantHappen { .. } => ErrorKind::CantHappen,
            Error::Conversion { .. } => ErrorKind::Conversion,
        }
    }

    pub fn cant_find(key: impl Into<String>) -> Self {
        Error::CantFind { key: key.into() }
    }

    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Error::TypeMismatch {
            message: message.into(),
        }
    }

    pub fn cant_happen(message: impl Into<String>) -> Self {
        Error::CantHappen {
            message: message.into(),
        }
    }
}

/// Result type alias for pset operations.
pub type Result<T> = std::result::Result<T, Error>;
