//! Dotted/indexed parameter paths such as `a.b[2].c`.

use std::fmt;

use crate::error::{Error, Result};

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => f.write_str(key),
            Segment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Split a path into segments. The first segment is always a key.
pub fn parse_path(path: &str) -> Result<Vec<Segment>> {
    let malformed = |why: &str| Error::type_mismatch(format!("malformed path '{path}': {why}"));

    let mut segments = Vec::new();
    let mut rest = path;
    let mut expect_key = true;

    while !rest.is_empty() {
        if expect_key {
            let end = rest.find(|c: char| c == '.' || c == '[').unwrap_or(rest.len());
            let key = &rest[..end];
            if !is_key(key) {
                return Err(malformed("expected a key"));
            }
            segments.push(Segment::Key(key.to_string()));
            rest = &rest[end..];
            expect_key = false;
        } else if let Some(after) = rest.strip_prefix('.') {
            if after.is_empty() {
                return Err(malformed("trailing '.'"));
            }
            rest = after;
            expect_key = true;
        } else if let Some(after) = rest.strip_prefix('[') {
            let close = after.find(']').ok_or_else(|| malformed("unclosed '['"))?;
            let index: usize = after[..close]
                .trim()
                .parse()
                .map_err(|_| malformed("index is not a non-negative integer"))?;
            segments.push(Segment::Index(index));
            rest = &after[close + 1..];
        } else {
            return Err(malformed("unexpected character"));
        }
    }

    if segments.is_empty() {
        return Err(malformed("empty path"));
    }
    Ok(segments)
}

/// Render segments back into path syntax.
pub fn join_path(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 && matches!(segment, Segment::Key(_)) {
            out.push('.');
        }
        out.push_str(&segment.to_string());
    }
    out
}

/// `[A-Za-z_][A-Za-z_0-9]*`
pub fn is_key(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
