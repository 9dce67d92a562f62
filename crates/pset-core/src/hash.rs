//! SHA-256 content digests.
//!
//! Callers feed a canonical walk of their content into a [`ContentHasher`].
//! Every variable-length field is length-prefixed, so distinct walks never
//! produce the same byte stream.

use sha2::{Digest, Sha256};

/// A 32-byte SHA-256 content hash.
pub type ContentHash = [u8; 32];

/// Incremental builder for a [`ContentHash`].
#[derive(Clone, Default)]
pub struct ContentHasher(Sha256);

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-byte discriminant.
    pub fn tag(&mut self, tag: u8) -> &mut Self {
        self.0.update([tag]);
        self
    }

    /// Element count of a following run of fields.
    pub fn count(&mut self, n: usize) -> &mut Self {
        self.0.update((n as u64).to_le_bytes());
        self
    }

    /// Length-prefixed UTF-8 text.
    pub fn text(&mut self, text: &str) -> &mut Self {
        self.count(text.len());
        self.0.update(text.as_bytes());
        self
    }

    /// A nested digest, taken verbatim.
    pub fn digest(&mut self, hash: &ContentHash) -> &mut Self {
        self.0.update(hash);
        self
    }

    pub fn finish(self) -> ContentHash {
        self.0.finalize().into()
    }
}

/// Format a content hash as a hex string.
pub fn hash_hex(hash: &ContentHash) -> String {
    hash.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse a 64-character hex string back into a content hash.
pub fn parse_hash_hex(hex: &str) -> Option<ContentHash> {
    if hex.len() != 64 || !hex.is_ascii() {
        return None;
    }
    let mut out = [0u8; 32];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16).ok()?;
    }
    Some(out)
}
