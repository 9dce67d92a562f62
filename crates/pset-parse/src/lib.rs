//! Grammar and single-pass parser for the pset configuration language.
//!
//! ```text
//! document   := (binding | prolog)*
//! prolog     := 'BEGIN_PROLOG' binding* 'END_PROLOG'
//! binding    := (key ':')? expr
//! table      := '{' (key ':' expr) % ','? '}'
//! array      := '[' expr % ',' ']'
//! reference  := key ('(' (int | 'last') ')')? ('.' key | '[' int ']')* ('@file' | '@DB')?
//! string     := '"' escaped_char* '"' | '\'' char* '\''
//! complex    := '(' number ',' number ')'
//! expr       := number | 'true' | 'false' | 'nil' | string | complex
//!             | table | array | reference
//! ```
//!
//! Whitespace and comments (`#` or `//` to end of line) separate tokens.
//! References are resolved while parsing against the top-level bindings
//! seen so far; plain names pick the most recent binding and `name(n)`
//! picks the n-th one.

mod lexer;
mod options;
mod parser;

pub use options::ParseOptions;
pub use pset_core::{Error, Result};

use pset_core::{Document, Value};

use parser::Parser;

/// Parse a whole document with default options.
pub fn parse_document(source: &str) -> Result<Document> {
    parse_document_with(source, &ParseOptions::default())
}

/// Parse a whole document. On error nothing is returned.
pub fn parse_document_with(source: &str, options: &ParseOptions) -> Result<Document> {
    Parser::new(source, options)?.parse_document()
}

/// Parse a single expression.
///
/// There are no bindings to refer to, so any reference is an error.
pub fn parse_value(source: &str) -> Result<Value> {
    let options = ParseOptions::strict();
    Parser::new(source, &options)?.parse_standalone()
}
