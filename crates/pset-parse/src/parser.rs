//! Recursive-descent evaluator.
//!
//! The parser does not build an AST: each top-level binding is evaluated
//! as soon as it is read, so references resolve against exactly the
//! bindings that precede them.

use pset_core::codec::{self, Complex};
use pset_core::path::{join_path, Segment};
use pset_core::{
    Binding, DeferredReference, DeferredSource, Diagnostic, Document, Error, ExtendedValue,
    Number, Position, Result, Table, Value,
};

use crate::lexer::{Lexer, Spanned, Token};
use crate::options::ParseOptions;

const BEGIN_PROLOG: &str = "BEGIN_PROLOG";
const END_PROLOG: &str = "END_PROLOG";
const LAST: &str = "last";

/// Words that can never name a binding or table entry.
const RESERVED: [&str; 6] = [
    codec::NIL,
    codec::TRUE,
    codec::FALSE,
    codec::INFINITY,
    BEGIN_PROLOG,
    END_PROLOG,
];

/// Which occurrence of a repeated name a reference selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Version {
    Latest,
    Nth(usize),
}

pub(crate) struct Parser<'o> {
    tokens: Vec<Spanned>,
    pos: usize,
    options: &'o ParseOptions,
    document: Document,
    in_prolog: bool,
}

impl<'o> Parser<'o> {
    pub(crate) fn new(source: &str, options: &'o ParseOptions) -> Result<Self> {
        Ok(Parser {
            tokens: Lexer::new(source).tokenize()?,
            pos: 0,
            options,
            document: Document::new(),
            in_prolog: false,
        })
    }

    /// `document := (binding | prolog)*`
    pub(crate) fn parse_document(mut self) -> Result<Document> {
        let mut prolog_start = Position::default();
        loop {
            let position = self.position();
            match self.token().clone() {
                Token::Eof => break,
                Token::Ident(word) if word == BEGIN_PROLOG => {
                    if !self.options.allow_prolog {
                        return Err(parse_error(position, "prolog blocks are disabled"));
                    }
                    if self.in_prolog {
                        return Err(parse_error(position, "nested BEGIN_PROLOG"));
                    }
                    self.bump();
                    self.in_prolog = true;
                    prolog_start = position;
                }
                Token::Ident(word) if word == END_PROLOG => {
                    if !self.in_prolog {
                        return Err(parse_error(position, "END_PROLOG without BEGIN_PROLOG"));
                    }
                    self.bump();
                    self.in_prolog = false;
                }
                _ => self.parse_binding()?,
            }
        }

        if self.in_prolog {
            return Err(parse_error(prolog_start, "unterminated prolog"));
        }
        tracing::debug!(
            bindings = self.document.len(),
            diagnostics = self.document.diagnostics().len(),
            deferred = self.document.deferred().len(),
            "parsed document"
        );
        Ok(self.document)
    }

    /// A single expression followed by end of input.
    pub(crate) fn parse_standalone(mut self) -> Result<Value> {
        let value = self.parse_expr()?;
        self.expect(&Token::Eof, "end of input")?;
        Ok(value)
    }

    // -- token cursor ------------------------------------------------------

    fn token(&self) -> &Token {
        self.token_at(0)
    }

    fn token_at(&self, offset: usize) -> &Token {
        let index = (self.pos + offset).min(self.tokens.len().saturating_sub(1));
        self.tokens.get(index).map_or(&Token::Eof, |s| &s.token)
    }

    fn position(&self) -> Position {
        let index = self.pos.min(self.tokens.len().saturating_sub(1));
        self.tokens.get(index).map_or_else(Position::default, |s| s.position)
    }

    fn bump(&mut self) -> Token {
        let token = self.token().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<Position> {
        let position = self.position();
        if self.token() == expected {
            self.bump();
            Ok(position)
        } else {
            Err(parse_error(
                position,
                format!("expected {what}, found {}", self.token()),
            ))
        }
    }

    fn expect_key(&mut self) -> Result<String> {
        let position = self.position();
        match self.bump() {
            Token::Ident(word) if RESERVED.contains(&word.as_str()) => Err(parse_error(
                position,
                format!("'{word}' is reserved and cannot be used as a name"),
            )),
            Token::Ident(word) => Ok(word),
            other => Err(parse_error(position, format!("expected a name, found {other}"))),
        }
    }

    fn expect_index(&mut self) -> Result<usize> {
        let position = self.position();
        match self.bump() {
            Token::Number(text) if text.bytes().all(|b| b.is_ascii_digit()) => text
                .parse()
                .map_err(|_| parse_error(position, format!("index {text} is too large"))),
            other => Err(parse_error(
                position,
                format!("expected a non-negative integer, found {other}"),
            )),
        }
    }

    // -- grammar -----------------------------------------------------------

    /// `binding := (key ':')? expr`
    fn parse_binding(&mut self) -> Result<()> {
        let position = self.position();
        let name = if matches!(self.token(), Token::Ident(_)) && self.token_at(1) == &Token::Colon
        {
            let key = self.expect_key()?;
            self.bump();
            Some(key)
        } else {
            None
        };

        let value = self.parse_expr()?;
        tracing::trace!(name = name.as_deref(), %position, prolog = self.in_prolog, "binding");
        self.document.push(Binding {
            name,
            value: ExtendedValue::with_prolog(value, self.in_prolog),
            position,
        });
        Ok(())
    }

    fn parse_expr(&mut self) -> Result<Value> {
        let position = self.position();
        match self.token().clone() {
            Token::Number(text) => {
                self.bump();
                let number = Number::from_literal(&text)
                    .map_err(|e| parse_error(position, format!("bad number {text}: {e}")))?;
                Ok(Value::Number(number))
            }
            Token::Str(text) => {
                self.bump();
                Value::string(&text).map_err(|e| parse_error(position, e.to_string()))
            }
            Token::LBrace => self.parse_table(),
            Token::LBracket => self.parse_array(),
            Token::LParen => self.parse_complex(),
            Token::Ident(word) => match word.as_str() {
                codec::TRUE => {
                    self.bump();
                    Ok(Value::Bool(true))
                }
                codec::FALSE => {
                    self.bump();
                    Ok(Value::Bool(false))
                }
                codec::NIL => {
                    self.bump();
                    Ok(Value::Nil)
                }
                BEGIN_PROLOG | END_PROLOG => Err(parse_error(
                    position,
                    format!("{word} is only allowed at top level"),
                )),
                _ => self.parse_reference(),
            },
            other => Err(parse_error(
                position,
                format!("expected a value, found {other}"),
            )),
        }
    }

    /// `table := '{' (key ':' expr) % ','? '}'`
    ///
    /// Commas between entries are optional; a trailing one is accepted.
    fn parse_table(&mut self) -> Result<Value> {
        let open = self.expect(&Token::LBrace, "'{'")?;
        let mut table = Table::new();
        loop {
            match self.token() {
                Token::RBrace => {
                    self.bump();
                    return Ok(Value::Table(table));
                }
                Token::Eof => return Err(parse_error(open, "unterminated table")),
                _ => {}
            }
            let key = self.expect_key()?;
            self.expect(&Token::Colon, "':'")?;
            let value = self.parse_expr()?;
            table.set(key, ExtendedValue::new(value));
            if self.token() == &Token::Comma {
                self.bump();
            }
        }
    }

    /// `array := '[' expr % ',' ']'`, trailing comma accepted.
    fn parse_array(&mut self) -> Result<Value> {
        let open = self.expect(&Token::LBracket, "'['")?;
        let mut items = Vec::new();
        loop {
            match self.token() {
                Token::RBracket => {
                    self.bump();
                    return Ok(Value::Sequence(items));
                }
                Token::Eof => return Err(parse_error(open, "unterminated array")),
                _ => {}
            }
            items.push(ExtendedValue::new(self.parse_expr()?));
            match self.token() {
                Token::Comma => {
                    self.bump();
                }
                Token::RBracket => {}
                Token::Eof => return Err(parse_error(open, "unterminated array")),
                other => {
                    return Err(parse_error(
                        self.position(),
                        format!("expected ',' or ']', found {other}"),
                    ))
                }
            }
        }
    }

    /// `complex := '(' number ',' number ')'`
    fn parse_complex(&mut self) -> Result<Value> {
        let open = self.expect(&Token::LParen, "'('")?;
        let re = self.complex_part()?;
        self.expect(&Token::Comma, "','")?;
        let im = self.complex_part()?;
        self.expect(&Token::RParen, "')'")?;
        Value::complex(Complex::new(re, im)).map_err(|e| parse_error(open, e.to_string()))
    }

    fn complex_part(&mut self) -> Result<f64> {
        let position = self.position();
        match self.bump() {
            Token::Number(text) => codec::decode_float(&text)
                .map_err(|e| parse_error(position, format!("bad number {text}: {e}"))),
            other => Err(parse_error(position, format!("expected a number, found {other}"))),
        }
    }

    /// `reference := key version? ('.' key | '[' int ']')* deferred?`
    fn parse_reference(&mut self) -> Result<Value> {
        let position = self.position();
        let name = self.expect_key()?;

        let version = self.parse_version()?;
        let mut segments = Vec::new();
        loop {
            match self.token() {
                Token::Dot => {
                    self.bump();
                    segments.push(Segment::Key(self.expect_key()?));
                }
                Token::LBracket => {
                    self.bump();
                    segments.push(Segment::Index(self.expect_index()?));
                    self.expect(&Token::RBracket, "']'")?;
                }
                _ => break,
            }
        }
        let deferred = match self.token() {
            Token::Deferred(source) => {
                let source = *source;
                self.bump();
                Some(source)
            }
            _ => None,
        };

        let text = reference_text(&name, version, &segments);
        if let Some(source) = deferred {
            tracing::warn!(reference = %text, %source, %position, "reference deferred to external source");
            self.document.push_deferred(DeferredReference {
                reference: text.clone(),
                source,
                position,
            });
        }

        let base = match version {
            Version::Latest => self.document.lookup(&name),
            Version::Nth(n) => self.document.lookup_version(&name, n),
        };
        let Some(base) = base else {
            return self.unresolved(&text, position, deferred);
        };

        let mut current = base;
        for segment in &segments {
            current = match segment {
                Segment::Key(key) => current.member(key),
                Segment::Index(index) => current.element(*index),
            }
            .map_err(|e| match e {
                Error::CantFind { .. } => Error::cant_find(format!("{text} (at {position})")),
                Error::TypeMismatch { message } => {
                    Error::type_mismatch(format!("{position}: {message} (in '{text}')"))
                }
                other => other,
            })?;
        }
        tracing::trace!(reference = %text, "resolved reference");
        Ok(current.value.clone())
    }

    /// `('(' (int | 'last') ')')?`, only when the parenthesis holds exactly
    /// one version token. Anything else is left for the caller.
    fn parse_version(&mut self) -> Result<Version> {
        if self.token() != &Token::LParen || self.token_at(2) != &Token::RParen {
            return Ok(Version::Latest);
        }
        let version = match self.token_at(1) {
            Token::Ident(word) if word == LAST => Version::Latest,
            Token::Number(text) if text.bytes().all(|b| b.is_ascii_digit()) => {
                let position = self.position();
                Version::Nth(
                    text.parse()
                        .map_err(|_| parse_error(position, format!("version {text} is too large")))?,
                )
            }
            _ => return Ok(Version::Latest),
        };
        self.bump();
        self.bump();
        self.bump();
        Ok(version)
    }

    fn unresolved(
        &mut self,
        text: &str,
        position: Position,
        deferred: Option<DeferredSource>,
    ) -> Result<Value> {
        if deferred.is_some() {
            return Ok(Value::Nil);
        }
        if self.options.strict_references {
            return Err(parse_error(position, format!("unresolved reference '{text}'")));
        }
        tracing::warn!(reference = %text, %position, "unresolved reference, substituting nil");
        self.document.push_diagnostic(Diagnostic {
            position,
            message: format!("unresolved reference '{text}'"),
        });
        Ok(Value::Nil)
    }
}

fn reference_text(name: &str, version: Version, segments: &[Segment]) -> String {
    let mut text = name.to_string();
    if let Version::Nth(n) = version {
        text.push_str(&format!("({n})"));
    }
    if !segments.is_empty() {
        let mut rest = vec![Segment::Key(String::new())];
        rest.extend_from_slice(segments);
        text.push_str(&join_path(&rest));
    }
    text
}

fn parse_error(position: Position, message: impl Into<String>) -> Error {
    Error::Parse {
        line: position.line,
        column: position.column,
        message: message.into(),
    }
}
