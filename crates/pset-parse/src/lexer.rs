//! Tokeniser for pset source text.
//!
//! Produces the whole token stream up front; the parser needs up to three
//! tokens of lookahead to tell `name(0)` versions from complex literals.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use pset_core::{DeferredSource, Error, Position, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Delimiters
    LBrace,   // {
    RBrace,   // }
    LBracket, // [
    RBracket, // ]
    LParen,   // (
    RParen,   // )
    Colon,    // :
    Comma,    // ,
    Dot,      // .

    /// `@file` / `@DB`
    Deferred(DeferredSource),
    /// Raw numeric literal, including signed `infinity`.
    Number(String),
    /// String literal with its delimiting quotes kept.
    Str(String),
    /// Identifier or reserved word.
    Ident(String),

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
            Token::Dot => write!(f, "."),
            Token::Deferred(source) => write!(f, "{source}"),
            Token::Number(text) | Token::Str(text) | Token::Ident(text) => f.write_str(text),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

/// A token and where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: Position,
}

pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Lex the whole buffer. The last token is always [`Token::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Spanned>> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                break;
            }
        }
        tracing::trace!(tokens = tokens.len(), "lexed source");
        Ok(tokens)
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn error(&self, position: Position, message: impl Into<String>) -> Error {
        Error::Parse {
            line: position.line,
            column: position.column,
            message: message.into(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek() {
            match ch {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '#' => self.skip_line(),
                '/' if self.peek_second() == Some('/') => self.skip_line(),
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(ch) = self.advance() {
            if ch == '\n' {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Spanned> {
        self.skip_whitespace_and_comments();
        let position = self.position();

        let Some(ch) = self.peek() else {
            return Ok(Spanned {
                token: Token::Eof,
                position,
            });
        };

        let token = match ch {
            '{' => self.single(Token::LBrace),
            '}' => self.single(Token::RBrace),
            '[' => self.single(Token::LBracket),
            ']' => self.single(Token::RBracket),
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            ':' => self.single(Token::Colon),
            ',' => self.single(Token::Comma),
            '.' => self.single(Token::Dot),
            '"' | '\'' => self.read_string(position)?,
            '@' => self.read_deferred(position)?,
            '+' | '-' => self.read_signed(position)?,
            c if c.is_ascii_digit() => Token::Number(self.read_unsigned_number()),
            c if c.is_ascii_alphabetic() || c == '_' => {
                let word = self.read_word();
                if word == pset_core::codec::INFINITY {
                    Token::Number(word)
                } else {
                    Token::Ident(word)
                }
            }
            other => return Err(self.error(position, format!("unexpected character '{other}'"))),
        };

        Ok(Spanned { token, position })
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    fn read_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        word
    }

    fn read_digits(&mut self, out: &mut String) {
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                out.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    /// `digits ('.' digits)? ([eE] [+-]? digits)?`
    fn read_unsigned_number(&mut self) -> String {
        let mut text = String::new();
        self.read_digits(&mut text);

        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.advance();
            self.read_digits(&mut text);
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let mut ahead = self.chars.clone();
            ahead.next();
            let exponent_follows = match ahead.next() {
                Some('+' | '-') => ahead.next().is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if exponent_follows {
                if let Some(e) = self.advance() {
                    text.push(e);
                }
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    text.push(sign);
                    self.advance();
                }
                self.read_digits(&mut text);
            }
        }
        text
    }

    fn read_signed(&mut self, position: Position) -> Result<Token> {
        let mut text = String::new();
        if let Some(sign) = self.advance() {
            text.push(sign);
        }
        match self.peek() {
            Some(c) if c.is_ascii_digit() => {
                text.push_str(&self.read_unsigned_number());
                Ok(Token::Number(text))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let word = self.read_word();
                if word == pset_core::codec::INFINITY {
                    text.push_str(&word);
                    Ok(Token::Number(text))
                } else {
                    Err(self.error(position, format!("expected a number after '{text}'")))
                }
            }
            _ => Err(self.error(position, format!("expected a number after '{text}'"))),
        }
    }

    /// Read a quoted string. Escapes are kept raw here and validated when
    /// the literal is canonicalized.
    fn read_string(&mut self, position: Position) -> Result<Token> {
        let Some(quote) = self.advance() else {
            return Err(self.error(position, "expected a string"));
        };
        let mut text = String::from(quote);
        loop {
            match self.advance() {
                None => return Err(self.error(position, "unterminated string")),
                Some('\\') if quote == '"' => {
                    text.push('\\');
                    match self.advance() {
                        Some(escaped) => text.push(escaped),
                        None => return Err(self.error(position, "unterminated string")),
                    }
                }
                Some(ch) if ch == quote => {
                    text.push(ch);
                    return Ok(Token::Str(text));
                }
                Some(ch) => text.push(ch),
            }
        }
    }

    fn read_deferred(&mut self, position: Position) -> Result<Token> {
        self.advance();
        match self.read_word().as_str() {
            "file" => Ok(Token::Deferred(DeferredSource::File)),
            "DB" => Ok(Token::Deferred(DeferredSource::Db)),
            other => Err(self.error(
                position,
                format!("unknown reference marker '@{other}', expected @file or @DB"),
            )),
        }
    }
}
