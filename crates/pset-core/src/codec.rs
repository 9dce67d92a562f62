//! Canonical string encoding for primitive values.
//!
//! Every primitive has exactly one reserved textual form. The parser uses
//! these functions to normalize literals and the parameter-set layer uses
//! them to store and retrieve typed values, so both sides always agree on
//! the text.
//!
//! Rules in brief:
//! - bool: `true` / `false`
//! - nil: `nil`
//! - integers: sign always present; more than six digits switch to
//!   `d.ddddddde+NN`
//! - floats: `+infinity` / `-infinity`, integral values via the integer
//!   rule, everything else as the shortest round-trip decimal
//! - complex: `(<real>,<imag>)`
//! - strings: quoted only when empty or containing `" ' \ newline tab space`

use std::fmt;

use crate::error::{Error, Result};

pub const NIL: &str = "nil";
pub const TRUE: &str = "true";
pub const FALSE: &str = "false";
pub const INFINITY: &str = "infinity";

/// Largest digit count emitted verbatim by the integer rule.
const MAX_PLAIN_DIGITS: usize = 6;

/// Characters that force a string to be quoted.
const QUOTE_TRIGGERS: [char; 6] = ['"', '\'', '\\', '\n', '\t', ' '];

/// Lexical kind of a canonical number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum NumberKind {
    Integer,
    Float,
}

/// Marker type for the nil value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Nil;

/// A complex number decoded from its `(re,im)` canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.re, self.im)
    }
}

// ---------------------------------------------------------------------------
// nil / bool
// ---------------------------------------------------------------------------

pub fn encode_nil() -> String {
    NIL.to_string()
}

pub fn decode_nil(text: &str) -> Result<Nil> {
    if text == NIL {
        Ok(Nil)
    } else {
        Err(Error::type_mismatch(format!("invalid nil string: {text}")))
    }
}

pub fn encode_bool(value: bool) -> String {
    let text = if value { TRUE } else { FALSE };
    text.to_string()
}

pub fn decode_bool(text: &str) -> Result<bool> {
    match text {
        TRUE => Ok(true),
        FALSE => Ok(false),
        _ => Err(Error::type_mismatch(format!("invalid bool string: {text}"))),
    }
}

// ---------------------------------------------------------------------------
// integers
// ---------------------------------------------------------------------------

/// Encode an integer. Covers every signed and unsigned type up to 64 bits.
pub fn encode_int(value: i128) -> String {
    integer_rule(value < 0, &value.unsigned_abs().to_string())
}

/// Apply the integer rule to a magnitude given as decimal digits.
fn integer_rule(negative: bool, digits: &str) -> String {
    let digits = digits.trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };
    let sign = if negative && digits != "0" { '-' } else { '+' };

    if digits.len() > MAX_PLAIN_DIGITS {
        let exponent = digits.len() - 1;
        format!("{sign}{}.{}e+{exponent:02}", &digits[..1], &digits[1..])
    } else {
        format!("{sign}{digits}")
    }
}

/// Encode an unsigned integer, including magnitudes beyond `i128::MAX`.
pub fn encode_uint(value: u128) -> String {
    integer_rule(false, &value.to_string())
}

/// Decode canonical (or any plain decimal) text into an exact integer.
///
/// Scientific forms are expanded digit by digit, so large identifiers
/// written as `d.dddddde+NN` come back without passing through `f64`.
pub fn decode_int(text: &str) -> Result<i128> {
    let (negative, magnitude) = decode_magnitude(text)?;
    if negative {
        if magnitude > i128::MAX as u128 + 1 {
            return Err(Error::NumberTooLarge {
                text: text.to_string(),
                target: "integer",
            });
        }
        Ok((magnitude as i128).wrapping_neg())
    } else {
        i128::try_from(magnitude).map_err(|_| Error::NumberTooLarge {
            text: text.to_string(),
            target: "integer",
        })
    }
}

/// Decode into the full unsigned range; negative values do not fit.
pub fn decode_uint(text: &str) -> Result<u128> {
    match decode_magnitude(text)? {
        (true, magnitude) if magnitude != 0 => Err(Error::NumberTooLarge {
            text: text.to_string(),
            target: "u128",
        }),
        (_, magnitude) => Ok(magnitude),
    }
}

/// Sign and exact magnitude of an integral decimal.
fn decode_magnitude(text: &str) -> Result<(bool, u128)> {
    let (negative, body) = split_sign(text);
    if body == INFINITY {
        return Err(Error::NumberTooLarge {
            text: text.to_string(),
            target: "integer",
        });
    }

    let parts = DecimalParts::parse(body)
        .ok_or_else(|| Error::type_mismatch(format!("invalid number string: {text}")))?;

    let mut digits: String = format!("{}{}", parts.int_digits, parts.frac_digits);
    let mut point = parts.int_digits.len() as i64 + parts.exponent;

    let leading = digits.len() - digits.trim_start_matches('0').len();
    digits.drain(..leading);
    point -= leading as i64;

    if digits.is_empty() {
        return Ok((negative, 0));
    }
    if point <= 0 {
        return Err(Error::type_mismatch(format!(
            "not an integral value: {text}"
        )));
    }
    // First digit is non-zero, so the value is at least 10^(point-1).
    if point > 39 {
        return Err(Error::NumberTooLarge {
            text: text.to_string(),
            target: "integer",
        });
    }

    let point = point as usize;
    if digits.len() > point {
        if digits[point..].bytes().any(|b| b != b'0') {
            return Err(Error::type_mismatch(format!(
                "not an integral value: {text}"
            )));
        }
        digits.truncate(point);
    } else {
        digits.extend(std::iter::repeat('0').take(point - digits.len()));
    }

    let magnitude: u128 = digits.parse().map_err(|_| Error::NumberTooLarge {
        text: text.to_string(),
        target: "integer",
    })?;
    Ok((negative, magnitude))
}

/// Decode into a sized integer type, reporting out-of-range values.
pub fn decode_integer<T: TryFrom<i128>>(text: &str) -> Result<T> {
    let wide = decode_int(text)?;
    T::try_from(wide).map_err(|_| Error::NumberTooLarge {
        text: text.to_string(),
        target: std::any::type_name::<T>(),
    })
}

// ---------------------------------------------------------------------------
// floating point
// ---------------------------------------------------------------------------

pub fn encode_float(value: f64) -> Result<String> {
    if value.is_nan() {
        return Err(Error::type_mismatch("NaN has no canonical form"));
    }
    if value.is_infinite() {
        let sign = if value > 0.0 { '+' } else { '-' };
        return Ok(format!("{sign}{INFINITY}"));
    }
    if value.fract() == 0.0 {
        // `{:.0}` prints the exact decimal digits of an integral f64.
        return Ok(integer_rule(value < 0.0, &format!("{:.0}", value.abs())));
    }
    if value.abs() < 1e-5 {
        Ok(format!("{value:e}"))
    } else {
        Ok(format!("{value}"))
    }
}

pub fn decode_float(text: &str) -> Result<f64> {
    let (negative, body) = split_sign(text);
    if body == INFINITY {
        return Ok(if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }
    if DecimalParts::parse(body).is_none() {
        return Err(Error::type_mismatch(format!("invalid float string: {text}")));
    }
    let value: f64 = text
        .parse()
        .map_err(|_| Error::type_mismatch(format!("invalid float string: {text}")))?;
    if value.is_infinite() {
        return Err(Error::NumberTooLarge {
            text: text.to_string(),
            target: "f64",
        });
    }
    Ok(value)
}

pub fn decode_f32(text: &str) -> Result<f32> {
    let wide = decode_float(text)?;
    if wide.is_finite() && wide.abs() > f32::MAX as f64 {
        return Err(Error::NumberTooLarge {
            text: text.to_string(),
            target: "f32",
        });
    }
    Ok(wide as f32)
}

/// Normalize a raw numeric literal to its canonical text.
///
/// Literals matching `[+-]?digits` are integers and are canonicalized
/// exactly, whatever their length. Anything else is read as a float.
pub fn canonicalize_number(literal: &str) -> Result<(NumberKind, String)> {
    let (negative, body) = split_sign(literal);
    if !body.is_empty() && body.bytes().all(|b| b.is_ascii_digit()) {
        return Ok((NumberKind::Integer, integer_rule(negative, body)));
    }
    let value = decode_float(literal)?;
    Ok((NumberKind::Float, encode_float(value)?))
}

// ---------------------------------------------------------------------------
// complex
// ---------------------------------------------------------------------------

/// Encode both parts of a complex number as canonical number strings.
pub fn encode_complex(value: Complex) -> Result<(String, String)> {
    Ok((encode_float(value.re)?, encode_float(value.im)?))
}

/// Join a (real, imaginary) pair into the embedded `(re,im)` form.
pub fn join_complex(real: &str, imag: &str) -> String {
    format!("({real},{imag})")
}

/// Split the embedded `(re,im)` form back into its two parts.
pub fn split_complex(text: &str) -> Result<(&str, &str)> {
    let malformed = || Error::type_mismatch(format!("invalid complex string: {text}"));
    let inner = text
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(malformed)?;
    if inner.matches(',').count() != 1 {
        return Err(malformed());
    }
    let (real, imag) = inner.split_once(',').ok_or_else(malformed)?;
    Ok((real.trim(), imag.trim()))
}

pub fn decode_complex(text: &str) -> Result<Complex> {
    let (real, imag) = split_complex(text)?;
    Ok(Complex::new(decode_float(real)?, decode_float(imag)?))
}

// ---------------------------------------------------------------------------
// strings
// ---------------------------------------------------------------------------

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(text: &str) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => {
                return Err(Error::type_mismatch(format!(
                    "unknown escape \\{other} in: {text}"
                )))
            }
            // A trailing lone backslash is kept as written.
            None => out.push('\\'),
        }
    }
    Ok(out)
}

fn bounded_by(text: &str, quote: char) -> bool {
    text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote)
}

/// Encode a string, quoting it only when needed.
///
/// Input that is already wrapped in double quotes is unescaped first;
/// single-quoted input is taken literally. The quoting decision is then
/// made afresh, so a second pass never changes the result.
pub fn encode_string(value: &str) -> Result<String> {
    let inner = if bounded_by(value, '"') {
        unescape(&value[1..value.len() - 1])?
    } else if bounded_by(value, '\'') {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    };

    let needs_quotes = inner.is_empty() || inner.contains(&QUOTE_TRIGGERS[..]);
    let escaped = escape(&inner);
    Ok(if needs_quotes {
        format!("\"{escaped}\"")
    } else {
        escaped
    })
}

/// Decode a canonical string back to its plain content.
pub fn decode_string(text: &str) -> Result<String> {
    if bounded_by(text, '"') {
        unescape(&text[1..text.len() - 1])
    } else {
        Ok(text.to_string())
    }
}

// ---------------------------------------------------------------------------
// sequences
// ---------------------------------------------------------------------------

/// Join already-encoded elements into the list form `[a,b,c]`.
pub fn join_sequence<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::from("[");
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(item.as_ref());
    }
    out.push(']');
    out
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}

/// The unsigned body of a decimal literal: `digits[.digits][e[+-]digits]`.
struct DecimalParts<'a> {
    int_digits: &'a str,
    frac_digits: &'a str,
    exponent: i64,
}

impl<'a> DecimalParts<'a> {
    fn parse(body: &'a str) -> Option<Self> {
        let (mantissa, exponent) = match body.find(|c: char| c == 'e' || c == 'E') {
            Some(at) => {
                let exp_text = &body[at + 1..];
                let (exp_negative, exp_digits) = split_sign(exp_text);
                if exp_digits.is_empty() || !exp_digits.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                // Clamp absurd exponents; callers range-check the result.
                let magnitude: i64 = exp_digits.parse().unwrap_or(i64::MAX / 4).min(i64::MAX / 4);
                (&body[..at], if exp_negative { -magnitude } else { magnitude })
            }
            None => (body, 0),
        };

        let (int_digits, frac_digits) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if int_digits.is_empty() && frac_digits.is_empty() {
            return None;
        }
        if !all_digits(int_digits) || !all_digits(frac_digits) {
            return None;
        }
        Some(DecimalParts {
            int_digits,
            frac_digits,
            exponent,
        })
    }
}
