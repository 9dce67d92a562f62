//! Property-based tests for the canonical codec.
//!
//! Covers the round-trip law (`decode(encode(x)) == x`), idempotence of
//! canonical text, and the boundaries that are easiest to get wrong: the
//! six-digit switch to scientific form and the empty string.

use proptest::prelude::*;

use pset_core::codec::{
    decode_bool, decode_complex, decode_float, decode_int, decode_integer, decode_string,
    encode_bool, encode_complex, encode_float, encode_int, encode_string, join_complex,
};
use pset_core::Complex;

// =============================================================================
// Strategies
// =============================================================================

fn arb_finite() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("must be finite", |f| f.is_finite())
}

/// Strings that do not already look quoted; quote-bounded input is normalized.
fn arb_plain_string() -> impl Strategy<Value = String> {
    "[ -~\t\n]{0,24}".prop_filter("not quote-bounded", |s| {
        let bounded = |q: char| s.len() >= 2 && s.starts_with(q) && s.ends_with(q);
        !bounded('"') && !bounded('\'')
    })
}

/// Integers clustered around the six/seven digit boundary.
fn arb_boundary_int() -> impl Strategy<Value = i64> {
    prop_oneof![
        99_990i64..=100_010,
        999_990i64..=1_000_010,
        -1_000_010i64..=-999_990,
        9_999_990i64..=10_000_010,
    ]
}

// =============================================================================
// Round trips
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn int_round_trip(v in any::<i64>()) {
        let text = encode_int(v as i128);
        prop_assert_eq!(decode_integer::<i64>(&text).unwrap(), v);
    }

    #[test]
    fn uint_round_trip(v in any::<u64>()) {
        let text = encode_int(v as i128);
        prop_assert_eq!(decode_integer::<u64>(&text).unwrap(), v);
    }

    #[test]
    fn float_round_trip(v in arb_finite()) {
        let text = encode_float(v).unwrap();
        let back = decode_float(&text).unwrap();
        prop_assert_eq!(back, v, "text was {}", text);
    }

    #[test]
    fn bool_round_trip(v in any::<bool>()) {
        prop_assert_eq!(decode_bool(&encode_bool(v)).unwrap(), v);
    }

    #[test]
    fn string_round_trip(s in arb_plain_string()) {
        let canonical = encode_string(&s).unwrap();
        prop_assert_eq!(decode_string(&canonical).unwrap(), s);
    }

    #[test]
    fn complex_round_trip(re in arb_finite(), im in arb_finite()) {
        let (r, i) = encode_complex(Complex::new(re, im)).unwrap();
        let back = decode_complex(&join_complex(&r, &i)).unwrap();
        prop_assert_eq!(back, Complex::new(re, im));
    }
}

// =============================================================================
// Idempotence and boundaries
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn canonical_string_is_fixed_point(s in arb_plain_string()) {
        let once = encode_string(&s).unwrap();
        let twice = encode_string(&once).unwrap();
        prop_assert_eq!(&twice, &once);
        let again = encode_string(&decode_string(&once).unwrap()).unwrap();
        prop_assert_eq!(again, once);
    }

    #[test]
    fn canonical_float_is_fixed_point(v in arb_finite()) {
        let once = encode_float(v).unwrap();
        let again = encode_float(decode_float(&once).unwrap()).unwrap();
        prop_assert_eq!(again, once);
    }

    #[test]
    fn six_digit_boundary(v in arb_boundary_int()) {
        let text = encode_int(v as i128);
        let digits = v.unsigned_abs().to_string().len();
        prop_assert_eq!(text.contains('e'), digits > 6, "text was {}", text);
        prop_assert_eq!(decode_int(&text).unwrap(), v as i128);
        prop_assert_eq!(encode_int(decode_int(&text).unwrap()), text.clone());
        // Integral floats follow the same rule.
        prop_assert_eq!(encode_float(v as f64).unwrap(), text);
    }
}

#[test]
fn empty_string_has_one_form() {
    let canonical = encode_string("").unwrap();
    assert_eq!(canonical, "\"\"");
    assert_eq!(decode_string(&canonical).unwrap(), "");
    assert_eq!(encode_string(&canonical).unwrap(), canonical);
}
