//! JavaScript number semantics needed by the price widget: `parseFloat`,
//! `String.prototype.trim` whitespace and `Number.prototype.toFixed`.

use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::{Error, Result};

const MAX_FRACTION_DIGITS: usize = 100;

/// Whitespace as `String.prototype.trim` and `parseFloat` see it.
pub(crate) fn is_js_whitespace(ch: char) -> bool {
    ch == '\u{FEFF}' || (ch.is_whitespace() && ch != '\u{0085}')
}

pub(crate) fn js_trim(src: &str) -> &str {
    src.trim_matches(is_js_whitespace)
}

/// `parseFloat`: longest decimal prefix after leading whitespace, NaN if none.
pub fn parse_js_float(src: &str) -> f64 {
    let src = src.trim_start_matches(is_js_whitespace);
    if src.is_empty() {
        return f64::NAN;
    }

    let bytes = src.as_bytes();
    let mut i = 0usize;

    if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
        i += 1;
    }

    if src[i..].starts_with("Infinity") {
        return if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }

    let mut int_digits = 0usize;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        int_digits += 1;
        i += 1;
    }

    let mut frac_digits = 0usize;
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            frac_digits += 1;
            i += 1;
        }
    }

    if int_digits + frac_digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
        let exp_start = i;
        i += 1;
        if matches!(bytes.get(i), Some(b'+') | Some(b'-')) {
            i += 1;
        }

        let mut exp_digits = 0usize;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            exp_digits += 1;
            i += 1;
        }

        if exp_digits == 0 {
            i = exp_start;
        }
    }

    // "5." is a complete literal for parseFloat.
    let literal = src[..i].strip_suffix('.').unwrap_or(&src[..i]);
    literal.parse::<f64>().unwrap_or(f64::NAN)
}

/// `Number.prototype.toFixed`.
///
/// Rounds on the exact binary value of `value`, picking the larger magnitude
/// on a tie, so `0.125` gives `"0.13"` while `1.005` (stored just below)
/// gives `"1.00"`.
pub fn to_fixed(value: f64, fraction_digits: usize) -> Result<String> {
    if fraction_digits > MAX_FRACTION_DIGITS {
        return Err(Error::InvalidArgument(format!(
            "toFixed fraction digits must be between 0 and {MAX_FRACTION_DIGITS}, got {fraction_digits}"
        )));
    }
    Ok(format_fixed(value, fraction_digits))
}

pub(crate) fn format_fixed(value: f64, fraction_digits: usize) -> String {
    if value.is_nan() {
        return "NaN".into();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if value.abs() >= 1e21 {
        return format_exponential(value);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let scaled = scaled_round_half_up(value.abs(), fraction_digits);

    let mut digits = scaled.to_string();
    if fraction_digits == 0 {
        return format!("{sign}{digits}");
    }
    if digits.len() <= fraction_digits {
        let padding = "0".repeat(fraction_digits + 1 - digits.len());
        digits.insert_str(0, &padding);
    }
    let (int_part, frac_part) = digits.split_at(digits.len() - fraction_digits);
    format!("{sign}{int_part}.{frac_part}")
}

/// `round(value * 10^digits)` computed exactly, ties away from zero.
fn scaled_round_half_up(value: f64, digits: usize) -> BigInt {
    let (mantissa, exponent) = decompose(value);
    let numerator = BigInt::from(mantissa) * BigInt::from(10u32).pow(digits as u32);

    if exponent >= 0 {
        return numerator << exponent as usize;
    }

    let denominator = BigInt::one() << (-exponent) as usize;
    let quotient = &numerator / &denominator;
    let remainder = &numerator - &quotient * &denominator;
    if !remainder.is_zero() && remainder * 2u32 >= denominator {
        quotient + 1u32
    } else {
        quotient
    }
}

/// Splits a finite, non-negative `f64` into `mantissa * 2^exponent`.
fn decompose(value: f64) -> (u64, i64) {
    let bits = value.to_bits();
    let exponent_bits = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    if exponent_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exponent_bits - 1075)
    }
}

/// Shortest round-trip exponential form, spelled the way JS prints it (`1e+21`).
fn format_exponential(value: f64) -> String {
    let raw = format!("{value:e}");
    match raw.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_js_float_takes_the_longest_numeric_prefix() {
        assert_eq!(parse_js_float("12.5"), 12.5);
        assert_eq!(parse_js_float("  \u{00A0}7"), 7.0);
        assert_eq!(parse_js_float("1,50"), 1.0);
        assert_eq!(parse_js_float("10 EUR"), 10.0);
        assert_eq!(parse_js_float(".5"), 0.5);
        assert_eq!(parse_js_float("5."), 5.0);
        assert_eq!(parse_js_float("-3.25"), -3.25);
        assert_eq!(parse_js_float("+4"), 4.0);
        assert_eq!(parse_js_float("2e3"), 2000.0);
        assert_eq!(parse_js_float("2e"), 2.0);
        assert_eq!(parse_js_float("2e+"), 2.0);
        assert_eq!(parse_js_float("-Infinity"), f64::NEG_INFINITY);
        assert_eq!(parse_js_float("Infinityx"), f64::INFINITY);
    }

    #[test]
    fn parse_js_float_is_nan_without_digits() {
        for src in ["", "   ", "abc", ".", "-", "+.", "e5", "€3", "\u{0085}1"] {
            assert!(parse_js_float(src).is_nan(), "expected NaN for {src:?}");
        }
    }

    #[test]
    fn js_trim_strips_bom_but_not_next_line() {
        assert_eq!(js_trim("\u{FEFF} €1 \n"), "€1");
        assert_eq!(js_trim("\u{0085}€1"), "\u{0085}€1");
    }

    #[test]
    fn to_fixed_pads_and_rounds() -> Result<()> {
        assert_eq!(to_fixed(15.5, 2)?, "15.50");
        assert_eq!(to_fixed(0.0, 2)?, "0.00");
        assert_eq!(to_fixed(-0.0, 2)?, "0.00");
        assert_eq!(to_fixed(3.0, 2)?, "3.00");
        assert_eq!(to_fixed(0.1 + 0.2, 2)?, "0.30");
        assert_eq!(to_fixed(0.125, 2)?, "0.13");
        assert_eq!(to_fixed(1.005, 2)?, "1.00");
        assert_eq!(to_fixed(0.005, 2)?, "0.01");
        assert_eq!(to_fixed(-0.001, 2)?, "-0.00");
        assert_eq!(to_fixed(-7.25, 1)?, "-7.3");
        assert_eq!(to_fixed(2.5, 0)?, "3");
        assert_eq!(to_fixed(-2.5, 0)?, "-3");
        assert_eq!(to_fixed(123456789.987, 2)?, "123456789.99");
        Ok(())
    }

    #[test]
    fn to_fixed_handles_special_values() -> Result<()> {
        assert_eq!(to_fixed(f64::INFINITY, 2)?, "Infinity");
        assert_eq!(to_fixed(f64::NEG_INFINITY, 2)?, "-Infinity");
        assert_eq!(to_fixed(f64::NAN, 2)?, "NaN");
        assert_eq!(to_fixed(1e21, 2)?, "1e+21");
        assert_eq!(to_fixed(-1.5e22, 2)?, "-1.5e+22");
        assert_eq!(to_fixed(5e-324, 2)?, "0.00");
        Ok(())
    }

    #[test]
    fn to_fixed_rejects_out_of_range_digits() {
        match to_fixed(1.0, 101) {
            Err(Error::InvalidArgument(msg)) => assert!(msg.contains("between 0 and 100")),
            other => panic!("unexpected toFixed result: {other:?}"),
        }
    }
}
