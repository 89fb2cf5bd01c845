//! Numeric literal parsing
//!
//! Script values are written in a C-like notation: integers may carry a sign and a
//! `0x` (hexadecimal) or leading `0` (octal) prefix, and floats may be written either
//! as a decimal literal or as an exact `0x` bit pattern. Every parser returns the
//! parsed value together with the unparsed tail so callers can continue scanning.

use thiserror::Error;

/// Errors produced while parsing a numeric literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NumberError {
    /// No digits were found where a number was expected
    #[error("Invalid number")]
    Invalid,
    /// A minus sign was given for an unsigned target type
    #[error("Number can’t be negated")]
    Negative,
    /// The value does not fit in the target type
    #[error("Number out of range for type")]
    OutOfRange,
}

/// Leading sign, radix and digit run of an integer literal
struct IntegerParts<'a> {
    negative: bool,
    radix: u32,
    digits: &'a str,
    tail: &'a str,
}

fn skip_blanks(s: &str) -> &str {
    s.trim_start_matches([' ', '\t'])
}

fn split_integer(s: &str) -> IntegerParts<'_> {
    let s = skip_blanks(s);

    let (negative, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, body) = if let Some(hex) = unsigned.strip_prefix("0x").or_else(|| unsigned.strip_prefix("0X")) {
        (16, hex)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') && unsigned.as_bytes()[1].is_ascii_digit() {
        (8, &unsigned[1..])
    } else {
        (10, unsigned)
    };

    let split = body.find(|c: char| !c.is_digit(radix)).unwrap_or(body.len());

    IntegerParts {
        negative,
        radix,
        digits: &body[..split],
        tail: &body[split..],
    }
}

fn parse_magnitude(parts: &IntegerParts) -> Result<u64, NumberError> {
    if parts.digits.is_empty() {
        return Err(NumberError::Invalid);
    }

    u64::from_str_radix(parts.digits, parts.radix).map_err(|_| NumberError::OutOfRange)
}

macro_rules! parse_unsigned {
    ($(#[$doc:meta])* $name:ident, $t:ty) => {
        $(#[$doc])*
        pub fn $name(s: &str) -> Result<($t, &str), NumberError> {
            let parts = split_integer(s);
            let magnitude = parse_magnitude(&parts)?;

            if parts.negative {
                return Err(NumberError::Negative);
            }

            let value = <$t>::try_from(magnitude).map_err(|_| NumberError::OutOfRange)?;
            Ok((value, parts.tail))
        }
    };
}

macro_rules! parse_signed {
    ($(#[$doc:meta])* $name:ident, $t:ty, $ut:ty) => {
        $(#[$doc])*
        pub fn $name(s: &str) -> Result<($t, &str), NumberError> {
            let parts = split_integer(s);
            let magnitude = parse_magnitude(&parts)?;

            // An unsigned hexadecimal literal is taken as the exact bit pattern
            if parts.radix == 16 && !parts.negative {
                let bits = <$ut>::try_from(magnitude).map_err(|_| NumberError::OutOfRange)?;
                return Ok((bits as $t, parts.tail));
            }

            let value = if parts.negative { -(magnitude as i128) } else { magnitude as i128 };
            let value = <$t>::try_from(value).map_err(|_| NumberError::OutOfRange)?;
            Ok((value, parts.tail))
        }
    };
}

parse_unsigned!(
    /// Parses an unsigned 8-bit integer, returning it with the unparsed tail
    parse_u8,
    u8
);
parse_unsigned!(
    /// Parses an unsigned 16-bit integer, returning it with the unparsed tail
    parse_u16,
    u16
);
parse_unsigned!(
    /// Parses an unsigned 32-bit integer, returning it with the unparsed tail
    parse_u32,
    u32
);
parse_unsigned!(
    /// Parses an unsigned 64-bit integer, returning it with the unparsed tail
    parse_u64,
    u64
);
parse_signed!(
    /// Parses a signed 8-bit integer, returning it with the unparsed tail
    parse_i8,
    i8,
    u8
);
parse_signed!(
    /// Parses a signed 16-bit integer, returning it with the unparsed tail
    parse_i16,
    i16,
    u16
);
parse_signed!(
    /// Parses a signed 32-bit integer, returning it with the unparsed tail
    ///
    /// Hexadecimal literals without a sign are reinterpreted as the two's complement
    /// bit pattern, so `0xffffffff` yields `-1`.
    parse_i32,
    i32,
    u32
);
parse_signed!(
    /// Parses a signed 64-bit integer, returning it with the unparsed tail
    parse_i64,
    i64,
    u64
);

fn count_digits(s: &str) -> usize {
    s.bytes().take_while(u8::is_ascii_digit).count()
}

fn special_float_word(s: &str) -> Option<usize> {
    ["infinity", "inf", "nan"]
        .into_iter()
        .find(|word| s.get(..word.len()).is_some_and(|head| head.eq_ignore_ascii_case(word)))
        .map(str::len)
}

/// Splits a float literal from its tail without validating it
fn split_float(s: &str) -> (&str, &str) {
    let s = skip_blanks(s);

    if let Some(hex) = s.strip_prefix("0x") {
        let split = 2 + hex.bytes().take_while(u8::is_ascii_hexdigit).count();
        return s.split_at(split);
    }

    let mut split = usize::from(matches!(s.as_bytes().first(), Some(b'-' | b'+')));

    if let Some(length) = special_float_word(&s[split..]) {
        return s.split_at(split + length);
    }

    let integer_digits = count_digits(&s[split..]);
    split += integer_digits;

    let mut fraction_digits = 0;
    if s[split..].starts_with('.') {
        fraction_digits = count_digits(&s[split + 1..]);
        split += 1 + fraction_digits;
    }

    if integer_digits == 0 && fraction_digits == 0 {
        return ("", s);
    }

    // Exponent is only consumed when it has at least one digit
    if let Some(b'e' | b'E') = s.as_bytes().get(split) {
        let mut exponent = split + 1;
        if let Some(b'-' | b'+') = s.as_bytes().get(exponent) {
            exponent += 1;
        }
        let exponent_digits = count_digits(&s[exponent..]);
        if exponent_digits > 0 {
            split = exponent + exponent_digits;
        }
    }

    s.split_at(split)
}

fn parse_decimal<T: std::str::FromStr>(literal: &str) -> Result<T, NumberError> {
    literal.parse::<T>().map_err(|_| NumberError::Invalid)
}

macro_rules! parse_bits {
    ($literal:expr, $bits:ty) => {
        <$bits>::from_str_radix(&$literal[2..], 16).map_err(|e| match e.kind() {
            std::num::IntErrorKind::PosOverflow => NumberError::OutOfRange,
            _ => NumberError::Invalid,
        })
    };
}

/// Parses a 32-bit float, either decimal or as a `0x` bit pattern
///
/// # Arguments
/// * `s` - Text starting with the literal (leading blanks are skipped)
///
/// # Returns
/// The value and the unparsed tail
pub fn parse_f32(s: &str) -> Result<(f32, &str), NumberError> {
    let (literal, tail) = split_float(s);

    let value = if literal.starts_with("0x") { f32::from_bits(parse_bits!(literal, u32)?) } else { parse_decimal::<f32>(literal)? };

    Ok((value, tail))
}

/// Parses a 64-bit float, either decimal or as a `0x` bit pattern
pub fn parse_f64(s: &str) -> Result<(f64, &str), NumberError> {
    let (literal, tail) = split_float(s);

    let value = if literal.starts_with("0x") { f64::from_bits(parse_bits!(literal, u64)?) } else { parse_decimal::<f64>(literal)? };

    Ok((value, tail))
}

/// Parses a half float and returns its 16-bit encoding
///
/// Decimal literals are rounded to the nearest representable half float; `0x`
/// literals are taken as the exact bit pattern.
pub fn parse_half(s: &str) -> Result<(u16, &str), NumberError> {
    let (literal, tail) = split_float(s);

    let bits = if literal.starts_with("0x") { parse_bits!(literal, u16)? } else { half::f16::from_f64(parse_decimal::<f64>(literal)?).to_bits() };

    Ok((bits, tail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsigned_limits() {
        assert_eq!(parse_u8("255").unwrap(), (255, ""));
        assert_eq!(parse_u16("65535").unwrap(), (u16::MAX, ""));
        assert_eq!(parse_u32(&u32::MAX.to_string()).unwrap(), (u32::MAX, ""));
        assert_eq!(parse_u64(&u64::MAX.to_string()).unwrap(), (u64::MAX, ""));

        assert_eq!(parse_u8("256"), Err(NumberError::OutOfRange));
        assert_eq!(parse_u8("-1"), Err(NumberError::Negative));
        assert_eq!(parse_u8("-0"), Err(NumberError::Negative));
        assert_eq!(parse_u64("18446744073709551616"), Err(NumberError::OutOfRange));
    }

    #[test]
    fn test_signed_limits() {
        assert_eq!(parse_i8("-128").unwrap(), (-128, ""));
        assert_eq!(parse_i8("127").unwrap(), (127, ""));
        assert_eq!(parse_i8("128"), Err(NumberError::OutOfRange));
        assert_eq!(parse_i8("-129"), Err(NumberError::OutOfRange));
        assert_eq!(parse_i64(&i64::MIN.to_string()).unwrap(), (i64::MIN, ""));
        assert_eq!(parse_i64(&i64::MAX.to_string()).unwrap(), (i64::MAX, ""));
    }

    #[test]
    fn test_radix_prefixes() {
        assert_eq!(parse_u32("0x1F").unwrap(), (31, ""));
        assert_eq!(parse_u32("017").unwrap(), (15, ""));
        assert_eq!(parse_u32("0").unwrap(), (0, ""));
        assert_eq!(parse_i32("-0x10").unwrap(), (-16, ""));
        assert_eq!(parse_i32("0xffffffff").unwrap(), (-1, ""));
        assert_eq!(parse_i8("0x80").unwrap(), (-128, ""));
        assert_eq!(parse_i32("0x100000000"), Err(NumberError::OutOfRange));
    }

    #[test]
    fn test_integer_tail() {
        assert_eq!(parse_i32("  \t42 rest").unwrap(), (42, " rest"));
        assert_eq!(parse_u16("9|foo").unwrap(), (9, "|foo"));
        assert_eq!(parse_i32("12e3").unwrap(), (12, "e3"));
        assert_eq!(parse_i32(""), Err(NumberError::Invalid));
        assert_eq!(parse_i32("foo"), Err(NumberError::Invalid));
        assert_eq!(parse_i32("-"), Err(NumberError::Invalid));
    }

    #[test]
    fn test_float_decimal() {
        assert_eq!(parse_f32("1.5").unwrap(), (1.5, ""));
        assert_eq!(parse_f32("-0.5 2").unwrap(), (-0.5, " 2"));
        assert_eq!(parse_f32(".25").unwrap(), (0.25, ""));
        assert_eq!(parse_f32("3.").unwrap(), (3.0, ""));
        assert_eq!(parse_f64("1e3").unwrap(), (1000.0, ""));
        assert_eq!(parse_f64("2E-1x").unwrap(), (0.2, "x"));
        assert_eq!(parse_f64("5e").unwrap(), (5.0, "e"));
        assert!(parse_f32("-inf").unwrap().0.is_infinite());
        assert!(parse_f32("NaN").unwrap().0.is_nan());
        assert_eq!(parse_f32("."), Err(NumberError::Invalid));
        assert_eq!(parse_f32("abc"), Err(NumberError::Invalid));
    }

    #[test]
    fn test_float_multibyte_text() {
        assert_eq!(parse_f32("éé"), Err(NumberError::Invalid));
        assert_eq!(parse_f64("-ñan"), Err(NumberError::Invalid));
        assert_eq!(parse_half("iñfinity"), Err(NumberError::Invalid));
        assert_eq!(parse_f32("1.5é").unwrap(), (1.5, "é"));
    }

    #[test]
    fn test_float_bit_patterns() {
        assert_eq!(parse_f32("0x3f800000").unwrap(), (1.0, ""));
        assert_eq!(parse_f64("0xbff0000000000000").unwrap(), (-1.0, ""));
        assert_eq!(parse_f32("0x100000000"), Err(NumberError::OutOfRange));
        assert_eq!(parse_f32("0x"), Err(NumberError::Invalid));
    }

    #[test]
    fn test_half_floats() {
        assert_eq!(parse_half("-2").unwrap(), (0xc000, ""));
        assert_eq!(parse_half("1").unwrap(), (0x3c00, ""));
        assert_eq!(parse_half("0.5 tail").unwrap(), (0x3800, " tail"));
        assert_eq!(parse_half("0x7c00").unwrap(), (0x7c00, ""));
        assert_eq!(parse_half("0x10000"), Err(NumberError::OutOfRange));
    }
}
