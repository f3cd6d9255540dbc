//! Numeric literal grammars
//!
//! Float literals are matched against three alternative grammars: decimal
//! (digits in radix 10, scaled by powers of 10), hexadecimal (digits in radix
//! 16, scaled by powers of 2) and the named literals `inf`, `nan` and
//! `nan:0x..`. Digits may be separated by single underscores.

use super::{Float, Sign};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Num, Zero};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Written exponents saturate here; anything larger is zero or infinity
const EXPONENT_LIMIT: i64 = 20_000;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LiteralError {
    #[error("malformed float literal: {0}")]
    MalformedFloat(String),
    #[error("malformed integer literal: {0}")]
    MalformedInteger(String),
    #[error("integer literal out of range for {bits} bits: {text}")]
    IntegerOutOfRange { text: String, bits: u32 },
    #[error("{0} has no numeric literal")]
    NotNumeric(String),
}

static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?)([0-9](?:_?[0-9])*)(?:\.((?:[0-9](?:_?[0-9])*)?))?(?:[eE]([+-]?[0-9](?:_?[0-9])*))?$")
        .expect("decimal float grammar")
});

static HEXADECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([+-]?)0x([0-9a-fA-F](?:_?[0-9a-fA-F])*)(?:\.((?:[0-9a-fA-F](?:_?[0-9a-fA-F])*)?))?(?:[pP]([+-]?[0-9](?:_?[0-9])*))?$",
    )
    .expect("hexadecimal float grammar")
});

static SPECIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?)(?:(inf)|nan(?::0x([0-9a-fA-F](?:_?[0-9a-fA-F])*))?)$").expect("special float grammar")
});

/// A positional float grammar: mantissa digits in `radix`, exponent
/// counting powers of `base`
struct Grammar {
    pattern: &'static Lazy<Regex>,
    radix: u32,
    base: u32,
}

impl Grammar {
    fn parse(&self, text: &str) -> Option<Float> {
        let captures = self.pattern.captures(text)?;
        let sign = sign_of(&captures);
        let integer = strip(captures.get(2)?.as_str());
        let fraction = captures.get(3).map(|m| strip(m.as_str())).unwrap_or_default();
        let exponent = captures.get(4).map(|m| parse_exponent(m.as_str())).unwrap_or(0);

        let digits = format!("{integer}{fraction}");
        let mantissa = BigInt::from_str_radix(&digits, self.radix).ok()?;
        if mantissa.is_zero() {
            return Some(Float::Zero { sign });
        }

        // hex fraction digits are worth 4 binary places each
        let places = fraction.len() as i64 * if self.radix == self.base { 1 } else { 4 };
        let exponent = exponent - places;
        let power = BigInt::from(self.base).pow(exponent.unsigned_abs() as u32);
        let magnitude = if exponent >= 0 {
            BigRational::from_integer(mantissa * power)
        } else {
            BigRational::new(mantissa, power)
        };
        Some(Float::from_rational(match sign {
            Sign::Plus => magnitude,
            Sign::Minus => -magnitude,
        }))
    }
}

static GRAMMARS: [Grammar; 2] = [
    Grammar {
        pattern: &DECIMAL,
        radix: 10,
        base: 10,
    },
    Grammar {
        pattern: &HEXADECIMAL,
        radix: 16,
        base: 2,
    },
];

fn sign_of(captures: &Captures<'_>) -> Sign {
    match captures.get(1).map(|m| m.as_str()) {
        Some("-") => Sign::Minus,
        _ => Sign::Plus,
    }
}

fn strip(digits: &str) -> String {
    digits.replace('_', "")
}

/// Decimal exponent, saturating far outside any representable range
fn parse_exponent(text: &str) -> i64 {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = digits
        .bytes()
        .filter(u8::is_ascii_digit)
        .fold(0i64, |acc, d| (acc * 10 + (d - b'0') as i64).min(EXPONENT_LIMIT));
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

fn parse_special(text: &str) -> Option<Float> {
    let captures = SPECIAL.captures(text)?;
    let sign = sign_of(&captures);
    if captures.get(2).is_some() {
        return Some(Float::Infinite { sign });
    }
    let payload = match captures.get(3) {
        Some(m) => u64::from_str_radix(&strip(m.as_str()), 16).ok()?,
        None => 0,
    };
    Some(Float::Nan { payload, sign })
}

/// Parse a float literal into its exact value
pub fn parse_float(text: &str) -> Result<Float, LiteralError> {
    GRAMMARS
        .iter()
        .find_map(|grammar| grammar.parse(text))
        .or_else(|| parse_special(text))
        .ok_or_else(|| LiteralError::MalformedFloat(text.to_string()))
}

/// Parse an integer literal (decimal or `0x` hex, optional sign, `_`
/// separators) into its two's complement encoding masked to `bits`.
///
/// Accepts the union of the signed and unsigned ranges, so both `-1` and
/// `0xffffffff` are valid 32-bit literals.
pub fn parse_int(text: &str, bits: u32) -> Result<u64, LiteralError> {
    let malformed = || LiteralError::MalformedInteger(text.to_string());
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (radix, digits) = match rest.strip_prefix("0x") {
        Some(hex) => (16, hex),
        None => (10, rest),
    };
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return Err(malformed());
    }
    let magnitude = u128::from_str_radix(&strip(digits), radix).map_err(|_| malformed())?;

    let out_of_range = || LiteralError::IntegerOutOfRange {
        text: text.to_string(),
        bits,
    };
    let modulus = 1u128 << bits;
    let mask = (modulus - 1) as u64;
    if negative {
        if magnitude > modulus / 2 {
            return Err(out_of_range());
        }
        Ok((modulus - magnitude) as u64 & mask)
    } else {
        if magnitude >= modulus {
            return Err(out_of_range());
        }
        Ok(magnitude as u64)
    }
}
