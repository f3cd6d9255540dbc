//! Floating point value model backed by exact rationals
//!
//! [`Float`] is a closed set of four variants. Finite values keep their exact
//! rational magnitude, so rounding only ever happens once, inside
//! [`Float::encode`], and always under round-to-nearest, ties-to-even.

use super::{Format, LiteralError, Sign};
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;

/// A floating point value independent of any encoding width
#[derive(Debug, Clone, PartialEq)]
pub enum Float {
    Zero { sign: Sign },
    Infinite { sign: Sign },
    Nan { payload: u64, sign: Sign },
    /// Never zero; zero is always [`Float::Zero`]
    Finite { value: BigRational },
}

impl Float {
    /// Positive NaN with an empty payload; encodes to the canonical NaN
    pub const NAN: Float = Float::Nan {
        payload: 0,
        sign: Sign::Plus,
    };

    /// Exact value of an integer
    pub fn from_integer(value: impl Into<BigInt>) -> Self {
        Float::from_rational(BigRational::from_integer(value.into()))
    }

    /// Wrap a rational, normalizing zero to [`Float::Zero`]
    pub fn from_rational(value: BigRational) -> Self {
        if value.is_zero() {
            Float::Zero { sign: Sign::Plus }
        } else {
            Float::Finite { value }
        }
    }

    /// Exact value of a native double. NaN payloads are not carried over.
    pub fn from_float(value: f64) -> Self {
        let sign = if value.is_sign_negative() {
            Sign::Minus
        } else {
            Sign::Plus
        };
        if value == 0.0 {
            return Float::Zero { sign };
        }
        if value.is_infinite() {
            return Float::Infinite { sign };
        }
        match BigRational::from_float(value) {
            Some(value) => Float::Finite { value },
            None => Float::Nan { payload: 0, sign },
        }
    }

    /// Parse a float literal (decimal, hexadecimal, `inf`, `nan`, `nan:0x..`)
    pub fn parse(text: &str) -> Result<Self, LiteralError> {
        super::literal::parse_float(text)
    }

    /// Decode the low `format.bits()` bits of `bits`
    pub fn decode(bits: u64, format: Format) -> Self {
        let (sign, exponent, fraction) = format.unpack(bits);
        if exponent == format.max_exponent() {
            if fraction == 0 {
                Float::Infinite { sign }
            } else {
                Float::Nan {
                    payload: fraction,
                    sign,
                }
            }
        } else if exponent == format.min_exponent() {
            if fraction == 0 {
                Float::Zero { sign }
            } else {
                // subnormal: no implicit bit, fixed at the lowest normal exponent
                let power = format.min_exponent() + 1 - format.fraction_bits() as i32;
                Float::scaled(sign, fraction, power)
            }
        } else {
            let significand = fraction | (1 << format.fraction_bits());
            Float::scaled(sign, significand, exponent - format.fraction_bits() as i32)
        }
    }

    /// `±significand × 2^power`
    fn scaled(sign: Sign, significand: u64, power: i32) -> Self {
        let magnitude = BigInt::from(significand);
        let value = if power >= 0 {
            BigRational::from_integer(magnitude << power as usize)
        } else {
            BigRational::new(magnitude, BigInt::one() << power.unsigned_abs() as usize)
        };
        match sign {
            Sign::Plus => Float::from_rational(value),
            Sign::Minus => Float::from_rational(-value),
        }
    }

    /// Encode into `format`, rounding to nearest with ties to even
    pub fn encode(&self, format: Format) -> u64 {
        match self {
            Float::Zero { sign } => format.pack(*sign, format.min_exponent(), 0),
            Float::Infinite { sign } => format.pack(*sign, format.max_exponent(), 0),
            Float::Nan { payload, sign } => {
                let mut fraction = payload & format.fraction_mask();
                if fraction == 0 {
                    fraction = format.quiet_bit();
                }
                format.pack(*sign, format.max_exponent(), fraction)
            }
            Float::Finite { value } => encode_finite(value, format),
        }
    }

    pub fn sign(&self) -> Sign {
        match self {
            Float::Zero { sign } | Float::Infinite { sign } | Float::Nan { sign, .. } => *sign,
            Float::Finite { value } => {
                if value.is_negative() {
                    Sign::Minus
                } else {
                    Sign::Plus
                }
            }
        }
    }

    /// Same magnitude (or payload) with the given sign
    pub fn with_sign(&self, sign: Sign) -> Self {
        if self.sign() == sign {
            return self.clone();
        }
        self.negate()
    }

    pub fn negate(&self) -> Self {
        match self {
            Float::Zero { sign } => Float::Zero { sign: -*sign },
            Float::Infinite { sign } => Float::Infinite { sign: -*sign },
            Float::Nan { payload, sign } => Float::Nan {
                payload: *payload,
                sign: -*sign,
            },
            Float::Finite { value } => Float::Finite { value: -value.clone() },
        }
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Float::Nan { .. })
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Float::Zero { .. })
    }

    /// Drop the NaN payload, keeping the sign
    pub fn canonicalize(&self) -> Self {
        match self {
            Float::Nan { sign, .. } => Float::Nan {
                payload: 0,
                sign: *sign,
            },
            other => other.clone(),
        }
    }

    /// Nearest native double
    pub fn to_f64(&self) -> f64 {
        f64::from_bits(self.encode(Format::DOUBLE))
    }

    /// Integer part, rounding toward zero. `None` for infinities and NaN.
    pub fn truncate(&self) -> Option<BigInt> {
        match self {
            Float::Zero { .. } => Some(BigInt::zero()),
            Float::Finite { value } => Some(value.trunc().to_integer()),
            Float::Infinite { .. } | Float::Nan { .. } => None,
        }
    }
}

impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Float::Zero { sign } => write!(f, "{sign}0"),
            Float::Infinite { sign } => write!(f, "{sign}inf"),
            Float::Nan { payload, sign } => write!(f, "{sign}nan:{payload:#x}"),
            Float::Finite { value } => write!(f, "{value}"),
        }
    }
}

fn encode_finite(value: &BigRational, format: Format) -> u64 {
    let sign = if value.is_negative() {
        Sign::Minus
    } else {
        Sign::Plus
    };
    let mut fitting = Fitting::new(value.numer().magnitude().clone(), value.denom().magnitude().clone(), format);
    fitting.scale();
    fitting.round();

    let significand = fitting.significand();
    let significands = format.significands();
    if significand.is_zero() {
        return Float::Zero { sign }.encode(format);
    }
    if significand > BigUint::from(*significands.end()) {
        return Float::Infinite { sign }.encode(format);
    }
    let Some(significand) = significand.to_u64() else {
        return Float::Infinite { sign }.encode(format);
    };
    if significand < *significands.start() {
        // only reachable at the lowest normal exponent
        format.pack(sign, format.min_exponent(), significand)
    } else {
        format.pack(sign, fitting.exponent, significand)
    }
}

/// Magnitude `numer / denom × 2^(exponent − fraction_bits)` being fitted
/// into the significand range of a format
struct Fitting {
    numer: BigUint,
    denom: BigUint,
    exponent: i32,
    format: Format,
}

impl Fitting {
    fn new(numer: BigUint, denom: BigUint, format: Format) -> Self {
        let mut fitting = Fitting {
            numer,
            denom,
            exponent: format.fraction_bits() as i32,
            format,
        };
        fitting.estimate();
        fitting
    }

    /// Jump close to the final exponent using bit lengths so `scale` only
    /// has to correct by a step or two.
    fn estimate(&mut self) {
        let exponents = self.format.normal_exponents();
        let magnitude = self.numer.bits() as i64 - self.denom.bits() as i64;
        let target = magnitude.clamp(*exponents.start() as i64, *exponents.end() as i64) as i32;
        let shift = target - self.exponent;
        if shift > 0 {
            self.denom <<= shift as usize;
        } else if shift < 0 {
            self.numer <<= shift.unsigned_abs() as usize;
        }
        self.exponent = target;
    }

    fn quotient(&self) -> BigUint {
        &self.numer / &self.denom
    }

    fn scale(&mut self) {
        let significands = self.format.significands();
        let min = BigUint::from(*significands.start());
        let max = BigUint::from(*significands.end());
        let exponents = self.format.normal_exponents();
        loop {
            let quotient = self.quotient();
            if quotient < min && self.exponent > *exponents.start() {
                self.numer <<= 1;
                self.exponent -= 1;
            } else if quotient > max && self.exponent < *exponents.end() {
                self.denom <<= 1;
                self.exponent += 1;
            } else {
                break;
            }
        }
    }

    fn round(&mut self) {
        let (mut quotient, remainder) = self.numer.div_rem(&self.denom);
        let twice = remainder << 1;
        if twice > self.denom || (twice == self.denom && quotient.is_odd()) {
            quotient += 1u32;
        }
        self.numer = quotient;
        self.denom = BigUint::one();
        // rounding up may have carried into the next power of two
        self.scale();
    }

    fn significand(&self) -> BigUint {
        self.quotient()
    }
}
