//! Exact numeric foundation for floating point instructions
//!
//! Floating point values are never manipulated through an intermediate
//! hardware float when they are rounded into a target width. Instead every
//! finite value is held as an exact big rational ([`Float::Finite`]) and is
//! fitted into a [`Format`] with integer arithmetic only, which makes the
//! encoding bit-exact for subnormals, ties and overflow.
//!
//! - [`float`] -- the four-variant value model and its encoder/decoder.
//! - [`format`] -- bit layout of an IEEE 754 binary interchange format.
//! - [`literal`] -- text literal grammars for floats and integers.

pub mod float;
pub mod format;
pub mod literal;

pub use float::Float;
pub use format::Format;
pub use literal::{parse_int, LiteralError};

use std::fmt;
use std::ops::Neg;

/// Sign of a floating point value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    /// Sign bit as it appears in the encoded form (0 = plus, 1 = minus)
    pub fn bit(self) -> u64 {
        match self {
            Sign::Plus => 0,
            Sign::Minus => 1,
        }
    }

    pub fn from_bit(bit: u64) -> Self {
        if bit & 1 == 0 {
            Sign::Plus
        } else {
            Sign::Minus
        }
    }

    pub fn is_negative(self) -> bool {
        self == Sign::Minus
    }
}

impl Neg for Sign {
    type Output = Sign;

    fn neg(self) -> Sign {
        match self {
            Sign::Plus => Sign::Minus,
            Sign::Minus => Sign::Plus,
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Plus => write!(f, "+"),
            Sign::Minus => write!(f, "-"),
        }
    }
}
