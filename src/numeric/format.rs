//! IEEE 754 binary interchange format layout
//!
//! A [`Format`] is described by its exponent width and significand width
//! (the significand width counts the implicit leading bit). Encoded values
//! are carried in the low `bits()` bits of a `u64`, laid out most significant
//! first as sign, biased exponent, fraction.

use super::Sign;
use std::ops::RangeInclusive;

/// A binary floating point encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Format {
    exponent_bits: u32,
    significand_bits: u32,
}

impl Format {
    /// binary32 (`f32`)
    pub const SINGLE: Format = Format::new(8, 24);

    /// binary64 (`f64`)
    pub const DOUBLE: Format = Format::new(11, 53);

    pub const fn new(exponent_bits: u32, significand_bits: u32) -> Self {
        Format {
            exponent_bits,
            significand_bits,
        }
    }

    pub fn exponent_bits(&self) -> u32 {
        self.exponent_bits
    }

    pub fn significand_bits(&self) -> u32 {
        self.significand_bits
    }

    /// Total encoded width
    pub fn bits(&self) -> u32 {
        self.exponent_bits + self.significand_bits
    }

    /// Width of the stored fraction (significand without the implicit bit)
    pub fn fraction_bits(&self) -> u32 {
        self.significand_bits - 1
    }

    pub fn bias(&self) -> i32 {
        (1 << (self.exponent_bits - 1)) - 1
    }

    /// Valid magnitudes of a normalized significand, implicit bit included
    pub fn significands(&self) -> RangeInclusive<u64> {
        (1 << self.fraction_bits())..=((1 << self.significand_bits) - 1)
    }

    /// Unbiased exponents. The minimum encodes zero and subnormals, the
    /// maximum encodes infinities and NaNs.
    pub fn exponents(&self) -> RangeInclusive<i32> {
        -self.bias()..=self.bias() + 1
    }

    pub fn min_exponent(&self) -> i32 {
        -self.bias()
    }

    pub fn max_exponent(&self) -> i32 {
        self.bias() + 1
    }

    /// Exponents usable by normal (finite, non-subnormal) values
    pub fn normal_exponents(&self) -> RangeInclusive<i32> {
        self.min_exponent() + 1..=self.max_exponent() - 1
    }

    /// Mask covering every encoded bit
    pub fn mask(&self) -> u64 {
        if self.bits() >= 64 {
            u64::MAX
        } else {
            (1 << self.bits()) - 1
        }
    }

    pub fn fraction_mask(&self) -> u64 {
        (1 << self.fraction_bits()) - 1
    }

    fn exponent_mask(&self) -> u64 {
        (1 << self.exponent_bits) - 1
    }

    /// Bit that distinguishes quiet NaNs from signalling ones
    pub fn quiet_bit(&self) -> u64 {
        1 << (self.fraction_bits() - 1)
    }

    /// Compose an encoded value from its fields
    pub fn pack(&self, sign: Sign, exponent: i32, fraction: u64) -> u64 {
        let biased = (exponent + self.bias()) as u64 & self.exponent_mask();
        (sign.bit() << (self.bits() - 1)) | (biased << self.fraction_bits()) | (fraction & self.fraction_mask())
    }

    /// Split an encoded value into sign, unbiased exponent and fraction
    pub fn unpack(&self, bits: u64) -> (Sign, i32, u64) {
        let bits = bits & self.mask();
        let sign = Sign::from_bit(bits >> (self.bits() - 1));
        let biased = (bits >> self.fraction_bits()) & self.exponent_mask();
        let fraction = bits & self.fraction_mask();
        (sign, biased as i32 - self.bias(), fraction)
    }
}
