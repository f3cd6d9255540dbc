//! Floating point arithmetic
//!
//! Operands are decoded through the exact value model, computed on native
//! `f64`, and re-encoded with the exact encoder. Computing a single precision
//! operation in double precision and rounding once more is exact for the
//! basic operations and `sqrt`, so both widths share one path. Any NaN result
//! is the canonical NaN.
//!
//! `abs`, `neg` and `copysign` only touch the sign and keep NaN payloads;
//! `min` and `max` order signed zeros.

use super::*;
use crate::ast::{BinaryOp, UnaryOp, ValueType};
use crate::numeric::{Float, Format, Sign};

fn native(value: f64, format: Format) -> u64 {
    if value.is_nan() {
        Float::NAN.encode(format)
    } else {
        Float::from_float(value).encode(format)
    }
}

/// t.unop on floats
pub fn unary(stack: &mut Stack, value_type: ValueType, op: UnaryOp) -> Result<(), RuntimeError> {
    let format = format_of(value_type)?;
    let a = Float::decode(stack.pop_bits(value_type)?, format);
    push_bits(stack, value_type, float_unary(op, &a, format)?)
}

/// t.binop on floats
pub fn binary(stack: &mut Stack, value_type: ValueType, op: BinaryOp) -> Result<(), RuntimeError> {
    let format = format_of(value_type)?;
    let b = Float::decode(stack.pop_bits(value_type)?, format);
    let a = Float::decode(stack.pop_bits(value_type)?, format);
    push_bits(stack, value_type, float_binary(op, &a, &b, format)?)
}

pub fn float_unary(op: UnaryOp, a: &Float, format: Format) -> Result<u64, RuntimeError> {
    let bits = match op {
        UnaryOp::Abs => a.with_sign(Sign::Plus).encode(format),
        UnaryOp::Neg => a.negate().encode(format),
        UnaryOp::Sqrt => native(a.to_f64().sqrt(), format),
        UnaryOp::Ceil => native(a.to_f64().ceil(), format),
        UnaryOp::Floor => native(a.to_f64().floor(), format),
        UnaryOp::Trunc => native(a.to_f64().trunc(), format),
        UnaryOp::Nearest => native(a.to_f64().round_ties_even(), format),
        op @ (UnaryOp::Clz
        | UnaryOp::Ctz
        | UnaryOp::Popcnt
        | UnaryOp::Extend8S
        | UnaryOp::Extend16S
        | UnaryOp::Extend32S) => {
            return Err(RuntimeError::InvalidInstruction(format!("f{}.{op:?}", format.bits())));
        }
    };
    Ok(bits)
}

pub fn float_binary(op: BinaryOp, a: &Float, b: &Float, format: Format) -> Result<u64, RuntimeError> {
    let bits = match op {
        BinaryOp::Add => native(a.to_f64() + b.to_f64(), format),
        BinaryOp::Sub => native(a.to_f64() - b.to_f64(), format),
        BinaryOp::Mul => native(a.to_f64() * b.to_f64(), format),
        BinaryOp::Div => native(a.to_f64() / b.to_f64(), format),
        BinaryOp::Min => min(a, b).encode(format),
        BinaryOp::Max => max(a, b).encode(format),
        BinaryOp::Copysign => a.with_sign(b.sign()).encode(format),
        op @ (BinaryOp::DivS
        | BinaryOp::DivU
        | BinaryOp::RemS
        | BinaryOp::RemU
        | BinaryOp::And
        | BinaryOp::Or
        | BinaryOp::Xor
        | BinaryOp::Shl
        | BinaryOp::ShrS
        | BinaryOp::ShrU
        | BinaryOp::Rotl
        | BinaryOp::Rotr) => {
            return Err(RuntimeError::InvalidInstruction(format!("f{}.{op:?}", format.bits())));
        }
    };
    Ok(bits)
}

/// IEEE minimum: NaN if either operand is NaN, and -0 below +0
fn min(a: &Float, b: &Float) -> Float {
    if a.is_nan() || b.is_nan() {
        return Float::NAN;
    }
    if a.is_zero() && b.is_zero() {
        let sign = if a.sign().is_negative() || b.sign().is_negative() {
            Sign::Minus
        } else {
            Sign::Plus
        };
        return Float::Zero { sign };
    }
    if a.to_f64() <= b.to_f64() {
        a.clone()
    } else {
        b.clone()
    }
}

/// IEEE maximum: NaN if either operand is NaN, and +0 above -0
fn max(a: &Float, b: &Float) -> Float {
    if a.is_nan() || b.is_nan() {
        return Float::NAN;
    }
    if a.is_zero() && b.is_zero() {
        let sign = if a.sign().is_negative() && b.sign().is_negative() {
            Sign::Minus
        } else {
            Sign::Plus
        };
        return Float::Zero { sign };
    }
    if a.to_f64() >= b.to_f64() {
        a.clone()
    } else {
        b.clone()
    }
}
