//! Numeric operations for WebAssembly
//!
//! Integer operands are unsigned words of the type's width; signed
//! operations read them as two's complement and every result is masked back
//! to the width. Float operands are routed to [`super::float`].
//!
//! Division is floor division: a negative quotient with a nonzero remainder
//! rounds toward negative infinity (`-7 div_s 2 = -4`), and the remainder is
//! `dividend - divisor * quotient` under the same division.

use super::*;
use crate::ast::{BinaryOp, Constant, UnaryOp, ValueType};
use num_integer::Integer;

/// t.const
pub fn constant(stack: &mut Stack, constant: &Constant) -> Result<(), RuntimeError> {
    push_bits(stack, constant.value_type(), constant.bits())
}

/// t.unop
pub fn unary(stack: &mut Stack, value_type: ValueType, op: UnaryOp) -> Result<(), RuntimeError> {
    if value_type.is_float() {
        return super::float::unary(stack, value_type, op);
    }
    let bits = int_width(value_type)?;
    let a = stack.pop_bits(value_type)?;
    push_bits(stack, value_type, int_unary(op, a, bits)?)
}

/// t.binop
pub fn binary(stack: &mut Stack, value_type: ValueType, op: BinaryOp) -> Result<(), RuntimeError> {
    if value_type.is_float() {
        return super::float::binary(stack, value_type, op);
    }
    let bits = int_width(value_type)?;
    let b = stack.pop_bits(value_type)?;
    let a = stack.pop_bits(value_type)?;
    push_bits(stack, value_type, int_binary(op, a, b, bits)?)
}

/// t.eqz
pub fn eqz(stack: &mut Stack, value_type: ValueType) -> Result<(), RuntimeError> {
    int_width(value_type)?;
    let a = stack.pop_bits(value_type)?;
    push_bool(stack, a == 0);
    Ok(())
}

pub fn int_unary(op: UnaryOp, a: u64, bits: u32) -> Result<u64, RuntimeError> {
    let a = a & mask(bits);
    let result = match op {
        UnaryOp::Clz => (a.leading_zeros() - (64 - bits)) as u64,
        UnaryOp::Ctz => {
            if a == 0 {
                bits as u64
            } else {
                a.trailing_zeros() as u64
            }
        }
        UnaryOp::Popcnt => a.count_ones() as u64,
        UnaryOp::Extend8S => signed(a, 8) as u64,
        UnaryOp::Extend16S => signed(a, 16) as u64,
        UnaryOp::Extend32S if bits == 64 => signed(a, 32) as u64,
        op @ (UnaryOp::Extend32S
        | UnaryOp::Abs
        | UnaryOp::Neg
        | UnaryOp::Sqrt
        | UnaryOp::Ceil
        | UnaryOp::Floor
        | UnaryOp::Trunc
        | UnaryOp::Nearest) => {
            return Err(RuntimeError::InvalidInstruction(format!("i{bits}.{op:?}")));
        }
    };
    Ok(result & mask(bits))
}

pub fn int_binary(op: BinaryOp, a: u64, b: u64, bits: u32) -> Result<u64, RuntimeError> {
    let (a, b) = (a & mask(bits), b & mask(bits));
    let shift = (b % bits as u64) as u32;
    let result = match op {
        BinaryOp::Add => a.wrapping_add(b),
        BinaryOp::Sub => a.wrapping_sub(b),
        BinaryOp::Mul => a.wrapping_mul(b),
        BinaryOp::DivS => {
            let (x, y) = signed_operands(a, b, bits)?;
            let quotient = Integer::div_floor(&x, &y);
            if quotient > (1i128 << (bits - 1)) - 1 {
                return Err(Trap::IntegerOverflow.into());
            }
            quotient as u64
        }
        BinaryOp::DivU => {
            if b == 0 {
                return Err(Trap::IntegerDivideByZero.into());
            }
            a / b
        }
        BinaryOp::RemS => {
            let (x, y) = signed_operands(a, b, bits)?;
            Integer::mod_floor(&x, &y) as u64
        }
        BinaryOp::RemU => {
            if b == 0 {
                return Err(Trap::IntegerDivideByZero.into());
            }
            a % b
        }
        BinaryOp::And => a & b,
        BinaryOp::Or => a | b,
        BinaryOp::Xor => a ^ b,
        BinaryOp::Shl => a << shift,
        BinaryOp::ShrS => (signed(a, bits) >> shift) as u64,
        BinaryOp::ShrU => a >> shift,
        BinaryOp::Rotl => rotate_left(a, shift, bits),
        BinaryOp::Rotr => rotate_left(a, (bits - shift) % bits, bits),
        op @ (BinaryOp::Div | BinaryOp::Min | BinaryOp::Max | BinaryOp::Copysign) => {
            return Err(RuntimeError::InvalidInstruction(format!("i{bits}.{op:?}")));
        }
    };
    Ok(result & mask(bits))
}

/// Signed operands widened so floor division cannot overflow; traps on a
/// zero divisor
fn signed_operands(a: u64, b: u64, bits: u32) -> Result<(i128, i128), RuntimeError> {
    if b == 0 {
        return Err(Trap::IntegerDivideByZero.into());
    }
    Ok((signed(a, bits) as i128, signed(b, bits) as i128))
}

fn rotate_left(a: u64, shift: u32, bits: u32) -> u64 {
    if shift == 0 {
        a
    } else {
        (a << shift) | (a >> (bits - shift))
    }
}
