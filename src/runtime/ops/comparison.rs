//! Comparison operations
//!
//! All comparisons push an i32: 1 for true, 0 for false. Float comparisons
//! are native on the decoded values, so any comparison involving NaN is
//! false except `ne`.

use super::*;
use crate::ast::{CompareOp, ValueType};
use crate::numeric::Float;

/// t.relop
pub fn compare(stack: &mut Stack, value_type: ValueType, op: CompareOp) -> Result<(), RuntimeError> {
    let b = stack.pop_bits(value_type)?;
    let a = stack.pop_bits(value_type)?;
    let result = if value_type.is_float() {
        let format = format_of(value_type)?;
        let (a, b) = (Float::decode(a, format).to_f64(), Float::decode(b, format).to_f64());
        float_compare(op, a, b)?
    } else {
        int_compare(op, a, b, int_width(value_type)?)?
    };
    push_bool(stack, result);
    Ok(())
}

pub fn int_compare(op: CompareOp, a: u64, b: u64, bits: u32) -> Result<bool, RuntimeError> {
    let (sa, sb) = (signed(a, bits), signed(b, bits));
    let result = match op {
        CompareOp::Eq => a == b,
        CompareOp::Ne => a != b,
        CompareOp::LtS => sa < sb,
        CompareOp::LtU => a < b,
        CompareOp::GtS => sa > sb,
        CompareOp::GtU => a > b,
        CompareOp::LeS => sa <= sb,
        CompareOp::LeU => a <= b,
        CompareOp::GeS => sa >= sb,
        CompareOp::GeU => a >= b,
        op @ (CompareOp::Lt | CompareOp::Gt | CompareOp::Le | CompareOp::Ge) => {
            return Err(RuntimeError::InvalidInstruction(format!("i{bits}.{op:?}")));
        }
    };
    Ok(result)
}

pub fn float_compare(op: CompareOp, a: f64, b: f64) -> Result<bool, RuntimeError> {
    let result = match op {
        CompareOp::Eq => a == b,
        CompareOp::Ne => a != b,
        CompareOp::Lt => a < b,
        CompareOp::Gt => a > b,
        CompareOp::Le => a <= b,
        CompareOp::Ge => a >= b,
        op @ (CompareOp::LtS
        | CompareOp::LtU
        | CompareOp::GtS
        | CompareOp::GtU
        | CompareOp::LeS
        | CompareOp::LeU
        | CompareOp::GeS
        | CompareOp::GeU) => return Err(RuntimeError::InvalidInstruction(format!("float {op:?}"))),
    };
    Ok(result)
}
