//! Instruction semantics
//!
//! Each handler works directly on the operand stack: it pops its operands,
//! computes, and pushes its result. Structured control and calls live in the
//! interpreter, which owns the label stack and the function space.

pub mod comparison;
pub mod control;
pub mod conversion;
pub mod float;
pub mod memory;
pub mod numeric;
pub mod parametric;
pub mod variable;

pub(crate) use crate::runtime::memory::Memory;
pub(crate) use crate::runtime::stack::Stack;
pub(crate) use crate::runtime::{RuntimeError, Trap, Value};

use crate::ast::ValueType;
use crate::numeric::Format;

/// Float encoding of a float value type
pub(crate) fn format_of(value_type: ValueType) -> Result<Format, RuntimeError> {
    match value_type {
        ValueType::F32 => Ok(Format::SINGLE),
        ValueType::F64 => Ok(Format::DOUBLE),
        other => Err(RuntimeError::InvalidInstruction(format!("{other} is not a float type"))),
    }
}

/// Bit width of an integer value type
pub(crate) fn int_width(value_type: ValueType) -> Result<u32, RuntimeError> {
    match value_type {
        ValueType::I32 => Ok(32),
        ValueType::I64 => Ok(64),
        other => Err(RuntimeError::InvalidInstruction(format!("{other} is not an integer type"))),
    }
}

pub(crate) fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Two's complement reading of the low `bits` of `value`
pub(crate) fn signed(value: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Push raw bits as a value of `value_type`
pub(crate) fn push_bits(stack: &mut Stack, value_type: ValueType, bits: u64) -> Result<(), RuntimeError> {
    let value = Value::from_bits(value_type, bits)
        .ok_or_else(|| RuntimeError::InvalidInstruction(format!("{value_type} is not a numeric type")))?;
    stack.push(value);
    Ok(())
}

pub(crate) fn push_bool(stack: &mut Stack, condition: bool) {
    stack.push(Value::I32(condition as u32));
}
