//! Memory instructions
//!
//! The effective address of an access is the i32 operand read unsigned plus
//! the static offset, computed in 64 bits so it cannot wrap. Packed accesses
//! move fewer bytes than the value type holds; packed loads extend with
//! zeros or with the sign bit of the narrow value.

use super::*;
use crate::ast::{MemArg, PackedLoad, ValueType};

fn value_width(value_type: ValueType) -> Result<u32, RuntimeError> {
    value_type
        .bits()
        .ok_or_else(|| RuntimeError::InvalidInstruction(format!("{value_type} cannot be stored in memory")))
}

fn effective_address(stack: &mut Stack, memarg: MemArg) -> Result<u64, RuntimeError> {
    Ok(stack.pop_i32()? as u64 + memarg.offset as u64)
}

/// t.load / t.loadN_sx
pub fn load(
    stack: &mut Stack,
    memory: &Memory,
    value_type: ValueType,
    memarg: MemArg,
    packed: Option<PackedLoad>,
) -> Result<(), RuntimeError> {
    let width = value_width(value_type)?;
    let address = effective_address(stack, memarg)?;
    let bits = match packed {
        Some(PackedLoad { bits, signed: true }) => signed(memory.load(address, bits)?, bits) as u64,
        Some(PackedLoad { bits, signed: false }) => memory.load(address, bits)?,
        None => memory.load(address, width)?,
    };
    push_bits(stack, value_type, bits & mask(width))
}

/// t.store / t.storeN
pub fn store(
    stack: &mut Stack,
    memory: &mut Memory,
    value_type: ValueType,
    memarg: MemArg,
    bits: Option<u32>,
) -> Result<(), RuntimeError> {
    let width = value_width(value_type)?;
    let value = stack.pop_bits(value_type)?;
    let address = effective_address(stack, memarg)?;
    memory.store(address, value, bits.unwrap_or(width))
}

/// memory.size
pub fn size(stack: &mut Stack, memory: &Memory) -> Result<(), RuntimeError> {
    stack.push(Value::I32(memory.size()));
    Ok(())
}

/// memory.grow: pushes the previous page count, or -1 when the memory
/// cannot grow that far
pub fn grow(stack: &mut Stack, memory: &mut Memory) -> Result<(), RuntimeError> {
    let pages = stack.pop_i32()?;
    let previous = memory.grow_by(pages).unwrap_or(u32::MAX);
    log::debug!("memory.grow by {pages} pages: {previous:#x}");
    stack.push(Value::I32(previous));
    Ok(())
}
