//! Branch instructions
//!
//! `block`, `loop`, `if` and calls need the interpreter's recursion and are
//! dispatched there; the branches themselves only need the operand and label
//! stacks.

use super::*;
use crate::runtime::control::{BlockEnd, LabelStack};

/// Common part of `br`, `br_if` and `br_table`: keep the label's arity
/// values, drop everything above the label's entry height, and signal the
/// branch so the enclosing constructs can unwind to it.
fn perform_branch(stack: &mut Stack, labels: &LabelStack, depth: u32) -> Result<BlockEnd, RuntimeError> {
    let label = labels.get(depth).ok_or(RuntimeError::InvalidLabel(depth))?;
    let values = stack.pop_n(label.arity())?;
    stack.truncate(label.stack_height);
    stack.push_all(values);
    Ok(BlockEnd::Branch(depth))
}

/// br l
pub fn br(stack: &mut Stack, labels: &LabelStack, depth: u32) -> Result<BlockEnd, RuntimeError> {
    perform_branch(stack, labels, depth)
}

/// br_if l: branch when the popped condition is non-zero
pub fn br_if(stack: &mut Stack, labels: &LabelStack, depth: u32) -> Result<BlockEnd, RuntimeError> {
    if stack.pop_i32()? != 0 {
        perform_branch(stack, labels, depth)
    } else {
        Ok(BlockEnd::Normal)
    }
}

/// br_table l* l_default: the operand is unsigned, any index past the end
/// selects the default
pub fn br_table(stack: &mut Stack, labels: &LabelStack, targets: &[u32], default: u32) -> Result<BlockEnd, RuntimeError> {
    let index = stack.pop_i32()? as usize;
    let depth = targets.get(index).copied().unwrap_or(default);
    perform_branch(stack, labels, depth)
}

/// unreachable
pub fn unreachable() -> Result<BlockEnd, RuntimeError> {
    Err(Trap::Unreachable.into())
}
