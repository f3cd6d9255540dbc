//! Parametric and reference instructions

use super::*;
use crate::ast::RefType;
use crate::runtime::FuncAddr;

/// drop
pub fn drop(stack: &mut Stack) -> Result<(), RuntimeError> {
    stack.pop()?;
    Ok(())
}

/// select: keep the first operand when the condition is non-zero, the
/// second otherwise. Both operands must have the same type.
pub fn select(stack: &mut Stack) -> Result<(), RuntimeError> {
    let condition = stack.pop_i32()?;
    let second = stack.pop()?;
    let first = stack.pop_typed(second.typ())?;
    stack.push(if condition != 0 { first } else { second });
    Ok(())
}

/// ref.null t
pub fn ref_null(stack: &mut Stack, ref_type: RefType) {
    stack.push(match ref_type {
        RefType::FuncRef => Value::FuncRef(None),
        RefType::ExternRef => Value::ExternRef(None),
    });
}

/// ref.is_null
pub fn ref_is_null(stack: &mut Stack) -> Result<(), RuntimeError> {
    let value = stack.pop()?;
    let is_null = value.is_null().ok_or_else(|| RuntimeError::TypeMismatch {
        expected: "reference".to_string(),
        actual: value.typ().to_string(),
    })?;
    push_bool(stack, is_null);
    Ok(())
}

/// ref.func x, with `x` already resolved to an address
pub fn ref_func(stack: &mut Stack, addr: FuncAddr) {
    stack.push(Value::FuncRef(Some(addr)));
}
