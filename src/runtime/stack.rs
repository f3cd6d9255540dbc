//! WebAssembly operand stack

use super::{RuntimeError, Value};
use crate::ast::ValueType;

/// The operand stack shared by every active call
#[derive(Debug, Default)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn new() -> Self {
        Stack { values: Vec::new() }
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn push_all(&mut self, values: impl IntoIterator<Item = Value>) {
        self.values.extend(values);
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.values.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Pop the top `count` values, returned in push order
    pub fn pop_n(&mut self, count: usize) -> Result<Vec<Value>, RuntimeError> {
        let len = self.values.len();
        if count > len {
            return Err(RuntimeError::StackUnderflow);
        }
        Ok(self.values.split_off(len - count))
    }

    /// Pop a value and check its type
    pub fn pop_typed(&mut self, expected_type: ValueType) -> Result<Value, RuntimeError> {
        let value = self.pop()?;
        if value.typ() != expected_type {
            return Err(RuntimeError::TypeMismatch {
                expected: expected_type.to_string(),
                actual: value.typ().to_string(),
            });
        }
        Ok(value)
    }

    /// Pop a numeric value of `value_type` as raw bits
    pub fn pop_bits(&mut self, value_type: ValueType) -> Result<u64, RuntimeError> {
        self.pop_typed(value_type)?
            .bits()
            .ok_or_else(|| RuntimeError::InvalidInstruction(format!("{value_type} has no bit pattern")))
    }

    pub fn pop_i32(&mut self) -> Result<u32, RuntimeError> {
        Ok(self.pop_bits(ValueType::I32)? as u32)
    }

    pub fn pop_i64(&mut self) -> Result<u64, RuntimeError> {
        self.pop_bits(ValueType::I64)
    }

    /// Drop everything above `height`
    pub fn truncate(&mut self, height: usize) {
        self.values.truncate(height);
    }

    pub fn depth(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
