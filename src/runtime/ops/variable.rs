//! Variable instructions
//!
//! Locals live in the current [`Frame`]; globals are shared cells, so a
//! `global.set` is visible to every instance that imported the global.

use super::*;
use crate::runtime::frame::Frame;
use crate::runtime::instance::GlobalInstance;

fn check_type(expected: Value, value: Value) -> Result<(), RuntimeError> {
    if expected.typ() != value.typ() {
        return Err(RuntimeError::TypeMismatch {
            expected: expected.typ().to_string(),
            actual: value.typ().to_string(),
        });
    }
    Ok(())
}

/// local.get x
pub fn local_get(stack: &mut Stack, frame: &Frame, local: u32) -> Result<(), RuntimeError> {
    stack.push(frame.local(local)?);
    Ok(())
}

/// local.set x
pub fn local_set(stack: &mut Stack, frame: &mut Frame, local: u32) -> Result<(), RuntimeError> {
    let value = stack.pop()?;
    check_type(frame.local(local)?, value)?;
    frame.set_local(local, value)
}

/// local.tee x: local.set that leaves the value on the stack
pub fn local_tee(stack: &mut Stack, frame: &mut Frame, local: u32) -> Result<(), RuntimeError> {
    let value = stack.pop()?;
    check_type(frame.local(local)?, value)?;
    stack.push(value);
    frame.set_local(local, value)
}

/// global.get x
pub fn global_get(stack: &mut Stack, global: &GlobalInstance) -> Result<(), RuntimeError> {
    stack.push(global.value.get());
    Ok(())
}

/// global.set x
pub fn global_set(stack: &mut Stack, global: &GlobalInstance, index: u32) -> Result<(), RuntimeError> {
    if !global.global_type.mutable {
        return Err(RuntimeError::ImmutableGlobal(index));
    }
    let value = stack.pop_typed(global.global_type.value_type)?;
    global.value.set(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::ast::{BinaryOp, Global, GlobalType, Instruction, ValueType};
    use crate::runtime::test_utils::test::*;
    use crate::runtime::Value;

    #[test]
    fn local_get_args_in_order() {
        ExecutorTest::new()
            .arg(Value::I32(10))
            .arg(Value::I64(20))
            .arg(Value::F32(30.0f32.to_bits()))
            .inst(Instruction::LocalGet { local: 1 })
            .inst(Instruction::LocalGet { local: 0 })
            .inst(Instruction::LocalGet { local: 2 })
            .returns(vec![ValueType::I64, ValueType::I32, ValueType::F32])
            .expect_stack(vec![Value::I64(20), Value::I32(10), Value::F32(30.0f32.to_bits())]);
    }

    #[test]
    fn declared_locals_start_at_zero() {
        ExecutorTest::new()
            .arg(Value::I32(1))
            .local(ValueType::I64)
            .local(ValueType::F64)
            .inst(Instruction::LocalGet { local: 1 })
            .inst(Instruction::LocalGet { local: 2 })
            .returns(vec![ValueType::I64, ValueType::F64])
            .expect_stack(vec![Value::I64(0), Value::F64(0)]);
    }

    #[test]
    fn local_get_out_of_bounds() {
        ExecutorTest::new()
            .arg(Value::I32(42))
            .inst(Instruction::LocalGet { local: 1 })
            .expect_error("Unknown local: 1");
    }

    #[test]
    fn local_set_and_tee() {
        ExecutorTest::new()
            .arg(Value::I32(0))
            .local(ValueType::I32)
            .inst(i32_const(42))
            .inst(Instruction::LocalSet { local: 0 })
            .inst(i32_const(7))
            .inst(Instruction::LocalTee { local: 1 })
            .inst(Instruction::LocalGet { local: 0 })
            .inst(binary(ValueType::I32, BinaryOp::Add))
            .inst(Instruction::LocalGet { local: 1 })
            .returns(vec![ValueType::I32, ValueType::I32])
            .expect_stack(vec![Value::I32(49), Value::I32(7)]);
    }

    #[test]
    fn local_set_checks_type() {
        ExecutorTest::new()
            .arg(Value::I32(0))
            .inst(i64_const(1))
            .inst(Instruction::LocalSet { local: 0 })
            .expect_error("Type mismatch: expected i32, got i64");
    }

    fn with_globals(test: ExecutorTest) -> ExecutorTest {
        test.module(|module| {
            module.globals = vec![
                Global {
                    global_type: GlobalType {
                        value_type: ValueType::I32,
                        mutable: false,
                    },
                    init: vec![i32_const(666)],
                },
                Global {
                    global_type: GlobalType {
                        value_type: ValueType::I64,
                        mutable: true,
                    },
                    init: vec![i64_const(-1)],
                },
            ];
        })
    }

    #[test]
    fn globals_read_and_write() {
        with_globals(ExecutorTest::new())
            .inst(Instruction::GlobalGet { global: 0 })
            .inst(i64_const(5))
            .inst(Instruction::GlobalSet { global: 1 })
            .inst(Instruction::GlobalGet { global: 1 })
            .returns(vec![ValueType::I32, ValueType::I64])
            .expect_stack(vec![Value::I32(666), Value::I64(5)]);
    }

    #[test]
    fn immutable_global_cannot_be_set() {
        with_globals(ExecutorTest::new())
            .inst(i32_const(1))
            .inst(Instruction::GlobalSet { global: 0 })
            .expect_error("Cannot set immutable global: 0");
    }

    #[test]
    fn unknown_global() {
        ExecutorTest::new()
            .inst(Instruction::GlobalGet { global: 3 })
            .expect_error("Unknown global: 3");
    }
}
