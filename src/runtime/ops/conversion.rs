//! Type conversion operations
//!
//! - Integer width conversions (wrap, extend)
//! - Float width conversions (promote, demote), which canonicalize NaN
//! - Integer to float conversions, exact up to the final rounding
//! - Float to integer truncations, trapping or saturating
//! - Reinterpretation (bit casting)

use super::*;
use crate::ast::{Conversion, ValueType};
use crate::numeric::{Float, Format};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// cvtop
pub fn convert(stack: &mut Stack, conversion: Conversion) -> Result<(), RuntimeError> {
    match conversion {
        Conversion::Wrap => {
            let value = stack.pop_i64()?;
            stack.push(Value::I32(value as u32));
        }
        Conversion::Extend { signed: is_signed } => {
            let value = stack.pop_i32()? as u64;
            let extended = if is_signed { signed(value, 32) as u64 } else { value };
            stack.push(Value::I64(extended));
        }
        Conversion::Trunc { from, to, signed } => {
            let value = pop_float(stack, from)?;
            push_bits(stack, to, truncate(&value, int_width(to)?, signed)?)?;
        }
        Conversion::TruncSat { from, to, signed } => {
            let value = pop_float(stack, from)?;
            push_bits(stack, to, truncate_saturating(&value, int_width(to)?, signed))?;
        }
        Conversion::Convert { from, to, signed: is_signed } => {
            let bits = int_width(from)?;
            let value = stack.pop_bits(from)?;
            let integer = if is_signed {
                BigInt::from(signed(value, bits))
            } else {
                BigInt::from(value)
            };
            push_bits(stack, to, Float::from_integer(integer).encode(format_of(to)?))?;
        }
        Conversion::Demote => {
            let value = pop_float(stack, ValueType::F64)?;
            stack.push(Value::F32(value.canonicalize().encode(Format::SINGLE) as u32));
        }
        Conversion::Promote => {
            let value = pop_float(stack, ValueType::F32)?;
            stack.push(Value::F64(value.canonicalize().encode(Format::DOUBLE)));
        }
        Conversion::Reinterpret { from, to } => {
            if from.bits().is_none() || from.bits() != to.bits() {
                return Err(RuntimeError::InvalidInstruction(format!("{to}.reinterpret_{from}")));
            }
            let bits = stack.pop_bits(from)?;
            push_bits(stack, to, bits)?;
        }
    }
    Ok(())
}

fn pop_float(stack: &mut Stack, value_type: ValueType) -> Result<Float, RuntimeError> {
    let format = format_of(value_type)?;
    Ok(Float::decode(stack.pop_bits(value_type)?, format))
}

/// Inclusive integer range of a `bits` wide word
fn bounds(bits: u32, is_signed: bool) -> (i128, i128) {
    if is_signed {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    } else {
        (0, (1i128 << bits) - 1)
    }
}

/// Trapping truncation toward zero
pub fn truncate(value: &Float, bits: u32, is_signed: bool) -> Result<u64, RuntimeError> {
    if value.is_nan() {
        return Err(Trap::InvalidConversionToInteger.into());
    }
    let (min, max) = bounds(bits, is_signed);
    let integer = value
        .truncate()
        .and_then(|integer| integer.to_i128())
        .filter(|integer| (min..=max).contains(integer))
        .ok_or(Trap::IntegerOverflow)?;
    Ok(integer as u64 & mask(bits))
}

/// Saturating truncation: out of range values clamp, NaN becomes 0
pub fn truncate_saturating(value: &Float, bits: u32, is_signed: bool) -> u64 {
    let (min, max) = bounds(bits, is_signed);
    let integer = match value {
        Float::Nan { .. } => 0,
        Float::Infinite { sign } if sign.is_negative() => min,
        Float::Infinite { .. } => max,
        _ => match value.truncate().and_then(|integer| integer.to_i128()) {
            Some(integer) => integer.clamp(min, max),
            // beyond i128 entirely
            None if value.sign().is_negative() => min,
            None => max,
        },
    };
    integer as u64 & mask(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Instruction;
    use crate::runtime::test_utils::test::*;
    use rstest::rstest;

    fn single(value: f32) -> Float {
        Float::decode(value.to_bits() as u64, Format::SINGLE)
    }

    #[rstest]
    #[case(1.9, 32, true, 1)]
    #[case(-1.9, 32, true, 0xffff_ffff)]
    #[case(-0.9, 32, false, 0)]
    #[case(2147483520.0, 32, true, 0x7fff_ff80)]
    #[case(-2147483648.0, 32, true, 0x8000_0000)]
    #[case(4294967040.0, 32, false, 0xffff_ff00)]
    #[case(-9.0, 64, true, (-9i64) as u64)]
    fn trapping_truncation_in_range(#[case] value: f32, #[case] bits: u32, #[case] is_signed: bool, #[case] expected: u64) {
        assert_eq!(truncate(&single(value), bits, is_signed).unwrap(), expected);
    }

    #[rstest]
    #[case(2147483648.0, true)]
    #[case(-2147483904.0, true)]
    #[case(-1.0, false)]
    #[case(4294967296.0, false)]
    #[case(f32::INFINITY, true)]
    #[case(f32::NEG_INFINITY, false)]
    fn trapping_truncation_overflows(#[case] value: f32, #[case] is_signed: bool) {
        assert!(matches!(
            truncate(&single(value), 32, is_signed),
            Err(RuntimeError::Trap(Trap::IntegerOverflow))
        ));
    }

    #[test]
    fn trapping_truncation_of_nan() {
        assert!(matches!(
            truncate(&Float::NAN, 64, true),
            Err(RuntimeError::Trap(Trap::InvalidConversionToInteger))
        ));
    }

    #[rstest]
    #[case(f32::NAN, 32, true, 0)]
    #[case(f32::INFINITY, 32, true, 0x7fff_ffff)]
    #[case(f32::NEG_INFINITY, 32, true, 0x8000_0000)]
    #[case(-5.0, 32, false, 0)]
    #[case(1e10, 32, false, 0xffff_ffff)]
    #[case(1e30, 64, true, i64::MAX as u64)]
    #[case(-1e30, 64, true, i64::MIN as u64)]
    #[case(1e30, 64, false, u64::MAX)]
    #[case(-7.5, 64, true, (-7i64) as u64)]
    fn saturating_truncation(#[case] value: f32, #[case] bits: u32, #[case] is_signed: bool, #[case] expected: u64) {
        assert_eq!(truncate_saturating(&single(value), bits, is_signed), expected);
    }

    #[test]
    fn saturating_truncation_beyond_i128() {
        let huge = Float::decode(f64::MAX.to_bits(), Format::DOUBLE);
        assert_eq!(truncate_saturating(&huge, 64, false), u64::MAX);
        assert_eq!(truncate_saturating(&huge.negate(), 64, true), i64::MIN as u64);
    }

    fn run(conversion: Conversion, input: Instruction, result: ValueType) -> ExecutorTest {
        ExecutorTest::new()
            .inst(input)
            .inst(Instruction::Convert { conversion })
            .returns(vec![result])
    }

    #[test]
    fn integer_width_conversions() {
        run(Conversion::Wrap, i64_const(0x1_2345_6789), ValueType::I32).expect_stack(vec![Value::I32(0x2345_6789)]);
        run(Conversion::Extend { signed: true }, i32_const(-1), ValueType::I64).expect_stack(vec![Value::I64(u64::MAX)]);
        run(Conversion::Extend { signed: false }, i32_const(-1), ValueType::I64)
            .expect_stack(vec![Value::I64(0xffff_ffff)]);
    }

    #[test]
    fn integer_to_float_rounds_once() {
        // 2^24 + 1 is not representable in single precision and rounds to even
        run(
            Conversion::Convert {
                from: ValueType::I32,
                to: ValueType::F32,
                signed: true,
            },
            i32_const(16_777_217),
            ValueType::F32,
        )
        .expect_stack(vec![Value::F32(16_777_216f32.to_bits())]);
        run(
            Conversion::Convert {
                from: ValueType::I64,
                to: ValueType::F64,
                signed: false,
            },
            i64_const(-1),
            ValueType::F64,
        )
        .expect_stack(vec![Value::F64(18_446_744_073_709_551_616f64.to_bits())]);
        run(
            Conversion::Convert {
                from: ValueType::I32,
                to: ValueType::F64,
                signed: true,
            },
            i32_const(-3),
            ValueType::F64,
        )
        .expect_stack(vec![Value::F64((-3f64).to_bits())]);
    }

    #[test]
    fn float_width_conversions() {
        run(Conversion::Promote, f32_const("nan:0x200000"), ValueType::F64)
            .expect_stack(vec![Value::F64(0x7ff8_0000_0000_0000)]);
        run(Conversion::Demote, f64_const("-nan:0x1"), ValueType::F32).expect_stack(vec![Value::F32(0xffc0_0000)]);
        run(Conversion::Demote, f64_const("0x1.fffffffp+127"), ValueType::F32)
            .expect_stack(vec![Value::F32(f32::INFINITY.to_bits())]);
        run(Conversion::Promote, f32_const("0.1"), ValueType::F64).expect_stack(vec![Value::F64((0.1f32 as f64).to_bits())]);
    }

    #[test]
    fn reinterpretation() {
        run(
            Conversion::Reinterpret {
                from: ValueType::F32,
                to: ValueType::I32,
            },
            f32_const("-0.0"),
            ValueType::I32,
        )
        .expect_stack(vec![Value::I32(0x8000_0000)]);
        run(
            Conversion::Reinterpret {
                from: ValueType::I32,
                to: ValueType::I64,
            },
            i32_const(1),
            ValueType::I64,
        )
        .expect_error("reinterpret");
    }

    #[test]
    fn trunc_traps_through_the_interpreter() {
        run(
            Conversion::Trunc {
                from: ValueType::F64,
                to: ValueType::I32,
                signed: true,
            },
            f64_const("nan"),
            ValueType::I32,
        )
        .expect_trap(Trap::InvalidConversionToInteger);
        run(
            Conversion::Trunc {
                from: ValueType::F64,
                to: ValueType::I64,
                signed: false,
            },
            f64_const("-1.0"),
            ValueType::I64,
        )
        .expect_trap(Trap::IntegerOverflow);
    }
}
