//! Value conversion and comparison for script execution
//!
//! Arguments and expectations are parsed with the same literal grammars the
//! interpreter uses for `const` instructions. Results compare bit-exactly,
//! except for NaN expectations, which accept any NaN of the right type.

use super::command::{Const, Expected};
use crate::ast::ValueType;
use crate::numeric::LiteralError;
use crate::runtime::Value;
use std::fmt;

impl Const {
    pub fn to_value(&self) -> Result<Value, LiteralError> {
        Value::parse(self.value_type, &self.value)
    }
}

/// An expectation with its literal already parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedValue {
    Exact(Value),
    Nan(ValueType),
}

impl Expected {
    pub fn resolve(&self) -> Result<ExpectedValue, LiteralError> {
        match self {
            Expected::Const(constant) => Ok(ExpectedValue::Exact(constant.to_value()?)),
            Expected::Nan { value_type } => Ok(ExpectedValue::Nan(*value_type)),
        }
    }
}

impl ExpectedValue {
    /// Check whether a runtime value matches, describing the mismatch if not
    pub fn matches(&self, actual: &Value) -> Result<(), String> {
        match self {
            ExpectedValue::Exact(expected) if expected == actual => Ok(()),
            ExpectedValue::Nan(value_type)
                if actual.typ() == *value_type && actual.as_float().is_some_and(|value| value.is_nan()) =>
            {
                Ok(())
            }
            _ => Err(format!("expected {self}, got {actual}")),
        }
    }
}

impl fmt::Display for ExpectedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpectedValue::Exact(value) => value.fmt(f),
            ExpectedValue::Nan(value_type) => write!(f, "{value_type}:nan"),
        }
    }
}

/// Convert script constants to runtime values (for function arguments)
pub fn convert_args(args: &[Const]) -> Result<Vec<Value>, LiteralError> {
    args.iter().map(Const::to_value).collect()
}

/// Parse every expectation of an `assert_return`
pub fn convert_expected(expected: &[Expected]) -> Result<Vec<ExpectedValue>, LiteralError> {
    expected.iter().map(Expected::resolve).collect()
}

/// Compare runtime results against expectations
///
/// Returns `Err(description)` for the first mismatch.
pub fn match_results(results: &[Value], expected: &[ExpectedValue]) -> Result<(), String> {
    if results.len() != expected.len() {
        return Err(format!(
            "result count mismatch: expected {}, got {}",
            expected.len(),
            results.len()
        ));
    }
    for (i, (result, exp)) in results.iter().zip(expected).enumerate() {
        exp.matches(result).map_err(|e| format!("result {i}: {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn expect(value_type: ValueType, value: &str) -> ExpectedValue {
        Expected::from(Const::new(value_type, value)).resolve().unwrap()
    }

    #[test]
    fn arguments_parse_as_literals() {
        let args = convert_args(&[
            Const::new(ValueType::I32, "-1"),
            Const::new(ValueType::I64, "0x8000_0000_0000_0000"),
            Const::new(ValueType::F32, "0x1p-149"),
            Const::new(ValueType::ExternRef, "null"),
        ])
        .unwrap();
        assert_eq!(
            args,
            vec![
                Value::I32(u32::MAX),
                Value::I64(1 << 63),
                Value::F32(1),
                Value::ExternRef(None)
            ]
        );
    }

    #[test]
    fn malformed_arguments_fail() {
        assert!(convert_args(&[Const::new(ValueType::I32, "0x1_0000_0000")]).is_err());
    }

    #[rstest]
    #[case(ValueType::I32, "5", Value::I32(5), true)]
    #[case(ValueType::I32, "5", Value::I64(5), false)]
    #[case(ValueType::F64, "-0.0", Value::F64(0), false)]
    #[case(ValueType::F64, "-0.0", Value::F64(1 << 63), true)]
    #[case(ValueType::F32, "nan:0x400000", Value::F32(0x7fc0_0000), true)]
    #[case(ValueType::F32, "nan:0x400000", Value::F32(0xffc0_0000), false)]
    #[case(ValueType::F32, "nan:canonical", Value::F32(0xffc0_0000), true)]
    #[case(ValueType::F32, "nan:arithmetic", Value::F32(0x7f80_0001), true)]
    #[case(ValueType::F32, "nan:canonical", Value::F32(0x7f80_0000), false)]
    #[case(ValueType::F64, "nan:canonical", Value::F32(0x7fc0_0000), false)]
    fn expectations(#[case] value_type: ValueType, #[case] text: &str, #[case] actual: Value, #[case] matches: bool) {
        assert_eq!(expect(value_type, text).matches(&actual).is_ok(), matches);
    }

    #[test]
    fn result_counts_must_agree() {
        let expected = vec![expect(ValueType::I32, "1")];
        assert!(match_results(&[Value::I32(1)], &expected).is_ok());
        assert_eq!(
            match_results(&[], &expected).unwrap_err(),
            "result count mismatch: expected 1, got 0"
        );
        assert_eq!(
            match_results(&[Value::I32(2)], &expected).unwrap_err(),
            "result 0: expected i32:1, got i32:2"
        );
    }
}
