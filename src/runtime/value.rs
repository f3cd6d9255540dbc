//! WebAssembly value representation
//!
//! Numbers are held as raw fixed-width bit patterns. Floats are only decoded
//! inside the instruction handlers that need them.

use super::FuncAddr;
use crate::ast::{Constant, ValueType};
use crate::numeric::{parse_int, Float, Format, LiteralError};
use fhex::ToHex;
use std::fmt;

/// Runtime representation of WebAssembly values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    I32(u32),
    I64(u64),
    /// Encoded binary32 bits
    F32(u32),
    /// Encoded binary64 bits
    F64(u64),
    FuncRef(Option<FuncAddr>),
    ExternRef(Option<u32>),
}

impl Value {
    /// Get the WebAssembly type of this value
    pub fn typ(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::FuncRef(_) => ValueType::FuncRef,
            Value::ExternRef(_) => ValueType::ExternRef,
        }
    }

    /// Zero value a local of type `value_type` starts with
    pub fn default_for(value_type: ValueType) -> Self {
        match value_type {
            ValueType::I32 => Value::I32(0),
            ValueType::I64 => Value::I64(0),
            ValueType::F32 => Value::F32(0),
            ValueType::F64 => Value::F64(0),
            ValueType::FuncRef => Value::FuncRef(None),
            ValueType::ExternRef => Value::ExternRef(None),
        }
    }

    /// Build a value of `value_type` from raw bits, truncating to the width
    pub fn from_bits(value_type: ValueType, bits: u64) -> Option<Self> {
        match value_type {
            ValueType::I32 => Some(Value::I32(bits as u32)),
            ValueType::I64 => Some(Value::I64(bits)),
            ValueType::F32 => Some(Value::F32(bits as u32)),
            ValueType::F64 => Some(Value::F64(bits)),
            ValueType::FuncRef | ValueType::ExternRef => None,
        }
    }

    /// Raw bits of a numeric value
    pub fn bits(&self) -> Option<u64> {
        match self {
            Value::I32(v) | Value::F32(v) => Some(*v as u64),
            Value::I64(v) | Value::F64(v) => Some(*v),
            Value::FuncRef(_) | Value::ExternRef(_) => None,
        }
    }

    /// Parse a literal of the given type. Integers accept signed and
    /// unsigned spellings, floats go through the exact encoder, references
    /// accept `null` (and an integer host handle for `externref`).
    pub fn parse(value_type: ValueType, text: &str) -> Result<Self, LiteralError> {
        match value_type {
            ValueType::I32 => Ok(Value::I32(Constant::parse(value_type, text)?.bits() as u32)),
            ValueType::I64 => Ok(Value::I64(Constant::parse(value_type, text)?.bits())),
            ValueType::F32 => Ok(Value::F32(Constant::parse(value_type, text)?.bits() as u32)),
            ValueType::F64 => Ok(Value::F64(Constant::parse(value_type, text)?.bits())),
            ValueType::FuncRef if text == "null" => Ok(Value::FuncRef(None)),
            ValueType::FuncRef => Err(LiteralError::MalformedInteger(text.to_string())),
            ValueType::ExternRef if text == "null" => Ok(Value::ExternRef(None)),
            ValueType::ExternRef => Ok(Value::ExternRef(Some(parse_int(text, 32)? as u32))),
        }
    }

    /// Decode a float value; `None` for other types
    pub fn as_float(&self) -> Option<Float> {
        match self {
            Value::F32(bits) => Some(Float::decode(*bits as u64, Format::SINGLE)),
            Value::F64(bits) => Some(Float::decode(*bits, Format::DOUBLE)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> Option<bool> {
        match self {
            Value::FuncRef(r) => Some(r.is_none()),
            Value::ExternRef(r) => Some(r.is_none()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "i32:{v}"),
            Value::I64(v) => write!(f, "i64:{v}"),
            Value::F32(v) => write!(f, "f32:{}", f32::from_bits(*v).to_hex()),
            Value::F64(v) => write!(f, "f64:{}", f64::from_bits(*v).to_hex()),
            Value::FuncRef(Some(addr)) => write!(f, "funcref:{}", addr.0),
            Value::ExternRef(Some(handle)) => write!(f, "externref:{handle}"),
            Value::FuncRef(None) => write!(f, "funcref:null"),
            Value::ExternRef(None) => write!(f, "externref:null"),
        }
    }
}
