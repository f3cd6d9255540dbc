//! Resolved abstract syntax tree consumed by the interpreter
//!
//! Every symbolic name has already been resolved into a numeric index by the
//! time a tree reaches this crate. The types derive `serde` so a resolved
//! module can be loaded from JSON alongside the script that drives it.

pub mod instruction;
pub mod module;

pub use instruction::{BinaryOp, CompareOp, Constant, Conversion, Instruction, MemArg, PackedLoad, UnaryOp};
pub use module::{
    DataSegment, ElementSegment, Export, ExportDesc, Function, FunctionType, Global, GlobalType, Import, ImportDesc,
    Limits, MemoryDef, Module, TableType,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Types of values that live on the operand stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    I32,
    I64,
    F32,
    F64,
    FuncRef,
    ExternRef,
}

impl ValueType {
    /// Width in bits of numeric types
    pub fn bits(&self) -> Option<u32> {
        match self {
            ValueType::I32 | ValueType::F32 => Some(32),
            ValueType::I64 | ValueType::F64 => Some(64),
            ValueType::FuncRef | ValueType::ExternRef => None,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ValueType::F32 | ValueType::F64)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::FuncRef => "funcref",
            ValueType::ExternRef => "externref",
        };
        f.write_str(name)
    }
}

/// Reference types held by tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefType {
    FuncRef,
    ExternRef,
}

impl From<RefType> for ValueType {
    fn from(ref_type: RefType) -> Self {
        match ref_type {
            RefType::FuncRef => ValueType::FuncRef,
            RefType::ExternRef => ValueType::ExternRef,
        }
    }
}

/// Declared type of a `block`, `loop` or `if`
///
/// Either an inline list of results (no parameters) or an index into the
/// module's type section, which supplies both parameters and results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockType {
    Results(Vec<ValueType>),
    Type(u32),
}

impl Default for BlockType {
    fn default() -> Self {
        BlockType::Results(Vec::new())
    }
}
