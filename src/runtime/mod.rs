//! WebAssembly runtime
//!
//! The interpreter session, its operand and label stacks, linear memory,
//! tables and the per-instruction semantics in [`ops`].

pub mod config;
pub mod control;
pub mod frame;
pub mod instance;
pub mod interpreter;
pub mod memory;
pub mod ops;
pub mod stack;
pub mod table;
#[cfg(test)]
pub mod test_utils;
pub mod value;

pub use config::Config;
pub use instance::{
    ExternVal, FunctionInstance, GlobalInstance, HostFunc, ModuleInstance, SharedGlobal, SharedMemory, SharedTable,
};
pub use interpreter::Interpreter;
pub use memory::Memory;
pub use table::Table;
pub use value::Value;

use crate::numeric::LiteralError;

/// Address of a function in the interpreter's function space
///
/// Addresses are unique across module instances, so function references
/// stay meaningful when they cross module boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FuncAddr(pub usize);

/// Defined failure outcomes of execution. The messages match the ones
/// conformance scripts expect from `assert_trap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Trap {
    #[error("unreachable")]
    Unreachable,
    #[error("integer divide by zero")]
    IntegerDivideByZero,
    #[error("integer overflow")]
    IntegerOverflow,
    #[error("invalid conversion to integer")]
    InvalidConversionToInteger,
    #[error("out of bounds memory access")]
    MemoryOutOfBounds,
    #[error("out of bounds table access")]
    TableOutOfBounds,
    #[error("undefined element")]
    UndefinedElement,
    #[error("uninitialized element")]
    UninitializedElement,
    #[error("indirect call type mismatch")]
    IndirectCallTypeMismatch,
    #[error("call stack exhausted")]
    CallStackExhausted,
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Trap(#[from] Trap),
    #[error(transparent)]
    Literal(#[from] LiteralError),
    #[error("Stack underflow")]
    StackUnderflow,
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
    #[error("Invalid label: {0}")]
    InvalidLabel(u32),
    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),
    #[error("Invalid module: {0}")]
    InvalidModule(String),
    #[error("Unknown module: {0}")]
    UnknownModule(String),
    #[error("Unknown export: {0}")]
    UnknownExport(String),
    #[error("Unknown import: {module}.{name}")]
    UnknownImport { module: String, name: String },
    #[error("Incompatible import type for {module}.{name}")]
    IncompatibleImport { module: String, name: String },
    #[error("Unknown function: {0}")]
    UnknownFunction(u32),
    #[error("Unknown function address: {0}")]
    UnknownFuncAddr(usize),
    #[error("Unknown type: {0}")]
    UnknownType(u32),
    #[error("Unknown local: {0}")]
    UnknownLocal(u32),
    #[error("Unknown global: {0}")]
    UnknownGlobal(u32),
    #[error("Cannot set immutable global: {0}")]
    ImmutableGlobal(u32),
    #[error("Unknown table: {0}")]
    UnknownTable(u32),
    #[error("Unknown memory")]
    UnknownMemory,
    #[error("Expected {expected} arguments, got {actual}")]
    ArgumentCount { expected: usize, actual: usize },
}

impl RuntimeError {
    /// The trap behind this error, if execution trapped
    pub fn trap(&self) -> Option<Trap> {
        match self {
            RuntimeError::Trap(trap) => Some(*trap),
            _ => None,
        }
    }
}
