//! A WebAssembly reference interpreter with exact floating point arithmetic.
//!
//! wastref executes resolved WebAssembly modules and the conformance scripts
//! that drive them. Floating point values are modelled exactly, as big
//! rationals, and are only rounded when they are encoded into a binary32 or
//! binary64 bit pattern.
//!
//! # Modules
//!
//! - [`numeric`] -- Exact float model, IEEE 754 formats and literal parsing.
//! - [`ast`] -- Resolved module and instruction tree, loadable from JSON.
//! - [`runtime`] -- Interpreter, linear memory, tables and instruction semantics.
//! - [`wast`] -- Conformance script commands, the spectest host module and the runner.
//!
//! # Example
//!
//! Build a module, instantiate it, and call an exported function:
//!
//! ```
//! use wastref::ast::{BinaryOp, FunctionType, Instruction, Module, ValueType};
//! use wastref::runtime::{Interpreter, Value};
//!
//! let mut module = Module::default();
//! module.export_function(
//!     "add",
//!     FunctionType::new(vec![ValueType::I32, ValueType::I32], vec![ValueType::I32]),
//!     vec![
//!         Instruction::LocalGet { local: 0 },
//!         Instruction::LocalGet { local: 1 },
//!         Instruction::Binary { value_type: ValueType::I32, kind: BinaryOp::Add },
//!     ],
//! );
//!
//! let mut interpreter = Interpreter::new();
//! interpreter.instantiate(&module).unwrap();
//! let results = interpreter.invoke(None, "add", &[Value::I32(2), Value::I32(3)]).unwrap();
//! assert_eq!(results, vec![Value::I32(5)]);
//! ```

pub mod ast;
pub mod numeric;
pub mod runtime;
pub mod wast;
