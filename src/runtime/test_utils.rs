//! Test utilities for runtime testing
//!
//! A fluent builder that wraps an instruction sequence in a single exported
//! function, instantiates it in a fresh interpreter and checks the outcome.

#[cfg(test)]
pub mod test {
    use crate::ast::{BinaryOp, FunctionType, Instruction, Limits, MemoryDef, Module, UnaryOp, ValueType};
    use crate::runtime::{Interpreter, RuntimeError, Trap, Value};

    /// Test builder for creating interpreter tests fluently
    pub struct ExecutorTest {
        module: Module,
        body: Vec<Instruction>,
        args: Vec<Value>,
        locals: Vec<ValueType>,
        return_types: Vec<ValueType>,
    }

    impl ExecutorTest {
        pub fn new() -> Self {
            ExecutorTest {
                module: Module::default(),
                body: Vec::new(),
                args: Vec::new(),
                locals: Vec::new(),
                return_types: Vec::new(),
            }
        }

        /// Give the module one page of memory
        pub fn with_memory(self) -> Self {
            self.with_memory_limits(1, None)
        }

        pub fn with_memory_limits(mut self, min: u32, max: Option<u32>) -> Self {
            self.module.memories = vec![MemoryDef::Limits(Limits { min, max })];
            self
        }

        /// Give the module a memory initialised with `bytes`
        pub fn with_data(mut self, bytes: &[u8]) -> Self {
            self.module.memories = vec![MemoryDef::Data(bytes.to_vec())];
            self
        }

        /// Register a type for `BlockType::Type` or `call_indirect`
        pub fn intern_type(&mut self, func_type: FunctionType) -> u32 {
            self.module.intern_type(func_type)
        }

        /// Adjust the surrounding module before the test function is added
        pub fn module(mut self, configure: impl FnOnce(&mut Module)) -> Self {
            configure(&mut self.module);
            self
        }

        pub fn inst(mut self, instruction: Instruction) -> Self {
            self.body.push(instruction);
            self
        }

        pub fn insts(mut self, instructions: impl IntoIterator<Item = Instruction>) -> Self {
            self.body.extend(instructions);
            self
        }

        /// Add a parameter of the argument's type and pass the argument
        pub fn arg(mut self, value: Value) -> Self {
            self.args.push(value);
            self
        }

        pub fn local(mut self, value_type: ValueType) -> Self {
            self.locals.push(value_type);
            self
        }

        pub fn returns(mut self, types: Vec<ValueType>) -> Self {
            self.return_types = types;
            self
        }

        pub fn run(self) -> Result<Vec<Value>, RuntimeError> {
            let ExecutorTest {
                mut module,
                body,
                args,
                locals,
                return_types,
            } = self;
            let params = args.iter().map(Value::typ).collect();
            module.export_function("test", FunctionType::new(params, return_types), body);
            if let Some(function) = module.functions.last_mut() {
                function.locals = locals;
            }
            let mut interpreter = Interpreter::new();
            interpreter.instantiate(&module)?;
            interpreter.invoke(None, "test", &args)
        }

        pub fn expect_stack(self, expected: Vec<Value>) {
            let results = self.run().expect("Execution should succeed");
            assert_eq!(results, expected);
        }

        pub fn expect_error(self, error_contains: &str) {
            match self.run() {
                Err(e) => {
                    let error_string = e.to_string();
                    assert!(
                        error_string.contains(error_contains),
                        "Expected error containing '{}', got: '{}'",
                        error_contains,
                        error_string
                    );
                }
                Ok(results) => panic!(
                    "Expected error containing '{}', but execution returned {:?}",
                    error_contains, results
                ),
            }
        }

        pub fn expect_trap(self, trap: Trap) {
            match self.run() {
                Err(e) => assert_eq!(e.trap(), Some(trap), "unexpected error: {e}"),
                Ok(results) => panic!("Expected trap '{trap}', but execution returned {results:?}"),
            }
        }
    }

    pub fn i32_const(value: i32) -> Instruction {
        Instruction::constant(ValueType::I32, value.to_string()).unwrap()
    }

    pub fn i64_const(value: i64) -> Instruction {
        Instruction::constant(ValueType::I64, value.to_string()).unwrap()
    }

    pub fn f32_const(text: &str) -> Instruction {
        Instruction::constant(ValueType::F32, text).unwrap()
    }

    pub fn f64_const(text: &str) -> Instruction {
        Instruction::constant(ValueType::F64, text).unwrap()
    }

    pub fn unary(value_type: ValueType, kind: UnaryOp) -> Instruction {
        Instruction::Unary { value_type, kind }
    }

    pub fn binary(value_type: ValueType, kind: BinaryOp) -> Instruction {
        Instruction::Binary { value_type, kind }
    }
}
