//! The interpreter session
//!
//! An [`Interpreter`] owns every function and module instance created in a
//! session, the name registry used for imports and script actions, and the
//! operand and label stacks shared by all active calls.
//!
//! Execution is a recursive walk over the structured instruction tree. Each
//! construct pushes a label, runs its body and pops the label again; a branch
//! comes back up the recursion as a [`BlockEnd`] that every construct on the
//! way either consumes or passes on one level further out.
//!
//! Every call and labelled body checks the remaining native stack first and
//! continues on a fresh heap-allocated segment when it runs low, so the
//! configured call depth is reached on any thread instead of overflowing it.

use super::control::{BlockEnd, Label, LabelStack, LabelType};
use super::frame::Frame;
use super::instance::{ExternVal, FunctionInstance, GlobalInstance, ModuleInstance};
use super::memory::Memory;
use super::ops;
use super::stack::Stack;
use super::table::Table;
use super::{Config, FuncAddr, RuntimeError, Trap, Value};
use crate::ast::{BlockType, ExportDesc, Import, ImportDesc, Instruction, Limits, MemoryDef, Module, ValueType};
use log::{debug, trace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Native stack that must remain before entering another call or body
const RED_ZONE: usize = 256 * 1024;
/// Size of each additional native stack segment
const STACK_SEGMENT: usize = 4 * 1024 * 1024;

pub struct Interpreter {
    config: Config,
    /// Function space shared by all instances, indexed by [`FuncAddr`]
    functions: Vec<FunctionInstance>,
    instances: Vec<ModuleInstance>,
    /// Module names and registered aliases
    modules: HashMap<String, usize>,
    /// The most recently instantiated module, target of unnamed actions
    current: Option<usize>,
    stack: Stack,
    labels: LabelStack,
    call_depth: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Interpreter {
            config,
            functions: Vec::new(),
            instances: Vec::new(),
            modules: HashMap::new(),
            current: None,
            stack: Stack::new(),
            labels: LabelStack::new(),
            call_depth: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Add a function to the function space
    pub fn allocate_function(&mut self, function: FunctionInstance) -> FuncAddr {
        self.functions.push(function);
        FuncAddr(self.functions.len() - 1)
    }

    /// Add a ready-made instance, such as a host module, without making it
    /// the current module
    pub fn add_instance(&mut self, instance: ModuleInstance) -> usize {
        self.instances.push(instance);
        self.instances.len() - 1
    }

    pub fn function(&self, addr: FuncAddr) -> Result<&FunctionInstance, RuntimeError> {
        self.functions.get(addr.0).ok_or(RuntimeError::UnknownFuncAddr(addr.0))
    }

    fn instance(&self, index: usize) -> Result<&ModuleInstance, RuntimeError> {
        self.instances
            .get(index)
            .ok_or_else(|| RuntimeError::UnknownModule(format!("#{index}")))
    }

    /// Index of the named module, or of the current one
    pub fn resolve(&self, module: Option<&str>) -> Result<usize, RuntimeError> {
        match module {
            Some(name) => self
                .modules
                .get(name)
                .copied()
                .ok_or_else(|| RuntimeError::UnknownModule(name.to_string())),
            None => self
                .current
                .ok_or_else(|| RuntimeError::UnknownModule("no module instantiated".to_string())),
        }
    }

    /// Make a module's exports importable under `name`
    pub fn register(&mut self, module: Option<&str>, name: &str) -> Result<(), RuntimeError> {
        let index = self.resolve(module)?;
        debug!("registering module #{index} as {name:?}");
        self.modules.insert(name.to_string(), index);
        Ok(())
    }

    /// Register an already added instance under `name`
    pub fn register_instance(&mut self, index: usize, name: &str) -> Result<(), RuntimeError> {
        self.instance(index)?;
        self.modules.insert(name.to_string(), index);
        Ok(())
    }

    /// Instantiate `module` and make it the current module
    ///
    /// Imports are resolved by registered module name. Active element and
    /// data segments are applied after the instance is created, so writes
    /// made before a failing segment persist in shared tables and memories.
    pub fn instantiate(&mut self, module: &Module) -> Result<usize, RuntimeError> {
        let index = self.instances.len();
        let mut instance = ModuleInstance::new(module.name.clone());
        instance.types = module.types.clone();

        for import in &module.imports {
            self.link_import(&mut instance, module, import)?;
        }

        for function in &module.functions {
            let func_type = module
                .types
                .get(function.type_idx as usize)
                .ok_or(RuntimeError::UnknownType(function.type_idx))?
                .clone();
            let addr = self.allocate_function(FunctionInstance::Wasm {
                instance: index,
                func_type,
                code: Rc::new(function.clone()),
            });
            instance.functions.push(addr);
        }

        for table_type in &module.tables {
            instance.tables.push(Rc::new(RefCell::new(Table::new(*table_type))));
        }

        for memory in &module.memories {
            if instance.memory.is_some() {
                return Err(RuntimeError::InvalidModule("multiple memories".to_string()));
            }
            let memory = match memory {
                MemoryDef::Limits(limits) => Memory::from_limits(limits.min, limits.max)?,
                MemoryDef::Data(bytes) => Memory::from_data(bytes),
            };
            instance.memory = Some(Rc::new(RefCell::new(memory)));
        }

        for global in &module.globals {
            let value = evaluate_const(&instance, &global.init)?;
            if value.typ() != global.global_type.value_type {
                return Err(RuntimeError::TypeMismatch {
                    expected: global.global_type.value_type.to_string(),
                    actual: value.typ().to_string(),
                });
            }
            instance.globals.push(GlobalInstance::new(global.global_type, value));
        }

        for export in &module.exports {
            let external = match export.desc {
                ExportDesc::Func(idx) => ExternVal::Func(instance.function(idx)?),
                ExportDesc::Table(idx) => ExternVal::Table(instance.table(idx)?.clone()),
                ExportDesc::Memory(0) => ExternVal::Memory(instance.memory()?.clone()),
                ExportDesc::Memory(_) => return Err(RuntimeError::UnknownMemory),
                ExportDesc::Global(idx) => ExternVal::Global(instance.global(idx)?.clone()),
            };
            instance.exports.insert(export.name.clone(), external);
        }

        let mut elements = Vec::new();
        for segment in &module.elements {
            let Some(offset) = &segment.offset else { continue };
            let offset = evaluate_offset(&instance, offset)?;
            let values = segment
                .init
                .iter()
                .map(|&idx| instance.function(idx).map(|addr| Value::FuncRef(Some(addr))))
                .collect::<Result<Vec<_>, _>>()?;
            elements.push((instance.table(segment.table)?.clone(), offset, values));
        }

        let mut datas = Vec::new();
        for segment in &module.datas {
            let Some(offset) = &segment.offset else { continue };
            let offset = evaluate_offset(&instance, offset)?;
            datas.push((instance.memory()?.clone(), offset, &segment.bytes));
        }

        let start = module.start.map(|idx| instance.function(idx)).transpose()?;

        self.instances.push(instance);
        for (table, offset, values) in elements {
            table.borrow_mut().init(offset, &values)?;
        }
        for (memory, offset, bytes) in datas {
            memory.borrow_mut().write_bytes(offset as u64, bytes)?;
        }

        if let Some(name) = &module.name {
            self.modules.insert(name.clone(), index);
        }
        self.current = Some(index);
        debug!(
            "instantiated module #{index} {:?}: {} functions, {} exports",
            module.name,
            module.functions.len(),
            module.exports.len()
        );

        if let Some(addr) = start {
            debug!("running start function {}", addr.0);
            self.run(addr, &[])?;
        }
        Ok(index)
    }

    fn link_import(&self, instance: &mut ModuleInstance, module: &Module, import: &Import) -> Result<(), RuntimeError> {
        let unknown = || RuntimeError::UnknownImport {
            module: import.module.clone(),
            name: import.name.clone(),
        };
        let incompatible = || RuntimeError::IncompatibleImport {
            module: import.module.clone(),
            name: import.name.clone(),
        };
        let source = self.modules.get(&import.module).ok_or_else(unknown)?;
        let external = self.instance(*source)?.exports.get(&import.name).ok_or_else(unknown)?;

        match (&import.desc, external) {
            (ImportDesc::Func(type_idx), ExternVal::Func(addr)) => {
                let expected = module
                    .types
                    .get(*type_idx as usize)
                    .ok_or(RuntimeError::UnknownType(*type_idx))?;
                if self.function(*addr)?.func_type() != expected {
                    return Err(incompatible());
                }
                instance.functions.push(*addr);
            }
            (ImportDesc::Table(expected), ExternVal::Table(table)) => {
                let (ref_type, limits) = {
                    let table = table.borrow();
                    (table.ref_type(), table.limits())
                };
                if ref_type != expected.ref_type || !limits_match(limits, expected.limits) {
                    return Err(incompatible());
                }
                instance.tables.push(table.clone());
            }
            (ImportDesc::Memory(expected), ExternVal::Memory(memory)) => {
                if instance.memory.is_some() {
                    return Err(RuntimeError::InvalidModule("multiple memories".to_string()));
                }
                let limits = {
                    let memory = memory.borrow();
                    Limits {
                        min: memory.size(),
                        max: Some(memory.maximum()),
                    }
                };
                if !limits_match(limits, *expected) {
                    return Err(incompatible());
                }
                instance.memory = Some(memory.clone());
            }
            (ImportDesc::Global(expected), ExternVal::Global(global)) => {
                if global.global_type != *expected {
                    return Err(incompatible());
                }
                instance.globals.push(global.clone());
            }
            _ => return Err(incompatible()),
        }
        trace!("linked import {}.{}", import.module, import.name);
        Ok(())
    }

    /// Call an exported function with `args`
    pub fn invoke(&mut self, module: Option<&str>, name: &str, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        let index = self.resolve(module)?;
        let addr = match self.instance(index)?.export(name)? {
            ExternVal::Func(addr) => *addr,
            other => {
                return Err(RuntimeError::TypeMismatch {
                    expected: "function".to_string(),
                    actual: other.kind().to_string(),
                })
            }
        };
        debug!("invoke {name:?} on module #{index} with {args:?}");
        self.run(addr, args)
    }

    /// Read an exported global
    pub fn get_global(&self, module: Option<&str>, name: &str) -> Result<Value, RuntimeError> {
        let index = self.resolve(module)?;
        match self.instance(index)?.export(name)? {
            ExternVal::Global(global) => Ok(global.value.get()),
            other => Err(RuntimeError::TypeMismatch {
                expected: "global".to_string(),
                actual: other.kind().to_string(),
            }),
        }
    }

    /// Run a function from outside any wasm code. The stacks are restored to
    /// their previous heights whatever the outcome.
    fn run(&mut self, addr: FuncAddr, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        let func_type = self.function(addr)?.func_type().clone();
        if args.len() != func_type.params.len() {
            return Err(RuntimeError::ArgumentCount {
                expected: func_type.params.len(),
                actual: args.len(),
            });
        }
        for (arg, param) in args.iter().zip(&func_type.params) {
            if arg.typ() != *param {
                return Err(RuntimeError::TypeMismatch {
                    expected: param.to_string(),
                    actual: arg.typ().to_string(),
                });
            }
        }

        let (height, labels, depth) = (self.stack.depth(), self.labels.depth(), self.call_depth);
        self.stack.push_all(args.iter().copied());
        let result = self
            .call(addr)
            .and_then(|()| self.stack.pop_n(func_type.results.len()));
        self.stack.truncate(height);
        self.labels.truncate(labels);
        self.call_depth = depth;
        result
    }

    /// Call the function at `addr` with its arguments on the operand stack,
    /// leaving its results there
    fn call(&mut self, addr: FuncAddr) -> Result<(), RuntimeError> {
        match self.function(addr)?.clone() {
            FunctionInstance::Host {
                name,
                func_type,
                handler,
            } => {
                let args = self.stack.pop_n(func_type.params.len())?;
                trace!("call host function {name} {args:?}");
                let results = handler(&args)?;
                check_types(&func_type.results, &results)?;
                self.stack.push_all(results);
                Ok(())
            }
            FunctionInstance::Wasm {
                instance,
                func_type,
                code,
            } => {
                if self.call_depth >= self.config.max_call_depth {
                    return Err(Trap::CallStackExhausted.into());
                }
                let mut locals = self.stack.pop_n(func_type.params.len())?;
                check_types(&func_type.params, &locals)?;
                locals.extend(code.locals.iter().map(|&local| Value::default_for(local)));
                trace!("call function {} {:?}", addr.0, &locals[..func_type.params.len()]);

                let mut frame = Frame::new(instance, locals);
                let height = self.stack.depth();
                self.labels
                    .push(Label::new(LabelType::Function, height, 0, func_type.results.len()));
                self.call_depth += 1;
                let outcome = stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || self.execute(&mut frame, &code.body));
                self.call_depth -= 1;
                self.labels.pop();

                match outcome? {
                    BlockEnd::Normal | BlockEnd::Return | BlockEnd::Branch(0) => {}
                    BlockEnd::Branch(depth) => return Err(RuntimeError::InvalidLabel(depth)),
                }
                let results = self.stack.pop_n(func_type.results.len())?;
                check_types(&func_type.results, &results)?;
                self.stack.truncate(height);
                self.stack.push_all(results);
                Ok(())
            }
        }
    }

    /// Run a sequence of instructions until it ends or branches
    fn execute(&mut self, frame: &mut Frame, body: &[Instruction]) -> Result<BlockEnd, RuntimeError> {
        for instruction in body {
            match self.execute_instruction(frame, instruction)? {
                BlockEnd::Normal => continue,
                other => return Ok(other),
            }
        }
        Ok(BlockEnd::Normal)
    }

    /// Run a labelled body; the label is popped on every exit path
    fn execute_labelled(
        &mut self,
        frame: &mut Frame,
        label_type: LabelType,
        block_type: &BlockType,
        body: &[Instruction],
    ) -> Result<BlockEnd, RuntimeError> {
        let (params, results) = self.block_signature(frame.instance, block_type)?;
        let height = self
            .stack
            .depth()
            .checked_sub(params)
            .ok_or(RuntimeError::StackUnderflow)?;
        self.labels.push(Label::new(label_type, height, params, results));
        let outcome = stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, || self.execute(frame, body));
        self.labels.pop();
        outcome
    }

    /// Parameter and result arity of a block type
    fn block_signature(&self, instance: usize, block_type: &BlockType) -> Result<(usize, usize), RuntimeError> {
        match block_type {
            BlockType::Results(results) => Ok((0, results.len())),
            BlockType::Type(idx) => {
                let func_type = self.instance(instance)?.func_type(*idx)?;
                Ok((func_type.params.len(), func_type.results.len()))
            }
        }
    }

    fn execute_instruction(&mut self, frame: &mut Frame, instruction: &Instruction) -> Result<BlockEnd, RuntimeError> {
        match instruction {
            // control
            Instruction::Unreachable => ops::control::unreachable(),
            Instruction::Nop => Ok(BlockEnd::Normal),
            Instruction::Block { block_type, body } => {
                let outcome = self.execute_labelled(frame, LabelType::Block, block_type, body)?;
                Ok(outcome.leave())
            }
            Instruction::Loop { block_type, body } => loop {
                // a branch to the loop has already left its parameters in place
                match self.execute_labelled(frame, LabelType::Loop, block_type, body)? {
                    BlockEnd::Branch(0) => continue,
                    other => return Ok(other.leave()),
                }
            },
            Instruction::If {
                block_type,
                then,
                otherwise,
            } => {
                let arm = if self.stack.pop_i32()? != 0 { then } else { otherwise };
                let outcome = self.execute_labelled(frame, LabelType::If, block_type, arm)?;
                Ok(outcome.leave())
            }
            Instruction::Br { label } => ops::control::br(&mut self.stack, &self.labels, *label),
            Instruction::BrIf { label } => ops::control::br_if(&mut self.stack, &self.labels, *label),
            Instruction::BrTable { labels, default } => {
                ops::control::br_table(&mut self.stack, &self.labels, labels, *default)
            }
            Instruction::Return => Ok(BlockEnd::Return),
            Instruction::Call { func } => {
                let addr = self.instance(frame.instance)?.function(*func)?;
                self.call(addr)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::CallIndirect { type_idx, table } => {
                let addr = self.resolve_indirect(frame.instance, *type_idx, *table)?;
                self.call(addr)?;
                Ok(BlockEnd::Normal)
            }

            // reference
            Instruction::RefNull { ref_type } => {
                ops::parametric::ref_null(&mut self.stack, *ref_type);
                Ok(BlockEnd::Normal)
            }
            Instruction::RefIsNull => {
                ops::parametric::ref_is_null(&mut self.stack)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::RefFunc { func } => {
                let addr = self.instance(frame.instance)?.function(*func)?;
                ops::parametric::ref_func(&mut self.stack, addr);
                Ok(BlockEnd::Normal)
            }

            // parametric
            Instruction::Drop => {
                ops::parametric::drop(&mut self.stack)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::Select => {
                ops::parametric::select(&mut self.stack)?;
                Ok(BlockEnd::Normal)
            }

            // variable
            Instruction::LocalGet { local } => {
                ops::variable::local_get(&mut self.stack, frame, *local)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::LocalSet { local } => {
                ops::variable::local_set(&mut self.stack, frame, *local)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::LocalTee { local } => {
                ops::variable::local_tee(&mut self.stack, frame, *local)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::GlobalGet { global } => {
                let cell = self.instance(frame.instance)?.global(*global)?.clone();
                ops::variable::global_get(&mut self.stack, &cell)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::GlobalSet { global } => {
                let cell = self.instance(frame.instance)?.global(*global)?.clone();
                ops::variable::global_set(&mut self.stack, &cell, *global)?;
                Ok(BlockEnd::Normal)
            }

            // memory
            Instruction::Load {
                value_type,
                memarg,
                packed,
            } => {
                let memory = self.instance(frame.instance)?.memory()?.clone();
                ops::memory::load(&mut self.stack, &memory.borrow(), *value_type, *memarg, *packed)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::Store {
                value_type,
                memarg,
                bits,
            } => {
                let memory = self.instance(frame.instance)?.memory()?.clone();
                ops::memory::store(&mut self.stack, &mut memory.borrow_mut(), *value_type, *memarg, *bits)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::MemorySize => {
                let memory = self.instance(frame.instance)?.memory()?.clone();
                ops::memory::size(&mut self.stack, &memory.borrow())?;
                Ok(BlockEnd::Normal)
            }
            Instruction::MemoryGrow => {
                let memory = self.instance(frame.instance)?.memory()?.clone();
                ops::memory::grow(&mut self.stack, &mut memory.borrow_mut())?;
                Ok(BlockEnd::Normal)
            }

            // numeric
            Instruction::Const(constant) => {
                ops::numeric::constant(&mut self.stack, constant)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::Eqz { value_type } => {
                ops::numeric::eqz(&mut self.stack, *value_type)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::Unary { value_type, kind } => {
                ops::numeric::unary(&mut self.stack, *value_type, *kind)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::Binary { value_type, kind } => {
                ops::numeric::binary(&mut self.stack, *value_type, *kind)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::Compare { value_type, kind } => {
                ops::comparison::compare(&mut self.stack, *value_type, *kind)?;
                Ok(BlockEnd::Normal)
            }
            Instruction::Convert { conversion } => {
                ops::conversion::convert(&mut self.stack, *conversion)?;
                Ok(BlockEnd::Normal)
            }
        }
    }

    /// Pop the table index of a `call_indirect` and find its callee
    fn resolve_indirect(&mut self, instance: usize, type_idx: u32, table: u32) -> Result<FuncAddr, RuntimeError> {
        let index = self.stack.pop_i32()?;
        let instance = self.instance(instance)?;
        let expected = instance.func_type(type_idx)?;
        let element = {
            let table = instance.table(table)?.borrow();
            if index >= table.size() {
                return Err(Trap::UndefinedElement.into());
            }
            table.get(index)?
        };
        let addr = match element {
            Value::FuncRef(Some(addr)) => addr,
            Value::FuncRef(None) => return Err(Trap::UninitializedElement.into()),
            other => {
                return Err(RuntimeError::TypeMismatch {
                    expected: "funcref".to_string(),
                    actual: other.typ().to_string(),
                })
            }
        };
        if self.function(addr)?.func_type() != expected {
            return Err(Trap::IndirectCallTypeMismatch.into());
        }
        Ok(addr)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn check_types(expected: &[ValueType], values: &[Value]) -> Result<(), RuntimeError> {
    for (value_type, value) in expected.iter().zip(values) {
        if value.typ() != *value_type {
            return Err(RuntimeError::TypeMismatch {
                expected: value_type.to_string(),
                actual: value.typ().to_string(),
            });
        }
    }
    if expected.len() != values.len() {
        return Err(RuntimeError::ArgumentCount {
            expected: expected.len(),
            actual: values.len(),
        });
    }
    Ok(())
}

/// Import limits match when the provided entity is at least as large as
/// required and its maximum is no larger than any declared maximum
fn limits_match(actual: Limits, expected: Limits) -> bool {
    actual.min >= expected.min
        && match expected.max {
            None => true,
            Some(max) => actual.max.is_some_and(|actual| actual <= max),
        }
}

/// Evaluate a constant expression (global initializer or segment offset)
fn evaluate_const(instance: &ModuleInstance, expr: &[Instruction]) -> Result<Value, RuntimeError> {
    let mut stack = Stack::new();
    for instruction in expr {
        match instruction {
            Instruction::Const(constant) => ops::numeric::constant(&mut stack, constant)?,
            Instruction::GlobalGet { global } => stack.push(instance.global(*global)?.value.get()),
            Instruction::RefNull { ref_type } => ops::parametric::ref_null(&mut stack, *ref_type),
            Instruction::RefFunc { func } => ops::parametric::ref_func(&mut stack, instance.function(*func)?),
            other => {
                return Err(RuntimeError::InvalidModule(format!(
                    "non-constant instruction in initializer: {other:?}"
                )))
            }
        }
    }
    let value = stack.pop()?;
    if !stack.is_empty() {
        return Err(RuntimeError::InvalidModule("initializer leaves extra values".to_string()));
    }
    Ok(value)
}

fn evaluate_offset(instance: &ModuleInstance, expr: &[Instruction]) -> Result<u32, RuntimeError> {
    match evaluate_const(instance, expr)? {
        Value::I32(offset) => Ok(offset),
        other => Err(RuntimeError::TypeMismatch {
            expected: "i32".to_string(),
            actual: other.typ().to_string(),
        }),
    }
}
