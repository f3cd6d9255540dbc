//! Module instances and the entities they own or import

use super::{FuncAddr, Memory, RuntimeError, Table, Value};
use crate::ast::{Function, FunctionType, GlobalType};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Global cell shared between an exporting and importing instance.
/// `Value` is `Copy`, so a `Cell` is enough.
pub type SharedGlobal = Rc<Cell<Value>>;

/// Memory shared between an exporting and importing instance
pub type SharedMemory = Rc<RefCell<Memory>>;

/// Table shared between an exporting and importing instance
pub type SharedTable = Rc<RefCell<Table>>;

/// Native implementation of a host function
pub type HostFunc = Rc<dyn Fn(&[Value]) -> Result<Vec<Value>, RuntimeError>>;

/// A global together with its declared type
#[derive(Debug, Clone)]
pub struct GlobalInstance {
    pub global_type: GlobalType,
    pub value: SharedGlobal,
}

impl GlobalInstance {
    pub fn new(global_type: GlobalType, value: Value) -> Self {
        GlobalInstance {
            global_type,
            value: Rc::new(Cell::new(value)),
        }
    }
}

/// A function in the interpreter's function space
#[derive(Clone)]
pub enum FunctionInstance {
    Wasm {
        /// Index of the defining instance
        instance: usize,
        func_type: FunctionType,
        code: Rc<Function>,
    },
    Host {
        name: String,
        func_type: FunctionType,
        handler: HostFunc,
    },
}

impl FunctionInstance {
    pub fn func_type(&self) -> &FunctionType {
        match self {
            FunctionInstance::Wasm { func_type, .. } | FunctionInstance::Host { func_type, .. } => func_type,
        }
    }
}

impl fmt::Debug for FunctionInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionInstance::Wasm { instance, func_type, .. } => f
                .debug_struct("Wasm")
                .field("instance", instance)
                .field("func_type", func_type)
                .finish(),
            FunctionInstance::Host { name, func_type, .. } => f
                .debug_struct("Host")
                .field("name", name)
                .field("func_type", func_type)
                .finish(),
        }
    }
}

/// An exported (or importable) entity
#[derive(Debug, Clone)]
pub enum ExternVal {
    Func(FuncAddr),
    Table(SharedTable),
    Memory(SharedMemory),
    Global(GlobalInstance),
}

impl ExternVal {
    pub fn kind(&self) -> &'static str {
        match self {
            ExternVal::Func(_) => "function",
            ExternVal::Table(_) => "table",
            ExternVal::Memory(_) => "memory",
            ExternVal::Global(_) => "global",
        }
    }
}

/// Runtime representation of an instantiated module
#[derive(Debug, Default)]
pub struct ModuleInstance {
    pub name: Option<String>,
    pub types: Vec<FunctionType>,
    pub functions: Vec<FuncAddr>,
    pub tables: Vec<SharedTable>,
    pub memory: Option<SharedMemory>,
    pub globals: Vec<GlobalInstance>,
    pub exports: HashMap<String, ExternVal>,
}

impl ModuleInstance {
    pub fn new(name: Option<String>) -> Self {
        ModuleInstance {
            name,
            ..Default::default()
        }
    }

    pub fn export(&self, name: &str) -> Result<&ExternVal, RuntimeError> {
        self.exports
            .get(name)
            .ok_or_else(|| RuntimeError::UnknownExport(name.to_string()))
    }

    pub fn func_type(&self, index: u32) -> Result<&FunctionType, RuntimeError> {
        self.types.get(index as usize).ok_or(RuntimeError::UnknownType(index))
    }

    pub fn function(&self, index: u32) -> Result<FuncAddr, RuntimeError> {
        self.functions
            .get(index as usize)
            .copied()
            .ok_or(RuntimeError::UnknownFunction(index))
    }

    pub fn global(&self, index: u32) -> Result<&GlobalInstance, RuntimeError> {
        self.globals.get(index as usize).ok_or(RuntimeError::UnknownGlobal(index))
    }

    pub fn table(&self, index: u32) -> Result<&SharedTable, RuntimeError> {
        self.tables.get(index as usize).ok_or(RuntimeError::UnknownTable(index))
    }

    pub fn memory(&self) -> Result<&SharedMemory, RuntimeError> {
        self.memory.as_ref().ok_or(RuntimeError::UnknownMemory)
    }
}
