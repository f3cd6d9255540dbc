//! Module definitions
//!
//! Index spaces follow the usual convention: imported entities come first,
//! in import order, followed by the module's own definitions.

use super::{Instruction, RefType, ValueType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionType {
    #[serde(default)]
    pub params: Vec<ValueType>,
    #[serde(default)]
    pub results: Vec<ValueType>,
}

impl FunctionType {
    pub fn new(params: Vec<ValueType>, results: Vec<ValueType>) -> Self {
        FunctionType { params, results }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub min: u32,
    #[serde(default)]
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableType {
    pub ref_type: RefType,
    pub limits: Limits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalType {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub mutable: bool,
}

/// A memory declared either by page limits or by its initial contents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryDef {
    Limits(Limits),
    Data(#[serde(with = "hex")] Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    #[serde(rename = "type")]
    pub type_idx: u32,
    /// Declared locals, not including parameters
    #[serde(default)]
    pub locals: Vec<ValueType>,
    #[serde(default)]
    pub body: Vec<Instruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Global {
    #[serde(flatten)]
    pub global_type: GlobalType,
    pub init: Vec<Instruction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportDesc {
    Func(u32),
    Table(TableType),
    Memory(Limits),
    Global(GlobalType),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    pub module: String,
    pub name: String,
    pub desc: ImportDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportDesc {
    Func(u32),
    Table(u32),
    Memory(u32),
    Global(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Export {
    pub name: String,
    pub desc: ExportDesc,
}

/// Function references copied into a table. Segments without an offset are
/// passive and are not applied at instantiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSegment {
    #[serde(default)]
    pub table: u32,
    #[serde(default)]
    pub offset: Option<Vec<Instruction>>,
    pub init: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSegment {
    #[serde(default)]
    pub memory: u32,
    #[serde(default)]
    pub offset: Option<Vec<Instruction>>,
    #[serde(with = "hex")]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub types: Vec<FunctionType>,
    #[serde(default)]
    pub imports: Vec<Import>,
    #[serde(default)]
    pub functions: Vec<Function>,
    #[serde(default)]
    pub tables: Vec<TableType>,
    #[serde(default)]
    pub memories: Vec<MemoryDef>,
    #[serde(default)]
    pub globals: Vec<Global>,
    #[serde(default)]
    pub exports: Vec<Export>,
    #[serde(default)]
    pub elements: Vec<ElementSegment>,
    #[serde(default)]
    pub datas: Vec<DataSegment>,
    #[serde(default)]
    pub start: Option<u32>,
}

impl Module {
    /// Index of `func_type` in the type section, appending it if absent
    pub fn intern_type(&mut self, func_type: FunctionType) -> u32 {
        match self.types.iter().position(|existing| *existing == func_type) {
            Some(index) => index as u32,
            None => {
                self.types.push(func_type);
                (self.types.len() - 1) as u32
            }
        }
    }

    /// Add a function and export it under `name`, returning its index
    pub fn export_function(&mut self, name: &str, func_type: FunctionType, body: Vec<Instruction>) -> u32 {
        let type_idx = self.intern_type(func_type);
        let imported = self
            .imports
            .iter()
            .filter(|import| matches!(import.desc, ImportDesc::Func(_)))
            .count();
        self.functions.push(Function {
            type_idx,
            locals: Vec::new(),
            body,
        });
        let index = (imported + self.functions.len() - 1) as u32;
        self.exports.push(Export {
            name: name.to_string(),
            desc: ExportDesc::Func(index),
        });
        index
    }
}
