//! Structured instructions
//!
//! Control constructs carry their bodies inline, so the interpreter never has
//! to search for matching `end`/`else` markers.

use super::{BlockType, RefType, ValueType};
use crate::numeric::{parse_int, Float, Format, LiteralError};
use serde::{Deserialize, Serialize};

/// Static offset and alignment hint of a memory access
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemArg {
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub align: u32,
}

/// Narrow load that extends to the full width of the result type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedLoad {
    pub bits: u32,
    pub signed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    // integer
    Clz,
    Ctz,
    Popcnt,
    Extend8S,
    Extend16S,
    Extend32S,
    // float
    Abs,
    Neg,
    Sqrt,
    Ceil,
    Floor,
    Trunc,
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    // integer
    DivS,
    DivU,
    RemS,
    RemU,
    And,
    Or,
    Xor,
    Shl,
    ShrS,
    ShrU,
    Rotl,
    Rotr,
    // float
    Div,
    Min,
    Max,
    Copysign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    // integer
    LtS,
    LtU,
    GtS,
    GtU,
    LeS,
    LeU,
    GeS,
    GeU,
    // float
    Lt,
    Gt,
    Le,
    Ge,
}

/// Conversions between value types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conversion {
    /// `i32.wrap_i64`
    Wrap,
    /// `i64.extend_i32_s` / `i64.extend_i32_u`
    Extend { signed: bool },
    /// Trapping float to integer
    Trunc { from: ValueType, to: ValueType, signed: bool },
    /// Saturating float to integer
    TruncSat { from: ValueType, to: ValueType, signed: bool },
    /// Integer to float
    Convert { from: ValueType, to: ValueType, signed: bool },
    /// `f32.demote_f64`
    Demote,
    /// `f64.promote_f32`
    Promote,
    Reinterpret { from: ValueType, to: ValueType },
}

/// Operand of `t.const`
///
/// The literal is parsed into its bit pattern when the tree is built, so a
/// malformed constant rejects the whole module even if it never runs. The
/// source text is kept for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ConstLiteral", into = "ConstLiteral")]
pub struct Constant {
    value_type: ValueType,
    bits: u64,
    text: String,
}

#[derive(Clone, Serialize, Deserialize)]
struct ConstLiteral {
    #[serde(rename = "type")]
    value_type: ValueType,
    value: String,
}

impl Constant {
    pub fn parse(value_type: ValueType, text: impl Into<String>) -> Result<Self, LiteralError> {
        let text = text.into();
        let bits = match value_type {
            ValueType::I32 => parse_int(&text, 32)?,
            ValueType::I64 => parse_int(&text, 64)?,
            ValueType::F32 => Float::parse(&text)?.encode(Format::SINGLE),
            ValueType::F64 => Float::parse(&text)?.encode(Format::DOUBLE),
            ValueType::FuncRef | ValueType::ExternRef => return Err(LiteralError::NotNumeric(value_type.to_string())),
        };
        Ok(Constant { value_type, bits, text })
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Encoded value, in the low 32 bits for 32-bit types
    pub fn bits(&self) -> u64 {
        self.bits
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        self.value_type == other.value_type && self.bits == other.bits
    }
}

impl TryFrom<ConstLiteral> for Constant {
    type Error = LiteralError;

    fn try_from(literal: ConstLiteral) -> Result<Self, Self::Error> {
        Constant::parse(literal.value_type, literal.value)
    }
}

impl From<Constant> for ConstLiteral {
    fn from(constant: Constant) -> Self {
        ConstLiteral {
            value_type: constant.value_type,
            value: constant.text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    // control
    Unreachable,
    Nop,
    Block {
        #[serde(default)]
        block_type: BlockType,
        body: Vec<Instruction>,
    },
    Loop {
        #[serde(default)]
        block_type: BlockType,
        body: Vec<Instruction>,
    },
    If {
        #[serde(default)]
        block_type: BlockType,
        then: Vec<Instruction>,
        #[serde(default, rename = "else")]
        otherwise: Vec<Instruction>,
    },
    Br {
        label: u32,
    },
    BrIf {
        label: u32,
    },
    BrTable {
        labels: Vec<u32>,
        default: u32,
    },
    Return,
    Call {
        func: u32,
    },
    CallIndirect {
        #[serde(rename = "type")]
        type_idx: u32,
        #[serde(default)]
        table: u32,
    },

    // reference
    RefNull {
        ref_type: RefType,
    },
    RefIsNull,
    RefFunc {
        func: u32,
    },

    // parametric
    Drop,
    Select,

    // variable
    LocalGet {
        local: u32,
    },
    LocalSet {
        local: u32,
    },
    LocalTee {
        local: u32,
    },
    GlobalGet {
        global: u32,
    },
    GlobalSet {
        global: u32,
    },

    // memory
    Load {
        #[serde(rename = "type")]
        value_type: ValueType,
        #[serde(default)]
        memarg: MemArg,
        #[serde(default)]
        packed: Option<PackedLoad>,
    },
    Store {
        #[serde(rename = "type")]
        value_type: ValueType,
        #[serde(default)]
        memarg: MemArg,
        /// Narrow store width, the full type width when absent
        #[serde(default)]
        bits: Option<u32>,
    },
    MemorySize,
    MemoryGrow,

    // numeric
    Const(Constant),
    Eqz {
        #[serde(rename = "type")]
        value_type: ValueType,
    },
    Unary {
        #[serde(rename = "type")]
        value_type: ValueType,
        kind: UnaryOp,
    },
    Binary {
        #[serde(rename = "type")]
        value_type: ValueType,
        kind: BinaryOp,
    },
    Compare {
        #[serde(rename = "type")]
        value_type: ValueType,
        kind: CompareOp,
    },
    Convert {
        conversion: Conversion,
    },
}

impl Instruction {
    /// `t.const value`
    pub fn constant(value_type: ValueType, value: impl Into<String>) -> Result<Self, LiteralError> {
        Ok(Instruction::Const(Constant::parse(value_type, value)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_nested_control() {
        let json = r#"{
            "op": "if",
            "block_type": ["i32"],
            "then": [{"op": "const", "type": "i32", "value": "1"}],
            "else": [
                {"op": "local_get", "local": 0},
                {"op": "binary", "type": "i32", "kind": "div_s"}
            ]
        }"#;
        let instruction: Instruction = serde_json::from_str(json).unwrap();
        let Instruction::If {
            block_type,
            then,
            otherwise,
        } = instruction
        else {
            panic!("expected if");
        };
        assert_eq!(block_type, BlockType::Results(vec![ValueType::I32]));
        assert_eq!(then, vec![Instruction::constant(ValueType::I32, "1").unwrap()]);
        assert_eq!(
            otherwise[1],
            Instruction::Binary {
                value_type: ValueType::I32,
                kind: BinaryOp::DivS
            }
        );
    }

    #[test]
    fn deserializes_memory_and_conversions() {
        let load: Instruction =
            serde_json::from_str(r#"{"op":"load","type":"i64","memarg":{"offset":4},"packed":{"bits":8,"signed":true}}"#)
                .unwrap();
        assert_eq!(
            load,
            Instruction::Load {
                value_type: ValueType::I64,
                memarg: MemArg { offset: 4, align: 0 },
                packed: Some(PackedLoad { bits: 8, signed: true }),
            }
        );

        let trunc: Instruction = serde_json::from_str(
            r#"{"op":"convert","conversion":{"kind":"trunc_sat","from":"f64","to":"i32","signed":false}}"#,
        )
        .unwrap();
        assert_eq!(
            trunc,
            Instruction::Convert {
                conversion: Conversion::TruncSat {
                    from: ValueType::F64,
                    to: ValueType::I32,
                    signed: false
                }
            }
        );
    }

    #[test]
    fn constants_are_parsed_when_loaded() {
        let constant: Instruction = serde_json::from_str(r#"{"op":"const","type":"f32","value":"0x1p-1"}"#).unwrap();
        let Instruction::Const(constant) = constant else {
            panic!("expected const");
        };
        assert_eq!(constant.value_type(), ValueType::F32);
        assert_eq!(constant.bits(), 0.5f32.to_bits() as u64);
        assert_eq!(constant, Constant::parse(ValueType::F32, "0.5").unwrap());

        let negative = Constant::parse(ValueType::I32, "-1").unwrap();
        assert_eq!(negative.bits(), 0xffff_ffff);
        let json = serde_json::to_string(&Instruction::Const(negative)).unwrap();
        assert_eq!(json, r#"{"op":"const","type":"i32","value":"-1"}"#);
    }

    #[test]
    fn malformed_constants_are_rejected_when_loaded() {
        // the bad literal sits in an arm that would never run
        let json = r#"{
            "op": "if",
            "block_type": ["i32"],
            "then": [{"op": "const", "type": "f32", "value": "not-a-number"}],
            "else": [{"op": "const", "type": "i32", "value": "7"}]
        }"#;
        let error = serde_json::from_str::<Instruction>(json).unwrap_err();
        assert!(error.to_string().contains("malformed float literal"), "{error}");

        for (value_type, text) in [
            (ValueType::I32, "0x1_0000_0000"),
            (ValueType::I64, "12a"),
            (ValueType::FuncRef, "null"),
        ] {
            assert!(Constant::parse(value_type, text).is_err(), "{value_type} {text}");
        }
    }

    #[test]
    fn op_names_are_snake_case() {
        let op: UnaryOp = serde_json::from_str(r#""extend16_s""#).unwrap();
        assert_eq!(op, UnaryOp::Extend16S);
        let op: CompareOp = serde_json::from_str(r#""ge_u""#).unwrap();
        assert_eq!(op, CompareOp::GeU);
        let unit: Instruction = serde_json::from_str(r#"{"op":"memory_grow"}"#).unwrap();
        assert_eq!(unit, Instruction::MemoryGrow);
    }
}
