//! Command types of a conformance script
//!
//! A script is a sequence of commands that define modules, register them
//! for cross-module linking, invoke exported functions, and assert expected
//! behaviour (return values or traps). Scripts arrive as JSON with every
//! module already resolved into the [`ast`](crate::ast) form.

use super::ScriptError;
use crate::ast::{Module, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A script: the commands to run, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub commands: Vec<Command>,
}

impl Script {
    pub fn from_json(text: &str) -> Result<Self, ScriptError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScriptError> {
        let text = std::fs::read_to_string(path)?;
        Script::from_json(&text)
    }
}

/// A top-level command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Instantiate a module, which becomes the target of unnamed actions
    Module(Module),

    /// Make the most recent (or named) module importable as `name`
    Register {
        #[serde(default)]
        module: Option<String>,
        name: String,
    },

    /// Perform an action and ignore its results
    Action { action: Action },

    /// Assert that an action returns the expected values
    AssertReturn {
        action: Action,
        #[serde(default)]
        expected: Vec<Expected>,
    },

    /// Assert that an action traps with a message containing `message`
    AssertTrap { action: Action, message: String },

    /// An assertion kind this interpreter does not run, such as
    /// `assert_invalid` or `assert_exhaustion`
    Skipped { kind: String },
}

impl Command {
    /// Short name used in reports and log output
    pub fn kind(&self) -> &str {
        match self {
            Command::Module(_) => "module",
            Command::Register { .. } => "register",
            Command::Action { .. } => "action",
            Command::AssertReturn { .. } => "assert_return",
            Command::AssertTrap { .. } => "assert_trap",
            Command::Skipped { .. } => "skipped",
        }
    }
}

/// An action performed against a module instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Call an exported function
    Invoke {
        #[serde(default)]
        module: Option<String>,
        name: String,
        #[serde(default)]
        args: Vec<Const>,
    },

    /// Read an exported global
    Get {
        #[serde(default)]
        module: Option<String>,
        name: String,
    },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Invoke { module, name, args } => {
                write!(f, "invoke ")?;
                if let Some(module) = module {
                    write!(f, "{module} ")?;
                }
                write!(f, "{name:?}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                Ok(())
            }
            Action::Get { module: Some(module), name } => write!(f, "get {module} {name:?}"),
            Action::Get { module: None, name } => write!(f, "get {name:?}"),
        }
    }
}

/// A typed constant in source form, parsed when the command runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Const {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub value: String,
}

impl Const {
    pub fn new(value_type: ValueType, value: &str) -> Self {
        Const {
            value_type,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for Const {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}.const {})", self.value_type, self.value)
    }
}

/// An expected result of an `assert_return`
///
/// Written like a [`Const`]; a value of `nan:canonical` or `nan:arithmetic`
/// accepts any NaN of the given type, since NaN results are not bit-exact
/// across implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Const", into = "Const")]
pub enum Expected {
    Const(Const),
    Nan { value_type: ValueType },
}

impl From<Const> for Expected {
    fn from(constant: Const) -> Self {
        match constant.value.as_str() {
            "nan:canonical" | "nan:arithmetic" => Expected::Nan {
                value_type: constant.value_type,
            },
            _ => Expected::Const(constant),
        }
    }
}

impl From<Expected> for Const {
    fn from(expected: Expected) -> Self {
        match expected {
            Expected::Const(constant) => constant,
            Expected::Nan { value_type } => Const::new(value_type, "nan:arithmetic"),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Const(constant) => constant.fmt(f),
            Expected::Nan { value_type } => write!(f, "({value_type}.const nan)"),
        }
    }
}
