//! Conformance script execution
//!
//! Scripts are the JSON form of `.wast` files: module definitions already
//! resolved into the [`ast`](crate::ast) representation, followed by
//! registrations, actions and assertions. This module provides the command
//! types, value conversion and result comparison with NaN tolerance, the
//! spectest host module and the runner that ties them together.
//!
//! # Example
//!
//! ```
//! use wastref::runtime::Config;
//! use wastref::wast::{Script, ScriptRunner};
//!
//! let script = Script::from_json(r#"{"commands": [
//!     {"type": "module", "types": [{"results": ["i32"]}],
//!      "functions": [{"type": 0, "body": [{"op": "const", "type": "i32", "value": "42"}]}],
//!      "exports": [{"name": "f", "desc": {"func": 0}}]},
//!     {"type": "assert_return", "action": {"kind": "invoke", "name": "f"},
//!      "expected": [{"type": "i32", "value": "42"}]}
//! ]}"#).unwrap();
//! let report = ScriptRunner::new(Config::default()).unwrap().run(&script).unwrap();
//! assert_eq!(report.passed, 1);
//! ```

pub mod command;
pub mod runner;
pub mod spectest;
pub mod values;

pub use command::*;
pub use runner::{Failure, Report, ScriptRunner};
pub use values::{convert_args, convert_expected, match_results, ExpectedValue};

use crate::runtime::RuntimeError;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("command #{index}: {source}")]
    Command {
        index: usize,
        #[source]
        source: RuntimeError,
    },
    #[error("assertion #{index} failed: {message}")]
    AssertionFailed { index: usize, message: String },
    #[error("cannot read script: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed script: {0}")]
    Json(#[from] serde_json::Error),
}
