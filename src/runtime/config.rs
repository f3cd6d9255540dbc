//! Interpreter configuration

use serde::Deserialize;

/// Tunables for an [`Interpreter`](super::Interpreter) session and the
/// script runner driving it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Nested wasm calls allowed before trapping "call stack exhausted"
    pub max_call_depth: usize,
    /// Keep running a script after a failed assertion
    pub keep_going: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_call_depth: 1024,
            keep_going: false,
        }
    }
}
