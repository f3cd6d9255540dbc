//! Script execution
//!
//! A [`ScriptRunner`] owns an [`Interpreter`] with the spectest module
//! installed and runs commands against it in order. Assertion mismatches are
//! failures; anything else that goes wrong (a module that does not
//! instantiate, an unknown export, a malformed literal) aborts the run.

use super::command::{Action, Command, Script};
use super::values::{convert_args, convert_expected, match_results};
use super::{spectest, ScriptError};
use crate::runtime::{Config, Interpreter, RuntimeError, Value};
use log::{debug, error, info, warn};
use std::fmt;

/// A failed assertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Position of the command in the script
    pub index: usize,
    pub message: String,
}

/// Summary of a script run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub modules: usize,
    pub registrations: usize,
    pub actions: usize,
    pub passed: usize,
    pub skipped: usize,
    pub failures: Vec<Failure>,
}

impl Report {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} modules, {} actions, {} assertions passed, {} failed, {} skipped",
            self.modules,
            self.actions,
            self.passed,
            self.failures.len(),
            self.skipped
        )
    }
}

enum Outcome {
    Done,
    Passed,
    Skipped,
    Failed(String),
}

pub struct ScriptRunner {
    interpreter: Interpreter,
}

impl ScriptRunner {
    pub fn new(config: Config) -> Result<Self, ScriptError> {
        let mut interpreter = Interpreter::with_config(config);
        spectest::install(&mut interpreter)?;
        Ok(ScriptRunner { interpreter })
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Run every command of `script`
    ///
    /// Stops at the first failed assertion unless the interpreter was
    /// configured with `keep_going`, in which case failures are collected
    /// in the returned [`Report`].
    pub fn run(&mut self, script: &Script) -> Result<Report, ScriptError> {
        let mut report = Report::default();
        for (index, command) in script.commands.iter().enumerate() {
            debug!("command #{index}: {}", command.kind());
            let outcome = self
                .run_command(command, &mut report)
                .map_err(|source| ScriptError::Command { index, source })?;
            match outcome {
                Outcome::Done => {}
                Outcome::Passed => report.passed += 1,
                Outcome::Skipped => report.skipped += 1,
                Outcome::Failed(message) => {
                    if !self.interpreter.config().keep_going {
                        return Err(ScriptError::AssertionFailed { index, message });
                    }
                    error!("command #{index} failed: {message}");
                    report.failures.push(Failure { index, message });
                }
            }
        }
        info!("{report}");
        Ok(report)
    }

    fn run_command(&mut self, command: &Command, report: &mut Report) -> Result<Outcome, RuntimeError> {
        match command {
            Command::Module(module) => {
                self.interpreter.instantiate(module)?;
                report.modules += 1;
                Ok(Outcome::Done)
            }
            Command::Register { module, name } => {
                self.interpreter.register(module.as_deref(), name)?;
                report.registrations += 1;
                Ok(Outcome::Done)
            }
            Command::Action { action } => {
                let results = self.perform(action)?;
                debug!("{action} returned {results:?}");
                report.actions += 1;
                Ok(Outcome::Done)
            }
            Command::AssertReturn { action, expected } => {
                let expected = convert_expected(expected)?;
                match self.perform(action) {
                    Ok(results) => Ok(match match_results(&results, &expected) {
                        Ok(()) => Outcome::Passed,
                        Err(mismatch) => Outcome::Failed(format!("{action}: {mismatch}")),
                    }),
                    Err(RuntimeError::Trap(trap)) => Ok(Outcome::Failed(format!("{action}: unexpected trap \"{trap}\""))),
                    Err(other) => Err(other),
                }
            }
            Command::AssertTrap { action, message } => match self.perform(action) {
                Ok(results) => Ok(Outcome::Failed(format!(
                    "{action}: expected trap \"{message}\", got {results:?}"
                ))),
                Err(RuntimeError::Trap(trap)) if trap_matches(&trap.to_string(), message) => Ok(Outcome::Passed),
                Err(RuntimeError::Trap(trap)) => Ok(Outcome::Failed(format!(
                    "{action}: expected trap \"{message}\", got \"{trap}\""
                ))),
                Err(other) => Err(other),
            },
            Command::Skipped { kind } => {
                warn!("skipping unsupported {kind}");
                Ok(Outcome::Skipped)
            }
        }
    }

    fn perform(&mut self, action: &Action) -> Result<Vec<Value>, RuntimeError> {
        match action {
            Action::Invoke { module, name, args } => {
                let args = convert_args(args)?;
                self.interpreter.invoke(module.as_deref(), name, &args)
            }
            Action::Get { module, name } => Ok(vec![self.interpreter.get_global(module.as_deref(), name)?]),
        }
    }
}

/// Trap messages match when the expected text occurs in the actual message,
/// ignoring case
fn trap_matches(actual: &str, expected: &str) -> bool {
    actual.to_lowercase().contains(&expected.to_lowercase())
}
