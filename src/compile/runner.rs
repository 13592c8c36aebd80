// src/compile/runner.rs

//! Program Runner: evaluates a strategy script and extracts its entry point.

use crate::config::ScriptSettings;
use crate::core::{tac_constants::ENTRY_POINT, Board};
use crate::script::{parse, Interpreter, ScriptError, Value};
use tracing::{debug, info};

/// A loaded `createQuboForSingleMove` together with the interpreter that owns
/// its closure environment.
///
/// The interpreter's step and time budgets keep running across calls, so a
/// strategy that burned most of its budget at load time has little left for
/// sampling.
#[derive(Debug)]
pub struct EntryPoint {
    interpreter: Interpreter,
    function: Value,
}

impl EntryPoint {
    /// Invokes the entry point with `board` as its only argument.
    ///
    /// # Errors
    /// Any script error raised by the call, including exhausted limits.
    pub fn call(&mut self, board: &Board) -> Result<Value, ScriptError> {
        self.interpreter.call(&self.function, vec![board.to_script_value()])
    }

    /// Evaluation steps consumed so far by loading and calling.
    pub fn steps_used(&self) -> u64 {
        self.interpreter.steps_used()
    }
}

/// Evaluates `source` in a fresh interpreter and returns its entry point.
///
/// Returns `None` when the source does not parse, throws while evaluating,
/// exceeds a limit, or does not bind `createQuboForSingleMove` to a function.
/// Failures are logged, never propagated.
///
/// ```
/// # use tacqubo::compile::load_entry_point;
/// # use tacqubo::ScriptSettings;
/// let limits = ScriptSettings::default();
/// assert!(load_entry_point("function createQuboForSingleMove(b) { return {}; }", &limits).is_some());
/// assert!(load_entry_point("function somethingElse() {}", &limits).is_none());
/// assert!(load_entry_point("function (", &limits).is_none());
/// ```
pub fn load_entry_point(source: &str, limits: &ScriptSettings) -> Option<EntryPoint> {
    let program = match parse(source) {
        Ok(program) => program,
        Err(err) => {
            info!(%err, "strategy script does not parse");
            return None;
        }
    };

    let mut interpreter = Interpreter::new(limits.clone());
    if let Err(err) = interpreter.run(&program) {
        info!(%err, "strategy script failed during evaluation");
        return None;
    }

    match interpreter.global(ENTRY_POINT) {
        Some(function) if function.is_callable() => {
            debug!(steps = interpreter.steps_used(), "entry point loaded");
            Some(EntryPoint { interpreter, function })
        }
        Some(other) => {
            info!(kind = other.type_of(), "{ENTRY_POINT} is not a function");
            None
        }
        None => {
            info!("strategy script does not define {ENTRY_POINT}");
            None
        }
    }
}
