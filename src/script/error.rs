// src/script/error.rs

//! Failures raised while lexing, parsing or evaluating a strategy script.

use thiserror::Error;

/// Error types produced by the script front-end and interpreter.
///
/// The limit variants (`StepBudgetExhausted`, `TimeBudgetExhausted`,
/// `CallDepthExceeded`, `NestingTooDeep`, `CollectionTooLarge`) abort
/// evaluation outright and cannot be intercepted by a `try/catch` inside the
/// script.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    /// The source text is not a well-formed program.
    #[error("Syntax Error ({line}:{column}): {message}")]
    Syntax {
        /// 1-based line of the offending token
        line: usize,
        /// 1-based column of the offending token
        column: usize,
        /// Syntax failure message
        message: String,
    },

    /// An identifier was read before any binding for it existed.
    #[error("Reference Error: {name} is not defined")]
    Reference {
        /// The unresolved identifier
        name: String,
    },

    /// An operation was applied to a value of the wrong kind.
    #[error("Type Error: {message}")]
    Type {
        /// Type failure message
        message: String,
    },

    /// The script executed a `throw` statement that nothing caught.
    #[error("Uncaught: {message}")]
    Thrown {
        /// Display form of the thrown value
        message: String,
    },

    /// The script ran for more evaluation steps than allowed.
    #[error("Step budget of {budget} exhausted")]
    StepBudgetExhausted {
        /// The configured step budget
        budget: u64,
    },

    /// The script ran for longer than allowed.
    #[error("Time budget of {budget_ms} ms exhausted")]
    TimeBudgetExhausted {
        /// The configured wall-clock budget in milliseconds
        budget_ms: u64,
    },

    /// Function calls nested deeper than allowed.
    #[error("Maximum call depth of {limit} exceeded")]
    CallDepthExceeded {
        /// The configured call depth limit
        limit: usize,
    },

    /// Source or values nested deeper than the evaluator will follow.
    #[error("Nesting deeper than {limit} levels")]
    NestingTooDeep {
        /// The fixed nesting limit
        limit: usize,
    },

    /// An array or string grew past the configured size limit.
    #[error("Collection of {requested} elements exceeds limit of {limit}")]
    CollectionTooLarge {
        /// Size the script asked for
        requested: usize,
        /// The configured limit
        limit: usize,
    },
}

impl ScriptError {
    pub(crate) fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        ScriptError::Syntax { line, column, message: message.into() }
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        ScriptError::Type { message: message.into() }
    }

    /// Whether a script-level `catch` clause may intercept this error.
    pub fn is_catchable(&self) -> bool {
        matches!(
            self,
            ScriptError::Reference { .. } | ScriptError::Type { .. } | ScriptError::Thrown { .. }
        )
    }

    /// Name reported to scripts through the `name` field of a caught error.
    pub(crate) fn script_name(&self) -> &'static str {
        match self {
            ScriptError::Syntax { .. } => "SyntaxError",
            ScriptError::Reference { .. } => "ReferenceError",
            ScriptError::Type { .. } => "TypeError",
            ScriptError::Thrown { .. } => "Error",
            ScriptError::StepBudgetExhausted { .. }
            | ScriptError::TimeBudgetExhausted { .. }
            | ScriptError::CallDepthExceeded { .. }
            | ScriptError::NestingTooDeep { .. }
            | ScriptError::CollectionTooLarge { .. } => "RangeError",
        }
    }
}
