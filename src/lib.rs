// src/lib.rs

//! `tacqubo` - Compiles tic-tac-toe strategy programs into QUBO problems
//!
//! A strategy is a small script defining `createQuboForSingleMove(board)`.
//! The library runs it in a sandboxed interpreter, samples the weights it
//! returns, normalizes them into a canonical QUBO document, validates the
//! result (falling back to a fixed default document), and submits it to a
//! remote solver. Documents can also be expanded and solved locally.

pub mod config;
pub mod core;
pub mod script;
pub mod qubo;
pub mod compile;
pub mod validation;
pub mod submit;
pub mod solver;

// Re-export the most common types for easier top-level use
pub use core::{init, is_initialized, settings, tac_constants, Board, Cell, TacError};
pub use config::{LocalSettings, ScriptSettings, Settings, SolverSettings};
pub use qubo::{
    default_document,
    CandidateDocument,
    Comparison,
    Constraint,
    LegacyWeights,
    QuboDocument,
    VariableType,
    Variables,
};
pub use compile::Compiler;
pub use validation::{Compilation, FallbackReason};
pub use submit::{QuboReply, SolverClient, SubmitError};
pub use solver::{expand, CompiledQubo, SolveMethod, SolveOptions, SolveResult, Solver};

// Example 1: Legacy weights
// A strategy returning `linear`/`quadratic` weights is normalized into the
// canonical document with a one-hot constraint over every variable it names.
/// ```
/// use tacqubo::Compiler;
///
/// let source = r#"
///     function createQuboForSingleMove(board) {
///         const linear = {};
///         for (const cell of [0, 4]) {
///             linear[cell] = cell === 4 ? -3 : -2;
///         }
///         return { linear: linear, quadratic: { "0,4": 1 } };
///     }
/// "#;
///
/// let compilation = Compiler::default().compile(source);
/// println!("{}", compilation.document);
///
/// assert!(!compilation.is_fallback());
/// let names: Vec<&str> = compilation.document.variables.names().collect();
/// assert_eq!(names, vec!["x0", "x4"]);
/// assert_eq!(compilation.document.objective, "-2 * x0 + -3 * x4 + 1 * x0 * x4");
/// assert_eq!(compilation.document.constraints[0].lhs, "x0 + x4");
/// ```
#[doc(hidden)]
const _: () = (); // Attaches the preceding doc comment block to a hidden item

// Example 2: Fallback
// Anything unusable (here, a program that never defines the entry point)
// yields the default document together with the reason.
/// ```
/// use tacqubo::{default_document, Compiler, FallbackReason};
///
/// let compilation = Compiler::default().compile("let x = 1 +;");
/// assert_eq!(compilation.fallback, Some(FallbackReason::EntryPointUnavailable));
/// assert_eq!(*compilation.document, *default_document());
/// println!("fell back: {}", compilation.fallback.unwrap());
/// ```
#[doc(hidden)]
const _: () = ();

// Example 3: Local solve
// Expanding the default document and solving it picks the center cell.
/// ```
/// use tacqubo::{default_document, expand, Solver, TacError};
///
/// fn main() -> Result<(), TacError> {
///     let qubo = expand(default_document(), None)?;
///     let result = Solver::default().solve(&qubo)?;
///     println!("{}", result);
///     assert_eq!(result.selected_cell(), Some(4));
///     Ok(())
/// }
/// ```
#[doc(hidden)]
const _: () = ();
