// src/compile/mod.rs

//! The strategy compile pipeline.
//!
//! Program text flows through four synchronous stages:
//! [`load_entry_point`] → [`sample`] → [`normalize`] (legacy weights only) →
//! [`validate`](crate::validation::validate). None of them fails; each reports
//! "nothing" and the validator substitutes the default document. Only the
//! final submission can return an error.

pub mod normalize;
pub mod runner;
pub mod sampler;

pub use normalize::normalize;
pub use runner::{load_entry_point, EntryPoint};
pub use sampler::{sample, Sample};

use crate::config::Settings;
use crate::core::{runtime, Board, TacError};
use crate::qubo::CandidateDocument;
use crate::submit::SolverClient;
use crate::validation::{validate_with_reason, Compilation, FallbackReason};
use tracing::debug;

/// Runs the compile pipeline under one set of [`Settings`].
///
/// ```
/// # use tacqubo::{Compiler, Settings};
/// let compiler = Compiler::new(Settings::default());
/// let compilation = compiler.compile(
///     "function createQuboForSingleMove(board) { return { linear: { 4: -3 }, quadratic: {} }; }",
/// );
/// assert!(!compilation.is_fallback());
/// assert_eq!(compilation.document.objective, "-3 * x4");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    settings: Settings,
}

impl Compiler {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// A compiler using the process-wide settings (see [`crate::init`]).
    pub fn from_runtime() -> Self {
        Self::new(runtime::settings().clone())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Compiles a strategy program into the document to submit.
    ///
    /// Never fails: any problem along the way yields the default document with
    /// the reason recorded in [`Compilation::fallback`].
    pub fn compile(&self, source: &str) -> Compilation {
        debug!(bytes = source.len(), "compiling strategy");
        let entry = load_entry_point(source, &self.settings.script);
        let missing = if entry.is_some() {
            FallbackReason::SamplingFailed
        } else {
            FallbackReason::EntryPointUnavailable
        };

        let candidate = sample(entry, &Board::empty()).map(|sample| match sample {
            Sample::Legacy(weights) => CandidateDocument::from(normalize(&weights)),
            Sample::Canonical(candidate) => candidate,
        });
        validate_with_reason(candidate, missing)
    }

    /// Compiles `source` and submits the result to the configured endpoint.
    ///
    /// The interpreter is dropped before the request is sent.
    ///
    /// # Errors
    /// `TacError::Submit` when the HTTP client cannot be built or the exchange fails.
    pub async fn compile_and_submit(
        &self,
        source: &str,
    ) -> Result<(Compilation, serde_json::Value), TacError> {
        let compilation = self.compile(source);
        let client = SolverClient::new(&self.settings.solver)?;
        let reply = client.submit(&compilation.document).await?;
        Ok((compilation, reply))
    }
}
