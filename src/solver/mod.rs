// src/solver/mod.rs

//! Local expansion and solving of QUBO documents.
//!
//! [`expand`] turns a [`QuboDocument`](crate::QuboDocument) into explicit
//! coefficients, and [`Solver`] searches them for a minimum-energy assignment:
//! exhaustively for small problems, by seeded simulated annealing otherwise.

mod engine;
mod expand;
mod polynomial;
mod results;

pub use expand::{expand, CompiledQubo};
pub use polynomial::{parse_polynomial, Polynomial};
pub use results::{SolveMethod, SolveResult};

use crate::config::LocalSettings;
use crate::core::TacError;
use engine::SearchEngine;
use tracing::debug;

/// Largest variable count exhaustive search accepts, whatever the configuration.
const MAX_EXHAUSTIVE_VARIABLES: usize = 30;

/// Search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveOptions {
    /// Annealing seed; the same seed always yields the same result.
    pub seed: u64,
    /// Annealing sweeps over all variables.
    pub sweeps: usize,
    /// Problems with at most this many variables are solved exhaustively.
    pub exhaustive_limit: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self::from(&LocalSettings::default())
    }
}

impl From<&LocalSettings> for SolveOptions {
    fn from(settings: &LocalSettings) -> Self {
        Self { seed: settings.seed, sweeps: settings.sweeps, exhaustive_limit: settings.exhaustive_limit }
    }
}

/// Finds low-energy assignments of a [`CompiledQubo`].
#[derive(Debug, Clone, Default)]
pub struct Solver {
    options: SolveOptions,
}

impl Solver {
    pub fn new(options: SolveOptions) -> Self {
        Self { options }
    }

    pub fn from_settings(settings: &LocalSettings) -> Self {
        Self::new(SolveOptions::from(settings))
    }

    pub fn options(&self) -> &SolveOptions {
        &self.options
    }

    /// Solves `qubo`.
    ///
    /// # Returns
    /// * `Ok(SolveResult)` with the best assignment found and its energy.
    /// * `Err(TacError::Solver)` if the QUBO has no variables or a
    ///   non-finite coefficient.
    pub fn solve(&self, qubo: &CompiledQubo) -> Result<SolveResult, TacError> {
        if qubo.is_empty() {
            return Err(TacError::Solver { message: "QUBO has no variables".to_string() });
        }
        if !qubo.offset().is_finite() || qubo.terms().values().any(|c| !c.is_finite()) {
            return Err(TacError::Solver { message: "QUBO has a non-finite coefficient".to_string() });
        }

        let engine = SearchEngine::new(qubo);
        let limit = self.options.exhaustive_limit.min(MAX_EXHAUSTIVE_VARIABLES);
        let (method, (state, energy)) = if qubo.len() <= limit {
            (SolveMethod::Exhaustive, engine.exhaustive())
        } else {
            (SolveMethod::Annealing, engine.anneal(self.options.seed, self.options.sweeps))
        };
        debug!(variables = qubo.len(), %method, energy, "qubo solved");

        let assignment = qubo.variables().iter().cloned().zip(state).collect();
        Ok(SolveResult::new(assignment, energy, method))
    }
}
