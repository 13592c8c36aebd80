// src/config.rs

//! Layered runtime settings.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `tacqubo.toml` in the working directory (or an explicit path)
//! 3. Environment variables with the `TACQUBO_` prefix, `__` separating the
//!    section from the key (`TACQUBO_SOLVER__ENDPOINT` -> `solver.endpoint`)

use crate::core::{tac_constants, TacError};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// File consulted by [`Settings::load`].
pub const DEFAULT_CONFIG_FILE: &str = "tacqubo.toml";

/// Prefix of the environment variables consulted by [`Settings::figment`].
pub const ENV_PREFIX: &str = "TACQUBO_";

/// Highest `script.max_call_depth` honoured; the interpreter recurses on the
/// native stack for every script call.
pub const MAX_CALL_DEPTH: usize = 128;

fn default_endpoint() -> String {
    tac_constants::DEFAULT_ENDPOINT.to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_step_budget() -> u64 {
    200_000
}

const fn default_time_budget_ms() -> u64 {
    5_000
}

const fn default_max_call_depth() -> usize {
    64
}

const fn default_max_collection_len() -> usize {
    65_536
}

const fn default_seed() -> u64 {
    42
}

const fn default_sweeps() -> usize {
    1_000
}

const fn default_exhaustive_limit() -> usize {
    20
}

/// Where and how documents are submitted.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SolverSettings {
    /// URL receiving the HTTP POST of the QUBO document.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Whole-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self { endpoint: default_endpoint(), timeout_secs: default_timeout_secs() }
    }
}

/// Resource limits applied to every script evaluation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScriptSettings {
    /// Evaluation steps shared by loading the program and sampling its entry point.
    #[serde(default = "default_step_budget")]
    pub step_budget: u64,

    /// Wall-clock limit for the same span.
    #[serde(default = "default_time_budget_ms")]
    pub time_budget_ms: u64,

    /// Nested script calls allowed, capped at [`MAX_CALL_DEPTH`].
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,

    /// Longest array or string a script may build.
    #[serde(default = "default_max_collection_len")]
    pub max_collection_len: usize,

    /// Seed behind `Math.random`.
    #[serde(default)]
    pub random_seed: u64,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            step_budget: default_step_budget(),
            time_budget_ms: default_time_budget_ms(),
            max_call_depth: default_max_call_depth(),
            max_collection_len: default_max_collection_len(),
            random_seed: 0,
        }
    }
}

/// Knobs for the local expand-and-solve path.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LocalSettings {
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Annealing sweeps over all variables.
    #[serde(default = "default_sweeps")]
    pub sweeps: usize,

    /// Up to this many variables the solver enumerates every assignment.
    #[serde(default = "default_exhaustive_limit")]
    pub exhaustive_limit: usize,

    /// Constraint penalty weight; derived from the objective when unset.
    #[serde(default)]
    pub penalty: Option<f64>,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            sweeps: default_sweeps(),
            exhaustive_limit: default_exhaustive_limit(),
            penalty: None,
        }
    }
}

/// All runtime settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub solver: SolverSettings,
    #[serde(default)]
    pub script: ScriptSettings,
    #[serde(default)]
    pub local: LocalSettings,
}

impl Settings {
    /// Loads defaults, `tacqubo.toml` if present, then `TACQUBO_*` variables.
    ///
    /// # Errors
    /// `TacError::Config` when a source holds a value of the wrong shape.
    pub fn load() -> Result<Self, TacError> {
        Self::figment(Path::new(DEFAULT_CONFIG_FILE))
            .extract()
            .map(Self::clamped)
            .map_err(TacError::from)
    }

    /// Like [`Settings::load`] but reads the TOML layer from `path`, which must exist.
    ///
    /// # Errors
    /// `TacError::ConfigFileMissing` when the file is absent, `TacError::Config`
    /// when it is malformed.
    pub fn load_from(path: &Path) -> Result<Self, TacError> {
        if !path.exists() {
            return Err(TacError::ConfigFileMissing { path: path.display().to_string() });
        }
        Self::figment(path).extract().map(Self::clamped).map_err(TacError::from)
    }

    fn clamped(mut self) -> Self {
        if self.script.max_call_depth > MAX_CALL_DEPTH {
            warn!(
                requested = self.script.max_call_depth,
                limit = MAX_CALL_DEPTH,
                "script.max_call_depth lowered to the supported maximum"
            );
            self.script.max_call_depth = MAX_CALL_DEPTH;
        }
        self
    }

    /// The provider chain, exposed so callers can stack more providers on top.
    pub fn figment(toml_path: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if toml_path.exists() {
            figment = figment.merge(Toml::file(toml_path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
