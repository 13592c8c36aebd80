// src/core/runtime.rs

//! Process-wide settings, installed at most once.

use super::error::TacError;
use crate::config::Settings;
use std::sync::{LazyLock, OnceLock};
use tracing::debug;

static SETTINGS: OnceLock<Settings> = OnceLock::new();

static DEFAULT_SETTINGS: LazyLock<Settings> = LazyLock::new(Settings::default);

/// Installs the process-wide settings.
///
/// # Errors
/// `TacError::AlreadyInitialized` if settings were installed before; the
/// first installation stays in effect.
pub fn init(settings: Settings) -> Result<&'static Settings, TacError> {
    let mut installed = false;
    let current = SETTINGS.get_or_init(|| {
        installed = true;
        settings
    });
    if installed {
        debug!(endpoint = %current.solver.endpoint, "runtime settings installed");
        Ok(current)
    } else {
        Err(TacError::AlreadyInitialized)
    }
}

/// The installed settings, or the built-in defaults before [`init`] runs.
pub fn settings() -> &'static Settings {
    SETTINGS.get().unwrap_or(&DEFAULT_SETTINGS)
}

pub fn is_initialized() -> bool {
    SETTINGS.get().is_some()
}
