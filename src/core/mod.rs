// src/core/mod.rs

//! Core data structures and types

pub mod board;
pub mod error;
pub mod runtime;

pub use board::{Board, Cell};
pub use error::TacError;
pub use runtime::{init, is_initialized, settings};

pub mod constants;
pub use constants::tac_constants; // Re-export
