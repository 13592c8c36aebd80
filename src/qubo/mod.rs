// src/qubo/mod.rs

//! QUBO problem documents: the canonical shape, the legacy weight shape, a
//! builder and the fixed default document.

pub mod builder;
pub mod defaults;
pub mod document;
pub mod weights;

pub use builder::DocumentBuilder;
pub use defaults::{default_document, DEFAULT_OBJECTIVE};
pub use document::{CandidateDocument, Comparison, Constraint, QuboDocument, VariableType, Variables};
pub use weights::LegacyWeights;
