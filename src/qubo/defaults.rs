// src/qubo/defaults.rs

//! The document substituted whenever a strategy cannot be used.

use super::document::{Constraint, QuboDocument, VariableType, Variables};
use crate::core::tac_constants::{BOARD_CELLS, VARIABLE_PREFIX};
use std::sync::LazyLock;

/// Center beats corners, corners beat edges.
pub const DEFAULT_OBJECTIVE: &str = "(-3 * x4) + (-2 * x0) + (-2 * x2) + (-2 * x6) + (-2 * x8) + (-1 * x1) + (-1 * x3) + (-1 * x5) + (-1 * x7)";

static DEFAULT_DOCUMENT: LazyLock<QuboDocument> = LazyLock::new(|| {
    let variables: Variables = (0..BOARD_CELLS)
        .map(|cell| (format!("{VARIABLE_PREFIX}{cell}"), VariableType::Binary))
        .collect();
    let constraint = Constraint::exactly_one(variables.names());
    QuboDocument::new(variables, vec![constraint], DEFAULT_OBJECTIVE)
});

/// The fixed fallback document: nine binary cells, pick exactly one.
pub fn default_document() -> &'static QuboDocument {
    &DEFAULT_DOCUMENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_shape() {
        let document = default_document();
        assert_eq!(document.variables.len(), 9);
        assert_eq!(document.constraints.len(), 1);
        assert_eq!(document.constraints[0].lhs, "x0 + x1 + x2 + x3 + x4 + x5 + x6 + x7 + x8");
        assert_eq!(document.constraints[0].rhs, 1.0);
        assert!(document.objective.starts_with("(-3 * x4)"));
    }

    #[test]
    fn default_document_is_shared() {
        assert!(std::ptr::eq(default_document(), default_document()));
    }
}
