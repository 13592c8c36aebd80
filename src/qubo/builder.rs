// src/qubo/builder.rs

//! Incremental construction of [`QuboDocument`]s.

use super::document::{Constraint, QuboDocument, VariableType, Variables};
use crate::script::format_number;

/// A helper struct for programmatically constructing `QuboDocument` instances using method chaining.
///
/// Variable registration is idempotent and zero-coefficient terms are dropped,
/// so callers can feed raw weights straight in.
///
/// ```
/// # use tacqubo::qubo::DocumentBuilder;
/// # use tacqubo::VariableType;
/// let document = DocumentBuilder::new()
///     .variable("x0", VariableType::Binary)
///     .variable("x2", VariableType::Binary)
///     .term(-2.0, &["x0"])
///     .term(0.0, &["x2"])
///     .term(3.0, &["x0", "x2"])
///     .exactly_one()
///     .build();
/// assert_eq!(document.objective, "-2 * x0 + 3 * x0 * x2");
/// assert_eq!(document.constraints[0].lhs, "x0 + x2");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    variables: Variables,
    terms: Vec<String>,
    constraints: Vec<Constraint>,
}

impl DocumentBuilder {
    /// Creates a new, empty DocumentBuilder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a variable; repeated declarations are ignored.
    pub fn variable(mut self, name: impl Into<String>, kind: VariableType) -> Self {
        self.variables.register(name, kind);
        self
    }

    /// Appends `coefficient * v1 * v2 ...` to the objective unless the coefficient is zero.
    pub fn term(mut self, coefficient: f64, factors: &[&str]) -> Self {
        if coefficient != 0.0 {
            self.terms.push(format!("{} * {}", format_number(coefficient), factors.join(" * ")));
        }
        self
    }

    /// Appends an arbitrary constraint.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Appends the exactly-one constraint over every variable declared so far.
    /// Does nothing while no variable is declared.
    pub fn exactly_one(mut self) -> Self {
        if !self.variables.is_empty() {
            self.constraints.push(Constraint::exactly_one(self.variables.names()));
        }
        self
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Finalizes the construction process; the objective is the terms joined by `" + "`.
    pub fn build(self) -> QuboDocument {
        QuboDocument::new(self.variables, self.constraints, self.terms.join(" + "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_yields_empty_document() {
        let document = DocumentBuilder::new().exactly_one().build();
        assert!(document.variables.is_empty());
        assert!(document.constraints.is_empty());
        assert_eq!(document.objective, "");
    }

    #[test]
    fn fractional_coefficients_are_plain_decimals() {
        let document = DocumentBuilder::new()
            .variable("x1", VariableType::Binary)
            .term(0.000001, &["x1"])
            .build();
        assert_eq!(document.objective, "0.000001 * x1");
    }
}
