// src/solver/expand.rs

//! QUBO Expander: turns a [`QuboDocument`] into explicit quadratic
//! coefficients.
//!
//! The objective and every constraint left-hand side are evaluated
//! symbolically over the declared variables. Constraints become squared
//! penalties: `=` directly, `<=` and `>=` through binary slack variables. The
//! result must be at most quadratic.

use super::polynomial::{parse_polynomial, Polynomial};
use crate::core::{tac_constants, TacError};
use crate::qubo::{Comparison, Constraint, QuboDocument, VariableType};
use std::collections::BTreeMap;
use tracing::debug;

/// An explicit QUBO: minimize `offset + Σ terms[(i, j)] · x_i · x_j`, `i <= j`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQubo {
    variables: Vec<String>,
    terms: BTreeMap<(usize, usize), f64>,
    offset: f64,
}

impl CompiledQubo {
    pub fn new(variables: Vec<String>) -> Self {
        Self { variables, terms: BTreeMap::new(), offset: 0.0 }
    }

    /// Adds `coefficient` to the `(i, j)` term; the pair is stored with `i <= j`.
    pub fn add_term(&mut self, i: usize, j: usize, coefficient: f64) {
        let key = if i <= j { (i, j) } else { (j, i) };
        *self.terms.entry(key).or_insert(0.0) += coefficient;
    }

    pub fn add_offset(&mut self, value: f64) {
        self.offset += value;
    }

    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v == name)
    }

    pub fn terms(&self) -> &BTreeMap<(usize, usize), f64> {
        &self.terms
    }

    pub fn term(&self, i: usize, j: usize) -> f64 {
        let key = if i <= j { (i, j) } else { (j, i) };
        self.terms.get(&key).copied().unwrap_or(0.0)
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Energy of a full assignment, offset included.
    ///
    /// # Panics
    /// If `assignment` is shorter than the variable list.
    pub fn energy(&self, assignment: &[bool]) -> f64 {
        self.terms
            .iter()
            .filter(|((i, j), _)| assignment[*i] && assignment[*j])
            .map(|(_, c)| c)
            .sum::<f64>()
            + self.offset
    }

    /// Builds a QUBO from named pairs, registering names in first-seen order.
    pub fn from_pairs<I>(pairs: I, offset: f64) -> Self
    where
        I: IntoIterator<Item = ((String, String), f64)>,
    {
        let mut qubo = CompiledQubo::new(Vec::new());
        for ((a, b), coefficient) in pairs {
            let i = qubo.intern(a);
            let j = qubo.intern(b);
            qubo.add_term(i, j, coefficient);
        }
        qubo.offset = offset;
        qubo
    }

    fn intern(&mut self, name: String) -> usize {
        match self.index_of(&name) {
            Some(index) => index,
            None => {
                self.variables.push(name);
                self.variables.len() - 1
            }
        }
    }

    /// The board QUBO the reference server falls back to: center 9, corners 7,
    /// edges 5 on the diagonal, -4 on every pair of cells, offset 1.
    pub fn fallback() -> Self {
        let cells = tac_constants::BOARD_CELLS;
        let mut qubo = CompiledQubo::new(
            (0..cells).map(|i| format!("{}{i}", tac_constants::VARIABLE_PREFIX)).collect(),
        );
        for i in 0..cells {
            let weight = match i {
                4 => 9.0,
                0 | 2 | 6 | 8 => 7.0,
                _ => 5.0,
            };
            qubo.add_term(i, i, weight);
            for j in i + 1..cells {
                qubo.add_term(i, j, -4.0);
            }
        }
        qubo.offset = 1.0;
        qubo
    }
}

/// Expands `document` into a [`CompiledQubo`].
///
/// `penalty` scales every constraint; `None` uses one more than the summed
/// absolute objective coefficients, enough that breaking a constraint never
/// pays off.
///
/// # Errors
/// `TacError::Expansion` when an expression does not parse, references an
/// undeclared name, is not polynomial, when an inequality has fractional
/// coefficients or can never hold, or when the result is above quadratic.
pub fn expand(document: &QuboDocument, penalty: Option<f64>) -> Result<CompiledQubo, TacError> {
    let mut variables: Vec<String> = document.variables.names().map(str::to_string).collect();
    let resolve = |name: &str| {
        let index = document.variables.names().position(|n| n == name)?;
        Some(match document.variables.get(name)? {
            VariableType::Binary => Polynomial::variable(index),
            VariableType::Spin => Polynomial::spin(index),
        })
    };

    let objective = parse_polynomial(&document.objective, &resolve)?;
    let penalty = match penalty {
        Some(p) if p.is_finite() && p > 0.0 => p,
        Some(p) => return Err(TacError::Expansion { message: format!("penalty must be positive, got {p}") }),
        None => 1.0 + objective.weight(),
    };

    let mut total = objective;
    for (index, constraint) in document.constraints.iter().enumerate() {
        let lhs = parse_polynomial(&constraint.lhs, &resolve)?;
        let residual = residual(index, constraint, lhs, &mut variables)?;
        total = total.add(&residual.square().scale(penalty));
    }

    let mut qubo = CompiledQubo::new(variables);
    for (monomial, coefficient) in total.terms() {
        match monomial {
            [] => qubo.add_offset(coefficient),
            [i] => qubo.add_term(*i, *i, coefficient),
            [i, j] => qubo.add_term(*i, *j, coefficient),
            _ => {
                return Err(TacError::Expansion {
                    message: format!("expansion is of degree {}, above quadratic", monomial.len()),
                })
            }
        }
    }
    debug!(variables = qubo.len(), terms = qubo.terms.len(), penalty, "document expanded");
    Ok(qubo)
}

/// `lhs - rhs`, with a slack sum folded in for inequalities so that the
/// residual is zero exactly when the constraint holds.
fn residual(
    index: usize,
    constraint: &Constraint,
    lhs: Polynomial,
    variables: &mut Vec<String>,
) -> Result<Polynomial, TacError> {
    let rhs = Polynomial::constant(constraint.rhs);
    if constraint.comparison == Comparison::Eq {
        return Ok(lhs.sub(&rhs));
    }
    if !lhs.is_integral() || constraint.rhs.fract() != 0.0 {
        return Err(TacError::Expansion {
            message: format!("constraint {index} ({constraint}) needs integer coefficients"),
        });
    }

    let (lo, hi) = lhs.bounds();
    // Range the slack has to cover for the constraint to be satisfiable.
    let range = match constraint.comparison {
        Comparison::Le => constraint.rhs - lo,
        _ => hi - constraint.rhs,
    };
    if range < 0.0 {
        return Err(TacError::Expansion {
            message: format!("constraint {index} ({constraint}) can never hold"),
        });
    }

    let slack = slack_bits(index, range as u64, variables);
    Ok(match constraint.comparison {
        Comparison::Le => lhs.add(&slack).sub(&rhs),
        _ => lhs.sub(&slack).sub(&rhs),
    })
}

/// Binary slack covering exactly `0..=range`: weights 1, 2, 4, ... with the
/// last one trimmed.
fn slack_bits(index: usize, range: u64, variables: &mut Vec<String>) -> Polynomial {
    let mut slack = Polynomial::zero();
    let mut remaining = range;
    let mut weight = 1u64;
    let mut bit = 0;
    while remaining > 0 {
        let coefficient = weight.min(remaining);
        variables.push(format!("_slack_{index}_{bit}"));
        slack = slack.add(&Polynomial::variable(variables.len() - 1).scale(coefficient as f64));
        remaining -= coefficient;
        weight *= 2;
        bit += 1;
    }
    slack
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubo::{default_document, Variables};

    fn binary(names: &[&str]) -> Variables {
        names.iter().map(|n| (*n, VariableType::Binary)).collect()
    }

    #[test]
    fn one_hot_equality() {
        let document = QuboDocument::new(binary(&["a", "b"]), vec![Constraint::exactly_one(["a", "b"])], "-1 * a");
        let qubo = expand(&document, Some(2.0)).unwrap();
        // -a + 2 (a + b - 1)^2 = a(-1 - 2) + b(-2) + 4ab + 2
        assert_eq!(qubo.term(0, 0), -3.0);
        assert_eq!(qubo.term(1, 1), -2.0);
        assert_eq!(qubo.term(0, 1), 4.0);
        assert_eq!(qubo.offset(), 2.0);
        assert_eq!(qubo.energy(&[true, false]), -1.0);
        assert_eq!(qubo.energy(&[false, true]), 0.0);
        assert_eq!(qubo.energy(&[true, true]), 1.0);
    }

    #[test]
    fn default_penalty_follows_objective_weight() {
        let qubo = expand(default_document(), None).unwrap();
        assert_eq!(qubo.len(), 9);
        // Objective weight 15, penalty 16; x4 diagonal = -3 + 16 * (1 - 2)
        assert_eq!(qubo.term(4, 4), -19.0);
        assert_eq!(qubo.term(0, 8), 32.0);
        assert_eq!(qubo.offset(), 16.0);
    }

    #[test]
    fn inequalities_add_slack() {
        let document = QuboDocument::new(
            binary(&["a", "b", "c"]),
            vec![Constraint::new("a + b + c", Comparison::Le, 2.0)],
            "-1 * a - b - c",
        );
        let qubo = expand(&document, Some(4.0)).unwrap();
        assert_eq!(qubo.variables()[3..], ["_slack_0_0".to_string(), "_slack_0_1".to_string()]);
        // a + b = 2 with slack 0 costs nothing extra.
        assert_eq!(qubo.energy(&[true, true, false, false, false]), -2.0);
        // All three set cannot be balanced by a non-negative slack.
        assert!(qubo.energy(&[true, true, true, false, false]) > 0.0);
    }

    #[test]
    fn impossible_and_fractional_inequalities_fail() {
        let impossible = QuboDocument::new(binary(&["a"]), vec![Constraint::new("a", Comparison::Ge, 2.0)], "a");
        assert!(matches!(expand(&impossible, None), Err(TacError::Expansion { .. })));
        let fractional = QuboDocument::new(binary(&["a"]), vec![Constraint::new("0.5 * a", Comparison::Le, 1.0)], "a");
        assert!(matches!(expand(&fractional, None), Err(TacError::Expansion { .. })));
    }

    #[test]
    fn above_quadratic_is_rejected() {
        let document = QuboDocument::new(binary(&["a", "b", "c"]), vec![Constraint::exactly_one(["a"])], "a * b * c");
        assert!(matches!(expand(&document, None), Err(TacError::Expansion { .. })));
    }

    #[test]
    fn fallback_matches_the_server_board() {
        let qubo = CompiledQubo::fallback();
        assert_eq!(qubo.len(), 9);
        assert_eq!(qubo.term(4, 4), 9.0);
        assert_eq!(qubo.term(2, 2), 7.0);
        assert_eq!(qubo.term(1, 1), 5.0);
        assert_eq!(qubo.term(3, 7), -4.0);
        assert_eq!(qubo.terms().len(), 9 + 36);
        assert_eq!(qubo.offset(), 1.0);
    }

    #[test]
    fn pairs_register_names_in_order() {
        let qubo = CompiledQubo::from_pairs(
            [(("b".to_string(), "a".to_string()), 2.0), (("a".to_string(), "a".to_string()), -1.0)],
            0.5,
        );
        assert_eq!(qubo.variables(), ["b".to_string(), "a".to_string()]);
        assert_eq!(qubo.term(1, 0), 2.0);
        assert_eq!(qubo.energy(&[true, true]), 1.5);
    }
}
