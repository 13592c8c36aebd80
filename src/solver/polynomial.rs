// src/solver/polynomial.rs

//! Multilinear polynomials over binary variables.
//!
//! Every variable is 0/1, so `x * x = x` and a monomial is just the set of
//! variable indices it multiplies. Spin variables enter as `2b - 1` over their
//! binary counterpart before any arithmetic happens.

use crate::core::TacError;
use crate::script::{parse_expression, BinaryOp, Expr, UnaryOp};
use std::collections::BTreeMap;

/// Largest exponent accepted in `a ** n`.
const MAX_EXPONENT: u32 = 8;

/// Σ coefficient · Π variables, keyed by the sorted variable indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polynomial {
    terms: BTreeMap<Vec<usize>, f64>,
}

impl Polynomial {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        let mut poly = Self::zero();
        poly.add_term(Vec::new(), value);
        poly
    }

    pub fn variable(index: usize) -> Self {
        let mut poly = Self::zero();
        poly.add_term(vec![index], 1.0);
        poly
    }

    /// `2b - 1`: a spin expressed over its binary variable.
    pub fn spin(index: usize) -> Self {
        Self::variable(index).scale(2.0).sub(&Self::constant(1.0))
    }

    fn add_term(&mut self, monomial: Vec<usize>, coefficient: f64) {
        if coefficient == 0.0 {
            return;
        }
        let sum = self.terms.get(&monomial).copied().unwrap_or(0.0) + coefficient;
        // Cancelled terms are dropped so degree() stays accurate.
        if sum == 0.0 {
            self.terms.remove(&monomial);
        } else {
            self.terms.insert(monomial, sum);
        }
    }

    pub fn add(mut self, other: &Polynomial) -> Self {
        for (monomial, coefficient) in &other.terms {
            self.add_term(monomial.clone(), *coefficient);
        }
        self
    }

    pub fn sub(self, other: &Polynomial) -> Self {
        self.add(&other.clone().scale(-1.0))
    }

    pub fn scale(mut self, factor: f64) -> Self {
        if factor == 0.0 {
            return Self::zero();
        }
        for coefficient in self.terms.values_mut() {
            *coefficient *= factor;
        }
        self
    }

    pub fn mul(&self, other: &Polynomial) -> Self {
        let mut product = Self::zero();
        for (a, ca) in &self.terms {
            for (b, cb) in &other.terms {
                let mut monomial: Vec<usize> = a.iter().chain(b).copied().collect();
                monomial.sort_unstable();
                monomial.dedup();
                product.add_term(monomial, ca * cb);
            }
        }
        product
    }

    pub fn square(&self) -> Self {
        self.mul(self)
    }

    /// Highest number of distinct variables in one term; 0 for constants.
    pub fn degree(&self) -> usize {
        self.terms.keys().map(Vec::len).max().unwrap_or(0)
    }

    /// The value of the polynomial when every variable is 0.
    pub fn constant_term(&self) -> f64 {
        self.terms.get(&Vec::new()).copied().unwrap_or(0.0)
    }

    /// The value as a plain number, if no variable occurs.
    pub fn as_constant(&self) -> Option<f64> {
        (self.degree() == 0).then(|| self.constant_term())
    }

    pub fn terms(&self) -> impl Iterator<Item = (&[usize], f64)> {
        self.terms.iter().map(|(monomial, c)| (monomial.as_slice(), *c))
    }

    /// Smallest and largest value over all 0/1 assignments, bounded term by term.
    pub fn bounds(&self) -> (f64, f64) {
        let base = self.constant_term();
        self.terms.iter().filter(|(m, _)| !m.is_empty()).fold((base, base), |(lo, hi), (_, c)| {
            (lo + c.min(0.0), hi + c.max(0.0))
        })
    }

    /// Sum of absolute coefficients of the non-constant terms.
    pub fn weight(&self) -> f64 {
        self.terms.iter().filter(|(m, _)| !m.is_empty()).map(|(_, c)| c.abs()).sum()
    }

    pub fn is_integral(&self) -> bool {
        self.terms.values().all(|c| c.fract() == 0.0)
    }
}

/// Parses `source` and evaluates it symbolically.
///
/// `resolve` maps an identifier to its polynomial, or `None` if it is not a
/// declared variable.
///
/// # Errors
/// `TacError::Expansion` for syntax errors, unknown identifiers and anything
/// other than numbers, variables, `+ - * /` and constant powers.
pub fn parse_polynomial<F>(source: &str, resolve: &F) -> Result<Polynomial, TacError>
where
    F: Fn(&str) -> Option<Polynomial>,
{
    let expr = parse_expression(source).map_err(|err| TacError::Expansion {
        message: format!("cannot parse `{source}`: {err}"),
    })?;
    evaluate(&expr, resolve)
}

fn evaluate<F>(expr: &Expr, resolve: &F) -> Result<Polynomial, TacError>
where
    F: Fn(&str) -> Option<Polynomial>,
{
    match expr {
        Expr::Number(n) => Ok(Polynomial::constant(*n)),
        Expr::Ident(name) => resolve(name).ok_or_else(|| expansion(format!("unknown variable `{name}`"))),
        Expr::Unary { op: UnaryOp::Neg, expr } => Ok(evaluate(expr, resolve)?.scale(-1.0)),
        Expr::Unary { op: UnaryOp::Plus, expr } => evaluate(expr, resolve),
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, resolve)?;
            let right = evaluate(right, resolve)?;
            match op {
                BinaryOp::Add => Ok(left.add(&right)),
                BinaryOp::Sub => Ok(left.sub(&right)),
                BinaryOp::Mul => Ok(left.mul(&right)),
                BinaryOp::Div => match right.as_constant() {
                    Some(divisor) if divisor != 0.0 => Ok(left.scale(1.0 / divisor)),
                    Some(_) => Err(expansion("division by zero")),
                    None => Err(expansion("division by a variable")),
                },
                BinaryOp::Pow => power(&left, &right),
                other => Err(expansion(format!("operator {other:?} is not arithmetic"))),
            }
        }
        other => Err(expansion(format!("unsupported expression {}", kind_of(other)))),
    }
}

fn power(base: &Polynomial, exponent: &Polynomial) -> Result<Polynomial, TacError> {
    let n = exponent
        .as_constant()
        .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(MAX_EXPONENT))
        .ok_or_else(|| expansion(format!("exponent must be an integer between 0 and {MAX_EXPONENT}")))?;
    if let Some(value) = base.as_constant() {
        return Ok(Polynomial::constant(value.powf(n)));
    }
    let mut result = Polynomial::constant(1.0);
    for _ in 0..n as u32 {
        result = result.mul(base);
    }
    Ok(result)
}

fn kind_of(expr: &Expr) -> &'static str {
    match expr {
        Expr::Str(_) | Expr::Template(_) => "string",
        Expr::Bool(_) => "boolean",
        Expr::Null | Expr::Undefined => "null",
        Expr::Call { .. } | Expr::New { .. } => "call",
        Expr::Member { .. } | Expr::Index { .. } => "property access",
        Expr::Assign { .. } | Expr::Update { .. } => "assignment",
        _ => "operator",
    }
}

fn expansion(message: impl Into<String>) -> TacError {
    TacError::Expansion { message: message.into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(name: &str) -> Option<Polynomial> {
        match name {
            "a" => Some(Polynomial::variable(0)),
            "b" => Some(Polynomial::variable(1)),
            "s" => Some(Polynomial::spin(2)),
            _ => None,
        }
    }

    fn coefficient(poly: &Polynomial, monomial: &[usize]) -> f64 {
        poly.terms().find(|(m, _)| *m == monomial).map(|(_, c)| c).unwrap_or(0.0)
    }

    #[test]
    fn binary_squares_collapse() {
        let poly = parse_polynomial("(a + b - 1) ** 2", &resolve).unwrap();
        // a + b + 2ab - 2a - 2b + 1
        assert_eq!(coefficient(&poly, &[0]), -1.0);
        assert_eq!(coefficient(&poly, &[1]), -1.0);
        assert_eq!(coefficient(&poly, &[0, 1]), 2.0);
        assert_eq!(poly.constant_term(), 1.0);
        assert_eq!(poly.degree(), 2);
    }

    #[test]
    fn spins_are_rewritten_over_binaries() {
        let poly = parse_polynomial("s * s", &resolve).unwrap();
        assert_eq!(poly.as_constant(), Some(1.0));
        let poly = parse_polynomial("3 * s", &resolve).unwrap();
        assert_eq!(coefficient(&poly, &[2]), 6.0);
        assert_eq!(poly.constant_term(), -3.0);
    }

    #[test]
    fn cancelled_terms_disappear() {
        let poly = parse_polynomial("a * b - b * a + 2", &resolve).unwrap();
        assert_eq!(poly.degree(), 0);
        assert_eq!(poly.as_constant(), Some(2.0));
    }

    #[test]
    fn bounds_and_weight() {
        let poly = parse_polynomial("2 * a - 3 * b + 1", &resolve).unwrap();
        assert_eq!(poly.bounds(), (-2.0, 3.0));
        assert_eq!(poly.weight(), 5.0);
        assert!(poly.is_integral());
    }

    #[test]
    fn unsupported_input_is_an_expansion_error() {
        for source in ["a / b", "c + 1", "'a'", "a ** b", "f(a)", "a +", "a / 0"] {
            let result = parse_polynomial(source, &resolve);
            assert!(matches!(result, Err(TacError::Expansion { .. })), "source: {source}");
        }
    }
}
