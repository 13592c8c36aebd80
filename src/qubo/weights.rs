// src/qubo/weights.rs

//! The legacy `{linear, quadratic}` weight shape.

/// Raw per-cell and per-pair weights as returned by older strategies.
///
/// Keys are kept as the script produced them (`"4"`, `"0,2"`), in insertion
/// order; they are neither validated nor required to be in range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyWeights {
    pub linear: Vec<(String, f64)>,
    pub quadratic: Vec<(String, f64)>,
}

impl LegacyWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_linear(mut self, key: impl Into<String>, weight: f64) -> Self {
        self.linear.push((key.into(), weight));
        self
    }

    pub fn with_quadratic(mut self, key: impl Into<String>, weight: f64) -> Self {
        self.quadratic.push((key.into(), weight));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.linear.is_empty() && self.quadratic.is_empty()
    }
}
