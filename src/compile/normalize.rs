// src/compile/normalize.rs

//! Format Normalizer: legacy `{linear, quadratic}` weights to a canonical document.

use crate::core::tac_constants::VARIABLE_PREFIX;
use crate::qubo::{DocumentBuilder, LegacyWeights, QuboDocument, VariableType};
use tracing::warn;

/// Converts legacy weights into a canonical document.
///
/// Every linear key registers `x{key}` even when its weight is zero; each
/// quadratic key `"i,j"` registers `x{i}` and `x{j}`. Non-zero weights become
/// objective terms in discovery order. When at least one variable exists, a
/// single exactly-one constraint over all of them is appended.
///
/// ```
/// # use tacqubo::compile::normalize;
/// # use tacqubo::LegacyWeights;
/// let weights = LegacyWeights::new().with_linear("4", -3.0);
/// let document = normalize(&weights);
/// assert_eq!(document.objective, "-3 * x4");
/// assert_eq!(document.constraints[0].lhs, "x4");
/// ```
pub fn normalize(weights: &LegacyWeights) -> QuboDocument {
    let mut builder = DocumentBuilder::new();

    for (key, weight) in &weights.linear {
        let name = format!("{VARIABLE_PREFIX}{key}");
        builder = builder.variable(name.as_str(), VariableType::Binary).term(*weight, &[name.as_str()]);
    }

    for (key, weight) in &weights.quadratic {
        let Some((first, second)) = key.split_once(',') else {
            warn!(key = %key, "quadratic key without a comma skipped");
            continue;
        };
        let first = format!("{VARIABLE_PREFIX}{}", first.trim());
        let second = format!("{VARIABLE_PREFIX}{}", second.trim());
        builder = builder
            .variable(first.as_str(), VariableType::Binary)
            .variable(second.as_str(), VariableType::Binary)
            .term(*weight, &[first.as_str(), second.as_str()]);
    }

    builder.exactly_one().build()
}
