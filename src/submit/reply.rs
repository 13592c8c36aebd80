// src/submit/reply.rs

//! Typed view of the reference solver's reply.
//!
//! The endpoint answers `{"qubo": {"('x0', 'x4')": -4, ...}, "offset": 1,
//! "explanation": {...}}`. [`SolverClient::submit`](super::SolverClient::submit)
//! returns the raw JSON; callers that know they talk to that server can read it
//! through [`QuboReply::from_value`].

use super::error::SubmitError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Commentary attached to a reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Explanation {
    pub highlights: Vec<String>,
    pub method: String,
    pub problem_type: Option<String>,
    pub variable_count: Option<usize>,
    pub constraint_count: Option<usize>,
    /// Why the server used its own fallback QUBO.
    pub user_qubo_error: Option<String>,
    pub using_fallback: bool,
}

/// A compiled QUBO as returned by the solver endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuboReply {
    /// Coefficients keyed by a printed variable pair, `('a', 'b')`.
    pub qubo: BTreeMap<String, f64>,
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub explanation: Option<Explanation>,
}

impl QuboReply {
    /// Reads a reply body.
    ///
    /// # Errors
    /// [`SubmitError::MalformedResponse`] if the body does not have the reply shape.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, SubmitError> {
        Self::deserialize(value).map_err(|err| SubmitError::MalformedResponse { message: err.to_string() })
    }

    /// Whether the server substituted its fallback QUBO.
    pub fn is_fallback(&self) -> bool {
        self.explanation.as_ref().is_some_and(|e| e.using_fallback)
    }

    /// Coefficients with their keys split into variable names.
    ///
    /// # Errors
    /// [`SubmitError::MalformedResponse`] naming the first key that is not a pair.
    pub fn pairs(&self) -> Result<Vec<((String, String), f64)>, SubmitError> {
        self.qubo
            .iter()
            .map(|(key, coefficient)| {
                parse_pair(key)
                    .map(|pair| (pair, *coefficient))
                    .ok_or_else(|| SubmitError::MalformedResponse { message: format!("bad qubo key `{key}`") })
            })
            .collect()
    }
}

/// `('x0', 'x4')` → `("x0", "x4")`.
fn parse_pair(key: &str) -> Option<(String, String)> {
    let inner = key.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (a, b) = inner.split_once(',')?;
    let unquote = |s: &str| {
        let s = s.trim();
        s.strip_prefix('\'')
            .and_then(|s| s.strip_suffix('\''))
            .or_else(|| s.strip_prefix('"').and_then(|s| s.strip_suffix('"')))
            .unwrap_or(s)
            .to_string()
    };
    let (a, b) = (unquote(a), unquote(b));
    (!a.is_empty() && !b.is_empty()).then_some((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn server_reply_is_read() {
        let value = json!({
            "qubo": {"('x0', 'x0')": 7, "('x0', 'x4')": -4},
            "offset": 1,
            "explanation": {"highlights": ["Using fallback QUBO"], "method": "classical_fallback", "using_fallback": true}
        });
        let reply = QuboReply::from_value(&value).unwrap();
        assert!(reply.is_fallback());
        assert_eq!(reply.offset, 1.0);
        assert_eq!(
            reply.pairs().unwrap(),
            vec![
                (("x0".to_string(), "x0".to_string()), 7.0),
                (("x0".to_string(), "x4".to_string()), -4.0),
            ]
        );
    }

    #[test]
    fn bad_keys_are_reported() {
        let reply = QuboReply::from_value(&json!({"qubo": {"x0": 1}})).unwrap();
        assert!(reply.pairs().is_err());
        assert!(QuboReply::from_value(&json!({"error": "nope"})).is_err());
    }
}
