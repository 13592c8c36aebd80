// src/qubo/document.rs

//! The canonical QUBO document and its JSON wire form.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    /// Takes values 0 or 1.
    Binary,
    /// Takes values -1 or +1.
    Spin,
}

impl VariableType {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableType::Binary => "Binary",
            VariableType::Spin => "Spin",
        }
    }
}

#[derive(Serialize, Deserialize)]
struct VariableSpec {
    #[serde(rename = "type")]
    kind: VariableType,
}

/// Declared variables in first-seen order.
///
/// Serializes as a JSON object `{ "x0": { "type": "Binary" }, ... }` whose key
/// order is the registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables(Vec<(String, VariableType)>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name` unless it is already declared. Returns whether it was new.
    pub fn register(&mut self, name: impl Into<String>, kind: VariableType) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.0.push((name, kind));
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<VariableType> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, kind)| *kind)
    }

    /// Variable names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, VariableType)> {
        self.0.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, VariableType)> for Variables {
    fn from_iter<I: IntoIterator<Item = (S, VariableType)>>(iter: I) -> Self {
        let mut variables = Variables::new();
        for (name, kind) in iter {
            variables.register(name, kind);
        }
        variables
    }
}

impl Serialize for Variables {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, kind) in &self.0 {
            map.serialize_entry(name, &VariableSpec { kind: *kind })?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Variables {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VariablesVisitor;

        impl<'de> Visitor<'de> for VariablesVisitor {
            type Value = Variables;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of variable names to {\"type\": \"Binary\" | \"Spin\"}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Variables, A::Error> {
                let mut variables = Variables::new();
                while let Some((name, spec)) = access.next_entry::<String, VariableSpec>()? {
                    variables.register(name, spec.kind);
                }
                Ok(variables)
            }
        }

        deserializer.deserialize_map(VariablesVisitor)
    }
}

/// Relation between a constraint's left-hand side and its bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Le => "<=",
            Comparison::Ge => ">=",
        }
    }

    /// Parses the wire symbol; `==` is accepted as a spelling of `=`.
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol.trim() {
            "=" | "==" => Some(Comparison::Eq),
            "<=" => Some(Comparison::Le),
            ">=" => Some(Comparison::Ge),
            _ => None,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One linear or quadratic constraint, `lhs comparison rhs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub lhs: String,
    pub comparison: Comparison,
    #[serde(serialize_with = "serialize_number")]
    pub rhs: f64,
}

impl Constraint {
    pub fn new(lhs: impl Into<String>, comparison: Comparison, rhs: f64) -> Self {
        Self { lhs: lhs.into(), comparison, rhs }
    }

    /// `v1 + v2 + ... = 1` over the given names.
    pub fn exactly_one<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let lhs = names.into_iter().collect::<Vec<_>>().join(" + ");
        Self::new(lhs, Comparison::Eq, 1.0)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.comparison, crate::script::format_number(self.rhs))
    }
}

/// Integral values go out as JSON integers (`1`, not `1.0`).
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// A complete QUBO problem: declared variables, constraints and objective.
///
/// The JSON field order is `variables`, `Constraints`, `Objective`, which is
/// what the solver endpoint expects.
///
/// ```
/// # use tacqubo::{QuboDocument, Variables, VariableType, Constraint};
/// let variables: Variables = [("x4", VariableType::Binary)].into_iter().collect();
/// let document = QuboDocument::new(variables, vec![Constraint::exactly_one(["x4"])], "-3 * x4");
/// assert_eq!(
///     document.to_json().unwrap(),
///     r#"{"variables":{"x4":{"type":"Binary"}},"Constraints":[{"lhs":"x4","comparison":"=","rhs":1}],"Objective":"-3 * x4"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuboDocument {
    pub variables: Variables,
    #[serde(rename = "Constraints")]
    pub constraints: Vec<Constraint>,
    #[serde(rename = "Objective")]
    pub objective: String,
}

impl QuboDocument {
    pub fn new(variables: Variables, constraints: Vec<Constraint>, objective: impl Into<String>) -> Self {
        Self { variables, constraints, objective: objective.into() }
    }

    /// Compact JSON, the request body sent to the solver.
    ///
    /// # Errors
    /// Propagates `serde_json` failures (non-finite numbers).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Indented JSON for humans.
    ///
    /// # Errors
    /// Propagates `serde_json` failures (non-finite numbers).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for QuboDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.variables.names().collect();
        writeln!(f, "QUBO[{} variables, {} constraints]", names.len(), self.constraints.len())?;
        writeln!(f, "  variables: {}", names.join(", "))?;
        writeln!(f, "  minimize:  {}", self.objective)?;
        for constraint in &self.constraints {
            writeln!(f, "  subject to {constraint}")?;
        }
        Ok(())
    }
}

/// A document whose fields may be missing, as produced by a strategy script
/// or read from loose JSON. The validator turns it into a [`QuboDocument`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateDocument {
    #[serde(default)]
    pub variables: Option<Variables>,
    #[serde(rename = "Constraints", default)]
    pub constraints: Option<Vec<Constraint>>,
    #[serde(rename = "Objective", default)]
    pub objective: Option<String>,
}

impl From<QuboDocument> for CandidateDocument {
    fn from(document: QuboDocument) -> Self {
        Self {
            variables: Some(document.variables),
            constraints: Some(document.constraints),
            objective: Some(document.objective),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn variables_keep_registration_order() {
        let mut variables = Variables::new();
        assert!(variables.register("x4", VariableType::Binary));
        assert!(variables.register("x0", VariableType::Binary));
        assert!(!variables.register("x4", VariableType::Spin));
        assert_eq!(variables.names().collect::<Vec<_>>(), vec!["x4", "x0"]);
        assert_eq!(variables.get("x4"), Some(VariableType::Binary));
    }

    #[test]
    fn json_preserves_key_order() {
        let json = r#"{"variables":{"x2":{"type":"Binary"},"x0":{"type":"Spin"}},"Constraints":[],"Objective":"x2"}"#;
        let document: QuboDocument = serde_json::from_str(json).expect("parse");
        assert_eq!(document.variables.names().collect::<Vec<_>>(), vec!["x2", "x0"]);
        assert_eq!(document.variables.get("x0"), Some(VariableType::Spin));
        assert_eq!(document.to_json().expect("serialize"), json);
    }

    #[test]
    fn fractional_rhs_stays_fractional() {
        let constraint = Constraint::new("x0 + x1", Comparison::Le, 1.5);
        let json = serde_json::to_string(&constraint).expect("serialize");
        assert_eq!(json, r#"{"lhs":"x0 + x1","comparison":"<=","rhs":1.5}"#);
    }

    #[test]
    fn unknown_comparison_is_rejected() {
        let result: Result<Constraint, _> =
            serde_json::from_str(r#"{"lhs":"x0","comparison":"<","rhs":1}"#);
        assert!(result.is_err());
        assert_eq!(Comparison::parse("=="), Some(Comparison::Eq));
    }

    #[test]
    fn candidate_fields_are_optional() {
        let candidate: CandidateDocument =
            serde_json::from_str(r#"{"variables":{"x0":{"type":"Binary"}}}"#).expect("parse");
        assert!(candidate.constraints.is_none());
        assert!(candidate.objective.is_none());
    }
}
