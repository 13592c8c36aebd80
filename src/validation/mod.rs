// src/validation/mod.rs

//! Problem Validator & Fallback.
//!
//! This is the only place the default document is substituted. Upstream
//! stages report "nothing" instead of failing; [`validate`] turns whatever
//! arrives into a document that is safe to submit.

use crate::qubo::{default_document, CandidateDocument, Constraint, QuboDocument, Variables};
use crate::script::{tokenize, TokenKind};
use std::borrow::Cow;
use std::fmt;
use tracing::{debug, info};

/// Objective substituted when a document declares variables but no terms.
const EMPTY_OBJECTIVE: &str = "0";

/// Why the default document was used instead of the strategy's own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The program did not yield a callable `createQuboForSingleMove`.
    EntryPointUnavailable,
    /// The entry point failed or returned something unusable.
    SamplingFailed,
    /// No candidate document was supplied.
    MissingDocument,
    /// The document declares no variables.
    NoVariables,
    /// The objective is empty and could not be coerced.
    EmptyObjective,
    /// The document has no constraints.
    NoConstraints,
    /// An expression references a variable that is not declared.
    UndeclaredVariable {
        /// The undeclared identifier
        name: String,
    },
    /// An expression could not be tokenized.
    MalformedExpression {
        /// `Objective` or `Constraints[i].lhs`
        field: String,
    },
}

impl FallbackReason {
    /// Stable identifier for logs and machine consumers.
    pub fn code(&self) -> &'static str {
        match self {
            FallbackReason::EntryPointUnavailable => "entry_point_unavailable",
            FallbackReason::SamplingFailed => "sampling_failed",
            FallbackReason::MissingDocument => "missing_document",
            FallbackReason::NoVariables => "no_variables",
            FallbackReason::EmptyObjective => "empty_objective",
            FallbackReason::NoConstraints => "no_constraints",
            FallbackReason::UndeclaredVariable { .. } => "undeclared_variable",
            FallbackReason::MalformedExpression { .. } => "malformed_expression",
        }
    }
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::EntryPointUnavailable => write!(f, "entry point unavailable"),
            FallbackReason::SamplingFailed => write!(f, "sampling the entry point failed"),
            FallbackReason::MissingDocument => write!(f, "no document"),
            FallbackReason::NoVariables => write!(f, "document declares no variables"),
            FallbackReason::EmptyObjective => write!(f, "objective is empty"),
            FallbackReason::NoConstraints => write!(f, "document has no constraints"),
            FallbackReason::UndeclaredVariable { name } => write!(f, "undeclared variable '{name}'"),
            FallbackReason::MalformedExpression { field } => write!(f, "{field} is not a valid expression"),
        }
    }
}

/// Outcome of compiling one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Compilation {
    /// The document to submit; borrowed when it is the shared default.
    pub document: Cow<'static, QuboDocument>,
    /// Set when `document` is the default document.
    pub fallback: Option<FallbackReason>,
}

impl Compilation {
    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    pub fn into_document(self) -> QuboDocument {
        self.document.into_owned()
    }
}

/// Validates a candidate, substituting the default document on any failure.
///
/// A missing candidate is reported as [`FallbackReason::MissingDocument`].
///
/// ```
/// # use tacqubo::validation::{validate, FallbackReason};
/// # use tacqubo::default_document;
/// let compilation = validate(None);
/// assert_eq!(compilation.fallback, Some(FallbackReason::MissingDocument));
/// assert_eq!(*compilation.document, *default_document());
/// ```
pub fn validate(candidate: Option<CandidateDocument>) -> Compilation {
    validate_with_reason(candidate, FallbackReason::MissingDocument)
}

/// Like [`validate`], reporting `missing` when there is no candidate.
pub fn validate_with_reason(candidate: Option<CandidateDocument>, missing: FallbackReason) -> Compilation {
    match candidate.ok_or(missing).and_then(accept) {
        Ok(document) => {
            debug!(variables = document.variables.len(), "document accepted");
            Compilation { document: Cow::Owned(document), fallback: None }
        }
        Err(reason) => {
            info!(reason = reason.code(), detail = %reason, "using default document");
            Compilation { document: Cow::Borrowed(default_document()), fallback: Some(reason) }
        }
    }
}

/// Fills permissive defaults: no constraints become an empty list, and an
/// absent or blank objective becomes `"0"` when variables are declared.
pub fn coerce(candidate: CandidateDocument) -> CandidateDocument {
    let has_variables = candidate.variables.as_ref().is_some_and(|v| !v.is_empty());
    let objective = match candidate.objective {
        Some(objective) if !objective.trim().is_empty() => Some(objective),
        _ if has_variables => Some(EMPTY_OBJECTIVE.to_string()),
        other => other,
    };
    CandidateDocument {
        variables: candidate.variables,
        constraints: Some(candidate.constraints.unwrap_or_default()),
        objective,
    }
}

fn accept(candidate: CandidateDocument) -> Result<QuboDocument, FallbackReason> {
    let CandidateDocument { variables, constraints, objective } = coerce(candidate);
    let variables = variables.filter(|v| !v.is_empty()).ok_or(FallbackReason::NoVariables)?;
    let objective = objective.filter(|o| !o.trim().is_empty()).ok_or(FallbackReason::EmptyObjective)?;
    let constraints = constraints.filter(|c| !c.is_empty()).ok_or(FallbackReason::NoConstraints)?;
    let document = QuboDocument::new(variables, constraints, objective);
    check_declared(&document)?;
    Ok(document)
}

/// Checks that every identifier in the objective and in each constraint's
/// left-hand side is a declared variable.
///
/// # Errors
/// The first undeclared identifier or untokenizable expression found.
pub fn check_declared(document: &QuboDocument) -> Result<(), FallbackReason> {
    check_expression(&document.objective, "Objective", &document.variables)?;
    for (index, Constraint { lhs, .. }) in document.constraints.iter().enumerate() {
        check_expression(lhs, &format!("Constraints[{index}].lhs"), &document.variables)?;
    }
    Ok(())
}

fn check_expression(expression: &str, field: &str, variables: &Variables) -> Result<(), FallbackReason> {
    for name in referenced_identifiers(expression)
        .ok_or_else(|| FallbackReason::MalformedExpression { field: field.to_string() })?
    {
        if !variables.contains(&name) {
            return Err(FallbackReason::UndeclaredVariable { name });
        }
    }
    Ok(())
}

/// Identifiers referenced by an expression, in order of appearance, or `None`
/// if the text does not tokenize.
pub fn referenced_identifiers(expression: &str) -> Option<Vec<String>> {
    let tokens = tokenize(expression).ok()?;
    Some(
        tokens
            .into_iter()
            .filter_map(|token| match token.kind {
                TokenKind::Ident(name) => Some(name),
                _ => None,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubo::{Comparison, VariableType};
    use pretty_assertions::assert_eq;

    fn binary(names: &[&str]) -> Variables {
        names.iter().map(|name| (*name, VariableType::Binary)).collect()
    }

    #[test]
    fn missing_constraints_fall_back() {
        let candidate = CandidateDocument {
            variables: Some(binary(&["x0"])),
            constraints: None,
            objective: Some("1 * x0".into()),
        };
        assert_eq!(validate(Some(candidate)).fallback, Some(FallbackReason::NoConstraints));
    }

    #[test]
    fn blank_objective_is_coerced_to_zero() {
        let candidate = CandidateDocument {
            variables: Some(binary(&["x0"])),
            constraints: Some(vec![Constraint::exactly_one(["x0"])]),
            objective: Some("  ".into()),
        };
        let compilation = validate(Some(candidate));
        assert_eq!(compilation.fallback, None);
        assert_eq!(compilation.document.objective, "0");
    }

    #[test]
    fn empty_variables_fall_back() {
        let candidate = CandidateDocument {
            variables: Some(Variables::new()),
            constraints: Some(vec![]),
            objective: None,
        };
        assert_eq!(validate(Some(candidate)).fallback, Some(FallbackReason::NoVariables));
    }

    #[test]
    fn undeclared_identifiers_fall_back() {
        let candidate = CandidateDocument {
            variables: Some(binary(&["x0", "x1"])),
            constraints: Some(vec![Constraint::new("x0 + x9", Comparison::Eq, 1.0)]),
            objective: Some("-1 * x0".into()),
        };
        let compilation = validate(Some(candidate));
        assert_eq!(compilation.fallback, Some(FallbackReason::UndeclaredVariable { name: "x9".into() }));
        assert_eq!(*compilation.document, *default_document());
    }

    #[test]
    fn untokenizable_objective_falls_back() {
        let candidate = CandidateDocument {
            variables: Some(binary(&["x0"])),
            constraints: Some(vec![Constraint::exactly_one(["x0"])]),
            objective: Some("x0 # 2".into()),
        };
        assert_eq!(
            validate(Some(candidate)).fallback,
            Some(FallbackReason::MalformedExpression { field: "Objective".into() })
        );
    }

    #[test]
    fn default_document_passes_its_own_checks() {
        assert_eq!(check_declared(default_document()), Ok(()));
    }

    #[test]
    fn identifiers_are_listed_in_order() {
        assert_eq!(
            referenced_identifiers("(-3 * x4) + 2 * x0 * x4"),
            Some(vec!["x4".to_string(), "x0".to_string(), "x4".to_string()])
        );
    }
}
