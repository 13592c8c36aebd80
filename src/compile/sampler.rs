// src/compile/sampler.rs

//! Weight Sampler: calls the entry point once and classifies what comes back.

use super::runner::EntryPoint;
use crate::core::Board;
use crate::qubo::{CandidateDocument, Comparison, Constraint, LegacyWeights, VariableType, Variables};
use crate::script::{format_number, release, Object, Value};
use std::cell::Ref;
use tracing::{debug, info};

/// Raw weight data produced by a strategy.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    /// An object carrying `variables` (and possibly `Constraints`/`Objective`).
    Canonical(CandidateDocument),
    /// An object carrying `linear` (and possibly `quadratic`).
    Legacy(LegacyWeights),
}

/// Calls `entry` with `board` and classifies the result.
///
/// Returns `None` when there is no entry point, the call fails, the result is
/// not an object, the object has neither `linear` nor `variables`, or one of
/// its fields cannot be read (a non-numeric weight, an unknown comparison or
/// variable type).
pub fn sample(entry: Option<EntryPoint>, board: &Board) -> Option<Sample> {
    let mut entry = entry?;
    let result = match entry.call(board) {
        Ok(result) => result,
        Err(err) => {
            info!(%err, "entry point failed while sampling");
            return None;
        }
    };
    debug!(steps = entry.steps_used(), "entry point sampled");

    let classified = classify(&result);
    release(result);
    classified
}

fn classify(result: &Value) -> Option<Sample> {
    let Value::Object(object) = result else {
        info!(kind = result.type_of(), "entry point did not return an object");
        return None;
    };
    let object = object.borrow();

    let classified = if field(&object, "linear").truthy() {
        read_legacy(&object).map(Sample::Legacy)
    } else if field(&object, "variables").truthy() {
        read_canonical(&object).map(Sample::Canonical)
    } else {
        Err("result has neither `linear` nor `variables`".to_string())
    };

    match classified {
        Ok(sample) => Some(sample),
        Err(reason) => {
            info!(%reason, "sampled weights are unusable");
            None
        }
    }
}

fn field(object: &Ref<'_, Object>, key: &str) -> Value {
    object.get(key).cloned().unwrap_or_default()
}

/// A weight may be a number or a string holding one; anything else is unusable.
fn weight(value: &Value, key: &str) -> Result<f64, String> {
    let n = match value {
        Value::Number(_) | Value::Str(_) => value.to_number(),
        other => return Err(format!("weight for `{key}` is a {}", other.type_of())),
    };
    if n.is_finite() {
        Ok(n)
    } else {
        Err(format!("weight for `{key}` is {}", format_number(n)))
    }
}

/// Key/value pairs of an object, or index/element pairs of an array (holes skipped).
fn weight_entries(value: &Value, what: &str) -> Result<Vec<(String, f64)>, String> {
    let mut entries = Vec::new();
    match value {
        Value::Undefined | Value::Null => {}
        Value::Object(object) => {
            for (key, value) in object.borrow().entries() {
                entries.push((key.clone(), weight(value, key)?));
            }
        }
        Value::Array(items) => {
            for (index, value) in items.borrow().iter().enumerate() {
                if matches!(value, Value::Undefined) {
                    continue;
                }
                let key = index.to_string();
                entries.push((key.clone(), weight(value, &key)?));
            }
        }
        other => return Err(format!("`{what}` is a {}", other.type_of())),
    }
    Ok(entries)
}

fn read_legacy(object: &Ref<'_, Object>) -> Result<LegacyWeights, String> {
    Ok(LegacyWeights {
        linear: weight_entries(&field(object, "linear"), "linear")?,
        quadratic: weight_entries(&field(object, "quadratic"), "quadratic")?,
    })
}

fn read_canonical(object: &Ref<'_, Object>) -> Result<CandidateDocument, String> {
    let variables = read_variables(&field(object, "variables"))?;
    let constraints = match field(object, "Constraints") {
        Value::Undefined | Value::Null => None,
        value => Some(read_constraints(&value)?),
    };
    let objective = match field(object, "Objective") {
        Value::Undefined | Value::Null => None,
        Value::Str(s) => Some(s.to_string()),
        Value::Number(n) if n.is_finite() => Some(format_number(n)),
        other => return Err(format!("`Objective` is a {}", other.type_of())),
    };
    Ok(CandidateDocument { variables: Some(variables), constraints, objective })
}

fn read_variables(value: &Value) -> Result<Variables, String> {
    let Value::Object(object) = value else {
        return Err(format!("`variables` is a {}", value.type_of()));
    };
    let mut variables = Variables::new();
    for (name, spec) in object.borrow().entries() {
        let kind = match spec {
            Value::Object(spec) => spec.borrow().get("type").map(Value::to_display_string),
            _ => None,
        };
        let kind = match kind.as_deref() {
            Some("Binary") => VariableType::Binary,
            Some("Spin") => VariableType::Spin,
            Some(other) => return Err(format!("variable `{name}` has unsupported type `{other}`")),
            None => return Err(format!("variable `{name}` has no type")),
        };
        variables.register(name.clone(), kind);
    }
    Ok(variables)
}

fn read_constraints(value: &Value) -> Result<Vec<Constraint>, String> {
    let Value::Array(items) = value else {
        return Err(format!("`Constraints` is a {}", value.type_of()));
    };
    let mut constraints = Vec::new();
    for (index, item) in items.borrow().iter().enumerate() {
        let Value::Object(spec) = item else {
            return Err(format!("constraint {index} is a {}", item.type_of()));
        };
        let spec = spec.borrow();
        let lhs = match spec.get("lhs") {
            Some(Value::Str(s)) => s.to_string(),
            Some(Value::Number(n)) => format_number(*n),
            _ => return Err(format!("constraint {index} has no `lhs`")),
        };
        let comparison = match spec.get("comparison") {
            Some(Value::Str(symbol)) => Comparison::parse(symbol)
                .ok_or_else(|| format!("constraint {index} has unknown comparison `{symbol}`"))?,
            _ => return Err(format!("constraint {index} has no `comparison`")),
        };
        let rhs = weight(spec.get("rhs").unwrap_or(&Value::Undefined), "rhs")?;
        constraints.push(Constraint::new(lhs, comparison, rhs));
    }
    Ok(constraints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::load_entry_point;
    use crate::config::ScriptSettings;

    fn sample_source(source: &str) -> Option<Sample> {
        let entry = load_entry_point(source, &ScriptSettings::default());
        sample(entry, &Board::empty())
    }

    #[test]
    fn no_entry_point_means_no_sample() {
        assert_eq!(sample(None, &Board::empty()), None);
    }

    #[test]
    fn linear_wins_over_variables() {
        let sample = sample_source(
            "function createQuboForSingleMove(b) { return { linear: { 4: -3 }, variables: {} }; }",
        );
        let Some(Sample::Legacy(weights)) = sample else {
            panic!("expected legacy sample, got {sample:?}");
        };
        assert_eq!(weights.linear, vec![("4".to_string(), -3.0)]);
        assert!(weights.quadratic.is_empty());
    }

    #[test]
    fn arrays_are_read_as_linear_weights() {
        let sample = sample_source(
            "function createQuboForSingleMove(b) {\n\
               const w = b.map((cell, i) => i === 4 ? -3 : 0);\n\
               return { linear: w, quadratic: { '0,8': '2' } };\n\
             }",
        );
        let Some(Sample::Legacy(weights)) = sample else {
            panic!("expected legacy sample, got {sample:?}");
        };
        assert_eq!(weights.linear.len(), 9);
        assert_eq!(weights.linear[4], ("4".to_string(), -3.0));
        assert_eq!(weights.quadratic, vec![("0,8".to_string(), 2.0)]);
    }

    #[test]
    fn canonical_fields_are_read() {
        let sample = sample_source(
            "function createQuboForSingleMove(b) { return {\n\
               variables: { x1: { type: 'Binary' } },\n\
               Constraints: [{ lhs: 'x1', comparison: '=', rhs: 1 }],\n\
               Objective: '-1 * x1' }; }",
        );
        let Some(Sample::Canonical(candidate)) = sample else {
            panic!("expected canonical sample, got {sample:?}");
        };
        assert_eq!(candidate.objective.as_deref(), Some("-1 * x1"));
        assert_eq!(candidate.constraints.map(|c| c.len()), Some(1));
    }

    #[test]
    fn unusable_values_yield_nothing() {
        for body in [
            "return 7;",
            "return { something: 1 };",
            "return { linear: { 0: 'abc' } };",
            "return { linear: { 0: true } };",
            "return { variables: { x0: { type: 'Integer' } } };",
            "return { variables: { x0: { type: 'Binary' } }, Constraints: [{ lhs: 'x0', comparison: '<', rhs: 1 }] };",
            "throw new Error('no move');",
        ] {
            let source = format!("function createQuboForSingleMove(board) {{ {body} }}");
            assert_eq!(sample_source(&source), None, "body: {body}");
        }
    }

    #[test]
    fn the_board_is_nine_empty_strings() {
        let sample = sample_source(
            "function createQuboForSingleMove(b) {\n\
               if (b.length !== 9 || b.some(c => c !== '')) throw new Error('bad board');\n\
               return { linear: { 0: 1 } };\n\
             }",
        );
        assert!(matches!(sample, Some(Sample::Legacy(_))));
    }
}
