// tests/solver_tests.rs

use rstest::rstest;
use tacqubo::{
    default_document, expand, CompiledQubo, Compiler, Constraint, QuboDocument, QuboReply, SolveMethod, SolveOptions,
    Solver, TacError, VariableType, Variables,
};

const TEST_TOLERANCE: f64 = 1e-9;

fn binary(names: &[&str]) -> Variables {
    names.iter().map(|name| (*name, VariableType::Binary)).collect()
}

#[rstest]
#[case::exhaustive(20, SolveMethod::Exhaustive)]
#[case::annealing(0, SolveMethod::Annealing)]
fn test_compiled_strategy_picks_its_cheapest_cell(
    #[case] exhaustive_limit: usize,
    #[case] method: SolveMethod,
) -> Result<(), TacError> {
    let source = "function createQuboForSingleMove(board) { return { linear: { 0: -1, 2: -4, 8: -2 }, quadratic: {} }; }";
    let compilation = Compiler::default().compile(source);
    let qubo = expand(&compilation.document, None)?;

    let options = SolveOptions { exhaustive_limit, ..SolveOptions::default() };
    let result = Solver::new(options).solve(&qubo)?;

    assert_eq!(result.method(), method);
    assert_eq!(result.selected_cell(), Some(2));
    assert!((result.energy() - -4.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn test_spin_variables_are_supported() -> Result<(), TacError> {
    let mut variables = binary(&["x0"]);
    variables.register("s", VariableType::Spin);
    // Minimized when s = +1 (binary 1) and x0 = 1.
    let document = QuboDocument::new(variables, vec![Constraint::exactly_one(["x0"])], "-1 * s - x0");
    let qubo = expand(&document, None)?;
    let result = Solver::default().solve(&qubo)?;

    assert_eq!(result.value("s"), Some(true));
    assert_eq!(result.value("x0"), Some(true));
    assert!((result.energy() - -2.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn test_inequality_allows_empty_selection() -> Result<(), TacError> {
    let document = QuboDocument::new(
        binary(&["x0", "x1"]),
        vec![Constraint::new("x0 + x1", tacqubo::Comparison::Le, 1.0)],
        "2 * x0 + 3 * x1",
    );
    let result = Solver::default().solve(&expand(&document, None)?)?;

    assert_eq!(result.selected().filter(|n| !n.starts_with("_slack")).count(), 0);
    assert!((result.energy() - 0.0).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn test_energy_matches_reported_assignment() -> Result<(), TacError> {
    let qubo = expand(default_document(), Some(3.0))?;
    let result = Solver::default().solve(&qubo)?;
    let state: Vec<bool> = result.assignment().iter().map(|(_, on)| *on).collect();
    assert!((qubo.energy(&state) - result.energy()).abs() < TEST_TOLERANCE);
    Ok(())
}

#[test]
fn test_annealing_is_reproducible() -> Result<(), TacError> {
    let qubo = CompiledQubo::fallback();
    let options = SolveOptions { exhaustive_limit: 0, seed: 1234, sweeps: 100 };
    let first = Solver::new(options).solve(&qubo)?;
    let second = Solver::new(options).solve(&qubo)?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_server_reply_can_be_solved_locally() -> Result<(), Box<dyn std::error::Error>> {
    let reply = QuboReply::from_value(&serde_json::json!({
        "qubo": {"('x0', 'x0')": -1.0, "('x4', 'x4')": -3.0, "('x0', 'x4')": 10.0},
        "offset": 0.0
    }))?;
    let qubo = CompiledQubo::from_pairs(reply.pairs()?, reply.offset);
    let result = Solver::default().solve(&qubo)?;
    assert_eq!(result.selected_cell(), Some(4));
    Ok(())
}

#[test]
fn test_degenerate_inputs_are_errors() {
    let empty = Solver::default().solve(&CompiledQubo::new(Vec::new()));
    assert!(matches!(empty, Err(TacError::Solver { .. })));

    let cubic = QuboDocument::new(binary(&["a", "b", "c"]), vec![Constraint::exactly_one(["a"])], "a * b * c");
    assert!(matches!(expand(&cubic, None), Err(TacError::Expansion { .. })));

    assert!(matches!(expand(default_document(), Some(-1.0)), Err(TacError::Expansion { .. })));
}
