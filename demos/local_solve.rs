//! Example expanding a strategy's document and solving it without a server.

use tacqubo::{expand, CompiledQubo, Compiler, Settings, Solver, TacError};

const STRATEGY: &str = r#"
function createQuboForSingleMove(board) {
    // Prefer corners, allow at most one pick through an inequality.
    return {
        variables: { x0: { type: 'Binary' }, x2: { type: 'Binary' }, x4: { type: 'Binary' } },
        Constraints: [{ lhs: 'x0 + x2 + x4', comparison: '<=', rhs: 1 }],
        Objective: '-2 * x0 + -2.5 * x2 + -1 * x4',
    };
}
"#;

fn main() -> Result<(), TacError> {
    println!("--- tacqubo Example: local solve ---");
    let settings = Settings::default();
    let compilation = Compiler::new(settings.clone()).compile(STRATEGY);
    println!("{}", compilation.document);

    let qubo = expand(&compilation.document, settings.local.penalty)?;
    println!(
        "Expanded to {} variables ({} slack), {} terms, offset {}",
        qubo.len(),
        qubo.variables().iter().filter(|v| v.starts_with("_slack")).count(),
        qubo.terms().len(),
        qubo.offset()
    );

    let solver = Solver::from_settings(&settings.local);
    let result = solver.solve(&qubo)?;
    println!("\n{result}");

    println!("For comparison, the server's fallback board QUBO:");
    println!("{}", solver.solve(&CompiledQubo::fallback())?);
    Ok(())
}
