//! Example compiling a few block-generated strategies.
//! Shows the legacy weight format, the canonical format and the fallback path.

use tacqubo::{Compiler, Settings};

const STRATEGIES: [(&str, &str); 3] = [
    (
        "legacy weights",
        r#"
        function createQuboForSingleMove(board) {
            var linear = {};
            var quadratic = {};
            for (var i = 0; i < board.length; i++) {
                if (board[i] === '') {
                    linear[i] = i === 4 ? -3 : (i % 2 === 0 ? -2 : -1);
                }
            }
            quadratic['0,8'] = 2;
            quadratic['2,6'] = 2;
            return { linear: linear, quadratic: quadratic };
        }
        "#,
    ),
    (
        "canonical document",
        r#"
        function createQuboForSingleMove(board) {
            const names = ['x0', 'x4', 'x8'];
            const variables = {};
            names.forEach(n => { variables[n] = { type: 'Binary' }; });
            return {
                variables,
                Constraints: [{ lhs: names.join(' + '), comparison: '=', rhs: 1 }],
                Objective: `-1 * x0 + -5 * x4 + -1 * x8`,
            };
        }
        "#,
    ),
    (
        "broken program",
        "function createQuboForSingleMove(board) { return board.nope.length; }",
    ),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("--- tacqubo Example: compiling strategies ---");
    let compiler = Compiler::new(Settings::default());

    for (label, source) in STRATEGIES {
        println!("\n## {label}");
        let compilation = compiler.compile(source);
        match &compilation.fallback {
            Some(reason) => println!("Fell back to the default document: {reason}"),
            None => println!("Strategy accepted."),
        }
        println!("{}", compilation.document);
        println!("Request body:\n{}", compilation.document.to_json_pretty()?);
    }
    Ok(())
}
