// src/solver/results.rs
use crate::core::tac_constants::{BOARD_CELLS, VARIABLE_PREFIX};
use std::fmt;

/// How an assignment was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveMethod {
    /// Every assignment was evaluated; the result is optimal.
    Exhaustive,
    /// Seeded simulated annealing; the result is the best state visited.
    Annealing,
}

impl fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveMethod::Exhaustive => write!(f, "exhaustive"),
            SolveMethod::Annealing => write!(f, "annealing"),
        }
    }
}

/// Holds the outcome of a local solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    /// Value of every variable, in the QUBO's variable order.
    assignment: Vec<(String, bool)>,
    /// Energy of `assignment`, offset included.
    energy: f64,
    method: SolveMethod,
}

impl SolveResult {
    pub(crate) fn new(assignment: Vec<(String, bool)>, energy: f64, method: SolveMethod) -> Self {
        Self { assignment, energy, method }
    }

    pub fn assignment(&self) -> &[(String, bool)] {
        &self.assignment
    }

    /// Value of one variable, if it exists.
    pub fn value(&self, name: &str) -> Option<bool> {
        self.assignment.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Names of the variables set to 1.
    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.assignment.iter().filter(|(_, v)| *v).map(|(n, _)| n.as_str())
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn method(&self) -> SolveMethod {
        self.method
    }

    /// The board cell to play: `Some(i)` when exactly one of `x0..x8` is set.
    pub fn selected_cell(&self) -> Option<usize> {
        let mut cells = self.selected().filter_map(board_cell);
        match (cells.next(), cells.next()) {
            (Some(cell), None) => Some(cell),
            _ => None,
        }
    }
}

fn board_cell(name: &str) -> Option<usize> {
    let digits = name.strip_prefix(VARIABLE_PREFIX)?;
    if digits.len() != 1 {
        return None;
    }
    digits.parse::<usize>().ok().filter(|cell| *cell < BOARD_CELLS)
}

impl fmt::Display for SolveResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solve Result ({}):", self.method)?;
        writeln!(f, "  energy: {}", self.energy)?;
        let selected: Vec<&str> = self.selected().collect();
        if selected.is_empty() {
            writeln!(f, "  no variables set")?;
        } else {
            writeln!(f, "  set: {}", selected.join(", "))?;
        }
        match self.selected_cell() {
            Some(cell) => writeln!(f, "  move: cell {cell} (row {}, column {})", cell / 3, cell % 3)?,
            None => writeln!(f, "  move: none")?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(set: &[&str]) -> SolveResult {
        let assignment = ["x0", "x4", "x8", "_slack_0_0"]
            .iter()
            .map(|name| (name.to_string(), set.contains(name)))
            .collect();
        SolveResult::new(assignment, -3.0, SolveMethod::Exhaustive)
    }

    #[test]
    fn one_board_variable_selects_a_cell() {
        assert_eq!(result(&["x4", "_slack_0_0"]).selected_cell(), Some(4));
        assert_eq!(result(&["x0", "x8"]).selected_cell(), None);
        assert_eq!(result(&[]).selected_cell(), None);
    }

    #[test]
    fn display_names_the_move() {
        let text = result(&["x8"]).to_string();
        assert!(text.contains("exhaustive"));
        assert!(text.contains("cell 8 (row 2, column 2)"));
    }
}
