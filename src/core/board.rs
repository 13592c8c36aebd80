// src/core/board.rs

use super::constants::tac_constants::{BOARD_CELLS, BOARD_SIDE};
use crate::script::Value;
use std::fmt;

/// Occupant of a single board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// Nobody has played here.
    #[default]
    Empty,
    /// The player whose marks are `"X"`.
    PlayerA,
    /// The player whose marks are `"O"`.
    PlayerB,
}

impl Cell {
    /// The string a strategy script sees for this cell.
    pub fn mark(self) -> &'static str {
        match self {
            Cell::Empty => "",
            Cell::PlayerA => "X",
            Cell::PlayerB => "O",
        }
    }

    /// Inverse of [`Cell::mark`]; unknown marks yield `None`.
    pub fn from_mark(mark: &str) -> Option<Self> {
        match mark {
            "" => Some(Cell::Empty),
            "X" => Some(Cell::PlayerA),
            "O" => Some(Cell::PlayerB),
            _ => None,
        }
    }
}

/// A 3x3 tic-tac-toe board, cells indexed 0..8 in row-major order.
///
/// Boards are immutable values. The compile pipeline only ever samples a
/// strategy against [`Board::empty`], but any position can be handed to a
/// loaded entry point directly.
///
/// ```
/// # use tacqubo::{Board, Cell};
/// let board = Board::empty().with(4, Cell::PlayerA);
/// assert_eq!(board.at(1, 1), Cell::PlayerA);
/// assert_eq!(board.open_cells().count(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board {
    cells: [Cell; BOARD_CELLS],
}

impl Board {
    /// The all-empty board used for sampling.
    pub const fn empty() -> Self {
        Self { cells: [Cell::Empty; BOARD_CELLS] }
    }

    pub const fn from_cells(cells: [Cell; BOARD_CELLS]) -> Self {
        Self { cells }
    }

    /// Returns a copy with `index` set to `cell`. Out-of-range indices leave the board unchanged.
    pub fn with(mut self, index: usize, cell: Cell) -> Self {
        if let Some(slot) = self.cells.get_mut(index) {
            *slot = cell;
        }
        self
    }

    /// Cell at a flat index, `None` beyond 8.
    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    /// Cell at `(row, column)`, both 0..3.
    ///
    /// # Panics
    /// Panics if `row` or `column` is 3 or more.
    pub fn at(&self, row: usize, column: usize) -> Cell {
        assert!(row < BOARD_SIDE && column < BOARD_SIDE, "board coordinates out of range");
        self.cells[Self::index_of(row, column)]
    }

    /// Flat index of `(row, column)`.
    pub const fn index_of(row: usize, column: usize) -> usize {
        row * BOARD_SIDE + column
    }

    /// `(row, column)` of a flat index.
    pub const fn position(index: usize) -> (usize, usize) {
        (index / BOARD_SIDE, index % BOARD_SIDE)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| *cell == Cell::Empty)
    }

    /// Indices of the cells nobody has played.
    pub fn open_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| **cell == Cell::Empty)
            .map(|(index, _)| index)
    }

    pub fn cells(&self) -> &[Cell; BOARD_CELLS] {
        &self.cells
    }

    /// The marks as seen by a strategy script.
    pub fn marks(&self) -> [&'static str; BOARD_CELLS] {
        self.cells.map(Cell::mark)
    }

    /// The script-side array of nine mark strings.
    pub(crate) fn to_script_value(self) -> Value {
        Value::array(self.marks().iter().map(|mark| Value::str(mark)).collect())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIDE {
            if row > 0 {
                writeln!(f, "---+---+---")?;
            }
            let line: Vec<String> = (0..BOARD_SIDE)
                .map(|column| match self.at(row, column) {
                    Cell::Empty => format!(" {} ", Self::index_of(row, column)),
                    cell => format!(" {} ", cell.mark()),
                })
                .collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board_has_nine_open_cells() {
        let board = Board::empty();
        assert!(board.is_empty());
        assert_eq!(board.open_cells().collect::<Vec<_>>(), (0..9).collect::<Vec<_>>());
        assert_eq!(board.marks(), [""; 9]);
    }

    #[test]
    fn indices_are_row_major() {
        assert_eq!(Board::index_of(0, 2), 2);
        assert_eq!(Board::index_of(2, 0), 6);
        assert_eq!(Board::position(5), (1, 2));
    }

    #[test]
    fn marks_round_trip() {
        for cell in [Cell::Empty, Cell::PlayerA, Cell::PlayerB] {
            assert_eq!(Cell::from_mark(cell.mark()), Some(cell));
        }
        assert_eq!(Cell::from_mark("Z"), None);
    }

    #[test]
    fn display_shows_indices_of_open_cells() {
        let board = Board::empty().with(0, Cell::PlayerA).with(8, Cell::PlayerB);
        let text = board.to_string();
        assert!(text.starts_with(" X | 1 | 2 "));
        assert!(text.trim_end().ends_with(" 6 | 7 | O"));
    }

    #[test]
    fn script_view_is_an_array_of_marks() {
        let board = Board::empty().with(4, Cell::PlayerB);
        assert_eq!(board.to_script_value().to_display_string(), ",,,,O,,,,");
    }
}
