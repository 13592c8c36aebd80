//! Fixed names and sizes shared across the pipeline.

/// Constants that are part of the program and wire contract
pub mod tac_constants {
    /// Global binding every strategy program must define.
    pub const ENTRY_POINT: &str = "createQuboForSingleMove";
    /// Cells on a tic-tac-toe board.
    pub const BOARD_CELLS: usize = 9;
    /// Cells per row and per column.
    pub const BOARD_SIDE: usize = 3;
    /// Board cell `i` becomes the QUBO variable `x{i}`.
    pub const VARIABLE_PREFIX: &str = "x";
    /// Solver endpoint used when nothing is configured.
    pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/quantum";
}
