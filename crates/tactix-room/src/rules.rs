//! Pure board rules: no I/O, no clocks, just win and draw detection.

use tactix_protocol::{Board, Outcome, Symbol};

/// The eight winning lines: rows, columns, diagonals.
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the symbol holding a completed line, if any.
pub fn winner(board: &Board) -> Option<Symbol> {
    LINES.iter().find_map(|&[a, b, c]| {
        match (board[a], board[b], board[c]) {
            (Some(x), Some(y), Some(z)) if x == y && y == z => Some(x),
            _ => None,
        }
    })
}

/// Evaluates a board after a move: `Some` when the game is over
/// (win or draw), `None` while play continues.
pub fn evaluate(board: &Board) -> Option<Outcome> {
    if let Some(symbol) = winner(board) {
        return Some(Outcome::from(symbol));
    }
    if board.iter().all(Option::is_some) {
        return Some(Outcome::Draw);
    }
    None
}

// =========================================================================
// Tests
// =========================================================================
