// patterns.rs - Named seed patterns applied through the board surface

use crate::board::Board;
use crate::error::LifeError;

/// A pattern's cells are 1-based and hug the origin; `apply` shifts them
/// to where they are wanted.
pub struct Pattern {
    pub name: &'static str,
    pub cells: &'static [(u32, u32)],
}

pub const BLOCK: Pattern = Pattern {
    name: "Block",
    cells: &[(1, 1), (2, 1), (1, 2), (2, 2)],
};

pub const BLINKER: Pattern = Pattern {
    name: "Blinker",
    cells: &[(1, 2), (2, 2), (3, 2)],
};

pub const TOAD: Pattern = Pattern {
    name: "Toad",
    cells: &[(2, 1), (3, 1), (4, 1), (1, 2), (2, 2), (3, 2)],
};

pub const BEACON: Pattern = Pattern {
    name: "Beacon",
    cells: &[(1, 1), (2, 1), (1, 2), (2, 2), (3, 3), (4, 3), (3, 4), (4, 4)],
};

pub const GLIDER: Pattern = Pattern {
    name: "Glider",
    cells: &[(2, 1), (3, 2), (1, 3), (2, 3), (3, 3)],
};

pub const PATTERNS: &[Pattern] = &[BLOCK, BLINKER, TOAD, BEACON, GLIDER];

/// Clears the board and seeds `pattern` shifted right/down by `(dx, dy)`.
/// Cells falling outside the board are skipped.
pub fn apply(board: &mut Board, pattern: &Pattern, dx: u32, dy: u32) -> Result<(), LifeError> {
    board.clear();
    for &(x, y) in pattern.cells {
        let (x, y) = (x + dx, y + dy);
        if x <= board.width() && y <= board.height() {
            board.add_cell(x, y)?;
        }
    }
    Ok(())
}
