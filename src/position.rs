use itertools::iproduct;
use serde::{Deserialize, Serialize};

/// A grid coordinate, row-major: `row` counts down from the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The Moore neighbourhood of this position. Neighbours that would fall
    /// below row or column zero are skipped; the upper bound is left to the
    /// caller, which knows the grid dimensions.
    pub fn neighbors(self) -> impl Iterator<Item = Position> {
        iproduct!(-1isize..=1, -1isize..=1).filter_map(move |(dr, dc)| {
            if dr == 0 && dc == 0 {
                return None;
            }
            let row = self.row.checked_add_signed(dr)?;
            let col = self.col.checked_add_signed(dc)?;
            Some(Position::new(row, col))
        })
    }

    pub(crate) fn index(self) -> [usize; 2] {
        [self.row, self.col]
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self::new(row, col)
    }
}
