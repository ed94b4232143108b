use crate::{MaskError, Position};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The playable shape of a board. Rectangular games use a full mask; story
/// levels carve an irregular shape out of the backing grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mask {
    active: Array2<bool>,
}

impl Mask {
    /// A mask with every cell active.
    pub fn full(width: usize, height: usize) -> Self {
        Self {
            active: Array2::from_elem((height, width), true),
        }
    }

    pub fn from_rows(rows: Vec<Vec<bool>>) -> Result<Self, MaskError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 {
            return Err(MaskError::Empty);
        }

        if let Some((row, found)) = rows
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, len)| len != width)
        {
            return Err(MaskError::Ragged {
                row,
                expected: width,
                found,
            });
        }

        let cells: Vec<bool> = rows.into_iter().flatten().collect();
        let active = Array2::from_shape_vec((height, width), cells)
            .map_err(|_| MaskError::Empty)?;
        Ok(Self { active })
    }

    /// A `size × size` diamond. The three middle rows span the whole grid;
    /// each row beyond them loses one more cell on either side.
    pub fn diamond(size: usize) -> Self {
        let middle = size / 2;
        let active = Array2::from_shape_fn((size, size), |(row, col)| {
            let inset = row.abs_diff(middle).saturating_sub(1);
            col >= inset && col + inset < size
        });
        Self { active }
    }

    pub fn width(&self) -> usize {
        self.active.ncols()
    }

    pub fn height(&self) -> usize {
        self.active.nrows()
    }

    /// Out-of-bounds positions are inactive.
    pub fn is_active(&self, pos: Position) -> bool {
        self.active.get(pos.index()).copied().unwrap_or(false)
    }

    pub fn is_full(&self) -> bool {
        self.active.iter().all(|&active| active)
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|&&active| active).count()
    }

    /// Active positions in row-major order.
    pub fn active_positions(&self) -> Vec<Position> {
        self.active
            .indexed_iter()
            .filter(|(_, active)| **active)
            .map(|((row, col), _)| Position::new(row, col))
            .collect()
    }
}

impl FromStr for Mask {
    type Err = MaskError;

    /// Parses one row per non-blank line: `#` is active, `.` is inactive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rows = s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(row, line)| {
                line.chars()
                    .map(|c| match c {
                        '#' => Ok(true),
                        '.' => Ok(false),
                        found => Err(MaskError::InvalidChar { row, found }),
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rows(rows)
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.active.rows() {
            for &active in row {
                write!(f, "{}", if active { '#' } else { '.' })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
