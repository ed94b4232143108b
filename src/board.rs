use crate::{Mask, Position};
use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// What the player has done to a cell. Flagged and revealed are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellState {
    #[default]
    Hidden,
    Flagged,
    Revealed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    state: CellState,
    is_mine: bool,
    is_active: bool,
    adjacent_mines: u8,
}

impl Cell {
    fn new(is_active: bool) -> Self {
        Self {
            state: CellState::Hidden,
            is_mine: false,
            is_active,
            adjacent_mines: 0,
        }
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn is_mine(&self) -> bool {
        self.is_mine
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Number of active mined neighbours. Always zero on a mine.
    pub fn adjacent_mines(&self) -> u8 {
        self.adjacent_mines
    }

    pub fn is_hidden(&self) -> bool {
        self.state == CellState::Hidden
    }

    pub fn is_flagged(&self) -> bool {
        self.state == CellState::Flagged
    }

    pub fn is_revealed(&self) -> bool {
        self.state == CellState::Revealed
    }

    pub(crate) fn set_state(&mut self, state: CellState) {
        self.state = state;
    }
}

/// The grid of cells behind an engine. Inactive cells never carry mines and
/// are skipped by neighbour iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    mask: Mask,
}

impl Board {
    /// A mine-free board shaped by `mask`, every cell hidden.
    pub fn new(mask: Mask) -> Self {
        let cells = Array2::from_shape_fn((mask.height(), mask.width()), |(row, col)| {
            Cell::new(mask.is_active(Position::new(row, col)))
        });
        Self { cells, mask }
    }

    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn get(&self, pos: Position) -> Option<&Cell> {
        self.cells.get(pos.index())
    }

    pub(crate) fn get_mut(&mut self, pos: Position) -> Option<&mut Cell> {
        self.cells.get_mut(pos.index())
    }

    /// In-bounds, active neighbours of `pos`.
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        pos.neighbors()
            .filter(move |&p| self.get(p).is_some_and(Cell::is_active))
    }

    /// Every cell with its position, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((row, col), cell)| (Position::new(row, col), cell))
    }

    pub fn mine_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_mine).count()
    }

    pub fn count_adjacent_mines(&self, pos: Position) -> u8 {
        self.count_neighbors(pos, |cell| cell.is_mine)
    }

    pub fn count_adjacent_flags(&self, pos: Position) -> u8 {
        self.count_neighbors(pos, Cell::is_flagged)
    }

    fn count_neighbors(&self, pos: Position, pred: impl Fn(&Cell) -> bool) -> u8 {
        self.neighbors(pos)
            .filter(|&p| self.get(p).is_some_and(&pred))
            .count() as u8
    }

    /// Places `mines` mines at random and returns how many were placed.
    ///
    /// A full mask uses rejection sampling over the whole rectangle, which
    /// never terminates if `mines` exceeds the cell count. A partial mask
    /// shuffles the active positions and mines the first `mines` of them,
    /// capping at the number of active cells.
    pub(crate) fn place_random_mines<R: Rng + ?Sized>(&mut self, mines: usize, rng: &mut R) -> usize {
        if self.mask.is_full() {
            self.place_by_rejection(mines, rng)
        } else {
            self.place_by_shuffle(mines, rng)
        }
    }

    fn place_by_rejection<R: Rng + ?Sized>(&mut self, mines: usize, rng: &mut R) -> usize {
        let (height, width) = (self.height(), self.width());
        let mut mines_placed = 0;

        while mines_placed < mines {
            let pos = Position::new(rng.gen_range(0..height), rng.gen_range(0..width));
            if let Some(cell) = self.get_mut(pos) {
                if !cell.is_mine {
                    cell.is_mine = true;
                    mines_placed += 1;
                }
            }
        }
        mines_placed
    }

    fn place_by_shuffle<R: Rng + ?Sized>(&mut self, mines: usize, rng: &mut R) -> usize {
        let mut candidates = self.mask.active_positions();
        candidates.shuffle(rng);
        self.place_mines_at(candidates.into_iter().take(mines))
    }

    /// Mines exactly the given positions, ignoring inactive, out-of-bounds,
    /// and repeated ones. Returns how many mines were placed.
    pub(crate) fn place_mines_at(&mut self, positions: impl IntoIterator<Item = Position>) -> usize {
        let mut mines_placed = 0;
        for pos in positions {
            if let Some(cell) = self.get_mut(pos) {
                if cell.is_active && !cell.is_mine {
                    cell.is_mine = true;
                    mines_placed += 1;
                }
            }
        }
        mines_placed
    }

    /// Fills in `adjacent_mines` for every active non-mine cell.
    pub(crate) fn compute_adjacency(&mut self) {
        let counts = Array2::from_shape_fn(self.cells.dim(), |(row, col)| {
            let pos = Position::new(row, col);
            match self.get(pos) {
                Some(cell) if cell.is_active && !cell.is_mine => self.count_adjacent_mines(pos),
                _ => 0,
            }
        });
        ndarray::Zip::from(&mut self.cells)
            .and(&counts)
            .for_each(|cell, &count| cell.adjacent_mines = count);
    }
}
