use crate::{Cell, CellState};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

pub const FLAG_GLYPH: &str = "🚩";
pub const MINE_GLYPH: &str = "💣";

/// Presentation category of a cell, independent of any particular palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellColor {
    /// Outside the playable shape.
    Inactive,
    Hidden,
    Flagged,
    Mine,
    /// A revealed cell with no adjacent mines.
    Revealed,
    /// A revealed cell showing 1 through 8.
    Number(u8),
}

impl Cell {
    /// The text shown on this cell.
    pub fn display_text(&self) -> Cow<'static, str> {
        match self.state() {
            CellState::Flagged => Cow::Borrowed(FLAG_GLYPH),
            CellState::Hidden => Cow::Borrowed(""),
            CellState::Revealed if self.is_mine() => Cow::Borrowed(MINE_GLYPH),
            CellState::Revealed if self.adjacent_mines() == 0 => Cow::Borrowed(""),
            CellState::Revealed => Cow::Owned(self.adjacent_mines().to_string()),
        }
    }

    pub fn color(&self) -> CellColor {
        if !self.is_active() {
            return CellColor::Inactive;
        }
        match self.state() {
            CellState::Flagged => CellColor::Flagged,
            CellState::Hidden => CellColor::Hidden,
            CellState::Revealed if self.is_mine() => CellColor::Mine,
            CellState::Revealed => match self.adjacent_mines() {
                n @ 1..=8 => CellColor::Number(n),
                _ => CellColor::Revealed,
            },
        }
    }
}
