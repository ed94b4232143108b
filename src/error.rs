use thiserror::Error;

/// Problems with a board shape supplied as rows or ASCII art.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaskError {
    #[error("Mask has no cells")]
    Empty,
    #[error("Mask row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unexpected character {found:?} in mask row {row}")]
    InvalidChar { row: usize, found: char },
}

/// Rejected game configurations. The engine trusts its inputs, so these are
/// raised by the configuration layer before an engine is built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Board dimensions must be non-zero, got {width}x{height}")]
    ZeroDimension { width: usize, height: usize },
    #[error("Too many mines ({mines}) for {cells} playable cells")]
    TooManyMines { mines: usize, cells: usize },
    #[error("Unknown difficulty {0:?}")]
    UnknownDifficulty(String),
    #[error(transparent)]
    Mask(#[from] MaskError),
}
