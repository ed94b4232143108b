pub mod board;
pub mod config;
pub mod display;
pub mod error;
pub mod game;
pub mod mask;
pub mod position;
pub mod session;

pub use board::{Board, Cell, CellState};
pub use config::{Difficulty, GameConfig, StoryLevel};
pub use display::CellColor;
pub use error::{ConfigError, MaskError};
pub use game::{Engine, GameEvent, GameState, MoveKind, MoveOutcome, MoveRecord};
pub use mask::Mask;
pub use position::Position;
pub use session::{SessionLog, SessionRecord, Statistics};
