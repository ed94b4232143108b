use crate::{ConfigError, Engine, Mask};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A validated rectangular game: non-zero dimensions and at least one safe
/// cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    pub mines: usize,
}

impl GameConfig {
    pub fn new(width: usize, height: usize, mines: usize) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::ZeroDimension { width, height });
        }
        check_mines(mines, width * height)?;
        Ok(Self {
            width,
            height,
            mines,
        })
    }

    pub fn total_cells(&self) -> usize {
        self.width * self.height
    }

    pub fn engine(&self) -> Engine {
        Engine::from_config(*self)
    }
}

fn check_mines(mines: usize, cells: usize) -> Result<(), ConfigError> {
    if mines >= cells {
        return Err(ConfigError::TooManyMines { mines, cells });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Expert,
    Custom,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Self::Beginner,
        Self::Intermediate,
        Self::Expert,
        Self::Custom,
    ];

    /// The preset board. `Custom` starts from the beginner layout.
    pub fn config(self) -> GameConfig {
        let (width, height, mines) = match self {
            Self::Beginner | Self::Custom => (9, 9, 10),
            Self::Intermediate => (16, 16, 40),
            Self::Expert => (16, 30, 99),
        };
        GameConfig {
            width,
            height,
            mines,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Expert => "Expert",
            Self::Custom => "Custom",
        })
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::UnknownDifficulty(s.to_owned()))
    }
}

/// A shaped level played in masked mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryLevel {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub mask: Mask,
    pub mines: usize,
}

impl StoryLevel {
    pub fn new(
        id: u32,
        title: impl Into<String>,
        description: impl Into<String>,
        mask: Mask,
        mines: usize,
    ) -> Result<Self, ConfigError> {
        let level = Self {
            id,
            title: title.into(),
            description: description.into(),
            mask,
            mines,
        };
        level.validate()?;
        Ok(level)
    }

    pub fn first_steps() -> Self {
        Self {
            id: 1,
            title: "First Steps".to_owned(),
            description: "A diamond-shaped puzzle to learn the ropes.".to_owned(),
            mask: Mask::diamond(7),
            mines: 5,
        }
    }

    /// The built-in levels in play order.
    pub fn all() -> Vec<StoryLevel> {
        vec![Self::first_steps()]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_mines(self.mines, self.mask.active_count())
    }

    pub fn engine(&self) -> Engine {
        Engine::with_mask(self.mask.clone(), self.mines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MaskError;

    #[test]
    fn test_presets() {
        assert_eq!(Difficulty::Beginner.config(), GameConfig::new(9, 9, 10).unwrap());
        assert_eq!(Difficulty::Intermediate.config().mines, 40);

        let expert = Difficulty::Expert.config();
        assert_eq!((expert.width, expert.height, expert.mines), (16, 30, 99));
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(
            GameConfig::new(0, 5, 1),
            Err(ConfigError::ZeroDimension {
                width: 0,
                height: 5
            })
        );
        assert_eq!(
            GameConfig::new(3, 3, 9),
            Err(ConfigError::TooManyMines { mines: 9, cells: 9 })
        );
        assert!(GameConfig::new(3, 3, 8).is_ok());
    }

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!("expert".parse::<Difficulty>(), Ok(Difficulty::Expert));
        assert_eq!("Beginner".parse::<Difficulty>(), Ok(Difficulty::Beginner));
        assert_eq!(
            "insane".parse::<Difficulty>(),
            Err(ConfigError::UnknownDifficulty("insane".into()))
        );
    }

    #[test]
    fn test_story_levels_validate() {
        for level in StoryLevel::all() {
            assert!(level.validate().is_ok(), "{} is unplayable", level.title);
        }

        let tiny: Mask = "#.\n.#".parse().unwrap();
        assert_eq!(
            StoryLevel::new(9, "Tiny", "", tiny, 2),
            Err(ConfigError::TooManyMines { mines: 2, cells: 2 })
        );
    }

    #[test]
    fn test_mask_errors_convert() {
        let err: ConfigError = "".parse::<Mask>().unwrap_err().into();
        assert_eq!(err, ConfigError::Mask(MaskError::Empty));
    }

    #[test]
    fn test_story_engine_uses_mask() {
        let mut engine = StoryLevel::first_steps().engine();
        engine.start_new_game();
        assert_eq!((engine.width(), engine.height()), (7, 7));
        assert_eq!(engine.board().mine_count(), 5);
    }
}
