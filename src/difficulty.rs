//! Difficulty presets and per-game engine configuration

use crate::board::{BOARD_HEIGHT, BOARD_WIDTH, MAX_COLORS};
use crate::groups::DEFAULT_MIN_GROUP;
use crate::piece::FRAME;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Available difficulties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
    VeryHard,
}

impl Difficulty {
    pub fn name(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::VeryHard => "Very Hard",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Difficulty::Easy => "4 colors, relaxed fall",
            Difficulty::Medium => "5 colors",
            Difficulty::Hard => "6 colors, quick fall",
            Difficulty::VeryHard => "7 colors, fastest fall",
        }
    }

    /// Number of colors pieces are drawn from
    pub fn max_colors(&self) -> u8 {
        match self {
            Difficulty::Easy => 4,
            Difficulty::Medium => 5,
            Difficulty::Hard => 6,
            Difficulty::VeryHard => 7,
        }
    }

    /// Fall interval at level 0 before level scaling
    pub fn base_fall_interval(&self) -> Duration {
        match self {
            Difficulty::Easy => Duration::from_millis(1000),
            Difficulty::Medium => Duration::from_millis(800),
            Difficulty::Hard => Duration::from_millis(600),
            Difficulty::VeryHard => Duration::from_millis(450),
        }
    }

    pub fn all() -> &'static [Difficulty] {
        &[
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::VeryHard,
        ]
    }
}

/// Rejected engine configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("board must be at least {min}x{min} cells, got {width}x{height}")]
    BoardTooSmall {
        width: usize,
        height: usize,
        min: usize,
    },
    #[error("minimum group size must be at least 2, got {0}")]
    GroupTooSmall(usize),
    #[error("color count must be between 1 and {max}, got {got}")]
    ColorCount { got: u8, max: u8 },
}

/// Fixed for the lifetime of one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub width: usize,
    pub height: usize,
    pub min_group_size: usize,
    pub max_colors: u8,
    pub base_fall_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::for_difficulty(Difficulty::default())
    }
}

impl EngineConfig {
    /// Standard board with the difficulty's colors and speed
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            min_group_size: DEFAULT_MIN_GROUP,
            max_colors: difficulty.max_colors(),
            base_fall_interval: difficulty.base_fall_interval(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < FRAME || self.height < FRAME {
            return Err(ConfigError::BoardTooSmall {
                width: self.width,
                height: self.height,
                min: FRAME,
            });
        }
        if self.min_group_size < 2 {
            return Err(ConfigError::GroupTooSmall(self.min_group_size));
        }
        if !(1..=MAX_COLORS).contains(&self.max_colors) {
            return Err(ConfigError::ColorCount {
                got: self.max_colors,
                max: MAX_COLORS,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let colors: Vec<_> = Difficulty::all().iter().map(|d| d.max_colors()).collect();
        assert_eq!(colors, vec![4, 5, 6, 7]);
        let intervals: Vec<_> = Difficulty::all()
            .iter()
            .map(|d| d.base_fall_interval())
            .collect();
        assert!(intervals.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_presets_are_valid() {
        for &difficulty in Difficulty::all() {
            assert_eq!(EngineConfig::for_difficulty(difficulty).validate(), Ok(()));
        }
    }

    #[test]
    fn test_rejects_bad_config() {
        let base = EngineConfig::default();
        let small = EngineConfig {
            width: 2,
            ..base.clone()
        };
        assert!(matches!(
            small.validate(),
            Err(ConfigError::BoardTooSmall { width: 2, .. })
        ));
        let group = EngineConfig {
            min_group_size: 1,
            ..base.clone()
        };
        assert_eq!(group.validate(), Err(ConfigError::GroupTooSmall(1)));
        let colors = EngineConfig {
            max_colors: 8,
            ..base
        };
        assert_eq!(
            colors.validate(),
            Err(ConfigError::ColorCount { got: 8, max: 7 })
        );
    }

    #[test]
    fn test_error_messages() {
        let err = ConfigError::GroupTooSmall(1);
        assert_eq!(err.to_string(), "minimum group size must be at least 2, got 1");
    }

    #[test]
    fn test_serde_names() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            difficulty: Difficulty,
        }
        let text = toml::to_string(&Wrapper {
            difficulty: Difficulty::VeryHard,
        })
        .unwrap();
        assert_eq!(text.trim(), "difficulty = \"very_hard\"");
        let back: Wrapper = toml::from_str(&text).unwrap();
        assert_eq!(back.difficulty, Difficulty::VeryHard);
    }
}
