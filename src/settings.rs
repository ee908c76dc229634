//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/chainfall/settings.toml (or platform equivalent)

use crate::board::MAX_COLORS;
use crate::difficulty::{Difficulty, EngineConfig};
use crate::score::Score;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Entries kept per difficulty
pub const HIGH_SCORE_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to write settings: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Game settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub keys: KeyBindings,
    pub visual: VisualSettings,
    pub gameplay: GameplaySettings,
    pub high_scores: HighScores,
}

/// Key bindings (stored as strings for easy editing)
/// Each action can have one or more keys bound to it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub soft_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub hard_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate_cw: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate_ccw: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub pause: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
}

/// Accept either `"Left"` or `["Left", "h"]`
fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeysVisitor;

    impl<'de> Visitor<'de> for KeysVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a key name or a list of key names")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeysVisitor)
}

/// Write a lone binding back as a plain string
fn serialize_keys<S>(keys: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match keys {
        [only] => serializer.serialize_str(only),
        _ => serializer.collect_seq(keys),
    }
}

/// Visual settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    pub show_ghost: bool,
    /// "solid", "bracket" or "round"
    pub block_style: String,
    pub show_chain_banner: bool,
}

/// Gameplay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Delayed Auto Shift in milliseconds
    pub das_ms: u64,
    /// Auto Repeat Rate in milliseconds
    pub arr_ms: u64,
    pub difficulty: Difficulty,
    pub board_width: usize,
    pub board_height: usize,
    pub min_group_size: usize,
    /// Draw each wave and gravity pass instead of jumping to the result
    pub animate_cascade: bool,
    /// Pause after a wave is removed
    pub wave_delay_ms: u64,
    /// Pause after each gravity pass
    pub settle_delay_ms: u64,
}

/// Top scores for each difficulty, best first
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct HighScores {
    pub easy: Vec<ScoreEntry>,
    pub medium: Vec<ScoreEntry>,
    pub hard: Vec<ScoreEntry>,
    pub very_hard: Vec<ScoreEntry>,
}

impl HighScores {
    pub fn for_difficulty(&self, difficulty: Difficulty) -> &[ScoreEntry] {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
            Difficulty::VeryHard => &self.very_hard,
        }
    }

    fn for_difficulty_mut(&mut self, difficulty: Difficulty) -> &mut Vec<ScoreEntry> {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
            Difficulty::VeryHard => &mut self.very_hard,
        }
    }
}

/// A single high score entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreEntry {
    pub score: u64,
    pub level: u32,
    /// Groups cleared
    pub clears: u32,
    /// Date as YYYY-MM-DD
    pub date: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_left: vec!["Left".to_string(), "a".to_string()],
            move_right: vec!["Right".to_string(), "d".to_string()],
            soft_drop: vec!["Down".to_string(), "s".to_string()],
            hard_drop: vec!["Space".to_string()],
            rotate_cw: vec!["Up".to_string(), "x".to_string()],
            rotate_ccw: vec!["z".to_string()],
            pause: vec!["p".to_string(), "Esc".to_string()],
            quit: vec!["q".to_string()],
        }
    }
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            show_ghost: true,
            block_style: "solid".to_string(),
            show_chain_banner: true,
        }
    }
}

impl Default for GameplaySettings {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            das_ms: 170,
            arr_ms: 50,
            difficulty: Difficulty::default(),
            board_width: engine.width,
            board_height: engine.height,
            min_group_size: engine.min_group_size,
            animate_cascade: true,
            wave_delay_ms: 400,
            settle_delay_ms: 25,
        }
    }
}

impl GameplaySettings {
    /// Engine configuration for a new game with these settings
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            width: self.board_width,
            height: self.board_height,
            min_group_size: self.min_group_size,
            ..EngineConfig::for_difficulty(self.difficulty)
        }
    }

    pub fn wave_delay(&self) -> Duration {
        Duration::from_millis(self.wave_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "chainfall", "chainfall")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from file, or fall back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml(&contents),
            Err(_) => Self::default(),
        }
    }

    /// Parse settings text; anything unreadable becomes the default
    pub fn from_toml(contents: &str) -> Self {
        toml::from_str(contents).unwrap_or_else(|err| {
            warn!(%err, "ignoring unreadable settings file");
            Self::default()
        })
    }

    /// Save settings to file
    pub fn save(&self) -> Result<(), SettingsError> {
        let dir = Self::config_dir().ok_or(SettingsError::NoConfigDir)?;
        fs::create_dir_all(&dir)?;
        let contents = toml::to_string_pretty(self)?;
        fs::write(dir.join("settings.toml"), contents)?;
        Ok(())
    }

    /// Record a finished game. Returns its rank (0 = best) if it made the table.
    pub fn add_high_score(&mut self, difficulty: Difficulty, score: &Score) -> Option<usize> {
        if score.points == 0 {
            return None;
        }
        let entry = ScoreEntry {
            score: score.points,
            level: score.level,
            clears: score.clears,
            date: today(),
        };
        let table = self.high_scores.for_difficulty_mut(difficulty);
        // Ties keep the older entry on top
        let rank = table.partition_point(|e| e.score >= entry.score);
        if rank >= HIGH_SCORE_LIMIT {
            return None;
        }
        table.insert(rank, entry);
        table.truncate(HIGH_SCORE_LIMIT);
        Some(rank)
    }

    pub fn best_score(&self, difficulty: Difficulty) -> Option<u64> {
        self.high_scores
            .for_difficulty(difficulty)
            .first()
            .map(|e| e.score)
    }

    /// Clamp values a hand-edited file may have pushed out of range
    pub fn sanitize(&mut self) {
        let g = &mut self.gameplay;
        g.board_width = g.board_width.clamp(3, 40);
        g.board_height = g.board_height.clamp(3, 60);
        g.min_group_size = g.min_group_size.clamp(2, MAX_COLORS as usize * 2);
        g.das_ms = g.das_ms.min(1000);
        g.arr_ms = g.arr_ms.clamp(1, 500);
    }
}

impl VisualSettings {
    /// Get the (filled, ghost) block characters for the style
    pub fn block_chars(&self) -> (&'static str, &'static str) {
        match self.block_style.as_str() {
            "bracket" => ("[]", "::"),
            "round" => ("()", "::"),
            _ => ("██", "░░"),
        }
    }
}

/// Current local date as YYYY-MM-DD
fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
