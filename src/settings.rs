//! Match settings chosen before kickoff
//!
//! Difficulty, format and player count. Everything here is fixed for the
//! lifetime of a match.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// AI difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// The three knobs a difficulty level maps to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Seconds the AI takes to close most of the gap to its target
    pub reaction_delay: f32,
    /// Positional and predictive accuracy in (0, 1]
    pub accuracy: f32,
    /// Chance per second of starting an action when in range
    pub action_probability: f32,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Knobs for this level (strictly monotonic from Easy to Hard)
    pub fn profile(&self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                reaction_delay: 0.45,
                accuracy: 0.55,
                action_probability: 2.0,
            },
            Difficulty::Medium => DifficultyProfile {
                reaction_delay: 0.25,
                accuracy: 0.75,
                action_probability: 5.0,
            },
            Difficulty::Hard => DifficultyProfile {
                reaction_delay: 0.12,
                accuracy: 0.9,
                action_probability: 12.0,
            },
        }
    }
}

/// How a match ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MatchFormat {
    /// First side to reach the target score wins
    FirstTo(u32),
    /// Higher score when the clock runs out wins; a tie goes to sudden death
    Timed { seconds: f32 },
}

impl Default for MatchFormat {
    fn default() -> Self {
        MatchFormat::FirstTo(5)
    }
}

impl MatchFormat {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            MatchFormat::FirstTo(0) => Err(ConfigError::InvalidFormat("target score must be at least 1")),
            MatchFormat::Timed { seconds } if !(seconds > 0.0) || !seconds.is_finite() => {
                Err(ConfigError::InvalidFormat("match length must be a positive number of seconds"))
            }
            _ => Ok(()),
        }
    }

    /// Clock length for timed formats
    pub fn duration(&self) -> Option<f32> {
        match *self {
            MatchFormat::Timed { seconds } => Some(seconds),
            MatchFormat::FirstTo(_) => None,
        }
    }
}

/// Everything picked on the settings screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSettings {
    /// Human players (0 = AI-only demo)
    pub player_count: usize,
    pub format: MatchFormat,
    pub difficulty: Difficulty,
    /// Seed for the match RNG
    pub seed: u64,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            player_count: 1,
            format: MatchFormat::default(),
            difficulty: Difficulty::default(),
            seed: 1,
        }
    }
}
