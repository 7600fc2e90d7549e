//! Central game-state record
//!
//! Owned and mutated only by the engine; collaborators receive copies.

use serde::{Deserialize, Serialize};

/// Top-level game state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    /// Waiting for the player to start
    Menu,
    /// Active gameplay
    Playing,
    /// Simulation frozen by the player
    Paused,
    /// Between-level transition
    Loading,
    /// Lives exhausted; waits for a restart
    GameOver,
}

impl GameStatus {
    /// States in which entities are updated
    pub fn runs_physics(self) -> bool {
        matches!(self, GameStatus::Playing | GameStatus::Loading)
    }

    /// States in which delayed callbacks count down
    pub fn advances_timers(self) -> bool {
        self.runs_physics()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub score: u64,
    pub lives: u32,
    /// Current level (1-based)
    pub level: u32,
    pub status: GameStatus,
    pub high_score: u64,
    /// Bonus awarded for the most recently cleared level
    pub last_level_bonus: Option<u64>,
}

impl GameState {
    pub fn new(lives: u32, high_score: u64) -> Self {
        Self {
            score: 0,
            lives,
            level: 1,
            status: GameStatus::Menu,
            high_score,
            last_level_bonus: None,
        }
    }

    /// Fresh run: keeps only the high score
    pub fn reset(&mut self, lives: u32) {
        *self = Self {
            status: self.status,
            ..Self::new(lives, self.high_score)
        };
    }

    /// Add points; returns true if this raised the high score
    pub fn add_score(&mut self, points: u64) -> bool {
        self.score = self.score.saturating_add(points);
        if self.score > self.high_score {
            self.high_score = self.score;
            return true;
        }
        false
    }
}
