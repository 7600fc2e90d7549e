//! Astro Drift - a wrap-around asteroid field shooter
//!
//! Core modules:
//! - `sim`: Simulation (entities, physics, collisions, game state)
//! - `engine`: Frame loop, state machine, spawning and scoring
//! - `platform`: Clock and drawable-surface abstraction (browser/native)
//! - `persistence`: Key-value storage for the high score and settings
//! - `tuning`: Data-driven game balance

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod engine;
pub mod error;
pub mod highscores;
pub mod input;
pub mod math;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use engine::{
    Collaborators, Engine, EventQueue, Frame, GameEvents, Renderer, ScoreEvent, SoundSink,
    SoundTrigger,
};
pub use error::{EngineError, Result};
pub use settings::Settings;
pub use sim::{GameState, GameStatus};
pub use tuning::GameConfig;

use glam::Vec2;

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
