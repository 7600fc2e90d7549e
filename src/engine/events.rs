//! Collaborator interfaces
//!
//! The engine reports state changes to a [`GameEvents`] bundle, named sound
//! triggers to a [`SoundSink`], and a per-frame [`Frame`] snapshot to a
//! [`Renderer`]. None of them can fail or feed back into the simulation.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use glam::Vec2;
use serde::Serialize;

use crate::sim::{AsteroidSize, Entity, GameState, SaucerSize};

/// Why the score changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ScoreEvent {
    Asteroid { size: AsteroidSize, points: u64 },
    Saucer { size: SaucerSize, points: u64 },
    /// Bonus for clearing `level`
    LevelBonus { level: u32, points: u64 },
}

impl ScoreEvent {
    pub fn points(&self) -> u64 {
        match *self {
            ScoreEvent::Asteroid { points, .. }
            | ScoreEvent::Saucer { points, .. }
            | ScoreEvent::LevelBonus { points, .. } => points,
        }
    }
}

/// Game-state callbacks; every method defaults to doing nothing
pub trait GameEvents {
    fn on_game_state_change(&mut self, _state: &GameState) {}
    /// `event` is `None` when the score was reset
    fn on_score_change(&mut self, _score: u64, _event: Option<ScoreEvent>) {}
    fn on_lives_change(&mut self, _lives: u32) {}
    fn on_level_change(&mut self, _level: u32) {}
    fn on_game_over(&mut self, _final_score: u64) {}
}

/// Ignores every callback
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl GameEvents for NoEvents {}

/// One recorded [`GameEvents`] callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    StateChanged(GameState),
    ScoreChanged {
        score: u64,
        event: Option<ScoreEvent>,
    },
    LivesChanged(u32),
    LevelChanged(u32),
    GameOver(u64),
}

impl GameEvent {
    pub fn deliver(self, sink: &mut dyn GameEvents) {
        match self {
            GameEvent::StateChanged(state) => sink.on_game_state_change(&state),
            GameEvent::ScoreChanged { score, event } => sink.on_score_change(score, event),
            GameEvent::LivesChanged(lives) => sink.on_lives_change(lives),
            GameEvent::LevelChanged(level) => sink.on_level_change(level),
            GameEvent::GameOver(score) => sink.on_game_over(score),
        }
    }
}

/// Holds callbacks until the engine is no longer borrowed
///
/// Hosts that share the engine behind `Rc<RefCell<_>>` hand a clone to the
/// engine and call [`EventQueue::dispatch`] once their borrow ends, so a
/// handler may call back into the engine. Clones share one queue.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    pending: Rc<RefCell<VecDeque<GameEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }

    /// Deliver in order, including events queued by the handlers themselves
    pub fn dispatch(&self, sink: &mut dyn GameEvents) {
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            event.deliver(sink);
        }
    }

    fn push(&self, event: GameEvent) {
        self.pending.borrow_mut().push_back(event);
    }
}

impl GameEvents for EventQueue {
    fn on_game_state_change(&mut self, state: &GameState) {
        self.push(GameEvent::StateChanged(*state));
    }

    fn on_score_change(&mut self, score: u64, event: Option<ScoreEvent>) {
        self.push(GameEvent::ScoreChanged { score, event });
    }

    fn on_lives_change(&mut self, lives: u32) {
        self.push(GameEvent::LivesChanged(lives));
    }

    fn on_level_change(&mut self, level: u32) {
        self.push(GameEvent::LevelChanged(level));
    }

    fn on_game_over(&mut self, final_score: u64) {
        self.push(GameEvent::GameOver(final_score));
    }
}

/// Named sound cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SoundTrigger {
    BulletFire,
    AsteroidSplit,
    AsteroidDestruction,
    ShipDestroyed,
    ShipRespawn,
    GameStart,
    GameOver,
    Pause,
    Unpause,
    LevelCompletion,
    NewHighScore,
    SaucerSpawn,
    SaucerFire,
    SaucerDestroyed,
}

impl SoundTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundTrigger::BulletFire => "bulletFire",
            SoundTrigger::AsteroidSplit => "asteroidSplit",
            SoundTrigger::AsteroidDestruction => "asteroidDestruction",
            SoundTrigger::ShipDestroyed => "shipDestroyed",
            SoundTrigger::ShipRespawn => "shipRespawn",
            SoundTrigger::GameStart => "gameStart",
            SoundTrigger::GameOver => "gameOver",
            SoundTrigger::Pause => "pause",
            SoundTrigger::Unpause => "unpause",
            SoundTrigger::LevelCompletion => "levelCompletion",
            SoundTrigger::NewHighScore => "newHighScore",
            SoundTrigger::SaucerSpawn => "saucerSpawn",
            SoundTrigger::SaucerFire => "saucerFire",
            SoundTrigger::SaucerDestroyed => "saucerDestroyed",
        }
    }
}

pub trait SoundSink {
    fn play(&mut self, trigger: SoundTrigger);
}

/// Discards every trigger
#[derive(Debug, Clone, Copy, Default)]
pub struct Silence;

impl SoundSink for Silence {
    fn play(&mut self, _trigger: SoundTrigger) {}
}

/// Everything a renderer needs for one frame
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame<'a> {
    pub state: GameState,
    pub bounds: Vec2,
    /// Active entities in collection order
    pub entities: Vec<&'a Entity>,
    /// False during the off phase of the invulnerability flash
    pub ship_visible: bool,
}

pub trait Renderer {
    fn render(&mut self, frame: &Frame<'_>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_names_match_serde() {
        for trigger in [
            SoundTrigger::BulletFire,
            SoundTrigger::AsteroidDestruction,
            SoundTrigger::LevelCompletion,
            SoundTrigger::NewHighScore,
            SoundTrigger::SaucerFire,
        ] {
            let json = serde_json::to_string(&trigger).unwrap();
            assert_eq!(json, format!("\"{}\"", trigger.as_str()));
        }
    }

    #[derive(Default)]
    struct Lives(Vec<u32>);

    impl GameEvents for Lives {
        fn on_lives_change(&mut self, lives: u32) {
            self.0.push(lives);
        }
    }

    #[test]
    fn test_queue_delivers_in_order_once() {
        let queue = EventQueue::new();
        let mut engine_side = queue.clone();
        engine_side.on_lives_change(3);
        engine_side.on_level_change(2);
        engine_side.on_lives_change(2);
        assert_eq!(queue.len(), 3);

        let mut sink = Lives::default();
        queue.dispatch(&mut sink);
        assert_eq!(sink.0, vec![3, 2]);
        assert!(queue.is_empty());
        queue.dispatch(&mut sink);
        assert_eq!(sink.0, vec![3, 2]);
    }

    #[test]
    fn test_score_event_points() {
        let e = ScoreEvent::LevelBonus {
            level: 3,
            points: 3000,
        };
        assert_eq!(e.points(), 3000);
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"type\":\"levelBonus\""));
    }
}
