//! Keyboard input
//!
//! Host event handlers feed raw key names into [`InputState`]. Continuous
//! actions are read once per frame through a [`HeldInput`] snapshot; one-shot
//! actions (pause, start, restart) are reported on the press edge.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Gameplay actions a key can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    RotateLeft,
    RotateRight,
    Thrust,
    Fire,
    /// Toggle pause while playing or paused
    Pause,
    /// Start from the menu, restart after game over
    Start,
    /// Restart after game over
    Restart,
}

impl Action {
    /// Actions handled on the press edge rather than while held
    pub fn is_one_shot(self) -> bool {
        matches!(self, Action::Pause | Action::Start | Action::Restart)
    }
}

/// Key name (as reported by the host, e.g. `ArrowLeft`, `a`, ` `) to action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindings {
    pub keys: BTreeMap<String, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = [
            ("ArrowLeft", Action::RotateLeft),
            ("a", Action::RotateLeft),
            ("ArrowRight", Action::RotateRight),
            ("d", Action::RotateRight),
            ("ArrowUp", Action::Thrust),
            ("w", Action::Thrust),
            (" ", Action::Fire),
            ("p", Action::Pause),
            ("Escape", Action::Pause),
            ("Enter", Action::Start),
            ("r", Action::Restart),
        ]
        .into_iter()
        .map(|(k, a)| (k.to_string(), a))
        .collect();
        Self { keys }
    }
}

impl KeyBindings {
    /// Exact match first, then case-insensitive for single characters
    pub fn action_for(&self, key: &str) -> Option<Action> {
        if let Some(action) = self.keys.get(key) {
            return Some(*action);
        }
        if key.chars().count() == 1 {
            return self.keys.get(&key.to_lowercase()).copied();
        }
        None
    }

    pub fn bind(&mut self, key: impl Into<String>, action: Action) {
        self.keys.insert(key.into(), action);
    }
}

/// Continuous actions held during one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeldInput {
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub thrust: bool,
    pub fire: bool,
}

impl HeldInput {
    /// -1 for left, +1 for right, 0 when neither or both are held
    pub fn turn(&self) -> f32 {
        match (self.rotate_left, self.rotate_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Held-set name for a key: single characters fold to lowercase so a
/// Shift change between press and release still matches
fn held_name(key: &str) -> String {
    if key.chars().count() == 1 {
        key.to_lowercase()
    } else {
        key.to_string()
    }
}

/// Currently held keys
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: BTreeSet<String>,
}

impl InputState {
    /// Record a key press; returns the action only on the press edge
    pub fn press(&mut self, key: &str, bindings: &KeyBindings) -> Option<Action> {
        let action = bindings.action_for(key)?;
        if self.held.insert(held_name(key)) {
            Some(action)
        } else {
            None
        }
    }

    pub fn release(&mut self, key: &str) {
        self.held.remove(&held_name(key));
    }

    /// Drop every held key (focus loss: key-ups may never arrive)
    pub fn clear(&mut self) {
        self.held.clear();
    }

    /// Drop held steering/thrust/fire keys but keep one-shot keys until
    /// their key-up, so auto-repeat is not mistaken for a new press
    pub fn release_continuous(&mut self, bindings: &KeyBindings) {
        self.held
            .retain(|k| bindings.action_for(k).is_none_or(|a| a.is_one_shot()));
    }

    pub fn snapshot(&self, bindings: &KeyBindings) -> HeldInput {
        let mut input = HeldInput::default();
        for action in self.held.iter().filter_map(|k| bindings.action_for(k)) {
            match action {
                Action::RotateLeft => input.rotate_left = true,
                Action::RotateRight => input.rotate_right = true,
                Action::Thrust => input.thrust = true,
                Action::Fire => input.fire = true,
                Action::Pause | Action::Start | Action::Restart => {}
            }
        }
        input
    }
}
