//! Persisted high score
//!
//! A single integer under one key. Storage failures never reach the game:
//! a failed read is a high score of 0, a failed write is dropped.

use crate::persistence::KeyValueStore;

/// Storage key for the best score
pub const STORAGE_KEY: &str = "astro_drift_high_score";

/// Best score seen, backed by a key-value store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighScore {
    pub best: u64,
}

impl HighScore {
    /// Read the stored value, defaulting to 0 on any failure
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let best = match store.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw.trim().parse::<u64>().unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable high score {raw:?}: {e}");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                log::warn!("High score unavailable: {e}");
                0
            }
        };
        if best > 0 {
            log::info!("Loaded high score {best}");
        }
        Self { best }
    }

    /// Write the current best, dropping the write on failure
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        if let Err(e) = store.set(STORAGE_KEY, &self.best.to_string()) {
            log::warn!("High score not saved: {e}");
        }
    }
}
