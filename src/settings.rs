//! Player preferences
//!
//! Persisted as JSON in the key-value store, separately from the high score.

use serde::{Deserialize, Serialize};

use crate::input::KeyBindings;
use crate::persistence::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub key_bindings: KeyBindings,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    /// Pause a running game when the window loses focus
    pub pause_on_blur: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            key_bindings: KeyBindings::default(),
            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            pause_on_blur: true,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "astro_drift_settings";

    /// Combined output volume
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume.clamp(0.0, 1.0) * self.sfx_volume.clamp(0.0, 1.0)
        }
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings");
                    settings
                }
                Err(e) => {
                    log::warn!("Discarding unreadable settings: {e}");
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Settings unavailable: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) {
        let result = serde_json::to_string(self)
            .map_err(crate::error::EngineError::from)
            .and_then(|json| store.set(Self::STORAGE_KEY, &json));
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Settings not saved: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Action;
    use crate::persistence::{MemoryStore, UnavailableStore};

    #[test]
    fn test_roundtrip_through_store() {
        let mut store = MemoryStore::new();
        let mut settings = Settings::default();
        settings.muted = true;
        settings.pause_on_blur = false;
        settings.key_bindings.bind("k", Action::Fire);
        settings.save(&mut store);

        let loaded = Settings::load(&store);
        assert_eq!(loaded, settings);
        assert_eq!(loaded.effective_volume(), 0.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let mut store = MemoryStore::new();
        store
            .set(Settings::STORAGE_KEY, r#"{ "master_volume": 0.5 }"#)
            .unwrap();
        let loaded = Settings::load(&store);
        assert_eq!(loaded.master_volume, 0.5);
        assert!(loaded.pause_on_blur);
        assert_eq!(loaded.key_bindings, KeyBindings::default());
    }

    #[test]
    fn test_failures_fall_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.set(Settings::STORAGE_KEY, "not json").unwrap();
        assert_eq!(Settings::load(&store), Settings::default());
        assert_eq!(Settings::load(&UnavailableStore), Settings::default());
        Settings::default().save(&mut UnavailableStore);
    }
}
