//! Web Audio synthesizer
//!
//! Every sound cue is a short list of oscillator tones with an exponential
//! decay envelope and an optional pitch sweep, so no audio files ship with
//! the game.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::engine::{SoundSink, SoundTrigger};
use crate::settings::Settings;

/// One oscillator voice
#[derive(Debug, Clone, Copy)]
struct Tone {
    wave: OscillatorType,
    freq: f32,
    /// Pitch at the end of the tone, if it sweeps
    sweep_to: Option<f32>,
    /// Peak gain relative to the effective volume
    level: f32,
    /// Start offset (s)
    delay: f64,
    /// Decay time (s)
    length: f64,
}

const fn tone(wave: OscillatorType, freq: f32, level: f32, delay: f64, length: f64) -> Tone {
    Tone {
        wave,
        freq,
        sweep_to: None,
        level,
        delay,
        length,
    }
}

const fn sweep(wave: OscillatorType, from: f32, to: f32, level: f32, length: f64) -> Tone {
    Tone {
        wave,
        freq: from,
        sweep_to: Some(to),
        level,
        delay: 0.0,
        length,
    }
}

use OscillatorType::{Sawtooth, Sine, Square, Triangle};

const BULLET_FIRE: &[Tone] = &[sweep(Square, 880.0, 220.0, 0.15, 0.08)];
const ASTEROID_SPLIT: &[Tone] = &[
    sweep(Sawtooth, 140.0, 50.0, 0.4, 0.25),
    sweep(Square, 900.0, 300.0, 0.1, 0.06),
];
const ASTEROID_DESTRUCTION: &[Tone] = &[sweep(Sawtooth, 220.0, 80.0, 0.3, 0.18)];
const SHIP_DESTROYED: &[Tone] = &[
    sweep(Sawtooth, 110.0, 25.0, 0.55, 0.7),
    sweep(Square, 1400.0, 200.0, 0.2, 0.2),
];
const SHIP_RESPAWN: &[Tone] = &[sweep(Triangle, 220.0, 660.0, 0.3, 0.3)];
const GAME_START: &[Tone] = &[
    tone(Triangle, 330.0, 0.3, 0.0, 0.15),
    tone(Triangle, 440.0, 0.3, 0.12, 0.15),
    tone(Triangle, 660.0, 0.3, 0.24, 0.3),
];
const GAME_OVER: &[Tone] = &[
    tone(Sine, 392.0, 0.3, 0.0, 0.3),
    tone(Sine, 330.0, 0.3, 0.25, 0.3),
    tone(Sine, 262.0, 0.3, 0.5, 0.3),
    tone(Sine, 196.0, 0.3, 0.75, 0.6),
];
const PAUSE: &[Tone] = &[tone(Sine, 520.0, 0.2, 0.0, 0.1), tone(Sine, 390.0, 0.2, 0.08, 0.12)];
const UNPAUSE: &[Tone] = &[tone(Sine, 390.0, 0.2, 0.0, 0.1), tone(Sine, 520.0, 0.2, 0.08, 0.12)];
const LEVEL_COMPLETION: &[Tone] = &[
    tone(Triangle, 440.0, 0.3, 0.0, 0.35),
    tone(Triangle, 550.0, 0.3, 0.1, 0.35),
    tone(Triangle, 660.0, 0.3, 0.2, 0.35),
    tone(Triangle, 880.0, 0.3, 0.3, 0.5),
];
const NEW_HIGH_SCORE: &[Tone] = &[
    tone(Triangle, 523.0, 0.25, 0.0, 0.2),
    tone(Triangle, 659.0, 0.25, 0.08, 0.2),
    tone(Triangle, 784.0, 0.25, 0.16, 0.2),
    tone(Triangle, 1047.0, 0.25, 0.24, 0.35),
];
const SAUCER_SPAWN: &[Tone] = &[
    sweep(Sine, 300.0, 600.0, 0.15, 0.25),
    Tone {
        delay: 0.25,
        ..sweep(Sine, 600.0, 300.0, 0.15, 0.25)
    },
];
const SAUCER_FIRE: &[Tone] = &[sweep(Square, 600.0, 150.0, 0.12, 0.1)];
const SAUCER_DESTROYED: &[Tone] = &[
    sweep(Sawtooth, 180.0, 40.0, 0.5, 0.45),
    sweep(Triangle, 1200.0, 400.0, 0.2, 0.3),
];

fn recipe(trigger: SoundTrigger) -> &'static [Tone] {
    match trigger {
        SoundTrigger::BulletFire => BULLET_FIRE,
        SoundTrigger::AsteroidSplit => ASTEROID_SPLIT,
        SoundTrigger::AsteroidDestruction => ASTEROID_DESTRUCTION,
        SoundTrigger::ShipDestroyed => SHIP_DESTROYED,
        SoundTrigger::ShipRespawn => SHIP_RESPAWN,
        SoundTrigger::GameStart => GAME_START,
        SoundTrigger::GameOver => GAME_OVER,
        SoundTrigger::Pause => PAUSE,
        SoundTrigger::Unpause => UNPAUSE,
        SoundTrigger::LevelCompletion => LEVEL_COMPLETION,
        SoundTrigger::NewHighScore => NEW_HIGH_SCORE,
        SoundTrigger::SaucerSpawn => SAUCER_SPAWN,
        SoundTrigger::SaucerFire => SAUCER_FIRE,
        SoundTrigger::SaucerDestroyed => SAUCER_DESTROYED,
    }
}

/// Owns the audio context and output volume
pub struct AudioManager {
    ctx: Option<AudioContext>,
    volume: f32,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // Fails outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            volume: settings.effective_volume(),
        }
    }

    /// Oscillator routed through a fresh gain node to the output
    fn create_osc(
        ctx: &AudioContext,
        freq: f32,
        wave: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(wave);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    fn play_tone(ctx: &AudioContext, tone: &Tone, volume: f32) {
        let Some((osc, gain)) = Self::create_osc(ctx, tone.freq, tone.wave) else {
            return;
        };
        let t = ctx.current_time() + tone.delay;
        let end = t + tone.length;

        gain.gain().set_value_at_time(volume * tone.level, t).ok();
        gain.gain().exponential_ramp_to_value_at_time(0.01, end).ok();
        if let Some(to) = tone.sweep_to {
            osc.frequency().set_value_at_time(tone.freq, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(to, end)
                .ok();
        }

        osc.start_with_when(t).ok();
        osc.stop_with_when(end + 0.05).ok();
    }
}

impl SoundSink for AudioManager {
    fn play(&mut self, trigger: SoundTrigger) {
        if self.volume <= 0.0 {
            return;
        }
        let Some(ctx) = &self.ctx else { return };

        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }
        for tone in recipe(trigger) {
            Self::play_tone(ctx, tone, self.volume);
        }
    }
}
