//! Astro Drift entry point
//!
//! The browser build is driven from JavaScript through `WebGame`. Natively
//! there is no window: this runs a headless autopilot round and logs how it
//! went, which is handy for eyeballing balance changes.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Astro Drift (native, headless) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|json| astro_drift::GameConfig::from_json(&json).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config {path}: {e}");
                std::process::exit(1);
            }
        },
        None => astro_drift::GameConfig::default(),
    };

    if let Err(e) = autopilot::run(config) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::init, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod autopilot {
    use astro_drift::platform::{HeadlessSurface, SystemClock};
    use astro_drift::sim::Entity;
    use astro_drift::{Collaborators, Engine, GameConfig, GameStatus, normalize_angle};

    const DT: f32 = 1.0 / 60.0;
    const MAX_FRAMES: u32 = 60 * 180;
    /// Aim tolerance (radians) before the autopilot opens fire
    const AIM_SLACK: f32 = 0.12;

    pub fn run(config: GameConfig) -> astro_drift::Result<()> {
        let (w, h) = (config.world.width, config.world.height);
        let collaborators = Collaborators::new(SystemClock::default()).with_seed(0xA57E);
        let mut engine = Engine::new(&HeadlessSurface::new(w, h), collaborators, config)?;

        engine.key_down("Enter");
        engine.key_up("Enter");

        let mut frames = 0;
        while frames < MAX_FRAMES && engine.game_state().status != GameStatus::GameOver {
            steer(&mut engine);
            engine.step(DT);
            frames += 1;
            if frames % 600 == 0 {
                let state = engine.game_state();
                log::info!(
                    "t={}s score={} lives={} level={}",
                    frames / 60,
                    state.score,
                    state.lives,
                    state.level
                );
            }
        }

        let state = engine.game_state();
        log::info!(
            "Finished after {:.1}s: {:?}, score {}, level {}, high score {}",
            frames as f32 * DT,
            state.status,
            state.score,
            state.level,
            state.high_score
        );
        engine.destroy();
        Ok(())
    }

    /// Turn toward the nearest asteroid and fire once roughly lined up
    fn steer(engine: &mut Engine) {
        let world = engine.world();
        let Some(ship) = world.ship().filter(|s| s.body.active) else {
            release_all(engine);
            return;
        };
        let (pos, rotation) = (ship.body.pos, ship.body.rotation);
        let target = world
            .active()
            .filter_map(Entity::as_asteroid)
            .map(|a| a.body.pos)
            .min_by(|a, b| a.distance_squared(pos).total_cmp(&b.distance_squared(pos)));

        let Some(target) = target else {
            release_all(engine);
            return;
        };
        let to_target = target - pos;
        let error = normalize_angle(to_target.y.atan2(to_target.x) - rotation);

        hold(engine, "ArrowLeft", error < -AIM_SLACK);
        hold(engine, "ArrowRight", error > AIM_SLACK);
        hold(engine, " ", error.abs() <= AIM_SLACK * 2.0);
    }

    fn hold(engine: &mut Engine, key: &str, down: bool) {
        if down {
            engine.key_down(key);
        } else {
            engine.key_up(key);
        }
    }

    fn release_all(engine: &mut Engine) {
        for key in ["ArrowLeft", "ArrowRight", " "] {
            engine.key_up(key);
        }
    }
}
