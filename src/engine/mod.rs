//! Simulation orchestrator
//!
//! [`Engine`] owns the world, the game-state record and the collaborators.
//! Each frame while playing it applies held input to the ship, updates every
//! active entity, lets saucers shoot, resolves collisions, commits staged
//! spawns, checks for level completion and the saucer spawn timer, and prunes
//! what died. Status transitions:
//!
//! ```text
//! menu --start--> playing <--pause/resume--> paused
//! playing --field cleared--> loading --delay--> playing (level + 1)
//! playing --last life lost--> gameOver --restart--> playing
//! ```

pub mod events;
pub mod timers;

#[cfg(test)]
mod tests;

pub use events::{
    EventQueue, Frame, GameEvent, GameEvents, NoEvents, Renderer, ScoreEvent, Silence, SoundSink,
    SoundTrigger,
};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::{EngineError, Result};
use crate::highscores::HighScore;
use crate::input::{Action, InputState};
use crate::math::{random_range, safe_spawn_position};
use crate::persistence::{KeyValueStore, MemoryStore};
use crate::platform::{Clock, Surface};
use crate::settings::Settings;
use crate::sim::collision::{self, CollisionEvent};
use crate::sim::explosion::{ASTEROID_COLORS, SAUCER_COLORS, SHIP_COLORS};
use crate::sim::{
    Asteroid, AsteroidSize, Bullet, Entity, EntityKind, Explosion, GameState, GameStatus, Saucer,
    SaucerSize, Ship, Side, Simulate, World,
};
use crate::tuning::GameConfig;
use timers::{Fired, TimerKind, Timers};

/// Everything the engine talks to outside the simulation
pub struct Collaborators {
    pub events: Box<dyn GameEvents>,
    pub sound: Box<dyn SoundSink>,
    pub renderer: Option<Box<dyn Renderer>>,
    pub store: Box<dyn KeyValueStore>,
    pub clock: Box<dyn Clock>,
    /// RNG seed; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Collaborators {
    /// No-op collaborators around `clock`
    pub fn new(clock: impl Clock + 'static) -> Self {
        Self {
            events: Box::new(NoEvents),
            sound: Box::new(Silence),
            renderer: None,
            store: Box::new(MemoryStore::new()),
            clock: Box::new(clock),
            seed: None,
        }
    }

    pub fn with_events(mut self, events: impl GameEvents + 'static) -> Self {
        self.events = Box::new(events);
        self
    }

    pub fn with_sound(mut self, sound: impl SoundSink + 'static) -> Self {
        self.sound = Box::new(sound);
        self
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn with_store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

pub struct Engine {
    config: GameConfig,
    bounds: Vec2,
    world: World,
    state: GameState,
    settings: Settings,
    input: InputState,
    timers: Timers,
    rng: Pcg32,
    /// Time accumulated toward the next saucer (ms)
    saucer_timer_ms: f32,
    /// `newHighScore` already played this game
    high_score_announced: bool,
    last_frame_ms: Option<f64>,
    destroyed: bool,

    events: Box<dyn GameEvents>,
    sound: Box<dyn SoundSink>,
    renderer: Option<Box<dyn Renderer>>,
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
}

impl Engine {
    /// Build an engine in the `menu` state
    ///
    /// Fails if `config` is invalid or `surface` cannot produce a drawing
    /// context.
    pub fn new(
        surface: &dyn Surface,
        collaborators: Collaborators,
        config: GameConfig,
    ) -> Result<Self> {
        config.validate()?;
        if !surface.has_context() {
            return Err(EngineError::SurfaceUnavailable(
                "no 2d drawing context".to_string(),
            ));
        }

        let (width, height) = surface
            .size()
            .unwrap_or((config.world.width, config.world.height));
        let bounds = Vec2::new(width, height);

        let Collaborators {
            events,
            sound,
            renderer,
            store,
            clock,
            seed,
        } = collaborators;

        let high_score = HighScore::load(store.as_ref()).best;
        let settings = Settings::load(store.as_ref());
        let seed = seed.unwrap_or_else(rand::random);

        // The ship lives for the whole engine lifetime; it stays dark until a game starts
        let mut world = World::new();
        let mut ship = Ship::new(bounds / 2.0, config.ship);
        ship.body.active = false;
        world.insert(ship);

        log::info!(
            "Engine ready: {}x{} playfield, seed {}, high score {}",
            width,
            height,
            seed,
            high_score
        );

        Ok(Self {
            config,
            bounds,
            world,
            state: GameState::new(config.ship.starting_lives, high_score),
            settings,
            input: InputState::default(),
            timers: Timers::new(),
            rng: Pcg32::seed_from_u64(seed),
            saucer_timer_ms: 0.0,
            high_score_announced: false,
            last_frame_ms: None,
            destroyed: false,
            events,
            sound,
            renderer,
            store,
            clock,
        })
    }

    // === Control surface ===

    /// Leave the menu and begin a game
    pub fn start(&mut self) {
        if self.destroyed || self.state.status != GameStatus::Menu {
            return;
        }
        self.begin_game();
    }

    pub fn pause(&mut self) {
        if self.destroyed || self.state.status != GameStatus::Playing {
            return;
        }
        self.state.status = GameStatus::Paused;
        self.input.release_continuous(&self.settings.key_bindings);
        log::info!("Paused");
        self.events.on_game_state_change(&self.state);
        self.sound.play(SoundTrigger::Pause);
    }

    pub fn resume(&mut self) {
        if self.destroyed || self.state.status != GameStatus::Paused {
            return;
        }
        self.state.status = GameStatus::Playing;
        self.last_frame_ms = None;
        log::info!("Resumed");
        self.events.on_game_state_change(&self.state);
        self.sound.play(SoundTrigger::Unpause);
    }

    /// Full reset into a new game, from any state
    pub fn restart(&mut self) {
        if self.destroyed {
            return;
        }
        log::info!("Restarting");
        self.begin_game();
    }

    /// Stop for good: pending timers are dropped and every later call is a no-op
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.timers.clear();
        self.input.clear();
        self.renderer = None;
        log::info!("Engine destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Copy of the current state record
    pub fn game_state(&self) -> GameState {
        self.state
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace and persist the player's settings
    pub fn set_settings(&mut self, settings: Settings) {
        settings.save(self.store.as_mut());
        self.settings = settings;
    }

    /// Snapshot for renderers that pull instead of being pushed to
    pub fn snapshot(&self) -> Frame<'_> {
        build_frame(&self.world, self.state, self.bounds)
    }

    // === Input ===

    pub fn key_down(&mut self, key: &str) {
        if self.destroyed {
            return;
        }
        let Some(action) = self.input.press(key, &self.settings.key_bindings) else {
            return;
        };
        match (action, self.state.status) {
            (Action::Pause, GameStatus::Playing) => self.pause(),
            (Action::Pause, GameStatus::Paused) => self.resume(),
            (Action::Start, GameStatus::Menu) => self.start(),
            (Action::Start | Action::Restart, GameStatus::GameOver) => self.restart(),
            _ => {}
        }
    }

    pub fn key_up(&mut self, key: &str) {
        self.input.release(key);
    }

    /// Host window lost focus or was hidden
    pub fn focus_lost(&mut self) {
        self.input.clear();
        if self.settings.pause_on_blur && self.state.status == GameStatus::Playing {
            log::info!("Auto-pausing on focus loss");
            self.pause();
        }
    }

    // === Frame loop ===

    /// One display refresh: measure the delta on the clock and step
    pub fn frame(&mut self) {
        if self.destroyed {
            return;
        }
        let now = self.clock.now_ms();
        let dt = match self.last_frame_ms {
            Some(last) => ((now - last) / 1000.0) as f32,
            None => 0.0,
        };
        self.last_frame_ms = Some(now);
        self.step(dt);
    }

    /// Advance the simulation by `dt` seconds and render
    ///
    /// The delta is clamped to `[0, world.max_frame_delta]`.
    pub fn step(&mut self, dt: f32) {
        if self.destroyed {
            return;
        }
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.world.max_frame_delta)
        } else {
            0.0
        };

        if self.state.status.advances_timers() {
            for fired in self.timers.advance(dt * 1000.0) {
                self.on_timer(fired);
            }
        }

        match self.state.status {
            GameStatus::Playing => self.step_playing(dt),
            GameStatus::Loading => {
                self.update_entities(dt);
                self.world.commit();
                self.world.prune();
            }
            GameStatus::Menu | GameStatus::Paused | GameStatus::GameOver => {}
        }

        self.render();
    }

    fn step_playing(&mut self, dt: f32) {
        self.apply_input(dt);
        self.update_entities(dt);
        self.saucers_fire();

        let pairs = collision::detect(&self.world.entities, &self.config.collision);
        let mut ship_lost = false;
        for event in collision::resolve(&mut self.world.entities, &pairs) {
            ship_lost |= self.on_collision(event);
        }
        // Lives change only after every score from this frame has landed
        if ship_lost {
            self.lose_life();
        }
        self.world.commit();

        if self.state.status == GameStatus::Playing {
            self.check_level_complete();
        }
        if self.state.status == GameStatus::Playing {
            self.tick_saucer_spawn(dt);
        }

        self.world.commit();
        self.world.prune();
    }

    fn apply_input(&mut self, dt: f32) {
        let held = self.input.snapshot(&self.settings.key_bindings);
        let bullets = self.world.active_count(EntityKind::Bullet);
        let tuning = self.config.bullet;

        let Some(ship) = self.world.ship_mut() else {
            log::warn!("Ship missing from world");
            return;
        };
        if !ship.body.active {
            return;
        }
        ship.turn(held.turn(), dt);
        ship.set_thrust(held.thrust);

        if !held.fire || !ship.can_fire() || bullets >= tuning.max_active {
            return;
        }
        ship.reset_fire_cooldown(tuning.cooldown_ms);
        let bullet = Bullet::fire(
            ship.body.id,
            EntityKind::Ship,
            ship.nose(),
            ship.body.vel,
            ship.body.rotation,
            tuning.speed,
            &tuning,
        );
        self.world.spawn(bullet);
        self.sound.play(SoundTrigger::BulletFire);
    }

    fn update_entities(&mut self, dt: f32) {
        let bounds = self.bounds;
        for entity in self.world.entities.iter_mut().filter(|e| e.is_active()) {
            entity.update(dt, bounds, &mut self.rng);
        }
    }

    /// Saucers with a ready shoot timer fire at a live ship
    fn saucers_fire(&mut self) {
        let Some(target) = self
            .world
            .ship()
            .filter(|s| s.body.active)
            .map(|s| s.body.pos)
        else {
            return;
        };

        let max_active = self.config.bullet.max_active;
        let mut bullets = self.world.active_count(EntityKind::Bullet);
        let mut shots = Vec::new();

        for saucer in self.world.entities.iter_mut().filter_map(Entity::as_saucer_mut) {
            if !saucer.can_shoot() || bullets >= max_active {
                continue;
            }
            let angle = saucer.calculate_shoot_direction(target, &mut self.rng);
            saucer.reset_shoot_timer();
            shots.push(Bullet::fire(
                saucer.body.id,
                EntityKind::Saucer,
                saucer.body.pos,
                saucer.body.vel,
                angle,
                self.config.saucer.bullet_speed,
                &self.config.bullet,
            ));
            bullets += 1;
        }

        for shot in shots {
            self.world.spawn(shot);
            self.sound.play(SoundTrigger::SaucerFire);
        }
    }

    /// Apply one collision outcome; true when it cost the ship
    fn on_collision(&mut self, event: CollisionEvent) -> bool {
        match event {
            CollisionEvent::ShipDestroyed { pos, .. } => {
                self.spawn_explosion(pos, self.config.explosion.ship_particles, SHIP_COLORS);
                self.sound.play(SoundTrigger::ShipDestroyed);
                return true;
            }
            CollisionEvent::AsteroidDestroyed { asteroid, by_ship } => {
                self.on_asteroid_destroyed(asteroid, by_ship)
            }
            CollisionEvent::SaucerDestroyed { saucer, by_ship } => {
                self.on_saucer_destroyed(saucer, by_ship)
            }
        }
        false
    }

    fn lose_life(&mut self) {
        self.state.lives = self.state.lives.saturating_sub(1);
        log::info!("Ship destroyed, {} lives left", self.state.lives);
        self.events.on_lives_change(self.state.lives);

        if self.state.lives == 0 {
            self.game_over();
        } else {
            self.timers
                .schedule(TimerKind::Respawn, self.config.ship.respawn_delay_ms);
        }
    }

    fn on_asteroid_destroyed(&mut self, index: usize, by_ship: bool) {
        let Some(asteroid) = self.world.entities.get(index).and_then(Entity::as_asteroid) else {
            return;
        };
        let (size, pos) = (asteroid.size, asteroid.body.pos);
        let fragments = asteroid.split(&self.config.asteroid, &mut self.rng);

        let split = !fragments.is_empty();
        log::debug!("{:?} asteroid destroyed, {} fragments", size, fragments.len());
        for fragment in fragments {
            self.world.spawn(fragment);
        }
        self.spawn_explosion(pos, self.config.explosion.asteroid_particles, ASTEROID_COLORS);
        self.sound.play(if split {
            SoundTrigger::AsteroidSplit
        } else {
            SoundTrigger::AsteroidDestruction
        });

        if by_ship {
            let points = self.config.asteroid.points.get(size);
            self.award(points, ScoreEvent::Asteroid { size, points });
        }
    }

    fn on_saucer_destroyed(&mut self, index: usize, by_ship: bool) {
        let Some(saucer) = self.world.entities.get(index).and_then(Entity::as_saucer) else {
            return;
        };
        let (size, pos, points) = (saucer.size, saucer.body.pos, saucer.class.points);

        self.spawn_explosion(pos, self.config.explosion.saucer_particles, SAUCER_COLORS);
        self.sound.play(SoundTrigger::SaucerDestroyed);
        log::debug!("{:?} saucer destroyed", size);

        if by_ship {
            self.award(points, ScoreEvent::Saucer { size, points });
        }
    }

    fn spawn_explosion(&mut self, pos: Vec2, particles: u32, palette: &[u32]) {
        let explosion = Explosion::new(
            pos,
            particles,
            palette,
            &self.config.explosion,
            &mut self.rng,
        );
        self.world.spawn(explosion);
    }

    fn award(&mut self, points: u64, event: ScoreEvent) {
        if points == 0 {
            return;
        }
        let raised = self.state.add_score(points);
        self.events.on_score_change(self.state.score, Some(event));

        if raised {
            HighScore {
                best: self.state.high_score,
            }
            .save(self.store.as_mut());
            if !self.high_score_announced {
                self.high_score_announced = true;
                self.sound.play(SoundTrigger::NewHighScore);
            }
        }
    }

    fn check_level_complete(&mut self) {
        if self.world.active_count(EntityKind::Asteroid) > 0 {
            return;
        }

        let level = self.state.level;
        let bonus = u64::from(level) * self.config.level.bonus_per_level;
        self.state.last_level_bonus = Some(bonus);
        self.award(bonus, ScoreEvent::LevelBonus { level, points: bonus });
        self.sound.play(SoundTrigger::LevelCompletion);

        // Ship and in-flight explosions carry over into the transition
        self.world.clear_kind(EntityKind::Asteroid);
        self.world.clear_kind(EntityKind::Bullet);
        self.world.clear_kind(EntityKind::Saucer);
        self.saucer_timer_ms = 0.0;

        self.state.status = GameStatus::Loading;
        log::info!("Level {} cleared, bonus {}", level, bonus);
        self.events.on_game_state_change(&self.state);
        self.timers
            .schedule(TimerKind::LevelTransition, self.config.level.transition_delay_ms);
    }

    fn tick_saucer_spawn(&mut self, dt: f32) {
        let tuning = self.config.saucer;
        if self.state.level < tuning.min_level {
            return;
        }
        // One saucer at a time; the interval starts once the last one is gone
        if self.world.active_count(EntityKind::Saucer) > 0 {
            return;
        }
        self.saucer_timer_ms += dt * 1000.0;
        if self.saucer_timer_ms < tuning.spawn_interval_ms {
            return;
        }
        self.saucer_timer_ms = 0.0;

        let size = if self.rng.random::<f32>() < tuning.small_chance(self.state.level) {
            SaucerSize::Small
        } else {
            SaucerSize::Large
        };
        let side = if self.rng.random::<bool>() {
            Side::Left
        } else {
            Side::Right
        };
        let y = random_range(&mut self.rng, self.bounds.y * 0.1, self.bounds.y * 0.9);
        let saucer = Saucer::enter(size, side, y, self.bounds, &tuning, &mut self.rng);
        log::debug!("{:?} saucer enters from {:?}", size, side);
        self.world.spawn(saucer);
        self.sound.play(SoundTrigger::SaucerSpawn);
    }

    fn on_timer(&mut self, fired: Fired) {
        if !self.timers.is_current(fired) {
            return;
        }
        match fired.kind {
            TimerKind::Respawn => {
                if self.state.status == GameStatus::Playing && self.state.lives > 0 {
                    self.respawn_ship();
                }
            }
            TimerKind::LevelTransition => {
                if self.state.status == GameStatus::Loading {
                    self.begin_next_level();
                }
            }
        }
    }

    fn respawn_ship(&mut self) {
        let center = self.bounds / 2.0;
        let Some(ship) = self.world.ship_mut() else {
            log::warn!("Ship missing from world");
            return;
        };
        if ship.body.active {
            return;
        }
        ship.respawn(center);
        log::debug!("Ship respawned");
        self.sound.play(SoundTrigger::ShipRespawn);
    }

    fn begin_next_level(&mut self) {
        self.state.level += 1;
        self.events.on_level_change(self.state.level);

        if self.state.lives > 0 {
            self.respawn_ship();
        }
        self.spawn_asteroid_field();
        self.world.commit();

        self.state.status = GameStatus::Playing;
        self.events.on_game_state_change(&self.state);
    }

    fn spawn_asteroid_field(&mut self) {
        let level = self.config.level;
        let count = level.asteroid_count(self.state.level);
        let avoid = self
            .world
            .ship()
            .map(|s| s.body.pos)
            .unwrap_or(self.bounds / 2.0);

        for _ in 0..count {
            let pos = safe_spawn_position(
                &mut self.rng,
                self.bounds,
                avoid,
                level.safe_spawn_distance,
                level.safe_spawn_attempts,
            );
            let asteroid = Asteroid::random_drift(
                AsteroidSize::Large,
                pos,
                &self.config.asteroid,
                &mut self.rng,
            );
            self.world.spawn(asteroid);
        }
        log::info!("Level {} begins with {} asteroids", self.state.level, count);
    }

    fn begin_game(&mut self) {
        self.timers.clear();
        self.input.release_continuous(&self.settings.key_bindings);
        self.state.reset(self.config.ship.starting_lives);
        self.high_score_announced = false;
        self.saucer_timer_ms = 0.0;
        self.last_frame_ms = None;

        self.world.clear_all_but_ship();
        let center = self.bounds / 2.0;
        if let Some(ship) = self.world.ship_mut() {
            ship.respawn(center);
        }
        self.spawn_asteroid_field();
        self.world.commit();

        self.state.status = GameStatus::Playing;
        log::info!("Game started");
        self.events.on_game_state_change(&self.state);
        self.events.on_score_change(self.state.score, None);
        self.events.on_lives_change(self.state.lives);
        self.events.on_level_change(self.state.level);
        self.sound.play(SoundTrigger::GameStart);
    }

    fn game_over(&mut self) {
        self.timers.clear();
        self.state.status = GameStatus::GameOver;
        HighScore {
            best: self.state.high_score,
        }
        .save(self.store.as_mut());

        log::info!(
            "Game over: score {}, level {}",
            self.state.score,
            self.state.level
        );
        self.events.on_game_state_change(&self.state);
        self.events.on_game_over(self.state.score);
        self.sound.play(SoundTrigger::GameOver);
    }

    fn render(&mut self) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        renderer.render(&build_frame(&self.world, self.state, self.bounds));
    }
}

fn build_frame(world: &World, state: GameState, bounds: Vec2) -> Frame<'_> {
    Frame {
        state,
        bounds,
        entities: world.active().collect(),
        ship_visible: world.ship().is_some_and(Ship::is_visible),
    }
}
