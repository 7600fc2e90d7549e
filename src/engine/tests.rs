use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::highscores::STORAGE_KEY;
use crate::persistence::UnavailableStore;
use crate::platform::{HeadlessSurface, ManualClock};

#[derive(Debug, Default)]
struct Log {
    states: Vec<GameStatus>,
    scores: Vec<(u64, Option<ScoreEvent>)>,
    lives: Vec<u32>,
    levels: Vec<u32>,
    game_overs: Vec<u64>,
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Log>>);

impl GameEvents for Recorder {
    fn on_game_state_change(&mut self, state: &GameState) {
        self.0.borrow_mut().states.push(state.status);
    }

    fn on_score_change(&mut self, score: u64, event: Option<ScoreEvent>) {
        self.0.borrow_mut().scores.push((score, event));
    }

    fn on_lives_change(&mut self, lives: u32) {
        self.0.borrow_mut().lives.push(lives);
    }

    fn on_level_change(&mut self, level: u32) {
        self.0.borrow_mut().levels.push(level);
    }

    fn on_game_over(&mut self, final_score: u64) {
        self.0.borrow_mut().game_overs.push(final_score);
    }
}

#[derive(Clone, Default)]
struct Sounds(Rc<RefCell<Vec<SoundTrigger>>>);

impl Sounds {
    fn count(&self, trigger: SoundTrigger) -> usize {
        self.0.borrow().iter().filter(|t| **t == trigger).count()
    }
}

impl SoundSink for Sounds {
    fn play(&mut self, trigger: SoundTrigger) {
        self.0.borrow_mut().push(trigger);
    }
}

#[derive(Clone, Default)]
struct FrameCounter(Rc<RefCell<Vec<(GameStatus, usize)>>>);

impl Renderer for FrameCounter {
    fn render(&mut self, frame: &Frame<'_>) {
        self.0
            .borrow_mut()
            .push((frame.state.status, frame.entities.len()));
    }
}

struct Harness {
    engine: Engine,
    log: Recorder,
    sounds: Sounds,
    clock: ManualClock,
}

fn harness_with(config: GameConfig) -> Harness {
    let log = Recorder::default();
    let sounds = Sounds::default();
    let clock = ManualClock::new(0.0);
    let collaborators = Collaborators::new(clock.clone())
        .with_events(log.clone())
        .with_sound(sounds.clone())
        .with_seed(42);
    let engine = Engine::new(&HeadlessSurface::new(800.0, 600.0), collaborators, config)
        .expect("engine builds");
    Harness {
        engine,
        log,
        sounds,
        clock,
    }
}

fn harness() -> Harness {
    harness_with(GameConfig::default())
}

fn ship_id(engine: &Engine) -> u32 {
    engine.world.ship().expect("ship").body.id
}

fn make_vulnerable(engine: &mut Engine) {
    let ship = engine.world.ship_mut().expect("ship");
    ship.invulnerable = false;
    ship.invulnerable_ms = 0.0;
}

fn rock_at(engine: &mut Engine, size: AsteroidSize, pos: Vec2) -> u32 {
    let asteroid = Asteroid::new(size, pos, Vec2::ZERO, &engine.config.asteroid, &mut engine.rng);
    engine.world.insert(asteroid)
}

fn asteroids(engine: &Engine) -> Vec<&Asteroid> {
    engine
        .world
        .active()
        .filter_map(Entity::as_asteroid)
        .collect()
}

fn step_until(engine: &mut Engine, status: GameStatus, max_steps: usize) {
    for _ in 0..max_steps {
        if engine.state.status == status {
            return;
        }
        engine.step(0.1);
    }
}

#[test]
fn test_broken_surface_is_fatal() {
    let result = Engine::new(
        &HeadlessSurface::broken(),
        Collaborators::new(ManualClock::default()),
        GameConfig::default(),
    );
    assert!(matches!(result, Err(EngineError::SurfaceUnavailable(_))));
}

#[test]
fn test_invalid_config_is_fatal() {
    let mut config = GameConfig::default();
    config.bullet.max_active = 0;
    let result = Engine::new(
        &HeadlessSurface::new(800.0, 600.0),
        Collaborators::new(ManualClock::default()),
        config,
    );
    assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));
}

#[test]
fn test_surface_without_size_uses_config() {
    let surface = HeadlessSurface {
        width: 0.0,
        height: 0.0,
        usable: true,
    };
    let engine = Engine::new(
        &surface,
        Collaborators::new(ManualClock::default()).with_seed(1),
        GameConfig::default(),
    )
    .unwrap();
    assert_eq!(engine.bounds(), Vec2::new(800.0, 600.0));
}

#[test]
fn test_menu_runs_no_physics() {
    let mut h = harness();
    assert_eq!(h.engine.game_state().status, GameStatus::Menu);
    assert!(h.engine.world.ship().is_some_and(|s| !s.body.active));
    h.engine.step(0.1);
    assert_eq!(h.engine.world.entities.len(), 1);
}

#[test]
fn test_start_populates_level_one() {
    let mut h = harness();
    h.engine.start();
    let state = h.engine.game_state();
    assert_eq!(state.status, GameStatus::Playing);
    assert_eq!(state.lives, 3);
    assert_eq!(state.level, 1);
    assert_eq!(
        asteroids(&h.engine).len() as u32,
        h.engine.config.level.asteroid_count(1)
    );

    // Field keeps clear of the ship
    let ship = h.engine.world.ship().unwrap();
    assert!(ship.body.active && ship.invulnerable);
    for a in asteroids(&h.engine) {
        assert!(a.body.pos.distance(ship.body.pos) >= h.engine.config.level.safe_spawn_distance);
        assert_eq!(a.size, AsteroidSize::Large);
    }

    let log = h.log.0.borrow();
    assert_eq!(log.states, vec![GameStatus::Playing]);
    assert_eq!(log.scores, vec![(0, None)]);
    assert_eq!(log.lives, vec![3]);
    assert_eq!(log.levels, vec![1]);
    assert_eq!(h.sounds.count(SoundTrigger::GameStart), 1);

    // Second start is ignored
    drop(log);
    h.engine.start();
    assert_eq!(h.log.0.borrow().states.len(), 1);
}

#[test]
fn test_bullet_splits_large_asteroid() {
    let mut h = harness();
    h.engine.start();
    h.engine.world.clear_kind(EntityKind::Asteroid);

    let pos = Vec2::new(100.0, 100.0);
    let rock = rock_at(&mut h.engine, AsteroidSize::Large, pos);
    let source = ship_id(&h.engine);
    let bullet = Bullet::fire(
        source,
        EntityKind::Ship,
        pos,
        Vec2::ZERO,
        0.0,
        0.0,
        &h.engine.config.bullet,
    );
    h.engine.world.insert(bullet);

    h.engine.step(0.0);

    assert!(h.engine.world.get(rock).is_none_or(|e| !e.is_active()));
    let fragments = asteroids(&h.engine);
    assert_eq!(
        fragments.len() as u32,
        h.engine.config.asteroid.split_count.large
    );
    assert!(fragments
        .iter()
        .all(|a| a.size == AsteroidSize::Medium && a.body.active));
    assert_eq!(h.engine.world.active_count(EntityKind::Bullet), 0);
    assert_eq!(h.engine.world.active_count(EntityKind::Explosion), 1);

    let large = h.engine.config.asteroid.points.large;
    assert_eq!(h.engine.game_state().score, large);
    assert_eq!(
        h.log.0.borrow().scores.last(),
        Some(&(
            large,
            Some(ScoreEvent::Asteroid {
                size: AsteroidSize::Large,
                points: large
            })
        ))
    );
    assert_eq!(h.sounds.count(SoundTrigger::AsteroidSplit), 1);
    // Field not cleared: fragments remain
    assert_eq!(h.engine.game_state().status, GameStatus::Playing);
}

#[test]
fn test_small_asteroid_destroyed_without_fragments() {
    let mut h = harness();
    h.engine.start();
    h.engine.world.clear_kind(EntityKind::Asteroid);
    rock_at(&mut h.engine, AsteroidSize::Small, Vec2::new(100.0, 100.0));
    rock_at(&mut h.engine, AsteroidSize::Large, Vec2::new(700.0, 500.0));
    let source = ship_id(&h.engine);
    h.engine.world.insert(Bullet::fire(
        source,
        EntityKind::Ship,
        Vec2::new(100.0, 100.0),
        Vec2::ZERO,
        0.0,
        0.0,
        &h.engine.config.bullet,
    ));

    h.engine.step(0.0);

    assert_eq!(asteroids(&h.engine).len(), 1);
    assert_eq!(h.engine.game_state().score, h.engine.config.asteroid.points.small);
    assert_eq!(h.sounds.count(SoundTrigger::AsteroidDestruction), 1);
}

#[test]
fn test_saucer_bullets_score_nothing() {
    let mut h = harness();
    h.engine.start();
    h.engine.world.clear_kind(EntityKind::Asteroid);
    rock_at(&mut h.engine, AsteroidSize::Large, Vec2::new(100.0, 100.0));
    rock_at(&mut h.engine, AsteroidSize::Large, Vec2::new(700.0, 500.0));
    h.engine.world.insert(Bullet::fire(
        999,
        EntityKind::Saucer,
        Vec2::new(100.0, 100.0),
        Vec2::ZERO,
        0.0,
        0.0,
        &h.engine.config.bullet,
    ));

    h.engine.step(0.0);

    assert_eq!(h.engine.game_state().score, 0);
    // The rock still split
    assert_eq!(asteroids(&h.engine).len(), 3);
}

#[test]
fn test_last_life_ends_game() {
    let mut h = harness();
    h.engine.start();
    h.engine.state.lives = 1;
    h.engine.state.score = 340;
    make_vulnerable(&mut h.engine);
    let center = h.engine.bounds() / 2.0;
    rock_at(&mut h.engine, AsteroidSize::Large, center);

    h.engine.step(0.0);

    let state = h.engine.game_state();
    assert_eq!(state.status, GameStatus::GameOver);
    assert_eq!(state.lives, 0);
    assert!(!h.engine.timers.is_pending(TimerKind::Respawn));
    assert_eq!(h.log.0.borrow().game_overs, vec![340]);
    assert_eq!(h.sounds.count(SoundTrigger::GameOver), 1);

    // Game over runs no physics
    let before: Vec<Vec2> = asteroids(&h.engine).iter().map(|a| a.body.pos).collect();
    h.engine.step(0.1);
    let after: Vec<Vec2> = asteroids(&h.engine).iter().map(|a| a.body.pos).collect();
    assert_eq!(before, after);
}

#[test]
fn test_game_over_reports_score_from_same_frame() {
    let mut h = harness();
    h.engine.start();
    h.engine.world.clear_kind(EntityKind::Asteroid);
    h.engine.state.lives = 1;
    make_vulnerable(&mut h.engine);
    let center = h.engine.bounds() / 2.0;
    rock_at(&mut h.engine, AsteroidSize::Large, center);

    // A ship bullet lands on a far rock in the frame the ship dies
    let far = Vec2::new(100.0, 100.0);
    rock_at(&mut h.engine, AsteroidSize::Small, far);
    let source = ship_id(&h.engine);
    h.engine.world.insert(Bullet::fire(
        source,
        EntityKind::Ship,
        far,
        Vec2::ZERO,
        0.0,
        0.0,
        &h.engine.config.bullet,
    ));

    h.engine.step(0.0);

    let small = h.engine.config.asteroid.points.small;
    let state = h.engine.game_state();
    assert_eq!(state.status, GameStatus::GameOver);
    assert_eq!(state.score, small);
    let log = h.log.0.borrow();
    assert_eq!(log.game_overs, vec![small]);
    assert_eq!(log.scores.last().map(|(score, _)| *score), Some(small));
    assert_eq!(log.states.last(), Some(&GameStatus::GameOver));
}

#[test]
fn test_invulnerable_ship_keeps_lives() {
    let mut h = harness();
    h.engine.start();
    let center = h.engine.bounds() / 2.0;
    rock_at(&mut h.engine, AsteroidSize::Large, center);
    h.engine.step(0.0);
    assert_eq!(h.engine.game_state().lives, 3);
    assert!(h.engine.world.ship().unwrap().body.active);
}

#[test]
fn test_ship_respawns_after_delay() {
    let mut h = harness();
    h.engine.start();
    make_vulnerable(&mut h.engine);
    let center = h.engine.bounds() / 2.0;
    rock_at(&mut h.engine, AsteroidSize::Large, center);

    h.engine.step(0.0);
    assert_eq!(h.engine.game_state().lives, 2);
    assert!(h.engine.world.ship().is_some_and(|s| !s.body.active));
    assert!(h.engine.timers.is_pending(TimerKind::Respawn));

    // Paused time does not count toward the delay
    h.engine.pause();
    for _ in 0..50 {
        h.engine.step(0.1);
    }
    assert!(h.engine.world.ship().is_some_and(|s| !s.body.active));
    h.engine.resume();

    let delay = h.engine.config.ship.respawn_delay_ms;
    step_for(&mut h.engine, delay + 100.0);
    let ship = h.engine.world.ship().unwrap();
    assert!(ship.body.active);
    assert!(ship.invulnerable);
    assert_eq!(h.sounds.count(SoundTrigger::ShipRespawn), 1);
}

fn step_for(engine: &mut Engine, ms: f32) {
    let steps = (ms / 100.0).ceil() as usize;
    for _ in 0..steps {
        engine.step(0.1);
    }
}

#[test]
fn test_restart_cancels_pending_respawn() {
    let mut h = harness();
    h.engine.start();
    make_vulnerable(&mut h.engine);
    let center = h.engine.bounds() / 2.0;
    rock_at(&mut h.engine, AsteroidSize::Large, center);
    h.engine.step(0.0);
    assert!(h.engine.timers.is_pending(TimerKind::Respawn));

    h.engine.restart();
    assert!(!h.engine.timers.is_pending(TimerKind::Respawn));
    let state = h.engine.game_state();
    assert_eq!(state.status, GameStatus::Playing);
    assert_eq!(state.lives, 3);
    assert_eq!(state.score, 0);

    let delay = h.engine.config.ship.respawn_delay_ms;
    step_for(&mut h.engine, delay + 200.0);
    assert_eq!(h.sounds.count(SoundTrigger::ShipRespawn), 0);
    assert_eq!(h.sounds.count(SoundTrigger::GameStart), 2);
}

#[test]
fn test_cleared_field_loads_next_level() {
    let mut h = harness();
    h.engine.start();
    h.engine.state.level = 3;
    h.engine.world.clear_kind(EntityKind::Asteroid);

    h.engine.step(0.016);

    let state = h.engine.game_state();
    assert_eq!(state.status, GameStatus::Loading);
    let bonus = 3 * h.engine.config.level.bonus_per_level;
    assert_eq!(state.score, bonus);
    assert_eq!(state.last_level_bonus, Some(bonus));
    assert_eq!(state.level, 3);
    assert_eq!(h.engine.world.active_count(EntityKind::Bullet), 0);
    assert_eq!(h.sounds.count(SoundTrigger::LevelCompletion), 1);
    assert_eq!(
        h.log.0.borrow().scores.last(),
        Some(&(
            bonus,
            Some(ScoreEvent::LevelBonus {
                level: 3,
                points: bonus
            })
        ))
    );

    // Ship survives the transition
    assert!(h.engine.world.ship().is_some_and(|s| s.body.active));

    step_until(&mut h.engine, GameStatus::Playing, 100);
    let state = h.engine.game_state();
    assert_eq!(state.status, GameStatus::Playing);
    assert_eq!(state.level, 4);
    assert_eq!(
        asteroids(&h.engine).len() as u32,
        h.engine.config.level.asteroid_count(4)
    );
    let log = h.log.0.borrow();
    assert_eq!(log.levels.last(), Some(&4));
    assert_eq!(
        log.states,
        vec![GameStatus::Playing, GameStatus::Loading, GameStatus::Playing]
    );
}

#[test]
fn test_transition_waits_full_delay() {
    let mut h = harness();
    h.engine.start();
    h.engine.world.clear_kind(EntityKind::Asteroid);
    h.engine.step(0.0);
    assert_eq!(h.engine.game_state().status, GameStatus::Loading);

    let delay = h.engine.config.level.transition_delay_ms;
    step_for(&mut h.engine, delay - 200.0);
    assert_eq!(h.engine.game_state().status, GameStatus::Loading);
    assert_eq!(asteroids(&h.engine).len(), 0);
    step_for(&mut h.engine, 300.0);
    assert_eq!(h.engine.game_state().status, GameStatus::Playing);
}

#[test]
fn test_dead_ship_returns_with_new_level() {
    let mut h = harness();
    h.engine.start();
    h.engine.world.clear_kind(EntityKind::Asteroid);
    h.engine.world.ship_mut().unwrap().body.active = false;
    h.engine.state.lives = 2;

    h.engine.step(0.0);
    step_until(&mut h.engine, GameStatus::Playing, 100);

    assert_eq!(h.engine.game_state().level, 2);
    assert!(h.engine.world.ship().is_some_and(|s| s.body.active));
}

#[test]
fn test_pause_and_resume_are_idempotent() {
    let mut h = harness();
    h.engine.pause();
    h.engine.resume();
    assert_eq!(h.engine.game_state().status, GameStatus::Menu);
    assert!(h.log.0.borrow().states.is_empty());

    h.engine.start();
    h.engine.resume();
    h.engine.pause();
    h.engine.pause();
    assert_eq!(h.engine.game_state().status, GameStatus::Paused);
    h.engine.resume();
    h.engine.resume();
    assert_eq!(h.engine.game_state().status, GameStatus::Playing);

    assert_eq!(
        h.log.0.borrow().states,
        vec![GameStatus::Playing, GameStatus::Paused, GameStatus::Playing]
    );
    assert_eq!(h.sounds.count(SoundTrigger::Pause), 1);
    assert_eq!(h.sounds.count(SoundTrigger::Unpause), 1);
}

#[test]
fn test_paused_world_is_frozen() {
    let mut h = harness();
    h.engine.start();
    h.engine.pause();
    let before: Vec<Vec2> = asteroids(&h.engine).iter().map(|a| a.body.pos).collect();
    h.engine.step(0.1);
    let after: Vec<Vec2> = asteroids(&h.engine).iter().map(|a| a.body.pos).collect();
    assert_eq!(before, after);
}

#[test]
fn test_bullet_cap_respected() {
    let mut config = GameConfig::default();
    config.bullet.max_active = 3;
    config.bullet.cooldown_ms = 0.0;
    let mut h = harness_with(config);
    h.engine.start();
    h.engine.key_down(" ");

    for _ in 0..20 {
        h.engine.step(0.001);
        assert!(h.engine.world.active_count(EntityKind::Bullet) <= 3);
    }
    assert_eq!(h.engine.world.active_count(EntityKind::Bullet), 3);
    assert_eq!(h.sounds.count(SoundTrigger::BulletFire), 3);
}

#[test]
fn test_fire_cooldown_spaces_shots() {
    let mut h = harness();
    h.engine.start();
    h.engine.key_down(" ");
    // 150 ms of held fire against a 200 ms cooldown
    for _ in 0..15 {
        h.engine.step(0.01);
    }
    assert_eq!(h.sounds.count(SoundTrigger::BulletFire), 1);
    h.engine.key_up(" ");
}

#[test]
fn test_held_keys_steer_ship() {
    let mut h = harness();
    h.engine.start();
    let start_rotation = h.engine.world.ship().unwrap().body.rotation;
    h.engine.key_down("ArrowRight");
    h.engine.key_down("ArrowUp");
    h.engine.step(0.05);
    let ship = h.engine.world.ship().unwrap();
    assert!(ship.body.rotation > start_rotation);
    assert!(ship.body.vel.length() > 0.0);
    let rotation = ship.body.rotation;

    h.engine.key_up("ArrowRight");
    h.engine.key_up("ArrowUp");
    h.engine.step(0.05);
    assert_eq!(h.engine.world.ship().unwrap().body.rotation, rotation);
}

#[test]
fn test_keyboard_drives_state_machine() {
    let mut h = harness();
    h.engine.key_down("Enter");
    assert_eq!(h.engine.game_state().status, GameStatus::Playing);
    h.engine.key_up("Enter");

    h.engine.key_down("p");
    assert_eq!(h.engine.game_state().status, GameStatus::Paused);
    // Repeat while held does nothing
    h.engine.key_down("p");
    assert_eq!(h.engine.game_state().status, GameStatus::Paused);
    h.engine.key_up("p");
    h.engine.key_down("Escape");
    assert_eq!(h.engine.game_state().status, GameStatus::Playing);
    h.engine.key_up("Escape");

    // Restart only works after game over
    h.engine.key_down("r");
    assert_eq!(h.sounds.count(SoundTrigger::GameStart), 1);
    h.engine.key_up("r");

    h.engine.state.lives = 1;
    make_vulnerable(&mut h.engine);
    let center = h.engine.bounds() / 2.0;
    rock_at(&mut h.engine, AsteroidSize::Large, center);
    h.engine.step(0.0);
    assert_eq!(h.engine.game_state().status, GameStatus::GameOver);

    h.engine.key_down("R");
    assert_eq!(h.engine.game_state().status, GameStatus::Playing);
    assert_eq!(h.sounds.count(SoundTrigger::GameStart), 2);
}

#[test]
fn test_pause_drops_thrust_but_not_pause_key() {
    let mut h = harness();
    h.engine.start();
    h.engine.key_down("ArrowUp");
    h.engine.key_down("P");
    assert_eq!(h.engine.game_state().status, GameStatus::Paused);

    // Auto-repeat of the held pause key, lowercase once Shift is up
    for _ in 0..5 {
        h.engine.key_down("p");
    }
    assert_eq!(h.engine.game_state().status, GameStatus::Paused);
    assert_eq!(h.sounds.count(SoundTrigger::Unpause), 0);

    h.engine.key_up("p");
    h.engine.key_down("p");
    assert_eq!(h.engine.game_state().status, GameStatus::Playing);
    h.engine.step(0.05);
    assert!(!h.engine.world.ship().unwrap().thrusting);
}

#[test]
fn test_focus_loss_pauses() {
    let mut h = harness();
    h.engine.start();
    h.engine.key_down("ArrowUp");
    h.engine.focus_lost();
    assert_eq!(h.engine.game_state().status, GameStatus::Paused);
    h.engine.resume();
    // Held keys were dropped
    h.engine.step(0.05);
    assert!(!h.engine.world.ship().unwrap().thrusting);

    let mut settings = h.engine.settings().clone();
    settings.pause_on_blur = false;
    h.engine.set_settings(settings);
    h.engine.focus_lost();
    assert_eq!(h.engine.game_state().status, GameStatus::Playing);
}

#[test]
fn test_frame_delta_is_clamped() {
    let mut h = harness();
    h.engine.start();
    make_vulnerable(&mut h.engine);
    let center = h.engine.bounds() / 2.0;
    rock_at(&mut h.engine, AsteroidSize::Large, center);
    h.engine.frame();
    assert!(h.engine.timers.is_pending(TimerKind::Respawn));

    // A 10 s stall counts as one max-length frame
    h.clock.advance(10_000.0);
    h.engine.frame();
    assert!(h.engine.timers.is_pending(TimerKind::Respawn));
    assert!(h.engine.world.ship().is_some_and(|s| !s.body.active));

    // Backwards clocks and NaN are treated as no time
    h.clock.advance(-5_000.0);
    h.engine.frame();
    h.engine.step(f32::NAN);
    assert!(h.engine.timers.is_pending(TimerKind::Respawn));
}

#[test]
fn test_saucer_spawns_one_at_a_time() {
    let mut config = GameConfig::default();
    config.saucer.spawn_interval_ms = 100.0;
    config.saucer.shoot_interval_ms = 1.0e9;
    let mut h = harness_with(config);
    h.engine.start();

    // Level 1 is below the saucer threshold
    step_for(&mut h.engine, 500.0);
    assert_eq!(h.engine.world.active_count(EntityKind::Saucer), 0);

    h.engine.state.level = h.engine.config.saucer.min_level;
    step_for(&mut h.engine, 500.0);
    assert_eq!(h.engine.world.active_count(EntityKind::Saucer), 1);
    assert_eq!(h.sounds.count(SoundTrigger::SaucerSpawn), 1);
}

#[test]
fn test_saucer_fires_at_ship() {
    let mut config = GameConfig::default();
    config.saucer.shoot_interval_ms = 50.0;
    let mut h = harness_with(config);
    h.engine.start();
    let saucer = Saucer::enter(
        SaucerSize::Small,
        Side::Left,
        100.0,
        h.engine.bounds(),
        &h.engine.config.saucer,
        &mut h.engine.rng,
    );
    let saucer_id = h.engine.world.insert(saucer);

    step_for(&mut h.engine, 100.0);

    assert_eq!(h.sounds.count(SoundTrigger::SaucerFire), 1);
    let shot = h
        .engine
        .world
        .active()
        .filter_map(Entity::as_bullet)
        .next()
        .expect("saucer bullet");
    assert_eq!(shot.source, saucer_id);
    assert_eq!(shot.source_kind, EntityKind::Saucer);
}

#[test]
fn test_shooting_saucer_scores() {
    let mut h = harness();
    h.engine.start();
    let saucer = Saucer::enter(
        SaucerSize::Large,
        Side::Left,
        100.0,
        h.engine.bounds(),
        &h.engine.config.saucer,
        &mut h.engine.rng,
    );
    let pos = Vec2::new(200.0, 100.0);
    let id = h.engine.world.insert(saucer);
    for e in &mut h.engine.world.entities {
        if e.id() == id {
            e.body_mut().pos = pos;
        }
    }
    let source = ship_id(&h.engine);
    h.engine.world.insert(Bullet::fire(
        source,
        EntityKind::Ship,
        pos,
        Vec2::ZERO,
        0.0,
        0.0,
        &h.engine.config.bullet,
    ));

    h.engine.step(0.0);

    let points = h.engine.config.saucer.large.points;
    assert_eq!(h.engine.game_state().score, points);
    assert_eq!(h.engine.world.active_count(EntityKind::Saucer), 0);
    assert_eq!(h.sounds.count(SoundTrigger::SaucerDestroyed), 1);
}

#[test]
fn test_high_score_loaded_and_saved() {
    let mut store = MemoryStore::new();
    store.set(STORAGE_KEY, "25").unwrap();
    let sounds = Sounds::default();
    let collaborators = Collaborators::new(ManualClock::default())
        .with_store(store)
        .with_sound(sounds.clone())
        .with_seed(7);
    let mut engine =
        Engine::new(&HeadlessSurface::new(800.0, 600.0), collaborators, GameConfig::default())
            .unwrap();
    assert_eq!(engine.game_state().high_score, 25);

    engine.start();
    engine.award(
        20,
        ScoreEvent::Asteroid {
            size: AsteroidSize::Large,
            points: 20,
        },
    );
    assert_eq!(engine.game_state().high_score, 25);
    assert_eq!(sounds.count(SoundTrigger::NewHighScore), 0);

    engine.award(
        50,
        ScoreEvent::Asteroid {
            size: AsteroidSize::Medium,
            points: 50,
        },
    );
    engine.award(
        50,
        ScoreEvent::Asteroid {
            size: AsteroidSize::Medium,
            points: 50,
        },
    );
    assert_eq!(engine.game_state().high_score, 120);
    assert_eq!(sounds.count(SoundTrigger::NewHighScore), 1);
    assert_eq!(
        engine.store.get(STORAGE_KEY).unwrap().as_deref(),
        Some("120")
    );
}

#[test]
fn test_storage_failure_degrades_to_zero() {
    let collaborators = Collaborators::new(ManualClock::default())
        .with_store(UnavailableStore)
        .with_seed(3);
    let mut engine =
        Engine::new(&HeadlessSurface::new(800.0, 600.0), collaborators, GameConfig::default())
            .unwrap();
    assert_eq!(engine.game_state().high_score, 0);
    engine.start();
    engine.award(
        100,
        ScoreEvent::Asteroid {
            size: AsteroidSize::Small,
            points: 100,
        },
    );
    assert_eq!(engine.game_state().high_score, 100);
    assert_eq!(engine.game_state().status, GameStatus::Playing);
}

#[test]
fn test_destroy_stops_everything() {
    let frames = FrameCounter::default();
    let collaborators = Collaborators::new(ManualClock::default())
        .with_renderer(frames.clone())
        .with_seed(5);
    let mut engine =
        Engine::new(&HeadlessSurface::new(800.0, 600.0), collaborators, GameConfig::default())
            .unwrap();
    engine.start();
    engine.step(0.016);
    assert_eq!(frames.0.borrow().len(), 1);

    engine.destroy();
    engine.destroy();
    assert!(engine.is_destroyed());
    engine.step(0.016);
    engine.frame();
    engine.restart();
    engine.key_down("Enter");
    assert_eq!(frames.0.borrow().len(), 1);
    assert!(!engine.timers.is_pending(TimerKind::Respawn));
}

#[test]
fn test_renderer_sees_active_entities() {
    let frames = FrameCounter::default();
    let collaborators = Collaborators::new(ManualClock::default())
        .with_renderer(frames.clone())
        .with_seed(5);
    let mut engine =
        Engine::new(&HeadlessSurface::new(800.0, 600.0), collaborators, GameConfig::default())
            .unwrap();
    engine.step(0.0);
    engine.start();
    engine.step(0.0);

    let frames = frames.0.borrow();
    // Menu: the dormant ship is not drawn
    assert_eq!(frames[0], (GameStatus::Menu, 0));
    let expected = 1 + engine.config.level.asteroid_count(1) as usize;
    assert_eq!(frames[1], (GameStatus::Playing, expected));

    let snapshot = engine.snapshot();
    assert!(snapshot.ship_visible);
    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"status\":\"playing\""));
}

/// Handler that reads and drives the engine from inside its callbacks
struct Shell {
    engine: Rc<RefCell<Engine>>,
    seen: Vec<(GameStatus, GameStatus)>,
    game_overs: Vec<u64>,
}

impl GameEvents for Shell {
    fn on_game_state_change(&mut self, state: &GameState) {
        let live = self.engine.borrow().game_state().status;
        self.seen.push((state.status, live));
    }

    fn on_game_over(&mut self, final_score: u64) {
        self.game_overs.push(final_score);
        self.engine.borrow_mut().restart();
    }
}

#[test]
fn test_queued_events_let_handlers_reenter_engine() {
    let queue = EventQueue::new();
    let collaborators = Collaborators::new(ManualClock::new(0.0))
        .with_events(queue.clone())
        .with_seed(7);
    let engine = Engine::new(
        &HeadlessSurface::new(800.0, 600.0),
        collaborators,
        GameConfig::default(),
    )
    .expect("engine builds");
    let engine = Rc::new(RefCell::new(engine));
    let mut shell = Shell {
        engine: engine.clone(),
        seen: Vec::new(),
        game_overs: Vec::new(),
    };

    engine.borrow_mut().start();
    queue.dispatch(&mut shell);
    assert_eq!(shell.seen, vec![(GameStatus::Playing, GameStatus::Playing)]);

    {
        let mut e = engine.borrow_mut();
        e.state.lives = 1;
        make_vulnerable(&mut e);
        let center = e.bounds() / 2.0;
        rock_at(&mut e, AsteroidSize::Large, center);
        e.step(0.0);
    }
    assert_eq!(engine.borrow().game_state().status, GameStatus::GameOver);
    queue.dispatch(&mut shell);

    // The game-over handler restarted the game; its events arrived too
    assert_eq!(shell.game_overs, vec![0]);
    assert_eq!(engine.borrow().game_state().status, GameStatus::Playing);
    assert_eq!(
        shell.seen.last(),
        Some(&(GameStatus::Playing, GameStatus::Playing))
    );
    assert!(shell
        .seen
        .contains(&(GameStatus::GameOver, GameStatus::GameOver)));
    assert!(queue.is_empty());
}
