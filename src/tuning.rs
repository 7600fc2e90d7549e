//! Data-driven game balance
//!
//! `GameConfig` is the single source of truth for every gameplay constant.
//! All sections default to the stock balance, so a JSON override only needs
//! the fields it changes.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::sim::asteroid::AsteroidSize;
use crate::sim::saucer::SaucerSize;

/// Playfield and frame-loop settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Playfield width in pixels (used when the surface reports no size)
    pub width: f32,
    /// Playfield height in pixels
    pub height: f32,
    /// Largest frame delta (seconds) fed to the simulation
    pub max_frame_delta: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            max_frame_delta: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipTuning {
    pub radius: f32,
    /// Speed cap (px/s)
    pub max_speed: f32,
    /// Thrust acceleration (px/s²)
    pub thrust: f32,
    /// Velocity retained per 60 Hz frame
    pub friction: f32,
    /// Turn rate (rad/s)
    pub rotation_speed: f32,
    pub invulnerability_ms: f32,
    /// Visibility toggles every half period while invulnerable
    pub flash_period_ms: f32,
    pub respawn_delay_ms: f32,
    pub starting_lives: u32,
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            radius: 12.0,
            max_speed: 400.0,
            thrust: 300.0,
            friction: 0.99,
            rotation_speed: 5.0,
            invulnerability_ms: 3000.0,
            flash_period_ms: 200.0,
            respawn_delay_ms: 2000.0,
            starting_lives: 3,
        }
    }
}

/// Per-size asteroid values, indexed by [`AsteroidSize`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerAsteroidSize<T> {
    pub large: T,
    pub medium: T,
    pub small: T,
}

impl<T: Copy> PerAsteroidSize<T> {
    pub fn get(&self, size: AsteroidSize) -> T {
        match size {
            AsteroidSize::Large => self.large,
            AsteroidSize::Medium => self.medium,
            AsteroidSize::Small => self.small,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidTuning {
    pub radius: PerAsteroidSize<f32>,
    /// Fragments emitted when an asteroid of this size splits
    pub split_count: PerAsteroidSize<u32>,
    pub points: PerAsteroidSize<u64>,
    /// Initial field speed range (px/s)
    pub min_speed: f32,
    pub max_speed: f32,
    /// Spin range (rad/s, either direction)
    pub max_rotation_speed: f32,
    pub min_vertices: u32,
    pub max_vertices: u32,
    /// Radius jitter as a fraction of the base radius
    pub irregularity: f32,
    /// Fragment spawn offset from the parent's center (px)
    pub fragment_offset: f32,
}

impl Default for AsteroidTuning {
    fn default() -> Self {
        Self {
            radius: PerAsteroidSize {
                large: 40.0,
                medium: 22.0,
                small: 12.0,
            },
            split_count: PerAsteroidSize {
                large: 2,
                medium: 2,
                small: 0,
            },
            points: PerAsteroidSize {
                large: 20,
                medium: 50,
                small: 100,
            },
            min_speed: 30.0,
            max_speed: 80.0,
            max_rotation_speed: 1.5,
            min_vertices: 6,
            max_vertices: 10,
            irregularity: 0.4,
            fragment_offset: 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BulletTuning {
    pub radius: f32,
    /// Muzzle speed added to the shooter's velocity (px/s)
    pub speed: f32,
    pub lifetime_ms: f32,
    /// Minimum time between ship shots
    pub cooldown_ms: f32,
    /// Global cap on simultaneously active bullets
    pub max_active: usize,
    /// Distance past the screen edge before a bullet is removed
    pub offscreen_margin: f32,
}

impl Default for BulletTuning {
    fn default() -> Self {
        Self {
            radius: 2.0,
            speed: 500.0,
            lifetime_ms: 1200.0,
            cooldown_ms: 200.0,
            max_active: 10,
            offscreen_margin: 10.0,
        }
    }
}

/// Values that differ between the two saucer sizes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaucerClass {
    pub radius: f32,
    pub speed: f32,
    pub points: u64,
    /// Maximum aim error (radians) either side of the true bearing
    pub inaccuracy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaucerTuning {
    /// First level on which saucers appear
    pub min_level: u32,
    pub spawn_interval_ms: f32,
    pub shoot_interval_ms: f32,
    pub bullet_speed: f32,
    pub min_direction_change_s: f32,
    pub max_direction_change_s: f32,
    /// Maximum deviation of a new heading from the base heading (radians)
    pub max_heading_deviation: f32,
    /// Chance of a small saucer on `min_level`
    pub small_chance_base: f32,
    /// Added to the small-saucer chance for each level past `min_level`
    pub small_chance_per_level: f32,
    pub small_chance_max: f32,
    pub large: SaucerClass,
    pub small: SaucerClass,
}

impl SaucerTuning {
    pub fn class(&self, size: SaucerSize) -> SaucerClass {
        match size {
            SaucerSize::Large => self.large,
            SaucerSize::Small => self.small,
        }
    }

    /// Probability that a saucer spawned on `level` is small
    pub fn small_chance(&self, level: u32) -> f32 {
        let levels_past = level.saturating_sub(self.min_level) as f32;
        (self.small_chance_base + levels_past * self.small_chance_per_level)
            .clamp(0.0, self.small_chance_max.clamp(0.0, 1.0))
    }
}

impl Default for SaucerTuning {
    fn default() -> Self {
        Self {
            min_level: 2,
            spawn_interval_ms: 15000.0,
            shoot_interval_ms: 1500.0,
            bullet_speed: 300.0,
            min_direction_change_s: 1.0,
            max_direction_change_s: 3.0,
            max_heading_deviation: std::f32::consts::FRAC_PI_4,
            small_chance_base: 0.2,
            small_chance_per_level: 0.1,
            small_chance_max: 0.8,
            large: SaucerClass {
                radius: 20.0,
                speed: 100.0,
                points: 200,
                inaccuracy: 0.35,
            },
            small: SaucerClass {
                radius: 10.0,
                speed: 150.0,
                points: 1000,
                inaccuracy: 0.1,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosionTuning {
    pub duration_ms: f32,
    /// Velocity retained per 60 Hz frame
    pub drag: f32,
    pub min_particle_speed: f32,
    pub max_particle_speed: f32,
    pub min_particle_life_ms: f32,
    pub max_particle_life_ms: f32,
    pub min_particle_size: f32,
    pub max_particle_size: f32,
    pub ship_particles: u32,
    pub asteroid_particles: u32,
    pub saucer_particles: u32,
}

impl Default for ExplosionTuning {
    fn default() -> Self {
        Self {
            duration_ms: 1500.0,
            drag: 0.96,
            min_particle_speed: 40.0,
            max_particle_speed: 160.0,
            min_particle_life_ms: 400.0,
            max_particle_life_ms: 1200.0,
            min_particle_size: 1.5,
            max_particle_size: 3.5,
            ship_particles: 30,
            asteroid_particles: 15,
            saucer_particles: 24,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelTuning {
    /// Level-completion bonus per level cleared
    pub bonus_per_level: u64,
    pub transition_delay_ms: f32,
    /// Large asteroids on level 1
    pub base_asteroids: u32,
    pub asteroids_per_level: u32,
    pub max_asteroids: u32,
    /// Minimum distance between the ship and a freshly spawned asteroid
    pub safe_spawn_distance: f32,
    pub safe_spawn_attempts: u32,
}

impl LevelTuning {
    /// Field size for a level (1-based)
    pub fn asteroid_count(&self, level: u32) -> u32 {
        let extra = level.saturating_sub(1).saturating_mul(self.asteroids_per_level);
        self.base_asteroids.saturating_add(extra).min(self.max_asteroids)
    }
}

impl Default for LevelTuning {
    fn default() -> Self {
        Self {
            bonus_per_level: 1000,
            transition_delay_ms: 2000.0,
            base_asteroids: 4,
            asteroids_per_level: 1,
            max_asteroids: 12,
            safe_spawn_distance: 150.0,
            safe_spawn_attempts: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Entity count at which the spatial grid replaces pairwise checks
    pub grid_threshold: usize,
    pub grid_cell_size: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            grid_threshold: 50,
            grid_cell_size: 100.0,
        }
    }
}

/// Complete gameplay configuration
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub world: WorldTuning,
    pub ship: ShipTuning,
    pub asteroid: AsteroidTuning,
    pub bullet: BulletTuning,
    pub saucer: SaucerTuning,
    pub explosion: ExplosionTuning,
    pub level: LevelTuning,
    pub collision: CollisionTuning,
}

impl GameConfig {
    /// Parse a (possibly partial) JSON override and validate the result
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        fn invalid(field: &'static str, reason: &str) -> Result<()> {
            Err(EngineError::InvalidConfig {
                field,
                reason: reason.to_string(),
            })
        }

        // Written so NaN fails every check
        let positive = |x: f32| x.is_finite() && x > 0.0;

        if !positive(self.world.width) || !positive(self.world.height) {
            return invalid("world", "playfield size must be positive");
        }
        if !positive(self.world.max_frame_delta) {
            return invalid("world.max_frame_delta", "must be positive");
        }
        if !(self.ship.friction > 0.0 && self.ship.friction <= 1.0) {
            return invalid("ship.friction", "must be in (0, 1]");
        }
        if !positive(self.ship.max_speed) {
            return invalid("ship.max_speed", "must be positive");
        }
        let asteroid = &self.asteroid;
        if asteroid.min_vertices < 3 || asteroid.min_vertices > asteroid.max_vertices {
            return invalid(
                "asteroid.min_vertices",
                "need 3 <= min_vertices <= max_vertices",
            );
        }
        if asteroid.split_count.small != 0 {
            return invalid("asteroid.split_count.small", "small asteroids cannot split");
        }
        if self.bullet.max_active == 0 {
            return invalid("bullet.max_active", "must be at least 1");
        }
        if !(self.explosion.drag > 0.0 && self.explosion.drag <= 1.0) {
            return invalid("explosion.drag", "must be in (0, 1]");
        }

        // A saucer must always cross toward the far edge or it never exits
        let saucer = &self.saucer;
        if !(0.0..std::f32::consts::FRAC_PI_2).contains(&saucer.max_heading_deviation) {
            return invalid("saucer.max_heading_deviation", "must be in [0, pi/2)");
        }
        if !positive(saucer.large.speed) || !positive(saucer.small.speed) {
            return invalid("saucer.speed", "must be positive");
        }
        if !positive(saucer.spawn_interval_ms) {
            return invalid("saucer.spawn_interval_ms", "must be positive");
        }
        if !positive(saucer.shoot_interval_ms) {
            return invalid("saucer.shoot_interval_ms", "must be positive");
        }
        if !(positive(saucer.min_direction_change_s)
            && saucer.max_direction_change_s.is_finite()
            && saucer.min_direction_change_s <= saucer.max_direction_change_s)
        {
            return invalid(
                "saucer.min_direction_change_s",
                "must be positive and not exceed max_direction_change_s",
            );
        }
        if !positive(self.collision.grid_cell_size) {
            return invalid("collision.grid_cell_size", "must be positive");
        }
        Ok(())
    }
}
