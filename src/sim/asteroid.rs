//! Asteroids: spinning irregular rocks that split when destroyed

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::entity::{Body, EntityKind, Simulate};
use crate::math::{generate_asteroid_vertices, heading, random_int, random_range, wrap_position};
use crate::tuning::AsteroidTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AsteroidSize {
    Large,
    Medium,
    Small,
}

impl AsteroidSize {
    /// Next size down, `None` for small
    pub fn smaller(self) -> Option<Self> {
        match self {
            AsteroidSize::Large => Some(AsteroidSize::Medium),
            AsteroidSize::Medium => Some(AsteroidSize::Small),
            AsteroidSize::Small => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asteroid {
    pub body: Body,
    pub size: AsteroidSize,
    /// Outline relative to the center, before rotation
    pub vertices: Vec<Vec2>,
    pub health: u32,
    /// Spin (rad/s)
    pub rotation_speed: f32,
    radius: f32,
}

impl Asteroid {
    /// Build an asteroid with a fresh random outline and spin
    pub fn new(
        size: AsteroidSize,
        pos: Vec2,
        vel: Vec2,
        tuning: &AsteroidTuning,
        rng: &mut Pcg32,
    ) -> Self {
        let radius = tuning.radius.get(size);
        let vertex_count = random_int(rng, tuning.min_vertices, tuning.max_vertices);
        let vertices = generate_asteroid_vertices(rng, radius, tuning.irregularity, vertex_count);
        let rotation_speed =
            random_range(rng, -tuning.max_rotation_speed, tuning.max_rotation_speed);
        let mut body = Body::new(pos, vel);
        body.rotation = random_range(rng, 0.0, TAU);

        Self {
            body,
            size,
            vertices,
            health: 1,
            rotation_speed,
            radius,
        }
    }

    /// Field asteroid drifting in a random direction
    pub fn random_drift(
        size: AsteroidSize,
        pos: Vec2,
        tuning: &AsteroidTuning,
        rng: &mut Pcg32,
    ) -> Self {
        let speed = random_range(rng, tuning.min_speed, tuning.max_speed);
        let vel = heading(random_range(rng, 0.0, TAU)) * speed;
        Self::new(size, pos, vel, tuning, rng)
    }

    /// Subtract damage; returns true once health reaches zero
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.health = self.health.saturating_sub(amount);
        self.health == 0
    }

    /// Fragments one size down, or nothing for small asteroids
    ///
    /// Each fragment starts near the parent's position and moves at a random
    /// angle with 0.8x to 1.5x the parent's speed.
    pub fn split(&self, tuning: &AsteroidTuning, rng: &mut Pcg32) -> Vec<Asteroid> {
        let Some(child_size) = self.size.smaller() else {
            return Vec::new();
        };
        let count = tuning.split_count.get(self.size);
        let parent_speed = self.body.vel.length();

        (0..count)
            .map(|_| {
                let offset = heading(rng.random_range(0.0..TAU))
                    * random_range(rng, 0.0, tuning.fragment_offset);
                let speed = parent_speed * rng.random_range(0.8..=1.5);
                let vel = heading(rng.random_range(0.0..TAU)) * speed;
                Asteroid::new(child_size, self.body.pos + offset, vel, tuning, rng)
            })
            .collect()
    }
}

impl Simulate for Asteroid {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Asteroid
    }

    fn collision_radius(&self) -> f32 {
        self.radius
    }

    fn update(&mut self, dt: f32, bounds: Vec2, _rng: &mut Pcg32) {
        self.body.rotation = (self.body.rotation + self.rotation_speed * dt).rem_euclid(TAU);
        self.body.pos = wrap_position(self.body.pos + self.body.vel * dt, bounds);
    }
}
