//! Particle bursts left behind by destroyed ships, asteroids and saucers
//!
//! Purely visual: explosions never collide.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use super::entity::{Body, EntityKind, Simulate};
use crate::math::{heading, random_range};
use crate::tuning::ExplosionTuning;

/// Particle palettes (0xRRGGBB)
pub const SHIP_COLORS: &[u32] = &[0xffffff, 0x9fd8ff, 0x4aa8ff];
pub const ASTEROID_COLORS: &[u32] = &[0xb0b0b0, 0x8a8a8a, 0xd8c8a8];
pub const SAUCER_COLORS: &[u32] = &[0xff5a5a, 0xffb347, 0xfff07a];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Remaining life (ms)
    pub life: f32,
    pub max_life: f32,
    /// Size at spawn; rendered size scales with remaining life
    pub base_size: f32,
    pub color: u32,
}

impl Particle {
    /// Remaining-life fraction in [0, 1]
    pub fn life_fraction(&self) -> f32 {
        if self.max_life <= 0.0 {
            return 0.0;
        }
        (self.life / self.max_life).clamp(0.0, 1.0)
    }

    pub fn alpha(&self) -> f32 {
        self.life_fraction()
    }

    pub fn size(&self) -> f32 {
        self.base_size * self.life_fraction()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub body: Body,
    pub particles: Vec<Particle>,
    pub elapsed_ms: f32,
    pub duration_ms: f32,
    drag: f32,
}

impl Explosion {
    pub fn new(
        center: Vec2,
        particle_count: u32,
        palette: &[u32],
        tuning: &ExplosionTuning,
        rng: &mut Pcg32,
    ) -> Self {
        let particles = (0..particle_count)
            .map(|i| {
                let speed =
                    random_range(rng, tuning.min_particle_speed, tuning.max_particle_speed);
                let life = random_range(
                    rng,
                    tuning.min_particle_life_ms,
                    tuning.max_particle_life_ms,
                );
                let color = if palette.is_empty() {
                    0xffffff
                } else {
                    palette[i as usize % palette.len()]
                };
                Particle {
                    pos: center,
                    vel: heading(random_range(rng, 0.0, TAU)) * speed,
                    life,
                    max_life: life,
                    base_size: random_range(
                        rng,
                        tuning.min_particle_size,
                        tuning.max_particle_size,
                    ),
                    color,
                }
            })
            .collect();

        Self {
            body: Body::new(center, Vec2::ZERO),
            particles,
            elapsed_ms: 0.0,
            duration_ms: tuning.duration_ms,
            drag: tuning.drag,
        }
    }
}

impl Simulate for Explosion {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Explosion
    }

    fn collision_radius(&self) -> f32 {
        0.0
    }

    fn update(&mut self, dt: f32, _bounds: Vec2, _rng: &mut Pcg32) {
        let dt_ms = dt * 1000.0;
        self.elapsed_ms += dt_ms;

        // Drag is tuned per 60 Hz frame
        let drag = self.drag.powf(dt * 60.0);
        for particle in &mut self.particles {
            particle.pos += particle.vel * dt;
            particle.vel *= drag;
            particle.life -= dt_ms;
        }
        self.particles.retain(|p| p.life > 0.0);

        if self.particles.is_empty() || self.elapsed_ms >= self.duration_ms {
            self.body.active = false;
        }
    }
}
