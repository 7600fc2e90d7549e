//! The player's ship

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Body, EntityKind, Simulate};
use crate::math::{heading, wrap_position};
use crate::normalize_angle;
use crate::tuning::ShipTuning;

/// Facing at spawn: straight up the screen
pub const SPAWN_ROTATION: f32 = -std::f32::consts::FRAC_PI_2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub body: Body,
    /// Thrust held this frame
    pub thrusting: bool,
    pub invulnerable: bool,
    pub invulnerable_ms: f32,
    /// Time until the next shot is allowed
    pub fire_cooldown_ms: f32,
    pub tuning: ShipTuning,
}

impl Ship {
    pub fn new(pos: Vec2, tuning: ShipTuning) -> Self {
        let mut body = Body::new(pos, Vec2::ZERO);
        body.rotation = SPAWN_ROTATION;
        Self {
            body,
            thrusting: false,
            invulnerable: false,
            invulnerable_ms: 0.0,
            fire_cooldown_ms: 0.0,
            tuning,
        }
    }

    /// Unit vector the nose points along
    pub fn heading(&self) -> Vec2 {
        heading(self.body.rotation)
    }

    /// Point bullets leave from
    pub fn nose(&self) -> Vec2 {
        self.body.pos + self.heading() * self.tuning.radius
    }

    /// Turn by the fixed rate; `direction` is -1 (left) or +1 (right)
    pub fn turn(&mut self, direction: f32, dt: f32) {
        let delta = direction.clamp(-1.0, 1.0) * self.tuning.rotation_speed * dt;
        self.body.rotation = normalize_angle(self.body.rotation + delta);
    }

    pub fn set_thrust(&mut self, on: bool) {
        self.thrusting = on;
    }

    pub fn can_fire(&self) -> bool {
        self.body.active && self.fire_cooldown_ms <= 0.0
    }

    pub fn reset_fire_cooldown(&mut self, cooldown_ms: f32) {
        self.fire_cooldown_ms = cooldown_ms;
    }

    /// Apply collision damage; returns false when the hit is ignored
    pub fn take_damage(&mut self) -> bool {
        if self.invulnerable || !self.body.active {
            return false;
        }
        self.body.active = false;
        self.thrusting = false;
        true
    }

    /// Reset to `pos` at rest and start the invulnerability window
    pub fn respawn(&mut self, pos: Vec2) {
        self.body.pos = pos;
        self.body.vel = Vec2::ZERO;
        self.body.rotation = SPAWN_ROTATION;
        self.body.active = true;
        self.thrusting = false;
        self.fire_cooldown_ms = 0.0;
        self.invulnerable = true;
        self.invulnerable_ms = self.tuning.invulnerability_ms;
    }

    /// Flashing while invulnerable; cosmetic only
    pub fn is_visible(&self) -> bool {
        if !self.body.active {
            return false;
        }
        if !self.invulnerable || self.tuning.flash_period_ms <= 0.0 {
            return true;
        }
        let elapsed = self.tuning.invulnerability_ms - self.invulnerable_ms;
        let half_period = self.tuning.flash_period_ms / 2.0;
        ((elapsed / half_period) as u32) % 2 == 0
    }
}

impl Simulate for Ship {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Ship
    }

    fn collision_radius(&self) -> f32 {
        self.tuning.radius
    }

    fn update(&mut self, dt: f32, bounds: Vec2, _rng: &mut Pcg32) {
        let dt_ms = dt * 1000.0;

        if self.invulnerable {
            self.invulnerable_ms -= dt_ms;
            if self.invulnerable_ms <= 0.0 {
                self.invulnerable_ms = 0.0;
                self.invulnerable = false;
            }
        }
        self.fire_cooldown_ms = (self.fire_cooldown_ms - dt_ms).max(0.0);

        if self.thrusting {
            self.body.vel += self.heading() * self.tuning.thrust * dt;
        }

        // Friction is tuned per 60 Hz frame
        self.body.vel *= self.tuning.friction.powf(dt * 60.0);
        self.body.vel = self.body.vel.clamp_length_max(self.tuning.max_speed);

        self.body.pos = wrap_position(self.body.pos + self.body.vel * dt, bounds);
    }
}
