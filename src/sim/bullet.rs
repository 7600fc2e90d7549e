//! Bullets fired by the ship and by saucers

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Body, EntityId, EntityKind, Simulate};
use crate::math::{heading, is_off_screen};
use crate::tuning::BulletTuning;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub body: Body,
    pub lifetime_ms: f32,
    pub max_lifetime_ms: f32,
    /// Shooter id, never collides with its own source
    pub source: EntityId,
    pub source_kind: EntityKind,
    radius: f32,
    offscreen_margin: f32,
}

impl Bullet {
    /// Fire from `pos` along `angle`, inheriting the shooter's velocity
    pub fn fire(
        source: EntityId,
        source_kind: EntityKind,
        pos: Vec2,
        source_vel: Vec2,
        angle: f32,
        muzzle_speed: f32,
        tuning: &BulletTuning,
    ) -> Self {
        let mut body = Body::new(pos, source_vel + heading(angle) * muzzle_speed);
        body.rotation = angle;
        Self {
            body,
            lifetime_ms: tuning.lifetime_ms,
            max_lifetime_ms: tuning.lifetime_ms,
            source,
            source_kind,
            radius: tuning.radius,
            offscreen_margin: tuning.offscreen_margin,
        }
    }

    /// Fade factor: remaining fraction of the lifetime
    pub fn alpha(&self) -> f32 {
        if self.max_lifetime_ms <= 0.0 {
            return 0.0;
        }
        (self.lifetime_ms / self.max_lifetime_ms).clamp(0.0, 1.0)
    }

    pub fn fired_by_ship(&self) -> bool {
        self.source_kind == EntityKind::Ship
    }
}

impl Simulate for Bullet {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Bullet
    }

    fn collision_radius(&self) -> f32 {
        self.radius
    }

    fn update(&mut self, dt: f32, bounds: Vec2, _rng: &mut Pcg32) {
        self.lifetime_ms = (self.lifetime_ms - dt * 1000.0).max(0.0);
        if self.lifetime_ms <= 0.0 {
            self.body.active = false;
            return;
        }

        self.body.pos += self.body.vel * dt;
        if is_off_screen(self.body.pos, bounds, self.offscreen_margin) {
            self.body.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const BOUNDS: Vec2 = Vec2::new(800.0, 600.0);

    fn bullet() -> Bullet {
        Bullet::fire(
            1,
            EntityKind::Ship,
            Vec2::new(400.0, 300.0),
            Vec2::new(50.0, 0.0),
            0.0,
            500.0,
            &BulletTuning::default(),
        )
    }

    #[test]
    fn test_inherits_source_velocity() {
        let b = bullet();
        assert!((b.body.vel.x - 550.0).abs() < 1e-3);
        assert!(b.body.vel.y.abs() < 1e-3);
        assert!(b.fired_by_ship());
    }

    #[test]
    fn test_lifetime_never_negative() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut b = bullet();
        // Huge frame delta
        b.update(30.0, BOUNDS, &mut rng);
        assert_eq!(b.lifetime_ms, 0.0);
        assert!(!b.body.active);
        assert_eq!(b.alpha(), 0.0);
    }

    #[test]
    fn test_fades_with_lifetime() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut b = bullet();
        b.body.vel = Vec2::ZERO;
        let half = b.max_lifetime_ms / 2000.0;
        b.update(half, BOUNDS, &mut rng);
        assert!((b.alpha() - 0.5).abs() < 1e-3);
        assert!(b.body.active);
    }

    #[test]
    fn test_destroyed_offscreen_without_wrap() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut b = bullet();
        b.body.pos = Vec2::new(805.0, 300.0);
        b.update(0.02, BOUNDS, &mut rng);
        assert!(!b.body.active);
        assert!(b.body.pos.x > 800.0);
    }
}
