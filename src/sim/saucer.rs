//! Saucers: AI ships that cross the screen and shoot at the player
//!
//! A saucer enters from one side, wanders toward the other with a heading
//! re-rolled every few seconds, and is removed once it leaves past the
//! opposite edge. It wraps vertically only.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Body, EntityKind, Simulate};
use crate::math::{angle_between, heading, random_range, wrap_axis};
use crate::tuning::{SaucerClass, SaucerTuning};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaucerSize {
    Large,
    Small,
}

/// Screen edge a saucer entered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Heading that crosses the screen away from this side
    pub fn base_heading(self) -> f32 {
        match self {
            Side::Left => 0.0,
            Side::Right => std::f32::consts::PI,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Saucer {
    pub body: Body,
    pub size: SaucerSize,
    pub entry_side: Side,
    /// Current unit movement direction
    pub direction: Vec2,
    /// Seconds until the heading is re-rolled
    pub direction_timer: f32,
    pub shoot_timer_ms: f32,
    /// Set when the saucer left the playfield rather than being shot
    pub exited: bool,
    pub class: SaucerClass,
    tuning: SaucerTuning,
}

impl Saucer {
    /// Spawn just outside the `side` edge at height `y`
    pub fn enter(
        size: SaucerSize,
        side: Side,
        y: f32,
        bounds: Vec2,
        tuning: &SaucerTuning,
        rng: &mut Pcg32,
    ) -> Self {
        let class = tuning.class(size);
        let x = match side {
            Side::Left => -class.radius,
            Side::Right => bounds.x + class.radius,
        };
        let mut saucer = Self {
            body: Body::new(Vec2::new(x, y), Vec2::ZERO),
            size,
            entry_side: side,
            direction: heading(side.base_heading()),
            direction_timer: 0.0,
            shoot_timer_ms: 0.0,
            exited: false,
            class,
            tuning: *tuning,
        };
        saucer.pick_direction(rng);
        saucer
    }

    /// Re-roll heading around the side-biased base heading
    fn pick_direction(&mut self, rng: &mut Pcg32) {
        let deviation = self.tuning.max_heading_deviation;
        let angle = self.entry_side.base_heading() + random_range(rng, -deviation, deviation);
        self.direction = heading(angle);
        self.body.vel = self.direction * self.class.speed;
        self.direction_timer = random_range(
            rng,
            self.tuning.min_direction_change_s,
            self.tuning.max_direction_change_s,
        );
    }

    pub fn can_shoot(&self) -> bool {
        self.body.active && self.shoot_timer_ms >= self.tuning.shoot_interval_ms
    }

    pub fn reset_shoot_timer(&mut self) {
        self.shoot_timer_ms = 0.0;
    }

    /// Aim at `target`; smaller saucers aim more accurately
    pub fn calculate_shoot_direction(&self, target: Vec2, rng: &mut Pcg32) -> f32 {
        let spread = self.class.inaccuracy;
        angle_between(self.body.pos, target) + random_range(rng, -spread, spread)
    }

    /// True once past the edge opposite the entry side
    pub fn has_exited(&self, bounds: Vec2) -> bool {
        let r = self.class.radius;
        match self.entry_side {
            Side::Left => self.body.pos.x > bounds.x + r,
            Side::Right => self.body.pos.x < -r,
        }
    }
}

impl Simulate for Saucer {
    fn body(&self) -> &Body {
        &self.body
    }

    fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Saucer
    }

    fn collision_radius(&self) -> f32 {
        self.class.radius
    }

    fn update(&mut self, dt: f32, bounds: Vec2, rng: &mut Pcg32) {
        self.shoot_timer_ms += dt * 1000.0;

        self.direction_timer -= dt;
        if self.direction_timer <= 0.0 {
            self.pick_direction(rng);
        }

        let next = self.body.pos + self.body.vel * dt;
        self.body.pos = Vec2::new(next.x, wrap_axis(next.y, bounds.y));

        if self.has_exited(bounds) {
            self.exited = true;
            self.body.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const BOUNDS: Vec2 = Vec2::new(800.0, 600.0);

    fn saucer(size: SaucerSize, side: Side, rng: &mut Pcg32) -> Saucer {
        Saucer::enter(size, side, 300.0, BOUNDS, &SaucerTuning::default(), rng)
    }

    #[test]
    fn test_moves_away_from_entry_side() {
        let mut rng = Pcg32::seed_from_u64(2);
        let left = saucer(SaucerSize::Large, Side::Left, &mut rng);
        assert!(left.body.vel.x > 0.0);
        let right = saucer(SaucerSize::Large, Side::Right, &mut rng);
        assert!(right.body.vel.x < 0.0);
    }

    #[test]
    fn test_direction_rerolled_within_window() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut s = saucer(SaucerSize::Small, Side::Left, &mut rng);
        let t = SaucerTuning::default();
        assert!(s.direction_timer >= t.min_direction_change_s);
        assert!(s.direction_timer <= t.max_direction_change_s);
        let first = s.direction;
        s.update(s.direction_timer + 0.01, BOUNDS, &mut rng);
        assert_ne!(s.direction, first);
        // Still heading rightward within the deviation cone
        assert!(s.direction.x > 0.0);
    }

    #[test]
    fn test_shoot_timer() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut s = saucer(SaucerSize::Large, Side::Left, &mut rng);
        assert!(!s.can_shoot());
        s.update(0.5, BOUNDS, &mut rng);
        assert!(!s.can_shoot());
        s.update(1.1, BOUNDS, &mut rng);
        assert!(s.can_shoot());
        s.reset_shoot_timer();
        assert!(!s.can_shoot());
    }

    #[test]
    fn test_exit_deactivates() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut s = saucer(SaucerSize::Large, Side::Left, &mut rng);
        s.body.pos.x = BOUNDS.x + s.class.radius - 0.5;
        s.update(0.1, BOUNDS, &mut rng);
        assert!(s.exited);
        assert!(!s.body.active);
    }

    #[test]
    fn test_wraps_vertically() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut s = saucer(SaucerSize::Large, Side::Left, &mut rng);
        s.body.pos = Vec2::new(400.0, 599.0);
        s.body.vel = Vec2::new(0.0, 100.0);
        s.direction_timer = 10.0;
        s.update(0.1, BOUNDS, &mut rng);
        assert!(s.body.pos.y < 20.0);
        assert!(s.body.active);
    }

    #[test]
    fn test_small_saucer_aims_tighter() {
        let mut rng = Pcg32::seed_from_u64(8);
        let target = Vec2::new(400.0, 300.0);
        let large = saucer(SaucerSize::Large, Side::Left, &mut rng);
        let small = saucer(SaucerSize::Small, Side::Left, &mut rng);
        let t = SaucerTuning::default();
        for _ in 0..100 {
            let truth = angle_between(large.body.pos, target);
            let aim = large.calculate_shoot_direction(target, &mut rng);
            assert!((aim - truth).abs() <= t.large.inaccuracy + 1e-5);
            let truth = angle_between(small.body.pos, target);
            let aim = small.calculate_shoot_direction(target, &mut rng);
            assert!((aim - truth).abs() <= t.small.inaccuracy + 1e-5);
        }
        assert!(t.small.inaccuracy < t.large.inaccuracy);
    }
}
