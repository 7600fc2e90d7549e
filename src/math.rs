//! Vector and scalar helpers
//!
//! Thin wrappers over `glam::Vec2` plus the procedural helpers used by
//! spawning: random ranges, asteroid outlines and safe spawn positions.
//! Every function here is pure apart from drawing from the supplied RNG.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::polar_to_cartesian;

/// Unit vector pointing along `angle` (radians, screen coordinates)
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    polar_to_cartesian(1.0, angle)
}

/// Normalize, returning zero for a zero-length (or non-finite) vector
#[inline]
pub fn normalize(v: Vec2) -> Vec2 {
    v.normalize_or_zero()
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Bearing from `from` to `to` in radians
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

#[inline]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a.lerp(b, t)
}

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Uniform float in `[min, max)`; returns `min` for an empty range
pub fn random_range<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.random_range(min..max)
    } else {
        min
    }
}

/// Uniform integer in `[min, max]`; returns `min` for an empty range
pub fn random_int<R: Rng>(rng: &mut R, min: u32, max: u32) -> u32 {
    if max > min {
        rng.random_range(min..=max)
    } else {
        min
    }
}

/// Irregular polygon outline around the origin
///
/// Vertices sit at evenly spaced angles, so the outline is star-shaped and
/// never self-intersects. Each radius is jittered by ±`irregularity`.
pub fn generate_asteroid_vertices<R: Rng>(
    rng: &mut R,
    base_radius: f32,
    irregularity: f32,
    vertex_count: u32,
) -> Vec<Vec2> {
    let count = vertex_count.max(3);
    let jitter = irregularity.clamp(0.0, 0.9);
    let step = TAU / count as f32;
    (0..count)
        .map(|i| {
            let r = base_radius * (1.0 + random_range(rng, -jitter, jitter));
            polar_to_cartesian(r, i as f32 * step)
        })
        .collect()
}

/// Strict circle overlap: `distance < ra + rb`
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) < reach * reach
}

/// Wrap a position onto the torus `[0, bounds)`
pub fn wrap_position(pos: Vec2, bounds: Vec2) -> Vec2 {
    Vec2::new(wrap_axis(pos.x, bounds.x), wrap_axis(pos.y, bounds.y))
}

#[inline]
pub fn wrap_axis(value: f32, extent: f32) -> f32 {
    if extent <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to exactly `extent` for tiny negatives
    if wrapped >= extent { 0.0 } else { wrapped }
}

/// True once `pos` is more than `margin` outside the playfield
pub fn is_off_screen(pos: Vec2, bounds: Vec2, margin: f32) -> bool {
    pos.x < -margin || pos.y < -margin || pos.x > bounds.x + margin || pos.y > bounds.y + margin
}

/// Random point at least `min_distance` from `avoid`
///
/// Tries `max_attempts` uniform draws. When every draw lands too close, falls
/// back to the playfield corner farthest from `avoid`.
pub fn safe_spawn_position<R: Rng>(
    rng: &mut R,
    bounds: Vec2,
    avoid: Vec2,
    min_distance: f32,
    max_attempts: u32,
) -> Vec2 {
    for _ in 0..max_attempts {
        let candidate = Vec2::new(
            random_range(rng, 0.0, bounds.x),
            random_range(rng, 0.0, bounds.y),
        );
        if candidate.distance(avoid) >= min_distance {
            return candidate;
        }
    }

    log::debug!("safe spawn exhausted {} attempts, using edge fallback", max_attempts);
    let x = if avoid.x > bounds.x / 2.0 { 0.0 } else { bounds.x };
    let y = if avoid.y > bounds.y / 2.0 { 0.0 } else { bounds.y };
    Vec2::new(x, y)
}
