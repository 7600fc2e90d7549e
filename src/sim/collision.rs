//! Collision detection and resolution
//!
//! Detection walks unordered pairs of active entities, filtered by a symmetric
//! type-pair table, and tests circle overlap. Large populations go through a
//! uniform grid first; both paths return the same sorted pair list, so
//! resolution sees identical input either way.

use glam::Vec2;

use super::entity::{Entity, EntityKind, Simulate};
use super::grid::SpatialGrid;
use crate::math::circles_overlap;
use crate::tuning::CollisionTuning;

/// Side effects of a resolved collision that the orchestrator must apply
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionEvent {
    /// The ship took damage and is now inactive
    ShipDestroyed { ship: usize, pos: Vec2 },
    /// An asteroid's health reached zero; it is inactive and should split
    AsteroidDestroyed { asteroid: usize, by_ship: bool },
    /// A saucer was shot down
    SaucerDestroyed { saucer: usize, by_ship: bool },
}

/// Symmetric table of type pairs that can collide
pub fn can_collide(a: EntityKind, b: EntityKind) -> bool {
    use EntityKind::*;
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    matches!(
        (lo, hi),
        (Ship, Asteroid) | (Ship, Bullet) | (Ship, Saucer) | (Asteroid, Bullet) | (Bullet, Saucer)
    )
}

/// A bullet never hits the entity that fired it
fn is_own_bullet(a: &Entity, b: &Entity) -> bool {
    let owns = |bullet: &Entity, other: &Entity| {
        bullet
            .as_bullet()
            .is_some_and(|bullet| bullet.source == other.id())
    };
    owns(a, b) || owns(b, a)
}

fn collides(a: &Entity, b: &Entity) -> bool {
    if !a.is_active() || !b.is_active() {
        return false;
    }
    if !can_collide(a.kind(), b.kind()) || is_own_bullet(a, b) {
        return false;
    }
    circles_overlap(
        a.body().pos,
        a.collision_radius(),
        b.body().pos,
        b.collision_radius(),
    )
}

/// Overlapping pairs `(i, j)` with `i < j`, sorted
pub fn detect(entities: &[Entity], tuning: &CollisionTuning) -> Vec<(usize, usize)> {
    if entities.len() >= tuning.grid_threshold {
        detect_with_grid(entities, tuning.grid_cell_size)
    } else {
        detect_pairwise(entities)
    }
}

/// Brute-force O(n²) detection
pub fn detect_pairwise(entities: &[Entity]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..entities.len() {
        for j in (i + 1)..entities.len() {
            if collides(&entities[i], &entities[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Grid-accelerated detection
///
/// The cell size is raised to the largest possible contact distance so that
/// every overlapping pair shares a cell or a neighboring one.
pub fn detect_with_grid(entities: &[Entity], cell_size: f32) -> Vec<(usize, usize)> {
    let max_radius = entities
        .iter()
        .filter(|e| e.is_active())
        .map(|e| e.collision_radius())
        .fold(0.0_f32, f32::max);
    let mut grid = SpatialGrid::new(cell_size.max(max_radius * 2.0));

    for (i, entity) in entities.iter().enumerate() {
        if entity.is_active() && entity.collision_radius() > 0.0 {
            grid.insert(i, entity.body().pos);
        }
    }

    let mut pairs = Vec::new();
    for (i, entity) in entities.iter().enumerate() {
        if !entity.is_active() || entity.collision_radius() <= 0.0 {
            continue;
        }
        for j in grid.neighbors(entity.body().pos, i) {
            if j > i && collides(entity, &entities[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

/// Two distinct mutable entries of a slice
fn pair_mut(entities: &mut [Entity], i: usize, j: usize) -> (&mut Entity, &mut Entity) {
    debug_assert_ne!(i, j);
    if i < j {
        let (head, tail) = entities.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = entities.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

/// Apply the per-pair rules in order
///
/// A pair is skipped if either side was deactivated by an earlier pair this
/// frame (a bullet is spent on its first hit).
pub fn resolve(entities: &mut [Entity], pairs: &[(usize, usize)]) -> Vec<CollisionEvent> {
    let mut events = Vec::new();

    for &(i, j) in pairs {
        if i == j || i >= entities.len() || j >= entities.len() {
            continue;
        }
        // Order so that `a` has the lower kind discriminant
        let (ia, ib) = if entities[i].kind() <= entities[j].kind() {
            (i, j)
        } else {
            (j, i)
        };
        let (a, b) = pair_mut(entities, ia, ib);
        if !a.is_active() || !b.is_active() || is_own_bullet(a, b) {
            continue;
        }

        match (a, b) {
            (Entity::Ship(ship), Entity::Asteroid(_) | Entity::Saucer(_)) => {
                if ship.take_damage() {
                    log::debug!("ship {} destroyed by collision", ship.body.id);
                    events.push(CollisionEvent::ShipDestroyed {
                        ship: ia,
                        pos: ship.body.pos,
                    });
                }
            }
            (Entity::Ship(ship), Entity::Bullet(bullet)) => {
                bullet.body.active = false;
                if ship.take_damage() {
                    log::debug!("ship {} shot by {:?}", ship.body.id, bullet.source_kind);
                    events.push(CollisionEvent::ShipDestroyed {
                        ship: ia,
                        pos: ship.body.pos,
                    });
                }
            }
            (Entity::Asteroid(asteroid), Entity::Bullet(bullet)) => {
                bullet.body.active = false;
                if asteroid.take_damage(1) {
                    asteroid.body.active = false;
                    events.push(CollisionEvent::AsteroidDestroyed {
                        asteroid: ia,
                        by_ship: bullet.fired_by_ship(),
                    });
                }
            }
            (Entity::Bullet(bullet), Entity::Saucer(saucer)) => {
                bullet.body.active = false;
                saucer.body.active = false;
                events.push(CollisionEvent::SaucerDestroyed {
                    saucer: ib,
                    by_ship: bullet.fired_by_ship(),
                });
            }
            // Not in the rule table: no collision
            _ => {}
        }
    }

    events
}
