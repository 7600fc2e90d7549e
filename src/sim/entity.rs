//! Entity contract and the closed set of entity kinds
//!
//! Every simulated object shares a [`Body`] and implements [`Simulate`].
//! [`Entity`] is the tagged union the world stores; it forwards the trait to
//! the concrete kind.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::asteroid::Asteroid;
use super::bullet::Bullet;
use super::explosion::Explosion;
use super::saucer::Saucer;
use super::ship::Ship;

/// Stable entity identifier (0 = not yet spawned into a world)
pub type EntityId = u32;

/// Entity type discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Ship,
    Asteroid,
    Bullet,
    Saucer,
    Explosion,
}

/// State shared by every entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Facing (radians)
    pub rotation: f32,
    /// Inactive entities skip updates, collisions and rendering
    pub active: bool,
}

impl Body {
    pub fn new(pos: Vec2, vel: Vec2) -> Self {
        Self {
            id: 0,
            pos,
            vel,
            rotation: 0.0,
            active: true,
        }
    }
}

/// Per-frame behavior every entity kind provides
pub trait Simulate {
    fn body(&self) -> &Body;
    fn body_mut(&mut self) -> &mut Body;
    fn kind(&self) -> EntityKind;
    /// Fixed, size-dependent radius (zero for non-colliding entities)
    fn collision_radius(&self) -> f32;
    /// Advance by `dt` seconds inside a `bounds`-sized playfield
    fn update(&mut self, dt: f32, bounds: Vec2, rng: &mut Pcg32);

    fn id(&self) -> EntityId {
        self.body().id
    }

    fn is_active(&self) -> bool {
        self.body().active
    }

    fn deactivate(&mut self) {
        self.body_mut().active = false;
    }
}

/// Any simulated object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Entity {
    Ship(Ship),
    Asteroid(Asteroid),
    Bullet(Bullet),
    Saucer(Saucer),
    Explosion(Explosion),
}

macro_rules! dispatch {
    ($self:expr, $e:ident => $body:expr) => {
        match $self {
            Entity::Ship($e) => $body,
            Entity::Asteroid($e) => $body,
            Entity::Bullet($e) => $body,
            Entity::Saucer($e) => $body,
            Entity::Explosion($e) => $body,
        }
    };
}

impl Simulate for Entity {
    fn body(&self) -> &Body {
        dispatch!(self, e => e.body())
    }

    fn body_mut(&mut self) -> &mut Body {
        dispatch!(self, e => e.body_mut())
    }

    fn kind(&self) -> EntityKind {
        dispatch!(self, e => e.kind())
    }

    fn collision_radius(&self) -> f32 {
        dispatch!(self, e => e.collision_radius())
    }

    fn update(&mut self, dt: f32, bounds: Vec2, rng: &mut Pcg32) {
        dispatch!(self, e => e.update(dt, bounds, rng))
    }
}

impl Entity {
    pub fn as_ship(&self) -> Option<&Ship> {
        match self {
            Entity::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    pub fn as_ship_mut(&mut self) -> Option<&mut Ship> {
        match self {
            Entity::Ship(ship) => Some(ship),
            _ => None,
        }
    }

    pub fn as_asteroid(&self) -> Option<&Asteroid> {
        match self {
            Entity::Asteroid(asteroid) => Some(asteroid),
            _ => None,
        }
    }

    pub fn as_bullet(&self) -> Option<&Bullet> {
        match self {
            Entity::Bullet(bullet) => Some(bullet),
            _ => None,
        }
    }

    pub fn as_saucer(&self) -> Option<&Saucer> {
        match self {
            Entity::Saucer(saucer) => Some(saucer),
            _ => None,
        }
    }

    pub fn as_saucer_mut(&mut self) -> Option<&mut Saucer> {
        match self {
            Entity::Saucer(saucer) => Some(saucer),
            _ => None,
        }
    }
}

impl From<Ship> for Entity {
    fn from(ship: Ship) -> Self {
        Entity::Ship(ship)
    }
}

impl From<Asteroid> for Entity {
    fn from(asteroid: Asteroid) -> Self {
        Entity::Asteroid(asteroid)
    }
}

impl From<Bullet> for Entity {
    fn from(bullet: Bullet) -> Self {
        Entity::Bullet(bullet)
    }
}

impl From<Saucer> for Entity {
    fn from(saucer: Saucer) -> Self {
        Entity::Saucer(saucer)
    }
}

impl From<Explosion> for Entity {
    fn from(explosion: Explosion) -> Self {
        Entity::Explosion(explosion)
    }
}
