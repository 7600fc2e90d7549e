//! Simulation module
//!
//! Entities, collision rules and the world arena. Nothing here touches the
//! platform: time arrives as a `dt` argument and randomness through a seeded
//! `Pcg32`.

pub mod asteroid;
pub mod bullet;
pub mod collision;
pub mod entity;
pub mod explosion;
pub mod grid;
pub mod saucer;
pub mod ship;
pub mod state;
pub mod world;

pub use asteroid::{Asteroid, AsteroidSize};
pub use bullet::Bullet;
pub use collision::{CollisionEvent, can_collide, detect, resolve};
pub use entity::{Body, Entity, EntityId, EntityKind, Simulate};
pub use explosion::{Explosion, Particle};
pub use saucer::{Saucer, SaucerSize, Side};
pub use ship::Ship;
pub use state::{GameState, GameStatus};
pub use world::World;
