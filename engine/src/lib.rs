#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Entity templates, declaration loading and the per-tick game loop.
//!
//! The engine turns a directory of declaration records into live atlases
//! of master templates (assets, graphs, animators, enemies, towers) and
//! drives the layered simulation pass: spawner, towers, projectiles,
//! enemies, effects. Rendering stays outside; the engine only emits
//! abstract draw commands into a [`scene::Scene`].

pub mod asset;
pub mod declaration;
pub mod effect;
pub mod enemy;
pub mod game;
pub mod projectile;
pub mod scene;
pub mod tower;

pub use asset::{Asset, AssetAtlas, Sprite, SpriteSheet, StaticAsset};
pub use declaration::{DeclarationError, Declarations};
pub use effect::SpriteEffect;
pub use enemy::{Enemy, EnemySpec, EnemyTemplate};
pub use game::{Game, GameError};
pub use projectile::{Bullet, ProjectileSpec};
pub use scene::{DrawCommand, DrawOptions, Scene};
pub use tower::{ShootingTower, Shot, TowerSpec, TowerTemplate};

pub use pathguard_system_spawning::{Round, WaveSpawner};
