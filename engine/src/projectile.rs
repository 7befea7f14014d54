//! Tower projectiles.
//!
//! A bullet is spawned from its tower's pool already aimed: the tower
//! bakes a straight-line trajectory to the predicted intercept point and
//! binds it together with the target's collider handle through
//! [`Bullet::update_target`]. The bullet then just flies its line; the
//! game resolves damage when the line is exhausted.

use std::sync::Arc;

use pathguard_core::{Kind, Location};
use pathguard_system_animation::PrecalculatedAnimator;
use pathguard_system_pooling::PoolItem;
use pathguard_world::ColliderId;

use crate::asset::Asset;
use crate::enemy::Body;
use crate::scene::Scene;

/// Immutable attributes shared by every bullet a tower kind fires.
#[derive(Clone, Debug)]
pub struct ProjectileSpec {
    kind: Kind,
    asset: Kind,
    effect: Kind,
    pool_size: usize,
    speed: i32,
    damage: i32,
    explosion_radius: i32,
}

impl ProjectileSpec {
    /// Creates a projectile spec.
    #[must_use]
    pub fn new(
        kind: Kind,
        asset: Kind,
        effect: Kind,
        pool_size: usize,
        speed: i32,
        damage: i32,
        explosion_radius: i32,
    ) -> Self {
        Self {
            kind,
            asset,
            effect,
            pool_size: pool_size.max(1),
            speed: speed.max(1),
            damage,
            explosion_radius: explosion_radius.max(1),
        }
    }

    /// The kind the projectile pool is keyed by.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Kind of the asset bullets draw with.
    #[must_use]
    pub fn asset(&self) -> &Kind {
        &self.asset
    }

    /// Kind of the explosion effect played on impact.
    #[must_use]
    pub fn effect(&self) -> &Kind {
        &self.effect
    }

    /// Instances the pool is pre-filled with.
    #[must_use]
    pub const fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Flight speed in pixels per tick.
    #[must_use]
    pub const fn speed(&self) -> i32 {
        self.speed
    }

    /// Damage applied to the target on impact.
    #[must_use]
    pub const fn damage(&self) -> i32 {
        self.damage
    }

    /// Blast radius in pixels; also widens the intercept search stride.
    #[must_use]
    pub const fn explosion_radius(&self) -> i32 {
        self.explosion_radius
    }
}

/// A pooled projectile in flight.
#[derive(Clone, Debug)]
pub struct Bullet {
    spec: Arc<ProjectileSpec>,
    asset: Asset,
    body: Body,
    flight: Option<PrecalculatedAnimator>,
    target: Option<ColliderId>,
    active: bool,
}

impl Bullet {
    /// Creates the master bullet for a projectile spec; pools clone it.
    #[must_use]
    pub fn new(spec: Arc<ProjectileSpec>, asset: Asset) -> Self {
        Self {
            spec,
            asset,
            body: Body {
                location: Location::ZERO,
                speed: 1,
            },
            flight: None,
            target: None,
            active: false,
        }
    }

    /// The shared spec.
    #[must_use]
    pub fn spec(&self) -> &ProjectileSpec {
        &self.spec
    }

    /// Re-aims the bullet at a target along a freshly baked flight line.
    ///
    /// The line's tick count encodes the flight duration, so the bullet
    /// consumes exactly one trajectory tick per simulation tick.
    pub fn update_target(&mut self, target: ColliderId, flight: PrecalculatedAnimator) {
        self.body.location = flight.location_at(0).unwrap_or(Location::ZERO);
        self.flight = Some(flight);
        self.target = Some(target);
    }

    /// Collider handle of the enemy this bullet was aimed at.
    #[must_use]
    pub const fn target(&self) -> Option<ColliderId> {
        self.target
    }

    /// Current pixel location.
    #[must_use]
    pub fn location(&self) -> Location {
        self.body.location
    }

    /// Advances flight by one tick.
    pub fn process(&mut self) {
        if let Some(flight) = &mut self.flight {
            flight.animate(&mut self.body);
        }
    }

    /// Reports whether the flight line is exhausted.
    #[must_use]
    pub fn arrived(&self) -> bool {
        self.flight.as_ref().is_none_or(PrecalculatedAnimator::done)
    }

    /// Pushes the bullet's draw command.
    pub fn draw(&self, scene: &mut Scene) {
        self.asset.draw(self.body.location, scene);
    }
}

impl PoolItem for Bullet {
    fn init(&mut self) {
        self.active = true;
    }

    fn reset(&mut self) {
        self.flight = None;
        self.target = None;
        self.body.location = Location::ZERO;
        self.active = false;
    }

    fn active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::StaticAsset;
    use pathguard_core::Point;
    use pathguard_system_pooling::Pool;

    fn spec() -> Arc<ProjectileSpec> {
        Arc::new(ProjectileSpec::new(
            Kind::new("bolt"),
            Kind::new("bolt-sheet"),
            Kind::new("boom"),
            2,
            5,
            3,
            8,
        ))
    }

    fn aimed_bullet(ticks: i32) -> Bullet {
        let mut bullet = Bullet::new(spec(), Asset::Static(StaticAsset::new(Kind::new("bolt"))));
        bullet.init();
        let flight = PrecalculatedAnimator::from_line(
            Kind::new("flight"),
            Point::ZERO,
            Point::new(40, 30),
            ticks,
        );
        bullet.update_target(dummy_collider(), flight);
        bullet
    }

    fn dummy_collider() -> ColliderId {
        let mut graph = pathguard_world::Graph::from_text("0,0\nS\n").expect("valid map");
        graph.register_collider()
    }

    #[test]
    fn bullet_arrives_after_its_flight_ticks() {
        let mut bullet = aimed_bullet(10);
        for _ in 0..9 {
            bullet.process();
        }
        assert!(!bullet.arrived());
        bullet.process();
        assert!(bullet.arrived());
        assert_eq!(bullet.location().point(), Point::new(40, 30));
    }

    #[test]
    fn unaimed_bullet_counts_as_arrived() {
        let mut bullet = Bullet::new(spec(), Asset::Static(StaticAsset::new(Kind::new("bolt"))));
        bullet.init();
        assert!(bullet.arrived());
        assert_eq!(bullet.target(), None);
    }

    #[test]
    fn release_disarms_the_bullet() {
        let template = aimed_bullet(4);
        let mut pool = Pool::new(1, move || template.clone());
        let bullet = pool.acquire();
        // Clones inherit the template's aim until re-aimed; releasing
        // must strip it.
        pool.release(bullet);
        let bullet = pool.acquire();
        assert_eq!(bullet.target(), None);
        assert!(bullet.arrived());
    }
}
