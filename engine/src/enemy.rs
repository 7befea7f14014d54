//! Path-walking enemies.
//!
//! Every declared enemy kind produces one master [`EnemyTemplate`] at
//! load time; live instances are pooled copies of the template. An
//! instance owns its own health, sprite cursor, animator cursor and tile
//! membership; the immutable spec is shared through an [`Arc`].

use std::sync::Arc;

use pathguard_core::{Kind, Location, Point};
use pathguard_system_animation::{Animated, PrecalculatedAnimator};
use pathguard_system_pooling::PoolItem;
use pathguard_world::{ColliderClass, ColliderId, Graph, TileLocation};

use crate::asset::Sprite;
use crate::scene::Scene;

/// Mutable position state an animator drives.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Body {
    pub(crate) location: Location,
    pub(crate) speed: i32,
}

impl Animated for Body {
    fn location(&self) -> Location {
        self.location
    }

    fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    fn speed(&self) -> i32 {
        self.speed
    }
}

/// Immutable attributes shared by every instance of an enemy kind.
#[derive(Clone, Debug)]
pub struct EnemySpec {
    kind: Kind,
    asset: Kind,
    animation: Kind,
    effect: Kind,
    health: i32,
    speed: i32,
    points: i32,
}

impl EnemySpec {
    /// Creates an enemy spec.
    #[must_use]
    pub fn new(
        kind: Kind,
        asset: Kind,
        animation: Kind,
        effect: Kind,
        health: i32,
        speed: i32,
        points: i32,
    ) -> Self {
        Self {
            kind,
            asset,
            animation,
            effect,
            health,
            speed: speed.max(1),
            points,
        }
    }

    /// The kind instances of this spec are registered under.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Kind of the sprite asset instances draw with.
    #[must_use]
    pub fn asset(&self) -> &Kind {
        &self.asset
    }

    /// Kind of the baked path animator instances travel along.
    #[must_use]
    pub fn animation(&self) -> &Kind {
        &self.animation
    }

    /// Kind of the death effect.
    #[must_use]
    pub fn effect(&self) -> &Kind {
        &self.effect
    }

    /// Hit points a fresh instance starts with.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Trajectory ticks consumed per simulation tick.
    #[must_use]
    pub const fn speed(&self) -> i32 {
        self.speed
    }

    /// Score awarded when an instance is destroyed.
    #[must_use]
    pub const fn points(&self) -> i32 {
        self.points
    }
}

/// Master copy of an enemy kind, held by the atlas.
#[derive(Clone, Debug)]
pub struct EnemyTemplate {
    spec: Arc<EnemySpec>,
    sprite: Sprite,
    animator: PrecalculatedAnimator,
}

impl EnemyTemplate {
    /// Creates the master template from resolved references.
    #[must_use]
    pub fn new(spec: EnemySpec, sprite: Sprite, animator: PrecalculatedAnimator) -> Self {
        Self {
            spec: Arc::new(spec),
            sprite,
            animator,
        }
    }

    /// The shared spec.
    #[must_use]
    pub fn spec(&self) -> &EnemySpec {
        &self.spec
    }

    /// Builds an inactive instance; pools use this as their creator.
    #[must_use]
    pub fn instantiate(&self) -> Enemy {
        let width = self.sprite.sheet().frame_width();
        let half = width / 2;
        Enemy {
            spec: Arc::clone(&self.spec),
            sprite: self.sprite.clone(),
            animator: self.animator.clone(),
            body: Body {
                location: Location::ZERO,
                speed: self.spec.speed(),
            },
            tile_location: TileLocation::new(
                ColliderClass::Damageable,
                Point::new(-half, -half),
                Point::new(width, width),
            ),
            health: self.spec.health(),
            active: false,
        }
    }
}

/// A live, pooled enemy instance.
#[derive(Clone, Debug)]
pub struct Enemy {
    spec: Arc<EnemySpec>,
    sprite: Sprite,
    animator: PrecalculatedAnimator,
    body: Body,
    tile_location: TileLocation,
    health: i32,
    active: bool,
}

impl Enemy {
    /// The kind this instance was spawned from.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.spec.kind
    }

    /// The shared spec.
    #[must_use]
    pub fn spec(&self) -> &EnemySpec {
        &self.spec
    }

    /// Current pixel location.
    #[must_use]
    pub fn location(&self) -> Location {
        self.body.location
    }

    /// Remaining hit points.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Collider handle, once the enemy has been placed on the graph.
    #[must_use]
    pub fn collider(&self) -> Option<ColliderId> {
        self.tile_location.id()
    }

    /// Advances sprite playback and path travel by one tick, updating
    /// tile membership.
    pub fn process(&mut self, graph: &mut Graph) {
        self.sprite.process();
        self.animator.animate(&mut self.body);
        self.tile_location.move_to(graph, self.body.location.point());
    }

    /// Predicted location `ticks` simulation ticks ahead, scaled by this
    /// enemy's speed; `None` once it will have left the path.
    ///
    /// Never mutates the enemy; towers call this while aiming.
    #[must_use]
    pub fn predicted_location(&self, ticks: i32) -> Option<Location> {
        self.animator.location_offset(ticks * self.body.speed)
    }

    /// Applies damage, flooring health at zero.
    pub fn damage(&mut self, amount: i32) {
        self.health = (self.health - amount).max(0);
    }

    /// Reports whether damage has exhausted the enemy's health.
    #[must_use]
    pub const fn destroyed(&self) -> bool {
        self.health == 0
    }

    /// Reports whether the enemy has walked off the end of the path.
    #[must_use]
    pub fn arrived(&self) -> bool {
        self.animator.done()
    }

    /// Vacates every occupied tile; must run before the instance goes
    /// back to its pool.
    pub fn leave(&mut self, graph: &mut Graph) {
        self.tile_location.clear(graph);
    }

    /// Pushes the current frame's draw command.
    pub fn draw(&self, scene: &mut Scene) {
        self.sprite.draw(self.body.location, scene);
    }
}

impl PoolItem for Enemy {
    fn init(&mut self) {
        self.sprite.restart();
        self.animator.reset();
        self.health = self.spec.health();
        self.body.location = self
            .animator
            .location_at(0)
            .unwrap_or(Location::ZERO);
        self.active = true;
    }

    fn reset(&mut self) {
        self.sprite.restart();
        self.animator.reset();
        self.health = 0;
        self.active = false;
    }

    fn active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SpriteSheet;
    use pathguard_core::TILE_SIZE;
    use pathguard_system_animation::AnimatorAtlas;

    fn template(health: i32, speed: i32) -> (Graph, EnemyTemplate) {
        let graph = Graph::from_text("0,0\nS\nE\nS\n").expect("valid map");
        let mut atlas = AnimatorAtlas::with_tile_animators();
        let path = Kind::new("path");
        atlas
            .create_path_animator(path.clone(), &graph)
            .expect("tile animators registered");
        let animator = atlas.precalculated(&path).expect("path registered");
        let sprite = Sprite::new(SpriteSheet::new(Kind::new("crawler-sheet"), 2, 4, 32));
        let spec = EnemySpec::new(
            Kind::new("crawler"),
            Kind::new("crawler-sheet"),
            path,
            Kind::new("blood"),
            health,
            speed,
            5,
        );
        (graph, EnemyTemplate::new(spec, sprite, animator))
    }

    #[test]
    fn damage_floors_at_zero_and_destroys_on_the_fourth_hit() {
        let (_, template) = template(10, 1);
        let mut enemy = template.instantiate();
        enemy.init();
        for _ in 0..3 {
            enemy.damage(3);
            assert!(!enemy.destroyed());
        }
        enemy.damage(3);
        assert!(enemy.destroyed());
        assert_eq!(enemy.health(), 0);
    }

    #[test]
    fn process_walks_the_baked_path() {
        let (mut graph, template) = template(10, 1);
        let mut enemy = template.instantiate();
        enemy.init();

        enemy.process(&mut graph);
        assert_eq!(enemy.location().point(), Point::new(0, -TILE_SIZE + 1));
        assert!(enemy.collider().is_some());

        while !enemy.arrived() {
            enemy.process(&mut graph);
        }
        assert_eq!(enemy.location().point(), Point::new(TILE_SIZE, 2 * TILE_SIZE));
    }

    #[test]
    fn faster_instances_cover_the_path_in_fewer_ticks() {
        let (mut graph, _) = template(10, 1);
        let (_, slow_template) = template(10, 1);
        let (_, fast_template) = template(10, 4);

        let mut slow = slow_template.instantiate();
        let mut fast = fast_template.instantiate();
        slow.init();
        fast.init();

        let mut slow_ticks = 0;
        while !slow.arrived() {
            slow.process(&mut graph);
            slow_ticks += 1;
        }
        let mut fast_ticks = 0;
        while !fast.arrived() {
            fast.process(&mut graph);
            fast_ticks += 1;
        }
        assert!(fast_ticks < slow_ticks);
    }

    #[test]
    fn predicted_location_does_not_mutate_progress() {
        let (mut graph, template) = template(10, 1);
        let mut enemy = template.instantiate();
        enemy.init();
        enemy.process(&mut graph);

        let before = enemy.location();
        let ahead = enemy.predicted_location(10).expect("on the path");
        assert_ne!(ahead.point(), before.point());
        assert_eq!(enemy.location(), before);
        assert_eq!(enemy.predicted_location(1_000_000), None);
    }

    #[test]
    fn pooled_instances_restart_cleanly() {
        let (mut graph, template) = template(10, 1);
        let mut enemy = template.instantiate();
        enemy.init();
        for _ in 0..20 {
            enemy.process(&mut graph);
        }
        enemy.damage(10);
        enemy.leave(&mut graph);
        enemy.reset();
        assert!(!enemy.active());

        enemy.init();
        assert!(enemy.active());
        assert_eq!(enemy.health(), 10);
        assert!(!enemy.destroyed());
        assert!(!enemy.arrived());
    }
}
