//! Shooting towers.
//!
//! A placed tower caches the path tiles inside its reach, sorted so the
//! tiles closest to the board exit are scanned first, and consults each
//! tile's collider bucket instead of the whole enemy list. When its
//! cooldown elapses it runs the earliest-intercept search against every
//! candidate and hands the game a [`Shot`] to spawn a bullet from.

use std::sync::Arc;

use pathguard_core::{Kind, Location, Point, TickRange, Ticker, TILE_SIZE};
use pathguard_system_tower_targeting::earliest_intercept;
use pathguard_world::{ColliderClass, ColliderId, Graph, TileLocation};

use crate::asset::Asset;
use crate::enemy::Enemy;
use crate::projectile::ProjectileSpec;
use crate::scene::{DrawCommand, Scene};

/// Ticks the muzzle flash state stays raised after a shot.
const MUZZLE_TICKS: i32 = 10;

/// Immutable attributes shared by every placement of a tower kind.
#[derive(Clone, Debug)]
pub struct TowerSpec {
    kind: Kind,
    asset: Kind,
    range: TickRange,
    delay: i32,
    cost: i32,
    projectile: ProjectileSpec,
}

impl TowerSpec {
    /// Creates a tower spec.
    #[must_use]
    pub fn new(
        kind: Kind,
        asset: Kind,
        range: TickRange,
        delay: i32,
        cost: i32,
        projectile: ProjectileSpec,
    ) -> Self {
        Self {
            kind,
            asset,
            range,
            delay: delay.max(1),
            cost,
            projectile,
        }
    }

    /// The kind placements of this spec are registered under.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Kind of the asset placements draw with.
    #[must_use]
    pub fn asset(&self) -> &Kind {
        &self.asset
    }

    /// Inclusive intercept search window in ticks.
    #[must_use]
    pub const fn range(&self) -> TickRange {
        self.range
    }

    /// Cooldown ticks between shots.
    #[must_use]
    pub const fn delay(&self) -> i32 {
        self.delay
    }

    /// Credits one placement costs.
    #[must_use]
    pub const fn cost(&self) -> i32 {
        self.cost
    }

    /// Spec of the projectile this tower fires.
    #[must_use]
    pub fn projectile(&self) -> &ProjectileSpec {
        &self.projectile
    }

    /// Outer reach in pixels: the farthest intercept tick times the
    /// projectile speed.
    #[must_use]
    pub const fn reach(&self) -> i32 {
        self.range.max * self.projectile.speed()
    }
}

/// Master copy of a tower kind, held by the atlas.
#[derive(Clone, Debug)]
pub struct TowerTemplate {
    spec: Arc<TowerSpec>,
    asset: Asset,
}

impl TowerTemplate {
    /// Creates the master template from resolved references.
    #[must_use]
    pub fn new(spec: TowerSpec, asset: Asset) -> Self {
        Self {
            spec: Arc::new(spec),
            asset,
        }
    }

    /// The shared spec.
    #[must_use]
    pub fn spec(&self) -> &Arc<TowerSpec> {
        &self.spec
    }

    /// Places a copy of the template on a board tile.
    ///
    /// The placement caches every path tile within reach and starts with
    /// an elapsed cooldown, so the tower may fire on its very first tick.
    #[must_use]
    pub fn copy_at(&self, tile: Point, graph: &mut Graph) -> ShootingTower {
        let half = TILE_SIZE / 2;
        let centre = tile.scale(TILE_SIZE).add(Point::new(half, half));
        let nodes = graph.tiles_around(centre, self.spec.reach());
        let mut cooldown = Ticker::new(self.spec.delay);
        let _ = cooldown.tick_by(self.spec.delay);
        let mut tile_location = TileLocation::new(
            ColliderClass::Damager,
            Point::new(-half, -half),
            Point::new(TILE_SIZE - 1, TILE_SIZE - 1),
        );
        tile_location.move_to(graph, centre);
        ShootingTower {
            spec: Arc::clone(&self.spec),
            asset: self.asset.clone(),
            location: Location::new(tile.scale(TILE_SIZE), 0),
            centre,
            nodes,
            cooldown,
            muzzle: None,
            tile_location,
        }
    }
}

/// A feasible firing solution handed back to the game loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Shot {
    /// Collider handle of the enemy to hit.
    pub target: ColliderId,
    /// Ticks of projectile flight until impact.
    pub tick: i32,
    /// Predicted target location at impact.
    pub location: Location,
}

/// A tower placed on the board.
#[derive(Clone, Debug)]
pub struct ShootingTower {
    spec: Arc<TowerSpec>,
    asset: Asset,
    location: Location,
    centre: Point,
    nodes: Vec<Point>,
    cooldown: Ticker,
    muzzle: Option<Ticker>,
    tile_location: TileLocation,
}

impl ShootingTower {
    /// The shared spec.
    #[must_use]
    pub fn spec(&self) -> &TowerSpec {
        &self.spec
    }

    /// Pixel centre of the occupied tile; shots originate here.
    #[must_use]
    pub const fn centre(&self) -> Point {
        self.centre
    }

    /// Path tiles within reach, closest to the board exit first.
    #[must_use]
    pub fn covered_tiles(&self) -> &[Point] {
        &self.nodes
    }

    /// Reports whether the muzzle flash window is open.
    #[must_use]
    pub const fn firing(&self) -> bool {
        self.muzzle.is_some()
    }

    /// Advances cooldown and muzzle flash bookkeeping by one tick.
    pub fn process(&mut self) {
        if let Some(window) = &mut self.muzzle {
            if window.tick() {
                self.muzzle = None;
            }
        }
        let _ = self.cooldown.tick();
    }

    /// Attempts to find a firing solution against the enemies currently
    /// inside the covered tiles.
    ///
    /// Returns `None` while the cooldown is running or when no candidate
    /// is interceptable. On success the cooldown restarts, the muzzle
    /// window opens and the tower rotates to face the predicted impact
    /// point.
    pub fn try_fire(&mut self, graph: &Graph, enemies: &[Enemy]) -> Option<Shot> {
        if !self.cooldown.done() {
            return None;
        }
        let projectile = &self.spec.projectile;
        for tile in &self.nodes {
            let Some(node) = graph.node(*tile) else {
                continue;
            };
            for id in node.colliders(ColliderClass::Damageable) {
                let Some(enemy) = enemies
                    .iter()
                    .find(|enemy| enemy.collider() == Some(*id) && !enemy.destroyed())
                else {
                    continue;
                };
                let Some(intercept) = earliest_intercept(
                    self.centre,
                    self.spec.range,
                    projectile.speed(),
                    projectile.explosion_radius(),
                    enemy.location().point(),
                    |ticks| enemy.predicted_location(ticks),
                ) else {
                    continue;
                };
                self.cooldown.reset();
                self.muzzle = Some(Ticker::new(MUZZLE_TICKS));
                self.location = self.location.facing(intercept.location.point());
                return Some(Shot {
                    target: *id,
                    tick: intercept.tick,
                    location: intercept.location,
                });
            }
        }
        None
    }

    /// Removes the tower's collider from the graph.
    pub fn remove(&mut self, graph: &mut Graph) {
        self.tile_location.clear(graph);
    }

    /// Pushes the tower's draw command, plus its range circle when the
    /// debug overlay is requested.
    pub fn draw(&self, scene: &mut Scene, overlay: bool) {
        self.asset.draw(self.location, scene);
        if overlay {
            scene.push(DrawCommand::RangeCircle {
                centre: self.centre,
                radius: self.spec.reach(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Sprite, SpriteSheet, StaticAsset};
    use crate::enemy::{EnemySpec, EnemyTemplate};
    use pathguard_system_animation::AnimatorAtlas;
    use pathguard_system_pooling::PoolItem;

    fn world() -> (Graph, EnemyTemplate) {
        let graph = Graph::from_text("0,0\nS\nS\nS\n").expect("valid map");
        let mut atlas = AnimatorAtlas::with_tile_animators();
        let path = Kind::new("path");
        atlas
            .create_path_animator(path.clone(), &graph)
            .expect("tile animators registered");
        let animator = atlas.precalculated(&path).expect("path registered");
        let sprite = Sprite::new(SpriteSheet::new(Kind::new("crawler-sheet"), 1, 1, 32));
        let spec = EnemySpec::new(
            Kind::new("crawler"),
            Kind::new("crawler-sheet"),
            path,
            Kind::new("blood"),
            10,
            1,
            5,
        );
        (graph, EnemyTemplate::new(spec, sprite, animator))
    }

    fn template() -> TowerTemplate {
        let projectile = ProjectileSpec::new(
            Kind::new("bolt"),
            Kind::new("bolt-sheet"),
            Kind::new("boom"),
            2,
            6,
            3,
            1,
        );
        let spec = TowerSpec::new(
            Kind::new("sentry"),
            Kind::new("sentry-sheet"),
            TickRange::new(1, 40),
            25,
            50,
            projectile,
        );
        TowerTemplate::new(spec, Asset::Static(StaticAsset::new(Kind::new("sentry"))))
    }

    #[test]
    fn placement_caches_reachable_path_tiles() {
        let (mut graph, _) = world();
        let tower = template().copy_at(Point::new(1, 1), &mut graph);
        assert!(!tower.covered_tiles().is_empty());
        let distances: Vec<i32> = tower
            .covered_tiles()
            .iter()
            .map(|tile| graph.node(*tile).expect("path node").distance_to_end())
            .collect();
        let mut sorted = distances.clone();
        sorted.sort_unstable();
        assert_eq!(distances, sorted);
    }

    #[test]
    fn fresh_placement_fires_without_waiting_for_cooldown() {
        let (mut graph, enemies) = world();
        let mut enemy = enemies.instantiate();
        enemy.init();
        // Walk the enemy onto the board so it registers on path tiles.
        for _ in 0..80 {
            enemy.process(&mut graph);
        }
        let enemies = vec![enemy];

        let mut tower = template().copy_at(Point::new(1, 1), &mut graph);
        let shot = tower.try_fire(&graph, &enemies).expect("interceptable");
        assert!(shot.tick >= 1);
        assert!(tower.firing());

        // Cooldown restarted: the very next tick may not fire again.
        assert_eq!(tower.try_fire(&graph, &enemies), None);
    }

    #[test]
    fn cooldown_reopens_after_its_delay() {
        let (mut graph, enemies) = world();
        let mut enemy = enemies.instantiate();
        enemy.init();
        for _ in 0..80 {
            enemy.process(&mut graph);
        }
        let enemies = vec![enemy];

        let mut tower = template().copy_at(Point::new(1, 1), &mut graph);
        let _ = tower.try_fire(&graph, &enemies).expect("interceptable");
        for _ in 0..24 {
            tower.process();
            assert_eq!(tower.try_fire(&graph, &enemies), None);
        }
        tower.process();
        assert!(tower.try_fire(&graph, &enemies).is_some());
    }

    #[test]
    fn muzzle_window_closes_on_its_own() {
        let (mut graph, enemies) = world();
        let mut enemy = enemies.instantiate();
        enemy.init();
        for _ in 0..80 {
            enemy.process(&mut graph);
        }
        let enemies = vec![enemy];

        let mut tower = template().copy_at(Point::new(1, 1), &mut graph);
        let _ = tower.try_fire(&graph, &enemies).expect("interceptable");
        assert!(tower.firing());
        for _ in 0..MUZZLE_TICKS {
            tower.process();
        }
        assert!(!tower.firing());
    }
}
