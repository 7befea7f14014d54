//! The assembled game: pools, live entity lists and the tick loop.
//!
//! One [`Game::update`] call advances everything a single tick in a
//! fixed layer order: wave spawner, towers, projectiles, enemies,
//! effects. Drawing is a separate read-only pass that runs strictly
//! after processing, so an entity destroyed this tick is never drawn
//! this tick. A projectile spawned by a tower this tick first flies on
//! the following tick.

use std::collections::HashMap;

use log::warn;
use pathguard_core::{Kind, Location, Point, TileKind, Ticker, TILE_SIZE};
use pathguard_system_pooling::Pool;
use pathguard_system_spawning::{Round, WaveSpawner};
use pathguard_world::Graph;
use thiserror::Error;

use crate::asset::{Asset, AssetAtlas};
use crate::declaration::Declarations;
use crate::effect::SpriteEffect;
use crate::enemy::{Enemy, EnemyTemplate};
use crate::projectile::Bullet;
use crate::scene::{DrawCommand, DrawOptions, Scene};
use crate::tower::{ShootingTower, Shot, TowerTemplate};

/// Instances each enemy pool is pre-filled with.
const ENEMY_POOL_SIZE: usize = 8;
/// Instances each effect pool is pre-filled with.
const EFFECT_POOL_SIZE: usize = 4;

/// Errors produced by game assembly and tower placement.
#[derive(Debug, Error)]
pub enum GameError {
    /// The requested graph was never declared.
    #[error("no graph declared under {kind}")]
    UnknownGraph {
        /// The missing graph kind.
        kind: Kind,
    },
    /// The requested tower kind was never declared.
    #[error("no tower declared under {kind}")]
    UnknownTower {
        /// The missing tower kind.
        kind: Kind,
    },
    /// The requested enemy kind was never declared.
    #[error("no enemy declared under {kind}")]
    UnknownEnemy {
        /// The missing enemy kind.
        kind: Kind,
    },
    /// Placing the tower would overdraw the player's credits.
    #[error("tower {kind} costs {cost} but only {credits} credits remain")]
    InsufficientCredits {
        /// Tower kind that was requested.
        kind: Kind,
        /// Its placement cost.
        cost: i32,
        /// Credits available.
        credits: i32,
    },
    /// The placement tile lies outside the board.
    #[error("tile {tile} is outside the board")]
    PlacementOffBoard {
        /// The rejected tile.
        tile: Point,
    },
    /// The placement tile is part of the path.
    #[error("tile {tile} is on the path")]
    PlacementOnPath {
        /// The rejected tile.
        tile: Point,
    },
}

/// A running Pathguard simulation.
#[derive(Debug)]
pub struct Game {
    graph: Graph,
    assets: AssetAtlas,
    enemy_templates: HashMap<Kind, EnemyTemplate>,
    tower_templates: HashMap<Kind, TowerTemplate>,
    enemy_pools: HashMap<Kind, Pool<Enemy>>,
    bullet_pools: HashMap<Kind, Pool<Bullet>>,
    effect_pools: HashMap<Kind, Pool<SpriteEffect>>,
    enemies: Vec<Enemy>,
    towers: Vec<ShootingTower>,
    bullets: Vec<Bullet>,
    effects: Vec<SpriteEffect>,
    spawner: WaveSpawner<Kind>,
    clock: Ticker,
    score: i32,
    lives: i32,
    credits: i32,
}

impl Game {
    /// Assembles a game around one of the declared graphs.
    ///
    /// Enemy, bullet and effect pools are pre-built per declared kind;
    /// they grow on demand afterwards.
    pub fn new(
        mut declarations: Declarations,
        graph: &Kind,
        lives: i32,
        credits: i32,
    ) -> Result<Self, GameError> {
        let board = declarations
            .take_graph(graph)
            .ok_or_else(|| GameError::UnknownGraph { kind: graph.clone() })?;
        let assets = declarations.assets().clone();

        let enemy_templates = declarations.enemies().clone();
        let tower_templates = declarations.towers().clone();

        let mut enemy_pools = HashMap::new();
        let mut effect_pools = HashMap::new();
        for (kind, template) in &enemy_templates {
            let creator = template.clone();
            let _ = enemy_pools.insert(
                kind.clone(),
                Pool::new(ENEMY_POOL_SIZE, move || creator.instantiate()),
            );
            register_effect_pool(&mut effect_pools, &assets, template.spec().effect());
        }

        let mut bullet_pools = HashMap::new();
        for (kind, template) in &tower_templates {
            let projectile = template.spec().projectile().clone();
            let asset = assets
                .asset(projectile.asset())
                .unwrap_or_else(|| assets.blank());
            let master = Bullet::new(std::sync::Arc::new(projectile.clone()), asset);
            let _ = bullet_pools.insert(
                kind.clone(),
                Pool::new(projectile.pool_size(), move || master.clone()),
            );
            register_effect_pool(&mut effect_pools, &assets, projectile.effect());
        }

        Ok(Self {
            graph: board,
            assets,
            enemy_templates,
            tower_templates,
            enemy_pools,
            bullet_pools,
            effect_pools,
            enemies: Vec::new(),
            towers: Vec::new(),
            bullets: Vec::new(),
            effects: Vec::new(),
            spawner: WaveSpawner::default(),
            clock: Ticker::new(-1),
            score: 0,
            lives,
            credits,
        })
    }

    /// Queues rounds of enemy kinds and starts releasing them.
    pub fn start_wave(&mut self, rounds: impl IntoIterator<Item = Round<Kind>>) -> Result<(), GameError> {
        for round in rounds {
            for kind in round.pending() {
                if !self.enemy_templates.contains_key(kind) {
                    return Err(GameError::UnknownEnemy { kind: kind.clone() });
                }
            }
            self.spawner.push_round(round);
        }
        self.spawner.start();
        Ok(())
    }

    /// Places a tower of the declared kind on a free board tile,
    /// deducting its cost.
    pub fn place_tower(&mut self, kind: &Kind, tile: Point) -> Result<(), GameError> {
        let template: &TowerTemplate = self
            .tower_templates
            .get(kind)
            .ok_or_else(|| GameError::UnknownTower { kind: kind.clone() })?;
        let node = self
            .graph
            .node(tile)
            .ok_or(GameError::PlacementOffBoard { tile })?;
        if node.tile() != TileKind::Blank {
            return Err(GameError::PlacementOnPath { tile });
        }
        let cost = template.spec().cost();
        if cost > self.credits {
            return Err(GameError::InsufficientCredits {
                kind: kind.clone(),
                cost,
                credits: self.credits,
            });
        }
        self.credits -= cost;
        let placement = template.copy_at(tile, &mut self.graph);
        self.towers.push(placement);
        Ok(())
    }

    /// Advances the whole simulation by one tick.
    pub fn update(&mut self) {
        if self.game_over() {
            return;
        }
        let _ = self.clock.tick();

        self.spawner.process();
        if let Some(kind) = self.spawner.spawn() {
            self.spawn_enemy(&kind);
        }

        let mut fired: Vec<(Kind, Point, Shot)> = Vec::new();
        for index in 0..self.towers.len() {
            self.towers[index].process();
            if let Some(shot) = self.towers[index].try_fire(&self.graph, &self.enemies) {
                let tower = &self.towers[index];
                fired.push((tower.spec().kind().clone(), tower.centre(), shot));
            }
        }

        let mut index = 0;
        while index < self.bullets.len() {
            self.bullets[index].process();
            if self.bullets[index].arrived() {
                let bullet = self.bullets.remove(index);
                self.resolve_impact(bullet);
            } else {
                index += 1;
            }
        }
        for (kind, centre, shot) in fired {
            self.spawn_bullet(&kind, centre, shot);
        }

        let mut index = 0;
        while index < self.enemies.len() {
            self.enemies[index].process(&mut self.graph);
            if self.enemies[index].destroyed() {
                let mut enemy = self.enemies.remove(index);
                enemy.leave(&mut self.graph);
                self.score += enemy.spec().points();
                self.credits += enemy.spec().points();
                let effect = enemy.spec().effect().clone();
                let location = enemy.location();
                self.spawn_effect(&effect, location);
                self.release_enemy(enemy);
            } else if self.enemies[index].arrived() {
                let mut enemy = self.enemies.remove(index);
                enemy.leave(&mut self.graph);
                self.lives -= 1;
                self.release_enemy(enemy);
            } else {
                index += 1;
            }
        }

        let mut index = 0;
        while index < self.effects.len() {
            self.effects[index].process();
            if self.effects[index].done() {
                let effect = self.effects.remove(index);
                self.release_effect(effect);
            } else {
                index += 1;
            }
        }
    }

    /// Emits the frame's draw commands in back-to-front layer order:
    /// map, enemies (newest first), projectiles, towers, effects.
    pub fn draw(&self, scene: &mut Scene, options: DrawOptions) {
        for y in 0..self.graph.height() {
            for x in 0..self.graph.width() {
                let tile = Point::new(x, y);
                let Some(node) = self.graph.node(tile) else {
                    continue;
                };
                let location = Location::new(tile.scale(TILE_SIZE), 0);
                match self.assets.asset(&node.tile().kind()) {
                    Some(asset) => asset.draw(location, scene),
                    None => scene.push(DrawCommand::Sprite {
                        sheet: node.tile().kind(),
                        frame: 0,
                        location,
                    }),
                }
            }
        }
        if options.grid {
            scene.push(DrawCommand::GridOverlay {
                width: self.graph.width(),
                height: self.graph.height(),
            });
        }
        for enemy in self.enemies.iter().rev() {
            enemy.draw(scene);
        }
        for bullet in &self.bullets {
            bullet.draw(scene);
        }
        for tower in &self.towers {
            tower.draw(scene, options.grid);
        }
        for effect in &self.effects {
            effect.draw(scene);
        }
    }

    /// Ticks elapsed since the game started.
    #[must_use]
    pub const fn ticks(&self) -> i32 {
        self.clock.ticks()
    }

    /// Points scored so far.
    #[must_use]
    pub const fn score(&self) -> i32 {
        self.score
    }

    /// Lives remaining; an escaped enemy costs one.
    #[must_use]
    pub const fn lives(&self) -> i32 {
        self.lives
    }

    /// Credits available for tower placement.
    #[must_use]
    pub const fn credits(&self) -> i32 {
        self.credits
    }

    /// Reports whether the player has run out of lives.
    #[must_use]
    pub const fn game_over(&self) -> bool {
        self.lives <= 0
    }

    /// Enemies currently on the board.
    #[must_use]
    pub fn live_enemies(&self) -> usize {
        self.enemies.len()
    }

    /// Bullets currently in flight.
    #[must_use]
    pub fn live_bullets(&self) -> usize {
        self.bullets.len()
    }

    /// Towers currently placed.
    #[must_use]
    pub fn tower_count(&self) -> usize {
        self.towers.len()
    }

    /// Reports whether the wave is fully spawned and cleared.
    #[must_use]
    pub fn wave_cleared(&self) -> bool {
        self.spawner.done() && self.enemies.is_empty() && self.bullets.is_empty()
    }

    fn spawn_enemy(&mut self, kind: &Kind) {
        let Some(pool) = self.enemy_pools.get_mut(kind) else {
            warn!("no enemy pool for {kind}; dropping spawn");
            return;
        };
        let enemy = pool.acquire();
        self.enemies.push(enemy);
    }

    fn spawn_bullet(&mut self, tower_kind: &Kind, centre: Point, shot: Shot) {
        let Some(pool) = self.bullet_pools.get_mut(tower_kind) else {
            warn!("no bullet pool for {tower_kind}; dropping shot");
            return;
        };
        let mut bullet = pool.acquire();
        let flight = pathguard_system_animation::PrecalculatedAnimator::from_line(
            tower_kind.clone(),
            centre,
            shot.location.point(),
            shot.tick,
        );
        bullet.update_target(shot.target, flight);
        self.bullets.push(bullet);
    }

    fn resolve_impact(&mut self, bullet: Bullet) {
        if let Some(target) = bullet.target() {
            if let Some(enemy) = self
                .enemies
                .iter_mut()
                .find(|enemy| enemy.collider() == Some(target))
            {
                enemy.damage(bullet.spec().damage());
            }
            let effect = bullet.spec().effect().clone();
            let location = bullet.location();
            self.spawn_effect(&effect, location);
        }
        let kind = bullet.spec().kind().clone();
        if let Some(pool) = self.bullet_pools.get_mut(&kind) {
            pool.release(bullet);
        }
    }

    fn spawn_effect(&mut self, kind: &Kind, location: Location) {
        let Some(pool) = self.effect_pools.get_mut(kind) else {
            warn!("no effect pool for {kind}; dropping effect");
            return;
        };
        let mut effect = pool.acquire();
        effect.move_to(location);
        self.effects.push(effect);
    }

    fn release_enemy(&mut self, enemy: Enemy) {
        let kind = enemy.kind().clone();
        if let Some(pool) = self.enemy_pools.get_mut(&kind) {
            pool.release(enemy);
        }
    }

    fn release_effect(&mut self, effect: SpriteEffect) {
        let kind = effect.kind().clone();
        if let Some(pool) = self.effect_pools.get_mut(&kind) {
            pool.release(effect);
        }
    }
}

fn register_effect_pool(
    pools: &mut HashMap<Kind, Pool<SpriteEffect>>,
    assets: &AssetAtlas,
    kind: &Kind,
) {
    if pools.contains_key(kind) {
        return;
    }
    let Some(Asset::Sprite(sprite)) = assets.asset(kind) else {
        warn!("effect {kind} has no sprite asset; skipping pool");
        return;
    };
    let master = SpriteEffect::new(kind.clone(), sprite);
    let _ = pools.insert(
        kind.clone(),
        Pool::new(EFFECT_POOL_SIZE, move || master.clone()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_rules_reject_bad_tiles() {
        let declarations = crate::declaration::Declarations::from_sources(
            &test_sources(),
            None,
        )
        .expect("valid declarations");
        let mut game = Game::new(declarations, &Kind::new("map"), 3, 200).expect("graph declared");

        let err = game
            .place_tower(&Kind::new("sentry"), Point::new(0, 0))
            .expect_err("path tile");
        assert!(matches!(err, GameError::PlacementOnPath { .. }));

        let err = game
            .place_tower(&Kind::new("sentry"), Point::new(9, 9))
            .expect_err("off board");
        assert!(matches!(err, GameError::PlacementOffBoard { .. }));

        game.place_tower(&Kind::new("sentry"), Point::new(1, 0))
            .expect("legal placement");
        assert_eq!(game.credits(), 150);

        let err = game
            .place_tower(&Kind::new("watcher"), Point::new(1, 0))
            .expect_err("unknown tower");
        assert!(matches!(err, GameError::UnknownTower { .. }));
    }

    #[test]
    fn credits_gate_tower_placement() {
        let declarations = crate::declaration::Declarations::from_sources(
            &test_sources(),
            None,
        )
        .expect("valid declarations");
        let mut game = Game::new(declarations, &Kind::new("map"), 3, 40).expect("graph declared");
        let err = game
            .place_tower(&Kind::new("sentry"), Point::new(1, 0))
            .expect_err("too expensive");
        assert!(matches!(err, GameError::InsufficientCredits { .. }));
        assert_eq!(game.tower_count(), 0);
        assert_eq!(game.credits(), 40);
    }

    fn test_sources() -> Vec<(String, String)> {
        fn record(label: &str, text: &str) -> (String, String) {
            (label.to_owned(), text.to_owned())
        }
        vec![
            record(
                "map.toml",
                r#"
type = "graph"
variety = "cached"
name = "map"

[attributes]
text = "0,0\nS\nE\nS"
"#,
            ),
            record(
                "path.toml",
                r#"
type = "animator"
variety = "path"
name = "path"
"#,
            ),
            record(
                "crawler-sheet.toml",
                r#"
type = "asset"
variety = "sprite"
name = "crawler-sheet"

[attributes]
frames = 2
delay = 4
width = 32
"#,
            ),
            record(
                "blood.toml",
                r#"
type = "asset"
variety = "sprite"
name = "blood"

[attributes]
frames = 3
delay = 2
width = 32
"#,
            ),
            record(
                "boom.toml",
                r#"
type = "asset"
variety = "sprite"
name = "boom"

[attributes]
frames = 3
delay = 2
width = 32
"#,
            ),
            record(
                "sentry-sheet.toml",
                r#"
type = "asset"
variety = "static"
name = "sentry-sheet"
"#,
            ),
            record(
                "bolt-sheet.toml",
                r#"
type = "asset"
variety = "static"
name = "bolt-sheet"
"#,
            ),
            record(
                "crawler.toml",
                r#"
type = "enemy"
variety = "basic"
name = "crawler"

[attributes]
asset = "crawler-sheet"
animation = "path"
effect = "blood"
health = 10
speed = 1
points = 5
"#,
            ),
            record(
                "sentry.toml",
                r#"
type = "tower"
variety = "shooting"
name = "sentry"

[attributes]
asset = "sentry-sheet"
range_min = 1
range_max = 40
delay = 25
cost = 50

[attributes.projectile]
asset = "bolt-sheet"
effect = "boom"
pool_size = 2
speed = 6
damage = 3
explosion_radius = 1
"#,
            ),
        ]
    }
}
