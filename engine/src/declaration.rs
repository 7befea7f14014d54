//! Declaration records and the three-phase atlas loader.
//!
//! A declaration is one TOML document with a `type`/`variety`/`name`
//! header and a free-form `[attributes]` table. Loading runs in three
//! phases: every record is **matched** to a typed spec and a load
//! priority, the animator registry is **pre-loaded** with the tile
//! animators the path bake depends on, and finally the specs are
//! **loaded** in ascending priority order so producers (assets, graph)
//! are registered before the enemies and towers that reference them.
//! Any unknown type, unknown variety or unresolved reference aborts the
//! whole load.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use pathguard_core::{Kind, TickRange};
use pathguard_system_animation::{Animator, AnimatorAtlas, PrecalculatedAnimator};
use pathguard_world::{Graph, GraphError};
use serde::Deserialize;
use thiserror::Error;

use crate::asset::{Asset, AssetAtlas, Sprite, SpriteSheet, StaticAsset};
use crate::enemy::{EnemySpec, EnemyTemplate};
use crate::projectile::ProjectileSpec;
use crate::tower::{TowerSpec, TowerTemplate};

/// Load priorities; producers before consumers.
const PRIORITY_ASSET: i32 = 0;
const PRIORITY_GRAPH: i32 = 2;
const PRIORITY_ANIMATOR: i32 = 3;
const PRIORITY_ENTITY: i32 = 5;

/// Errors produced while loading a declaration directory.
///
/// All of them are fatal: the simulation only runs against a fully
/// loaded configuration.
#[derive(Debug, Error)]
pub enum DeclarationError {
    /// A declaration or map file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A declaration file was not valid TOML or missing header fields.
    #[error("failed to parse declaration {label}")]
    Parse {
        /// File the record came from.
        label: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// The record's `type` is not one the loader knows.
    #[error("{label}: unknown declaration type {declared:?}")]
    UnknownType {
        /// File the record came from.
        label: String,
        /// The rejected type tag.
        declared: String,
    },
    /// The record's `variety` is not one its type recognises.
    #[error("{label}: unknown {declared} variety {variety:?}")]
    UnknownVariety {
        /// File the record came from.
        label: String,
        /// The record's type tag.
        declared: String,
        /// The rejected variety tag.
        variety: String,
    },
    /// A record referenced a kind no earlier record registered.
    #[error("{name}: unresolved {field} reference {key}")]
    UnresolvedReference {
        /// Name of the referencing record.
        name: Kind,
        /// Attribute holding the reference.
        field: &'static str,
        /// The key that resolved to nothing.
        key: Kind,
    },
    /// An attribute value fails validation.
    #[error("{name}: {message}")]
    InvalidValue {
        /// Name of the offending record.
        name: Kind,
        /// What is wrong with it.
        message: String,
    },
    /// A graph declaration's map failed to build.
    #[error("graph {name} failed to build")]
    Graph {
        /// Name of the graph record.
        name: Kind,
        /// Underlying map error.
        #[source]
        source: GraphError,
    },
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "type")]
    declared: String,
    variety: String,
    name: String,
    #[serde(default)]
    attributes: toml::Table,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StaticAttrs {
    sheet: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SpriteAttrs {
    sheet: Option<String>,
    frames: i32,
    delay: i32,
    width: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GraphAttrs {
    map: Option<String>,
    text: Option<String>,
}

fn default_graph() -> String {
    "map".to_owned()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnimatorAttrs {
    #[serde(default = "default_graph")]
    graph: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnemyAttrs {
    asset: String,
    animation: String,
    effect: String,
    health: i32,
    speed: i32,
    points: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProjectileAttrs {
    asset: String,
    effect: String,
    pool_size: usize,
    speed: i32,
    damage: i32,
    explosion_radius: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TowerAttrs {
    asset: String,
    range_min: i32,
    range_max: i32,
    delay: i32,
    cost: i32,
    projectile: ProjectileAttrs,
}

/// A matched record: typed attributes plus its load priority.
#[derive(Debug)]
enum DeclSpec {
    StaticAsset { name: Kind, attrs: StaticAttrs },
    SpriteAsset { name: Kind, attrs: SpriteAttrs },
    Graph { name: Kind, attrs: GraphAttrs },
    PathAnimator { name: Kind, attrs: AnimatorAttrs },
    Enemy { name: Kind, attrs: EnemyAttrs },
    Tower { name: Kind, attrs: TowerAttrs },
}

impl DeclSpec {
    const fn priority(&self) -> i32 {
        match self {
            Self::StaticAsset { .. } | Self::SpriteAsset { .. } => PRIORITY_ASSET,
            Self::Graph { .. } => PRIORITY_GRAPH,
            Self::PathAnimator { .. } => PRIORITY_ANIMATOR,
            Self::Enemy { .. } | Self::Tower { .. } => PRIORITY_ENTITY,
        }
    }
}

/// Every atlas produced by a successful declaration load.
#[derive(Debug)]
pub struct Declarations {
    assets: AssetAtlas,
    graphs: HashMap<Kind, Graph>,
    animators: AnimatorAtlas,
    enemies: HashMap<Kind, EnemyTemplate>,
    towers: HashMap<Kind, TowerTemplate>,
}

impl Declarations {
    /// Loads every `.toml` declaration in a directory.
    ///
    /// Files are visited in name order; load order is decided by record
    /// priority, never by discovery order. Graph map files are resolved
    /// relative to the directory.
    pub fn load_dir(dir: &Path) -> Result<Self, DeclarationError> {
        let entries = fs::read_dir(dir).map_err(|source| DeclarationError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let mut paths: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            let text = fs::read_to_string(&path).map_err(|source| DeclarationError::Io {
                path: path.clone(),
                source,
            })?;
            let label = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            sources.push((label, text));
        }
        Self::from_sources(&sources, Some(dir))
    }

    /// Loads declarations from in-memory `(label, text)` records.
    ///
    /// `base` anchors relative map file paths; inline graph text needs
    /// no base.
    pub fn from_sources(
        sources: &[(String, String)],
        base: Option<&Path>,
    ) -> Result<Self, DeclarationError> {
        let mut specs = Vec::with_capacity(sources.len());
        for (label, text) in sources {
            let record: RawRecord =
                toml::from_str(text).map_err(|source| DeclarationError::Parse {
                    label: label.clone(),
                    source,
                })?;
            info!(
                "matched declaration {}/{} {:?} from {label}",
                record.declared, record.variety, record.name
            );
            specs.push(match_record(label, record)?);
        }
        specs.sort_by_key(DeclSpec::priority);

        let mut declarations = Self {
            assets: AssetAtlas::new(),
            graphs: HashMap::new(),
            animators: AnimatorAtlas::with_tile_animators(),
            enemies: HashMap::new(),
            towers: HashMap::new(),
        };
        for spec in specs {
            declarations.load(spec, base)?;
        }
        Ok(declarations)
    }

    fn load(&mut self, spec: DeclSpec, base: Option<&Path>) -> Result<(), DeclarationError> {
        match spec {
            DeclSpec::StaticAsset { name, attrs } => {
                let sheet = attrs.sheet.map_or_else(|| name.clone(), Kind::new);
                debug!("registering static asset {name}");
                self.assets
                    .register(name, Asset::Static(StaticAsset::new(sheet)));
            }
            DeclSpec::SpriteAsset { name, attrs } => {
                let sheet = attrs.sheet.map_or_else(|| name.clone(), Kind::new);
                let metadata = SpriteSheet::new(sheet, attrs.frames, attrs.delay, attrs.width);
                debug!("registering sprite asset {name}");
                self.assets
                    .register(name, Asset::Sprite(Sprite::new(metadata)));
            }
            DeclSpec::Graph { name, attrs } => {
                let graph = self.build_graph(&name, attrs, base)?;
                debug!(
                    "registering graph {name} ({}x{} tiles)",
                    graph.width(),
                    graph.height()
                );
                let _ = self.graphs.insert(name, graph);
            }
            DeclSpec::PathAnimator { name, attrs } => {
                let graph_kind = Kind::new(attrs.graph);
                let graph = self.graphs.get(&graph_kind).ok_or_else(|| {
                    DeclarationError::UnresolvedReference {
                        name: name.clone(),
                        field: "graph",
                        key: graph_kind.clone(),
                    }
                })?;
                debug!("baking path animator {name} from graph {graph_kind}");
                self.animators
                    .create_path_animator(name.clone(), graph)
                    .ok_or_else(|| DeclarationError::InvalidValue {
                        name,
                        message: "tile animator registry is incomplete".to_owned(),
                    })?;
            }
            DeclSpec::Enemy { name, attrs } => {
                let sprite = self.resolve_sprite(&name, "asset", &attrs.asset)?;
                let _ = self.resolve_sprite(&name, "effect", &attrs.effect)?;
                let animator = self.resolve_path_animator(&name, &attrs.animation)?;
                let spec = EnemySpec::new(
                    name.clone(),
                    Kind::new(attrs.asset),
                    Kind::new(attrs.animation),
                    Kind::new(attrs.effect),
                    attrs.health,
                    attrs.speed,
                    attrs.points,
                );
                debug!("registering enemy {name}");
                let _ = self
                    .enemies
                    .insert(name, EnemyTemplate::new(spec, sprite, animator));
            }
            DeclSpec::Tower { name, attrs } => {
                let template = self.build_tower(&name, attrs)?;
                debug!("registering tower {name}");
                let _ = self.towers.insert(name, template);
            }
        }
        Ok(())
    }

    fn build_graph(
        &self,
        name: &Kind,
        attrs: GraphAttrs,
        base: Option<&Path>,
    ) -> Result<Graph, DeclarationError> {
        let text = match (attrs.text, attrs.map) {
            (Some(text), _) => text,
            (None, Some(map)) => {
                let path = base.map_or_else(|| PathBuf::from(&map), |dir| dir.join(&map));
                fs::read_to_string(&path)
                    .map_err(|source| DeclarationError::Io { path, source })?
            }
            (None, None) => {
                return Err(DeclarationError::InvalidValue {
                    name: name.clone(),
                    message: "graph needs either a map file or inline text".to_owned(),
                })
            }
        };
        Graph::from_text(&text).map_err(|source| DeclarationError::Graph {
            name: name.clone(),
            source,
        })
    }

    fn build_tower(&self, name: &Kind, attrs: TowerAttrs) -> Result<TowerTemplate, DeclarationError> {
        if attrs.projectile.explosion_radius < 1 {
            return Err(DeclarationError::InvalidValue {
                name: name.clone(),
                message: format!(
                    "projectile explosion radius must be at least 1, got {}",
                    attrs.projectile.explosion_radius
                ),
            });
        }
        if attrs.range_min > attrs.range_max || attrs.range_min < 0 {
            return Err(DeclarationError::InvalidValue {
                name: name.clone(),
                message: format!(
                    "range {}..{} is not a valid tick window",
                    attrs.range_min, attrs.range_max
                ),
            });
        }
        let asset = self.resolve_asset(name, "asset", &attrs.asset)?;
        let _ = self.resolve_asset(name, "projectile asset", &attrs.projectile.asset)?;
        let _ = self.resolve_sprite(name, "projectile effect", &attrs.projectile.effect)?;

        let projectile = ProjectileSpec::new(
            name.clone(),
            Kind::new(attrs.projectile.asset),
            Kind::new(attrs.projectile.effect),
            attrs.projectile.pool_size,
            attrs.projectile.speed,
            attrs.projectile.damage,
            attrs.projectile.explosion_radius,
        );
        let spec = TowerSpec::new(
            name.clone(),
            Kind::new(attrs.asset),
            TickRange::new(attrs.range_min, attrs.range_max),
            attrs.delay,
            attrs.cost,
            projectile,
        );
        Ok(TowerTemplate::new(spec, asset))
    }

    fn resolve_asset(
        &self,
        name: &Kind,
        field: &'static str,
        key: &str,
    ) -> Result<Asset, DeclarationError> {
        let key = Kind::new(key);
        self.assets
            .asset(&key)
            .ok_or(DeclarationError::UnresolvedReference {
                name: name.clone(),
                field,
                key,
            })
    }

    fn resolve_sprite(
        &self,
        name: &Kind,
        field: &'static str,
        key: &str,
    ) -> Result<Sprite, DeclarationError> {
        match self.resolve_asset(name, field, key)? {
            Asset::Sprite(sprite) => Ok(sprite),
            Asset::Static(_) => Err(DeclarationError::InvalidValue {
                name: name.clone(),
                message: format!("{field} {key:?} must be a sprite asset"),
            }),
        }
    }

    fn resolve_path_animator(
        &self,
        name: &Kind,
        key: &str,
    ) -> Result<PrecalculatedAnimator, DeclarationError> {
        let key = Kind::new(key);
        match self.animators.animator(&key) {
            Some(Animator::Precalculated(animator)) => Ok(animator),
            Some(_) => Err(DeclarationError::InvalidValue {
                name: name.clone(),
                message: format!("animation {key} is not a precalculated animator"),
            }),
            None => Err(DeclarationError::UnresolvedReference {
                name: name.clone(),
                field: "animation",
                key,
            }),
        }
    }

    /// The loaded asset atlas.
    #[must_use]
    pub fn assets(&self) -> &AssetAtlas {
        &self.assets
    }

    /// The loaded animator atlas.
    #[must_use]
    pub fn animators(&self) -> &AnimatorAtlas {
        &self.animators
    }

    /// Borrows a loaded graph.
    #[must_use]
    pub fn graph(&self, kind: &Kind) -> Option<&Graph> {
        self.graphs.get(kind)
    }

    /// Removes a loaded graph, handing ownership to the caller.
    ///
    /// The game takes its board this way so it can mutate collider
    /// bookkeeping without holding the declarations mutable.
    pub fn take_graph(&mut self, kind: &Kind) -> Option<Graph> {
        self.graphs.remove(kind)
    }

    /// Borrows a loaded enemy template.
    #[must_use]
    pub fn enemy(&self, kind: &Kind) -> Option<&EnemyTemplate> {
        self.enemies.get(kind)
    }

    /// Every loaded enemy template.
    #[must_use]
    pub fn enemies(&self) -> &HashMap<Kind, EnemyTemplate> {
        &self.enemies
    }

    /// Borrows a loaded tower template.
    #[must_use]
    pub fn tower(&self, kind: &Kind) -> Option<&TowerTemplate> {
        self.towers.get(kind)
    }

    /// Every loaded tower template.
    #[must_use]
    pub fn towers(&self) -> &HashMap<Kind, TowerTemplate> {
        &self.towers
    }
}

fn match_record(label: &str, record: RawRecord) -> Result<DeclSpec, DeclarationError> {
    let name = Kind::new(record.name);
    let attributes = toml::Value::Table(record.attributes);
    let parse = |source| DeclarationError::Parse {
        label: label.to_owned(),
        source,
    };
    match (record.declared.as_str(), record.variety.as_str()) {
        ("asset", "static") => Ok(DeclSpec::StaticAsset {
            name,
            attrs: attributes.try_into().map_err(parse)?,
        }),
        ("asset", "sprite") => Ok(DeclSpec::SpriteAsset {
            name,
            attrs: attributes.try_into().map_err(parse)?,
        }),
        ("graph", "cached") => Ok(DeclSpec::Graph {
            name,
            attrs: attributes.try_into().map_err(parse)?,
        }),
        ("animator", "path") => Ok(DeclSpec::PathAnimator {
            name,
            attrs: attributes.try_into().map_err(parse)?,
        }),
        ("enemy", "basic") => Ok(DeclSpec::Enemy {
            name,
            attrs: attributes.try_into().map_err(parse)?,
        }),
        ("tower", "shooting") => Ok(DeclSpec::Tower {
            name,
            attrs: attributes.try_into().map_err(parse)?,
        }),
        ("asset" | "graph" | "animator" | "enemy" | "tower", variety) => {
            Err(DeclarationError::UnknownVariety {
                label: label.to_owned(),
                declared: record.declared.clone(),
                variety: variety.to_owned(),
            })
        }
        (declared, _) => Err(DeclarationError::UnknownType {
            label: label.to_owned(),
            declared: declared.to_owned(),
        }),
    }
}
