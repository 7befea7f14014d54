#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tile map graph for the Pathguard simulation.
//!
//! A map is authored as a start tile plus a sequence of direction letters.
//! Building the [`Graph`] derives one [`TileKind`] per step, validates the
//! path geometry against the board borders, and produces a grid of
//! [`Node`]s that double as tiny spatial buckets: each path node tracks
//! which colliders currently overlap its tile so tower range queries never
//! scan the whole entity list.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use pathguard_core::{Direction, Point, TileKind, TILE_SIZE};
use thiserror::Error;

/// Errors produced while parsing or validating a map description.
///
/// Every variant is a fatal configuration error: a graph either builds
/// completely or the load aborts.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The map file could not be read.
    #[error("failed to read map file: {0}")]
    Io(#[from] std::io::Error),
    /// The map text contained no start line.
    #[error("map text is empty; expected an \"x,y\" start line")]
    MissingStart,
    /// The start line was not a well-formed `x,y` coordinate.
    #[error("malformed start line {line:?}; expected \"x,y\"")]
    MalformedStart {
        /// The offending line.
        line: String,
    },
    /// A path line was not a recognized direction letter.
    #[error("line {line} is not a direction letter: {letter:?}")]
    UnknownDirection {
        /// One-based line number in the map text.
        line: usize,
        /// The offending text.
        letter: String,
    },
    /// The map contained a start line but no direction lines.
    #[error("map describes no path steps")]
    EmptyPath,
    /// The start tile was not on the west or north border.
    #[error("start tile {start} must lie on the west or north border")]
    StartNotOnBorder {
        /// The rejected start tile.
        start: Point,
    },
    /// A path step produced a tile with a negative coordinate.
    #[error("path step {step} leaves the board at {point}")]
    NegativeCoordinate {
        /// Zero-based index of the offending step.
        step: usize,
        /// The out-of-bounds tile.
        point: Point,
    },
    /// Two consecutive path steps reversed direction.
    #[error("path step {step} doubles back ({entry} then {exit})")]
    DoublesBack {
        /// Zero-based index of the offending step.
        step: usize,
        /// Direction of travel entering the tile.
        entry: Direction,
        /// Direction of travel leaving the tile.
        exit: Direction,
    },
    /// The final path step did not leave through the east or south border.
    #[error("path ends at {end} instead of the east or south border")]
    EndNotOnBorder {
        /// The tile the path would exit into.
        end: Point,
    },
}

/// Handle identifying a collider registered with a graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(u32);

impl ColliderId {
    /// Raw numeric form of the handle.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ColliderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "collider#{}", self.0)
    }
}

/// Role a collider plays in range queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColliderClass {
    /// Deals damage; towers register as damagers.
    Damager,
    /// Receives damage; enemies register as damageables.
    Damageable,
}

/// One tile of the map grid.
///
/// Path nodes carry a traversable [`TileKind`] and the number of path
/// steps remaining to the exit; blank nodes fill the rest of the grid.
#[derive(Clone, Debug)]
pub struct Node {
    point: Point,
    tile: TileKind,
    distance_to_end: i32,
    damagers: Vec<ColliderId>,
    damageables: Vec<ColliderId>,
}

impl Node {
    fn blank(point: Point) -> Self {
        Self {
            point,
            tile: TileKind::Blank,
            distance_to_end: 0,
            damagers: Vec::new(),
            damageables: Vec::new(),
        }
    }

    /// Tile coordinate of the node.
    #[must_use]
    pub const fn point(&self) -> Point {
        self.point
    }

    /// Tile kind occupying the node.
    #[must_use]
    pub const fn tile(&self) -> TileKind {
        self.tile
    }

    /// Path steps remaining from this tile to the board exit.
    ///
    /// Zero for blank nodes and for the final path tile.
    #[must_use]
    pub const fn distance_to_end(&self) -> i32 {
        self.distance_to_end
    }

    /// Colliders of the given class currently overlapping the tile.
    #[must_use]
    pub fn colliders(&self, class: ColliderClass) -> &[ColliderId] {
        match class {
            ColliderClass::Damager => &self.damagers,
            ColliderClass::Damageable => &self.damageables,
        }
    }

    fn add_collider(&mut self, class: ColliderClass, id: ColliderId) {
        let list = self.list_mut(class);
        if !list.contains(&id) {
            list.push(id);
        }
    }

    fn remove_collider(&mut self, class: ColliderClass, id: ColliderId) {
        let list = self.list_mut(class);
        list.retain(|entry| *entry != id);
    }

    fn list_mut(&mut self, class: ColliderClass) -> &mut Vec<ColliderId> {
        match class {
            ColliderClass::Damager => &mut self.damagers,
            ColliderClass::Damageable => &mut self.damageables,
        }
    }
}

/// Static tile map built from a directional path description.
#[derive(Debug)]
pub struct Graph {
    width: i32,
    height: i32,
    nodes: Vec<Node>,
    path: Vec<TileKind>,
    path_points: Vec<Point>,
    entry: Direction,
    exit: Direction,
    next_collider: u32,
}

impl Graph {
    /// Builds a graph from map text.
    ///
    /// The first non-empty line is the `x,y` start tile; every following
    /// non-empty line is one direction letter. The start tile must lie on
    /// the west or north border and the path must leave through the east
    /// or south border.
    pub fn from_text(text: &str) -> Result<Self, GraphError> {
        let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
        let start_line = lines.next().ok_or(GraphError::MissingStart)?;
        let start = parse_start(start_line)?;

        let mut directions = Vec::new();
        for (index, line) in lines.enumerate() {
            let direction =
                Direction::from_str(line).map_err(|err| GraphError::UnknownDirection {
                    line: index + 2,
                    letter: err.letter().to_owned(),
                })?;
            directions.push(direction);
        }
        if directions.is_empty() {
            return Err(GraphError::EmptyPath);
        }

        // The step onto the board fixes the first tile's entry direction.
        let entry = if start.y() == 0 {
            Direction::South
        } else if start.x() == 0 {
            Direction::East
        } else {
            return Err(GraphError::StartNotOnBorder { start });
        };

        let mut path = Vec::with_capacity(directions.len());
        let mut path_points = Vec::with_capacity(directions.len());
        let mut point = start;
        let mut previous = entry;
        for (step, exit) in directions.iter().copied().enumerate() {
            if point.x() < 0 || point.y() < 0 {
                return Err(GraphError::NegativeCoordinate { step, point });
            }
            let tile = TileKind::from_directions(previous, exit).ok_or(GraphError::DoublesBack {
                step,
                entry: previous,
                exit,
            })?;
            path.push(tile);
            path_points.push(point);
            point = point.neighbor(exit);
            previous = exit;
        }

        let width = path_points.iter().map(Point::x).max().unwrap_or(0) + 1;
        let height = path_points.iter().map(Point::y).max().unwrap_or(0) + 1;
        let end = point;
        if end.x() != width && end.y() != height {
            return Err(GraphError::EndNotOnBorder { end });
        }

        let mut nodes = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                nodes.push(Node::blank(Point::new(x, y)));
            }
        }
        let mut graph = Self {
            width,
            height,
            nodes,
            path,
            path_points,
            entry,
            exit: previous,
            next_collider: 0,
        };
        let steps = graph.path_points.len();
        for (index, tile_point) in graph.path_points.clone().into_iter().enumerate() {
            let tile = graph.path[index];
            if let Some(node) = graph.node_mut(tile_point) {
                node.tile = tile;
                node.distance_to_end = (steps - 1 - index) as i32;
            }
        }
        Ok(graph)
    }

    /// Builds a graph from a map file on disk.
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_text(&text)
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Ordered tile-kind sequence of the path, one kind per map step.
    #[must_use]
    pub fn path(&self) -> &[TileKind] {
        &self.path
    }

    /// Tile coordinates of the path, parallel to [`Graph::path`].
    #[must_use]
    pub fn path_points(&self) -> &[Point] {
        &self.path_points
    }

    /// Straight tile kind for the step off the board.
    ///
    /// Appending this to [`Graph::path`] yields a trajectory that carries
    /// a traveller one full tile past the final path tile.
    #[must_use]
    pub fn exit_kind(&self) -> TileKind {
        TileKind::straight(self.exit)
    }

    /// Pixel-space location one tile before the first path tile, rotated
    /// to face the direction of travel.
    #[must_use]
    pub fn start_location(&self) -> pathguard_core::Location {
        let first = self.path_points[0].scale(TILE_SIZE);
        let (point, rotation) = match self.entry {
            Direction::South => (Point::new(first.x(), first.y() - TILE_SIZE), 0),
            Direction::East => (Point::new(first.x() - TILE_SIZE, first.y()), -90),
            Direction::North => (Point::new(first.x(), first.y() + TILE_SIZE), 180),
            Direction::West => (Point::new(first.x() + TILE_SIZE, first.y()), 90),
        };
        pathguard_core::Location::new(point, rotation)
    }

    /// Reports whether the tile coordinate lies on the board.
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        point.x() >= 0 && point.x() < self.width && point.y() >= 0 && point.y() < self.height
    }

    /// Borrows the node at a tile coordinate.
    #[must_use]
    pub fn node(&self, point: Point) -> Option<&Node> {
        self.index_of(point).map(|index| &self.nodes[index])
    }

    fn node_mut(&mut self, point: Point) -> Option<&mut Node> {
        self.index_of(point).map(move |index| &mut self.nodes[index])
    }

    fn index_of(&self, point: Point) -> Option<usize> {
        self.contains(point)
            .then(|| (point.y() * self.width + point.x()) as usize)
    }

    /// Path tiles whose centre lies within `radius` pixels of a pixel
    /// coordinate, sorted by remaining distance to the board exit so
    /// callers visit the tiles closest to the exit first.
    #[must_use]
    pub fn tiles_around(&self, point: Point, radius: i32) -> Vec<Point> {
        let radius_squared = i64::from(radius) * i64::from(radius);
        let half = TILE_SIZE / 2;
        let mut tiles: Vec<&Node> = self
            .nodes
            .iter()
            .filter(|node| node.tile != TileKind::Blank)
            .filter(|node| {
                let centre = node.point.scale(TILE_SIZE).add(Point::new(half, half));
                centre.near(point, radius_squared)
            })
            .collect();
        tiles.sort_by_key(|node| node.distance_to_end);
        tiles.iter().map(|node| node.point).collect()
    }

    /// Allocates a fresh collider handle.
    pub fn register_collider(&mut self) -> ColliderId {
        let id = ColliderId(self.next_collider);
        self.next_collider += 1;
        id
    }

    fn add_collider(&mut self, point: Point, class: ColliderClass, id: ColliderId) {
        if let Some(node) = self.node_mut(point) {
            node.add_collider(class, id);
        }
    }

    fn remove_collider(&mut self, point: Point, class: ColliderClass, id: ColliderId) {
        if let Some(node) = self.node_mut(point) {
            node.remove_collider(class, id);
        }
    }
}

/// Tracks which tiles a moving collider's bounding box currently touches.
///
/// The box is described by a pixel offset from the entity's location plus
/// a size, so its four corners cover at most four tiles. Node collider
/// lists are touched only when the corner tiles actually change, not every
/// tick.
#[derive(Clone, Debug)]
pub struct TileLocation {
    offset: Point,
    size: Point,
    class: ColliderClass,
    id: Option<ColliderId>,
    tiles: [Point; 4],
    placed: bool,
}

impl TileLocation {
    /// Creates an unplaced tile location for a collider with the given
    /// bounding box.
    ///
    /// The collider handle is allocated from the graph on the first
    /// [`TileLocation::move_to`] call, so trackers can be built ahead of
    /// time (pooled entities pre-build theirs).
    #[must_use]
    pub const fn new(class: ColliderClass, offset: Point, size: Point) -> Self {
        Self {
            offset,
            size,
            class,
            id: None,
            tiles: [Point::ZERO; 4],
            placed: false,
        }
    }

    /// The collider handle this tracker registers on nodes, once placed.
    #[must_use]
    pub const fn id(&self) -> Option<ColliderId> {
        self.id
    }

    /// Moves the collider to a new pixel location, diffing tile
    /// membership against the previous position.
    pub fn move_to(&mut self, graph: &mut Graph, location: Point) {
        let id = match self.id {
            Some(id) => id,
            None => {
                let id = graph.register_collider();
                self.id = Some(id);
                id
            }
        };
        let tiles = self.corner_tiles(location);
        if self.placed {
            if tiles == self.tiles {
                return;
            }
            for old in self.tiles {
                if !tiles.contains(&old) {
                    graph.remove_collider(old, self.class, id);
                }
            }
            for new in tiles {
                if !self.tiles.contains(&new) {
                    graph.add_collider(new, self.class, id);
                }
            }
        } else {
            for new in tiles {
                graph.add_collider(new, self.class, id);
            }
        }
        self.tiles = tiles;
        self.placed = true;
    }

    /// Vacates every occupied tile; used when the collider despawns.
    pub fn clear(&mut self, graph: &mut Graph) {
        if !self.placed {
            return;
        }
        let Some(id) = self.id else {
            return;
        };
        for tile in self.tiles {
            graph.remove_collider(tile, self.class, id);
        }
        self.placed = false;
    }

    fn corner_tiles(&self, location: Point) -> [Point; 4] {
        let origin = location.add(self.offset);
        let far = origin.add(self.size);
        [
            origin.tile_index(),
            Point::new(far.x(), origin.y()).tile_index(),
            Point::new(origin.x(), far.y()).tile_index(),
            far.tile_index(),
        ]
    }
}

fn parse_start(line: &str) -> Result<Point, GraphError> {
    let malformed = || GraphError::MalformedStart {
        line: line.to_owned(),
    };
    let (x, y) = line.split_once(',').ok_or_else(malformed)?;
    let x: i32 = x.trim().parse().map_err(|_| malformed())?;
    let y: i32 = y.trim().parse().map_err(|_| malformed())?;
    if x < 0 || y < 0 {
        return Err(malformed());
    }
    Ok(Point::new(x, y))
}
