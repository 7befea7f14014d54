#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core value types shared across the Pathguard simulation.
//!
//! This crate defines the vocabulary every other crate speaks: string
//! [`Kind`] tags used as the universal atlas lookup key, the integer
//! [`Point`]/[`Location`] geometry moving entities travel through, the
//! cardinal [`Direction`]s a path description is written in, the closed
//! [`TileKind`] set a pair of directions maps onto, and the [`Ticker`]
//! countdown primitive every timed behavior is built from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Side length of a square tile measured in pixels.
pub const TILE_SIZE: i32 = 64;

/// Number of ticks a 90 degree turn maneuver takes to complete.
///
/// Turn animators advance rotation by 3 degrees per tick.
pub const ROTATION_TICKS: i32 = 30;

/// String tag identifying a tile, asset, animator or entity variant.
///
/// Kinds are the universal lookup key across atlases: a declaration's
/// `name` becomes the kind its template is registered under, and
/// cross-references between declarations are expressed as kinds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kind(String);

impl Kind {
    /// Creates a new kind from the provided tag.
    #[must_use]
    pub fn new<T: Into<String>>(tag: T) -> Self {
        Self(tag.into())
    }

    /// Borrows the underlying tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Kind {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Cardinal travel directions used by path descriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Travel toward decreasing y coordinates.
    North,
    /// Travel toward increasing x coordinates.
    East,
    /// Travel toward increasing y coordinates.
    South,
    /// Travel toward decreasing x coordinates.
    West,
}

impl Direction {
    /// All directions in deterministic N, E, S, W order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Returns the direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::East => Self::West,
            Self::South => Self::North,
            Self::West => Self::East,
        }
    }

    /// Single-letter form used by the map text format.
    #[must_use]
    pub const fn letter(self) -> &'static str {
        match self {
            Self::North => "N",
            Self::East => "E",
            Self::South => "S",
            Self::West => "W",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// Error produced when a direction letter cannot be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseDirectionError {
    letter: String,
}

impl ParseDirectionError {
    /// The rejected input.
    #[must_use]
    pub fn letter(&self) -> &str {
        &self.letter
    }
}

impl fmt::Display for ParseDirectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown direction letter '{}'", self.letter)
    }
}

impl std::error::Error for ParseDirectionError {}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(Self::North),
            "E" => Ok(Self::East),
            "S" => Ok(Self::South),
            "W" => Ok(Self::West),
            other => Err(ParseDirectionError {
                letter: other.to_owned(),
            }),
        }
    }
}

/// Closed set of traversable tile encodings plus the blank filler tile.
///
/// A tile kind concatenates the direction an entity travels when entering
/// the tile with the direction it travels when leaving it. Entry and exit
/// can never be opposite: the path would double back on itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    /// Tile that is not part of the path.
    Blank,
    /// Straight tile entered and exited heading north.
    NorthNorth,
    /// Straight tile entered and exited heading south.
    SouthSouth,
    /// Straight tile entered and exited heading east.
    EastEast,
    /// Straight tile entered and exited heading west.
    WestWest,
    /// Turn entered heading north, exited heading east.
    NorthEast,
    /// Turn entered heading north, exited heading west.
    NorthWest,
    /// Turn entered heading south, exited heading east.
    SouthEast,
    /// Turn entered heading south, exited heading west.
    SouthWest,
    /// Turn entered heading east, exited heading north.
    EastNorth,
    /// Turn entered heading east, exited heading south.
    EastSouth,
    /// Turn entered heading west, exited heading north.
    WestNorth,
    /// Turn entered heading west, exited heading south.
    WestSouth,
}

impl TileKind {
    /// The twelve traversable encodings in deterministic order.
    pub const TRAVERSABLE: [TileKind; 12] = [
        TileKind::NorthNorth,
        TileKind::SouthSouth,
        TileKind::EastEast,
        TileKind::WestWest,
        TileKind::NorthEast,
        TileKind::NorthWest,
        TileKind::SouthEast,
        TileKind::SouthWest,
        TileKind::EastNorth,
        TileKind::EastSouth,
        TileKind::WestNorth,
        TileKind::WestSouth,
    ];

    /// Derives the tile kind for a path step entered travelling `entry`
    /// and exited travelling `exit`.
    ///
    /// Returns `None` when the pair would reverse the path, which a valid
    /// path description can never contain.
    #[must_use]
    pub const fn from_directions(entry: Direction, exit: Direction) -> Option<Self> {
        use Direction::{East, North, South, West};
        match (entry, exit) {
            (North, South) | (South, North) | (East, West) | (West, East) => None,
            (North, North) => Some(Self::NorthNorth),
            (South, South) => Some(Self::SouthSouth),
            (East, East) => Some(Self::EastEast),
            (West, West) => Some(Self::WestWest),
            (North, East) => Some(Self::NorthEast),
            (North, West) => Some(Self::NorthWest),
            (South, East) => Some(Self::SouthEast),
            (South, West) => Some(Self::SouthWest),
            (East, North) => Some(Self::EastNorth),
            (East, South) => Some(Self::EastSouth),
            (West, North) => Some(Self::WestNorth),
            (West, South) => Some(Self::WestSouth),
        }
    }

    /// The straight tile kind for continuing travel in `direction`.
    #[must_use]
    pub const fn straight(direction: Direction) -> Self {
        match direction {
            Direction::North => Self::NorthNorth,
            Direction::South => Self::SouthSouth,
            Direction::East => Self::EastEast,
            Direction::West => Self::WestWest,
        }
    }

    /// Direction of travel when entering the tile.
    ///
    /// Blank tiles have no entry; they report north for completeness but
    /// never participate in path traversal.
    #[must_use]
    pub const fn entry(self) -> Direction {
        use Direction::{East, North, South, West};
        match self {
            Self::Blank | Self::NorthNorth | Self::NorthEast | Self::NorthWest => North,
            Self::SouthSouth | Self::SouthEast | Self::SouthWest => South,
            Self::EastEast | Self::EastNorth | Self::EastSouth => East,
            Self::WestWest | Self::WestNorth | Self::WestSouth => West,
        }
    }

    /// Direction of travel when leaving the tile.
    #[must_use]
    pub const fn exit(self) -> Direction {
        use Direction::{East, North, South, West};
        match self {
            Self::Blank | Self::NorthNorth | Self::EastNorth | Self::WestNorth => North,
            Self::SouthSouth | Self::EastSouth | Self::WestSouth => South,
            Self::EastEast | Self::NorthEast | Self::SouthEast => East,
            Self::WestWest | Self::NorthWest | Self::SouthWest => West,
        }
    }

    /// Reports whether the tile changes the direction of travel.
    #[must_use]
    pub const fn is_turn(self) -> bool {
        !matches!(
            self,
            Self::Blank | Self::NorthNorth | Self::SouthSouth | Self::EastEast | Self::WestWest
        )
    }

    /// Two-letter string form used as the atlas lookup key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blank => "BL",
            Self::NorthNorth => "NN",
            Self::SouthSouth => "SS",
            Self::EastEast => "EE",
            Self::WestWest => "WW",
            Self::NorthEast => "NE",
            Self::NorthWest => "NW",
            Self::SouthEast => "SE",
            Self::SouthWest => "SW",
            Self::EastNorth => "EN",
            Self::EastSouth => "ES",
            Self::WestNorth => "WN",
            Self::WestSouth => "WS",
        }
    }

    /// The string [`Kind`] the tile is registered under in atlases.
    #[must_use]
    pub fn kind(self) -> Kind {
        Kind::new(self.as_str())
    }
}

impl fmt::Display for TileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable 2D integer coordinate.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Point {
    x: i32,
    y: i32,
}

impl Point {
    /// The origin.
    pub const ZERO: Point = Point::new(0, 0);

    /// Creates a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// The point one unit north.
    #[must_use]
    pub const fn north(self) -> Self {
        Self::new(self.x, self.y - 1)
    }

    /// The point one unit east.
    #[must_use]
    pub const fn east(self) -> Self {
        Self::new(self.x + 1, self.y)
    }

    /// The point one unit south.
    #[must_use]
    pub const fn south(self) -> Self {
        Self::new(self.x, self.y + 1)
    }

    /// The point one unit west.
    #[must_use]
    pub const fn west(self) -> Self {
        Self::new(self.x - 1, self.y)
    }

    /// The point one unit along the provided direction.
    #[must_use]
    pub const fn neighbor(self, direction: Direction) -> Self {
        match direction {
            Direction::North => self.north(),
            Direction::East => self.east(),
            Direction::South => self.south(),
            Direction::West => self.west(),
        }
    }

    /// Component-wise sum.
    #[must_use]
    pub const fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    /// Component-wise difference.
    #[must_use]
    pub const fn subtract(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Component-wise product.
    #[must_use]
    pub const fn component_mul(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }

    /// Both components multiplied by a scalar.
    #[must_use]
    pub const fn scale(self, factor: i32) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Both components divided by a scalar, truncating toward zero.
    #[must_use]
    pub const fn reduce(self, divisor: i32) -> Self {
        Self::new(self.x / divisor, self.y / divisor)
    }

    /// Squared euclidean distance to another point.
    #[must_use]
    pub const fn distance_squared(self, other: Self) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Reports whether `other` lies within the squared radius.
    #[must_use]
    pub const fn near(self, other: Self, max_distance_squared: i64) -> bool {
        self.distance_squared(other) <= max_distance_squared
    }

    /// The tile containing this pixel coordinate.
    #[must_use]
    pub const fn tile_index(self) -> Self {
        self.reduce(TILE_SIZE)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// A [`Point`] paired with a rotation in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    point: Point,
    rotation: i32,
}

impl Location {
    /// The origin with no rotation.
    pub const ZERO: Location = Location::new(Point::ZERO, 0);

    /// Creates a location from a point and rotation in degrees.
    #[must_use]
    pub const fn new(point: Point, rotation: i32) -> Self {
        Self { point, rotation }
    }

    /// The positional component.
    #[must_use]
    pub const fn point(&self) -> Point {
        self.point
    }

    /// Rotation in degrees.
    #[must_use]
    pub const fn rotation(&self) -> i32 {
        self.rotation
    }

    /// Steps one unit north, preserving rotation.
    #[must_use]
    pub const fn north(self) -> Self {
        Self::new(self.point.north(), self.rotation)
    }

    /// Steps one unit east, preserving rotation.
    #[must_use]
    pub const fn east(self) -> Self {
        Self::new(self.point.east(), self.rotation)
    }

    /// Steps one unit south, preserving rotation.
    #[must_use]
    pub const fn south(self) -> Self {
        Self::new(self.point.south(), self.rotation)
    }

    /// Steps one unit west, preserving rotation.
    #[must_use]
    pub const fn west(self) -> Self {
        Self::new(self.point.west(), self.rotation)
    }

    /// Rotates clockwise by the provided degree delta.
    #[must_use]
    pub const fn clockwise(self, delta: i32) -> Self {
        Self::new(self.point, self.rotation + delta)
    }

    /// Rotates counterclockwise by the provided degree delta.
    #[must_use]
    pub const fn counter_clockwise(self, delta: i32) -> Self {
        Self::new(self.point, self.rotation - delta)
    }

    /// Returns this location rotated to face the target point.
    ///
    /// Uses the screen convention where rotation zero faces up the
    /// negative y axis and increases clockwise.
    #[must_use]
    pub fn facing(self, target: Point) -> Self {
        let dx = f64::from(target.x() - self.point.x());
        let dy = f64::from(self.point.y() - target.y());
        Self::new(self.point, dx.atan2(dy).to_degrees() as i32)
    }

    /// Replaces the positional component, preserving rotation.
    #[must_use]
    pub const fn at_point(self, point: Point) -> Self {
        Self::new(point, self.rotation)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}deg", self.point, self.rotation)
    }
}

/// Monotonic countdown counter driving every timed behavior.
///
/// A non-negative `max` counts up to completion and never overshoots. A
/// negative `max` produces a ticker that is never done, used as the
/// simulation's master clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticker {
    max: i32,
    current: i32,
}

impl Ticker {
    /// Creates a ticker that completes after `max` ticks.
    #[must_use]
    pub const fn new(max: i32) -> Self {
        Self { max, current: 0 }
    }

    /// Number of ticks required for completion.
    #[must_use]
    pub const fn max(&self) -> i32 {
        self.max
    }

    /// Ticks elapsed so far.
    #[must_use]
    pub const fn ticks(&self) -> i32 {
        self.current
    }

    /// Reports whether the ticker has reached its maximum.
    #[must_use]
    pub const fn done(&self) -> bool {
        self.max >= 0 && self.current >= self.max
    }

    /// Advances by one tick, reporting completion.
    pub fn tick(&mut self) -> bool {
        self.tick_by(1)
    }

    /// Advances by `amount` ticks clamped to the maximum, reporting
    /// completion.
    ///
    /// Clamping realizes variable entity speed without overrunning a
    /// trajectory: a fast entity never skips past the final sample.
    pub fn tick_by(&mut self, amount: i32) -> bool {
        if self.max >= 0 {
            self.current = (self.current + amount).min(self.max);
        } else {
            self.current += amount;
        }
        self.done()
    }

    /// Rewinds the ticker to the start.
    pub fn reset(&mut self) {
        self.current = 0;
    }
}

/// Inclusive tick window used by tower intercept searches.
///
/// `min * speed` and `max * speed` describe the inner and outer pixel
/// radii of the donut a tower can hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickRange {
    /// Earliest intercept tick considered.
    pub min: i32,
    /// Latest intercept tick considered.
    pub max: i32,
}

impl TickRange {
    /// Creates a new inclusive tick window.
    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;

    #[test]
    fn ticker_completes_after_max_ticks() {
        let mut ticker = Ticker::new(5);
        for _ in 0..4 {
            assert!(!ticker.tick());
        }
        assert!(ticker.tick());
        assert!(ticker.done());
    }

    #[test]
    fn tick_by_clamps_to_max() {
        let mut ticker = Ticker::new(10);
        assert!(!ticker.tick_by(7));
        assert!(ticker.tick_by(100));
        assert_eq!(ticker.ticks(), 10);
    }

    #[test]
    fn negative_max_never_completes() {
        let mut ticker = Ticker::new(-1);
        for _ in 0..10_000 {
            assert!(!ticker.tick());
        }
        assert!(!ticker.done());
    }

    #[test]
    fn reset_rewinds_progress() {
        let mut ticker = Ticker::new(3);
        let _ = ticker.tick_by(3);
        ticker.reset();
        assert_eq!(ticker.ticks(), 0);
        assert!(!ticker.done());
    }

    #[test]
    fn opposite_directions_round_trip() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
        }
    }

    #[test]
    fn direction_letters_parse() {
        for direction in Direction::ALL {
            assert_eq!(direction.letter().parse::<Direction>(), Ok(direction));
        }
        assert!("Q".parse::<Direction>().is_err());
    }

    #[test]
    fn opposite_entry_exit_has_no_tile_kind() {
        for direction in Direction::ALL {
            assert_eq!(
                TileKind::from_directions(direction, direction.opposite()),
                None
            );
        }
    }

    #[test]
    fn tile_kind_entry_exit_round_trip() {
        for kind in TileKind::TRAVERSABLE {
            assert_eq!(
                TileKind::from_directions(kind.entry(), kind.exit()),
                Some(kind)
            );
        }
    }

    #[test]
    fn straight_tiles_are_not_turns() {
        for direction in Direction::ALL {
            assert!(!TileKind::straight(direction).is_turn());
        }
        assert!(TileKind::SouthEast.is_turn());
    }

    #[test]
    fn point_arithmetic_matches_expectation() {
        let p = Point::new(3, 4);
        assert_eq!(p.add(Point::new(1, -2)), Point::new(4, 2));
        assert_eq!(p.subtract(Point::new(3, 4)), Point::ZERO);
        assert_eq!(p.scale(2), Point::new(6, 8));
        assert_eq!(Point::new(130, 70).tile_index(), Point::new(2, 1));
        assert_eq!(Point::ZERO.distance_squared(p), 25);
        assert!(Point::ZERO.near(p, 25));
        assert!(!Point::ZERO.near(p, 24));
    }

    #[test]
    fn neighbor_follows_direction() {
        let p = Point::new(5, 5);
        assert_eq!(p.neighbor(Direction::North), Point::new(5, 4));
        assert_eq!(p.neighbor(Direction::East), Point::new(6, 5));
        assert_eq!(p.neighbor(Direction::South), Point::new(5, 6));
        assert_eq!(p.neighbor(Direction::West), Point::new(4, 5));
    }

    #[test]
    fn facing_reports_cardinal_headings() {
        let origin = Location::new(Point::ZERO, 0);
        assert_eq!(origin.facing(Point::new(0, -10)).rotation(), 0);
        assert_eq!(origin.facing(Point::new(10, 0)).rotation(), 90);
        assert_eq!(origin.facing(Point::new(-10, 0)).rotation(), -90);
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: serde::Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn kind_round_trips_through_bincode() {
        assert_round_trip(&Kind::new("prepath"));
    }

    #[test]
    fn location_round_trips_through_bincode() {
        assert_round_trip(&Location::new(Point::new(64, -64), 90));
    }

    #[test]
    fn tick_range_round_trips_through_bincode() {
        assert_round_trip(&TickRange::new(16, 96));
    }
}
