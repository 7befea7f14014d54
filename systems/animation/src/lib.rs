#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Trajectory animators for the Pathguard simulation.
//!
//! An [`Animator`] is a stateful cursor over a location trajectory. Three
//! variants cover every moving thing in the game: a [`TileAnimator`]
//! applies one pure location transform per tick, a [`SerialAnimator`]
//! chains sub-animators strictly in sequence, and a
//! [`PrecalculatedAnimator`] replays a fully baked per-tick location
//! sequence by index. The [`AnimatorAtlas`] registers one animator per
//! [`Kind`] and hands out restarted clones.

use std::collections::HashMap;
use std::sync::Arc;

use pathguard_core::{
    Direction, Kind, Location, Point, TileKind, Ticker, ROTATION_TICKS, TILE_SIZE,
};
use pathguard_world::Graph;

/// Degrees a turn maneuver rotates per tick.
const DEGREES_PER_TICK: i32 = 90 / ROTATION_TICKS;

/// Something an animator can move.
pub trait Animated {
    /// Current location of the target.
    fn location(&self) -> Location;
    /// Replaces the target's location.
    fn set_location(&mut self, location: Location);
    /// Trajectory ticks the target consumes per simulation tick.
    ///
    /// Speed scales movement per entity without touching the trajectory:
    /// a speed 2 target covers a baked path in half the ticks.
    fn speed(&self) -> i32;
}

/// Pure location transform applied once per tick by a [`TileAnimator`].
pub type StepFn = fn(i32, Location) -> Location;

/// Applies one pure location transform per tick for a fixed tick count.
#[derive(Debug)]
pub struct TileAnimator {
    kind: Kind,
    ticker: Ticker,
    step: StepFn,
}

impl TileAnimator {
    /// Creates an animator that applies `step` once per tick for `ticks`
    /// ticks.
    #[must_use]
    pub fn new(kind: Kind, ticks: i32, step: StepFn) -> Self {
        Self {
            kind,
            ticker: Ticker::new(ticks),
            step,
        }
    }

    fn animate(&mut self, target: &mut dyn Animated) {
        if self.ticker.done() {
            return;
        }
        let next = (self.step)(self.ticker.ticks(), target.location());
        target.set_location(next);
        let _ = self.ticker.tick();
    }
}

impl Clone for TileAnimator {
    /// Clones restart at tick zero; step functions carry no state.
    fn clone(&self) -> Self {
        Self::new(self.kind.clone(), self.ticker.max(), self.step)
    }
}

/// Runs sub-animators strictly in sequence.
#[derive(Debug)]
pub struct SerialAnimator {
    kind: Kind,
    animators: Vec<Animator>,
    cursor: usize,
}

impl SerialAnimator {
    /// Creates a serial composition over the provided animators.
    #[must_use]
    pub fn new(kind: Kind, animators: Vec<Animator>) -> Self {
        Self {
            kind,
            animators,
            cursor: 0,
        }
    }

    fn animate(&mut self, target: &mut dyn Animated) {
        let Some(current) = self.animators.get_mut(self.cursor) else {
            return;
        };
        current.animate_dyn(target);
        if current.done() {
            self.cursor += 1;
        }
    }

    fn done(&self) -> bool {
        self.cursor >= self.animators.len()
    }

    fn reset(&mut self) {
        for animator in &mut self.animators {
            animator.reset();
        }
        self.cursor = 0;
    }
}

impl Clone for SerialAnimator {
    /// Clones restart at tick zero with every sub-animator restarted.
    fn clone(&self) -> Self {
        Self::new(self.kind.clone(), self.animators.clone())
    }
}

/// Replays a baked per-tick location sequence by index.
///
/// The trajectory itself is immutable and shared between clones through
/// an [`Arc`]; each instance owns only its own progress cursor.
#[derive(Debug)]
pub struct PrecalculatedAnimator {
    kind: Kind,
    locations: Arc<[Location]>,
    ticker: Ticker,
}

impl PrecalculatedAnimator {
    /// Bakes a trajectory by replaying `animator` against a throwaway
    /// location holder, recording one location per tick.
    #[must_use]
    pub fn bake(kind: Kind, start: Location, mut animator: Animator) -> Self {
        let mut holder = Recorder {
            location: start,
            trace: Vec::new(),
        };
        while !animator.done() {
            animator.animate_dyn(&mut holder);
            holder.trace.push(holder.location);
        }
        Self::from_locations(kind, holder.trace)
    }

    /// Bakes a straight pixel line from `start` to `end` over `ticks`
    /// ticks, rotated to face the destination.
    ///
    /// The final sample is forced to equal `end` exactly so integer
    /// rounding never leaves the trajectory short of its target.
    #[must_use]
    pub fn from_line(kind: Kind, start: Point, end: Point, ticks: i32) -> Self {
        let ticks = ticks.max(1);
        let rotation = Location::new(start, 0).facing(end).rotation();
        let delta = end.subtract(start);
        let mut locations = Vec::with_capacity(ticks as usize);
        for i in 1..ticks {
            let sample = start.add(Point::new(delta.x() * i / ticks, delta.y() * i / ticks));
            locations.push(Location::new(sample, rotation));
        }
        locations.push(Location::new(end, rotation));
        Self::from_locations(kind, locations)
    }

    fn from_locations(kind: Kind, locations: Vec<Location>) -> Self {
        let ticker = Ticker::new(locations.len() as i32);
        Self {
            kind,
            locations: locations.into(),
            ticker,
        }
    }

    /// Total ticks in the baked trajectory.
    #[must_use]
    pub fn len(&self) -> i32 {
        self.ticker.max()
    }

    /// Reports whether the trajectory holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Location at an absolute trajectory tick, if within bounds.
    #[must_use]
    pub fn location_at(&self, tick: i32) -> Option<Location> {
        usize::try_from(tick)
            .ok()
            .and_then(|index| self.locations.get(index))
            .copied()
    }

    /// Location `delta` ticks ahead of the current progress, if the
    /// trajectory extends that far.
    ///
    /// Towers use this to ask where a traveller will be without mutating
    /// it.
    #[must_use]
    pub fn location_offset(&self, delta: i32) -> Option<Location> {
        self.location_at(self.ticker.ticks() + delta)
    }

    /// The trajectory's final location and the ticks remaining until the
    /// cursor reaches it.
    #[must_use]
    pub fn last_location(&self) -> (Location, i32) {
        let last = self
            .locations
            .last()
            .copied()
            .unwrap_or(Location::ZERO);
        (last, self.ticker.max() - self.ticker.ticks())
    }

    /// Moves the target one simulation tick along the baked trajectory,
    /// advancing the cursor by the target's speed.
    pub fn animate(&mut self, target: &mut dyn Animated) {
        if self.ticker.done() {
            return;
        }
        if let Some(location) = self.location_at(self.ticker.ticks()) {
            target.set_location(location);
        }
        let _ = self.ticker.tick_by(target.speed());
    }

    /// Reports whether playback has consumed the whole trajectory.
    #[must_use]
    pub fn done(&self) -> bool {
        self.ticker.done()
    }

    /// Rewinds playback to tick zero.
    pub fn reset(&mut self) {
        self.ticker.reset();
    }
}

impl Clone for PrecalculatedAnimator {
    /// Clones share the baked trajectory and restart at tick zero.
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            locations: Arc::clone(&self.locations),
            ticker: Ticker::new(self.ticker.max()),
        }
    }
}

/// Closed set of trajectory animators.
///
/// Cloning any animator yields an independent instance restarted at tick
/// zero; baked trajectory data is shared, progress never is.
#[derive(Clone, Debug)]
pub enum Animator {
    /// One pure transform per tick.
    Tile(TileAnimator),
    /// Strictly sequential composition.
    Serial(SerialAnimator),
    /// Baked per-tick location sequence.
    Precalculated(PrecalculatedAnimator),
}

impl Animator {
    /// Moves the target one simulation tick along the trajectory.
    ///
    /// A finished animator is a no-op.
    pub fn animate(&mut self, target: &mut impl Animated) {
        self.animate_dyn(target);
    }

    fn animate_dyn(&mut self, target: &mut dyn Animated) {
        match self {
            Self::Tile(tile) => tile.animate(target),
            Self::Serial(serial) => serial.animate(target),
            Self::Precalculated(precalculated) => precalculated.animate(target),
        }
    }

    /// The kind the animator is registered under.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        match self {
            Self::Tile(tile) => &tile.kind,
            Self::Serial(serial) => &serial.kind,
            Self::Precalculated(precalculated) => &precalculated.kind,
        }
    }

    /// Reports whether the trajectory is exhausted.
    #[must_use]
    pub fn done(&self) -> bool {
        match self {
            Self::Tile(tile) => tile.ticker.done(),
            Self::Serial(serial) => serial.done(),
            Self::Precalculated(precalculated) => precalculated.ticker.done(),
        }
    }

    /// Ticks elapsed on the trajectory.
    #[must_use]
    pub fn ticks(&self) -> i32 {
        match self {
            Self::Tile(tile) => tile.ticker.ticks(),
            Self::Serial(serial) => serial
                .animators
                .iter()
                .take(serial.cursor + 1)
                .map(Animator::ticks)
                .sum(),
            Self::Precalculated(precalculated) => precalculated.ticker.ticks(),
        }
    }

    /// Rewinds playback to tick zero.
    pub fn reset(&mut self) {
        match self {
            Self::Tile(tile) => tile.ticker.reset(),
            Self::Serial(serial) => serial.reset(),
            Self::Precalculated(precalculated) => precalculated.ticker.reset(),
        }
    }
}

struct Recorder {
    location: Location,
    trace: Vec<Location>,
}

impl Animated for Recorder {
    fn location(&self) -> Location {
        self.location
    }

    fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    fn speed(&self) -> i32 {
        1
    }
}

/// Registry of master animators keyed by [`Kind`].
#[derive(Clone, Debug, Default)]
pub struct AnimatorAtlas {
    animators: HashMap<Kind, Animator>,
}

impl AnimatorAtlas {
    /// Creates an empty atlas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an atlas pre-seeded with the twelve traversable tile
    /// animators.
    ///
    /// Straight tiles move one pixel per tick for a full tile; turn tiles
    /// move a full tile along their entry direction, then rotate ninety
    /// degrees toward the exit direction over [`ROTATION_TICKS`] ticks.
    #[must_use]
    pub fn with_tile_animators() -> Self {
        let mut atlas = Self::new();
        for tile in TileKind::TRAVERSABLE {
            atlas.register(tile_animator(tile));
        }
        atlas
    }

    /// Registers a master animator under its own kind.
    pub fn register(&mut self, animator: Animator) {
        let _ = self.animators.insert(animator.kind().clone(), animator);
    }

    /// Hands out a restarted clone of the animator registered under
    /// `kind`.
    #[must_use]
    pub fn animator(&self, kind: &Kind) -> Option<Animator> {
        self.animators.get(kind).cloned()
    }

    /// Hands out a restarted clone of the precalculated animator
    /// registered under `kind`.
    ///
    /// # Panics
    ///
    /// Panics when the registered animator is not the precalculated
    /// variant; that signals a construction-order bug, not bad input.
    #[must_use]
    pub fn precalculated(&self, kind: &Kind) -> Option<PrecalculatedAnimator> {
        self.animators.get(kind).map(|animator| match animator {
            Animator::Precalculated(precalculated) => precalculated.clone(),
            other => panic!(
                "animator {kind} is a {} variant, not precalculated",
                variant_name(other)
            ),
        })
    }

    /// Composes restarted clones of the registered tile animators into
    /// one serial maneuver, in path order.
    #[must_use]
    pub fn serial_from_path(&self, kind: Kind, tiles: &[TileKind]) -> Option<SerialAnimator> {
        let mut animators = Vec::with_capacity(tiles.len());
        for tile in tiles {
            animators.push(self.animator(&tile.kind())?);
        }
        Some(SerialAnimator::new(kind, animators))
    }

    /// Bakes the canonical travel trajectory for a graph and registers it
    /// under `kind`.
    ///
    /// The trajectory starts one tile before the map entry and carries a
    /// traveller one full tile past the final path tile, so entities walk
    /// onto and off the board.
    #[must_use]
    pub fn create_path_animator(&mut self, kind: Kind, graph: &Graph) -> Option<()> {
        let mut tiles = graph.path().to_vec();
        tiles.push(graph.exit_kind());
        let serial = self.serial_from_path(kind.clone(), &tiles)?;
        let baked = PrecalculatedAnimator::bake(
            kind,
            graph.start_location(),
            Animator::Serial(serial),
        );
        self.register(Animator::Precalculated(baked));
        Some(())
    }
}

fn variant_name(animator: &Animator) -> &'static str {
    match animator {
        Animator::Tile(_) => "tile",
        Animator::Serial(_) => "serial",
        Animator::Precalculated(_) => "precalculated",
    }
}

fn tile_animator(tile: TileKind) -> Animator {
    let forward = TileAnimator::new(tile.kind(), TILE_SIZE, step_toward(tile.entry()));
    if !tile.is_turn() {
        return Animator::Tile(forward);
    }
    let rotation = TileAnimator::new(tile.kind(), ROTATION_TICKS, step_rotate(tile));
    Animator::Serial(SerialAnimator::new(
        tile.kind(),
        vec![Animator::Tile(forward), Animator::Tile(rotation)],
    ))
}

fn step_toward(direction: Direction) -> StepFn {
    match direction {
        Direction::North => |_, location| location.north(),
        Direction::East => |_, location| location.east(),
        Direction::South => |_, location| location.south(),
        Direction::West => |_, location| location.west(),
    }
}

fn step_rotate(tile: TileKind) -> StepFn {
    if turn_is_clockwise(tile.entry(), tile.exit()) {
        |_, location| location.clockwise(DEGREES_PER_TICK)
    } else {
        |_, location| location.counter_clockwise(DEGREES_PER_TICK)
    }
}

fn turn_is_clockwise(entry: Direction, exit: Direction) -> bool {
    use Direction::{East, North, South, West};
    matches!(
        (entry, exit),
        (North, East) | (East, South) | (South, West) | (West, North)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Walker {
        location: Location,
        speed: i32,
    }

    impl Walker {
        fn new(location: Location, speed: i32) -> Self {
            Self { location, speed }
        }
    }

    impl Animated for Walker {
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

    fn line(ticks: i32) -> PrecalculatedAnimator {
        PrecalculatedAnimator::from_line(Kind::new("flight"), Point::ZERO, Point::new(100, 0), ticks)
    }

    #[test]
    fn line_trajectory_ends_exactly_at_the_target() {
        let animator = line(7);
        assert_eq!(animator.len(), 7);
        assert_eq!(
            animator.location_at(6).map(|loc| loc.point()),
            Some(Point::new(100, 0))
        );
    }

    #[test]
    fn line_trajectory_progresses_monotonically() {
        let animator = line(25);
        let mut previous = 0;
        for tick in 0..25 {
            let x = animator.location_at(tick).expect("in range").point().x();
            assert!(x > previous, "x must advance every tick");
            previous = x;
        }
    }

    #[test]
    fn animate_advances_by_target_speed() {
        let mut animator = Animator::Precalculated(line(10));
        let mut walker = Walker::new(Location::ZERO, 2);
        animator.animate(&mut walker);
        assert_eq!(animator.ticks(), 2);
        animator.animate(&mut walker);
        assert_eq!(walker.location.point().x(), 30);
    }

    #[test]
    fn fast_target_never_overruns_the_trajectory() {
        let mut animator = Animator::Precalculated(line(10));
        let mut walker = Walker::new(Location::ZERO, 7);
        while !animator.done() {
            animator.animate(&mut walker);
        }
        assert_eq!(animator.ticks(), 10);
        animator.animate(&mut walker);
        assert_eq!(animator.ticks(), 10);
    }

    #[test]
    fn clone_restarts_at_tick_zero() {
        let mut animator = Animator::Precalculated(line(10));
        let mut walker = Walker::new(Location::ZERO, 1);
        for _ in 0..4 {
            animator.animate(&mut walker);
        }
        assert_eq!(animator.ticks(), 4);
        let mut copy = animator.clone();
        assert_eq!(copy.ticks(), 0);

        let mut copy_walker = Walker::new(Location::ZERO, 1);
        copy.animate(&mut copy_walker);
        assert_eq!(animator.ticks(), 4, "copy progress must not leak back");
    }

    #[test]
    fn offset_lookup_past_the_end_reports_none() {
        let animator = line(5);
        assert!(animator.location_offset(4).is_some());
        assert!(animator.location_offset(5).is_none());
        assert!(animator.location_at(-1).is_none());
    }

    #[test]
    fn last_location_reports_remaining_ticks() {
        let mut animator = line(10);
        let mut walker = Walker::new(Location::ZERO, 3);
        animator.animate(&mut walker);
        let (last, remaining) = animator.last_location();
        assert_eq!(last.point(), Point::new(100, 0));
        assert_eq!(remaining, 7);
    }

    #[test]
    fn serial_animator_runs_children_in_sequence() {
        let first = TileAnimator::new(Kind::new("NN"), 3, |_, location| location.north());
        let second = TileAnimator::new(Kind::new("EE"), 2, |_, location| location.east());
        let mut serial = Animator::Serial(SerialAnimator::new(
            Kind::new("leg"),
            vec![Animator::Tile(first), Animator::Tile(second)],
        ));

        let mut walker = Walker::new(Location::ZERO, 1);
        for _ in 0..5 {
            assert!(!serial.done());
            serial.animate(&mut walker);
        }
        assert!(serial.done());
        assert_eq!(walker.location.point(), Point::new(2, -3));
    }

    #[test]
    fn turn_tile_moves_then_rotates() {
        let atlas = AnimatorAtlas::with_tile_animators();
        let mut animator = atlas
            .animator(&TileKind::SouthEast.kind())
            .expect("turn registered");
        let mut walker = Walker::new(Location::ZERO, 1);
        while !animator.done() {
            animator.animate(&mut walker);
        }
        assert_eq!(walker.location.point(), Point::new(0, TILE_SIZE));
        assert_eq!(walker.location.rotation(), -90);
    }

    #[test]
    fn baked_path_walks_on_and_off_the_board() {
        let graph = Graph::from_text("0,0\nS\nE\nS\n").expect("valid map");
        let mut atlas = AnimatorAtlas::with_tile_animators();
        let path = Kind::new("path");
        atlas
            .create_path_animator(path.clone(), &graph)
            .expect("tile animators registered");

        let baked = atlas.precalculated(&path).expect("path registered");
        let (last, _) = baked.last_location();
        // Start is one tile above the board; the trajectory ends one full
        // tile past the final path tile's pixel origin.
        assert_eq!(
            baked.location_at(0).map(|loc| loc.point()),
            Some(Point::new(0, -TILE_SIZE + 1))
        );
        assert_eq!(last.point(), Point::new(TILE_SIZE, 2 * TILE_SIZE));
    }

    #[test]
    #[should_panic(expected = "not precalculated")]
    fn precalculated_lookup_rejects_other_variants() {
        let atlas = AnimatorAtlas::with_tile_animators();
        let _ = atlas.precalculated(&TileKind::NorthNorth.kind());
    }
}
