#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure earliest-intercept search for Pathguard towers.
//!
//! A tower firing a constant-speed projectile can hit a moving target at
//! tick `i` exactly when the target's predicted position `i` ticks ahead
//! lies within `i * speed` pixels of the muzzle. Rather than solving the
//! ballistic equation in closed form, the search walks the tick window
//! forward and takes the first feasible tick; the iteration count is
//! bounded by the window size.

use pathguard_core::{Location, Point, TickRange};

/// A feasible firing solution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Intercept {
    /// Ticks of projectile flight until impact.
    pub tick: i32,
    /// Predicted target location at impact.
    pub location: Location,
}

/// Finds the earliest tick in `range` at which a projectile fired from
/// `origin` at `speed` pixels per tick can meet the target.
///
/// `predict` reports the target's location `i` ticks ahead, or `None`
/// once the target will have left its trajectory; the search gives up at
/// the first unavailable prediction. `step` widens the sampling stride so
/// projectiles with a blast radius can skip redundant ticks; it is
/// clamped to at least one.
///
/// Candidates whose current position already lies outside the window's
/// outer radius are rejected without sampling.
#[must_use]
pub fn earliest_intercept(
    origin: Point,
    range: TickRange,
    speed: i32,
    step: i32,
    current: Point,
    predict: impl Fn(i32) -> Option<Location>,
) -> Option<Intercept> {
    let outer = i64::from(range.max) * i64::from(speed);
    if !current.near(origin, outer * outer) {
        return None;
    }

    let step = step.max(1);
    let mut tick = range.min.max(1);
    while tick <= range.max {
        let location = predict(tick)?;
        let reach = i64::from(tick) * i64::from(speed);
        if location.point().near(origin, reach * reach) {
            return Some(Intercept { tick, location });
        }
        tick += step;
    }
    None
}
