#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic cadence-driven spawning for Pathguard.
//!
//! A [`Round`] releases queued items one at a time with a fixed tick
//! delay between releases; a [`WaveSpawner`] chains rounds and advances
//! to the next one only when the current round is exhausted. Both are
//! generic over the emitted item so the engine can spawn enemy kinds
//! while tests spawn plain markers.

use std::collections::VecDeque;

use pathguard_core::Ticker;

/// An ordered batch of items released on a fixed tick cadence.
#[derive(Clone, Debug)]
pub struct Round<T> {
    pending: VecDeque<T>,
    delay: Ticker,
}

impl<T> Round<T> {
    /// Creates a round that releases one queued item every `delay`
    /// ticks.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = T>, delay: i32) -> Self {
        Self {
            pending: items.into_iter().collect(),
            delay: Ticker::new(delay),
        }
    }

    /// Advances the release delay by one tick.
    pub fn process(&mut self) {
        let _ = self.delay.tick();
    }

    /// Releases the next item when the delay has elapsed, restarting the
    /// delay for the item after it.
    pub fn spawn(&mut self) -> Option<T> {
        if !self.delay.done() {
            return None;
        }
        let item = self.pending.pop_front()?;
        self.delay.reset();
        Some(item)
    }

    /// Reports whether every queued item has been released.
    #[must_use]
    pub fn done(&self) -> bool {
        self.pending.is_empty()
    }

    /// Items still waiting for release.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Borrows the queued items in release order.
    pub fn pending(&self) -> impl Iterator<Item = &T> {
        self.pending.iter()
    }
}

/// Chains rounds into waves, idle until explicitly started.
#[derive(Clone, Debug)]
pub struct WaveSpawner<T> {
    rounds: VecDeque<Round<T>>,
    current: Option<Round<T>>,
    started: bool,
}

impl<T> Default for WaveSpawner<T> {
    fn default() -> Self {
        Self::new([])
    }
}

impl<T> WaveSpawner<T> {
    /// Creates a spawner over the provided rounds.
    #[must_use]
    pub fn new(rounds: impl IntoIterator<Item = Round<T>>) -> Self {
        Self {
            rounds: rounds.into_iter().collect(),
            current: None,
            started: false,
        }
    }

    /// Appends a round after the existing ones.
    pub fn push_round(&mut self, round: Round<T>) {
        self.rounds.push_back(round);
    }

    /// Begins releasing rounds; a spawner never emits before this.
    pub fn start(&mut self) {
        self.started = true;
    }

    /// Advances cadence by one tick, promoting the next round when the
    /// current one is exhausted.
    pub fn process(&mut self) {
        if !self.started {
            return;
        }
        if self.current.as_ref().is_none_or(Round::done) {
            self.current = self.rounds.pop_front();
        }
        if let Some(round) = &mut self.current {
            round.process();
        }
    }

    /// Releases the current round's next item when its delay allows.
    pub fn spawn(&mut self) -> Option<T> {
        if !self.started {
            return None;
        }
        self.current.as_mut()?.spawn()
    }

    /// Reports whether every round has been fully released.
    #[must_use]
    pub fn done(&self) -> bool {
        self.rounds.is_empty() && self.current.as_ref().is_none_or(Round::done)
    }
}
