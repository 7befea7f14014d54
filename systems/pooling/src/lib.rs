#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Free-list object pooling for high-churn simulation entities.
//!
//! Enemies, projectiles and effects spawn and die constantly; a [`Pool`]
//! keeps pre-built instances on a free list so steady-state ticks never
//! allocate. When the free list runs dry the backing store doubles and
//! the request is served from the fresh capacity; an acquire never fails.

use std::fmt;

/// Contract a poolable entity fulfils.
pub trait PoolItem {
    /// Puts the item into a usable active state.
    ///
    /// Called every time the item is handed out, including the first.
    fn init(&mut self);

    /// Zeroes all per-use mutable state and deactivates the item.
    ///
    /// Called every time the item returns to the pool.
    fn reset(&mut self);

    /// Reports whether the item is currently in use.
    fn active(&self) -> bool;
}

/// Growable free-list pool of reusable entities.
pub struct Pool<T: PoolItem> {
    free: Vec<T>,
    capacity: usize,
    creator: Box<dyn Fn() -> T>,
}

impl<T: PoolItem> Pool<T> {
    /// Creates a pool pre-filled with `size` instances built by
    /// `creator`.
    ///
    /// A zero size is bumped to one so the first growth has something to
    /// double.
    #[must_use]
    pub fn new(size: usize, creator: impl Fn() -> T + 'static) -> Self {
        let size = size.max(1);
        let mut free = Vec::with_capacity(size);
        for _ in 0..size {
            free.push(creator());
        }
        Self {
            free,
            capacity: size,
            creator: Box::new(creator),
        }
    }

    /// Hands out an initialised item, growing the backing store when the
    /// free list is empty.
    pub fn acquire(&mut self) -> T {
        if self.free.is_empty() {
            self.grow();
        }
        let mut item = match self.free.pop() {
            Some(item) => item,
            // grow() always pushes at least one instance.
            None => (self.creator)(),
        };
        item.init();
        item
    }

    /// Resets an item and returns it to the free list.
    pub fn release(&mut self, mut item: T) {
        item.reset();
        self.free.push(item);
    }

    /// Total instances the pool has ever built.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Instances currently waiting on the free list.
    #[must_use]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    fn grow(&mut self) {
        let additional = self.capacity.max(1);
        self.free.reserve(additional);
        for _ in 0..additional {
            self.free.push((self.creator)());
        }
        self.capacity += additional;
    }
}

impl<T: PoolItem> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.capacity)
            .field("available", &self.free.len())
            .finish_non_exhaustive()
    }
}
