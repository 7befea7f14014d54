//! One-shot positioned sprite effects.

use pathguard_core::{Kind, Location};
use pathguard_system_pooling::PoolItem;

use crate::asset::Sprite;
use crate::scene::Scene;

/// A sprite played once at a fixed location, then discarded.
///
/// Death and explosion visuals are effects; they come out of per-kind
/// pools and go back once their sprite completes a full cycle.
#[derive(Clone, Debug)]
pub struct SpriteEffect {
    kind: Kind,
    sprite: Sprite,
    location: Location,
    active: bool,
}

impl SpriteEffect {
    /// Creates a master effect template for a sprite.
    #[must_use]
    pub fn new(kind: Kind, sprite: Sprite) -> Self {
        Self {
            kind,
            sprite,
            location: Location::ZERO,
            active: false,
        }
    }

    /// The kind the effect's pool is keyed by.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Current playback location.
    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    /// Moves the effect to where it should play.
    pub fn move_to(&mut self, location: Location) {
        self.location = location;
    }

    /// Advances sprite playback by one tick.
    pub fn process(&mut self) {
        self.sprite.process();
    }

    /// Reports whether one full animation cycle has played.
    #[must_use]
    pub fn done(&self) -> bool {
        self.sprite.cycles() >= 1
    }

    /// Pushes the current frame's draw command.
    pub fn draw(&self, scene: &mut Scene) {
        self.sprite.draw(self.location, scene);
    }
}

impl PoolItem for SpriteEffect {
    fn init(&mut self) {
        self.sprite.restart();
        self.active = true;
    }

    fn reset(&mut self) {
        self.sprite.restart();
        self.location = Location::ZERO;
        self.active = false;
    }

    fn active(&self) -> bool {
        self.active
    }
}
