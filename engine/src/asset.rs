//! Drawable asset handles and the asset atlas.
//!
//! The engine never decodes pixels. An asset is sprite-sheet metadata
//! plus a frame cursor; drawing pushes an abstract command naming the
//! sheet and frame, and whatever renders the scene resolves those to
//! images.

use std::collections::HashMap;

use pathguard_core::{Kind, Location, TileKind, Ticker};

use crate::scene::{DrawCommand, Scene};

/// Sprite-sheet metadata shared by every instance of a sprite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpriteSheet {
    sheet: Kind,
    frames: i32,
    delay: i32,
    frame_width: i32,
}

impl SpriteSheet {
    /// Creates sheet metadata for `frames` frames of `frame_width`
    /// pixels shown for `delay` ticks each.
    #[must_use]
    pub fn new(sheet: Kind, frames: i32, delay: i32, frame_width: i32) -> Self {
        Self {
            sheet,
            frames: frames.max(1),
            delay: delay.max(1),
            frame_width,
        }
    }

    /// Kind naming the sheet image.
    #[must_use]
    pub fn sheet(&self) -> &Kind {
        &self.sheet
    }

    /// Number of frames on the sheet.
    #[must_use]
    pub const fn frames(&self) -> i32 {
        self.frames
    }

    /// Width of one frame in pixels.
    #[must_use]
    pub const fn frame_width(&self) -> i32 {
        self.frame_width
    }
}

/// Fixed image drawn the same way every tick.
#[derive(Clone, Debug)]
pub struct StaticAsset {
    sheet: Kind,
}

impl StaticAsset {
    /// Creates a static asset naming a sheet image.
    #[must_use]
    pub fn new(sheet: Kind) -> Self {
        Self { sheet }
    }

    /// Pushes the draw command for this asset at a location.
    pub fn draw(&self, location: Location, scene: &mut Scene) {
        scene.push(DrawCommand::Sprite {
            sheet: self.sheet.clone(),
            frame: 0,
            location,
        });
    }
}

/// Animated sprite with a per-instance frame cursor.
#[derive(Clone, Debug)]
pub struct Sprite {
    sheet: SpriteSheet,
    ticker: Ticker,
    frame: i32,
    cycles: i32,
}

impl Sprite {
    /// Creates a sprite at frame zero.
    #[must_use]
    pub fn new(sheet: SpriteSheet) -> Self {
        let ticker = Ticker::new(sheet.delay);
        Self {
            sheet,
            ticker,
            frame: 0,
            cycles: 0,
        }
    }

    /// The sheet metadata backing this sprite.
    #[must_use]
    pub fn sheet(&self) -> &SpriteSheet {
        &self.sheet
    }

    /// Frame currently shown.
    #[must_use]
    pub const fn frame(&self) -> i32 {
        self.frame
    }

    /// Full animation cycles completed since the last restart.
    #[must_use]
    pub const fn cycles(&self) -> i32 {
        self.cycles
    }

    /// Advances the frame timer by one tick, wrapping at the last frame.
    pub fn process(&mut self) {
        if !self.ticker.tick() {
            return;
        }
        self.ticker.reset();
        self.frame += 1;
        if self.frame >= self.sheet.frames {
            self.frame = 0;
            self.cycles += 1;
        }
    }

    /// Rewinds to frame zero with no completed cycles.
    pub fn restart(&mut self) {
        self.ticker.reset();
        self.frame = 0;
        self.cycles = 0;
    }

    /// Pushes the draw command for the current frame at a location.
    pub fn draw(&self, location: Location, scene: &mut Scene) {
        scene.push(DrawCommand::Sprite {
            sheet: self.sheet.sheet.clone(),
            frame: self.frame,
            location,
        });
    }
}

/// Closed set of drawable asset variants.
#[derive(Clone, Debug)]
pub enum Asset {
    /// Fixed image.
    Static(StaticAsset),
    /// Animated sprite.
    Sprite(Sprite),
}

impl Asset {
    /// Advances animation state; static assets are untouched.
    pub fn process(&mut self) {
        if let Self::Sprite(sprite) = self {
            sprite.process();
        }
    }

    /// Pushes the asset's draw command at a location.
    pub fn draw(&self, location: Location, scene: &mut Scene) {
        match self {
            Self::Static(fixed) => fixed.draw(location, scene),
            Self::Sprite(sprite) => sprite.draw(location, scene),
        }
    }
}

/// Registry of master assets keyed by [`Kind`].
#[derive(Clone, Debug, Default)]
pub struct AssetAtlas {
    assets: HashMap<Kind, Asset>,
}

impl AssetAtlas {
    /// Creates an empty atlas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a master asset under a kind.
    pub fn register(&mut self, kind: Kind, asset: Asset) {
        let _ = self.assets.insert(kind, asset);
    }

    /// Hands out a clone of the asset registered under `kind`.
    #[must_use]
    pub fn asset(&self, kind: &Kind) -> Option<Asset> {
        self.assets.get(kind).cloned()
    }

    /// Hands out a clone of the sprite registered under `kind`.
    ///
    /// # Panics
    ///
    /// Panics when the registered asset is the static variant; that
    /// signals a construction-order bug, not bad input.
    #[must_use]
    pub fn sprite(&self, kind: &Kind) -> Option<Sprite> {
        self.assets.get(kind).map(|asset| match asset {
            Asset::Sprite(sprite) => sprite.clone(),
            Asset::Static(_) => panic!("asset {kind} is static, not a sprite"),
        })
    }

    /// The filler asset drawn for tiles outside the path.
    #[must_use]
    pub fn blank(&self) -> Asset {
        self.asset(&TileKind::Blank.kind())
            .unwrap_or_else(|| Asset::Static(StaticAsset::new(TileKind::Blank.kind())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathguard_core::Point;

    fn sheet(frames: i32, delay: i32) -> SpriteSheet {
        SpriteSheet::new(Kind::new("boom"), frames, delay, 32)
    }

    #[test]
    fn sprite_advances_frames_on_the_sheet_delay() {
        let mut sprite = Sprite::new(sheet(3, 2));
        assert_eq!(sprite.frame(), 0);
        sprite.process();
        assert_eq!(sprite.frame(), 0);
        sprite.process();
        assert_eq!(sprite.frame(), 1);
    }

    #[test]
    fn sprite_counts_completed_cycles() {
        let mut sprite = Sprite::new(sheet(2, 1));
        assert_eq!(sprite.cycles(), 0);
        sprite.process();
        sprite.process();
        assert_eq!(sprite.cycles(), 1);
        sprite.restart();
        assert_eq!(sprite.cycles(), 0);
        assert_eq!(sprite.frame(), 0);
    }

    #[test]
    fn draw_names_the_sheet_and_frame() {
        let mut sprite = Sprite::new(sheet(4, 1));
        sprite.process();
        let mut scene = Scene::new();
        sprite.draw(Location::new(Point::new(8, 8), 0), &mut scene);
        assert_eq!(
            scene.commands(),
            &[DrawCommand::Sprite {
                sheet: Kind::new("boom"),
                frame: 1,
                location: Location::new(Point::new(8, 8), 0),
            }]
        );
    }

    #[test]
    #[should_panic(expected = "not a sprite")]
    fn sprite_lookup_rejects_static_assets() {
        let mut atlas = AssetAtlas::new();
        atlas.register(
            Kind::new("wall"),
            Asset::Static(StaticAsset::new(Kind::new("wall"))),
        );
        let _ = atlas.sprite(&Kind::new("wall"));
    }
}
