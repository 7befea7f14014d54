//! Abstract draw interface between the simulation and a renderer.
//!
//! The engine never touches pixels: a draw pass pushes [`DrawCommand`]s
//! into a [`Scene`] in back-to-front order and the host renders or
//! inspects them. Debug overlays are requested per draw call through
//! [`DrawOptions`] rather than a process-wide toggle.

use pathguard_core::{Kind, Location, Point};

/// One renderer-agnostic drawing instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawCommand {
    /// Draw one frame of a sheet at a location.
    Sprite {
        /// Kind naming the sheet image.
        sheet: Kind,
        /// Zero-based frame index on the sheet.
        frame: i32,
        /// Pixel location and rotation to draw at.
        location: Location,
    },
    /// Debug overlay: a tower's outer intercept radius.
    RangeCircle {
        /// Pixel centre of the circle.
        centre: Point,
        /// Radius in pixels.
        radius: i32,
    },
    /// Debug overlay: the tile grid.
    GridOverlay {
        /// Grid width in tiles.
        width: i32,
        /// Grid height in tiles.
        height: i32,
    },
}

/// Per-draw configuration threaded through every draw call.
#[derive(Clone, Copy, Debug, Default)]
pub struct DrawOptions {
    /// Emit the tile grid and tower range overlays.
    pub grid: bool,
}

/// Ordered collection of draw commands for one frame.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a command; later commands draw on top of earlier ones.
    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// The commands accumulated so far, in draw order.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Empties the scene for the next frame.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}
