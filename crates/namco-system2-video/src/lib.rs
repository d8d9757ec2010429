//! Namco System 2 graphics board.
//!
//! The board composites up to six character-based tile layers, 128
//! hardware sprites from a bank-selected slice of sprite RAM, and one or
//! two rotate/zoom (ROZ) planes into a 288x224 frame. Each element carries
//! a priority code; the compositor walks the levels in order so later
//! levels occlude earlier ones.
//!
//! Palette RAM holds 8192 pens. Sprites and ROZ share pens 0x0000-0x0FFF
//! (selected by a colour bank), tile layers use 0x1000-0x1FFF.
//!
//! The crate owns the board-side state (tile VRAM, palette RAM, control
//! registers) and borrows sprite RAM and ROZ RAM from the machine for each
//! frame, so a single owner keeps the buffers the CPUs write into.

mod compositor;
mod gfx;
mod palette;
mod roz;
mod sprite;
mod tilemap;
mod video;

pub use compositor::{ComposeState, Compositor, FrameBuffer};
pub use gfx::{CHAR_TILE_BYTES, GfxRegions, ROZ_TILE_BYTES, SPRITE_CELL_BYTES, char_gfx_code};
pub use palette::{PALETTE_RAM_BYTES, Palette, VisibilityTracker};
pub use roz::{RozControl, RozGeometry, RozPlane, RozPrioritySource};
pub use sprite::{SPRITE_RAM_BYTES, SPRITES_PER_BANK, SpriteEntry, SpriteLayout};
pub use tilemap::{LAYER_COUNT, LayerKind, TileLayer, TilemapManager, VRAM_WORDS};
pub use video::{SpriteBankSelect, System2Video, VideoConfig};

/// Visible frame width in pixels.
pub const SCREEN_WIDTH: usize = 288;
/// Visible frame height in pixels.
pub const SCREEN_HEIGHT: usize = 224;
/// Number of palette entries.
pub const PEN_COUNT: usize = 8192;
/// Sprite and ROZ pixel value that is never drawn.
pub const TRANSPARENT_PIXEL: u8 = 0xFF;

/// Screen orientation as mounted in the cabinet.
///
/// Applied once to the composed frame when pens are resolved to colours,
/// so every layer turns together. The board's own flip bit is separate and
/// handled by each drawer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Orientation {
    pub flip_x: bool,
    pub flip_y: bool,
    /// Rotate 90 degrees: hardware rows become screen columns.
    pub swap_xy: bool,
}

impl Orientation {
    /// Combine with a 180 degree screen flip.
    #[must_use]
    pub const fn flipped(self, flip: bool) -> Self {
        Self {
            flip_x: self.flip_x ^ flip,
            flip_y: self.flip_y ^ flip,
            swap_xy: self.swap_xy,
        }
    }

    /// Width and height of the frame as shown.
    #[must_use]
    pub const fn output_size(self) -> (usize, usize) {
        if self.swap_xy {
            (SCREEN_HEIGHT, SCREEN_WIDTH)
        } else {
            (SCREEN_WIDTH, SCREEN_HEIGHT)
        }
    }

    /// Screen position of hardware pixel (`x`, `y`). Flips apply in
    /// hardware coordinates, then the axes swap.
    #[must_use]
    pub const fn apply(self, x: usize, y: usize) -> (usize, usize) {
        let x = if self.flip_x { SCREEN_WIDTH - 1 - x } else { x };
        let y = if self.flip_y { SCREEN_HEIGHT - 1 - y } else { y };
        if self.swap_xy { (y, x) } else { (x, y) }
    }
}
