//! Rotate/zoom background plane.
//!
//! The plane is a square map of 8x8 tiles in ROZ RAM (one word per tile,
//! row-major). Eight control words describe an affine walk through it:
//!
//! | Word | Contents                        |
//! |------|---------------------------------|
//! | 0    | down dy (8.8)                   |
//! | 1    | right dy (8.8)                  |
//! | 2    | down dx (8.8)                   |
//! | 3    | right dx (8.8)                  |
//! | 4    | start Y (12.4)                  |
//! | 5    | start X (12.4)                  |
//! | 7    | control, D14-D12 plane priority |
//!
//! Coordinates accumulate in 16.16 and wrap at the plane's extent, so the
//! source is a torus.

use crate::compositor::FrameBuffer;
use crate::gfx::GfxRegions;
use crate::palette::{VisibilityTracker, note_pixel};
use crate::{Orientation, SCREEN_HEIGHT, SCREEN_WIDTH, TRANSPARENT_PIXEL};

/// Size of a ROZ tile map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RozGeometry {
    tiles_per_side: usize,
}

impl RozGeometry {
    /// 256x256 tiles, the standard board.
    pub const STANDARD: Self = Self {
        tiles_per_side: 256,
    };

    /// Geometry for a square map of `ram_bytes` of tile words.
    #[must_use]
    pub fn from_ram_bytes(ram_bytes: usize) -> Option<Self> {
        let tiles = ram_bytes / 2;
        let side = tiles.isqrt();
        (side * side == tiles && side.is_power_of_two()).then_some(Self {
            tiles_per_side: side,
        })
    }

    #[must_use]
    pub fn tiles_per_side(self) -> usize {
        self.tiles_per_side
    }

    /// Width and height of the source plane in pixels.
    #[must_use]
    pub fn extent(self) -> usize {
        self.tiles_per_side * 8
    }

    #[must_use]
    pub fn ram_bytes(self) -> usize {
        self.tiles_per_side * self.tiles_per_side * 2
    }
}

/// Where a plane takes its priority from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RozPrioritySource {
    /// D14-D12 of the sprite bank select register.
    #[default]
    BankRegister,
    /// D14-D12 of the plane's own control word.
    ControlWord,
}

/// The eight ROZ control registers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RozControl {
    regs: [u16; 8],
}

impl RozControl {
    #[must_use]
    pub fn read(&self, index: usize) -> u16 {
        self.regs[index & 7]
    }

    pub fn write(&mut self, index: usize, value: u16) {
        self.regs[index & 7] = value;
    }

    fn delta(&self, index: usize) -> i32 {
        i32::from(self.regs[index] as i16) << 8
    }

    fn start(&self, index: usize) -> i32 {
        i32::from(self.regs[index] as i16) << 12
    }

    /// Start X in 16.16.
    #[must_use]
    pub fn start_x(&self) -> i32 {
        self.start(5)
    }

    /// Start Y in 16.16.
    #[must_use]
    pub fn start_y(&self) -> i32 {
        self.start(4)
    }

    #[must_use]
    pub fn right_dx(&self) -> i32 {
        self.delta(3)
    }

    #[must_use]
    pub fn right_dy(&self) -> i32 {
        self.delta(1)
    }

    #[must_use]
    pub fn down_dx(&self) -> i32 {
        self.delta(2)
    }

    #[must_use]
    pub fn down_dy(&self) -> i32 {
        self.delta(0)
    }

    /// Priority bits of the control word.
    #[must_use]
    pub fn priority(&self) -> u8 {
        ((self.regs[7] >> 12) & 0x07) as u8
    }
}

/// One ROZ plane: its control block and map geometry.
#[derive(Debug, Clone)]
pub struct RozPlane {
    pub control: RozControl,
    geometry: RozGeometry,
    /// Index into [`GfxRegions::roz`].
    gfx: usize,
}

impl RozPlane {
    #[must_use]
    pub fn new(geometry: RozGeometry, gfx: usize) -> Self {
        Self {
            control: RozControl::default(),
            geometry,
            gfx,
        }
    }

    #[must_use]
    pub fn geometry(&self) -> RozGeometry {
        self.geometry
    }

    /// Walk every screen pixel, calling `visit(screen_x, screen_y, src_x,
    /// src_y)` with wrapped source coordinates in pixels.
    ///
    /// Hardware scan order is kept: with `swap_xy` the hardware raster runs
    /// down screen columns.
    pub fn scan(&self, orientation: Orientation, mut visit: impl FnMut(usize, usize, usize, usize)) {
        let ctrl = &self.control;
        let mask = self.geometry.extent() - 1;
        let (hw_width, hw_height) = if orientation.swap_xy {
            (SCREEN_HEIGHT, SCREEN_WIDTH)
        } else {
            (SCREEN_WIDTH, SCREEN_HEIGHT)
        };
        let (right_dx, right_dy) = (ctrl.right_dx(), ctrl.right_dy());
        let (down_dx, down_dy) = (ctrl.down_dx(), ctrl.down_dy());

        let mut row_x = ctrl.start_x();
        let mut row_y = ctrl.start_y();
        for hy in 0..hw_height {
            let (mut cx, mut cy) = (row_x, row_y);
            for hx in 0..hw_width {
                let (mut sx, mut sy) = if orientation.swap_xy { (hy, hx) } else { (hx, hy) };
                if orientation.flip_x {
                    sx = SCREEN_WIDTH - 1 - sx;
                }
                if orientation.flip_y {
                    sy = SCREEN_HEIGHT - 1 - sy;
                }
                visit(sx, sy, ((cx >> 16) as usize) & mask, ((cy >> 16) as usize) & mask);
                cx = cx.wrapping_add(right_dx);
                cy = cy.wrapping_add(right_dy);
            }
            row_x = row_x.wrapping_add(down_dx);
            row_y = row_y.wrapping_add(down_dy);
        }
    }

    /// Tile word at source pixel (`x`, `y`). Short or empty RAM wraps.
    #[must_use]
    pub fn tile_at(&self, ram: &[u8], x: usize, y: usize) -> u16 {
        let index = (y >> 3) * self.geometry.tiles_per_side() + (x >> 3);
        tile_word(ram, index)
    }

    /// Draw the plane with colour bank `color`.
    pub fn draw(
        &self,
        ram: &[u8],
        color: u8,
        orientation: Orientation,
        gfx: &GfxRegions,
        frame: &mut FrameBuffer,
    ) {
        if gfx.roz.get(self.gfx).is_none_or(Vec::is_empty) {
            return;
        }
        let base = u16::from(color & 0x0F) * 256;
        self.scan(orientation, |sx, sy, x, y| {
            let tile = self.tile_at(ram, x, y);
            let pixel = gfx.roz_pixel(self.gfx, tile, x, y);
            if pixel != TRANSPARENT_PIXEL {
                frame.put(sx, sy, base + u16::from(pixel));
            }
        });
    }

    /// Mark the pens of every source tile the scan reaches.
    ///
    /// Replays the addressing without touching the frame; each reachable
    /// tile is decoded once.
    pub fn mark_visible_pens(
        &self,
        ram: &[u8],
        color: u8,
        orientation: Orientation,
        gfx: &GfxRegions,
        tracker: &mut VisibilityTracker,
    ) {
        if gfx.roz.get(self.gfx).is_none_or(Vec::is_empty) {
            return;
        }
        let side = self.geometry.tiles_per_side();
        let mut reached = vec![0u64; (side * side).div_ceil(64)];
        self.scan(orientation, |_, _, x, y| {
            let cell = (y >> 3) * side + (x >> 3);
            reached[cell >> 6] |= 1 << (cell & 63);
        });

        let mut usage = [0u64; 4];
        for (word, &bits) in reached.iter().enumerate() {
            let mut bits = bits;
            while bits != 0 {
                let cell = word * 64 + bits.trailing_zeros() as usize;
                bits &= bits - 1;
                if let Some(pixels) = gfx.roz_tile(self.gfx, tile_word(ram, cell)) {
                    for &pixel in pixels {
                        if pixel != TRANSPARENT_PIXEL {
                            note_pixel(&mut usage, pixel);
                        }
                    }
                }
            }
        }
        tracker.mark_usage(usize::from(color & 0x0F) * 256, &usage);
    }
}

fn tile_word(ram: &[u8], index: usize) -> u16 {
    if ram.len() < 2 {
        return 0;
    }
    let offset = ((index * 2) % ram.len()) & !1;
    u16::from_be_bytes([ram[offset], ram[offset + 1]])
}
