//! Sprite engine.
//!
//! Sprite RAM holds 16 banks of 128 eight-byte entries. The active bank
//! comes from the sprite bank select register. Entry layout (words):
//!
//! ```text
//! w0  D15-D10 height - 1   D9 32x32 cell   D8-D0 Y (inverted)
//! w1  D15 flip Y   D14 flip X   D13 region   D12-D2 number   D1-D0 quadrant
//! w2  D9-D0 X
//! w3  D15-D10 width   D7-D4 colour   D3-D0 priority
//! ```
//!
//! Final Lap boards use the same layout with a fixed region and a 4-bit
//! priority field.

use crate::compositor::FrameBuffer;
use crate::gfx::GfxRegions;
use crate::palette::{VisibilityTracker, note_pixel};
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH, TRANSPARENT_PIXEL};

/// Size of sprite RAM in bytes.
pub const SPRITE_RAM_BYTES: usize = 0x4000;
/// Entries in one bank.
pub const SPRITES_PER_BANK: usize = 128;

const ENTRY_BYTES: usize = 8;
const BANK_BYTES: usize = SPRITES_PER_BANK * ENTRY_BYTES;

// Screen origin correction.
const X_ORIGIN: i32 = 0x50 - 0x07;
const Y_ORIGIN: i32 = 0x50 - 0x02;

/// Sprite descriptor layout variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SpriteLayout {
    /// 3-bit priority, region selected by w1 D13.
    #[default]
    Standard,
    /// 4-bit priority, region fixed.
    FinalLap,
}

impl SpriteLayout {
    const fn priority_mask(self) -> u16 {
        match self {
            Self::Standard => 0x07,
            Self::FinalLap => 0x0F,
        }
    }
}

/// One decoded sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteEntry {
    pub x: i32,
    pub y: i32,
    pub width: usize,
    pub height: usize,
    /// Native cell size: 16 or 32.
    pub native: usize,
    pub number: u16,
    pub region: usize,
    pub quadrant: u8,
    pub flip_x: bool,
    pub flip_y: bool,
    pub priority: u8,
    pub color: u8,
}

impl SpriteEntry {
    /// Decode an entry. Returns `None` for disabled slots.
    #[must_use]
    pub fn decode(words: [u16; 4], layout: SpriteLayout) -> Option<Self> {
        let [w0, w1, w2, w3] = words;
        let large = w0 & 0x0200 != 0;
        let height = usize::from((w0 >> 10) & 0x3F) + 1;
        let mut width = usize::from((w3 >> 10) & 0x3F);
        if !large {
            width >>= 1;
        }
        if height == 1 || width == 0 {
            return None;
        }

        let mut x = i32::from(w2 & 0x03FF) - X_ORIGIN;
        if x > 0x200 {
            x -= 0x400;
        }
        let mut y = (0x1FF - i32::from(w0 & 0x01FF)) - Y_ORIGIN;
        if y > 0x100 {
            y -= 0x200;
        }

        let region = match layout {
            SpriteLayout::Standard => usize::from(w1 & 0x2000 != 0),
            SpriteLayout::FinalLap => 0,
        };

        Some(Self {
            x,
            y,
            width,
            height,
            native: if large { 32 } else { 16 },
            number: (w1 >> 2) & 0x07FF,
            region,
            quadrant: (w1 & 0x03) as u8,
            flip_x: w1 & 0x4000 != 0,
            flip_y: w1 & 0x8000 != 0,
            priority: (w3 & layout.priority_mask()) as u8,
            color: ((w3 >> 4) & 0x0F) as u8,
        })
    }

    /// Top-left of the source rectangle inside the 32x32 cell.
    fn source_origin(&self) -> (usize, usize) {
        if self.native == 32 {
            (0, 0)
        } else {
            (
                usize::from(self.quadrant & 1) * 16,
                usize::from(self.quadrant >> 1) * 16,
            )
        }
    }

    fn pen(&self, pixel: u8) -> u16 {
        u16::from(self.color) * 256 + u16::from(pixel)
    }
}

fn ram_word(ram: &[u8], offset: usize) -> u16 {
    if ram.len() < 2 {
        return 0;
    }
    let offset = (offset % ram.len()) & !1;
    u16::from_be_bytes([ram[offset], ram[offset + 1]])
}

/// Sprite renderer, parameterised by the board's descriptor layout.
#[derive(Debug, Clone, Copy)]
pub struct SpriteRenderer {
    layout: SpriteLayout,
}

impl SpriteRenderer {
    #[must_use]
    pub fn new(layout: SpriteLayout) -> Self {
        Self { layout }
    }

    /// Active entries of a bank, in slot order.
    pub fn entries<'a>(&self, ram: &'a [u8], bank: u8) -> impl Iterator<Item = SpriteEntry> + 'a {
        let layout = self.layout;
        let base = usize::from(bank & 0x0F) * BANK_BYTES;
        (0..SPRITES_PER_BANK).filter_map(move |slot| {
            let at = base + slot * ENTRY_BYTES;
            let words = [
                ram_word(ram, at),
                ram_word(ram, at + 2),
                ram_word(ram, at + 4),
                ram_word(ram, at + 6),
            ];
            SpriteEntry::decode(words, layout)
        })
    }

    /// Draw every sprite at priority `level`.
    pub fn draw(
        &self,
        ram: &[u8],
        bank: u8,
        level: u8,
        flip_screen: bool,
        gfx: &GfxRegions,
        frame: &mut FrameBuffer,
    ) {
        for entry in self.entries(ram, bank).filter(|e| e.priority == level) {
            if let Some(cell) = gfx.sprite_cell(entry.region, entry.number) {
                blit(&entry, cell, flip_screen, frame);
            }
        }
    }

    /// Mark the pens of every active sprite in the bank.
    pub fn mark_visible_pens(
        &self,
        ram: &[u8],
        bank: u8,
        gfx: &GfxRegions,
        tracker: &mut VisibilityTracker,
    ) {
        for entry in self.entries(ram, bank) {
            let Some(cell) = gfx.sprite_cell(entry.region, entry.number) else {
                continue;
            };
            let (ox, oy) = entry.source_origin();
            let mut usage = [0u64; 4];
            for y in 0..entry.native {
                for &pixel in &cell[(oy + y) * 32 + ox..][..entry.native] {
                    if pixel != TRANSPARENT_PIXEL {
                        note_pixel(&mut usage, pixel);
                    }
                }
            }
            tracker.mark_usage(usize::from(entry.color) * 256, &usage);
        }
    }
}

fn blit(entry: &SpriteEntry, cell: &[u8], flip_screen: bool, frame: &mut FrameBuffer) {
    let (ox, oy) = entry.source_origin();
    let (w, h, n) = (entry.width, entry.height, entry.native);
    let (mut x0, mut y0) = (entry.x, entry.y);
    let (mut flip_x, mut flip_y) = (entry.flip_x, entry.flip_y);
    if flip_screen {
        x0 = SCREEN_WIDTH as i32 - x0 - w as i32;
        y0 = SCREEN_HEIGHT as i32 - y0 - h as i32;
        flip_x = !flip_x;
        flip_y = !flip_y;
    }

    let unscaled = w == n && h == n;
    // 16.16 source step per destination pixel.
    let step_x = (n << 16) / w;
    let step_y = (n << 16) / h;

    for dy in 0..h {
        let Some(sy) = screen_coord(y0, dy, SCREEN_HEIGHT) else {
            continue;
        };
        let mut src_y = if unscaled { dy } else { (dy * step_y) >> 16 };
        if flip_y {
            src_y = n - 1 - src_y;
        }
        let row = &cell[(oy + src_y) * 32 + ox..][..n];
        for dx in 0..w {
            let Some(sx) = screen_coord(x0, dx, SCREEN_WIDTH) else {
                continue;
            };
            let mut src_x = if unscaled { dx } else { (dx * step_x) >> 16 };
            if flip_x {
                src_x = n - 1 - src_x;
            }
            let pixel = row[src_x];
            if pixel != TRANSPARENT_PIXEL {
                frame.put(sx, sy, entry.pen(pixel));
            }
        }
    }
}

fn screen_coord(origin: i32, delta: usize, limit: usize) -> Option<usize> {
    let c = origin + delta as i32;
    (0..limit as i32).contains(&c).then_some(c as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(x: u16, y: u16, number: u16, size: u16, large: bool, prio: u16) -> [u16; 4] {
        let class = if large { 0x0200 } else { 0 };
        let width = if large { size } else { size * 2 };
        [
            ((size - 1) << 10) | class | (0x1FF - y),
            number << 2,
            x,
            (width << 10) | prio,
        ]
    }

    #[test]
    fn decode_applies_origin() {
        let entry = SpriteEntry::decode(words(0x50, 0x50, 3, 16, false, 2), SpriteLayout::Standard)
            .expect("enabled");
        assert_eq!((entry.x, entry.y), (7, 2));
        assert_eq!((entry.width, entry.height, entry.native), (16, 16, 16));
        assert_eq!(entry.number, 3);
        assert_eq!(entry.priority, 2);
    }

    #[test]
    fn zero_height_is_disabled() {
        let mut w = words(0x60, 0x60, 0, 16, false, 0);
        w[0] &= 0x03FF;
        assert!(SpriteEntry::decode(w, SpriteLayout::Standard).is_none());
    }

    #[test]
    fn final_lap_uses_four_bit_priority_and_fixed_region() {
        let mut w = words(0x60, 0x60, 0, 32, true, 0x0C);
        w[1] |= 0x2000;
        let standard = SpriteEntry::decode(w, SpriteLayout::Standard).expect("enabled");
        let final_lap = SpriteEntry::decode(w, SpriteLayout::FinalLap).expect("enabled");
        assert_eq!((standard.priority, standard.region), (4, 1));
        assert_eq!((final_lap.priority, final_lap.region), (12, 0));
    }

    #[test]
    fn positions_wrap_negative() {
        let entry = SpriteEntry::decode(words(0x3F0, 0x50, 0, 16, false, 0), SpriteLayout::Standard)
            .expect("enabled");
        assert_eq!(entry.x, 0x3F0 - X_ORIGIN - 0x400);
    }

    #[test]
    fn quadrant_selects_sixteen_pixel_corner() {
        let mut cell = vec![0u8; 1024];
        cell[16 * 32 + 16] = 9;
        let mut w = words(0x50, 0x50, 0, 16, false, 0);
        w[1] |= 3;
        let entry = SpriteEntry::decode(w, SpriteLayout::Standard).expect("enabled");
        let mut frame = FrameBuffer::new();
        blit(&entry, &cell, false, &mut frame);
        assert_eq!(frame.pen(7, 2), 9);
    }

    #[test]
    fn scaling_down_skips_source_pixels() {
        let mut cell = vec![TRANSPARENT_PIXEL; 1024];
        cell[0] = 4;
        cell[2] = 5;
        let entry = SpriteEntry::decode(words(0x50, 0x50, 0, 16, true, 0), SpriteLayout::Standard)
            .expect("enabled");
        assert_eq!((entry.width, entry.native), (16, 32));
        let mut frame = FrameBuffer::new();
        blit(&entry, &cell, false, &mut frame);
        assert_eq!(frame.pen(7, 2), 4);
        assert_eq!(frame.pen(8, 2), 5);
        assert_eq!(frame.pen(7, 3), 0);
    }

    #[test]
    fn scaling_up_repeats_rows() {
        let mut cell = vec![TRANSPARENT_PIXEL; 1024];
        cell[0] = 4;
        // 16x16 cell drawn 16 wide and 32 tall.
        let w = [(31 << 10) | (0x1FF - 0x50), 0, 0x50, 32 << 10];
        let entry = SpriteEntry::decode(w, SpriteLayout::Standard).expect("enabled");
        assert_eq!((entry.width, entry.height), (16, 32));
        let mut frame = FrameBuffer::new();
        blit(&entry, &cell, false, &mut frame);
        assert_eq!(frame.pen(7, 2), 4);
        assert_eq!(frame.pen(7, 3), 4);
        assert_eq!(frame.pen(7, 4), 0);
    }

    #[test]
    fn flip_x_mirrors_source() {
        let mut cell = vec![TRANSPARENT_PIXEL; 1024];
        cell[0] = 6;
        let mut w = words(0x50, 0x50, 0, 32, true, 0);
        w[1] |= 0x4000;
        let entry = SpriteEntry::decode(w, SpriteLayout::Standard).expect("enabled");
        let mut frame = FrameBuffer::new();
        blit(&entry, &cell, false, &mut frame);
        assert_eq!(frame.pen(7 + 31, 2), 6);
        assert_eq!(frame.pen(7, 2), 0);
    }
}
