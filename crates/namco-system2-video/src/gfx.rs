//! Pre-decoded graphics ROM regions.
//!
//! All regions are one byte per pixel. Any region may be empty: boards
//! that lack a layer simply draw nothing for it.

use crate::TRANSPARENT_PIXEL;

/// Bytes per 32x32 sprite cell.
pub const SPRITE_CELL_BYTES: usize = 32 * 32;
/// Bytes per 8x8 character tile.
pub const CHAR_TILE_BYTES: usize = 8 * 8;
/// Bytes per 8x8 ROZ tile.
pub const ROZ_TILE_BYTES: usize = 8 * 8;
/// Bytes per 8x8 1bpp character opacity mask.
const CHAR_MASK_BYTES: usize = 8;

/// Graphics data for one board.
#[derive(Debug, Clone, Default)]
pub struct GfxRegions {
    /// Sprite cells, two regions selected by the sprite's region bit.
    pub sprites: [Vec<u8>; 2],
    /// Character tiles, indexed by [`char_gfx_code`].
    pub chars: Vec<u8>,
    /// Character opacity masks, indexed by the raw tile code. Bit 7 of
    /// each row byte is the leftmost pixel.
    pub char_masks: Vec<u8>,
    /// ROZ tiles per plane.
    pub roz: [Vec<u8>; 2],
}

/// Recode a tile word's upper address bits into the character ROM order.
#[must_use]
pub const fn char_gfx_code(code: u16) -> usize {
    let code = code as usize;
    (code & 0x07FF) | ((code & 0xC000) >> 3) | ((code & 0x3800) << 2)
}

/// Cell `index` of a region, wrapping indices past the end.
fn cell(data: &[u8], index: usize, size: usize) -> Option<&[u8]> {
    let cells = data.len() / size;
    if cells == 0 {
        return None;
    }
    let start = (index % cells) * size;
    Some(&data[start..start + size])
}

impl GfxRegions {
    /// The 32x32 cell for a sprite, or `None` if the region is empty.
    #[must_use]
    pub fn sprite_cell(&self, region: usize, number: u16) -> Option<&[u8]> {
        cell(&self.sprites[region & 1], usize::from(number), SPRITE_CELL_BYTES)
    }

    /// Character pixel, or `None` where the opacity mask is clear.
    #[must_use]
    pub fn char_pixel(&self, code: u16, x: usize, y: usize) -> Option<u8> {
        let mask = cell(&self.char_masks, usize::from(code), CHAR_MASK_BYTES)?;
        if mask[y] & (0x80 >> x) == 0 {
            return None;
        }
        let tile = cell(&self.chars, char_gfx_code(code), CHAR_TILE_BYTES)?;
        Some(tile[y * 8 + x])
    }

    /// ROZ tile pixels for a plane. Missing data reads transparent.
    #[must_use]
    pub fn roz_tile(&self, plane: usize, tile: u16) -> Option<&[u8]> {
        cell(self.roz.get(plane)?, usize::from(tile), ROZ_TILE_BYTES)
    }

    /// Single ROZ pixel.
    #[must_use]
    pub fn roz_pixel(&self, plane: usize, tile: u16, x: usize, y: usize) -> u8 {
        self.roz_tile(plane, tile)
            .map_or(TRANSPARENT_PIXEL, |t| t[(y & 7) * 8 + (x & 7)])
    }
}
