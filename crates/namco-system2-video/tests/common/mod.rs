#![allow(dead_code)]

use namco_system2_video::{GfxRegions, SPRITE_CELL_BYTES};

/// Character tiles where code `n` is a solid 8x8 of pixel `n`.
pub fn solid_chars(codes: u8) -> GfxRegions {
    let mut gfx = GfxRegions::default();
    for code in 0..codes {
        gfx.chars.extend(std::iter::repeat_n(code, 64));
        gfx.char_masks.extend(std::iter::repeat_n(0xFF, 8));
    }
    gfx
}

/// A 32x32 sprite cell filled with one pixel value.
pub fn solid_sprite_cell(pixel: u8) -> Vec<u8> {
    vec![pixel; SPRITE_CELL_BYTES]
}

/// Write a sprite entry into sprite RAM.
pub fn put_sprite(ram: &mut [u8], bank: usize, slot: usize, words: [u16; 4]) {
    let at = bank * 1024 + slot * 8;
    for (i, word) in words.iter().enumerate() {
        ram[at + i * 2..at + i * 2 + 2].copy_from_slice(&word.to_be_bytes());
    }
}

/// A 32x32 unscaled sprite at screen (7, 2) with the given priority and colour.
pub fn sprite_words(number: u16, priority: u16, color: u16) -> [u16; 4] {
    [
        (31 << 10) | 0x0200 | (0x1FF - 0x50),
        number << 2,
        0x50,
        (32 << 10) | (color << 4) | priority,
    ]
}
