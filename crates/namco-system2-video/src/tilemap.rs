//! Character tile layers.
//!
//! Four 64x64 scrolling layers live in the first 32 KiB of tile VRAM, one
//! 4096-word block each. Two fixed 36x28 text layers follow at word
//! offsets 0x4008 and 0x4408. Each layer keeps a decoded pen cache that is
//! only refreshed for tiles marked dirty.
//!
//! Video control registers (word index):
//!
//! | Index        | Function                                  |
//! |--------------|-------------------------------------------|
//! | 1, 5, 9, 13  | scroll X for layers 0-3 (layer 0 D15: flip) |
//! | 3, 7, 11, 15 | scroll Y for layers 0-3                   |
//! | 0x10-0x15    | priority for layers 0-5                   |
//! | 0x18-0x1D    | colour bank for layers 0-5                |

use crate::compositor::FrameBuffer;
use crate::gfx::GfxRegions;
use crate::palette::{VisibilityTracker, note_pixel};
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Number of tile layers.
pub const LAYER_COUNT: usize = 6;
/// Tile VRAM size in 16-bit words.
pub const VRAM_WORDS: usize = 0x1_0000;

const SCROLL_LAYER_WORDS: usize = 0x1000;
const FIXED_LAYER_BASE: [usize; 2] = [0x4008, 0x4408];
const TILE_PEN_BASE: usize = 0x1000;
const NO_PEN: u16 = u16::MAX;

// Per-layer screen origin corrections.
const SCROLL_X_ORIGIN: [i32; 4] = [48, 46, 45, 44];
const SCROLL_Y_ORIGIN: i32 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    /// 64x64 tiles, scrollable.
    Scroll,
    /// 36x28 tiles, fixed to the screen.
    Fixed,
}

/// Bitmap of tiles needing a re-decode.
#[derive(Debug, Clone)]
struct DirtyMap {
    words: Vec<u64>,
    count: usize,
}

impl DirtyMap {
    fn all(tiles: usize) -> Self {
        let mut map = Self {
            words: vec![0; tiles.div_ceil(64)],
            count: 0,
        };
        for tile in 0..tiles {
            map.set(tile);
        }
        map
    }

    fn set(&mut self, tile: usize) {
        let bit = 1u64 << (tile & 63);
        let word = &mut self.words[tile >> 6];
        if *word & bit == 0 {
            *word |= bit;
            self.count += 1;
        }
    }

    fn get(&self, tile: usize) -> bool {
        self.words[tile >> 6] & (1u64 << (tile & 63)) != 0
    }

    fn take(&mut self) -> Vec<usize> {
        let mut tiles = Vec::with_capacity(self.count);
        for (index, word) in self.words.iter_mut().enumerate() {
            let mut bits = *word;
            while bits != 0 {
                tiles.push(index * 64 + bits.trailing_zeros() as usize);
                bits &= bits - 1;
            }
            *word = 0;
        }
        self.count = 0;
        tiles
    }
}

fn vram_index(layer: usize, tile: usize) -> usize {
    match layer {
        0..=3 => layer * SCROLL_LAYER_WORDS + tile,
        _ => FIXED_LAYER_BASE[layer - 4] + tile,
    }
}

/// One tile layer and its decoded cache.
#[derive(Debug, Clone)]
pub struct TileLayer {
    kind: LayerKind,
    cols: usize,
    rows: usize,
    scroll_x: u16,
    scroll_y: u16,
    color_bank: u8,
    priority: u8,
    flip: bool,
    dirty: DirtyMap,
    /// Decoded pens, `cols * 8` by `rows * 8`, in screen (flipped) order.
    cache: Vec<u16>,
    /// Raw pixel values present in each tile, by tile index.
    usage: Vec<[u64; 4]>,
}

impl TileLayer {
    fn new(kind: LayerKind) -> Self {
        let (cols, rows) = match kind {
            LayerKind::Scroll => (64, 64),
            LayerKind::Fixed => (36, 28),
        };
        Self {
            kind,
            cols,
            rows,
            scroll_x: 0,
            scroll_y: 0,
            color_bank: 0,
            priority: 0,
            flip: false,
            dirty: DirtyMap::all(cols * rows),
            cache: vec![NO_PEN; cols * rows * 64],
            usage: vec![[0; 4]; cols * rows],
        }
    }

    #[must_use]
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.cols * self.rows
    }

    #[must_use]
    pub fn priority(&self) -> u8 {
        self.priority
    }

    #[must_use]
    pub fn color_bank(&self) -> u8 {
        self.color_bank
    }

    #[must_use]
    pub fn scroll(&self) -> (u16, u16) {
        (self.scroll_x, self.scroll_y)
    }

    #[must_use]
    pub fn is_dirty(&self, tile: usize) -> bool {
        self.dirty.get(tile % self.tile_count())
    }

    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty.count
    }

    fn width(&self) -> usize {
        self.cols * 8
    }

    fn height(&self) -> usize {
        self.rows * 8
    }

    fn invalidate(&mut self) {
        self.dirty = DirtyMap::all(self.tile_count());
    }

    /// Cache pixel shown at screen (0, 0).
    fn origin(&self, layer: usize) -> (usize, usize) {
        let (x, y) = match self.kind {
            LayerKind::Scroll => (
                i32::from(self.scroll_x) + SCROLL_X_ORIGIN[layer],
                i32::from(self.scroll_y) + SCROLL_Y_ORIGIN,
            ),
            LayerKind::Fixed => (0, 0),
        };
        let (w, h) = (self.width() as i32, self.height() as i32);
        let (x, y) = if self.flip {
            (w - SCREEN_WIDTH as i32 - x, h - SCREEN_HEIGHT as i32 - y)
        } else {
            (x, y)
        };
        (x.rem_euclid(w) as usize, y.rem_euclid(h) as usize)
    }

    fn decode(&mut self, tile: usize, code: u16, gfx: &GfxRegions) {
        let (col, row) = (tile % self.cols, tile / self.cols);
        let (cx, cy) = if self.flip {
            (self.cols - 1 - col, self.rows - 1 - row)
        } else {
            (col, row)
        };
        let base = TILE_PEN_BASE + usize::from(self.color_bank) * 256;
        let width = self.width();
        let mut usage = [0u64; 4];
        for y in 0..8 {
            for x in 0..8 {
                let pen = match gfx.char_pixel(code, x, y) {
                    Some(pixel) => {
                        note_pixel(&mut usage, pixel);
                        (base + usize::from(pixel)) as u16
                    }
                    None => NO_PEN,
                };
                let (px, py) = if self.flip { (7 - x, 7 - y) } else { (x, y) };
                self.cache[(cy * 8 + py) * width + cx * 8 + px] = pen;
            }
        }
        self.usage[tile] = usage;
    }

    /// Tile index covering cache cell (`cx`, `cy`).
    fn tile_at_cell(&self, cx: usize, cy: usize) -> usize {
        let (col, row) = if self.flip {
            (self.cols - 1 - cx, self.rows - 1 - cy)
        } else {
            (cx, cy)
        };
        row * self.cols + col
    }
}

/// Owner of tile VRAM, the video control registers and the six layers.
pub struct TilemapManager {
    vram: Vec<u16>,
    control: [u16; 0x20],
    layers: [TileLayer; LAYER_COUNT],
    flip: bool,
    priority_mask: u8,
    decoded: u64,
}

impl TilemapManager {
    /// `priority_levels` is 8 or 16 depending on the board.
    #[must_use]
    pub fn new(priority_levels: u8) -> Self {
        Self {
            vram: vec![0; VRAM_WORDS],
            control: [0; 0x20],
            layers: [
                TileLayer::new(LayerKind::Scroll),
                TileLayer::new(LayerKind::Scroll),
                TileLayer::new(LayerKind::Scroll),
                TileLayer::new(LayerKind::Scroll),
                TileLayer::new(LayerKind::Fixed),
                TileLayer::new(LayerKind::Fixed),
            ],
            flip: false,
            priority_mask: priority_levels.saturating_sub(1),
            decoded: 0,
        }
    }

    #[must_use]
    pub fn layer(&self, index: usize) -> &TileLayer {
        &self.layers[index % LAYER_COUNT]
    }

    #[must_use]
    pub fn flip(&self) -> bool {
        self.flip
    }

    /// Tiles decoded since construction.
    #[must_use]
    pub fn decoded_tiles(&self) -> u64 {
        self.decoded
    }

    #[must_use]
    pub fn read_vram(&self, word: usize) -> u16 {
        self.vram[word % VRAM_WORDS]
    }

    /// CPU write into tile VRAM. Words inside a layer go through
    /// [`TilemapManager::write_tile_word`]; the gaps are plain storage.
    pub fn write_vram(&mut self, word: usize, value: u16) {
        let word = word % VRAM_WORDS;
        if word < 4 * SCROLL_LAYER_WORDS {
            self.write_tile_word(word / SCROLL_LAYER_WORDS, word % SCROLL_LAYER_WORDS, value);
            return;
        }
        for (i, &base) in FIXED_LAYER_BASE.iter().enumerate() {
            let layer = 4 + i;
            if (base..base + self.layers[layer].tile_count()).contains(&word) {
                self.write_tile_word(layer, word - base, value);
                return;
            }
        }
        self.vram[word] = value;
    }

    /// Store a tile code and mark the tile dirty if it changed.
    pub fn write_tile_word(&mut self, layer: usize, tile: usize, value: u16) {
        let layer = layer % LAYER_COUNT;
        let tile = tile % self.layers[layer].tile_count();
        let index = vram_index(layer, tile);
        if self.vram[index] == value {
            return;
        }
        self.vram[index] = value;
        self.layers[layer].dirty.set(tile);
    }

    /// Change a layer's colour bank; repaints the layer only on change.
    pub fn set_color_bank(&mut self, layer: usize, bank: u8) {
        let layer = &mut self.layers[layer % LAYER_COUNT];
        if layer.color_bank != bank {
            layer.color_bank = bank;
            layer.invalidate();
        }
    }

    /// Flip the whole screen 180 degrees.
    pub fn set_global_flip(&mut self, flip: bool) {
        if self.flip == flip {
            return;
        }
        self.flip = flip;
        for layer in &mut self.layers {
            layer.flip = flip;
            layer.invalidate();
        }
    }

    #[must_use]
    pub fn read_control(&self, index: usize) -> u16 {
        self.control[index & 0x1F]
    }

    pub fn write_control(&mut self, index: usize, value: u16) {
        let index = index & 0x1F;
        self.control[index] = value;
        match index {
            0x01 | 0x05 | 0x09 | 0x0D => {
                let layer = index / 4;
                self.layers[layer].scroll_x = value & 0x0FFF;
                if layer == 0 {
                    self.set_global_flip(value & 0x8000 != 0);
                }
            }
            0x03 | 0x07 | 0x0B | 0x0F => self.layers[index / 4].scroll_y = value & 0x0FFF,
            0x10..=0x15 => {
                self.layers[index - 0x10].priority = (value as u8) & self.priority_mask;
            }
            0x18..=0x1D => self.set_color_bank(index - 0x18, (value & 0x0F) as u8),
            _ => {}
        }
    }

    /// Re-decode the dirty tiles of one layer.
    pub fn render(&mut self, layer: usize, gfx: &GfxRegions) {
        let layer = layer % LAYER_COUNT;
        let tiles = self.layers[layer].dirty.take();
        for tile in tiles {
            let code = self.vram[vram_index(layer, tile)];
            self.layers[layer].decode(tile, code, gfx);
            self.decoded += 1;
        }
    }

    pub fn render_all(&mut self, gfx: &GfxRegions) {
        for layer in 0..LAYER_COUNT {
            self.render(layer, gfx);
        }
    }

    /// Draw a rendered layer over the frame.
    pub fn draw(&self, layer: usize, frame: &mut FrameBuffer) {
        let layer_index = layer % LAYER_COUNT;
        let layer = &self.layers[layer_index];
        let (ox, oy) = layer.origin(layer_index);
        let (w, h) = (layer.width(), layer.height());
        for y in 0..SCREEN_HEIGHT {
            let row = &layer.cache[((y + oy) % h) * w..][..w];
            for x in 0..SCREEN_WIDTH {
                let pen = row[(x + ox) % w];
                if pen != NO_PEN {
                    frame.put(x, y, pen);
                }
            }
        }
    }

    /// Mark the pens of every tile that reaches the screen.
    pub fn mark_visible_pens(&self, layer: usize, tracker: &mut VisibilityTracker) {
        let layer_index = layer % LAYER_COUNT;
        let layer = &self.layers[layer_index];
        let (ox, oy) = layer.origin(layer_index);
        let base = TILE_PEN_BASE + usize::from(layer.color_bank) * 256;
        let cols = (ox % 8 + SCREEN_WIDTH).div_ceil(8).min(layer.cols);
        let rows = (oy % 8 + SCREEN_HEIGHT).div_ceil(8).min(layer.rows);
        for r in 0..rows {
            for c in 0..cols {
                let cx = (ox / 8 + c) % layer.cols;
                let cy = (oy / 8 + r) % layer.rows;
                tracker.mark_usage(base, &layer.usage[layer.tile_at_cell(cx, cy)]);
            }
        }
    }
}
