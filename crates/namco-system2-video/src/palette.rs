//! Palette RAM and per-frame pen visibility.
//!
//! Palette RAM is 64 KiB split into four 16 KiB banks. Within a bank the
//! red, green and blue components of 2048 pens sit in consecutive 4 KiB
//! blocks (one component per word, low byte significant); the last 4 KiB
//! block holds control registers.

use crate::PEN_COUNT;

/// Size of the palette RAM window in bytes.
pub const PALETTE_RAM_BYTES: usize = 0x1_0000;

const CONTROL_BLOCK: usize = 0x3000;

/// Palette RAM with a lazily rebuilt ARGB lookup.
pub struct Palette {
    ram: Vec<u8>,
    control: [u16; 8],
    rgb: Vec<[u8; 3]>,
    lookup: Vec<u32>,
    /// Pens whose RGB changed since the lookup was last rebuilt.
    stale: Vec<bool>,
    rebuilds: u64,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: vec![0; PALETTE_RAM_BYTES],
            control: [0; 8],
            rgb: vec![[0; 3]; PEN_COUNT],
            lookup: vec![0xFF00_0000; PEN_COUNT],
            stale: vec![false; PEN_COUNT],
            rebuilds: 0,
        }
    }

    #[must_use]
    pub fn read_word(&self, offset: u32) -> u16 {
        let offset = (offset as usize) & (PALETTE_RAM_BYTES - 1) & !1;
        u16::from_be_bytes([self.ram[offset], self.ram[offset + 1]])
    }

    pub fn write_word(&mut self, offset: u32, value: u16) {
        let offset = (offset as usize) & (PALETTE_RAM_BYTES - 1) & !1;
        let [hi, lo] = value.to_be_bytes();
        self.ram[offset] = hi;
        self.ram[offset + 1] = lo;

        if offset & CONTROL_BLOCK == CONTROL_BLOCK {
            self.control[(offset >> 1) & 7] = value;
            return;
        }

        let pen = (((offset & 0xC000) >> 2) | (offset & 0x0FFF)) >> 1;
        let red = (offset & 0xCFFF) | 1;
        let rgb = [
            self.ram[red],
            self.ram[red + 0x1000],
            self.ram[red + 0x2000],
        ];
        if self.rgb[pen] != rgb {
            self.rgb[pen] = rgb;
            self.stale[pen] = true;
        }
    }

    /// Palette control register (0-7), mirrored across the control block.
    #[must_use]
    pub fn control(&self, index: usize) -> u16 {
        self.control[index & 7]
    }

    #[must_use]
    pub fn rgb(&self, pen: usize) -> [u8; 3] {
        self.rgb[pen % PEN_COUNT]
    }

    /// ARGB8888 as of the last [`Palette::refresh`].
    #[must_use]
    pub fn argb(&self, pen: usize) -> u32 {
        self.lookup[pen % PEN_COUNT]
    }

    /// Number of lookup rebuilds performed so far.
    #[must_use]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Rebuild lookup entries for visible pens whose colour changed.
    ///
    /// Pen 0 is always refreshed since it is the background. Returns false
    /// when nothing needed recomputing.
    pub fn refresh(&mut self, visible: &VisibilityTracker) -> bool {
        let mut rebuilt = false;
        for pen in 0..PEN_COUNT {
            if self.stale[pen] && (pen == 0 || visible.is_visible(pen)) {
                let [r, g, b] = self.rgb[pen];
                self.lookup[pen] =
                    0xFF00_0000 | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b);
                self.stale[pen] = false;
                rebuilt = true;
            }
        }
        if rebuilt {
            self.rebuilds += 1;
        }
        rebuilt
    }
}

/// Pens referenced by the frame being composited.
pub struct VisibilityTracker {
    visible: Vec<bool>,
    count: usize,
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilityTracker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            visible: vec![false; PEN_COUNT],
            count: 0,
        }
    }

    /// Forget the previous frame.
    pub fn begin_frame(&mut self) {
        self.visible.fill(false);
        self.count = 0;
    }

    pub fn mark(&mut self, pen: usize) {
        let pen = pen % PEN_COUNT;
        if !self.visible[pen] {
            self.visible[pen] = true;
            if pen != 0 {
                self.count += 1;
            }
        }
    }

    /// Mark `base + p` for every bit `p` set in a 256-bit pixel usage mask.
    pub fn mark_usage(&mut self, base: usize, usage: &[u64; 4]) {
        for (word, &bits) in usage.iter().enumerate() {
            let mut bits = bits;
            while bits != 0 {
                let bit = bits.trailing_zeros() as usize;
                self.mark(base + word * 64 + bit);
                bits &= bits - 1;
            }
        }
    }

    #[must_use]
    pub fn is_visible(&self, pen: usize) -> bool {
        self.visible[pen % PEN_COUNT]
    }

    /// Visible pens, not counting the background pen 0.
    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.count
    }

    pub fn visible_pens(&self) -> impl Iterator<Item = usize> + '_ {
        self.visible
            .iter()
            .enumerate()
            .filter_map(|(pen, &v)| v.then_some(pen))
    }
}

/// Record pixel value `p` in a 256-bit usage mask.
pub(crate) fn note_pixel(usage: &mut [u64; 4], pixel: u8) {
    usage[usize::from(pixel >> 6)] |= 1 << (pixel & 63);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pen(palette: &mut Palette, bank: u32, index: u32, rgb: [u8; 3]) {
        let base = bank * 0x4000 + index * 2;
        palette.write_word(base, u16::from(rgb[0]));
        palette.write_word(base + 0x1000, u16::from(rgb[1]));
        palette.write_word(base + 0x2000, u16::from(rgb[2]));
    }

    #[test]
    fn components_come_from_three_blocks() {
        let mut palette = Palette::new();
        write_pen(&mut palette, 2, 0x10, [0x12, 0x34, 0x56]);
        assert_eq!(palette.rgb(2 * 0x800 + 0x10), [0x12, 0x34, 0x56]);
    }

    #[test]
    fn control_block_does_not_touch_pens() {
        let mut palette = Palette::new();
        palette.write_word(0x300A, 0x0123);
        assert_eq!(palette.control(5), 0x0123);
        assert_eq!(palette.read_word(0x300A), 0x0123);
        assert_eq!(palette.rgb(0x1805), [0; 3]);
    }

    #[test]
    fn refresh_skips_when_nothing_changed() {
        let mut palette = Palette::new();
        let mut visible = VisibilityTracker::new();
        visible.mark(3);
        write_pen(&mut palette, 0, 3, [0xFF, 0, 0]);
        assert!(palette.refresh(&visible));
        assert_eq!(palette.argb(3), 0xFFFF_0000);
        assert!(!palette.refresh(&visible));

        // Same value again is not a change.
        write_pen(&mut palette, 0, 3, [0xFF, 0, 0]);
        assert!(!palette.refresh(&visible));
        assert_eq!(palette.rebuilds(), 1);
    }

    #[test]
    fn invisible_pens_stay_stale_until_seen() {
        let mut palette = Palette::new();
        let mut visible = VisibilityTracker::new();
        write_pen(&mut palette, 0, 9, [0, 0xFF, 0]);
        assert!(!palette.refresh(&visible));
        assert_eq!(palette.argb(9), 0xFF00_0000);
        visible.mark(9);
        assert!(palette.refresh(&visible));
        assert_eq!(palette.argb(9), 0xFF00_FF00);
    }

    #[test]
    fn background_pen_is_not_counted() {
        let mut visible = VisibilityTracker::new();
        visible.mark(0);
        visible.mark(7);
        visible.mark(7);
        assert_eq!(visible.visible_count(), 1);
        assert_eq!(visible.visible_pens().collect::<Vec<_>>(), vec![0, 7]);
        visible.begin_frame();
        assert_eq!(visible.visible_count(), 0);
    }

    #[test]
    fn usage_mask_offsets_by_colour_base() {
        let mut usage = [0u64; 4];
        note_pixel(&mut usage, 1);
        note_pixel(&mut usage, 200);
        let mut visible = VisibilityTracker::new();
        visible.mark_usage(0x300, &usage);
        assert!(visible.is_visible(0x301));
        assert!(visible.is_visible(0x300 + 200));
        assert_eq!(visible.visible_count(), 2);
    }
}
