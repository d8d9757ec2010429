//! Priority compositing.

use crate::gfx::GfxRegions;
use crate::palette::{Palette, VisibilityTracker};
use crate::roz::{RozPlane, RozPrioritySource};
use crate::sprite::SpriteRenderer;
use crate::tilemap::{LAYER_COUNT, TilemapManager};
use crate::video::SpriteBankSelect;
use crate::{Orientation, SCREEN_HEIGHT, SCREEN_WIDTH};

/// Composited frame: palette pens in hardware raster order plus their
/// ARGB8888 resolution in cabinet orientation.
pub struct FrameBuffer {
    pens: Vec<u16>,
    pixels: Vec<u32>,
    orientation: Orientation,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::oriented(Orientation::default())
    }

    /// Frame shown through a cabinet `orientation`.
    #[must_use]
    pub fn oriented(orientation: Orientation) -> Self {
        Self {
            pens: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            pixels: vec![0xFF00_0000; SCREEN_WIDTH * SCREEN_HEIGHT],
            orientation,
        }
    }

    /// Width of [`FrameBuffer::pixels`].
    #[must_use]
    pub fn width(&self) -> usize {
        self.orientation.output_size().0
    }

    /// Height of [`FrameBuffer::pixels`].
    #[must_use]
    pub fn height(&self) -> usize {
        self.orientation.output_size().1
    }

    pub fn clear(&mut self, pen: u16) {
        self.pens.fill(pen);
    }

    /// Write a pen. Coordinates must be on screen.
    pub fn put(&mut self, x: usize, y: usize, pen: u16) {
        self.pens[y * SCREEN_WIDTH + x] = pen;
    }

    #[must_use]
    pub fn pen(&self, x: usize, y: usize) -> u16 {
        self.pens[y * SCREEN_WIDTH + x]
    }

    #[must_use]
    pub fn pens(&self) -> &[u16] {
        &self.pens
    }

    /// ARGB8888 pixels as of the last [`FrameBuffer::resolve`], rows of
    /// [`FrameBuffer::width`] as seen on the cabinet screen.
    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Colour at screen position (`x`, `y`) in cabinet orientation.
    #[must_use]
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width() + x]
    }

    /// Convert pens to colours through the palette lookup, turning the
    /// frame to the cabinet orientation.
    pub fn resolve(&mut self, palette: &Palette) {
        if self.orientation == Orientation::default() {
            for (pixel, &pen) in self.pixels.iter_mut().zip(&self.pens) {
                *pixel = palette.argb(usize::from(pen));
            }
            return;
        }
        let width = self.width();
        for (y, row) in self.pens.chunks_exact(SCREEN_WIDTH).enumerate() {
            for (x, &pen) in row.iter().enumerate() {
                let (sx, sy) = self.orientation.apply(x, y);
                self.pixels[sy * width + sx] = palette.argb(usize::from(pen));
            }
        }
    }
}

/// Compositor progress through one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeState {
    Init,
    /// Drawing priority level `n`.
    Level(u8),
    Done,
}

/// Everything a frame is composited from.
pub(crate) struct Scene<'a> {
    pub tilemap: &'a mut TilemapManager,
    pub palette: &'a mut Palette,
    pub tracker: &'a mut VisibilityTracker,
    pub sprites: &'a SpriteRenderer,
    pub roz: &'a [RozPlane],
    pub roz_priority: RozPrioritySource,
    pub gfx: &'a GfxRegions,
    pub sprite_ram: &'a [u8],
    pub roz_ram: &'a [&'a [u8]],
    pub bank: SpriteBankSelect,
}

fn plane_ram<'a>(rams: &[&'a [u8]], plane: usize) -> &'a [u8] {
    rams.get(plane).copied().unwrap_or_default()
}

impl Scene<'_> {
    fn roz_level(&self, plane: &RozPlane) -> u8 {
        match self.roz_priority {
            RozPrioritySource::BankRegister => self.bank.roz_priority(),
            RozPrioritySource::ControlWord => plane.control.priority(),
        }
    }

    /// Board flip only. The cabinet orientation is applied at resolve.
    fn roz_orientation(&self) -> Orientation {
        Orientation::default().flipped(self.tilemap.flip())
    }
}

/// Walks `Init -> Level(0..=max) -> Done` once per frame.
pub struct Compositor {
    state: ComposeState,
    max_level: u8,
}

impl Compositor {
    /// `priority_levels` is 8 or 16.
    #[must_use]
    pub fn new(priority_levels: u8) -> Self {
        Self {
            state: ComposeState::Done,
            max_level: priority_levels.saturating_sub(1),
        }
    }

    #[must_use]
    pub fn state(&self) -> ComposeState {
        self.state
    }

    pub(crate) fn compose(&mut self, scene: &mut Scene<'_>, frame: &mut FrameBuffer) {
        self.state = ComposeState::Init;
        while self.state != ComposeState::Done {
            self.step(scene, frame);
        }
    }

    fn step(&mut self, scene: &mut Scene<'_>, frame: &mut FrameBuffer) {
        self.state = match self.state {
            ComposeState::Init => {
                frame.clear(0);
                scene.tilemap.render_all(scene.gfx);
                Self::mark_visible(scene);
                scene.palette.refresh(scene.tracker);
                ComposeState::Level(0)
            }
            ComposeState::Level(level) => {
                Self::draw_level(scene, level, frame);
                if level >= self.max_level {
                    frame.resolve(scene.palette);
                    ComposeState::Done
                } else {
                    ComposeState::Level(level + 1)
                }
            }
            ComposeState::Done => ComposeState::Done,
        };
    }

    fn mark_visible(scene: &mut Scene<'_>) {
        scene.tracker.begin_frame();
        for layer in 0..LAYER_COUNT {
            scene.tilemap.mark_visible_pens(layer, scene.tracker);
        }
        let orientation = scene.roz_orientation();
        for (i, plane) in scene.roz.iter().enumerate() {
            plane.mark_visible_pens(
                plane_ram(scene.roz_ram, i),
                scene.bank.roz_color(),
                orientation,
                scene.gfx,
                scene.tracker,
            );
        }
        scene.sprites.mark_visible_pens(
            scene.sprite_ram,
            scene.bank.sprite_bank(),
            scene.gfx,
            scene.tracker,
        );
    }

    fn draw_level(scene: &Scene<'_>, level: u8, frame: &mut FrameBuffer) {
        for layer in 0..LAYER_COUNT {
            if scene.tilemap.layer(layer).priority() == level {
                scene.tilemap.draw(layer, frame);
            }
        }
        let orientation = scene.roz_orientation();
        for (i, plane) in scene.roz.iter().enumerate() {
            if scene.roz_level(plane) == level {
                plane.draw(
                    plane_ram(scene.roz_ram, i),
                    scene.bank.roz_color(),
                    orientation,
                    scene.gfx,
                    frame,
                );
            }
        }
        scene.sprites.draw(
            scene.sprite_ram,
            scene.bank.sprite_bank(),
            level,
            scene.tilemap.flip(),
            scene.gfx,
            frame,
        );
    }
}
