//! The graphics board as one unit.

use log::info;

use crate::compositor::{ComposeState, Compositor, FrameBuffer, Scene};
use crate::gfx::GfxRegions;
use crate::palette::{Palette, VisibilityTracker};
use crate::roz::{RozControl, RozGeometry, RozPlane, RozPrioritySource};
use crate::sprite::{SpriteLayout, SpriteRenderer};
use crate::tilemap::TilemapManager;
use crate::Orientation;

/// Sprite bank select register.
///
/// D3-D0 pick the sprite bank, D11-D8 the ROZ colour bank and D14-D12 the
/// ROZ priority on boards where the plane has no priority of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpriteBankSelect(pub u16);

impl SpriteBankSelect {
    #[must_use]
    pub const fn sprite_bank(self) -> u8 {
        (self.0 & 0x0F) as u8
    }

    #[must_use]
    pub const fn roz_color(self) -> u8 {
        ((self.0 >> 8) & 0x0F) as u8
    }

    #[must_use]
    pub const fn roz_priority(self) -> u8 {
        ((self.0 >> 12) & 0x07) as u8
    }
}

/// Board-variant parameters, resolved once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConfig {
    /// 8 or 16.
    pub priority_levels: u8,
    pub sprite_layout: SpriteLayout,
    /// One entry per ROZ plane; empty when the board has none.
    pub roz_planes: Vec<RozGeometry>,
    pub roz_priority: RozPrioritySource,
    pub orientation: Orientation,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            priority_levels: 8,
            sprite_layout: SpriteLayout::Standard,
            roz_planes: vec![RozGeometry::STANDARD],
            roz_priority: RozPrioritySource::BankRegister,
            orientation: Orientation::default(),
        }
    }
}

/// Graphics board state.
///
/// Sprite RAM and ROZ RAM are owned by the machine and lent to
/// [`System2Video::render_frame`].
pub struct System2Video {
    config: VideoConfig,
    tilemap: TilemapManager,
    palette: Palette,
    tracker: VisibilityTracker,
    sprites: SpriteRenderer,
    roz: Vec<RozPlane>,
    bank: SpriteBankSelect,
    gfx: GfxRegions,
    compositor: Compositor,
    frame: FrameBuffer,
    frames: u64,
}

impl System2Video {
    #[must_use]
    pub fn new(config: VideoConfig, gfx: GfxRegions) -> Self {
        info!(
            "video: {} priority levels, {:?} sprites, {} ROZ plane(s)",
            config.priority_levels,
            config.sprite_layout,
            config.roz_planes.len()
        );
        let roz = config
            .roz_planes
            .iter()
            .enumerate()
            .map(|(i, &geometry)| RozPlane::new(geometry, i))
            .collect();
        Self {
            tilemap: TilemapManager::new(config.priority_levels),
            palette: Palette::new(),
            tracker: VisibilityTracker::new(),
            sprites: SpriteRenderer::new(config.sprite_layout),
            roz,
            bank: SpriteBankSelect::default(),
            gfx,
            compositor: Compositor::new(config.priority_levels),
            frame: FrameBuffer::oriented(config.orientation),
            frames: 0,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &VideoConfig {
        &self.config
    }

    #[must_use]
    pub fn tilemap(&self) -> &TilemapManager {
        &self.tilemap
    }

    pub fn tilemap_mut(&mut self) -> &mut TilemapManager {
        &mut self.tilemap
    }

    #[must_use]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    #[must_use]
    pub fn gfx(&self) -> &GfxRegions {
        &self.gfx
    }

    #[must_use]
    pub fn sprite_bank(&self) -> SpriteBankSelect {
        self.bank
    }

    pub fn set_sprite_bank(&mut self, value: u16) {
        self.bank = SpriteBankSelect(value);
    }

    #[must_use]
    pub fn roz_plane_count(&self) -> usize {
        self.roz.len()
    }

    /// Control block of a ROZ plane, or `None` if the board lacks it.
    #[must_use]
    pub fn roz_control(&self, plane: usize) -> Option<&RozControl> {
        self.roz.get(plane).map(|p| &p.control)
    }

    pub fn roz_control_mut(&mut self, plane: usize) -> Option<&mut RozControl> {
        self.roz.get_mut(plane).map(|p| &mut p.control)
    }

    /// Composite a frame. `roz_ram` holds one slice per plane; missing
    /// slices draw nothing.
    pub fn render_frame(&mut self, sprite_ram: &[u8], roz_ram: &[&[u8]]) {
        let mut scene = Scene {
            tilemap: &mut self.tilemap,
            palette: &mut self.palette,
            tracker: &mut self.tracker,
            sprites: &self.sprites,
            roz: &self.roz,
            roz_priority: self.config.roz_priority,
            gfx: &self.gfx,
            sprite_ram,
            roz_ram,
            bank: self.bank,
        };
        self.compositor.compose(&mut scene, &mut self.frame);
        self.frames += 1;
    }

    #[must_use]
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// Frames composited so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn compose_state(&self) -> ComposeState {
        self.compositor.state()
    }

    /// Pens referenced by the last frame, background excluded.
    #[must_use]
    pub fn visible_pen_count(&self) -> usize {
        self.tracker.visible_count()
    }

    #[must_use]
    pub fn visibility(&self) -> &VisibilityTracker {
        &self.tracker
    }
}
