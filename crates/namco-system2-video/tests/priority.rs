mod common;

use common::{put_sprite, solid_chars, solid_sprite_cell, sprite_words};
use namco_system2_video::{GfxRegions, SPRITE_RAM_BYTES, System2Video, VideoConfig};

const SAMPLE_AT: (usize, usize) = (10, 5);
const TEXT_TILES: usize = 36 * 28;

fn fill_text_layer(video: &mut System2Video, layer: usize, code: u16) {
    for tile in 0..TEXT_TILES {
        video.tilemap_mut().write_tile_word(layer, tile, code);
    }
}

fn board(gfx: GfxRegions, levels: u8) -> System2Video {
    let config = VideoConfig {
        priority_levels: levels,
        ..VideoConfig::default()
    };
    System2Video::new(config, gfx)
}

fn sampled(video: &System2Video) -> u16 {
    video.frame().pen(SAMPLE_AT.0, SAMPLE_AT.1)
}

#[test]
fn tile_layers_follow_priority_then_index() {
    for p4 in 0..8u16 {
        for p5 in 0..8u16 {
            let mut video = board(solid_chars(3), 8);
            fill_text_layer(&mut video, 4, 1);
            fill_text_layer(&mut video, 5, 2);
            video.tilemap_mut().write_control(0x14, p4);
            video.tilemap_mut().write_control(0x15, p5);
            video.render_frame(&[], &[]);

            let expected = if p5 >= p4 { 0x1002 } else { 0x1001 };
            assert_eq!(sampled(&video), expected, "layer4 at {p4}, layer5 at {p5}");
        }
    }
}

#[test]
fn sprites_draw_after_tiles_at_same_level() {
    let mut gfx = solid_chars(2);
    gfx.sprites[0] = solid_sprite_cell(3);
    for tile_level in 0..8u16 {
        for sprite_level in 0..8u16 {
            let mut video = board(gfx.clone(), 8);
            fill_text_layer(&mut video, 4, 1);
            video.tilemap_mut().write_control(0x14, tile_level);
            let mut ram = vec![0u8; SPRITE_RAM_BYTES];
            put_sprite(&mut ram, 0, 0, sprite_words(0, sprite_level, 0));
            video.render_frame(&ram, &[]);

            let expected = if sprite_level >= tile_level { 3 } else { 0x1001 };
            assert_eq!(sampled(&video), expected, "tile {tile_level}, sprite {sprite_level}");
        }
    }
}

#[test]
fn roz_plane_sits_between_tiles_and_sprites() {
    let mut gfx = solid_chars(2);
    gfx.roz[0] = vec![4; 64];
    for tile_level in 0..8u16 {
        for roz_level in 0..8u16 {
            let mut video = board(gfx.clone(), 8);
            fill_text_layer(&mut video, 4, 1);
            video.tilemap_mut().write_control(0x14, tile_level);
            video.set_sprite_bank(roz_level << 12);
            let roz_ram = vec![0u8; 0x2_0000];
            video.render_frame(&[], &[&roz_ram]);

            let expected = if roz_level >= tile_level { 4 } else { 0x1001 };
            assert_eq!(sampled(&video), expected, "tile {tile_level}, roz {roz_level}");
        }
    }
}

#[test]
fn sixteen_level_boards_draw_upper_levels() {
    let mut gfx = solid_chars(2);
    gfx.sprites[0] = solid_sprite_cell(3);
    let config = VideoConfig {
        priority_levels: 16,
        sprite_layout: namco_system2_video::SpriteLayout::FinalLap,
        roz_planes: Vec::new(),
        ..VideoConfig::default()
    };
    let mut video = System2Video::new(config, gfx);
    fill_text_layer(&mut video, 4, 1);
    video.tilemap_mut().write_control(0x14, 12);
    let mut ram = vec![0u8; SPRITE_RAM_BYTES];
    put_sprite(&mut ram, 0, 0, sprite_words(0, 11, 0));
    video.render_frame(&ram, &[]);
    assert_eq!(sampled(&video), 0x1001);

    put_sprite(&mut ram, 0, 0, sprite_words(0, 13, 0));
    video.render_frame(&ram, &[]);
    assert_eq!(sampled(&video), 3);
}

#[test]
fn only_the_selected_sprite_bank_draws() {
    let mut gfx = GfxRegions::default();
    gfx.sprites[0] = solid_sprite_cell(3);
    let mut video = board(gfx, 8);
    let mut ram = vec![0u8; SPRITE_RAM_BYTES];
    put_sprite(&mut ram, 2, 5, sprite_words(0, 0, 1));

    video.render_frame(&ram, &[]);
    assert_eq!(sampled(&video), 0);

    video.set_sprite_bank(2);
    video.render_frame(&ram, &[]);
    assert_eq!(sampled(&video), 0x0103);
}
