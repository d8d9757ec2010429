//! Headless capture: PNG screenshots.

use std::error::Error;
use std::fs;
use std::path::Path;

use crate::System2;

/// Save the last composited frame as a PNG file.
///
/// The frame is ARGB8888; alpha is dropped.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_screenshot(system: &System2, path: &Path) -> Result<(), Box<dyn Error>> {
    let width = system.framebuffer_width();
    let height = system.framebuffer_height();

    let file = fs::File::create(path)?;
    let w = std::io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    let rgb: Vec<u8> = system
        .framebuffer()
        .iter()
        .flat_map(|&pixel| {
            let [_, r, g, b] = pixel.to_be_bytes();
            [r, g, b]
        })
        .collect();

    writer.write_image_data(&rgb)?;
    Ok(())
}

/// Run `frames` frames, saving each one as `NNNNNN.png` under `dir`.
///
/// # Errors
///
/// Returns an error if a frame cannot be saved.
pub fn record(system: &mut System2, dir: &Path, frames: u32) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    for i in 1..=frames {
        system.run_frame();
        save_screenshot(system, &dir.join(format!("{i:06}.png")))?;
    }
    Ok(())
}
