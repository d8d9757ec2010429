//! EEPROM persistence.
//!
//! The 8 KiB EEPROM sits on the master's low byte lane at 0x180000. Its
//! contents are opaque here: they are saved and restored as a raw blob.

use std::fs;
use std::path::Path;

use crate::error::System2Error;
use crate::memory::SharedRegion;

pub const EEPROM_BYTES: usize = 0x2000;

/// Replace the EEPROM contents with `image`.
pub fn load(region: &mut SharedRegion, image: &[u8]) -> Result<(), System2Error> {
    if image.len() != EEPROM_BYTES {
        return Err(System2Error::EepromSize {
            expected: EEPROM_BYTES,
            actual: image.len(),
        });
    }
    region.as_mut_slice().copy_from_slice(image);
    Ok(())
}

pub fn load_file(region: &mut SharedRegion, path: &Path) -> Result<(), System2Error> {
    let image = fs::read(path)?;
    load(region, &image)
}

pub fn save_file(region: &SharedRegion, path: &Path) -> Result<(), System2Error> {
    fs::write(path, region.as_slice())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_size_is_rejected_and_contents_kept() {
        let mut region = SharedRegion::filled("eeprom", EEPROM_BYTES, 0xFF);
        let err = load(&mut region, &[0; 16]).unwrap_err();
        assert!(matches!(
            err,
            System2Error::EepromSize {
                expected: EEPROM_BYTES,
                actual: 16
            }
        ));
        assert!(region.as_slice().iter().all(|&b| b == 0xFF));
    }
}
