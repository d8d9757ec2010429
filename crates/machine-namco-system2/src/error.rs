use thiserror::Error;

/// Errors from building a machine or moving persistent state in and out.
///
/// Nothing on the per-access or per-frame paths fails; see the crate docs.
#[derive(Debug, Error)]
pub enum System2Error {
    #[error("EEPROM image is {actual} bytes, expected {expected}")]
    EepromSize { expected: usize, actual: usize },

    #[error("ROZ plane {plane}: {bytes:#x} bytes is not a square power-of-two tile map")]
    RozRamSize { plane: usize, bytes: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serde")]
    #[error("invalid board settings: {0}")]
    Settings(#[from] serde_json::Error),
}
