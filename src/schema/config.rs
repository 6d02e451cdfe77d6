//! Configuration types for SVM encoding.

use serde::{Deserialize, Serialize};

/// Default inter-frame delay in milliseconds.
fn default_delay_ms() -> u16 {
    100
}

/// Encoder configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Delay between frames in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u16,
    /// Number of meaningful palette entries, if the quantizer reported it.
    /// Frames referencing indices at or past this count are inconsistent
    /// with the shared palette.
    #[serde(default)]
    pub palette_colors: Option<u16>,
    /// Reject inconsistent frames instead of logging a warning.
    #[serde(default)]
    pub strict_palette: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            palette_colors: None,
            strict_palette: false,
        }
    }
}

impl EncoderConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(colors) = self.palette_colors
            && (colors == 0 || colors > 256)
        {
            return Err(ConfigError::InvalidPaletteColors(colors));
        }
        if self.strict_palette && self.palette_colors.is_none() {
            return Err(ConfigError::StrictWithoutColors);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Palette color count must be in 1..=256, got {0}")]
    InvalidPaletteColors(u16),
    #[error("strict_palette requires palette_colors to be set")]
    StrictWithoutColors,
    #[error("Frame dimensions must be in 1..=65535, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Manifest lists {0} frames, expected 1..=255")]
    InvalidFrameCount(usize),
}
