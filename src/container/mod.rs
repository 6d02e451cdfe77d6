//! SVM container encoding and decoding.
//!
//! # File Format
//!
//! ```text
//! Header (11 bytes):
//!   Magic: "SVM" (3 bytes)
//!   Version: u8 (1)
//!   Width: u16
//!   Height: u16
//!   Frame count: u8
//!   Delay (ms): u16
//!
//! Palette (768 bytes):
//!   256 x (R, G, B)
//!
//! Payload (rest of file, zlib-compressed):
//!   Frame 0: RLE records (run: u16, value: u8) covering width * height bytes
//!   Frames 1..N: patch count: u16, then (start: u32, run: u16, value: u8) records
//! ```
//!
//! All integers are little-endian. Every frame after the first is stored as
//! the difference from its predecessor, so frames are decoded in order.

mod decoder;
mod encoder;
mod format;

use std::fs;
use std::path::Path;

use crate::codec::CodecError;

pub use decoder::{Decoder, FrameIterator, decode};
pub use encoder::{EncodeStats, Encoder, encode, encode_with_stats};
pub use format::{MAX_FRAMES, PALETTE_ENTRIES, Palette, SVM_MAGIC, SVM_VERSION, SvmHeader};

/// A decoded animation, or the input to the encoder.
///
/// `frames` is an arena of independent index buffers, each
/// `width * height` bytes, in playback order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    /// Frame width in pixels.
    pub width: u16,
    /// Frame height in pixels.
    pub height: u16,
    /// Delay between frames in milliseconds.
    pub delay_ms: u16,
    /// Palette shared by all frames.
    pub palette: Palette,
    /// Palette-index buffers, row-major.
    pub frames: Vec<Vec<u8>>,
}

impl Animation {
    /// Number of pixels in one frame.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Total playback time of one loop in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.frames.len() as u64 * self.delay_ms as u64
    }

    /// Encode and write the animation to `path`.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<EncodeStats, CodecError> {
        let (bytes, stats) = encode_with_stats(self, &Default::default())?;
        fs::write(path, bytes)?;
        Ok(stats)
    }

    /// Read and decode an animation from `path`.
    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, CodecError> {
        let bytes = fs::read(path)?;
        decode(&bytes)
    }
}
