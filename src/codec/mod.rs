//! Codec module - Frame-level coding primitives for SVM animations.
//!
//! - `rle`: run-length coding of the reference frame
//! - `diff`: patch runs between consecutive frames
//! - `patch`: reconstruction of a frame from its predecessor
//! - `deflate`: whole-payload compression

mod deflate;
mod diff;
mod patch;
mod rle;

pub use deflate::*;
pub use diff::*;
pub use patch::*;
pub use rle::*;

/// Longest run expressible by a 16-bit run-length field.
pub const MAX_RUN: usize = u16::MAX as usize;

/// Error type for encoding and decoding SVM data.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Frame {frame} has {actual} pixels, expected {expected}")]
    DimensionMismatch {
        frame: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Decompression failed: {0}")]
    Decompression(String),

    #[error("Malformed stream: {0}")]
    MalformedStream(String),

    #[error("Width and height must be in 1..=65535, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Frame count must be in 1..=255, got {0}")]
    FrameCount(usize),

    #[error("Frame {frame} needs {count} patch runs, at most 65535 fit in a patch list")]
    TooManyPatches { frame: usize, count: usize },

    #[error("Frame {frame} uses palette index {index}, but the palette has {colors} colors")]
    PaletteMismatch { frame: usize, index: u8, colors: u16 },

    #[error("Invalid encoder configuration: {0}")]
    Config(#[from] crate::schema::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        CodecError::MalformedStream(msg.into())
    }
}
