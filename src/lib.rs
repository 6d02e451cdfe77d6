//! SVM - compact palette-indexed animation container.
//!
//! An SVM file stores a fixed sequence of frames that share one 256-color
//! palette. The first frame is run-length coded; every following frame is a
//! list of patch runs against its predecessor. The whole payload is then
//! zlib-compressed.
//!
//! # Architecture
//!
//! - `codec`: RLE, frame diffing, patch application and stream compression
//! - `container`: the binary file layout, encoder and decoder
//! - `schema`: serde-backed encoder configuration and pack manifests
//!
//! # Example
//!
//! ```rust
//! use svm_anim::{Animation, Palette, decode, encode};
//!
//! let animation = Animation {
//!     width: 2,
//!     height: 1,
//!     delay_ms: 100,
//!     palette: Palette::from_colors(&[[0, 0, 0], [255, 255, 255]]),
//!     frames: vec![vec![0, 0], vec![0, 1]],
//! };
//!
//! let bytes = encode(&animation).unwrap();
//! let decoded = decode(&bytes).unwrap();
//! assert_eq!(decoded.frames, animation.frames);
//! ```

pub mod codec;
pub mod container;
pub mod schema;

// Re-export commonly used types
pub use codec::CodecError;
pub use container::{Animation, Decoder, EncodeStats, Encoder, Palette, decode, encode};
pub use schema::{EncoderConfig, PackManifest};
