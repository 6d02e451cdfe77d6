//! Binary format definitions for SVM files.

use std::io::{self, Read, Write};

use crate::codec::CodecError;

/// Magic bytes identifying an SVM file.
pub const SVM_MAGIC: &[u8; 3] = b"SVM";

/// Current format version.
pub const SVM_VERSION: u8 = 1;

/// Number of palette entries, fixed regardless of how many are used.
pub const PALETTE_ENTRIES: usize = 256;

/// Most frames a single file can hold.
pub const MAX_FRAMES: usize = u8::MAX as usize;

/// Fixed-size file header that precedes the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvmHeader {
    /// Frame width in pixels.
    pub width: u16,
    /// Frame height in pixels.
    pub height: u16,
    /// Number of frames (1-255).
    pub frame_count: u8,
    /// Delay between frames in milliseconds.
    pub delay_ms: u16,
}

impl SvmHeader {
    /// Size of header in bytes.
    /// Magic(3) + Version(1) + Width(2) + Height(2) + FrameCount(1) + Delay(2) = 11
    pub const SIZE: usize = 11;

    /// Offset of the compressed payload: header followed by the palette.
    pub const PAYLOAD_OFFSET: usize = Self::SIZE + Palette::SIZE;

    /// Number of pixels (palette indices) in one frame.
    #[inline]
    pub fn frame_len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Write header to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(SVM_MAGIC)?;
        w.write_all(&[SVM_VERSION])?;
        w.write_all(&self.width.to_le_bytes())?;
        w.write_all(&self.height.to_le_bytes())?;
        w.write_all(&[self.frame_count])?;
        w.write_all(&self.delay_ms.to_le_bytes())?;
        Ok(())
    }

    /// Read header from input, checking magic and version.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)
            .map_err(|e| CodecError::UnsupportedFormat(format!("truncated SVM header: {}", e)))?;

        if &buf[0..3] != SVM_MAGIC {
            return Err(CodecError::UnsupportedFormat(format!(
                "invalid magic bytes {:02x?}",
                &buf[0..3]
            )));
        }
        if buf[3] != SVM_VERSION {
            return Err(CodecError::UnsupportedFormat(format!(
                "unsupported SVM version: {}",
                buf[3]
            )));
        }

        Ok(Self {
            width: u16::from_le_bytes([buf[4], buf[5]]),
            height: u16::from_le_bytes([buf[6], buf[7]]),
            frame_count: buf[8],
            delay_ms: u16::from_le_bytes([buf[9], buf[10]]),
        })
    }
}

/// 256-entry RGB palette shared by every frame of an animation.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
    entries: [[u8; 3]; PALETTE_ENTRIES],
}

impl Palette {
    /// Serialized size: 256 x (R, G, B).
    pub const SIZE: usize = PALETTE_ENTRIES * 3;

    /// Build a palette from packed RGB bytes.
    ///
    /// Quantizers often report fewer than 256 colors; missing entries are
    /// filled with black and bytes past the 768th are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut entries = [[0u8; 3]; PALETTE_ENTRIES];
        for (entry, rgb) in entries.iter_mut().zip(bytes.chunks_exact(3)) {
            entry.copy_from_slice(rgb);
        }
        Self { entries }
    }

    /// Build a palette from a list of colors, padding with black.
    pub fn from_colors(colors: &[[u8; 3]]) -> Self {
        let mut entries = [[0u8; 3]; PALETTE_ENTRIES];
        for (entry, color) in entries.iter_mut().zip(colors) {
            *entry = *color;
        }
        Self { entries }
    }

    /// Packed 768-byte representation.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries.iter().flatten().copied().collect()
    }

    /// Color for a palette index.
    #[inline]
    pub fn rgb(&self, index: u8) -> [u8; 3] {
        self.entries[index as usize]
    }

    /// Expand an indexed frame to RGBA pixels for display.
    pub fn expand_rgba(&self, frame: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(frame.len() * 4);
        for &index in frame {
            let [r, g, b] = self.rgb(index);
            out.extend_from_slice(&[r, g, b, 0xff]);
        }
        out
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.to_bytes())
    }

    pub fn read_from<R: Read>(r: &mut R) -> Result<Self, CodecError> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)
            .map_err(|e| CodecError::UnsupportedFormat(format!("truncated palette: {}", e)))?;
        Ok(Self::from_bytes(&buf))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            entries: [[0u8; 3]; PALETTE_ENTRIES],
        }
    }
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last_used = self
            .entries
            .iter()
            .rposition(|c| *c != [0, 0, 0])
            .map_or(0, |i| i + 1);
        f.debug_struct("Palette")
            .field("entries", &&self.entries[..last_used])
            .finish()
    }
}
