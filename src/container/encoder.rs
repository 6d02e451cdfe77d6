//! SVM encoder - builds the container from a sequence of indexed frames.

use rayon::prelude::*;

use super::Animation;
use super::format::{MAX_FRAMES, Palette, SvmHeader};
use crate::codec::{
    CodecError, PatchRun, deflate_payload, diff_frames, rle_encode, write_patch_list, write_runs,
};
use crate::schema::EncoderConfig;

/// Streaming SVM encoder.
///
/// Usage:
/// ```ignore
/// let mut encoder = Encoder::new(width, height, palette, EncoderConfig::default())?;
/// for frame in &frames {
///     encoder.push_frame(frame)?;
/// }
/// let (bytes, stats) = encoder.finish()?;
/// ```
pub struct Encoder {
    header: SvmHeader,
    palette: Palette,
    config: EncoderConfig,
    /// Uncompressed payload built so far.
    payload: Vec<u8>,
    /// Last frame pushed, the base for the next diff.
    prev: Option<Vec<u8>>,
    frames_written: usize,
    patch_runs: usize,
}

impl Encoder {
    /// Create an encoder for frames of `width * height` palette indices.
    pub fn new(
        width: usize,
        height: usize,
        palette: Palette,
        config: EncoderConfig,
    ) -> Result<Self, CodecError> {
        let (w, h) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => (w, h),
            _ => return Err(CodecError::InvalidDimensions { width, height }),
        };
        config.validate()?;

        let header = SvmHeader {
            width: w,
            height: h,
            frame_count: 0, // Will be updated on finish
            delay_ms: config.delay_ms,
        };

        Ok(Self {
            header,
            palette,
            config,
            payload: Vec::new(),
            prev: None,
            frames_written: 0,
            patch_runs: 0,
        })
    }

    /// Append the next frame, diffing it against the previous one.
    pub fn push_frame(&mut self, frame: &[u8]) -> Result<(), CodecError> {
        self.check_frame(frame)?;
        let patches = self.prev.as_deref().map(|prev| diff_frames(prev, frame));
        self.write_frame(frame, patches.as_deref())
    }

    /// Number of frames pushed so far.
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Compress the payload and produce the complete file.
    pub fn finish(mut self) -> Result<(Vec<u8>, EncodeStats), CodecError> {
        if self.frames_written == 0 {
            return Err(CodecError::FrameCount(0));
        }
        self.header.frame_count = self.frames_written as u8;

        let compressed = deflate_payload(&self.payload)?;

        let mut out = Vec::with_capacity(SvmHeader::PAYLOAD_OFFSET + compressed.len());
        self.header.write_to(&mut out)?;
        self.palette.write_to(&mut out)?;
        out.extend_from_slice(&compressed);

        let stats = EncodeStats {
            frame_count: self.frames_written,
            patch_runs: self.patch_runs,
            payload_bytes: self.payload.len(),
            compressed_bytes: compressed.len(),
            file_bytes: out.len(),
        };
        log::debug!("encoded {}", stats);

        Ok((out, stats))
    }

    /// Reject frames that cannot belong to this animation.
    fn check_frame(&self, frame: &[u8]) -> Result<(), CodecError> {
        if self.frames_written >= MAX_FRAMES {
            return Err(CodecError::FrameCount(self.frames_written + 1));
        }

        let expected = self.header.frame_len();
        if frame.len() != expected {
            return Err(CodecError::DimensionMismatch {
                frame: self.frames_written,
                expected,
                actual: frame.len(),
            });
        }

        if let Some(colors) = self.config.palette_colors
            && let Some(&index) = frame.iter().find(|&&i| i as u16 >= colors)
        {
            if self.config.strict_palette {
                return Err(CodecError::PaletteMismatch {
                    frame: self.frames_written,
                    index,
                    colors,
                });
            }
            log::warn!(
                "frame {} uses palette index {} but the palette has {} colors; \
                 it was probably quantized against a different palette",
                self.frames_written,
                index,
                colors
            );
        }

        Ok(())
    }

    /// Append an already checked frame. `patches` is `None` for the reference frame.
    fn write_frame(
        &mut self,
        frame: &[u8],
        patches: Option<&[PatchRun]>,
    ) -> Result<(), CodecError> {
        match patches {
            None => {
                let runs = rle_encode(frame);
                log::debug!("frame 0: {} RLE runs", runs.len());
                write_runs(&mut self.payload, &runs)?;
            }
            Some(patches) => {
                log::debug!("frame {}: {} patch runs", self.frames_written, patches.len());
                write_patch_list(&mut self.payload, self.frames_written, patches)?;
                self.patch_runs += patches.len();
            }
        }

        self.prev = Some(frame.to_vec());
        self.frames_written += 1;
        Ok(())
    }
}

/// Statistics from an encoding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeStats {
    /// Frames written.
    pub frame_count: usize,
    /// Patch runs across all inter frames.
    pub patch_runs: usize,
    /// Payload size before compression.
    pub payload_bytes: usize,
    /// Payload size after compression.
    pub compressed_bytes: usize,
    /// Total file size.
    pub file_bytes: usize,
}

impl std::fmt::Display for EncodeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames, {} patch runs, {} payload bytes -> {} compressed, {} bytes total",
            self.frame_count,
            self.patch_runs,
            self.payload_bytes,
            self.compressed_bytes,
            self.file_bytes
        )
    }
}

/// Encode a complete animation with the default configuration.
pub fn encode(animation: &Animation) -> Result<Vec<u8>, CodecError> {
    encode_with_stats(animation, &EncoderConfig::default()).map(|(bytes, _)| bytes)
}

/// Encode a complete animation.
///
/// The animation's own `delay_ms` takes precedence over `config.delay_ms`.
/// All frames are in memory, so the patch lists for every consecutive pair
/// are computed in parallel and then written in order.
pub fn encode_with_stats(
    animation: &Animation,
    config: &EncoderConfig,
) -> Result<(Vec<u8>, EncodeStats), CodecError> {
    let count = animation.frames.len();
    if count == 0 || count > MAX_FRAMES {
        return Err(CodecError::FrameCount(count));
    }

    let config = EncoderConfig {
        delay_ms: animation.delay_ms,
        ..config.clone()
    };
    let mut encoder = Encoder::new(
        animation.width as usize,
        animation.height as usize,
        animation.palette.clone(),
        config,
    )?;

    // Dimension errors must surface before any diffing.
    let expected = animation.frame_len();
    if let Some((frame, f)) = animation
        .frames
        .iter()
        .enumerate()
        .find(|(_, f)| f.len() != expected)
    {
        return Err(CodecError::DimensionMismatch {
            frame,
            expected,
            actual: f.len(),
        });
    }

    let patch_lists: Vec<Vec<PatchRun>> = animation
        .frames
        .par_windows(2)
        .map(|pair| diff_frames(&pair[0], &pair[1]))
        .collect();

    for (i, frame) in animation.frames.iter().enumerate() {
        encoder.check_frame(frame)?;
        let patches = i.checked_sub(1).map(|prev| patch_lists[prev].as_slice());
        encoder.write_frame(frame, patches)?;
    }

    encoder.finish()
}
