//! SVM decoder - rebuilds the frame sequence from container bytes.

use std::io::Cursor;

use super::Animation;
use super::format::{Palette, SvmHeader};
use crate::codec::{CodecError, apply_patches, inflate_payload, read_patch_list, read_rle_frame};

/// Decoder over a fully inflated SVM payload.
///
/// Usage:
/// ```ignore
/// let mut decoder = Decoder::new(&bytes)?;
/// println!("{} frames", decoder.frame_count());
///
/// for frame in decoder.frames() {
///     let frame = frame?;
///     // Hand the frame to the renderer...
/// }
/// ```
pub struct Decoder {
    header: SvmHeader,
    palette: Palette,
    payload: Cursor<Vec<u8>>,
}

impl Decoder {
    /// Parse the header and palette and inflate the payload.
    pub fn new(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut reader = bytes;
        let header = SvmHeader::read_from(&mut reader)?;
        let palette = Palette::read_from(&mut reader)?;

        if header.frame_count == 0 {
            return Err(CodecError::malformed("header declares zero frames"));
        }
        if header.width == 0 || header.height == 0 {
            return Err(CodecError::InvalidDimensions {
                width: header.width as usize,
                height: header.height as usize,
            });
        }

        let payload = inflate_payload(reader)?;
        log::debug!(
            "SVM {}x{}, {} frames, {} ms delay, {} payload bytes",
            header.width,
            header.height,
            header.frame_count,
            header.delay_ms,
            payload.len()
        );

        Ok(Self {
            header,
            palette,
            payload: Cursor::new(payload),
        })
    }

    /// Get file header.
    pub fn header(&self) -> &SvmHeader {
        &self.header
    }

    /// Get shared palette.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Get total number of frames.
    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    /// Get frame dimensions.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.header.width as usize, self.header.height as usize)
    }

    /// Get delay between frames in milliseconds.
    pub fn delay_ms(&self) -> u16 {
        self.header.delay_ms
    }

    /// Iterate over frames in order, reconstructing each from its predecessor.
    ///
    /// Every call starts again from frame 0.
    pub fn frames(&mut self) -> FrameIterator<'_> {
        self.payload.set_position(0);
        FrameIterator {
            decoder: self,
            prev: None,
            current: 0,
            failed: false,
        }
    }

    /// Decode the next frame given the previous one (`None` for frame 0).
    fn read_frame(&mut self, prev: Option<&[u8]>) -> Result<Vec<u8>, CodecError> {
        match prev {
            None => read_rle_frame(&mut self.payload, self.header.frame_len()),
            Some(prev) => {
                let patches = read_patch_list(&mut self.payload)?;
                apply_patches(prev, &patches)
            }
        }
    }

    /// Fail if payload bytes remain after the last frame.
    fn check_exhausted(&self) -> Result<(), CodecError> {
        let len = self.payload.get_ref().len() as u64;
        let pos = self.payload.position();
        if pos != len {
            return Err(CodecError::malformed(format!(
                "{} unread payload bytes after the last frame",
                len - pos
            )));
        }
        Ok(())
    }
}

/// Iterator over decoded frames.
///
/// Each item is an independent buffer. Iteration stops after the first error.
pub struct FrameIterator<'a> {
    decoder: &'a mut Decoder,
    prev: Option<Vec<u8>>,
    current: usize,
    failed: bool,
}

impl<'a> Iterator for FrameIterator<'a> {
    type Item = Result<Vec<u8>, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.current >= self.decoder.frame_count() {
            return None;
        }

        let result = self
            .decoder
            .read_frame(self.prev.as_deref())
            .and_then(|frame| {
                if self.current + 1 == self.decoder.frame_count() {
                    self.decoder.check_exhausted()?;
                }
                Ok(frame)
            });

        match &result {
            Ok(frame) => self.prev = Some(frame.clone()),
            Err(_) => self.failed = true,
        }
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            return (0, Some(0));
        }
        let remaining = self.decoder.frame_count() - self.current;
        (0, Some(remaining))
    }
}

/// Decode a complete SVM file into memory.
pub fn decode(bytes: &[u8]) -> Result<Animation, CodecError> {
    let mut decoder = Decoder::new(bytes)?;
    let frames = decoder.frames().collect::<Result<Vec<_>, _>>()?;

    Ok(Animation {
        width: decoder.header.width,
        height: decoder.header.height,
        delay_ms: decoder.header.delay_ms,
        palette: decoder.palette.clone(),
        frames,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{PatchRun, Run, deflate_payload, diff_frames};
    use crate::container::encode;
    use proptest::prelude::*;

    fn palette() -> Palette {
        Palette::from_colors(&[[10, 10, 10], [200, 30, 30]])
    }

    /// Assemble a file around a hand-written payload.
    fn container(width: u16, height: u16, frame_count: u8, payload: &[u8]) -> Vec<u8> {
        let header = SvmHeader {
            width,
            height,
            frame_count,
            delay_ms: 100,
        };
        let mut out = Vec::new();
        header.write_to(&mut out).unwrap();
        palette().write_to(&mut out).unwrap();
        out.extend(deflate_payload(payload).unwrap());
        out
    }

    #[test]
    fn test_two_pixel_scenario() {
        let animation = Animation {
            width: 2,
            height: 1,
            delay_ms: 100,
            palette: palette(),
            frames: vec![vec![5, 5], vec![5, 9]],
        };
        assert_eq!(
            diff_frames(&animation.frames[0], &animation.frames[1]),
            vec![PatchRun {
                start: 1,
                len: 1,
                value: 9
            }]
        );

        let decoded = decode(&encode(&animation).unwrap()).unwrap();
        assert_eq!(decoded.frames, vec![vec![5, 5], vec![5, 9]]);
    }

    #[test]
    fn test_three_frame_roundtrip() {
        let animation = Animation {
            width: 4,
            height: 4,
            delay_ms: 75,
            palette: palette(),
            frames: vec![
                vec![0; 16],
                (0..16).map(|i| (i % 3 == 0) as u8).collect(),
                (0..16).map(|i| (i >= 8) as u8).collect(),
            ],
        };

        let decoded = decode(&encode(&animation).unwrap()).unwrap();
        assert_eq!(decoded.width, 4);
        assert_eq!(decoded.height, 4);
        assert_eq!(decoded.delay_ms, 75);
        assert_eq!(decoded.palette, animation.palette);
        assert_eq!(decoded.frames, animation.frames);
    }

    #[test]
    fn test_single_frame() {
        let mut payload = Vec::new();
        Run { len: 6, value: 1 }.write_to(&mut payload).unwrap();
        let bytes = container(3, 2, 1, &payload);

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.frames, vec![vec![1; 6]]);
    }

    #[test]
    fn test_frames_are_independent() {
        let animation = Animation {
            width: 2,
            height: 2,
            delay_ms: 100,
            palette: palette(),
            frames: vec![vec![0, 0, 0, 0], vec![1, 0, 0, 0], vec![1, 1, 0, 0]],
        };
        let bytes = encode(&animation).unwrap();

        let mut decoder = Decoder::new(&bytes).unwrap();
        assert_eq!(decoder.dimensions(), (2, 2));
        let mut frames = decoder.frames();
        let mut first = frames.next().unwrap().unwrap();
        let second = frames.next().unwrap().unwrap();
        first[3] = 1;
        assert_eq!(second, vec![1, 0, 0, 0]);
        assert_eq!(frames.next().unwrap().unwrap(), vec![1, 1, 0, 0]);
        assert!(frames.next().is_none());
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = container(1, 1, 1, &[1, 0, 0]);
        bytes[0] = b'X';
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_bad_version() {
        let mut bytes = container(1, 1, 1, &[1, 0, 0]);
        bytes[3] = 2;
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_truncated_palette() {
        let bytes = container(1, 1, 1, &[1, 0, 0]);
        assert!(matches!(
            decode(&bytes[..400]),
            Err(CodecError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_patch_outside_frame() {
        let mut payload = Vec::new();
        Run { len: 4, value: 0 }.write_to(&mut payload).unwrap();
        payload.extend_from_slice(&1u16.to_le_bytes());
        PatchRun {
            start: 3,
            len: 2,
            value: 1,
        }
        .write_to(&mut payload)
        .unwrap();

        let bytes = container(2, 2, 2, &payload);
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::MalformedStream(_))
        ));
    }

    #[test]
    fn test_missing_patch_list() {
        let mut payload = Vec::new();
        Run { len: 4, value: 0 }.write_to(&mut payload).unwrap();
        let bytes = container(2, 2, 2, &payload);

        let mut decoder = Decoder::new(&bytes).unwrap();
        let results: Vec<_> = decoder.frames().collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(CodecError::MalformedStream(_))));
    }

    #[test]
    fn test_trailing_payload() {
        let mut payload = Vec::new();
        Run { len: 4, value: 0 }.write_to(&mut payload).unwrap();
        payload.push(0);
        let bytes = container(2, 2, 1, &payload);
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::MalformedStream(_))
        ));
    }

    #[test]
    fn test_zero_frames() {
        let bytes = container(2, 2, 0, &[]);
        assert!(matches!(
            Decoder::new(&bytes),
            Err(CodecError::MalformedStream(_))
        ));
    }

    #[test]
    fn test_zero_dimensions() {
        let bytes = container(0, 3, 2, &[]);
        assert!(matches!(
            Decoder::new(&bytes),
            Err(CodecError::InvalidDimensions {
                width: 0,
                height: 3
            })
        ));

        let bytes = container(3, 0, 1, &[]);
        assert!(matches!(
            decode(&bytes),
            Err(CodecError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_frames_restart_from_first() {
        let animation = Animation {
            width: 4,
            height: 1,
            delay_ms: 100,
            palette: palette(),
            frames: vec![vec![0, 0, 0, 0], vec![0, 1, 1, 0], vec![1, 1, 1, 1]],
        };
        let bytes = encode(&animation).unwrap();
        let mut decoder = Decoder::new(&bytes).unwrap();

        let first = decoder.frames().next().unwrap().unwrap();
        assert_eq!(first, animation.frames[0]);

        let again = decoder.frames().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(again, animation.frames);

        let third = decoder.frames().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(third, animation.frames);
    }

    #[test]
    fn test_large_frames_roundtrip() {
        // 90,000 pixels: long RLE stretches and patch runs both hit the 65535 cap.
        let len = 300 * 300;
        let mut second = vec![1u8; len];
        second[..100].fill(0);
        let mut third = second.clone();
        third[70_000..80_000].fill(2);
        let animation = Animation {
            width: 300,
            height: 300,
            delay_ms: 100,
            palette: palette(),
            frames: vec![vec![0u8; len], second, third],
        };

        let patches = diff_frames(&animation.frames[0], &animation.frames[1]);
        assert!(patches.len() >= 2);
        assert!(patches.iter().all(|p| p.len as usize <= u16::MAX as usize));

        let decoded = decode(&encode(&animation).unwrap()).unwrap();
        assert_eq!(decoded, animation);
    }

    #[test]
    fn test_truncation_is_always_detected() {
        let frames: Vec<Vec<u8>> = (0..5u32)
            .map(|f| (0..100u32).map(|i| ((i + f * 3) / 10 % 2) as u8).collect())
            .collect();
        let animation = Animation {
            width: 10,
            height: 10,
            delay_ms: 100,
            palette: palette(),
            frames,
        };
        let bytes = encode(&animation).unwrap();

        for cut in SvmHeader::PAYLOAD_OFFSET..bytes.len() {
            match decode(&bytes[..cut]) {
                Err(CodecError::Decompression(_)) | Err(CodecError::MalformedStream(_)) => {}
                other => panic!("truncation to {} bytes gave {:?}", cut, other.map(|_| ())),
            }
        }
    }

    proptest! {
        #[test]
        fn prop_container_roundtrip(
            (width, height, frames) in (1u16..12, 1u16..12, 1usize..8).prop_flat_map(|(w, h, n)| (
                Just(w),
                Just(h),
                prop::collection::vec(
                    prop::collection::vec(0u8..4, w as usize * h as usize),
                    n,
                ),
            ))
        ) {
            let animation = Animation {
                width,
                height,
                delay_ms: 33,
                palette: palette(),
                frames,
            };
            let decoded = decode(&encode(&animation).unwrap()).unwrap();
            prop_assert_eq!(decoded, animation);
        }
    }
}
