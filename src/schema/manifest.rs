//! Manifest describing a set of raw index buffers to pack into an SVM file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ConfigError, EncoderConfig};

/// Input description for `svm pack`, and the output of `svm unpack`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackManifest {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Raw palette file (packed RGB triples, up to 768 bytes).
    pub palette: PathBuf,
    /// Raw index buffers, one per frame, in playback order.
    pub frames: Vec<PathBuf>,
    /// Encoder settings.
    #[serde(flatten)]
    pub encoder: EncoderConfig,
}

impl Default for PackManifest {
    fn default() -> Self {
        Self {
            width: 64,
            height: 64,
            palette: PathBuf::from("palette.rgb"),
            frames: vec![
                PathBuf::from("frame_000.idx"),
                PathBuf::from("frame_001.idx"),
            ],
            encoder: EncoderConfig::default(),
        }
    }
}

impl PackManifest {
    /// Validate dimensions, frame count and encoder settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = u16::MAX as u32;
        if self.width == 0 || self.height == 0 || self.width > max || self.height > max {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.frames.is_empty() || self.frames.len() > u8::MAX as usize {
            return Err(ConfigError::InvalidFrameCount(self.frames.len()));
        }
        self.encoder.validate()
    }

    /// Resolve relative palette and frame paths against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.palette);
        self.frames.iter_mut().for_each(resolve);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_json() {
        let json = r#"{
            "width": 4,
            "height": 2,
            "palette": "pal.rgb",
            "frames": ["a.idx", "b.idx"],
            "delay_ms": 50
        }"#;
        let manifest: PackManifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.width, 4);
        assert_eq!(manifest.frames.len(), 2);
        assert_eq!(manifest.encoder.delay_ms, 50);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_default_roundtrips_through_json() {
        let manifest = PackManifest::default();
        let json = serde_json::to_string_pretty(&manifest).unwrap();
        let back: PackManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.frames, manifest.frames);
        assert_eq!(back.encoder, manifest.encoder);
    }

    #[test]
    fn test_validate_limits() {
        let mut manifest = PackManifest::default();
        manifest.width = 70_000;
        assert!(matches!(
            manifest.validate(),
            Err(ConfigError::InvalidDimensions { .. })
        ));

        let mut manifest = PackManifest::default();
        manifest.frames.clear();
        assert!(matches!(
            manifest.validate(),
            Err(ConfigError::InvalidFrameCount(0))
        ));
    }

    #[test]
    fn test_resolve_paths() {
        let mut manifest = PackManifest::default();
        manifest.frames.push(PathBuf::from("/abs/frame.idx"));
        manifest.resolve_paths(Path::new("/data/anim"));

        assert_eq!(manifest.palette, PathBuf::from("/data/anim/palette.rgb"));
        assert_eq!(manifest.frames[0], PathBuf::from("/data/anim/frame_000.idx"));
        assert_eq!(manifest.frames[2], PathBuf::from("/abs/frame.idx"));
    }
}
