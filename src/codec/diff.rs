//! Frame differ - patch runs between two consecutive indexed frames.

use std::io::{self, Read, Write};

use super::MAX_RUN;

/// A contiguous range `[start, start + len)` of the target frame that takes
/// the constant `value` and differs from the base frame at every position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchRun {
    /// Flat pixel offset of the first patched byte.
    pub start: u32,
    /// Number of patched bytes (1..=65535).
    pub len: u16,
    /// New palette index.
    pub value: u8,
}

impl PatchRun {
    /// Size of one serialized patch record in bytes: start(4) + len(2) + value(1).
    pub const SIZE: usize = 7;

    /// One-past-the-end offset of the patched range.
    #[inline]
    pub fn end(&self) -> usize {
        self.start as usize + self.len as usize
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.start.to_le_bytes())?;
        w.write_all(&self.len.to_le_bytes())?;
        w.write_all(&[self.value])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;

        Ok(Self {
            start: u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]),
            len: u16::from_le_bytes([buf[4], buf[5]]),
            value: buf[6],
        })
    }
}

/// Compute the patch runs that turn `base` into `target`.
///
/// Single left-to-right scan. A run grows while the target keeps the run's
/// value and the base does not already hold it, and is capped at 65535.
///
/// # Panics
///
/// Panics if `base` and `target` differ in length.
pub fn diff_frames(base: &[u8], target: &[u8]) -> Vec<PatchRun> {
    assert_eq!(
        base.len(),
        target.len(),
        "diffed frames must have the same length"
    );

    let n = base.len();
    let mut patches = Vec::new();
    let mut i = 0;

    while i < n {
        if base[i] == target[i] {
            i += 1;
            continue;
        }

        let value = target[i];
        let mut len = 1;
        while len < MAX_RUN && i + len < n && target[i + len] == value && base[i + len] != value {
            len += 1;
        }

        patches.push(PatchRun {
            start: i as u32,
            len: len as u16,
            value,
        });
        i += len;
    }

    patches
}
