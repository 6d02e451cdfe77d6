//! Frame patcher - rebuilds a frame from its predecessor and a patch list.

use std::io::{Read, Write};

use super::{CodecError, PatchRun};

/// Apply `patches` to a copy of `base`.
///
/// Patches must be in ascending, non-overlapping order and lie inside the
/// frame; anything else means the stream is corrupt.
pub fn apply_patches(base: &[u8], patches: &[PatchRun]) -> Result<Vec<u8>, CodecError> {
    let mut frame = base.to_vec();
    let mut cursor = 0usize;

    for (i, patch) in patches.iter().enumerate() {
        let (start, end) = (patch.start as usize, patch.end());

        if patch.len == 0 {
            return Err(CodecError::malformed(format!("patch {} has zero length", i)));
        }
        if end > frame.len() {
            return Err(CodecError::malformed(format!(
                "patch {} covers [{}, {}) outside a {}-pixel frame",
                i,
                start,
                end,
                frame.len()
            )));
        }
        if start < cursor {
            return Err(CodecError::malformed(format!(
                "patch {} starts at {} before the previous patch ends at {}",
                i, start, cursor
            )));
        }

        frame[start..end].fill(patch.value);
        cursor = end;
    }

    Ok(frame)
}

/// Serialize one patch list: a u16 count followed by the patch records.
///
/// `frame` is only used to report which frame overflowed the count field.
pub fn write_patch_list<W: Write>(
    w: &mut W,
    frame: usize,
    patches: &[PatchRun],
) -> Result<(), CodecError> {
    let count = u16::try_from(patches.len()).map_err(|_| CodecError::TooManyPatches {
        frame,
        count: patches.len(),
    })?;

    w.write_all(&count.to_le_bytes())?;
    for patch in patches {
        patch.write_to(w)?;
    }
    Ok(())
}

/// Read one patch list written by [`write_patch_list`].
pub fn read_patch_list<R: Read>(r: &mut R) -> Result<Vec<PatchRun>, CodecError> {
    let mut buf2 = [0u8; 2];
    r.read_exact(&mut buf2)
        .map_err(|e| CodecError::malformed(format!("missing patch count: {}", e)))?;
    let count = u16::from_le_bytes(buf2) as usize;

    let mut patches = Vec::with_capacity(count);
    for i in 0..count {
        let patch = PatchRun::read_from(r).map_err(|e| {
            CodecError::malformed(format!("patch {} of {} missing: {}", i, count, e))
        })?;
        patches.push(patch);
    }
    Ok(patches)
}
