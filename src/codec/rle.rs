//! Run-length coding of a full reference frame.

use std::io::{self, Read, Write};

use super::{CodecError, MAX_RUN};

/// A stretch of `len` identical bytes with value `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// Repetition count (1..=65535).
    pub len: u16,
    /// Repeated byte.
    pub value: u8,
}

impl Run {
    /// Size of one serialized run record in bytes: len(2) + value(1).
    pub const SIZE: usize = 3;

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.len.to_le_bytes())?;
        w.write_all(&[self.value])?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf = [0u8; Self::SIZE];
        r.read_exact(&mut buf)?;

        Ok(Self {
            len: u16::from_le_bytes([buf[0], buf[1]]),
            value: buf[2],
        })
    }
}

/// Split `data` into maximal runs, capped at 65535 bytes each.
pub fn rle_encode(data: &[u8]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut i = 0;

    while i < data.len() {
        let value = data[i];
        let len = data[i..]
            .iter()
            .take(MAX_RUN)
            .take_while(|&&b| b == value)
            .count();

        runs.push(Run {
            len: len as u16,
            value,
        });
        i += len;
    }

    runs
}

/// Expand `runs` back into a buffer of exactly `expected_len` bytes.
pub fn rle_decode(runs: &[Run], expected_len: usize) -> Result<Vec<u8>, CodecError> {
    let total: usize = runs.iter().map(|run| run.len as usize).sum();
    if total != expected_len {
        return Err(CodecError::malformed(format!(
            "RLE runs cover {} bytes, expected {}",
            total, expected_len
        )));
    }

    let mut out = Vec::with_capacity(expected_len);
    for run in runs {
        out.resize(out.len() + run.len as usize, run.value);
    }
    Ok(out)
}

/// Read run records from `r` until `expected_len` bytes are covered, then expand them.
///
/// The stream carries no run count, so a frame ends exactly where its runs
/// add up to the frame size. A run that crosses that boundary is rejected.
pub fn read_rle_frame<R: Read>(r: &mut R, expected_len: usize) -> Result<Vec<u8>, CodecError> {
    let mut runs = Vec::new();
    let mut covered = 0usize;

    while covered < expected_len {
        let run = Run::read_from(r).map_err(|e| {
            CodecError::malformed(format!(
                "RLE stream ended after {} of {} bytes: {}",
                covered, expected_len, e
            ))
        })?;
        if run.len == 0 {
            return Err(CodecError::malformed("zero-length RLE run"));
        }
        covered += run.len as usize;
        runs.push(run);
    }

    rle_decode(&runs, expected_len)
}

/// Serialize `runs` as consecutive 3-byte records.
pub fn write_runs<W: Write>(w: &mut W, runs: &[Run]) -> io::Result<()> {
    for run in runs {
        run.write_to(w)?;
    }
    Ok(())
}
