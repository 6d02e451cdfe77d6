//! Stream compressor - zlib-wrapped DEFLATE over the whole payload.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};

use super::CodecError;

/// Output growth step while inflating.
const INFLATE_CHUNK: usize = 64 * 1024;

/// Compress the payload at the strongest compression level.
pub fn deflate_payload(payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(payload)?;
    Ok(encoder.finish()?)
}

/// Decompress a single zlib stream that must span all of `data`.
///
/// The stream must reach its end marker: running out of input first means the
/// file was truncated.
pub fn inflate_payload(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).max(INFLATE_CHUNK));

    loop {
        if out.len() == out.capacity() {
            out.reserve(INFLATE_CHUNK);
        }

        let (before_in, before_out) = (inflater.total_in(), inflater.total_out());
        let input = &data[before_in as usize..];

        let status = inflater
            .decompress_vec(input, &mut out, FlushDecompress::None)
            .map_err(|e| CodecError::Decompression(e.to_string()))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled =
                    inflater.total_in() == before_in && inflater.total_out() == before_out;
                if stalled && out.len() < out.capacity() {
                    return Err(CodecError::Decompression(format!(
                        "stream ended early after {} of {} bytes",
                        before_in,
                        data.len()
                    )));
                }
            }
        }
    }

    let consumed = inflater.total_in() as usize;
    if consumed != data.len() {
        return Err(CodecError::Decompression(format!(
            "{} trailing bytes after end of stream",
            data.len() - consumed
        )));
    }

    log::debug!("inflated {} bytes into {} bytes", data.len(), out.len());
    Ok(out)
}
