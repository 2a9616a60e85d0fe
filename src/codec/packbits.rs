//! PackBits run-length decoding, TIFF specification section 9.
//!
//! The control byte is signed: `n >= 0` copies the next `n + 1` bytes
//! literally, `-127 <= n <= -1` repeats the next byte `1 - n` times, and
//! `-128` is a no-op.

use crate::error::TiffError;

use super::Codec;

pub(crate) struct PackBitsCodec;

impl Codec for PackBitsCodec {
    fn name(&self) -> &'static str {
        "packbits"
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, TiffError> {
        unpack_bits(data)
    }
}

/// Decode a PackBits-compressed payload.
pub(crate) fn unpack_bits(src: &[u8]) -> Result<Vec<u8>, TiffError> {
    let mut dst = Vec::with_capacity(src.len() * 2);
    let mut pos = 0;

    while pos < src.len() {
        let code = src[pos] as i8;
        pos += 1;

        if code >= 0 {
            let run = code as usize + 1;
            if pos + run > src.len() {
                return Err(TiffError::Codec {
                    name: "packbits",
                    message: "literal run extends past end of input".to_string(),
                });
            }
            dst.extend_from_slice(&src[pos..pos + run]);
            pos += run;
        } else if code == -128 {
            // No-op control byte.
        } else {
            let Some(&value) = src.get(pos) else {
                return Err(TiffError::Codec {
                    name: "packbits",
                    message: "repeat run missing its value byte".to_string(),
                });
            };
            pos += 1;
            let run = (1 - i32::from(code)) as usize;
            dst.extend(std::iter::repeat(value).take(run));
        }
    }

    Ok(dst)
}
