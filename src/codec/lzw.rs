//! LZW decoding for TIFF payloads.
//!
//! TIFF LZW streams are MSB-first with an initial code width of 8 bits and
//! the early-change code-size switch; `weezl` implements exactly this
//! variant.

use crate::error::TiffError;

use super::Codec;

pub(crate) struct LzwCodec;

impl Codec for LzwCodec {
    fn name(&self) -> &'static str {
        "lzw"
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, TiffError> {
        let mut decoder = weezl::decode::Decoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8);
        decoder.decode(data).map_err(|err| TiffError::Codec {
            name: "lzw",
            message: err.to_string(),
        })
    }
}
