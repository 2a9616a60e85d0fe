//! Compression codecs and the codec registry.
//!
//! A codec exposes one of two capabilities: byte-valued decompression
//! ([`Codec::decompress`]) or direct image decoding ([`Codec::decode_image`]).
//! Calling the capability a codec does not implement surfaces a typed
//! mismatch error, so callers learn which access path to use.
//!
//! Codec instances are created per IFD at open time, from a factory that
//! receives the IFD's tag set — this is how the JPEG codec consumes
//! `JPEGTables`. Built-in compressions are matched directly; vendor dialects
//! register extra factories in a process-wide, read-mostly table. Extras are
//! consulted first, so a registered factory can override a builtin.

mod jpeg;
mod lzw;
mod packbits;

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use image::DynamicImage;

use crate::error::TiffError;
use crate::format::tiff::{Compression, PhotometricInterpretation, TagSet};

pub use jpeg::JpegCodec;

/// One compression scheme's decoder, bound to a single IFD.
pub trait Codec: Send + Sync {
    /// Short name used in error messages and logs.
    fn name(&self) -> &'static str;

    /// Whether this codec produces images directly instead of raw bytes.
    fn is_image_codec(&self) -> bool {
        false
    }

    /// Decompress a section payload to raw sample bytes.
    fn decompress(&self, _data: &[u8]) -> Result<Vec<u8>, TiffError> {
        Err(TiffError::ImageOnlyCodec(self.name()))
    }

    /// Decode a section payload straight to an image.
    ///
    /// The photometric interpretation is forwarded so decoders can
    /// distinguish YCbCr from component-colour payloads.
    fn decode_image(
        &self,
        _data: &[u8],
        _photometric: PhotometricInterpretation,
    ) -> Result<DynamicImage, TiffError> {
        Err(TiffError::BytesOnlyCodec(self.name()))
    }
}

/// Factory invoked once per IFD to build a codec for a compression ID.
pub type CodecFactory = fn(&TagSet) -> Result<Box<dyn Codec>, TiffError>;

fn extra_codecs() -> &'static RwLock<HashMap<u16, CodecFactory>> {
    static EXTRA: OnceLock<RwLock<HashMap<u16, CodecFactory>>> = OnceLock::new();
    EXTRA.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Register a codec factory for a compression identifier.
///
/// Registration is additive and process-wide; files opened afterwards pick
/// the factory up. Registering an already-known identifier replaces the
/// previous factory.
pub fn register_codec(id: u16, factory: CodecFactory) {
    extra_codecs()
        .write()
        .expect("codec registry poisoned")
        .insert(id, factory);
}

/// Build the codec for one IFD's compression.
pub(crate) fn create_codec(id: u16, tags: &TagSet) -> Result<Box<dyn Codec>, TiffError> {
    let extra = extra_codecs()
        .read()
        .expect("codec registry poisoned")
        .get(&id)
        .copied();
    if let Some(factory) = extra {
        return factory(tags);
    }

    match Compression::from_u16(id) {
        Some(Compression::Uncompressed) => Ok(Box::new(UncompressedCodec)),
        Some(Compression::Lzw) => Ok(Box::new(lzw::LzwCodec)),
        Some(Compression::PackBits) => Ok(Box::new(packbits::PackBitsCodec)),
        Some(Compression::Jpeg) => Ok(Box::new(JpegCodec::from_tags(tags)?)),
        _ => Err(TiffError::UnsupportedCompression(id)),
    }
}

/// Pass-through codec for uncompressed payloads.
struct UncompressedCodec;

impl Codec for UncompressedCodec {
    fn name(&self) -> &'static str {
        "uncompressed"
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, TiffError> {
        Ok(data.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncompressed_pass_through() {
        let codec = create_codec(1, &TagSet::new()).unwrap();
        assert_eq!(codec.decompress(&[1, 2, 3]).unwrap(), vec![1, 2, 3]);
        assert!(!codec.is_image_codec());
    }

    #[test]
    fn test_compression_zero_is_uncompressed() {
        let codec = create_codec(0, &TagSet::new()).unwrap();
        assert_eq!(codec.name(), "uncompressed");
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(create_codec(5, &TagSet::new()).unwrap().name(), "lzw");
        assert_eq!(
            create_codec(32773, &TagSet::new()).unwrap().name(),
            "packbits"
        );
        assert_eq!(create_codec(7, &TagSet::new()).unwrap().name(), "jpeg");
    }

    #[test]
    fn test_unsupported_compression() {
        let result = create_codec(6, &TagSet::new());
        assert!(matches!(result, Err(TiffError::UnsupportedCompression(6))));
    }

    #[test]
    fn test_byte_codec_rejects_image_requests() {
        let codec = create_codec(5, &TagSet::new()).unwrap();
        let result = codec.decode_image(&[], PhotometricInterpretation::Rgb);
        assert!(matches!(result, Err(TiffError::BytesOnlyCodec("lzw"))));
    }

    #[test]
    fn test_register_extra_codec() {
        struct Doubler;
        impl Codec for Doubler {
            fn name(&self) -> &'static str {
                "doubler"
            }
            fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, TiffError> {
                Ok(data.iter().flat_map(|&b| [b, b]).collect())
            }
        }

        register_codec(60001, |_| Ok(Box::new(Doubler)));

        let codec = create_codec(60001, &TagSet::new()).unwrap();
        assert_eq!(codec.decompress(&[7, 9]).unwrap(), vec![7, 7, 9, 9]);
    }
}
