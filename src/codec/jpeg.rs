//! JPEG section decoding.
//!
//! JPEG sections decode straight to images rather than to raw sample bytes.
//! When the IFD carries a `JPEGTables` tag, its content is validated and
//! cached once at codec construction; each section body is then spliced with
//! the cached tables before being handed to the decoder.

use bytes::Bytes;
use image::DynamicImage;
use tracing::debug;

use crate::error::TiffError;
use crate::format::jpeg::{prepare_section_jpeg, SOI};
use crate::format::tiff::{PhotometricInterpretation, TagSet, TiffTag};

use super::Codec;

pub struct JpegCodec {
    tables: Option<Bytes>,
}

impl JpegCodec {
    /// Build a JPEG codec for one IFD, caching its `JPEGTables` content.
    ///
    /// Files whose sections are complete JPEG streams simply have no tables
    /// tag; both forms are supported.
    pub(crate) fn from_tags(tags: &TagSet) -> Result<Self, TiffError> {
        let tables = match tags.byte_value(TiffTag::JpegTables) {
            Some(data) => {
                if data.len() < 4 || data[0..2] != SOI {
                    return Err(TiffError::InvalidTagValue {
                        tag: "JPEGTables",
                        message: "tables do not start with a JPEG SOI marker".to_string(),
                    });
                }
                Some(Bytes::copy_from_slice(data))
            }
            None => None,
        };

        Ok(JpegCodec { tables })
    }
}

impl Codec for JpegCodec {
    fn name(&self) -> &'static str {
        "jpeg"
    }

    fn is_image_codec(&self) -> bool {
        true
    }

    fn decode_image(
        &self,
        data: &[u8],
        photometric: PhotometricInterpretation,
    ) -> Result<DynamicImage, TiffError> {
        let stream = prepare_section_jpeg(self.tables.as_deref(), data);

        debug!(
            ?photometric,
            merged_len = stream.len(),
            "decoding jpeg section"
        );

        image::load_from_memory_with_format(&stream, image::ImageFormat::Jpeg).map_err(|err| {
            TiffError::Codec {
                name: "jpeg",
                message: err.to_string(),
            }
        })
    }
}
