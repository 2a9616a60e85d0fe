//! Image File Directories and the section decode pipeline.
//!
//! An [`ImageDirectory`] is one logical image within the container: its tag
//! set, the derived strip/tile layout, and a codec instance bound to its
//! compression. Everything is immutable after construction, so directories
//! can be read lock-free from many threads; only the underlying byte source
//! serialises access, inside its own mutex.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::codec::{self, Codec};
use crate::error::TiffError;
use crate::io::RangeReader;

use super::layout::{DataLayout, Section};
use super::parser::ByteOrder;
use super::pixels::{self, SectionImage};
use super::tags::{
    Compression, PhotometricInterpretation, Predictor, ResolutionUnit, TiffTag,
};
use super::values::{RationalNumber, Tag};

// =============================================================================
// TagSet
// =============================================================================

/// The materialised tags of one IFD, keyed by raw numeric ID.
///
/// Keys are unique within an IFD; insertion order carries no meaning.
/// Unknown tag IDs are preserved alongside the recognised ones.
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    tags: HashMap<u16, Tag>,
}

impl TagSet {
    /// Create an empty tag set.
    pub fn new() -> Self {
        TagSet::default()
    }

    pub(crate) fn insert(&mut self, tag: Tag) {
        self.tags.insert(tag.id, tag);
    }

    /// Look up a tag by raw numeric ID.
    pub fn get(&self, id: u16) -> Option<&Tag> {
        self.tags.get(&id)
    }

    /// Look up a known tag.
    pub fn get_tag(&self, tag: TiffTag) -> Option<&Tag> {
        self.get(tag.as_u16())
    }

    /// Whether a known tag is present.
    pub fn has_tag(&self, tag: TiffTag) -> bool {
        self.get_tag(tag).is_some()
    }

    /// Number of tags in the set.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// A required integer value that must fit u16 (Short).
    pub fn u16_value(&self, tag: TiffTag) -> Result<u16, TiffError> {
        let entry = self.get_tag(tag).ok_or(TiffError::MissingTag(tag))?;
        entry.value.as_u16().ok_or(TiffError::TagTypeMismatch {
            tag: tag.as_u16(),
            expected: "Short",
            actual: entry.field_type,
        })
    }

    /// An optional integer value that must fit u16.
    pub fn u16_opt(&self, tag: TiffTag) -> Option<u16> {
        self.get_tag(tag).and_then(|t| t.value.as_u16())
    }

    /// A required integer value, accepting Short (zero-extended) or Long.
    pub fn u32_value(&self, tag: TiffTag) -> Result<u32, TiffError> {
        let entry = self.get_tag(tag).ok_or(TiffError::MissingTag(tag))?;
        entry.value.as_u32().ok_or(TiffError::TagTypeMismatch {
            tag: tag.as_u16(),
            expected: "Short or Long",
            actual: entry.field_type,
        })
    }

    /// An optional integer value, accepting Short or Long.
    pub fn u32_opt(&self, tag: TiffTag) -> Option<u32> {
        self.get_tag(tag).and_then(|t| t.value.as_u32())
    }

    /// A required integer array coerced to i64, accepting Short, Long, or
    /// Long8. This is the accessor for offset and byte-count arrays.
    pub fn i64_array(&self, tag: TiffTag) -> Result<Vec<i64>, TiffError> {
        let entry = self.get_tag(tag).ok_or(TiffError::MissingTag(tag))?;
        entry.value.as_i64_array().ok_or(TiffError::TagTypeMismatch {
            tag: tag.as_u16(),
            expected: "Short, Long, or Long8",
            actual: entry.field_type,
        })
    }

    /// The Short array stored under a tag, if present.
    pub fn u16_array_opt(&self, tag: TiffTag) -> Option<&[u16]> {
        self.get_tag(tag).and_then(|t| t.value.as_u16_array())
    }

    /// The text stored under an ASCII tag, if present.
    pub fn string_value(&self, tag: TiffTag) -> Option<&str> {
        self.get_tag(tag).and_then(|t| t.value.as_str())
    }

    /// The first rational stored under a tag, if present.
    pub fn rational_value(&self, tag: TiffTag) -> Option<RationalNumber> {
        self.get_tag(tag).and_then(|t| t.value.as_rational())
    }

    /// The raw bytes stored under a Byte/Undefined tag, if present.
    pub fn byte_value(&self, tag: TiffTag) -> Option<&[u8]> {
        self.get_tag(tag).and_then(|t| t.value.as_bytes())
    }
}

// =============================================================================
// ImageDirectory
// =============================================================================

/// One logical image within a TIFF container.
///
/// Owns its tag set, layout, and codec; borrows the file's byte source
/// through a shared handle. Constructed by [`super::TiffFile`] during open.
pub struct ImageDirectory {
    reader: Arc<dyn RangeReader>,
    byte_order: ByteOrder,
    tags: TagSet,
    next_ifd_offset: u64,
    layout: DataLayout,
    codec: Box<dyn Codec>,
    compression_id: u16,
    photometric: PhotometricInterpretation,
    predictor: Predictor,
    bits_per_sample: Vec<u16>,
    samples_per_pixel: u16,
}

impl ImageDirectory {
    pub(crate) fn new(
        tags: TagSet,
        next_ifd_offset: u64,
        byte_order: ByteOrder,
        reader: Arc<dyn RangeReader>,
    ) -> Result<Self, TiffError> {
        // Files may omit Compression (uncompressed) and, in minimal
        // grayscale emissions, SamplesPerPixel/BitsPerSample/Photometric.
        let compression_id = tags.u16_opt(TiffTag::Compression).unwrap_or(1);

        let photometric = match tags.u16_opt(TiffTag::PhotometricInterpretation) {
            Some(value) => PhotometricInterpretation::from_u16(value).unwrap_or_else(|| {
                warn!(value, "unknown photometric interpretation, assuming BlackIsZero");
                PhotometricInterpretation::BlackIsZero
            }),
            None => {
                debug!("PhotometricInterpretation absent, assuming BlackIsZero");
                PhotometricInterpretation::BlackIsZero
            }
        };

        let predictor = tags
            .u16_opt(TiffTag::Predictor)
            .and_then(Predictor::from_u16)
            .unwrap_or(Predictor::None);

        let samples_per_pixel = tags.u16_opt(TiffTag::SamplesPerPixel).unwrap_or(1);

        let bits_per_sample = match tags.u16_array_opt(TiffTag::BitsPerSample) {
            Some(bits) => bits.to_vec(),
            None => {
                debug!("BitsPerSample absent, assuming 8");
                vec![8; usize::from(samples_per_pixel)]
            }
        };

        let layout = DataLayout::from_tags(&tags)?;
        let codec = codec::create_codec(compression_id, &tags)?;

        Ok(ImageDirectory {
            reader,
            byte_order,
            tags,
            next_ifd_offset,
            layout,
            codec,
            compression_id,
            photometric,
            predictor,
            bits_per_sample,
            samples_per_pixel,
        })
    }

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    /// Image extent in pixels: `(width, length)`.
    pub fn image_dimensions(&self) -> (u32, u32) {
        self.layout.image_dimensions()
    }

    /// Whether pixel data is organised as tiles.
    pub fn is_tiled(&self) -> bool {
        self.layout.is_tiled()
    }

    /// The derived layout.
    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// The section at `index`.
    pub fn section(&self, index: u32) -> Result<Section, TiffError> {
        self.layout.section(index)
    }

    /// The section covering pixel `(x, y)`.
    pub fn section_at(&self, x: i64, y: i64) -> Result<Section, TiffError> {
        self.layout.section_at(x, y)
    }

    /// The section grid: `(columns, rows)`.
    pub fn section_grid(&self) -> (u32, u32) {
        self.layout.section_grid()
    }

    /// Nominal section extent.
    pub fn section_dimensions(&self) -> (u32, u32) {
        self.layout.section_dimensions()
    }

    /// Total number of sections.
    pub fn section_count(&self) -> u32 {
        self.layout.section_count()
    }

    // -------------------------------------------------------------------------
    // Decoding
    // -------------------------------------------------------------------------

    /// Read a section's payload verbatim, without decompression.
    ///
    /// The file mutex is held for exactly the seek + read pair.
    pub fn compressed_data(&self, section: &Section) -> Result<Bytes, TiffError> {
        let (offset, byte_count) = self.layout.location(section.index)?;
        if offset < 0 || byte_count < 0 {
            return Err(TiffError::InvalidTagValue {
                tag: "StripOffsets/TileOffsets",
                message: format!(
                    "section {} has negative offset {} or byte count {}",
                    section.index, offset, byte_count
                ),
            });
        }

        Ok(self.reader.read_exact_at(offset as u64, byte_count as usize)?)
    }

    /// Decompress a section to raw sample bytes, inverting the horizontal
    /// predictor when one applies.
    ///
    /// Fails with `ImageOnlyCodec` for codecs that decode straight to
    /// images; use [`Self::image`] for those.
    pub fn data(&self, section: &Section) -> Result<Vec<u8>, TiffError> {
        if self.codec.is_image_codec() {
            return Err(TiffError::ImageOnlyCodec(self.codec.name()));
        }

        let compressed = self.compressed_data(section)?;
        // Decompression runs outside the file mutex.
        let mut data = self.codec.decompress(&compressed)?;

        match self.predictor {
            Predictor::None => {}
            Predictor::Horizontal => {
                let bits = self.bits_per_sample.first().copied().unwrap_or(8);
                invert_horizontal_predictor(
                    &mut data,
                    section.width,
                    section.height,
                    usize::from(self.samples_per_pixel),
                    bits,
                    self.byte_order,
                );
            }
            Predictor::FloatingPoint => {
                warn!("floating-point predictor is not inverted");
            }
        }

        Ok(data)
    }

    /// Decode a section to a typed image.
    ///
    /// Image-valued codecs decode directly; the result is cropped to the
    /// section extent when the codec returns a full nominal tile. Byte-valued
    /// codecs go through the pixel assembler keyed on the photometric
    /// interpretation.
    pub fn image(&self, section: &Section) -> Result<SectionImage, TiffError> {
        if self.codec.is_image_codec() {
            let compressed = self.compressed_data(section)?;
            let decoded = self.codec.decode_image(&compressed, self.photometric)?;

            let decoded = if decoded.width() > section.width || decoded.height() > section.height {
                decoded.crop_imm(0, 0, section.width, section.height)
            } else {
                decoded
            };
            return Ok(SectionImage::Decoded(decoded));
        }

        let data = self.data(section)?;
        pixels::assemble(
            self.photometric,
            &self.bits_per_sample,
            self.samples_per_pixel,
            self.byte_order,
            data,
            section.width,
            section.height,
        )
    }

    // -------------------------------------------------------------------------
    // Metadata accessors
    // -------------------------------------------------------------------------

    /// Raw compression identifier.
    pub fn compression_id(&self) -> u16 {
        self.compression_id
    }

    /// The compression, when it is one of the baseline schemes.
    pub fn compression(&self) -> Option<Compression> {
        Compression::from_u16(self.compression_id)
    }

    /// How decoded samples map to display colour.
    pub fn photometric_interpretation(&self) -> PhotometricInterpretation {
        self.photometric
    }

    /// The predictor applied before compression.
    pub fn predictor(&self) -> Predictor {
        self.predictor
    }

    /// Bits per sample, one entry per sample.
    pub fn bits_per_sample(&self) -> &[u16] {
        &self.bits_per_sample
    }

    /// Samples per pixel.
    pub fn samples_per_pixel(&self) -> u16 {
        self.samples_per_pixel
    }

    /// Byte order of the containing file.
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Size of one pixel in bytes across all samples.
    pub fn pixel_size_in_bytes(&self) -> u32 {
        (0..usize::from(self.samples_per_pixel))
            .map(|i| u32::from(self.bits_per_sample.get(i).copied().unwrap_or(8)) / 8)
            .sum()
    }

    /// The size of a pixel in x and y, with its unit.
    ///
    /// This is the inverse of the XResolution/YResolution rates.
    pub fn resolution(&self) -> Result<(f64, f64, ResolutionUnit), TiffError> {
        let unit_value = self.tags.u16_value(TiffTag::ResolutionUnit)?;
        let unit =
            ResolutionUnit::from_u16(unit_value).ok_or_else(|| TiffError::InvalidTagValue {
                tag: "ResolutionUnit",
                message: format!("unknown unit {unit_value}"),
            })?;

        let x = self
            .tags
            .rational_value(TiffTag::XResolution)
            .ok_or(TiffError::MissingTag(TiffTag::XResolution))?;
        let y = self
            .tags
            .rational_value(TiffTag::YResolution)
            .ok_or(TiffError::MissingTag(TiffTag::YResolution))?;

        if x.numerator == 0 || y.numerator == 0 {
            return Err(TiffError::InvalidTagValue {
                tag: "XResolution",
                message: "resolution rate with zero numerator".to_string(),
            });
        }

        Ok((
            f64::from(x.denominator) / f64::from(x.numerator),
            f64::from(y.denominator) / f64::from(y.numerator),
            unit,
        ))
    }

    /// The ImageDescription text, if present.
    pub fn description(&self) -> Option<&str> {
        self.tags.string_value(TiffTag::ImageDescription)
    }

    /// YCbCr chroma subsampling factors, if declared.
    pub fn ycbcr_subsampling(&self) -> Option<(u16, u16)> {
        let factors = self.tags.u16_array_opt(TiffTag::YCbCrSubSampling)?;
        Some((*factors.first()?, *factors.get(1)?))
    }

    /// Whether the reduced-resolution bit of NewSubFileType is set.
    pub fn is_reduced_resolution_image(&self) -> bool {
        self.tags
            .u32_opt(TiffTag::NewSubFileType)
            .map(|v| v & 0x1 == 1)
            .unwrap_or(false)
    }

    /// Look up a tag by raw numeric ID.
    pub fn tag(&self, id: u16) -> Option<&Tag> {
        self.tags.get(id)
    }

    /// Whether a known tag is present.
    pub fn has_tag(&self, tag: TiffTag) -> bool {
        self.tags.has_tag(tag)
    }

    /// The full tag set.
    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    pub(crate) fn next_ifd_offset(&self) -> u64 {
        self.next_ifd_offset
    }
}

impl std::fmt::Debug for ImageDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageDirectory")
            .field("dimensions", &self.image_dimensions())
            .field("tiled", &self.is_tiled())
            .field("compression", &self.compression_id)
            .field("photometric", &self.photometric)
            .field("tags", &self.tags.len())
            .finish()
    }
}

// =============================================================================
// Predictor inversion
// =============================================================================

/// Undo horizontal differencing in place.
///
/// Each sample becomes the wrapping sum of itself and the previous pixel's
/// matching sample: `decoded[x][k] += decoded[x - 1][k]`. Rows are
/// independent. 16-bit samples are re-read and re-written in the file's
/// byte order.
fn invert_horizontal_predictor(
    data: &mut [u8],
    width: u32,
    height: u32,
    samples: usize,
    bits: u16,
    byte_order: ByteOrder,
) {
    let width = width as usize;
    let height = height as usize;
    let row_samples = width * samples;

    match bits {
        8 => {
            for row in 0..height {
                let base = row * row_samples;
                if base + row_samples > data.len() {
                    break;
                }
                for col in samples..row_samples {
                    data[base + col] = data[base + col].wrapping_add(data[base + col - samples]);
                }
            }
        }
        16 => {
            for row in 0..height {
                let base = row * row_samples * 2;
                if base + row_samples * 2 > data.len() {
                    break;
                }
                for col in samples..row_samples {
                    let prev = byte_order.read_u16(&data[base + (col - samples) * 2..]);
                    let cur = byte_order.read_u16(&data[base + col * 2..]);
                    let sum = cur.wrapping_add(prev);
                    let bytes = match byte_order {
                        ByteOrder::LittleEndian => sum.to_le_bytes(),
                        ByteOrder::BigEndian => sum.to_be_bytes(),
                    };
                    data[base + col * 2..base + col * 2 + 2].copy_from_slice(&bytes);
                }
            }
        }
        other => {
            warn!(bits = other, "horizontal predictor unsupported at this bit depth");
        }
    }
}
