//! Pixel assembly: decoded sample bytes to typed images.
//!
//! Byte-valued codecs hand back a flat sample slab; this module shapes it
//! into an image buffer according to the photometric interpretation.
//! YCbCr payloads are not assembled here — image-valued codecs (JPEG)
//! perform their own colour conversion.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage, RgbaImage};
use tracing::warn;

use crate::error::TiffError;

use super::parser::ByteOrder;
use super::tags::PhotometricInterpretation;

/// A typed image over one section's rectangle.
#[derive(Debug, Clone)]
pub enum SectionImage {
    /// 8-bit grayscale
    Gray8(GrayImage),
    /// 16-bit grayscale
    Gray16(ImageBuffer<Luma<u16>, Vec<u16>>),
    /// 32-bit grayscale
    Gray32(ImageBuffer<Luma<u32>, Vec<u32>>),
    /// 8-bit interleaved RGB
    Rgb8(RgbImage),
    /// 8-bit interleaved RGBA passthrough
    Rgba8(RgbaImage),
    /// Image produced directly by the section's codec
    Decoded(DynamicImage),
}

impl SectionImage {
    /// Pixel extent of the image.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            SectionImage::Gray8(img) => img.dimensions(),
            SectionImage::Gray16(img) => img.dimensions(),
            SectionImage::Gray32(img) => img.dimensions(),
            SectionImage::Rgb8(img) => img.dimensions(),
            SectionImage::Rgba8(img) => img.dimensions(),
            SectionImage::Decoded(img) => (img.width(), img.height()),
        }
    }
}

/// Assemble decoded bytes into a typed image for one section.
///
/// A decode shorter than `width × height × pixel_size` is reported at warn
/// level and zero-padded; partially-written files produce such sections.
pub(crate) fn assemble(
    photometric: PhotometricInterpretation,
    bits_per_sample: &[u16],
    samples_per_pixel: u16,
    byte_order: ByteOrder,
    mut data: Vec<u8>,
    width: u32,
    height: u32,
) -> Result<SectionImage, TiffError> {
    let bits = bits_per_sample.first().copied().unwrap_or(8);
    let bytes_per_sample = usize::from(bits / 8).max(1);
    let expected = width as usize * height as usize * usize::from(samples_per_pixel) * bytes_per_sample;

    if data.len() < expected {
        warn!(
            expected,
            actual = data.len(),
            "section decode truncated, zero-padding"
        );
        data.resize(expected, 0);
    } else if data.len() > expected {
        data.truncate(expected);
    }

    match photometric {
        PhotometricInterpretation::WhiteIsZero | PhotometricInterpretation::BlackIsZero => {
            if samples_per_pixel != 1 {
                return Err(TiffError::InvalidTagValue {
                    tag: "SamplesPerPixel",
                    message: format!(
                        "grayscale assembly expects 1 sample per pixel, found {samples_per_pixel}"
                    ),
                });
            }
            assemble_gray(bits, byte_order, data, width, height)
        }
        PhotometricInterpretation::Rgb => match samples_per_pixel {
            3 => {
                let img = RgbImage::from_raw(width, height, data).ok_or(buffer_error())?;
                Ok(SectionImage::Rgb8(img))
            }
            4 => {
                let img = RgbaImage::from_raw(width, height, data).ok_or(buffer_error())?;
                Ok(SectionImage::Rgba8(img))
            }
            other => Err(TiffError::InvalidTagValue {
                tag: "SamplesPerPixel",
                message: format!("RGB assembly expects 3 or 4 samples per pixel, found {other}"),
            }),
        },
        other => Err(TiffError::UnsupportedPhotometric(other)),
    }
}

fn assemble_gray(
    bits: u16,
    byte_order: ByteOrder,
    data: Vec<u8>,
    width: u32,
    height: u32,
) -> Result<SectionImage, TiffError> {
    match bits {
        8 => {
            let img = GrayImage::from_raw(width, height, data).ok_or(buffer_error())?;
            Ok(SectionImage::Gray8(img))
        }
        16 => {
            let samples = data
                .chunks_exact(2)
                .map(|pair| byte_order.read_u16(pair))
                .collect();
            let img = ImageBuffer::from_raw(width, height, samples).ok_or(buffer_error())?;
            Ok(SectionImage::Gray16(img))
        }
        32 => {
            let samples = data
                .chunks_exact(4)
                .map(|quad| byte_order.read_u32(quad))
                .collect();
            let img = ImageBuffer::from_raw(width, height, samples).ok_or(buffer_error())?;
            Ok(SectionImage::Gray32(img))
        }
        other => Err(TiffError::InvalidTagValue {
            tag: "BitsPerSample",
            message: format!("grayscale assembly supports 8, 16, or 32 bits, found {other}"),
        }),
    }
}

fn buffer_error() -> TiffError {
    TiffError::InvalidTagValue {
        tag: "BitsPerSample",
        message: "decoded byte count does not match the section extent".to_string(),
    }
}
