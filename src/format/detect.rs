//! Slide format detection.
//!
//! Vendor dialects of TIFF are told apart by markers in the first IFD's
//! ImageDescription: Aperio SVS carries an "Aperio" banner, PerkinElmer
//! QPTIFF carries XML with an `ImageType` element. Detection parses only
//! the header and the first IFD, so it works on files whose vendor
//! compression would make a full generic open fail.

use crate::error::TiffError;
use crate::format::tiff::values::materialise_entry;
use crate::format::tiff::{RawIfd, TiffHeader, TiffTag, BIGTIFF_HEADER_SIZE};
use crate::io::RangeReader;

/// Marker string for Aperio SVS files.
const APERIO_MARKER: &str = "Aperio";

/// Marker element for PerkinElmer QPTIFF descriptions.
const QPTIFF_MARKER: &str = "<ImageType>";

/// Detected slide dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideFormat {
    /// Aperio SVS
    AperioSvs,
    /// PerkinElmer QPTIFF
    Qptiff,
    /// Plain TIFF/BigTIFF with the generic pyramid convention
    GenericTiff,
}

impl SlideFormat {
    /// A human-readable name for the format.
    pub const fn name(&self) -> &'static str {
        match self {
            SlideFormat::AperioSvs => "Aperio SVS",
            SlideFormat::Qptiff => "PerkinElmer QPTIFF",
            SlideFormat::GenericTiff => "Generic TIFF",
        }
    }
}

/// Detect the dialect of a TIFF container by examining its first IFD.
pub fn detect_format(reader: &dyn RangeReader) -> Result<SlideFormat, TiffError> {
    let head_len = (BIGTIFF_HEADER_SIZE as u64).min(reader.size()) as usize;
    let head_bytes = reader.read_exact_at(0, head_len)?;
    let header = TiffHeader::parse(&head_bytes, reader.size())?;

    let offset = header.first_ifd_offset;
    let count_bytes = reader.read_exact_at(offset, header.count_size())?;
    let entry_count = if header.is_bigtiff {
        header.byte_order.read_u64(&count_bytes)
    } else {
        u64::from(header.byte_order.read_u16(&count_bytes))
    };

    let block = reader.read_exact_at(offset, RawIfd::block_size(entry_count, &header))?;
    let raw = RawIfd::parse(&block, &header)?;

    let description = raw
        .entries
        .iter()
        .find(|entry| entry.tag_id == TiffTag::ImageDescription.as_u16())
        .map(|entry| materialise_entry(entry, &header, reader))
        .transpose()?
        .flatten()
        .and_then(|tag| tag.value.as_str().map(str::to_owned));

    Ok(match description {
        Some(text) if text.contains(APERIO_MARKER) => SlideFormat::AperioSvs,
        Some(text) if text.contains(QPTIFF_MARKER) => SlideFormat::Qptiff,
        _ => SlideFormat::GenericTiff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(SlideFormat::AperioSvs.name(), "Aperio SVS");
        assert_eq!(SlideFormat::Qptiff.name(), "PerkinElmer QPTIFF");
        assert_eq!(SlideFormat::GenericTiff.name(), "Generic TIFF");
    }
}
