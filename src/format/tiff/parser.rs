//! TIFF header and IFD structure parsing.
//!
//! # Header layout
//!
//! ## Classic TIFF (8 bytes)
//! ```text
//! Bytes 0-1: Byte order (0x4949 = "II" little-endian, 0x4D4D = "MM" big-endian)
//! Bytes 2-3: Version (42 = 0x002A)
//! Bytes 4-7: Offset to first IFD
//! ```
//!
//! ## BigTIFF (16 bytes)
//! ```text
//! Bytes 0-1:  Byte order
//! Bytes 2-3:  Version (43 = 0x002B)
//! Bytes 4-5:  Offset byte size (must be 8)
//! Bytes 6-7:  Reserved (must be 0)
//! Bytes 8-15: Offset to first IFD
//! ```
//!
//! An IFD is an entry count (`u16` classic / `u64` big), a run of fixed-width
//! entries (12 / 20 bytes), and a next-IFD offset (`u32` / `u64`); offset 0
//! terminates the chain.

use crate::error::TiffError;
use crate::io::{read_u16_be, read_u16_le, read_u32_be, read_u32_le, read_u64_be, read_u64_le};

use super::tags::FieldType;

/// Magic bytes for little-endian byte order ("II" for Intel)
const LITTLE_ENDIAN_MARKER: u16 = 0x4949;

/// Magic bytes for big-endian byte order ("MM" for Motorola)
const BIG_ENDIAN_MARKER: u16 = 0x4D4D;

/// Version number for classic TIFF
const CLASSIC_VERSION: u16 = 0x2A;

/// Version number for BigTIFF
const BIGTIFF_VERSION: u16 = 0x2B;

/// Size of a classic TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of a BigTIFF header in bytes
pub const BIGTIFF_HEADER_SIZE: usize = 16;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF file.
///
/// Declared in the first two bytes of the header; every multi-byte value in
/// the file is read respecting this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II")
    LittleEndian,
    /// Big-endian ("MM")
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from a byte slice using this byte order.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        match self {
            ByteOrder::LittleEndian => read_u16_le(bytes),
            ByteOrder::BigEndian => read_u16_be(bytes),
        }
    }

    /// Read a u32 from a byte slice using this byte order.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        match self {
            ByteOrder::LittleEndian => read_u32_le(bytes),
            ByteOrder::BigEndian => read_u32_be(bytes),
        }
    }

    /// Read a u64 from a byte slice using this byte order.
    #[inline]
    pub fn read_u64(self, bytes: &[u8]) -> u64 {
        match self {
            ByteOrder::LittleEndian => read_u64_le(bytes),
            ByteOrder::BigEndian => read_u64_be(bytes),
        }
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Parsed TIFF file header. Immutable after parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,

    /// Whether this is a BigTIFF file (64-bit offsets)
    pub is_bigtiff: bool,

    /// Offset to the first IFD
    pub first_ifd_offset: u64,
}

impl TiffHeader {
    /// Parse a TIFF header from raw bytes.
    ///
    /// `file_size` is used to validate the first IFD offset.
    ///
    /// # Errors
    /// - `InvalidHeader` if the byte-order marker is neither II nor MM
    /// - `UnsupportedVersion` if the version is neither 0x2A nor 0x2B
    /// - `InvalidOffsetSize` if a BigTIFF declares an offset size other than 8
    /// - `FileTooSmall` if there aren't enough bytes for the header
    /// - `InvalidIfdOffset` if the first IFD offset is outside the file
    pub fn parse(bytes: &[u8], file_size: u64) -> Result<Self, TiffError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::FileTooSmall {
                required: TIFF_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        // The marker bytes are symmetric, so the probe order is arbitrary.
        let marker = u16::from_le_bytes([bytes[0], bytes[1]]);
        let byte_order = match marker {
            LITTLE_ENDIAN_MARKER => ByteOrder::LittleEndian,
            BIG_ENDIAN_MARKER => ByteOrder::BigEndian,
            _ => return Err(TiffError::InvalidHeader(marker)),
        };

        let version = byte_order.read_u16(&bytes[2..4]);

        match version {
            CLASSIC_VERSION => {
                let first_ifd_offset = byte_order.read_u32(&bytes[4..8]) as u64;
                if first_ifd_offset >= file_size {
                    return Err(TiffError::InvalidIfdOffset(first_ifd_offset));
                }

                Ok(TiffHeader {
                    byte_order,
                    is_bigtiff: false,
                    first_ifd_offset,
                })
            }
            BIGTIFF_VERSION => {
                if bytes.len() < BIGTIFF_HEADER_SIZE {
                    return Err(TiffError::FileTooSmall {
                        required: BIGTIFF_HEADER_SIZE as u64,
                        actual: bytes.len() as u64,
                    });
                }

                let offset_size = byte_order.read_u16(&bytes[4..6]);
                if offset_size != 8 {
                    return Err(TiffError::InvalidOffsetSize(offset_size));
                }

                // Bytes 6-7 are reserved padding; tolerated if non-zero.

                let first_ifd_offset = byte_order.read_u64(&bytes[8..16]);
                if first_ifd_offset >= file_size {
                    return Err(TiffError::InvalidIfdOffset(first_ifd_offset));
                }

                Ok(TiffHeader {
                    byte_order,
                    is_bigtiff: true,
                    first_ifd_offset,
                })
            }
            _ => Err(TiffError::UnsupportedVersion(version)),
        }
    }

    /// Size of one IFD entry: 12 bytes classic, 20 bytes BigTIFF.
    #[inline]
    pub const fn entry_size(&self) -> usize {
        if self.is_bigtiff {
            20
        } else {
            12
        }
    }

    /// Size of the entry-count field at the start of an IFD.
    #[inline]
    pub const fn count_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            2
        }
    }

    /// Size of the next-IFD offset field at the end of an IFD.
    #[inline]
    pub const fn next_offset_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            4
        }
    }

    /// Size of the value/offset field in an entry; this is the inline
    /// packing threshold.
    #[inline]
    pub const fn value_field_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            4
        }
    }
}

// =============================================================================
// RawEntry
// =============================================================================

/// One IFD entry as stored on disk, before value materialisation.
///
/// Classic TIFF: `(tag: u16, type: u16, count: u32, value_or_offset: u32)`.
/// BigTIFF: `(tag: u16, type: u16, count: u64, value_or_offset: u64)`.
///
/// The value/offset field is kept as raw bytes in file order; inline values
/// are unpacked from it and out-of-line values interpret it as an offset.
#[derive(Debug, Clone)]
pub struct RawEntry {
    /// The numeric tag ID
    pub tag_id: u16,

    /// The declared field type, if recognised
    pub field_type: Option<FieldType>,

    /// Raw field type value (for logging and errors)
    pub field_type_raw: u16,

    /// Number of values (items, not bytes)
    pub count: u64,

    /// Raw bytes of the value/offset field: 4 (classic) or 8 (BigTIFF)
    pub value_field: Vec<u8>,
}

impl RawEntry {
    /// Parse one entry from its fixed-width byte representation.
    fn parse(bytes: &[u8], header: &TiffHeader) -> Self {
        let byte_order = header.byte_order;

        let tag_id = byte_order.read_u16(&bytes[0..2]);
        let field_type_raw = byte_order.read_u16(&bytes[2..4]);
        let field_type = FieldType::from_u16(field_type_raw);

        let (count, value_field) = if header.is_bigtiff {
            (byte_order.read_u64(&bytes[4..12]), bytes[12..20].to_vec())
        } else {
            (
                byte_order.read_u32(&bytes[4..8]) as u64,
                bytes[8..12].to_vec(),
            )
        };

        RawEntry {
            tag_id,
            field_type,
            field_type_raw,
            count,
            value_field,
        }
    }

    /// Whether the value is packed inline in the value/offset field.
    pub fn is_inline(&self, header: &TiffHeader) -> bool {
        self.field_type
            .map(|ft| ft.fits_inline(self.count, header.is_bigtiff))
            .unwrap_or(false)
    }

    /// The out-of-line payload offset (meaningless for inline values).
    pub fn value_offset(&self, byte_order: ByteOrder) -> u64 {
        if self.value_field.len() == 8 {
            byte_order.read_u64(&self.value_field)
        } else {
            byte_order.read_u32(&self.value_field) as u64
        }
    }

    /// Total byte size of the value payload, if the type is known.
    pub fn payload_size(&self) -> Option<u64> {
        self.field_type
            .map(|ft| ft.size_in_bytes() as u64 * self.count)
    }
}

// =============================================================================
// RawIfd
// =============================================================================

/// One IFD as scanned from disk: the entry run plus the next-IFD pointer.
///
/// Entries appear in file order. Value materialisation happens afterwards so
/// that out-of-line payload reads can be interleaved freely.
#[derive(Debug, Clone)]
pub struct RawIfd {
    /// All entries, in file order
    pub entries: Vec<RawEntry>,

    /// Offset of the next IFD (0 terminates the chain)
    pub next_ifd_offset: u64,
}

impl RawIfd {
    /// Parse an IFD block: entry count, entries, next-IFD offset.
    ///
    /// # Errors
    /// Returns `FileTooSmall` if the block is shorter than the declared
    /// entry count requires.
    pub fn parse(bytes: &[u8], header: &TiffHeader) -> Result<Self, TiffError> {
        let byte_order = header.byte_order;
        let count_size = header.count_size();
        let entry_size = header.entry_size();

        if bytes.len() < count_size {
            return Err(TiffError::FileTooSmall {
                required: count_size as u64,
                actual: bytes.len() as u64,
            });
        }

        let entry_count = if header.is_bigtiff {
            byte_order.read_u64(&bytes[0..8])
        } else {
            byte_order.read_u16(&bytes[0..2]) as u64
        };

        let entries_start = count_size;
        let next_offset_start =
            entries_start.saturating_add((entry_count as usize).saturating_mul(entry_size));
        let total_required = next_offset_start.saturating_add(header.next_offset_size());

        if bytes.len() < total_required {
            return Err(TiffError::FileTooSmall {
                required: total_required as u64,
                actual: bytes.len() as u64,
            });
        }

        let mut entries = Vec::with_capacity(entry_count as usize);
        for i in 0..entry_count as usize {
            let start = entries_start + i * entry_size;
            entries.push(RawEntry::parse(&bytes[start..start + entry_size], header));
        }

        let next_ifd_offset = if header.is_bigtiff {
            byte_order.read_u64(&bytes[next_offset_start..next_offset_start + 8])
        } else {
            byte_order.read_u32(&bytes[next_offset_start..next_offset_start + 4]) as u64
        };

        Ok(RawIfd {
            entries,
            next_ifd_offset,
        })
    }

    /// Bytes needed to hold an IFD with `entry_count` entries, so callers
    /// can pre-read the count and then fetch the whole block in one read.
    /// Saturates on absurd counts; the subsequent read fails range checks.
    pub fn block_size(entry_count: u64, header: &TiffHeader) -> usize {
        header
            .count_size()
            .saturating_add((entry_count as usize).saturating_mul(header.entry_size()))
            .saturating_add(header.next_offset_size())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn classic_header() -> TiffHeader {
        TiffHeader {
            byte_order: ByteOrder::LittleEndian,
            is_bigtiff: false,
            first_ifd_offset: 8,
        }
    }

    fn bigtiff_header() -> TiffHeader {
        TiffHeader {
            byte_order: ByteOrder::LittleEndian,
            is_bigtiff: true,
            first_ifd_offset: 16,
        }
    }

    #[test]
    fn test_parse_classic_little_endian() {
        let header = [0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];

        let parsed = TiffHeader::parse(&header, 1000).unwrap();
        assert_eq!(parsed.byte_order, ByteOrder::LittleEndian);
        assert!(!parsed.is_bigtiff);
        assert_eq!(parsed.first_ifd_offset, 8);
    }

    #[test]
    fn test_parse_classic_big_endian() {
        let header = [0x4D, 0x4D, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08];

        let parsed = TiffHeader::parse(&header, 1000).unwrap();
        assert_eq!(parsed.byte_order, ByteOrder::BigEndian);
        assert!(!parsed.is_bigtiff);
        assert_eq!(parsed.first_ifd_offset, 8);
    }

    #[test]
    fn test_parse_bigtiff_little_endian() {
        let header = [
            0x49, 0x49, // II
            0x2B, 0x00, // version 43
            0x08, 0x00, // offset size 8
            0x00, 0x00, // reserved
            0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // first IFD at 16
        ];

        let parsed = TiffHeader::parse(&header, 1000).unwrap();
        assert!(parsed.is_bigtiff);
        assert_eq!(parsed.first_ifd_offset, 16);
    }

    #[test]
    fn test_parse_bigtiff_big_endian() {
        let header = [
            0x4D, 0x4D, // MM
            0x00, 0x2B, // version 43
            0x00, 0x08, // offset size 8
            0x00, 0x00, // reserved
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10, // first IFD at 16
        ];

        let parsed = TiffHeader::parse(&header, 1000).unwrap();
        assert_eq!(parsed.byte_order, ByteOrder::BigEndian);
        assert!(parsed.is_bigtiff);
        assert_eq!(parsed.first_ifd_offset, 16);
    }

    #[test]
    fn test_parse_bigtiff_large_offset() {
        // 64-bit offset beyond 4GB
        let header = [
            0x49, 0x49, 0x2B, 0x00, 0x08, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00,
        ];

        let parsed = TiffHeader::parse(&header, 10_000_000_000).unwrap();
        assert_eq!(parsed.first_ifd_offset, 0x0000_0001_0000_0000);
    }

    #[test]
    fn test_parse_invalid_marker() {
        let header = [0x00, 0x00, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];

        let result = TiffHeader::parse(&header, 1000);
        assert!(matches!(result, Err(TiffError::InvalidHeader(0x0000))));
    }

    #[test]
    fn test_parse_unsupported_version() {
        let header = [0x49, 0x49, 0x2C, 0x00, 0x08, 0x00, 0x00, 0x00];

        let result = TiffHeader::parse(&header, 1000);
        assert!(matches!(result, Err(TiffError::UnsupportedVersion(0x2C))));
    }

    #[test]
    fn test_parse_bigtiff_bad_offset_size() {
        let header = [
            0x49, 0x49, 0x2B, 0x00, 0x04, 0x00, 0x00, 0x00, //
            0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let result = TiffHeader::parse(&header, 1000);
        assert!(matches!(result, Err(TiffError::InvalidOffsetSize(4))));
    }

    #[test]
    fn test_parse_header_too_small() {
        let result = TiffHeader::parse(&[0x49, 0x49, 0x2A, 0x00], 1000);
        assert!(matches!(
            result,
            Err(TiffError::FileTooSmall {
                required: 8,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_parse_ifd_offset_past_end() {
        let header = [0x49, 0x49, 0x2A, 0x00, 0xE8, 0x03, 0x00, 0x00];

        let result = TiffHeader::parse(&header, 500);
        assert!(matches!(result, Err(TiffError::InvalidIfdOffset(1000))));
    }

    #[test]
    fn test_structure_sizes() {
        let classic = classic_header();
        assert_eq!(classic.entry_size(), 12);
        assert_eq!(classic.count_size(), 2);
        assert_eq!(classic.next_offset_size(), 4);
        assert_eq!(classic.value_field_size(), 4);

        let big = bigtiff_header();
        assert_eq!(big.entry_size(), 20);
        assert_eq!(big.count_size(), 8);
        assert_eq!(big.next_offset_size(), 8);
        assert_eq!(big.value_field_size(), 8);
    }

    #[test]
    fn test_raw_entry_inline_short() {
        // ImageWidth = 1024, SHORT, count 1, inline
        let entry_bytes = [
            0x00, 0x01, // tag 256
            0x03, 0x00, // type SHORT
            0x01, 0x00, 0x00, 0x00, // count 1
            0x00, 0x04, 0x00, 0x00, // value 1024
        ];

        let header = classic_header();
        let entry = RawEntry::parse(&entry_bytes, &header);

        assert_eq!(entry.tag_id, 256);
        assert_eq!(entry.field_type, Some(FieldType::Short));
        assert_eq!(entry.count, 1);
        assert!(entry.is_inline(&header));
        assert_eq!(entry.payload_size(), Some(2));
    }

    #[test]
    fn test_raw_entry_out_of_line() {
        // TileOffsets, LONG, count 100 at offset 1000
        let entry_bytes = [
            0x44, 0x01, // tag 324
            0x04, 0x00, // type LONG
            0x64, 0x00, 0x00, 0x00, // count 100
            0xE8, 0x03, 0x00, 0x00, // offset 1000
        ];

        let header = classic_header();
        let entry = RawEntry::parse(&entry_bytes, &header);

        assert_eq!(entry.tag_id, 324);
        assert!(!entry.is_inline(&header));
        assert_eq!(entry.value_offset(header.byte_order), 1000);
        assert_eq!(entry.payload_size(), Some(400));
    }

    #[test]
    fn test_raw_entry_bigtiff_long8() {
        let entry_bytes = [
            0x00, 0x01, // tag 256
            0x10, 0x00, // type LONG8
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // count 1
            0xA0, 0x86, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, // value 100000
        ];

        let header = bigtiff_header();
        let entry = RawEntry::parse(&entry_bytes, &header);

        assert_eq!(entry.field_type, Some(FieldType::Long8));
        assert!(entry.is_inline(&header));
        assert_eq!(entry.value_field.len(), 8);
    }

    #[test]
    fn test_raw_entry_unknown_type() {
        let entry_bytes = [
            0x00, 0x01, // tag 256
            0x63, 0x00, // type 99
            0x01, 0x00, 0x00, 0x00, //
            0x00, 0x00, 0x00, 0x00,
        ];

        let header = classic_header();
        let entry = RawEntry::parse(&entry_bytes, &header);

        assert_eq!(entry.field_type, None);
        assert_eq!(entry.field_type_raw, 99);
        assert!(!entry.is_inline(&header));
        assert_eq!(entry.payload_size(), None);
    }

    #[test]
    fn test_raw_ifd_parse_classic() {
        let ifd_bytes = [
            // entry count = 2
            0x02, 0x00, //
            // ImageWidth (256) = 1024
            0x00, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00,
            // ImageLength (257) = 768
            0x01, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00,
            // next IFD offset = 500
            0xF4, 0x01, 0x00, 0x00,
        ];

        let header = classic_header();
        let ifd = RawIfd::parse(&ifd_bytes, &header).unwrap();

        assert_eq!(ifd.entries.len(), 2);
        assert_eq!(ifd.entries[0].tag_id, 256);
        assert_eq!(ifd.entries[1].tag_id, 257);
        assert_eq!(ifd.next_ifd_offset, 500);
    }

    #[test]
    fn test_raw_ifd_parse_bigtiff() {
        let ifd_bytes = [
            // entry count = 1 (8 bytes)
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            // ImageWidth (256) = 50000, LONG
            0x00, 0x01, 0x04, 0x00, //
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            0x50, 0xC3, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
            // next IFD offset = 0
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];

        let header = bigtiff_header();
        let ifd = RawIfd::parse(&ifd_bytes, &header).unwrap();

        assert_eq!(ifd.entries.len(), 1);
        assert_eq!(ifd.entries[0].count, 1);
        assert_eq!(ifd.next_ifd_offset, 0);
    }

    #[test]
    fn test_raw_ifd_parse_big_endian() {
        let ifd_bytes = [
            // entry count = 1
            0x00, 0x01, //
            // ImageWidth = 2048, SHORT
            0x01, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x08, 0x00, 0x00, 0x00,
            // next IFD = 0
            0x00, 0x00, 0x00, 0x00,
        ];

        let header = TiffHeader {
            byte_order: ByteOrder::BigEndian,
            is_bigtiff: false,
            first_ifd_offset: 8,
        };

        let ifd = RawIfd::parse(&ifd_bytes, &header).unwrap();
        assert_eq!(ifd.entries.len(), 1);
        assert_eq!(ifd.entries[0].tag_id, 256);
        assert_eq!(
            header.byte_order.read_u16(&ifd.entries[0].value_field[..2]),
            2048
        );
    }

    #[test]
    fn test_raw_ifd_truncated() {
        // Declares 5 entries but provides two
        let ifd_bytes = [
            0x05, 0x00, //
            0x00, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, //
            0x01, 0x01, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00,
        ];

        let result = RawIfd::parse(&ifd_bytes, &classic_header());
        assert!(matches!(result, Err(TiffError::FileTooSmall { .. })));
    }

    #[test]
    fn test_block_size() {
        // Classic: 2 + 10*12 + 4
        assert_eq!(RawIfd::block_size(10, &classic_header()), 126);
        // BigTIFF: 8 + 10*20 + 8
        assert_eq!(RawIfd::block_size(10, &bigtiff_header()), 216);
    }
}
