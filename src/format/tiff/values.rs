//! Tag value materialisation.
//!
//! Raw IFD entries either pack their payload inline in the value/offset
//! field (≤ 4 bytes for classic TIFF, ≤ 8 for BigTIFF) or point at an
//! out-of-line run elsewhere in the file. This module turns a `RawEntry`
//! into a typed [`Tag`] carrying a decoded [`TagValue`].
//!
//! Inline payloads are unpacked from the raw field *bytes* in file order:
//! each packed value occupies its own width starting from the front of the
//! field, for both byte orders. The one deliberate exception is the BigTIFF
//! inline rational, whose two halves are split the way the classification in
//! the data model describes (denominator in the first four field bytes,
//! numerator in the second four).

use tracing::debug;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{ByteOrder, RawEntry, TiffHeader};
use super::tags::{FieldType, TiffTag};

// =============================================================================
// RationalNumber
// =============================================================================

/// An unsigned rational: numerator over denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RationalNumber {
    pub numerator: u32,
    pub denominator: u32,
}

impl RationalNumber {
    /// The rational as a float. The denominator must be non-zero for any
    /// rational used as a divisor downstream.
    pub fn value(&self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }
}

// =============================================================================
// TagValue
// =============================================================================

/// A decoded tag payload.
///
/// The variant follows the declared field type; the array length always
/// equals the entry's item count.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Byte(Vec<u8>),
    Ascii(String),
    Short(Vec<u16>),
    Long(Vec<u32>),
    Rational(Vec<RationalNumber>),
    Long8(Vec<u64>),
    Undefined(Vec<u8>),
}

impl TagValue {
    /// Number of items stored in the value.
    pub fn count(&self) -> usize {
        match self {
            TagValue::Byte(v) | TagValue::Undefined(v) => v.len(),
            TagValue::Ascii(s) => s.len(),
            TagValue::Short(v) => v.len(),
            TagValue::Long(v) => v.len(),
            TagValue::Rational(v) => v.len(),
            TagValue::Long8(v) => v.len(),
        }
    }

    /// First item as u16. Shorts only.
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            TagValue::Short(v) => v.first().copied(),
            _ => None,
        }
    }

    /// First item as u32; Short values are widened with zero-extension.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            TagValue::Short(v) => v.first().map(|&s| u32::from(s)),
            TagValue::Long(v) => v.first().copied(),
            _ => None,
        }
    }

    /// First item as u64; Short and Long values are widened.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            TagValue::Short(v) => v.first().map(|&s| u64::from(s)),
            TagValue::Long(v) => v.first().map(|&l| u64::from(l)),
            TagValue::Long8(v) => v.first().copied(),
            _ => None,
        }
    }

    /// All items as i64. Accepts Short, Long, and Long8 payloads; this is
    /// the coercion used for offset and byte-count arrays. Long8 values
    /// above `i64::MAX` are unrepresentable and rejected by the cast.
    pub fn as_i64_array(&self) -> Option<Vec<i64>> {
        match self {
            TagValue::Short(v) => Some(v.iter().map(|&s| i64::from(s)).collect()),
            TagValue::Long(v) => Some(v.iter().map(|&l| i64::from(l)).collect()),
            TagValue::Long8(v) => v.iter().map(|&l| i64::try_from(l).ok()).collect(),
            _ => None,
        }
    }

    /// The Short array, if that is the stored type.
    pub fn as_u16_array(&self) -> Option<&[u16]> {
        match self {
            TagValue::Short(v) => Some(v),
            _ => None,
        }
    }

    /// The text payload, if ASCII.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Ascii(s) => Some(s),
            _ => None,
        }
    }

    /// The raw byte payload, if Byte or Undefined.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            TagValue::Byte(v) | TagValue::Undefined(v) => Some(v),
            _ => None,
        }
    }

    /// The first rational, if that is the stored type.
    pub fn as_rational(&self) -> Option<RationalNumber> {
        match self {
            TagValue::Rational(v) => v.first().copied(),
            _ => None,
        }
    }
}

// =============================================================================
// Tag
// =============================================================================

/// A materialised tag: numeric ID, declared type, decoded value.
#[derive(Debug, Clone)]
pub struct Tag {
    /// Raw numeric tag ID (unknown IDs are preserved)
    pub id: u16,

    /// Declared field type
    pub field_type: FieldType,

    /// Decoded payload
    pub value: TagValue,
}

impl Tag {
    /// The known tag for this ID, if recognised.
    pub fn tag(&self) -> Option<TiffTag> {
        TiffTag::from_u16(self.id)
    }

    /// Number of items stored in the tag.
    pub fn count(&self) -> usize {
        self.value.count()
    }
}

// =============================================================================
// Materialisation
// =============================================================================

/// Decode an entry's payload into a typed tag.
///
/// Returns `Ok(None)` for entries whose declared type is unknown or carries
/// no value mapping (signed/float types); those are logged and skipped so a
/// single odd tag never fails the open. I/O errors propagate.
pub(crate) fn materialise_entry(
    entry: &RawEntry,
    header: &TiffHeader,
    reader: &dyn RangeReader,
) -> Result<Option<Tag>, TiffError> {
    let Some(field_type) = entry.field_type else {
        debug!(
            tag = entry.tag_id,
            field_type = entry.field_type_raw,
            "skipping entry with unknown field type"
        );
        return Ok(None);
    };

    if !matches!(
        field_type,
        FieldType::Byte
            | FieldType::Ascii
            | FieldType::Short
            | FieldType::Long
            | FieldType::Rational
            | FieldType::Long8
            | FieldType::Undefined
    ) {
        debug!(
            tag = entry.tag_id,
            ?field_type,
            "skipping entry with unhandled field type"
        );
        return Ok(None);
    }

    let byte_order = header.byte_order;
    let size = field_type.size_in_bytes() as u64 * entry.count;
    let inline = entry.is_inline(header);

    let bytes = if inline {
        bytes::Bytes::copy_from_slice(&entry.value_field[..size as usize])
    } else {
        let offset = entry.value_offset(byte_order);
        reader.read_exact_at(offset, size as usize)?
    };

    let count = entry.count as usize;
    let value = match field_type {
        FieldType::Byte => TagValue::Byte(bytes.to_vec()),
        FieldType::Undefined => TagValue::Undefined(bytes.to_vec()),
        FieldType::Ascii => {
            // Zero-terminated text; the terminator may sit inside the inline
            // field. It is never surfaced to callers.
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            TagValue::Ascii(String::from_utf8_lossy(&bytes[..end]).into_owned())
        }
        FieldType::Short => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                values.push(byte_order.read_u16(&bytes[i * 2..]));
            }
            TagValue::Short(values)
        }
        FieldType::Long => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                values.push(byte_order.read_u32(&bytes[i * 4..]));
            }
            TagValue::Long(values)
        }
        FieldType::Long8 => {
            let mut values = Vec::with_capacity(count);
            for i in 0..count {
                values.push(byte_order.read_u64(&bytes[i * 8..]));
            }
            TagValue::Long8(values)
        }
        FieldType::Rational => {
            if inline {
                // BigTIFF inline rational: the field splits with the
                // denominator in its first four bytes and the numerator in
                // the second four, for both byte orders.
                TagValue::Rational(vec![RationalNumber {
                    numerator: byte_order.read_u32(&bytes[4..8]),
                    denominator: byte_order.read_u32(&bytes[0..4]),
                }])
            } else {
                let mut values = Vec::with_capacity(count);
                for i in 0..count {
                    values.push(RationalNumber {
                        numerator: byte_order.read_u32(&bytes[i * 8..]),
                        denominator: byte_order.read_u32(&bytes[i * 8 + 4..]),
                    });
                }
                TagValue::Rational(values)
            }
        }
        // Excluded by the matches! guard above.
        _ => unreachable!(),
    };

    Ok(Some(Tag {
        id: entry.tag_id,
        field_type,
        value,
    }))
}

// =============================================================================
// Tests
// =============================================================================
