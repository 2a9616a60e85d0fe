//! JPEG stream utilities for abbreviated section payloads.
//!
//! SVS and plain JPEG-in-TIFF files store each section as an "abbreviated"
//! JPEG stream: the entropy-coded data is present but the quantisation (DQT)
//! and Huffman (DHT) tables live once in the `JPEGTables` tag. Before a
//! standard decoder can touch a section, the two streams are spliced:
//!
//! ```text
//! JPEGTables:   SOI <tables...> EOI
//! Section:      SOI <scan...>   EOI
//! Merged:       SOI <tables...> <scan...> EOI
//! ```

use bytes::{Bytes, BytesMut};

/// Start Of Image marker
pub const SOI: [u8; 2] = [0xFF, 0xD8];

/// End Of Image marker
pub const EOI: [u8; 2] = [0xFF, 0xD9];

/// Define Huffman Table marker
pub const DHT: [u8; 2] = [0xFF, 0xC4];

/// Define Quantization Table marker
pub const DQT: [u8; 2] = [0xFF, 0xDB];

/// Start Of Scan marker
pub const SOS: [u8; 2] = [0xFF, 0xDA];

/// Check whether a JPEG payload is an abbreviated stream.
///
/// An abbreviated stream starts with SOI and reaches SOS without passing a
/// DQT or DHT marker, so it cannot be decoded without external tables.
pub fn is_abbreviated_stream(data: &[u8]) -> bool {
    if data.len() < 4 || data[0..2] != SOI {
        return false;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }

        let marker = [data[pos], data[pos + 1]];
        if marker == DQT || marker == DHT {
            return false;
        }
        if marker == SOS {
            return true;
        }

        // Skip the marker segment: marker, 2-byte length, payload. Stuffed
        // 0xFF00 bytes and the standalone SOI/EOI markers have no length.
        if pos + 3 < data.len() && marker[1] != 0x00 && marker[1] != 0xD8 && marker[1] != 0xD9 {
            let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
            pos += 2 + length;
        } else {
            pos += 2;
        }
    }

    false
}

/// Splice `JPEGTables` content with an abbreviated section stream.
///
/// Strips the trailing EOI from the tables and the leading SOI from the
/// section, then concatenates. The result keeps proper JPEG structure:
/// SOI + tables + scan data + EOI.
pub fn merge_jpeg_tables(tables: &[u8], section: &[u8]) -> Bytes {
    if tables.is_empty() {
        return Bytes::copy_from_slice(section);
    }
    if section.is_empty() {
        return Bytes::new();
    }

    let tables_end = if tables.len() >= 2 && tables[tables.len() - 2..] == EOI {
        tables.len() - 2
    } else {
        tables.len()
    };

    let section_start = if section.len() >= 2 && section[0..2] == SOI {
        2
    } else {
        0
    };

    let mut merged = BytesMut::with_capacity(tables_end + section.len() - section_start);
    merged.extend_from_slice(&tables[..tables_end]);
    merged.extend_from_slice(&section[section_start..]);
    merged.freeze()
}

/// Produce a decodable JPEG stream for one section.
///
/// Sections that already carry their tables pass through untouched; sections
/// without tables are merged with the cached `JPEGTables` content when one
/// is available.
pub fn prepare_section_jpeg(tables: Option<&[u8]>, section: &[u8]) -> Bytes {
    match tables {
        Some(tables) if is_abbreviated_stream(section) => merge_jpeg_tables(tables, section),
        _ => Bytes::copy_from_slice(section),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abbreviated_section() -> Vec<u8> {
        // SOI, SOF0 stub, SOS, scan bytes, EOI — no DQT/DHT
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x05, 0x08, 0x00, 0x01]);
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02]);
        data.extend_from_slice(&[0x12, 0x34, 0x56]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    fn tables() -> Vec<u8> {
        // SOI, DQT stub, EOI
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x03, 0x00]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn test_is_abbreviated_stream() {
        assert!(is_abbreviated_stream(&abbreviated_section()));
        assert!(!is_abbreviated_stream(&tables()));
        assert!(!is_abbreviated_stream(&[0x00, 0x01, 0x02, 0x03]));
        assert!(!is_abbreviated_stream(&[]));
    }

    #[test]
    fn test_merge_strips_markers() {
        let merged = merge_jpeg_tables(&tables(), &abbreviated_section());

        // Starts with SOI exactly once
        assert_eq!(&merged[0..2], &SOI);
        assert_ne!(&merged[2..4], &SOI);

        // DQT from the tables precedes the SOS from the section
        let dqt = merged.windows(2).position(|w| w == DQT).unwrap();
        let sos = merged.windows(2).position(|w| w == SOS).unwrap();
        assert!(dqt < sos);

        // Single EOI at the end
        assert_eq!(&merged[merged.len() - 2..], &EOI);
        assert_eq!(merged.windows(2).filter(|w| *w == EOI).count(), 1);
    }

    #[test]
    fn test_merge_empty_inputs() {
        assert_eq!(merge_jpeg_tables(&[], &[1, 2, 3])[..], [1, 2, 3]);
        assert!(merge_jpeg_tables(&tables(), &[]).is_empty());
    }

    #[test]
    fn test_prepare_passes_complete_stream_through() {
        let complete = tables();
        let prepared = prepare_section_jpeg(Some(&[0xFF, 0xD8, 0xFF, 0xD9]), &complete);
        assert_eq!(&prepared[..], &complete[..]);
    }

    #[test]
    fn test_prepare_merges_abbreviated_stream() {
        let prepared = prepare_section_jpeg(Some(&tables()), &abbreviated_section());
        assert!(prepared.len() > abbreviated_section().len());
        assert!(prepared.windows(2).any(|w| w == DQT));
    }

    #[test]
    fn test_prepare_without_tables() {
        let section = abbreviated_section();
        let prepared = prepare_section_jpeg(None, &section);
        assert_eq!(&prepared[..], &section[..]);
    }
}
