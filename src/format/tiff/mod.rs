//! TIFF and BigTIFF container parsing.
//!
//! # Key concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian,
//!   MM = big-endian) in the header; all multi-byte values are read
//!   respecting it.
//!
//! - **Classic TIFF vs BigTIFF**: classic files use 32-bit offsets (4 GB
//!   ceiling), BigTIFF uses 64-bit. The parser handles both; the inline
//!   packing threshold, entry width, and pointer width follow the variant.
//!
//! - **IFD (Image File Directory)**: one logical image's tags and data
//!   pointers. Bio-imaging files chain many IFDs: pyramid levels, labels,
//!   overviews.
//!
//! - **Section**: the unified name for one strip or one tile — the smallest
//!   on-disk unit of pixel payload, decoded on demand.

mod directory;
mod file;
mod layout;
mod parser;
mod pixels;
mod tags;
pub(crate) mod values;

pub use directory::{ImageDirectory, TagSet};
pub use file::TiffFile;
pub use layout::{DataLayout, Section};
pub use parser::{
    ByteOrder, RawEntry, RawIfd, TiffHeader, BIGTIFF_HEADER_SIZE, TIFF_HEADER_SIZE,
};
pub use pixels::SectionImage;
pub use tags::{
    Compression, FieldType, PhotometricInterpretation, Predictor, ResolutionUnit, TiffTag,
};
pub use values::{RationalNumber, Tag, TagValue};
