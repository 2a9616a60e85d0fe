//! slide-tiff — a reader for TIFF-family bio-imaging containers.
//!
//! Whole-slide microscopy files are pluri-resolution TIFF or BigTIFF
//! containers far too large to read into memory. This crate gives random
//! access to arbitrary regions of the pixel grid by decoding only the
//! enclosing strips or tiles (*sections*) on demand:
//!
//! ```no_run
//! use slide_tiff::TiffFile;
//!
//! # fn main() -> Result<(), slide_tiff::TiffError> {
//! let file = TiffFile::open("slide.tiff")?;
//! let ifd = file.ifds().first().expect("no images in container");
//!
//! let section = ifd.section_at(40_000, 25_000)?;
//! let pixels = ifd.data(&section)?;
//! # Ok(())
//! # }
//! ```
//!
//! Vendor dialects layer on top of the generic API: [`SvsFile`] resolves the
//! Aperio SVS level ordering and MPP metadata, [`QptiffFile`] groups
//! PerkinElmer QPTIFF fluorescence bands by filter.
//!
//! Decoding is thread-friendly: all parsed structures are immutable after
//! open, and the per-file mutex is held only for the seek + read pair, so
//! concurrent section decompressions overlap.

pub mod codec;
pub mod error;
pub mod format;
pub mod io;

// Re-export the common surface at the crate root
pub use codec::{register_codec, Codec, CodecFactory};
pub use error::{IoError, TiffError};
pub use format::tiff::{
    ByteOrder, Compression, DataLayout, FieldType, ImageDirectory, PhotometricInterpretation,
    Predictor, RationalNumber, ResolutionUnit, Section, SectionImage, Tag, TagSet, TagValue,
    TiffFile, TiffHeader, TiffTag,
};
pub use format::{detect_format, QptiffFile, SlideFormat, SvsFile, SvsMetadata};
pub use io::{FileReader, MemoryReader, RangeReader};
