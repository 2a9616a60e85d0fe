//! Container formats: the TIFF core and the vendor dialects layered on it.
//!
//! - [`tiff`] — the generic TIFF/BigTIFF reader: header, IFDs, layouts,
//!   section decoding.
//! - [`svs`] — Aperio SVS: pyramid ordering, MPP metadata, JPEGTables.
//! - [`qptiff`] — PerkinElmer QPTIFF: per-filter bands from XML metadata.
//! - [`detect`] — tells the dialects apart from the first IFD.
//! - [`jpeg`] — splicing of abbreviated JPEG streams with cached tables.

pub mod detect;
pub mod jpeg;
pub mod qptiff;
pub mod svs;
pub mod tiff;

pub use detect::{detect_format, SlideFormat};
pub use qptiff::{QptiffBand, QptiffFile, QptiffImageType};
pub use svs::{register_aperio_codecs, SvsFile, SvsMetadata};
