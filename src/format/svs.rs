//! Aperio SVS vendor adapter.
//!
//! An SVS file is a TIFF whose IFD chain follows a fixed convention:
//!
//! ```text
//! 0             full-resolution image (tiled RGB)
//! 1             thumbnail (the lowest-resolution level)
//! 2 ..= n-3     reduced-resolution levels, descending
//! n-2           overview (macro) image
//! n-1           label image
//! ```
//!
//! Metadata lives in the first IFD's ImageDescription as a `|`-separated
//! string of `key = value` pairs; `MPP` (microns per pixel) is the one the
//! pyramid layer needs, since SVS files carry no XResolution/YResolution
//! tags — per-level resolutions are synthesised from MPP instead.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::codec::{register_codec, JpegCodec};
use crate::error::TiffError;
use crate::format::tiff::{ImageDirectory, ResolutionUnit, TiffFile};

/// Aperio compression id 33003: JPEG with YCbCr colour.
pub const APERIO_YCBCR_JPEG: u16 = 33003;

/// Aperio compression id 33005: JPEG with RGB colour.
pub const APERIO_RGB_JPEG: u16 = 33005;

/// Microns per centimetre, for MPP-to-resolution conversion.
const MICRONS_PER_CM: f64 = 10_000.0;

// =============================================================================
// SvsMetadata
// =============================================================================

/// Metadata parsed from an SVS ImageDescription string.
///
/// Format: a banner line (`Aperio Image Library vXX`), then `|`-separated
/// `key = value` pairs.
#[derive(Debug, Clone, Default)]
pub struct SvsMetadata {
    /// Microns per pixel at full resolution
    pub mpp: Option<f64>,

    /// Objective magnification (e.g. 20, 40)
    pub magnification: Option<f64>,

    /// All key=value pairs from the description
    pub properties: HashMap<String, String>,

    /// The full description string
    pub description: String,
}

impl SvsMetadata {
    /// Parse an ImageDescription string.
    pub fn parse(description: &str) -> Self {
        let mut metadata = SvsMetadata {
            description: description.to_string(),
            ..Default::default()
        };

        for part in description.split('|') {
            let part = part.trim();
            let Some(eq) = part.find('=') else {
                continue;
            };

            let key = part[..eq].trim();
            let value = part[eq + 1..].trim();
            metadata
                .properties
                .insert(key.to_string(), value.to_string());

            match key {
                "MPP" => metadata.mpp = value.parse().ok(),
                "AppMag" => metadata.magnification = value.parse().ok(),
                _ => {}
            }
        }

        metadata
    }
}

// =============================================================================
// SvsFile
// =============================================================================

/// An opened Aperio SVS slide.
///
/// Wraps the generic [`TiffFile`] and resolves the SVS level ordering on
/// top of it; the generic API stays reachable through [`SvsFile::file`].
#[derive(Debug)]
pub struct SvsFile {
    file: TiffFile,
    metadata: SvsMetadata,
}

impl SvsFile {
    /// Open an SVS slide from a file path.
    ///
    /// Registers the Aperio compression identifiers before parsing, so
    /// levels compressed with them get a codec.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TiffError> {
        register_aperio_codecs();
        Self::from_file(TiffFile::open(path)?)
    }

    /// Adopt an already-opened container as an SVS slide.
    pub fn from_file(file: TiffFile) -> Result<Self, TiffError> {
        let metadata = file
            .ifd(0)
            .and_then(|ifd| ifd.description())
            .map(SvsMetadata::parse)
            .unwrap_or_default();

        debug!(mpp = ?metadata.mpp, levels = file.ifds().len(), "opened SVS slide");

        Ok(SvsFile { file, metadata })
    }

    /// The underlying generic container.
    pub fn file(&self) -> &TiffFile {
        &self.file
    }

    /// Parsed slide metadata.
    pub fn metadata(&self) -> &SvsMetadata {
        &self.metadata
    }

    /// Number of resolution levels, full resolution included. The overview
    /// and label images at the end of the chain are not levels.
    pub fn num_reduced_images(&self) -> usize {
        self.file.ifds().len().saturating_sub(2).max(1)
    }

    /// The `index`-th resolution level, largest first.
    ///
    /// Index 0 is the full-resolution IFD; the last index is the thumbnail,
    /// which the chain stores at position 1; the remaining levels sit at
    /// chain positions 2.. in descending size.
    pub fn reduced_image(&self, index: usize) -> Option<&ImageDirectory> {
        let count = self.num_reduced_images();
        if index >= count {
            return None;
        }

        match index {
            0 => self.file.ifd(0),
            _ if index == count - 1 => self.file.ifd(1),
            _ => self.file.ifd(index + 1),
        }
    }

    /// The overview (macro) image, when the chain carries one.
    pub fn overview(&self) -> Option<&ImageDirectory> {
        let len = self.file.ifds().len();
        if len < 4 {
            return None;
        }
        self.file.ifd(len - 2)
    }

    /// The slide label image, when the chain carries one.
    pub fn label(&self) -> Option<&ImageDirectory> {
        let len = self.file.ifds().len();
        if len < 4 {
            return None;
        }
        self.file.ifd(len - 1)
    }

    /// Pixel size of a level in x and y, synthesised from the slide MPP.
    ///
    /// The full-resolution pixel covers `MPP` microns; a level's pixel
    /// scales by the dimension ratio. Values are in centimetres.
    pub fn level_resolution(&self, index: usize) -> Option<(f64, f64, ResolutionUnit)> {
        let mpp = self.metadata.mpp?;
        let (full_width, full_height) = self.file.ifd(0)?.image_dimensions();
        let (width, height) = self.reduced_image(index)?.image_dimensions();

        let x = mpp * f64::from(full_width) / f64::from(width) / MICRONS_PER_CM;
        let y = mpp * f64::from(full_height) / f64::from(height) / MICRONS_PER_CM;

        Some((x, y, ResolutionUnit::Centimeter))
    }
}

/// Register codecs for the Aperio compression identifiers.
///
/// Both identifiers carry JPEG-framed payloads with the tables in
/// `JPEGTables`; registration is additive and process-wide.
pub fn register_aperio_codecs() {
    register_codec(APERIO_YCBCR_JPEG, |tags| {
        Ok(Box::new(JpegCodec::from_tags(tags)?))
    });
    register_codec(APERIO_RGB_JPEG, |tags| {
        Ok(Box::new(JpegCodec::from_tags(tags)?))
    });
}

// =============================================================================
// Tests
// =============================================================================
