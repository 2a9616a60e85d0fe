//! TIFF tag and field type definitions.
//!
//! This module defines the vocabulary for TIFF parsing:
//! - Field types that determine how values are encoded
//! - Tag IDs for the baseline TIFF 6.0 set used by bio-imaging files
//! - The enumerated values of the classification tags (compression,
//!   photometric interpretation, resolution unit, predictor)
//!
//! The definitions support both classic TIFF and BigTIFF.

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF field types that determine how values are encoded.
///
/// Each field type has a fixed per-item size, which decides whether a value
/// fits inline in an IFD entry and how arrays are read. The full TIFF 6.0
/// set plus the BigTIFF additions (`Long8`, `SLong8`, `Ifd8`) is recognised;
/// only a subset carries decoded values (see `TagValue`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer
    Byte = 1,
    /// 8-bit NUL-terminated text
    Ascii = 2,
    /// Unsigned 16-bit integer
    Short = 3,
    /// Unsigned 32-bit integer
    Long = 4,
    /// Two unsigned 32-bit integers: numerator, denominator
    Rational = 5,
    /// Signed 8-bit integer
    SByte = 6,
    /// Opaque byte data
    Undefined = 7,
    /// Signed 16-bit integer
    SShort = 8,
    /// Signed 32-bit integer
    SLong = 9,
    /// Two signed 32-bit integers
    SRational = 10,
    /// 32-bit IEEE float
    Float = 11,
    /// 64-bit IEEE float
    Double = 12,
    /// Unsigned 64-bit integer (BigTIFF)
    Long8 = 16,
    /// Signed 64-bit integer (BigTIFF)
    SLong8 = 17,
    /// 64-bit IFD offset (BigTIFF)
    Ifd8 = 18,
}

impl FieldType {
    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::SByte | FieldType::Undefined => 1,
            FieldType::Short | FieldType::SShort => 2,
            FieldType::Long | FieldType::SLong | FieldType::Float => 4,
            FieldType::Rational | FieldType::SRational | FieldType::Double => 8,
            FieldType::Long8 | FieldType::SLong8 | FieldType::Ifd8 => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for unknown type values; entries with unknown types
    /// are logged and skipped during parsing.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            6 => Some(FieldType::SByte),
            7 => Some(FieldType::Undefined),
            8 => Some(FieldType::SShort),
            9 => Some(FieldType::SLong),
            10 => Some(FieldType::SRational),
            11 => Some(FieldType::Float),
            12 => Some(FieldType::Double),
            16 => Some(FieldType::Long8),
            17 => Some(FieldType::SLong8),
            18 => Some(FieldType::Ifd8),
            _ => None,
        }
    }

    /// Check if a value with this type and count fits inline in the entry's
    /// value/offset field.
    ///
    /// Classic TIFF packs payloads of up to 4 bytes into the field;
    /// BigTIFF packs up to 8.
    #[inline]
    pub fn fits_inline(self, count: u64, is_bigtiff: bool) -> bool {
        let total = self.size_in_bytes() as u64 * count;
        let threshold = if is_bigtiff { 8 } else { 4 };
        total <= threshold
    }
}

// =============================================================================
// TIFF Tags
// =============================================================================

/// TIFF tag IDs recognised by the reader.
///
/// Unknown tag IDs are not an error; their entries are preserved keyed by the
/// raw numeric ID and simply carry no structural meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffTag {
    /// Bit 0 set marks a reduced-resolution copy of another image
    NewSubFileType = 254,
    /// Image width in pixels
    ImageWidth = 256,
    /// Image height (length) in pixels
    ImageLength = 257,
    /// Bits per sample, one value per sample
    BitsPerSample = 258,
    /// Compression scheme identifier
    Compression = 259,
    /// How decoded samples map to display colour
    PhotometricInterpretation = 262,
    /// Free-text description; carries vendor metadata in SVS and QPTIFF
    ImageDescription = 270,
    /// Scanner manufacturer
    Make = 271,
    /// Scanner model
    Model = 272,
    /// Byte offsets of strips (strip organisation)
    StripOffsets = 273,
    /// Image orientation
    Orientation = 274,
    /// Number of samples per pixel
    SamplesPerPixel = 277,
    /// Rows covered by each strip
    RowsPerStrip = 278,
    /// Byte counts of strips
    StripByteCounts = 279,
    /// Pixels per resolution unit in X
    XResolution = 282,
    /// Pixels per resolution unit in Y
    YResolution = 283,
    /// Chunky vs planar sample layout
    PlanarConfiguration = 284,
    /// X offset of the image origin
    XPosition = 286,
    /// Y offset of the image origin
    YPosition = 287,
    /// Unit for XResolution/YResolution
    ResolutionUnit = 296,
    /// Producing software
    Software = 305,
    /// Acquisition date/time
    DateTime = 306,
    /// Pre-compression transform (horizontal differencing)
    Predictor = 317,
    /// Width of each tile in pixels
    TileWidth = 322,
    /// Height (length) of each tile in pixels
    TileLength = 323,
    /// Byte offsets of tiles
    TileOffsets = 324,
    /// Byte counts of tiles
    TileByteCounts = 325,
    /// Sample data format (unsigned/signed/float)
    SampleFormat = 339,
    /// Minimum sample value
    SMinSampleValue = 340,
    /// Maximum sample value
    SMaxSampleValue = 341,
    /// Quantisation and Huffman tables for abbreviated JPEG streams
    JpegTables = 347,
    /// YCbCr chroma subsampling factors
    YCbCrSubSampling = 530,
    /// Reference black/white pairs for YCbCr
    ReferenceBlackWhite = 532,
}

impl TiffTag {
    /// Create a TiffTag from its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            254 => Some(TiffTag::NewSubFileType),
            256 => Some(TiffTag::ImageWidth),
            257 => Some(TiffTag::ImageLength),
            258 => Some(TiffTag::BitsPerSample),
            259 => Some(TiffTag::Compression),
            262 => Some(TiffTag::PhotometricInterpretation),
            270 => Some(TiffTag::ImageDescription),
            271 => Some(TiffTag::Make),
            272 => Some(TiffTag::Model),
            273 => Some(TiffTag::StripOffsets),
            274 => Some(TiffTag::Orientation),
            277 => Some(TiffTag::SamplesPerPixel),
            278 => Some(TiffTag::RowsPerStrip),
            279 => Some(TiffTag::StripByteCounts),
            282 => Some(TiffTag::XResolution),
            283 => Some(TiffTag::YResolution),
            284 => Some(TiffTag::PlanarConfiguration),
            286 => Some(TiffTag::XPosition),
            287 => Some(TiffTag::YPosition),
            296 => Some(TiffTag::ResolutionUnit),
            305 => Some(TiffTag::Software),
            306 => Some(TiffTag::DateTime),
            317 => Some(TiffTag::Predictor),
            322 => Some(TiffTag::TileWidth),
            323 => Some(TiffTag::TileLength),
            324 => Some(TiffTag::TileOffsets),
            325 => Some(TiffTag::TileByteCounts),
            339 => Some(TiffTag::SampleFormat),
            340 => Some(TiffTag::SMinSampleValue),
            341 => Some(TiffTag::SMaxSampleValue),
            347 => Some(TiffTag::JpegTables),
            530 => Some(TiffTag::YCbCrSubSampling),
            532 => Some(TiffTag::ReferenceBlackWhite),
            _ => None,
        }
    }

    /// The numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

// =============================================================================
// Compression
// =============================================================================

/// Baseline TIFF compression scheme identifiers.
///
/// Vendor dialects may register additional identifiers with the codec
/// registry; those stay as raw `u16` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Compression {
    /// No compression
    Uncompressed = 1,
    /// CCITT modified Huffman RLE
    Ccitt1d = 2,
    /// CCITT Group 3 fax
    CcittGroup3 = 3,
    /// CCITT Group 4 fax
    CcittGroup4 = 4,
    /// LZW
    Lzw = 5,
    /// "Old-style" JPEG (rarely used)
    OldJpeg = 6,
    /// JPEG
    Jpeg = 7,
    /// Deflate/zlib
    Deflate = 8,
    /// PackBits run-length
    PackBits = 32773,
}

impl Compression {
    /// Create a Compression from its numeric value.
    ///
    /// Value 0 is treated as uncompressed, matching files that omit the
    /// distinction.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 | 1 => Some(Compression::Uncompressed),
            2 => Some(Compression::Ccitt1d),
            3 => Some(Compression::CcittGroup3),
            4 => Some(Compression::CcittGroup4),
            5 => Some(Compression::Lzw),
            6 => Some(Compression::OldJpeg),
            7 => Some(Compression::Jpeg),
            8 => Some(Compression::Deflate),
            32773 => Some(Compression::PackBits),
            _ => None,
        }
    }

    /// A human-readable name for the compression scheme.
    pub const fn name(self) -> &'static str {
        match self {
            Compression::Uncompressed => "Uncompressed",
            Compression::Ccitt1d => "CCITT 1D",
            Compression::CcittGroup3 => "CCITT Group 3",
            Compression::CcittGroup4 => "CCITT Group 4",
            Compression::Lzw => "LZW",
            Compression::OldJpeg => "Old JPEG",
            Compression::Jpeg => "JPEG",
            Compression::Deflate => "Deflate",
            Compression::PackBits => "PackBits",
        }
    }
}

// =============================================================================
// Photometric Interpretation
// =============================================================================

/// How decoded samples map to display colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum PhotometricInterpretation {
    /// Grayscale, 0 is white
    WhiteIsZero = 0,
    /// Grayscale, 0 is black
    BlackIsZero = 1,
    /// Interleaved red, green, blue
    Rgb = 2,
    /// Palette-indexed colour
    PaletteColour = 3,
    /// Transparency mask
    TransparencyMask = 4,
    /// Cyan, magenta, yellow, black
    Cmyk = 5,
    /// Luma plus chroma; usually delivered by the JPEG codec
    YCbCr = 6,
    /// CIE L*a*b*
    CieLab = 8,
    /// ICC L*a*b*
    IccLab = 9,
    /// ITU L*a*b*
    ItuLab = 10,
}

impl PhotometricInterpretation {
    /// Create a PhotometricInterpretation from its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(PhotometricInterpretation::WhiteIsZero),
            1 => Some(PhotometricInterpretation::BlackIsZero),
            2 => Some(PhotometricInterpretation::Rgb),
            3 => Some(PhotometricInterpretation::PaletteColour),
            4 => Some(PhotometricInterpretation::TransparencyMask),
            5 => Some(PhotometricInterpretation::Cmyk),
            6 => Some(PhotometricInterpretation::YCbCr),
            8 => Some(PhotometricInterpretation::CieLab),
            9 => Some(PhotometricInterpretation::IccLab),
            10 => Some(PhotometricInterpretation::ItuLab),
            _ => None,
        }
    }
}

// =============================================================================
// Resolution Unit
// =============================================================================

/// Unit for the XResolution/YResolution tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ResolutionUnit {
    /// No absolute unit
    NoUnit = 1,
    /// Pixels per inch
    Inch = 2,
    /// Pixels per centimetre
    Centimeter = 3,
}

impl ResolutionUnit {
    /// Create a ResolutionUnit from its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(ResolutionUnit::NoUnit),
            2 => Some(ResolutionUnit::Inch),
            3 => Some(ResolutionUnit::Centimeter),
            _ => None,
        }
    }
}

// =============================================================================
// Predictor
// =============================================================================

/// Pre-compression transform that must be inverted after decompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Predictor {
    /// No transform
    None = 1,
    /// Horizontal differencing
    Horizontal = 2,
    /// Floating-point predictor
    FloatingPoint = 3,
}

impl Predictor {
    /// Create a Predictor from its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Predictor::None),
            2 => Some(Predictor::Horizontal),
            3 => Some(Predictor::FloatingPoint),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
