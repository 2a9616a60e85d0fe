use thiserror::Error;

use crate::format::tiff::{FieldType, PhotometricInterpretation, TiffTag};

/// I/O errors that can occur when reading from the underlying byte source
#[derive(Debug, Error)]
pub enum IoError {
    /// Error from the operating system while seeking or reading
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },
}

/// Errors produced while parsing or decoding a TIFF-family container.
///
/// Parse-time errors abort `open`. Errors after open are scoped to the
/// failing operation and leave the file usable.
#[derive(Debug, Error)]
pub enum TiffError {
    /// The first two bytes are neither `II` nor `MM`
    #[error("invalid byte-order marker 0x{0:04X}")]
    InvalidHeader(u16),

    /// The version marker is neither classic (0x2A) nor BigTIFF (0x2B)
    #[error("unsupported TIFF version 0x{0:02X}")]
    UnsupportedVersion(u16),

    /// BigTIFF declares an offset size other than 8
    #[error("invalid BigTIFF offset size {0} (must be 8)")]
    InvalidOffsetSize(u16),

    /// Not enough bytes for the structure being parsed
    #[error("file too small: need {required} bytes, have {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// An IFD offset points outside the file
    #[error("IFD offset {0} is outside the file")]
    InvalidIfdOffset(u64),

    /// Underlying read failure
    #[error(transparent)]
    Io(#[from] IoError),

    /// A tag required for layout or decoding is absent
    #[error("required tag {0:?} is missing")]
    MissingTag(TiffTag),

    /// A tag holds a different data type than any the operation accepts
    #[error("tag {tag} has type {actual:?}, expected {expected}")]
    TagTypeMismatch {
        tag: u16,
        expected: &'static str,
        actual: FieldType,
    },

    /// The entry declares a data type this reader does not know
    #[error("unknown field type {0}")]
    UnknownFieldType(u16),

    /// Neither strip nor tile tags are present in the IFD
    #[error("neither strip nor tile layout tags are present")]
    UnknownLayout,

    /// No codec is registered for the compression identifier
    #[error("no codec registered for compression {0}")]
    UnsupportedCompression(u16),

    /// A codec failed while decoding a section payload
    #[error("codec {name} failed: {message}")]
    Codec {
        name: &'static str,
        message: String,
    },

    /// A section index or pixel coordinate is outside the section grid
    #[error("section {index} out of range ({count} sections)")]
    SectionOutOfBounds { index: u32, count: u32 },

    /// A section decoded to fewer bytes than its extent requires.
    /// Recoverable: the pipeline logs at warn level and returns the partial
    /// decode; the variant exists for callers that want to fail instead.
    #[error("section decoded {actual} of {expected} expected bytes")]
    TruncatedSection { expected: usize, actual: usize },

    /// `data()` was called on a codec that only produces images
    #[error("codec {0} decodes to images; use image() instead of data()")]
    ImageOnlyCodec(&'static str),

    /// `decode_image()` was called on a codec that only produces bytes
    #[error("codec {0} decodes to bytes; use data() instead of decode_image()")]
    BytesOnlyCodec(&'static str),

    /// The pixel assembler has no rule for this photometric interpretation
    #[error("unsupported photometric interpretation {0:?} for pixel assembly")]
    UnsupportedPhotometric(PhotometricInterpretation),

    /// A tag value is present but unusable for the requested operation
    #[error("invalid value for tag {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },
}

impl From<std::io::Error> for TiffError {
    fn from(err: std::io::Error) -> Self {
        TiffError::Io(IoError::Io(err))
    }
}
