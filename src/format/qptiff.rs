//! PerkinElmer QPTIFF (Vectra) vendor adapter.
//!
//! A QPTIFF file stores per-IFD XML metadata in ImageDescription. The
//! `ImageType` element assigns each IFD one of five roles, and fluorescence
//! acquisitions carry one full-resolution IFD per filter. The chain order is
//! the Vectra convention:
//!
//! ```text
//! 0 .. n-1          full-resolution images (1 RGB for brightfield,
//!                   n grayscale for fluorescence, one per filter)
//! n                 RGB thumbnail
//! n+1 .. 2n-1       50% resolution images (optional)
//! 2n .. 3n-1        25% resolution images (optional)
//! ...
//! penultimate       overview (macro) image (optional)
//! last              label image (optional)
//! ```
//!
//! The adapter groups full- and reduced-resolution IFDs by filter name into
//! ordered bands (full resolution first), and exposes the thumbnail,
//! overview, and label singletons.
//!
//! The XML prolog claims UTF-16 but the bytes are UTF-8; the prolog is
//! stripped before parsing.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, warn};

use crate::error::TiffError;
use crate::format::tiff::{ImageDirectory, TiffFile};

/// The false prolog emitted by Vectra scanners.
const UTF16_PROLOG: &str = "<?xml version=\"1.0\" encoding=\"utf-16\"?>";

// =============================================================================
// Image roles
// =============================================================================

/// The role of one IFD within a QPTIFF container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QptiffImageType {
    FullResolution,
    Thumbnail,
    ReducedResolution,
    Overview,
    Label,
}

impl QptiffImageType {
    /// Parse the content of an `ImageType` element.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FullResolution" => Some(QptiffImageType::FullResolution),
            "Thumbnail" => Some(QptiffImageType::Thumbnail),
            "ReducedResolution" => Some(QptiffImageType::ReducedResolution),
            "Overview" => Some(QptiffImageType::Overview),
            "Label" => Some(QptiffImageType::Label),
            _ => None,
        }
    }
}

/// The fields the adapter consumes from one IFD's description XML.
#[derive(Debug, Clone, Default)]
struct ImageDescription {
    image_type: Option<String>,
    name: Option<String>,
    color: Option<String>,
}

// =============================================================================
// QptiffBand
// =============================================================================

/// One filter's ordered IFD list: full resolution first, then reductions
/// in descending size.
#[derive(Debug, Clone)]
pub struct QptiffBand {
    name: String,
    color: Option<String>,
    ifd_indices: Vec<usize>,
}

impl QptiffBand {
    /// The filter name (e.g. "DAPI", "FITC"), empty for brightfield.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The display colour string from the filter XML, if present.
    pub fn color(&self) -> Option<&str> {
        self.color.as_deref()
    }

    /// Chain indices of this band's IFDs, full resolution first.
    pub fn ifd_indices(&self) -> &[usize] {
        &self.ifd_indices
    }

    /// Number of resolution levels in this band.
    pub fn num_levels(&self) -> usize {
        self.ifd_indices.len()
    }
}

// =============================================================================
// QptiffFile
// =============================================================================

/// An opened QPTIFF slide.
///
/// Wraps the generic [`TiffFile`]; name-indexed band access augments the
/// generic API rather than replacing it.
#[derive(Debug)]
pub struct QptiffFile {
    file: TiffFile,
    band_names: Vec<String>,
    bands: HashMap<String, QptiffBand>,
    thumbnail: Option<usize>,
    overview: Option<usize>,
    label: Option<usize>,
}

impl QptiffFile {
    /// Open a QPTIFF slide from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TiffError> {
        Self::from_file(TiffFile::open(path)?)
    }

    /// Adopt an already-opened container as a QPTIFF slide.
    ///
    /// Every IFD must carry a description whose `ImageType` is one of the
    /// known roles.
    pub fn from_file(file: TiffFile) -> Result<Self, TiffError> {
        let mut band_names = Vec::new();
        let mut bands: HashMap<String, QptiffBand> = HashMap::new();
        let mut thumbnail = None;
        let mut overview = None;
        let mut label = None;

        for (index, ifd) in file.ifds().iter().enumerate() {
            let text = ifd
                .description()
                .ok_or_else(|| TiffError::InvalidTagValue {
                    tag: "ImageDescription",
                    message: format!("IFD {index} has no ASCII ImageDescription"),
                })?;

            let description = parse_description(text)?;
            let image_type = description
                .image_type
                .as_deref()
                .and_then(QptiffImageType::from_name)
                .ok_or_else(|| TiffError::InvalidTagValue {
                    tag: "ImageDescription",
                    message: format!(
                        "IFD {index} has unknown ImageType {:?}",
                        description.image_type
                    ),
                })?;

            match image_type {
                QptiffImageType::FullResolution => {
                    let name = description.name.unwrap_or_default();
                    band_names.push(name.clone());
                    bands.insert(
                        name.clone(),
                        QptiffBand {
                            name,
                            color: description.color,
                            ifd_indices: vec![index],
                        },
                    );
                }
                QptiffImageType::ReducedResolution => {
                    let name = description.name.unwrap_or_default();
                    match bands.get_mut(&name) {
                        Some(band) => band.ifd_indices.push(index),
                        None => {
                            warn!(filter = %name, index, "reduction without a full-resolution band");
                        }
                    }
                }
                QptiffImageType::Thumbnail => thumbnail = Some(index),
                QptiffImageType::Overview => overview = Some(index),
                QptiffImageType::Label => label = Some(index),
            }
        }

        debug!(
            bands = band_names.len(),
            thumbnail = thumbnail.is_some(),
            "opened QPTIFF slide"
        );

        Ok(QptiffFile {
            file,
            band_names,
            bands,
            thumbnail,
            overview,
            label,
        })
    }

    /// The underlying generic container.
    pub fn file(&self) -> &TiffFile {
        &self.file
    }

    /// Filter names in acquisition order.
    pub fn filters(&self) -> &[String] {
        &self.band_names
    }

    /// The band acquired through the named filter.
    pub fn filter(&self, name: &str) -> Option<&QptiffBand> {
        self.bands.get(name)
    }

    /// The `level`-th IFD of the named band (0 = full resolution).
    pub fn band_ifd(&self, name: &str, level: usize) -> Option<&ImageDirectory> {
        let index = *self.bands.get(name)?.ifd_indices.get(level)?;
        self.file.ifd(index)
    }

    /// The RGB thumbnail IFD, when present.
    pub fn thumbnail(&self) -> Option<&ImageDirectory> {
        self.file.ifd(self.thumbnail?)
    }

    /// The overview (macro) IFD, when present.
    pub fn overview(&self) -> Option<&ImageDirectory> {
        self.file.ifd(self.overview?)
    }

    /// The label IFD, when present.
    pub fn label(&self) -> Option<&ImageDirectory> {
        self.file.ifd(self.label?)
    }
}

// =============================================================================
// XML parsing
// =============================================================================

/// Extract the adapter's fields from one description XML payload.
///
/// Only direct children of the root element are considered, which keeps the
/// filter `Name` distinct from the `Name` nested under `Responsivity`.
fn parse_description(text: &str) -> Result<ImageDescription, TiffError> {
    let xml = text.replacen(UTF16_PROLOG, "", 1);

    let mut reader = Reader::from_str(&xml);
    reader.trim_text(true);

    let mut description = ImageDescription::default();
    let mut depth = 0usize;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                depth += 1;
                current = if depth == 2 {
                    Some(String::from_utf8_lossy(element.local_name().as_ref()).into_owned())
                } else {
                    None
                };
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                current = None;
            }
            Ok(Event::Text(text)) => {
                if depth == 2 {
                    if let Some(name) = current.as_deref() {
                        let value = text
                            .unescape()
                            .map_err(|err| xml_error(err.to_string()))?
                            .into_owned();
                        match name {
                            "ImageType" => description.image_type = Some(value),
                            "Name" => description.name = Some(value),
                            "Color" => description.color = Some(value),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(xml_error(err.to_string())),
        }
    }

    Ok(description)
}

fn xml_error(message: String) -> TiffError {
    TiffError::InvalidTagValue {
        tag: "ImageDescription",
        message,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_description_full_resolution() {
        let xml = "<?xml version=\"1.0\" encoding=\"utf-16\"?>\
            <PerkinElmer-QPI-ImageDescription>\
            <DescriptionVersion>2</DescriptionVersion>\
            <ImageType>FullResolution</ImageType>\
            <Name>DAPI</Name>\
            <Color>0,0,255</Color>\
            <Responsivity><Filter><Name>ignored</Name></Filter></Responsivity>\
            </PerkinElmer-QPI-ImageDescription>";

        let description = parse_description(xml).unwrap();
        assert_eq!(description.image_type.as_deref(), Some("FullResolution"));
        assert_eq!(description.name.as_deref(), Some("DAPI"));
        assert_eq!(description.color.as_deref(), Some("0,0,255"));
    }

    #[test]
    fn test_parse_description_nested_name_ignored() {
        // The Responsivity>Filter>Name must not clobber the root-level Name
        let xml = "<Root>\
            <Responsivity><Filter><Name>nested</Name></Filter></Responsivity>\
            <Name>FITC</Name>\
            <ImageType>ReducedResolution</ImageType>\
            </Root>";

        let description = parse_description(xml).unwrap();
        assert_eq!(description.name.as_deref(), Some("FITC"));
        assert_eq!(
            description.image_type.as_deref(),
            Some("ReducedResolution")
        );
    }

    #[test]
    fn test_parse_description_thumbnail() {
        let xml = "<Root><ImageType>Thumbnail</ImageType></Root>";
        let description = parse_description(xml).unwrap();
        assert_eq!(
            description
                .image_type
                .as_deref()
                .and_then(QptiffImageType::from_name),
            Some(QptiffImageType::Thumbnail)
        );
    }

    #[test]
    fn test_image_type_from_name() {
        assert_eq!(
            QptiffImageType::from_name("FullResolution"),
            Some(QptiffImageType::FullResolution)
        );
        assert_eq!(
            QptiffImageType::from_name("Overview"),
            Some(QptiffImageType::Overview)
        );
        assert_eq!(
            QptiffImageType::from_name("Label"),
            Some(QptiffImageType::Label)
        );
        assert_eq!(QptiffImageType::from_name("Unknown"), None);
    }

    #[test]
    fn test_parse_description_strips_false_prolog() {
        // The prolog claims UTF-16; the bytes are UTF-8 and must parse
        let xml = format!("{UTF16_PROLOG}<Root><ImageType>Label</ImageType></Root>");
        let description = parse_description(&xml).unwrap();
        assert_eq!(description.image_type.as_deref(), Some("Label"));
    }
}
