//! Pixel data layout: strips and tiles.
//!
//! A TIFF image stores its pixel payload either as horizontal strips that
//! span the full width, or as a row-major grid of fixed-size tiles. Both are
//! exposed through one model: the *section*, the smallest on-disk atomic
//! unit of pixel data. Section 0 of a stripped image is the top strip;
//! section `i` of a tiled image is tile `(i % across, i / across)`.

use tracing::{debug, warn};

use crate::error::TiffError;

use super::directory::TagSet;
use super::tags::TiffTag;

// =============================================================================
// Section
// =============================================================================

/// A view over one strip or one tile.
///
/// Edge sections are clamped to the image bounds, so their extent may be
/// smaller than the nominal strip/tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// Index into the offset/byte-count arrays
    pub index: u32,

    /// Grid column (always 0 for strips)
    pub x: u32,

    /// Grid row
    pub y: u32,

    /// Actual pixel width of this section
    pub width: u32,

    /// Actual pixel height of this section
    pub height: u32,
}

// =============================================================================
// DataLayout
// =============================================================================

/// Strip or tile organisation of one IFD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LayoutKind {
    Strips {
        rows_per_strip: u32,
        strips_in_image: u32,
    },
    Tiles {
        tile_width: u32,
        tile_length: u32,
        tiles_across: u32,
        tiles_down: u32,
    },
}

/// The derived layout of an IFD: section grid plus the parallel offset and
/// byte-count arrays. Immutable after construction.
#[derive(Debug, Clone)]
pub struct DataLayout {
    kind: LayoutKind,
    image_width: u32,
    image_length: u32,
    offsets: Vec<i64>,
    byte_counts: Vec<i64>,
}

impl DataLayout {
    /// Derive the layout from an IFD's tag set.
    ///
    /// Strip layout applies when `RowsPerStrip` or `StripOffsets` is
    /// present; otherwise `TileWidth` selects tile layout. An IFD with
    /// neither fails with `UnknownLayout`.
    pub(crate) fn from_tags(tags: &TagSet) -> Result<Self, TiffError> {
        let image_width = tags.u32_value(TiffTag::ImageWidth)?;
        let image_length = tags.u32_value(TiffTag::ImageLength)?;

        if tags.has_tag(TiffTag::RowsPerStrip) || tags.has_tag(TiffTag::StripOffsets) {
            // ImageJ exports set RowsPerStrip to 0; files may also omit the
            // tag entirely. Both mean a single strip covering the image.
            let mut rows_per_strip = tags.u32_opt(TiffTag::RowsPerStrip).unwrap_or(0);
            if rows_per_strip == 0 {
                debug!(image_length, "RowsPerStrip absent or zero, using one strip");
                rows_per_strip = image_length.max(1);
            }

            let strips_in_image = image_length.div_ceil(rows_per_strip);

            let offsets = tags.i64_array(TiffTag::StripOffsets)?;
            let byte_counts = tags.i64_array(TiffTag::StripByteCounts)?;
            Self::check_parallel_arrays(&offsets, &byte_counts)?;

            if offsets.len() != strips_in_image as usize {
                warn!(
                    expected = strips_in_image,
                    actual = offsets.len(),
                    "StripOffsets length does not match derived strip count"
                );
            }

            Ok(DataLayout {
                kind: LayoutKind::Strips {
                    rows_per_strip,
                    strips_in_image: offsets.len() as u32,
                },
                image_width,
                image_length,
                offsets,
                byte_counts,
            })
        } else if tags.has_tag(TiffTag::TileWidth) {
            let tile_width = tags.u32_value(TiffTag::TileWidth)?;
            let tile_length = tags.u32_value(TiffTag::TileLength)?;
            if tile_width == 0 || tile_length == 0 {
                return Err(TiffError::InvalidTagValue {
                    tag: "TileWidth/TileLength",
                    message: format!("zero tile extent {tile_width}x{tile_length}"),
                });
            }

            let tiles_across = image_width.div_ceil(tile_width).max(1);
            let tiles_down = image_length.div_ceil(tile_length).max(1);

            // Some writers emit tiled images whose offsets landed in the
            // strip tags; fall back when the tile arrays are absent.
            let (offsets, byte_counts) = if tags.has_tag(TiffTag::TileOffsets) {
                (
                    tags.i64_array(TiffTag::TileOffsets)?,
                    tags.i64_array(TiffTag::TileByteCounts)?,
                )
            } else {
                warn!("TileOffsets absent on tiled IFD, falling back to StripOffsets");
                (
                    tags.i64_array(TiffTag::StripOffsets)?,
                    tags.i64_array(TiffTag::StripByteCounts)?,
                )
            };
            Self::check_parallel_arrays(&offsets, &byte_counts)?;

            Ok(DataLayout {
                kind: LayoutKind::Tiles {
                    tile_width,
                    tile_length,
                    tiles_across,
                    tiles_down,
                },
                image_width,
                image_length,
                offsets,
                byte_counts,
            })
        } else {
            Err(TiffError::UnknownLayout)
        }
    }

    fn check_parallel_arrays(offsets: &[i64], byte_counts: &[i64]) -> Result<(), TiffError> {
        if offsets.len() != byte_counts.len() {
            return Err(TiffError::InvalidTagValue {
                tag: "StripByteCounts/TileByteCounts",
                message: format!(
                    "offset array has {} entries, byte-count array has {}",
                    offsets.len(),
                    byte_counts.len()
                ),
            });
        }
        Ok(())
    }

    /// Whether pixel data is organised as tiles.
    pub fn is_tiled(&self) -> bool {
        matches!(self.kind, LayoutKind::Tiles { .. })
    }

    /// Image extent in pixels.
    pub fn image_dimensions(&self) -> (u32, u32) {
        (self.image_width, self.image_length)
    }

    /// Total number of sections.
    pub fn section_count(&self) -> u32 {
        self.offsets.len() as u32
    }

    /// The section grid: `(1, strips)` for stripped images,
    /// `(across, down)` for tiled images.
    pub fn section_grid(&self) -> (u32, u32) {
        match self.kind {
            LayoutKind::Strips {
                strips_in_image, ..
            } => (1, strips_in_image),
            LayoutKind::Tiles {
                tiles_across,
                tiles_down,
                ..
            } => (tiles_across, tiles_down),
        }
    }

    /// Nominal section extent: `(image_width, rows_per_strip)` for strips,
    /// `(tile_width, tile_length)` for tiles.
    pub fn section_dimensions(&self) -> (u32, u32) {
        match self.kind {
            LayoutKind::Strips { rows_per_strip, .. } => (self.image_width, rows_per_strip),
            LayoutKind::Tiles {
                tile_width,
                tile_length,
                ..
            } => (tile_width, tile_length),
        }
    }

    /// Construct the section at `index`, clamping edge extents.
    pub fn section(&self, index: u32) -> Result<Section, TiffError> {
        let count = self.section_count();
        if index >= count {
            return Err(TiffError::SectionOutOfBounds { index, count });
        }

        match self.kind {
            LayoutKind::Strips {
                rows_per_strip,
                strips_in_image,
            } => {
                let mut height = if index == strips_in_image - 1 {
                    self.image_length % rows_per_strip
                } else {
                    rows_per_strip
                };
                if height == 0 {
                    height = rows_per_strip;
                }

                Ok(Section {
                    index,
                    x: 0,
                    y: index,
                    width: self.image_width,
                    height,
                })
            }
            LayoutKind::Tiles {
                tile_width,
                tile_length,
                tiles_across,
                tiles_down,
            } => {
                let x = index % tiles_across;
                let y = index / tiles_across;

                let mut width = if x == tiles_across - 1 {
                    self.image_width % tile_width
                } else {
                    tile_width
                };
                if width == 0 {
                    width = tile_width;
                }

                let mut height = if y == tiles_down - 1 {
                    self.image_length % tile_length
                } else {
                    tile_length
                };
                if height == 0 {
                    height = tile_length;
                }

                Ok(Section {
                    index,
                    x,
                    y,
                    width,
                    height,
                })
            }
        }
    }

    /// Construct the section covering pixel `(x, y)`.
    pub fn section_at(&self, x: i64, y: i64) -> Result<Section, TiffError> {
        if x < 0 || y < 0 || x >= i64::from(self.image_width) || y >= i64::from(self.image_length)
        {
            return Err(TiffError::SectionOutOfBounds {
                index: u32::MAX,
                count: self.section_count(),
            });
        }

        let index = match self.kind {
            LayoutKind::Strips { rows_per_strip, .. } => y / i64::from(rows_per_strip),
            LayoutKind::Tiles {
                tile_width,
                tile_length,
                tiles_across,
                ..
            } => {
                (y / i64::from(tile_length)) * i64::from(tiles_across) + x / i64::from(tile_width)
            }
        };

        self.section(index as u32)
    }

    /// On-disk location of a section's payload: `(offset, byte_count)`.
    pub(crate) fn location(&self, index: u32) -> Result<(i64, i64), TiffError> {
        let count = self.section_count();
        if index >= count {
            return Err(TiffError::SectionOutOfBounds { index, count });
        }
        Ok((self.offsets[index as usize], self.byte_counts[index as usize]))
    }
}

// =============================================================================
// Tests
// =============================================================================
