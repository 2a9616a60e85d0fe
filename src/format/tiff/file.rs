//! Opening TIFF containers and walking the IFD chain.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::TiffError;
use crate::io::{FileReader, RangeReader};

use super::directory::{ImageDirectory, TagSet};
use super::parser::{RawIfd, TiffHeader, BIGTIFF_HEADER_SIZE};
use super::values::materialise_entry;

/// Safety cap on the IFD chain length; degenerate or cyclic chains stop here.
const MAX_IFDS: usize = 100;

/// An opened TIFF-family container.
///
/// Owns the underlying byte source and the list of parsed directories, in
/// on-disk chain order. The source is shared with the directories, which
/// read sections through it on demand; dropping the file releases the
/// handle once the last borrower is gone.
pub struct TiffFile {
    reader: Arc<dyn RangeReader>,
    header: TiffHeader,
    ifds: Vec<ImageDirectory>,
}

impl TiffFile {
    /// Open a container from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TiffError> {
        let reader = FileReader::open(path)?;
        Self::from_reader(Arc::new(reader))
    }

    /// Open a container over any byte source.
    ///
    /// Parses the header and the whole IFD chain, materialising every tag.
    /// I/O errors abort the open; individual entries with unknown types are
    /// logged and skipped.
    pub fn from_reader(reader: Arc<dyn RangeReader>) -> Result<Self, TiffError> {
        let head_len = (BIGTIFF_HEADER_SIZE as u64).min(reader.size()) as usize;
        let head_bytes = reader.read_exact_at(0, head_len)?;
        let header = TiffHeader::parse(&head_bytes, reader.size())?;

        debug!(
            source = reader.identifier(),
            bigtiff = header.is_bigtiff,
            "parsed container header"
        );

        let mut ifds = Vec::new();
        let mut offset = header.first_ifd_offset;

        while offset != 0 && ifds.len() < MAX_IFDS {
            // Pre-read the entry count, then fetch the whole IFD block in
            // one read.
            let count_bytes = reader.read_exact_at(offset, header.count_size())?;
            let entry_count = if header.is_bigtiff {
                header.byte_order.read_u64(&count_bytes)
            } else {
                u64::from(header.byte_order.read_u16(&count_bytes))
            };

            let block_size = RawIfd::block_size(entry_count, &header);
            let block = reader.read_exact_at(offset, block_size)?;
            let raw = RawIfd::parse(&block, &header)?;

            let mut tags = TagSet::new();
            for entry in &raw.entries {
                if let Some(tag) = materialise_entry(entry, &header, reader.as_ref())? {
                    if tag.tag().is_none() {
                        debug!(id = tag.id, "preserving unknown tag id");
                    }
                    tags.insert(tag);
                }
            }

            let directory = ImageDirectory::new(
                tags,
                raw.next_ifd_offset,
                header.byte_order,
                Arc::clone(&reader),
            )?;

            offset = directory.next_ifd_offset();
            ifds.push(directory);
        }

        if offset != 0 {
            warn!(limit = MAX_IFDS, "IFD chain truncated at safety limit");
        }

        Ok(TiffFile {
            reader,
            header,
            ifds,
        })
    }

    /// The parsed header.
    pub fn header(&self) -> &TiffHeader {
        &self.header
    }

    /// All directories, preserving on-disk chain order.
    pub fn ifds(&self) -> &[ImageDirectory] {
        &self.ifds
    }

    /// The directory at `index` in chain order.
    pub fn ifd(&self, index: usize) -> Option<&ImageDirectory> {
        self.ifds.get(index)
    }

    /// The underlying byte source.
    pub fn reader(&self) -> &Arc<dyn RangeReader> {
        &self.reader
    }

    /// Number of resolution levels under the generic pyramid convention:
    /// the first IFD plus every later IFD whose NewSubFileType marks it as
    /// a reduced-resolution copy.
    pub fn num_reduced_images(&self) -> usize {
        if self.ifds.is_empty() {
            return 0;
        }
        let reductions = self
            .ifds
            .iter()
            .skip(1)
            .filter(|ifd| ifd.is_reduced_resolution_image())
            .count();
        1 + reductions
    }

    /// The `index`-th resolution level under the generic convention.
    /// Index 0 is the full-resolution image.
    pub fn reduced_image(&self, index: usize) -> Option<&ImageDirectory> {
        if index == 0 {
            return self.ifds.first();
        }

        let mut current = 0;
        for ifd in self.ifds.iter().skip(1) {
            if ifd.is_reduced_resolution_image() {
                current += 1;
            }
            if current == index {
                return Some(ifd);
            }
        }

        None
    }

    /// Close the container, releasing the byte source when the last
    /// borrower drops. Directories cannot outlive the file, so this is the
    /// final use of its handle on every path.
    pub fn close(self) {
        drop(self);
    }
}

impl std::fmt::Debug for TiffFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiffFile")
            .field("source", &self.reader.identifier())
            .field("bigtiff", &self.header.is_bigtiff)
            .field("ifds", &self.ifds.len())
            .finish()
    }
}
