//! Synthetic TIFF builders for integration tests.
//!
//! Produces minimal but structurally correct classic TIFF and BigTIFF
//! containers in memory: header, chained IFDs with ascending tag order,
//! out-of-line payload areas, and a trailing blob area for pixel data.
//! Offsets are resolved in a layout pass before serialisation.

#![allow(dead_code)]

/// File byte order for built containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    fn put_u16(self, out: &mut Vec<u8>, value: u16) {
        match self {
            Endian::Little => out.extend_from_slice(&value.to_le_bytes()),
            Endian::Big => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    fn put_u32(self, out: &mut Vec<u8>, value: u32) {
        match self {
            Endian::Little => out.extend_from_slice(&value.to_le_bytes()),
            Endian::Big => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    fn put_u64(self, out: &mut Vec<u8>, value: u64) {
        match self {
            Endian::Little => out.extend_from_slice(&value.to_le_bytes()),
            Endian::Big => out.extend_from_slice(&value.to_be_bytes()),
        }
    }
}

/// A typed tag value to serialise.
#[derive(Debug, Clone)]
pub enum Value {
    Short(Vec<u16>),
    Long(Vec<u32>),
    Long8(Vec<u64>),
    Ascii(String),
    Undefined(Vec<u8>),
    Rational(Vec<(u32, u32)>),
    /// LONG array whose values are the final offsets of the given blobs
    BlobOffsets(Vec<usize>),
    /// LONG8 array of blob offsets (BigTIFF)
    BlobOffsets8(Vec<usize>),
}

impl Value {
    fn field_type(&self) -> u16 {
        match self {
            Value::Short(_) => 3,
            Value::Long(_) | Value::BlobOffsets(_) => 4,
            Value::Long8(_) | Value::BlobOffsets8(_) => 16,
            Value::Ascii(_) => 2,
            Value::Undefined(_) => 7,
            Value::Rational(_) => 5,
        }
    }

    fn count(&self) -> u64 {
        match self {
            Value::Short(v) => v.len() as u64,
            Value::Long(v) => v.len() as u64,
            Value::Long8(v) => v.len() as u64,
            Value::Ascii(s) => s.len() as u64 + 1, // trailing NUL
            Value::Undefined(v) => v.len() as u64,
            Value::Rational(v) => v.len() as u64,
            Value::BlobOffsets(v) | Value::BlobOffsets8(v) => v.len() as u64,
        }
    }

    fn payload_size(&self) -> usize {
        let item = match self {
            Value::Short(_) => 2,
            Value::Long(_) | Value::BlobOffsets(_) => 4,
            Value::Long8(_) | Value::BlobOffsets8(_) => 8,
            Value::Ascii(_) | Value::Undefined(_) => 1,
            Value::Rational(_) => 8,
        };
        self.count() as usize * item
    }

    fn serialise(&self, endian: Endian, blob_offsets: &[u64]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload_size());
        match self {
            Value::Short(values) => {
                for &v in values {
                    endian.put_u16(&mut out, v);
                }
            }
            Value::Long(values) => {
                for &v in values {
                    endian.put_u32(&mut out, v);
                }
            }
            Value::Long8(values) => {
                for &v in values {
                    endian.put_u64(&mut out, v);
                }
            }
            Value::Ascii(text) => {
                out.extend_from_slice(text.as_bytes());
                out.push(0);
            }
            Value::Undefined(bytes) => out.extend_from_slice(bytes),
            Value::Rational(values) => {
                for &(numerator, denominator) in values {
                    endian.put_u32(&mut out, numerator);
                    endian.put_u32(&mut out, denominator);
                }
            }
            Value::BlobOffsets(blobs) => {
                for &blob in blobs {
                    endian.put_u32(&mut out, blob_offsets[blob] as u32);
                }
            }
            Value::BlobOffsets8(blobs) => {
                for &blob in blobs {
                    endian.put_u64(&mut out, blob_offsets[blob]);
                }
            }
        }
        out
    }
}

/// One IFD under construction.
#[derive(Debug, Default)]
pub struct IfdBuilder {
    entries: Vec<(u16, Value)>,
}

impl IfdBuilder {
    /// Add a tag.
    pub fn tag(&mut self, id: u16, value: Value) -> &mut Self {
        self.entries.push((id, value));
        self
    }
}

/// Builds a complete container image in memory.
pub struct TiffBuilder {
    endian: Endian,
    bigtiff: bool,
    ifds: Vec<IfdBuilder>,
    blobs: Vec<Vec<u8>>,
}

impl TiffBuilder {
    pub fn classic(endian: Endian) -> Self {
        TiffBuilder {
            endian,
            bigtiff: false,
            ifds: Vec::new(),
            blobs: Vec::new(),
        }
    }

    pub fn bigtiff(endian: Endian) -> Self {
        TiffBuilder {
            endian,
            bigtiff: true,
            ifds: Vec::new(),
            blobs: Vec::new(),
        }
    }

    /// Start a new IFD and return a handle to add its tags.
    pub fn ifd(&mut self) -> &mut IfdBuilder {
        self.ifds.push(IfdBuilder::default());
        self.ifds.last_mut().unwrap()
    }

    /// Register a data blob (strip/tile payload); returns its handle for
    /// use in `Value::BlobOffsets`.
    pub fn add_blob(&mut self, data: &[u8]) -> usize {
        self.blobs.push(data.to_vec());
        self.blobs.len() - 1
    }

    fn header_size(&self) -> usize {
        if self.bigtiff {
            16
        } else {
            8
        }
    }

    fn entry_size(&self) -> usize {
        if self.bigtiff {
            20
        } else {
            12
        }
    }

    fn count_size(&self) -> usize {
        if self.bigtiff {
            8
        } else {
            2
        }
    }

    fn next_size(&self) -> usize {
        if self.bigtiff {
            8
        } else {
            4
        }
    }

    fn inline_threshold(&self) -> usize {
        if self.bigtiff {
            8
        } else {
            4
        }
    }

    fn block_size(&self, ifd: &IfdBuilder) -> usize {
        self.count_size() + ifd.entries.len() * self.entry_size() + self.next_size()
    }

    /// Serialise the container.
    pub fn build(mut self) -> Vec<u8> {
        // Entries in ascending tag order, as real writers emit them.
        for ifd in &mut self.ifds {
            ifd.entries.sort_by_key(|(id, _)| *id);
        }

        // Layout pass: IFD blocks interleaved with their overflow areas,
        // then the blob area.
        let mut pos = self.header_size();
        let mut ifd_pos = Vec::with_capacity(self.ifds.len());
        let mut overflow_pos = Vec::with_capacity(self.ifds.len());

        for ifd in &self.ifds {
            ifd_pos.push(pos);
            pos += self.block_size(ifd);

            let mut overflow = Vec::new();
            for (_, value) in &ifd.entries {
                let size = value.payload_size();
                if size > self.inline_threshold() {
                    overflow.push(pos);
                    pos += size + size % 2; // keep offsets word-aligned
                } else {
                    overflow.push(0);
                }
            }
            overflow_pos.push(overflow);
        }

        let mut blob_offsets = Vec::with_capacity(self.blobs.len());
        for blob in &self.blobs {
            pos += pos % 2;
            blob_offsets.push(pos as u64);
            pos += blob.len();
        }

        // Serialisation pass.
        let endian = self.endian;
        let mut out = Vec::with_capacity(pos);

        match endian {
            Endian::Little => out.extend_from_slice(&[0x49, 0x49]),
            Endian::Big => out.extend_from_slice(&[0x4D, 0x4D]),
        }
        if self.bigtiff {
            endian.put_u16(&mut out, 0x2B);
            endian.put_u16(&mut out, 8);
            endian.put_u16(&mut out, 0);
            endian.put_u64(&mut out, ifd_pos.first().copied().unwrap_or(0) as u64);
        } else {
            endian.put_u16(&mut out, 0x2A);
            endian.put_u32(&mut out, ifd_pos.first().copied().unwrap_or(0) as u32);
        }

        for (index, ifd) in self.ifds.iter().enumerate() {
            assert_eq!(out.len(), ifd_pos[index], "layout drift before IFD block");

            if self.bigtiff {
                endian.put_u64(&mut out, ifd.entries.len() as u64);
            } else {
                endian.put_u16(&mut out, ifd.entries.len() as u16);
            }

            for (entry_index, (id, value)) in ifd.entries.iter().enumerate() {
                endian.put_u16(&mut out, *id);
                endian.put_u16(&mut out, value.field_type());
                if self.bigtiff {
                    endian.put_u64(&mut out, value.count());
                } else {
                    endian.put_u32(&mut out, value.count() as u32);
                }

                let payload = value.serialise(endian, &blob_offsets);
                if payload.len() <= self.inline_threshold() {
                    out.extend_from_slice(&payload);
                    out.extend(std::iter::repeat(0).take(self.inline_threshold() - payload.len()));
                } else if self.bigtiff {
                    endian.put_u64(&mut out, overflow_pos[index][entry_index] as u64);
                } else {
                    endian.put_u32(&mut out, overflow_pos[index][entry_index] as u32);
                }
            }

            let next = ifd_pos.get(index + 1).copied().unwrap_or(0);
            if self.bigtiff {
                endian.put_u64(&mut out, next as u64);
            } else {
                endian.put_u32(&mut out, next as u32);
            }

            // Overflow payloads for this IFD.
            for (entry_index, (_, value)) in ifd.entries.iter().enumerate() {
                let payload = value.serialise(endian, &blob_offsets);
                if payload.len() > self.inline_threshold() {
                    assert_eq!(
                        out.len(),
                        overflow_pos[index][entry_index],
                        "layout drift before overflow payload"
                    );
                    let padded = payload.len() + payload.len() % 2;
                    out.extend_from_slice(&payload);
                    out.extend(std::iter::repeat(0).take(padded - payload.len()));
                }
            }
        }

        for (blob, &offset) in self.blobs.iter().zip(&blob_offsets) {
            while (out.len() as u64) < offset {
                out.push(0);
            }
            out.extend_from_slice(blob);
        }

        out
    }
}

/// Encode a buffer with PackBits for fixture data.
pub fn pack_bits(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut pos = 0;

    while pos < src.len() {
        // Measure the run starting here.
        let mut run = 1;
        while pos + run < src.len() && src[pos + run] == src[pos] && run < 128 {
            run += 1;
        }

        if run >= 2 {
            out.push((1i32 - run as i32) as i8 as u8);
            out.push(src[pos]);
            pos += run;
        } else {
            // Collect literals until the next run of 2+.
            let start = pos;
            pos += 1;
            while pos < src.len()
                && pos - start < 128
                && !(pos + 1 < src.len() && src[pos + 1] == src[pos])
            {
                pos += 1;
            }
            out.push((pos - start - 1) as u8);
            out.extend_from_slice(&src[start..pos]);
        }
    }

    out
}

/// Encode a buffer with TIFF-flavoured LZW for fixture data.
pub fn lzw_compress(src: &[u8]) -> Vec<u8> {
    let mut encoder = weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8);
    encoder.encode(src).expect("lzw fixture encoding failed")
}
