// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! The segmented program container.
//!
//! A container is a stream of big-endian 32-bit words: a five-word
//! header (magic, file version, binary version, I/O version, segment
//! count) followed by the declared number of segments. Each segment is
//! `{kind, count, payload}` where `count` is measured in cells and
//! includes the count field itself - for TEXT and DATA segments the
//! count therefore doubles as the image watermark.
//!
//! The writer threads a CRC through the header and every segment; the
//! CRC segment carries the remainder snapshotted just before that
//! segment's own header. The reader mirrors the CRC over every word it
//! consumes and verifies the snapshot when the CRC segment arrives.
//! None of the read failures are recoverable; the caller gets the error
//! and no partial image should be committed.


use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use num_enum::FromPrimitive;
use thiserror::Error;

use crate::crc::Crc32;

/// Container magic, first word of the header.
pub const MAGIC: u32 = 0x4854_4946;

/// Format version this codec writes and accepts.
pub const FILE_VERSION: u32 = 1;

/// Upper bound on a single segment's payload, cells. A count beyond this
/// is corruption, not data; it bounds allocation on hostile input.
pub const MAX_SEGMENT_CELLS: u32 = 1 << 24;

/// Segment kinds. Unknown kinds are carried through to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u32)]
pub enum SegKind {
    /// Code image; count doubles as the code watermark.
    Text = 0x101,
    /// Data image; count doubles as the data watermark.
    Data = 0x102,
    /// Opaque program configuration.
    Config = 0x103,
    /// Single-cell entry address.
    Entry = 0x104,
    /// Address-to-name table, text, NUL-padded to a word boundary.
    Map = 0x105,
    /// Single-cell checksum of everything before this segment.
    Crc = 0x110,
    /// Anything this codec does not recognise.
    #[num_enum(catch_all)]
    Unknown(u32),
}

impl SegKind {
    /// The wire value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        match self {
            Self::Text => 0x101,
            Self::Data => 0x102,
            Self::Config => 0x103,
            Self::Entry => 0x104,
            Self::Map => 0x105,
            Self::Crc => 0x110,
            Self::Unknown(kind) => kind,
        }
    }
}

/// Why a container could not be written or read.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The first header word is not the magic.
    #[error("bad magic {0:#010x}")]
    BadMagic(u32),
    /// The file version is not one this codec understands.
    #[error("unsupported file version {0}")]
    BadVersion(u32),
    /// The stream ended inside a word, a header or a payload.
    #[error("short read")]
    ShortRead,
    /// A segment count of zero cannot include its own count field.
    #[error("malformed segment count")]
    BadSegmentCount,
    /// A segment claims more payload than any real image carries.
    #[error("segment too large ({0} cells)")]
    SegmentTooLarge(u32),
    /// An image slice does not match its own watermark.
    #[error("image watermark out of range")]
    BadWatermark,
    /// The stored checksum does not match the mirrored computation.
    #[error("crc mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// The checksum carried by the CRC segment.
        stored: u32,
        /// The remainder mirrored while reading.
        computed: u32,
    },
    /// The writer was asked for more segments than the header declared.
    #[error("too many segments (declared {declared})")]
    TooManySegments {
        /// Segment count fixed in the header.
        declared: u32,
    },
    /// The segment sink refused the header or a segment.
    #[error("rejected by segment handler: {0}")]
    Rejected(String),
    /// Underlying stream failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Receiver for a container's contents during a read.
///
/// Payload slices are only valid for the duration of the call; copy what
/// must be retained.
pub trait SegmentSink {
    /// The header was validated structurally; reject here to abort the
    /// read on version grounds.
    fn on_header(&mut self, bin_version: u32, io_version: u32) -> Result<(), ContainerError>;

    /// One segment's kind and payload. CRC segments are consumed by the
    /// reader and never arrive here.
    fn on_segment(&mut self, kind: SegKind, payload: &[i32]) -> Result<(), ContainerError>;
}

/// Writes a container: header first, then the declared segments, the CRC
/// segment last.
pub struct ContainerWriter<W: Write> {
    out: W,
    crc: Crc32,
    declared: u32,
    written: u32,
}

impl<W: Write> ContainerWriter<W> {
    /// Write the header and prepare for `segments` segments.
    pub fn new(
        mut out: W,
        segments: u32,
        bin_version: u32,
        io_version: u32,
    ) -> Result<Self, ContainerError> {
        let header = [MAGIC, FILE_VERSION, bin_version, io_version, segments];
        let mut crc = Crc32::new();
        for word in header {
            crc.push_word(word);
            out.write_u32::<BigEndian>(word)?;
        }
        Ok(Self {
            out,
            crc,
            declared: segments,
            written: 0,
        })
    }

    fn segment(&mut self, kind: u32, payload: &[i32]) -> Result<(), ContainerError> {
        self.written += 1;
        if self.written > self.declared {
            return Err(ContainerError::TooManySegments {
                declared: self.declared,
            });
        }
        let count = payload.len() as u32 + 1;
        self.crc.push_word(kind);
        self.crc.push_word(count);
        self.crc.push_cells(payload);

        self.out.write_u32::<BigEndian>(kind)?;
        self.out.write_u32::<BigEndian>(count)?;
        for &cell in payload {
            self.out.write_u32::<BigEndian>(cell as u32)?;
        }
        Ok(())
    }

    /// An image segment: `image[0]` is the live length including itself,
    /// and becomes the segment count on the wire.
    fn image_segment(&mut self, kind: SegKind, image: &[i32]) -> Result<(), ContainerError> {
        let live = image.first().copied().unwrap_or(0);
        if live < 1 || live as usize > image.len() {
            return Err(ContainerError::BadWatermark);
        }
        self.segment(kind.raw(), &image[1..live as usize])
    }

    /// Write the code image.
    pub fn text(&mut self, image: &[i32]) -> Result<(), ContainerError> {
        self.image_segment(SegKind::Text, image)
    }

    /// Write the data image.
    pub fn data(&mut self, image: &[i32]) -> Result<(), ContainerError> {
        self.image_segment(SegKind::Data, image)
    }

    /// Write an opaque configuration image.
    pub fn config(&mut self, image: &[i32]) -> Result<(), ContainerError> {
        self.image_segment(SegKind::Config, image)
    }

    /// Write the symbol map as NUL-padded text.
    pub fn map(&mut self, map: &str) -> Result<(), ContainerError> {
        let bytes = map.as_bytes();
        // between one and four NULs of padding
        let words = bytes.len() / 4 + 1;
        let mut cells = vec![0i32; words];
        for (i, &b) in bytes.iter().enumerate() {
            cells[i / 4] |= i32::from(b) << ((i % 4) * 8);
        }
        self.segment(SegKind::Map.raw(), &cells)
    }

    /// Write the entry tag.
    pub fn entry(&mut self, root: i32) -> Result<(), ContainerError> {
        self.segment(SegKind::Entry.raw(), &[root])
    }

    /// Append the CRC segment and finish the container.
    ///
    /// The payload is the remainder over everything already written; the
    /// segment's own header is not covered, matching the reader's
    /// snapshot point.
    pub fn finish(mut self) -> Result<W, ContainerError> {
        let checksum = self.crc.remainder();
        self.segment(SegKind::Crc.raw(), &[checksum as i32])?;
        Ok(self.out)
    }
}

fn read_word<R: Read>(input: &mut R, crc: &mut Crc32) -> Result<u32, ContainerError> {
    match input.read_u32::<BigEndian>() {
        Ok(word) => {
            crc.push_word(word);
            Ok(word)
        }
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(ContainerError::ShortRead),
        Err(e) => Err(ContainerError::Io(e)),
    }
}

/// Read a container, handing every non-CRC segment to `sink`.
///
/// The CRC segment is verified against the mirrored remainder
/// snapshotted just before its header; a mismatch aborts the read.
pub fn read_container<R: Read>(
    mut input: R,
    sink: &mut dyn SegmentSink,
) -> Result<(), ContainerError> {
    let mut crc = Crc32::new();

    let magic = read_word(&mut input, &mut crc)?;
    if magic != MAGIC {
        return Err(ContainerError::BadMagic(magic));
    }
    let version = read_word(&mut input, &mut crc)?;
    if version != FILE_VERSION {
        return Err(ContainerError::BadVersion(version));
    }
    let bin_version = read_word(&mut input, &mut crc)?;
    let io_version = read_word(&mut input, &mut crc)?;
    let segments = read_word(&mut input, &mut crc)?;

    sink.on_header(bin_version, io_version)?;

    for _ in 0..segments {
        // the CRC segment's checksum covers everything before its header
        let snapshot = crc.remainder();

        let kind = read_word(&mut input, &mut crc)?;
        let count = read_word(&mut input, &mut crc)?;
        if count == 0 {
            return Err(ContainerError::BadSegmentCount);
        }
        let cells = count - 1;
        if cells > MAX_SEGMENT_CELLS {
            return Err(ContainerError::SegmentTooLarge(cells));
        }

        let mut payload = vec![0i32; cells as usize];
        for cell in &mut payload {
            *cell = read_word(&mut input, &mut crc)? as i32;
        }

        match SegKind::from(kind) {
            SegKind::Crc => {
                let stored = payload.first().copied().unwrap_or(0) as u32;
                if stored != snapshot {
                    return Err(ContainerError::CrcMismatch {
                        stored,
                        computed: snapshot,
                    });
                }
            }
            other => sink.on_segment(other, &payload)?,
        }
    }
    Ok(())
}

/// Unpack NUL-padded map text from its cells.
#[must_use]
pub fn unpack_map(payload: &[i32]) -> String {
    let mut bytes = Vec::with_capacity(payload.len() * 4);
    for &cell in payload {
        for b in 0..4 {
            bytes.push((cell >> (b * 8)) as u8);
        }
    }
    while bytes.last() == Some(&0) {
        bytes.pop();
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
