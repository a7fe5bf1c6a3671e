// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Container loader: populates host-owned code and data arrays.
//!
//! `ImageLoader` is the conventional [`SegmentSink`]: it validates the
//! binary and I/O versions against what the host runtime supports,
//! copies TEXT and DATA into the provided arrays (the segment count
//! becomes the watermark), records the ENTRY tag, and optionally
//! resolves a named entry point from the MAP segment. CONFIG and unknown
//! segments are ignored.


use crate::container::{ContainerError, SegKind, SegmentSink, unpack_map};
use crate::sidecar;

/// Populates code and data images from a container.
pub struct ImageLoader<'a> {
    text: &'a mut [i32],
    data: &'a mut [i32],
    bin_version: u32,
    io_version: u32,
    entry_name: Option<&'a str>,
    entry: Option<i32>,
    named_entry: Option<i32>,
}

impl<'a> ImageLoader<'a> {
    /// A loader for host arrays, accepting exactly the given versions.
    pub fn new(text: &'a mut [i32], data: &'a mut [i32], bin_version: u32, io_version: u32) -> Self {
        Self {
            text,
            data,
            bin_version,
            io_version,
            entry_name: None,
            entry: None,
            named_entry: None,
        }
    }

    /// Also resolve `name` through the MAP segment.
    #[must_use]
    pub fn with_entry_name(mut self, name: &'a str) -> Self {
        self.entry_name = Some(name);
        self
    }

    /// The ENTRY segment's address, when one was present.
    #[must_use]
    pub fn entry(&self) -> Option<i32> {
        self.entry
    }

    /// The named entry resolved from the MAP, when requested and found.
    #[must_use]
    pub fn named_entry(&self) -> Option<i32> {
        self.named_entry
    }

    /// The entry to run: an explicitly named word wins over the ENTRY tag.
    #[must_use]
    pub fn resolved_entry(&self) -> Option<i32> {
        self.named_entry.or(self.entry)
    }
}

fn copy_image(into: &mut [i32], payload: &[i32], what: &str) -> Result<(), ContainerError> {
    let count = payload.len() + 1;
    if count > into.len() {
        return Err(ContainerError::Rejected(format!(
            "{what} image of {count} cells exceeds allocation of {}",
            into.len()
        )));
    }
    into[0] = count as i32;
    into[1..count].copy_from_slice(payload);
    Ok(())
}

impl SegmentSink for ImageLoader<'_> {
    fn on_header(&mut self, bin_version: u32, io_version: u32) -> Result<(), ContainerError> {
        if bin_version != self.bin_version {
            return Err(ContainerError::Rejected(format!(
                "binary version {bin_version} (runtime supports {})",
                self.bin_version
            )));
        }
        if io_version != self.io_version {
            return Err(ContainerError::Rejected(format!(
                "I/O version {io_version} (runtime supports {})",
                self.io_version
            )));
        }
        Ok(())
    }

    fn on_segment(&mut self, kind: SegKind, payload: &[i32]) -> Result<(), ContainerError> {
        match kind {
            SegKind::Text => copy_image(self.text, payload, "code"),
            SegKind::Data => copy_image(self.data, payload, "data"),
            SegKind::Entry => {
                self.entry = payload.first().copied();
                Ok(())
            }
            SegKind::Map => {
                if let Some(name) = self.entry_name {
                    let entries = sidecar::read_map(unpack_map(payload).as_bytes())
                        .map_err(|e| ContainerError::Rejected(format!("bad map segment: {e}")))?;
                    self.named_entry = sidecar::find_entry(&entries, name);
                }
                Ok(())
            }
            SegKind::Config | SegKind::Crc | SegKind::Unknown(_) => Ok(()),
        }
    }
}
