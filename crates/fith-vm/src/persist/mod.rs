// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Image persistence capability.
//!
//! `SAVE` and `GC` snapshot the live image and hand it to a host-provided
//! sink. The VM decides *when* to persist; the host decides *where* and
//! in which formats (typically the sidecar triple and the segmented
//! container).

use std::io;
use std::string::String;

use crate::cell::Cell;

/// A consistent view of the live image at the moment of a save.
pub struct ImageSnapshot<'a> {
    /// Live code cells, watermark first (`text[0]` is the cell count).
    pub text: &'a [Cell],
    /// Live data cells, watermark first.
    pub data: &'a [Cell],
    /// Symbol map: stored dictionary cell and name, for every visible
    /// compiled word, in dictionary iteration order.
    pub map: &'a [(Cell, String)],
    /// Entry address, when the save follows a relocation.
    pub entry: Option<Cell>,
}

/// Host-provided image persistence.
pub trait ImageSink {
    /// Persist a snapshot. Errors are reported to the program's output
    /// stream and execution continues.
    fn save(&mut self, image: &ImageSnapshot<'_>) -> io::Result<()>;
}

/// A sink that discards every snapshot.
pub struct NullSink;

impl ImageSink for NullSink {
    fn save(&mut self, _image: &ImageSnapshot<'_>) -> io::Result<()> {
        Ok(())
    }
}
