// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Filesystem image sink.
//!
//! Persists a VM snapshot as the sidecar triple (`.bin`, `.dat`, `.map`)
//! plus the segmented container (`.fith`). The container carries TEXT,
//! DATA, MAP, the ENTRY tag when the save follows a relocation, and the
//! trailing CRC segment.

#[cfg(test)]
mod sink_test;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use fith_image::container::ContainerWriter;
use fith_image::sidecar;
use fith_vm::persist::{ImageSink, ImageSnapshot};
use tracing::info;

/// Writes snapshots under a base path.
pub struct FsImageSink {
    base: PathBuf,
    bin_version: u32,
    io_version: u32,
}

impl FsImageSink {
    /// Sink writing `<base>.bin`, `<base>.dat`, `<base>.map` and
    /// `<base>.fith`.
    pub fn new(base: impl Into<PathBuf>, bin_version: u32, io_version: u32) -> Self {
        Self {
            base: base.into(),
            bin_version,
            io_version,
        }
    }

    fn path(&self, extension: &str) -> PathBuf {
        self.base.with_extension(extension)
    }
}

impl ImageSink for FsImageSink {
    fn save(&mut self, image: &ImageSnapshot<'_>) -> io::Result<()> {
        let entries = || image.map.iter().map(|(cell, name)| (*cell, name.as_str()));

        let mut out = BufWriter::new(File::create(self.path("map"))?);
        sidecar::write_map(&mut out, entries())?;
        out.flush()?;

        let mut out = BufWriter::new(File::create(self.path("bin"))?);
        sidecar::write_image(&mut out, image.text)?;
        out.flush()?;

        let mut out = BufWriter::new(File::create(self.path("dat"))?);
        sidecar::write_image(&mut out, image.data)?;
        out.flush()?;

        let segments = 3 + u32::from(image.entry.is_some());
        let mut w = ContainerWriter::new(
            BufWriter::new(File::create(self.path("fith"))?),
            segments + 1,
            self.bin_version,
            self.io_version,
        )
        .map_err(io::Error::other)?;
        w.text(image.text).map_err(io::Error::other)?;
        w.data(image.data).map_err(io::Error::other)?;
        w.map(&sidecar::map_to_string(entries()))
            .map_err(io::Error::other)?;
        if let Some(entry) = image.entry {
            w.entry(entry).map_err(io::Error::other)?;
        }
        w.finish().map_err(io::Error::other)?.flush()?;

        info!(
            base = %self.base.display(),
            text_cells = image.text.len(),
            data_cells = image.data.len(),
            words = image.map.len(),
            "image saved"
        );
        Ok(())
    }
}
