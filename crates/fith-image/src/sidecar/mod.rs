// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! The legacy sidecar triple.
//!
//! `<name>.bin` and `<name>.dat` are raw little-endian cell dumps whose
//! first cell is the total length including itself (the image
//! watermark). `<name>.map` is ASCII lines of `<8-hex-digit-address>
//! <name>`, one visible word per line.


use std::io::{self, BufRead, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use thiserror::Error;

/// Why a sidecar file could not be read.
#[derive(Debug, Error)]
pub enum SidecarError {
    /// The length prefix is non-positive or exceeds the allocation.
    #[error("invalid length prefix {0}")]
    BadLength(i32),
    /// The stream ended before the declared cell count.
    #[error("short read")]
    ShortRead,
    /// A map line is not `<hex-address> <name>`.
    #[error("malformed map line: {0:?}")]
    BadMapLine(String),
    /// Underlying stream failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Write an image dump; `cells[0]` must already hold the cell count.
pub fn write_image<W: Write>(mut out: W, cells: &[i32]) -> io::Result<()> {
    for &cell in cells {
        out.write_i32::<LittleEndian>(cell)?;
    }
    Ok(())
}

/// Read an image dump into `into`, validating the length prefix against
/// the allocation. Returns the number of cells read.
pub fn read_image<R: Read>(mut input: R, into: &mut [i32]) -> Result<usize, SidecarError> {
    let read_cell = |input: &mut R| match input.read_i32::<LittleEndian>() {
        Ok(cell) => Ok(cell),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(SidecarError::ShortRead),
        Err(e) => Err(SidecarError::Io(e)),
    };

    let len = read_cell(&mut input)?;
    if len < 1 || len as usize > into.len() {
        return Err(SidecarError::BadLength(len));
    }
    into[0] = len;
    for slot in &mut into[1..len as usize] {
        *slot = read_cell(&mut input)?;
    }
    Ok(len as usize)
}

/// Write the symbol map: one `<8-hex-digit> <name>` line per entry.
pub fn write_map<'a, W, I>(mut out: W, entries: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = (i32, &'a str)>,
{
    for (cell, name) in entries {
        writeln!(out, "{:08x} {name}", cell as u32)?;
    }
    Ok(())
}

/// Render the symbol map to a string (the container embeds it as text).
#[must_use]
pub fn map_to_string<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (i32, &'a str)>,
{
    let mut out = Vec::new();
    // writing to a Vec cannot fail
    let _ = write_map(&mut out, entries);
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse a symbol map.
pub fn read_map<R: BufRead>(input: R) -> Result<Vec<(i32, String)>, SidecarError> {
    let mut entries = Vec::new();
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(addr), Some(name), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(SidecarError::BadMapLine(line));
        };
        let Ok(cell) = u32::from_str_radix(addr, 16) else {
            return Err(SidecarError::BadMapLine(line));
        };
        entries.push((cell as i32, name.to_owned()));
    }
    Ok(entries)
}

/// Find a named entry point in a parsed map.
#[must_use]
pub fn find_entry(entries: &[(i32, String)], name: &str) -> Option<i32> {
    entries
        .iter()
        .find(|(_, n)| n == name)
        .map(|&(cell, _)| cell)
}
