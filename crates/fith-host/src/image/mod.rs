// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Image loading for the host drivers.
//!
//! A saved program arrives either as a `.fith` container or as the
//! sidecar triple (any other path is taken as the triple's base name).
//! The entry point is resolved name-first: an explicitly requested word
//! beats the container's ENTRY tag.

#[cfg(test)]
mod image_test;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context as _, bail};
use fith_image::container::read_container;
use fith_image::loader::ImageLoader;
use fith_image::sidecar;
use fith_vm::{BIN_VERSION, Cell, IO_VERSION};
use tracing::info;

/// Load a program image into host arrays and resolve its entry address.
pub fn load(
    path: &Path,
    entry_name: Option<&str>,
    text: &mut [Cell],
    data: &mut [Cell],
) -> anyhow::Result<Cell> {
    let entry = if path.extension().is_some_and(|e| e == "fith") {
        load_container(path, entry_name, text, data)?
    } else {
        load_sidecars(path, entry_name, text, data)?
    };
    let Some(entry) = entry else {
        match entry_name {
            Some(name) => bail!("entry point {name} not found in {}", path.display()),
            None => bail!("{} carries no entry point; name one", path.display()),
        }
    };
    info!(entry, "image loaded");
    Ok(entry)
}

fn load_container(
    path: &Path,
    entry_name: Option<&str>,
    text: &mut [Cell],
    data: &mut [Cell],
) -> anyhow::Result<Option<Cell>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut loader = ImageLoader::new(text, data, BIN_VERSION, IO_VERSION);
    if let Some(name) = entry_name {
        loader = loader.with_entry_name(name);
    }
    read_container(BufReader::new(file), &mut loader)
        .with_context(|| format!("read {}", path.display()))?;
    Ok(loader.resolved_entry())
}

fn load_sidecars(
    base: &Path,
    entry_name: Option<&str>,
    text: &mut [Cell],
    data: &mut [Cell],
) -> anyhow::Result<Option<Cell>> {
    let bin = base.with_extension("bin");
    let file = File::open(&bin).with_context(|| format!("open {}", bin.display()))?;
    sidecar::read_image(BufReader::new(file), text)
        .with_context(|| format!("read {}", bin.display()))?;

    let dat = base.with_extension("dat");
    let file = File::open(&dat).with_context(|| format!("open {}", dat.display()))?;
    sidecar::read_image(BufReader::new(file), data)
        .with_context(|| format!("read {}", dat.display()))?;

    let Some(name) = entry_name else {
        return Ok(None);
    };
    let map = base.with_extension("map");
    let file = File::open(&map).with_context(|| format!("open {}", map.display()))?;
    let entries =
        sidecar::read_map(BufReader::new(file)).with_context(|| format!("read {}", map.display()))?;
    Ok(sidecar::find_entry(&entries, name))
}
