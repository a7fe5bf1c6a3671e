// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! # Fith image formats
//!
//! Persistent formats for Fith program images:
//!
//! - A streamed CRC-32 engine over whole 32-bit words
//! - The segmented, checksum-protected container (`.fith`): header,
//!   `{kind, count, payload}` segments, trailing CRC segment
//! - The legacy sidecar triple: `.bin` / `.dat` cell dumps and the
//!   `.map` address-to-name text file
//! - A loader that populates host-owned code and data arrays from a
//!   container
//!
//! Cells here are plain `i32`, matching the VM's cell model; containers
//! are written big-endian, sidecar dumps little-endian.

pub mod container;
pub mod crc;
pub mod loader;
pub mod sidecar;

pub use container::{ContainerError, ContainerWriter, SegKind, SegmentSink, read_container};
pub use crc::Crc32;
pub use loader::ImageLoader;
