// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Host-side pieces shared by the `fith` and `fith-plc` binaries:
//! console adapters over std I/O, the filesystem image sink, the PLC
//! simulator syscalls, and image loading helpers.

pub mod console;
pub mod image;
pub mod plc;
pub mod sink;

pub use console::IoConsole;
pub use plc::PlcSysCalls;
pub use sink::FsImageSink;
