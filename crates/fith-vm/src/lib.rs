// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! # Fith VM
//!
//! A safety-oriented Forth-like virtual machine for small embedded
//! controllers. A loaded program cannot corrupt the interpreter:
//!
//! - every memory access is bounds-checked,
//! - code and data live in separate address spaces,
//! - the compiler needed to produce programs is not part of the runtime
//!   on the constrained target.
//!
//! This crate provides:
//! - Tagged 32-bit cell model and the two-space bounds policy
//! - Threaded-code execution engine with bounded stacks
//! - The primitive word set (arithmetic, stack shuffles, memory access,
//!   return-stack transfers, syscalls)
//! - With the `full` feature: the interactive compiler (dictionary, outer
//!   interpreter), the tracing relocator, and image persistence hooks
//!
//! The interpreter borrows its code and data spaces from the host and
//! never outlives them; execution contexts likewise borrow their stacks.
//! Host capabilities (syscalls, console streams, image persistence) are
//! injected as trait objects.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod cell;
pub mod exec;
pub mod interp;
pub mod opcode;
pub mod syscall;

#[cfg(feature = "full")]
pub mod console;
#[cfg(feature = "full")]
pub mod dict;
#[cfg(feature = "full")]
pub mod listing;
#[cfg(feature = "full")]
pub mod persist;
#[cfg(feature = "full")]
pub mod reloc;

// Re-export commonly used types at crate root
pub use cell::Cell;
pub use exec::{Context, ExecState};
pub use interp::{Fault, Interpreter};
pub use opcode::Op;
pub use syscall::{NullSysCalls, SysCalls};

/// Instruction-set compatibility version carried in saved containers.
pub const BIN_VERSION: u32 = 1;

/// Syscall-numbering compatibility version carried in saved containers.
pub const IO_VERSION: u32 = 1;
