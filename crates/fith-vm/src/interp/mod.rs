// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Interpreter state: the two cell spaces and the bounds policy.
//!
//! Code space (text) and data space (heap) are independent arrays of
//! cells owned by the host; the interpreter borrows them for its
//! lifetime. Cell 0 of each space is the allocation watermark, so valid
//! program content starts at index 1.
//!
//! Strings in data space are a length cell followed by NUL-terminated
//! bytes packed little-endian into cells; on the stack a string is the
//! index of its length cell.
//!
//! With the `full` feature the interpreter also owns the dictionary, the
//! compile-mode flag, and the bootstrap assembler that produces `:`, `;`
//! and `QUIT`.

#[cfg(all(test, feature = "full"))]
mod interp_test;

use crate::cell::Cell;

#[cfg(feature = "full")]
use crate::cell::FLAG_IMMED;
#[cfg(feature = "full")]
use crate::cell::FLAG_MACHINE;
#[cfg(feature = "full")]
use crate::dict::Dictionary;
#[cfg(feature = "full")]
use crate::opcode::{NAMES, Op};

/// Bounds violation in one of the two spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Access outside code space.
    SegvCode,
    /// Access outside data space.
    SegvData,
}

/// Reserved index of the allocation watermark in either space.
pub const HERE_AT: usize = 0;

/// Data-space index of the word buffer's length cell.
#[cfg(feature = "full")]
pub const WORD_LEN_AT: usize = 1;

/// Data-space index of the word buffer's first byte cell.
#[cfg(feature = "full")]
pub const WORD_BUF_AT: usize = 2;

/// Cells per name buffer: 31 bytes plus NUL.
#[cfg(feature = "full")]
pub const WORD_CELLS: usize = 8;

/// Data-space index of the latest-name buffer's length cell.
#[cfg(feature = "full")]
pub const LATEST_LEN_AT: usize = WORD_BUF_AT + WORD_CELLS;

/// Data-space index of the latest-name buffer's first byte cell.
#[cfg(feature = "full")]
pub const LATEST_BUF_AT: usize = LATEST_LEN_AT + 1;

/// First data-space cell free for user allocation after bootstrap.
#[cfg(feature = "full")]
pub const DATA_USED: usize = LATEST_BUF_AT + WORD_CELLS;

/// Longest name a word buffer can hold.
#[cfg(feature = "full")]
pub const WORD_MAX: usize = WORD_CELLS * 4 - 1;

/// A string extracted from data space into an inline buffer.
#[derive(Clone)]
pub struct StrBuf {
    len: u8,
    data: [u8; 127],
}

impl StrBuf {
    /// Maximum capacity in bytes.
    pub const CAP: usize = 127;

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > Self::CAP {
            return None;
        }
        let mut data = [0u8; Self::CAP];
        data[..bytes.len()].copy_from_slice(bytes);
        Some(Self {
            len: bytes.len() as u8,
            data,
        })
    }

    /// The string contents; empty if the stored bytes are not UTF-8.
    #[must_use]
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.data[..self.len as usize]).unwrap_or("")
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Is the string empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl core::fmt::Debug for StrBuf {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "StrBuf({:?})", self.as_str())
    }
}

/// The shared interpreter: both spaces and, in full mode, the dictionary.
pub struct Interpreter<'m> {
    text: &'m mut [Cell],
    data: &'m mut [Cell],
    #[cfg(feature = "full")]
    dict: Dictionary,
    #[cfg(feature = "full")]
    compiling: bool,
}

impl<'m> Interpreter<'m> {
    /// Wrap preloaded code and data images.
    ///
    /// Nothing is initialised; the images carry their own watermarks.
    pub fn new(text: &'m mut [Cell], data: &'m mut [Cell]) -> Self {
        Self {
            text,
            data,
            #[cfg(feature = "full")]
            dict: Dictionary::new(),
            #[cfg(feature = "full")]
            compiling: false,
        }
    }

    /// Create a freshly bootstrapped interpreter: watermarks and name
    /// buffers initialised, every primitive in the dictionary, and the
    /// compiler words `:`, `;` and `QUIT` assembled.
    ///
    /// The data space must hold at least [`DATA_USED`] cells and the code
    /// space enough cells for the bootstrap words (a few dozen).
    #[cfg(feature = "full")]
    pub fn bootstrapped(text: &'m mut [Cell], data: &'m mut [Cell]) -> Self {
        let mut interp = Self::new(text, data);
        let _ = interp.write_code(HERE_AT, 1);
        let _ = interp.write_data(HERE_AT, DATA_USED as Cell);
        let _ = interp.write_data(WORD_LEN_AT, 0);
        let _ = interp.write_data(LATEST_LEN_AT, 0);
        interp.bootstrap(true);
        interp
    }

    /// Read a cell from code space.
    pub fn read_code(&self, at: usize) -> Result<Cell, Fault> {
        self.text.get(at).copied().ok_or(Fault::SegvCode)
    }

    /// Write a cell to code space.
    pub fn write_code(&mut self, at: usize, value: Cell) -> Result<(), Fault> {
        match self.text.get_mut(at) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Fault::SegvCode),
        }
    }

    /// Read a cell from data space.
    pub fn read_data(&self, at: usize) -> Result<Cell, Fault> {
        self.data.get(at).copied().ok_or(Fault::SegvData)
    }

    /// Write a cell to data space.
    pub fn write_data(&mut self, at: usize, value: Cell) -> Result<(), Fault> {
        match self.data.get_mut(at) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Fault::SegvData),
        }
    }

    /// Declared code-space size in cells.
    #[must_use]
    pub fn code_len(&self) -> usize {
        self.text.len()
    }

    /// Declared data-space size in cells.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.data.len()
    }

    /// The whole code space.
    #[must_use]
    pub fn text(&self) -> &[Cell] {
        self.text
    }

    /// The whole data space.
    #[must_use]
    pub fn data(&self) -> &[Cell] {
        self.data
    }

    /// Code-space watermark: index of the next free cell.
    #[must_use]
    pub fn here_code(&self) -> Cell {
        self.text.first().copied().unwrap_or(0)
    }

    /// Data-space watermark: index of the next free cell.
    #[must_use]
    pub fn here_data(&self) -> Cell {
        self.data.first().copied().unwrap_or(0)
    }

    /// Validate and extract the string whose length cell is at `at`.
    ///
    /// A valid string has a non-negative length, fits inside data space
    /// including its terminating NUL, and carries that NUL at offset
    /// `len`. Anything else is invalid and yields `None`.
    #[must_use]
    pub fn get_string(&self, at: Cell) -> Option<StrBuf> {
        if at < 0 {
            return None;
        }
        let ptr = at as usize;
        let len_cell = self.read_data(ptr).ok()?;
        if len_cell < 0 {
            return None;
        }
        let len = len_cell as usize;
        if len > StrBuf::CAP {
            return None;
        }
        // Conservative bound: the cell after the payload must also exist,
        // which keeps the NUL of a 4-aligned length in range.
        let payload_cells = len.div_ceil(4);
        if ptr + 1 + payload_cells >= self.data.len() {
            return None;
        }
        let byte_at = |k: usize| (self.data[ptr + 1 + k / 4] >> ((k % 4) * 8)) as u8;
        if byte_at(len) != 0 {
            return None;
        }
        let mut buf = [0u8; StrBuf::CAP];
        let mut n = 0;
        while n < len {
            let b = byte_at(n);
            if b == 0 {
                break;
            }
            buf[n] = b;
            n += 1;
        }
        StrBuf::from_bytes(&buf[..n])
    }

    /// Write a counted, NUL-terminated string into one of the fixed name
    /// buffers (`len_at` is the length cell, bytes follow).
    #[cfg(feature = "full")]
    pub(crate) fn store_counted(&mut self, len_at: usize, bytes: &[u8]) -> Result<(), Fault> {
        let len = bytes.len().min(WORD_MAX);
        self.write_data(len_at, len as Cell)?;
        for k in 0..WORD_CELLS {
            let mut cell = 0;
            for b in 0..4 {
                let i = k * 4 + b;
                if i < len {
                    cell |= Cell::from(bytes[i]) << (b * 8);
                }
            }
            self.write_data(len_at + 1 + k, cell)?;
        }
        Ok(())
    }

    /// Append a cell at the code watermark; silently ignored when the
    /// space is exhausted (the COMMA primitive reports instead).
    #[cfg(feature = "full")]
    pub(crate) fn compile_cell(&mut self, value: Cell) {
        let here = self.here_code();
        if here < 0 || here as usize >= self.text.len() {
            return;
        }
        self.text[here as usize] = value;
        self.text[HERE_AT] = here + 1;
    }

    /// Append a primitive reference at the code watermark.
    #[cfg(feature = "full")]
    pub(crate) fn compile_op(&mut self, op: Op) {
        self.compile_cell(op.cell());
    }

    /// Populate the dictionary with every primitive name (marking
    /// `IMMEDIATE` and `[` immediate) and, when `with_compiler` is set,
    /// assemble the bootstrap words.
    #[cfg(feature = "full")]
    pub(crate) fn bootstrap(&mut self, with_compiler: bool) {
        for (i, name) in NAMES.iter().enumerate() {
            self.dict.define(name, (i as Cell) | FLAG_MACHINE);
        }
        self.dict.or_flags("IMMEDIATE", FLAG_IMMED);
        self.dict.or_flags("[", FLAG_IMMED);

        if with_compiler {
            // : reads a name, binds it to HERE, hides it, compiles
            let colon = self.here_code();
            self.dict.define(":", colon);
            for op in [
                Op::Word,
                Op::Here,
                Op::FetchCode,
                Op::Create,
                Op::Latest,
                Op::Hidden,
                Op::RBrac,
                Op::Exit,
            ] {
                self.compile_op(op);
            }

            // ; appends EXIT, unhides, returns to immediate mode
            let semicolon = self.here_code() | FLAG_IMMED;
            self.dict.define(";", semicolon);
            for op in [
                Op::Tick,
                Op::Exit, // tick's operand: the EXIT cell to append
                Op::Comma,
                Op::Latest,
                Op::Hidden,
                Op::LBrac,
                Op::Exit,
            ] {
                self.compile_op(op);
            }

            // QUIT: do { interpret } while not EOF
            let quit = self.here_code();
            self.dict.define("QUIT", quit);
            self.compile_op(Op::Interpret);
            self.compile_op(Op::Eof);
            self.compile_op(Op::Jz);
            self.compile_cell(-2);
            self.compile_op(Op::Exit);
        }
    }

    /// Look up a dictionary entry by name.
    #[cfg(feature = "full")]
    #[must_use]
    pub fn find(&self, name: &str) -> Option<Cell> {
        self.dict.lookup(name)
    }

    /// Bind a name to a cell and remember it as the latest creation.
    #[cfg(feature = "full")]
    pub fn create(&mut self, name: &str, value: Cell) {
        self.dict.define(name, value);
    }

    /// The dictionary, for listings and persistence.
    #[cfg(feature = "full")]
    #[must_use]
    pub fn dict(&self) -> &Dictionary {
        &self.dict
    }

    /// Mutable dictionary access for flag toggles.
    #[cfg(feature = "full")]
    pub(crate) fn dict_mut(&mut self) -> &mut Dictionary {
        &mut self.dict
    }

    /// Is the outer interpreter in compile mode?
    #[cfg(feature = "full")]
    #[must_use]
    pub fn compiling(&self) -> bool {
        self.compiling
    }

    /// Enter or leave compile mode.
    #[cfg(feature = "full")]
    pub fn set_compiling(&mut self, on: bool) {
        self.compiling = on;
    }
}
