// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Console over std byte streams.


use std::io::{BufRead, Write};

use fith_vm::console::Console;

/// Console adapter over buffered std input and output.
///
/// Pending output is flushed before every blocking read, so prompts and
/// `.` output appear before the interpreter waits for more source.
pub struct IoConsole<R: BufRead, W: Write> {
    input: R,
    output: W,
    eof: bool,
}

impl<R: BufRead, W: Write> IoConsole<R, W> {
    /// Wrap an input and an output stream.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            eof: false,
        }
    }
}

impl<R: BufRead, W: Write> Console for IoConsole<R, W> {
    fn read_byte(&mut self) -> Option<u8> {
        let _ = self.output.flush();
        let byte = match self.input.fill_buf() {
            Ok([]) | Err(_) => {
                self.eof = true;
                return None;
            }
            Ok(buf) => buf[0],
        };
        self.input.consume(1);
        Some(byte)
    }

    fn write_byte(&mut self, byte: u8) {
        let _ = self.output.write_all(&[byte]);
    }

    fn at_eof(&self) -> bool {
        self.eof
    }
}

impl<R: BufRead, W: Write> Drop for IoConsole<R, W> {
    fn drop(&mut self) {
        let _ = self.output.flush();
    }
}
