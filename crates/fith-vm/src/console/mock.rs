// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Console backed by in-memory buffers, for tests and embedding.

use super::Console;
use std::collections::VecDeque;
use std::string::String;
use std::vec::Vec;

/// Console over an in-memory input queue and output buffer.
pub struct MockConsole {
    /// Input buffer (data to be read)
    input: VecDeque<u8>,
    /// Output buffer (data that was written)
    output: Vec<u8>,
}

impl MockConsole {
    /// Create an empty console; every read reports end of stream.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            input: VecDeque::new(),
            output: Vec::new(),
        }
    }

    /// Create a console with pre-loaded input.
    #[must_use]
    pub fn with_input(input: &str) -> Self {
        Self {
            input: input.bytes().collect(),
            output: Vec::new(),
        }
    }

    /// The bytes written so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// The output interpreted as UTF-8 (lossy).
    #[must_use]
    pub fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Clear the output buffer.
    pub fn clear_output(&mut self) {
        self.output.clear();
    }

    /// Queue more input.
    pub fn push_input(&mut self, data: &str) {
        self.input.extend(data.bytes());
    }
}

impl Default for MockConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl Console for MockConsole {
    fn read_byte(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn write_byte(&mut self, byte: u8) {
        self.output.push(byte);
    }

    fn at_eof(&self) -> bool {
        self.input.is_empty()
    }
}
