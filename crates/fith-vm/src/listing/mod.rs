// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Code-space disassembly for `DUMP`.

#[cfg(test)]
mod listing_test;

use std::fmt::Write;
use std::string::String;

use crate::cell::{self, Cell};
use crate::interp::Interpreter;
use crate::opcode::Op;

/// Render one cell: an opcode name, a known word name, or a number.
fn cell_to_string(interp: &Interpreter<'_>, c: Cell) -> String {
    if cell::is_machine(c) {
        return match Op::from_cell(c) {
            Some(op) => op.name().into(),
            None => "BAD OPCODE".into(),
        };
    }
    match interp.dict().reverse_find(c & cell::ADDR_MASK) {
        Some(name) => name.into(),
        None => {
            let mut s = String::new();
            let _ = write!(s, "{c}");
            s
        }
    }
}

/// Disassemble the live code space into a listing.
///
/// Word starts are labelled from the dictionary; `LIT`, `JMP` and `JZ`
/// show their raw operand inline, `'` shows its operand symbolically.
#[must_use]
pub fn disassemble(interp: &Interpreter<'_>) -> String {
    let mut out = String::new();
    let here = interp.here_code();
    if here < 0 || here as usize > interp.code_len() {
        let _ = writeln!(out, "invalid code watermark");
        return out;
    }

    let _ = writeln!(out, "HERE = {here}");
    let mut p = 1;
    while p < here as usize {
        if let Some(label) = interp.dict().reverse_find(p as Cell) {
            let _ = writeln!(out, "{label}:");
        }

        let Ok(c) = interp.read_code(p) else { break };
        let _ = write!(out, "{p:04}   {}", cell_to_string(interp, c));

        if let Some(op) = Op::from_cell(c) {
            match op {
                Op::Lit | Op::Jmp | Op::Jz => {
                    p += 1;
                    if let Ok(operand) = interp.read_code(p) {
                        let _ = write!(out, " {operand}");
                    }
                }
                Op::Tick => {
                    p += 1;
                    if let Ok(operand) = interp.read_code(p) {
                        let _ = write!(out, " {}", cell_to_string(interp, operand));
                    }
                }
                _ => {}
            }
        }
        let _ = writeln!(out);
        p += 1;
    }
    out
}
