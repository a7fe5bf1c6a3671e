// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Compiler primitives: code-space access, stream I/O, the word reader,
//! numeric parsing, dictionary operations and the outer interpreter.
//!
//! These exist only with the `full` feature; a constrained runtime
//! reports their opcodes as bad.

use std::string::{String, ToString};
use std::vec::Vec;

use super::prims::mw_execute;
use super::{Builtin, ExecState, Run};
use crate::cell::{self, Cell, FLAG_HIDE, FLAG_MACHINE};
use crate::interp::{HERE_AT, LATEST_LEN_AT, WORD_BUF_AT, WORD_LEN_AT, WORD_MAX};
use crate::listing;
use crate::opcode::{CORE_OPS, OP_COUNT, Op};
use crate::persist::ImageSnapshot;
use crate::reloc;

/// Dispatch table for the compiler opcodes, continuing the core table at
/// index [`CORE_OPS`].
pub(super) const COMPILER: [Builtin; OP_COUNT - CORE_OPS] = [
    mw_storecode,
    mw_fetchcode,
    mw_comma,
    mw_key,
    mw_emit,
    mw_word,
    mw_eof,
    mw_number,
    mw_dot,
    mw_create,
    mw_find,
    mw_latest,
    mw_immediate,
    mw_hidden,
    mw_lbrac,
    mw_rbrac,
    mw_state,
    mw_interpret,
    mw_dump,
    mw_save,
    mw_gc,
];

fn mw_storecode(r: &mut Run<'_, '_, '_>) {
    // (val addr --)
    if !r.need_d(2) {
        return;
    }
    let at = r.top_d(0);
    let val = r.top_d(1);
    if at < 0 {
        r.fail(ExecState::SegvCode);
        return;
    }
    match r.interp.write_code(at as usize, val) {
        Ok(()) => r.ctx.dsp -= 2,
        Err(fault) => r.fail(fault.into()),
    }
}

fn mw_fetchcode(r: &mut Run<'_, '_, '_>) {
    // (addr -- val)
    if !r.need_d(1) {
        return;
    }
    let at = r.top_d(0);
    if at < 0 {
        r.fail(ExecState::SegvCode);
        return;
    }
    match r.interp.read_code(at as usize) {
        Ok(value) => r.set_top_d(0, value),
        Err(fault) => r.fail(fault.into()),
    }
}

pub(super) fn mw_comma(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) {
        return;
    }
    let here = r.interp.here_code();
    if here < 0 || here as usize >= r.interp.code_len() {
        r.fail(ExecState::SegvCode);
        return;
    }
    let value = r.pop_d();
    let _ = r.interp.write_code(here as usize, value);
    let _ = r.interp.write_code(HERE_AT, here + 1);
}

fn mw_key(r: &mut Run<'_, '_, '_>) {
    if !r.room_d(1) {
        return;
    }
    match r.console.read_byte() {
        Some(byte) => r.push_d(Cell::from(byte)),
        None => r.push_d(-1),
    }
}

fn mw_emit(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) {
        return;
    }
    let v = r.pop_d();
    r.console.write_byte((v & 0xFF) as u8);
}

pub(super) fn mw_word(r: &mut Run<'_, '_, '_>) {
    if !r.room_d(1) {
        return;
    }
    // skip leading whitespace
    let mut first = None;
    while let Some(b) = r.console.read_byte() {
        if !b.is_ascii_whitespace() {
            first = Some(b);
            break;
        }
    }
    let stored = match first {
        None => {
            // end of stream: length -1, empty buffer
            r.interp
                .write_data(WORD_LEN_AT, -1)
                .and_then(|()| r.interp.write_data(WORD_BUF_AT, 0))
        }
        Some(b0) => {
            let mut buf = [0u8; WORD_MAX];
            buf[0] = b0;
            let mut len = 1;
            while let Some(b) = r.console.read_byte() {
                if b.is_ascii_whitespace() {
                    break;
                }
                if len < WORD_MAX {
                    buf[len] = b;
                }
                len += 1;
            }
            r.interp.store_counted(WORD_LEN_AT, &buf[..len.min(WORD_MAX)])
        }
    };
    match stored {
        Ok(()) => r.push_d(WORD_LEN_AT as Cell),
        Err(fault) => r.fail(fault.into()),
    }
}

fn mw_eof(r: &mut Run<'_, '_, '_>) {
    if !r.room_d(1) {
        return;
    }
    r.push_d(Cell::from(r.console.at_eof()));
}

/// Parse with C `strtol(str, _, 0)` semantics: optional whitespace and
/// sign, `0x` hex, leading-`0` octal, else decimal; overflow clamps.
/// Returns the value and the count of unconverted trailing bytes.
fn parse_number(s: &str) -> (Cell, usize) {
    let b = s.as_bytes();
    let mut i = 0;
    while i < b.len() && b[i].is_ascii_whitespace() {
        i += 1;
    }
    let mut negative = false;
    let mut j = i;
    if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
        negative = b[j] == b'-';
        j += 1;
    }
    let (radix, digits) = if j + 1 < b.len() && b[j] == b'0' && (b[j + 1] | 0x20) == b'x' {
        (16, j + 2)
    } else if j < b.len() && b[j] == b'0' {
        (8, j)
    } else {
        (10, j)
    };
    let mut k = digits;
    let mut value: i64 = 0;
    while k < b.len() {
        let Some(d) = char::from(b[k]).to_digit(radix) else {
            break;
        };
        value = value
            .saturating_mul(i64::from(radix))
            .saturating_add(i64::from(d));
        k += 1;
    }
    if k == digits {
        if radix == 16 {
            // "0x" with no hex digit converts the leading zero alone
            return (0, s.len() - (j + 1));
        }
        return (0, s.len());
    }
    if negative {
        value = value.saturating_neg();
    }
    (value as Cell, s.len() - k)
}

pub(super) fn mw_number(r: &mut Run<'_, '_, '_>) {
    // (ptr -- value unconverted)
    if !r.need_d(1) || !r.room_d(1) {
        return;
    }
    match r.interp.get_string(r.top_d(0)) {
        Some(s) if !s.is_empty() => {
            let (value, unconverted) = parse_number(s.as_str());
            r.set_top_d(0, value);
            r.push_d(unconverted as Cell);
        }
        _ => {
            // invalid or empty string
            r.set_top_d(0, 0);
            r.push_d(-1);
        }
    }
}

fn mw_dot(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) {
        return;
    }
    let v = r.pop_d();
    r.console.write_int(v);
    r.console.write_byte(b' ');
}

fn mw_create(r: &mut Run<'_, '_, '_>) {
    // (name-ptr value --)
    if !r.need_d(2) {
        return;
    }
    let value = r.top_d(0);
    let Some(name) = r.interp.get_string(r.top_d(1)) else {
        r.fail(ExecState::SegvData);
        return;
    };
    r.ctx.dsp -= 2;
    r.interp.create(name.as_str(), value);
}

pub(super) fn mw_find(r: &mut Run<'_, '_, '_>) {
    // (name-ptr -- entry | -1)
    if !r.need_d(1) {
        return;
    }
    let Some(name) = r.interp.get_string(r.top_d(0)) else {
        r.fail(ExecState::SegvData);
        return;
    };
    let found = r.interp.find(name.as_str()).unwrap_or(-1);
    r.set_top_d(0, found);
}

fn mw_latest(r: &mut Run<'_, '_, '_>) {
    if !r.room_d(1) {
        return;
    }
    let name: String = r.interp.dict().latest().to_string();
    match r.interp.store_counted(LATEST_LEN_AT, name.as_bytes()) {
        Ok(()) => r.push_d(LATEST_LEN_AT as Cell),
        Err(fault) => r.fail(fault.into()),
    }
}

fn mw_immediate(r: &mut Run<'_, '_, '_>) {
    r.interp.dict_mut().toggle_latest_immediate();
}

fn mw_hidden(r: &mut Run<'_, '_, '_>) {
    // (name-ptr --)
    if !r.need_d(1) {
        return;
    }
    let Some(name) = r.interp.get_string(r.top_d(0)) else {
        r.fail(ExecState::SegvData);
        return;
    };
    r.pop_d();
    r.interp.dict_mut().toggle_hidden(name.as_str());
}

fn mw_lbrac(r: &mut Run<'_, '_, '_>) {
    r.interp.set_compiling(false);
}

fn mw_rbrac(r: &mut Run<'_, '_, '_>) {
    r.interp.set_compiling(true);
}

fn mw_state(r: &mut Run<'_, '_, '_>) {
    if !r.room_d(1) {
        return;
    }
    r.push_d(Cell::from(r.interp.compiling()));
}

/// Report a token the interpreter could not resolve.
fn unrecognised(r: &mut Run<'_, '_, '_>) {
    let name = r
        .interp
        .get_string(WORD_LEN_AT as Cell)
        .map(|s| s.as_str().to_string())
        .unwrap_or_default();
    r.console.write_str("Unrecognised word ");
    r.console.write_str(&name);
    r.console.write_byte(b'\n');
}

fn mw_interpret(r: &mut Run<'_, '_, '_>) {
    mw_word(r);
    if r.ctx.state != ExecState::Running {
        return;
    }
    if r.interp.read_data(WORD_LEN_AT).unwrap_or(-1) < 1 {
        // end of stream: discard the pointer, QUIT breaks out on EOF
        if r.ctx.dsp > 0 {
            r.ctx.dsp -= 1;
        }
        return;
    }

    mw_find(r);
    if r.ctx.state != ExecState::Running {
        return;
    }
    let entry = r.top_d(0);
    if entry != -1 {
        if cell::is_hidden(entry) {
            // hidden words are invisible to execution and compilation
            r.ctx.dsp -= 1;
            unrecognised(r);
            return;
        }
        if !r.interp.compiling() || cell::is_immediate(entry) {
            mw_execute(r);
        } else {
            // compile the entry, tag bits preserved
            mw_comma(r);
        }
        return;
    }

    // not a word; try it as a number
    r.set_top_d(0, WORD_LEN_AT as Cell);
    mw_number(r);
    if r.ctx.state != ExecState::Running {
        return;
    }
    if r.top_d(0) == 0 {
        // fully converted: drop the count, keep or compile the value
        r.ctx.dsp -= 1;
        if r.interp.compiling() {
            r.interp.compile_op(Op::Lit);
            mw_comma(r);
        }
    } else {
        r.ctx.dsp -= 2;
        unrecognised(r);
    }
}

fn mw_dump(r: &mut Run<'_, '_, '_>) {
    let text = listing::disassemble(r.interp);
    r.console.write_str(&text);
}

fn mw_save(r: &mut Run<'_, '_, '_>) {
    save_image(r, None);
}

/// Snapshot the live image and hand it to the host's sink.
fn save_image(r: &mut Run<'_, '_, '_>, entry: Option<Cell>) {
    let here_b = r.interp.here_code();
    if here_b < 0 || here_b as usize > r.interp.code_len() {
        r.console.write_str("SAVE: invalid code watermark\n");
        return;
    }
    let here_d = r.interp.here_data();
    if here_d < 0 || here_d as usize > r.interp.data_len() {
        r.console.write_str("SAVE: invalid data watermark\n");
        return;
    }

    let map: Vec<(Cell, String)> = r
        .interp
        .dict()
        .iter()
        .filter(|&(_, v)| v & (FLAG_MACHINE | FLAG_HIDE) == 0)
        .map(|(name, v)| (v, name.to_string()))
        .collect();

    let snapshot = ImageSnapshot {
        text: &r.interp.text()[..here_b as usize],
        data: &r.interp.data()[..here_d as usize],
        map: &map,
        entry,
    };
    match r.sink.save(&snapshot) {
        Ok(()) => r.console.write_str("SAVE success\n"),
        Err(e) => {
            let msg = e.to_string();
            r.console.write_str("SAVE failed: ");
            r.console.write_str(&msg);
            r.console.write_byte(b'\n');
        }
    }
}

fn mw_gc(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) {
        return;
    }
    let root = r.pop_d();
    match reloc::relocate(r.interp, root) {
        Ok(new_root) => {
            save_image(r, new_root);
            r.fail(ExecState::Halted);
        }
        Err(e) => {
            let msg = e.to_string();
            r.console.write_str("GC failed: ");
            r.console.write_str(&msg);
            r.console.write_byte(b'\n');
            r.fail(ExecState::SegvCode);
        }
    }
}
