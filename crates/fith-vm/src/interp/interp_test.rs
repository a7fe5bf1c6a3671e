// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Tests for the interpreter spaces, bounds policy and bootstrap.

#![allow(clippy::unwrap_used)]

use super::{DATA_USED, Fault, HERE_AT, Interpreter, WORD_LEN_AT};
use crate::cell::{Cell, FLAG_IMMED, FLAG_MACHINE, is_immediate};
use crate::opcode::Op;

fn spaces(text: usize, data: usize) -> (Vec<Cell>, Vec<Cell>) {
    (vec![0; text], vec![0; data])
}

#[test]
fn bounds_checked_accessors() {
    let (mut text, mut data) = spaces(4, 4);
    let mut interp = Interpreter::new(&mut text, &mut data);

    assert_eq!(interp.write_code(3, 7), Ok(()));
    assert_eq!(interp.read_code(3), Ok(7));
    assert_eq!(interp.read_code(4), Err(Fault::SegvCode));
    assert_eq!(interp.write_code(4, 1), Err(Fault::SegvCode));

    assert_eq!(interp.write_data(0, -9), Ok(()));
    assert_eq!(interp.read_data(0), Ok(-9));
    assert_eq!(interp.read_data(4), Err(Fault::SegvData));
    assert_eq!(interp.write_data(4, 1), Err(Fault::SegvData));
}

#[test]
fn get_string_round_trip() {
    let (mut text, mut data) = spaces(4, 32);
    let mut interp = Interpreter::new(&mut text, &mut data);
    interp.store_counted(WORD_LEN_AT, b"HELLO").unwrap();

    let s = interp.get_string(WORD_LEN_AT as Cell).unwrap();
    assert_eq!(s.as_str(), "HELLO");
    assert_eq!(s.len(), 5);
}

#[test]
fn get_string_rejects_bad_pointers() {
    let (mut text, mut data) = spaces(4, 16);
    let mut interp = Interpreter::new(&mut text, &mut data);
    interp.store_counted(WORD_LEN_AT, b"OK").unwrap();

    assert!(interp.get_string(-1).is_none(), "negative pointer");
    assert!(interp.get_string(16).is_none(), "pointer past the end");
    assert!(interp.get_string(15).is_none(), "length cell at the edge");
}

#[test]
fn get_string_rejects_negative_length() {
    let (mut text, mut data) = spaces(4, 16);
    let mut interp = Interpreter::new(&mut text, &mut data);
    interp.write_data(2, -5).unwrap();
    assert!(interp.get_string(2).is_none());
}

#[test]
fn get_string_rejects_missing_nul() {
    let (mut text, mut data) = spaces(4, 16);
    let mut interp = Interpreter::new(&mut text, &mut data);
    // length 3 but a nonzero byte where the NUL belongs
    interp.write_data(2, 3).unwrap();
    interp.write_data(3, Cell::from_le_bytes(*b"ABCD")).unwrap();
    assert!(interp.get_string(2).is_none());
}

#[test]
fn get_string_rejects_length_past_bound() {
    let (mut text, mut data) = spaces(4, 8);
    let mut interp = Interpreter::new(&mut text, &mut data);
    interp.write_data(6, 40).unwrap();
    assert!(interp.get_string(6).is_none());
}

#[test]
fn get_string_four_byte_length_needs_following_cell() {
    // len 4: payload fills one cell, NUL lives in the next
    let (mut text, mut data) = spaces(4, 4);
    let mut interp = Interpreter::new(&mut text, &mut data);
    interp.write_data(1, 4).unwrap();
    interp.write_data(2, Cell::from_le_bytes(*b"ABCD")).unwrap();
    // cell 3 holds the NUL, but the conservative bound requires one more
    assert!(interp.get_string(1).is_none());

    let (mut text, mut data) = spaces(4, 5);
    let mut interp = Interpreter::new(&mut text, &mut data);
    interp.write_data(1, 4).unwrap();
    interp.write_data(2, Cell::from_le_bytes(*b"ABCD")).unwrap();
    let s = interp.get_string(1).unwrap();
    assert_eq!(s.as_str(), "ABCD");
}

#[test]
fn bootstrap_populates_dictionary() {
    let (mut text, mut data) = spaces(64, 64);
    let interp = Interpreter::bootstrapped(&mut text, &mut data);

    assert_eq!(interp.here_data(), DATA_USED as Cell);
    assert_eq!(interp.find("DUP"), Some(FLAG_MACHINE | Op::Dup as Cell));
    assert_eq!(interp.find("EXIT"), Some(FLAG_MACHINE | Op::Exit as Cell));
    assert!(is_immediate(interp.find("IMMEDIATE").unwrap()));
    assert!(is_immediate(interp.find("[").unwrap()));
    assert!(!is_immediate(interp.find("]").unwrap()));

    // the three assembled words, in assembly order
    assert_eq!(interp.find(":"), Some(1));
    assert_eq!(interp.find(";"), Some(9 | FLAG_IMMED));
    assert_eq!(interp.find("QUIT"), Some(16));
    assert_eq!(interp.here_code(), 21);
    assert_eq!(interp.find("NOPE"), None);
}

#[test]
fn quit_body_loops_until_eof() {
    let (mut text, mut data) = spaces(64, 64);
    let interp = Interpreter::bootstrapped(&mut text, &mut data);
    let quit = interp.find("QUIT").unwrap() as usize;

    assert_eq!(interp.read_code(quit), Ok(Op::Interpret.cell()));
    assert_eq!(interp.read_code(quit + 1), Ok(Op::Eof.cell()));
    assert_eq!(interp.read_code(quit + 2), Ok(Op::Jz.cell()));
    assert_eq!(interp.read_code(quit + 3), Ok(-2));
    assert_eq!(interp.read_code(quit + 4), Ok(Op::Exit.cell()));
}

#[test]
fn compile_stops_silently_when_full() {
    let (mut text, mut data) = spaces(3, 32);
    let mut interp = Interpreter::new(&mut text, &mut data);
    interp.write_code(HERE_AT, 1).unwrap();
    interp.compile_cell(11);
    interp.compile_cell(22);
    interp.compile_cell(33); // no room left
    assert_eq!(interp.here_code(), 3);
    assert_eq!(interp.read_code(1), Ok(11));
    assert_eq!(interp.read_code(2), Ok(22));
}
