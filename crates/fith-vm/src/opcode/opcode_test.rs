// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Tests for the opcode set.

use super::{CORE_OPS, NAMES, OP_COUNT, Op};
use crate::cell::{FLAG_MACHINE, is_machine};

#[test]
fn counts_line_up() {
    assert_eq!(Op::Syscall3 as usize, CORE_OPS - 1);
    assert_eq!(Op::StoreCode as usize, CORE_OPS);
    assert_eq!(Op::Gc as usize, OP_COUNT - 1);
    assert_eq!(NAMES.len(), OP_COUNT);
}

#[test]
fn names_align_with_indices() {
    assert_eq!(Op::Exit.name(), "EXIT");
    assert_eq!(Op::Tick.name(), "'");
    assert_eq!(Op::MulDiv.name(), "*/");
    assert_eq!(Op::Execute.name(), "EXECUTE");
    assert_eq!(Op::DupNz.name(), "?DUP");
    assert_eq!(Op::Srl.name(), ">>");
    assert_eq!(Op::Store.name(), "!");
    assert_eq!(Op::Syscall3.name(), "SYSCALL3");
    assert_eq!(Op::StoreCode.name(), "!C");
    assert_eq!(Op::Comma.name(), ",");
    assert_eq!(Op::Gc.name(), "GC");
}

#[test]
fn names_are_unique() {
    for (i, a) in NAMES.iter().enumerate() {
        for b in &NAMES[i + 1..] {
            assert_ne!(a, b, "duplicate opcode name {a}");
        }
    }
}

#[test]
fn cell_round_trip() {
    for i in 0..OP_COUNT as u32 {
        let op = Op::try_from(i).expect("index within OP_COUNT");
        let c = op.cell();
        assert!(is_machine(c));
        assert_eq!(Op::from_cell(c), Some(op));
    }
}

#[test]
fn from_cell_rejects_untagged_and_out_of_range() {
    assert_eq!(Op::from_cell(3), None, "plain address is not an opcode");
    assert_eq!(Op::from_cell(FLAG_MACHINE | OP_COUNT as i32), None);
}
