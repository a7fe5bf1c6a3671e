// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Tests for the tagged cell model.

use super::{ADDR_MASK, FLAG_HIDE, FLAG_IMMED, FLAG_MACHINE, addr, is_hidden, is_immediate, is_machine};

#[test]
fn flags_occupy_top_three_bits() {
    assert_eq!(FLAG_MACHINE as u32, 0x8000_0000);
    assert_eq!(FLAG_IMMED as u32, 0x4000_0000);
    assert_eq!(FLAG_HIDE as u32, 0x2000_0000);
    assert_eq!(ADDR_MASK as u32, 0x1FFF_FFFF);
    assert_eq!(
        FLAG_MACHINE | FLAG_IMMED | FLAG_HIDE | ADDR_MASK,
        -1,
        "tags and address bits partition the cell"
    );
}

#[test]
fn addr_strips_all_tags() {
    let c = FLAG_MACHINE | FLAG_IMMED | FLAG_HIDE | 0x1234;
    assert_eq!(addr(c), 0x1234);
    assert_eq!(addr(0x1234), 0x1234);
    assert_eq!(addr(ADDR_MASK), 0x1FFF_FFFF);
}

#[test]
fn tag_predicates() {
    assert!(is_machine(FLAG_MACHINE | 7));
    assert!(!is_machine(7));
    assert!(is_immediate(FLAG_IMMED | 7));
    assert!(!is_immediate(FLAG_MACHINE | 7));
    assert!(is_hidden(FLAG_HIDE));
    assert!(!is_hidden(0));
}

#[test]
fn minus_one_carries_every_flag() {
    // FIND pushes -1 for a missing word; no real entry looks like that.
    assert!(is_machine(-1));
    assert!(is_immediate(-1));
    assert!(is_hidden(-1));
    assert_eq!(addr(-1), ADDR_MASK as usize);
}
