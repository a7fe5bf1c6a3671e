// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Tests for the CRC engine.

use proptest::prelude::*;

use super::Crc32;

#[test]
fn initial_state_is_all_ones() {
    assert_eq!(Crc32::new().remainder(), 0xFFFF_FFFF);
}

#[test]
fn table_first_entry_is_zero() {
    let mut a = Crc32::new();
    let mut b = Crc32::new();
    a.push_word(0);
    b.push_word(0);
    assert_eq!(a.remainder(), b.remainder(), "deterministic");
    assert_ne!(a.remainder(), Crc32::new().remainder(), "state advances");
}

#[test]
fn word_order_matters() {
    let mut a = Crc32::new();
    a.push_words(&[1, 2]);
    let mut b = Crc32::new();
    b.push_words(&[2, 1]);
    assert_ne!(a.remainder(), b.remainder());
}

#[test]
fn cells_and_words_agree() {
    let mut a = Crc32::new();
    a.push_cells(&[-1, 0x1234_5678]);
    let mut b = Crc32::new();
    b.push_words(&[0xFFFF_FFFF, 0x1234_5678]);
    assert_eq!(a.remainder(), b.remainder());
}

#[test]
fn self_check_on_known_sequence() {
    let mut crc = Crc32::new();
    crc.push_words(&[0x4854_4946, 1, 1, 1, 4]);
    let remainder = crc.remainder();
    crc.push_word(remainder);
    assert_eq!(crc.remainder(), 0);
}

proptest! {
    // Appending the current remainder as a further word yields zero.
    #[test]
    fn self_check_holds_for_any_stream(words in proptest::collection::vec(any::<u32>(), 0..64)) {
        let mut crc = Crc32::new();
        crc.push_words(&words);
        let remainder = crc.remainder();
        crc.push_word(remainder);
        prop_assert_eq!(crc.remainder(), 0);
    }

    // A single flipped word changes the remainder.
    #[test]
    fn distinct_streams_distinct_remainders(
        words in proptest::collection::vec(any::<u32>(), 1..32),
        index in any::<prop::sample::Index>(),
        flip in 1u32..,
    ) {
        let mut a = Crc32::new();
        a.push_words(&words);

        let mut mutated = words.clone();
        let i = index.index(mutated.len());
        mutated[i] ^= flip;
        let mut b = Crc32::new();
        b.push_words(&mutated);

        prop_assert_ne!(a.remainder(), b.remainder());
    }
}
