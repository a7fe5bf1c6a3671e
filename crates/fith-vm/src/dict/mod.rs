// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Word dictionary for the interactive compiler.
//!
//! Maps names to cells; for a primitive the stored cell is its opcode
//! index with the machine flag, for a compiled word it is the code
//! address of the body, either possibly carrying the immediate and
//! hidden flags.
//!
//! The map is ordered by name. Ordered iteration matters twice: the
//! relocator derives word extents from the sorted address view, and SAVE
//! emits the symbol map in iteration order.


use std::collections::BTreeMap;
use std::string::String;

use crate::cell::{self, Cell, FLAG_HIDE, FLAG_IMMED};

/// Name-to-cell dictionary plus the most recently created name.
#[derive(Debug, Default, Clone)]
pub struct Dictionary {
    entries: BTreeMap<String, Cell>,
    latest: String,
}

impl Dictionary {
    /// Create an empty dictionary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value` and remember it as the latest creation.
    pub fn define(&mut self, name: &str, value: Cell) {
        self.entries.insert(name.into(), value);
        self.latest = name.into();
    }

    /// Look up a stored cell by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Cell> {
        self.entries.get(name).copied()
    }

    /// The most recently created name.
    #[must_use]
    pub fn latest(&self) -> &str {
        &self.latest
    }

    /// OR flags into an entry. Returns false when the name is unknown.
    pub fn or_flags(&mut self, name: &str, flags: Cell) -> bool {
        match self.entries.get_mut(name) {
            Some(v) => {
                *v |= flags;
                true
            }
            None => false,
        }
    }

    /// Toggle flags on an entry. Returns false when the name is unknown.
    pub fn toggle_flags(&mut self, name: &str, flags: Cell) -> bool {
        match self.entries.get_mut(name) {
            Some(v) => {
                *v ^= flags;
                true
            }
            None => false,
        }
    }

    /// Toggle the immediate flag on the latest creation.
    pub fn toggle_latest_immediate(&mut self) {
        let name = self.latest.clone();
        self.toggle_flags(&name, FLAG_IMMED);
    }

    /// Toggle the hidden flag on a named entry.
    pub fn toggle_hidden(&mut self, name: &str) -> bool {
        self.toggle_flags(name, FLAG_HIDE)
    }

    /// Reverse lookup: the name stored with `value`, ignoring immediate
    /// and hidden flags on both sides. Linear scan; used for listings and
    /// relocation only.
    #[must_use]
    pub fn reverse_find(&self, value: Cell) -> Option<&str> {
        let wanted = value & !(FLAG_IMMED | FLAG_HIDE);
        self.entries
            .iter()
            .find(|&(_, &v)| v & !(FLAG_IMMED | FLAG_HIDE) == wanted)
            .map(|(k, _)| k.as_str())
    }

    /// Address-to-name view of the non-primitive entries, flag bits
    /// stripped, sorted by address.
    #[must_use]
    pub fn invert(&self) -> BTreeMap<usize, String> {
        self.entries
            .iter()
            .filter(|&(_, &v)| !cell::is_machine(v))
            .map(|(k, &v)| (cell::addr(v), k.clone()))
            .collect()
    }

    /// Iterate `(name, stored cell)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Cell)> {
        self.entries.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Remove every entry and forget the latest name.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.latest.clear();
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is the dictionary empty?
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
