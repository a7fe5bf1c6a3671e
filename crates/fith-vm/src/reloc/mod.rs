// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Tracing relocator.
//!
//! Compacts code space around a chosen root word: every word reachable
//! from the root is copied to a fresh contiguous image starting at cell
//! 1, every interior reference is rewritten to its new address, and the
//! dictionary is rebuilt with only primitives and the surviving words.
//!
//! Word boundaries come from the dictionary: each non-primitive entry is
//! assumed to start a word that extends to the next entry's address (the
//! last one extends to the watermark). Cells following `LIT`, `JMP` and
//! `JZ` are operands, not references; the cell following `'` is a code
//! address and is traced and rewritten like any other reference.
//!
//! The live image is only overwritten after the rewrite has fully
//! succeeded, so a failed collection leaves the interpreter usable.


use std::collections::{BTreeMap, BTreeSet};

use crate::cell::{self, Cell};
use crate::interp::{HERE_AT, Interpreter};
use crate::opcode::Op;

/// Why a collection was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocError {
    /// The code watermark lies outside the code space.
    BadWatermark,
    /// A dictionary entry implies an empty or negative word extent.
    BadExtent,
    /// A reference in a live word points at no known word start.
    Unresolved(usize),
    /// A live word extends outside the code space.
    OutOfBounds,
}

impl core::fmt::Display for RelocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BadWatermark => write!(f, "code watermark out of range"),
            Self::BadExtent => write!(f, "dictionary implies an empty word"),
            Self::Unresolved(addr) => write!(f, "unable to relocate reference to {addr}"),
            Self::OutOfBounds => write!(f, "live word extends outside code space"),
        }
    }
}

/// Is this cell an opcode that consumes the following cell as a raw
/// operand (literal or branch offset)?
fn takes_raw_operand(c: Cell) -> bool {
    c == Op::Lit.cell() || c == Op::Jz.cell() || c == Op::Jmp.cell()
}

/// Collect from `root`, rewrite the code space, rebuild the dictionary.
///
/// On success, returns the root's relocated address when the root was a
/// known word. The dictionary afterwards holds the primitives plus each
/// surviving word at its new address.
pub fn relocate(interp: &mut Interpreter<'_>, root: Cell) -> Result<Option<Cell>, RelocError> {
    let here = interp.here_code();
    if here < 1 || here as usize > interp.code_len() {
        return Err(RelocError::BadWatermark);
    }
    let here = here as usize;

    // address-to-name view of the compiled words, sorted by address
    let names = interp.dict().invert();

    // each word runs to the next known start; the last runs to HERE
    let mut extents: BTreeMap<usize, usize> = BTreeMap::new();
    let mut starts = names.keys().copied().peekable();
    while let Some(start) = starts.next() {
        let end = starts.peek().copied().unwrap_or(here);
        if end <= start {
            return Err(RelocError::BadExtent);
        }
        extents.insert(start, end - start);
    }

    // mark everything reachable from the root
    let mut live: BTreeSet<usize> = BTreeSet::new();
    let mut todo: BTreeSet<usize> = BTreeSet::new();
    todo.insert(cell::addr(root));

    while let Some(ptr) = todo.pop_first() {
        // addresses without a known extent are skipped, not errors
        let Some(&len) = extents.get(&ptr) else {
            continue;
        };
        live.insert(ptr);

        let mut k = 0;
        while k < len {
            let c = interp
                .read_code(ptr + k)
                .map_err(|_| RelocError::OutOfBounds)?;
            if takes_raw_operand(c) {
                // skip the literal or offset
                k += 2;
                continue;
            }
            if cell::is_machine(c) {
                // builtins carry no reference; note that this leaves the
                // cell after a tick to be traced as a normal reference
                k += 1;
                continue;
            }
            let target = cell::addr(c);
            if !live.contains(&target) {
                todo.insert(target);
            }
            k += 1;
        }
    }

    // plan: contiguous layout from cell 1, ascending old address
    let mut remap: BTreeMap<usize, usize> = BTreeMap::new();
    let mut new_here = 1;
    for &ptr in &live {
        remap.insert(ptr, new_here);
        new_here += extents[&ptr];
    }

    // rewrite into a fresh image
    let mut image = std::vec![0 as Cell; new_here];
    image[HERE_AT] = new_here as Cell;
    for (&from, &to) in &remap {
        let len = extents[&from];
        let mut k = 0;
        while k < len {
            let c = interp
                .read_code(from + k)
                .map_err(|_| RelocError::OutOfBounds)?;
            if cell::is_machine(c) {
                image[to + k] = c;
                if takes_raw_operand(c) && k + 1 < len {
                    k += 1;
                    image[to + k] = interp
                        .read_code(from + k)
                        .map_err(|_| RelocError::OutOfBounds)?;
                }
            } else {
                let target = cell::addr(c);
                let Some(&new_target) = remap.get(&target) else {
                    return Err(RelocError::Unresolved(target));
                };
                image[to + k] = new_target as Cell;
            }
            k += 1;
        }
    }

    // install: the live image is touched only now that nothing can fail
    for (i, &c) in image.iter().enumerate() {
        let _ = interp.write_code(i, c);
    }

    // rebuild the dictionary: primitives plus the survivors
    interp.dict_mut().clear();
    interp.bootstrap(false);
    for (&from, &to) in &remap {
        if let Some(name) = names.get(&from) {
            interp.create(name, to as Cell);
        }
    }

    Ok(remap.get(&cell::addr(root)).map(|&a| a as Cell))
}
