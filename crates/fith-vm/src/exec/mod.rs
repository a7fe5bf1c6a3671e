// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Threaded-code execution engine.
//!
//! A context is an instruction pointer into code space plus two bounded
//! stacks borrowed from the host. `execute` runs the fetch-decode-dispatch
//! loop until the state leaves [`ExecState::Running`]: a machine-tagged
//! cell invokes the primitive named by its low bits through the
//! index-aligned dispatch table, any other cell calls the word at that
//! address by pushing the return address.
//!
//! Failures surface as the terminal state with no thrown control flow;
//! the stacks are left as they were at the failure point so a host may
//! inspect them.


mod prims;

#[cfg(feature = "full")]
mod outer;
#[cfg(all(test, feature = "full"))]
mod outer_test;

use crate::cell::{self, Cell};
use crate::interp::{Fault, Interpreter};
#[cfg(feature = "full")]
use crate::opcode::CORE_OPS;
use crate::syscall::SysCalls;

#[cfg(feature = "full")]
use crate::console::Console;
#[cfg(feature = "full")]
use crate::persist::ImageSink;

/// Terminal (or in-flight) state of an execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecState {
    /// Execution completed: the top-level word returned.
    Success,
    /// Data stack overflowed.
    DstkOver,
    /// Data stack underflowed.
    DstkUnder,
    /// Return stack overflowed.
    RstkOver,
    /// Return stack underflowed.
    RstkUnder,
    /// Access outside data space.
    SegvData,
    /// Execution or access outside code space.
    SegvCode,
    /// Opcode not recognised.
    BadOpcode,
    /// Attempted to divide by zero.
    DivZero,
    /// Halted by a primitive or host.
    Halted,
    /// Still going.
    Running,
}

impl core::fmt::Display for ExecState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Success => "Success",
            Self::DstkOver => "Data Stack Overflow",
            Self::DstkUnder => "Data Stack Underflow",
            Self::RstkOver => "Return Stack Overflow",
            Self::RstkUnder => "Return Stack Underflow",
            Self::SegvData => "Segfault Data",
            Self::SegvCode => "Segfault Code",
            Self::BadOpcode => "Bad Opcode",
            Self::DivZero => "Divide by Zero",
            Self::Halted => "Halted",
            Self::Running => "Running",
        };
        f.write_str(name)
    }
}

impl From<Fault> for ExecState {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::SegvCode => Self::SegvCode,
            Fault::SegvData => Self::SegvData,
        }
    }
}

/// One thread of execution: instruction pointer, bounded stacks, state.
pub struct Context<'s> {
    pub(crate) ip: usize,
    pub(crate) state: ExecState,
    pub(crate) dstk: &'s mut [Cell],
    pub(crate) rstk: &'s mut [Cell],
    pub(crate) dsp: usize,
    pub(crate) rsp: usize,
}

impl<'s> Context<'s> {
    /// Create a context entering code space at `entry`, with host-owned
    /// stack storage.
    pub fn new(entry: usize, dstk: &'s mut [Cell], rstk: &'s mut [Cell]) -> Self {
        Self {
            ip: entry,
            state: ExecState::Running,
            dstk,
            rstk,
            dsp: 0,
            rsp: 0,
        }
    }

    /// Choose a new entry point.
    pub fn set_ip(&mut self, entry: usize) {
        self.ip = entry;
    }

    /// Current instruction pointer.
    #[must_use]
    pub fn ip(&self) -> usize {
        self.ip
    }

    /// State after the most recent `execute`.
    #[must_use]
    pub fn state(&self) -> ExecState {
        self.state
    }

    /// The live portion of the data stack, bottom first.
    #[must_use]
    pub fn stack(&self) -> &[Cell] {
        &self.dstk[..self.dsp]
    }

    /// The live portion of the return stack, bottom first.
    #[must_use]
    pub fn rstack(&self) -> &[Cell] {
        &self.rstk[..self.rsp]
    }

    /// Seed the data stack; false when full.
    pub fn push(&mut self, value: Cell) -> bool {
        if self.dsp >= self.dstk.len() {
            return false;
        }
        self.dstk[self.dsp] = value;
        self.dsp += 1;
        true
    }

    /// Pop the data stack; `None` when empty.
    pub fn pop(&mut self) -> Option<Cell> {
        if self.dsp == 0 {
            return None;
        }
        self.dsp -= 1;
        Some(self.dstk[self.dsp])
    }

    /// Run until the called word returns or something breaks.
    #[cfg(not(feature = "full"))]
    pub fn execute(&mut self, interp: &mut Interpreter<'_>, sys: &mut dyn SysCalls) -> ExecState {
        self.state = ExecState::Running;
        let mut run = Run {
            ctx: self,
            interp,
            sys,
        };
        run.go();
        self.state
    }

    /// Run until the called word returns or something breaks.
    ///
    /// The console carries the program's byte streams; the sink receives
    /// images persisted by `SAVE` and `GC`.
    #[cfg(feature = "full")]
    pub fn execute(
        &mut self,
        interp: &mut Interpreter<'_>,
        sys: &mut dyn SysCalls,
        console: &mut dyn Console,
        sink: &mut dyn ImageSink,
    ) -> ExecState {
        self.state = ExecState::Running;
        let mut run = Run {
            ctx: self,
            interp,
            sys,
            console,
            sink,
        };
        run.go();
        self.state
    }
}

/// Everything a primitive procedure can touch, behind one reference.
pub(crate) struct Run<'r, 'm, 's> {
    pub(crate) ctx: &'r mut Context<'s>,
    pub(crate) interp: &'r mut Interpreter<'m>,
    pub(crate) sys: &'r mut dyn SysCalls,
    #[cfg(feature = "full")]
    pub(crate) console: &'r mut dyn Console,
    #[cfg(feature = "full")]
    pub(crate) sink: &'r mut dyn ImageSink,
}

/// A primitive procedure; the tables below are index-aligned with
/// [`crate::opcode::Op`].
pub(crate) type Builtin = fn(&mut Run<'_, '_, '_>);

/// Dispatch entry for an opcode index, if this build knows it.
pub(crate) fn builtin(index: usize) -> Option<Builtin> {
    if let Some(&f) = prims::CORE.get(index) {
        return Some(f);
    }
    #[cfg(feature = "full")]
    if let Some(&f) = outer::COMPILER.get(index - CORE_OPS) {
        return Some(f);
    }
    None
}

impl Run<'_, '_, '_> {
    fn go(&mut self) {
        while matches!(self.ctx.state, ExecState::Running) {
            let Ok(ins) = self.interp.read_code(self.ctx.ip) else {
                self.fail(ExecState::SegvCode);
                break;
            };
            self.ctx.ip += 1;

            if cell::is_machine(ins) {
                let index = cell::addr(ins);
                match builtin(index) {
                    Some(f) => f(self),
                    None => self.fail(ExecState::BadOpcode),
                }
            } else {
                // a word call: push the return address and jump
                if self.ctx.rsp >= self.ctx.rstk.len() {
                    self.fail(ExecState::RstkOver);
                    break;
                }
                self.ctx.rstk[self.ctx.rsp] = self.ctx.ip as Cell;
                self.ctx.rsp += 1;
                // the target is validated by the next fetch
                self.ctx.ip = cell::addr(ins);
            }
        }
    }

    pub(crate) fn fail(&mut self, state: ExecState) {
        self.ctx.state = state;
    }

    /// At least `n` cells on the data stack, else underflow.
    pub(crate) fn need_d(&mut self, n: usize) -> bool {
        if self.ctx.dsp < n {
            self.fail(ExecState::DstkUnder);
            return false;
        }
        true
    }

    /// Room for `n` more cells on the data stack, else overflow.
    pub(crate) fn room_d(&mut self, n: usize) -> bool {
        if self.ctx.dsp + n > self.ctx.dstk.len() {
            self.fail(ExecState::DstkOver);
            return false;
        }
        true
    }

    /// At least `n` cells on the return stack, else underflow.
    pub(crate) fn need_r(&mut self, n: usize) -> bool {
        if self.ctx.rsp < n {
            self.fail(ExecState::RstkUnder);
            return false;
        }
        true
    }

    /// Room for `n` more cells on the return stack, else overflow.
    pub(crate) fn room_r(&mut self, n: usize) -> bool {
        if self.ctx.rsp + n > self.ctx.rstk.len() {
            self.fail(ExecState::RstkOver);
            return false;
        }
        true
    }

    /// Pop the data stack. Callers check `need_d` first.
    pub(crate) fn pop_d(&mut self) -> Cell {
        self.ctx.dsp -= 1;
        self.ctx.dstk[self.ctx.dsp]
    }

    /// Push the data stack. Callers check `room_d` first.
    pub(crate) fn push_d(&mut self, value: Cell) {
        self.ctx.dstk[self.ctx.dsp] = value;
        self.ctx.dsp += 1;
    }

    /// The cell `k` below the top of the data stack.
    pub(crate) fn top_d(&self, k: usize) -> Cell {
        self.ctx.dstk[self.ctx.dsp - 1 - k]
    }

    /// Replace the cell `k` below the top of the data stack.
    pub(crate) fn set_top_d(&mut self, k: usize, value: Cell) {
        self.ctx.dstk[self.ctx.dsp - 1 - k] = value;
    }
}
