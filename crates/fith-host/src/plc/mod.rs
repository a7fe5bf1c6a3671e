// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! PLC simulator syscalls.
//!
//! Selector-dispatched host services in the PLC convention: the deepest
//! argument of each syscall carries the selector. `SYSCALL1` answers
//! time queries, `SYSCALL2` reads GPIO inputs, `SYSCALL3` writes GPIO
//! outputs and registers the on-change and periodic-timer handlers.
//! Unknown selectors return -1.
//!
//! Handlers are word addresses; the simulator never re-enters the VM
//! itself. The host driver asks [`PlcSysCalls::take_due_timer`] and
//! [`PlcSysCalls::change_input`] what to run and drives the execution
//! context between input events.


use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use fith_vm::{Cell, SysCalls};

/// Seconds between the Unix epoch and 2000-01-01, the PLC epoch.
const EPOCH_2000: i64 = 946_684_800;

/// `SYSCALL1`: seconds since the Unix epoch.
pub const SC1_TIME_UNIX: Cell = 0x2000;
/// `SYSCALL1`: seconds since 2000-01-01.
pub const SC1_TIME_EPOCH: Cell = 0x2001;
/// `SYSCALL1`: milliseconds since boot.
pub const SC1_TIME_MSBOOT: Cell = 0x2002;

/// `SYSCALL2`: read an input port.
pub const SC2_GPIO_READ: Cell = 0x1000;

/// `SYSCALL3`: write an output port.
pub const SC3_GPIO_WRITE: Cell = 0x1001;
/// `SYSCALL3`: register the input-change handler.
pub const SC3_GPIO_HANDLER: Cell = 0x1010;
/// `SYSCALL3`: register the periodic-timer handler, period in ms.
pub const SC3_TIMER_PERIODIC: Cell = 0x2010;

const IN_PORTS: usize = 1;
const OUT_PORTS: usize = 1;

/// Simulated PLC I/O: one input port, one output port, two handlers.
pub struct PlcSysCalls {
    inputs: [Cell; IN_PORTS],
    outputs: [Cell; OUT_PORTS],
    gpio_handler: Cell,
    periodic_handler: Cell,
    period: Option<Duration>,
    last_fire: Instant,
    boot: Instant,
}

impl PlcSysCalls {
    /// A simulator with all ports low and no handlers.
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            inputs: [0; IN_PORTS],
            outputs: [0; OUT_PORTS],
            gpio_handler: 0,
            periodic_handler: 0,
            period: None,
            last_fire: now,
            boot: now,
        }
    }

    /// Current value of an input port.
    #[must_use]
    pub fn input(&self, port: usize) -> Cell {
        self.inputs.get(port).copied().unwrap_or(-1)
    }

    /// Current value of an output port.
    #[must_use]
    pub fn output(&self, port: usize) -> Cell {
        self.outputs.get(port).copied().unwrap_or(-1)
    }

    /// Change an input port from the outside world. Returns the word to
    /// run with the port number as its argument, if a handler is set.
    pub fn change_input(&mut self, port: usize, value: Cell) -> Option<(Cell, Cell)> {
        let slot = self.inputs.get_mut(port)?;
        *slot = value;
        if self.gpio_handler == 0 {
            return None;
        }
        Some((self.gpio_handler, port as Cell))
    }

    /// The periodic handler, when its period has elapsed since the last
    /// firing.
    pub fn take_due_timer(&mut self) -> Option<Cell> {
        let period = self.period?;
        if self.periodic_handler == 0 || self.last_fire.elapsed() < period {
            return None;
        }
        self.last_fire = Instant::now();
        Some(self.periodic_handler)
    }

    /// One line showing the input and output port bits.
    #[must_use]
    pub fn view(&self) -> String {
        format!(
            "IN {:032b} OUT {:032b}",
            self.inputs[0] as u32, self.outputs[0] as u32
        )
    }
}

impl Default for PlcSysCalls {
    fn default() -> Self {
        Self::new()
    }
}

impl SysCalls for PlcSysCalls {
    fn syscall1(&mut self, a: Cell) -> Cell {
        match a {
            SC1_TIME_UNIX => {
                let secs = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs() as i64)
                    .unwrap_or(0);
                secs as Cell
            }
            SC1_TIME_EPOCH => {
                let secs = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_secs() as i64)
                    .unwrap_or(0);
                (secs - EPOCH_2000) as Cell
            }
            SC1_TIME_MSBOOT => self.boot.elapsed().as_millis() as Cell,
            _ => -1,
        }
    }

    fn syscall2(&mut self, a: Cell, b: Cell) -> Cell {
        match b {
            SC2_GPIO_READ if a >= 0 => self.input(a as usize),
            _ => -1,
        }
    }

    fn syscall3(&mut self, a: Cell, b: Cell, c: Cell) -> Cell {
        match c {
            SC3_GPIO_WRITE => match self.outputs.get_mut(b.max(0) as usize) {
                Some(slot) if b >= 0 => {
                    *slot = a;
                    println!("{}", self.view());
                    0
                }
                _ => -1,
            },
            SC3_GPIO_HANDLER => {
                self.gpio_handler = b;
                0
            }
            SC3_TIMER_PERIODIC => {
                if a <= 0 {
                    self.period = None;
                    self.periodic_handler = 0;
                    return -1;
                }
                self.period = Some(Duration::from_millis(a as u64));
                self.periodic_handler = b;
                self.last_fire = Instant::now();
                0
            }
            _ => -1,
        }
    }
}
