// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! The core primitive word set, available in every build.
//!
//! Each primitive checks its stack arity and bounds before touching
//! anything, so a failure leaves both stacks and both spaces exactly as
//! they were. Arithmetic wraps per two's complement; shift counts are
//! masked to the cell width.

use super::{Builtin, ExecState, Run, builtin};
use crate::cell::{self, Cell};
use crate::opcode::CORE_OPS;

/// Dispatch table for the core opcodes, index-aligned with
/// [`crate::opcode::Op`].
pub(super) const CORE: [Builtin; CORE_OPS] = [
    mw_exit,
    mw_lit,
    mw_tick,
    mw_add,
    mw_sub,
    mw_neg,
    mw_mul,
    mw_div,
    mw_mod,
    mw_muldiv,
    mw_divmod,
    mw_mulmod,
    mw_jmp,
    mw_jz,
    mw_execute,
    mw_lt,
    mw_gt,
    mw_le,
    mw_ge,
    mw_eq,
    mw_max,
    mw_min,
    mw_dup,
    mw_dupnz,
    mw_drop,
    mw_swap,
    mw_rot,
    mw_nrot,
    mw_pick,
    mw_roll,
    mw_and,
    mw_or,
    mw_xor,
    mw_invert,
    mw_shl,
    mw_sra,
    mw_srl,
    mw_store,
    mw_fetch,
    mw_tors,
    mw_fromrs,
    mw_rfetch,
    mw_rdrop,
    mw_here,
    mw_syscall1,
    mw_syscall2,
    mw_syscall3,
];

/// Pop two, push one.
fn binop(r: &mut Run<'_, '_, '_>, f: fn(Cell, Cell) -> Cell) {
    if !r.need_d(2) {
        return;
    }
    let b = r.pop_d();
    let a = r.top_d(0);
    r.set_top_d(0, f(a, b));
}

/// Branch target relative to the opcode cell: the IP has already advanced
/// past the opcode, hence the decrement. A negative result wraps to a huge
/// index and is caught by the next fetch.
fn jump_target(ip: usize, offset: Cell) -> usize {
    (ip as i64 + i64::from(offset) - 1) as usize
}

fn mw_exit(r: &mut Run<'_, '_, '_>) {
    if r.ctx.rsp == 0 {
        // returned from the top-level word
        r.fail(ExecState::Success);
    } else {
        r.ctx.rsp -= 1;
        r.ctx.ip = r.ctx.rstk[r.ctx.rsp] as usize;
    }
}

fn mw_lit(r: &mut Run<'_, '_, '_>) {
    if !r.room_d(1) {
        return;
    }
    match r.interp.read_code(r.ctx.ip) {
        Ok(value) => {
            r.ctx.ip += 1;
            r.push_d(value);
        }
        // the operand trails off the end of the binary
        Err(fault) => r.fail(fault.into()),
    }
}

fn mw_tick(r: &mut Run<'_, '_, '_>) {
    // same fetch as LIT; the operand is a code address to the relocator
    mw_lit(r);
}

fn mw_add(r: &mut Run<'_, '_, '_>) {
    binop(r, Cell::wrapping_add);
}

fn mw_sub(r: &mut Run<'_, '_, '_>) {
    binop(r, Cell::wrapping_sub);
}

fn mw_neg(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) {
        return;
    }
    let v = r.top_d(0);
    r.set_top_d(0, v.wrapping_neg());
}

fn mw_mul(r: &mut Run<'_, '_, '_>) {
    binop(r, Cell::wrapping_mul);
}

fn mw_div(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(2) {
        return;
    }
    if r.top_d(0) == 0 {
        r.fail(ExecState::DivZero);
        return;
    }
    let b = r.pop_d();
    let a = r.top_d(0);
    r.set_top_d(0, a.wrapping_div(b));
}

fn mw_mod(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(2) {
        return;
    }
    if r.top_d(0) == 0 {
        r.fail(ExecState::DivZero);
        return;
    }
    let b = r.pop_d();
    let a = r.top_d(0);
    r.set_top_d(0, a.wrapping_rem(b));
}

fn mw_muldiv(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(3) {
        return;
    }
    let c = r.top_d(0);
    if c == 0 {
        r.fail(ExecState::DivZero);
        return;
    }
    // keep all the bits of the product, discard the quotient's upper half
    let prod = i64::from(r.top_d(2)) * i64::from(r.top_d(1));
    let quot = prod / i64::from(c);
    r.ctx.dsp -= 2;
    r.set_top_d(0, quot as Cell);
}

fn mw_divmod(r: &mut Run<'_, '_, '_>) {
    // reserved
    r.fail(ExecState::BadOpcode);
}

fn mw_mulmod(r: &mut Run<'_, '_, '_>) {
    // reserved
    r.fail(ExecState::BadOpcode);
}

fn mw_jmp(r: &mut Run<'_, '_, '_>) {
    match r.interp.read_code(r.ctx.ip) {
        Ok(offset) => r.ctx.ip = jump_target(r.ctx.ip, offset),
        Err(fault) => r.fail(fault.into()),
    }
}

fn mw_jz(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) {
        return;
    }
    let offset = match r.interp.read_code(r.ctx.ip) {
        Ok(offset) => offset,
        Err(fault) => {
            r.fail(fault.into());
            return;
        }
    };
    if r.pop_d() == 0 {
        r.ctx.ip = jump_target(r.ctx.ip, offset);
    } else {
        // skip over the offset cell
        r.ctx.ip += 1;
    }
}

pub(super) fn mw_execute(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) {
        return;
    }
    let target = r.top_d(0);
    if cell::is_machine(target) {
        // a builtin word: run it inline
        r.pop_d();
        match builtin(cell::addr(target)) {
            Some(f) => f(r),
            None => r.fail(ExecState::BadOpcode),
        }
    } else {
        if !r.room_r(1) {
            return;
        }
        r.pop_d();
        // IP already points past the EXECUTE, so that is the return address
        r.ctx.rstk[r.ctx.rsp] = r.ctx.ip as Cell;
        r.ctx.rsp += 1;
        // flag bits stripped; the target is validated by the next fetch
        r.ctx.ip = cell::addr(target);
    }
}

fn mw_lt(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| Cell::from(a < b));
}

fn mw_gt(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| Cell::from(a > b));
}

fn mw_le(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| Cell::from(a <= b));
}

fn mw_ge(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| Cell::from(a >= b));
}

fn mw_eq(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| Cell::from(a == b));
}

fn mw_max(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| a.max(b));
}

fn mw_min(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| a.min(b));
}

fn mw_dup(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) || !r.room_d(1) {
        return;
    }
    let v = r.top_d(0);
    r.push_d(v);
}

fn mw_dupnz(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) || !r.room_d(1) {
        return;
    }
    let v = r.top_d(0);
    if v != 0 {
        r.push_d(v);
    }
}

fn mw_drop(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) {
        return;
    }
    r.ctx.dsp -= 1;
}

fn mw_swap(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(2) {
        return;
    }
    let a = r.top_d(0);
    let b = r.top_d(1);
    r.set_top_d(0, b);
    r.set_top_d(1, a);
}

fn mw_rot(r: &mut Run<'_, '_, '_>) {
    // (x y z -- y z x)
    if !r.need_d(3) {
        return;
    }
    let x = r.top_d(2);
    r.set_top_d(2, r.top_d(1));
    r.set_top_d(1, r.top_d(0));
    r.set_top_d(0, x);
}

fn mw_nrot(r: &mut Run<'_, '_, '_>) {
    // (x y z -- z x y)
    if !r.need_d(3) {
        return;
    }
    let z = r.top_d(0);
    r.set_top_d(0, r.top_d(1));
    r.set_top_d(1, r.top_d(2));
    r.set_top_d(2, z);
}

fn mw_pick(r: &mut Run<'_, '_, '_>) {
    // (a0 .. an n -- a0 .. an a0)
    if !r.need_d(2) {
        return;
    }
    let n = r.top_d(0);
    if n < 0 || r.ctx.dsp < n as usize + 2 {
        r.fail(ExecState::DstkUnder);
        return;
    }
    let v = r.top_d(n as usize + 1);
    r.set_top_d(0, v);
}

fn mw_roll(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(2) {
        return;
    }
    let n = r.top_d(0);
    let m = n.unsigned_abs() as usize;
    if r.ctx.dsp < m + 2 {
        r.fail(ExecState::DstkUnder);
        return;
    }
    r.pop_d();
    let top = r.ctx.dsp - 1;
    if n > 0 {
        // roll m cells upwards: the cell m below the top comes out on top
        let tmp = r.ctx.dstk[top - m];
        for i in top - m..top {
            r.ctx.dstk[i] = r.ctx.dstk[i + 1];
        }
        r.ctx.dstk[top] = tmp;
    } else if n < 0 {
        // roll downwards: the top cell goes m below, the range shifts up
        let tmp = r.ctx.dstk[top];
        for i in (top - m..top).rev() {
            r.ctx.dstk[i + 1] = r.ctx.dstk[i];
        }
        r.ctx.dstk[top - m] = tmp;
    }
}

fn mw_and(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| a & b);
}

fn mw_or(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| a | b);
}

fn mw_xor(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| a ^ b);
}

fn mw_invert(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) {
        return;
    }
    let v = r.top_d(0);
    r.set_top_d(0, !v);
}

fn mw_shl(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| a.wrapping_shl(b as u32));
}

fn mw_sra(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| a.wrapping_shr(b as u32));
}

fn mw_srl(r: &mut Run<'_, '_, '_>) {
    binop(r, |a, b| ((a as u32).wrapping_shr(b as u32)) as Cell);
}

fn mw_store(r: &mut Run<'_, '_, '_>) {
    // (val addr --)
    if !r.need_d(2) {
        return;
    }
    let at = r.top_d(0);
    let val = r.top_d(1);
    if at < 0 {
        r.fail(ExecState::SegvData);
        return;
    }
    match r.interp.write_data(at as usize, val) {
        Ok(()) => r.ctx.dsp -= 2,
        Err(fault) => r.fail(fault.into()),
    }
}

fn mw_fetch(r: &mut Run<'_, '_, '_>) {
    // (addr -- val)
    if !r.need_d(1) {
        return;
    }
    let at = r.top_d(0);
    if at < 0 {
        r.fail(ExecState::SegvData);
        return;
    }
    match r.interp.read_data(at as usize) {
        Ok(value) => r.set_top_d(0, value),
        Err(fault) => r.fail(fault.into()),
    }
}

fn mw_tors(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) || !r.room_r(1) {
        return;
    }
    let v = r.pop_d();
    r.ctx.rstk[r.ctx.rsp] = v;
    r.ctx.rsp += 1;
}

fn mw_fromrs(r: &mut Run<'_, '_, '_>) {
    if !r.need_r(1) || !r.room_d(1) {
        return;
    }
    r.ctx.rsp -= 1;
    let v = r.ctx.rstk[r.ctx.rsp];
    r.push_d(v);
}

fn mw_rfetch(r: &mut Run<'_, '_, '_>) {
    if !r.need_r(1) || !r.room_d(1) {
        return;
    }
    let v = r.ctx.rstk[r.ctx.rsp - 1];
    r.push_d(v);
}

fn mw_rdrop(r: &mut Run<'_, '_, '_>) {
    if !r.need_r(1) {
        return;
    }
    r.ctx.rsp -= 1;
}

fn mw_here(r: &mut Run<'_, '_, '_>) {
    if !r.room_d(1) {
        return;
    }
    // the watermark lives at cell 0 of either space
    r.push_d(0);
}

fn mw_syscall1(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(1) {
        return;
    }
    let a = r.top_d(0);
    let ret = r.sys.syscall1(a);
    r.set_top_d(0, ret);
}

fn mw_syscall2(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(2) {
        return;
    }
    let a = r.top_d(1);
    let b = r.top_d(0);
    let ret = r.sys.syscall2(a, b);
    r.ctx.dsp -= 1;
    r.set_top_d(0, ret);
}

fn mw_syscall3(r: &mut Run<'_, '_, '_>) {
    if !r.need_d(3) {
        return;
    }
    let a = r.top_d(2);
    let b = r.top_d(1);
    let c = r.top_d(0);
    let ret = r.sys.syscall3(a, b, c);
    r.ctx.dsp -= 2;
    r.set_top_d(0, ret);
}
