// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! PLC simulator host.
//!
//! Loads a distilled image, runs its entry word once with the PLC
//! syscalls installed, then simulates the controller's event loop:
//! digit keys toggle input GPIO bits (firing the program's on-change
//! handler), the registered periodic timer fires between events, and
//! `q` quits.

use std::io::{BufReader, Read, stdin, stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use fith_host::image;
use fith_host::{IoConsole, PlcSysCalls};
use fith_vm::persist::NullSink;
use fith_vm::{Cell, Context, ExecState, Interpreter, cell};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fith-plc", version, about = "PLC simulator running a distilled Fith image")]
struct Args {
    /// Image to run (.fith container or sidecar base name)
    #[arg(short = 'r', long = "run", value_name = "FILE")]
    image: PathBuf,

    /// Entry word, resolved through the image's symbol map
    #[arg(value_name = "ENTRY")]
    entry: Option<String>,

    /// Code space size in cells
    #[arg(long, default_value_t = 65_536)]
    text_cells: usize,

    /// Data space size in cells
    #[arg(long, default_value_t = 4096)]
    data_cells: usize,

    /// Data and return stack sizes in cells
    #[arg(long, default_value_t = 128)]
    stack_cells: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<ExitCode> {
    let mut text = vec![0 as Cell; args.text_cells];
    let mut data = vec![0 as Cell; args.data_cells];
    let entry = image::load(&args.image, args.entry.as_deref(), &mut text, &mut data)?;

    let mut interp = Interpreter::new(&mut text, &mut data);
    let mut plc = PlcSysCalls::new();

    // run the boot word once; it typically registers handlers
    let state = call(&mut interp, &mut plc, cell::addr(entry) as Cell, None, args);
    if state != ExecState::Success {
        error!(%state, "entry word failed");
        return Ok(ExitCode::FAILURE);
    }
    info!("program started; digits toggle input bits, q quits");
    println!("{}", plc.view());

    // keystrokes arrive on a channel so the timer can fire while idle
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for byte in stdin().lock().bytes() {
            let Ok(byte) = byte else { break };
            if tx.send(byte).is_err() {
                break;
            }
        }
    });

    loop {
        match rx.recv_timeout(Duration::from_millis(20)) {
            Ok(b'q') | Ok(b'Q') | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Ok(byte) if byte.is_ascii_digit() => {
                let bit = Cell::from(byte - b'0');
                let toggled = plc.input(0) ^ (1 << bit);
                if let Some((handler, port)) = plc.change_input(0, toggled) {
                    let state = call(&mut interp, &mut plc, handler, Some(port), args);
                    if state != ExecState::Success {
                        warn!(%state, "input-change handler failed");
                    }
                }
                println!("{}", plc.view());
            }
            Ok(_) | Err(mpsc::RecvTimeoutError::Timeout) => {}
        }

        if let Some(handler) = plc.take_due_timer() {
            let state = call(&mut interp, &mut plc, handler, Some(0), args);
            if state != ExecState::Success {
                warn!(%state, "periodic handler failed");
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Run one word to completion on fresh stacks.
fn call(
    interp: &mut Interpreter<'_>,
    plc: &mut PlcSysCalls,
    word: Cell,
    arg: Option<Cell>,
    args: &Args,
) -> ExecState {
    let mut dstk = vec![0 as Cell; args.stack_cells];
    let mut rstk = vec![0 as Cell; args.stack_cells];
    let mut ctx = Context::new(cell::addr(word), &mut dstk, &mut rstk);
    if let Some(arg) = arg {
        let _ = ctx.push(arg);
    }
    let mut console = IoConsole::new(BufReader::new(std::io::empty()), stdout().lock());
    ctx.execute(interp, plc, &mut console, &mut NullSink)
}
