// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Desktop Fith host.
//!
//! With no arguments: bootstrap a fresh interpreter, feed the bootstrap
//! source through `QUIT` when present, then interpret stdin until end of
//! stream. With `-r`: load a saved image and execute its entry word.
//!
//! Exit status is 0 for a `Success` termination, nonzero for a load
//! failure or any VM failure state.

use std::fs::File;
use std::io::{BufReader, stdin, stdout};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser;
use fith_host::image;
use fith_host::{FsImageSink, IoConsole};
use fith_vm::{BIN_VERSION, Cell, Context, ExecState, IO_VERSION, Interpreter, NullSysCalls, cell};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fith", version, about = "Interactive Fith session and image runner")]
struct Args {
    /// Run a saved image (.fith container or sidecar base name) instead
    /// of starting an interactive session
    #[arg(short = 'r', long = "run", value_name = "FILE")]
    run: Option<PathBuf>,

    /// Entry word for -r, resolved through the image's symbol map
    #[arg(value_name = "ENTRY", requires = "run")]
    entry: Option<String>,

    /// Code space size in cells
    #[arg(long, default_value_t = 65_536)]
    text_cells: usize,

    /// Data space size in cells
    #[arg(long, default_value_t = 16_384)]
    data_cells: usize,

    /// Data and return stack sizes in cells
    #[arg(long, default_value_t = 1024)]
    stack_cells: usize,

    /// Source fed through the interpreter before reading stdin
    #[arg(long, default_value = "bootstrap.5th")]
    bootstrap: PathBuf,

    /// Base path for the files SAVE and GC write
    #[arg(long, default_value = "fith")]
    save_base: PathBuf,
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
    let mut sink = FsImageSink::new(&args.save_base, BIN_VERSION, IO_VERSION);

    if let Some(path) = &args.run {
        let entry = image::load(path, args.entry.as_deref(), &mut text, &mut data)?;
        let mut interp = Interpreter::new(&mut text, &mut data);

        let mut dstk = vec![0 as Cell; args.stack_cells];
        let mut rstk = vec![0 as Cell; args.stack_cells];
        let mut ctx = Context::new(cell::addr(entry), &mut dstk, &mut rstk);
        let mut console = IoConsole::new(stdin().lock(), stdout().lock());
        let state = ctx.execute(&mut interp, &mut NullSysCalls, &mut console, &mut sink);
        return Ok(report(state));
    }

    let mut interp = Interpreter::bootstrapped(&mut text, &mut data);
    let quit = interp
        .find("QUIT")
        .map(cell::addr)
        .context("bootstrap produced no QUIT")?;

    if args.bootstrap.exists() {
        let file = File::open(&args.bootstrap)
            .with_context(|| format!("open {}", args.bootstrap.display()))?;

        let mut dstk = vec![0 as Cell; args.stack_cells];
        let mut rstk = vec![0 as Cell; args.stack_cells];
        let mut ctx = Context::new(quit, &mut dstk, &mut rstk);
        let mut console = IoConsole::new(BufReader::new(file), stdout().lock());
        let state = ctx.execute(&mut interp, &mut NullSysCalls, &mut console, &mut sink);
        if state == ExecState::Success || state == ExecState::Halted {
            info!(source = %args.bootstrap.display(), "bootstrap complete");
        } else {
            warn!(source = %args.bootstrap.display(), %state, "bootstrap failed");
        }
    } else {
        info!(source = %args.bootstrap.display(), "no bootstrap source, starting bare");
    }

    let mut dstk = vec![0 as Cell; args.stack_cells];
    let mut rstk = vec![0 as Cell; args.stack_cells];
    let mut ctx = Context::new(quit, &mut dstk, &mut rstk);
    let mut console = IoConsole::new(stdin().lock(), stdout().lock());
    let state = ctx.execute(&mut interp, &mut NullSysCalls, &mut console, &mut sink);
    Ok(report(state))
}

fn report(state: ExecState) -> ExitCode {
    match state {
        ExecState::Success | ExecState::Halted => ExitCode::SUCCESS,
        failure => {
            error!(state = %failure, "execution failed");
            ExitCode::FAILURE
        }
    }
}
