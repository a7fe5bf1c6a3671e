// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright 2026 Fith Project Developers

//! Tests for the compiler primitives and the outer interpreter.

#![allow(clippy::unwrap_used)]

use std::io;

use super::{Context, ExecState};
use crate::cell::Cell;
use crate::console::MockConsole;
use crate::interp::Interpreter;
use crate::persist::{ImageSink, ImageSnapshot, NullSink};
use crate::syscall::NullSysCalls;

/// Feed `input` through `QUIT` on a freshly bootstrapped interpreter.
fn session(input: &str) -> (ExecState, Vec<Cell>, String) {
    let mut text = vec![0; 1024];
    let mut data = vec![0; 256];
    let mut interp = Interpreter::bootstrapped(&mut text, &mut data);
    let quit = interp.find("QUIT").unwrap() as usize;

    let mut dstk = [0; 64];
    let mut rstk = [0; 64];
    let mut ctx = Context::new(quit, &mut dstk, &mut rstk);
    let mut con = MockConsole::with_input(input);
    let state = ctx.execute(&mut interp, &mut NullSysCalls, &mut con, &mut NullSink);
    (state, ctx.stack().to_vec(), con.output_str())
}

#[test]
fn colon_definition_scenario() {
    let (state, stack, output) = session(": SQ DUP * ; 7 SQ");
    assert_eq!(state, ExecState::Success);
    assert_eq!(stack, [49]);
    assert_eq!(output, "", "a clean session prints nothing");
}

#[test]
fn definitions_compose() {
    let (state, stack, _) = session(": SQ DUP * ; : QUAD SQ SQ ; 2 QUAD");
    assert_eq!(state, ExecState::Success);
    assert_eq!(stack, [16]);
}

#[test]
fn numbers_with_radix_prefixes() {
    let (state, stack, _) = session("0x10 010 -5 +7");
    assert_eq!(state, ExecState::Success);
    assert_eq!(stack, [16, 8, -5, 7]);
}

#[test]
fn literals_compile_inside_definitions() {
    let (state, stack, _) = session(": ANSWER 0x2A ; ANSWER ANSWER");
    assert_eq!(state, ExecState::Success);
    assert_eq!(stack, [42, 42]);
}

#[test]
fn unrecognised_word_is_reported_and_interpreting_continues() {
    let (state, stack, output) = session("BOGUS 5");
    assert_eq!(state, ExecState::Success);
    assert_eq!(stack, [5]);
    assert_eq!(output, "Unrecognised word BOGUS\n");
}

#[test]
fn bad_radix_tail_is_unrecognised() {
    let (state, stack, output) = session("0x 08");
    assert_eq!(state, ExecState::Success);
    assert!(stack.is_empty());
    assert_eq!(
        output,
        "Unrecognised word 0x\nUnrecognised word 08\n",
        "a partial conversion is no conversion"
    );
}

#[test]
fn long_tokens_truncate_to_buffer_capacity() {
    let long = "A".repeat(40);
    let (state, _, output) = session(&long);
    assert_eq!(state, ExecState::Success);
    assert_eq!(output, format!("Unrecognised word {}\n", "A".repeat(31)));
}

#[test]
fn hidden_words_are_invisible() {
    let (state, stack, output) = session(": SQ DUP * ; LATEST HIDDEN 3 SQ");
    assert_eq!(state, ExecState::Success);
    assert_eq!(stack, [3]);
    assert_eq!(output, "Unrecognised word SQ\n");
}

#[test]
fn immediate_words_run_while_compiling() {
    let (state, stack, _) = session(": A 7 ; IMMEDIATE : B A ; B");
    assert_eq!(state, ExecState::Success);
    assert_eq!(stack, [7], "A ran during B's compilation, B compiled empty");
}

#[test]
fn state_reflects_compile_mode() {
    let (state, stack, _) = session("STATE");
    assert_eq!(state, ExecState::Success);
    assert_eq!(stack, [0]);
}

#[test]
fn key_returns_minus_one_at_eof() {
    let (state, stack, _) = session("KEY");
    assert_eq!(state, ExecState::Success);
    assert_eq!(stack, [-1]);
}

#[test]
fn emit_and_dot_write_the_output_stream() {
    let (state, stack, output) = session("65 EMIT 66 EMIT -7 .");
    assert_eq!(state, ExecState::Success);
    assert!(stack.is_empty());
    assert_eq!(output, "AB-7 ");
}

#[test]
fn code_space_words() {
    // HERE @C reads the code watermark; !C patches a cell
    let (state, stack, _) = session("HERE @C 7 100 !C 100 @C");
    assert_eq!(state, ExecState::Success);
    assert_eq!(stack, [21, 7]);
}

#[test]
fn comma_appends_at_watermark() {
    let (state, stack, _) = session("HERE @C 42 , HERE @C");
    assert_eq!(state, ExecState::Success);
    assert_eq!(stack, [21, 22], "the watermark advanced by one");
}

#[test]
fn dump_lists_definitions_symbolically() {
    let (state, _, output) = session(": SQ DUP * ; DUMP");
    assert_eq!(state, ExecState::Success);
    assert!(output.contains("SQ:"), "label for the new word: {output}");
    assert!(output.contains("DUP"), "opcode rendered by name");
    assert!(output.contains("QUIT:"), "bootstrap words are listed too");
}

/// Records the snapshot SAVE hands to the sink.
#[derive(Default)]
struct RecordingSink {
    text: Vec<Cell>,
    data: Vec<Cell>,
    map: Vec<(Cell, String)>,
    entry: Option<Cell>,
    saves: usize,
}

impl ImageSink for RecordingSink {
    fn save(&mut self, image: &ImageSnapshot<'_>) -> io::Result<()> {
        self.text = image.text.to_vec();
        self.data = image.data.to_vec();
        self.map = image.map.to_vec();
        self.entry = image.entry;
        self.saves += 1;
        Ok(())
    }
}

struct FailingSink;

impl ImageSink for FailingSink {
    fn save(&mut self, _image: &ImageSnapshot<'_>) -> io::Result<()> {
        Err(io::Error::other("disk full"))
    }
}

fn session_with_sink(input: &str, sink: &mut dyn ImageSink) -> (ExecState, String) {
    let mut text = vec![0; 1024];
    let mut data = vec![0; 256];
    let mut interp = Interpreter::bootstrapped(&mut text, &mut data);
    let quit = interp.find("QUIT").unwrap() as usize;

    let mut dstk = [0; 64];
    let mut rstk = [0; 64];
    let mut ctx = Context::new(quit, &mut dstk, &mut rstk);
    let mut con = MockConsole::with_input(input);
    let state = ctx.execute(&mut interp, &mut NullSysCalls, &mut con, sink);
    (state, con.output_str())
}

#[test]
fn save_snapshots_live_image_and_visible_words() {
    let mut sink = RecordingSink::default();
    let (state, output) = session_with_sink(": SQ DUP * ; SAVE", &mut sink);
    assert_eq!(state, ExecState::Success);
    assert_eq!(output, "SAVE success\n");
    assert_eq!(sink.saves, 1);

    // text carries its watermark and exactly the live cells
    assert_eq!(sink.text[0] as usize, sink.text.len());
    assert_eq!(sink.data[0] as usize, sink.data.len());
    assert_eq!(sink.entry, None);

    // the map shows SQ but neither primitives nor hidden words
    let names: Vec<&str> = sink.map.iter().map(|(_, n)| n.as_str()).collect();
    assert!(names.contains(&"SQ"));
    assert!(names.contains(&"QUIT"));
    assert!(!names.contains(&"DUP"));
}

#[test]
fn save_failure_is_reported_not_fatal() {
    let (state, output) = session_with_sink("SAVE 5", &mut FailingSink);
    assert_eq!(state, ExecState::Success);
    assert!(output.starts_with("SAVE failed: disk full"), "got: {output}");
}

#[test]
fn hidden_definitions_stay_out_of_save_map() {
    let mut sink = RecordingSink::default();
    let (state, _) = session_with_sink(": SQ DUP * ; LATEST HIDDEN SAVE", &mut sink);
    assert_eq!(state, ExecState::Success);
    let names: Vec<&str> = sink.map.iter().map(|(_, n)| n.as_str()).collect();
    assert!(!names.contains(&"SQ"));
}
