// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Logging, recording, pretty-printing, and Chrome trace export for timegate
//! diagnostics.
//!
//! This crate provides [`TraceSink`](timegate_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`log::LogSink`] — forwards events to the [`log`](::log) facade.
//! - [`pretty::PrettyPrintSink`] — human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`] — compact binary recording with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`] — writes Chrome Trace Event Format JSON from
//!   recorded bytes.
//! - [`Tee`] — fans every event out to two sinks.

pub mod chrome;
pub mod log;
pub mod pretty;
pub mod recorder;

use timegate_core::trace::{
    CommandEvent, EvaluateEvent, FrameSummary, PhaseChangeEvent, SeekEvent, TraceSink,
};

/// Forwards every event to both inner sinks, `first` before `second`.
#[derive(Debug, Default)]
pub struct Tee<A, B> {
    /// Receives each event first.
    pub first: A,
    /// Receives each event second.
    pub second: B,
}

impl<A: TraceSink, B: TraceSink> Tee<A, B> {
    /// Combines two sinks.
    #[must_use]
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_phase_change(&mut self, e: &PhaseChangeEvent) {
        self.first.on_phase_change(e);
        self.second.on_phase_change(e);
    }

    fn on_command(&mut self, e: &CommandEvent) {
        self.first.on_command(e);
        self.second.on_command(e);
    }

    fn on_seek(&mut self, e: &SeekEvent) {
        self.first.on_seek(e);
        self.second.on_seek(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.first.on_frame_summary(s);
        self.second.on_frame_summary(s);
    }

    fn on_evaluate(&mut self, e: &EvaluateEvent) {
        self.first.on_evaluate(e);
        self.second.on_evaluate(e);
    }
}
