// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Playback
//! times are printed in seconds.

use std::io::Write;

use timegate_core::subtree::RenderDecision;
use timegate_core::trace::{
    CommandEvent, EvaluateEvent, FrameSummary, PhaseChangeEvent, SeekEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    evaluations: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("evaluations", &self.evaluations)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    ///
    /// Per-evaluation lines are off; see
    /// [`with_evaluations`](Self::with_evaluations).
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            evaluations: false,
        }
    }

    /// Also prints one line per subtree per frame.
    #[must_use]
    pub fn with_evaluations(mut self, on: bool) -> Self {
        self.evaluations = on;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_phase_change(&mut self, e: &PhaseChangeEvent) {
        let _ = writeln!(
            self.writer,
            "[phase] {} t={:.3}s {} -> {}",
            e.subtree,
            e.time,
            e.from.as_str(),
            e.to.as_str(),
        );
    }

    fn on_command(&mut self, e: &CommandEvent) {
        let _ = writeln!(
            self.writer,
            "[command] {} t={:.3}s {}",
            e.subtree,
            e.time,
            e.command.as_str(),
        );
    }

    fn on_seek(&mut self, e: &SeekEvent) {
        let _ = writeln!(
            self.writer,
            "[seek] {} {:.3}s -> {:.3}s",
            e.subtree, e.from, e.to,
        );
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] frame={} t={:.3}s evaluated={} rendered={} commands={} errors={}",
            s.frame_index, s.time, s.evaluated, s.rendered, s.commands, s.errors,
        );
    }

    fn on_evaluate(&mut self, e: &EvaluateEvent) {
        if !self.evaluations {
            return;
        }
        let _ = match e.decision {
            RenderDecision::Render { time } => writeln!(
                self.writer,
                "[eval] {} t={:.3}s mode={} phase={} render@{time:.3}s",
                e.subtree,
                e.time,
                e.mode.as_str(),
                e.phase.as_str(),
            ),
            RenderDecision::Skip => writeln!(
                self.writer,
                "[eval] {} t={:.3}s mode={} phase={} skip",
                e.subtree,
                e.time,
                e.mode.as_str(),
                e.phase.as_str(),
            ),
        };
    }
}
