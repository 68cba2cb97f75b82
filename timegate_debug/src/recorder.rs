// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records, each prefixed by a one-byte
//! tag. [`decode`] reads them back as an iterator of [`RecordedEvent`].
//!
//! Per-evaluation events are high volume and are only recorded when enabled
//! with [`RecorderSink::with_evaluations`].

use timegate_core::id::SubtreeId;
use timegate_core::range::Mode;
use timegate_core::resource::{ResourceCommand, ResourcePhase};
use timegate_core::subtree::RenderDecision;
use timegate_core::trace::{
    CommandEvent, EvaluateEvent, FrameSummary, PhaseChangeEvent, SeekEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PHASE_CHANGE: u8 = 1;
const TAG_COMMAND: u8 = 2;
const TAG_SEEK: u8 = 3;
const TAG_FRAME_SUMMARY: u8 = 4;
const TAG_EVALUATE: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
    evaluations: bool,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also records one [`EvaluateEvent`] per subtree per frame.
    #[must_use]
    pub fn with_evaluations(mut self, on: bool) -> Self {
        self.evaluations = on;
        self
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_phase(&mut self, p: ResourcePhase) {
        self.write_u8(match p {
            ResourcePhase::Unloaded => 0,
            ResourcePhase::Prefetching => 1,
            ResourcePhase::Active => 2,
            ResourcePhase::Idle => 3,
        });
    }

    fn write_command(&mut self, c: ResourceCommand) {
        self.write_u8(match c {
            ResourceCommand::BeginLoad => 0,
            ResourceCommand::Release => 1,
        });
    }

    /// Mode tag followed by the frozen time (zero unless `Once`).
    fn write_mode(&mut self, m: Mode) {
        let (tag, time) = match m {
            Mode::Continuous => (0, 0.0),
            Mode::Suppressed => (1, 0.0),
            Mode::Once { render_time } => (2, render_time),
        };
        self.write_u8(tag);
        self.write_f64(time);
    }

    fn write_decision(&mut self, d: RenderDecision) {
        match d {
            RenderDecision::Render { time } => {
                self.write_u8(1);
                self.write_f64(time);
            }
            RenderDecision::Skip => {
                self.write_u8(0);
                self.write_f64(0.0);
            }
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_phase_change(&mut self, e: &PhaseChangeEvent) {
        self.write_u8(TAG_PHASE_CHANGE);
        self.write_u32(e.subtree.0);
        self.write_f64(e.time);
        self.write_phase(e.from);
        self.write_phase(e.to);
    }

    fn on_command(&mut self, e: &CommandEvent) {
        self.write_u8(TAG_COMMAND);
        self.write_u32(e.subtree.0);
        self.write_f64(e.time);
        self.write_command(e.command);
    }

    fn on_seek(&mut self, e: &SeekEvent) {
        self.write_u8(TAG_SEEK);
        self.write_u32(e.subtree.0);
        self.write_f64(e.from);
        self.write_f64(e.to);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        self.write_u8(TAG_FRAME_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_f64(s.time);
        self.write_u32(s.evaluated);
        self.write_u32(s.rendered);
        self.write_u32(s.commands);
        self.write_u32(s.errors);
    }

    fn on_evaluate(&mut self, e: &EvaluateEvent) {
        if !self.evaluations {
            return;
        }
        self.write_u8(TAG_EVALUATE);
        self.write_u32(e.subtree.0);
        self.write_f64(e.time);
        self.write_mode(e.mode);
        self.write_phase(e.phase);
        self.write_decision(e.decision);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`PhaseChangeEvent`].
    PhaseChange(PhaseChangeEvent),
    /// A [`CommandEvent`].
    Command(CommandEvent),
    /// A [`SeekEvent`].
    Seek(SeekEvent),
    /// A [`FrameSummary`].
    FrameSummary(FrameSummary),
    /// An [`EvaluateEvent`].
    Evaluate(EvaluateEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the end of the data, at a truncated record, or at an
/// unknown tag.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.take().map(f64::from_le_bytes)
    }

    fn read_subtree(&mut self) -> Option<SubtreeId> {
        self.read_u32().map(SubtreeId)
    }

    fn read_phase(&mut self) -> Option<ResourcePhase> {
        match self.read_u8()? {
            0 => Some(ResourcePhase::Unloaded),
            1 => Some(ResourcePhase::Prefetching),
            2 => Some(ResourcePhase::Active),
            3 => Some(ResourcePhase::Idle),
            _ => None,
        }
    }

    fn read_command(&mut self) -> Option<ResourceCommand> {
        match self.read_u8()? {
            0 => Some(ResourceCommand::BeginLoad),
            1 => Some(ResourceCommand::Release),
            _ => None,
        }
    }

    fn read_mode(&mut self) -> Option<Mode> {
        let tag = self.read_u8()?;
        let render_time = self.read_f64()?;
        match tag {
            0 => Some(Mode::Continuous),
            1 => Some(Mode::Suppressed),
            2 => Some(Mode::Once { render_time }),
            _ => None,
        }
    }

    fn read_decision(&mut self) -> Option<RenderDecision> {
        let render = self.read_u8()?;
        let time = self.read_f64()?;
        Some(if render != 0 {
            RenderDecision::Render { time }
        } else {
            RenderDecision::Skip
        })
    }

    fn decode_phase_change(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseChange(PhaseChangeEvent {
            subtree: self.read_subtree()?,
            time: self.read_f64()?,
            from: self.read_phase()?,
            to: self.read_phase()?,
        }))
    }

    fn decode_command(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Command(CommandEvent {
            subtree: self.read_subtree()?,
            time: self.read_f64()?,
            command: self.read_command()?,
        }))
    }

    fn decode_seek(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Seek(SeekEvent {
            subtree: self.read_subtree()?,
            from: self.read_f64()?,
            to: self.read_f64()?,
        }))
    }

    fn decode_frame_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameSummary(FrameSummary {
            frame_index: self.read_u64()?,
            time: self.read_f64()?,
            evaluated: self.read_u32()?,
            rendered: self.read_u32()?,
            commands: self.read_u32()?,
            errors: self.read_u32()?,
        }))
    }

    fn decode_evaluate(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Evaluate(EvaluateEvent {
            subtree: self.read_subtree()?,
            time: self.read_f64()?,
            mode: self.read_mode()?,
            phase: self.read_phase()?,
            decision: self.read_decision()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_PHASE_CHANGE => self.decode_phase_change(),
            TAG_COMMAND => self.decode_command(),
            TAG_SEEK => self.decode_seek(),
            TAG_FRAME_SUMMARY => self.decode_frame_summary(),
            TAG_EVALUATE => self.decode_evaluate(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
