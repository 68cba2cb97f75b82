// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for activation scheduling.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! scheduler and [`ActivationGroup`](crate::gate::ActivationGroup) call as
//! they evaluate. All method bodies default to no-ops, so implementing only
//! the events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`FrameSummaryBuilder`] tallies per-subtree outcomes during a frame and
//! produces a [`FrameSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) — gates the per-evaluation
//!   [`EvaluateEvent`], emitted for every subtree on every frame.

use crate::id::SubtreeId;
#[cfg(feature = "trace-rich")]
use crate::range::Mode;
use crate::resource::{ResourceCommand, ResourcePhase};
use crate::subtree::RenderDecision;

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a scheduler moves its resource to a new phase.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseChangeEvent {
    /// Which subtree.
    pub subtree: SubtreeId,
    /// Playback time of the evaluation.
    pub time: f64,
    /// Phase before the transition.
    pub from: ResourcePhase,
    /// Phase after the transition.
    pub to: ResourcePhase,
}

/// Emitted when a scheduler issues a resource command.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CommandEvent {
    /// Which subtree.
    pub subtree: SubtreeId,
    /// Playback time of the evaluation.
    pub time: f64,
    /// The command issued.
    pub command: ResourceCommand,
}

/// Emitted when a scheduler sees the clock step backward and re-derives its
/// state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SeekEvent {
    /// Which subtree.
    pub subtree: SubtreeId,
    /// Previously evaluated time.
    pub from: f64,
    /// New, earlier time.
    pub to: f64,
}

/// Emitted after every evaluation (requires `trace-rich` feature).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EvaluateEvent {
    /// Which subtree.
    pub subtree: SubtreeId,
    /// Playback time of the evaluation.
    pub time: f64,
    /// Mode in force at `time`.
    pub mode: Mode,
    /// Resource phase after the evaluation.
    pub phase: ResourcePhase,
    /// Decision returned to the caller.
    pub decision: RenderDecision,
}

/// Per-frame tally produced by [`FrameSummaryBuilder`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSummary {
    /// Frame counter supplied by the host.
    pub frame_index: u64,
    /// Playback time of the frame.
    pub time: f64,
    /// Subtrees evaluated successfully.
    pub evaluated: u32,
    /// Subtrees that rendered.
    pub rendered: u32,
    /// Resource commands issued.
    pub commands: u32,
    /// Evaluations rejected with an error.
    pub errors: u32,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from schedulers and groups.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a resource phase changes.
    fn on_phase_change(&mut self, e: &PhaseChangeEvent) {
        _ = e;
    }

    /// Called when a resource command is issued.
    fn on_command(&mut self, e: &CommandEvent) {
        _ = e;
    }

    /// Called when a backward seek is re-derived.
    fn on_seek(&mut self, e: &SeekEvent) {
        _ = e;
    }

    /// Called with a per-frame summary.
    fn on_frame_summary(&mut self, s: &FrameSummary) {
        _ = s;
    }

    /// Called after every evaluation (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_evaluate(&mut self, e: &EvaluateEvent) {
        _ = e;
    }
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn on_phase_change(&mut self, e: &PhaseChangeEvent) {
        (**self).on_phase_change(e);
    }

    fn on_command(&mut self, e: &CommandEvent) {
        (**self).on_command(e);
    }

    fn on_seek(&mut self, e: &SeekEvent) {
        (**self).on_seek(e);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        (**self).on_frame_summary(s);
    }

    #[cfg(feature = "trace-rich")]
    fn on_evaluate(&mut self, e: &EvaluateEvent) {
        (**self).on_evaluate(e);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`PhaseChangeEvent`].
    #[inline]
    pub fn phase_change(&mut self, e: &PhaseChangeEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_change(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommandEvent`].
    #[inline]
    pub fn command(&mut self, e: &CommandEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_command(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`SeekEvent`].
    #[inline]
    pub fn seek(&mut self, e: &SeekEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_seek(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`FrameSummary`].
    #[inline]
    pub fn frame_summary(&mut self, s: &FrameSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_frame_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits an [`EvaluateEvent`] (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn evaluate(&mut self, e: &EvaluateEvent) {
        if let Some(s) = &mut self.sink {
            s.on_evaluate(e);
        }
    }
}

// ---------------------------------------------------------------------------
// FrameSummaryBuilder
// ---------------------------------------------------------------------------

/// Tallies per-subtree outcomes during a frame and produces a
/// [`FrameSummary`].
#[derive(Debug)]
pub struct FrameSummaryBuilder {
    summary: FrameSummary,
}

impl FrameSummaryBuilder {
    /// Starts a summary for the given frame.
    #[must_use]
    pub fn new(frame_index: u64, time: f64) -> Self {
        Self {
            summary: FrameSummary {
                frame_index,
                time,
                evaluated: 0,
                rendered: 0,
                commands: 0,
                errors: 0,
            },
        }
    }

    /// Records a successful evaluation.
    pub fn evaluated(&mut self, decision: RenderDecision, command: Option<ResourceCommand>) {
        self.summary.evaluated += 1;
        if decision.is_render() {
            self.summary.rendered += 1;
        }
        if command.is_some() {
            self.summary.commands += 1;
        }
    }

    /// Records a rejected evaluation.
    pub fn failed(&mut self) {
        self.summary.errors += 1;
    }

    /// Consumes the builder and produces the final [`FrameSummary`].
    #[must_use]
    pub fn finish(self) -> FrameSummary {
        self.summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
