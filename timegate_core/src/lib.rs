// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-range-gated render and resource activation.
//!
//! `timegate_core` decides, frame by frame, whether a render subtree is drawn
//! and when the resource backing it (a media decoder, a texture, ...) is
//! loaded and released. It is `no_std` compatible (with `alloc`).
//!
//! # Architecture
//!
//! Each gated subtree owns an immutable range table and a small scheduler:
//!
//! ```text
//!   PlaybackClock::now() ──► t
//!                            │
//!                            ▼
//!   RangeTable ──► ActivationScheduler::evaluate(t) ──► RenderDecision
//!                            │                               │
//!                            ▼                               ▼
//!           ResourceCommand ──► ResourceController   RenderSubtree
//! ```
//!
//! **[`range`]** — [`TimeRange`](range::TimeRange) and the validated,
//! shareable [`RangeTable`](range::RangeTable) that maps a time to a
//! [`Mode`](range::Mode).
//!
//! **[`scheduler`]** — [`ActivationScheduler`](scheduler::ActivationScheduler):
//! per-subtree state machine with `prefetch_lead` / `idle_grace` hysteresis.
//!
//! **[`resource`]** — Resource phases, the commands issued on transitions and
//! the [`ResourceController`](resource::ResourceController) that receives
//! them.
//!
//! **[`subtree`]** — The [`RenderSubtree`](subtree::RenderSubtree) capability
//! and [`RenderDecision`](subtree::RenderDecision).
//!
//! **[`gate`]** — Binds scheduler, subtree and controller together and
//! evaluates groups of them per frame.
//!
//! **[`clock`]** — `PlaybackClock`, a smoothed monotonic host-to-playback
//! time mapping.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! scheduler instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates the
//!   per-evaluation event.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod clock;
pub mod gate;
pub mod id;
pub mod range;
pub mod resource;
pub mod scheduler;
pub mod subtree;
pub mod trace;
