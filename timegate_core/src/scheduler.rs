// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-range-gated activation with prefetch and idle hysteresis.
//!
//! The [`ActivationScheduler`] converts a playback time into a
//! [`RenderDecision`] for its subtree and drives the subtree's backing
//! resource through [`ResourcePhase`]s, issuing at most one
//! [`ResourceCommand`] per evaluation. See the [`ActivationScheduler`] struct
//! docs for the transition rules.

use crate::id::SubtreeId;
use crate::range::{Mode, RangeTable};
use crate::resource::{ResourceCommand, ResourceController, ResourcePhase};
use crate::subtree::RenderDecision;
#[cfg(feature = "trace-rich")]
use crate::trace::EvaluateEvent;
use crate::trace::{CommandEvent, PhaseChangeEvent, SeekEvent, Tracer};

/// What the scheduler does when the clock goes backward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SeekPolicy {
    /// Treat the step as a seek and recompute the resource phase from the
    /// range table at the new time, ignoring hysteresis bookkeeping.
    #[default]
    Rederive,
    /// Reject the evaluation with [`ClockError::Regression`] and leave the
    /// scheduler untouched.
    Reject,
}

/// Tuning for an [`ActivationScheduler`].
///
/// Times are in seconds. Negative or NaN values are treated as zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActivationConfig {
    /// How far ahead of an active range's start the resource starts loading.
    pub prefetch_lead: f64,
    /// How long the resource stays loaded after its subtree stops being
    /// active before it is released.
    pub idle_grace: f64,
    /// Behavior on backward clock steps.
    pub seek_policy: SeekPolicy,
}

impl ActivationConfig {
    /// No prefetch, immediate release, re-derive on seek.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            prefetch_lead: 0.0,
            idle_grace: 0.0,
            seek_policy: SeekPolicy::Rederive,
        }
    }

    /// Defaults suited to decoded media: one second of prefetch and four
    /// seconds of idle grace.
    #[must_use]
    pub const fn media() -> Self {
        Self {
            prefetch_lead: 1.0,
            idle_grace: 4.0,
            seek_policy: SeekPolicy::Rederive,
        }
    }

    /// Returns a copy with the given prefetch lead.
    #[must_use]
    pub const fn with_prefetch_lead(mut self, seconds: f64) -> Self {
        self.prefetch_lead = seconds;
        self
    }

    /// Returns a copy with the given idle grace.
    #[must_use]
    pub const fn with_idle_grace(mut self, seconds: f64) -> Self {
        self.idle_grace = seconds;
        self
    }

    /// Returns a copy with the given seek policy.
    #[must_use]
    pub const fn with_seek_policy(mut self, policy: SeekPolicy) -> Self {
        self.seek_policy = policy;
        self
    }

    fn lead(&self) -> f64 {
        self.prefetch_lead.max(0.0)
    }

    fn grace(&self) -> f64 {
        self.idle_grace.max(0.0)
    }
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors from [`ActivationScheduler::evaluate`].
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum ClockError {
    /// The clock went backward under [`SeekPolicy::Reject`].
    #[error("clock went backward from {previous} to {current}")]
    Regression {
        /// Last evaluated time.
        previous: f64,
        /// The rejected, earlier time.
        current: f64,
    },
    /// The time was NaN or infinite.
    #[error("playback time {0} is not finite")]
    NotFinite(f64),
}

/// Mutable per-scheduler state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerState {
    /// Mode in force at the last evaluated time.
    pub mode: Mode,
    /// Current resource phase.
    pub phase: ResourcePhase,
    /// Last evaluated time, `None` before the first evaluation.
    pub last_evaluated: Option<f64>,
    /// When the resource last became idle, while in [`ResourcePhase::Idle`].
    pub idle_since: Option<f64>,
    /// Command issued by the last evaluation, if any.
    pub last_command: Option<ResourceCommand>,
}

/// Gates one subtree by a [`RangeTable`] and manages its backing resource.
///
/// # Transition rules
///
/// Each evaluation first derives the mode at `t`. The resource is *due* when
/// that mode is active, or when the next active range starts within
/// `prefetch_lead` of `t`. Then, in order, within the same call:
///
/// 1. `Unloaded` and due: go to `Prefetching` and issue `begin_load`.
/// 2. `Prefetching` and the mode is active: go to `Active`. If the mode is
///    inactive and the resource is no longer due (the range was skipped
///    over, or the lead shrank), go to `Idle`.
/// 3. `Active` and the mode is inactive: go to `Idle`.
/// 4. `Idle` and the mode is active: back to `Active` without a reload.
///    Otherwise, once `idle_grace` has elapsed and the resource is not due:
///    go to `Unloaded` and issue `release`.
///
/// At most one command is issued per call, and evaluating the same time
/// twice issues nothing the second time.
///
/// # Usage
///
/// ```rust
/// use timegate_core::range::{RangeTable, TimeRange};
/// use timegate_core::resource::NoResource;
/// use timegate_core::scheduler::{ActivationConfig, ActivationScheduler};
///
/// let table = RangeTable::new([TimeRange::suppressed(0.0), TimeRange::continuous(2.0)])?;
/// let config = ActivationConfig::new().with_prefetch_lead(0.5);
/// let mut scheduler = ActivationScheduler::new(table, config);
///
/// let decision = scheduler.evaluate(2.25, &mut NoResource)?;
/// assert!(decision.is_render());
/// # Ok::<(), Box<dyn core::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct ActivationScheduler {
    table: RangeTable,
    config: ActivationConfig,
    id: SubtreeId,
    state: SchedulerState,
}

impl ActivationScheduler {
    /// Creates a scheduler for the given table and tuning.
    #[must_use]
    pub fn new(table: RangeTable, config: ActivationConfig) -> Self {
        let mode = table.mode_at(0.0);
        Self {
            table,
            config,
            id: SubtreeId::default(),
            state: SchedulerState {
                mode,
                phase: ResourcePhase::Unloaded,
                last_evaluated: None,
                idle_since: None,
                last_command: None,
            },
        }
    }

    /// Sets the label carried by this scheduler's trace events.
    #[must_use]
    pub fn with_id(mut self, id: SubtreeId) -> Self {
        self.id = id;
        self
    }

    /// Returns the trace label.
    #[must_use]
    pub fn id(&self) -> SubtreeId {
        self.id
    }

    /// Returns the range table.
    #[must_use]
    pub fn table(&self) -> &RangeTable {
        &self.table
    }

    /// Returns the current tuning.
    #[must_use]
    pub fn config(&self) -> &ActivationConfig {
        &self.config
    }

    /// Returns the mutable state as of the last evaluation.
    #[must_use]
    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    /// Mode in force at the last evaluated time.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.state.mode
    }

    /// Current resource phase.
    #[must_use]
    pub fn phase(&self) -> ResourcePhase {
        self.state.phase
    }

    /// Command issued by the last evaluation, if any.
    #[must_use]
    pub fn last_command(&self) -> Option<ResourceCommand> {
        self.state.last_command
    }

    /// Sets the prefetch lead; takes effect on the next evaluation.
    pub fn set_prefetch_lead(&mut self, seconds: f64) {
        self.config.prefetch_lead = seconds;
    }

    /// Sets the idle grace; takes effect on the next evaluation.
    pub fn set_idle_grace(&mut self, seconds: f64) {
        self.config.idle_grace = seconds;
    }

    /// Sets the seek policy; takes effect on the next evaluation.
    pub fn set_seek_policy(&mut self, policy: SeekPolicy) {
        self.config.seek_policy = policy;
    }

    /// Evaluates the scheduler at playback time `t`, issuing any resulting
    /// resource command to `controller`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::NotFinite`] for a NaN or infinite `t`, and
    /// [`ClockError::Regression`] if `t` precedes the last evaluated time
    /// under [`SeekPolicy::Reject`]. State is untouched on error.
    pub fn evaluate<C>(&mut self, t: f64, controller: &mut C) -> Result<RenderDecision, ClockError>
    where
        C: ResourceController + ?Sized,
    {
        self.evaluate_traced(t, controller, &mut Tracer::none())
    }

    /// Like [`evaluate`](Self::evaluate), reporting transitions, commands and
    /// seeks to `tracer`.
    ///
    /// # Errors
    ///
    /// See [`evaluate`](Self::evaluate).
    pub fn evaluate_traced<C>(
        &mut self,
        t: f64,
        controller: &mut C,
        tracer: &mut Tracer<'_>,
    ) -> Result<RenderDecision, ClockError>
    where
        C: ResourceController + ?Sized,
    {
        if !t.is_finite() {
            return Err(ClockError::NotFinite(t));
        }

        let regressed_from = self.state.last_evaluated.filter(|&previous| t < previous);
        if let Some(previous) = regressed_from {
            if self.config.seek_policy == SeekPolicy::Reject {
                return Err(ClockError::Regression {
                    previous,
                    current: t,
                });
            }
            tracer.seek(&SeekEvent {
                subtree: self.id,
                from: previous,
                to: t,
            });
        }

        let mode = self.table.mode_at(t);
        let due = self.is_due(t, mode);
        self.state.mode = mode;
        self.state.last_command = None;

        if regressed_from.is_some() {
            self.rederive(t, mode, due, tracer);
        } else {
            self.advance(t, mode, due, tracer);
        }

        if let Some(command) = self.state.last_command {
            command.issue(controller);
            tracer.command(&CommandEvent {
                subtree: self.id,
                time: t,
                command,
            });
        }
        self.state.last_evaluated = Some(t);

        let decision = match mode {
            Mode::Continuous => RenderDecision::Render { time: t },
            Mode::Once { render_time } => RenderDecision::Render { time: render_time },
            Mode::Suppressed => RenderDecision::Skip,
        };

        #[cfg(feature = "trace-rich")]
        tracer.evaluate(&EvaluateEvent {
            subtree: self.id,
            time: t,
            mode,
            phase: self.state.phase,
            decision,
        });

        Ok(decision)
    }

    /// Whether the resource is needed at `t` or within the prefetch window.
    fn is_due(&self, t: f64, mode: Mode) -> bool {
        if mode.is_active() {
            return true;
        }
        self.table
            .next_active_start(t)
            .is_some_and(|start| t >= start - self.config.lead())
    }

    /// Forward-time transitions, in precedence order.
    fn advance(&mut self, t: f64, mode: Mode, due: bool, tracer: &mut Tracer<'_>) {
        if self.state.phase == ResourcePhase::Unloaded && due {
            self.transition(t, ResourcePhase::Prefetching, tracer);
            self.state.last_command = Some(ResourceCommand::BeginLoad);
        }

        if self.state.phase == ResourcePhase::Prefetching {
            if mode.is_active() {
                self.transition(t, ResourcePhase::Active, tracer);
            } else if !due {
                self.transition(t, ResourcePhase::Idle, tracer);
            }
        }

        if self.state.phase == ResourcePhase::Active && !mode.is_active() {
            self.transition(t, ResourcePhase::Idle, tracer);
        }

        if self.state.phase == ResourcePhase::Idle {
            if mode.is_active() {
                self.transition(t, ResourcePhase::Active, tracer);
            } else {
                self.release_if_expired(t, due, tracer);
            }
        }
    }

    /// Recomputes the phase from the table after a backward step.
    fn rederive(&mut self, t: f64, mode: Mode, due: bool, tracer: &mut Tracer<'_>) {
        let loaded = self.state.phase.is_loaded();
        let target = if mode.is_active() {
            ResourcePhase::Active
        } else if due {
            ResourcePhase::Prefetching
        } else if loaded {
            // Start a fresh grace window rather than trusting the old one.
            ResourcePhase::Idle
        } else {
            ResourcePhase::Unloaded
        };

        if !loaded && target != ResourcePhase::Unloaded {
            self.state.last_command = Some(ResourceCommand::BeginLoad);
        }
        self.transition(t, target, tracer);

        if target == ResourcePhase::Idle {
            self.state.idle_since = Some(t);
            self.release_if_expired(t, due, tracer);
        }
    }

    fn release_if_expired(&mut self, t: f64, due: bool, tracer: &mut Tracer<'_>) {
        let since = self.state.idle_since.unwrap_or(t);
        if !due && t - since >= self.config.grace() {
            self.transition(t, ResourcePhase::Unloaded, tracer);
            self.state.last_command = Some(ResourceCommand::Release);
        }
    }

    fn transition(&mut self, t: f64, to: ResourcePhase, tracer: &mut Tracer<'_>) {
        let from = self.state.phase;
        if from == to {
            return;
        }
        self.state.phase = to;
        self.state.idle_since = (to == ResourcePhase::Idle).then_some(t);
        tracer.phase_change(&PhaseChangeEvent {
            subtree: self.id,
            time: t,
            from,
            to,
        });
    }
}
