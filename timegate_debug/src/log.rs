// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace events through the `log` facade.
//!
//! [`LogSink`] routes scheduler events to whatever logger the host has
//! installed (e.g. `env_logger`), under the `timegate` target:
//!
//! | Event | Level |
//! |---|---|
//! | seek | `info` |
//! | phase change, command | `debug` |
//! | frame summary with errors | `warn` |
//! | frame summary, evaluation | `trace` |

use log::{Level, debug, info, log_enabled, trace, warn};

use timegate_core::subtree::RenderDecision;
use timegate_core::trace::{
    CommandEvent, EvaluateEvent, FrameSummary, PhaseChangeEvent, SeekEvent, TraceSink,
};

const TARGET: &str = "timegate";

/// A [`TraceSink`] that forwards events to the `log` macros.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl TraceSink for LogSink {
    fn on_phase_change(&mut self, e: &PhaseChangeEvent) {
        debug!(
            target: TARGET,
            "{} {} -> {} at {:.3}s",
            e.subtree,
            e.from.as_str(),
            e.to.as_str(),
            e.time
        );
    }

    fn on_command(&mut self, e: &CommandEvent) {
        debug!(target: TARGET, "{} {} at {:.3}s", e.subtree, e.command.as_str(), e.time);
    }

    fn on_seek(&mut self, e: &SeekEvent) {
        info!(target: TARGET, "{} seek {:.3}s -> {:.3}s", e.subtree, e.from, e.to);
    }

    fn on_frame_summary(&mut self, s: &FrameSummary) {
        if s.errors > 0 {
            warn!(
                target: TARGET,
                "frame {} at {:.3}s: {} of {} evaluations rejected",
                s.frame_index,
                s.time,
                s.errors,
                s.errors + s.evaluated
            );
            return;
        }
        trace!(
            target: TARGET,
            "frame {} at {:.3}s: {} evaluated, {} rendered, {} commands",
            s.frame_index,
            s.time,
            s.evaluated,
            s.rendered,
            s.commands
        );
    }

    fn on_evaluate(&mut self, e: &EvaluateEvent) {
        if !log_enabled!(target: TARGET, Level::Trace) {
            return;
        }
        match e.decision {
            RenderDecision::Render { time } => trace!(
                target: TARGET,
                "{} {} ({}) render at {time:.3}s",
                e.subtree,
                e.mode.as_str(),
                e.phase.as_str()
            ),
            RenderDecision::Skip => trace!(
                target: TARGET,
                "{} {} ({}) skip",
                e.subtree,
                e.mode.as_str(),
                e.phase.as_str()
            ),
        }
    }
}
