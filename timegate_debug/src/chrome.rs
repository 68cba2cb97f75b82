// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each subtree gets its own track (`tid` = subtree id). Loaded resource
//! phases become duration slices on that track; commands and seeks are
//! instant markers; frame summaries are counters on track 0 of a separate
//! process.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::collections::HashMap;
use std::io::{self, Write};

use serde_json::{Value, json};

use timegate_core::resource::ResourcePhase;

use crate::recorder::{RecordedEvent, decode};

const SUBTREE_PID: u32 = 0;
const FRAME_PID: u32 = 1;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Playback times are converted to microseconds. After a seek, the events
/// that follow carry the earlier playback time; any open phase slice is
/// closed at the seek.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Phase slice currently open per subtree.
    let mut open: HashMap<u32, ResourcePhase> = HashMap::new();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::PhaseChange(e) => {
                let tid = e.subtree.0;
                if let Some(phase) = open.remove(&tid) {
                    events.push(slice_end(phase, seconds_to_us(e.time), tid));
                }
                if e.to.is_loaded() {
                    open.insert(tid, e.to);
                    events.push(json!({
                        "ph": "B",
                        "name": e.to.as_str(),
                        "cat": "Resource",
                        "ts": seconds_to_us(e.time),
                        "pid": SUBTREE_PID,
                        "tid": tid,
                        "args": {
                            "from": e.from.as_str(),
                        }
                    }));
                }
            }
            RecordedEvent::Command(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": e.command.as_str(),
                    "cat": "Resource",
                    "ts": seconds_to_us(e.time),
                    "pid": SUBTREE_PID,
                    "tid": e.subtree.0,
                    "s": "t",
                }));
            }
            RecordedEvent::Seek(e) => {
                let tid = e.subtree.0;
                if let Some(phase) = open.remove(&tid) {
                    events.push(slice_end(phase, seconds_to_us(e.from), tid));
                }
                events.push(json!({
                    "ph": "i",
                    "name": "Seek",
                    "cat": "Clock",
                    "ts": seconds_to_us(e.to),
                    "pid": SUBTREE_PID,
                    "tid": tid,
                    "s": "t",
                    "args": {
                        "from_s": e.from,
                        "to_s": e.to,
                    }
                }));
            }
            RecordedEvent::FrameSummary(s) => {
                events.push(json!({
                    "ph": "C",
                    "name": "Frame",
                    "cat": "Summary",
                    "ts": seconds_to_us(s.time),
                    "pid": FRAME_PID,
                    "tid": 0,
                    "args": {
                        "rendered": s.rendered,
                        "commands": s.commands,
                        "errors": s.errors,
                    }
                }));
            }
            RecordedEvent::Evaluate(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": e.mode.as_str(),
                    "cat": "Evaluate",
                    "ts": seconds_to_us(e.time),
                    "pid": SUBTREE_PID,
                    "tid": e.subtree.0,
                    "s": "t",
                    "args": {
                        "phase": e.phase.as_str(),
                        "render": e.decision.is_render(),
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn slice_end(phase: ResourcePhase, ts: f64, tid: u32) -> Value {
    json!({
        "ph": "E",
        "name": phase.as_str(),
        "cat": "Resource",
        "ts": ts,
        "pid": SUBTREE_PID,
        "tid": tid,
    })
}

fn seconds_to_us(seconds: f64) -> f64 {
    seconds * 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use timegate_core::id::SubtreeId;
    use timegate_core::resource::ResourceCommand;
    use timegate_core::trace::{CommandEvent, PhaseChangeEvent, SeekEvent, TraceSink};

    fn phase_change(time: f64, from: ResourcePhase, to: ResourcePhase) -> PhaseChangeEvent {
        PhaseChangeEvent {
            subtree: SubtreeId(3),
            time,
            from,
            to,
        }
    }

    fn export_to_values(rec: &RecorderSink) -> Vec<Value> {
        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        serde_json::from_str(&json_str).unwrap()
    }

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_phase_change(&phase_change(
            1.5,
            ResourcePhase::Unloaded,
            ResourcePhase::Prefetching,
        ));
        rec.on_command(&CommandEvent {
            subtree: SubtreeId(3),
            time: 1.5,
            command: ResourceCommand::BeginLoad,
        });
        rec.on_phase_change(&phase_change(
            2.0,
            ResourcePhase::Prefetching,
            ResourcePhase::Active,
        ));

        let parsed = export_to_values(&rec);
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "prefetching");
        assert_eq!(parsed[0]["tid"], 3);
        assert_eq!(parsed[0]["ts"], 1_500_000.0);

        assert_eq!(parsed[1]["ph"], "i");
        assert_eq!(parsed[1]["name"], "begin_load");

        // Prefetching closes as Active opens.
        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["name"], "prefetching");
        assert_eq!(parsed[3]["ph"], "B");
        assert_eq!(parsed[3]["name"], "active");
    }

    #[test]
    fn release_closes_slice_without_opening_one() {
        let mut rec = RecorderSink::new();
        rec.on_phase_change(&phase_change(
            0.0,
            ResourcePhase::Unloaded,
            ResourcePhase::Idle,
        ));
        rec.on_phase_change(&phase_change(
            1.0,
            ResourcePhase::Idle,
            ResourcePhase::Unloaded,
        ));

        let parsed = export_to_values(&rec);
        let phases: Vec<_> = parsed.iter().map(|e| e["ph"].clone()).collect();
        assert_eq!(phases, ["B", "E"]);
    }

    #[test]
    fn seek_closes_open_slice() {
        let mut rec = RecorderSink::new();
        rec.on_phase_change(&phase_change(
            0.0,
            ResourcePhase::Unloaded,
            ResourcePhase::Active,
        ));
        rec.on_seek(&SeekEvent {
            subtree: SubtreeId(3),
            from: 5.0,
            to: 1.0,
        });

        let parsed = export_to_values(&rec);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[1]["ph"], "E");
        assert_eq!(parsed[1]["ts"], 5_000_000.0);
        assert_eq!(parsed[2]["name"], "Seek");
        assert_eq!(parsed[2]["ts"], 1_000_000.0);
    }

    #[test]
    fn export_empty_recording() {
        let parsed = export_to_values(&RecorderSink::new());
        assert!(parsed.is_empty());
    }
}
