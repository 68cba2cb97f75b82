// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two media sources taking turns on a timeline.
//!
//! Each source is visible on alternate segments. A simulated decoder pool
//! counts how many decoders are open at once, which is what `prefetch_lead`
//! and `idle_grace` trade against switch latency. Halfway through, the clock
//! seeks back to show re-derivation.
//!
//! Events go to a [`PrettyPrintSink`] on stdout, to the `log` facade
//! (`RUST_LOG=timegate=debug` for transitions) and to a [`RecorderSink`],
//! which is exported as `parallel_playback.trace.json`.
//!
//! Pass `--constrained` to tighten the tuning to a fraction of a segment.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter};
use std::rc::Rc;

use log::{debug, info, trace};

use timegate_core::clock::PlaybackClock;
use timegate_core::gate::ActivationGroup;
use timegate_core::id::SubtreeId;
use timegate_core::range::{RangeTable, RangeTableError, TimeRange};
use timegate_core::resource::ResourceController;
use timegate_core::scheduler::{ActivationConfig, ActivationScheduler};
use timegate_core::subtree::RenderSubtree;
use timegate_core::trace::Tracer;

use timegate_debug::Tee;
use timegate_debug::log::LogSink;
use timegate_debug::pretty::PrettyPrintSink;
use timegate_debug::recorder::RecorderSink;

/// Seconds each source stays on screen.
const SEGMENT: f64 = 2.0;
const SEGMENTS: u32 = 6;
const FRAME_COUNT: u64 = 60 * 12;
/// 16.6ms refresh interval in nanoseconds (≈60 Hz).
const REFRESH_INTERVAL_NS: u64 = 16_666_667;
const TRACE_PATH: &str = "parallel_playback.trace.json";

#[derive(Debug, Default)]
struct DecoderPool {
    open: u32,
    peak: u32,
    opened_total: u32,
}

/// Decoder for one source, opened and closed on command.
struct Decoder {
    name: &'static str,
    open: bool,
    pool: Rc<RefCell<DecoderPool>>,
}

impl ResourceController for Decoder {
    fn begin_load(&mut self) {
        if self.open {
            return;
        }
        self.open = true;
        let mut pool = self.pool.borrow_mut();
        pool.open += 1;
        pool.opened_total += 1;
        pool.peak = pool.peak.max(pool.open);
        debug!("{}: decoder opened ({} open)", self.name, pool.open);
    }

    fn release(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        let mut pool = self.pool.borrow_mut();
        pool.open -= 1;
        debug!("{}: decoder closed ({} open)", self.name, pool.open);
    }
}

struct MediaLayer {
    name: &'static str,
}

impl RenderSubtree for MediaLayer {
    fn render(&mut self, time: f64) {
        trace!("{}: draw at {time:.3}s", self.name);
    }
}

/// Alternating visible/hidden segments, starting visible if `first`.
fn segments(first: bool) -> Result<RangeTable, RangeTableError> {
    let ranges = (0..SEGMENTS).map(|i| {
        let start = SEGMENT * f64::from(i);
        if (i % 2 == 0) == first {
            TimeRange::continuous(start)
        } else {
            TimeRange::suppressed(start)
        }
    });
    RangeTable::new(ranges)
}

fn main() -> io::Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let constrained = std::env::args().skip(1).any(|arg| arg == "--constrained");
    let config = if constrained {
        ActivationConfig::media()
            .with_prefetch_lead(SEGMENT / 3.0)
            .with_idle_grace(SEGMENT / 2.0)
    } else {
        ActivationConfig::media()
    };
    info!(
        "prefetch_lead={:.3}s idle_grace={:.3}s",
        config.prefetch_lead, config.idle_grace
    );

    // -- sinks -------------------------------------------------------------
    let pretty = PrettyPrintSink::new(Box::new(io::stdout()));
    let mut sink = Tee::new(pretty, Tee::new(LogSink, RecorderSink::new()));

    // -- timeline ----------------------------------------------------------
    let pool = Rc::new(RefCell::new(DecoderPool::default()));
    let mut group = ActivationGroup::new();
    for (id, name, first) in [(0, "left", true), (1, "right", false)] {
        let table = segments(first).map_err(io::Error::other)?;
        group.push(
            ActivationScheduler::new(table, config).with_id(SubtreeId(id)),
            MediaLayer { name },
            Decoder {
                name,
                open: false,
                pool: pool.clone(),
            },
        );
    }

    // -- simulated loop ----------------------------------------------------
    let mut clock = PlaybackClock::starting_at(0);
    let mut tracer = Tracer::new(&mut sink);
    for frame_index in 0..FRAME_COUNT {
        let host = frame_index * REFRESH_INTERVAL_NS;
        if frame_index == FRAME_COUNT / 2 {
            clock.seek(host, SEGMENT * 1.5);
        }
        let Some(t) = clock.now(host) else {
            continue;
        };
        group
            .evaluate(frame_index, t, &mut tracer)
            .map_err(io::Error::other)?;
    }
    drop(tracer);

    let pool = pool.borrow();
    info!(
        "{} decoder opens, at most {} open at once",
        pool.opened_total, pool.peak
    );

    // -- export Chrome trace -----------------------------------------------
    let recorder = &sink.second.second;
    let mut writer = BufWriter::new(File::create(TRACE_PATH)?);
    timegate_debug::chrome::export(recorder.as_bytes(), &mut writer)?;

    println!("Wrote {TRACE_PATH} ({FRAME_COUNT} frames)");
    Ok(())
}
