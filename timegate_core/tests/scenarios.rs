// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end activation scenarios driven through the public API.

use std::cell::RefCell;
use std::rc::Rc;

use timegate_core::clock::PlaybackClock;
use timegate_core::gate::ActivationGroup;
use timegate_core::id::SubtreeId;
use timegate_core::range::{Mode, RangeTable, RangeTableError, TimeRange};
use timegate_core::resource::{ResourceCommand, ResourceController, ResourcePhase};
use timegate_core::scheduler::{ActivationConfig, ActivationScheduler};
use timegate_core::subtree::{RenderDecision, RenderSubtree};
use timegate_core::trace::Tracer;

#[derive(Default)]
struct Commands {
    log: Vec<(f64, ResourceCommand)>,
    now: f64,
}

impl ResourceController for Commands {
    fn begin_load(&mut self) {
        self.log.push((self.now, ResourceCommand::BeginLoad));
    }

    fn release(&mut self) {
        self.log.push((self.now, ResourceCommand::Release));
    }
}

/// Runs `frames` through `scheduler`, returning the phase after each one.
fn drive(
    scheduler: &mut ActivationScheduler,
    controller: &mut Commands,
    frames: &[f64],
) -> Vec<(ResourcePhase, RenderDecision)> {
    frames
        .iter()
        .map(|&t| {
            controller.now = t;
            let decision = scheduler.evaluate(t, controller).unwrap();
            (scheduler.phase(), decision)
        })
        .collect()
}

fn ticks(from: f64, to: f64, step: f64) -> Vec<f64> {
    let mut out = Vec::new();
    let mut i = 0_u32;
    loop {
        let t = from + step * f64::from(i);
        if t > to {
            return out;
        }
        out.push(t);
        i += 1;
    }
}

#[test]
fn flip_with_prefetch_and_grace() {
    let table = RangeTable::new([
        TimeRange::suppressed(0.0),
        TimeRange::continuous(2.0),
        TimeRange::suppressed(4.0),
    ])
    .unwrap();
    let config = ActivationConfig::new()
        .with_prefetch_lead(0.5)
        .with_idle_grace(1.0);
    let mut scheduler = ActivationScheduler::new(table, config);
    let mut controller = Commands::default();

    let frames = [0.0, 1.0, 1.4, 1.5, 2.0, 3.0, 4.0, 4.5, 5.0];
    let phases: Vec<_> = drive(&mut scheduler, &mut controller, &frames)
        .into_iter()
        .map(|(phase, _)| phase)
        .collect();

    use ResourcePhase::*;
    assert_eq!(
        phases,
        [
            Unloaded,
            Unloaded,
            Unloaded,
            Prefetching,
            Active,
            Active,
            Idle,
            Idle,
            Unloaded
        ]
    );
    assert_eq!(
        controller.log,
        [
            (1.5, ResourceCommand::BeginLoad),
            (5.0, ResourceCommand::Release)
        ],
        "one load at start - lead, one release after the grace"
    );
}

#[test]
fn rendering_follows_the_mode_only() {
    let table = RangeTable::new([
        TimeRange::suppressed(0.0),
        TimeRange::continuous(2.0),
        TimeRange::suppressed(4.0),
    ])
    .unwrap();
    let mut scheduler = ActivationScheduler::new(table, ActivationConfig::media());
    let mut controller = Commands::default();

    for (t, (_, decision)) in [1.5, 2.0, 3.5, 4.0]
        .into_iter()
        .zip(drive(&mut scheduler, &mut controller, &[1.5, 2.0, 3.5, 4.0]))
    {
        let expected = scheduler.table().mode_at(t).is_active();
        assert_eq!(decision.is_render(), expected, "at t = {t}");
    }
}

#[test]
fn short_gaps_between_active_ranges_keep_the_resource() {
    let table = RangeTable::new([
        TimeRange::continuous(0.0),
        TimeRange::suppressed(1.0),
        TimeRange::continuous(1.5),
        TimeRange::suppressed(2.0),
        TimeRange::continuous(2.75),
        TimeRange::suppressed(3.0),
    ])
    .unwrap();
    let config = ActivationConfig::new().with_idle_grace(1.0);
    let mut scheduler = ActivationScheduler::new(table, config);
    let mut controller = Commands::default();

    drive(&mut scheduler, &mut controller, &ticks(0.0, 3.75, 0.25));
    assert_eq!(
        controller.log,
        [(0.0, ResourceCommand::BeginLoad)],
        "gaps shorter than the grace never release"
    );

    drive(&mut scheduler, &mut controller, &[4.0]);
    assert_eq!(
        controller.log.last(),
        Some(&(4.0, ResourceCommand::Release)),
        "released once the final gap outlasts the grace"
    );
}

#[test]
fn prefetch_completes_strictly_before_activation() {
    for lead in [0.25, 0.5, 1.0] {
        let table =
            RangeTable::new([TimeRange::suppressed(0.0), TimeRange::continuous(2.0)]).unwrap();
        let config = ActivationConfig::new().with_prefetch_lead(lead);
        let mut scheduler = ActivationScheduler::new(table, config);
        let mut controller = Commands::default();

        let frames = ticks(0.0, 2.5, 0.125);
        let outcomes = drive(&mut scheduler, &mut controller, &frames);

        assert_eq!(
            controller.log,
            [(2.0 - lead, ResourceCommand::BeginLoad)],
            "lead {lead}"
        );
        let (first_render, _) = frames
            .iter()
            .zip(&outcomes)
            .find(|(_, (_, decision))| decision.is_render())
            .unwrap();
        assert_eq!(*first_render, 2.0, "lead {lead}");
    }
}

#[test]
fn active_never_falls_back_to_prefetching() {
    let table = RangeTable::new([
        TimeRange::suppressed(0.0),
        TimeRange::continuous(1.0),
        TimeRange::suppressed(1.3),
        TimeRange::once(1.6, 0.25),
        TimeRange::suppressed(2.4),
        TimeRange::continuous(2.5),
        TimeRange::suppressed(4.0),
    ])
    .unwrap();
    let config = ActivationConfig::new()
        .with_prefetch_lead(0.4)
        .with_idle_grace(0.2);
    let mut scheduler = ActivationScheduler::new(table, config);
    let mut controller = Commands::default();

    // Uneven, non-decreasing frame times.
    let mut t = 0.0;
    let mut frames = Vec::new();
    let mut seed = 7_u32;
    while t < 5.0 {
        frames.push(t);
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        t += f64::from(seed % 7) * 0.05;
    }

    let mut previous = scheduler.phase();
    for (phase, _) in drive(&mut scheduler, &mut controller, &frames) {
        assert!(
            !(previous == ResourcePhase::Active && phase == ResourcePhase::Prefetching),
            "Active -> Prefetching"
        );
        previous = phase;
    }

    // Loads and releases alternate, starting with a load.
    for (i, (_, command)) in controller.log.iter().enumerate() {
        let expected = if i % 2 == 0 {
            ResourceCommand::BeginLoad
        } else {
            ResourceCommand::Release
        };
        assert_eq!(*command, expected, "command {i}");
    }
}

#[test]
fn unsorted_table_is_rejected() {
    let err =
        RangeTable::new([TimeRange::continuous(2.0), TimeRange::suppressed(1.0)]).unwrap_err();
    assert_eq!(
        err,
        RangeTableError::NotIncreasing {
            index: 1,
            previous: 2.0,
            start: 1.0,
        }
    );
}

/// Subtree that appends its label to a shared log when drawn.
struct Source {
    label: char,
    drawn: Rc<RefCell<Vec<(f64, char)>>>,
}

impl RenderSubtree for Source {
    fn render(&mut self, time: f64) {
        self.drawn.borrow_mut().push((time, self.label));
    }
}

/// Controller shared by every source, recording which one asked for what.
struct SharedDecoder {
    label: char,
    log: Rc<RefCell<Vec<(char, ResourceCommand)>>>,
}

impl ResourceController for SharedDecoder {
    fn begin_load(&mut self) {
        self.log
            .borrow_mut()
            .push((self.label, ResourceCommand::BeginLoad));
    }

    fn release(&mut self) {
        self.log.borrow_mut().push((self.label, ResourceCommand::Release));
    }
}

fn segments(first_active: bool, segment: f64, count: u32) -> RangeTable {
    RangeTable::new((0..count).map(|i| {
        let start = segment * f64::from(i);
        if (i % 2 == 0) == first_active {
            TimeRange::continuous(start)
        } else {
            TimeRange::suppressed(start)
        }
    }))
    .unwrap()
}

#[test]
fn parallel_playback_shows_one_source_at_a_time() {
    let segment = 1.5;
    let config = ActivationConfig::media()
        .with_prefetch_lead(segment / 3.0)
        .with_idle_grace(segment / 2.0);

    let drawn = Rc::new(RefCell::new(Vec::new()));
    let decoder_log = Rc::new(RefCell::new(Vec::new()));
    let mut group = ActivationGroup::new();
    for (id, label, first_active) in [(0, 'a', true), (1, 'b', false)] {
        group.push(
            ActivationScheduler::new(segments(first_active, segment, 6), config)
                .with_id(SubtreeId(id)),
            Source {
                label,
                drawn: drawn.clone(),
            },
            SharedDecoder {
                label,
                log: decoder_log.clone(),
            },
        );
    }

    let mut clock = PlaybackClock::starting_at(0);
    for frame in 0..540_u64 {
        // 60 frames per second.
        let t = clock.now(frame * 16_666_667).unwrap();
        let summary = group.evaluate(frame, t, &mut Tracer::none()).unwrap();
        assert_eq!(summary.rendered, 1, "frame {frame} at {t}");
    }

    let drawn = drawn.borrow();
    let switches = drawn.windows(2).filter(|w| w[0].1 != w[1].1).count();
    assert_eq!(switches, 5, "one switch per segment boundary");

    let log = decoder_log.borrow();
    let b_load = log
        .iter()
        .position(|&entry| entry == ('b', ResourceCommand::BeginLoad))
        .unwrap();
    let b_first_draw = drawn.iter().position(|&(_, label)| label == 'b').unwrap();
    assert_eq!(b_load, 1, "b loads right after a: {log:?}");
    assert!(
        drawn[b_first_draw].0 >= segment,
        "b is not drawn before its segment"
    );
    assert!(
        log.contains(&('a', ResourceCommand::Release)),
        "a is released while b plays"
    );
}

#[test]
fn seeking_the_clock_rederives_the_group() {
    let table = RangeTable::new([
        TimeRange::continuous(0.0),
        TimeRange::suppressed(2.0),
        TimeRange::once(6.0, 1.0),
    ])
    .unwrap();
    let drawn = Rc::new(RefCell::new(Vec::new()));
    let decoder_log = Rc::new(RefCell::new(Vec::new()));
    let mut group = ActivationGroup::new();
    group.push(
        ActivationScheduler::new(table, ActivationConfig::new().with_idle_grace(0.5)),
        Source {
            label: 'a',
            drawn: drawn.clone(),
        },
        SharedDecoder {
            label: 'a',
            log: decoder_log.clone(),
        },
    );

    let mut clock = PlaybackClock::starting_at(0);
    for (frame, host) in [0, 3_000_000_000, 4_000_000_000_u64].into_iter().enumerate() {
        let t = clock.now(host).unwrap();
        group.evaluate(frame as u64, t, &mut Tracer::none()).unwrap();
    }
    assert_eq!(
        group.get(0).map(|m| m.scheduler().phase()),
        Some(ResourcePhase::Unloaded),
        "released during the long suppressed stretch"
    );

    clock.seek(4_000_000_000, 1.0);
    let t = clock.now(4_000_000_000).unwrap();
    group.evaluate(3, t, &mut Tracer::none()).unwrap();
    let member = group.get(0).unwrap();
    assert_eq!(member.scheduler().phase(), ResourcePhase::Active);
    assert_eq!(member.scheduler().mode(), Mode::Continuous);
    assert_eq!(
        *decoder_log.borrow(),
        [
            ('a', ResourceCommand::BeginLoad),
            ('a', ResourceCommand::Release),
            ('a', ResourceCommand::BeginLoad)
        ]
    );

    let later = clock.now(9_500_000_000).unwrap();
    group.evaluate(4, later, &mut Tracer::none()).unwrap();
    assert_eq!(
        drawn.borrow().last().map(|&(time, _)| time),
        Some(1.0),
        "once range renders its frozen time"
    );
}
