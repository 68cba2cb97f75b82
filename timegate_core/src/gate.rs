// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gated subtrees and per-frame groups.
//!
//! A [`GatedSubtree`] binds an [`ActivationScheduler`] to the subtree it
//! gates and the controller of that subtree's backing resource. An
//! [`ActivationGroup`] evaluates any number of them for one frame.
//!
//! Members share nothing mutable; the order they are evaluated in does not
//! affect their decisions.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::id::SubtreeId;
use crate::resource::ResourceController;
use crate::scheduler::{ActivationScheduler, ClockError};
use crate::subtree::{RenderDecision, RenderSubtree};
use crate::trace::{FrameSummary, FrameSummaryBuilder, Tracer};

/// A subtree together with its scheduler and resource controller.
#[derive(Debug)]
pub struct GatedSubtree<S, R> {
    scheduler: ActivationScheduler,
    subtree: S,
    resource: R,
}

impl<S: RenderSubtree, R: ResourceController> GatedSubtree<S, R> {
    /// Binds `scheduler` to `subtree` and `resource`.
    #[must_use]
    pub fn new(scheduler: ActivationScheduler, subtree: S, resource: R) -> Self {
        Self {
            scheduler,
            subtree,
            resource,
        }
    }

    /// Evaluates the scheduler at `t`, forwards any resource command and
    /// then renders or skips the subtree.
    ///
    /// # Errors
    ///
    /// Propagates [`ClockError`] from the scheduler; the subtree is neither
    /// rendered nor skipped in that case.
    pub fn update(&mut self, t: f64, tracer: &mut Tracer<'_>) -> Result<RenderDecision, ClockError> {
        let decision = self
            .scheduler
            .evaluate_traced(t, &mut self.resource, tracer)?;
        decision.apply(&mut self.subtree);
        Ok(decision)
    }
}

impl<S, R> GatedSubtree<S, R> {
    /// Returns the scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &ActivationScheduler {
        &self.scheduler
    }

    /// Returns the scheduler mutably, e.g. to retune it.
    pub fn scheduler_mut(&mut self) -> &mut ActivationScheduler {
        &mut self.scheduler
    }

    /// Returns the gated subtree.
    #[must_use]
    pub fn subtree(&self) -> &S {
        &self.subtree
    }

    /// Returns the resource controller.
    #[must_use]
    pub fn resource(&self) -> &R {
        &self.resource
    }

    /// Splits into scheduler, subtree and controller.
    #[must_use]
    pub fn into_parts(self) -> (ActivationScheduler, S, R) {
        (self.scheduler, self.subtree, self.resource)
    }
}

/// A type-erased [`GatedSubtree`], as stored in an [`ActivationGroup`].
pub type DynGatedSubtree = GatedSubtree<Box<dyn RenderSubtree>, Box<dyn ResourceController>>;

/// Independent gated subtrees evaluated together once per frame.
#[derive(Default)]
pub struct ActivationGroup {
    members: Vec<DynGatedSubtree>,
}

impl core::fmt::Debug for ActivationGroup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActivationGroup")
            .field("len", &self.members.len())
            .finish_non_exhaustive()
    }
}

impl ActivationGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member and returns its index.
    pub fn push<S, R>(&mut self, scheduler: ActivationScheduler, subtree: S, resource: R) -> usize
    where
        S: RenderSubtree + 'static,
        R: ResourceController + 'static,
    {
        self.members.push(GatedSubtree::new(
            scheduler,
            Box::new(subtree),
            Box::new(resource),
        ));
        self.members.len() - 1
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the member at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&DynGatedSubtree> {
        self.members.get(index)
    }

    /// Returns the member at `index` mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut DynGatedSubtree> {
        self.members.get_mut(index)
    }

    /// Finds the member whose scheduler carries `id`.
    #[must_use]
    pub fn find(&self, id: SubtreeId) -> Option<&DynGatedSubtree> {
        self.members.iter().find(|m| m.scheduler.id() == id)
    }

    /// Evaluates every member at `t` and emits a [`FrameSummary`].
    ///
    /// A member that rejects `t` does not stop the others from being
    /// evaluated.
    ///
    /// # Errors
    ///
    /// Returns the first [`ClockError`] raised by a member, after all
    /// members have been evaluated and the summary emitted.
    pub fn evaluate(
        &mut self,
        frame_index: u64,
        t: f64,
        tracer: &mut Tracer<'_>,
    ) -> Result<FrameSummary, ClockError> {
        let mut builder = FrameSummaryBuilder::new(frame_index, t);
        let mut first_error = None;

        for member in &mut self.members {
            match member.update(t, tracer) {
                Ok(decision) => builder.evaluated(decision, member.scheduler.last_command()),
                Err(e) => {
                    builder.failed();
                    first_error.get_or_insert(e);
                }
            }
        }

        let summary = builder.finish();
        tracer.frame_summary(&summary);
        match first_error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use super::*;
    use crate::range::{RangeTable, TimeRange};
    use crate::resource::{NoResource, ResourceCommand};
    use crate::scheduler::{ActivationConfig, SeekPolicy};

    /// Subtree that records `Some(time)` per rendered frame and `None` per
    /// skipped one into a shared log.
    struct Probe(Rc<RefCell<Vec<Option<f64>>>>);

    impl RenderSubtree for Probe {
        fn render(&mut self, time: f64) {
            self.0.borrow_mut().push(Some(time));
        }

        fn skip(&mut self) {
            self.0.borrow_mut().push(None);
        }
    }

    struct Decoder(Rc<RefCell<Vec<ResourceCommand>>>);

    impl ResourceController for Decoder {
        fn begin_load(&mut self) {
            self.0.borrow_mut().push(ResourceCommand::BeginLoad);
        }

        fn release(&mut self) {
            self.0.borrow_mut().push(ResourceCommand::Release);
        }
    }

    fn alternating(first_active: bool) -> RangeTable {
        let mut ranges = Vec::new();
        for i in 0..4_u32 {
            let t = f64::from(i);
            ranges.push(if (i % 2 == 0) == first_active {
                TimeRange::continuous(t)
            } else {
                TimeRange::suppressed(t)
            });
        }
        RangeTable::new(ranges).unwrap()
    }

    #[test]
    fn gated_subtree_applies_decisions() {
        let frames = Rc::new(RefCell::new(Vec::new()));
        let sched = ActivationScheduler::new(alternating(true), ActivationConfig::new());
        let mut gated = GatedSubtree::new(sched, Probe(frames.clone()), NoResource);

        for t in [0.5, 1.5, 2.5] {
            gated.update(t, &mut Tracer::none()).unwrap();
        }
        assert_eq!(*frames.borrow(), [Some(0.5), None, Some(2.5)]);
    }

    #[test]
    fn group_flips_between_two_sources() {
        let frames_a = Rc::new(RefCell::new(Vec::new()));
        let frames_b = Rc::new(RefCell::new(Vec::new()));
        let commands = Rc::new(RefCell::new(Vec::new()));

        let mut group = ActivationGroup::new();
        group.push(
            ActivationScheduler::new(alternating(true), ActivationConfig::new())
                .with_id(SubtreeId(1)),
            Probe(frames_a.clone()),
            Decoder(commands.clone()),
        );
        group.push(
            ActivationScheduler::new(alternating(false), ActivationConfig::new())
                .with_id(SubtreeId(2)),
            Probe(frames_b.clone()),
            NoResource,
        );
        assert_eq!(group.len(), 2);

        let mut rendered = Vec::new();
        for (frame, t) in [0.0, 0.5, 1.0, 1.5].into_iter().enumerate() {
            let summary = group
                .evaluate(frame as u64, t, &mut Tracer::none())
                .unwrap();
            assert_eq!(summary.evaluated, 2);
            rendered.push(summary.rendered);
        }
        assert_eq!(rendered, [1, 1, 1, 1], "exactly one source visible");
        assert_eq!(*frames_a.borrow(), [Some(0.0), Some(0.5), None, None]);
        assert_eq!(*frames_b.borrow(), [None, None, Some(1.0), Some(1.5)]);
        assert_eq!(
            *commands.borrow(),
            [ResourceCommand::BeginLoad, ResourceCommand::Release]
        );
        assert!(group.find(SubtreeId(2)).is_some());
        assert!(group.find(SubtreeId(3)).is_none());
    }

    #[test]
    fn group_counts_commands() {
        let mut group = ActivationGroup::new();
        group.push(
            ActivationScheduler::new(alternating(true), ActivationConfig::new()),
            Probe(Rc::default()),
            NoResource,
        );
        let summary = group.evaluate(0, 0.0, &mut Tracer::none()).unwrap();
        assert_eq!(summary.commands, 1, "initial load");
        let summary = group.evaluate(1, 0.5, &mut Tracer::none()).unwrap();
        assert_eq!(summary.commands, 0);
    }

    #[test]
    fn group_evaluates_all_members_before_reporting_error() {
        let frames = Rc::new(RefCell::new(Vec::new()));
        let mut group = ActivationGroup::new();
        group.push(
            ActivationScheduler::new(
                alternating(true),
                ActivationConfig::new().with_seek_policy(SeekPolicy::Reject),
            ),
            Probe(Rc::default()),
            NoResource,
        );
        group.push(
            ActivationScheduler::new(alternating(true), ActivationConfig::new()),
            Probe(frames.clone()),
            NoResource,
        );

        group.evaluate(0, 2.0, &mut Tracer::none()).unwrap();
        let err = group.evaluate(1, 0.5, &mut Tracer::none()).unwrap_err();
        assert_eq!(
            err,
            ClockError::Regression {
                previous: 2.0,
                current: 0.5,
            }
        );
        assert_eq!(
            *frames.borrow(),
            [Some(2.0), Some(0.5)],
            "second member still rendered after the seek"
        );
    }

    #[test]
    fn scheduler_can_be_retuned_through_group() {
        let mut group = ActivationGroup::new();
        let index = group.push(
            ActivationScheduler::new(alternating(false), ActivationConfig::new()),
            Probe(Rc::default()),
            NoResource,
        );
        if let Some(member) = group.get_mut(index) {
            member.scheduler_mut().set_prefetch_lead(0.5);
        }
        group.evaluate(0, 0.5, &mut Tracer::none()).unwrap();
        let phase = group.get(index).map(|m| m.scheduler().phase());
        assert_eq!(phase, Some(crate::resource::ResourcePhase::Prefetching));
    }
}
