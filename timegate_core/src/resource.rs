// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Backing resource lifecycle.
//!
//! Expensive inputs (media decoders, texture uploads) sit behind a
//! [`ResourceController`]. The scheduler only *issues* commands; the
//! controller may run them on a worker thread and report failures through
//! its own channels.

use alloc::boxed::Box;

/// Lifecycle state of a subtree's backing resource, as tracked by the
/// scheduler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResourcePhase {
    /// Not loaded, no load requested.
    #[default]
    Unloaded,
    /// A load has been requested ahead of an active range.
    Prefetching,
    /// Loaded and in use by an active range.
    Active,
    /// Loaded but unused; released once the idle grace period elapses.
    Idle,
}

impl ResourcePhase {
    /// Returns `true` if a load has been issued and no release since.
    #[inline]
    #[must_use]
    pub const fn is_loaded(self) -> bool {
        !matches!(self, Self::Unloaded)
    }

    /// Returns a short lowercase label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unloaded => "unloaded",
            Self::Prefetching => "prefetching",
            Self::Active => "active",
            Self::Idle => "idle",
        }
    }
}

/// A lifecycle command sent to a [`ResourceController`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceCommand {
    /// Start loading (or keep loading) the resource.
    BeginLoad,
    /// Drop the resource.
    Release,
}

impl ResourceCommand {
    /// Forwards this command to `controller`.
    #[inline]
    pub fn issue<C: ResourceController + ?Sized>(self, controller: &mut C) {
        match self {
            Self::BeginLoad => controller.begin_load(),
            Self::Release => controller.release(),
        }
    }

    /// Returns a short lowercase label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BeginLoad => "begin_load",
            Self::Release => "release",
        }
    }
}

/// Receives lifecycle commands for one backing resource.
///
/// Both methods are fire-and-forget and must be idempotent: `begin_load`
/// while already loading and `release` while already unloaded are no-ops.
/// If several schedulers share one controller, serializing their commands
/// is the controller's job.
pub trait ResourceController {
    /// Starts loading the resource. Must not block on completion.
    fn begin_load(&mut self);

    /// Releases the resource.
    fn release(&mut self);
}

impl<T: ResourceController + ?Sized> ResourceController for &mut T {
    fn begin_load(&mut self) {
        (**self).begin_load();
    }

    fn release(&mut self) {
        (**self).release();
    }
}

impl<T: ResourceController + ?Sized> ResourceController for Box<T> {
    fn begin_load(&mut self) {
        (**self).begin_load();
    }

    fn release(&mut self) {
        (**self).release();
    }
}

/// A [`ResourceController`] for subtrees with no backing resource.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoResource;

impl ResourceController for NoResource {
    fn begin_load(&mut self) {}

    fn release(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        loads: u32,
        releases: u32,
    }

    impl ResourceController for Counter {
        fn begin_load(&mut self) {
            self.loads += 1;
        }

        fn release(&mut self) {
            self.releases += 1;
        }
    }

    #[test]
    fn command_issue_dispatches() {
        let mut c = Counter::default();
        ResourceCommand::BeginLoad.issue(&mut c);
        ResourceCommand::Release.issue(&mut c);
        ResourceCommand::Release.issue(&mut c);
        assert_eq!((c.loads, c.releases), (1, 2));
    }

    #[test]
    fn boxed_and_borrowed_controllers_forward() {
        let mut boxed: Box<dyn ResourceController> = Box::new(Counter::default());
        ResourceCommand::BeginLoad.issue(&mut boxed);

        let mut c = Counter::default();
        {
            let mut borrowed = &mut c;
            ResourceCommand::BeginLoad.issue(&mut borrowed);
        }
        assert_eq!(c.loads, 1);
    }

    #[test]
    fn only_unloaded_is_not_loaded() {
        assert!(!ResourcePhase::Unloaded.is_loaded());
        assert!(ResourcePhase::Prefetching.is_loaded());
        assert!(ResourcePhase::Active.is_loaded());
        assert!(ResourcePhase::Idle.is_loaded());
        assert_eq!(ResourcePhase::default(), ResourcePhase::Unloaded);
    }
}
