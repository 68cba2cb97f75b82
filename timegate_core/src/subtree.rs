// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render subtree capability.
//!
//! The scheduler never sees concrete scene nodes. Whatever it gates only has
//! to implement [`RenderSubtree`].

use alloc::boxed::Box;

/// Something that can be drawn for a frame or skipped.
pub trait RenderSubtree {
    /// Draws the subtree evaluated at local time `time` (seconds).
    fn render(&mut self, time: f64);

    /// Called instead of [`render`](Self::render) on frames where the
    /// subtree is gated off.
    fn skip(&mut self) {}
}

impl<T: RenderSubtree + ?Sized> RenderSubtree for &mut T {
    fn render(&mut self, time: f64) {
        (**self).render(time);
    }

    fn skip(&mut self) {
        (**self).skip();
    }
}

impl<T: RenderSubtree + ?Sized> RenderSubtree for Box<T> {
    fn render(&mut self, time: f64) {
        (**self).render(time);
    }

    fn skip(&mut self) {
        (**self).skip();
    }
}

/// Per-frame outcome of an evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RenderDecision {
    /// Draw the subtree at the given local time.
    Render {
        /// Local time to evaluate the subtree at: the clock time for
        /// [`Mode::Continuous`](crate::range::Mode::Continuous), the frozen
        /// time for [`Mode::Once`](crate::range::Mode::Once).
        time: f64,
    },
    /// Do not draw the subtree this frame.
    Skip,
}

impl RenderDecision {
    /// Returns `true` for [`RenderDecision::Render`].
    #[inline]
    #[must_use]
    pub const fn is_render(self) -> bool {
        matches!(self, Self::Render { .. })
    }

    /// Forwards the decision to `subtree`.
    #[inline]
    pub fn apply<S: RenderSubtree + ?Sized>(self, subtree: &mut S) {
        match self {
            Self::Render { time } => subtree.render(time),
            Self::Skip => subtree.skip(),
        }
    }
}
