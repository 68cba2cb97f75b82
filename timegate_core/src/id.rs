// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gated subtree identification.
//!
//! [`SubtreeId`] is a lightweight label attached to a scheduler so trace
//! events from several schedulers can be told apart. The host assigns them;
//! core never interprets the value.

use core::fmt;

/// Identifies the subtree a scheduler gates.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SubtreeId(pub u32);

impl fmt::Debug for SubtreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubtreeId({})", self.0)
    }
}

impl fmt::Display for SubtreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
