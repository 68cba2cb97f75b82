// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time-keyed activation modes.
//!
//! A [`RangeTable`] partitions `[0, ∞)` into half-open intervals, each
//! starting at a [`TimeRange::start`] and carrying a [`Mode`]. The mode in
//! force at `t` is the mode of the last entry whose start is `<= t`; before
//! the first entry the subtree is [`Mode::Suppressed`].
//!
//! Tables are immutable once built and share their storage, so cloning one
//! to back several schedulers is cheap.

use alloc::sync::Arc;
use alloc::vec::Vec;

/// How a gated subtree behaves while a range is in force.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    /// Rendered every frame at the clock time; the backing resource is needed.
    Continuous,
    /// Not rendered; the backing resource may be released after the idle
    /// grace period.
    Suppressed,
    /// Rendered every frame, but always evaluated at the frozen
    /// `render_time` instead of the clock time. The backing resource is
    /// needed.
    Once {
        /// Local time the subtree is evaluated at while the range is in force.
        render_time: f64,
    },
}

impl Mode {
    /// Returns `true` if the subtree is drawn (and its resource needed) in
    /// this mode.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        match self {
            Self::Continuous | Self::Once { .. } => true,
            Self::Suppressed => false,
        }
    }

    /// Returns a short lowercase label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Suppressed => "suppressed",
            Self::Once { .. } => "once",
        }
    }
}

/// A single `(start, mode)` entry of a [`RangeTable`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeRange {
    /// Time (seconds) at which this range takes effect.
    pub start: f64,
    /// Mode in force from `start` until the next entry.
    pub mode: Mode,
}

impl TimeRange {
    /// Creates an entry with the given start time and mode.
    #[inline]
    #[must_use]
    pub const fn new(start: f64, mode: Mode) -> Self {
        Self { start, mode }
    }

    /// A [`Mode::Continuous`] range starting at `start`.
    #[inline]
    #[must_use]
    pub const fn continuous(start: f64) -> Self {
        Self::new(start, Mode::Continuous)
    }

    /// A [`Mode::Suppressed`] range starting at `start`.
    #[inline]
    #[must_use]
    pub const fn suppressed(start: f64) -> Self {
        Self::new(start, Mode::Suppressed)
    }

    /// A [`Mode::Once`] range starting at `start`, frozen at `render_time`.
    #[inline]
    #[must_use]
    pub const fn once(start: f64, render_time: f64) -> Self {
        Self::new(start, Mode::Once { render_time })
    }
}

/// Errors from [`RangeTable::new`].
#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum RangeTableError {
    /// No entries were supplied.
    #[error("range table has no entries")]
    Empty,
    /// An entry does not start strictly after its predecessor.
    #[error("range {index} starts at {start}, not after the previous start {previous}")]
    NotIncreasing {
        /// Index of the offending entry.
        index: usize,
        /// Start time of the preceding entry.
        previous: f64,
        /// Start time of the offending entry.
        start: f64,
    },
    /// An entry starts at a negative or non-finite time.
    #[error("range {index} has invalid start time {start}")]
    InvalidStart {
        /// Index of the offending entry.
        index: usize,
        /// The rejected start time.
        start: f64,
    },
}

/// Ordered, immutable sequence of [`TimeRange`] entries.
///
/// Start times are finite, non-negative and strictly increasing. Lookups are
/// binary searches over the start times.
#[derive(Clone, Debug)]
pub struct RangeTable {
    entries: Arc<[TimeRange]>,
    /// Start times of active entries, ascending.
    active_starts: Arc<[f64]>,
}

impl RangeTable {
    /// Builds a table from entries sorted by start time.
    ///
    /// # Errors
    ///
    /// Returns [`RangeTableError::Empty`] for no entries,
    /// [`RangeTableError::InvalidStart`] for a negative or non-finite start,
    /// and [`RangeTableError::NotIncreasing`] if a start does not strictly
    /// exceed the previous one.
    pub fn new(entries: impl IntoIterator<Item = TimeRange>) -> Result<Self, RangeTableError> {
        let entries: Vec<TimeRange> = entries.into_iter().collect();
        if entries.is_empty() {
            return Err(RangeTableError::Empty);
        }

        let mut previous: Option<f64> = None;
        for (index, range) in entries.iter().enumerate() {
            let start = range.start;
            if !start.is_finite() || start < 0.0 {
                return Err(RangeTableError::InvalidStart { index, start });
            }
            if let Some(previous) = previous {
                if start <= previous {
                    return Err(RangeTableError::NotIncreasing {
                        index,
                        previous,
                        start,
                    });
                }
            }
            previous = Some(start);
        }

        let active_starts: Vec<f64> = entries
            .iter()
            .filter(|r| r.mode.is_active())
            .map(|r| r.start)
            .collect();

        Ok(Self {
            entries: entries.into(),
            active_starts: active_starts.into(),
        })
    }

    /// Returns the entries in ascending start order.
    #[must_use]
    pub fn entries(&self) -> &[TimeRange] {
        &self.entries
    }

    /// Returns the number of entries (always at least one).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; a table cannot be built empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Start time of the first entry.
    #[must_use]
    pub fn first_start(&self) -> f64 {
        self.entries.first().map_or(0.0, |r| r.start)
    }

    /// Index of the entry in force at `t`, or `None` if `t` precedes the
    /// first entry.
    #[must_use]
    pub fn index_at(&self, t: f64) -> Option<usize> {
        // NaN compares false everywhere and lands before the first entry.
        let after = self.entries.partition_point(|r| r.start <= t);
        after.checked_sub(1)
    }

    /// Mode in force at `t`.
    #[must_use]
    pub fn mode_at(&self, t: f64) -> Mode {
        self.index_at(t)
            .map_or(Mode::Suppressed, |i| self.entries[i].mode)
    }

    /// Smallest start time of an active entry strictly after `after`.
    #[must_use]
    pub fn next_active_start(&self, after: f64) -> Option<f64> {
        let i = self.active_starts.partition_point(|&s| s <= after);
        self.active_starts.get(i).copied()
    }
}
