// Copyright 2026 the Timegate Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Playback clock feeding the schedulers.
//!
//! [`PlaybackClock`] maintains a smoothed affine mapping from host time to
//! playback time:
//!
//! ```text
//! playback_time = rate * host_time + offset
//! ```
//!
//! Rate and offset are updated smoothly (via EMA) each time a new observation
//! is fed in, e.g. from an audio device position, avoiding jitter while
//! tracking drift.
//!
//! Schedulers expect playback time to be non-decreasing between seeks.
//! Smoothing corrections can step the raw mapping backward, so
//! [`now`](PlaybackClock::now) clamps its readings to never go below the
//! previous one. An explicit [`seek`](PlaybackClock::seek) lifts that floor.

/// A smoothed, monotonic mapping from host time (ticks) to playback time
/// (seconds).
///
/// Feed observations via [`update`](Self::update) and read the clock via
/// [`now`](Self::now).
#[derive(Clone, Debug)]
pub struct PlaybackClock {
    /// Current estimated rate (playback seconds per host tick).
    rate: f64,
    /// Current estimated offset (playback seconds).
    offset: f64,
    /// EMA smoothing factor for rate correction (0.0–1.0).
    rate_alpha: f64,
    /// EMA smoothing factor for offset correction (0.0–1.0).
    offset_alpha: f64,
    /// Whether at least one observation has been fed.
    initialized: bool,
    /// Last host time observation (for rate estimation).
    last_host: u64,
    /// Last playback time observation.
    last_playback: f64,
    /// Largest reading handed out by `now` since the last seek.
    floor: Option<f64>,
}

impl PlaybackClock {
    /// Creates a new clock with the given initial rate and EMA smoothing
    /// factors.
    ///
    /// `initial_rate` is in playback-seconds per host-tick (e.g. for
    /// nanosecond ticks at normal speed, this would be `1e-9`).
    #[must_use]
    pub fn new(initial_rate: f64, rate_alpha: f64, offset_alpha: f64) -> Self {
        Self {
            rate: initial_rate,
            offset: 0.0,
            rate_alpha,
            offset_alpha,
            initialized: false,
            last_host: 0,
            last_playback: 0.0,
            floor: None,
        }
    }

    /// Creates a clock that starts at playback time `0.0` at host time
    /// `host_ticks`, for nanosecond ticks at normal speed.
    #[must_use]
    pub fn starting_at(host_ticks: u64) -> Self {
        let mut clock = Self::new(1e-9, 0.1, 0.1);
        clock.update(host_ticks, 0.0);
        clock
    }

    /// Queries the raw smoothed playback time at the given host time.
    ///
    /// Returns `None` if no observations have been fed yet.
    #[must_use]
    pub fn playback_time_at(&self, host_ticks: u64) -> Option<f64> {
        if !self.initialized {
            return None;
        }
        Some(self.rate * host_ticks as f64 + self.offset)
    }

    /// Reads the clock at the given host time.
    ///
    /// Never returns less than the previous reading since the last
    /// [`seek`](Self::seek). Returns `None` if no observations have been fed
    /// yet.
    pub fn now(&mut self, host_ticks: u64) -> Option<f64> {
        let raw = self.playback_time_at(host_ticks)?;
        let reading = self.floor.map_or(raw, |floor| raw.max(floor));
        self.floor = Some(reading);
        Some(reading)
    }

    /// Feeds an observation of `(host_time, playback_time)` to update the
    /// mapping.
    ///
    /// On the first call, this sets the mapping exactly. Subsequent calls
    /// smooth the rate and offset via EMA.
    pub fn update(&mut self, host_ticks: u64, playback_time: f64) {
        if !self.initialized {
            // offset = playback_time - rate * host_ticks
            self.offset = playback_time - self.rate * host_ticks as f64;
            self.last_host = host_ticks;
            self.last_playback = playback_time;
            self.initialized = true;
            return;
        }

        let dt_host = host_ticks.saturating_sub(self.last_host);
        if dt_host > 0 {
            let dt_playback = playback_time - self.last_playback;
            let observed_rate = dt_playback / dt_host as f64;
            self.rate = self.rate_alpha * observed_rate + (1.0 - self.rate_alpha) * self.rate;
        }

        let predicted = self.rate * host_ticks as f64 + self.offset;
        let offset_error = playback_time - predicted;
        self.offset += self.offset_alpha * offset_error;

        self.last_host = host_ticks;
        self.last_playback = playback_time;
    }

    /// Jumps the clock so that `host_ticks` maps exactly to `playback_time`,
    /// keeping the current rate.
    ///
    /// The next [`now`](Self::now) reading may be earlier than the previous
    /// one; schedulers see it as a seek.
    pub fn seek(&mut self, host_ticks: u64, playback_time: f64) {
        self.offset = playback_time - self.rate * host_ticks as f64;
        self.last_host = host_ticks;
        self.last_playback = playback_time;
        self.initialized = true;
        self.floor = None;
    }

    /// Resets all accumulated state, requiring new observations before
    /// readings return values.
    pub fn reset(&mut self) {
        self.offset = 0.0;
        self.initialized = false;
        self.last_host = 0;
        self.last_playback = 0.0;
        self.floor = None;
    }
}
