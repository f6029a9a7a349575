//! # Adaptive Poll Cadence
//!
//! Follow mode polls for new events. A busy stream is polled at the minimum
//! interval; every empty poll doubles the wait up to the maximum.
//!
//! ```text
//! outcome          next interval
//! first attempt    min
//! >= 1 new event   min
//! 0 new events     min(max, previous * 2)
//! ```
//!
//! [`next_interval`] is the pure rule. [`PollState`] carries the history it
//! needs and is shared by the `entries --follow` loop (which sleeps) and the
//! detail view's liveness timer (which re-arms a timer message).

use std::time::Duration;

use crate::core::model::DetailEntry;

pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(16);

/// What the previous poll produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing has been polled yet.
    First,
    /// The poll returned this many new entries.
    Entries(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    pub last_seen_timestamp: Option<i64>,
    pub current_interval: Duration,
    pub min_interval: Duration,
    pub max_interval: Duration,
}

impl Default for PollState {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL, DEFAULT_MAX_INTERVAL)
    }
}

/// Delay before the next poll.
pub fn next_interval(state: &PollState, outcome: PollOutcome) -> Duration {
    match outcome {
        PollOutcome::First | PollOutcome::Entries(1..) => state.min_interval,
        PollOutcome::Entries(0) => state
            .current_interval
            .saturating_mul(2)
            .min(state.max_interval)
            .max(state.min_interval),
    }
}

impl PollState {
    /// A `max` below `min` is raised to `min`.
    pub fn new(min_interval: Duration, max_interval: Duration) -> Self {
        Self {
            last_seen_timestamp: None,
            current_interval: min_interval,
            min_interval,
            max_interval: max_interval.max(min_interval),
        }
    }

    /// Apply `outcome` and return the delay before the next attempt.
    pub fn advance(&mut self, outcome: PollOutcome) -> Duration {
        self.current_interval = next_interval(self, outcome);
        self.current_interval
    }

    /// Record a poll result: remembers the newest timestamp and advances.
    pub fn record(&mut self, entries: &[DetailEntry]) -> Duration {
        self.observe(entries);
        self.advance(PollOutcome::Entries(entries.len()))
    }

    /// Remember the newest timestamp in `entries` without advancing.
    pub fn observe(&mut self, entries: &[DetailEntry]) {
        if let Some(newest) = entries.iter().map(|e| e.timestamp).max() {
            self.last_seen_timestamp = Some(
                self.last_seen_timestamp
                    .map_or(newest, |seen| seen.max(newest)),
            );
        }
    }

    pub fn reset(&mut self) {
        self.current_interval = self.min_interval;
    }
}
