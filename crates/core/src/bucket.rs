//! Hour buckets and time-range windowing.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, DurationRound, Utc};

/// Truncates a timestamp to the start of its UTC hour.
#[must_use]
pub fn truncate_to_hour(ts: DateTime<Utc>) -> DateTime<Utc> {
    // duration_trunc only fails for out-of-range timestamps
    ts.duration_trunc(Duration::hours(1)).unwrap_or(ts)
}

/// Converts a day count to a `Duration`, failing where chrono would panic.
///
/// # Errors
/// Returns an error if `days` is outside chrono's representable range.
pub fn checked_days(days: i64) -> Result<Duration> {
    Duration::try_days(days).ok_or_else(|| anyhow!("{days} days is out of range"))
}

/// Converts an hour count to a `Duration`, failing where chrono would panic.
///
/// # Errors
/// Returns an error if `hours` is outside chrono's representable range.
pub fn checked_hours(hours: i64) -> Result<Duration> {
    Duration::try_hours(hours).ok_or_else(|| anyhow!("{hours} hours is out of range"))
}

/// A closed time range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    #[must_use]
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Inclusive on both ends.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Splits the range into consecutive half-open windows of `window` length.
    ///
    /// Each window is `[start, start + window)`; the last one is clipped to
    /// `end`. Adjacent windows share a boundary instant but never an hour.
    #[must_use]
    pub fn partition(&self, window: Duration) -> Vec<TimeRange> {
        if self.is_empty() || window <= Duration::zero() {
            return Vec::new();
        }

        let mut windows = Vec::new();
        let mut current = self.start;
        while current < self.end {
            let next = (current + window).min(self.end);
            windows.push(TimeRange::new(current, next));
            current = next;
        }
        windows
    }
}
