//! Daily monitoring window
//!
//! Markets for TSA passenger counts move when the official number lands,
//! so monitoring runs in a fixed local-time window each weekday. Times are
//! expressed in a fixed UTC offset configured alongside the window.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};
use std::time::Duration;

/// Poll cadence while the window is open
pub const ACTIVE_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// A recurring local-time window
#[derive(Debug, Clone)]
pub struct MonitorWindow {
    start: NaiveTime,
    end: NaiveTime,
    offset: FixedOffset,
    weekdays_only: bool,
    /// Poll cadence while waiting for the window to open
    pub idle_poll_interval: Duration,
}

impl MonitorWindow {
    /// Create a window from local start/end times and a UTC offset in hours
    ///
    /// Returns `None` when the offset is out of range or the window is
    /// empty (start not before end).
    pub fn new(
        start: NaiveTime,
        end: NaiveTime,
        utc_offset_hours: i32,
        weekdays_only: bool,
        idle_poll_interval: Duration,
    ) -> Option<Self> {
        if start >= end {
            return None;
        }
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600)?;
        Some(Self {
            start,
            end,
            offset,
            weekdays_only,
            idle_poll_interval,
        })
    }

    /// Whether the instant falls inside the window (endpoints inclusive)
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let local = now.with_timezone(&self.offset);
        if self.weekdays_only && local.weekday().number_from_monday() > 5 {
            return false;
        }
        let t = local.time();
        t >= self.start && t <= self.end
    }

    /// Local calendar date of the instant, for market discovery
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// Poll cadence appropriate for the instant
    pub fn poll_interval(&self, now: DateTime<Utc>) -> Duration {
        if self.contains(now) {
            ACTIVE_POLL_INTERVAL
        } else {
            self.idle_poll_interval
        }
    }

    /// Seconds of window remaining, zero when outside
    pub fn seconds_remaining(&self, now: DateTime<Utc>) -> u64 {
        if !self.contains(now) {
            return 0;
        }
        let t = now.with_timezone(&self.offset).time();
        let end = self.end.num_seconds_from_midnight() as i64;
        let cur = t.num_seconds_from_midnight() as i64;
        (end - cur).max(0) as u64
    }
}
