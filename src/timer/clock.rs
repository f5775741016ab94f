//! Wall-clock arithmetic for a running session.
//!
//! Everything here is recomputed from absolute timestamps, so a reading taken
//! after the process was suspended is as accurate as one taken every second.

use chrono::{DateTime, Duration, Utc};

use crate::models::DetoxSession;

/// Source of "now". Swapped for a controllable clock in tests.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTime;

impl TimeSource for SystemTime {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockReading {
    pub elapsed: Duration,
    pub remaining: Duration,
    pub progress: f64,
}

impl ClockReading {
    pub fn is_expired(&self) -> bool {
        self.remaining <= Duration::zero()
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining.num_milliseconds().max(0) as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClock {
    started_at: DateTime<Utc>,
    duration: Duration,
}

impl SessionClock {
    pub fn new(started_at: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            started_at,
            duration,
        }
    }

    pub fn for_session(session: &DetoxSession) -> Self {
        Self::new(session.started_at, session.duration.to_chrono())
    }

    pub fn read(&self, at: DateTime<Utc>) -> ClockReading {
        // A reference time before the start counts as no progress at all.
        let elapsed = (at - self.started_at).max(Duration::zero());
        let remaining = (self.duration - elapsed).max(Duration::zero());

        let total_ms = self.duration.num_milliseconds();
        let progress = if total_ms <= 0 {
            1.0
        } else {
            (elapsed.num_milliseconds() as f64 / total_ms as f64).clamp(0.0, 1.0)
        };

        ClockReading {
            elapsed,
            remaining,
            progress,
        }
    }
}

/// `"{h}h {m}m"` from one hour upwards, `"{m}m {s}s"` below.
pub fn format_remaining(remaining_ms: u64) -> String {
    let total_secs = remaining_ms / 1_000;
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {seconds}s")
    }
}
