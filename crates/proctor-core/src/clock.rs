//! Deadline arithmetic and the injectable time source.
//!
//! Deadlines are always recomputed from the stored start instant and time
//! limit. Nothing here keeps state of its own except [`ManualClock`].

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Remaining time of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRemaining {
    Unlimited,
    Limited(Duration),
}

impl TimeRemaining {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, TimeRemaining::Limited(d) if d.is_zero())
    }

    /// Whole seconds left, or `None` when untimed.
    pub fn as_secs(&self) -> Option<u64> {
        match self {
            TimeRemaining::Unlimited => None,
            TimeRemaining::Limited(d) => Some(d.as_secs()),
        }
    }
}

/// The instant a timed session ends.
pub fn deadline(
    started_at: DateTime<Utc>,
    time_limit: Option<chrono::Duration>,
) -> Option<DateTime<Utc>> {
    time_limit.map(|limit| started_at + limit)
}

/// `max(0, limit - (now - started_at))`, or unlimited when untimed.
pub fn time_remaining(
    started_at: DateTime<Utc>,
    time_limit: Option<chrono::Duration>,
    now: DateTime<Utc>,
) -> TimeRemaining {
    match deadline(started_at, time_limit) {
        None => TimeRemaining::Unlimited,
        Some(end) => TimeRemaining::Limited((end - now).to_std().unwrap_or(Duration::ZERO)),
    }
}

/// Whether `now` is at or beyond the deadline.
pub fn is_past_deadline(
    started_at: DateTime<Utc>,
    time_limit: Option<chrono::Duration>,
    now: DateTime<Utc>,
) -> bool {
    deadline(started_at, time_limit).is_some_and(|end| now >= end)
}
