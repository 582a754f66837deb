//! Lifecycle of voting rounds as a pure function of time.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use core::fmt;
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{SystemTime, UNIX_EPOCH},
};

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Voting window `start..=end`. The start is guaranteed to precede the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawTimeWindow"))]
pub struct TimeWindow {
    start: Timestamp,
    end: Timestamp,
}

#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawTimeWindow {
    start: Timestamp,
    end: Timestamp,
}

#[cfg(feature = "serde")]
impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = &'static str;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end).ok_or("voting window must start before it ends")
    }
}

impl TimeWindow {
    /// Creates a window. Returns `None` unless `start < end`.
    pub fn new(start: Timestamp, end: Timestamp) -> Option<Self> {
        if start < end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Returns the first second at which ballots are accepted.
    pub fn start(&self) -> Timestamp {
        self.start
    }

    /// Returns the last second at which ballots are accepted.
    pub fn end(&self) -> Timestamp {
        self.end
    }

    /// Classifies this window at the time `now`. Equivalent to [`classify()`].
    pub fn phase(&self, now: Timestamp) -> Phase {
        classify(self, now)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}..={}", self.start, self.end)
    }
}

/// Lifecycle phase of a voting round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Phase {
    /// Voting has not started yet.
    Pending,
    /// Ballots are accepted.
    Open,
    /// Voting has ended; tallies are final.
    Closed,
}

impl fmt::Display for Phase {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Pending => "pending",
            Self::Open => "open",
            Self::Closed => "closed",
        })
    }
}

/// Classifies a voting `window` at the time `now`.
///
/// Both window boundaries belong to the [`Phase::Open`] phase. The phase is never stored,
/// so it cannot drift from the clock.
pub fn classify(window: &TimeWindow, now: Timestamp) -> Phase {
    if now < window.start {
        Phase::Pending
    } else if now <= window.end {
        Phase::Open
    } else {
        Phase::Closed
    }
}

/// Source of the current time supplied by the host environment.
pub trait Clock {
    /// Returns the current Unix timestamp in seconds.
    fn now(&self) -> Timestamp;
}

impl<F: Fn() -> Timestamp> Clock for F {
    fn now(&self) -> Timestamp {
        self()
    }
}

/// [`Clock`] reading the system wall time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }
}

/// [`Clock`] that is advanced explicitly, e.g. from block timestamps of the hosting ledger.
///
/// Clones share the same underlying time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    /// Creates a clock showing `now`.
    pub fn new(now: Timestamp) -> Self {
        Self(Arc::new(AtomicU64::new(now)))
    }

    /// Sets the current time.
    pub fn set(&self, now: Timestamp) {
        self.0.store(now, Ordering::SeqCst);
    }

    /// Moves the clock forward by `seconds`.
    pub fn advance(&self, seconds: u64) {
        self.0.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.0.load(Ordering::SeqCst)
    }
}
