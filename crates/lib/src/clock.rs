//! Time provider abstraction
//!
//! Every timestamp a store writes (`createdAt`, `updatedAt`, `lastAccessedAt`,
//! history entries, expiry sweeps) comes from a [`Clock`]. Production code
//! uses [`SystemClock`]; tests inject a [`FixedClock`] so that timestamps are
//! deterministic and strictly increasing.
//!
//! # Example
//!
//! ```
//! use dossier::{Clock, FixedClock};
//!
//! let clock = FixedClock::new(1_000);
//! let first = clock.now();
//! let second = clock.now();
//! assert!(second > first);
//! ```

use std::fmt::Debug;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, TimeZone, Utc};

/// A time provider for record timestamps.
pub trait Clock: Send + Sync + Debug {
    /// Returns the current time as milliseconds since Unix epoch.
    fn now_millis(&self) -> i64;

    /// Returns the current time as a UTC datetime.
    ///
    /// Derived from [`Clock::now_millis`] so both views advance together.
    fn now(&self) -> DateTime<Utc> {
        millis_to_datetime(self.now_millis())
    }
}

/// Convert epoch milliseconds into a UTC datetime, clamping out-of-range input
/// to the epoch.
pub fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Production clock using real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock with auto-advancing time.
///
/// Each `now_millis()` call returns the current value and then advances it by
/// one millisecond, so two consecutive writes never share a timestamp. Use
/// [`FixedClock::hold`] to freeze it, and [`FixedClock::advance`] to jump
/// forward (for example past a file's expiry).
pub struct FixedClock {
    state: Mutex<FixedClockState>,
}

struct FixedClockState {
    millis: i64,
    held: bool,
}

/// RAII guard that freezes a [`FixedClock`] while held.
pub struct ClockHold<'a>(&'a FixedClock);

impl Drop for ClockHold<'_> {
    fn drop(&mut self) {
        self.0.state.lock().unwrap().held = false;
    }
}

impl FixedClock {
    /// Create a new fixed clock with the given initial time in milliseconds.
    pub fn new(millis: i64) -> Self {
        Self {
            state: Mutex::new(FixedClockState {
                millis,
                held: false,
            }),
        }
    }

    /// Hold the clock, preventing auto-advance until the guard is dropped.
    pub fn hold(&self) -> ClockHold<'_> {
        self.state.lock().unwrap().held = true;
        ClockHold(self)
    }

    /// Advance the clock by the given number of milliseconds.
    pub fn advance(&self, ms: i64) {
        self.state.lock().unwrap().millis += ms;
    }

    /// Set the clock to a specific time in milliseconds.
    pub fn set(&self, ms: i64) {
        self.state.lock().unwrap().millis = ms;
    }

    /// Get the current time without advancing.
    pub fn get(&self) -> i64 {
        self.state.lock().unwrap().millis
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        let mut state = self.state.lock().unwrap();
        if state.held {
            state.millis
        } else {
            let t = state.millis;
            state.millis += 1;
            t
        }
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        // 2024-01-01 00:00:00 UTC
        Self::new(1_704_067_200_000)
    }
}

impl Debug for FixedClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("FixedClock")
            .field("millis", &state.millis)
            .field("held", &state.held)
            .finish()
    }
}
