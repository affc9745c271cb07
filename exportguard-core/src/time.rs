//! Clocks for the limiter
//!
//! Provides the timestamp type and the clock implementations:
//! - Manual clock (tests, offline replay)
//! - Monotonic clock (host builds)
//! - Scaled clock (accelerated replay against real elapsed time)

use core::sync::atomic::{AtomicU32, Ordering};

pub use crate::traits::TimeSource;

/// Timestamp in milliseconds since an arbitrary epoch (usually boot)
///
/// Stored as `u32` so a record fits in 10 bytes. The counter wraps after
/// about 49.7 days; compare timestamps through [`age`] or `wrapping_sub`.
pub type Timestamp = u32;

/// Milliseconds between `timestamp` and `now`, across a counter wrap
///
/// A timestamp less than half the counter range ahead of `now` is treated as
/// not yet old and has age 0.
pub const fn age(now: Timestamp, timestamp: Timestamp) -> Timestamp {
    let elapsed = now.wrapping_sub(timestamp);
    if elapsed > i32::MAX as Timestamp {
        0
    } else {
        elapsed
    }
}

/// Clock that only moves when told to
///
/// Shared by reference between the signal store and the controller, so a
/// single `advance` moves both.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicU32,
}

impl ManualClock {
    /// Clock stopped at `start`
    pub const fn new(start: Timestamp) -> Self {
        Self {
            now_ms: AtomicU32::new(start),
        }
    }

    /// Jump to an absolute time; earlier values are ignored
    pub fn set(&self, timestamp: Timestamp) {
        self.now_ms.fetch_max(timestamp, Ordering::Relaxed);
    }

    /// Move forward by `ms`, wrapping like the hardware counter
    pub fn advance(&self, ms: Timestamp) {
        self.now_ms.fetch_add(ms, Ordering::Relaxed);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Timestamp {
        self.now_ms.load(Ordering::Relaxed)
    }

    fn is_wall_clock(&self) -> bool {
        false
    }

    fn precision_ms(&self) -> u32 {
        1
    }
}

/// Monotonic time source (requires std)
///
/// Starts at 0 when constructed.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct MonotonicTime {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl MonotonicTime {
    /// Clock reading 0 now
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for MonotonicTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for MonotonicTime {
    fn now(&self) -> Timestamp {
        // truncation wraps like a hardware millisecond counter
        self.start.elapsed().as_millis() as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        true
    }

    fn precision_ms(&self) -> u32 {
        1
    }
}

/// Real elapsed time multiplied by a constant factor
///
/// Lets a recorded session run faster than real time while the controller
/// still sees its usual periods. A factor of 1.0 behaves like
/// [`MonotonicTime`].
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct ScaledClock {
    start: std::time::Instant,
    factor: f32,
}

#[cfg(feature = "std")]
impl ScaledClock {
    /// Clock running `factor` times real time; non-positive factors mean 1.0
    pub fn new(factor: f32) -> Self {
        Self {
            start: std::time::Instant::now(),
            factor: if factor > 0.0 { factor } else { 1.0 },
        }
    }

    /// Speed-up factor in use
    pub fn factor(&self) -> f32 {
        self.factor
    }
}

#[cfg(feature = "std")]
impl TimeSource for ScaledClock {
    fn now(&self) -> Timestamp {
        let elapsed = self.start.elapsed().as_millis() as f64;
        (elapsed * self.factor as f64) as Timestamp
    }

    fn is_wall_clock(&self) -> bool {
        self.factor == 1.0
    }

    fn precision_ms(&self) -> u32 {
        libm::ceilf(self.factor) as u32
    }
}
