//! Time Source Abstraction
//!
//! The ring buffer windows and the controller's command spacing both read the
//! same monotonic millisecond clock. Injecting it through this trait keeps
//! every query replayable in tests.
//!
//! ## Common Implementations
//!
//! - `ManualClock`: settable clock for deterministic tests and replays
//! - `MonotonicTime`: `std::time::Instant` since construction
//! - `ScaledClock`: wall time elapsed times a speed-up factor

use crate::time::Timestamp;

/// Source of time for the system
///
/// ## Implementation Requirements
///
/// - `now()` must never go backwards
/// - The epoch is arbitrary; only differences are used
/// - Timestamps are `u32` milliseconds and wrap after ~49 days; the core
///   compares them with wrapping arithmetic, so a wrap is harmless
///
/// ## Example Implementation
///
/// ```rust
/// use exportguard_core::traits::TimeSource;
/// use exportguard_core::time::Timestamp;
///
/// struct TickCounter {
///     ticks: Timestamp,
/// }
///
/// impl TimeSource for TickCounter {
///     fn now(&self) -> Timestamp {
///         self.ticks
///     }
///
///     fn is_wall_clock(&self) -> bool {
///         false
///     }
///
///     fn precision_ms(&self) -> u32 {
///         1
///     }
/// }
/// ```
pub trait TimeSource: Send {
    /// Get current timestamp in milliseconds
    fn now(&self) -> Timestamp;

    /// Check if this source follows real time (vs a simulated clock)
    fn is_wall_clock(&self) -> bool;

    /// Get precision in milliseconds
    fn precision_ms(&self) -> u32;
}

impl<T: TimeSource + Sync + ?Sized> TimeSource for &T {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }

    fn precision_ms(&self) -> u32 {
        (**self).precision_ms()
    }
}

#[cfg(feature = "std")]
impl<T: TimeSource + Sync + ?Sized> TimeSource for std::sync::Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }

    fn is_wall_clock(&self) -> bool {
        (**self).is_wall_clock()
    }

    fn precision_ms(&self) -> u32 {
        (**self).precision_ms()
    }
}
