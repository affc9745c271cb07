//! Time-Related Constants
//!
//! All durations are milliseconds of the injected monotonic clock.

use crate::time::Timestamp;

/// Milliseconds per second.
pub const MS_PER_SECOND: Timestamp = 1000;

/// Nominal controller tick period (ms).
pub const CONTROL_PERIOD_MS: Timestamp = MS_PER_SECOND;

/// Default trailing window for grid and generation queries (ms).
///
/// Twenty seconds covers several meter updates while still reacting to a
/// kettle being switched on.
pub const DEFAULT_WINDOW_MS: Timestamp = 20 * MS_PER_SECOND;

/// Minimum spacing between two accepted limit commands (ms).
///
/// The inverter needs several seconds to settle after a new limit.
pub const MIN_COMMAND_INTERVAL_MS: Timestamp = 10 * MS_PER_SECOND;
