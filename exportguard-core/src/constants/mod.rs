//! Constants for the Export Limiter Core
//!
//! Centralised numeric values used by the ring buffer, the signal store and
//! the feedback controller. Every value carries its unit in the name.
//!
//! ## Organization
//!
//! - **Buffers**: record layout and backing block sizes
//! - **Control**: controller gains, deadband and hysteresis
//! - **Time**: tick period, windows and command spacing

/// Record layout and backing block sizes.
pub mod buffers;

/// Feedback controller gains and thresholds.
pub mod control;

/// Time-related constants for windows and command spacing.
pub mod time;

pub use buffers::{
    DEFAULT_BLOCK_SIZE, HEADER_SIZE, SAMPLE_SIZE, MAX_CHANNELS, DEBUG_RESET_LEN,
};

pub use control::{
    DEADBAND_W, INCREASE_GAIN, LARGE_DEFICIT_W, LARGE_DEFICIT_GAIN,
    SMALL_DEFICIT_GAIN, HYSTERESIS_W, CHANNEL_SEARCH_STEP_W,
};

pub use time::{
    MS_PER_SECOND, CONTROL_PERIOD_MS, DEFAULT_WINDOW_MS, MIN_COMMAND_INTERVAL_MS,
};
