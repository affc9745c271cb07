//! Feedback Controller Parameters
//!
//! All power values are in watts. The gains were tuned on a single-phase
//! micro inverter with a three-phase grid meter.

/// Half width of the dead band around the target (W).
///
/// Inside `target ± DEADBAND_W` the controller holds the current limit.
pub const DEADBAND_W: f32 = 10.0;

/// Fraction of the surplus added to the limit on the increase branch.
pub const INCREASE_GAIN: f32 = 0.75;

/// Deficit below the target that selects the generation-based decrease (W).
pub const LARGE_DEFICIT_W: f32 = 50.0;

/// Fraction of a large deficit removed from the measured generation.
pub const LARGE_DEFICIT_GAIN: f32 = 0.9;

/// Fraction of a small deficit removed from the current limit.
pub const SMALL_DEFICIT_GAIN: f32 = 0.8;

/// Minimum change of the limit before a new command is sent (W).
///
/// Smaller values make the inverter receive a command every period.
pub const HYSTERESIS_W: f32 = 15.0;

/// Step of the per-channel cap search in the asymmetry correction (W).
pub const CHANNEL_SEARCH_STEP_W: f32 = 1.0;
