//! Limiter configuration snapshot
//!
//! The core never stores configuration. A
//! [`ConfigurationProvider`](crate::traits::ConfigurationProvider) hands the
//! controller a fresh copy of this struct on every tick.
//!
//! ```rust
//! use exportguard_core::config::LimiterConfig;
//!
//! let config = LimiterConfig::default()
//!     .with_limit_enabled(true)
//!     .with_target(0.0)
//!     .with_power_range(100.0, 800.0)
//!     .with_feed_in_level(30);
//!
//! assert!(config.curtailment_active());
//! assert!(config.validate().is_ok());
//! ```

use crate::constants::DEFAULT_WINDOW_MS;
use crate::errors::ConfigError;
use crate::time::Timestamp;

/// Largest accepted maximum power (W)
pub const MAX_POWER_CEILING_W: f32 = 3000.0;

/// Largest accepted minimum power (W)
pub const MIN_POWER_CEILING_W: f32 = 500.0;

/// Accepted target range (W)
pub const TARGET_RANGE_W: (f32, f32) = (-100.0, 300.0);

/// Read-only settings consumed by the controller
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LimiterConfig {
    /// Grid and generation meters are polled
    pub measurement_enabled: bool,

    /// Controller may curtail the inverter
    pub limit_enabled: bool,

    /// Grid power the controller steers towards (W, positive = import)
    pub target: f32,

    /// Minimum inverter output (W)
    pub min_power: f32,

    /// Maximum inverter output, the upper clamp of every limit (W)
    pub max_power: f32,

    /// Where inside the windowed [min, max] the grid reading is taken (percent)
    ///
    /// The generation reading uses `100 - feed_in_level`.
    pub feed_in_level: u8,

    /// Trailing window for grid queries (ms, 0 = default)
    pub grid_window_ms: Timestamp,

    /// Trailing window for generation queries (ms, 0 = default)
    pub generation_window_ms: Timestamp,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            measurement_enabled: true,
            // Curtailment must be switched on deliberately
            limit_enabled: false,
            target: 0.0,
            min_power: 0.0,
            max_power: 800.0,
            feed_in_level: 50,
            grid_window_ms: 0,
            generation_window_ms: 0,
        }
    }
}

impl LimiterConfig {
    /// Both enable flags are set
    pub fn curtailment_active(&self) -> bool {
        self.measurement_enabled && self.limit_enabled
    }

    /// Blend factor for grid (`false`) or generation (`true`) readings, in 0.0..=1.0
    pub fn blend_factor(&self, generation: bool) -> f32 {
        let factor = self.feed_in_level.min(100) as f32 / 100.0;
        if generation {
            1.0 - factor
        } else {
            factor
        }
    }

    /// Grid window with the 0 = default rule applied
    pub fn grid_window(&self) -> Timestamp {
        if self.grid_window_ms == 0 {
            DEFAULT_WINDOW_MS
        } else {
            self.grid_window_ms
        }
    }

    /// Generation window with the 0 = default rule applied
    pub fn generation_window(&self) -> Timestamp {
        if self.generation_window_ms == 0 {
            DEFAULT_WINDOW_MS
        } else {
            self.generation_window_ms
        }
    }

    /// Turn limiting on or off
    pub fn with_limit_enabled(mut self, enabled: bool) -> Self {
        self.limit_enabled = enabled;
        self
    }

    /// Turn meter polling on or off
    pub fn with_measurement_enabled(mut self, enabled: bool) -> Self {
        self.measurement_enabled = enabled;
        self
    }

    /// Set the grid power target (W)
    pub fn with_target(mut self, target: f32) -> Self {
        self.target = target;
        self
    }

    /// Set the inverter's limit range (W)
    pub fn with_power_range(mut self, min_power: f32, max_power: f32) -> Self {
        self.min_power = min_power;
        self.max_power = max_power;
        self
    }

    /// Set the blend position in percent
    pub fn with_feed_in_level(mut self, percent: u8) -> Self {
        self.feed_in_level = percent;
        self
    }

    /// Set the initial min/max windows (ms)
    pub fn with_windows(mut self, grid_ms: Timestamp, generation_ms: Timestamp) -> Self {
        self.grid_window_ms = grid_ms;
        self.generation_window_ms = generation_ms;
        self
    }

    /// Check the ranges the administration interface accepts
    ///
    /// Power ranges only matter while curtailment is enabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_in_level > 100 {
            return Err(ConfigError::Invalid { reason: "feed-in level above 100 percent" });
        }

        if !self.limit_enabled {
            return Ok(());
        }

        if !(self.max_power > 0.0 && self.max_power <= MAX_POWER_CEILING_W) {
            return Err(ConfigError::Invalid { reason: "max power must be in (0, 3000]" });
        }
        if !(self.min_power >= 0.0 && self.min_power <= MIN_POWER_CEILING_W) {
            return Err(ConfigError::Invalid { reason: "min power must be in [0, 500]" });
        }
        if self.min_power > self.max_power {
            return Err(ConfigError::Invalid { reason: "min power above max power" });
        }
        if !(self.target >= TARGET_RANGE_W.0 && self.target <= TARGET_RANGE_W.1) {
            return Err(ConfigError::Invalid { reason: "target must be in [-100, 300]" });
        }

        Ok(())
    }

    /// Parse and validate a JSON snapshot; missing fields take defaults
    #[cfg(feature = "std")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_e| {
            log_warn!("Configuration rejected: {}", _e);
            ConfigError::Invalid { reason: "malformed JSON snapshot" }
        })?;
        config.validate()?;
        Ok(config)
    }
}
