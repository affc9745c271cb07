//! Core engine for ExportGuard, a zero-export limiter for small solar inverters
//!
//! Keeps a short history of grid and generation power in a fixed memory block
//! and curtails the inverter so the household feeds as little as possible
//! into the grid.
//!
//! Key constraints:
//! - One caller-supplied block bounds all history (4 KB on the device)
//! - No heap allocation in the ring buffer or the limit arithmetic
//! - A control tick never fails; problems are logged and reported
//!
//! The ring buffer, sample codec and limit arithmetic build without `std`.
//! The lock-protected store, the controller and the replay driver need the
//! default `std` feature.
//!
//! ```no_run
//! use exportguard_core::{Controller, LimiterConfig, SignalStore, SignalType};
//! use exportguard_core::time::MonotonicTime;
//! # use exportguard_core::{Actuator, ActuatorError};
//! # struct Inverter;
//! # impl Actuator for Inverter {
//! #     fn is_reachable(&mut self) -> bool { true }
//! #     fn send_limit(&mut self, _: f32) -> Result<(), ActuatorError> { Ok(()) }
//! #     fn fetch_channel_power(&mut self, _: &mut [f32]) -> usize { 0 }
//! # }
//! # let mut inverter = Inverter;
//!
//! let store = SignalStore::with_block(vec![0u8; 4096], MonotonicTime::new()).unwrap();
//! let config = LimiterConfig::default().with_limit_enabled(true);
//! let mut controller = Controller::new();
//!
//! // meter client
//! store.update(SignalType::GridPower, -120.0);
//!
//! // once per second
//! let report = controller.tick(&store, &mut inverter, &config);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod macros;

pub mod calculation;
pub mod config;
pub mod constants;
pub mod errors;
pub mod ring;
pub mod sample;
pub mod time;
pub mod traits;

#[cfg(feature = "std")]
pub mod controller;
#[cfg(feature = "std")]
pub mod replay;
#[cfg(feature = "std")]
pub mod store;

// Public API
pub use calculation::{Branch, BranchCounters, Tuning};
pub use config::LimiterConfig;
pub use errors::{ActuatorError, BufferError, BufferResult, ConfigError};
pub use ring::{DrainCursor, RingBuffer};
pub use sample::{Sample, SignalType};
pub use time::{ManualClock, Timestamp};
pub use traits::{Actuator, ConfigurationProvider, TimeSource};

#[cfg(feature = "std")]
pub use controller::{Controller, ControllerState, TickOutcome, TickReport};
#[cfg(feature = "std")]
pub use store::{DebugChannel, Export, SignalStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
