//! Collaborator Traits
//!
//! The core is wired to the outside world through three small capability
//! traits instead of one inverter class that does everything:
//!
//! - [`time`] - monotonic millisecond clock
//! - [`actuator`] - inverter reachability, channel power and limit commands
//! - [`config`] - read-only configuration snapshots
//!
//! Each one is implemented independently and handed to the component that
//! needs it, so tests can replace any of them with a scripted fake.

pub mod actuator;
pub mod config;
pub mod time;

pub use actuator::Actuator;
pub use config::ConfigurationProvider;
pub use time::TimeSource;
