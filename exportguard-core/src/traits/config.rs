//! Configuration Provider Abstraction

use crate::config::LimiterConfig;

/// Read-only source of configuration snapshots
///
/// The controller asks for a fresh snapshot on every tick and never writes
/// configuration back.
pub trait ConfigurationProvider {
    /// Current configuration snapshot
    fn snapshot(&self) -> LimiterConfig;
}

impl ConfigurationProvider for LimiterConfig {
    fn snapshot(&self) -> LimiterConfig {
        *self
    }
}

impl<F: Fn() -> LimiterConfig> ConfigurationProvider for F {
    fn snapshot(&self) -> LimiterConfig {
        self()
    }
}
