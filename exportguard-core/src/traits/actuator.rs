//! Inverter Actuator Abstraction
//!
//! The controller never talks to the radio link or the inverter protocol
//! directly. Everything it needs from the inverter goes through this trait,
//! so a test can script reachability, channel readings and command results.

use crate::errors::ActuatorError;

/// Capability to read and curtail an inverter
///
/// All calls are synchronous and may fail at any time. Failures are never
/// fatal: the controller skips the action and retries on the next tick.
pub trait Actuator {
    /// Whether the inverter currently answers
    fn is_reachable(&mut self) -> bool;

    /// Apply an absolute, non-persistent power limit in watts
    ///
    /// `Ok(())` means the inverter accepted the command.
    fn send_limit(&mut self, limit: f32) -> Result<(), ActuatorError>;

    /// Fill `powers` with the instantaneous DC power of each channel
    ///
    /// Returns the number of channels written. Channels without a configured
    /// module are skipped, so the count may be lower than `powers.len()`.
    fn fetch_channel_power(&mut self, powers: &mut [f32]) -> usize;
}

impl<A: Actuator + ?Sized> Actuator for &mut A {
    fn is_reachable(&mut self) -> bool {
        (**self).is_reachable()
    }

    fn send_limit(&mut self, limit: f32) -> Result<(), ActuatorError> {
        (**self).send_limit(limit)
    }

    fn fetch_channel_power(&mut self, powers: &mut [f32]) -> usize {
        (**self).fetch_channel_power(powers)
    }
}
