//! Common fixtures for the integration tests
//!
//! This module provides:
//! - A scripted inverter that records every command it receives
//! - Store fixtures sharing one manual clock
//! - Deterministic meter series in [`generators`]

#![allow(dead_code)]

use std::collections::VecDeque;

use exportguard_core::{
    constants::DEFAULT_BLOCK_SIZE,
    time::ManualClock,
    Actuator, ActuatorError, SignalStore,
};

pub mod generators;

/// Store over a default-sized heap block, reading `clock`
pub fn store(clock: &ManualClock) -> SignalStore<Vec<u8>, &ManualClock> {
    SignalStore::with_block(vec![0u8; DEFAULT_BLOCK_SIZE], clock).unwrap()
}

/// Store with room for exactly `slots` records
pub fn store_with_slots(clock: &ManualClock, slots: usize) -> SignalStore<Vec<u8>, &ManualClock> {
    let len = exportguard_core::constants::HEADER_SIZE + slots * exportguard_core::constants::SAMPLE_SIZE;
    SignalStore::with_block(vec![0u8; len], clock).unwrap()
}

/// Inverter double with scripted answers
///
/// Reachability and command results are consumed from queues; once a queue
/// is empty the default (reachable, accepted) applies.
#[derive(Debug, Default)]
pub struct MockInverter {
    pub reachability: VecDeque<bool>,
    pub responses: VecDeque<Result<(), ActuatorError>>,
    pub channels: Vec<f32>,
    pub sent: Vec<f32>,
    pub attempts: Vec<f32>,
    pub fetches: usize,
}

impl MockInverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channels(channels: &[f32]) -> Self {
        Self {
            channels: channels.to_vec(),
            ..Self::default()
        }
    }

    pub fn offline_for(mut self, ticks: usize) -> Self {
        self.reachability.extend(std::iter::repeat(false).take(ticks));
        self
    }

    pub fn reject_next(mut self) -> Self {
        self.responses.push_back(Err(ActuatorError::Unreachable));
        self
    }

    pub fn last_sent(&self) -> Option<f32> {
        self.sent.last().copied()
    }
}

impl Actuator for MockInverter {
    fn is_reachable(&mut self) -> bool {
        self.reachability.pop_front().unwrap_or(true)
    }

    fn send_limit(&mut self, limit: f32) -> Result<(), ActuatorError> {
        self.attempts.push(limit);
        let response = self.responses.pop_front().unwrap_or(Ok(()));
        if response.is_ok() {
            self.sent.push(limit);
        }
        response
    }

    fn fetch_channel_power(&mut self, powers: &mut [f32]) -> usize {
        self.fetches += 1;
        let count = self.channels.len().min(powers.len());
        powers[..count].copy_from_slice(&self.channels[..count]);
        count
    }
}
