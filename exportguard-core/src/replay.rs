//! Offline Replay of Recorded Meter Data
//!
//! A dump produced by [`SignalStore::export_all`] is a plain sequence of
//! 10-byte records. [`decode_dump`] turns it back into samples, and
//! [`ReplayDriver`] plays the recorded meter readings into a fresh store while
//! ticking a controller, so a day of field data can be run through the control
//! loop in milliseconds.
//!
//! The driver owns no clock of its own. It moves a shared [`ManualClock`] that
//! the store must also read from.
//!
//! [`SignalStore::export_all`]: crate::store::SignalStore::export_all

use core::iter::Peekable;
use std::vec::Vec;

use crate::constants::{CONTROL_PERIOD_MS, SAMPLE_SIZE};
use crate::controller::{Controller, TickReport};
use crate::errors::{BufferError, BufferResult};
use crate::sample::{Sample, SignalType};
use crate::store::SignalStore;
use crate::time::{ManualClock, TimeSource, Timestamp};
use crate::traits::{Actuator, ConfigurationProvider};

/// Default clock step per driver iteration (ms)
pub const DEFAULT_STEP_MS: Timestamp = 100;

/// Signals replayed into the store; everything else in a dump is skipped
const INPUTS: [SignalType; 2] = [SignalType::GridPower, SignalType::GenerationPower];

/// Decode a dump record by record
///
/// A trailing partial record yields one final `TruncatedRecord` error.
pub fn decode_dump(dump: &[u8]) -> impl Iterator<Item = BufferResult<Sample>> + '_ {
    let records = dump.chunks_exact(SAMPLE_SIZE);
    let remainder = records.remainder();
    let tail = (!remainder.is_empty()).then(|| Err(BufferError::TruncatedRecord { len: remainder.len() }));

    records.map(Sample::decode).chain(tail)
}

/// Result of one driver iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplayStep {
    /// Clock value after the step
    pub now: Timestamp,
    /// Recorded input samples written this step
    pub fed: usize,
    /// Controller report when a control period elapsed
    pub report: Option<TickReport>,
}

/// Plays recorded input samples through a store and controller
pub struct ReplayDriver<'c, I: Iterator<Item = Sample>> {
    clock: &'c ManualClock,
    samples: Peekable<I>,
    step_ms: Timestamp,
    period_ms: Timestamp,
    last_tick: Timestamp,
    held: [Option<(Timestamp, f32)>; INPUTS.len()],
}

impl<'c, I: Iterator<Item = Sample>> ReplayDriver<'c, I> {
    /// Replay `samples` (in recording order) against `clock`
    pub fn new<S>(clock: &'c ManualClock, samples: S) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        Self {
            clock,
            samples: samples.into_iter().peekable(),
            step_ms: DEFAULT_STEP_MS,
            period_ms: CONTROL_PERIOD_MS,
            last_tick: clock.now(),
            held: [None; INPUTS.len()],
        }
    }

    /// Clock resolution of the replay; 0 is treated as 1 ms
    pub fn with_step(mut self, step_ms: Timestamp) -> Self {
        self.step_ms = step_ms.max(1);
        self
    }

    /// Controller period; also the gap after which the last reading is repeated
    pub fn with_period(mut self, period_ms: Timestamp) -> Self {
        self.period_ms = period_ms.max(1);
        self
    }

    /// Advance the clock by one step
    ///
    /// Returns `None` once the recording is exhausted.
    pub fn step<B, T, A, P>(
        &mut self,
        store: &SignalStore<B, T>,
        controller: &mut Controller,
        actuator: &mut A,
        provider: &P,
    ) -> Option<ReplayStep>
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
        T: TimeSource,
        A: Actuator + ?Sized,
        P: ConfigurationProvider + ?Sized,
    {
        self.samples.peek()?;

        let now = self.clock.now().saturating_add(self.step_ms);
        let mut fed = 0;

        while let Some(sample) = self.samples.next_if(|sample| sample.timestamp <= now) {
            let Some(slot) = INPUTS.iter().position(|&signal| signal == sample.signal) else {
                continue;
            };
            self.clock.set(sample.timestamp);
            store.update(sample.signal, sample.value);
            self.held[slot] = Some((self.clock.now(), sample.value));
            fed += 1;
        }
        self.clock.set(now);

        // meters report on change only; repeat the last reading so windows stay populated
        for (slot, &signal) in INPUTS.iter().enumerate() {
            if let Some((at, value)) = self.held[slot] {
                if now.wrapping_sub(at) > self.period_ms {
                    store.update(signal, value);
                    self.held[slot] = Some((now, value));
                }
            }
        }

        let report = if now.wrapping_sub(self.last_tick) >= self.period_ms {
            self.last_tick = now;
            Some(controller.tick(store, actuator, provider))
        } else {
            None
        };

        Some(ReplayStep { now, fed, report })
    }

    /// Replay to the end, collecting every tick report
    pub fn run<B, T, A, P>(
        &mut self,
        store: &SignalStore<B, T>,
        controller: &mut Controller,
        actuator: &mut A,
        provider: &P,
    ) -> Vec<TickReport>
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
        T: TimeSource,
        A: Actuator + ?Sized,
        P: ConfigurationProvider + ?Sized,
    {
        let mut reports = Vec::new();
        while let Some(step) = self.step(store, controller, actuator, provider) {
            reports.extend(step.report);
        }
        log_info!("Replay finished after {} ticks", reports.len());
        reports
    }
}
