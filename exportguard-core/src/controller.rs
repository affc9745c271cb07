//! Periodic Export Limiting Controller
//!
//! ## Overview
//!
//! [`Controller::tick`] is called once per control period (nominally one
//! second) from a single control task. Each tick:
//!
//! 1. Writes windowed min/max diagnostics for grid and generation power back
//!    into the store.
//! 2. Stops there when curtailment is disabled, resetting both windows to the
//!    default.
//! 3. Refreshes per-channel power from the inverter when it is reachable.
//! 4. Blends both inputs over their windows and runs the limit calculation.
//! 5. Sends a new limit when there is a candidate, the inverter is reachable
//!    and the minimum command interval has passed since the last accepted
//!    command.
//!
//! A tick never fails. Everything that went wrong is logged and reported in
//! the returned [`TickReport`].
//!
//! ## Example
//!
//! ```rust
//! use exportguard_core::config::LimiterConfig;
//! use exportguard_core::controller::{Controller, TickOutcome};
//! use exportguard_core::errors::ActuatorError;
//! use exportguard_core::sample::SignalType;
//! use exportguard_core::store::SignalStore;
//! use exportguard_core::time::ManualClock;
//! use exportguard_core::traits::Actuator;
//!
//! struct Inverter;
//!
//! impl Actuator for Inverter {
//!     fn is_reachable(&mut self) -> bool { true }
//!     fn send_limit(&mut self, _limit: f32) -> Result<(), ActuatorError> { Ok(()) }
//!     fn fetch_channel_power(&mut self, _powers: &mut [f32]) -> usize { 0 }
//! }
//!
//! let clock = ManualClock::new(15_000);
//! let store = SignalStore::with_block(vec![0u8; 4096], &clock).unwrap();
//! let config = LimiterConfig::default().with_limit_enabled(true);
//! let mut controller = Controller::new();
//!
//! store.update(SignalType::GridPower, 200.0);
//! let report = controller.tick(&store, &mut Inverter, &config);
//!
//! assert_eq!(report.outcome, TickOutcome::Sent);
//! assert_eq!(controller.current_limit(), 150.0);
//! ```

use core::fmt::Write;

use heapless::{String as DebugText, Vec as ChannelVec};

use crate::calculation::{candidate_limit, Branch, BranchCounters, LimitInputs, Tuning};
use crate::config::LimiterConfig;
use crate::constants::buffers::{DEBUG_CAPACITY, MAX_CHANNELS};
use crate::constants::DEFAULT_WINDOW_MS;
use crate::errors::ActuatorError;
use crate::sample::SignalType;
use crate::store::{DebugChannel, SignalStore};
use crate::time::{TimeSource, Timestamp};
use crate::traits::{Actuator, ConfigurationProvider};

/// Marker written to the limit debug stream while the inverter is silent
pub const UNREACHABLE_MARKER: &str = "inverter unreachable";

/// What a tick ended up doing
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Curtailment switched off; only diagnostics were written
    Disabled,
    /// No candidate limit (dead band or hysteresis)
    Hold,
    /// Candidate existed but the inverter was unreachable
    Unreachable,
    /// Candidate existed but the last command was too recent
    RateLimited,
    /// Candidate accepted by the inverter
    Sent,
    /// Candidate refused by the inverter
    Rejected(ActuatorError),
}

/// Observations of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// What the tick did
    pub outcome: TickOutcome,
    /// Branch taken; `None` while disabled
    pub branch: Option<Branch>,
    /// Blended grid power (W)
    pub grid_power: f32,
    /// Blended generation power (W)
    pub generation_power: f32,
    /// Limit proposed after boundary and hysteresis checks
    pub candidate: Option<f32>,
    /// Limit the inverter accepted this tick
    pub sent: Option<f32>,
}

impl TickReport {
    fn disabled() -> Self {
        Self {
            outcome: TickOutcome::Disabled,
            branch: None,
            grid_power: 0.0,
            generation_power: 0.0,
            candidate: None,
            sent: None,
        }
    }
}

/// Mutable controller state carried between ticks
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    /// Limit last accepted by the inverter (W)
    pub current_limit: f32,
    /// Time of the last accepted command (ms)
    pub last_command_time: Timestamp,
    /// Consecutive ticks per branch
    pub counters: BranchCounters,
    /// Per-channel DC power from the last successful fetch (W)
    pub channel_powers: ChannelVec<f32, MAX_CHANNELS>,
    /// Min/max window for grid power (ms)
    pub grid_window_ms: Timestamp,
    /// Min/max window for generation power (ms)
    pub generation_window_ms: Timestamp,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            current_limit: 0.0,
            last_command_time: 0,
            counters: BranchCounters::default(),
            channel_powers: ChannelVec::new(),
            grid_window_ms: DEFAULT_WINDOW_MS,
            generation_window_ms: DEFAULT_WINDOW_MS,
        }
    }
}

/// Feedback controller driving the inverter limit
#[derive(Debug, Clone, Default)]
pub struct Controller {
    state: ControllerState,
    tuning: Tuning,
}

impl Controller {
    /// Fresh controller with default tuning
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh controller with custom gains
    pub fn with_tuning(tuning: Tuning) -> Self {
        Self {
            state: ControllerState::default(),
            tuning,
        }
    }

    /// Resume from previously saved state
    pub fn from_state(state: ControllerState, tuning: Tuning) -> Self {
        Self { state, tuning }
    }

    /// Persistable state
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Gains in use
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Limit last accepted by the inverter (W)
    pub fn current_limit(&self) -> f32 {
        self.state.current_limit
    }

    /// Run one control period
    pub fn tick<B, T, A, P>(&mut self, store: &SignalStore<B, T>, actuator: &mut A, provider: &P) -> TickReport
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
        T: TimeSource,
        A: Actuator + ?Sized,
        P: ConfigurationProvider + ?Sized,
    {
        let config = provider.snapshot();

        let mut grid_debug = self.refresh_extremes(
            store,
            SignalType::GridPower,
            self.state.grid_window_ms,
            (SignalType::GridPowerMin, SignalType::GridPowerMax),
        );
        let mut generation_debug = self.refresh_extremes(
            store,
            SignalType::GenerationPower,
            self.state.generation_window_ms,
            (SignalType::GenerationMin, SignalType::GenerationMax),
        );

        if !config.curtailment_active() {
            self.state.grid_window_ms = DEFAULT_WINDOW_MS;
            self.state.generation_window_ms = DEFAULT_WINDOW_MS;
            return TickReport::disabled();
        }

        self.state.grid_window_ms = config.grid_window();
        self.state.generation_window_ms = config.generation_window();

        let reachable = actuator.is_reachable();
        if reachable {
            self.refresh_channels(store, actuator);
        } else {
            log_warn!("Inverter unreachable, keeping previous channel readings");
            store.append_debug(DebugChannel::CalculatedLimit, UNREACHABLE_MARKER);
        }

        let grid_power = store.blended_value(SignalType::GridPower, self.state.grid_window_ms, &config);
        let generation_power =
            store.blended_value(SignalType::GenerationPower, self.state.generation_window_ms, &config);

        let _ = write!(grid_debug, "{}, {} ", grid_power as i32, self.state.grid_window_ms / 1000);
        let _ = write!(
            generation_debug,
            "{}, {} ",
            generation_power as i32,
            self.state.generation_window_ms / 1000
        );

        let inputs = LimitInputs {
            grid_power,
            generation_power,
            current_limit: self.state.current_limit,
            channels: &self.state.channel_powers,
        };
        let (branch, candidate) = candidate_limit(&inputs, &config, &self.tuning, &mut self.state.counters);
        log_debug!(
            "Tick: grid {} W, generation {} W, branch {:?}, candidate {:?}",
            grid_power,
            generation_power,
            branch,
            candidate
        );

        store.update(SignalType::Limit, self.state.current_limit);
        store.append_debug(DebugChannel::Grid, &grid_debug);
        store.append_debug(DebugChannel::Generation, &generation_debug);

        let calculated = candidate.unwrap_or_else(|| store.last_value(SignalType::CalculatedLimit));
        store.update(SignalType::CalculatedLimit, calculated);

        let mut report = TickReport {
            outcome: TickOutcome::Hold,
            branch: Some(branch),
            grid_power,
            generation_power,
            candidate,
            sent: None,
        };

        let Some(limit) = candidate else {
            return report;
        };

        report.outcome = self.dispatch(store, actuator, &config, limit, reachable);
        if report.outcome == TickOutcome::Sent {
            report.sent = Some(limit);
        }
        report
    }

    /// Write the window min/max of `signal` and render them for the debug stream
    fn refresh_extremes<B, T>(
        &self,
        store: &SignalStore<B, T>,
        signal: SignalType,
        window_ms: Timestamp,
        (min_signal, max_signal): (SignalType, SignalType),
    ) -> DebugText<DEBUG_CAPACITY>
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
        T: TimeSource,
    {
        let (min, max) = store.window_extremes(signal, window_ms);
        store.update(max_signal, max);
        store.update(min_signal, min);

        let mut text = DebugText::new();
        let _ = write!(text, "[{},{}]", min as i32, max as i32);
        text
    }

    fn refresh_channels<B, T, A>(&mut self, store: &SignalStore<B, T>, actuator: &mut A)
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
        T: TimeSource,
        A: Actuator + ?Sized,
    {
        let mut powers = [0.0f32; MAX_CHANNELS];
        let count = actuator.fetch_channel_power(&mut powers).min(MAX_CHANNELS);
        self.state.channel_powers = powers[..count].iter().copied().collect();

        let mut text: DebugText<DEBUG_CAPACITY> = DebugText::new();
        let _ = text.push('(');
        for (i, power) in self.state.channel_powers.iter().enumerate() {
            if i > 0 {
                let _ = text.push(',');
            }
            let _ = write!(text, "{}", *power as i32);
        }
        let _ = text.push(')');
        store.append_debug(DebugChannel::CalculatedLimit, &text);
    }

    fn dispatch<B, T, A>(
        &mut self,
        store: &SignalStore<B, T>,
        actuator: &mut A,
        config: &LimiterConfig,
        limit: f32,
        reachable: bool,
    ) -> TickOutcome
    where
        B: AsRef<[u8]> + AsMut<[u8]>,
        T: TimeSource,
        A: Actuator + ?Sized,
    {
        if !reachable {
            return TickOutcome::Unreachable;
        }

        let now = store.now();
        if now.wrapping_sub(self.state.last_command_time) < self.tuning.min_command_interval_ms {
            return TickOutcome::RateLimited;
        }

        match actuator.send_limit(limit) {
            Ok(()) => {
                log_info!(
                    "Limit {} W sent (target {} W, previous {} W)",
                    limit,
                    config.target,
                    self.state.current_limit
                );
                self.state.current_limit = limit;
                self.state.last_command_time = now;
                store.update(SignalType::Limit, limit);
                TickOutcome::Sent
            }
            Err(e) => {
                log_warn!("Limit {} W not applied: {}", limit, e);
                TickOutcome::Rejected(e)
            }
        }
    }
}
