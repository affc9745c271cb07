//! Limit Arithmetic for the Export Controller
//!
//! ## Overview
//!
//! Pure functions that turn one pair of windowed readings into an optional
//! new inverter limit. Nothing here touches the signal store, the clock or
//! the inverter; [`Controller`](crate::controller::Controller) drives these
//! once per tick.
//!
//! ## Branches
//!
//! The grid reading is compared against `target ± deadband`:
//!
//! ```text
//!   grid power
//!       ↑
//!       │   Increase: limit = |grid - target| * 0.75 + current
//!  t+10 ┼───────────────────────────────────────────────
//!       │   Optimize: hold (no candidate)
//!  t-10 ┼───────────────────────────────────────────────
//!       │   Decrease, small deficit: limit = current - |grid - target| * 0.8
//!  t-50 ┼───────────────────────────────────────────────
//!       │   Decrease, large deficit: limit = generation - |grid - target| * 0.9
//!       │                            then channel asymmetry correction
//! ```
//!
//! Increase and Decrease candidates then pass [`check_boundary`], which
//! clamps them into the configured power range and drops any change smaller
//! than the hysteresis band.
//!
//! ## Channel Asymmetry
//!
//! The inverter applies one uniform cap to every DC channel. With strings
//! facing east and west, capping each channel at `total / n` cuts the strong
//! strings harder than intended while the weak ones stay below the cap.
//! [`correct_channel_power`] searches the per-channel cap whose clipped sum
//! first exceeds the needed power and returns `n * cap`, which the inverter
//! turns back into that per-channel cap.

use libm::fabsf;

use crate::config::LimiterConfig;
use crate::constants::control::{
    CHANNEL_SEARCH_STEP_W, DEADBAND_W, HYSTERESIS_W, INCREASE_GAIN, LARGE_DEFICIT_GAIN,
    LARGE_DEFICIT_W, SMALL_DEFICIT_GAIN,
};
use crate::constants::time::MIN_COMMAND_INTERVAL_MS;
use crate::time::Timestamp;

/// Controller gains and thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    /// Half width of the hold band around the target (W)
    pub deadband: f32,
    /// Share of the import added to the limit per step
    pub increase_gain: f32,
    /// Deficit that switches to the generation-based decrease (W)
    pub large_deficit: f32,
    /// Share of a large deficit taken off the measured generation
    pub large_deficit_gain: f32,
    /// Share of a small deficit taken off the current limit
    pub small_deficit_gain: f32,
    /// Minimum limit change worth a command (W)
    pub hysteresis: f32,
    /// Minimum spacing between accepted commands (ms)
    pub min_command_interval_ms: Timestamp,
    /// Step of the per-channel cap search (W); values <= 0 fall back to 1 W
    pub channel_search_step: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            deadband: DEADBAND_W,
            increase_gain: INCREASE_GAIN,
            large_deficit: LARGE_DEFICIT_W,
            large_deficit_gain: LARGE_DEFICIT_GAIN,
            small_deficit_gain: SMALL_DEFICIT_GAIN,
            hysteresis: HYSTERESIS_W,
            min_command_interval_ms: MIN_COMMAND_INTERVAL_MS,
            channel_search_step: CHANNEL_SEARCH_STEP_W,
        }
    }
}

/// Control regime selected for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Importing more than the target: release output
    Increase,
    /// Exporting more than the target: curtail output
    Decrease,
    /// Inside the dead band: hold
    Optimize,
}

/// Consecutive ticks spent in each branch
///
/// Entering one branch resets the other two, so at most one counter is
/// non-zero at any time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BranchCounters {
    /// Consecutive increase ticks
    pub increase: u32,
    /// Consecutive decrease ticks
    pub decrease: u32,
    /// Consecutive optimize ticks
    pub optimize: u32,
}

impl BranchCounters {
    /// Count one more tick in `branch`
    pub fn enter(&mut self, branch: Branch) {
        let (active, others) = match branch {
            Branch::Increase => (&mut self.increase, [&mut self.decrease, &mut self.optimize]),
            Branch::Decrease => (&mut self.decrease, [&mut self.increase, &mut self.optimize]),
            Branch::Optimize => (&mut self.optimize, [&mut self.increase, &mut self.decrease]),
        };

        *active = active.saturating_add(1);
        for counter in others {
            *counter = 0;
        }
    }

    /// Counter of `branch`
    pub fn get(&self, branch: Branch) -> u32 {
        match branch {
            Branch::Increase => self.increase,
            Branch::Decrease => self.decrease,
            Branch::Optimize => self.optimize,
        }
    }
}

/// Inputs of one limit calculation
#[derive(Debug, Clone, Copy)]
pub struct LimitInputs<'a> {
    /// Blended grid power over its window (W)
    pub grid_power: f32,
    /// Blended generation power over its window (W)
    pub generation_power: f32,
    /// Limit last accepted by the inverter (W)
    pub current_limit: f32,
    /// Last fetched per-channel DC power (W)
    pub channels: &'a [f32],
}

/// Pick the branch for `grid_power`
pub fn select_branch(grid_power: f32, target: f32, tuning: &Tuning) -> Branch {
    if grid_power > target + tuning.deadband {
        Branch::Increase
    } else if grid_power < target - tuning.deadband {
        Branch::Decrease
    } else {
        Branch::Optimize
    }
}

/// Raw increase-branch limit, before boundary checks
pub fn increase(grid_power: f32, target: f32, current_limit: f32, tuning: &Tuning) -> f32 {
    fabsf(grid_power - target) * tuning.increase_gain + current_limit
}

/// Raw decrease-branch limit, before boundary checks
pub fn decrease(inputs: &LimitInputs<'_>, target: f32, tuning: &Tuning) -> f32 {
    let deficit = fabsf(inputs.grid_power - target);

    if inputs.grid_power < target - tuning.large_deficit {
        let needed = inputs.generation_power - deficit * tuning.large_deficit_gain;
        correct_channel_power(needed, inputs.channels, tuning.channel_search_step)
    } else {
        inputs.current_limit - deficit * tuning.small_deficit_gain
    }
}

/// Aggregate limit that yields `needed` W under a uniform per-channel cap
///
/// Returns `needed` unchanged when every channel already carries its share,
/// when no channel data is available, or when even uncapped channels cannot
/// reach `needed`.
pub fn correct_channel_power(needed: f32, channels: &[f32], step: f32) -> f32 {
    if channels.is_empty() {
        return needed;
    }

    let count = channels.len() as f32;
    let weakest = channels.iter().copied().fold(f32::MAX, f32::min);
    let strongest = channels.iter().copied().fold(0.0, f32::max);

    // e.g. channels (100, 100, 300, 300) with 200 W needed
    if needed / count < count * weakest {
        return needed;
    }

    let step = if step > 0.0 { step } else { CHANNEL_SEARCH_STEP_W };
    let mut cap = weakest;
    while cap <= strongest {
        let delivered: f32 = channels.iter().map(|&power| power.min(cap)).sum();
        if delivered > needed {
            return count * cap;
        }
        cap += step;
    }

    needed
}

/// Clamp a candidate into the configured range and apply hysteresis
///
/// The lower clamp `min_power - target` only applies when `min_power`
/// exceeds the target. Returns `None` when the clamped limit is within the
/// hysteresis band of `current_limit`.
pub fn check_boundary(limit: f32, current_limit: f32, config: &LimiterConfig, tuning: &Tuning) -> Option<f32> {
    let mut limit = limit;

    let floor = config.min_power - config.target;
    if config.min_power > config.target && limit < floor {
        limit = floor;
    }

    if limit > config.max_power {
        limit = config.max_power;
    }

    if limit == current_limit || fabsf(current_limit - limit) < tuning.hysteresis {
        return None;
    }

    Some(limit)
}

/// Run branch selection, branch arithmetic and boundary checks
///
/// Updates `counters` for the selected branch. Optimize never produces a
/// candidate.
pub fn candidate_limit(
    inputs: &LimitInputs<'_>,
    config: &LimiterConfig,
    tuning: &Tuning,
    counters: &mut BranchCounters,
) -> (Branch, Option<f32>) {
    let branch = select_branch(inputs.grid_power, config.target, tuning);
    counters.enter(branch);

    let raw = match branch {
        Branch::Increase => increase(inputs.grid_power, config.target, inputs.current_limit, tuning),
        Branch::Decrease => decrease(inputs, config.target, tuning),
        Branch::Optimize => return (branch, None),
    };

    (branch, check_boundary(raw, inputs.current_limit, config, tuning))
}
