//! Closed-Loop Limiter Example
//!
//! This example runs the controller against a simulated household whose grid
//! meter reacts to the limit the inverter is given.
//!
//! ## What You'll Learn
//!
//! - Wiring a store, a controller and an actuator together
//! - How the branches and the command interval shape the response
//! - Reading debug streams, charts and a full dump
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_limiter_loop
//! ```

use exportguard_core::{
    replay::decode_dump,
    store::DebugChannel,
    time::ManualClock,
    Actuator, ActuatorError, Controller, LimiterConfig, SignalStore, SignalType, TickOutcome,
    TimeSource,
};

/// Household with 250 W of load and up to 700 W of sun
struct SimulatedHome {
    load: f32,
    sun: f32,
    limit: f32,
}

impl SimulatedHome {
    fn generation(&self) -> f32 {
        self.sun.min(self.limit)
    }

    fn grid(&self) -> f32 {
        self.load - self.generation()
    }
}

impl Actuator for SimulatedHome {
    fn is_reachable(&mut self) -> bool {
        true
    }

    fn send_limit(&mut self, limit: f32) -> Result<(), ActuatorError> {
        self.limit = limit.max(0.0);
        Ok(())
    }

    fn fetch_channel_power(&mut self, powers: &mut [f32]) -> usize {
        // two strings, east facing one is weaker
        let total = self.generation();
        powers[0] = total * 0.3;
        powers[1] = total * 0.7;
        2
    }
}

fn main() {
    println!("ExportGuard Limiter Loop Example");
    println!("================================\n");

    let clock = ManualClock::new(0);
    let store = match SignalStore::with_block(vec![0u8; 4096], &clock) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("cannot start store: {}", e);
            return;
        }
    };

    let config = LimiterConfig::default()
        .with_limit_enabled(true)
        .with_target(20.0)
        .with_power_range(50.0, 800.0)
        .with_feed_in_level(50);

    let mut home = SimulatedHome {
        load: 250.0,
        sun: 700.0,
        limit: 800.0,
    };
    let mut controller = Controller::new();
    controller_state_hint(&controller);

    for second in 1..=120u32 {
        clock.set(second * 1000);
        store.update(SignalType::GridPower, home.grid());
        store.update(SignalType::GenerationPower, home.generation());

        let report = controller.tick(&store, &mut home, &config);
        if report.outcome == TickOutcome::Sent {
            println!(
                "  t={:>3}s  {:?}: grid {:>7.1} W -> limit {:>6.1} W",
                second,
                report.branch.unwrap_or(exportguard_core::Branch::Optimize),
                report.grid_power,
                controller.current_limit()
            );
        }
    }

    println!("\nAfter two minutes:");
    println!("  grid:       {:.1} W (target {:.1} W)", home.grid(), config.target);
    println!("  generation: {:.1} W", home.generation());
    println!("  grid debug: {}", store.take_debug(DebugChannel::Grid));
    println!("  chart:      {}", store.chart_json(SignalType::Limit, 5_000));

    let mut dump = Vec::new();
    if std::io::copy(&mut store.export_all(), &mut dump).is_ok() {
        let records = decode_dump(&dump).filter(|r| r.is_ok()).count();
        println!("  dump:       {} bytes, {} records at t={} ms", dump.len(), records, clock.now());
    }
}

fn controller_state_hint(controller: &Controller) {
    let state = controller.state();
    println!(
        "Controller starts at {:.0} W, windows {} / {} ms\n",
        state.current_limit, state.grid_window_ms, state.generation_window_ms
    );
}
