//! Deterministic meter data for replay and controller tests

use exportguard_core::{Sample, SignalType, Timestamp};

/// Xorshift generator, reproducible across runs
pub struct TestRng {
    state: u32,
}

impl TestRng {
    pub fn new(seed: u32) -> Self {
        Self { state: seed.max(1) }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        self.state
    }

    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / 16777216.0
    }

    pub fn gen_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}

/// Household with a steady base load and a PV string
///
/// Grid power is `load - generation`; negative values mean export.
pub struct HouseholdProfile {
    pub base_load: f32,
    pub generation: f32,
    pub noise: f32,
}

impl HouseholdProfile {
    /// Exporting household: 150 W load against 600 W of sun
    pub fn sunny_noon() -> Self {
        Self {
            base_load: 150.0,
            generation: 600.0,
            noise: 5.0,
        }
    }

    /// Alternating grid and generation readings every `interval_ms`
    pub fn recording(&self, rng: &mut TestRng, duration_ms: Timestamp, interval_ms: Timestamp) -> Vec<Sample> {
        let mut samples = Vec::new();
        let mut t = interval_ms;

        while t <= duration_ms {
            let load = self.base_load + rng.gen_range(-self.noise, self.noise);
            samples.push(Sample::new(SignalType::GridPower, t, load - self.generation));
            samples.push(Sample::new(SignalType::GenerationPower, t + 1, self.generation));
            t += interval_ms;
        }

        samples
    }
}
