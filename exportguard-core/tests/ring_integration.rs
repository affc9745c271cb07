//! Integration tests for the fixed-block ring buffer
//!
//! Checks the buffer against a plain `VecDeque` model:
//! - Drop-oldest wraparound at every capacity
//! - Windowed walks visiting exactly the in-window samples
//! - Warm restart over a block that survived a reset

use std::collections::VecDeque;

use proptest::prelude::*;

use exportguard_core::{
    constants::{HEADER_SIZE, SAMPLE_SIZE},
    RingBuffer, Sample, SignalType,
};

fn ring_with_slots(slots: usize) -> RingBuffer<Vec<u8>> {
    RingBuffer::cold_start(vec![0u8; HEADER_SIZE + slots * SAMPLE_SIZE]).unwrap()
}

fn signal(code: u16) -> SignalType {
    SignalType::try_from(code).unwrap()
}

proptest! {
    #[test]
    fn newest_sample_survives_wraparound(
        slots in 2usize..24,
        writes in prop::collection::vec((0u16..8, -1000.0f32..1000.0), 1..200),
    ) {
        let mut ring = ring_with_slots(slots);
        let mut model: VecDeque<Sample> = VecDeque::new();

        for (i, &(code, value)) in writes.iter().enumerate() {
            let sample = Sample::new(signal(code), i as u32 * 10, value);
            ring.write(sample.signal, sample.timestamp, sample.value);

            model.push_back(sample);
            if model.len() > slots - 1 {
                model.pop_front();
            }

            prop_assert!(ring.used_count() <= slots);
            prop_assert_eq!(ring.len(), model.len());
            prop_assert_eq!(ring.last_entry(sample.signal), Some(sample));
        }

        for signal in SignalType::ALL {
            let expected = model.iter().rev().find(|s| s.signal == signal).copied();
            prop_assert_eq!(ring.last_entry(signal), expected);
        }

        let live: Vec<Sample> = ring.iter().collect();
        prop_assert_eq!(live, model.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn window_walks_visit_exactly_the_window(
        gaps in prop::collection::vec((0u16..8, 0u32..500), 1..150),
        window_ms in 0u32..20_000,
        probe in 0u16..8,
    ) {
        let mut ring = ring_with_slots(408);
        let mut written = Vec::new();
        let mut t = 0u32;

        for &(code, gap) in &gaps {
            t += gap;
            let sample = Sample::new(signal(code), t, t as f32);
            ring.write(sample.signal, sample.timestamp, sample.value);
            written.push(sample);
        }

        let now = t;
        let cutoff = now.saturating_sub(window_ms);
        let probe = signal(probe);
        let expected: Vec<Sample> = written
            .iter()
            .filter(|s| s.signal == probe && s.timestamp >= cutoff)
            .copied()
            .collect();

        let mut forward = Vec::new();
        ring.for_each(probe, now, window_ms, |s| forward.push(*s));
        prop_assert_eq!(&forward, &expected);

        let mut reverse = Vec::new();
        ring.for_each_reverse(probe, now, window_ms, |s| reverse.push(*s));
        reverse.reverse();
        prop_assert_eq!(&reverse, &expected);
    }
}

#[test]
fn interleaved_types_keep_their_own_history() {
    let mut ring = ring_with_slots(408);
    for i in 0..10u32 {
        ring.write(SignalType::GridPower, i * 100, i as f32);
        ring.write(SignalType::GenerationPower, i * 100 + 2, 50.0 + i as f32);
    }

    assert_eq!(ring.last_entry(SignalType::GridPower).unwrap().timestamp, 900);
    assert_eq!(ring.last_entry(SignalType::GenerationPower).unwrap().timestamp, 902);

    let mut times = Vec::new();
    ring.for_each(SignalType::GridPower, 1000, 1000, |s| times.push(s.timestamp));
    assert_eq!(times, (0..10).map(|i| i * 100).collect::<Vec<u32>>());
}

#[test]
fn stale_sample_of_other_type_ends_window_early() {
    let mut ring = ring_with_slots(16);
    ring.write(SignalType::GridPower, 9_000, 1.0);
    // recorded late with an old timestamp
    ring.write(SignalType::Limit, 100, 300.0);
    ring.write(SignalType::GridPower, 9_500, 2.0);

    let mut seen = Vec::new();
    ring.for_each_reverse(SignalType::GridPower, 10_000, 5_000, |s| seen.push(s.value));
    assert_eq!(seen, vec![2.0]);
}

#[test]
fn warm_restart_keeps_wrapped_history() {
    let mut ring = ring_with_slots(8);
    for i in 0..20u32 {
        ring.write(SignalType::GridPower, i, i as f32);
    }
    let before: Vec<Sample> = ring.iter().collect();

    let block = ring.into_block();
    let ring = RingBuffer::warm_start(block).unwrap();

    assert_eq!(ring.iter().collect::<Vec<_>>(), before);
    assert_eq!(ring.len(), 7);
    assert_eq!(ring.last_entry(SignalType::GridPower).unwrap().value, 19.0);
}

#[test]
fn warm_start_on_foreign_block_fails() {
    let mut block = vec![0xAAu8; HEADER_SIZE + 8 * SAMPLE_SIZE];
    block[0..4].copy_from_slice(&0u32.to_le_bytes());

    assert!(RingBuffer::warm_start(block).is_err());
}
