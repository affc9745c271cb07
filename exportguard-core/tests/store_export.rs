//! Integration tests for the signal store
//!
//! Tests the shared store as the reporting side sees it:
//! - Full dumps in arbitrary chunk sizes
//! - Writers blocked for the duration of a dump
//! - Chart rendering and empty-window defaults

mod common;

use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use proptest::prelude::*;

use exportguard_core::{
    config::LimiterConfig,
    constants::SAMPLE_SIZE,
    replay::decode_dump,
    time::ManualClock,
    Sample, SignalType, TimeSource,
};

proptest! {
    #[test]
    fn export_reproduces_live_samples(
        slots in 2usize..64,
        values in prop::collection::vec(-500.0f32..500.0, 0..150),
        chunk in 1usize..64,
    ) {
        let clock = ManualClock::new(0);
        let store = common::store_with_slots(&clock, slots);

        let mut written = Vec::new();
        for (i, &value) in values.iter().enumerate() {
            clock.advance(100);
            let signal = if i % 3 == 0 { SignalType::GenerationPower } else { SignalType::GridPower };
            store.update(signal, value);
            written.push(Sample::new(signal, clock.now(), value));
        }
        let live: Vec<Sample> = written.iter().rev().take(slots - 1).rev().copied().collect();

        let mut export = store.export_all();
        prop_assert_eq!(export.total_len(), live.len() * SAMPLE_SIZE);

        let mut dump = Vec::new();
        let mut buf = vec![0u8; chunk.max(SAMPLE_SIZE)];
        loop {
            let n = export.fill(&mut buf);
            if n == 0 {
                break;
            }
            dump.extend_from_slice(&buf[..n]);
        }
        drop(export);

        prop_assert_eq!(dump.len(), live.len() * SAMPLE_SIZE);
        let decoded: Vec<Sample> = decode_dump(&dump).collect::<Result<_, _>>().unwrap();
        prop_assert_eq!(decoded, live);
    }
}

#[test]
fn export_streams_through_io_copy() {
    let clock = ManualClock::new(0);
    let store = common::store(&clock);
    for i in 0..50 {
        clock.advance(250);
        store.update(SignalType::GridPower, i as f32);
    }

    let mut sink = Vec::new();
    let copied = io::copy(&mut store.export_all(), &mut sink).unwrap();

    assert_eq!(copied, 500);
    assert_eq!(decode_dump(&sink).count(), 50);
}

#[test]
fn export_blocks_writers_until_released() {
    let clock = ManualClock::new(0);
    let store = common::store(&clock);
    store.update(SignalType::GridPower, 1.0);

    let written = AtomicBool::new(false);

    thread::scope(|s| {
        let mut export = store.export_all();

        s.spawn(|| {
            store.update(SignalType::GridPower, 2.0);
            written.store(true, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!written.load(Ordering::SeqCst));

        let mut dump = Vec::new();
        export.read_to_end(&mut dump).unwrap();
        assert_eq!(dump.len(), SAMPLE_SIZE);
        assert!(export.is_finished());
    });

    assert!(written.load(Ordering::SeqCst));
    assert_eq!(store.last_value(SignalType::GridPower), 2.0);
}

#[test]
fn blocked_writer_stamps_time_it_got_in() {
    let clock = ManualClock::new(1_000);
    let store = common::store(&clock);
    store.update(SignalType::GridPower, 1.0);

    thread::scope(|s| {
        let export = store.export_all();

        s.spawn(|| store.update(SignalType::GenerationPower, 2.0));

        thread::sleep(Duration::from_millis(50));
        clock.set(5_000);
        drop(export);
    });

    let mut dump = Vec::new();
    store.export_all().read_to_end(&mut dump).unwrap();
    let samples: Vec<Sample> = decode_dump(&dump).collect::<Result<_, _>>().unwrap();

    assert_eq!(samples.len(), 2);
    assert_eq!(samples[1], Sample::new(SignalType::GenerationPower, 5_000, 2.0));
}

#[test]
fn chart_lists_window_in_seconds() {
    let clock = ManualClock::new(0);
    let store = common::store(&clock);

    for (t, value) in [(500, -80.0), (1_000, -75.5), (40_000, 12.0), (41_000, 15.0)] {
        clock.set(t);
        store.update(SignalType::GridPower, value);
        store.update(SignalType::Limit, 600.0);
    }

    let json = store.chart_json(SignalType::GridPower, 5_000);
    assert_eq!(json, r#"[{"x":40.0,"y":12.0},{"x":41.0,"y":15.0}]"#);

    let parsed: serde_json::Value = serde_json::from_str(&store.chart_json(SignalType::GridPower, 60_000)).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(4));
    assert_eq!(parsed[1]["x"], 1.0);
}

#[test]
fn empty_window_blends_to_zero() {
    let clock = ManualClock::new(100_000);
    let store = common::store(&clock);
    let config = LimiterConfig::default().with_feed_in_level(80);

    for signal in [SignalType::GridPower, SignalType::GenerationPower] {
        assert_eq!(store.min_over_window(signal, 20_000), 0.0);
        assert_eq!(store.max_over_window(signal, 20_000), 0.0);
        assert_eq!(store.blended_value(signal, 20_000, &config), 0.0);
    }

    // old readings outside the window behave the same
    let old_clock = ManualClock::new(10_000);
    let old_store = common::store(&old_clock);
    old_store.update(SignalType::GridPower, 500.0);
    old_clock.set(60_000);
    assert_eq!(old_store.blended_value(SignalType::GridPower, 20_000, &config), 0.0);
}
