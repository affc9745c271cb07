//! Ring Buffer Example
//!
//! This example shows how the limiter keeps several signals inside one
//! fixed 4 KB block, and what happens once the block is full.
//!
//! ## What You'll Learn
//!
//! - Cold start over a caller-owned block
//! - Interleaved writes and per-signal queries
//! - Windowed walks and the drop-oldest policy
//! - Warm restart over a block that survived a reset
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_ring_buffer
//! ```

use exportguard_core::{
    constants::DEFAULT_BLOCK_SIZE,
    BufferError, RingBuffer, SignalType,
};

fn main() -> Result<(), BufferError> {
    println!("ExportGuard Ring Buffer Example");
    println!("===============================\n");

    let mut ring = RingBuffer::cold_start(vec![0u8; DEFAULT_BLOCK_SIZE])?;
    println!("Block of {} bytes holds {} slots\n", DEFAULT_BLOCK_SIZE, ring.capacity());

    // Example 1: meters reporting every second
    println!("1. Interleaved Writes");
    println!("---------------------");

    for second in 0..60u32 {
        let t = second * 1000;
        let grid = -120.0 + 40.0 * libm::sinf(second as f32 / 6.0);
        ring.write(SignalType::GridPower, t, grid);
        ring.write(SignalType::GenerationPower, t + 5, 520.0);
    }

    if let Some(grid) = ring.last_entry(SignalType::GridPower) {
        println!("  latest grid reading: {:.1} W at {} ms", grid.value, grid.timestamp);
    }
    println!("  live samples: {}\n", ring.len());

    // Example 2: min/max over the last 20 s
    println!("2. Windowed Walk");
    println!("----------------");

    let now = 59_000;
    let (mut min, mut max) = (f32::MAX, f32::MIN);
    ring.for_each_reverse(SignalType::GridPower, now, 20_000, |sample| {
        min = min.min(sample.value);
        max = max.max(sample.value);
    });
    println!("  grid over last 20 s: [{:.1}, {:.1}] W\n", min, max);

    // Example 3: overflow drops the oldest samples
    println!("3. Drop-Oldest Policy");
    println!("---------------------");

    for second in 60..400u32 {
        ring.write(SignalType::GridPower, second * 1000, -100.0);
    }
    let oldest = ring.iter().next();
    println!("  live samples: {} (capacity {})", ring.len(), ring.capacity());
    println!("  used_count(): {}", ring.used_count());
    if let Some(sample) = oldest {
        println!("  oldest kept: {:?} at {} ms\n", sample.signal, sample.timestamp);
    }

    // Example 4: the header lives in the block
    println!("4. Warm Restart");
    println!("---------------");

    let kept = ring.len();
    let block = ring.into_block();
    let ring = RingBuffer::warm_start(block)?;
    println!("  samples after warm start: {} (before: {})", ring.len(), kept);

    match RingBuffer::warm_start(vec![0xFFu8; DEFAULT_BLOCK_SIZE]) {
        Err(e) => println!("  foreign block refused: {}", e),
        Ok(_) => println!("  foreign block accepted?"),
    }

    Ok(())
}
