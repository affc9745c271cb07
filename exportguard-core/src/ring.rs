//! Fixed-Block Ring Buffer for Mixed Signal History
//!
//! ## Overview
//!
//! The limiter keeps a few minutes of grid, generation and limit samples in a
//! single caller-supplied byte block. All signal types share one ring: a query
//! for one type walks the sequence and skips the others. There is no index per
//! type, which keeps the whole history inside one fixed allocation.
//!
//! ## Memory Layout
//!
//! ```text
//! ┌──────────────────────────┬──────────┬──────────┬─────┬──────────┐
//! │ header (16 bytes)        │ slot 0   │ slot 1   │ ... │ slot N-1 │
//! │ start first last end     │ 10 bytes │ 10 bytes │     │ 10 bytes │
//! └──────────────────────────┴──────────┴──────────┴─────┴──────────┘
//! ```
//!
//! The header holds four `u32` slot indices:
//! - `start`: always 0
//! - `first`: oldest live sample (equals `last` when empty)
//! - `last`: next write slot, one past the newest sample
//! - `end`: number of slots
//!
//! Because the cursors live inside the block, a block placed in memory that
//! survives a soft reset can be re-attached with [`RingBuffer::warm_start`]
//! and the history is still there. [`RingBuffer::cold_start`] (or
//! [`RingBuffer::power_on_initialize`]) resets it.
//!
//! ## Drop-Oldest Policy
//!
//! Writing never fails. When the write cursor would run into `first`, the
//! oldest sample is dropped:
//!
//! ```text
//! 5 slots after 6 writes:   [ f  |  g  |  c  |  d  |  e  ]
//!                                     ↑     ↑
//!                                   last  first
//! ```
//!
//! One slot always stays free, so at most `capacity() - 1` samples are live.
//!
//! ## Window Queries
//!
//! Windowed walks start at the newest sample and stop the *whole* walk at the
//! first sample, of any type, older than `now - window`. A stretch of old
//! samples of another type therefore ends the scan early even if older samples
//! of the requested type would still be in the window.
//!
//! ## Usage Example
//!
//! ```rust
//! use exportguard_core::ring::RingBuffer;
//! use exportguard_core::sample::SignalType;
//!
//! let mut ring = RingBuffer::cold_start(vec![0u8; 4096]).unwrap();
//! ring.write(SignalType::GridPower, 1000, 250.0);
//! ring.write(SignalType::GenerationPower, 1002, 400.0);
//!
//! let latest = ring.last_entry(SignalType::GridPower).unwrap();
//! assert_eq!(latest.value, 250.0);
//!
//! let mut peak = f32::MIN;
//! ring.for_each_reverse(SignalType::GridPower, 2000, 20_000, |s| peak = peak.max(s.value));
//! assert_eq!(peak, 250.0);
//! ```

use crate::constants::buffers::{HEADER_SIZE, MIN_SLOTS, SAMPLE_SIZE};
use crate::errors::{BufferError, BufferResult};
use crate::sample::{Sample, SignalType};
use crate::time::{age, Timestamp};

/// Header cursor byte offsets
#[derive(Debug, Clone, Copy)]
enum Cursor {
    Start = 0,
    First = 4,
    Last = 8,
    End = 12,
}

/// Resumable position for a full oldest-to-newest export
///
/// A fresh cursor starts at the oldest live sample. Once
/// [`RingBuffer::drain_next`] returns `None` the cursor stays exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainCursor {
    position: Option<usize>,
}

impl DrainCursor {
    /// Cursor positioned before the oldest sample
    pub const fn new() -> Self {
        Self { position: None }
    }
}

/// Ring of packed samples over a caller-owned block
///
/// `B` is anything that can lend the block as a byte slice: a `Vec<u8>`, a
/// `[u8; N]` array or a `&'static mut [u8]` pointing at retained RAM.
///
/// ## Thread Safety
///
/// Not synchronised. [`SignalStore`](crate::store::SignalStore) wraps it in a
/// mutex; bare use assumes a single writer.
pub struct RingBuffer<B> {
    block: B,
    capacity: usize,
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> RingBuffer<B> {
    /// Number of record slots a block of `len` bytes provides
    pub const fn slots_for(len: usize) -> usize {
        if len < HEADER_SIZE {
            0
        } else {
            (len - HEADER_SIZE) / SAMPLE_SIZE
        }
    }

    /// Attach to `block` and reset the cursors
    pub fn cold_start(block: B) -> BufferResult<Self> {
        let mut ring = Self::attach(block)?;
        ring.power_on_initialize();
        log_info!("Ring buffer cold start: {} slots", ring.capacity);
        Ok(ring)
    }

    /// Attach to `block` keeping the history its header describes
    ///
    /// Fails with [`BufferError::CorruptHeader`] when the persisted cursors do
    /// not fit this block; the caller should then fall back to
    /// [`cold_start`](Self::cold_start).
    pub fn warm_start(block: B) -> BufferResult<Self> {
        let ring = Self::attach(block)?;

        ring.check_header().inspect_err(|_e| {
            log_warn!("Ring buffer warm start refused: {}", _e);
        })?;

        log_info!("Ring buffer warm start: {} samples kept", ring.len());
        Ok(ring)
    }

    fn attach(block: B) -> BufferResult<Self> {
        let len = block.as_ref().len();
        let capacity = Self::slots_for(len);

        if capacity < MIN_SLOTS {
            return Err(BufferError::BlockTooSmall {
                len,
                required: HEADER_SIZE + MIN_SLOTS * SAMPLE_SIZE,
            });
        }

        Ok(Self { block, capacity })
    }

    fn check_header(&self) -> BufferResult<()> {
        if self.cursor(Cursor::Start) != 0 {
            return Err(BufferError::CorruptHeader { reason: "start cursor not at slot 0" });
        }
        if self.cursor(Cursor::End) != self.capacity {
            return Err(BufferError::CorruptHeader { reason: "end cursor does not match block size" });
        }
        if self.cursor(Cursor::First) >= self.capacity {
            return Err(BufferError::CorruptHeader { reason: "first cursor past end" });
        }
        if self.cursor(Cursor::Last) >= self.capacity {
            return Err(BufferError::CorruptHeader { reason: "last cursor past end" });
        }
        Ok(())
    }

    /// Reset all cursors, discarding the history
    pub fn power_on_initialize(&mut self) {
        self.set_cursor(Cursor::Start, 0);
        self.set_cursor(Cursor::First, 0);
        self.set_cursor(Cursor::Last, 0);
        self.set_cursor(Cursor::End, self.capacity);
    }

    /// Number of record slots in the block
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Give the block back, header and records included
    pub fn into_block(self) -> B {
        self.block
    }

    /// Append a sample, dropping the oldest one when the ring is full
    pub fn write(&mut self, signal: SignalType, timestamp: Timestamp, value: f32) {
        let last = self.cursor(Cursor::Last);
        let record = Sample::new(signal, timestamp, value).encode();
        let offset = Self::slot_offset(last);
        self.block.as_mut()[offset..offset + SAMPLE_SIZE].copy_from_slice(&record);

        let next = self.advance(last);
        self.set_cursor(Cursor::Last, next);

        let first = self.cursor(Cursor::First);
        if next == first {
            self.set_cursor(Cursor::First, self.advance(first));
        }
    }

    /// Newest sample of `signal`, if any is live
    pub fn last_entry(&self, signal: SignalType) -> Option<Sample> {
        self.newest_first()
            .find(|&slot| self.slot_code(slot) == signal.code())
            .and_then(|slot| self.read_slot(slot))
    }

    /// Visit samples of `signal` newest first, within `window_ms` of `now`
    ///
    /// The walk ends at the first sample of any type older than the window.
    pub fn for_each_reverse<F>(&self, signal: SignalType, now: Timestamp, window_ms: Timestamp, mut visitor: F)
    where
        F: FnMut(&Sample),
    {
        for slot in self.newest_first() {
            if age(now, self.slot_time(slot)) > window_ms {
                return;
            }
            if self.slot_code(slot) == signal.code() {
                if let Some(sample) = self.read_slot(slot) {
                    visitor(&sample);
                }
            }
        }
    }

    /// Visit samples of `signal` oldest first, within `window_ms` of `now`
    ///
    /// The starting point is the oldest in-window sample of `signal` found by
    /// the same backward walk as [`for_each_reverse`](Self::for_each_reverse).
    pub fn for_each<F>(&self, signal: SignalType, now: Timestamp, window_ms: Timestamp, mut visitor: F)
    where
        F: FnMut(&Sample),
    {
        let Some(mut slot) = self.window_start(signal, now, window_ms) else {
            return;
        };

        let last = self.cursor(Cursor::Last);
        while slot != last {
            if self.slot_code(slot) == signal.code() {
                if let Some(sample) = self.read_slot(slot) {
                    visitor(&sample);
                }
            }
            slot = self.advance(slot);
        }
    }

    fn window_start(&self, signal: SignalType, now: Timestamp, window_ms: Timestamp) -> Option<usize> {
        let mut found = None;

        for slot in self.newest_first() {
            if age(now, self.slot_time(slot)) > window_ms {
                break;
            }
            if self.slot_code(slot) == signal.code() {
                found = Some(slot);
            }
        }

        found
    }

    /// Next sample of a full export, oldest first
    ///
    /// Records with an unreadable type tag (only possible after a warm start
    /// over damaged memory) are skipped.
    pub fn drain_next(&self, cursor: &mut DrainCursor) -> Option<Sample> {
        loop {
            let slot = self.drain_next_slot(cursor)?;
            if let Some(sample) = self.read_slot(slot) {
                return Some(sample);
            }
        }
    }

    /// Next raw record of a full export, oldest first
    pub fn drain_next_encoded(&self, cursor: &mut DrainCursor) -> Option<&[u8]> {
        let slot = self.drain_next_slot(cursor)?;
        let offset = Self::slot_offset(slot);
        Some(&self.block.as_ref()[offset..offset + SAMPLE_SIZE])
    }

    fn drain_next_slot(&self, cursor: &mut DrainCursor) -> Option<usize> {
        let next = match cursor.position {
            None => self.cursor(Cursor::First),
            Some(slot) => self.advance(slot),
        };

        if next == self.cursor(Cursor::Last) {
            return None;
        }

        cursor.position = Some(next);
        Some(next)
    }

    /// All live samples, oldest first
    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        let mut cursor = DrainCursor::new();
        core::iter::from_fn(move || self.drain_next(&mut cursor))
    }

    /// Live sample count as reported by the cursor difference
    ///
    /// Once `last` has wrapped below `first` this reports the full capacity,
    /// one more than the samples actually live. Use [`len`](Self::len) for
    /// the exact count.
    pub fn used_count(&self) -> usize {
        let first = self.cursor(Cursor::First);
        let last = self.cursor(Cursor::Last);

        if last >= first {
            last - first
        } else {
            self.capacity
        }
    }

    /// Exact number of live samples
    pub fn len(&self) -> usize {
        let first = self.cursor(Cursor::First);
        let last = self.cursor(Cursor::Last);
        (last + self.capacity - first) % self.capacity
    }

    /// `true` when no sample is live
    pub fn is_empty(&self) -> bool {
        self.cursor(Cursor::First) == self.cursor(Cursor::Last)
    }

    /// Live slot indices from newest to oldest
    fn newest_first(&self) -> impl Iterator<Item = usize> + '_ {
        let last = self.cursor(Cursor::Last);
        let capacity = self.capacity;
        (0..self.len()).map(move |back| (last + capacity - 1 - back) % capacity)
    }

    fn advance(&self, slot: usize) -> usize {
        (slot + 1) % self.capacity
    }

    const fn slot_offset(slot: usize) -> usize {
        HEADER_SIZE + slot * SAMPLE_SIZE
    }

    fn slot_code(&self, slot: usize) -> u16 {
        let bytes = self.block.as_ref();
        let offset = Self::slot_offset(slot);
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn slot_time(&self, slot: usize) -> Timestamp {
        let bytes = self.block.as_ref();
        let offset = Self::slot_offset(slot) + 2;
        u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
    }

    fn read_slot(&self, slot: usize) -> Option<Sample> {
        let offset = Self::slot_offset(slot);
        Sample::decode(&self.block.as_ref()[offset..offset + SAMPLE_SIZE]).ok()
    }

    fn cursor(&self, cursor: Cursor) -> usize {
        let bytes = self.block.as_ref();
        let offset = cursor as usize;
        u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]]) as usize
    }

    fn set_cursor(&mut self, cursor: Cursor, slot: usize) {
        let offset = cursor as usize;
        self.block.as_mut()[offset..offset + 4].copy_from_slice(&(slot as u32).to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_BLOCK_SIZE;

    extern crate std;
    use std::vec;
    use std::vec::Vec;

    const fn block_for(slots: usize) -> usize {
        HEADER_SIZE + slots * SAMPLE_SIZE
    }

    fn interleaved() -> RingBuffer<Vec<u8>> {
        let mut ring = RingBuffer::cold_start(vec![0u8; DEFAULT_BLOCK_SIZE]).unwrap();
        for i in 0..10u32 {
            ring.write(SignalType::GridPower, i * 100, 100.0 + i as f32);
            ring.write(SignalType::GenerationPower, i * 100 + 2, 200.0 + i as f32);
        }
        ring
    }

    #[test]
    fn empty_buffer() {
        let ring = RingBuffer::cold_start(vec![0u8; DEFAULT_BLOCK_SIZE]).unwrap();

        assert_eq!(ring.capacity(), 408);
        assert_eq!(ring.used_count(), 0);
        assert!(ring.is_empty());
        for signal in SignalType::ALL {
            assert!(ring.last_entry(signal).is_none());
        }
    }

    #[test]
    fn block_too_small() {
        let result = RingBuffer::cold_start([0u8; block_for(1)]);
        assert_eq!(
            result.err(),
            Some(BufferError::BlockTooSmall { len: 26, required: 36 })
        );
        assert!(RingBuffer::cold_start([0u8; block_for(2)]).is_ok());
    }

    #[test]
    fn last_entry_per_type() {
        let ring = interleaved();

        let grid = ring.last_entry(SignalType::GridPower).unwrap();
        assert_eq!(grid.timestamp, 900);
        assert_eq!(grid.value, 109.0);

        let generation = ring.last_entry(SignalType::GenerationPower).unwrap();
        assert_eq!(generation.timestamp, 902);
        assert_eq!(generation.value, 209.0);

        assert!(ring.last_entry(SignalType::Limit).is_none());
        assert_eq!(ring.used_count(), 20);
    }

    #[test]
    fn forward_walk_is_chronological() {
        let ring = interleaved();

        let mut grid = Vec::new();
        ring.for_each(SignalType::GridPower, 1000, 1000, |s| grid.push((s.timestamp, s.value)));
        let expected: Vec<_> = (0..10u32).map(|i| (i * 100, 100.0 + i as f32)).collect();
        assert_eq!(grid, expected);

        let mut generation = Vec::new();
        ring.for_each(SignalType::GenerationPower, 1000, 1000, |s| generation.push(s.timestamp));
        let expected: Vec<_> = (0..10u32).map(|i| i * 100 + 2).collect();
        assert_eq!(generation, expected);
    }

    #[test]
    fn reverse_walk_is_newest_first() {
        let ring = interleaved();

        let mut times = Vec::new();
        ring.for_each_reverse(SignalType::GridPower, 1000, 1000, |s| times.push(s.timestamp));
        let expected: Vec<_> = (0..10u32).rev().map(|i| i * 100).collect();
        assert_eq!(times, expected);
    }

    #[test]
    fn full_buffer_drops_oldest() {
        let mut ring = RingBuffer::cold_start(vec![0u8; block_for(5)]).unwrap();
        for i in 0..10u32 {
            ring.write(SignalType::GridPower, i * 100, 100.0 + i as f32);
        }

        let mut forward = Vec::new();
        ring.for_each(SignalType::GridPower, 1000, 1000, |s| forward.push(s.timestamp));
        assert_eq!(forward, vec![600, 700, 800, 900]);

        let mut reverse = Vec::new();
        ring.for_each_reverse(SignalType::GridPower, 1000, 1000, |s| reverse.push(s.value));
        assert_eq!(reverse, vec![109.0, 108.0, 107.0, 106.0]);

        assert_eq!(ring.len(), 4);
        assert_eq!(ring.last_entry(SignalType::GridPower).unwrap().timestamp, 900);
    }

    #[test]
    fn used_count_reports_capacity_after_wrap() {
        let mut ring = RingBuffer::cold_start(vec![0u8; block_for(5)]).unwrap();
        for i in 0..10u32 {
            ring.write(SignalType::GridPower, i, 0.0);
        }

        // last wrapped to slot 0, first sits at slot 1
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.used_count(), 5);
    }

    #[test]
    fn window_excludes_old_samples() {
        let mut ring = RingBuffer::cold_start(vec![0u8; DEFAULT_BLOCK_SIZE]).unwrap();
        let mut now = 0;
        for _ in 0..10 {
            ring.write(SignalType::GridPower, now, 0.0);
            ring.write(SignalType::GenerationPower, now + 1, 0.0);
            now += 2;
        }
        now += 1000;
        for _ in 0..10 {
            ring.write(SignalType::GridPower, now, 0.0);
            ring.write(SignalType::GenerationPower, now + 1, 0.0);
            now += 2;
        }

        assert_eq!(ring.last_entry(SignalType::GridPower).unwrap().timestamp, now - 2);
        assert_eq!(ring.last_entry(SignalType::GenerationPower).unwrap().timestamp, now - 1);

        let mut count = 0;
        ring.for_each(SignalType::GridPower, now, 50, |_| count += 1);
        assert_eq!(count, 10);

        count = 0;
        ring.for_each_reverse(SignalType::GenerationPower, now, 50, |_| count += 1);
        assert_eq!(count, 10);
    }

    #[test]
    fn old_sample_of_other_type_stops_the_walk() {
        let mut ring = RingBuffer::cold_start(vec![0u8; DEFAULT_BLOCK_SIZE]).unwrap();
        ring.write(SignalType::GridPower, 9_000, 1.0);
        // stale sample written late, e.g. a backdated reading
        ring.write(SignalType::Limit, 100, 0.0);
        ring.write(SignalType::GridPower, 9_500, 2.0);

        let mut seen = Vec::new();
        ring.for_each_reverse(SignalType::GridPower, 10_000, 5_000, |s| seen.push(s.value));
        assert_eq!(seen, vec![2.0]);

        seen.clear();
        ring.for_each(SignalType::GridPower, 10_000, 5_000, |s| seen.push(s.value));
        assert_eq!(seen, vec![2.0]);
    }

    #[test]
    fn window_cutoff_saturates_at_zero() {
        let ring = interleaved();

        let mut count = 0;
        ring.for_each_reverse(SignalType::GridPower, 500, 60_000, |_| count += 1);
        assert_eq!(count, 10);
    }

    #[test]
    fn window_follows_clock_across_wrap() {
        let mut ring = RingBuffer::cold_start(vec![0u8; DEFAULT_BLOCK_SIZE]).unwrap();
        ring.write(SignalType::GridPower, u32::MAX - 30_000, 900.0);
        ring.write(SignalType::GridPower, u32::MAX - 500, 300.0);
        ring.write(SignalType::GridPower, 2_000, 400.0);

        let mut seen = Vec::new();
        ring.for_each_reverse(SignalType::GridPower, 4_000, 20_000, |s| seen.push(s.value));
        assert_eq!(seen, vec![400.0, 300.0]);

        seen.clear();
        ring.for_each(SignalType::GridPower, 4_000, 20_000, |s| seen.push(s.value));
        assert_eq!(seen, vec![300.0, 400.0]);
    }

    #[test]
    fn drain_visits_every_live_sample() {
        let ring = interleaved();

        let mut cursor = DrainCursor::new();
        let mut drained = Vec::new();
        while let Some(sample) = ring.drain_next(&mut cursor) {
            drained.push(sample);
        }

        assert_eq!(drained.len(), 20);
        assert_eq!(drained[0], Sample::new(SignalType::GridPower, 0, 100.0));
        assert_eq!(drained[19], Sample::new(SignalType::GenerationPower, 902, 209.0));
        assert!(ring.drain_next(&mut cursor).is_none());
    }

    #[test]
    fn drain_after_wrap_starts_at_oldest() {
        let mut ring = RingBuffer::cold_start(vec![0u8; block_for(4)]).unwrap();
        for i in 0..7u32 {
            ring.write(SignalType::Limit, i, i as f32);
        }

        let times: Vec<_> = ring.iter().map(|s| s.timestamp).collect();
        assert_eq!(times, vec![4, 5, 6]);
    }

    #[test]
    fn warm_start_keeps_history() {
        let mut ring = RingBuffer::cold_start(vec![0u8; block_for(8)]).unwrap();
        ring.write(SignalType::GridPower, 10, 1.5);
        ring.write(SignalType::Limit, 20, 300.0);

        let ring = RingBuffer::warm_start(ring.into_block()).unwrap();
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.last_entry(SignalType::Limit).unwrap().value, 300.0);
    }

    #[test]
    fn warm_start_rejects_foreign_header() {
        let mut block = vec![0u8; block_for(8)];
        block[12..16].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(
            RingBuffer::warm_start(block),
            Err(BufferError::CorruptHeader { .. })
        ));

        let mut block = vec![0u8; block_for(8)];
        block[4..8].copy_from_slice(&8u32.to_le_bytes());
        block[12..16].copy_from_slice(&8u32.to_le_bytes());
        assert!(matches!(
            RingBuffer::warm_start(block),
            Err(BufferError::CorruptHeader { .. })
        ));
    }

    #[test]
    fn power_on_initialize_discards_history() {
        let mut ring = interleaved();
        ring.power_on_initialize();
        assert!(ring.is_empty());
        assert!(ring.last_entry(SignalType::GridPower).is_none());
    }
}
