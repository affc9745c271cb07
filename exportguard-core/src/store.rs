//! Thread-Safe Signal Store
//!
//! ## Overview
//!
//! `SignalStore` puts one [`RingBuffer`] behind a mutex and stamps every write
//! with the injected clock. Meter clients push readings into it, the
//! controller pulls windowed aggregates out of it, and reporting code reads
//! charts and full dumps from it. All signal types share the one ring so the
//! history never grows past the block it was given.
//!
//! ## Locking
//!
//! Every query or update takes the lock for its own duration only. The one
//! exception is [`SignalStore::export_all`]: the returned [`Export`] holds the
//! lock until it has produced its last byte or is dropped, so writers block
//! for the whole dump. The buffer is a few kilobytes, so a dump finishes
//! quickly.
//!
//! ## Example
//!
//! ```rust
//! use exportguard_core::config::LimiterConfig;
//! use exportguard_core::sample::SignalType;
//! use exportguard_core::store::SignalStore;
//! use exportguard_core::time::ManualClock;
//!
//! let clock = ManualClock::new(0);
//! let store = SignalStore::with_block(vec![0u8; 4096], &clock).unwrap();
//!
//! for watts in [120.0, 80.0, 100.0] {
//!     clock.advance(1000);
//!     store.update(SignalType::GridPower, watts);
//! }
//!
//! assert_eq!(store.last_value(SignalType::GridPower), 100.0);
//! assert_eq!(store.min_over_window(SignalType::GridPower, 20_000), 80.0);
//!
//! let config = LimiterConfig::default().with_feed_in_level(50);
//! assert_eq!(store.blended_value(SignalType::GridPower, 20_000, &config), 100.0);
//! ```

use std::io;
use std::string::String;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::vec::Vec;

use heapless::String as DebugText;
use serde::Serialize;

use crate::config::LimiterConfig;
use crate::constants::buffers::{DEBUG_CAPACITY, DEBUG_RESET_LEN, SAMPLE_SIZE};
use crate::errors::BufferResult;
use crate::ring::{DrainCursor, RingBuffer};
use crate::sample::SignalType;
use crate::time::{TimeSource, Timestamp};

/// Free-text diagnostic streams
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugChannel {
    /// Grid meter window and blended value
    Grid,
    /// Generation meter window and blended value
    Generation,
    /// Inverter channel readings and reachability
    CalculatedLimit,
}

impl DebugChannel {
    const COUNT: usize = 3;

    const fn index(self) -> usize {
        self as usize
    }
}

struct StoreInner<B> {
    ring: RingBuffer<B>,
    debug: [DebugText<DEBUG_CAPACITY>; DebugChannel::COUNT],
}

/// One point of a chart series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Sample time in seconds
    pub x: f64,
    /// Sample value
    pub y: f32,
}

/// Shared, lock-protected sample history
pub struct SignalStore<B, T> {
    inner: Mutex<StoreInner<B>>,
    clock: T,
}

impl<B, T> SignalStore<B, T>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
    T: TimeSource,
{
    /// Wrap an already started ring buffer
    pub fn new(ring: RingBuffer<B>, clock: T) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                ring,
                debug: Default::default(),
            }),
            clock,
        }
    }

    /// Cold start a ring over `block` and wrap it
    pub fn with_block(block: B, clock: T) -> BufferResult<Self> {
        Ok(Self::new(RingBuffer::cold_start(block)?, clock))
    }

    /// Clock used to stamp writes
    pub fn clock(&self) -> &T {
        &self.clock
    }

    /// Current time of the store's clock
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner<B>> {
        // a panicking reader cannot leave the ring half-written
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `value` for `signal` at the current time
    ///
    /// The clock is read under the lock, so a writer held up by an export
    /// stamps the time it actually got in.
    pub fn update(&self, signal: SignalType, value: f32) {
        let mut inner = self.lock();
        let now = self.clock.now();
        inner.ring.write(signal, now, value);
    }

    /// Newest value of `signal`, 0.0 when none is stored
    pub fn last_value(&self, signal: SignalType) -> f32 {
        self.lock()
            .ring
            .last_entry(signal)
            .map_or(0.0, |sample| sample.value)
    }

    /// `(min, max)` of `signal` over the trailing window, `(0.0, 0.0)` when empty
    pub fn window_extremes(&self, signal: SignalType, window_ms: Timestamp) -> (f32, f32) {
        let now = self.clock.now();
        let mut extremes: Option<(f32, f32)> = None;

        self.lock().ring.for_each_reverse(signal, now, window_ms, |sample| {
            extremes = Some(match extremes {
                None => (sample.value, sample.value),
                Some((min, max)) => (min.min(sample.value), max.max(sample.value)),
            });
        });

        extremes.unwrap_or((0.0, 0.0))
    }

    /// Smallest value of `signal` in the window, 0.0 when empty
    pub fn min_over_window(&self, signal: SignalType, window_ms: Timestamp) -> f32 {
        self.window_extremes(signal, window_ms).0
    }

    /// Largest value of `signal` in the window, 0.0 when empty
    pub fn max_over_window(&self, signal: SignalType, window_ms: Timestamp) -> f32 {
        self.window_extremes(signal, window_ms).1
    }

    /// Interpolate between the window extremes using the feed-in level
    ///
    /// Grid and generation readings arrive unsynchronised, so the true value
    /// at any instant lies somewhere between the window's min and max. The
    /// factor is `feed_in_level / 100` for grid signals and its complement for
    /// generation signals, biasing both towards the same assumption.
    pub fn blended_value(&self, signal: SignalType, window_ms: Timestamp, config: &LimiterConfig) -> f32 {
        let (min, max) = self.window_extremes(signal, window_ms);
        min + (max - min) * config.blend_factor(signal.is_generation())
    }

    /// Window of `signal` as chart points, oldest first
    pub fn chart_points(&self, signal: SignalType, window_ms: Timestamp) -> Vec<ChartPoint> {
        let now = self.clock.now();
        let mut points = Vec::new();

        self.lock().ring.for_each(signal, now, window_ms, |sample| {
            points.push(ChartPoint {
                x: sample.timestamp as f64 / 1000.0,
                y: sample.value,
            });
        });

        points
    }

    /// Window of `signal` rendered as `[{"x":seconds,"y":value},...]`
    pub fn chart_json(&self, signal: SignalType, window_ms: Timestamp) -> String {
        let points = self.chart_points(signal, window_ms);
        serde_json::to_string(&points).unwrap_or_else(|_| String::from("[]"))
    }

    /// Start an exclusive dump of every live sample
    ///
    /// The store stays locked until the export reports completion or is
    /// dropped.
    pub fn export_all(&self) -> Export<'_, B> {
        let guard = self.lock();
        let total_len = guard.ring.len() * SAMPLE_SIZE;
        log_debug!("Export started: {} bytes", total_len);

        Export {
            guard: Some(guard),
            cursor: DrainCursor::new(),
            total_len,
        }
    }

    /// Append to a debug stream; streams past the reset length start over
    pub fn append_debug(&self, channel: DebugChannel, text: &str) {
        let mut inner = self.lock();
        let slot = &mut inner.debug[channel.index()];

        if slot.len() > DEBUG_RESET_LEN {
            slot.clear();
        }

        if slot.push_str(text).is_err() {
            slot.clear();
            for c in text.chars() {
                if slot.push(c).is_err() {
                    break;
                }
            }
        }
    }

    /// Return and clear a debug stream
    pub fn take_debug(&self, channel: DebugChannel) -> String {
        let mut inner = self.lock();
        let slot = &mut inner.debug[channel.index()];
        let text = String::from(slot.as_str());
        slot.clear();
        text
    }

    /// Exact number of live samples
    pub fn len(&self) -> usize {
        self.lock().ring.len()
    }

    /// `true` when nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.lock().ring.is_empty()
    }

    /// Release the ring, e.g. to hand its block to a warm restart
    pub fn into_ring(self) -> RingBuffer<B> {
        self.inner
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .ring
    }
}

/// Pull-based chunk producer for a full dump
///
/// Produced by [`SignalStore::export_all`]. Each [`fill`](Export::fill) copies
/// as many whole records as fit. The first call that produces nothing
/// releases the store lock; dropping the export early releases it too.
pub struct Export<'a, B> {
    guard: Option<MutexGuard<'a, StoreInner<B>>>,
    cursor: DrainCursor,
    total_len: usize,
}

impl<'a, B> Export<'a, B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Byte length of the whole dump, fixed when the export started
    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// Lock already released
    pub fn is_finished(&self) -> bool {
        self.guard.is_none()
    }

    /// Copy the next records into `out`, returning the bytes written
    ///
    /// A chunk smaller than one record yields 0 and ends the export.
    pub fn fill(&mut self, out: &mut [u8]) -> usize {
        let Some(guard) = self.guard.as_ref() else {
            return 0;
        };

        let mut written = 0;
        for chunk in out.chunks_exact_mut(SAMPLE_SIZE) {
            match guard.ring.drain_next_encoded(&mut self.cursor) {
                Some(record) => {
                    chunk.copy_from_slice(record);
                    written += SAMPLE_SIZE;
                }
                None => break,
            }
        }

        if written == 0 {
            self.guard = None;
            log_debug!("Export finished");
        }

        written
    }
}

impl<'a, B> io::Read for Export<'a, B>
where
    B: AsRef<[u8]> + AsMut<[u8]>,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.fill(buf))
    }
}
