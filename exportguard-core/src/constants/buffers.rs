//! Buffer Sizes and Record Layout
//!
//! The sample history lives in one caller-supplied block so that it can be
//! placed in memory that survives a warm reset (PSRAM on the ESP32).

/// Size of one packed record in bytes.
///
/// Layout (little-endian):
/// - 2 bytes signal type tag
/// - 4 bytes timestamp (ms)
/// - 4 bytes value (`f32`)
pub const SAMPLE_SIZE: usize = 10;

/// Size of the block header in bytes.
///
/// Four `u32` cursors: `start`, `first`, `last`, `end`.
pub const HEADER_SIZE: usize = 16;

/// Smallest number of slots a block must provide.
///
/// One slot always stays free to tell "full" from "empty", so two slots are
/// needed to hold a single sample.
pub const MIN_SLOTS: usize = 2;

/// Default backing block size in bytes.
///
/// 4096 bytes hold 408 records, about seven minutes of one grid and one
/// generation reading per second.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Maximum number of inverter DC channels tracked by the controller.
pub const MAX_CHANNELS: usize = 6;

/// Debug accumulators are cleared once they grow past this many bytes.
pub const DEBUG_RESET_LEN: usize = 30;

/// Capacity of one debug accumulator in bytes.
pub const DEBUG_CAPACITY: usize = 128;
