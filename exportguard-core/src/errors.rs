//! Error Types for the Export Limiter Core
//!
//! ## Design Philosophy
//!
//! The limiter runs on a device with a few hundred kilobytes of RAM, so the
//! error types follow the same rules as everything else in the hot path:
//!
//! 1. **Small Size**: every variant carries at most a couple of integers or
//!    floats.
//!
//! 2. **No Heap Allocation**: messages are `&'static str` only.
//!
//! 3. **Copy Semantics**: errors are returned by value and may be stored in the
//!    controller's last tick report.
//!
//! ## Error Categories
//!
//! ### Backing Store
//! - `BufferError::BlockTooSmall`: the caller handed the ring buffer a block that
//!   cannot hold two records. This is a precondition violation; the device is
//!   not expected to run without a valid backing store.
//! - `BufferError::CorruptHeader`: a warm attach found cursors that do not fit
//!   the block. The caller should fall back to a cold start.
//! - `BufferError::UnknownSignal` / `BufferError::TruncatedRecord`: decoding an
//!   exported dump failed.
//!
//! ### Actuator
//! - `ActuatorError::Unreachable`: the inverter did not answer.
//! - `ActuatorError::Rejected`: the inverter answered but refused the command.
//!
//! Actuator errors never escape the controller tick. They are logged and the
//! next tick simply retries with fresh data.
//!
//! ### Configuration
//! - `ConfigError::Invalid`: a snapshot could not be parsed or is contradictory.
//!
//! ## Example
//!
//! ```rust
//! use exportguard_core::errors::BufferError;
//! use exportguard_core::ring::RingBuffer;
//!
//! let block = [0u8; 8];
//! match RingBuffer::cold_start(block) {
//!     Err(BufferError::BlockTooSmall { len, required }) => {
//!         assert_eq!(len, 8);
//!         assert!(required > len);
//!     }
//!     _ => unreachable!(),
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for ring buffer and dump operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Backing store and record codec errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Block cannot hold the header plus two records
    #[error("Block of {len} bytes too small, need at least {required}")]
    BlockTooSmall {
        /// Length of the supplied block in bytes
        len: usize,
        /// Minimum usable block length in bytes
        required: usize,
    },

    /// Persisted header does not describe this block
    #[error("Corrupt buffer header: {reason}")]
    CorruptHeader {
        /// Which cursor check failed
        reason: &'static str,
    },

    /// Record carries a type tag outside the known signal set
    #[error("Unknown signal type tag {code}")]
    UnknownSignal {
        /// Raw type tag read from the record
        code: u16,
    },

    /// Dump length is not a whole number of records
    #[error("Truncated record: {len} trailing bytes")]
    TruncatedRecord {
        /// Number of bytes left over after the last whole record
        len: usize,
    },
}

/// Inverter command failures
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ActuatorError {
    /// Inverter did not answer
    #[error("Inverter unreachable")]
    Unreachable,

    /// Inverter refused the limit command
    #[error("Inverter rejected limit {limit}")]
    Rejected {
        /// The limit that was refused
        limit: f32,
    },
}

/// Configuration snapshot errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Snapshot could not be parsed or is self-contradictory
    #[error("Invalid configuration: {reason}")]
    Invalid {
        /// Why the snapshot was refused
        reason: &'static str,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for BufferError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::BlockTooSmall { len, required } =>
                defmt::write!(fmt, "Block {} bytes, need {}", len, required),
            Self::CorruptHeader { reason } =>
                defmt::write!(fmt, "Corrupt header: {}", reason),
            Self::UnknownSignal { code } =>
                defmt::write!(fmt, "Unknown signal {}", code),
            Self::TruncatedRecord { len } =>
                defmt::write!(fmt, "Truncated record, {} bytes", len),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ActuatorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Unreachable => defmt::write!(fmt, "Inverter unreachable"),
            Self::Rejected { limit } => defmt::write!(fmt, "Inverter rejected {}", limit),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Invalid { reason } => defmt::write!(fmt, "Invalid configuration: {}", reason),
        }
    }
}
