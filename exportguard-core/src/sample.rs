//! Signal types and the packed sample record
//!
//! Every measurement the limiter keeps is one `Sample`: which signal it
//! belongs to, when it was taken and its value. On the wire and inside the
//! ring buffer block a sample is exactly [`SAMPLE_SIZE`] bytes:
//!
//! ```text
//! ┌────────┬──────────────┬──────────────┐
//! │ type   │ timestamp    │ value        │
//! │ u16 LE │ u32 LE (ms)  │ f32 LE       │
//! └────────┴──────────────┴──────────────┘
//!   0..2     2..6           6..10
//! ```

use core::convert::TryFrom;

use crate::constants::SAMPLE_SIZE;
use crate::errors::{BufferError, BufferResult};
use crate::time::Timestamp;

/// Which physical or computed quantity a sample represents
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalType {
    /// Power at the grid connection point (W, positive = import)
    GridPower = 0,
    /// Windowed minimum of the grid power
    GridPowerMin = 1,
    /// Windowed maximum of the grid power
    GridPowerMax = 2,
    /// Power produced by the inverter (W)
    GenerationPower = 3,
    /// Windowed minimum of the generation power
    GenerationMin = 4,
    /// Windowed maximum of the generation power
    GenerationMax = 5,
    /// Limit computed by the controller, sent or not
    CalculatedLimit = 6,
    /// Limit last accepted by the inverter
    Limit = 7,
}

impl SignalType {
    /// Every signal type, in tag order
    pub const ALL: [SignalType; 8] = [
        SignalType::GridPower,
        SignalType::GridPowerMin,
        SignalType::GridPowerMax,
        SignalType::GenerationPower,
        SignalType::GenerationMin,
        SignalType::GenerationMax,
        SignalType::CalculatedLimit,
        SignalType::Limit,
    ];

    /// Raw tag stored in a record
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Signals measured at the inverter side
    ///
    /// The feed-in blend factor is inverted for these.
    pub const fn is_generation(self) -> bool {
        matches!(
            self,
            SignalType::GenerationPower | SignalType::GenerationMin | SignalType::GenerationMax
        )
    }
}

impl TryFrom<u16> for SignalType {
    type Error = BufferError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        SignalType::ALL
            .get(code as usize)
            .copied()
            .ok_or(BufferError::UnknownSignal { code })
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SignalType {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "signal#{}", self.code())
    }
}

/// One timestamped reading; immutable once written
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Signal the value belongs to
    pub signal: SignalType,
    /// Write time (ms)
    pub timestamp: Timestamp,
    /// Reading in the signal's unit
    pub value: f32,
}

impl Sample {
    /// Build a sample
    pub const fn new(signal: SignalType, timestamp: Timestamp, value: f32) -> Self {
        Self {
            signal,
            timestamp,
            value,
        }
    }

    /// Pack into the 10-byte record layout
    pub fn encode(&self) -> [u8; SAMPLE_SIZE] {
        let mut out = [0u8; SAMPLE_SIZE];
        out[0..2].copy_from_slice(&self.signal.code().to_le_bytes());
        out[2..6].copy_from_slice(&self.timestamp.to_le_bytes());
        out[6..10].copy_from_slice(&self.value.to_le_bytes());
        out
    }

    /// Unpack the first record of `bytes`
    pub fn decode(bytes: &[u8]) -> BufferResult<Self> {
        if bytes.len() < SAMPLE_SIZE {
            return Err(BufferError::TruncatedRecord { len: bytes.len() });
        }

        let signal = SignalType::try_from(u16::from_le_bytes([bytes[0], bytes[1]]))?;
        let timestamp = u32::from_le_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
        let value = f32::from_le_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);

        Ok(Self::new(signal, timestamp, value))
    }
}
