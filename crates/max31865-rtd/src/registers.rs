// Register map and transaction framing.
//
// Each transaction starts with an address byte. The highest bit selects a
// write when set and a read when cleared, and the chip auto-increments the
// address while further bytes are clocked.

use embedded_hal::spi::Operation;

const WRITE_SELECT: u8 = 0x80;

/// Registers accessed by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Register {
    /// Configuration, 1 byte, read/write.
    Config = 0x00,
    /// RTD data MSB, followed by the LSB at `0x02`. Read-only.
    RtdMsb = 0x01,
    /// Fault status, 1 byte, read-only.
    FaultStatus = 0x07,
}

impl Register {
    pub(crate) const fn read_address(self) -> u8 {
        self as u8 & (WRITE_SELECT - 1)
    }

    pub(crate) const fn write_address(self) -> u8 {
        self as u8 | WRITE_SELECT
    }
}

// Configuration register bits.
pub(crate) const CONFIG_VBIAS: u8 = 1 << 7;
pub(crate) const CONFIG_AUTO_CONVERSION: u8 = 1 << 6;
pub(crate) const CONFIG_ONE_SHOT: u8 = 1 << 5;
pub(crate) const CONFIG_THREE_WIRE: u8 = 1 << 4;
pub(crate) const CONFIG_FAULT_DETECTION_SHIFT: u8 = 2;
pub(crate) const CONFIG_FAULT_STATUS_CLEAR: u8 = 1 << 1;
pub(crate) const CONFIG_FILTER_50HZ: u8 = 1 << 0;

// Number of bytes of the RTD data register pair.
pub(crate) const RTD_LEN: usize = 2;

// Full scale of the 15-bit RTD ratio.
pub(crate) const RTD_FULL_SCALE: f32 = 32768.0;

// Time for the bias voltage to settle before a conversion is valid.
pub(crate) const VBIAS_SETTLE_MS: u32 = 10;

// Maximum one-shot conversion time with the 50 Hz filter, rounded up.
pub(crate) const ONE_SHOT_CONVERSION_MS: u32 = 65;

/// Builds the operations of a register write: address byte, then payload.
pub(crate) fn write_operations<'a>(
    address: &'a [u8; 1],
    data: &'a [u8],
) -> [Operation<'a, u8>; 2] {
    [Operation::Write(address), Operation::Write(data)]
}

/// Builds the operations of a register read: address byte, then exactly
/// `buffer.len()` bytes clocked in.
pub(crate) fn read_operations<'a>(
    address: &'a [u8; 1],
    buffer: &'a mut [u8],
) -> [Operation<'a, u8>; 2] {
    [Operation::Write(address), Operation::Read(buffer)]
}

/// Extracts the 15-bit ratio from the RTD register pair.
///
/// The lowest bit of the LSB is the fault flag and is dropped.
// TODO: surface the fault flag once callers can opt into rejecting flagged samples.
pub(crate) const fn raw_ratio(bytes: [u8; RTD_LEN]) -> u16 {
    u16::from_be_bytes(bytes) >> 1
}
