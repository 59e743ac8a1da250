//! Typed view over the fault status register.
//!
//! The driver hands the register back as a raw byte; [`Faults`] maps its bits
//! to the fault sources listed in the datasheet.

/// A single fault source reported by the fault status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The RTD ratio exceeded the high fault threshold.
    HighThreshold,
    /// The RTD ratio fell below the low fault threshold.
    LowThreshold,
    /// `REFIN-` is above 85% of the bias voltage.
    RefInHigh,
    /// `REFIN-` is below 85% of the bias voltage, with `FORCE-` open.
    RefInLowForceOpen,
    /// `RTDIN-` is below 85% of the bias voltage, with `FORCE-` open.
    RtdInLowForceOpen,
    /// Overvoltage or undervoltage on one of the inputs.
    OverUnderVoltage,
}

impl Fault {
    const ALL: [Self; 6] = [
        Self::HighThreshold,
        Self::LowThreshold,
        Self::RefInHigh,
        Self::RefInLowForceOpen,
        Self::RtdInLowForceOpen,
        Self::OverUnderVoltage,
    ];

    /// Returns the bitmask of this fault in the fault status register.
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::HighThreshold => 1 << 7,
            Self::LowThreshold => 1 << 6,
            Self::RefInHigh => 1 << 5,
            Self::RefInLowForceOpen => 1 << 4,
            Self::RtdInLowForceOpen => 1 << 3,
            Self::OverUnderVoltage => 1 << 2,
        }
    }

    /// Returns a human-readable description of this fault.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::HighThreshold => "RTD High Threshold",
            Self::LowThreshold => "RTD Low Threshold",
            Self::RefInHigh => "REFIN- > 0.85 x VBIAS",
            Self::RefInLowForceOpen => "REFIN- < 0.85 x VBIAS (FORCE- open)",
            Self::RtdInLowForceOpen => "RTDIN- < 0.85 x VBIAS (FORCE- open)",
            Self::OverUnderVoltage => "Overvoltage/Undervoltage",
        }
    }
}

impl core::fmt::Display for Fault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.description())
    }
}

/// The decoded fault status register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Faults(u8);

impl Faults {
    /// Wraps a raw fault status byte.
    #[must_use]
    pub const fn from_register(status: u8) -> Self {
        Self(status)
    }

    /// Returns the raw fault status byte.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` when any fault bit is set.
    #[must_use]
    pub const fn has_fault(self) -> bool {
        self.0 != 0
    }

    /// Returns `true` when the given fault is set.
    #[must_use]
    pub const fn contains(self, fault: Fault) -> bool {
        self.0 & fault.bit() != 0
    }

    /// Iterates over the active faults, from the highest bit down.
    pub fn iter(self) -> impl Iterator<Item = Fault> {
        Fault::ALL
            .into_iter()
            .filter(move |fault| self.contains(*fault))
    }
}

impl From<u8> for Faults {
    fn from(status: u8) -> Self {
        Self::from_register(status)
    }
}
