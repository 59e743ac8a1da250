use crate::registers::{
    CONFIG_AUTO_CONVERSION, CONFIG_FAULT_DETECTION_SHIFT, CONFIG_FILTER_50HZ, CONFIG_THREE_WIRE,
    CONFIG_VBIAS,
};

/// RTD wiring.
///
/// Two- and four-wire connections share the same configuration bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Wires {
    /// Two- or four-wire RTD.
    #[default]
    TwoOrFour = 0,
    /// Three-wire RTD.
    Three = 1,
}

/// Fault detection cycle control.
///
/// Only the low bit of this field is read back from the chip, so
/// [`FaultDetection::RunManual`] decodes as [`FaultDetection::NoAction`] and
/// [`FaultDetection::FinishManual`] decodes as [`FaultDetection::Automatic`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FaultDetection {
    /// No fault detection cycle.
    #[default]
    NoAction = 0,
    /// Fault detection with automatic delay.
    Automatic = 1,
    /// Run the first step of a manual fault detection cycle.
    RunManual = 2,
    /// Finish a manual fault detection cycle.
    FinishManual = 3,
}

impl FaultDetection {
    const fn from_low_bit(bit: u8) -> Self {
        if bit & 1 == 0 {
            Self::NoAction
        } else {
            Self::Automatic
        }
    }
}

/// Mains noise rejection filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Filter {
    /// 60 Hz rejection.
    #[default]
    Hz60 = 0,
    /// 50 Hz rejection.
    Hz50 = 1,
}

/// Acquisition settings held in the configuration register.
///
/// The write-only bits of the register (one-shot trigger and fault status
/// clear) are not part of a [`Config`]: [`Config::encode`] always leaves
/// them cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Bias voltage enabled.
    pub vbias: bool,
    /// Continuous conversions instead of one-shot.
    pub auto_conversion: bool,
    /// RTD wiring.
    pub wires: Wires,
    /// Fault detection cycle.
    pub fault_detection: FaultDetection,
    /// Mains filter.
    pub filter: Filter,
}

impl Config {
    /// Creates a [`Config`] with bias off, one-shot conversions, a two- or
    /// four-wire RTD, no fault detection and the 60 Hz filter.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            vbias: false,
            auto_conversion: false,
            wires: Wires::TwoOrFour,
            fault_detection: FaultDetection::NoAction,
            filter: Filter::Hz60,
        }
    }

    /// Sets the bias voltage.
    #[must_use]
    pub const fn vbias(mut self, vbias: bool) -> Self {
        self.vbias = vbias;
        self
    }

    /// Sets the conversion mode.
    #[must_use]
    pub const fn auto_conversion(mut self, auto_conversion: bool) -> Self {
        self.auto_conversion = auto_conversion;
        self
    }

    /// Sets the RTD wiring.
    #[must_use]
    pub const fn wires(mut self, wires: Wires) -> Self {
        self.wires = wires;
        self
    }

    /// Sets the fault detection cycle.
    #[must_use]
    pub const fn fault_detection(mut self, fault_detection: FaultDetection) -> Self {
        self.fault_detection = fault_detection;
        self
    }

    /// Sets the mains filter.
    #[must_use]
    pub const fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Encodes the configuration into the register byte.
    #[must_use]
    pub const fn encode(self) -> u8 {
        let mut byte = 0;
        if self.vbias {
            byte |= CONFIG_VBIAS;
        }
        if self.auto_conversion {
            byte |= CONFIG_AUTO_CONVERSION;
        }
        if let Wires::Three = self.wires {
            byte |= CONFIG_THREE_WIRE;
        }
        byte |= (self.fault_detection as u8) << CONFIG_FAULT_DETECTION_SHIFT;
        if let Filter::Hz50 = self.filter {
            byte |= CONFIG_FILTER_50HZ;
        }
        byte
    }

    /// Decodes a register byte.
    ///
    /// Every byte decodes to some configuration. Write-only bits are
    /// ignored and the fault detection cycle is recovered from its low bit
    /// only.
    #[must_use]
    pub const fn decode(byte: u8) -> Self {
        Self {
            vbias: byte & CONFIG_VBIAS != 0,
            auto_conversion: byte & CONFIG_AUTO_CONVERSION != 0,
            wires: if byte & CONFIG_THREE_WIRE != 0 {
                Wires::Three
            } else {
                Wires::TwoOrFour
            },
            fault_detection: FaultDetection::from_low_bit(byte >> CONFIG_FAULT_DETECTION_SHIFT),
            filter: if byte & CONFIG_FILTER_50HZ != 0 {
                Filter::Hz50
            } else {
                Filter::Hz60
            },
        }
    }
}

impl From<Config> for u8 {
    fn from(config: Config) -> Self {
        config.encode()
    }
}

impl From<u8> for Config {
    fn from(byte: u8) -> Self {
        Self::decode(byte)
    }
}
