use libm::{powf, sqrtf};

use crate::registers::RTD_FULL_SCALE;

// Callendar-Van Dusen coefficients for platinum RTDs (IEC 60751).
const RTD_A: f32 = 3.9083e-3;
const RTD_B: f32 = -5.775e-7;

// Fifth-order fit of temperature against resistance normalized to 100 Ω,
// from the lowest to the highest order.
const POLYNOMIAL: [f32; 6] = [-242.02, 2.2228, 2.5859e-3, 4.8260e-6, 2.8183e-8, 1.5243e-10];

const PT100_NOMINAL_OHMS: f32 = 100.0;
const PT100_REFERENCE_OHMS: f32 = 430.0;
const PT1000_NOMINAL_OHMS: f32 = 1000.0;
const PT1000_REFERENCE_OHMS: f32 = 4300.0;

/// Resistances of the measurement circuit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RtdParameters {
    /// Reference resistor, in ohms.
    pub reference: f32,
    /// RTD resistance at 0 °C, in ohms.
    pub nominal: f32,
}

impl RtdParameters {
    /// Creates [`RtdParameters`] from a reference and a nominal resistance,
    /// both in ohms.
    #[must_use]
    pub const fn new(reference: f32, nominal: f32) -> Self {
        Self { reference, nominal }
    }

    /// A `PT100` with the usual 430 Ω reference resistor.
    #[must_use]
    pub const fn pt100() -> Self {
        Self::new(PT100_REFERENCE_OHMS, PT100_NOMINAL_OHMS)
    }

    /// A `PT1000` with the usual 4300 Ω reference resistor.
    #[must_use]
    pub const fn pt1000() -> Self {
        Self::new(PT1000_REFERENCE_OHMS, PT1000_NOMINAL_OHMS)
    }

    /// Returns `true` when both resistances are positive finite numbers.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let positive = |ohms: f32| ohms.is_finite() && ohms > 0.0;
        positive(self.reference) && positive(self.nominal)
    }
}

/// Converts a 15-bit RTD ratio into the RTD resistance, in ohms.
#[must_use]
pub fn resistance(raw: u16, rtd: &RtdParameters) -> f32 {
    f32::from(raw) * rtd.reference / RTD_FULL_SCALE
}

/// Converts a 15-bit RTD ratio into a temperature, in degrees Celsius.
///
/// The Callendar-Van Dusen equation is solved for the temperature first and
/// its result is returned when strictly positive. Otherwise the
/// temperature comes from a fifth-order polynomial in the resistance.
///
/// The two branches do not meet at 0 °C. At or just below the nominal
/// resistance the polynomial yields about +15 °C, so readings close to
/// freezing are off by that much.
///
/// There is no error path: a ratio produced by an open or shorted RTD still
/// yields a number, so check the fault status before trusting it.
#[must_use]
pub fn temperature(raw: u16, rtd: &RtdParameters) -> f32 {
    let ohms = resistance(raw, rtd);

    let temperature = callendar_van_dusen(ohms, rtd.nominal);
    if temperature > 0.0 {
        return temperature;
    }

    polynomial(ohms, rtd.nominal)
}

// Solves R = R0 * (1 + A*T + B*T^2) for T.
fn callendar_van_dusen(ohms: f32, nominal: f32) -> f32 {
    const Z1: f32 = -RTD_A;
    const Z2: f32 = RTD_A * RTD_A - (4.0 * RTD_B);
    const Z4: f32 = 2.0 * RTD_B;
    let z3 = (4.0 * RTD_B) / nominal;

    (sqrtf(Z2 + z3 * ohms) + Z1) / Z4
}

fn polynomial(ohms: f32, nominal: f32) -> f32 {
    let normalized = ohms / nominal * 100.0;

    POLYNOMIAL
        .iter()
        .enumerate()
        .map(|(order, coefficient)| coefficient * powf(normalized, order as f32))
        .sum()
}
