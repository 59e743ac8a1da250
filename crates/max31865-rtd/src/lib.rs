//! `max31865-rtd` is an architecture-agnostic driver for the `MAX31865`
//! resistance-to-digital converter, the front end used to read platinum
//! resistance temperature detectors (RTDs) such as a `PT100` or a `PT1000`.
//!
//! The chip measures the ratio between the RTD and a reference resistor and
//! exposes it as a 15-bit value in its RTD data registers. This crate:
//!
//! - encodes and decodes the configuration register
//! - sequences one-shot and automatic conversions, including the bias
//!   settling and conversion delays the chip requires
//! - reads and clears the fault status
//! - converts the raw ratio into degrees Celsius
//!
//! The blocking driver is built on the [`embedded_hal::spi::SpiDevice`] and
//! [`embedded_hal::delay::DelayNs`] traits. With the `async` feature (enabled
//! by default) the [`asynch`] module provides the same driver on top of
//! `embedded-hal-async`.
//!
//! A driver instance exclusively owns its SPI device. The configuration
//! read-modify-write sequences are not atomic, so a driver shared between
//! tasks must be wrapped in an external lock.
//!
//! For detailed specifications, refer to the
//! [datasheet](https://www.analog.com/media/en/technical-documentation/data-sheets/MAX31865.pdf).

#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]

/// Asynchronous driver.
#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod asynch;

/// Configuration register encoding and decoding.
pub mod config;
/// Error management.
pub mod error;
/// Fault status decoding.
pub mod fault;
/// Conversion from raw ratio to resistance and temperature.
pub mod rtd;

mod blocking;
mod registers;

pub use blocking::Max31865;
pub use config::{Config, FaultDetection, Filter, Wires};
pub use error::{ErrorKind, Max31865Error};
pub use fault::{Fault, Faults};
pub use rtd::{RtdParameters, resistance, temperature};
