use core::result::Result;

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;

use log::{debug, error, trace};

use crate::config::Config;
use crate::error::Max31865Error;
use crate::registers::{
    CONFIG_FAULT_STATUS_CLEAR, CONFIG_ONE_SHOT, ONE_SHOT_CONVERSION_MS, RTD_LEN, Register,
    VBIAS_SETTLE_MS, raw_ratio, read_operations, write_operations,
};
use crate::rtd::{self, RtdParameters};

/// The blocking `MAX31865` driver.
///
/// Every method takes `&mut self` and blocks for the whole bus sequence,
/// including the settling delays, so a one-shot [`Max31865::temperature`]
/// call lasts about 75 ms.
pub struct Max31865<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    spi: SPI,
    delay: D,
    // Configuration last set by the caller.
    config: Config,
    rtd: RtdParameters,
}

impl<SPI, D> Max31865<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    /// Brings up a [`Max31865`] driver: takes ownership of the SPI device and
    /// the delay provider, then writes the initial configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    ///
    /// - The reference or nominal resistance is not a positive finite number
    /// - Writing the initial configuration fails
    pub fn begin(
        spi: SPI,
        delay: D,
        config: Config,
        rtd: RtdParameters,
    ) -> Result<Self, Max31865Error<SPI::Error>> {
        if !rtd.is_valid() {
            error!("Invalid RTD parameters: {rtd:?}");
            return Err(Max31865Error::InvalidParameters);
        }

        let mut max31865 = Self {
            spi,
            delay,
            config,
            rtd,
        };

        max31865.set_config(config).map_err(|e| match e {
            Max31865Error::Spi(e) => {
                error!("Failed to write the initial configuration");
                Max31865Error::Init(e)
            }
            e => e,
        })?;

        debug!("MAX31865 configured: {config:?}, {rtd:?}");

        Ok(max31865)
    }

    /// Releases the SPI device and the delay provider.
    ///
    /// The chip is left in its current state.
    #[must_use]
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }

    /// Writes a configuration to the chip and caches it.
    ///
    /// # Errors
    ///
    /// Returns an error if the register write fails. The configuration is
    /// cached even in that case.
    pub fn set_config(&mut self, config: Config) -> Result<(), Max31865Error<SPI::Error>> {
        self.config = config;
        trace!("Write configuration {:#04x}", config.encode());
        self.write_register(Register::Config, &[config.encode()])
    }

    /// Reads the configuration back from the chip.
    ///
    /// # Errors
    ///
    /// Returns an error if the register read fails.
    pub fn config(&mut self) -> Result<Config, Max31865Error<SPI::Error>> {
        self.read_config_byte().map(Config::decode)
    }

    /// Returns the configuration last set with [`Max31865::set_config`],
    /// without any bus access.
    #[must_use]
    #[inline]
    pub const fn cached_config(&self) -> Config {
        self.config
    }

    /// Returns the RTD parameters given at bring-up.
    #[must_use]
    #[inline]
    pub const fn rtd_parameters(&self) -> RtdParameters {
        self.rtd
    }

    /// Clears the fault status bit of the configuration register, leaving
    /// every other bit as read.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing the configuration register
    /// fails.
    pub fn clear_fault(&mut self) -> Result<(), Max31865Error<SPI::Error>> {
        let byte = self.read_config_byte()?;
        self.write_register(Register::Config, &[byte & !CONFIG_FAULT_STATUS_CLEAR])
    }

    /// Reads the fault status register.
    ///
    /// The byte is returned as is; see [`Faults`](crate::Faults) to decode it.
    ///
    /// # Errors
    ///
    /// Returns an error if the register read fails.
    pub fn read_fault_status(&mut self) -> Result<u8, Max31865Error<SPI::Error>> {
        let mut status = [0u8; 1];
        self.read_register(Register::FaultStatus, &mut status)?;
        Ok(status[0])
    }

    /// Performs a full acquisition and returns the 15-bit RTD ratio:
    ///
    /// 1. Enables the bias voltage and waits for it to settle, unless it is
    ///    already on
    /// 2. Triggers a one-shot conversion and waits for it to complete, unless
    ///    automatic conversions are on
    /// 3. Reads the RTD registers and drops the fault bit
    /// 4. Writes the cached configuration back
    ///
    /// # Errors
    ///
    /// Returns an error if any transaction fails. The sequence stops at the
    /// failing step and the configuration is **not** restored.
    pub fn raw_ratio(&mut self) -> Result<u16, Max31865Error<SPI::Error>> {
        let config = self.config;

        if !config.vbias {
            trace!("Enable bias voltage");
            self.write_register(Register::Config, &[config.vbias(true).encode()])?;
            self.delay.delay_ms(VBIAS_SETTLE_MS);
        }

        if !config.auto_conversion {
            trace!("Trigger one-shot conversion");
            let byte = self.read_config_byte()?;
            self.write_register(Register::Config, &[byte | CONFIG_ONE_SHOT])?;
            self.delay.delay_ms(ONE_SHOT_CONVERSION_MS);
        }

        let mut bytes = [0u8; RTD_LEN];
        self.read_register(Register::RtdMsb, &mut bytes)?;
        let raw = raw_ratio(bytes);
        trace!("RTD ratio {raw}");

        self.write_register(Register::Config, &[config.encode()])?;

        Ok(raw)
    }

    /// Performs a full acquisition and returns the RTD resistance, in ohms.
    ///
    /// # Errors
    ///
    /// Same as [`Max31865::raw_ratio`].
    pub fn resistance(&mut self) -> Result<f32, Max31865Error<SPI::Error>> {
        let raw = self.raw_ratio()?;
        Ok(rtd::resistance(raw, &self.rtd))
    }

    /// Performs a full acquisition and returns the temperature, in degrees
    /// Celsius.
    ///
    /// # Notes
    ///
    /// An open or shorted RTD still produces a temperature. Check
    /// [`Max31865::read_fault_status`] before trusting an unexpected value.
    ///
    /// # Errors
    ///
    /// Same as [`Max31865::raw_ratio`].
    pub fn temperature(&mut self) -> Result<f32, Max31865Error<SPI::Error>> {
        let raw = self.raw_ratio()?;
        Ok(rtd::temperature(raw, &self.rtd))
    }

    fn read_config_byte(&mut self) -> Result<u8, Max31865Error<SPI::Error>> {
        let mut byte = [0u8; 1];
        self.read_register(Register::Config, &mut byte)?;
        Ok(byte[0])
    }

    fn write_register(
        &mut self,
        register: Register,
        data: &[u8],
    ) -> Result<(), Max31865Error<SPI::Error>> {
        let address = [register.write_address()];
        self.spi
            .transaction(&mut write_operations(&address, data))
            .map_err(|e| {
                error!("Failed to write register {register:?}");
                Max31865Error::Spi(e)
            })
    }

    fn read_register(
        &mut self,
        register: Register,
        buffer: &mut [u8],
    ) -> Result<(), Max31865Error<SPI::Error>> {
        let address = [register.read_address()];
        self.spi
            .transaction(&mut read_operations(&address, buffer))
            .map_err(|e| {
                error!("Failed to read register {register:?}");
                Max31865Error::Spi(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use embedded_hal::spi::{ErrorKind, ErrorType, Operation};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    use crate::config::{FaultDetection, Filter, Wires};

    // Records every requested delay, in nanoseconds.
    #[derive(Default)]
    struct RecordingDelay {
        delays: Vec<u64>,
    }

    impl DelayNs for RecordingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.delays.push(u64::from(ns));
        }

        fn delay_ms(&mut self, ms: u32) {
            self.delays.push(u64::from(ms) * 1_000_000);
        }
    }

    // Accepts a fixed number of transactions, then fails every following one.
    struct FailingSpi {
        limit: usize,
        attempts: usize,
    }

    impl FailingSpi {
        fn accepting(limit: usize) -> Self {
            Self { limit, attempts: 0 }
        }
    }

    impl ErrorType for FailingSpi {
        type Error = ErrorKind;
    }

    impl SpiDevice for FailingSpi {
        fn transaction(&mut self, _operations: &mut [Operation<'_, u8>]) -> Result<(), ErrorKind> {
            self.attempts += 1;
            if self.attempts > self.limit {
                return Err(ErrorKind::Other);
            }
            Ok(())
        }
    }

    fn write(address: u8, data: &[u8]) -> [SpiTransaction<u8>; 4] {
        [
            SpiTransaction::transaction_start(),
            SpiTransaction::write(address),
            SpiTransaction::write_vec(data.to_vec()),
            SpiTransaction::transaction_end(),
        ]
    }

    fn read(address: u8, response: &[u8]) -> [SpiTransaction<u8>; 4] {
        [
            SpiTransaction::transaction_start(),
            SpiTransaction::write(address),
            SpiTransaction::read_vec(response.to_vec()),
            SpiTransaction::transaction_end(),
        ]
    }

    fn expectations<const N: usize>(steps: [[SpiTransaction<u8>; 4]; N]) -> Vec<SpiTransaction<u8>> {
        steps.into_iter().flatten().collect()
    }

    fn driver<D: DelayNs>(
        config: Config,
        steps: &[SpiTransaction<u8>],
        delay: D,
    ) -> Max31865<SpiMock<u8>, D> {
        let mut all = write(0x80, &[config.encode()]).to_vec();
        all.extend_from_slice(steps);
        let spi = SpiMock::new(&all);

        Max31865::begin(spi, delay, config, RtdParameters::pt100()).unwrap()
    }

    #[test]
    fn test_begin_writes_config() {
        let config = Config::new()
            .vbias(true)
            .wires(Wires::Three)
            .filter(Filter::Hz50);
        let max31865 = driver(config, &[], NoopDelay::new());

        assert_eq!(max31865.cached_config(), config);
        assert_eq!(max31865.rtd_parameters(), RtdParameters::pt100());

        let (mut spi, _) = max31865.release();
        spi.done();
    }

    #[test]
    fn test_begin_invalid_parameters() {
        let mut spi = FailingSpi::accepting(0);
        let res = Max31865::begin(
            &mut spi,
            NoopDelay::new(),
            Config::new(),
            RtdParameters::new(430.0, 0.0),
        );

        assert!(matches!(res, Err(Max31865Error::InvalidParameters)));
        assert_eq!(spi.attempts, 0);
    }

    #[test]
    fn test_begin_bus_failure() {
        let mut spi = FailingSpi::accepting(0);
        let res = Max31865::begin(
            &mut spi,
            NoopDelay::new(),
            Config::new(),
            RtdParameters::pt100(),
        );

        assert!(matches!(res, Err(Max31865Error::Init(ErrorKind::Other))));
        assert_eq!(spi.attempts, 1);
    }

    #[test]
    fn test_set_config_is_idempotent() {
        let first = Config::new()
            .auto_conversion(true)
            .fault_detection(FaultDetection::Automatic);
        let steps = expectations([write(0x80, &[0b0100_0100]), write(0x80, &[0b0100_0100])]);
        let mut max31865 = driver(Config::new(), &steps, NoopDelay::new());

        max31865.set_config(first).unwrap();
        max31865.set_config(first).unwrap();
        assert_eq!(max31865.cached_config(), first);

        let (mut spi, _) = max31865.release();
        spi.done();
    }

    #[test]
    fn test_get_config() {
        let steps = expectations([read(0x00, &[0b1101_0001])]);
        let mut max31865 = driver(Config::new(), &steps, NoopDelay::new());

        let config = max31865.config().unwrap();
        assert_eq!(
            config,
            Config::new()
                .vbias(true)
                .auto_conversion(true)
                .wires(Wires::Three)
                .filter(Filter::Hz50)
        );

        let (mut spi, _) = max31865.release();
        spi.done();
    }

    #[test]
    fn test_clear_fault_preserves_other_bits() {
        let steps = expectations([
            read(0x00, &[0b1101_0011]),
            write(0x80, &[0b1101_0001]),
            read(0x00, &[0b1111_1110]),
            write(0x80, &[0b1111_1100]),
            read(0x00, &[0b1000_0001]),
            write(0x80, &[0b1000_0001]),
        ]);
        let mut max31865 = driver(Config::new(), &steps, NoopDelay::new());

        max31865.clear_fault().unwrap();
        max31865.clear_fault().unwrap();
        max31865.clear_fault().unwrap();

        let (mut spi, _) = max31865.release();
        spi.done();
    }

    #[test]
    fn test_read_fault_status() {
        let steps = expectations([read(0x07, &[0b1000_0100])]);
        let mut max31865 = driver(Config::new(), &steps, NoopDelay::new());

        assert_eq!(max31865.read_fault_status().unwrap(), 0b1000_0100);

        let (mut spi, _) = max31865.release();
        spi.done();
    }

    #[test]
    fn test_one_shot_sequence() {
        let config = Config::new();
        let steps = expectations([
            // Bias on.
            write(0x80, &[0b1000_0000]),
            // Trigger a one-shot conversion.
            read(0x00, &[0b1000_0000]),
            write(0x80, &[0b1010_0000]),
            // RTD registers: 0x4000 is a ratio of 0x2000.
            read(0x01, &[0x40, 0x00]),
            // Restore.
            write(0x80, &[0b0000_0000]),
        ]);
        let mut max31865 = driver(config, &steps, RecordingDelay::default());

        assert_eq!(max31865.raw_ratio().unwrap(), 0x2000);
        assert_eq!(max31865.cached_config(), config);

        let (mut spi, delay) = max31865.release();
        assert_eq!(delay.delays, [10_000_000, 65_000_000]);
        spi.done();
    }

    #[test]
    fn test_auto_conversion_sequence() {
        let config = Config::new()
            .vbias(true)
            .auto_conversion(true)
            .wires(Wires::Three);
        let steps = expectations([
            read(0x01, &[0x40, 0x01]),
            write(0x80, &[0b1101_0000]),
        ]);
        let mut max31865 = driver(config, &steps, RecordingDelay::default());

        assert_eq!(max31865.raw_ratio().unwrap(), 0x2000);

        let (mut spi, delay) = max31865.release();
        assert!(delay.delays.is_empty());
        spi.done();
    }

    #[test]
    fn test_bias_on_one_shot_sequence() {
        let config = Config::new().vbias(true);
        let steps = expectations([
            read(0x00, &[0b1000_0000]),
            write(0x80, &[0b1010_0000]),
            read(0x01, &[0x40, 0x00]),
            write(0x80, &[0b1000_0000]),
        ]);
        let mut max31865 = driver(config, &steps, RecordingDelay::default());

        max31865.raw_ratio().unwrap();

        let (mut spi, delay) = max31865.release();
        assert_eq!(delay.delays, [65_000_000]);
        spi.done();
    }

    #[test]
    fn test_auto_conversion_bias_off_sequence() {
        let config = Config::new().auto_conversion(true);
        let steps = expectations([
            write(0x80, &[0b1100_0000]),
            read(0x01, &[0x40, 0x00]),
            write(0x80, &[0b0100_0000]),
        ]);
        let mut max31865 = driver(config, &steps, RecordingDelay::default());

        max31865.raw_ratio().unwrap();

        let (mut spi, delay) = max31865.release();
        assert_eq!(delay.delays, [10_000_000]);
        spi.done();
    }

    #[test]
    fn test_failure_skips_restore() {
        let config = Config::new().vbias(true).auto_conversion(true);
        // Initial configuration write only.
        let mut spi = FailingSpi::accepting(1);
        let mut max31865 =
            Max31865::begin(&mut spi, NoopDelay::new(), config, RtdParameters::pt100()).unwrap();

        let res = max31865.temperature();
        assert!(matches!(res, Err(Max31865Error::Spi(ErrorKind::Other))));

        drop(max31865);
        // The failed RTD read is the last transaction.
        assert_eq!(spi.attempts, 2);
    }

    #[test]
    fn test_failure_aborts_one_shot_sequence() {
        // Initial configuration write and bias enable.
        let mut spi = FailingSpi::accepting(2);
        let mut delay = RecordingDelay::default();
        let mut max31865 =
            Max31865::begin(&mut spi, &mut delay, Config::new(), RtdParameters::pt100()).unwrap();

        let res = max31865.raw_ratio();
        assert!(matches!(res, Err(Max31865Error::Spi(ErrorKind::Other))));

        drop(max31865);
        // The configuration read of the one-shot trigger failed.
        assert_eq!(spi.attempts, 3);
        assert_eq!(delay.delays, [10_000_000]);
    }

    #[test]
    fn test_temperature() {
        let config = Config::new().vbias(true).auto_conversion(true);
        // 0x8000 is a ratio of 0x4000: 215 Ω with a 430 Ω reference.
        let steps = expectations([
            read(0x01, &[0x80, 0x00]),
            write(0x80, &[0b1100_0000]),
            read(0x01, &[0x80, 0x00]),
            write(0x80, &[0b1100_0000]),
        ]);
        let mut max31865 = driver(config, &steps, NoopDelay::new());

        let ohms = max31865.resistance().unwrap();
        assert!((ohms - 215.0).abs() < 1e-3);

        let temperature = max31865.temperature().unwrap();
        assert!((temperature - 308.3).abs() < 0.5);

        let (mut spi, _) = max31865.release();
        spi.done();
    }
}
