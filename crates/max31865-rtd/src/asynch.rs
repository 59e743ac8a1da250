//! # Asynchronous MAX31865 driver
//!
//! The same driver as [`crate::Max31865`], built on the `embedded-hal-async`
//! SPI and delay traits. The bias settling and conversion delays are awaited
//! instead of blocking, so an executor can run other tasks during the 75 ms
//! of a one-shot acquisition.
//!
//! The acquisition sequence and its failure semantics are identical to the
//! blocking driver.

use core::result::Result;

use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiDevice;

use log::{debug, error, trace};

use crate::config::Config;
use crate::error::Max31865Error;
use crate::registers::{
    CONFIG_FAULT_STATUS_CLEAR, CONFIG_ONE_SHOT, ONE_SHOT_CONVERSION_MS, RTD_LEN, Register,
    VBIAS_SETTLE_MS, raw_ratio, read_operations, write_operations,
};
use crate::rtd::{self, RtdParameters};

/// The asynchronous `MAX31865` driver.
pub struct Max31865<SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    spi: SPI,
    delay: D,
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
    pub async fn begin(
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

        if let Err(e) = max31865.set_config(config).await {
            error!("Failed to write the initial configuration");
            return Err(match e {
                Max31865Error::Spi(e) => Max31865Error::Init(e),
                e => e,
            });
        }

        debug!("MAX31865 configured: {config:?}, {rtd:?}");

        Ok(max31865)
    }

    /// Releases the SPI device and the delay provider.
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
    pub async fn set_config(&mut self, config: Config) -> Result<(), Max31865Error<SPI::Error>> {
        self.config = config;
        trace!("Write configuration {:#04x}", config.encode());
        self.write_register(Register::Config, &[config.encode()]).await
    }

    /// Reads the configuration back from the chip.
    ///
    /// # Errors
    ///
    /// Returns an error if the register read fails.
    pub async fn config(&mut self) -> Result<Config, Max31865Error<SPI::Error>> {
        self.read_config_byte().await.map(Config::decode)
    }

    /// Returns the configuration last set with [`Max31865::set_config`].
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

    /// Clears the fault status bit of the configuration register.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing the configuration register
    /// fails.
    pub async fn clear_fault(&mut self) -> Result<(), Max31865Error<SPI::Error>> {
        let byte = self.read_config_byte().await?;
        self.write_register(Register::Config, &[byte & !CONFIG_FAULT_STATUS_CLEAR]).await
    }

    /// Reads the fault status register.
    ///
    /// # Errors
    ///
    /// Returns an error if the register read fails.
    pub async fn read_fault_status(&mut self) -> Result<u8, Max31865Error<SPI::Error>> {
        let mut status = [0u8; 1];
        self.read_register(Register::FaultStatus, &mut status).await?;
        Ok(status[0])
    }

    /// Performs a full acquisition and returns the 15-bit RTD ratio.
    ///
    /// # Errors
    ///
    /// Returns an error if any transaction fails. The configuration is not
    /// restored in that case.
    pub async fn raw_ratio(&mut self) -> Result<u16, Max31865Error<SPI::Error>> {
        let config = self.config;

        if !config.vbias {
            trace!("Enable bias voltage");
            self.write_register(Register::Config, &[config.vbias(true).encode()]).await?;
            self.delay.delay_ms(VBIAS_SETTLE_MS).await;
        }

        if !config.auto_conversion {
            trace!("Trigger one-shot conversion");
            let byte = self.read_config_byte().await?;
            self.write_register(Register::Config, &[byte | CONFIG_ONE_SHOT]).await?;
            self.delay.delay_ms(ONE_SHOT_CONVERSION_MS).await;
        }

        let mut bytes = [0u8; RTD_LEN];
        self.read_register(Register::RtdMsb, &mut bytes).await?;
        let raw = raw_ratio(bytes);
        trace!("RTD ratio {raw}");

        self.write_register(Register::Config, &[config.encode()]).await?;

        Ok(raw)
    }

    /// Performs a full acquisition and returns the RTD resistance, in ohms.
    ///
    /// # Errors
    ///
    /// Same as [`Max31865::raw_ratio`].
    pub async fn resistance(&mut self) -> Result<f32, Max31865Error<SPI::Error>> {
        let raw = self.raw_ratio().await?;
        Ok(rtd::resistance(raw, &self.rtd))
    }

    /// Performs a full acquisition and returns the temperature, in degrees
    /// Celsius.
    ///
    /// # Errors
    ///
    /// Same as [`Max31865::raw_ratio`].
    pub async fn temperature(&mut self) -> Result<f32, Max31865Error<SPI::Error>> {
        let raw = self.raw_ratio().await?;
        Ok(rtd::temperature(raw, &self.rtd))
    }

    async fn read_config_byte(&mut self) -> Result<u8, Max31865Error<SPI::Error>> {
        let mut byte = [0u8; 1];
        self.read_register(Register::Config, &mut byte).await?;
        Ok(byte[0])
    }

    async fn write_register(
        &mut self,
        register: Register,
        data: &[u8],
    ) -> Result<(), Max31865Error<SPI::Error>> {
        let address = [register.write_address()];
        self.spi
            .transaction(&mut write_operations(&address, data))
            .await
            .map_err(|e| {
                error!("Failed to write register {register:?}");
                Max31865Error::Spi(e)
            })
    }

    async fn read_register(
        &mut self,
        register: Register,
        buffer: &mut [u8],
    ) -> Result<(), Max31865Error<SPI::Error>> {
        let address = [register.read_address()];
        self.spi
            .transaction(&mut read_operations(&address, buffer))
            .await
            .map_err(|e| {
                error!("Failed to read register {register:?}");
                Max31865Error::Spi(e)
            })
    }
}
