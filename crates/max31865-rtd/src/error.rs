use core::fmt;

/// All possible error kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Errors encountered while bringing the driver up.
    Init,
    /// Errors caused by invalid RTD parameters.
    InvalidParameters,
    /// Errors encountered during a single bus transaction.
    Spi,
}

impl ErrorKind {
    pub(crate) const fn description(self) -> &'static str {
        match self {
            Self::Init => "Init",
            Self::InvalidParameters => "Invalid Parameters",
            Self::Spi => "Spi",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Errors that may occur when interacting with the `MAX31865`.
///
/// A failure in the middle of a multi-step sequence (bias enable, one-shot
/// trigger, restore) leaves the live configuration of the chip unknown: the
/// driver does not attempt to restore it. Call
/// [`Max31865::set_config`](crate::Max31865::set_config) again to resync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Max31865Error<E> {
    /// The initial configuration write failed during bring-up.
    Init(E),
    /// The reference or nominal resistance is not a positive finite number.
    InvalidParameters,
    /// A bus transaction failed.
    Spi(E),
}

impl<E> Max31865Error<E> {
    /// Returns the [`ErrorKind`] of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Init(_) => ErrorKind::Init,
            Self::InvalidParameters => ErrorKind::InvalidParameters,
            Self::Spi(_) => ErrorKind::Spi,
        }
    }
}

impl<E> From<E> for Max31865Error<E> {
    fn from(e: E) -> Self {
        Max31865Error::Spi(e)
    }
}

impl<E: fmt::Debug> fmt::Display for Max31865Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) | Self::Spi(e) => write!(f, "{}: {e:?}", self.kind()),
            Self::InvalidParameters => write!(
                f,
                "{}: resistances must be positive finite numbers",
                self.kind()
            ),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Max31865Error<E> {}
