//! Error definitions for the S1 module drivers.
//!
//! Every failure is returned by value; rail setters reject before touching
//! any register, with the single documented exception of the
//! [`PmicError::VauxTooLow`] commit-and-warn path on `set_vio`.

/// Errors reported by the PMIC regulator controller.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug)]
pub enum PmicError<E> {
    /// Two-wire transaction failed. Reads are retried once after a 100 µs
    /// backoff before this surfaces; writes are not retried.
    I2c(E),
    /// Chip-ID register did not read back the expected value. Wrong or
    /// unresponsive part on the bus.
    ChipId {
        /// Value actually read from the CID register.
        found: u8,
    },
    /// Requested value is outside the supported quantization range, or the
    /// request conflicts with the present load-switch configuration.
    InvalidValue,
    /// Vio depends on Vaux, which is currently disabled.
    VauxNotEnabled,
    /// Vio may only be configured while the FPGA core rail is enabled.
    VfpgaNotEnabled,
    /// Vaux headroom is below the set-point plus the LDO dropout. For
    /// `set_vio` the set-point named here was still committed; treat this as
    /// a warning that regulation will sag until Vaux is raised.
    VauxTooLow {
        /// Intended Vio voltage, quantized.
        volts: f32,
        /// Intended mode (always LDO for this warning).
        lsw_mode: bool,
    },
    /// Vaux is set above the FPGA IO ceiling, so the load switch would pass
    /// an overvoltage straight through.
    VauxTooHigh,
}

impl<E: core::fmt::Debug> core::fmt::Display for PmicError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PmicError::I2c(e) => write!(f, "I2C error: {:?}", e),
            PmicError::ChipId { found } => write!(f, "unexpected chip ID {:#04x}", found),
            PmicError::InvalidValue => write!(f, "value outside supported range"),
            PmicError::VauxNotEnabled => write!(f, "Vaux is not enabled"),
            PmicError::VfpgaNotEnabled => write!(f, "FPGA core rail is not enabled"),
            PmicError::VauxTooLow { volts, lsw_mode } => write!(
                f,
                "Vaux too low for Vio at {} V (lsw_mode {})",
                volts, lsw_mode
            ),
            PmicError::VauxTooHigh => write!(f, "Vaux exceeds the load-switch ceiling"),
        }
    }
}

/// Errors reported by the flash programming driver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug)]
pub enum FlashError<E> {
    /// Four-wire transaction failed.
    Spi(E),
    /// Capacity byte of the JEDEC ID did not match the expected part.
    WrongDevice {
        /// Capacity byte actually read.
        capacity: u8,
    },
}

impl<E: core::fmt::Debug> core::fmt::Display for FlashError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FlashError::Spi(e) => write!(f, "SPI error: {:?}", e),
            FlashError::WrongDevice { capacity } => {
                write!(f, "unexpected flash capacity ID {:#04x}", capacity)
            }
        }
    }
}

/// Errors reported by [`crate::S1::init`].
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug)]
pub enum InitError<PinE, I2cE> {
    /// Driving the FPGA reset line failed.
    Reset(PinE),
    /// The PMIC probe failed.
    Pmic(PmicError<I2cE>),
}

impl<PinE: core::fmt::Debug, I2cE: core::fmt::Debug> core::fmt::Display for InitError<PinE, I2cE> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InitError::Reset(e) => write!(f, "reset pin error: {:?}", e),
            InitError::Pmic(e) => write!(f, "PMIC probe failed: {}", e),
        }
    }
}
