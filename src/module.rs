//! One-time bring-up of the whole S1 module.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;
use embedded_hal::spi::SpiDevice;

use crate::error::InitError;
use crate::flash::Flash;
use crate::fpga::{DoneFlag, Fpga};
use crate::pmic::Pmic;

/// The assembled module: PMIC, flash, and FPGA sequencer over
/// caller-provided bus, pin, and delay handles.
///
/// Nothing is stored globally; every handle is injected, which is also what
/// makes the drivers testable against bus mocks.
pub struct S1<'a, I2C, SPI, RST, DONE, PD, FD> {
    pub pmic: Pmic<I2C, PD>,
    pub flash: Flash<SPI, FD>,
    pub fpga: Fpga<'a, RST, DONE>,
}

impl<'a, I2C, SPI, RST, DONE, PD, FD> S1<'a, I2C, SPI, RST, DONE, PD, FD>
where
    I2C: I2c,
    SPI: SpiDevice,
    RST: OutputPin,
    DONE: InputPin,
    PD: DelayNs,
    FD: DelayNs,
{
    /// Wire up the drivers. The done pin should already be configured by
    /// the platform as a pulled-up input with a rising-edge interrupt that
    /// calls [`DoneFlag::signal`].
    pub fn new(
        i2c: I2C,
        spi: SPI,
        reset: RST,
        done: DONE,
        done_flag: &'a DoneFlag,
        pmic_delay: PD,
        flash_delay: FD,
    ) -> Self {
        Self {
            pmic: Pmic::new(i2c, pmic_delay),
            flash: Flash::new(spi, flash_delay),
            fpga: Fpga::new(reset, done, done_flag),
        }
    }

    /// Hold the FPGA in reset and verify the PMIC answers with the right
    /// chip ID.
    ///
    /// Safe to call again after a deep-sleep wake: it reads and writes no
    /// regulator configuration. Peripheral and interrupt allocation live in
    /// the handles the caller constructed, so double-allocation is the
    /// caller's bug to avoid, not this driver's.
    pub fn init(&mut self) -> Result<(), InitError<RST::Error, I2C::Error>> {
        self.fpga.hold_reset().map_err(InitError::Reset)?;
        self.pmic.probe().map_err(InitError::Pmic)?;
        Ok(())
    }

    /// Hand the shared bus to the FPGA and release reset.
    ///
    /// Consumes the aggregate: the flash driver is gone afterwards and the
    /// bus cannot be reclaimed without rebuilding the module. Returns the
    /// PMIC driver and the sequencer, which stay usable.
    pub fn boot(
        self,
        release_bus: impl FnOnce(SPI, FD),
    ) -> Result<(Pmic<I2C, PD>, Fpga<'a, RST, DONE>), RST::Error> {
        let Self {
            pmic,
            flash,
            mut fpga,
        } = self;
        fpga.boot(flash, release_bus)?;
        Ok((pmic, fpga))
    }
}
