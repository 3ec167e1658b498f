//! MAX77654 regulator controller.
//!
//! Three rails matter for bring-up: Vfpga (SBB1, 1.2 V core + PLL), Vaux
//! (SBB2 buck-boost) and Vio (LDO0, switchable between LDO regulation and a
//! load switch passing Vaux through). Vio depends on both of the others, so
//! every setter validates its cross-rail preconditions before the first
//! register write; a rejected call leaves the hardware untouched.
//!
//! The async API mirrors the blocking one behind the `async` feature.

use embedded_hal::delay::DelayNs;

use crate::error::PmicError;
use crate::data_types::{ChargeStatus, VioStatus};
use crate::registers::{
    addr, chg_ma_to_code, chg_volts_to_code, code_to_chg_ma, code_to_chg_volts,
    code_to_vaux_volts, code_to_vio_volts, ldo_enabled, ldo_is_lsw, sbb_enabled,
    vaux_volts_to_code, vio_volts_to_code, CHG_MAX_MA, CHG_MAX_V, CHG_MIN_MA, CHG_MIN_V,
    CHG_TIMER_3HR, CHIP_ID, PMIC_ADDRESS, SbbBits, VAUX_DISABLE, VAUX_ENABLE,
    VAUX_LSW_CEILING_CODE, VAUX_MAX_V, VAUX_MIN_V, VFPGA_DISABLE, VFPGA_ENABLE,
    VFPGA_SETPOINT_1V2, VIO_DISABLE, VIO_DROPOUT_V, VIO_LDO_ENABLE, VIO_LSW_OFF, VIO_LSW_ON,
    VIO_MAX_V, VIO_MIN_V,
};

/// Backoff before the single read retry. The PMIC can drop a transaction
/// when the battery sags under load.
const READ_RETRY_BACKOFF_US: u32 = 100;

/// PMIC driver. Generic over the two-wire bus and a delay source.
pub struct Pmic<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C, D> Pmic<I2C, D> {
    /// Create a new driver instance. The device address is fixed at 0x48.
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self { i2c, delay }
    }

    /// Release the bus and delay handles.
    pub fn free(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C, D> Pmic<I2C, D>
where
    I2C: embedded_hal::i2c::I2c,
    D: DelayNs,
{
    /// Read a single register, retrying exactly once after a 100 µs backoff.
    fn read_reg(&mut self, reg: u8) -> Result<u8, PmicError<I2C::Error>> {
        let mut buf = [0u8; 1];
        if self.i2c.write_read(PMIC_ADDRESS, &[reg], &mut buf).is_err() {
            self.delay.delay_us(READ_RETRY_BACKOFF_US);
            self.i2c
                .write_read(PMIC_ADDRESS, &[reg], &mut buf)
                .map_err(PmicError::I2c)?;
        }
        Ok(buf[0])
    }

    /// Write a single register. Writes are never retried.
    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), PmicError<I2C::Error>> {
        self.i2c
            .write(PMIC_ADDRESS, &[reg, value])
            .map_err(PmicError::I2c)
    }

    /// Verify the chip-ID register reads 0x7A.
    pub fn probe(&mut self) -> Result<(), PmicError<I2C::Error>> {
        let id = self.read_reg(addr::CID)?;
        if id != CHIP_ID {
            return Err(PmicError::ChipId { found: id });
        }
        Ok(())
    }

    /// Read whether the FPGA core rail is enabled.
    pub fn get_vfpga(&mut self) -> Result<bool, PmicError<I2C::Error>> {
        let raw = self.read_reg(addr::CNFG_SBB1_B)?;
        Ok(raw & SbbBits::EN1.bits() != 0)
    }

    /// Enable or disable the 1.2 V FPGA core rail.
    ///
    /// Disabling also forces Vio off first; leaving the IO rail up with no
    /// core rail can damage the FPGA.
    pub fn set_vfpga(&mut self, enable: bool) -> Result<(), PmicError<I2C::Error>> {
        self.write_reg(addr::CNFG_SBB1_A, VFPGA_SETPOINT_1V2)?;
        if enable {
            return self.write_reg(addr::CNFG_SBB1_B, VFPGA_ENABLE);
        }
        self.write_reg(addr::CNFG_LDO0_B, VIO_DISABLE)?;
        self.write_reg(addr::CNFG_SBB1_B, VFPGA_DISABLE)
    }

    /// Read the Vaux set-point. Reports 0.0 V while the block is disabled.
    pub fn get_vaux(&mut self) -> Result<f32, PmicError<I2C::Error>> {
        let en = self.read_reg(addr::CNFG_SBB2_B)?;
        if !sbb_enabled(en) {
            return Ok(0.0);
        }
        let code = self.read_reg(addr::CNFG_SBB2_A)?;
        Ok(code_to_vaux_volts(code))
    }

    /// Set the Vaux rail. 0.0 V shuts the block down.
    ///
    /// Targets above 3.45 V are rejected while Vio is in load-switch mode,
    /// since the switch would pass the overvoltage to the FPGA IO bank.
    pub fn set_vaux(&mut self, volts: f32) -> Result<(), PmicError<I2C::Error>> {
        if volts == 0.0 {
            return self.write_reg(addr::CNFG_SBB2_B, VAUX_DISABLE);
        }
        if volts < VAUX_MIN_V || volts > VAUX_MAX_V {
            return Err(PmicError::InvalidValue);
        }
        if volts > VIO_MAX_V {
            let ldo = self.read_reg(addr::CNFG_LDO0_B)?;
            if ldo_is_lsw(ldo) {
                return Err(PmicError::InvalidValue);
            }
        }
        self.write_reg(addr::CNFG_SBB2_A, vaux_volts_to_code(volts))?;
        self.write_reg(addr::CNFG_SBB2_B, VAUX_ENABLE)
    }

    /// Read the Vio configuration.
    ///
    /// [`PmicError::VauxTooLow`] carries the decoded values when the Vaux
    /// headroom check fails; the LDO is still configured as reported, it
    /// just cannot regulate until Vaux is raised.
    pub fn get_vio(&mut self) -> Result<VioStatus, PmicError<I2C::Error>> {
        let en = self.read_reg(addr::CNFG_SBB2_B)?;
        if !sbb_enabled(en) {
            return Err(PmicError::VauxNotEnabled);
        }
        let ldo = self.read_reg(addr::CNFG_LDO0_B)?;
        if ldo_is_lsw(ldo) {
            let volts = if ldo_enabled(ldo) { 1.0 } else { 0.0 };
            return Ok(VioStatus {
                volts,
                lsw_mode: true,
            });
        }
        if !ldo_enabled(ldo) {
            return Ok(VioStatus {
                volts: 0.0,
                lsw_mode: false,
            });
        }
        let volts = code_to_vio_volts(self.read_reg(addr::CNFG_LDO0_A)?);
        let vaux = code_to_vaux_volts(self.read_reg(addr::CNFG_SBB2_A)?);
        if vaux < volts + VIO_DROPOUT_V {
            return Err(PmicError::VauxTooLow {
                volts,
                lsw_mode: false,
            });
        }
        Ok(VioStatus {
            volts,
            lsw_mode: false,
        })
    }

    /// Configure the Vio rail.
    ///
    /// Requires Vaux and the FPGA core rail to be enabled. With `lsw_mode`
    /// set, `volts` only selects whether the switch is closed (`> 0.0`) or
    /// open, and Vaux must sit at or below 3.45 V. In LDO mode 0.0 V shuts
    /// the rail down and other targets must lie in 0.8..=3.45 V.
    ///
    /// When Vaux lacks the 100 mV dropout headroom the set-point is still
    /// committed and [`PmicError::VauxTooLow`] is returned as a warning.
    pub fn set_vio(&mut self, volts: f32, lsw_mode: bool) -> Result<(), PmicError<I2C::Error>> {
        let en = self.read_reg(addr::CNFG_SBB2_B)?;
        if !sbb_enabled(en) {
            return Err(PmicError::VauxNotEnabled);
        }
        let sbb1 = self.read_reg(addr::CNFG_SBB1_B)?;
        if sbb1 & SbbBits::EN1.bits() == 0 {
            return Err(PmicError::VfpgaNotEnabled);
        }
        if lsw_mode {
            let vaux_code = self.read_reg(addr::CNFG_SBB2_A)? & 0x7F;
            if vaux_code > VAUX_LSW_CEILING_CODE {
                return Err(PmicError::VauxTooHigh);
            }
            let cmd = if volts > 0.0 { VIO_LSW_ON } else { VIO_LSW_OFF };
            return self.write_reg(addr::CNFG_LDO0_B, cmd);
        }
        if volts == 0.0 {
            return self.write_reg(addr::CNFG_LDO0_B, VIO_DISABLE);
        }
        if volts < VIO_MIN_V || volts > VIO_MAX_V {
            return Err(PmicError::InvalidValue);
        }
        let code = vio_volts_to_code(volts);
        let vaux = code_to_vaux_volts(self.read_reg(addr::CNFG_SBB2_A)?);
        let vaux_low = vaux < volts + VIO_DROPOUT_V;
        self.write_reg(addr::CNFG_LDO0_A, code)?;
        self.write_reg(addr::CNFG_LDO0_B, VIO_LDO_ENABLE)?;
        if vaux_low {
            return Err(PmicError::VauxTooLow {
                volts: code_to_vio_volts(code),
                lsw_mode: false,
            });
        }
        Ok(())
    }

    /// Read the charger termination voltage and fast-charge current.
    pub fn get_charge(&mut self) -> Result<ChargeStatus, PmicError<I2C::Error>> {
        let volts = code_to_chg_volts(self.read_reg(addr::CNFG_CHG_G)? >> 2);
        let milliamps = code_to_chg_ma(self.read_reg(addr::CNFG_CHG_E)? >> 2);
        Ok(ChargeStatus { volts, milliamps })
    }

    /// Configure the charger: 3.6..=4.6 V in 25 mV steps, 7.5..=300 mA in
    /// 7.5 mA steps. The write always arms the 3-hour safety timer.
    pub fn set_charge(&mut self, volts: f32, milliamps: f32) -> Result<(), PmicError<I2C::Error>> {
        if volts < CHG_MIN_V || volts > CHG_MAX_V {
            return Err(PmicError::InvalidValue);
        }
        if milliamps < CHG_MIN_MA || milliamps > CHG_MAX_MA {
            return Err(PmicError::InvalidValue);
        }
        self.write_reg(addr::CNFG_CHG_G, chg_volts_to_code(volts) << 2)?;
        self.write_reg(
            addr::CNFG_CHG_E,
            (chg_ma_to_code(milliamps) << 2) | CHG_TIMER_3HR,
        )
    }
}

#[cfg(feature = "async")]
impl<I2C, D> Pmic<I2C, D>
where
    I2C: embedded_hal_async::i2c::I2c,
    D: embedded_hal_async::delay::DelayNs,
{
    async fn read_reg_async(&mut self, reg: u8) -> Result<u8, PmicError<I2C::Error>> {
        let mut buf = [0u8; 1];
        if self
            .i2c
            .write_read(PMIC_ADDRESS, &[reg], &mut buf)
            .await
            .is_err()
        {
            self.delay.delay_us(READ_RETRY_BACKOFF_US).await;
            self.i2c
                .write_read(PMIC_ADDRESS, &[reg], &mut buf)
                .await
                .map_err(PmicError::I2c)?;
        }
        Ok(buf[0])
    }

    async fn write_reg_async(&mut self, reg: u8, value: u8) -> Result<(), PmicError<I2C::Error>> {
        self.i2c
            .write(PMIC_ADDRESS, &[reg, value])
            .await
            .map_err(PmicError::I2c)
    }

    /// Async version of [`probe`](Self::probe).
    pub async fn probe_async(&mut self) -> Result<(), PmicError<I2C::Error>> {
        let id = self.read_reg_async(addr::CID).await?;
        if id != CHIP_ID {
            return Err(PmicError::ChipId { found: id });
        }
        Ok(())
    }

    /// Async version of [`get_vfpga`](Self::get_vfpga).
    pub async fn get_vfpga_async(&mut self) -> Result<bool, PmicError<I2C::Error>> {
        let raw = self.read_reg_async(addr::CNFG_SBB1_B).await?;
        Ok(raw & SbbBits::EN1.bits() != 0)
    }

    /// Async version of [`set_vfpga`](Self::set_vfpga).
    pub async fn set_vfpga_async(&mut self, enable: bool) -> Result<(), PmicError<I2C::Error>> {
        self.write_reg_async(addr::CNFG_SBB1_A, VFPGA_SETPOINT_1V2)
            .await?;
        if enable {
            return self.write_reg_async(addr::CNFG_SBB1_B, VFPGA_ENABLE).await;
        }
        self.write_reg_async(addr::CNFG_LDO0_B, VIO_DISABLE).await?;
        self.write_reg_async(addr::CNFG_SBB1_B, VFPGA_DISABLE).await
    }

    /// Async version of [`get_vaux`](Self::get_vaux).
    pub async fn get_vaux_async(&mut self) -> Result<f32, PmicError<I2C::Error>> {
        let en = self.read_reg_async(addr::CNFG_SBB2_B).await?;
        if !sbb_enabled(en) {
            return Ok(0.0);
        }
        let code = self.read_reg_async(addr::CNFG_SBB2_A).await?;
        Ok(code_to_vaux_volts(code))
    }

    /// Async version of [`set_vaux`](Self::set_vaux).
    pub async fn set_vaux_async(&mut self, volts: f32) -> Result<(), PmicError<I2C::Error>> {
        if volts == 0.0 {
            return self.write_reg_async(addr::CNFG_SBB2_B, VAUX_DISABLE).await;
        }
        if volts < VAUX_MIN_V || volts > VAUX_MAX_V {
            return Err(PmicError::InvalidValue);
        }
        if volts > VIO_MAX_V {
            let ldo = self.read_reg_async(addr::CNFG_LDO0_B).await?;
            if ldo_is_lsw(ldo) {
                return Err(PmicError::InvalidValue);
            }
        }
        self.write_reg_async(addr::CNFG_SBB2_A, vaux_volts_to_code(volts))
            .await?;
        self.write_reg_async(addr::CNFG_SBB2_B, VAUX_ENABLE).await
    }

    /// Async version of [`get_vio`](Self::get_vio).
    pub async fn get_vio_async(&mut self) -> Result<VioStatus, PmicError<I2C::Error>> {
        let en = self.read_reg_async(addr::CNFG_SBB2_B).await?;
        if !sbb_enabled(en) {
            return Err(PmicError::VauxNotEnabled);
        }
        let ldo = self.read_reg_async(addr::CNFG_LDO0_B).await?;
        if ldo_is_lsw(ldo) {
            let volts = if ldo_enabled(ldo) { 1.0 } else { 0.0 };
            return Ok(VioStatus {
                volts,
                lsw_mode: true,
            });
        }
        if !ldo_enabled(ldo) {
            return Ok(VioStatus {
                volts: 0.0,
                lsw_mode: false,
            });
        }
        let volts = code_to_vio_volts(self.read_reg_async(addr::CNFG_LDO0_A).await?);
        let vaux = code_to_vaux_volts(self.read_reg_async(addr::CNFG_SBB2_A).await?);
        if vaux < volts + VIO_DROPOUT_V {
            return Err(PmicError::VauxTooLow {
                volts,
                lsw_mode: false,
            });
        }
        Ok(VioStatus {
            volts,
            lsw_mode: false,
        })
    }

    /// Async version of [`set_vio`](Self::set_vio).
    pub async fn set_vio_async(
        &mut self,
        volts: f32,
        lsw_mode: bool,
    ) -> Result<(), PmicError<I2C::Error>> {
        let en = self.read_reg_async(addr::CNFG_SBB2_B).await?;
        if !sbb_enabled(en) {
            return Err(PmicError::VauxNotEnabled);
        }
        let sbb1 = self.read_reg_async(addr::CNFG_SBB1_B).await?;
        if sbb1 & SbbBits::EN1.bits() == 0 {
            return Err(PmicError::VfpgaNotEnabled);
        }
        if lsw_mode {
            let vaux_code = self.read_reg_async(addr::CNFG_SBB2_A).await? & 0x7F;
            if vaux_code > VAUX_LSW_CEILING_CODE {
                return Err(PmicError::VauxTooHigh);
            }
            let cmd = if volts > 0.0 { VIO_LSW_ON } else { VIO_LSW_OFF };
            return self.write_reg_async(addr::CNFG_LDO0_B, cmd).await;
        }
        if volts == 0.0 {
            return self.write_reg_async(addr::CNFG_LDO0_B, VIO_DISABLE).await;
        }
        if volts < VIO_MIN_V || volts > VIO_MAX_V {
            return Err(PmicError::InvalidValue);
        }
        let code = vio_volts_to_code(volts);
        let vaux = code_to_vaux_volts(self.read_reg_async(addr::CNFG_SBB2_A).await?);
        let vaux_low = vaux < volts + VIO_DROPOUT_V;
        self.write_reg_async(addr::CNFG_LDO0_A, code).await?;
        self.write_reg_async(addr::CNFG_LDO0_B, VIO_LDO_ENABLE)
            .await?;
        if vaux_low {
            return Err(PmicError::VauxTooLow {
                volts: code_to_vio_volts(code),
                lsw_mode: false,
            });
        }
        Ok(())
    }

    /// Async version of [`get_charge`](Self::get_charge).
    pub async fn get_charge_async(&mut self) -> Result<ChargeStatus, PmicError<I2C::Error>> {
        let volts = code_to_chg_volts(self.read_reg_async(addr::CNFG_CHG_G).await? >> 2);
        let milliamps = code_to_chg_ma(self.read_reg_async(addr::CNFG_CHG_E).await? >> 2);
        Ok(ChargeStatus { volts, milliamps })
    }

    /// Async version of [`set_charge`](Self::set_charge).
    pub async fn set_charge_async(
        &mut self,
        volts: f32,
        milliamps: f32,
    ) -> Result<(), PmicError<I2C::Error>> {
        if volts < CHG_MIN_V || volts > CHG_MAX_V {
            return Err(PmicError::InvalidValue);
        }
        if milliamps < CHG_MIN_MA || milliamps > CHG_MAX_MA {
            return Err(PmicError::InvalidValue);
        }
        self.write_reg_async(addr::CNFG_CHG_G, chg_volts_to_code(volts) << 2)
            .await?;
        self.write_reg_async(
            addr::CNFG_CHG_E,
            (chg_ma_to_code(milliamps) << 2) | CHG_TIMER_3HR,
        )
        .await
    }
}
