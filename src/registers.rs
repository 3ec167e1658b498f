//! MAX77654 register map and field conversions for the S1 module.
//! Encode/decode helpers are pure functions so quantization can be tested
//! without a bus attached.

/// Fixed 7-bit I2C address of the PMIC.
pub const PMIC_ADDRESS: u8 = 0x48;

/// Expected value of the chip-ID register.
pub const CHIP_ID: u8 = 0x7A;

/// Register addresses (8-bit).
pub mod addr {
    /// Chip ID, reads 0x7A on a good part.
    pub const CID: u8 = 0x14;
    /// Charger fast-charge current (top 6 bits) and safety timer.
    pub const CNFG_CHG_E: u8 = 0x24;
    /// Charger termination voltage (top 6 bits).
    pub const CNFG_CHG_G: u8 = 0x26;
    /// SBB1 (Vfpga) target voltage.
    pub const CNFG_SBB1_A: u8 = 0x2B;
    /// SBB1 (Vfpga) mode, current limit and enable.
    pub const CNFG_SBB1_B: u8 = 0x2C;
    /// SBB2 (Vaux) target voltage.
    pub const CNFG_SBB2_A: u8 = 0x2D;
    /// SBB2 (Vaux) mode, current limit and enable.
    pub const CNFG_SBB2_B: u8 = 0x2E;
    /// LDO0 (Vio) target voltage.
    pub const CNFG_LDO0_A: u8 = 0x38;
    /// LDO0 (Vio) LDO/load-switch mode and enable.
    pub const CNFG_LDO0_B: u8 = 0x39;
}

bitflags::bitflags! {
    /// CNFG_SBBx_B fields (0x2C / 0x2E).
    pub struct SbbBits: u8 {
        /// Operation mode.
        const OP_MODE = 1 << 6;
        /// Peak current limit, high bit (00 = 1 A ... 11 = 0.333 A).
        const IP1     = 1 << 5;
        /// Peak current limit, low bit.
        const IP0     = 1 << 4;
        /// Active discharge resistor.
        const ADE     = 1 << 3;
        /// Enable field, bits 2:0. 0b110 = on via software, 0b100 = off.
        const EN2     = 1 << 2;
        const EN1     = 1 << 1;
        const EN0     = 1 << 0;
    }

    /// CNFG_LDO0_B fields (0x39).
    pub struct LdoBits: u8 {
        /// 0 = LDO regulation, 1 = load-switch passthrough.
        const LSW = 1 << 4;
        /// Active discharge resistor.
        const ADE = 1 << 3;
        /// Enable field, bits 2:0. 0b110 = on via software, 0b100 = off.
        const EN2 = 1 << 2;
        const EN1 = 1 << 1;
        const EN0 = 1 << 0;
    }
}

/// SBB1 set-point for the 1.2 V FPGA core rail: (1.2 - 0.8) / 0.05.
pub const VFPGA_SETPOINT_1V2: u8 = 0x08;
/// SBB1 on: buck mode, 0.333 A limit, discharge resistor, enabled.
pub const VFPGA_ENABLE: u8 = SbbBits::OP_MODE.bits()
    | SbbBits::IP1.bits()
    | SbbBits::IP0.bits()
    | SbbBits::ADE.bits()
    | SbbBits::EN2.bits()
    | SbbBits::EN1.bits();
/// SBB1 off, discharge resistor kept on.
pub const VFPGA_DISABLE: u8 = VFPGA_ENABLE & !SbbBits::EN1.bits();

/// SBB2 on: buck-boost, 1 A limit, discharge resistor, enabled.
pub const VAUX_ENABLE: u8 = SbbBits::ADE.bits() | SbbBits::EN2.bits() | SbbBits::EN1.bits();
/// SBB2 off, discharge resistor kept on.
pub const VAUX_DISABLE: u8 = VAUX_ENABLE & !SbbBits::EN1.bits();

/// LDO0 on in LDO mode with discharge resistor.
pub const VIO_LDO_ENABLE: u8 = LdoBits::ADE.bits() | LdoBits::EN2.bits() | LdoBits::EN1.bits();
/// LDO0 off (LDO mode select, discharge resistor on).
pub const VIO_DISABLE: u8 = VIO_LDO_ENABLE & !LdoBits::EN1.bits();
/// LDO0 passing Vaux through the load switch, discharge resistor on.
pub const VIO_LSW_ON: u8 = LdoBits::LSW.bits() | VIO_LDO_ENABLE;
/// Load switch open, discharge resistor on.
pub const VIO_LSW_OFF: u8 = LdoBits::LSW.bits() | VIO_DISABLE;

/// Vaux (SBB2) range and step.
pub const VAUX_MIN_V: f32 = 0.8;
pub const VAUX_MAX_V: f32 = 5.5;
pub const VAUX_STEP_V: f32 = 0.05;

/// Vio (LDO0) range and step.
pub const VIO_MIN_V: f32 = 0.8;
pub const VIO_MAX_V: f32 = 3.45;
pub const VIO_STEP_V: f32 = 0.025;

/// Headroom the LDO needs above its set-point to regulate.
pub const VIO_DROPOUT_V: f32 = 0.1;

/// Highest Vaux code that may be passed through the load switch
/// without exceeding the FPGA IO limit: (3.45 - 0.8) / 0.05.
pub const VAUX_LSW_CEILING_CODE: u8 = 53;

/// Charger termination voltage range and step.
pub const CHG_MIN_V: f32 = 3.6;
pub const CHG_MAX_V: f32 = 4.6;
pub const CHG_STEP_V: f32 = 0.025;

/// Charger fast-charge current range and step (mA).
pub const CHG_MIN_MA: f32 = 7.5;
pub const CHG_MAX_MA: f32 = 300.0;
pub const CHG_STEP_MA: f32 = 7.5;

/// CNFG_CHG_E low bits: 3-hour fast-charge safety timer.
pub const CHG_TIMER_3HR: u8 = 0b01;

/// True when an SBB channel's enable field reads "on via software".
pub fn sbb_enabled(raw: u8) -> bool {
    raw & (SbbBits::EN2.bits() | SbbBits::EN1.bits())
        == (SbbBits::EN2.bits() | SbbBits::EN1.bits())
}

/// True when LDO0's enable field reads "on via software".
pub fn ldo_enabled(raw: u8) -> bool {
    raw & (LdoBits::EN2.bits() | LdoBits::EN1.bits())
        == (LdoBits::EN2.bits() | LdoBits::EN1.bits())
}

/// True when LDO0 is configured as a load switch.
pub fn ldo_is_lsw(raw: u8) -> bool {
    raw & LdoBits::LSW.bits() != 0
}

// Rounds to the nearest code; inputs are range-checked by the callers so the
// argument is never below `min` here.
fn quantize(volts: f32, min: f32, step: f32) -> u8 {
    ((volts - min) / step + 0.5) as u8
}

/// Convert a Vaux target in volts to the 7-bit SBB2 set-point code.
pub fn vaux_volts_to_code(volts: f32) -> u8 {
    quantize(volts, VAUX_MIN_V, VAUX_STEP_V) & 0x7F
}

/// Convert a 7-bit SBB2 set-point code to volts.
pub fn code_to_vaux_volts(code: u8) -> f32 {
    (code & 0x7F) as f32 * VAUX_STEP_V + VAUX_MIN_V
}

/// Convert a Vio target in volts to the 7-bit LDO0 set-point code.
pub fn vio_volts_to_code(volts: f32) -> u8 {
    quantize(volts, VIO_MIN_V, VIO_STEP_V) & 0x7F
}

/// Convert a 7-bit LDO0 set-point code to volts.
pub fn code_to_vio_volts(code: u8) -> f32 {
    (code & 0x7F) as f32 * VIO_STEP_V + VIO_MIN_V
}

/// Convert a charge termination voltage to the 6-bit CNFG_CHG_G code
/// (unshifted; the field occupies the top 6 bits of the register).
pub fn chg_volts_to_code(volts: f32) -> u8 {
    quantize(volts, CHG_MIN_V, CHG_STEP_V) & 0x3F
}

/// Convert a 6-bit CNFG_CHG_G code to volts.
pub fn code_to_chg_volts(code: u8) -> f32 {
    (code & 0x3F) as f32 * CHG_STEP_V + CHG_MIN_V
}

/// Convert a fast-charge current in mA to the 6-bit CNFG_CHG_E code.
pub fn chg_ma_to_code(ma: f32) -> u8 {
    (((ma - CHG_MIN_MA) / CHG_STEP_MA) + 0.5) as u8 & 0x3F
}

/// Convert a 6-bit CNFG_CHG_E code to mA.
pub fn code_to_chg_ma(code: u8) -> f32 {
    (code & 0x3F) as f32 * CHG_STEP_MA + CHG_MIN_MA
}
