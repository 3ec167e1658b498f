//! Data types shared across the S1 module drivers.

/// Vio rail readback.
///
/// In load-switch mode `volts` is an on/off indication (1.0 or 0.0), not a
/// measurement; the switch passes whatever Vaux provides.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VioStatus {
    /// Set-point in LDO mode, 1.0/0.0 passthrough indication in LSW mode.
    pub volts: f32,
    /// True when LDO0 is configured as a load switch.
    pub lsw_mode: bool,
}

/// Charger configuration readback.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChargeStatus {
    /// Termination voltage.
    pub volts: f32,
    /// Fast-charge current limit in mA.
    pub milliamps: f32,
}

/// Phase tracker for a caller-driven boot loop.
///
/// Erase and page programming take milliseconds to tens of seconds, so the
/// driver never blocks on them; a cooperative scheduler advances this state
/// one step at a time, polling [`crate::Flash::is_busy`] between steps.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootPhase {
    /// Nothing started yet.
    NotStarted,
    /// Chip erase issued, waiting for busy to clear.
    Erasing,
    /// Programming pages; counts down to zero.
    Programming {
        /// Pages left to write.
        pages_remaining: u32,
    },
    /// Reset released, waiting for the configuration-done signal.
    AwaitingDone,
    /// FPGA is running its bitstream.
    Booted,
}
