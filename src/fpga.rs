//! FPGA boot sequencing: reset control, bus handoff, and the
//! configuration-done signal.
//!
//! The flash and the FPGA share the four-wire bus; once the FPGA comes out
//! of reset and loads its bitstream it drives those lines itself. The
//! handoff in [`Fpga::boot`] is one-way by construction: it consumes the
//! [`Flash`] driver, so reclaiming the bus for flash access takes a full
//! re-initialization, as on the hardware.
//!
//! Two done-signal models survive in the field: an interrupt-driven pending
//! flag with consume-once reads ([`Fpga::is_booted`]) and a direct level
//! poll ([`Fpga::read_done_level`]). Both are exposed; their semantics are
//! intentionally not merged.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::{InputPin, OutputPin};

use crate::flash::Flash;

/// Pending flag set by the configuration-done rising-edge interrupt.
///
/// Single writer (the ISR calls [`signal`](Self::signal)), single reader
/// (the main context calls [`consume`](Self::consume)); a single atomic
/// word needs no further locking on a single-core target.
///
/// Place one in a `static` and register `signal()` with the platform's
/// rising-edge interrupt on the done pin.
#[derive(Debug)]
pub struct DoneFlag(AtomicBool);

impl DoneFlag {
    /// A flag with no event pending.
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Mark the done event pending. Call from the rising-edge ISR.
    pub fn signal(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Read and clear the pending flag. Returns true at most once per
    /// signalled event.
    pub fn consume(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

impl Default for DoneFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Boot sequencer over the reset output, the done input, and the shared
/// pending flag.
pub struct Fpga<'a, RST, DONE> {
    reset: RST,
    done: DONE,
    flag: &'a DoneFlag,
}

impl<'a, RST, DONE> Fpga<'a, RST, DONE>
where
    RST: OutputPin,
    DONE: InputPin,
{
    /// Create a new sequencer. The reset line is not touched until
    /// [`hold_reset`](Self::hold_reset) is called.
    pub fn new(reset: RST, done: DONE, flag: &'a DoneFlag) -> Self {
        Self { reset, done, flag }
    }

    /// Drive the reset line low, holding the FPGA in reset.
    pub fn hold_reset(&mut self) -> Result<(), RST::Error> {
        self.reset.set_low()
    }

    /// Hand the shared bus to the FPGA and release reset.
    ///
    /// Consumes the flash driver, passes the raw bus and delay handles to
    /// `release_bus` so the platform can deconfigure the pins as inputs
    /// (the FPGA drives them once configured), then drives reset high.
    pub fn boot<SPI, D>(
        &mut self,
        flash: Flash<SPI, D>,
        release_bus: impl FnOnce(SPI, D),
    ) -> Result<(), RST::Error> {
        let (spi, delay) = flash.free();
        release_bus(spi, delay);
        self.reset.set_high()
    }

    /// Consume-once read of the interrupt-driven done flag. True exactly
    /// once after each rising edge of the configuration-done line.
    pub fn is_booted(&self) -> bool {
        self.flag.consume()
    }

    /// Sample the configuration-done line directly. Pure query; does not
    /// touch the pending flag.
    pub fn read_done_level(&mut self) -> Result<bool, DONE::Error> {
        self.done.is_high()
    }

    /// Release the pin handles.
    pub fn free(self) -> (RST, DONE) {
        (self.reset, self.done)
    }
}

#[cfg(feature = "async")]
impl<RST, DONE> Fpga<'_, RST, DONE>
where
    RST: OutputPin,
    DONE: embedded_hal_async::digital::Wait,
{
    /// Wait for the configuration-done line to sit high. Level-based so a
    /// boot that completed before the call resolves immediately.
    pub async fn wait_booted(&mut self) -> Result<(), DONE::Error> {
        self.done.wait_for_high().await
    }
}
