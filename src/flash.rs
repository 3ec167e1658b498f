//! SPI NOR flash programming for the FPGA bitstream.
//!
//! Erase and page programming run inside the flash for milliseconds to tens
//! of seconds, so nothing here busy-waits on completion: `erase_all` and
//! `program_page` are fire-and-forget and the caller polls [`Flash::is_busy`]
//! from its own scheduling loop, one page per quiet poll, until the
//! pages-remaining count reaches zero.
//!
//! Each method call frames its own chip-select cycle; the two-part reset and
//! erase sequences the device requires are issued back to back inside one
//! call so no other bus traffic can interleave.

use embedded_hal::delay::DelayNs;

use crate::error::FlashError;

/// Flash opcodes, straight from the datasheet.
pub mod opcode {
    /// Release from deep power-down.
    pub const WAKE: u8 = 0xAB;
    /// Enable-reset, first half of the reset sequence.
    pub const RESET_ENABLE: u8 = 0x66;
    /// Reset, second half.
    pub const RESET: u8 = 0x99;
    /// JEDEC ID; the third response byte is the capacity code.
    pub const READ_ID: u8 = 0x9F;
    /// Write enable, required before erase and program.
    pub const WRITE_ENABLE: u8 = 0x06;
    /// Full chip erase.
    pub const CHIP_ERASE: u8 = 0x60;
    /// Status register 1; bit 0 is write-in-progress.
    pub const READ_STATUS: u8 = 0x05;
    /// Page program, 24-bit address plus up to one page of data.
    pub const PAGE_PROGRAM: u8 = 0x02;
}

/// Capacity byte of the JEDEC ID for the fitted 32 Mbit part.
pub const CAPACITY_32MBIT: u8 = 0x16;

/// Smallest programmable unit, and the granularity of image addressing.
pub const PAGE_SIZE: usize = 256;

/// tRES1: wake-up time out of deep power-down.
const WAKE_DELAY_US: u32 = 3;
/// tRST: time to complete a software reset.
const RESET_DELAY_US: u32 = 30;

/// Number of pages needed to hold `image_len` bytes.
pub const fn page_count(image_len: usize) -> u32 {
    image_len.div_ceil(PAGE_SIZE) as u32
}

/// Flash driver. Generic over an [`embedded_hal::spi::SpiDevice`] (the
/// shared four-wire bus with the select line framing each transaction) and
/// a delay source for the wake/reset timing.
pub struct Flash<SPI, D> {
    spi: SPI,
    delay: D,
}

impl<SPI, D> Flash<SPI, D> {
    /// Create a new driver instance.
    pub fn new(spi: SPI, delay: D) -> Self {
        Self { spi, delay }
    }

    /// Release the bus and delay handles. Consumed by the FPGA boot handoff.
    pub fn free(self) -> (SPI, D) {
        (self.spi, self.delay)
    }
}

impl<SPI, D> Flash<SPI, D>
where
    SPI: embedded_hal::spi::SpiDevice,
    D: DelayNs,
{
    /// Raw full-duplex transfer, for flash commands this driver does not
    /// wrap. One call is one chip-select cycle.
    pub fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), FlashError<SPI::Error>> {
        self.spi.transfer(read, write).map_err(FlashError::Spi)
    }

    /// Wake the flash from deep power-down, reset it, and verify the
    /// capacity ID matches the fitted part.
    pub fn wakeup(&mut self) -> Result<(), FlashError<SPI::Error>> {
        let wake = [opcode::WAKE, 0, 0, 0, 0];
        let mut wake_res = [0u8; 5];
        self.spi
            .transfer(&mut wake_res, &wake)
            .map_err(FlashError::Spi)?;
        self.delay.delay_us(WAKE_DELAY_US);

        // The reset opcode pair must arrive as two separate transactions.
        self.spi
            .write(&[opcode::RESET_ENABLE])
            .map_err(FlashError::Spi)?;
        self.spi.write(&[opcode::RESET]).map_err(FlashError::Spi)?;
        self.delay.delay_us(RESET_DELAY_US);

        let mut id = [0u8; 4];
        self.spi
            .transfer(&mut id, &[opcode::READ_ID, 0, 0, 0])
            .map_err(FlashError::Spi)?;
        if id[3] != CAPACITY_32MBIT {
            return Err(FlashError::WrongDevice { capacity: id[3] });
        }
        Ok(())
    }

    /// Start a full chip erase. Returns as soon as the command is issued;
    /// poll [`is_busy`](Self::is_busy) until it clears (tens of seconds).
    pub fn erase_all(&mut self) -> Result<(), FlashError<SPI::Error>> {
        self.spi
            .write(&[opcode::WRITE_ENABLE])
            .map_err(FlashError::Spi)?;
        self.spi
            .write(&[opcode::CHIP_ERASE])
            .map_err(FlashError::Spi)
    }

    /// Whether an erase or program cycle is still in progress.
    pub fn is_busy(&mut self) -> Result<bool, FlashError<SPI::Error>> {
        let mut status = [0u8; 2];
        self.spi
            .transfer(&mut status, &[opcode::READ_STATUS, 0])
            .map_err(FlashError::Spi)?;
        Ok(status[1] & 0x01 != 0)
    }

    /// Program one 256-byte page at a page-aligned `offset` from `image`.
    ///
    /// The low address byte is always written as zero; `offset` comes from
    /// the caller's page counter and is not validated here. A final partial
    /// page is padded with 0xFF, the erased-flash value. Call only while
    /// [`is_busy`](Self::is_busy) reports false.
    pub fn program_page(
        &mut self,
        offset: u32,
        image: &[u8],
    ) -> Result<(), FlashError<SPI::Error>> {
        self.spi
            .write(&[opcode::WRITE_ENABLE])
            .map_err(FlashError::Spi)?;

        let mut tx = [0xFFu8; 4 + PAGE_SIZE];
        tx[0] = opcode::PAGE_PROGRAM;
        tx[1] = (offset >> 16) as u8;
        tx[2] = (offset >> 8) as u8;
        tx[3] = 0x00;

        let start = (offset as usize).min(image.len());
        let end = (start + PAGE_SIZE).min(image.len());
        tx[4..4 + (end - start)].copy_from_slice(&image[start..end]);

        self.spi.write(&tx).map_err(FlashError::Spi)
    }
}

#[cfg(feature = "async")]
impl<SPI, D> Flash<SPI, D>
where
    SPI: embedded_hal_async::spi::SpiDevice,
    D: embedded_hal_async::delay::DelayNs,
{
    /// Async version of [`transfer`](Self::transfer).
    pub async fn transfer_async(
        &mut self,
        read: &mut [u8],
        write: &[u8],
    ) -> Result<(), FlashError<SPI::Error>> {
        self.spi.transfer(read, write).await.map_err(FlashError::Spi)
    }

    /// Async version of [`wakeup`](Self::wakeup).
    pub async fn wakeup_async(&mut self) -> Result<(), FlashError<SPI::Error>> {
        let wake = [opcode::WAKE, 0, 0, 0, 0];
        let mut wake_res = [0u8; 5];
        self.spi
            .transfer(&mut wake_res, &wake)
            .await
            .map_err(FlashError::Spi)?;
        self.delay.delay_us(WAKE_DELAY_US).await;

        self.spi
            .write(&[opcode::RESET_ENABLE])
            .await
            .map_err(FlashError::Spi)?;
        self.spi
            .write(&[opcode::RESET])
            .await
            .map_err(FlashError::Spi)?;
        self.delay.delay_us(RESET_DELAY_US).await;

        let mut id = [0u8; 4];
        self.spi
            .transfer(&mut id, &[opcode::READ_ID, 0, 0, 0])
            .await
            .map_err(FlashError::Spi)?;
        if id[3] != CAPACITY_32MBIT {
            return Err(FlashError::WrongDevice { capacity: id[3] });
        }
        Ok(())
    }

    /// Async version of [`erase_all`](Self::erase_all).
    pub async fn erase_all_async(&mut self) -> Result<(), FlashError<SPI::Error>> {
        self.spi
            .write(&[opcode::WRITE_ENABLE])
            .await
            .map_err(FlashError::Spi)?;
        self.spi
            .write(&[opcode::CHIP_ERASE])
            .await
            .map_err(FlashError::Spi)
    }

    /// Async version of [`is_busy`](Self::is_busy).
    pub async fn is_busy_async(&mut self) -> Result<bool, FlashError<SPI::Error>> {
        let mut status = [0u8; 2];
        self.spi
            .transfer(&mut status, &[opcode::READ_STATUS, 0])
            .await
            .map_err(FlashError::Spi)?;
        Ok(status[1] & 0x01 != 0)
    }

    /// Async version of [`program_page`](Self::program_page).
    pub async fn program_page_async(
        &mut self,
        offset: u32,
        image: &[u8],
    ) -> Result<(), FlashError<SPI::Error>> {
        self.spi
            .write(&[opcode::WRITE_ENABLE])
            .await
            .map_err(FlashError::Spi)?;

        let mut tx = [0xFFu8; 4 + PAGE_SIZE];
        tx[0] = opcode::PAGE_PROGRAM;
        tx[1] = (offset >> 16) as u8;
        tx[2] = (offset >> 8) as u8;
        tx[3] = 0x00;

        let start = (offset as usize).min(image.len());
        let end = (start + PAGE_SIZE).min(image.len());
        tx[4..4 + (end - start)].copy_from_slice(&image[start..end]);

        self.spi.write(&tx).await.map_err(FlashError::Spi)
    }
}
