//! Bring-up driver for the S1 FPGA module.
//!
//! The module pairs a MAX77654 PMIC, a 32 Mbit SPI NOR flash, and an iCE40
//! FPGA behind two buses: a two-wire register bus to the PMIC and a shared
//! four-wire bus to the flash and FPGA. This crate covers the parts with
//! real sequencing constraints — rail power sequencing with cross-rail
//! interlocks, bitstream flashing, and the flash-to-FPGA bus handoff — and
//! consumes the transports through `embedded-hal` traits only.
//!
//! Typical bring-up: [`S1::init`], sequence rails through [`Pmic`], write
//! the bitstream through [`Flash`] from a cooperative polling loop (see
//! [`data_types::BootPhase`]), then [`S1::boot`] and wait for the
//! configuration-done signal.

#![no_std]

pub mod data_types;
pub mod error;
pub mod flash;
pub mod fpga;
pub mod module;
pub mod pmic;
pub mod registers;

pub use error::{FlashError, InitError, PmicError};
pub use flash::{Flash, PAGE_SIZE, page_count};
pub use fpga::{DoneFlag, Fpga};
pub use module::S1;
pub use pmic::Pmic;
pub use registers::PMIC_ADDRESS;
