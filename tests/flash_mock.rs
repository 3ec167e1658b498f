#![cfg(not(feature = "async"))]

use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTrans};
use s1_module::flash::{page_count, CAPACITY_32MBIT, PAGE_SIZE};
use s1_module::{Flash, FlashError};

fn flash(expectations: &[SpiTrans<u8>]) -> Flash<SpiMock<u8>, NoopDelay> {
    Flash::new(SpiMock::new(expectations), NoopDelay::new())
}

fn finish(driver: Flash<SpiMock<u8>, NoopDelay>) {
    let (mut spi, _) = driver.free();
    spi.done();
}

#[test]
fn wakeup_issues_wake_split_reset_and_id_check() {
    let expectations = [
        SpiTrans::transaction_start(),
        SpiTrans::transfer(vec![0xAB, 0, 0, 0, 0], vec![0, 0, 0, 0, 0]),
        SpiTrans::transaction_end(),
        // Reset opcodes must be two separate chip-select cycles.
        SpiTrans::transaction_start(),
        SpiTrans::write_vec(vec![0x66]),
        SpiTrans::transaction_end(),
        SpiTrans::transaction_start(),
        SpiTrans::write_vec(vec![0x99]),
        SpiTrans::transaction_end(),
        SpiTrans::transaction_start(),
        SpiTrans::transfer(vec![0x9F, 0, 0, 0], vec![0, 0xEF, 0x40, CAPACITY_32MBIT]),
        SpiTrans::transaction_end(),
    ];
    let mut driver = flash(&expectations);
    driver.wakeup().unwrap();
    finish(driver);
}

#[test]
fn wakeup_rejects_unexpected_capacity() {
    let expectations = [
        SpiTrans::transaction_start(),
        SpiTrans::transfer(vec![0xAB, 0, 0, 0, 0], vec![0, 0, 0, 0, 0]),
        SpiTrans::transaction_end(),
        SpiTrans::transaction_start(),
        SpiTrans::write_vec(vec![0x66]),
        SpiTrans::transaction_end(),
        SpiTrans::transaction_start(),
        SpiTrans::write_vec(vec![0x99]),
        SpiTrans::transaction_end(),
        SpiTrans::transaction_start(),
        SpiTrans::transfer(vec![0x9F, 0, 0, 0], vec![0, 0xEF, 0x40, 0x15]),
        SpiTrans::transaction_end(),
    ];
    let mut driver = flash(&expectations);
    assert!(matches!(
        driver.wakeup(),
        Err(FlashError::WrongDevice { capacity: 0x15 })
    ));
    finish(driver);
}

#[test]
fn erase_all_is_write_enable_then_chip_erase() {
    let expectations = [
        SpiTrans::transaction_start(),
        SpiTrans::write_vec(vec![0x06]),
        SpiTrans::transaction_end(),
        SpiTrans::transaction_start(),
        SpiTrans::write_vec(vec![0x60]),
        SpiTrans::transaction_end(),
    ];
    let mut driver = flash(&expectations);
    driver.erase_all().unwrap();
    finish(driver);
}

#[test]
fn is_busy_tests_bit0_of_the_status_byte() {
    let expectations = [
        SpiTrans::transaction_start(),
        SpiTrans::transfer(vec![0x05, 0], vec![0, 0x03]),
        SpiTrans::transaction_end(),
        SpiTrans::transaction_start(),
        SpiTrans::transfer(vec![0x05, 0], vec![0, 0x02]),
        SpiTrans::transaction_end(),
    ];
    let mut driver = flash(&expectations);
    assert!(driver.is_busy().unwrap());
    assert!(!driver.is_busy().unwrap());
    finish(driver);
}

#[test]
fn program_page_sends_260_bytes_with_zero_low_address() {
    let image: Vec<u8> = (0..512u32).map(|i| (i % 251) as u8).collect();
    let offset = 0x000100;

    let mut page = vec![0x02, 0x00, 0x01, 0x00];
    page.extend_from_slice(&image[0x100..0x200]);
    assert_eq!(page.len(), 260);

    let expectations = [
        SpiTrans::transaction_start(),
        SpiTrans::write_vec(vec![0x06]),
        SpiTrans::transaction_end(),
        SpiTrans::transaction_start(),
        SpiTrans::write_vec(page),
        SpiTrans::transaction_end(),
    ];
    let mut driver = flash(&expectations);
    driver.program_page(offset, &image).unwrap();
    finish(driver);
}

#[test]
fn program_page_pads_a_partial_final_page_with_erased_value() {
    let image = vec![0xAAu8; PAGE_SIZE + 10];

    let mut page = vec![0x02, 0x00, 0x01, 0x00];
    page.extend_from_slice(&[0xAA; 10]);
    page.extend_from_slice(&[0xFF; PAGE_SIZE - 10]);

    let expectations = [
        SpiTrans::transaction_start(),
        SpiTrans::write_vec(vec![0x06]),
        SpiTrans::transaction_end(),
        SpiTrans::transaction_start(),
        SpiTrans::write_vec(page),
        SpiTrans::transaction_end(),
    ];
    let mut driver = flash(&expectations);
    driver.program_page(0x000100, &image).unwrap();
    finish(driver);
}

#[test]
fn page_count_is_ceiling_division() {
    assert_eq!(page_count(0), 0);
    assert_eq!(page_count(1), 1);
    assert_eq!(page_count(PAGE_SIZE), 1);
    assert_eq!(page_count(PAGE_SIZE + 1), 2);
    // iCE40UP5K bitstream size.
    assert_eq!(page_count(104_090), 407);
}

#[test]
fn raw_transfer_passes_through() {
    let expectations = [
        SpiTrans::transaction_start(),
        SpiTrans::transfer(vec![0x4B, 0, 0, 0, 0, 0], vec![0, 0, 0, 0, 0x12, 0x34]),
        SpiTrans::transaction_end(),
    ];
    let mut driver = flash(&expectations);
    let mut rx = [0u8; 6];
    driver.transfer(&mut rx, &[0x4B, 0, 0, 0, 0, 0]).unwrap();
    assert_eq!(&rx[4..], &[0x12, 0x34]);
    finish(driver);
}
