#![no_std]
//! This is a platform agnostic library for serial EEPROMs using embedded-hal.
//!
//! The SPI driver covers the Microchip 25xx family with 16 bit addressing, blocking in [`blocking`]
//! and async in [`asynchronous`]:
//! * 25AA160A/25LC160A, 2KiB, 16 byte pages
//! * 25AA160B/25LC160B, 2KiB, 32 byte pages
//! * 25AA320A/25LC320A, 4KiB, 32 byte pages
//! * 25AA640A/25LC640A, 8KiB, 32 byte pages
//! * 25AA256/25LC256, 32KiB, 64 byte pages
//!
//! The I2C driver in [`i2c`] covers the ST M24xxx family:
//! * M24256, 32KiB, 64 byte pages
//! * M24128, 16KiB, 64 byte pages
//! * M24C64, 8KiB, 32 byte pages
//! * M24C32, 4KiB, 32 byte pages
//!
//! Writes are split so that no single bus frame ever crosses a page of the device,
//! the chip would otherwise wrap around inside the page and overwrite its start.

pub mod address;
pub mod asynchronous;
pub mod blocking;
mod command;
pub mod error;
pub mod i2c;
pub mod register;

pub use address::{Address, PageChunks};
pub use error::Error;
pub use register::{BlockProtect, StatusRegister};

/// Write cycle time of the 25xx family, for a page or the status register
pub const SPI_WRITE_CYCLE_MS: u32 = 4;

/// Write cycle time of the M24xxx family
pub const I2C_WRITE_CYCLE_MS: u32 = 5;

/// Check that `length` bytes starting at `addr` fit a device whose last address is `size`
pub(crate) fn check_range<E>(size: u16, addr: Address, length: usize) -> Result<u16, Error<E>> {
    let addr_val = addr.0;
    if addr_val > size || length > (size - addr_val) as usize + 1 {
        return Err(Error::OutOfBounds);
    }
    Ok(addr_val)
}

/// Check a storage trait access of `length` bytes at `offset`.
///
/// An empty access is valid anywhere up to and including the capacity. The returned
/// address is only meaningful for a non empty access.
pub(crate) fn check_offset<E>(
    size: u16,
    offset: u32,
    length: usize,
) -> Result<Address, Error<E>> {
    let capacity = size as u32 + 1;
    if offset > capacity || length as u64 > (capacity - offset) as u64 {
        return Err(Error::OutOfBounds);
    }
    Ok(Address(offset as u16))
}
