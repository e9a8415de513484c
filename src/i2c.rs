//! Driver for the M24xxx I2C EEPROMs.
//!
//! These parts have no instruction set, the two address bytes directly follow the
//! device select and the write enable is a pin rather than a latch. The page split
//! is the same as on the SPI parts, only with the page size of the chip.

use crate::{
    address::{Address, PageChunks},
    check_offset, check_range,
    error::Error,
    I2C_WRITE_CYCLE_MS,
};
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, Operation, SevenBitAddress},
};
use embedded_storage::{ReadStorage, Storage};

/// Device select code with all chip enable pins tied low
pub const BASE_ADDRESS: SevenBitAddress = 0x50;

/// Type alias for the M24256
pub type M24256<I2C, D> = Eeprom24<0x7FFF, 64, I2C, D>;

/// Type alias for the M24128
pub type M24128<I2C, D> = Eeprom24<0x3FFF, 64, I2C, D>;

/// Type alias for the M24C64
pub type M24C64<I2C, D> = Eeprom24<0x1FFF, 32, I2C, D>;

/// Type alias for the M24C32
pub type M24C32<I2C, D> = Eeprom24<0x0FFF, 32, I2C, D>;

/// The generic M24xxx I2C EEPROM driver
pub struct Eeprom24<const SIZE: u16, const PAGE: u16, I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    i2c: I2C,
    delay: D,
    address: SevenBitAddress,
}

impl<const SIZE: u16, const PAGE: u16, I2C, D, E> Eeprom24<SIZE, PAGE, I2C, D>
where
    I2C: I2c<Error = E>,
    D: DelayNs,
{
    pub const fn capacity() -> usize {
        SIZE as usize + 1
    }

    pub const fn page_size() -> usize {
        PAGE as usize
    }

    /// `chip_enable` is the level of the E2..E0 pins, only the three low bits are used
    pub fn new(i2c: I2C, delay: D, chip_enable: u8) -> Self {
        const { assert!(PAGE > 0, "page size must not be zero") };
        Self {
            i2c,
            delay,
            address: BASE_ADDRESS | (chip_enable & 0b111),
        }
    }

    /// Give back the bus and the delay
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// The 7 bit device select the driver talks to
    pub fn bus_address(&self) -> SevenBitAddress {
        self.address
    }

    pub fn verify_range(addr: Address, length: usize) -> Result<u16, Error<E>> {
        check_range(SIZE, addr, length)
    }

    /// Read a single byte
    pub fn read_byte(&mut self, addr: Address) -> Result<u8, Error<E>> {
        let mut buff = [0];
        self.read(addr, &mut buff)?;
        Ok(buff[0])
    }

    /// Read n bytes from an address, the address is sent then read back after a repeated start
    pub fn read(&mut self, addr: Address, buff: &mut [u8]) -> Result<(), Error<E>> {
        Self::verify_range(addr, buff.len())?;
        let res = self
            .i2c
            .write_read(self.address, &addr.to_be_bytes(), buff)
            .map_err(Error::Bus);
        #[cfg(feature = "defmt")]
        if res.is_err() {
            defmt::error!("ERROR READ {=u16}", addr.0);
        }
        res
    }

    /// Write a single byte
    pub fn write_byte(&mut self, addr: Address, value: u8) -> Result<(), Error<E>> {
        Self::verify_range(addr, 1)?;
        let [hi, lo] = addr.to_be_bytes();
        self.i2c
            .write(self.address, &[hi, lo, value])
            .map_err(Error::Bus)?;
        self.delay.delay_ms(I2C_WRITE_CYCLE_MS);
        Ok(())
    }

    /// Write n bytes from an address, one bus write per page
    pub fn write(&mut self, addr: Address, bytes: &[u8]) -> Result<(), Error<E>> {
        Self::verify_range(addr, bytes.len())?;

        for (address, chunk) in PageChunks::new(addr, bytes, PAGE) {
            #[cfg(feature = "defmt")]
            defmt::trace!("Write to {=u16} len {=usize}", address.0, chunk.len());
            let header = address.to_be_bytes();
            // Adjacent writes go out without a repeated start
            self.i2c
                .transaction(
                    self.address,
                    &mut [Operation::Write(&header), Operation::Write(chunk)],
                )
                .map_err(Error::Bus)?;
            self.delay.delay_ms(I2C_WRITE_CYCLE_MS);
        }
        Ok(())
    }
}

impl<const SIZE: u16, const PAGE: u16, I2C, D> ReadStorage for Eeprom24<SIZE, PAGE, I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = Error<I2C::Error>;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let addr = check_offset(SIZE, offset, bytes.len())?;
        if bytes.is_empty() {
            return Ok(());
        }
        Eeprom24::read(self, addr, bytes)
    }

    fn capacity(&self) -> usize {
        Self::capacity()
    }
}

impl<const SIZE: u16, const PAGE: u16, I2C, D> Storage for Eeprom24<SIZE, PAGE, I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let addr = check_offset(SIZE, offset, bytes.len())?;
        if bytes.is_empty() {
            return Ok(());
        }
        Eeprom24::write(self, addr, bytes)
    }
}
