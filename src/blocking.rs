use crate::{
    address::{Address, PageChunks},
    check_offset, check_range,
    command::Command,
    error::Error,
    register::*,
    SPI_WRITE_CYCLE_MS,
};
use embedded_hal::{
    delay::DelayNs,
    spi::{Operation, SpiDevice},
};
use embedded_storage::{ReadStorage, Storage};

/// Type alias for the 25AA160A/25LC160A
pub type Eeprom25AA160A<SPI, D> = Eeprom25<0x07FF, 16, SPI, D>;

/// Type alias for the 25AA160B/25LC160B
pub type Eeprom25AA160B<SPI, D> = Eeprom25<0x07FF, 32, SPI, D>;

/// Type alias for the 25AA320A/25LC320A
pub type Eeprom25AA320A<SPI, D> = Eeprom25<0x0FFF, 32, SPI, D>;

/// Type alias for the 25AA640A/25LC640A
pub type Eeprom25AA640A<SPI, D> = Eeprom25<0x1FFF, 32, SPI, D>;

/// Type alias for the 25AA256/25LC256
pub type Eeprom25AA256<SPI, D> = Eeprom25<0x7FFF, 64, SPI, D>;

/// The generic 25xx SPI EEPROM driver.
///
/// `SIZE` is the last valid address and `PAGE` the page size of the chip in bytes.
/// The chip select is owned by the [`SpiDevice`], every method call is one or more
/// complete transactions so the bus can be shared between calls.
pub struct Eeprom25<const SIZE: u16, const PAGE: u16, SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    spi: SPI,
    delay: D,
}

impl<const SIZE: u16, const PAGE: u16, SPI, D, E> Eeprom25<SIZE, PAGE, SPI, D>
where
    SPI: SpiDevice<Error = E>,
    D: DelayNs,
{
    pub const fn capacity() -> usize {
        SIZE as usize + 1
    }

    pub const fn page_size() -> usize {
        PAGE as usize
    }

    pub fn new(spi: SPI, delay: D) -> Self {
        const { assert!(PAGE > 0, "page size must not be zero") };
        Self { spi, delay }
    }

    /// Give back the bus and the delay
    pub fn release(self) -> (SPI, D) {
        (self.spi, self.delay)
    }

    pub fn verify_range(addr: Address, length: usize) -> Result<u16, Error<E>> {
        check_range(SIZE, addr, length)
    }

    fn command_write(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        self.spi.write(bytes).map_err(Error::Bus)
    }

    fn command_transfer(&mut self, bytes: &mut [u8]) -> Result<(), Error<E>> {
        self.spi.transfer_in_place(bytes).map_err(Error::Bus)
    }

    fn read_base(&mut self, addr: Address, cmd: Command, buff: &mut [u8]) -> Result<(), Error<E>> {
        let header = cmd.header(addr);

        let res = self
            .spi
            .transaction(&mut [Operation::Write(&header), Operation::Read(buff)])
            .map_err(Error::Bus);
        #[cfg(feature = "defmt")]
        if res.is_ok() {
            defmt::trace!("Read from {=u16}, {=usize}: {:?}", addr.0, buff.len(), buff);
        } else {
            defmt::error!("ERROR READ");
        }
        res
    }

    fn write_base(&mut self, addr: Address, cmd: Command, buff: &[u8]) -> Result<(), Error<E>> {
        let header = cmd.header(addr);

        let res = self
            .spi
            .transaction(&mut [Operation::Write(&header), Operation::Write(buff)])
            .map_err(Error::Bus);
        #[cfg(feature = "defmt")]
        if res.is_ok() {
            defmt::trace!("Write to {=u16} len {=usize}: {:?}", addr.0, buff.len(), buff);
        } else {
            defmt::error!("ERROR WRITE");
        }
        res
    }

    /// Read a single byte
    pub fn read_byte(&mut self, addr: Address) -> Result<u8, Error<E>> {
        Self::verify_range(addr, 1)?;
        let mut buff = [0];
        self.read_base(addr, Command::Read, &mut buff)?;
        Ok(buff[0])
    }

    /// Read n bytes from an address. Reads are not bound to pages, the chip increments
    /// its internal pointer across them.
    pub fn read(&mut self, addr: Address, buff: &mut [u8]) -> Result<(), Error<E>> {
        Self::verify_range(addr, buff.len())?;
        self.read_base(addr, Command::Read, buff)
    }

    /// Write a single byte. [`Self::write_enable`] is called internally
    pub fn write_byte(&mut self, addr: Address, value: u8) -> Result<(), Error<E>> {
        Self::verify_range(addr, 1)?;
        let [cmd, hi, lo] = Command::Write.header(addr);
        self.write_enable()?;
        self.command_write(&[cmd, hi, lo, value])?;
        self.delay.delay_ms(SPI_WRITE_CYCLE_MS);
        Ok(())
    }

    /// Write n bytes from an address, split on page boundaries.
    /// [`Self::write_enable`] is called internally before each page.
    ///
    /// A bus error aborts the write, pages written before the error keep their new content.
    pub fn write(&mut self, addr: Address, bytes: &[u8]) -> Result<(), Error<E>> {
        Self::verify_range(addr, bytes.len())?;

        for (address, chunk) in PageChunks::new(addr, bytes, PAGE) {
            self.write_enable()?;
            self.write_base(address, Command::Write, chunk)?;

            // No command is accepted until the write cycle is over
            self.delay.delay_ms(SPI_WRITE_CYCLE_MS);
        }
        Ok(())
    }

    /// Set the write enable latch, though you shouldn't need this function since it's already handled in the write operations.
    pub fn write_enable(&mut self) -> Result<(), Error<E>> {
        self.command_write(&[Command::WriteEnable as u8])
    }

    /// Reset the write enable latch
    pub fn write_disable(&mut self) -> Result<(), Error<E>> {
        self.command_write(&[Command::WriteDisable as u8])
    }

    /// Read the status register, always fetched from the chip
    pub fn read_status(&mut self) -> Result<StatusRegister, Error<E>> {
        let mut command: [u8; 2] = [Command::ReadStatus as u8, Command::Dummy as u8];

        self.command_transfer(&mut command)?;
        Ok(command[1].into())
    }

    /// Write the raw status register, the chip keeps only WPEN, BP1 and BP0
    /// (see [`STATUS_WRITABLE_MASK`]). [`Self::write_enable`] is called internally
    pub fn write_status(&mut self, value: u8) -> Result<(), Error<E>> {
        self.write_enable()?;
        self.command_write(&[Command::WriteStatus as u8, value])?;
        self.delay.delay_ms(SPI_WRITE_CYCLE_MS);
        Ok(())
    }

    /// Lock an area of the array against writes
    pub fn set_protection(
        &mut self,
        write_protect_enable: bool,
        block_protect: BlockProtect,
    ) -> Result<(), Error<E>> {
        let status = StatusRegister {
            write_protect_enable,
            block_protect,
            write_enable_latch: false,
            wip_bit: false,
        };
        self.write_status(status.into())
    }

    /// Read the wip bit, just less noisy than the `read_status().unwrap().wip_bit`
    pub fn poll_wip(&mut self) -> Result<(), Error<E>> {
        if self.read_status()?.wip_bit {
            return Err(Error::Busy);
        }
        Ok(())
    }

    /// Block until the chip reports no write in progress
    pub fn wait_ready(&mut self) -> Result<(), Error<E>> {
        loop {
            match self.poll_wip() {
                Ok(()) => return Ok(()),
                Err(Error::Busy) => self.delay.delay_ms(1),
                err @ Err(_) => return err,
            }
        }
    }
}

impl<const SIZE: u16, const PAGE: u16, SPI, D> ReadStorage for Eeprom25<SIZE, PAGE, SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    type Error = Error<SPI::Error>;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let addr = check_offset(SIZE, offset, bytes.len())?;
        if bytes.is_empty() {
            return Ok(());
        }
        Eeprom25::read(self, addr, bytes)
    }

    fn capacity(&self) -> usize {
        Self::capacity()
    }
}

impl<const SIZE: u16, const PAGE: u16, SPI, D> Storage for Eeprom25<SIZE, PAGE, SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let addr = check_offset(SIZE, offset, bytes.len())?;
        if bytes.is_empty() {
            return Ok(());
        }
        Eeprom25::write(self, addr, bytes)
    }
}
