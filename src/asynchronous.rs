use crate::{
    address::{Address, PageChunks},
    check_offset, check_range,
    command::Command,
    error::Error,
    register::*,
    SPI_WRITE_CYCLE_MS,
};
use embassy_futures::yield_now;
use embedded_hal::spi::Operation;
use embedded_hal_async::{delay::DelayNs, spi::SpiDevice};
use embedded_storage_async::nor_flash::{MultiwriteNorFlash, NorFlash, ReadNorFlash};

/// Type alias for the AsyncEeprom25AA160A
pub type AsyncEeprom25AA160A<SPI, D> = AsyncEeprom25<0x07FF, 16, SPI, D>;

/// Type alias for the AsyncEeprom25AA160B
pub type AsyncEeprom25AA160B<SPI, D> = AsyncEeprom25<0x07FF, 32, SPI, D>;

/// Type alias for the AsyncEeprom25AA320A
pub type AsyncEeprom25AA320A<SPI, D> = AsyncEeprom25<0x0FFF, 32, SPI, D>;

/// Type alias for the AsyncEeprom25AA640A
pub type AsyncEeprom25AA640A<SPI, D> = AsyncEeprom25<0x1FFF, 32, SPI, D>;

/// Type alias for the AsyncEeprom25AA256
pub type AsyncEeprom25AA256<SPI, D> = AsyncEeprom25<0x7FFF, 64, SPI, D>;

/// Source of erased bytes, at least as long as the largest supported page
const ERASED: [u8; 64] = [0xFF; 64];

/// The generic async 25xx SPI EEPROM driver
pub struct AsyncEeprom25<const SIZE: u16, const PAGE: u16, SPI, D>
where
    SPI: SpiDevice,
    D: DelayNs,
{
    spi: SPI,
    delay: D,
}

impl<const SIZE: u16, const PAGE: u16, SPI, D, E> AsyncEeprom25<SIZE, PAGE, SPI, D>
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

    async fn command_write(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        self.spi.write(bytes).await.map_err(Error::Bus)
    }

    async fn command_transfer(&mut self, bytes: &mut [u8]) -> Result<(), Error<E>> {
        self.spi.transfer_in_place(bytes).await.map_err(Error::Bus)
    }

    async fn read_base(
        &mut self,
        addr: Address,
        cmd: Command,
        buff: &mut [u8],
    ) -> Result<(), Error<E>> {
        let header = cmd.header(addr);

        let res = self
            .spi
            .transaction(&mut [Operation::Write(&header), Operation::Read(buff)])
            .await
            .map_err(Error::Bus);
        #[cfg(feature = "defmt")]
        if res.is_ok() {
            defmt::trace!("Read from {=u16}, {=usize}: {:?}", addr.0, buff.len(), buff);
        } else {
            defmt::error!("ERROR READ");
        }
        res
    }

    async fn write_base(&mut self, addr: Address, cmd: Command, buff: &[u8]) -> Result<(), Error<E>> {
        let header = cmd.header(addr);

        self.spi
            .transaction(&mut [Operation::Write(&header), Operation::Write(buff)])
            .await
            .map_err(Error::Bus)
    }

    /// Read a single byte
    pub async fn read_byte(&mut self, addr: Address) -> Result<u8, Error<E>> {
        Self::verify_range(addr, 1)?;
        let mut buff = [0];
        self.read_base(addr, Command::Read, &mut buff).await?;
        Ok(buff[0])
    }

    /// Read n bytes from an address, reads may span pages
    pub async fn read(&mut self, addr: Address, buff: &mut [u8]) -> Result<(), Error<E>> {
        Self::verify_range(addr, buff.len())?;
        self.read_base(addr, Command::Read, buff).await
    }

    /// Write a single byte. [`Self::write_enable`] is called internally
    pub async fn write_byte(&mut self, addr: Address, value: u8) -> Result<(), Error<E>> {
        Self::verify_range(addr, 1)?;
        let [cmd, hi, lo] = Command::Write.header(addr);
        self.write_enable().await?;
        self.command_write(&[cmd, hi, lo, value]).await?;
        self.delay.delay_ms(SPI_WRITE_CYCLE_MS).await;
        Ok(())
    }

    /// Write n bytes from an address, split on page boundaries.
    /// [`Self::write_enable`] is called internally before each page
    pub async fn write(&mut self, addr: Address, bytes: &[u8]) -> Result<(), Error<E>> {
        Self::verify_range(addr, bytes.len())?;

        for (address, chunk) in PageChunks::new(addr, bytes, PAGE) {
            #[cfg(feature = "defmt")]
            defmt::trace!("Write to {=u16} len {=usize}: {:?}", address.0, chunk.len(), chunk);
            self.write_enable().await?;
            self.write_base(address, Command::Write, chunk).await?;

            // Wait for the write cycle, to behave like a flush
            self.delay.delay_ms(SPI_WRITE_CYCLE_MS).await;
        }
        Ok(())
    }

    /// Set the write enable latch, though you shouldn't need this function since it's already handled in the write operations.
    pub async fn write_enable(&mut self) -> Result<(), Error<E>> {
        self.command_write(&[Command::WriteEnable as u8]).await
    }

    /// Reset the write enable latch
    pub async fn write_disable(&mut self) -> Result<(), Error<E>> {
        self.command_write(&[Command::WriteDisable as u8]).await
    }

    /// Read the status register
    pub async fn read_status(&mut self) -> Result<StatusRegister, Error<E>> {
        let mut command: [u8; 2] = [Command::ReadStatus as u8, Command::Dummy as u8];

        self.command_transfer(&mut command).await?;
        Ok(command[1].into())
    }

    /// Write the raw status register, the chip ignores the read only bits.
    /// [`Self::write_enable`] is called internally
    pub async fn write_status(&mut self, value: u8) -> Result<(), Error<E>> {
        self.write_enable().await?;
        self.command_write(&[Command::WriteStatus as u8, value]).await?;
        self.delay.delay_ms(SPI_WRITE_CYCLE_MS).await;
        Ok(())
    }

    /// Lock an area of the array against writes
    pub async fn set_protection(
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
        self.write_status(status.into()).await
    }

    /// Read the wip bit, just less noisy than the `read_status().await.unwrap().wip_bit`
    pub async fn poll_wip(&mut self) -> Result<(), Error<E>> {
        if self.read_status().await?.wip_bit {
            return Err(Error::Busy);
        }
        Ok(())
    }

    pub async fn wait_ready(&mut self) -> Result<(), Error<E>> {
        loop {
            let res = self.poll_wip().await;
            match res {
                Ok(()) => return Ok(()),
                Err(Error::Busy) => yield_now().await,
                err @ Err(_) => return err,
            }
        }
    }
}

impl<const SIZE: u16, const PAGE: u16, SPI: SpiDevice, D: DelayNs>
    embedded_storage_async::nor_flash::ErrorType for AsyncEeprom25<SIZE, PAGE, SPI, D>
{
    type Error = Error<SPI::Error>;
}

impl<const SIZE: u16, const PAGE: u16, SPI: SpiDevice, D: DelayNs> ReadNorFlash
    for AsyncEeprom25<SIZE, PAGE, SPI, D>
{
    const READ_SIZE: usize = 1;

    async fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let addr = check_offset(SIZE, offset, bytes.len())?;
        if bytes.is_empty() {
            return Ok(());
        }
        AsyncEeprom25::read(self, addr, bytes).await
    }

    fn capacity(&self) -> usize {
        Self::capacity()
    }
}

/// The EEPROM needs no erase before a write, erasing sets the range back to `0xFF`
/// so that code written against NOR flash sees the state it expects.
impl<const SIZE: u16, const PAGE: u16, SPI: SpiDevice, D: DelayNs> NorFlash
    for AsyncEeprom25<SIZE, PAGE, SPI, D>
{
    const WRITE_SIZE: usize = 1;

    const ERASE_SIZE: usize = PAGE as usize;

    async fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        let erase_size = Self::ERASE_SIZE as u32;
        if from > to || to > Self::capacity() as u32 {
            return Err(Error::OutOfBounds);
        }
        if from % erase_size != 0 || to % erase_size != 0 {
            return Err(Error::NotAligned);
        }

        let mut idx = from;
        while idx < to {
            let len = (to - idx).min(ERASED.len() as u32);
            #[cfg(feature = "defmt")]
            defmt::warn!("Erase {=u32} len {=u32}", idx, len);
            AsyncEeprom25::write(self, Address(idx as u16), &ERASED[..len as usize]).await?;
            idx += len;
        }
        Ok(())
    }

    async fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let addr = check_offset(SIZE, offset, bytes.len())?;
        if bytes.is_empty() {
            return Ok(());
        }
        AsyncEeprom25::write(self, addr, bytes).await
    }
}

impl<const SIZE: u16, const PAGE: u16, SPI: SpiDevice, D: DelayNs> MultiwriteNorFlash
    for AsyncEeprom25<SIZE, PAGE, SPI, D>
{
}
