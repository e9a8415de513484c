//! Simulated serial EEPROMs for the host side tests.
//!
//! The SPI part follows the 25xx datasheet closely enough to catch framing mistakes:
//! data only lands while the write enable latch is set, the latch clears after each
//! write, bytes past the end of a page wrap to its start and WEL/WIP are read only.
#![allow(dead_code)]

use embedded_hal::{i2c, spi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeError;

impl spi::Error for FakeError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

impl i2c::Error for FakeError {
    fn kind(&self) -> i2c::ErrorKind {
        i2c::ErrorKind::NoAcknowledge(i2c::NoAcknowledgeSource::Address)
    }
}

/// One chip select cycle as seen by the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    WriteEnable,
    WriteDisable,
    ReadStatus,
    WriteStatus(u8),
    Write { addr: u16, data: Vec<u8> },
    Read { addr: u16, len: usize },
    Unknown(Vec<u8>),
}

const WRSR: u8 = 0x01;
const WRITE: u8 = 0x02;
const READ: u8 = 0x03;
const WRDI: u8 = 0x04;
const RDSR: u8 = 0x05;
const WREN: u8 = 0x06;

pub struct Fake25 {
    pub mem: Vec<u8>,
    pub page: usize,
    /// WPEN, BP1 and BP0, the only bits stored by the chip
    pub status: u8,
    pub wel: bool,
    pub frames: Vec<Frame>,
    /// Number of status reads that report WIP after each write
    pub wip_polls: usize,
    wip_left: usize,
    write_frames: usize,
    /// Fail the nth write frame, counting from zero
    pub fail_write_frame: Option<usize>,
    pub fail_all: bool,
}

impl Fake25 {
    pub fn new(capacity: usize, page: usize) -> Self {
        Self {
            mem: vec![0xFF; capacity],
            page,
            status: 0,
            wel: false,
            frames: Vec::new(),
            wip_polls: 0,
            wip_left: 0,
            write_frames: 0,
            fail_write_frame: None,
            fail_all: false,
        }
    }

    /// 25AA160A, 2KiB with 16 byte pages
    pub fn new_25aa160a() -> Self {
        Self::new(0x800, 16)
    }

    pub fn write_frames(&self) -> Vec<(u16, Vec<u8>)> {
        self.frames
            .iter()
            .filter_map(|f| match f {
                Frame::Write { addr, data } => Some((*addr, data.clone())),
                _ => None,
            })
            .collect()
    }

    fn status_byte(&self) -> u8 {
        let mut val = self.status & 0x8C;
        if self.wel {
            val |= 0x02;
        }
        if self.wip_left > 0 {
            val |= 0x01;
        }
        val
    }

    fn protected_from(&self) -> usize {
        let capacity = self.mem.len();
        match (self.status >> 2) & 0b11 {
            0b00 => capacity,
            0b01 => capacity - capacity / 4,
            0b10 => capacity / 2,
            _ => 0,
        }
    }

    /// Shift one byte in, return the byte shifted out at the same time
    fn clock(&mut self, rx: &mut Vec<u8>, mosi: u8) -> u8 {
        let pos = rx.len();
        let miso = match rx.first().copied() {
            Some(RDSR) if pos >= 1 => {
                let val = self.status_byte();
                if self.wip_left > 0 {
                    self.wip_left -= 1;
                }
                val
            }
            Some(READ) if pos >= 3 => {
                let addr = u16::from_be_bytes([rx[1], rx[2]]) as usize;
                self.mem[(addr + pos - 3) % self.mem.len()]
            }
            _ => 0,
        };
        rx.push(mosi);
        miso
    }

    fn finish(&mut self, rx: &[u8]) -> Result<(), FakeError> {
        let Some(&cmd) = rx.first() else {
            return Ok(());
        };
        match cmd {
            WREN => {
                self.wel = true;
                self.frames.push(Frame::WriteEnable);
            }
            WRDI => {
                self.wel = false;
                self.frames.push(Frame::WriteDisable);
            }
            RDSR => self.frames.push(Frame::ReadStatus),
            WRSR if rx.len() == 2 => {
                self.frames.push(Frame::WriteStatus(rx[1]));
                if self.wel {
                    self.status = rx[1] & 0x8C;
                    self.wel = false;
                    self.wip_left = self.wip_polls;
                }
            }
            WRITE if rx.len() >= 3 => {
                let addr = u16::from_be_bytes([rx[1], rx[2]]);
                let data = rx[3..].to_vec();
                self.frames.push(Frame::Write {
                    addr,
                    data: data.clone(),
                });

                let index = self.write_frames;
                self.write_frames += 1;
                if self.fail_write_frame == Some(index) {
                    return Err(FakeError);
                }

                let addr = addr as usize;
                if self.wel && !data.is_empty() && addr < self.protected_from() {
                    let base = addr - addr % self.page;
                    let offset = addr % self.page;
                    for (i, b) in data.iter().enumerate() {
                        self.mem[base + (offset + i) % self.page] = *b;
                    }
                    self.wip_left = self.wip_polls;
                }
                self.wel = false;
            }
            READ if rx.len() >= 3 => self.frames.push(Frame::Read {
                addr: u16::from_be_bytes([rx[1], rx[2]]),
                len: rx.len() - 3,
            }),
            _ => self.frames.push(Frame::Unknown(rx.to_vec())),
        }
        Ok(())
    }

    fn run(&mut self, operations: &mut [spi::Operation<'_, u8>]) -> Result<(), FakeError> {
        if self.fail_all {
            return Err(FakeError);
        }
        let mut rx = Vec::new();
        for op in operations.iter_mut() {
            match op {
                spi::Operation::Write(words) => {
                    for &b in words.iter() {
                        self.clock(&mut rx, b);
                    }
                }
                spi::Operation::Read(words) => {
                    for w in words.iter_mut() {
                        *w = self.clock(&mut rx, 0x00);
                    }
                }
                spi::Operation::Transfer(read, write) => {
                    for i in 0..read.len().max(write.len()) {
                        let out = self.clock(&mut rx, write.get(i).copied().unwrap_or(0x00));
                        if let Some(slot) = read.get_mut(i) {
                            *slot = out;
                        }
                    }
                }
                spi::Operation::TransferInPlace(words) => {
                    for w in words.iter_mut() {
                        *w = self.clock(&mut rx, *w);
                    }
                }
                spi::Operation::DelayNs(_) => {}
            }
        }
        self.finish(&rx)
    }
}

impl spi::ErrorType for Fake25 {
    type Error = FakeError;
}

impl spi::SpiDevice for Fake25 {
    fn transaction(&mut self, operations: &mut [spi::Operation<'_, u8>]) -> Result<(), FakeError> {
        self.run(operations)
    }
}

impl embedded_hal_async::spi::SpiDevice for Fake25 {
    async fn transaction(
        &mut self,
        operations: &mut [spi::Operation<'_, u8>],
    ) -> Result<(), FakeError> {
        self.run(operations)
    }
}

/// M24xxx on the I2C bus, answers only to its own device select
pub struct Fake24 {
    pub mem: Vec<u8>,
    pub page: usize,
    pub address: u8,
    pub frames: Vec<Frame>,
    write_frames: usize,
    pub fail_write_frame: Option<usize>,
}

impl Fake24 {
    pub fn new(capacity: usize, page: usize, address: u8) -> Self {
        Self {
            mem: vec![0xFF; capacity],
            page,
            address,
            frames: Vec::new(),
            write_frames: 0,
            fail_write_frame: None,
        }
    }

    /// M24256, 32KiB with 64 byte pages
    pub fn new_m24256() -> Self {
        Self::new(0x8000, 64, 0x50)
    }

    pub fn write_frames(&self) -> Vec<(u16, Vec<u8>)> {
        self.frames
            .iter()
            .filter_map(|f| match f {
                Frame::Write { addr, data } => Some((*addr, data.clone())),
                _ => None,
            })
            .collect()
    }
}

impl i2c::ErrorType for Fake24 {
    type Error = FakeError;
}

impl i2c::I2c for Fake24 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [i2c::Operation<'_>],
    ) -> Result<(), FakeError> {
        if address != self.address {
            return Err(FakeError);
        }

        let mut written = Vec::new();
        let mut read_len = 0;
        for op in operations.iter_mut() {
            match op {
                i2c::Operation::Write(bytes) => written.extend_from_slice(bytes),
                i2c::Operation::Read(buff) => {
                    let addr = u16::from_be_bytes([written[0], written[1]]) as usize;
                    for (i, b) in buff.iter_mut().enumerate() {
                        *b = self.mem[(addr + read_len + i) % self.mem.len()];
                    }
                    read_len += buff.len();
                }
            }
        }

        let addr = u16::from_be_bytes([written[0], written[1]]);
        if read_len > 0 {
            self.frames.push(Frame::Read {
                addr,
                len: read_len,
            });
            return Ok(());
        }

        let data = written[2..].to_vec();
        self.frames.push(Frame::Write {
            addr,
            data: data.clone(),
        });
        let index = self.write_frames;
        self.write_frames += 1;
        if self.fail_write_frame == Some(index) {
            return Err(FakeError);
        }

        let addr = addr as usize;
        let base = addr - addr % self.page;
        let offset = addr % self.page;
        for (i, b) in data.iter().enumerate() {
            self.mem[base + (offset + i) % self.page] = *b;
        }
        Ok(())
    }
}

/// Delay that only adds up the requested time
#[derive(Debug, Default)]
pub struct TestDelay {
    pub total_ns: u64,
}

impl TestDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl embedded_hal::delay::DelayNs for TestDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

impl embedded_hal_async::delay::DelayNs for TestDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

/// Deterministic test pattern
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    let mut state = seed as u32 | 1;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            (state >> 16) as u8
        })
        .collect()
}
