use bit::BitIndex;

/// Bits of the status register the host is allowed to change, WPEN, BP1 and BP0
pub const STATUS_WRITABLE_MASK: u8 = 0b1000_1100;

/// Array area locked against writes, selected by the BP1:BP0 bits
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockProtect {
    None,
    UpperQuarter,
    UpperHalf,
    All,
}

impl From<u8> for BlockProtect {
    fn from(val: u8) -> Self {
        match val & 0b11 {
            0b00 => BlockProtect::None,
            0b01 => BlockProtect::UpperQuarter,
            0b10 => BlockProtect::UpperHalf,
            _ => BlockProtect::All,
        }
    }
}

impl From<BlockProtect> for u8 {
    fn from(val: BlockProtect) -> Self {
        match val {
            BlockProtect::None => 0b00,
            BlockProtect::UpperQuarter => 0b01,
            BlockProtect::UpperHalf => 0b10,
            BlockProtect::All => 0b11,
        }
    }
}

impl BlockProtect {
    /// First protected address for a device whose last address is `size`,
    /// `None` when nothing is protected
    pub const fn protected_from(self, size: u16) -> Option<u16> {
        let capacity = size as u32 + 1;
        match self {
            BlockProtect::None => None,
            BlockProtect::UpperQuarter => Some((capacity - capacity / 4) as u16),
            BlockProtect::UpperHalf => Some((capacity / 2) as u16),
            BlockProtect::All => Some(0),
        }
    }
}

/// ```text
/// W/R                    W/R  W/R  R    R
/// D7   D6   D5   D4      D3   D2   D1   D0
/// WPEN X    X    X   --  BP1  BP0  WEL  WIP
/// ```
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRegister {
    pub write_protect_enable: bool,
    pub block_protect: BlockProtect,
    pub write_enable_latch: bool,
    pub wip_bit: bool,
}

impl From<u8> for StatusRegister {
    fn from(val: u8) -> StatusRegister {
        StatusRegister {
            write_protect_enable: val.bit(7),
            block_protect: val.bit_range(2..4).into(),
            write_enable_latch: val.bit(1),
            wip_bit: val.bit(0),
        }
    }
}

impl From<StatusRegister> for u8 {
    fn from(status: StatusRegister) -> u8 {
        let mut val = 0u8;
        val.set_bit(7, status.write_protect_enable);
        val.set_bit_range(2..4, status.block_protect.into());
        val.set_bit(1, status.write_enable_latch);
        val.set_bit(0, status.wip_bit);
        val
    }
}
