use crate::address::Address;

/// Instruction set of the 25xx serial EEPROM family
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Command {
    WriteStatus = 0x01,
    Write = 0x02,
    Read = 0x03,
    WriteDisable = 0x04,
    ReadStatus = 0x05,
    WriteEnable = 0x06,

    Dummy = 0x00,
}

impl Command {
    /// Instruction byte followed by the big endian address
    pub(crate) fn header(self, addr: Address) -> [u8; 3] {
        let [hi, lo] = addr.to_be_bytes();
        [self as u8, hi, lo]
    }
}
