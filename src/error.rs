use core::fmt::Debug;
use embedded_storage_async::nor_flash::{NorFlashError, NorFlashErrorKind};

/// All possible errors emitted by the driver
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<BusError> {
    /// Internal bus error, the transfer did not complete
    Bus(BusError),

    /// Address out of bound
    OutOfBounds,

    /// Address not aligned
    NotAligned,

    /// A write cycle is still in progress
    Busy,
}

impl<BusError> NorFlashError for Error<BusError>
where
    BusError: Debug,
{
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            Error::OutOfBounds => NorFlashErrorKind::OutOfBounds,
            Error::NotAligned => NorFlashErrorKind::NotAligned,
            Error::Bus(_) | Error::Busy => NorFlashErrorKind::Other,
        }
    }
}
