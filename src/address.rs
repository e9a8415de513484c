/// An address on the memory chip
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Address(pub u16);

impl Address {
    /// Offset of the address inside its page
    pub const fn page_offset(self, page_size: u16) -> u16 {
        self.0 % page_size
    }

    /// Number of bytes left in the page starting at this address
    pub const fn page_remaining(self, page_size: u16) -> u16 {
        page_size - self.page_offset(page_size)
    }

    /// The address as sent on the bus, most significant byte first
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl From<u16> for Address {
    fn from(addr: u16) -> Address {
        Address(addr)
    }
}

impl From<Address> for u16 {
    fn from(addr: Address) -> u16 {
        addr.0
    }
}

impl From<Address> for u32 {
    fn from(addr: Address) -> u32 {
        addr.0 as u32
    }
}

/// Splits a write into chunks that each stay inside a single page.
///
/// The first chunk fills the rest of the page `start` points into, every following
/// chunk starts on a page boundary and holds at most one page. Chunks are yielded
/// in address order and cover the input without gaps. An empty input yields nothing.
///
/// The caller is responsible for checking that the whole range fits the device.
#[derive(Debug, Clone)]
pub struct PageChunks<'a> {
    cursor: u32,
    bytes: &'a [u8],
    page_size: u16,
}

impl<'a> PageChunks<'a> {
    /// Create the iterator.
    ///
    /// # Panics
    ///
    /// If `page_size` is zero.
    pub fn new(start: Address, bytes: &'a [u8], page_size: u16) -> Self {
        assert!(page_size > 0, "page size must not be zero");
        Self {
            cursor: start.0 as u32,
            bytes,
            page_size,
        }
    }
}

impl<'a> Iterator for PageChunks<'a> {
    type Item = (Address, &'a [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.bytes.is_empty() {
            return None;
        }

        let page_size = self.page_size as u32;
        let page_remain = (page_size - self.cursor % page_size) as usize;
        let take = page_remain.min(self.bytes.len());
        let (now, later) = self.bytes.split_at(take);

        let address = Address(self.cursor as u16);
        self.cursor += take as u32;
        self.bytes = later;
        Some((address, now))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.bytes.is_empty() {
            return (0, Some(0));
        }
        let page_size = self.page_size as usize;
        let offset = self.cursor as usize % page_size;
        let n = (offset + self.bytes.len()).div_ceil(page_size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for PageChunks<'_> {}
