//! Link info message (0x0002): marks a new-style group and says whether
//! its links are stored densely in a fractal heap.

use crate::cursor::Cursor;
use crate::error::FormatError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkInfo {
    pub fractal_heap_address: Option<u64>,
    pub name_index_address: Option<u64>,
}

impl LinkInfo {
    pub fn parse(data: &[u8], offset_size: u8) -> Result<LinkInfo, FormatError> {
        let mut c = Cursor::new(data);
        let version = c.u8()?;
        if version != 0 {
            return Err(FormatError::InvalidLinkInfoVersion(version));
        }
        let flags = c.u8()?;
        if flags & 0x01 != 0 {
            // maximum creation index
            c.skip(8)?;
        }
        Ok(LinkInfo {
            fractal_heap_address: c.address(offset_size)?,
            name_index_address: c.address(offset_size)?,
        })
    }

    /// True if links live in a fractal heap rather than link messages.
    pub fn is_dense(&self) -> bool {
        self.fractal_heap_address.is_some()
    }

    /// Encode a compact link info message with 8-byte addresses.
    #[cfg(any(test, feature = "writer"))]
    pub fn serialize_compact() -> [u8; 18] {
        let mut buf = [0xFFu8; 18];
        buf[0] = 0;
        buf[1] = 0;
        buf
    }
}
