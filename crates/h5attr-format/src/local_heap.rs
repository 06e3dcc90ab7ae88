//! Local heaps ("HEAP"), which hold the link names of symbol-table groups.

use crate::cursor::Cursor;
use crate::error::FormatError;

const HEAP_SIGNATURE: [u8; 4] = *b"HEAP";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalHeap {
    pub data_segment_size: u64,
    pub data_segment_address: u64,
}

impl LocalHeap {
    pub fn parse(
        file: &[u8],
        address: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<LocalHeap, FormatError> {
        let mut c = Cursor::at(file, address);
        if c.bytes(4)? != HEAP_SIGNATURE {
            return Err(FormatError::InvalidLocalHeapSignature);
        }
        let version = c.u8()?;
        if version != 0 {
            return Err(FormatError::InvalidLocalHeapVersion(version));
        }
        c.skip(3)?;
        let data_segment_size = c.uint(length_size)?;
        let _free_list_head = c.uint(length_size)?;
        let data_segment_address = c.uint(offset_size)?;
        Ok(LocalHeap {
            data_segment_size,
            data_segment_address,
        })
    }

    /// NUL-terminated name at `offset` inside the data segment.
    pub fn name_at<'a>(&self, file: &'a [u8], offset: u64) -> Result<&'a str, FormatError> {
        if offset >= self.data_segment_size {
            return Err(FormatError::UnexpectedEof {
                expected: offset as usize,
                available: self.data_segment_size as usize,
            });
        }
        let overflow = FormatError::UnexpectedEof {
            expected: usize::MAX,
            available: file.len(),
        };
        let start = self
            .data_segment_address
            .checked_add(offset)
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| overflow.clone())?;
        let end = self
            .data_segment_address
            .checked_add(self.data_segment_size)
            .and_then(|v| usize::try_from(v).ok())
            .ok_or(overflow)?;
        let segment = file.get(start..end.min(file.len())).ok_or(FormatError::UnexpectedEof {
            expected: end,
            available: file.len(),
        })?;
        let len = segment.iter().position(|&b| b == 0).unwrap_or(segment.len());
        core::str::from_utf8(&segment[..len]).map_err(|_| FormatError::InvalidName)
    }
}
