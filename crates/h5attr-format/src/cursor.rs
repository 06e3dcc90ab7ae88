//! Bounds-checked little-endian field reader over a file image.
//!
//! Every structure in this crate is decoded through a [`Cursor`] so that a
//! truncated or hostile file turns into [`FormatError::UnexpectedEof`]
//! instead of a slice-index panic.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::FormatError;

/// Fail with `UnexpectedEof` unless `data[offset..offset + needed]` exists.
pub fn ensure_len(data: &[u8], offset: usize, needed: usize) -> Result<(), FormatError> {
    match offset.checked_add(needed) {
        Some(end) if end <= data.len() => Ok(()),
        _ => Err(FormatError::UnexpectedEof {
            expected: offset.saturating_add(needed),
            available: data.len(),
        }),
    }
}

/// True if `addr` is the all-ones "undefined address" for this offset width.
pub fn is_undefined_address(addr: u64, offset_size: u8) -> bool {
    match offset_size {
        2 => addr == 0xFFFF,
        4 => addr == 0xFFFF_FFFF,
        8 => addr == u64::MAX,
        _ => false,
    }
}

/// Round up to the next multiple of 8.
pub fn pad8(x: usize) -> usize {
    (x + 7) & !7
}

/// A read position inside a byte slice.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Start reading at an absolute offset.
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn ensure(&self, needed: usize) -> Result<(), FormatError> {
        ensure_len(self.data, self.pos, needed)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), FormatError> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.bytes(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, FormatError> {
        Ok(LittleEndian::read_u16(self.bytes(2)?))
    }

    pub fn u32(&mut self) -> Result<u32, FormatError> {
        Ok(LittleEndian::read_u32(self.bytes(4)?))
    }

    pub fn u64(&mut self) -> Result<u64, FormatError> {
        Ok(LittleEndian::read_u64(self.bytes(8)?))
    }

    /// Read an unsigned integer that is 1, 2, 4 or 8 bytes wide.
    pub fn uint(&mut self, width: u8) -> Result<u64, FormatError> {
        match width {
            1 => self.u8().map(u64::from),
            2 => self.u16().map(u64::from),
            4 => self.u32().map(u64::from),
            8 => self.u64(),
            other => Err(FormatError::InvalidOffsetSize(other)),
        }
    }

    /// Read a file address; the all-ones value maps to `None`.
    pub fn address(&mut self, offset_size: u8) -> Result<Option<u64>, FormatError> {
        let addr = self.uint(offset_size)?;
        if is_undefined_address(addr, offset_size) {
            Ok(None)
        } else {
            Ok(Some(addr))
        }
    }
}
