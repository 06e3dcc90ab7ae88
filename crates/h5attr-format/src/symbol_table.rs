//! Symbol table message (0x0011) and symbol table nodes ("SNOD") of
//! old-style groups.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::cursor::Cursor;
use crate::error::FormatError;

const SNOD_SIGNATURE: [u8; 4] = *b"SNOD";

/// Where an old-style group keeps its B-tree and name heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolTableMessage {
    pub btree_address: u64,
    pub local_heap_address: u64,
}

impl SymbolTableMessage {
    pub fn parse(data: &[u8], offset_size: u8) -> Result<SymbolTableMessage, FormatError> {
        let mut c = Cursor::new(data);
        Ok(SymbolTableMessage {
            btree_address: c.uint(offset_size)?,
            local_heap_address: c.uint(offset_size)?,
        })
    }
}

/// One group member: name offset into the local heap plus header address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolTableEntry {
    pub name_offset: u64,
    pub object_header_address: u64,
}

/// Read the entries of the symbol table node at `address`.
pub fn read_node(
    file: &[u8],
    address: usize,
    offset_size: u8,
) -> Result<Vec<SymbolTableEntry>, FormatError> {
    let mut c = Cursor::at(file, address);
    if c.bytes(4)? != SNOD_SIGNATURE {
        return Err(FormatError::InvalidSymbolTableNodeSignature);
    }
    let version = c.u8()?;
    if version != 1 {
        return Err(FormatError::InvalidSymbolTableNodeVersion(version));
    }
    c.skip(1)?;
    let count = c.u16()? as usize;
    let mut entries = Vec::with_capacity(count);
    for _ in 0..count {
        let name_offset = c.uint(offset_size)?;
        let object_header_address = c.uint(offset_size)?;
        // cache type, reserved, scratch pad
        c.skip(4 + 4 + 16)?;
        entries.push(SymbolTableEntry {
            name_offset,
            object_header_address,
        });
    }
    Ok(entries)
}
