//! HDF5 superblock parsing for versions 0 through 3.

use crate::cursor::Cursor;
use crate::error::FormatError;
use crate::signature::HDF5_SIGNATURE;

/// Parsed HDF5 superblock (all versions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Superblock {
    /// Superblock version (0-3).
    pub version: u8,
    /// Size of file addresses in bytes (2, 4, or 8).
    pub offset_size: u8,
    /// Size of lengths in bytes (2, 4, or 8).
    pub length_size: u8,
    /// Absolute position that all other addresses are relative to.
    pub base_address: u64,
    pub eof_address: u64,
    /// Object header address of the root group.
    pub root_group_address: u64,
    /// Group leaf node K (v0/v1 only).
    pub group_leaf_node_k: Option<u16>,
    /// Group internal node K (v0/v1 only).
    pub group_internal_node_k: Option<u16>,
    pub consistency_flags: u32,
    /// Superblock extension address (v2/v3 only).
    pub extension_address: Option<u64>,
}

fn validate_sizes(offset_size: u8, length_size: u8) -> Result<(), FormatError> {
    if !matches!(offset_size, 2 | 4 | 8) {
        return Err(FormatError::InvalidOffsetSize(offset_size));
    }
    if !matches!(length_size, 2 | 4 | 8) {
        return Err(FormatError::InvalidLengthSize(length_size));
    }
    Ok(())
}

impl Superblock {
    /// Parse a superblock from `data` starting at `signature_offset`.
    pub fn parse(data: &[u8], signature_offset: usize) -> Result<Superblock, FormatError> {
        let mut c = Cursor::at(data, signature_offset);
        if c.bytes(8)? != HDF5_SIGNATURE {
            return Err(FormatError::SignatureNotFound);
        }
        let version = c.u8()?;
        match version {
            0 | 1 => Self::parse_v0v1(c, version),
            2 | 3 => Self::parse_v2v3(data, signature_offset, c, version),
            v => Err(FormatError::UnsupportedVersion(v)),
        }
    }

    fn parse_v0v1(mut c: Cursor<'_>, version: u8) -> Result<Superblock, FormatError> {
        // free-space version, root group version, reserved, shared header version
        c.skip(4)?;
        let offset_size = c.u8()?;
        let length_size = c.u8()?;
        validate_sizes(offset_size, length_size)?;
        c.skip(1)?;
        let group_leaf_node_k = c.u16()?;
        let group_internal_node_k = c.u16()?;
        if version == 1 {
            // indexed storage K + reserved
            c.skip(4)?;
        }
        let consistency_flags = c.u32()?;

        let base_address = c.uint(offset_size)?;
        let _free_space = c.uint(offset_size)?;
        let eof_address = c.uint(offset_size)?;
        let _driver_info = c.uint(offset_size)?;

        // root group symbol table entry: link name offset, then header address
        let _link_name_offset = c.uint(offset_size)?;
        let root_group_address = c.uint(offset_size)?;

        Ok(Superblock {
            version,
            offset_size,
            length_size,
            base_address,
            eof_address,
            root_group_address,
            group_leaf_node_k: Some(group_leaf_node_k),
            group_internal_node_k: Some(group_internal_node_k),
            consistency_flags,
            extension_address: None,
        })
    }

    fn parse_v2v3(
        data: &[u8],
        start: usize,
        mut c: Cursor<'_>,
        version: u8,
    ) -> Result<Superblock, FormatError> {
        let offset_size = c.u8()?;
        let length_size = c.u8()?;
        validate_sizes(offset_size, length_size)?;
        let consistency_flags = u32::from(c.u8()?);

        let base_address = c.uint(offset_size)?;
        let extension_address = c.address(offset_size)?;
        let eof_address = c.uint(offset_size)?;
        let root_group_address = c.uint(offset_size)?;
        let _stored = c.u32()?;

        #[cfg(feature = "checksum")]
        crate::checksum::verify_trailing(&data[start..c.position()])?;
        #[cfg(not(feature = "checksum"))]
        let _ = (data, start);

        Ok(Superblock {
            version,
            offset_size,
            length_size,
            base_address,
            eof_address,
            root_group_address,
            group_leaf_node_k: None,
            group_internal_node_k: None,
            consistency_flags,
            extension_address,
        })
    }
}
