//! HDF5 file signature (magic bytes) detection.

use crate::error::FormatError;

/// The 8-byte HDF5 magic signature.
pub const HDF5_SIGNATURE: [u8; 8] = [0x89, b'H', b'D', b'F', b'\r', b'\n', 0x1A, b'\n'];

/// Search for the signature at offset 0 and then at 512, 1024, 2048, ...
///
/// A user block in front of the superblock shifts it to one of those powers
/// of two. Returns the byte offset where the signature was found.
pub fn find_signature(data: &[u8]) -> Result<usize, FormatError> {
    if data.len() >= 8 && data[..8] == HDF5_SIGNATURE {
        return Ok(0);
    }

    let mut offset = 512usize;
    while offset.saturating_add(8) <= data.len() {
        if data[offset..offset + 8] == HDF5_SIGNATURE {
            return Ok(offset);
        }
        offset = offset.saturating_mul(2);
    }

    Err(FormatError::SignatureNotFound)
}
