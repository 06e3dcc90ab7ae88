//! Global heap collections ("GCOL"), where variable-length string
//! elements are stored.

#[cfg(all(not(feature = "std"), any(test, feature = "writer")))]
use alloc::vec::Vec;

use crate::cursor::{pad8, Cursor};
use crate::error::FormatError;

const GCOL_SIGNATURE: [u8; 4] = *b"GCOL";

/// Reference to one object of a global heap collection, as stored in a
/// variable-length element: `length(4) + collection address + index(4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalHeapId {
    /// Sequence length (bytes, for strings).
    pub length: u32,
    pub collection_address: u64,
    pub index: u32,
}

impl GlobalHeapId {
    pub fn parse(data: &[u8], offset_size: u8) -> Result<GlobalHeapId, FormatError> {
        let mut c = Cursor::new(data);
        Ok(GlobalHeapId {
            length: c.u32()?,
            collection_address: c.uint(offset_size)?,
            index: c.u32()?,
        })
    }

    /// Encoded width for the given address size.
    pub fn encoded_len(offset_size: u8) -> usize {
        8 + offset_size as usize
    }
}

/// Borrow the bytes of object `index` in the collection at `address`.
pub fn find_object(
    file: &[u8],
    address: u64,
    index: u32,
    length_size: u8,
) -> Result<&[u8], FormatError> {
    let not_found = FormatError::GlobalHeapObjectNotFound {
        collection_address: address,
        index: index as u16,
    };
    let start = address as usize;
    let mut c = Cursor::at(file, start);
    if c.bytes(4)? != GCOL_SIGNATURE {
        return Err(FormatError::InvalidGlobalHeapSignature);
    }
    let version = c.u8()?;
    if version != 1 {
        return Err(FormatError::InvalidGlobalHeapVersion(version));
    }
    c.skip(3)?;
    let collection_size = c.uint(length_size)? as usize;
    let end = start.saturating_add(collection_size).min(file.len());
    let object_header = 8 + length_size as usize;

    while c.position() + object_header <= end {
        let obj_index = c.u16()?;
        if obj_index == 0 {
            // free space runs to the end of the collection
            break;
        }
        let _ref_count = c.u16()?;
        c.skip(4)?;
        let size = c.uint(length_size)? as usize;
        let body = c.position();
        if u32::from(obj_index) == index {
            return c.bytes(size);
        }
        c.seek(body.saturating_add(pad8(size)));
    }
    Err(not_found)
}

/// Build a collection holding `objects` with indices starting at 1.
/// Lengths are 8 bytes wide.
#[cfg(any(test, feature = "writer"))]
pub fn serialize_collection(objects: &[&[u8]]) -> Vec<u8> {
    let body: usize = objects.iter().map(|o| 16 + pad8(o.len())).sum();
    let total = 16 + body;
    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(&GCOL_SIGNATURE);
    buf.extend_from_slice(&[1, 0, 0, 0]);
    buf.extend_from_slice(&(total as u64).to_le_bytes());
    for (i, obj) in objects.iter().enumerate() {
        buf.extend_from_slice(&((i + 1) as u16).to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes());
        buf.extend_from_slice(&[0; 4]);
        buf.extend_from_slice(&(obj.len() as u64).to_le_bytes());
        buf.extend_from_slice(obj);
        buf.resize(buf.len() + pad8(obj.len()) - obj.len(), 0);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_second_object() {
        let mut file = vec![0u8; 32];
        file.extend_from_slice(&serialize_collection(&[b"positive", b"negative mode"]));
        assert_eq!(find_object(&file, 32, 1, 8).unwrap(), b"positive");
        assert_eq!(find_object(&file, 32, 2, 8).unwrap(), b"negative mode");
    }

    #[test]
    fn missing_index() {
        let file = serialize_collection(&[b"x"]);
        assert_eq!(
            find_object(&file, 0, 5, 8),
            Err(FormatError::GlobalHeapObjectNotFound {
                collection_address: 0,
                index: 5
            })
        );
    }

    #[test]
    fn stops_at_free_space() {
        let mut file = serialize_collection(&[b"abc"]);
        let size = file.len() as u64 + 32;
        file[8..16].copy_from_slice(&size.to_le_bytes());
        // free-space object with index 0
        file.extend_from_slice(&[0u8; 32]);
        assert!(find_object(&file, 0, 2, 8).is_err());
        assert_eq!(find_object(&file, 0, 1, 8).unwrap(), b"abc");
    }

    #[test]
    fn wrong_signature() {
        let file = [0u8; 32];
        assert_eq!(
            find_object(&file, 0, 1, 8),
            Err(FormatError::InvalidGlobalHeapSignature)
        );
    }

    #[test]
    fn heap_id_parse() {
        let mut raw = 8u32.to_le_bytes().to_vec();
        raw.extend_from_slice(&4096u64.to_le_bytes());
        raw.extend_from_slice(&3u32.to_le_bytes());
        let id = GlobalHeapId::parse(&raw, 8).unwrap();
        assert_eq!(id.length, 8);
        assert_eq!(id.collection_address, 4096);
        assert_eq!(id.index, 3);
        assert_eq!(GlobalHeapId::encoded_len(8), raw.len());
    }
}
