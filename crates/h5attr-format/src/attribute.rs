//! Attribute message parsing (message type 0x000C) and compact-storage
//! attribute lookup on an object header.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::cursor::{pad8, Cursor};
use crate::dataspace::Dataspace;
use crate::datatype::Datatype;
use crate::error::FormatError;
use crate::message_type::MessageType;
use crate::object_header::{ObjectHeader, MSG_FLAG_SHARED};

/// A parsed attribute message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMessage {
    pub name: String,
    pub datatype: Datatype,
    pub dataspace: Dataspace,
    /// Everything after the dataspace. May carry trailing alignment padding.
    pub raw_data: Vec<u8>,
}

/// Sizes from the fixed 8-byte attribute message prefix.
struct Prefix {
    version: u8,
    name_size: usize,
    datatype_size: usize,
    dataspace_size: usize,
}

fn read_prefix(c: &mut Cursor<'_>) -> Result<Prefix, FormatError> {
    let version = c.u8()?;
    if !(1..=3).contains(&version) {
        return Err(FormatError::InvalidAttributeVersion(version));
    }
    let _flags = c.u8()?;
    let name_size = c.u16()? as usize;
    let datatype_size = c.u16()? as usize;
    let dataspace_size = c.u16()? as usize;
    if version == 3 {
        // name character set encoding
        c.skip(1)?;
    }
    Ok(Prefix {
        version,
        name_size,
        datatype_size,
        dataspace_size,
    })
}

/// Strip the NUL terminator the name size includes.
fn decode_name(raw: &[u8]) -> Result<&str, FormatError> {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    core::str::from_utf8(&raw[..end]).map_err(|_| FormatError::InvalidName)
}

/// Version 1 pads every field to 8 bytes; later versions pack them.
fn field_len(version: u8, size: usize) -> usize {
    if version == 1 {
        pad8(size)
    } else {
        size
    }
}

impl AttributeMessage {
    /// Parse an attribute message. `length_size` sizes dataspace dimensions.
    pub fn parse(data: &[u8], length_size: u8) -> Result<AttributeMessage, FormatError> {
        let mut c = Cursor::new(data);
        let p = read_prefix(&mut c)?;

        let name_raw = c.bytes(p.name_size)?;
        let name = String::from(decode_name(name_raw)?);
        c.skip(field_len(p.version, p.name_size) - p.name_size)?;

        let datatype = Datatype::parse(c.bytes(p.datatype_size)?)?;
        c.skip(field_len(p.version, p.datatype_size) - p.datatype_size)?;

        let dataspace = Dataspace::parse(c.bytes(p.dataspace_size)?, length_size)?;
        // v1 padding after the last field may be cut short at the message end
        let pad = field_len(p.version, p.dataspace_size) - p.dataspace_size;
        c.skip(pad.min(c.remaining()))?;

        let raw_data = c.bytes(c.remaining())?.to_vec();
        Ok(AttributeMessage {
            name,
            datatype,
            dataspace,
            raw_data,
        })
    }

    /// Read only the name, without decoding the type or dataspace.
    pub fn peek_name(data: &[u8]) -> Result<&str, FormatError> {
        let mut c = Cursor::new(data);
        let p = read_prefix(&mut c)?;
        decode_name(c.bytes(p.name_size)?)
    }

    /// Encode as a version 3 message with a UTF-8 name.
    #[cfg(any(test, feature = "writer"))]
    pub fn serialize(&self) -> Vec<u8> {
        let dt = self.datatype.serialize();
        let ds = self.dataspace.serialize();
        let name_size = self.name.len() + 1;
        let mut buf = Vec::with_capacity(9 + name_size + dt.len() + ds.len() + self.raw_data.len());
        buf.push(3);
        buf.push(0);
        buf.extend_from_slice(&(name_size as u16).to_le_bytes());
        buf.extend_from_slice(&(dt.len() as u16).to_le_bytes());
        buf.extend_from_slice(&(ds.len() as u16).to_le_bytes());
        buf.push(1);
        buf.extend_from_slice(self.name.as_bytes());
        buf.push(0);
        buf.extend_from_slice(&dt);
        buf.extend_from_slice(&ds);
        buf.extend_from_slice(&self.raw_data);
        buf
    }

    /// Encode as a version 1 message, each field padded to 8 bytes.
    #[cfg(any(test, feature = "writer"))]
    pub fn serialize_v1(&self) -> Vec<u8> {
        let dt = self.datatype.serialize();
        let ds = self.dataspace.serialize();
        let name_size = self.name.len() + 1;
        let mut buf = Vec::new();
        buf.push(1);
        buf.push(0);
        buf.extend_from_slice(&(name_size as u16).to_le_bytes());
        buf.extend_from_slice(&(dt.len() as u16).to_le_bytes());
        buf.extend_from_slice(&(ds.len() as u16).to_le_bytes());
        let mut name = self.name.as_bytes().to_vec();
        name.push(0);
        for field in [name, dt, ds] {
            let padded = pad8(field.len());
            buf.extend_from_slice(&field);
            buf.resize(buf.len() + padded - field.len(), 0);
        }
        buf.extend_from_slice(&self.raw_data);
        buf
    }
}

/// Attribute info message (0x0015): where dense attribute storage lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    /// Fractal heap holding dense attributes, if any.
    pub fractal_heap_address: Option<u64>,
    pub name_index_address: Option<u64>,
}

impl AttributeInfo {
    pub fn parse(data: &[u8], offset_size: u8) -> Result<AttributeInfo, FormatError> {
        let mut c = Cursor::new(data);
        let _version = c.u8()?;
        let flags = c.u8()?;
        if flags & 0x01 != 0 {
            // maximum creation index
            c.skip(2)?;
        }
        let fractal_heap_address = c.address(offset_size)?;
        let name_index_address = c.address(offset_size)?;
        Ok(AttributeInfo {
            fractal_heap_address,
            name_index_address,
        })
    }
}

/// Look up an attribute by exact name on an object header.
///
/// Returns `Ok(None)` when the object has no such attribute. Attributes that
/// are not held in compact form (dense or shared storage) cannot be read; if
/// the name was not found and such storage is present, that is reported as an
/// error instead of `None`.
pub fn find_attribute(
    header: &ObjectHeader,
    name: &str,
    offset_size: u8,
    length_size: u8,
) -> Result<Option<AttributeMessage>, FormatError> {
    let mut saw_shared = false;
    for msg in header.messages_of(MessageType::Attribute) {
        if msg.flags & MSG_FLAG_SHARED != 0 {
            saw_shared = true;
            continue;
        }
        if AttributeMessage::peek_name(&msg.data)? == name {
            return AttributeMessage::parse(&msg.data, length_size).map(Some);
        }
    }

    if let Some(info) = header.find(MessageType::AttributeInfo) {
        if AttributeInfo::parse(&info.data, offset_size)?
            .fractal_heap_address
            .is_some()
        {
            return Err(FormatError::DenseStorageUnsupported("attribute"));
        }
    }
    if saw_shared {
        return Err(FormatError::SharedMessageUnsupported);
    }
    Ok(None)
}
