//! Link message parsing (message type 0x0006), the child entries of
//! compact "new-style" groups.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::cursor::Cursor;
use crate::error::FormatError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Object header address.
    Hard(u64),
    /// Path to another object in the same file.
    Soft(String),
    /// Object in another file; never followed.
    External,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMessage {
    pub name: String,
    pub target: LinkTarget,
}

const FLAG_CREATION_ORDER: u8 = 0x04;
const FLAG_LINK_TYPE: u8 = 0x08;
const FLAG_CHARSET: u8 = 0x10;

fn utf8(bytes: &[u8]) -> Result<String, FormatError> {
    core::str::from_utf8(bytes)
        .map(String::from)
        .map_err(|_| FormatError::InvalidName)
}

impl LinkMessage {
    pub fn parse(data: &[u8], offset_size: u8) -> Result<LinkMessage, FormatError> {
        let mut c = Cursor::new(data);
        let version = c.u8()?;
        if version != 1 {
            return Err(FormatError::InvalidLinkVersion(version));
        }
        let flags = c.u8()?;
        let link_type = if flags & FLAG_LINK_TYPE != 0 { c.u8()? } else { 0 };
        if flags & FLAG_CREATION_ORDER != 0 {
            c.skip(8)?;
        }
        if flags & FLAG_CHARSET != 0 {
            c.skip(1)?;
        }
        let name_len = c.uint(1 << (flags & 0x03))? as usize;
        let name = utf8(c.bytes(name_len)?)?;

        let target = match link_type {
            0 => LinkTarget::Hard(c.uint(offset_size)?),
            1 => {
                let len = c.u16()? as usize;
                LinkTarget::Soft(utf8(c.bytes(len)?)?)
            }
            64 => LinkTarget::External,
            other => return Err(FormatError::InvalidLinkType(other)),
        };
        Ok(LinkMessage { name, target })
    }

    /// Encode with 8-byte addresses. External links cannot be encoded.
    #[cfg(any(test, feature = "writer"))]
    pub fn serialize(&self) -> Vec<u8> {
        let name = self.name.as_bytes();
        let mut buf = Vec::with_capacity(16 + name.len());
        buf.push(1);
        let mut flags = FLAG_CHARSET;
        let wide_name = name.len() > 0xFF;
        if wide_name {
            flags |= 0x01;
        }
        let soft = matches!(self.target, LinkTarget::Soft(_));
        if soft {
            flags |= FLAG_LINK_TYPE;
        }
        buf.push(flags);
        if soft {
            buf.push(1);
        }
        buf.push(1);
        if wide_name {
            buf.extend_from_slice(&(name.len() as u16).to_le_bytes());
        } else {
            buf.push(name.len() as u8);
        }
        buf.extend_from_slice(name);
        match &self.target {
            LinkTarget::Hard(addr) => buf.extend_from_slice(&addr.to_le_bytes()),
            LinkTarget::Soft(path) => {
                buf.extend_from_slice(&(path.len() as u16).to_le_bytes());
                buf.extend_from_slice(path.as_bytes());
            }
            LinkTarget::External => {}
        }
        buf
    }
}
