//! Object header parsing (v1 and v2), following continuation blocks.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::cursor::{ensure_len, Cursor};
use crate::error::FormatError;
use crate::message_type::MessageType;

const OHDR_SIGNATURE: [u8; 4] = *b"OHDR";
const OCHK_SIGNATURE: [u8; 4] = *b"OCHK";

/// Files written by the reference library never chain this many blocks.
pub const MAX_CONTINUATIONS: usize = 1024;

/// Message flag bit: the message lives in the shared message table.
pub const MSG_FLAG_SHARED: u8 = 0x02;
/// Message flag bit: fail to open the object if the type is unknown.
const MSG_FLAG_MUST_UNDERSTAND: u8 = 0x80;

/// One header message with its payload copied out of the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMessage {
    pub msg_type: MessageType,
    pub flags: u8,
    pub data: Vec<u8>,
}

/// Parsed object header. Messages from every continuation block are
/// collected in file order; NIL messages are dropped.
#[derive(Debug, Clone)]
pub struct ObjectHeader {
    /// Header version (1 or 2).
    pub version: u8,
    /// Header flags (v2 only; 0 for v1).
    pub flags: u8,
    pub messages: Vec<HeaderMessage>,
}

/// A pending continuation block: address and length.
type Pending = (usize, usize);

impl ObjectHeader {
    /// Parse the object header at `offset`.
    pub fn parse(
        data: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<ObjectHeader, FormatError> {
        ensure_len(data, offset, 4)?;
        if data[offset..offset + 4] == OHDR_SIGNATURE {
            Self::parse_v2(data, offset, offset_size, length_size)
        } else {
            Self::parse_v1(data, offset, offset_size, length_size)
        }
    }

    /// All messages of the given type.
    pub fn messages_of(&self, msg_type: MessageType) -> impl Iterator<Item = &HeaderMessage> {
        self.messages.iter().filter(move |m| m.msg_type == msg_type)
    }

    /// First message of the given type.
    pub fn find(&self, msg_type: MessageType) -> Option<&HeaderMessage> {
        self.messages_of(msg_type).next()
    }

    fn parse_v1(
        data: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<ObjectHeader, FormatError> {
        let mut c = Cursor::at(data, offset);
        let version = c.u8()?;
        if version != 1 {
            return Err(FormatError::InvalidObjectHeaderVersion(version));
        }
        c.skip(1)?;
        let _num_messages = c.u16()?;
        let _ref_count = c.u32()?;
        let header_size = c.u32()? as usize;
        // prefix is padded to 16 bytes
        c.skip(4)?;
        let start = c.position();
        ensure_len(data, start, header_size)?;

        let mut messages = Vec::new();
        let mut pending = Vec::new();
        Self::collect_v1(
            data,
            start,
            start + header_size,
            offset_size,
            length_size,
            &mut messages,
            &mut pending,
        )?;

        let mut followed = 0;
        while let Some((addr, len)) = pending.pop() {
            followed += 1;
            if followed > MAX_CONTINUATIONS {
                return Err(FormatError::ContinuationLimit(MAX_CONTINUATIONS));
            }
            ensure_len(data, addr, len)?;
            Self::collect_v1(
                data,
                addr,
                addr + len,
                offset_size,
                length_size,
                &mut messages,
                &mut pending,
            )?;
        }

        Ok(ObjectHeader {
            version: 1,
            flags: 0,
            messages,
        })
    }

    fn collect_v1(
        data: &[u8],
        start: usize,
        end: usize,
        offset_size: u8,
        length_size: u8,
        messages: &mut Vec<HeaderMessage>,
        pending: &mut Vec<Pending>,
    ) -> Result<(), FormatError> {
        let block = &data[..end];
        let mut c = Cursor::at(block, start);
        while c.remaining() >= 8 {
            let raw_type = c.u16()?;
            let size = c.u16()? as usize;
            let flags = c.u8()?;
            c.skip(3)?;
            let payload = c.bytes(size)?;
            Self::accept(raw_type, flags, payload, offset_size, length_size, messages, pending)?;
        }
        Ok(())
    }

    fn parse_v2(
        data: &[u8],
        offset: usize,
        offset_size: u8,
        length_size: u8,
    ) -> Result<ObjectHeader, FormatError> {
        let mut c = Cursor::at(data, offset + 4);
        let version = c.u8()?;
        if version != 2 {
            return Err(FormatError::InvalidObjectHeaderVersion(version));
        }
        let flags = c.u8()?;
        if flags & 0x20 != 0 {
            // access, modification, change and birth times
            c.skip(16)?;
        }
        if flags & 0x10 != 0 {
            // max compact / min dense attribute counts
            c.skip(4)?;
        }
        let chunk0_size = c.uint(1 << (flags & 0x03))? as usize;
        let msg_start = c.position();
        let msg_end = msg_start
            .checked_add(chunk0_size)
            .ok_or(FormatError::UnexpectedEof {
                expected: usize::MAX,
                available: data.len(),
            })?;
        ensure_len(data, msg_end, 4)?;
        #[cfg(feature = "checksum")]
        crate::checksum::verify_trailing(&data[offset..msg_end + 4])?;

        let tracks_order = flags & 0x04 != 0;
        let mut messages = Vec::new();
        let mut pending = Vec::new();
        Self::collect_v2(
            data,
            msg_start,
            msg_end,
            tracks_order,
            offset_size,
            length_size,
            &mut messages,
            &mut pending,
        )?;

        let mut followed = 0;
        while let Some((addr, len)) = pending.pop() {
            followed += 1;
            if followed > MAX_CONTINUATIONS {
                return Err(FormatError::ContinuationLimit(MAX_CONTINUATIONS));
            }
            // signature(4) ... checksum(4)
            if len < 8 {
                return Err(FormatError::UnexpectedEof {
                    expected: 8,
                    available: len,
                });
            }
            ensure_len(data, addr, len)?;
            if data[addr..addr + 4] != OCHK_SIGNATURE {
                return Err(FormatError::InvalidObjectHeaderSignature);
            }
            #[cfg(feature = "checksum")]
            crate::checksum::verify_trailing(&data[addr..addr + len])?;
            Self::collect_v2(
                data,
                addr + 4,
                addr + len - 4,
                tracks_order,
                offset_size,
                length_size,
                &mut messages,
                &mut pending,
            )?;
        }

        Ok(ObjectHeader {
            version: 2,
            flags,
            messages,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn collect_v2(
        data: &[u8],
        start: usize,
        end: usize,
        tracks_order: bool,
        offset_size: u8,
        length_size: u8,
        messages: &mut Vec<HeaderMessage>,
        pending: &mut Vec<Pending>,
    ) -> Result<(), FormatError> {
        let prefix = if tracks_order { 6 } else { 4 };
        let block = &data[..end];
        let mut c = Cursor::at(block, start);
        // a tail shorter than a message prefix is a gap
        while c.remaining() >= prefix {
            let raw_type = u16::from(c.u8()?);
            let size = c.u16()? as usize;
            let flags = c.u8()?;
            if tracks_order {
                c.skip(2)?;
            }
            let payload = c.bytes(size)?;
            Self::accept(raw_type, flags, payload, offset_size, length_size, messages, pending)?;
        }
        Ok(())
    }

    fn accept(
        raw_type: u16,
        flags: u8,
        payload: &[u8],
        offset_size: u8,
        length_size: u8,
        messages: &mut Vec<HeaderMessage>,
        pending: &mut Vec<Pending>,
    ) -> Result<(), FormatError> {
        let msg_type = MessageType::from_u16(raw_type);
        match msg_type {
            MessageType::Nil => return Ok(()),
            MessageType::Other(id) if flags & MSG_FLAG_MUST_UNDERSTAND != 0 => {
                return Err(FormatError::UnsupportedMessage(id));
            }
            MessageType::Continuation => {
                let mut c = Cursor::new(payload);
                let addr = c.uint(offset_size)? as usize;
                let len = c.uint(length_size)? as usize;
                // popped from the back, so the oldest block is visited first
                pending.insert(0, (addr, len));
            }
            _ => {}
        }
        messages.push(HeaderMessage {
            msg_type,
            flags,
            data: payload.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_header_writer::ObjectHeaderWriter;

    fn v1_header(messages: &[(u16, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (t, payload) in messages {
            let padded = (payload.len() + 7) & !7;
            body.extend_from_slice(&t.to_le_bytes());
            body.extend_from_slice(&(padded as u16).to_le_bytes());
            body.extend_from_slice(&[0, 0, 0, 0]);
            body.extend_from_slice(payload);
            body.resize(body.len() + padded - payload.len(), 0);
        }
        let mut buf = vec![1, 0];
        buf.extend_from_slice(&(messages.len() as u16).to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
        buf.extend_from_slice(&[0; 4]);
        buf.extend_from_slice(&body);
        buf
    }

    #[test]
    fn v1_messages_skip_nil() {
        let data = v1_header(&[(0x0011, &[1, 2, 3]), (0x0000, &[]), (0x000C, &[9])]);
        let hdr = ObjectHeader::parse(&data, 0, 8, 8).unwrap();
        assert_eq!(hdr.version, 1);
        assert_eq!(hdr.messages.len(), 2);
        assert_eq!(hdr.messages[0].msg_type, MessageType::SymbolTable);
        assert_eq!(&hdr.messages[0].data[..3], &[1, 2, 3]);
        assert_eq!(hdr.messages[1].msg_type, MessageType::Attribute);
    }

    #[test]
    fn v1_follows_continuation() {
        let mut cont = Vec::new();
        let block_addr = 200u64;
        cont.extend_from_slice(&block_addr.to_le_bytes());
        // continuation block: one attribute message of 8 bytes
        let block_len = 16u64;
        cont.extend_from_slice(&block_len.to_le_bytes());
        let mut data = v1_header(&[(0x0010, &cont)]);
        data.resize(200, 0);
        data.extend_from_slice(&0x000Cu16.to_le_bytes());
        data.extend_from_slice(&8u16.to_le_bytes());
        data.extend_from_slice(&[0; 4]);
        data.extend_from_slice(&[7; 8]);

        let hdr = ObjectHeader::parse(&data, 0, 8, 8).unwrap();
        let attrs: Vec<_> = hdr.messages_of(MessageType::Attribute).collect();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].data, vec![7; 8]);
    }

    #[test]
    fn v2_roundtrip_through_writer() {
        let mut w = ObjectHeaderWriter::new();
        w.add_message(MessageType::Dataspace, vec![1, 2, 3, 4]);
        w.add_message(MessageType::Attribute, vec![5, 6]);
        let bytes = w.serialize();
        let hdr = ObjectHeader::parse(&bytes, 0, 8, 8).unwrap();
        assert_eq!(hdr.version, 2);
        assert_eq!(hdr.messages.len(), 2);
        assert_eq!(hdr.find(MessageType::Attribute).unwrap().data, vec![5, 6]);
    }

    #[test]
    fn v2_follows_ochk_chunk() {
        let mut w = ObjectHeaderWriter::new();
        w.add_message(MessageType::LinkInfo, vec![0; 18]);
        w.add_message(MessageType::Attribute, vec![0xAB; 40]);
        let (head, chunk) = w.serialize_split(1, 512);
        let mut data = head;
        data.resize(512, 0);
        data.extend_from_slice(&chunk);

        let hdr = ObjectHeader::parse(&data, 0, 8, 8).unwrap();
        assert!(hdr.find(MessageType::LinkInfo).is_some());
        assert_eq!(hdr.find(MessageType::Attribute).unwrap().data, vec![0xAB; 40]);
    }

    #[cfg(feature = "checksum")]
    #[test]
    fn v2_checksum_mismatch() {
        let mut w = ObjectHeaderWriter::new();
        w.add_message(MessageType::Attribute, vec![1, 2, 3]);
        let mut bytes = w.serialize();
        bytes[9] ^= 0xFF;
        assert!(matches!(
            ObjectHeader::parse(&bytes, 0, 8, 8),
            Err(FormatError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn unknown_must_understand_message_fails() {
        let mut w = ObjectHeaderWriter::new();
        w.add_message_with_flags(MessageType::Other(0x42), vec![0; 4], 0x80);
        let bytes = w.serialize();
        assert_eq!(
            ObjectHeader::parse(&bytes, 0, 8, 8).unwrap_err(),
            FormatError::UnsupportedMessage(0x42)
        );
    }

    #[test]
    fn self_referencing_continuation_is_bounded() {
        let mut cont = Vec::new();
        cont.extend_from_slice(&16u64.to_le_bytes());
        cont.extend_from_slice(&24u64.to_le_bytes());
        // v1 header whose continuation points at its own message list
        let data = v1_header(&[(0x0010, &cont)]);
        assert!(matches!(
            ObjectHeader::parse(&data, 0, 8, 8),
            Err(FormatError::ContinuationLimit(_)) | Err(FormatError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn bad_version() {
        let data = [9u8; 32];
        assert_eq!(
            ObjectHeader::parse(&data, 0, 8, 8).unwrap_err(),
            FormatError::InvalidObjectHeaderVersion(9)
        );
    }
}
