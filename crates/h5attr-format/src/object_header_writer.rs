//! Object header encoder used to build fixture files.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::checksum::jenkins_lookup3;
use crate::cursor::pad8;
use crate::message_type::MessageType;

/// Collects messages and encodes them as a v1 or v2 object header.
#[derive(Debug, Default)]
pub struct ObjectHeaderWriter {
    messages: Vec<(MessageType, Vec<u8>, u8)>,
}

fn push_v2_message(buf: &mut Vec<u8>, msg_type: MessageType, data: &[u8], flags: u8) {
    buf.push(msg_type.to_u16() as u8);
    buf.extend_from_slice(&(data.len() as u16).to_le_bytes());
    buf.push(flags);
    buf.extend_from_slice(data);
}

fn v2_message_len(data: &[u8]) -> usize {
    4 + data.len()
}

impl ObjectHeaderWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, msg_type: MessageType, data: Vec<u8>) {
        self.messages.push((msg_type, data, 0));
    }

    pub fn add_message_with_flags(&mut self, msg_type: MessageType, data: Vec<u8>, flags: u8) {
        self.messages.push((msg_type, data, flags));
    }

    /// Encode a single-chunk v2 header ("OHDR" ... checksum).
    pub fn serialize(&self) -> Vec<u8> {
        self.encode_chunk0(&self.messages, None)
    }

    /// Encode a v2 header whose messages from `split` onwards live in a
    /// continuation chunk at `chunk_address`. Returns `(header, chunk)`.
    pub fn serialize_split(&self, split: usize, chunk_address: u64) -> (Vec<u8>, Vec<u8>) {
        let (head, tail) = self.messages.split_at(split.min(self.messages.len()));

        let mut chunk = Vec::new();
        chunk.extend_from_slice(b"OCHK");
        for (t, data, flags) in tail {
            push_v2_message(&mut chunk, *t, data, *flags);
        }
        let sum = jenkins_lookup3(&chunk);
        chunk.extend_from_slice(&sum.to_le_bytes());

        let header = self.encode_chunk0(head, Some((chunk_address, chunk.len() as u64)));
        (header, chunk)
    }

    fn encode_chunk0(
        &self,
        messages: &[(MessageType, Vec<u8>, u8)],
        continuation: Option<(u64, u64)>,
    ) -> Vec<u8> {
        let mut cont = Vec::new();
        if let Some((addr, len)) = continuation {
            cont.extend_from_slice(&addr.to_le_bytes());
            cont.extend_from_slice(&len.to_le_bytes());
        }
        let mut total: usize = messages.iter().map(|(_, d, _)| v2_message_len(d)).sum();
        if continuation.is_some() {
            total += v2_message_len(&cont);
        }

        let (flags, width) = match total {
            0..=0xFF => (0x00u8, 1usize),
            0x100..=0xFFFF => (0x01, 2),
            _ => (0x02, 4),
        };

        let mut buf = Vec::with_capacity(6 + width + total + 4);
        buf.extend_from_slice(b"OHDR");
        buf.push(2);
        buf.push(flags);
        buf.extend_from_slice(&(total as u32).to_le_bytes()[..width]);
        for (t, data, msg_flags) in messages {
            push_v2_message(&mut buf, *t, data, *msg_flags);
        }
        if continuation.is_some() {
            push_v2_message(&mut buf, MessageType::Continuation, &cont, 0);
        }
        let sum = jenkins_lookup3(&buf);
        buf.extend_from_slice(&sum.to_le_bytes());
        buf
    }

    /// Encode a v1 header. Message payloads are padded to 8 bytes.
    pub fn serialize_v1(&self) -> Vec<u8> {
        let body: usize = self
            .messages
            .iter()
            .map(|(_, d, _)| 8 + pad8(d.len()))
            .sum();
        let mut buf = Vec::with_capacity(16 + body);
        buf.push(1);
        buf.push(0);
        buf.extend_from_slice(&(self.messages.len() as u16).to_le_bytes());
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&(body as u32).to_le_bytes());
        buf.extend_from_slice(&[0; 4]);
        for (t, data, flags) in &self.messages {
            let padded = pad8(data.len());
            buf.extend_from_slice(&t.to_u16().to_le_bytes());
            buf.extend_from_slice(&(padded as u16).to_le_bytes());
            buf.push(*flags);
            buf.extend_from_slice(&[0; 3]);
            buf.extend_from_slice(data);
            buf.resize(buf.len() + padded - data.len(), 0);
        }
        buf
    }
}
