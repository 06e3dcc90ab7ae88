//! Object header message type identifiers.

/// Header message types this crate interprets. Everything else is carried
/// through as [`MessageType::Other`] and skipped by the readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Nil,
    Dataspace,
    LinkInfo,
    Datatype,
    Link,
    DataLayout,
    GroupInfo,
    Attribute,
    Continuation,
    SymbolTable,
    AttributeInfo,
    Other(u16),
}

impl MessageType {
    pub fn from_u16(raw: u16) -> MessageType {
        match raw {
            0x0000 => MessageType::Nil,
            0x0001 => MessageType::Dataspace,
            0x0002 => MessageType::LinkInfo,
            0x0003 => MessageType::Datatype,
            0x0006 => MessageType::Link,
            0x0008 => MessageType::DataLayout,
            0x000A => MessageType::GroupInfo,
            0x000C => MessageType::Attribute,
            0x0010 => MessageType::Continuation,
            0x0011 => MessageType::SymbolTable,
            0x0015 => MessageType::AttributeInfo,
            other => MessageType::Other(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            MessageType::Nil => 0x0000,
            MessageType::Dataspace => 0x0001,
            MessageType::LinkInfo => 0x0002,
            MessageType::Datatype => 0x0003,
            MessageType::Link => 0x0006,
            MessageType::DataLayout => 0x0008,
            MessageType::GroupInfo => 0x000A,
            MessageType::Attribute => 0x000C,
            MessageType::Continuation => 0x0010,
            MessageType::SymbolTable => 0x0011,
            MessageType::AttributeInfo => 0x0015,
            MessageType::Other(raw) => raw,
        }
    }
}
