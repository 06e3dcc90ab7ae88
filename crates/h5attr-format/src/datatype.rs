//! Datatype message parsing.
//!
//! Only the classes that can hold a scalar attribute we read are decoded in
//! full: fixed-point, IEEE floating-point, fixed-length strings and
//! variable-length strings. Every other class is kept as
//! [`Datatype::Other`] so the caller can report a type mismatch.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::cursor::Cursor;
use crate::error::FormatError;

/// Byte order of a numeric datatype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// How a fixed-length string fills its unused bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringPadding {
    NullTerminate,
    NullPad,
    SpacePad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterSet {
    Ascii,
    Utf8,
}

/// Parsed datatype.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datatype {
    /// Class 0.
    Integer {
        size: u32,
        byte_order: Endian,
        signed: bool,
    },
    /// Class 1, IEEE layouts only.
    Float { size: u32, byte_order: Endian },
    /// Class 3.
    FixedString {
        size: u32,
        padding: StringPadding,
        charset: CharacterSet,
    },
    /// Class 9 with the string flag set; elements live in the global heap.
    VarString {
        padding: StringPadding,
        charset: CharacterSet,
    },
    /// Any other class (compound, enum, array, reference, VL sequence...).
    Other { class: u8, size: u32 },
}

fn parse_padding(val: u8) -> Result<StringPadding, FormatError> {
    match val {
        0 => Ok(StringPadding::NullTerminate),
        1 => Ok(StringPadding::NullPad),
        2 => Ok(StringPadding::SpacePad),
        _ => Err(FormatError::InvalidStringPadding(val)),
    }
}

fn parse_charset(val: u8) -> Result<CharacterSet, FormatError> {
    match val {
        0 => Ok(CharacterSet::Ascii),
        1 => Ok(CharacterSet::Utf8),
        _ => Err(FormatError::InvalidCharacterSet(val)),
    }
}

impl Datatype {
    /// Parse a datatype message.
    pub fn parse(data: &[u8]) -> Result<Datatype, FormatError> {
        let mut c = Cursor::new(data);
        let class_and_version = c.u8()?;
        let class = class_and_version & 0x0F;
        let bits = c.bytes(3)?;
        let (bf0, bf1) = (bits[0], bits[1]);
        let size = c.u32()?;

        match class {
            0 => Ok(Datatype::Integer {
                size,
                byte_order: if bf0 & 0x01 == 0 {
                    Endian::Little
                } else {
                    Endian::Big
                },
                signed: bf0 & 0x08 != 0,
            }),
            1 => {
                // bit 6 together with bit 0 selects VAX ordering
                if bf0 & 0x40 != 0 || !matches!(size, 4 | 8) {
                    return Ok(Datatype::Other { class, size });
                }
                Ok(Datatype::Float {
                    size,
                    byte_order: if bf0 & 0x01 == 0 {
                        Endian::Little
                    } else {
                        Endian::Big
                    },
                })
            }
            3 => Ok(Datatype::FixedString {
                size,
                padding: parse_padding(bf0 & 0x0F)?,
                charset: parse_charset(bf0 >> 4)?,
            }),
            9 if bf0 & 0x0F == 1 => Ok(Datatype::VarString {
                padding: parse_padding(bf0 >> 4)?,
                charset: parse_charset(bf1 & 0x0F)?,
            }),
            2 | 4..=10 => Ok(Datatype::Other { class, size }),
            other => Err(FormatError::InvalidDatatypeClass(other)),
        }
    }

    /// Human-readable class name, used in type-mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Datatype::Integer { .. } => "integer",
            Datatype::Float { .. } => "float",
            Datatype::FixedString { .. } => "string",
            Datatype::VarString { .. } => "variable-length string",
            Datatype::Other { class, .. } => match class {
                2 => "time",
                4 => "bitfield",
                5 => "opaque",
                6 => "compound",
                7 => "reference",
                8 => "enum",
                9 => "variable-length sequence",
                10 => "array",
                _ => "unknown",
            },
        }
    }

    /// Encode as a datatype message. VL strings use 8-byte heap addresses.
    #[cfg(any(test, feature = "writer"))]
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match *self {
            Datatype::Integer {
                size,
                byte_order,
                signed,
            } => {
                let mut bf0 = if byte_order == Endian::Big { 0x01 } else { 0 };
                if signed {
                    bf0 |= 0x08;
                }
                buf.extend_from_slice(&[0x10, bf0, 0, 0]);
                buf.extend_from_slice(&size.to_le_bytes());
                buf.extend_from_slice(&0u16.to_le_bytes());
                buf.extend_from_slice(&((size * 8) as u16).to_le_bytes());
            }
            Datatype::Float { size, byte_order } => {
                let bf0 = 0x20 | if byte_order == Endian::Big { 0x01 } else { 0 };
                let (sign, exp_loc, exp_size, mant_size, bias) = if size == 4 {
                    (31u8, 23u8, 8u8, 23u8, 127u32)
                } else {
                    (63, 52, 11, 52, 1023)
                };
                buf.extend_from_slice(&[0x11, bf0, sign, 0]);
                buf.extend_from_slice(&size.to_le_bytes());
                buf.extend_from_slice(&0u16.to_le_bytes());
                buf.extend_from_slice(&((size * 8) as u16).to_le_bytes());
                buf.extend_from_slice(&[exp_loc, exp_size, 0, mant_size]);
                buf.extend_from_slice(&bias.to_le_bytes());
            }
            Datatype::FixedString {
                size,
                padding,
                charset,
            } => {
                let bf0 = padding_bits(padding) | (charset_bits(charset) << 4);
                buf.extend_from_slice(&[0x13, bf0, 0, 0]);
                buf.extend_from_slice(&size.to_le_bytes());
            }
            Datatype::VarString { padding, charset } => {
                let bf0 = 0x01 | (padding_bits(padding) << 4);
                buf.extend_from_slice(&[0x19, bf0, charset_bits(charset), 0]);
                buf.extend_from_slice(&16u32.to_le_bytes());
                buf.extend_from_slice(
                    &Datatype::Integer {
                        size: 1,
                        byte_order: Endian::Little,
                        signed: false,
                    }
                    .serialize(),
                );
            }
            Datatype::Other { class, size } => {
                buf.extend_from_slice(&[0x10 | class, 0, 0, 0]);
                buf.extend_from_slice(&size.to_le_bytes());
            }
        }
        buf
    }
}

#[cfg(any(test, feature = "writer"))]
fn padding_bits(p: StringPadding) -> u8 {
    match p {
        StringPadding::NullTerminate => 0,
        StringPadding::NullPad => 1,
        StringPadding::SpacePad => 2,
    }
}

#[cfg(any(test, feature = "writer"))]
fn charset_bits(c: CharacterSet) -> u8 {
    match c {
        CharacterSet::Ascii => 0,
        CharacterSet::Utf8 => 1,
    }
}
