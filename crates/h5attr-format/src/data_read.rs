//! Decoding the first element of an attribute's raw data as a scalar.
//!
//! Callers decide what to do about element counts; these functions only
//! require that at least one element is present.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::attribute::AttributeMessage;
use crate::datatype::{Datatype, Endian, StringPadding};
use crate::error::FormatError;
use crate::global_heap::{self, GlobalHeapId};

fn first_element(raw: &[u8], size: usize) -> Result<&[u8], FormatError> {
    raw.get(..size).ok_or(FormatError::DataSizeMismatch {
        expected: size,
        actual: raw.len(),
    })
}

fn mismatch(expected: &'static str, dt: &Datatype) -> FormatError {
    FormatError::TypeMismatch {
        expected,
        actual: dt.kind_name(),
    }
}

/// Read the first element as an integer.
///
/// Unsigned 64-bit values above `i64::MAX` saturate; callers range-check
/// against narrower types anyway.
pub fn read_scalar_i64(attr: &AttributeMessage) -> Result<i64, FormatError> {
    let Datatype::Integer {
        size,
        byte_order,
        signed,
    } = attr.datatype
    else {
        return Err(mismatch("integer", &attr.datatype));
    };
    let size = size as usize;
    if !matches!(size, 1 | 2 | 4 | 8) {
        return Err(mismatch("integer", &attr.datatype));
    }
    let bytes = first_element(&attr.raw_data, size)?;
    let value = match (byte_order, signed) {
        (Endian::Little, true) => LittleEndian::read_int(bytes, size),
        (Endian::Big, true) => BigEndian::read_int(bytes, size),
        (Endian::Little, false) => clamp_u64(LittleEndian::read_uint(bytes, size)),
        (Endian::Big, false) => clamp_u64(BigEndian::read_uint(bytes, size)),
    };
    Ok(value)
}

fn clamp_u64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

/// Read the first element as a float of either width.
pub fn read_scalar_f64(attr: &AttributeMessage) -> Result<f64, FormatError> {
    let Datatype::Float { size, byte_order } = attr.datatype else {
        return Err(mismatch("float", &attr.datatype));
    };
    let bytes = first_element(&attr.raw_data, size as usize)?;
    Ok(match (size, byte_order) {
        (4, Endian::Little) => f64::from(LittleEndian::read_f32(bytes)),
        (4, Endian::Big) => f64::from(BigEndian::read_f32(bytes)),
        (_, Endian::Little) => LittleEndian::read_f64(bytes),
        (_, Endian::Big) => BigEndian::read_f64(bytes),
    })
}

/// Apply a string padding rule to one stored element.
pub fn trim_padding(bytes: &[u8], padding: StringPadding) -> &[u8] {
    match padding {
        StringPadding::NullTerminate => {
            let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
            &bytes[..end]
        }
        StringPadding::NullPad => {
            let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
            &bytes[..end]
        }
        StringPadding::SpacePad => {
            let end = bytes.iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
            &bytes[..end]
        }
    }
}

/// Read the first element of a fixed or variable-length string attribute.
///
/// Returns the content bytes with padding removed. Variable-length elements
/// are resolved through the global heap in `file`.
pub fn read_string_bytes(
    file: &[u8],
    attr: &AttributeMessage,
    offset_size: u8,
    length_size: u8,
) -> Result<Vec<u8>, FormatError> {
    match attr.datatype {
        Datatype::FixedString { size, padding, .. } => {
            let bytes = first_element(&attr.raw_data, size as usize)?;
            Ok(trim_padding(bytes, padding).to_vec())
        }
        Datatype::VarString { padding, .. } => {
            let width = GlobalHeapId::encoded_len(offset_size);
            let id = GlobalHeapId::parse(first_element(&attr.raw_data, width)?, offset_size)?;
            if id.length == 0 || id.collection_address == 0 {
                return Ok(Vec::new());
            }
            let obj = global_heap::find_object(file, id.collection_address, id.index, length_size)?;
            let stored = &obj[..obj.len().min(id.length as usize)];
            Ok(trim_padding(stored, padding).to_vec())
        }
        ref other => Err(mismatch("string", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::CharacterSet;
    use crate::dataspace::Dataspace;

    fn attr(datatype: Datatype, raw: &[u8]) -> AttributeMessage {
        AttributeMessage {
            name: "x".into(),
            datatype,
            dataspace: Dataspace::scalar(),
            raw_data: raw.to_vec(),
        }
    }

    fn int(size: u32, byte_order: Endian, signed: bool) -> Datatype {
        Datatype::Integer {
            size,
            byte_order,
            signed,
        }
    }

    #[test]
    fn integers_of_all_widths() {
        let a = attr(int(1, Endian::Little, true), &[0xFF]);
        assert_eq!(read_scalar_i64(&a).unwrap(), -1);
        let a = attr(int(2, Endian::Big, false), &[0x01, 0x00]);
        assert_eq!(read_scalar_i64(&a).unwrap(), 256);
        let a = attr(int(4, Endian::Little, true), &(-7i32).to_le_bytes());
        assert_eq!(read_scalar_i64(&a).unwrap(), -7);
        let a = attr(int(8, Endian::Little, true), &(1i64 << 40).to_le_bytes());
        assert_eq!(read_scalar_i64(&a).unwrap(), 1 << 40);
    }

    #[test]
    fn huge_unsigned_saturates() {
        let a = attr(int(8, Endian::Little, false), &u64::MAX.to_le_bytes());
        assert_eq!(read_scalar_i64(&a).unwrap(), i64::MAX);
    }

    #[test]
    fn floats_both_widths_and_orders() {
        let a = attr(
            Datatype::Float {
                size: 4,
                byte_order: Endian::Little,
            },
            &0.5f32.to_le_bytes(),
        );
        assert_eq!(read_scalar_f64(&a).unwrap(), 0.5);
        let a = attr(
            Datatype::Float {
                size: 8,
                byte_order: Endian::Big,
            },
            &2.5e-10f64.to_be_bytes(),
        );
        assert_eq!(read_scalar_f64(&a).unwrap(), 2.5e-10);
    }

    #[test]
    fn kind_mismatch_names_both_sides() {
        let a = attr(int(4, Endian::Little, true), &[0; 4]);
        assert_eq!(
            read_scalar_f64(&a),
            Err(FormatError::TypeMismatch {
                expected: "float",
                actual: "integer"
            })
        );
        assert!(matches!(
            read_string_bytes(&[], &a, 8, 8),
            Err(FormatError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn short_raw_data() {
        let a = attr(int(4, Endian::Little, true), &[1, 2]);
        assert_eq!(
            read_scalar_i64(&a),
            Err(FormatError::DataSizeMismatch {
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn padding_rules() {
        assert_eq!(trim_padding(b"abc\0zz", StringPadding::NullTerminate), b"abc");
        assert_eq!(trim_padding(b"a\0c\0\0", StringPadding::NullPad), b"a\0c");
        assert_eq!(trim_padding(b"pos   ", StringPadding::SpacePad), b"pos");
        assert_eq!(trim_padding(b"\0\0", StringPadding::NullPad), b"");
    }

    #[test]
    fn fixed_string() {
        let a = attr(
            Datatype::FixedString {
                size: 10,
                padding: StringPadding::NullPad,
                charset: CharacterSet::Ascii,
            },
            b"positive\0\0",
        );
        assert_eq!(read_string_bytes(&[], &a, 8, 8).unwrap(), b"positive");
    }

    #[test]
    fn vl_string_through_global_heap() {
        let mut file = vec![0u8; 64];
        file.extend_from_slice(&global_heap::serialize_collection(&[b"negative"]));
        let mut raw = 8u32.to_le_bytes().to_vec();
        raw.extend_from_slice(&64u64.to_le_bytes());
        raw.extend_from_slice(&1u32.to_le_bytes());
        let a = attr(
            Datatype::VarString {
                padding: StringPadding::NullTerminate,
                charset: CharacterSet::Utf8,
            },
            &raw,
        );
        assert_eq!(read_string_bytes(&file, &a, 8, 8).unwrap(), b"negative");
    }

    #[test]
    fn vl_string_empty_reference() {
        let a = attr(
            Datatype::VarString {
                padding: StringPadding::NullTerminate,
                charset: CharacterSet::Ascii,
            },
            &[0u8; 16],
        );
        assert!(read_string_bytes(&[], &a, 8, 8).unwrap().is_empty());
    }
}
