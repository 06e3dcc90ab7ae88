//! Dataspace message parsing (versions 1 and 2).

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::cursor::Cursor;
use crate::error::FormatError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataspaceKind {
    /// Exactly one element.
    Scalar,
    /// An N-dimensional array.
    Simple,
    /// No elements at all.
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataspace {
    pub kind: DataspaceKind,
    pub dims: Vec<u64>,
}

impl Dataspace {
    pub fn scalar() -> Self {
        Self {
            kind: DataspaceKind::Scalar,
            dims: Vec::new(),
        }
    }

    /// Parse a dataspace message. Dimension sizes are `length_size` bytes wide.
    pub fn parse(data: &[u8], length_size: u8) -> Result<Dataspace, FormatError> {
        let mut c = Cursor::new(data);
        let version = c.u8()?;
        let rank = c.u8()? as usize;
        let flags = c.u8()?;
        let kind = match version {
            1 => {
                c.skip(5)?;
                if rank == 0 {
                    DataspaceKind::Scalar
                } else {
                    DataspaceKind::Simple
                }
            }
            2 => match c.u8()? {
                0 => DataspaceKind::Scalar,
                1 => DataspaceKind::Simple,
                2 => DataspaceKind::Null,
                t => return Err(FormatError::InvalidDataspaceType(t)),
            },
            v => return Err(FormatError::InvalidDataspaceVersion(v)),
        };

        let mut dims = Vec::with_capacity(rank);
        for _ in 0..rank {
            dims.push(c.uint(length_size)?);
        }
        // maximum dimensions (flags bit 0) are irrelevant for attributes
        let _ = flags;

        Ok(Dataspace { kind, dims })
    }

    /// Number of elements described.
    pub fn num_elements(&self) -> u64 {
        match self.kind {
            DataspaceKind::Scalar => 1,
            DataspaceKind::Null => 0,
            DataspaceKind::Simple => self.dims.iter().product(),
        }
    }

    /// Encode as a version 2 message with 8-byte lengths.
    #[cfg(any(test, feature = "writer"))]
    pub fn serialize(&self) -> Vec<u8> {
        let kind = match self.kind {
            DataspaceKind::Scalar => 0,
            DataspaceKind::Simple => 1,
            DataspaceKind::Null => 2,
        };
        let mut buf = Vec::with_capacity(4 + 8 * self.dims.len());
        buf.extend_from_slice(&[2, self.dims.len() as u8, 0, kind]);
        for d in &self.dims {
            buf.extend_from_slice(&d.to_le_bytes());
        }
        buf
    }
}
