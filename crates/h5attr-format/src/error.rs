//! Error types for HDF5 format parsing.

#[cfg(not(feature = "std"))]
use alloc::string::String;

use core::fmt;

/// Errors that can occur when parsing HDF5 binary format structures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The HDF5 magic signature was not found at any valid offset.
    SignatureNotFound,
    /// The superblock version is not supported.
    UnsupportedVersion(u8),
    /// Unexpected end of data.
    UnexpectedEof {
        /// Number of bytes expected.
        expected: usize,
        /// Number of bytes actually available.
        available: usize,
    },
    /// Invalid offset size (must be 2, 4, or 8).
    InvalidOffsetSize(u8),
    /// Invalid length size (must be 2, 4, or 8).
    InvalidLengthSize(u8),
    /// Invalid object header signature.
    InvalidObjectHeaderSignature,
    /// Invalid object header version.
    InvalidObjectHeaderVersion(u8),
    /// Unknown message type that is marked as must-understand.
    UnsupportedMessage(u16),
    /// Object header continuation chain is longer than any sane file produces.
    ContinuationLimit(usize),
    /// Jenkins lookup3 checksum mismatch.
    ChecksumMismatch {
        /// The checksum stored in the file.
        expected: u32,
        /// The checksum we computed.
        computed: u32,
    },
    InvalidAttributeVersion(u8),
    InvalidDatatypeClass(u8),
    InvalidStringPadding(u8),
    InvalidCharacterSet(u8),
    InvalidDataspaceVersion(u8),
    InvalidDataspaceType(u8),
    InvalidLinkVersion(u8),
    InvalidLinkType(u8),
    InvalidLinkInfoVersion(u8),
    InvalidLocalHeapSignature,
    InvalidLocalHeapVersion(u8),
    InvalidBTreeSignature,
    InvalidBTreeNodeType(u8),
    /// A B-tree node is reachable twice from the same root.
    BTreeCycle(u64),
    /// A B-tree lists more children than the file has room for.
    BTreeTooLarge(usize),
    InvalidSymbolTableNodeSignature,
    InvalidSymbolTableNodeVersion(u8),
    InvalidGlobalHeapSignature,
    InvalidGlobalHeapVersion(u8),
    /// A variable-length element points at a missing global heap object.
    GlobalHeapObjectNotFound {
        collection_address: u64,
        index: u16,
    },
    /// A link or heap name is not valid UTF-8.
    InvalidName,
    /// A path component does not exist.
    PathNotFound(String),
    /// An intermediate path component exists but is not a group.
    NotAGroup(String),
    /// The object stores links or attributes in dense (fractal heap) form.
    DenseStorageUnsupported(&'static str),
    /// The attribute message is stored in the shared message table.
    SharedMessageUnsupported,
    /// The stored datatype cannot be read as the requested kind.
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    /// Raw data length does not match the datatype.
    DataSizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::SignatureNotFound => {
                write!(f, "HDF5 signature not found at any valid offset")
            }
            FormatError::UnsupportedVersion(v) => {
                write!(f, "unsupported superblock version: {v}")
            }
            FormatError::UnexpectedEof {
                expected,
                available,
            } => {
                write!(f, "unexpected EOF: need {expected} bytes, have {available}")
            }
            FormatError::InvalidOffsetSize(s) => {
                write!(f, "invalid offset size: {s} (must be 2, 4, or 8)")
            }
            FormatError::InvalidLengthSize(s) => {
                write!(f, "invalid length size: {s} (must be 2, 4, or 8)")
            }
            FormatError::InvalidObjectHeaderSignature => {
                write!(f, "invalid object header signature")
            }
            FormatError::InvalidObjectHeaderVersion(v) => {
                write!(f, "invalid object header version: {v}")
            }
            FormatError::UnsupportedMessage(id) => {
                write!(
                    f,
                    "unsupported message type {id:#06x} marked as must-understand"
                )
            }
            FormatError::ContinuationLimit(n) => {
                write!(f, "object header has more than {n} continuation blocks")
            }
            FormatError::ChecksumMismatch { expected, computed } => {
                write!(
                    f,
                    "checksum mismatch: expected {expected:#010x}, computed {computed:#010x}"
                )
            }
            FormatError::InvalidAttributeVersion(v) => {
                write!(f, "invalid attribute message version: {v}")
            }
            FormatError::InvalidDatatypeClass(c) => write!(f, "invalid datatype class: {c}"),
            FormatError::InvalidStringPadding(p) => write!(f, "invalid string padding: {p}"),
            FormatError::InvalidCharacterSet(c) => write!(f, "invalid character set: {c}"),
            FormatError::InvalidDataspaceVersion(v) => {
                write!(f, "invalid dataspace version: {v}")
            }
            FormatError::InvalidDataspaceType(t) => write!(f, "invalid dataspace type: {t}"),
            FormatError::InvalidLinkVersion(v) => write!(f, "invalid link message version: {v}"),
            FormatError::InvalidLinkType(t) => write!(f, "invalid link type: {t}"),
            FormatError::InvalidLinkInfoVersion(v) => {
                write!(f, "invalid link info message version: {v}")
            }
            FormatError::InvalidLocalHeapSignature => write!(f, "invalid local heap signature"),
            FormatError::InvalidLocalHeapVersion(v) => {
                write!(f, "invalid local heap version: {v}")
            }
            FormatError::InvalidBTreeSignature => write!(f, "invalid B-tree signature"),
            FormatError::InvalidBTreeNodeType(t) => write!(f, "invalid B-tree node type: {t}"),
            FormatError::BTreeCycle(addr) => {
                write!(f, "B-tree node at {addr:#x} is referenced more than once")
            }
            FormatError::BTreeTooLarge(n) => {
                write!(f, "B-tree has more than {n} children")
            }
            FormatError::InvalidSymbolTableNodeSignature => {
                write!(f, "invalid symbol table node signature")
            }
            FormatError::InvalidSymbolTableNodeVersion(v) => {
                write!(f, "invalid symbol table node version: {v}")
            }
            FormatError::InvalidGlobalHeapSignature => write!(f, "invalid global heap signature"),
            FormatError::InvalidGlobalHeapVersion(v) => {
                write!(f, "invalid global heap version: {v}")
            }
            FormatError::GlobalHeapObjectNotFound {
                collection_address,
                index,
            } => write!(
                f,
                "global heap object {index} not found in collection at {collection_address:#x}"
            ),
            FormatError::InvalidName => write!(f, "name is not valid UTF-8"),
            FormatError::PathNotFound(p) => write!(f, "path not found: {p}"),
            FormatError::NotAGroup(p) => write!(f, "not a group: {p}"),
            FormatError::DenseStorageUnsupported(what) => {
                write!(f, "dense {what} storage is not supported")
            }
            FormatError::SharedMessageUnsupported => {
                write!(f, "shared attribute messages are not supported")
            }
            FormatError::TypeMismatch { expected, actual } => {
                write!(f, "type mismatch: expected {expected}, found {actual}")
            }
            FormatError::DataSizeMismatch { expected, actual } => {
                write!(f, "data size mismatch: expected {expected} bytes, got {actual}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FormatError {}
