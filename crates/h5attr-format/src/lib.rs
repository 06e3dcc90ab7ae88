//! Read-only parsing of the HDF5 structures needed to look up scalar
//! attributes: superblock, object headers, group hierarchies (symbol-table
//! and link-message groups), attribute messages, datatypes, dataspaces and
//! the global heap for variable-length strings.
//!
//! The crate works on a borrowed `&[u8]` view of the whole file and supports
//! `no_std` environments with the `alloc` crate.
//!
//! ```no_run
//! use h5attr_format::object_header::ObjectHeader;
//! use h5attr_format::superblock::Superblock;
//! use h5attr_format::{attribute, data_read, group, signature};
//!
//! let bytes = std::fs::read("acquisition.h5").unwrap();
//! let sb = Superblock::parse(&bytes, signature::find_signature(&bytes).unwrap()).unwrap();
//! let addr = group::resolve_path(&bytes, &sb, "/FullSpectra").unwrap();
//! let (os, ls) = (sb.offset_size, sb.length_size);
//! let header = ObjectHeader::parse(&bytes, addr as usize, os, ls).unwrap();
//! if let Some(attr) = attribute::find_attribute(&header, "SampleInterval", os, ls).unwrap() {
//!     println!("{}", data_read::read_scalar_f64(&attr).unwrap());
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod attribute;
pub mod btree_v1;
pub mod checksum;
pub mod cursor;
pub mod data_read;
pub mod dataspace;
pub mod datatype;
pub mod error;
pub mod global_heap;
pub mod group;
pub mod link_info;
pub mod link_message;
pub mod local_heap;
pub mod message_type;
pub mod object_header;
pub mod signature;
pub mod superblock;
pub mod symbol_table;

#[cfg(any(test, feature = "writer"))]
pub mod file_writer;
#[cfg(any(test, feature = "writer"))]
pub mod object_header_writer;

pub use error::FormatError;
