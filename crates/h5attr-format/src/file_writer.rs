//! In-memory HDF5 file builder for fixtures.
//!
//! Produces small but structurally valid files: a group tree with scalar
//! datasets and attributes, laid out either as new-style compact groups
//! (superblock v3, v2 object headers) or old-style symbol-table groups
//! (superblock v0, v1 object headers, B-tree + local heap). Variable-length
//! strings go into one global heap collection at the end of the file.
//! Build the tree through [`FileWriter::root`], then call
//! [`FileWriter::finish`] for the bytes.

#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

use crate::attribute::AttributeMessage;
use crate::checksum::jenkins_lookup3;
use crate::cursor::pad8;
use crate::dataspace::{Dataspace, DataspaceKind};
use crate::datatype::{CharacterSet, Datatype, Endian, StringPadding};
use crate::global_heap::serialize_collection;
use crate::link_info::LinkInfo;
use crate::link_message::{LinkMessage, LinkTarget};
use crate::message_type::MessageType;
use crate::object_header_writer::ObjectHeaderWriter;
use crate::signature::HDF5_SIGNATURE;

const UNDEFINED: u64 = u64::MAX;

/// An attribute value to store.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    I32(i32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Fixed-length, NUL-terminated UTF-8 string.
    String(String),
    /// Variable-length UTF-8 string stored in the global heap.
    VlString(String),
    /// One-dimensional array of doubles.
    F64Array(Vec<f64>),
    /// Null dataspace: the attribute exists but holds no elements.
    Empty,
    /// Pre-encoded datatype, dataspace and raw element bytes.
    Raw {
        datatype: Datatype,
        dataspace: Dataspace,
        data: Vec<u8>,
    },
}

/// On-disk group representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupLayout {
    /// Link messages in the group's object header.
    Compact,
    /// Symbol table: B-tree, symbol table node and local heap.
    SymbolTable,
}

#[derive(Debug, Clone, Default)]
pub struct GroupBuilder {
    attrs: Vec<(String, AttrValue)>,
    groups: Vec<(String, GroupBuilder)>,
    datasets: Vec<(String, DatasetBuilder)>,
    soft_links: Vec<(String, String)>,
}

/// A scalar `f64` dataset.
#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    value: f64,
    attrs: Vec<(String, AttrValue)>,
}

impl GroupBuilder {
    pub fn set_attr(&mut self, name: &str, value: AttrValue) -> &mut Self {
        self.attrs.push((String::from(name), value));
        self
    }

    pub fn create_group(&mut self, name: &str) -> &mut GroupBuilder {
        let i = self.groups.len();
        self.groups.push((String::from(name), GroupBuilder::default()));
        &mut self.groups[i].1
    }

    pub fn create_dataset(&mut self, name: &str, value: f64) -> &mut DatasetBuilder {
        let i = self.datasets.len();
        self.datasets.push((
            String::from(name),
            DatasetBuilder {
                value,
                attrs: Vec::new(),
            },
        ));
        &mut self.datasets[i].1
    }

    /// Soft links are only written for [`GroupLayout::Compact`].
    pub fn create_soft_link(&mut self, name: &str, target: &str) -> &mut Self {
        self.soft_links
            .push((String::from(name), String::from(target)));
        self
    }
}

impl DatasetBuilder {
    pub fn set_attr(&mut self, name: &str, value: AttrValue) -> &mut Self {
        self.attrs.push((String::from(name), value));
        self
    }
}

/// Builds a complete file image.
#[derive(Debug, Clone)]
pub struct FileWriter {
    root: GroupBuilder,
    layout: GroupLayout,
}

impl Default for FileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FileWriter {
    pub fn new() -> Self {
        Self::with_layout(GroupLayout::Compact)
    }

    pub fn with_layout(layout: GroupLayout) -> Self {
        Self {
            root: GroupBuilder::default(),
            layout,
        }
    }

    pub fn root(&mut self) -> &mut GroupBuilder {
        &mut self.root
    }

    /// Lay the file out and return its bytes.
    pub fn finish(&self) -> Vec<u8> {
        let sb_len = match self.layout {
            GroupLayout::Compact => 48u64,
            GroupLayout::SymbolTable => 96,
        };
        // Header sizes never depend on addresses, so a measuring pass gives
        // the final position of the global heap.
        let probe = Emitter::run(self.layout, sb_len, 0, &self.root);
        let gcol_address = sb_len + probe.out.len() as u64;
        let body = Emitter::run(self.layout, sb_len, gcol_address, &self.root);

        let gcol = if body.heap.is_empty() {
            Vec::new()
        } else {
            let objects: Vec<&[u8]> = body.heap.iter().map(Vec::as_slice).collect();
            serialize_collection(&objects)
        };
        let eof = gcol_address + gcol.len() as u64;

        let mut file = match self.layout {
            GroupLayout::Compact => superblock_v3(body.root, eof),
            GroupLayout::SymbolTable => superblock_v0(body.root, eof),
        };
        file.extend_from_slice(&body.out);
        file.extend_from_slice(&gcol);
        file
    }
}

fn superblock_v3(root: u64, eof: u64) -> Vec<u8> {
    let mut buf = HDF5_SIGNATURE.to_vec();
    buf.extend_from_slice(&[3, 8, 8, 0]);
    for addr in [0, UNDEFINED, eof, root] {
        buf.extend_from_slice(&addr.to_le_bytes());
    }
    let sum = jenkins_lookup3(&buf);
    buf.extend_from_slice(&sum.to_le_bytes());
    buf
}

fn superblock_v0(root: u64, eof: u64) -> Vec<u8> {
    let mut buf = HDF5_SIGNATURE.to_vec();
    buf.extend_from_slice(&[0, 0, 0, 0, 0, 8, 8, 0]);
    buf.extend_from_slice(&4u16.to_le_bytes());
    buf.extend_from_slice(&16u16.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    for addr in [0, UNDEFINED, eof, UNDEFINED] {
        buf.extend_from_slice(&addr.to_le_bytes());
    }
    // root symbol table entry without cached scratch data
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&root.to_le_bytes());
    buf.extend_from_slice(&[0; 24]);
    buf
}

struct Emitter {
    layout: GroupLayout,
    base: u64,
    gcol_address: u64,
    out: Vec<u8>,
    heap: Vec<Vec<u8>>,
    root: u64,
}

impl Emitter {
    fn run(layout: GroupLayout, base: u64, gcol_address: u64, root: &GroupBuilder) -> Emitter {
        let mut e = Emitter {
            layout,
            base,
            gcol_address,
            out: Vec::new(),
            heap: Vec::new(),
            root: 0,
        };
        e.root = e.group(root);
        e
    }

    fn append(&mut self, bytes: &[u8]) -> u64 {
        let addr = self.base + self.out.len() as u64;
        self.out.extend_from_slice(bytes);
        addr
    }

    fn header(&mut self, w: &ObjectHeaderWriter) -> u64 {
        let bytes = match self.layout {
            GroupLayout::Compact => w.serialize(),
            GroupLayout::SymbolTable => w.serialize_v1(),
        };
        self.append(&bytes)
    }

    fn group(&mut self, g: &GroupBuilder) -> u64 {
        let mut members = Vec::new();
        for (name, child) in &g.groups {
            members.push((name.clone(), self.group(child)));
        }
        for (name, ds) in &g.datasets {
            members.push((name.clone(), self.dataset(ds)));
        }

        let mut w = ObjectHeaderWriter::new();
        match self.layout {
            GroupLayout::Compact => {
                w.add_message(MessageType::LinkInfo, LinkInfo::serialize_compact().to_vec());
                w.add_message(MessageType::GroupInfo, [0u8, 0].to_vec());
                for (name, addr) in members {
                    let link = LinkMessage {
                        name,
                        target: LinkTarget::Hard(addr),
                    };
                    w.add_message(MessageType::Link, link.serialize());
                }
                for (name, target) in &g.soft_links {
                    let link = LinkMessage {
                        name: name.clone(),
                        target: LinkTarget::Soft(target.clone()),
                    };
                    w.add_message(MessageType::Link, link.serialize());
                }
            }
            GroupLayout::SymbolTable => {
                let table = self.symbol_table(members);
                w.add_message(MessageType::SymbolTable, table);
            }
        }
        self.attributes(&mut w, &g.attrs);
        self.header(&w)
    }

    fn dataset(&mut self, d: &DatasetBuilder) -> u64 {
        let mut w = ObjectHeaderWriter::new();
        w.add_message(MessageType::Dataspace, Dataspace::scalar().serialize());
        w.add_message(MessageType::Datatype, f64_type().serialize());
        // layout v3, compact class, 8 data bytes inline
        let mut layout = [3u8, 0, 8, 0].to_vec();
        layout.extend_from_slice(&d.value.to_le_bytes());
        w.add_message(MessageType::DataLayout, layout);
        self.attributes(&mut w, &d.attrs);
        self.header(&w)
    }

    /// Write heap, symbol node and B-tree; return the symbol table message.
    fn symbol_table(&mut self, mut members: Vec<(String, u64)>) -> Vec<u8> {
        members.sort_by(|a, b| a.0.cmp(&b.0));

        // offset 0 holds the empty name
        let mut segment = [0u8; 8].to_vec();
        let mut offsets = Vec::with_capacity(members.len());
        for (name, _) in &members {
            offsets.push(segment.len() as u64);
            segment.extend_from_slice(name.as_bytes());
            segment.push(0);
            segment.resize(pad8(segment.len()), 0);
        }
        let heap_address = self.base + self.out.len() as u64;
        let mut heap = b"HEAP".to_vec();
        heap.extend_from_slice(&[0; 4]);
        heap.extend_from_slice(&(segment.len() as u64).to_le_bytes());
        heap.extend_from_slice(&UNDEFINED.to_le_bytes());
        heap.extend_from_slice(&(heap_address + 32).to_le_bytes());
        heap.extend_from_slice(&segment);
        self.append(&heap);

        let mut node = b"SNOD".to_vec();
        node.extend_from_slice(&[1, 0]);
        node.extend_from_slice(&(members.len() as u16).to_le_bytes());
        for ((_, addr), offset) in members.iter().zip(&offsets) {
            node.extend_from_slice(&offset.to_le_bytes());
            node.extend_from_slice(&addr.to_le_bytes());
            node.extend_from_slice(&[0; 24]);
        }
        let node_address = self.append(&node);

        let used = u16::from(!members.is_empty());
        let mut tree = b"TREE".to_vec();
        tree.extend_from_slice(&[0, 0]);
        tree.extend_from_slice(&used.to_le_bytes());
        tree.extend_from_slice(&UNDEFINED.to_le_bytes());
        tree.extend_from_slice(&UNDEFINED.to_le_bytes());
        tree.extend_from_slice(&0u64.to_le_bytes());
        if used == 1 {
            tree.extend_from_slice(&node_address.to_le_bytes());
            let last = offsets.last().copied().unwrap_or(0);
            tree.extend_from_slice(&last.to_le_bytes());
        }
        let tree_address = self.append(&tree);

        let mut msg = tree_address.to_le_bytes().to_vec();
        msg.extend_from_slice(&heap_address.to_le_bytes());
        msg
    }

    fn attributes(&mut self, w: &mut ObjectHeaderWriter, attrs: &[(String, AttrValue)]) {
        for (name, value) in attrs {
            let msg = self.attribute(name, value);
            let bytes = match self.layout {
                GroupLayout::Compact => msg.serialize(),
                GroupLayout::SymbolTable => msg.serialize_v1(),
            };
            w.add_message(MessageType::Attribute, bytes);
        }
    }

    fn attribute(&mut self, name: &str, value: &AttrValue) -> AttributeMessage {
        let (datatype, dataspace, raw_data) = match value {
            AttrValue::I32(v) => (int_type(4, true), Dataspace::scalar(), v.to_le_bytes().to_vec()),
            AttrValue::I64(v) => (int_type(8, true), Dataspace::scalar(), v.to_le_bytes().to_vec()),
            AttrValue::U64(v) => (
                int_type(8, false),
                Dataspace::scalar(),
                v.to_le_bytes().to_vec(),
            ),
            AttrValue::F32(v) => (
                Datatype::Float {
                    size: 4,
                    byte_order: Endian::Little,
                },
                Dataspace::scalar(),
                v.to_le_bytes().to_vec(),
            ),
            AttrValue::F64(v) => (f64_type(), Dataspace::scalar(), v.to_le_bytes().to_vec()),
            AttrValue::String(s) => {
                let mut raw = s.as_bytes().to_vec();
                raw.push(0);
                (
                    Datatype::FixedString {
                        size: raw.len() as u32,
                        padding: StringPadding::NullTerminate,
                        charset: CharacterSet::Utf8,
                    },
                    Dataspace::scalar(),
                    raw,
                )
            }
            AttrValue::VlString(s) => {
                self.heap.push(s.as_bytes().to_vec());
                let mut raw = (s.len() as u32).to_le_bytes().to_vec();
                raw.extend_from_slice(&self.gcol_address.to_le_bytes());
                raw.extend_from_slice(&(self.heap.len() as u32).to_le_bytes());
                (
                    Datatype::VarString {
                        padding: StringPadding::NullTerminate,
                        charset: CharacterSet::Utf8,
                    },
                    Dataspace::scalar(),
                    raw,
                )
            }
            AttrValue::F64Array(values) => (
                f64_type(),
                Dataspace {
                    kind: DataspaceKind::Simple,
                    dims: [values.len() as u64].to_vec(),
                },
                values.iter().flat_map(|v| v.to_le_bytes()).collect(),
            ),
            AttrValue::Empty => (
                int_type(4, true),
                Dataspace {
                    kind: DataspaceKind::Null,
                    dims: Vec::new(),
                },
                Vec::new(),
            ),
            AttrValue::Raw {
                datatype,
                dataspace,
                data,
            } => (datatype.clone(), dataspace.clone(), data.clone()),
        };
        AttributeMessage {
            name: String::from(name),
            datatype,
            dataspace,
            raw_data,
        }
    }
}

fn int_type(size: u32, signed: bool) -> Datatype {
    Datatype::Integer {
        size,
        byte_order: Endian::Little,
        signed,
    }
}

fn f64_type() -> Datatype {
    Datatype::Float {
        size: 8,
        byte_order: Endian::Little,
    }
}
