//! Path resolution through the group hierarchy.
//!
//! Both group layouts are handled: old-style groups that index their
//! members with a symbol table (B-tree + local heap), and new-style compact
//! groups that store one link message per member. Soft links are followed;
//! external links and dense link storage are not.

#[cfg(not(feature = "std"))]
use alloc::string::String;

use crate::btree_v1;
use crate::error::FormatError;
use crate::link_info::LinkInfo;
use crate::link_message::{LinkMessage, LinkTarget};
use crate::local_heap::LocalHeap;
use crate::message_type::MessageType;
use crate::object_header::ObjectHeader;
use crate::superblock::Superblock;
use crate::symbol_table::{self, SymbolTableMessage};

/// Soft links pointing at soft links more deeply than this are a cycle.
const MAX_SOFT_LINK_HOPS: usize = 16;

/// True if the header describes a group of either layout.
pub fn is_group(header: &ObjectHeader) -> bool {
    header.find(MessageType::SymbolTable).is_some()
        || header.find(MessageType::LinkInfo).is_some()
        || header.find(MessageType::Link).is_some()
}

/// Find the member `name` of the group described by `header`.
pub fn lookup_child(
    file: &[u8],
    sb: &Superblock,
    header: &ObjectHeader,
    name: &str,
) -> Result<Option<LinkTarget>, FormatError> {
    if let Some(msg) = header.find(MessageType::SymbolTable) {
        let table = SymbolTableMessage::parse(&msg.data, sb.offset_size)?;
        return lookup_symbol_table(file, sb, &table, name);
    }

    for msg in header.messages_of(MessageType::Link) {
        let link = LinkMessage::parse(&msg.data, sb.offset_size)?;
        if link.name == name {
            return Ok(Some(link.target));
        }
    }
    if let Some(msg) = header.find(MessageType::LinkInfo) {
        if LinkInfo::parse(&msg.data, sb.offset_size)?.is_dense() {
            return Err(FormatError::DenseStorageUnsupported("link"));
        }
    }
    Ok(None)
}

fn lookup_symbol_table(
    file: &[u8],
    sb: &Superblock,
    table: &SymbolTableMessage,
    name: &str,
) -> Result<Option<LinkTarget>, FormatError> {
    let heap = LocalHeap::parse(
        file,
        table.local_heap_address as usize,
        sb.offset_size,
        sb.length_size,
    )?;
    let nodes =
        btree_v1::collect_symbol_nodes(file, table.btree_address, sb.offset_size, sb.length_size)?;
    for node in nodes {
        for entry in symbol_table::read_node(file, node as usize, sb.offset_size)? {
            if heap.name_at(file, entry.name_offset)? == name {
                return Ok(Some(LinkTarget::Hard(entry.object_header_address)));
            }
        }
    }
    Ok(None)
}

/// Resolve an absolute or root-relative path to an object header address.
///
/// `""` and `"/"` name the root group. Empty components and `.` are skipped.
pub fn resolve_path(file: &[u8], sb: &Superblock, path: &str) -> Result<u64, FormatError> {
    resolve_from(file, sb, sb.root_group_address, "", path, 0)
}

fn resolve_from(
    file: &[u8],
    sb: &Superblock,
    start: u64,
    start_path: &str,
    path: &str,
    hops: usize,
) -> Result<u64, FormatError> {
    let (mut current, mut walked) = if path.starts_with('/') {
        (sb.root_group_address, String::new())
    } else {
        (start, String::from(start_path))
    };

    for component in path.split('/').filter(|c| !c.is_empty() && *c != ".") {
        let header = ObjectHeader::parse(file, current as usize, sb.offset_size, sb.length_size)?;
        if !is_group(&header) {
            return Err(FormatError::NotAGroup(root_if_empty(walked)));
        }
        let parent = walked.clone();
        walked.push('/');
        walked.push_str(component);

        current = match lookup_child(file, sb, &header, component)? {
            Some(LinkTarget::Hard(addr)) => addr,
            Some(LinkTarget::Soft(target)) => {
                if hops >= MAX_SOFT_LINK_HOPS {
                    return Err(FormatError::PathNotFound(walked));
                }
                resolve_from(file, sb, current, &parent, &target, hops + 1)?
            }
            Some(LinkTarget::External) | None => return Err(FormatError::PathNotFound(walked)),
        };
    }
    Ok(current)
}

fn root_if_empty(path: String) -> String {
    if path.is_empty() {
        String::from("/")
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_writer::{AttrValue, FileWriter, GroupLayout};
    use crate::signature::find_signature;

    fn parse(bytes: &[u8]) -> Superblock {
        Superblock::parse(bytes, find_signature(bytes).unwrap()).unwrap()
    }

    fn sample_file() -> Vec<u8> {
        let mut w = FileWriter::new();
        w.root().set_attr("IonMode", AttrValue::String("positive".into()));
        {
            let spectra = w.root().create_group("FullSpectra");
            spectra.set_attr("SampleInterval", AttrValue::F64(0.5));
            spectra.create_group("Nested");
        }
        w.root().create_soft_link("Alias", "/FullSpectra/Nested");
        w.finish()
    }

    #[test]
    fn root_spellings() {
        let bytes = sample_file();
        let sb = parse(&bytes);
        for p in ["", "/", "//", "/."] {
            assert_eq!(resolve_path(&bytes, &sb, p).unwrap(), sb.root_group_address);
        }
    }

    #[test]
    fn nested_groups_and_trailing_slash() {
        let bytes = sample_file();
        let sb = parse(&bytes);
        let a = resolve_path(&bytes, &sb, "/FullSpectra/Nested").unwrap();
        let b = resolve_path(&bytes, &sb, "FullSpectra/Nested/").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, sb.root_group_address);
    }

    #[test]
    fn soft_link_is_followed() {
        let bytes = sample_file();
        let sb = parse(&bytes);
        assert_eq!(
            resolve_path(&bytes, &sb, "/Alias").unwrap(),
            resolve_path(&bytes, &sb, "/FullSpectra/Nested").unwrap()
        );
    }

    #[test]
    fn missing_component() {
        let bytes = sample_file();
        let sb = parse(&bytes);
        assert_eq!(
            resolve_path(&bytes, &sb, "/FullSpectra/TofData"),
            Err(FormatError::PathNotFound("/FullSpectra/TofData".into()))
        );
        // names are case sensitive
        assert!(resolve_path(&bytes, &sb, "/fullspectra").is_err());
    }

    #[test]
    fn soft_link_cycle_is_bounded() {
        let mut w = FileWriter::new();
        w.root().create_soft_link("Loop", "/Loop");
        let bytes = w.finish();
        let sb = parse(&bytes);
        assert!(matches!(
            resolve_path(&bytes, &sb, "/Loop"),
            Err(FormatError::PathNotFound(_))
        ));
    }

    #[test]
    fn dataset_in_the_middle_of_a_path() {
        let mut w = FileWriter::new();
        w.root().create_group("FullSpectra").create_dataset("MassAxis", 1.0);
        let bytes = w.finish();
        let sb = parse(&bytes);
        assert!(resolve_path(&bytes, &sb, "/FullSpectra/MassAxis").is_ok());
        assert_eq!(
            resolve_path(&bytes, &sb, "/FullSpectra/MassAxis/Units"),
            Err(FormatError::NotAGroup("/FullSpectra/MassAxis".into()))
        );
    }

    #[test]
    fn symbol_table_group() {
        let mut w = FileWriter::with_layout(GroupLayout::SymbolTable);
        w.root()
            .create_group("FullSpectra")
            .set_attr("SampleInterval", AttrValue::F64(0.5));
        w.root().create_group("TofData");
        let bytes = w.finish();
        let sb = parse(&bytes);
        assert_eq!(sb.version, 0);
        let addr = resolve_path(&bytes, &sb, "/FullSpectra").unwrap();
        let header = ObjectHeader::parse(&bytes, addr as usize, 8, 8).unwrap();
        assert!(crate::attribute::find_attribute(&header, "SampleInterval", 8, 8)
            .unwrap()
            .is_some());
        assert!(resolve_path(&bytes, &sb, "/TofData").is_ok());
        assert!(matches!(
            resolve_path(&bytes, &sb, "/Missing"),
            Err(FormatError::PathNotFound(_))
        ));
    }
}
