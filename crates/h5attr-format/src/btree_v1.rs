//! Version 1 B-tree nodes ("TREE") of old-style groups.
//!
//! Only group nodes (type 0) are walked. Leaves point at symbol table
//! nodes, internal nodes at further B-tree nodes.

#[cfg(not(feature = "std"))]
use alloc::{collections::BTreeSet, vec::Vec};
#[cfg(feature = "std")]
use std::collections::BTreeSet;

use crate::cursor::Cursor;
use crate::error::FormatError;

const TREE_SIGNATURE: [u8; 4] = *b"TREE";

/// Deeper trees than this only occur in corrupt files.
const MAX_DEPTH: u8 = 32;

/// Collect the addresses of every symbol table node below `address`.
///
/// Each node may be reached once, and the total number of children is
/// bounded by how many key/child pairs the file could physically hold.
pub fn collect_symbol_nodes(
    file: &[u8],
    address: u64,
    offset_size: u8,
    length_size: u8,
) -> Result<Vec<u64>, FormatError> {
    let entry_size = (offset_size as usize + length_size as usize).max(1);
    collect_bounded(file, address, offset_size, length_size, file.len() / entry_size)
}

fn collect_bounded(
    file: &[u8],
    address: u64,
    offset_size: u8,
    length_size: u8,
    max_children: usize,
) -> Result<Vec<u64>, FormatError> {
    let mut walk = Walk {
        file,
        offset_size,
        length_size,
        max_children,
        children: 0,
        visited: BTreeSet::new(),
        out: Vec::new(),
    };
    walk.node(address, MAX_DEPTH)?;
    Ok(walk.out)
}

struct Walk<'a> {
    file: &'a [u8],
    offset_size: u8,
    length_size: u8,
    max_children: usize,
    children: usize,
    visited: BTreeSet<u64>,
    out: Vec<u64>,
}

impl Walk<'_> {
    fn node(&mut self, address: u64, budget: u8) -> Result<(), FormatError> {
        if !self.visited.insert(address) {
            return Err(FormatError::BTreeCycle(address));
        }
        let mut c = Cursor::at(self.file, address as usize);
        if c.bytes(4)? != TREE_SIGNATURE {
            return Err(FormatError::InvalidBTreeSignature);
        }
        let node_type = c.u8()?;
        if node_type != 0 {
            return Err(FormatError::InvalidBTreeNodeType(node_type));
        }
        let level = c.u8()?;
        // levels must shrink toward the leaves
        if level >= budget {
            return Err(FormatError::InvalidBTreeNodeType(node_type));
        }
        let entries = c.u16()? as usize;
        // left and right siblings
        c.skip(2 * self.offset_size as usize)?;

        for _ in 0..entries {
            self.children += 1;
            if self.children > self.max_children {
                return Err(FormatError::BTreeTooLarge(self.max_children));
            }
            // key (heap offset of the largest name in the child), then child
            c.skip(self.length_size as usize)?;
            let child = c.uint(self.offset_size)?;
            if level == 0 {
                if !self.visited.insert(child) {
                    return Err(FormatError::BTreeCycle(child));
                }
                self.out.push(child);
            } else {
                self.node(child, level)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(level: u8, children: &[u64]) -> Vec<u8> {
        let mut buf = TREE_SIGNATURE.to_vec();
        buf.push(0);
        buf.push(level);
        buf.extend_from_slice(&(children.len() as u16).to_le_bytes());
        buf.extend_from_slice(&u64::MAX.to_le_bytes());
        buf.extend_from_slice(&u64::MAX.to_le_bytes());
        for (i, child) in children.iter().enumerate() {
            buf.extend_from_slice(&(i as u64).to_le_bytes());
            buf.extend_from_slice(&child.to_le_bytes());
        }
        buf.extend_from_slice(&0u64.to_le_bytes());
        buf
    }

    #[test]
    fn leaf_children() {
        let file = node(0, &[1000, 2000]);
        assert_eq!(collect_symbol_nodes(&file, 0, 8, 8).unwrap(), vec![1000, 2000]);
    }

    #[test]
    fn two_levels() {
        let mut file = node(1, &[256, 512]);
        file.resize(256, 0);
        file.extend_from_slice(&node(0, &[7000]));
        file.resize(512, 0);
        file.extend_from_slice(&node(0, &[8000, 9000]));
        assert_eq!(
            collect_symbol_nodes(&file, 0, 8, 8).unwrap(),
            vec![7000, 8000, 9000]
        );
    }

    #[test]
    fn self_loop_terminates() {
        // an internal node whose child is itself must not recurse forever
        let file = node(1, &[0]);
        assert_eq!(
            collect_symbol_nodes(&file, 0, 8, 8),
            Err(FormatError::BTreeCycle(0))
        );
    }

    #[test]
    fn repeated_child_rejected() {
        // fan-out built from one node listed many times
        let leaves: Vec<u64> = (7000..7064).collect();
        let mut file = node(2, &[2048; 100]);
        file.resize(2048, 0);
        file.extend_from_slice(&node(1, &[4096; 100]));
        file.resize(4096, 0);
        file.extend_from_slice(&node(0, &leaves));
        assert_eq!(
            collect_symbol_nodes(&file, 0, 8, 8),
            Err(FormatError::BTreeCycle(4096))
        );
    }

    #[test]
    fn repeated_leaf_entry_rejected() {
        let file = node(0, &[7000, 7000]);
        assert_eq!(
            collect_symbol_nodes(&file, 0, 8, 8),
            Err(FormatError::BTreeCycle(7000))
        );
    }

    #[test]
    fn child_count_bounded() {
        let mut file = node(1, &[256, 512]);
        file.resize(256, 0);
        file.extend_from_slice(&node(0, &[7000]));
        file.resize(512, 0);
        file.extend_from_slice(&node(0, &[8000, 9000]));
        assert_eq!(
            collect_bounded(&file, 0, 8, 8, 4),
            Err(FormatError::BTreeTooLarge(4))
        );
        assert_eq!(collect_bounded(&file, 0, 8, 8, 5).unwrap().len(), 3);
    }

    #[test]
    fn chunk_btree_rejected() {
        let mut file = node(0, &[]);
        file[4] = 1;
        assert_eq!(
            collect_symbol_nodes(&file, 0, 8, 8),
            Err(FormatError::InvalidBTreeNodeType(1))
        );
    }
}
