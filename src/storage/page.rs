//! # Node Types and the Common Node Header
//!
//! Every page stores exactly one B+ tree node, and every node begins with
//! the same 6-byte header:
//!
//! ```text
//! Offset  Size  Field        Description
//! ------  ----  -----------  ----------------------------------------
//! 0       1     node_type    0 = interior, 1 = leaf
//! 1       1     is_root      Nonzero on the root node only
//! 2       4     parent       Page number of the parent node
//! ```
//!
//! The leaf and interior headers in `crate::btree` extend this prefix with
//! their own fields; this view exists for the places that must dispatch on a
//! node before knowing which kind it is.
//!
//! ## Zero-Copy Access
//!
//! `NodeHeader` uses `zerocopy` for safe transmutation from raw page bytes,
//! so reading a header never copies:
//!
//! ```text
//! let header = NodeHeader::from_bytes(&page[..])?;
//! ```
//!
//! Multi-byte fields are little-endian on disk via the `U32` wrapper type.

use std::mem::size_of;

use eyre::{bail, ensure, Result};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::config::COMMON_NODE_HEADER_SIZE;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Interior = 0,
    Leaf = 1,
}

impl NodeType {
    pub fn from_byte(b: u8) -> Result<Self> {
        match b {
            0 => Ok(NodeType::Interior),
            1 => Ok(NodeType::Leaf),
            _ => bail!("invalid node type byte: {:#04x}", b),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NodeHeader {
    node_type: u8,
    is_root: u8,
    parent: U32,
}

const _: () = assert!(
    size_of::<NodeHeader>() == COMMON_NODE_HEADER_SIZE,
    "common node header layout mismatch"
);

impl NodeHeader {
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for NodeHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );

        Self::ref_from_bytes(&data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read NodeHeader: {:?}", e))
    }

    pub fn from_bytes_mut(data: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for NodeHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );

        Self::mut_from_bytes(&mut data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read NodeHeader: {:?}", e))
    }

    pub fn node_type(&self) -> Result<NodeType> {
        NodeType::from_byte(self.node_type)
    }

    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.node_type = node_type as u8;
    }

    pub fn is_root(&self) -> bool {
        self.is_root != 0
    }

    pub fn set_root(&mut self, is_root: bool) {
        self.is_root = is_root as u8;
    }

    zerocopy_accessors! {
        parent: u32,
    }
}
