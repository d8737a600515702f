//! # B+Tree Interior Nodes
//!
//! Interior nodes route searches. Each cell pairs a child page with the
//! greatest key found anywhere in that child's subtree; a separate
//! `right_child` holds the subtree whose keys are strictly greater than
//! every cell key.
//!
//! ## Page Layout
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----------
//! 0       1     node_type (= 0, interior)
//! 1       1     is_root
//! 2       4     parent page number
//! 6       4     num_keys
//! 10      4     right_child page number
//! 14      8     cell 0: child (4) + key (4)
//! ...           up to 3 cells
//! ```
//!
//! ## Navigation
//!
//! For a search key K, the child to follow is the one at the least cell
//! index whose key is >= K; if every cell key is smaller, the search follows
//! `right_child`.
//!
//! ## Sentinels
//!
//! A `right_child` of `INVALID_PAGE_NUM` means the node is empty, a state
//! that only exists transiently while a split is redistributing children.
//! Resolving a child through [`InteriorNode::child_at`] refuses both the
//! sentinel and any index past `num_keys`; either is a logic error in the
//! caller and surfaces as a failure the process treats as fatal.

use std::mem::size_of;

use eyre::{bail, ensure, Result};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::config::{
    INTERIOR_NODE_CELL_SIZE, INTERIOR_NODE_HEADER_SIZE, INTERIOR_NODE_MAX_CELLS, INVALID_PAGE_NUM,
    PAGE_SIZE,
};
use crate::storage::{NodeHeader, NodeType};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct InteriorHeader {
    node_type: u8,
    is_root: u8,
    parent: U32,
    num_keys: U32,
    right_child: U32,
}

const _: () = assert!(
    size_of::<InteriorHeader>() == INTERIOR_NODE_HEADER_SIZE,
    "interior header layout mismatch"
);

impl InteriorHeader {
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for InteriorHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );

        Self::ref_from_bytes(&data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read InteriorHeader: {:?}", e))
    }

    pub fn from_bytes_mut(data: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for InteriorHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );

        Self::mut_from_bytes(&mut data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read InteriorHeader: {:?}", e))
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
        num_keys: u32,
        right_child: u32,
    }
}

/// One interior cell: a child page and the max key of its subtree.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct InteriorCell {
    child: U32,
    key: U32,
}

const _: () = assert!(
    size_of::<InteriorCell>() == INTERIOR_NODE_CELL_SIZE,
    "interior cell layout mismatch"
);

impl InteriorCell {
    pub fn child(&self) -> u32 {
        self.child.get()
    }

    pub fn key(&self) -> u32 {
        self.key.get()
    }
}

#[derive(Debug)]
pub struct InteriorNode<'a> {
    data: &'a [u8],
}

pub struct InteriorNodeMut<'a> {
    data: &'a mut [u8],
}

fn cell_offset(index: usize) -> usize {
    INTERIOR_NODE_HEADER_SIZE + index * INTERIOR_NODE_CELL_SIZE
}

impl<'a> InteriorNode<'a> {
    pub fn from_page(data: &'a [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        let header = NodeHeader::from_bytes(data)?;
        ensure!(
            header.node_type()? == NodeType::Interior,
            "expected interior page, got {:?}",
            header.node_type()?
        );
        Ok(Self { data })
    }

    fn header(&self) -> &InteriorHeader {
        InteriorHeader::from_bytes(self.data).unwrap()
    }

    pub fn num_keys(&self) -> u32 {
        self.header().num_keys()
    }

    /// Raw right-child page number, which may be the invalid sentinel.
    pub fn right_child(&self) -> u32 {
        self.header().right_child()
    }

    pub fn parent(&self) -> u32 {
        self.header().parent()
    }

    pub fn is_root(&self) -> bool {
        self.header().is_root()
    }

    pub fn cell_at(&self, index: usize) -> Result<&'a InteriorCell> {
        ensure!(
            index < self.num_keys() as usize,
            "cell index {} out of bounds (num_keys={})",
            index,
            self.num_keys()
        );
        let offset = cell_offset(index);
        let bytes: &'a [u8] = &self.data[offset..offset + INTERIOR_NODE_CELL_SIZE];
        InteriorCell::ref_from_bytes(bytes)
            .map_err(|e| eyre::eyre!("failed to read interior cell {}: {:?}", index, e))
    }

    pub fn key_at(&self, index: usize) -> Result<u32> {
        Ok(self.cell_at(index)?.key())
    }

    /// Resolves child `index`, where `index == num_keys` names the right
    /// child. Indexes past that, or a child equal to the invalid sentinel,
    /// are logic errors.
    pub fn child_at(&self, index: usize) -> Result<u32> {
        let num_keys = self.num_keys() as usize;

        if index > num_keys {
            bail!(
                "tried to access child {} of an interior node with {} keys",
                index,
                num_keys
            );
        }

        if index == num_keys {
            let right_child = self.right_child();
            ensure!(
                right_child != INVALID_PAGE_NUM,
                "tried to access the right child of an interior node, but it is unset"
            );
            return Ok(right_child);
        }

        let child = self.cell_at(index)?.child();
        ensure!(
            child != INVALID_PAGE_NUM,
            "child {} of interior node is an invalid page",
            index
        );
        Ok(child)
    }

    /// Index of the child whose subtree should contain `key`: the least cell
    /// index with a key >= `key`, or `num_keys` for the right child.
    pub fn find_child_index(&self, key: u32) -> Result<u32> {
        let mut min = 0u32;
        let mut max = self.num_keys();

        while min != max {
            let mid = (min + max) / 2;
            let key_to_right = self.key_at(mid as usize)?;

            if key_to_right >= key {
                max = mid;
            } else {
                min = mid + 1;
            }
        }

        Ok(min)
    }
}

impl<'a> InteriorNodeMut<'a> {
    pub fn from_page(data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        let header = NodeHeader::from_bytes(data)?;
        ensure!(
            header.node_type()? == NodeType::Interior,
            "expected interior page, got {:?}",
            header.node_type()?
        );
        Ok(Self { data })
    }

    /// Initializes the page as an empty, non-root interior node with no
    /// right child.
    pub fn init(data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );

        let header = InteriorHeader::from_bytes_mut(data)?;
        header.set_node_type(NodeType::Interior);
        header.set_root(false);
        header.set_num_keys(0);
        header.set_right_child(INVALID_PAGE_NUM);

        Ok(Self { data })
    }

    fn header(&self) -> &InteriorHeader {
        InteriorHeader::from_bytes(self.data).unwrap()
    }

    fn header_mut(&mut self) -> &mut InteriorHeader {
        InteriorHeader::from_bytes_mut(self.data).unwrap()
    }

    pub fn num_keys(&self) -> u32 {
        self.header().num_keys()
    }

    pub fn right_child(&self) -> u32 {
        self.header().right_child()
    }

    pub fn cell_at(&self, index: usize) -> Result<InteriorCell> {
        Ok(*InteriorNode::from_page(self.data)?.cell_at(index)?)
    }

    pub fn find_child_index(&self, key: u32) -> Result<u32> {
        InteriorNode::from_page(self.data)?.find_child_index(key)
    }

    pub fn set_num_keys(&mut self, num_keys: u32) {
        self.header_mut().set_num_keys(num_keys);
    }

    pub fn set_right_child(&mut self, page_num: u32) {
        self.header_mut().set_right_child(page_num);
    }

    pub fn set_parent(&mut self, page_num: u32) {
        self.header_mut().set_parent(page_num);
    }

    pub fn set_root(&mut self, is_root: bool) {
        self.header_mut().set_root(is_root);
    }

    /// Overwrites the cell slot at `index` without touching `num_keys`.
    pub fn write_cell(&mut self, index: usize, child: u32, key: u32) -> Result<()> {
        ensure!(
            index < INTERIOR_NODE_MAX_CELLS,
            "cell index {} out of bounds (capacity {})",
            index,
            INTERIOR_NODE_MAX_CELLS
        );

        let offset = cell_offset(index);
        self.data[offset..offset + 4].copy_from_slice(&child.to_le_bytes());
        self.data[offset + 4..offset + 8].copy_from_slice(&key.to_le_bytes());
        Ok(())
    }

    /// Inserts a cell at `index` in one step, shifting later cells right.
    /// The count is only bumped after the slot holds the new cell, so there
    /// is never a live cell with stale contents.
    pub fn insert_cell_at(&mut self, index: usize, child: u32, key: u32) -> Result<()> {
        let num_keys = self.num_keys() as usize;
        ensure!(
            num_keys < INTERIOR_NODE_MAX_CELLS,
            "interior node is full ({} keys)",
            num_keys
        );
        ensure!(
            index <= num_keys,
            "insert index {} past key count {}",
            index,
            num_keys
        );

        if index < num_keys {
            let start = cell_offset(index);
            let end = cell_offset(num_keys);
            self.data
                .copy_within(start..end, start + INTERIOR_NODE_CELL_SIZE);
        }

        self.write_cell(index, child, key)?;
        self.set_num_keys(num_keys as u32 + 1);
        Ok(())
    }

    /// Rewrites the key under which a child is listed after that child's max
    /// key changed. When `old_key` exceeds every cell key the child is the
    /// right child, whose key is not stored, and there is nothing to update.
    pub fn update_key(&mut self, old_key: u32, new_key: u32) -> Result<()> {
        let index = self.find_child_index(old_key)? as usize;
        if index < self.num_keys() as usize {
            let child = self.cell_at(index)?.child();
            self.write_cell(index, child, new_key)?;
        }
        Ok(())
    }
}
