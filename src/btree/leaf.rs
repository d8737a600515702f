//! # B+Tree Leaf Nodes
//!
//! Leaf nodes store the actual rows. Each leaf holds a packed array of
//! fixed-size cells and a link to the next leaf in key order.
//!
//! ## Page Layout
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----------
//! 0       1     node_type (= 1, leaf)
//! 1       1     is_root
//! 2       4     parent page number
//! 6       4     num_cells
//! 10      4     next_leaf (0 = end of chain)
//! 14      297   cell 0: key (4) + row payload (293)
//! ...           up to 13 cells
//! ```
//!
//! With 4096-byte pages and 297-byte cells, 13 cells fit per leaf. On a
//! split the lower 7 stay in the left node and the upper 7 move to the new
//! right node.
//!
//! ## Leaf Chain
//!
//! Leaves are singly linked in ascending key order via `next_leaf`. The
//! value 0 marks the end of the chain; page 0 is permanently the root, so it
//! can never be a legitimate successor. Interior nodes use a different
//! sentinel (`INVALID_PAGE_NUM`) for a missing child.
//!
//! ## Zero-Copy Access
//!
//! `LeafNode` borrows the page immutably and `LeafNodeMut` exclusively. Key
//! and row reads return views into the page buffer; nothing is copied until
//! a caller deserializes a row.

use std::mem::size_of;

use eyre::{ensure, Result};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::config::{
    LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_MAX_CELLS, PAGE_SIZE, ROW_SIZE,
};
use crate::storage::{NodeHeader, NodeType};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct LeafHeader {
    node_type: u8,
    is_root: u8,
    parent: U32,
    num_cells: U32,
    next_leaf: U32,
}

const _: () = assert!(
    size_of::<LeafHeader>() == LEAF_NODE_HEADER_SIZE,
    "leaf header layout mismatch"
);

impl LeafHeader {
    pub fn from_bytes(data: &[u8]) -> Result<&Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for LeafHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );

        Self::ref_from_bytes(&data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read LeafHeader: {:?}", e))
    }

    pub fn from_bytes_mut(data: &mut [u8]) -> Result<&mut Self> {
        ensure!(
            data.len() >= size_of::<Self>(),
            "buffer too small for LeafHeader: {} < {}",
            data.len(),
            size_of::<Self>()
        );

        Self::mut_from_bytes(&mut data[..size_of::<Self>()])
            .map_err(|e| eyre::eyre!("failed to read LeafHeader: {:?}", e))
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
        num_cells: u32,
        next_leaf: u32,
    }
}

/// One leaf cell: a key and the serialized row it owns.
#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct LeafCell {
    key: U32,
    value: [u8; ROW_SIZE],
}

const _: () = assert!(
    size_of::<LeafCell>() == LEAF_NODE_CELL_SIZE,
    "leaf cell layout mismatch"
);

impl LeafCell {
    pub fn key(&self) -> u32 {
        self.key.get()
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

/// Outcome of a key search within one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
    Found(usize),
    /// The key is absent; the payload is its insertion point.
    NotFound(usize),
}

impl SearchResult {
    pub fn index(self) -> usize {
        match self {
            SearchResult::Found(i) | SearchResult::NotFound(i) => i,
        }
    }
}

#[derive(Debug)]
pub struct LeafNode<'a> {
    data: &'a [u8],
}

pub struct LeafNodeMut<'a> {
    data: &'a mut [u8],
}

fn cell_offset(index: usize) -> usize {
    LEAF_NODE_HEADER_SIZE + index * LEAF_NODE_CELL_SIZE
}

impl<'a> LeafNode<'a> {
    pub fn from_page(data: &'a [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        let header = NodeHeader::from_bytes(data)?;
        ensure!(
            header.node_type()? == NodeType::Leaf,
            "expected leaf page, got {:?}",
            header.node_type()?
        );
        Ok(Self { data })
    }

    fn header(&self) -> &LeafHeader {
        LeafHeader::from_bytes(self.data).unwrap()
    }

    pub fn num_cells(&self) -> u32 {
        self.header().num_cells()
    }

    pub fn next_leaf(&self) -> u32 {
        self.header().next_leaf()
    }

    pub fn parent(&self) -> u32 {
        self.header().parent()
    }

    pub fn is_root(&self) -> bool {
        self.header().is_root()
    }

    pub fn cell_at(&self, index: usize) -> Result<&'a LeafCell> {
        ensure!(
            index < self.num_cells() as usize,
            "cell index {} out of bounds (num_cells={})",
            index,
            self.num_cells()
        );
        let offset = cell_offset(index);
        let bytes: &'a [u8] = &self.data[offset..offset + LEAF_NODE_CELL_SIZE];
        LeafCell::ref_from_bytes(bytes)
            .map_err(|e| eyre::eyre!("failed to read leaf cell {}: {:?}", index, e))
    }

    pub fn key_at(&self, index: usize) -> Result<u32> {
        Ok(self.cell_at(index)?.key())
    }

    pub fn value_at(&self, index: usize) -> Result<&'a [u8]> {
        Ok(self.cell_at(index)?.value())
    }

    /// Greatest key in this leaf, or 0 when it is empty.
    pub fn max_key(&self) -> Result<u32> {
        let num_cells = self.num_cells();
        if num_cells == 0 {
            return Ok(0);
        }
        self.key_at(num_cells as usize - 1)
    }

    /// Binary search for `key`. On a miss the reported index is the first
    /// cell whose key is greater, which is also the insertion point.
    pub fn find(&self, key: u32) -> Result<SearchResult> {
        let mut min = 0u32;
        let mut max = self.num_cells();

        while min != max {
            let index = (min + max) / 2;
            let key_at_index = self.key_at(index as usize)?;

            if key == key_at_index {
                return Ok(SearchResult::Found(index as usize));
            }
            if key < key_at_index {
                max = index;
            } else {
                min = index + 1;
            }
        }

        Ok(SearchResult::NotFound(min as usize))
    }
}

impl<'a> LeafNodeMut<'a> {
    pub fn from_page(data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );
        let header = NodeHeader::from_bytes(data)?;
        ensure!(
            header.node_type()? == NodeType::Leaf,
            "expected leaf page, got {:?}",
            header.node_type()?
        );
        Ok(Self { data })
    }

    /// Initializes the page as an empty, non-root leaf with no successor.
    pub fn init(data: &'a mut [u8]) -> Result<Self> {
        ensure!(
            data.len() == PAGE_SIZE,
            "invalid page size: {} != {}",
            data.len(),
            PAGE_SIZE
        );

        let header = LeafHeader::from_bytes_mut(data)?;
        header.set_node_type(NodeType::Leaf);
        header.set_root(false);
        header.set_num_cells(0);
        header.set_next_leaf(0);

        Ok(Self { data })
    }

    fn header(&self) -> &LeafHeader {
        LeafHeader::from_bytes(self.data).unwrap()
    }

    fn header_mut(&mut self) -> &mut LeafHeader {
        LeafHeader::from_bytes_mut(self.data).unwrap()
    }

    pub fn num_cells(&self) -> u32 {
        self.header().num_cells()
    }

    pub fn next_leaf(&self) -> u32 {
        self.header().next_leaf()
    }

    pub fn key_at(&self, index: usize) -> Result<u32> {
        LeafNode::from_page(self.data)?.key_at(index)
    }

    pub fn set_num_cells(&mut self, num_cells: u32) {
        self.header_mut().set_num_cells(num_cells);
    }

    pub fn set_next_leaf(&mut self, page_num: u32) {
        self.header_mut().set_next_leaf(page_num);
    }

    pub fn set_parent(&mut self, page_num: u32) {
        self.header_mut().set_parent(page_num);
    }

    pub fn set_root(&mut self, is_root: bool) {
        self.header_mut().set_root(is_root);
    }

    /// Overwrites the cell slot at `index` without touching `num_cells`.
    pub fn write_cell(&mut self, index: usize, key: u32, value: &[u8]) -> Result<()> {
        ensure!(
            index < LEAF_NODE_MAX_CELLS,
            "cell index {} out of bounds (capacity {})",
            index,
            LEAF_NODE_MAX_CELLS
        );
        ensure!(
            value.len() == ROW_SIZE,
            "row payload must be {} bytes, got {}",
            ROW_SIZE,
            value.len()
        );

        let offset = cell_offset(index);
        self.data[offset..offset + 4].copy_from_slice(&key.to_le_bytes());
        self.data[offset + 4..offset + LEAF_NODE_CELL_SIZE].copy_from_slice(value);
        Ok(())
    }

    /// Inserts a cell at `index`, shifting later cells right by one slot.
    /// The leaf must have room; splitting is the tree's responsibility.
    pub fn insert_cell_at(&mut self, index: usize, key: u32, value: &[u8]) -> Result<()> {
        let num_cells = self.num_cells() as usize;
        ensure!(
            num_cells < LEAF_NODE_MAX_CELLS,
            "leaf is full ({} cells)",
            num_cells
        );
        ensure!(
            index <= num_cells,
            "insert index {} past cell count {}",
            index,
            num_cells
        );

        if index < num_cells {
            let start = cell_offset(index);
            let end = cell_offset(num_cells);
            self.data
                .copy_within(start..end, start + LEAF_NODE_CELL_SIZE);
        }

        self.write_cell(index, key, value)?;
        self.set_num_cells(num_cells as u32 + 1);
        Ok(())
    }
}
