//! # B+Tree Operations
//!
//! Tree-wide search and insertion over pages owned by the pager. All
//! node-to-node references are page numbers; the tree re-fetches a page for
//! every access, so reshaping operations can never hold a stale view.
//!
//! ## Structure
//!
//! ```text
//!                    [interior, page 0]          <- root, fixed at page 0
//!                    /        |        \
//!           [leaf 2]     [leaf 3]     [leaf 1]
//!              └────────────>└───────────>┘         next_leaf chain
//! ```
//!
//! All rows live in leaves; interior nodes carry (child, max-key-of-subtree)
//! cells plus a right child for keys greater than every cell key. Leaves are
//! chained in key order for scans.
//!
//! ## Insert Algorithm
//!
//! ```text
//! 1. Descend from the root, routing by max key, to the target leaf
//! 2. Reject the key if the landing cell already holds it
//! 3. Room in the leaf: shift-insert the cell, done
//! 4. Leaf full: split. Lower 7 cells stay left, upper 7 move to a fresh
//!    right sibling spliced into the leaf chain
//! 5. Root leaf split: create-new-root copies the old root aside and turns
//!    page 0 into an interior node over the two halves
//! 6. Non-root split: rewrite the parent's key for the left half and insert
//!    the new sibling, splitting interior nodes upward as needed
//! ```
//!
//! The interior split moves the upper half of a full node into a fresh
//! sibling, promotes the highest remaining child to right child, routes the
//! pending insertion into whichever half now covers it, and repairs the
//! parent key. At most one split happens per level, so a single insert
//! touches a bounded number of pages.
//!
//! ## Root Identity
//!
//! The root always lives at page 0. Splitting the root therefore copies its
//! contents to a fresh page (the new left child) and reinitializes page 0 in
//! place, rather than moving the root pointer.

use std::fmt::Write;

use eyre::{ensure, Result};
use tracing::debug;

use crate::config::{
    INTERIOR_NODE_MAX_CELLS, INVALID_PAGE_NUM, LEAF_NODE_LEFT_SPLIT_COUNT, LEAF_NODE_MAX_CELLS,
    LEAF_NODE_RIGHT_SPLIT_COUNT, ROW_SIZE,
};
use crate::storage::{NodeHeader, NodeType, Pager};

use super::interior::{InteriorNode, InteriorNodeMut};
use super::leaf::{LeafNode, LeafNodeMut, SearchResult};

/// Outcome of a tree insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertResult {
    Inserted,
    DuplicateKey,
}

#[derive(Debug)]
pub struct BTree<'a> {
    pager: &'a mut Pager,
    root_page: u32,
}

impl<'a> BTree<'a> {
    pub fn new(pager: &'a mut Pager, root_page: u32) -> Self {
        Self { pager, root_page }
    }

    fn node_type(&mut self, page_num: u32) -> Result<NodeType> {
        let page = self.pager.page(page_num)?;
        NodeHeader::from_bytes(page)?.node_type()
    }

    fn parent_of(&mut self, page_num: u32) -> Result<u32> {
        let page = self.pager.page(page_num)?;
        Ok(NodeHeader::from_bytes(page)?.parent())
    }

    fn set_parent(&mut self, page_num: u32, parent: u32) -> Result<()> {
        let page = self.pager.page_mut(page_num)?;
        NodeHeader::from_bytes_mut(page)?.set_parent(parent);
        Ok(())
    }

    /// Greatest key reachable from `page_num`: the last cell of a leaf, or
    /// the max of the right-child subtree of an interior node.
    pub fn max_key(&mut self, page_num: u32) -> Result<u32> {
        let right_child = {
            let page = self.pager.page(page_num)?;
            match NodeHeader::from_bytes(page)?.node_type()? {
                NodeType::Leaf => return LeafNode::from_page(page)?.max_key(),
                NodeType::Interior => {
                    let node = InteriorNode::from_page(page)?;
                    node.child_at(node.num_keys() as usize)?
                }
            }
        };
        self.max_key(right_child)
    }

    /// Descends to the leaf that holds `key` or would hold it, returning
    /// `(page_num, cell_num)`. The cell is either the match or the
    /// insertion point.
    pub fn find(&mut self, key: u32) -> Result<(u32, u32)> {
        let mut current = self.root_page;

        loop {
            let next = {
                let page = self.pager.page(current)?;
                match NodeHeader::from_bytes(page)?.node_type()? {
                    NodeType::Leaf => {
                        let leaf = LeafNode::from_page(page)?;
                        let cell = leaf.find(key)?.index();
                        return Ok((current, cell as u32));
                    }
                    NodeType::Interior => {
                        let node = InteriorNode::from_page(page)?;
                        let child_index = node.find_child_index(key)?;
                        node.child_at(child_index as usize)?
                    }
                }
            };
            current = next;
        }
    }

    /// Inserts `(key, value)` unless the key is already present.
    pub fn insert(&mut self, key: u32, value: &[u8]) -> Result<InsertResult> {
        ensure!(
            value.len() == ROW_SIZE,
            "row payload must be {} bytes, got {}",
            ROW_SIZE,
            value.len()
        );

        let (leaf_page, cell_num) = self.find(key)?;

        let existing = {
            let leaf = LeafNode::from_page(self.pager.page(leaf_page)?)?;
            if cell_num < leaf.num_cells() {
                Some(leaf.key_at(cell_num as usize)?)
            } else {
                None
            }
        };
        if existing == Some(key) {
            return Ok(InsertResult::DuplicateKey);
        }

        self.leaf_insert(leaf_page, cell_num, key, value)?;
        Ok(InsertResult::Inserted)
    }

    fn leaf_insert(&mut self, page_num: u32, cell_num: u32, key: u32, value: &[u8]) -> Result<()> {
        let num_cells = {
            let leaf = LeafNode::from_page(self.pager.page(page_num)?)?;
            leaf.num_cells() as usize
        };

        if num_cells >= LEAF_NODE_MAX_CELLS {
            return self.split_leaf(page_num, cell_num, key, value);
        }

        let page = self.pager.page_mut(page_num)?;
        let mut leaf = LeafNodeMut::from_page(page)?;
        leaf.insert_cell_at(cell_num as usize, key, value)
    }

    /// Splits a full leaf around an incoming cell. The lower half stays in
    /// place, the upper half moves to a fresh sibling spliced into the leaf
    /// chain, and the parent is repaired (or created, for the root).
    fn split_leaf(&mut self, page_num: u32, cell_num: u32, key: u32, value: &[u8]) -> Result<()> {
        let new_page = self.pager.allocate_page()?;
        debug!(page_num, new_page, key, "splitting leaf");

        let (old_max, parent, old_next_leaf, was_root, mut cells) = {
            let leaf = LeafNode::from_page(self.pager.page(page_num)?)?;
            let num_cells = leaf.num_cells() as usize;
            ensure!(
                num_cells == LEAF_NODE_MAX_CELLS,
                "splitting a leaf that is not full ({} cells)",
                num_cells
            );
            ensure!(
                cell_num as usize <= num_cells,
                "split insertion point {} past cell count {}",
                cell_num,
                num_cells
            );

            let mut cells: Vec<(u32, Vec<u8>)> = Vec::with_capacity(num_cells + 1);
            for i in 0..num_cells {
                cells.push((leaf.key_at(i)?, leaf.value_at(i)?.to_vec()));
            }
            (
                leaf.max_key()?,
                leaf.parent(),
                leaf.next_leaf(),
                leaf.is_root(),
                cells,
            )
        };

        cells.insert(cell_num as usize, (key, value.to_vec()));

        {
            let page = self.pager.page_mut(page_num)?;
            let mut left = LeafNodeMut::from_page(page)?;
            for (i, (k, v)) in cells[..LEAF_NODE_LEFT_SPLIT_COUNT].iter().enumerate() {
                left.write_cell(i, *k, v)?;
            }
            left.set_num_cells(LEAF_NODE_LEFT_SPLIT_COUNT as u32);
            left.set_next_leaf(new_page);
        }

        {
            let page = self.pager.page_mut(new_page)?;
            let mut right = LeafNodeMut::init(page)?;
            right.set_parent(parent);
            right.set_next_leaf(old_next_leaf);
            for (i, (k, v)) in cells[LEAF_NODE_LEFT_SPLIT_COUNT..].iter().enumerate() {
                right.write_cell(i, *k, v)?;
            }
            right.set_num_cells(LEAF_NODE_RIGHT_SPLIT_COUNT as u32);
        }

        if was_root {
            return self.create_new_root(new_page);
        }

        let new_max = self.max_key(page_num)?;
        {
            let page = self.pager.page_mut(parent)?;
            let mut node = InteriorNodeMut::from_page(page)?;
            node.update_key(old_max, new_max)?;
        }
        self.interior_insert(parent, new_page)
    }

    /// Rebuilds page 0 as an interior root over its former contents (moved
    /// to a fresh left child) and `right_child_page`.
    fn create_new_root(&mut self, right_child_page: u32) -> Result<()> {
        let root_page = self.root_page;
        let root_was_interior = self.node_type(root_page)? == NodeType::Interior;

        let left_page = self.pager.allocate_page()?;
        debug!(left_page, right_child_page, "creating new root");

        // A leaf right child was already initialized by the leaf split; a
        // fresh interior sibling has not been yet.
        if root_was_interior {
            let page = self.pager.page_mut(right_child_page)?;
            InteriorNodeMut::init(page)?;
        }

        let snapshot = *self.pager.page(root_page)?;
        {
            let page = self.pager.page_mut(left_page)?;
            *page = snapshot;
            NodeHeader::from_bytes_mut(page)?.set_root(false);
        }

        if root_was_interior {
            // Children of the displaced root now hang off the left page.
            let children = {
                let node = InteriorNode::from_page(self.pager.page(left_page)?)?;
                let num_keys = node.num_keys() as usize;
                let mut children = Vec::with_capacity(num_keys + 1);
                for i in 0..=num_keys {
                    children.push(node.child_at(i)?);
                }
                children
            };
            for child in children {
                self.set_parent(child, left_page)?;
            }
        }

        let left_max = self.max_key(left_page)?;
        {
            let page = self.pager.page_mut(root_page)?;
            let mut root = InteriorNodeMut::init(page)?;
            root.set_root(true);
            root.insert_cell_at(0, left_page, left_max)?;
            root.set_right_child(right_child_page);
        }

        self.set_parent(left_page, root_page)?;
        self.set_parent(right_child_page, root_page)
    }

    /// Records `child_page` in the interior node at `parent_page`, keyed by
    /// the child's max key. A full parent splits instead.
    fn interior_insert(&mut self, parent_page: u32, child_page: u32) -> Result<()> {
        let child_max = self.max_key(child_page)?;

        let (index, num_keys, right_child) = {
            let node = InteriorNode::from_page(self.pager.page(parent_page)?)?;
            (
                node.find_child_index(child_max)?,
                node.num_keys(),
                node.right_child(),
            )
        };

        if num_keys as usize >= INTERIOR_NODE_MAX_CELLS {
            return self.split_interior(parent_page, child_page);
        }

        // An interior node with an unset right child is empty; this state
        // only exists while a split is redistributing children.
        if right_child == INVALID_PAGE_NUM {
            let page = self.pager.page_mut(parent_page)?;
            InteriorNodeMut::from_page(page)?.set_right_child(child_page);
            return self.set_parent(child_page, parent_page);
        }

        let right_max = self.max_key(right_child)?;
        if child_max > right_max {
            // The new child becomes the right child; the old right child
            // joins the cell array under its own max key.
            {
                let page = self.pager.page_mut(parent_page)?;
                let mut node = InteriorNodeMut::from_page(page)?;
                node.insert_cell_at(num_keys as usize, right_child, right_max)?;
                node.set_right_child(child_page);
            }
            self.set_parent(child_page, parent_page)?;
            self.set_parent(right_child, parent_page)
        } else {
            {
                let page = self.pager.page_mut(parent_page)?;
                let mut node = InteriorNodeMut::from_page(page)?;
                node.insert_cell_at(index as usize, child_page, child_max)?;
            }
            self.set_parent(child_page, parent_page)
        }
    }

    /// Splits a full interior node while inserting `child_page`. Cascades to
    /// the parent when the sibling registration finds it full too, at most
    /// once per level.
    fn split_interior(&mut self, page_num: u32, child_page: u32) -> Result<()> {
        let mut old_page = page_num;
        let old_max = self.max_key(old_page)?;
        let child_max = self.max_key(child_page)?;
        let new_page = self.pager.allocate_page()?;
        let splitting_root = {
            let page = self.pager.page(old_page)?;
            NodeHeader::from_bytes(page)?.is_root()
        };
        debug!(old_page, new_page, splitting_root, "splitting interior node");

        let parent_page = if splitting_root {
            // The root's contents moved to the new left child; keep working
            // there, with page 0 as the parent.
            self.create_new_root(new_page)?;
            let root = InteriorNode::from_page(self.pager.page(self.root_page)?)?;
            old_page = root.cell_at(0)?.child();
            self.root_page
        } else {
            let parent = self.parent_of(old_page)?;
            let page = self.pager.page_mut(new_page)?;
            InteriorNodeMut::init(page)?;
            parent
        };

        // The old right child moves over first, then every cell above the
        // midpoint, leaving the old node with the lower half.
        let old_right_child = {
            let node = InteriorNode::from_page(self.pager.page(old_page)?)?;
            node.child_at(node.num_keys() as usize)?
        };
        self.interior_insert(new_page, old_right_child)?;
        {
            let page = self.pager.page_mut(old_page)?;
            InteriorNodeMut::from_page(page)?.set_right_child(INVALID_PAGE_NUM);
        }

        for i in ((INTERIOR_NODE_MAX_CELLS / 2 + 1)..INTERIOR_NODE_MAX_CELLS).rev() {
            let moved = {
                let node = InteriorNode::from_page(self.pager.page(old_page)?)?;
                node.child_at(i)?
            };
            self.interior_insert(new_page, moved)?;

            let page = self.pager.page_mut(old_page)?;
            let mut node = InteriorNodeMut::from_page(page)?;
            let num_keys = node.num_keys();
            node.set_num_keys(num_keys - 1);
        }

        // Promote the highest remaining child to right child.
        {
            let page = self.pager.page_mut(old_page)?;
            let mut node = InteriorNodeMut::from_page(page)?;
            let num_keys = node.num_keys();
            let promoted = node.cell_at(num_keys as usize - 1)?.child();
            node.set_right_child(promoted);
            node.set_num_keys(num_keys - 1);
        }

        // Route the pending child into whichever half now covers its key.
        let max_after_split = self.max_key(old_page)?;
        let destination = if child_max < max_after_split {
            old_page
        } else {
            new_page
        };
        self.interior_insert(destination, child_page)?;

        let new_old_max = self.max_key(old_page)?;
        {
            let page = self.pager.page_mut(parent_page)?;
            InteriorNodeMut::from_page(page)?.update_key(old_max, new_old_max)?;
        }

        if !splitting_root {
            // Register the new sibling with the parent; its parent pointer
            // is set by whichever insertion path receives it.
            let parent = self.parent_of(old_page)?;
            self.interior_insert(parent, new_page)?;
        }

        Ok(())
    }

    /// Renders the tree as an indented diagram, three spaces per level.
    pub fn render(&mut self) -> Result<String> {
        let mut out = String::new();
        self.render_node(self.root_page, 0, &mut out)?;
        Ok(out)
    }

    fn render_node(&mut self, page_num: u32, depth: usize, out: &mut String) -> Result<()> {
        match self.node_type(page_num)? {
            NodeType::Leaf => {
                let keys = {
                    let leaf = LeafNode::from_page(self.pager.page(page_num)?)?;
                    let mut keys = Vec::with_capacity(leaf.num_cells() as usize);
                    for i in 0..leaf.num_cells() as usize {
                        keys.push(leaf.key_at(i)?);
                    }
                    keys
                };

                indent(out, depth);
                let _ = writeln!(out, "- leaf (size {})", keys.len());
                for key in keys {
                    indent(out, depth + 1);
                    let _ = writeln!(out, "- {}", key);
                }
            }
            NodeType::Interior => {
                let (children, keys, right_child) = {
                    let node = InteriorNode::from_page(self.pager.page(page_num)?)?;
                    let num_keys = node.num_keys() as usize;
                    let mut children = Vec::with_capacity(num_keys);
                    let mut keys = Vec::with_capacity(num_keys);
                    for i in 0..num_keys {
                        children.push(node.child_at(i)?);
                        keys.push(node.key_at(i)?);
                    }
                    let right_child = if num_keys > 0 {
                        Some(node.child_at(num_keys)?)
                    } else {
                        None
                    };
                    (children, keys, right_child)
                };

                indent(out, depth);
                let _ = writeln!(out, "- internal (size {})", keys.len());
                for (child, key) in children.into_iter().zip(keys) {
                    self.render_node(child, depth + 1, out)?;
                    indent(out, depth + 1);
                    let _ = writeln!(out, "- key {}", key);
                }
                if let Some(right_child) = right_child {
                    self.render_node(right_child, depth + 1, out)?;
                }
            }
        }
        Ok(())
    }
}

fn indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str("   ");
    }
}
