//! # Cursor
//!
//! A cursor is a position on the leaf chain: a leaf page, a cell within it,
//! and an end-of-table flag. Advancing walks the current leaf's cells and
//! then follows `next_leaf`, so a cursor started at the smallest key visits
//! every row in ascending key order.
//!
//! A cursor borrows the table exclusively. Any mutation of the table
//! invalidates outstanding positions, and the borrow checker enforces that
//! no cursor survives one.

use eyre::Result;

use crate::btree::LeafNode;

use super::{Row, Table};

pub struct Cursor<'t> {
    table: &'t mut Table,
    page_num: u32,
    cell_num: u32,
    end_of_table: bool,
}

impl<'t> Cursor<'t> {
    pub(crate) fn new(
        table: &'t mut Table,
        page_num: u32,
        cell_num: u32,
        end_of_table: bool,
    ) -> Self {
        Self {
            table,
            page_num,
            cell_num,
            end_of_table,
        }
    }

    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    pub fn cell_num(&self) -> u32 {
        self.cell_num
    }

    pub fn end_of_table(&self) -> bool {
        self.end_of_table
    }

    /// Key of the cell under the cursor.
    pub fn key(&mut self) -> Result<u32> {
        let leaf = LeafNode::from_page(self.table.pager.page(self.page_num)?)?;
        leaf.key_at(self.cell_num as usize)
    }

    /// Deserializes the row under the cursor.
    pub fn row(&mut self) -> Result<Row> {
        let value = {
            let leaf = LeafNode::from_page(self.table.pager.page(self.page_num)?)?;
            leaf.value_at(self.cell_num as usize)?
        };
        Row::from_bytes(value)
    }

    /// Moves to the next cell, hopping to the next leaf when the current one
    /// is exhausted. A `next_leaf` of 0 marks the end of the chain.
    pub fn advance(&mut self) -> Result<()> {
        if self.end_of_table {
            return Ok(());
        }

        let (num_cells, next_leaf) = {
            let leaf = LeafNode::from_page(self.table.pager.page(self.page_num)?)?;
            (leaf.num_cells(), leaf.next_leaf())
        };

        self.cell_num += 1;
        if self.cell_num >= num_cells {
            if next_leaf == 0 {
                self.end_of_table = true;
            } else {
                self.page_num = next_leaf;
                self.cell_num = 0;
            }
        }
        Ok(())
    }
}
