//! # Table Facade
//!
//! The public face of the storage engine. A [`Table`] pairs the pager with
//! the root page number (always 0) and exposes the five operations everything
//! else is built from: open, close, insert, point find, and scan start.
//!
//! ## Lifecycle
//!
//! Opening an empty file initializes page 0 as an empty root leaf. Rows are
//! only ever created, never mutated or destroyed. Closing flushes every
//! resident page; a session that ends any other way persists nothing.
//!
//! ## Outcomes vs. Failures
//!
//! Statement-level outcomes the caller is expected to handle (duplicate key,
//! table full) are [`ExecuteResult`] variants. Everything else that can go
//! wrong is an error to be treated as fatal.

mod cursor;
mod row;

pub use cursor::Cursor;
pub use row::Row;

use std::path::Path;

use eyre::Result;

use crate::btree::{BTree, InsertResult, LeafNode, LeafNodeMut};
use crate::storage::{Pager, PagerFull};

/// Outcome of executing a statement against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteResult {
    Inserted,
    DuplicateKey,
    TableFull,
}

pub struct Table {
    root_page_num: u32,
    pub(crate) pager: Pager,
}

impl Table {
    /// Opens the database file, initializing an empty root leaf when the
    /// file is brand new.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut pager = Pager::open(path)?;

        if pager.num_pages() == 0 {
            let page = pager.page_mut(0)?;
            let mut root = LeafNodeMut::init(page)?;
            root.set_root(true);
        }

        Ok(Self {
            root_page_num: 0,
            pager,
        })
    }

    /// Flushes every resident page and syncs the file. The table should not
    /// be used afterwards.
    pub fn close(&mut self) -> Result<()> {
        self.pager.close()
    }

    pub fn root_page_num(&self) -> u32 {
        self.root_page_num
    }

    /// Inserts a row keyed by its id.
    pub fn insert(&mut self, row: &Row) -> Result<ExecuteResult> {
        let value = row.to_bytes()?;
        let mut tree = BTree::new(&mut self.pager, self.root_page_num);

        match tree.insert(row.id, &value) {
            Ok(InsertResult::Inserted) => Ok(ExecuteResult::Inserted),
            Ok(InsertResult::DuplicateKey) => Ok(ExecuteResult::DuplicateKey),
            Err(e) if e.downcast_ref::<PagerFull>().is_some() => Ok(ExecuteResult::TableFull),
            Err(e) => Err(e),
        }
    }

    /// Every row in ascending id order.
    pub fn select(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        let mut cursor = self.start()?;
        while !cursor.end_of_table() {
            rows.push(cursor.row()?);
            cursor.advance()?;
        }
        Ok(rows)
    }

    /// Cursor positioned at `key`, or at the slot where it would go.
    pub fn find(&mut self, key: u32) -> Result<Cursor<'_>> {
        let (page_num, cell_num) =
            BTree::new(&mut self.pager, self.root_page_num).find(key)?;
        Ok(Cursor::new(self, page_num, cell_num, false))
    }

    /// Cursor at the smallest key; end-of-table when the table is empty.
    pub fn start(&mut self) -> Result<Cursor<'_>> {
        let (page_num, cell_num) =
            BTree::new(&mut self.pager, self.root_page_num).find(0)?;

        let empty = {
            let leaf = LeafNode::from_page(self.pager.page(page_num)?)?;
            leaf.num_cells() == 0
        };

        Ok(Cursor::new(self, page_num, cell_num, empty))
    }

    /// Indented diagram of the tree, for the `.btree` meta command.
    pub fn tree_diagram(&mut self) -> Result<String> {
        BTree::new(&mut self.pager, self.root_page_num).render()
    }
}
