//! # MinnowDB - Single-File B+Tree Table Engine
//!
//! MinnowDB is a persistent key-value table stored in one file as an
//! on-disk B+ tree, driven through a line-oriented REPL. Rows are
//! fixed-shape records `(id, username, email)` keyed by `id`; the engine
//! supports point inserts with duplicate-key rejection and full in-order
//! scans.
//!
//! ## Quick Start
//!
//! ```ignore
//! use minnowdb::{Row, Table};
//!
//! let mut table = Table::open("./my.db")?;
//! table.insert(&Row::new(1, "alice", "alice@example.com"))?;
//!
//! for row in table.select()? {
//!     println!("{}", row);
//! }
//!
//! table.close()?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │          CLI (REPL, parser)         │
//! ├─────────────────────────────────────┤
//! │      Table Facade (open/insert/     │
//! │         select/find/close)          │
//! ├─────────────────────────────────────┤
//! │   B+Tree (search, splits, chain)    │
//! ├─────────────────────────────────────┤
//! │   Pager (demand-loaded 4KB pages,   │
//! │        flush on clean close)        │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Storage Model
//!
//! The database is an array of 4096-byte pages, one node per page, with the
//! root fixed at page 0. Pages are read on first use and written back only
//! when the session ends with `.exit`. The engine is single-threaded and
//! fully synchronous; there are no transactions and no crash safety beyond
//! flush-on-clean-close.
//!
//! ## Module Overview
//!
//! - [`storage`]: the pager and the common node header
//! - [`btree`]: leaf and interior node layouts, search, insert, splits
//! - [`table`]: the engine facade, row codec, and scan cursor
//! - [`cli`]: REPL loop, statement parser, meta commands
//! - [`config`]: page, node, and row layout constants

#[macro_use]
mod macros;

pub mod btree;
pub mod cli;
pub mod config;
pub mod storage;
pub mod table;

pub use table::{Cursor, ExecuteResult, Row, Table};
