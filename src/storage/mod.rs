//! # Storage Module
//!
//! The foundational storage layer: a single database file divided into
//! fixed-size pages, demand-loaded into exclusively owned buffers.
//!
//! ## Architecture Overview
//!
//! The storage layer is deliberately simple. The [`Pager`] owns the open
//! file and an array of up to [`crate::config::TABLE_MAX_PAGES`] resident
//! page buffers. A page is read from disk the first time it is requested and
//! stays resident for the life of the pager. Nothing is written back until
//! the pager is closed, at which point every resident page is flushed in one
//! pass.
//!
//! ```text
//! ┌────────────────────────────────────────────┐
//! │                  Pager                     │
//! │  file ── seek/read on first page access    │
//! │  pages[100] ── Option<Box<[u8; 4096]>>     │
//! │  num_pages ── highest allocated page + 1   │
//! └────────────────────────────────────────────┘
//! ```
//!
//! ## Durability Model
//!
//! There is no write-ahead logging and no mid-session flushing. A session
//! that ends without a clean close loses every mutation made since open.
//! The file length is always a whole multiple of the page size; anything
//! else is rejected at open as corruption.
//!
//! ## Page Identity
//!
//! Pages are addressed by a 32-bit page number. Page 0 is always the tree
//! root. Node-to-node references are stored as page numbers, never as
//! pointers into buffers, so tree reshaping cannot invalidate them.
//!
//! ## Module Organization
//!
//! - `page`: node type byte and the common 6-byte node header
//! - `pager`: the file-backed page store

mod page;
mod pager;

pub use page::{NodeHeader, NodeType};
pub use pager::{PageBuf, Pager, PagerFull};
