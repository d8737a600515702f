//! # MinnowDB Layout Constants
//!
//! This module centralizes the page, node, and row layout constants. The
//! values are interdependent; derived constants are spelled out next to the
//! values they derive from and guarded by compile-time assertions so a change
//! to one cannot silently skew the others.
//!
//! ## Dependency Graph
//!
//! ```text
//! PAGE_SIZE (4096 bytes)
//!       │
//!       ├─> LEAF_NODE_SPACE_FOR_CELLS (PAGE_SIZE - LEAF_NODE_HEADER_SIZE)
//!       │         │
//!       │         └─> LEAF_NODE_MAX_CELLS (floor(space / cell size) = 13)
//!       │                   │
//!       │                   └─> LEAF_NODE_LEFT/RIGHT_SPLIT_COUNT (7 / 7)
//!       │
//!       └─> TABLE_MAX_PAGES (100) bounds the resident page array
//!
//! ROW_SIZE (293 bytes)
//!       │
//!       └─> LEAF_NODE_CELL_SIZE (key + row = 297)
//! ```
//!
//! ## Node Header Layout
//!
//! Every node starts with the 6-byte common header:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----------
//! 0       1     node type (0 = interior, 1 = leaf)
//! 1       1     is-root flag
//! 2       4     parent page number
//! ```
//!
//! Leaves extend it with `num_cells` and `next_leaf`; interior nodes with
//! `num_keys` and `right_child`. Both extended headers are 14 bytes.

// ============================================================================
// PAGE GEOMETRY
// ============================================================================

/// Size of each database page in bytes. This is the unit of I/O and of cache
/// residency; every page holds exactly one node.
pub const PAGE_SIZE: usize = 4096;

/// Upper bound on the number of pages a table file may hold.
pub const TABLE_MAX_PAGES: usize = 100;

/// Sentinel page number meaning "no such page". Used by interior nodes for a
/// missing child; never a valid page index.
pub const INVALID_PAGE_NUM: u32 = u32::MAX;

// ============================================================================
// ROW LAYOUT
// Fixed-shape rows: (id: u32, username, email), NUL-padded text fields
// ============================================================================

/// Maximum username length in bytes, excluding the NUL terminator.
pub const COLUMN_USERNAME_SIZE: usize = 32;

/// Maximum email length in bytes, excluding the NUL terminator.
pub const COLUMN_EMAIL_SIZE: usize = 255;

pub const ID_SIZE: usize = 4;
pub const USERNAME_SIZE: usize = COLUMN_USERNAME_SIZE + 1;
pub const EMAIL_SIZE: usize = COLUMN_EMAIL_SIZE + 1;

pub const ID_OFFSET: usize = 0;
pub const USERNAME_OFFSET: usize = ID_OFFSET + ID_SIZE;
pub const EMAIL_OFFSET: usize = USERNAME_OFFSET + USERNAME_SIZE;

/// Serialized row size: 4 + 33 + 256.
pub const ROW_SIZE: usize = ID_SIZE + USERNAME_SIZE + EMAIL_SIZE;

const _: () = assert!(ROW_SIZE == 293, "row layout derivation mismatch");

// ============================================================================
// COMMON NODE HEADER
// ============================================================================

pub const NODE_TYPE_SIZE: usize = 1;
pub const IS_ROOT_SIZE: usize = 1;
pub const PARENT_POINTER_SIZE: usize = 4;

pub const COMMON_NODE_HEADER_SIZE: usize = NODE_TYPE_SIZE + IS_ROOT_SIZE + PARENT_POINTER_SIZE;

// ============================================================================
// LEAF NODE LAYOUT
// ============================================================================

/// Leaf header: common header + num_cells + next_leaf.
pub const LEAF_NODE_HEADER_SIZE: usize = COMMON_NODE_HEADER_SIZE + 4 + 4;

pub const LEAF_NODE_KEY_SIZE: usize = 4;
pub const LEAF_NODE_VALUE_SIZE: usize = ROW_SIZE;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;

pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;

/// How many cells fit in one leaf page.
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

/// Cell counts after a leaf split. The incoming cell is counted, so the two
/// halves together hold `LEAF_NODE_MAX_CELLS + 1` cells.
pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) / 2;
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize =
    (LEAF_NODE_MAX_CELLS + 1) - LEAF_NODE_RIGHT_SPLIT_COUNT;

const _: () = assert!(LEAF_NODE_MAX_CELLS == 13, "leaf capacity derivation mismatch");

const _: () = assert!(
    LEAF_NODE_LEFT_SPLIT_COUNT + LEAF_NODE_RIGHT_SPLIT_COUNT == LEAF_NODE_MAX_CELLS + 1,
    "leaf split counts must cover every cell plus the incoming one"
);

const _: () = assert!(
    LEAF_NODE_HEADER_SIZE + LEAF_NODE_MAX_CELLS * LEAF_NODE_CELL_SIZE <= PAGE_SIZE,
    "leaf cells must fit within a page"
);

// ============================================================================
// INTERIOR NODE LAYOUT
// ============================================================================

/// Interior header: common header + num_keys + right_child.
pub const INTERIOR_NODE_HEADER_SIZE: usize = COMMON_NODE_HEADER_SIZE + 4 + 4;

pub const INTERIOR_NODE_KEY_SIZE: usize = 4;
pub const INTERIOR_NODE_CHILD_SIZE: usize = 4;
pub const INTERIOR_NODE_CELL_SIZE: usize = INTERIOR_NODE_CHILD_SIZE + INTERIOR_NODE_KEY_SIZE;

/// Hard cap on interior cells. Deliberately tiny so that interior splits are
/// exercised by small datasets.
pub const INTERIOR_NODE_MAX_CELLS: usize = 3;

const _: () = assert!(
    INTERIOR_NODE_HEADER_SIZE + (INTERIOR_NODE_MAX_CELLS + 1) * INTERIOR_NODE_CELL_SIZE
        <= PAGE_SIZE,
    "interior cells must fit within a page"
);
