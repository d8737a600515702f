//! Structural invariant checks for the B+ tree.
//!
//! A recursive walker verifies, after arbitrary insert workloads:
//!
//! 1. The root flag is set on page 0 and nowhere else
//! 2. Parent pointers agree with the child lists above them
//! 3. Every interior cell key equals the max key of its child's subtree,
//!    and right-child keys strictly exceed every cell key
//! 4. Keys are strictly ascending within leaves and across the leaf chain
//! 5. The leaf chain visits the same leaves, in the same order, as an
//!    in-order traversal, and ends with `next_leaf == 0`

use std::collections::BTreeSet;

use proptest::prelude::*;
use tempfile::tempdir;

use crate::config::INTERIOR_NODE_MAX_CELLS;
use crate::storage::{NodeHeader, NodeType};
use crate::table::{ExecuteResult, Row, Table};

use super::{InteriorNode, LeafNode};

/// Walks the subtree at `page_num`, asserting structural invariants and
/// appending visited leaves in order. Returns the subtree's max key.
fn check_subtree(
    table: &mut Table,
    page_num: u32,
    expected_parent: Option<u32>,
    leaves: &mut Vec<u32>,
) -> u32 {
    let (node_type, is_root, parent) = {
        let page = table.pager.page(page_num).unwrap();
        let header = NodeHeader::from_bytes(page).unwrap();
        (header.node_type().unwrap(), header.is_root(), header.parent())
    };

    assert_eq!(
        is_root,
        expected_parent.is_none(),
        "root flag mismatch on page {}",
        page_num
    );
    if let Some(expected) = expected_parent {
        assert_eq!(
            parent, expected,
            "page {} records parent {} but hangs off page {}",
            page_num, parent, expected
        );
    }

    match node_type {
        NodeType::Leaf => {
            let keys: Vec<u32> = {
                let leaf = LeafNode::from_page(table.pager.page(page_num).unwrap()).unwrap();
                (0..leaf.num_cells() as usize)
                    .map(|i| leaf.key_at(i).unwrap())
                    .collect()
            };
            for pair in keys.windows(2) {
                assert!(
                    pair[0] < pair[1],
                    "leaf {} keys not strictly ascending: {} then {}",
                    page_num,
                    pair[0],
                    pair[1]
                );
            }
            leaves.push(page_num);
            keys.last().copied().unwrap_or(0)
        }
        NodeType::Interior => {
            let (cells, right_child) = {
                let node = InteriorNode::from_page(table.pager.page(page_num).unwrap()).unwrap();
                let num_keys = node.num_keys() as usize;
                assert!(
                    num_keys <= INTERIOR_NODE_MAX_CELLS,
                    "interior node {} exceeds the cell cap: {}",
                    page_num,
                    num_keys
                );
                assert!(num_keys > 0, "interior node {} has no keys", page_num);
                let cells: Vec<(u32, u32)> = (0..num_keys)
                    .map(|i| (node.child_at(i).unwrap(), node.key_at(i).unwrap()))
                    .collect();
                (cells, node.child_at(num_keys).unwrap())
            };

            let mut previous_key = None;
            for (child, key) in cells {
                let child_max = check_subtree(table, child, Some(page_num), leaves);
                assert_eq!(
                    key, child_max,
                    "interior node {} lists child {} under key {} but its subtree max is {}",
                    page_num, child, key, child_max
                );
                if let Some(previous) = previous_key {
                    assert!(
                        key > previous,
                        "interior node {} keys not strictly ascending",
                        page_num
                    );
                }
                previous_key = Some(key);
            }

            let right_max = check_subtree(table, right_child, Some(page_num), leaves);
            if let Some(previous) = previous_key {
                assert!(
                    right_max > previous,
                    "right child of node {} holds keys not above its cell keys",
                    page_num
                );
            }
            right_max
        }
    }
}

/// Runs the full invariant suite and returns every key in chain order.
fn check_tree_invariants(table: &mut Table) -> Vec<u32> {
    let mut leaves = Vec::new();
    check_subtree(table, table.root_page_num(), None, &mut leaves);

    let mut chain = Vec::new();
    let mut keys = Vec::new();
    let mut current = leaves[0];
    loop {
        chain.push(current);
        let next = {
            let leaf = LeafNode::from_page(table.pager.page(current).unwrap()).unwrap();
            for i in 0..leaf.num_cells() as usize {
                keys.push(leaf.key_at(i).unwrap());
            }
            leaf.next_leaf()
        };
        if next == 0 {
            break;
        }
        current = next;
    }

    assert_eq!(
        chain, leaves,
        "leaf chain order differs from the in-order traversal"
    );
    for pair in keys.windows(2) {
        assert!(
            pair[0] < pair[1],
            "chain keys not strictly ascending: {} then {}",
            pair[0],
            pair[1]
        );
    }

    keys
}

fn test_row(id: u32) -> Row {
    Row::new(id, format!("user{}", id), format!("person{}@example.com", id))
}

#[test]
fn sequential_inserts_keep_the_tree_consistent() {
    let dir = tempdir().unwrap();
    let mut table = Table::open(dir.path().join("test.db")).unwrap();

    for id in 1..=100u32 {
        assert_eq!(table.insert(&test_row(id)).unwrap(), ExecuteResult::Inserted);
    }

    let keys = check_tree_invariants(&mut table);
    assert_eq!(keys, (1..=100).collect::<Vec<u32>>());
}

#[test]
fn reverse_inserts_keep_the_tree_consistent() {
    let dir = tempdir().unwrap();
    let mut table = Table::open(dir.path().join("test.db")).unwrap();

    for id in (1..=100u32).rev() {
        assert_eq!(table.insert(&test_row(id)).unwrap(), ExecuteResult::Inserted);
    }

    let keys = check_tree_invariants(&mut table);
    assert_eq!(keys, (1..=100).collect::<Vec<u32>>());
}

#[test]
fn empty_table_has_a_single_empty_root_leaf() {
    let dir = tempdir().unwrap();
    let mut table = Table::open(dir.path().join("test.db")).unwrap();

    let keys = check_tree_invariants(&mut table);
    assert!(keys.is_empty());
}

#[test]
fn table_full_is_reported_once_pages_run_out() {
    let dir = tempdir().unwrap();
    let mut table = Table::open(dir.path().join("test.db")).unwrap();

    let mut saw_table_full = false;
    for id in 1..=2000u32 {
        match table.insert(&test_row(id)).unwrap() {
            ExecuteResult::Inserted => {}
            ExecuteResult::TableFull => {
                saw_table_full = true;
                break;
            }
            ExecuteResult::DuplicateKey => panic!("unexpected duplicate for id {}", id),
        }
    }

    assert!(saw_table_full, "2000 inserts never exhausted the page budget");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn random_insert_sequences_preserve_invariants(
        ids in prop::collection::vec(0u32..2000, 1..150),
    ) {
        let dir = tempdir().unwrap();
        let mut table = Table::open(dir.path().join("test.db")).unwrap();

        let mut expected = BTreeSet::new();
        for id in &ids {
            let result = table.insert(&test_row(*id)).unwrap();
            if expected.insert(*id) {
                prop_assert_eq!(result, ExecuteResult::Inserted);
            } else {
                prop_assert_eq!(result, ExecuteResult::DuplicateKey);
            }
        }

        let expected: Vec<u32> = expected.into_iter().collect();
        let chain_keys = check_tree_invariants(&mut table);
        prop_assert_eq!(&chain_keys, &expected);

        let selected: Vec<u32> = table.select().unwrap().iter().map(|row| row.id).collect();
        prop_assert_eq!(&selected, &expected);
    }

    #[test]
    fn inserts_survive_close_and_reopen(
        ids in prop::collection::hash_set(0u32..500, 1..60),
    ) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut table = Table::open(&path).unwrap();
            for id in &ids {
                prop_assert_eq!(table.insert(&test_row(*id)).unwrap(), ExecuteResult::Inserted);
            }
            table.close().unwrap();
        }

        let mut expected: Vec<u32> = ids.into_iter().collect();
        expected.sort_unstable();

        let mut table = Table::open(&path).unwrap();
        let chain_keys = check_tree_invariants(&mut table);
        prop_assert_eq!(&chain_keys, &expected);

        let rows = table.select().unwrap();
        let selected: Vec<u32> = rows.iter().map(|row| row.id).collect();
        prop_assert_eq!(&selected, &expected);
    }
}
