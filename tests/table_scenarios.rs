//! # End-to-End Table Scenarios
//!
//! Drives the engine the way the REPL does, one input line at a time, and
//! asserts the exact output lines. Covers the single-leaf cases, leaf and
//! interior splits, duplicate rejection, parser errors, and persistence
//! across close and reopen.

use tempfile::tempdir;
use minnowdb::cli::{dispatch, Dispatch};
use minnowdb::{ExecuteResult, Row, Table};

fn create_test_table(dir: &tempfile::TempDir) -> Table {
    Table::open(dir.path().join("test.db")).unwrap()
}

fn run_line(table: &mut Table, input: &str) -> Vec<String> {
    match dispatch(table, input).unwrap() {
        Dispatch::Output(lines) => lines,
        Dispatch::Exit => panic!("unexpected exit from '{}'", input),
    }
}

mod single_leaf {
    use super::*;

    #[test]
    fn insert_and_select_one_row() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        assert_eq!(
            run_line(&mut table, "insert 1 user1 person1@example.com"),
            vec!["Executed."]
        );
        assert_eq!(
            run_line(&mut table, "select"),
            vec!["(1, user1, person1@example.com)", "Executed."]
        );
    }

    #[test]
    fn duplicate_key_leaves_the_table_unchanged() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        run_line(&mut table, "insert 1 user1 person1@example.com");
        assert_eq!(
            run_line(&mut table, "insert 1 user1 person1@example.com"),
            vec!["Error: Duplicate key."]
        );
        assert_eq!(
            run_line(&mut table, "select"),
            vec!["(1, user1, person1@example.com)", "Executed."]
        );
    }

    #[test]
    fn oversize_string_inserts_nothing() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        let long_username = "a".repeat(33);
        assert_eq!(
            run_line(&mut table, &format!("insert 1 {} foo@bar", long_username)),
            vec!["String is too long."]
        );
        assert_eq!(run_line(&mut table, "select"), vec!["Executed."]);
    }

    #[test]
    fn negative_id_is_rejected() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        assert_eq!(
            run_line(&mut table, "insert -1 foo bar"),
            vec!["ID must be positive."]
        );
        assert_eq!(run_line(&mut table, "select"), vec!["Executed."]);
    }

    #[test]
    fn rows_come_back_sorted_regardless_of_insert_order() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        for id in [3u32, 1, 2] {
            run_line(
                &mut table,
                &format!("insert {} user{} person{}@example.com", id, id, id),
            );
        }

        assert_eq!(
            run_line(&mut table, "select"),
            vec![
                "(1, user1, person1@example.com)",
                "(2, user2, person2@example.com)",
                "(3, user3, person3@example.com)",
                "Executed.",
            ]
        );
    }
}

mod splits {
    use super::*;

    #[test]
    fn fourteen_rows_split_the_root_leaf() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        for id in 1..=14u32 {
            assert_eq!(
                run_line(
                    &mut table,
                    &format!("insert {} user{} person{}@example.com", id, id, id)
                ),
                vec!["Executed."]
            );
        }

        let mut expected = vec!["- internal (size 1)".to_string(), "   - leaf (size 7)".to_string()];
        expected.extend((1..=7).map(|k| format!("      - {}", k)));
        expected.push("   - key 7".to_string());
        expected.push("   - leaf (size 7)".to_string());
        expected.extend((8..=14).map(|k| format!("      - {}", k)));

        assert_eq!(run_line(&mut table, ".btree"), expected);

        let select_output = run_line(&mut table, "select");
        assert_eq!(select_output.len(), 15);
        for (i, id) in (1..=14u32).enumerate() {
            assert_eq!(
                select_output[i],
                format!("({}, user{}, person{}@example.com)", id, id, id)
            );
        }
    }

    #[test]
    fn sixty_rows_build_a_multi_level_tree() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        for id in 1..=60u32 {
            table
                .insert(&Row::new(id, format!("user{}", id), "e@x.com"))
                .unwrap();
        }

        let diagram = run_line(&mut table, ".btree");
        assert!(diagram[0].starts_with("- internal"));
        assert!(
            diagram.iter().any(|line| line.starts_with("   - internal")),
            "expected a nested interior node:\n{}",
            diagram.join("\n")
        );

        let ids: Vec<u32> = table.select().unwrap().iter().map(|row| row.id).collect();
        assert_eq!(ids, (1..=60).collect::<Vec<u32>>());
    }

    #[test]
    fn scan_follows_the_leaf_chain_in_key_order() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        let ids: Vec<u32> = (1..=40).map(|i| (i * 17) % 97).collect();
        for id in &ids {
            table.insert(&Row::new(*id, "u", "e")).unwrap();
        }

        let mut cursor = table.start().unwrap();
        let mut seen = Vec::new();
        while !cursor.end_of_table() {
            seen.push(cursor.key().unwrap());
            cursor.advance().unwrap();
        }

        let mut expected = ids.clone();
        expected.sort_unstable();
        assert_eq!(seen, expected);
    }
}

mod persistence {
    use super::*;

    #[test]
    fn rows_survive_close_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut table = Table::open(&path).unwrap();
            run_line(&mut table, "insert 1 user1 person1@example.com");
            run_line(&mut table, "insert 2 user2 person2@example.com");
            table.close().unwrap();
        }

        let mut table = Table::open(&path).unwrap();
        assert_eq!(
            run_line(&mut table, "select"),
            vec![
                "(1, user1, person1@example.com)",
                "(2, user2, person2@example.com)",
                "Executed.",
            ]
        );
    }

    #[test]
    fn a_split_tree_survives_close_and_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let before = {
            let mut table = Table::open(&path).unwrap();
            for id in 1..=14u32 {
                table
                    .insert(&Row::new(id, format!("user{}", id), "e@x.com"))
                    .unwrap();
            }
            let diagram = run_line(&mut table, ".btree");
            table.close().unwrap();
            diagram
        };

        let mut table = Table::open(&path).unwrap();
        assert_eq!(run_line(&mut table, ".btree"), before);

        let ids: Vec<u32> = table.select().unwrap().iter().map(|row| row.id).collect();
        assert_eq!(ids, (1..=14).collect::<Vec<u32>>());
    }

    #[test]
    fn duplicate_rejection_still_holds_after_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut table = Table::open(&path).unwrap();
            table
                .insert(&Row::new(7, "user7", "person7@example.com"))
                .unwrap();
            table.close().unwrap();
        }

        let mut table = Table::open(&path).unwrap();
        assert_eq!(
            table
                .insert(&Row::new(7, "other", "other@example.com"))
                .unwrap(),
            ExecuteResult::DuplicateKey
        );
    }

    #[test]
    fn file_length_is_a_whole_number_of_pages_after_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut table = Table::open(&path).unwrap();
            for id in 1..=20u32 {
                table.insert(&Row::new(id, "u", "e")).unwrap();
            }
            table.close().unwrap();
        }

        let len = std::fs::metadata(&path).unwrap().len();
        assert!(len > 0);
        assert_eq!(len % 4096, 0);
    }
}

mod meta_commands {
    use super::*;

    #[test]
    fn constants_prints_the_layout_block() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        assert_eq!(
            run_line(&mut table, ".constants"),
            vec![
                "Constants:",
                "ROW_SIZE: 293",
                "COMMON_NODE_HEADER_SIZE: 6",
                "LEAF_NODE_HEADER_SIZE: 14",
                "LEAF_NODE_CELL_SIZE: 297",
                "LEAF_NODE_SPACE_FOR_CELLS: 4082",
                "LEAF_NODE_MAX_CELLS: 13",
            ]
        );
    }

    #[test]
    fn btree_on_an_empty_table_shows_the_empty_root_leaf() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        assert_eq!(run_line(&mut table, ".btree"), vec!["- leaf (size 0)"]);
    }

    #[test]
    fn unknown_meta_command_is_reported() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        assert_eq!(
            run_line(&mut table, ".schema"),
            vec!["Unrecognized command '.schema'."]
        );
    }

    #[test]
    fn exit_is_signalled_to_the_caller() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        assert_eq!(dispatch(&mut table, ".exit").unwrap(), Dispatch::Exit);
    }
}
