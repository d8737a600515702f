//! # Meta Command Handler
//!
//! Parses and executes the dot commands. Meta commands start with a period
//! and act on the session rather than the data.
//!
//! | Command      | Description                             |
//! |--------------|-----------------------------------------|
//! | `.exit`      | Flush, close, and leave the REPL        |
//! | `.btree`     | Print the tree structure from the root  |
//! | `.constants` | Print the storage layout constants      |
//!
//! Each command resolves to a [`CommandResult`]: text to display, an exit
//! signal, or an error line for an unrecognized command. Fatal storage
//! failures while rendering the tree propagate as errors.

use eyre::Result;

use crate::config::{
    COMMON_NODE_HEADER_SIZE, LEAF_NODE_CELL_SIZE, LEAF_NODE_HEADER_SIZE, LEAF_NODE_MAX_CELLS,
    LEAF_NODE_SPACE_FOR_CELLS, ROW_SIZE,
};
use crate::table::Table;

#[derive(Debug, PartialEq, Eq)]
pub enum CommandResult {
    Output(String),
    Exit,
    Error(String),
}

pub struct CommandHandler;

impl CommandHandler {
    pub fn is_command(input: &str) -> bool {
        input.starts_with('.')
    }

    pub fn execute(input: &str, table: &mut Table) -> Result<CommandResult> {
        match input {
            ".exit" => Ok(CommandResult::Exit),
            ".btree" => {
                let diagram = table.tree_diagram()?;
                Ok(CommandResult::Output(diagram.trim_end().to_string()))
            }
            ".constants" => Ok(CommandResult::Output(constants_text())),
            _ => Ok(CommandResult::Error(format!(
                "Unrecognized command '{}'.",
                input
            ))),
        }
    }
}

fn constants_text() -> String {
    format!(
        "Constants:\n\
         ROW_SIZE: {}\n\
         COMMON_NODE_HEADER_SIZE: {}\n\
         LEAF_NODE_HEADER_SIZE: {}\n\
         LEAF_NODE_CELL_SIZE: {}\n\
         LEAF_NODE_SPACE_FOR_CELLS: {}\n\
         LEAF_NODE_MAX_CELLS: {}",
        ROW_SIZE,
        COMMON_NODE_HEADER_SIZE,
        LEAF_NODE_HEADER_SIZE,
        LEAF_NODE_CELL_SIZE,
        LEAF_NODE_SPACE_FOR_CELLS,
        LEAF_NODE_MAX_CELLS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{ExecuteResult, Row};
    use tempfile::tempdir;

    fn create_test_table(dir: &tempfile::TempDir) -> Table {
        Table::open(dir.path().join("test.db")).unwrap()
    }

    #[test]
    fn is_command_checks_the_leading_period() {
        assert!(CommandHandler::is_command(".exit"));
        assert!(CommandHandler::is_command(".anything"));
        assert!(!CommandHandler::is_command("select"));
    }

    #[test]
    fn exit_signals_the_repl() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        let result = CommandHandler::execute(".exit", &mut table).unwrap();

        assert_eq!(result, CommandResult::Exit);
    }

    #[test]
    fn constants_prints_the_layout_block() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        let result = CommandHandler::execute(".constants", &mut table).unwrap();

        let expected = "Constants:\n\
                        ROW_SIZE: 293\n\
                        COMMON_NODE_HEADER_SIZE: 6\n\
                        LEAF_NODE_HEADER_SIZE: 14\n\
                        LEAF_NODE_CELL_SIZE: 297\n\
                        LEAF_NODE_SPACE_FOR_CELLS: 4082\n\
                        LEAF_NODE_MAX_CELLS: 13";
        assert_eq!(result, CommandResult::Output(expected.to_string()));
    }

    #[test]
    fn btree_renders_the_tree_from_the_root() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);
        for id in [3u32, 1, 2] {
            assert_eq!(
                table.insert(&Row::new(id, "u", "e")).unwrap(),
                ExecuteResult::Inserted
            );
        }

        let result = CommandHandler::execute(".btree", &mut table).unwrap();

        let expected = "- leaf (size 3)\n   - 1\n   - 2\n   - 3";
        assert_eq!(result, CommandResult::Output(expected.to_string()));
    }

    #[test]
    fn unknown_commands_echo_the_input() {
        let dir = tempdir().unwrap();
        let mut table = create_test_table(&dir);

        let result = CommandHandler::execute(".foo", &mut table).unwrap();

        assert_eq!(
            result,
            CommandResult::Error("Unrecognized command '.foo'.".to_string())
        );
    }
}
