//! # REPL - Read-Eval-Print Loop
//!
//! The interactive session loop. Each line is either a meta command
//! (leading `.`) or a statement; both resolve to output lines that go to
//! stdout, and the loop continues until `.exit` or end of input.
//!
//! ## Execution Flow
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Read Line                    │
//! └──────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌──────────────────────────────────────────────┐
//! │            Starts with '.'?                  │
//! └──────────────────────────────────────────────┘
//!          │ Yes                    │ No
//!          ▼                        ▼
//! ┌──────────────────┐   ┌──────────────────────┐
//! │ Meta command     │   │ Parse statement      │
//! │ (.exit/.btree/   │   │ Execute against the  │
//! │  .constants)     │   │ table                │
//! └──────────────────┘   └──────────────────────┘
//!          │                        │
//!          ▼                        ▼
//! ┌──────────────────────────────────────────────┐
//! │              Print Result                    │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Statement-level problems (syntax errors, duplicate keys) print one line
//! and the loop continues. Storage failures propagate out of [`Repl::run`]
//! and terminate the process without flushing; only `.exit` persists the
//! session.

use eyre::{Result, WrapErr};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::table::{ExecuteResult, Table};

use super::commands::{CommandHandler, CommandResult};
use super::statement::{prepare, PrepareError, Statement};

const PROMPT: &str = "db > ";

/// What one input line resolved to.
#[derive(Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Lines to print before reading the next input.
    Output(Vec<String>),
    /// The session is over; the table has not been closed yet.
    Exit,
}

pub struct Repl {
    table: Table,
    editor: DefaultEditor,
}

impl Repl {
    pub fn new(table: Table) -> Result<Self> {
        let editor = DefaultEditor::new().wrap_err("failed to initialize line editor")?;
        Ok(Self { table, editor })
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line);

                    match dispatch(&mut self.table, line)? {
                        Dispatch::Exit => {
                            self.table.close()?;
                            return Ok(());
                        }
                        Dispatch::Output(lines) => {
                            for line in lines {
                                println!("{}", line);
                            }
                        }
                    }
                }
                // End of input without .exit: nothing is flushed.
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
                Err(err) => return Err(err).wrap_err("failed to read input"),
            }
        }
    }
}

/// Resolves one trimmed input line against the table.
pub fn dispatch(table: &mut Table, input: &str) -> Result<Dispatch> {
    if CommandHandler::is_command(input) {
        return Ok(match CommandHandler::execute(input, table)? {
            CommandResult::Exit => Dispatch::Exit,
            CommandResult::Output(text) => {
                Dispatch::Output(text.lines().map(str::to_owned).collect())
            }
            CommandResult::Error(message) => Dispatch::Output(vec![message]),
        });
    }

    let lines = match prepare(input) {
        Ok(Statement::Insert { row }) => match table.insert(&row)? {
            ExecuteResult::Inserted => vec!["Executed.".to_string()],
            ExecuteResult::DuplicateKey => vec!["Error: Duplicate key.".to_string()],
            ExecuteResult::TableFull => vec!["Error: Table is full".to_string()],
        },
        Ok(Statement::Select) => {
            let mut lines: Vec<String> = table
                .select()?
                .iter()
                .map(|row| row.to_string())
                .collect();
            lines.push("Executed.".to_string());
            lines
        }
        Err(PrepareError::NegativeId) => vec!["ID must be positive.".to_string()],
        Err(PrepareError::StringTooLong) => vec!["String is too long.".to_string()],
        Err(PrepareError::SyntaxError) => {
            vec!["Syntax error. Could not parse statement.".to_string()]
        }
        Err(PrepareError::Unrecognized) => {
            vec![format!("Unrecognized keyword at start of '{}'.", input)]
        }
    };

    Ok(Dispatch::Output(lines))
}
