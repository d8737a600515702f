//! # CLI Module
//!
//! The interactive front end: a line-oriented REPL over the table engine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │               CLI Entry Point                   │
//! │              (bin/minnowdb.rs)                  │
//! ├─────────────────────────────────────────────────┤
//! │                  REPL Loop                      │
//! │  - Reads input via rustyline                    │
//! │  - Dispatches meta commands vs. statements      │
//! │  - Prints results line by line                  │
//! ├─────────────────────────────────────────────────┤
//! │   Commands         │       Statements           │
//! │ (.exit, .btree,    │  insert <id> <user> <mail> │
//! │  .constants)       │  select                    │
//! └─────────────────────────────────────────────────┘
//! ```

mod commands;
mod repl;
mod statement;

pub use commands::{CommandHandler, CommandResult};
pub use repl::{dispatch, Dispatch, Repl};
pub use statement::{prepare, PrepareError, Statement};
