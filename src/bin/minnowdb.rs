//! # MinnowDB CLI Entry Point
//!
//! ## Usage
//!
//! ```bash
//! minnowdb ./my.db
//! ```
//!
//! One positional argument: the database file, created if absent. The
//! session is interactive; `.exit` persists and quits, end of input quits
//! without persisting. Set `RUST_LOG` to see storage diagnostics on stderr.

use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use minnowdb::cli::Repl;
use minnowdb::Table;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        println!("Must supply a database filename.");
        return Ok(());
    };

    let table =
        Table::open(&path).wrap_err_with(|| format!("failed to open database at '{}'", path))?;

    let mut repl = Repl::new(table)?;
    repl.run()
}
