//! Configuration constants for the storage engine.
//!
//! Everything layout-related lives in [`constants`]; import from this module
//! rather than redefining values locally.

mod constants;

pub use constants::*;
