//! Shared utilities for the mender-rs CLI

pub mod table;
pub mod tree;

pub use table::*;
pub use tree::*;
