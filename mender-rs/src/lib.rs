//! Mender-RS library
//!
//! Scene loading and reporting behind the `mender-rs` command-line poser.

pub mod cli;
pub mod commands;
pub mod scene_file;
pub mod utils;
