//! Command implementations for mender-rs

pub mod pose;
pub mod scene;
