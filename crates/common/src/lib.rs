//! Shared types used across all voxlink crates.

pub mod types;
