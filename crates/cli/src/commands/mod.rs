//! Subcommand implementations.

pub mod migrate;
pub mod shipping;
