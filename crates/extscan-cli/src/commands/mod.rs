//! CLI command implementations

pub mod filter;
