//! extscan CLI library.
//!
//! Argument handling, logging bootstrap and the `filter` command, kept out of
//! `main.rs` so they can be tested without spawning the binary.

pub mod cli_args;
pub mod commands;
pub mod logging;
