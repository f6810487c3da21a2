//! AMO-RS library
//!
//! Command implementations and output helpers behind the `amo-rs` binary.

pub mod cli;
pub mod commands;
pub mod utils;
