//! Command implementations for amo-rs

pub mod model;
