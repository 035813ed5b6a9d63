//! CLI command implementations

pub mod bitcoin;
pub mod config;
pub mod wallet;
