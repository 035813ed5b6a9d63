//! Storage layer for wallet data
//!
//! Manages secret key loading, generation, and persistence.

pub mod file_system;
pub mod keys;
