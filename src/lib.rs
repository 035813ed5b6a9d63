//! Taproot Wallet
//!
//! Single-recipient payments from a single-key Taproot (P2TR) wallet, using an Esplora
//! block explorer as the only source of chain data.

pub mod bitcoin;
pub mod cli;
pub mod config;
pub mod manager;
pub mod storage;
