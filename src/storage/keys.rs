//! Secret key loading and generation
//!
//! The wallet holds a single secp256k1 secret key encoded as WIF. It is read from the
//! `PRIVATE_KEY_WIF` environment variable (usually populated from `.env`) or, failing that,
//! from the key file in the wallet directory.

use crate::config::NetworkType;
use crate::storage::file_system::{self, FileSystemError};
use bitcoin::secp256k1::SecretKey;
use bitcoin::PrivateKey;
use std::path::Path;

/// Environment variable holding the WIF-encoded secret key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY_WIF";

/// Key loading and derivation errors
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("Secret key is missing: set PRIVATE_KEY_WIF or generate a wallet first")]
    MissingSecret,

    #[error("Invalid WIF format: {0}")]
    InvalidWif(String),

    #[error("Key network mismatch: configured for {expected}, key encoded for {key_kind}")]
    NetworkMismatch {
        expected: NetworkType,
        key_kind: String,
    },

    #[error("Key storage error: {0}")]
    Storage(#[from] FileSystemError),
}

/// Decode a WIF string into a private key
///
/// Surrounding whitespace and quotes (as written by some `.env` editors) are ignored.
pub fn parse_wif(wif: &str) -> Result<PrivateKey, KeyError> {
    let trimmed = wif.trim().trim_matches(|c| c == '\'' || c == '"');
    if trimmed.is_empty() {
        return Err(KeyError::MissingSecret);
    }
    PrivateKey::from_wif(trimmed).map_err(|e| KeyError::InvalidWif(e.to_string()))
}

/// Load the wallet key
///
/// Lookup order: explicit `wif` value (normally the `PRIVATE_KEY_WIF` variable), then the key
/// file under `wallet_dir`. A blank `wif` counts as absent.
pub fn load_key(wif: Option<&str>, wallet_dir: &Path) -> Result<PrivateKey, KeyError> {
    if let Some(value) = wif.filter(|v| !v.trim().is_empty()) {
        log::debug!("Loading key from {}", PRIVATE_KEY_ENV);
        return parse_wif(value);
    }

    match file_system::load_key_file(wallet_dir)? {
        Some(contents) => {
            log::debug!("Loading key from {}", file_system::key_file_path(wallet_dir).display());
            parse_wif(&contents)
        }
        None => Err(KeyError::MissingSecret),
    }
}

/// Load the wallet key, reading `PRIVATE_KEY_WIF` from the process environment
pub fn load_key_from_env(wallet_dir: &Path) -> Result<PrivateKey, KeyError> {
    let wif = std::env::var(PRIVATE_KEY_ENV).ok();
    load_key(wif.as_deref(), wallet_dir)
}

/// Generate a fresh private key for the given network
pub fn generate_key(network: NetworkType) -> PrivateKey {
    let secret_key = SecretKey::new(&mut rand::thread_rng());
    PrivateKey::new(secret_key, network.to_bitcoin_network())
}
