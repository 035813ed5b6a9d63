//! File system operations for key persistence
//!
//! Layout: `<wallet_dir>/keys/private_key` containing the WIF string.

use std::fs;
use std::path::{Path, PathBuf};

/// Key file name inside `<wallet_dir>/keys/`
pub const KEY_FILE_NAME: &str = "private_key";

/// File system errors
#[derive(Debug, thiserror::Error)]
pub enum FileSystemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Key file already exists: {0}")]
    KeyExists(String),

    #[error("Wallet directory not found")]
    WalletDirectoryNotFound,
}

/// Get the default wallet directory path
///
/// Returns: `~/.taproot-wallet/`
pub fn default_wallet_dir() -> Result<PathBuf, FileSystemError> {
    crate::config::default_config_dir().map_err(|_| FileSystemError::WalletDirectoryNotFound)
}

/// Get the wallet directory (custom or default)
pub fn wallet_dir(custom_dir: Option<&str>) -> Result<PathBuf, FileSystemError> {
    match custom_dir {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => default_wallet_dir(),
    }
}

/// Path of the key file for a wallet directory
pub fn key_file_path(wallet_dir: &Path) -> PathBuf {
    wallet_dir.join("keys").join(KEY_FILE_NAME)
}

/// Save a WIF-encoded key
///
/// Creates `<wallet_dir>/keys/` if needed. Never overwrites an existing key file.
/// On unix the file is created with mode `0600`.
pub fn save_key_file(wallet_dir: &Path, wif: &str) -> Result<PathBuf, FileSystemError> {
    let path = key_file_path(wallet_dir);
    if path.exists() {
        return Err(FileSystemError::KeyExists(path.display().to_string()));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&path, wif)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(path)
}

/// Read the key file, if present
pub fn load_key_file(wallet_dir: &Path) -> Result<Option<String>, FileSystemError> {
    let path = key_file_path(wallet_dir);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(fs::read_to_string(&path)?.trim().to_string()))
}
