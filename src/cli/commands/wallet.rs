//! Wallet command implementations

use crate::config::{load_config, ConfigError, ConfigOverrides};
use crate::manager::{ManagerError, WalletManager};

#[derive(Debug, thiserror::Error)]
pub enum WalletCommandError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Manager error: {0}")]
    Manager(#[from] ManagerError),
}

/// Generate a new key and save it to the data directory
pub fn generate(overrides: ConfigOverrides) -> Result<(), WalletCommandError> {
    let config = load_config(None, overrides)?;
    let network = config.bitcoin.network;

    let manager = WalletManager::new(config)?;
    let (address, key_path) = manager.generate_wallet()?;

    println!("✓ Wallet generated");
    println!();
    println!("  Network:  {}", network);
    println!("  Address:  {}", address);
    println!("  Key file: {}", key_path.display());
    println!();
    println!("  Store this key file securely. Anyone holding it can spend the funds.");

    Ok(())
}

/// Print the address of the loaded key
pub fn address(overrides: ConfigOverrides) -> Result<(), WalletCommandError> {
    let config = load_config(None, overrides)?;
    let manager = WalletManager::new(config)?;

    println!("{}", manager.address()?);

    Ok(())
}
