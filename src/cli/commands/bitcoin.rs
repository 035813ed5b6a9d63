//! Bitcoin command implementations

use crate::bitcoin::format_btc;
use crate::config::{load_config, ConfigError, ConfigOverrides};
use crate::manager::{ManagerError, SendOutcome, WalletManager};

#[derive(Debug, thiserror::Error)]
pub enum BitcoinCommandError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Manager error: {0}")]
    Manager(#[from] ManagerError),
}

/// Get Bitcoin balance
pub fn get_balance(overrides: ConfigOverrides) -> Result<(), BitcoinCommandError> {
    let config = load_config(None, overrides)?;
    let manager = WalletManager::new(config)?;

    let balance = manager.get_balance()?;

    println!("Balance: {} BTC", format_btc(balance.total));
    println!("  Confirmed:   {} BTC", format_btc(balance.confirmed));
    println!("  Unconfirmed: {} BTC", format_btc(balance.unconfirmed));

    Ok(())
}

/// Send Bitcoin to an address
pub fn send_bitcoin(
    to_address: String,
    amount_btc: String,
    overrides: ConfigOverrides,
) -> Result<(), BitcoinCommandError> {
    let config = load_config(None, overrides)?;
    let manager = WalletManager::new(config)?;

    match manager.send_bitcoin(&to_address, &amount_btc)? {
        SendOutcome::Broadcast(receipt) => {
            println!("✓ Bitcoin sent successfully");
            println!("  Transaction ID: {}", receipt.txid);
            println!("  Recipient: {}", to_address);
            println!(
                "  Amount: {} sats ({} BTC)",
                receipt.amount,
                format_btc(receipt.amount)
            );
            println!("  Fee: {} sats ({} vB)", receipt.fee, receipt.vsize);
            if let Some(change) = receipt.change {
                println!("  Change: {} sats", change);
            }
        }
        SendOutcome::NoSpendableUtxos => {
            println!("No confirmed spendable UTXOs found. Nothing was sent.");
        }
        SendOutcome::InsufficientFunds {
            required,
            available,
        } => {
            println!(
                "Insufficient funds: need {} sats (amount + fee), have {} sats. Nothing was sent.",
                required, available
            );
        }
    }

    Ok(())
}
