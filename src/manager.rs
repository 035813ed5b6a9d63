//! Wallet manager - Main integration layer
//!
//! Coordinates config, key storage and the Bitcoin layer, and runs the send pipeline:
//! validate inputs, find owned confirmed UTXOs, estimate the fee, check funds, build, sign,
//! broadcast.

use crate::bitcoin::{
    broadcast_transaction, build_transaction, calculate_final_fee, change_amount, confirmed_only,
    fetch_and_filter_utxos, fetch_fee_rate, get_balance, sign_transaction, sufficient_funds,
    total_value, Balance, BuildError, EsploraApi, EsploraClient, NetworkError, SenderKey,
    SignError,
};
use crate::config::{BitcoinConfig, ConfigError, GlobalConfig, NetworkType};
use crate::storage::file_system::{self, FileSystemError};
use crate::storage::keys::{self, KeyError};
use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, Amount, Denomination, PrivateKey};
use std::path::PathBuf;

/// Errors that can occur in the wallet manager
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("File system error: {0}")]
    FileSystem(#[from] FileSystemError),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Transaction build failed: {0}")]
    Build(#[from] BuildError),

    #[error("Transaction sign failed: {0}")]
    Sign(#[from] SignError),

    #[error("Invalid recipient address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Details of a broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Transaction ID returned by the server
    pub txid: String,

    /// Payment amount in satoshis
    pub amount: u64,

    /// Fee reserved by the estimate, in satoshis
    pub fee: u64,

    /// Change returned to the sender, if a change output was created
    pub change: Option<u64>,

    /// Number of inputs spent
    pub inputs: usize,

    /// Virtual size of the signed transaction
    pub vsize: usize,
}

/// How a send operation ended
///
/// Running out of spendable coins or funds is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Transaction signed and accepted by the server
    Broadcast(SendReceipt),

    /// The address has no confirmed UTXOs locked to the wallet key
    NoSpendableUtxos,

    /// Confirmed balance does not cover amount plus fee
    InsufficientFunds { required: u64, available: u64 },
}

/// Parse a decimal BTC amount into satoshis
///
/// Rejects negative, zero, malformed and sub-satoshi amounts.
pub fn parse_btc_amount(amount: &str) -> Result<u64, ManagerError> {
    let parsed = Amount::from_str_in(amount.trim(), Denomination::Bitcoin)
        .map_err(|e| ManagerError::InvalidAmount(format!("'{}': {}", amount.trim(), e)))?;
    if parsed == Amount::ZERO {
        return Err(ManagerError::InvalidAmount(
            "Amount must be greater than 0".to_string(),
        ));
    }
    Ok(parsed.to_sat())
}

/// Parse an address and check it belongs to `network`
pub fn parse_recipient(address: &str, network: NetworkType) -> Result<Address, ManagerError> {
    address
        .trim()
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| ManagerError::InvalidAddress(format!("'{}': {}", address.trim(), e)))?
        .require_network(network.to_bitcoin_network())
        .map_err(|e| ManagerError::InvalidAddress(format!("'{}': {}", address.trim(), e)))
}

/// Send `amount_btc` to `recipient`, spending every confirmed UTXO the key owns
///
/// Nothing is signed unless funds are known to be sufficient, and nothing is broadcast unless
/// every input is signed.
///
/// # Arguments
///
/// * `client` - Esplora API
/// * `config` - Network, fee floor and lookup concurrency
/// * `private_key` - Wallet secret key
/// * `recipient` - Destination address string
/// * `amount_btc` - Decimal BTC amount string
pub fn send_bitcoin<C: EsploraApi + ?Sized>(
    client: &C,
    config: &BitcoinConfig,
    private_key: &PrivateKey,
    recipient: &str,
    amount_btc: &str,
) -> Result<SendOutcome, ManagerError> {
    let recipient = parse_recipient(recipient, config.network)?;
    let amount = parse_btc_amount(amount_btc)?;

    let key = SenderKey::from_private_key(private_key, config.network)?;
    let sender = key.address().clone();
    let output_key = key.output_key_bytes();
    log::info!("Sender P2TR Address: {}", sender);

    let spendable = fetch_and_filter_utxos(
        client,
        &sender.to_string(),
        &output_key,
        config.parallel_requests,
    )?;
    let utxos = confirmed_only(spendable);

    if utxos.is_empty() {
        log::info!("No confirmed spendable UTXOs found for address {}.", sender);
        return Ok(SendOutcome::NoSpendableUtxos);
    }
    log::info!("Using {} confirmed and spendable UTXO(s).", utxos.len());

    let total = total_value(&utxos);
    log::info!("Total spendable balance: {} sats", total);

    let fee_rate = fetch_fee_rate(client, config.min_fee_rate)?;
    let fee = calculate_final_fee(&utxos, &sender, &recipient, amount, fee_rate)?;
    log::info!("Estimated final fee: {} sats", fee);

    if !sufficient_funds(total, amount, fee) {
        let required = amount.saturating_add(fee);
        log::info!(
            "Insufficient funds. Required: {} + Fee: {}. Available: {}",
            amount,
            fee,
            total
        );
        return Ok(SendOutcome::InsufficientFunds {
            required,
            available: total,
        });
    }

    let tx = build_transaction(&utxos, &sender, &recipient, amount, fee, true)?;
    let change = change_amount(total, amount, fee);
    let signed = sign_transaction(tx, &utxos, &key, &output_key)?;
    let vsize = signed.vsize();

    let txid = broadcast_transaction(client, &signed)?;

    Ok(SendOutcome::Broadcast(SendReceipt {
        txid,
        amount,
        fee,
        change,
        inputs: signed.input.len(),
        vsize,
    }))
}

/// Main wallet manager
///
/// Owns the configuration and the Esplora client. Keys are loaded per operation and dropped
/// afterwards.
pub struct WalletManager {
    /// Global configuration
    config: GlobalConfig,

    /// Esplora client for blockchain interaction
    esplora_client: EsploraClient,
}

impl WalletManager {
    /// Create a new wallet manager
    ///
    /// # Example
    ///
    /// ```ignore
    /// use taproot_wallet::manager::WalletManager;
    /// use taproot_wallet::config::GlobalConfig;
    ///
    /// let manager = WalletManager::new(GlobalConfig::default_signet())?;
    /// ```
    pub fn new(config: GlobalConfig) -> Result<Self, ManagerError> {
        let esplora_client = EsploraClient::from_config(&config.bitcoin)?;
        Ok(Self {
            config,
            esplora_client,
        })
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Directory holding the key file
    pub fn wallet_dir(&self) -> Result<PathBuf, ManagerError> {
        Ok(file_system::wallet_dir(self.config.wallet_dir.as_deref())?)
    }

    /// Generate a new key and save it to the key file
    ///
    /// # Returns
    ///
    /// The new P2TR address and the key file path
    pub fn generate_wallet(&self) -> Result<(Address, PathBuf), ManagerError> {
        let network = self.config.bitcoin.network;
        let private_key = keys::generate_key(network);
        let sender = SenderKey::from_private_key(&private_key, network)?;
        let path = file_system::save_key_file(&self.wallet_dir()?, &private_key.to_wif())?;
        log::info!("Wallet generated");
        Ok((sender.address().clone(), path))
    }

    /// P2TR address of the loaded key
    pub fn address(&self) -> Result<Address, ManagerError> {
        let private_key = self.load_key()?;
        let sender = SenderKey::from_private_key(&private_key, self.config.bitcoin.network)?;
        Ok(sender.address().clone())
    }

    /// Balance of the wallet address
    pub fn get_balance(&self) -> Result<Balance, ManagerError> {
        let address = self.address()?;
        Ok(get_balance(&self.esplora_client, &address.to_string())?)
    }

    /// Send Bitcoin to an address
    pub fn send_bitcoin(
        &self,
        recipient: &str,
        amount_btc: &str,
    ) -> Result<SendOutcome, ManagerError> {
        let private_key = self.load_key()?;
        send_bitcoin(
            &self.esplora_client,
            &self.config.bitcoin,
            &private_key,
            recipient,
            amount_btc,
        )
    }

    fn load_key(&self) -> Result<PrivateKey, ManagerError> {
        Ok(keys::load_key_from_env(&self.wallet_dir()?)?)
    }
}
