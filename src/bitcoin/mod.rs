//! Bitcoin layer
//!
//! UTXO discovery, fee estimation, transaction assembly, Taproot signing and broadcast
//! against an Esplora block explorer.

pub mod balance;
pub mod broadcast;
pub mod builder;
pub mod fee;
pub mod keys;
pub mod network;
pub mod signer;
pub mod utxo;

pub use balance::{format_btc, get_balance, Balance};
pub use broadcast::broadcast_transaction;
pub use builder::{build_transaction, change_amount, BuildError, DUST_THRESHOLD};
pub use fee::{calculate_final_fee, fetch_fee_rate, sufficient_funds, vsize_fee, FeeRateConfig};
pub use keys::SenderKey;
pub use network::{
    AddressUtxo, EsploraApi, EsploraClient, EsploraTx, EsploraTxOut, NetworkError,
    RecommendedFees, TxStatus,
};
pub use signer::{sign_transaction, SignError};
pub use utxo::{confirmed_only, fetch_and_filter_utxos, p2tr_output_key, total_value, Utxo};
