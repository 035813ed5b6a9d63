//! Transaction broadcast

use crate::bitcoin::network::{EsploraApi, NetworkError};
use bitcoin::consensus::encode::serialize_hex;
use bitcoin::Transaction;

/// Submit a signed transaction to the network
///
/// Returns the txid reported by the server. Never retried: a failed broadcast may still have
/// been relayed.
pub fn broadcast_transaction<C: EsploraApi + ?Sized>(
    client: &C,
    tx: &Transaction,
) -> Result<String, NetworkError> {
    let tx_hex = serialize_hex(tx);
    log::info!("Broadcasting transaction...");
    log::debug!("Raw transaction: {}", tx_hex);

    let txid = client.broadcast(&tx_hex)?;

    let computed = tx.compute_txid().to_string();
    if txid != computed {
        log::warn!("Server reported txid {} but transaction hashes to {}", txid, computed);
    }

    log::info!("Transaction broadcast successful! TXID: {}", txid);
    Ok(txid)
}
