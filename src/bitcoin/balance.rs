//! Address balance queries

use crate::bitcoin::network::{EsploraApi, NetworkError};
use bitcoin::{Amount, Denomination};

/// Bitcoin balance information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    /// Total confirmed balance (in satoshis)
    pub confirmed: u64,

    /// Total unconfirmed balance (in satoshis)
    pub unconfirmed: u64,

    /// Total balance (confirmed + unconfirmed)
    pub total: u64,
}

impl Balance {
    /// Create a new balance
    pub fn new(confirmed: u64, unconfirmed: u64) -> Self {
        Self {
            confirmed,
            unconfirmed,
            total: confirmed.saturating_add(unconfirmed),
        }
    }

    /// Check if the address has any balance
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Sum the UTXOs listed for `address`
pub fn get_balance<C: EsploraApi + ?Sized>(
    client: &C,
    address: &str,
) -> Result<Balance, NetworkError> {
    log::info!("Fetching utxos for {}...", address);
    let utxos = client.get_address_utxos(address)?;

    let (confirmed, unconfirmed) = utxos.iter().fold((0u64, 0u64), |(c, u), utxo| {
        if utxo.status.confirmed {
            (c.saturating_add(utxo.value), u)
        } else {
            (c, u.saturating_add(utxo.value))
        }
    });

    Ok(Balance::new(confirmed, unconfirmed))
}

/// Format satoshis as BTC with 8 decimals
pub fn format_btc(sats: u64) -> String {
    format!("{:.8}", Amount::from_sat(sats).display_in(Denomination::Bitcoin))
}
