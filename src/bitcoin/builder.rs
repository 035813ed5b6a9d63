//! Transaction assembly
//!
//! Builds unsigned version 2 transactions spending every supplied UTXO: one payment output,
//! then an optional change output back to the sender.

use crate::bitcoin::utxo::{total_value, Utxo};
use bitcoin::absolute::LockTime;
use bitcoin::transaction::Version;
use bitcoin::{Address, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use std::str::FromStr;

/// Smallest change output worth creating, in satoshis (P2TR dust limit)
pub const DUST_THRESHOLD: u64 = 330;

/// Errors that can occur while assembling a transaction
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("UTXO #{index} has no usable identifier ('{txid}'): {reason}")]
    InvalidUtxoId {
        index: usize,
        txid: String,
        reason: String,
    },
}

/// Change left after paying `amount` and `fee`, if it clears the dust threshold
///
/// Returns `None` when the inputs do not cover `amount + fee` or the remainder is below
/// [`DUST_THRESHOLD`]; in the latter case the remainder goes to the network as extra fee.
pub fn change_amount(total: u64, amount: u64, fee: u64) -> Option<u64> {
    total
        .checked_sub(amount)
        .and_then(|rest| rest.checked_sub(fee))
        .filter(|change| *change >= DUST_THRESHOLD)
}

/// Build a transaction spending `utxos` in the given order
///
/// # Arguments
///
/// * `utxos` - Inputs, one per UTXO, order preserved
/// * `sender` - Change destination
/// * `recipient` - Payment destination
/// * `amount` - Payment amount in satoshis
/// * `fee` - Fee in satoshis the change calculation reserves
/// * `include_change` - Whether to attempt a change output at all
///
/// Inputs carry empty scripts and witnesses; see [`crate::bitcoin::signer`].
pub fn build_transaction(
    utxos: &[Utxo],
    sender: &Address,
    recipient: &Address,
    amount: u64,
    fee: u64,
    include_change: bool,
) -> Result<Transaction, BuildError> {
    let input = utxos
        .iter()
        .enumerate()
        .map(|(index, utxo)| {
            let txid = Txid::from_str(&utxo.txid).map_err(|e| BuildError::InvalidUtxoId {
                index,
                txid: utxo.txid.clone(),
                reason: e.to_string(),
            })?;
            Ok(TxIn {
                previous_output: OutPoint::new(txid, utxo.vout),
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::new(),
            })
        })
        .collect::<Result<Vec<_>, BuildError>>()?;

    let mut output = vec![TxOut {
        value: Amount::from_sat(amount),
        script_pubkey: recipient.script_pubkey(),
    }];

    if include_change {
        if let Some(change) = change_amount(total_value(utxos), amount, fee) {
            output.push(TxOut {
                value: Amount::from_sat(change),
                script_pubkey: sender.script_pubkey(),
            });
        }
    }

    Ok(Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input,
        output,
    })
}
