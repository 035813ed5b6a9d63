//! Taproot key-path signing
//!
//! Every input is signed with a BIP341 signature hash under `SIGHASH_DEFAULT`, committing to
//! all spent outputs (amounts and scripts). Each witness is a single 64-byte Schnorr signature.

use crate::bitcoin::keys::SenderKey;
use crate::bitcoin::utxo::{p2tr_output_key, Utxo};
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::Message;
use bitcoin::sighash::{Prevouts, SighashCache, TapSighashType};
use bitcoin::{taproot, Amount, Transaction, TxOut, Witness};

/// Errors that can occur while signing
///
/// All variants are structural: nothing is signed unless every input checks out.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error("Input/UTXO count mismatch: transaction has {inputs} input(s), {utxos} UTXO(s) supplied")]
    CountMismatch { inputs: usize, utxos: usize },

    #[error("Missing {field} for UTXO index {index}")]
    MissingData { index: usize, field: &'static str },

    #[error("Output key mismatch on input #{index}")]
    KeyMismatch { index: usize },

    #[error("Input #{index} does not spend UTXO {outpoint}")]
    InputMismatch { index: usize, outpoint: String },

    #[error("Signing key does not match the expected output key")]
    SignerKeyMismatch,

    #[error("Signature hash computation failed for input #{index}: {reason}")]
    Sighash { index: usize, reason: String },
}

impl SignError {
    /// Index of the input the error refers to, if any
    pub fn input_index(&self) -> Option<usize> {
        match self {
            SignError::MissingData { index, .. }
            | SignError::KeyMismatch { index }
            | SignError::InputMismatch { index, .. }
            | SignError::Sighash { index, .. } => Some(*index),
            SignError::CountMismatch { .. } | SignError::SignerKeyMismatch => None,
        }
    }
}

/// Sign every input of `tx`
///
/// `utxos` must be the list the transaction was built from, in the same order. Each UTXO must
/// carry its verified locking script and output key, both matching `expected_output_key`.
/// The transaction is only returned once all inputs are signed.
///
/// # Example
///
/// ```ignore
/// let tx = build_transaction(&utxos, sender, recipient, amount, fee, true)?;
/// let signed = sign_transaction(tx, &utxos, &key, &key.output_key_bytes())?;
/// assert_eq!(signed.input[0].witness.len(), 1);
/// ```
pub fn sign_transaction(
    tx: Transaction,
    utxos: &[Utxo],
    key: &SenderKey,
    expected_output_key: &[u8; 32],
) -> Result<Transaction, SignError> {
    if tx.input.len() != utxos.len() {
        return Err(SignError::CountMismatch {
            inputs: tx.input.len(),
            utxos: utxos.len(),
        });
    }

    if key.output_key_bytes() != *expected_output_key {
        return Err(SignError::SignerKeyMismatch);
    }

    let prevouts = spent_outputs(&tx, utxos, expected_output_key)?;

    let witnesses = {
        let mut cache = SighashCache::new(&tx);
        let mut witnesses = Vec::with_capacity(prevouts.len());
        for index in 0..prevouts.len() {
            let sighash = cache
                .taproot_key_spend_signature_hash(
                    index,
                    &Prevouts::All(&prevouts),
                    TapSighashType::Default,
                )
                .map_err(|e| SignError::Sighash {
                    index,
                    reason: e.to_string(),
                })?;

            let msg = Message::from_digest(sighash.to_byte_array());
            let signature = taproot::Signature {
                signature: key.sign_schnorr(&msg),
                sighash_type: TapSighashType::Default,
            };
            witnesses.push(Witness::p2tr_key_spend(&signature));
        }
        witnesses
    };

    let mut signed = tx;
    for (input, witness) in signed.input.iter_mut().zip(witnesses) {
        input.witness = witness;
    }

    log::debug!("Signed {} input(s)", signed.input.len());
    Ok(signed)
}

/// Check each UTXO against its input and collect the spent outputs
fn spent_outputs(
    tx: &Transaction,
    utxos: &[Utxo],
    expected_output_key: &[u8; 32],
) -> Result<Vec<TxOut>, SignError> {
    utxos
        .iter()
        .zip(&tx.input)
        .enumerate()
        .map(|(index, (utxo, input))| {
            let script = utxo
                .locking_script
                .as_ref()
                .ok_or(SignError::MissingData {
                    index,
                    field: "locking script",
                })?;
            let verified_key = utxo.verified_output_key.ok_or(SignError::MissingData {
                index,
                field: "verified output key",
            })?;

            if verified_key != *expected_output_key
                || p2tr_output_key(script.as_bytes()) != Some(*expected_output_key)
            {
                return Err(SignError::KeyMismatch { index });
            }

            let spends_utxo = input.previous_output.txid.to_string() == utxo.txid.to_lowercase()
                && input.previous_output.vout == utxo.vout;
            if !spends_utxo {
                return Err(SignError::InputMismatch {
                    index,
                    outpoint: utxo.outpoint_id(),
                });
            }

            Ok(TxOut {
                value: Amount::from_sat(utxo.value),
                script_pubkey: script.clone(),
            })
        })
        .collect()
}
