//! UTXO discovery and ownership validation
//!
//! Candidates come from the address UTXO list. Each one is confirmed to be a single-key
//! Taproot output carrying our output key by looking up the transaction that created it.

use crate::bitcoin::network::{AddressUtxo, EsploraApi, NetworkError};
use bitcoin::opcodes::all::{OP_PUSHBYTES_32, OP_PUSHNUM_1};
use bitcoin::{Amount, ScriptBuf};

/// Length of a single-key Taproot locking script: `OP_1 OP_PUSHBYTES_32 <32-byte key>`
pub const P2TR_SCRIPT_LEN: usize = 34;

/// An unspent output owned (or claimed to be owned) by the wallet address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    /// Transaction ID, hex as reported by Esplora
    pub txid: String,

    /// Output index
    pub vout: u32,

    /// Amount in satoshis
    pub value: u64,

    /// Whether the funding transaction is in a block
    pub confirmed: bool,

    /// Locking script of the output, set once ownership was verified
    pub locking_script: Option<ScriptBuf>,

    /// Output key extracted from `locking_script`, set once ownership was verified
    pub verified_output_key: Option<[u8; 32]>,
}

impl Utxo {
    /// Outpoint identifier in format "txid:vout"
    pub fn outpoint_id(&self) -> String {
        format!("{}:{}", self.txid, self.vout)
    }

    /// The stored locking script re-encoded as hex
    pub fn locking_script_hex(&self) -> Option<String> {
        self.locking_script
            .as_ref()
            .map(|script| hex::encode(script.as_bytes()))
    }
}

impl From<AddressUtxo> for Utxo {
    fn from(utxo: AddressUtxo) -> Self {
        Self {
            txid: utxo.txid,
            vout: utxo.vout,
            value: utxo.value,
            confirmed: utxo.status.confirmed,
            locking_script: None,
            verified_output_key: None,
        }
    }
}

/// Extract the output key from a single-key Taproot locking script
///
/// Returns `None` unless the script is exactly `0x51 0x20 || key`.
pub fn p2tr_output_key(script: &[u8]) -> Option<[u8; 32]> {
    if script.len() != P2TR_SCRIPT_LEN
        || script[0] != OP_PUSHNUM_1.to_u8()
        || script[1] != OP_PUSHBYTES_32.to_u8()
    {
        return None;
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&script[2..]);
    Some(key)
}

/// Fetch the address's UTXOs and keep those locked to `expected_key`
///
/// Fails only if the address listing itself fails. Lookup failures for individual candidates
/// are logged and the candidate is dropped. Confirmation status is not filtered here; see
/// [`confirmed_only`].
///
/// # Arguments
///
/// * `client` - Esplora API
/// * `address` - Address whose UTXOs are listed
/// * `expected_key` - Output key the locking script must carry
/// * `parallel_requests` - Maximum concurrent transaction lookups (1 = sequential)
pub fn fetch_and_filter_utxos<C: EsploraApi + ?Sized>(
    client: &C,
    address: &str,
    expected_key: &[u8; 32],
    parallel_requests: usize,
) -> Result<Vec<Utxo>, NetworkError> {
    log::info!("Fetching utxos for {}...", address);
    let candidates: Vec<Utxo> = client
        .get_address_utxos(address)?
        .into_iter()
        .map(Utxo::from)
        .collect();
    log::debug!("Address has {} candidate UTXO(s)", candidates.len());

    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    Ok(validate_utxos(client, candidates, expected_key, parallel_requests))
}

/// Verify ownership of each candidate, preserving input order
///
/// With `parallel_requests > 1` lookups run in batches of that size on scoped threads;
/// results are collected in candidate order either way.
pub fn validate_utxos<C: EsploraApi + ?Sized>(
    client: &C,
    candidates: Vec<Utxo>,
    expected_key: &[u8; 32],
    parallel_requests: usize,
) -> Vec<Utxo> {
    if parallel_requests <= 1 || candidates.len() <= 1 {
        return candidates
            .into_iter()
            .filter_map(|utxo| verify_ownership(client, utxo, expected_key))
            .collect();
    }

    let mut verified = Vec::with_capacity(candidates.len());
    for batch in candidates.chunks(parallel_requests) {
        std::thread::scope(|scope| {
            let handles: Vec<_> = batch
                .iter()
                .map(|utxo| {
                    let utxo = utxo.clone();
                    scope.spawn(move || verify_ownership(client, utxo, expected_key))
                })
                .collect();

            for (handle, utxo) in handles.into_iter().zip(batch) {
                match handle.join() {
                    Ok(Some(owned)) => verified.push(owned),
                    Ok(None) => {}
                    Err(_) => log::warn!("Lookup for {} panicked, skipping", utxo.outpoint_id()),
                }
            }
        });
    }
    verified
}

/// Keep only confirmed UTXOs
pub fn confirmed_only(utxos: Vec<Utxo>) -> Vec<Utxo> {
    utxos.into_iter().filter(|utxo| utxo.confirmed).collect()
}

/// Sum of UTXO values in satoshis, saturating at `u64::MAX`
pub fn total_value(utxos: &[Utxo]) -> u64 {
    utxos
        .iter()
        .fold(0u64, |total, utxo| total.saturating_add(utxo.value))
}

/// Look up the funding transaction and annotate the UTXO if it is ours
fn verify_ownership<C: EsploraApi + ?Sized>(
    client: &C,
    mut utxo: Utxo,
    expected_key: &[u8; 32],
) -> Option<Utxo> {
    if utxo.value > Amount::MAX_MONEY.to_sat() {
        log::warn!(
            "Skipping {}: value {} exceeds the 21M BTC supply",
            utxo.outpoint_id(),
            utxo.value
        );
        return None;
    }

    let tx = match client.get_tx(&utxo.txid) {
        Ok(tx) => tx,
        Err(e) => {
            log::warn!("Skipping {}: transaction lookup failed: {}", utxo.outpoint_id(), e);
            return None;
        }
    };

    let Some(output) = tx.vout.get(utxo.vout as usize) else {
        log::warn!(
            "Skipping {}: transaction has only {} output(s)",
            utxo.outpoint_id(),
            tx.vout.len()
        );
        return None;
    };

    let Some(script_hex) = output.scriptpubkey.as_deref() else {
        log::warn!("Skipping {}: output has no locking script", utxo.outpoint_id());
        return None;
    };

    let script_bytes = match hex::decode(script_hex) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::warn!("Skipping {}: malformed script hex: {}", utxo.outpoint_id(), e);
            return None;
        }
    };

    match p2tr_output_key(&script_bytes) {
        Some(key) if key == *expected_key => {
            utxo.locking_script = Some(ScriptBuf::from_bytes(script_bytes));
            utxo.verified_output_key = Some(key);
            Some(utxo)
        }
        Some(_) => {
            log::warn!("Skipping {}: output key does not match wallet key", utxo.outpoint_id());
            None
        }
        None => {
            log::warn!("Skipping {}: not a single-key Taproot output", utxo.outpoint_id());
            None
        }
    }
}
