//! Fee estimation from virtual size
//!
//! The fee depends on the transaction's vsize, which depends on whether a change output
//! exists, which in turn depends on the fee. This is resolved with a fixed two-pass estimate:
//!
//! 1. vsize of the transaction without change at fee 0 gives `base_fee`;
//! 2. vsize of the transaction with change sized by `base_fee` gives the final fee.
//!
//! The passes are not iterated. If the change output appears or disappears between passes the
//! final fee can be off by the cost of one output (43 vbytes at the given rate).

use crate::bitcoin::builder::{build_transaction, BuildError};
use crate::bitcoin::network::{EsploraApi, NetworkError};
use crate::bitcoin::utxo::Utxo;
use bitcoin::{Address, Transaction};

/// Size of the placeholder witness item used for unsigned inputs (one Schnorr signature)
const PLACEHOLDER_SIGNATURE_LEN: usize = 64;

/// Fee rate configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FeeRateConfig {
    /// Fee rate in satoshis per virtual byte (sat/vB)
    pub sat_per_vb: u64,
}

impl FeeRateConfig {
    /// Create a new fee rate configuration
    pub fn new(sat_per_vb: u64) -> Self {
        Self { sat_per_vb }
    }

    /// Rate from an upstream recommendation, never below `floor`
    ///
    /// A missing recommendation yields `floor`.
    pub fn with_floor(recommended: Option<u64>, floor: u64) -> Self {
        Self {
            sat_per_vb: recommended.unwrap_or(floor).max(floor),
        }
    }
}

impl std::fmt::Display for FeeRateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} sat/vB", self.sat_per_vb)
    }
}

/// Get the fastest recommended fee rate, floored at `min_fee_rate`
pub fn fetch_fee_rate<C: EsploraApi + ?Sized>(
    client: &C,
    min_fee_rate: u64,
) -> Result<FeeRateConfig, NetworkError> {
    let fees = client.get_recommended_fees()?;
    if fees.fastest_fee.is_none() {
        log::warn!(
            "Fee recommendation has no fastestFee, using minimum {} sat/vB",
            min_fee_rate
        );
    }
    let rate = FeeRateConfig::with_floor(fees.fastest_fee, min_fee_rate);
    log::info!("Using fee rate: {}", rate);
    Ok(rate)
}

/// Fee for `tx` at `rate`, estimating signed size
///
/// Inputs without a witness get a 64-byte placeholder, the size of a default-sighash Schnorr
/// signature. Returns 0 for a transaction without inputs or outputs, or a zero rate.
pub fn vsize_fee(tx: &Transaction, rate: FeeRateConfig) -> u64 {
    if tx.input.is_empty() || tx.output.is_empty() || rate.sat_per_vb == 0 {
        return 0;
    }

    let vsize = estimated_vsize(tx);
    (vsize as u64).saturating_mul(rate.sat_per_vb)
}

/// Virtual size of `tx` once every input carries a key-path signature
pub fn estimated_vsize(tx: &Transaction) -> usize {
    let mut sized = tx.clone();
    for input in sized.input.iter_mut() {
        if input.witness.is_empty() {
            input.witness.push([0u8; PLACEHOLDER_SIGNATURE_LEN]);
        }
    }
    sized.vsize()
}

/// Two-pass fee estimate for spending all `utxos`
///
/// `rate` is fetched once by the caller and reused for both passes.
pub fn calculate_final_fee(
    utxos: &[Utxo],
    sender: &Address,
    recipient: &Address,
    amount: u64,
    rate: FeeRateConfig,
) -> Result<u64, BuildError> {
    let tx_no_change = build_transaction(utxos, sender, recipient, amount, 0, false)?;
    let base_fee = vsize_fee(&tx_no_change, rate);

    let tx_with_change = build_transaction(utxos, sender, recipient, amount, base_fee, true)?;
    let final_fee = vsize_fee(&tx_with_change, rate);

    log::debug!(
        "Fee estimate: base_fee={} ({} outputs), final_fee={} ({} outputs)",
        base_fee,
        tx_no_change.output.len(),
        final_fee,
        tx_with_change.output.len()
    );

    Ok(final_fee)
}

/// Whether `total` covers `amount + fee`
pub fn sufficient_funds(total: u64, amount: u64, fee: u64) -> bool {
    amount
        .checked_add(fee)
        .map(|required| total >= required)
        .unwrap_or(false)
}
