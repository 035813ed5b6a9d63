//! Common test utilities for taproot-wallet integration tests
//!
//! This module provides shared test infrastructure including:
//! - `MockEsplora`, an in-memory Esplora API that records every call
//! - Deterministic keys, addresses and txids
//! - Helpers to fund the mock with Taproot and non-Taproot outputs

#![allow(dead_code)]

use bitcoin::consensus::encode::deserialize_hex;
use bitcoin::secp256k1::SecretKey;
use bitcoin::{Address, Network, PrivateKey, Transaction};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use taproot_wallet::bitcoin::network::{
    AddressUtxo, EsploraApi, EsploraTx, EsploraTxOut, NetworkError, RecommendedFees, TxStatus,
};
use taproot_wallet::bitcoin::{SenderKey, Utxo};
use taproot_wallet::config::{BitcoinConfig, NetworkType};

/// A recorded Esplora request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AddressUtxos(String),
    Tx(String),
    Fees,
    Broadcast(String),
}

/// In-memory Esplora API
///
/// Serves a fixed UTXO list, funding transactions and fee recommendation. Broadcast returns
/// the txid of the decoded transaction unless a failure is configured.
#[derive(Default)]
pub struct MockEsplora {
    utxos: Vec<AddressUtxo>,
    txs: HashMap<String, EsploraTx>,
    fees: RecommendedFees,
    fail_listing: bool,
    failing_txids: HashSet<String>,
    broadcast_failure: Option<(u16, String)>,
    calls: Mutex<Vec<Call>>,
}

impl MockEsplora {
    pub fn new() -> Self {
        Self {
            fees: RecommendedFees {
                fastest_fee: Some(5),
                half_hour_fee: Some(3),
                hour_fee: Some(2),
                economy_fee: Some(1),
                minimum_fee: Some(1),
            },
            ..Self::default()
        }
    }

    /// Add a UTXO whose funding output at `vout` has locking script `script_hex`
    ///
    /// Outputs before `vout` in the funding transaction are filled with P2WPKH dummies.
    pub fn with_utxo(
        mut self,
        txid: &str,
        vout: u32,
        value: u64,
        confirmed: bool,
        script_hex: &str,
    ) -> Self {
        self.utxos.push(AddressUtxo {
            txid: txid.to_string(),
            vout,
            value,
            status: TxStatus {
                confirmed,
                block_height: confirmed.then_some(200_000),
                block_hash: None,
                block_time: None,
            },
        });

        let tx = self.txs.entry(txid.to_string()).or_insert_with(|| EsploraTx {
            txid: txid.to_string(),
            vout: Vec::new(),
            status: TxStatus::default(),
        });
        while tx.vout.len() <= vout as usize {
            tx.vout.push(EsploraTxOut {
                scriptpubkey: Some(format!("0014{}", "ab".repeat(20))),
                scriptpubkey_type: Some("v0_p2wpkh".to_string()),
                scriptpubkey_address: None,
                value: 1_000,
            });
        }
        tx.vout[vout as usize] = EsploraTxOut {
            scriptpubkey: Some(script_hex.to_string()),
            scriptpubkey_type: None,
            scriptpubkey_address: None,
            value,
        };
        self
    }

    /// Add a listed UTXO whose funding transaction has fewer outputs than `vout`
    pub fn with_dangling_utxo(mut self, txid: &str, vout: u32, value: u64) -> Self {
        self.utxos.push(AddressUtxo {
            txid: txid.to_string(),
            vout,
            value,
            status: TxStatus {
                confirmed: true,
                ..TxStatus::default()
            },
        });
        self.txs.insert(
            txid.to_string(),
            EsploraTx {
                txid: txid.to_string(),
                vout: Vec::new(),
                status: TxStatus::default(),
            },
        );
        self
    }

    pub fn with_fastest_fee(mut self, rate: Option<u64>) -> Self {
        self.fees.fastest_fee = rate;
        self
    }

    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    pub fn with_failing_tx(mut self, txid: &str) -> Self {
        self.failing_txids.insert(txid.to_string());
        self
    }

    pub fn with_broadcast_failure(mut self, status: u16, body: &str) -> Self {
        self.broadcast_failure = Some((status, body.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn count<F: Fn(&Call) -> bool>(&self, predicate: F) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    pub fn fee_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Fees))
    }

    pub fn tx_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Tx(_)))
    }

    /// Raw hex of every broadcast transaction
    pub fn broadcasts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Broadcast(hex) => Some(hex),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl EsploraApi for MockEsplora {
    fn get_address_utxos(&self, address: &str) -> Result<Vec<AddressUtxo>, NetworkError> {
        self.record(Call::AddressUtxos(address.to_string()));
        if self.fail_listing {
            return Err(NetworkError::Timeout);
        }
        Ok(self.utxos.clone())
    }

    fn get_tx(&self, txid: &str) -> Result<EsploraTx, NetworkError> {
        self.record(Call::Tx(txid.to_string()));
        if self.failing_txids.contains(txid) {
            return Err(NetworkError::Request("connection reset".to_string()));
        }
        self.txs.get(txid).cloned().ok_or(NetworkError::Status {
            status: 404,
            body: "Transaction not found".to_string(),
        })
    }

    fn get_recommended_fees(&self) -> Result<RecommendedFees, NetworkError> {
        self.record(Call::Fees);
        Ok(self.fees.clone())
    }

    fn broadcast(&self, tx_hex: &str) -> Result<String, NetworkError> {
        self.record(Call::Broadcast(tx_hex.to_string()));
        if let Some((status, body)) = &self.broadcast_failure {
            return Err(NetworkError::Status {
                status: *status,
                body: body.clone(),
            });
        }
        let tx: Transaction =
            deserialize_hex(tx_hex).map_err(|e| NetworkError::Parse(e.to_string()))?;
        Ok(tx.compute_txid().to_string())
    }
}

/// Deterministic private key for the given network
pub fn private_key_on(byte: u8, network: Network) -> PrivateKey {
    let secret = SecretKey::from_slice(&[byte; 32]).expect("valid secret key bytes");
    PrivateKey::new(secret, network)
}

/// Deterministic signet private key
pub fn private_key(byte: u8) -> PrivateKey {
    private_key_on(byte, Network::Signet)
}

/// Deterministic signet sender key
pub fn sender_key(byte: u8) -> SenderKey {
    SenderKey::from_private_key(&private_key(byte), NetworkType::Signet)
        .expect("signet key derives")
}

/// Signet P2TR address of another key, used as the payment destination
pub fn recipient_address() -> Address {
    sender_key(0x42).address().clone()
}

/// Hex of the key's locking script
pub fn p2tr_script_hex(key: &SenderKey) -> String {
    hex::encode(key.script_pubkey().as_bytes())
}

/// Deterministic txid hex
pub fn txid(n: u8) -> String {
    hex::encode([n; 32])
}

pub fn signet_config() -> BitcoinConfig {
    BitcoinConfig::for_network(NetworkType::Signet)
}

/// A confirmed UTXO already verified as locked to `key`
pub fn owned_utxo(key: &SenderKey, n: u8, value: u64) -> Utxo {
    Utxo {
        txid: txid(n),
        vout: 0,
        value,
        confirmed: true,
        locking_script: Some(key.script_pubkey()),
        verified_output_key: Some(key.output_key_bytes()),
    }
}
