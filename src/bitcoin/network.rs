//! Bitcoin network layer using the Esplora HTTP API

use crate::config::{BitcoinConfig, NetworkType};
use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Errors that can occur during network operations
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Network request failed: {0}")]
    Request(String),

    #[error("Esplora returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse Esplora response: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Connection timeout")]
    Timeout,
}

/// Confirmation status attached to Esplora UTXOs and transactions
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TxStatus {
    #[serde(default)]
    pub confirmed: bool,
    pub block_height: Option<u32>,
    pub block_hash: Option<String>,
    pub block_time: Option<u64>,
}

/// Entry of `GET address/{addr}/utxo`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressUtxo {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    #[serde(default)]
    pub status: TxStatus,
}

/// Output entry of `GET tx/{txid}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EsploraTxOut {
    /// Locking script, hex encoded
    pub scriptpubkey: Option<String>,
    pub scriptpubkey_type: Option<String>,
    pub scriptpubkey_address: Option<String>,
    #[serde(default)]
    pub value: u64,
}

/// Body of `GET tx/{txid}`; only the fields the wallet reads
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EsploraTx {
    pub txid: String,
    #[serde(default)]
    pub vout: Vec<EsploraTxOut>,
    #[serde(default)]
    pub status: TxStatus,
}

/// Body of `GET v1/fees/recommended` (mempool.space extension), in sat/vB
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedFees {
    pub fastest_fee: Option<u64>,
    pub half_hour_fee: Option<u64>,
    pub hour_fee: Option<u64>,
    pub economy_fee: Option<u64>,
    pub minimum_fee: Option<u64>,
}

/// Block explorer operations the send pipeline depends on
///
/// Implemented by [`EsploraClient`] over HTTP; tests substitute an in-memory source.
pub trait EsploraApi: Send + Sync {
    /// `GET address/{address}/utxo`
    fn get_address_utxos(&self, address: &str) -> Result<Vec<AddressUtxo>, NetworkError>;

    /// `GET tx/{txid}`
    fn get_tx(&self, txid: &str) -> Result<EsploraTx, NetworkError>;

    /// `GET v1/fees/recommended`
    fn get_recommended_fees(&self) -> Result<RecommendedFees, NetworkError>;

    /// `POST tx` with the raw transaction hex as body; returns the txid reported by the server
    fn broadcast(&self, tx_hex: &str) -> Result<String, NetworkError>;
}

/// Esplora client for blockchain queries
///
/// Provides a blocking interface to an Esplora-compatible server (mempool.space, blockstream,
/// or a local electrs). Configured with a network-specific base URL.
pub struct EsploraClient {
    /// Underlying HTTP client
    client: Client,

    /// Network type
    network: NetworkType,

    /// Esplora server base URL, without trailing slash
    url: String,
}

impl EsploraClient {
    /// Create a new Esplora client with the default timeout
    ///
    /// # Example
    ///
    /// ```ignore
    /// use taproot_wallet::bitcoin::EsploraClient;
    /// use taproot_wallet::config::NetworkType;
    ///
    /// let client = EsploraClient::new("https://mempool.space/signet/api", NetworkType::Signet)?;
    /// ```
    pub fn new(url: &str, network: NetworkType) -> Result<Self, NetworkError> {
        Self::with_timeout(
            url,
            network,
            Duration::from_secs(crate::config::DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Create a new Esplora client with custom timeout
    pub fn with_timeout(
        url: &str,
        network: NetworkType,
        timeout: Duration,
    ) -> Result<Self, NetworkError> {
        let parsed = Url::parse(url).map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(NetworkError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                url,
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NetworkError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            network,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the Bitcoin section of the global configuration
    pub fn from_config(config: &BitcoinConfig) -> Result<Self, NetworkError> {
        Self::with_timeout(
            &config.esplora_url,
            config.network,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Create a new Esplora client with default network-specific URL
    pub fn new_with_default_url(network: NetworkType) -> Result<Self, NetworkError> {
        Self::new(&network.default_esplora_url(), network)
    }

    /// Get the network type
    pub fn network(&self) -> NetworkType {
        self.network
    }

    /// Get the Esplora server URL
    pub fn url(&self) -> &str {
        &self.url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NetworkError> {
        let url = self.endpoint(path);
        log::debug!("GET {}", url);
        let response = self.client.get(&url).send().map_err(map_transport_error)?;
        let body = read_success_body(response)?;
        serde_json::from_str(&body)
            .map_err(|e| NetworkError::Parse(format!("GET {}: {}", path, e)))
    }
}

impl EsploraApi for EsploraClient {
    fn get_address_utxos(&self, address: &str) -> Result<Vec<AddressUtxo>, NetworkError> {
        self.get_json(&format!("address/{}/utxo", address))
    }

    fn get_tx(&self, txid: &str) -> Result<EsploraTx, NetworkError> {
        self.get_json(&format!("tx/{}", txid))
    }

    fn get_recommended_fees(&self) -> Result<RecommendedFees, NetworkError> {
        self.get_json("v1/fees/recommended")
    }

    fn broadcast(&self, tx_hex: &str) -> Result<String, NetworkError> {
        let url = self.endpoint("tx");
        log::debug!("POST {} ({} bytes)", url, tx_hex.len() / 2);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(tx_hex.to_string())
            .send()
            .map_err(map_transport_error)?;
        let body = read_success_body(response)?;
        Ok(body.trim().to_string())
    }
}

fn map_transport_error(e: reqwest::Error) -> NetworkError {
    if e.is_timeout() {
        NetworkError::Timeout
    } else {
        NetworkError::Request(e.to_string())
    }
}

fn read_success_body(response: Response) -> Result<String, NetworkError> {
    let status = response.status();
    let body = response.text().map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(NetworkError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

impl std::fmt::Debug for EsploraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EsploraClient")
            .field("network", &self.network)
            .field("url", &self.url)
            .finish()
    }
}
