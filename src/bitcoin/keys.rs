//! Single-key Taproot address and output key derivation
//!
//! The wallet spends BIP86-style key-path outputs: the x-only internal key is tweaked with an
//! empty script tree, and the tweaked key is what appears in `OP_1 <32 bytes>`.

use crate::config::NetworkType;
use crate::storage::keys::KeyError;
use bitcoin::key::{Keypair, TapTweak, TweakedPublicKey};
use bitcoin::secp256k1::{schnorr, All, Message, Secp256k1};
use bitcoin::{Address, NetworkKind, PrivateKey, ScriptBuf};

/// Keys and address used by one send operation
///
/// Derived fresh from the loaded secret for every invocation. The tweaked keypair never leaves
/// this struct; only signatures do.
pub struct SenderKey {
    secp: Secp256k1<All>,

    /// Tweaked keypair that signs key-path spends
    keypair: Keypair,

    /// Tweaked x-only output key committed to by the address
    output_key: TweakedPublicKey,

    address: Address,

    network: NetworkType,
}

impl SenderKey {
    /// Derive the P2TR address and output key for a private key
    ///
    /// Fails with [`KeyError::NetworkMismatch`] if the key was encoded for a different network
    /// kind than `network` (e.g. a mainnet WIF on signet).
    pub fn from_private_key(key: &PrivateKey, network: NetworkType) -> Result<Self, KeyError> {
        let expected_kind = NetworkKind::from(network.to_bitcoin_network());
        if key.network != expected_kind {
            return Err(KeyError::NetworkMismatch {
                expected: network,
                key_kind: format!("{:?}", key.network),
            });
        }

        let secp = Secp256k1::new();
        let untweaked = Keypair::from_secret_key(&secp, &key.inner);
        let tweaked = untweaked.tap_tweak(&secp, None);
        let (output_key, _parity) = tweaked.public_parts();
        let keypair = Keypair::from(tweaked);
        let address = Address::p2tr_tweaked(output_key, network.to_bitcoin_network());

        Ok(Self {
            secp,
            keypair,
            output_key,
            address,
            network,
        })
    }

    /// The P2TR address receiving this key's funds
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The tweaked output key
    pub fn output_key(&self) -> TweakedPublicKey {
        self.output_key
    }

    /// The 32 raw bytes of the output key, as they appear in the locking script
    pub fn output_key_bytes(&self) -> [u8; 32] {
        self.output_key.serialize()
    }

    /// The locking script of this key's address (`0x51 0x20 || output_key`)
    pub fn script_pubkey(&self) -> ScriptBuf {
        ScriptBuf::new_p2tr_tweaked(self.output_key)
    }

    pub fn network(&self) -> NetworkType {
        self.network
    }

    pub fn secp(&self) -> &Secp256k1<All> {
        &self.secp
    }

    /// Schnorr-sign a signature hash with the tweaked key
    ///
    /// Uses BIP340 signing without auxiliary randomness, so signatures are deterministic.
    pub fn sign_schnorr(&self, msg: &Message) -> schnorr::Signature {
        self.secp.sign_schnorr_no_aux_rand(msg, &self.keypair)
    }
}

impl std::fmt::Debug for SenderKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SenderKey")
            .field("address", &self.address.to_string())
            .field("output_key", &hex::encode(self.output_key_bytes()))
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}
