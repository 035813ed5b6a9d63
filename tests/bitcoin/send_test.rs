//! End-to-end send pipeline tests against the mock Esplora

use bitcoin::consensus::encode::{deserialize_hex, serialize};
use bitcoin::{Amount, Network, Transaction};
use taproot_wallet::bitcoin::network::NetworkError;
use taproot_wallet::manager::{
    parse_btc_amount, parse_recipient, send_bitcoin, ManagerError, SendOutcome,
};
use taproot_wallet::config::NetworkType;
use taproot_wallet::storage::keys::KeyError;

use crate::common::{
    p2tr_script_hex, private_key, private_key_on, recipient_address, sender_key, signet_config,
    txid, MockEsplora,
};

fn funded_mock() -> MockEsplora {
    let key = sender_key(1);
    let script = p2tr_script_hex(&key);
    MockEsplora::new()
        .with_utxo(&txid(1), 0, 50_000, true, &script)
        .with_utxo(&txid(2), 0, 150_000, true, &script)
}

#[test]
fn test_send_spends_all_confirmed_utxos_with_change() {
    let client = funded_mock();
    let key = sender_key(1);
    let recipient = recipient_address();

    let outcome = send_bitcoin(
        &client,
        &signet_config(),
        &private_key(1),
        &recipient.to_string(),
        "0.001",
    )
    .expect("send succeeds");

    let receipt = match outcome {
        SendOutcome::Broadcast(receipt) => receipt,
        other => panic!("Expected broadcast, got {:?}", other),
    };
    assert_eq!(receipt.amount, 100_000);
    assert_eq!(receipt.fee, 1_060);
    assert_eq!(receipt.change, Some(98_940));
    assert_eq!(receipt.inputs, 2);
    assert_eq!(receipt.vsize, 212);

    assert_eq!(client.fee_calls(), 1, "Fee rate is fetched once per send");

    let broadcasts = client.broadcasts();
    assert_eq!(broadcasts.len(), 1);
    let tx: Transaction = deserialize_hex(&broadcasts[0]).expect("broadcast hex decodes");
    assert_eq!(receipt.txid, tx.compute_txid().to_string());

    assert_eq!(tx.input.len(), 2);
    assert_eq!(tx.input[0].previous_output.txid.to_string(), txid(1));
    assert_eq!(tx.input[1].previous_output.txid.to_string(), txid(2));
    assert!(tx.input.iter().all(|i| i.witness.len() == 1));

    assert_eq!(tx.output.len(), 2);
    assert_eq!(tx.output[0].value, Amount::from_sat(100_000));
    assert_eq!(tx.output[0].script_pubkey, recipient.script_pubkey());
    assert_eq!(tx.output[1].value, Amount::from_sat(98_940));
    assert_eq!(tx.output[1].script_pubkey, key.script_pubkey());
}

#[test]
fn test_unconfirmed_only_ends_before_fee_lookup() {
    let key = sender_key(1);
    let client = MockEsplora::new().with_utxo(&txid(1), 0, 500_000, false, &p2tr_script_hex(&key));

    let outcome = send_bitcoin(
        &client,
        &signet_config(),
        &private_key(1),
        &recipient_address().to_string(),
        "0.001",
    )
    .expect("no spendable coins is not an error");

    assert_eq!(outcome, SendOutcome::NoSpendableUtxos);
    assert_eq!(client.fee_calls(), 0);
    assert!(client.broadcasts().is_empty());
}

#[test]
fn test_foreign_outputs_are_not_spent() {
    let ours = sender_key(1);
    let theirs = sender_key(2);
    let client = MockEsplora::new()
        .with_utxo(&txid(1), 0, 150_000, true, &p2tr_script_hex(&ours))
        .with_utxo(&txid(2), 0, 900_000, true, &p2tr_script_hex(&theirs));

    let outcome = send_bitcoin(
        &client,
        &signet_config(),
        &private_key(1),
        &recipient_address().to_string(),
        "0.001",
    )
    .expect("send succeeds");

    let SendOutcome::Broadcast(receipt) = outcome else {
        panic!("Expected broadcast, got {:?}", outcome);
    };
    assert_eq!(receipt.inputs, 1);

    let tx: Transaction = deserialize_hex(&client.broadcasts()[0]).expect("decodes");
    assert_eq!(tx.input[0].previous_output.txid.to_string(), txid(1));
}

#[test]
fn test_insufficient_funds_is_not_broadcast() {
    let client = funded_mock();

    let outcome = send_bitcoin(
        &client,
        &signet_config(),
        &private_key(1),
        &recipient_address().to_string(),
        "0.002",
    )
    .expect("insufficient funds is not an error");

    // 2 inputs, no room for change: 169 vB * 5 sat/vB
    assert_eq!(
        outcome,
        SendOutcome::InsufficientFunds {
            required: 200_845,
            available: 200_000,
        }
    );
    assert!(client.broadcasts().is_empty());
}

#[test]
fn test_broadcast_rejection_is_reported() {
    let client = funded_mock().with_broadcast_failure(400, "sendrawtransaction RPC error");

    let result = send_bitcoin(
        &client,
        &signet_config(),
        &private_key(1),
        &recipient_address().to_string(),
        "0.001",
    );

    match result {
        Err(ManagerError::Network(NetworkError::Status { status, body })) => {
            assert_eq!(status, 400);
            assert!(body.contains("sendrawtransaction"));
        }
        other => panic!("Expected broadcast status error, got {:?}", other),
    }
    assert_eq!(client.broadcasts().len(), 1, "Broadcast is not retried");
}

#[test]
fn test_missing_fastest_fee_uses_minimum_rate() {
    let client = funded_mock().with_fastest_fee(None);

    let outcome = send_bitcoin(
        &client,
        &signet_config(),
        &private_key(1),
        &recipient_address().to_string(),
        "0.001",
    )
    .expect("send succeeds");

    let SendOutcome::Broadcast(receipt) = outcome else {
        panic!("Expected broadcast, got {:?}", outcome);
    };
    assert_eq!(receipt.fee, 212 * 2);
}

#[test]
fn test_invalid_amounts_make_no_requests() {
    for amount in ["-0.1", "abc", "0", "", "0.000000001"] {
        let client = funded_mock();
        let result = send_bitcoin(
            &client,
            &signet_config(),
            &private_key(1),
            &recipient_address().to_string(),
            amount,
        );

        assert!(
            matches!(result, Err(ManagerError::InvalidAmount(_))),
            "'{}' must be rejected, got {:?}",
            amount,
            result
        );
        assert!(client.calls().is_empty(), "'{}' reached the network", amount);
    }
}

#[test]
fn test_recipient_on_other_network_is_rejected() {
    let client = funded_mock();
    let mainnet = taproot_wallet::bitcoin::SenderKey::from_private_key(
        &private_key_on(0x42, Network::Bitcoin),
        NetworkType::Mainnet,
    )
    .expect("mainnet key");

    let result = send_bitcoin(
        &client,
        &signet_config(),
        &private_key(1),
        &mainnet.address().to_string(),
        "0.001",
    );

    assert!(matches!(result, Err(ManagerError::InvalidAddress(_))));
    assert!(client.calls().is_empty());
}

#[test]
fn test_key_for_other_network_is_rejected() {
    let client = funded_mock();

    let result = send_bitcoin(
        &client,
        &signet_config(),
        &private_key_on(1, Network::Bitcoin),
        &recipient_address().to_string(),
        "0.001",
    );

    assert!(matches!(
        result,
        Err(ManagerError::Key(KeyError::NetworkMismatch { .. }))
    ));
    assert!(client.calls().is_empty());
}

#[test]
fn test_parse_btc_amount() {
    assert_eq!(parse_btc_amount("0.001").expect("valid"), 100_000);
    assert_eq!(parse_btc_amount(" 1 ").expect("valid"), 100_000_000);
    assert_eq!(parse_btc_amount("0.00000001").expect("valid"), 1);
    assert!(parse_btc_amount("1.5 BTC").is_err());
}

#[test]
fn test_parse_recipient() {
    let recipient = recipient_address().to_string();
    assert!(recipient.starts_with("tb1p"));

    let parsed = parse_recipient(&recipient, NetworkType::Signet).expect("signet address");
    assert_eq!(parsed.to_string(), recipient);
    assert!(parse_recipient(&recipient, NetworkType::Mainnet).is_err());
    assert!(parse_recipient("not-an-address", NetworkType::Signet).is_err());
}

#[test]
fn test_values_beyond_supply_are_never_spent() {
    let key = sender_key(1);
    let script = p2tr_script_hex(&key);
    let huge = u64::MAX / 2 + 1;
    let client = MockEsplora::new()
        .with_utxo(&txid(1), 0, huge, true, &script)
        .with_utxo(&txid(2), 0, huge, true, &script);

    let outcome = send_bitcoin(
        &client,
        &signet_config(),
        &private_key(1),
        &recipient_address().to_string(),
        "0.001",
    )
    .expect("oversized values are dropped, not fatal");

    assert_eq!(outcome, SendOutcome::NoSpendableUtxos);
    assert_eq!(client.fee_calls(), 0);
    assert!(client.broadcasts().is_empty());
}

#[test]
fn test_esplora_txid_is_reversed_on_the_wire() {
    let key = sender_key(1);
    let display_txid = "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff";
    let client = MockEsplora::new().with_utxo(display_txid, 1, 200_000, true, &p2tr_script_hex(&key));

    let outcome = send_bitcoin(
        &client,
        &signet_config(),
        &private_key(1),
        &recipient_address().to_string(),
        "0.001",
    )
    .expect("send succeeds");
    assert!(matches!(outcome, SendOutcome::Broadcast(_)));

    let tx: Transaction = deserialize_hex(&client.broadcasts()[0]).expect("decodes");
    let outpoint = tx.input[0].previous_output;
    assert_eq!(outpoint.txid.to_string(), display_txid);
    assert_eq!(outpoint.vout, 1);

    // Wire order is the display hex reversed, followed by the little-endian vout
    let mut expected = hex::decode(display_txid).expect("hex");
    expected.reverse();
    expected.extend_from_slice(&1u32.to_le_bytes());
    assert_eq!(serialize(&outpoint), expected);
    assert_eq!(serialize(&outpoint)[0], 0xff);
}
