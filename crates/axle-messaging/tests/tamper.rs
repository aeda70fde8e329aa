//! Property tests: flipping any bit of a signed message invalidates it

use axle_crypto::KeyPair;
use axle_messaging::{create_message, to_canonical_string, verify_message, MessageType, SignedMessage};
use proptest::prelude::*;
use serde_json::json;

fn signed(payload_text: &str, amount: u64) -> SignedMessage {
    let keypair = KeyPair::from_secret_bytes(&[42u8; 32]);
    create_message(
        &keypair,
        MessageType::Deliver,
        Some(KeyPair::from_secret_bytes(&[7u8; 32]).did()),
        json!({"result": payload_text, "amount": amount, "nested": {"z": [1, 2], "a": null}}),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn prop_payload_string_bitflip_detected(text in "[a-z]{1,32}", idx in any::<prop::sample::Index>(), bit in 0u8..7) {
        let message = signed(&text, 5);
        prop_assert!(verify_message(&message));

        let mut bytes = text.clone().into_bytes();
        let i = idx.index(bytes.len());
        bytes[i] ^= 1 << bit;
        // Keep it valid UTF-8 so only the signature check can reject it
        prop_assume!(bytes.is_ascii());
        let flipped = String::from_utf8(bytes).unwrap();

        let mut tampered = message.clone();
        tampered.payload["result"] = json!(flipped);
        prop_assert!(!verify_message(&tampered));
    }

    #[test]
    fn prop_signature_bitflip_detected(byte in 0usize..64, bit in 0u8..8) {
        let message = signed("ok", 1);
        let mut raw = bs58_decode(&message.signature);
        raw[byte] ^= 1 << bit;

        let mut tampered = message;
        tampered.signature = axle_crypto::Signature::from_slice(&raw).unwrap().to_base58();
        prop_assert!(!verify_message(&tampered));
    }

    #[test]
    fn prop_timestamp_change_detected(delta in 1i64..1_000_000) {
        let mut message = signed("ok", 1);
        message.timestamp += delta;
        prop_assert!(!verify_message(&message));
    }

    #[test]
    fn prop_wire_roundtrip_preserves_validity(text in "\\PC{0,40}", amount in any::<u64>()) {
        let message = signed(&text, amount);
        let parsed = SignedMessage::from_json(&message.to_json().unwrap()).unwrap();
        prop_assert!(verify_message(&parsed));
    }

    #[test]
    fn prop_integral_float_renders_as_integer(n in -(1i64 << 53)..(1i64 << 53)) {
        prop_assert_eq!(to_canonical_string(&json!(n as f64)), n.to_string());
        prop_assert_eq!(to_canonical_string(&json!({"a": n as f64})), format!(r#"{{"a":{}}}"#, n));
    }

    #[test]
    fn prop_float_payload_survives_wire(mantissa in any::<i32>(), scale in 0i32..7) {
        let price = mantissa as f64 / 10f64.powi(scale);
        let keypair = KeyPair::from_secret_bytes(&[42u8; 32]);
        let message = create_message(&keypair, MessageType::Offer, None, json!({"price": price})).unwrap();
        let parsed = SignedMessage::from_json(&message.to_json().unwrap()).unwrap();
        prop_assert!(verify_message(&parsed));
    }
}

fn bs58_decode(s: &str) -> Vec<u8> {
    axle_crypto::Signature::from_base58(s).unwrap().0.to_vec()
}
