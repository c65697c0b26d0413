//! Property tests for webhook signature verification.

use payment_webhook_receiver::domain::payment::{sign_payload, verify};
use proptest::prelude::*;

fn other_hex_digit(c: char) -> char {
    if c == '0' {
        '1'
    } else {
        '0'
    }
}

proptest! {
    #[test]
    fn prop_valid_signature_verifies(
        secret in "[a-zA-Z0-9_-]{1,64}",
        body in proptest::collection::vec(proptest::num::u8::ANY, 0..1000)
    ) {
        let signature = sign_payload(&secret, &body);
        prop_assert!(verify(&body, &signature, &secret));
    }

    #[test]
    fn prop_timestamped_header_verifies(
        secret in "[a-zA-Z0-9_-]{1,64}",
        body in proptest::collection::vec(proptest::num::u8::ANY, 0..1000),
        ts in 1_000_000_000i64..2_000_000_000i64
    ) {
        let header = format!("ts={},v1={}", ts, sign_payload(&secret, &body));
        prop_assert!(verify(&body, &header, &secret));
    }

    #[test]
    fn prop_signature_is_64_hex_chars(
        secret in "[a-zA-Z0-9_-]{1,64}",
        body in proptest::collection::vec(proptest::num::u8::ANY, 0..1000)
    ) {
        let signature = sign_payload(&secret, &body);
        prop_assert_eq!(signature.len(), 64);
        prop_assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn prop_flipped_signature_char_fails(
        secret in "[a-zA-Z0-9_-]{1,64}",
        body in proptest::collection::vec(proptest::num::u8::ANY, 0..1000),
        index in 0usize..64
    ) {
        let signature = sign_payload(&secret, &body);
        let mut chars: Vec<char> = signature.chars().collect();
        chars[index] = other_hex_digit(chars[index]);
        let tampered: String = chars.into_iter().collect();

        prop_assert!(!verify(&body, &tampered, &secret));
    }

    #[test]
    fn prop_flipped_body_byte_fails(
        secret in "[a-zA-Z0-9_-]{1,64}",
        body in proptest::collection::vec(proptest::num::u8::ANY, 1..1000),
        index in any::<prop::sample::Index>()
    ) {
        let signature = sign_payload(&secret, &body);
        let mut tampered = body.clone();
        let i = index.index(tampered.len());
        tampered[i] ^= 0x01;

        prop_assert!(!verify(&tampered, &signature, &secret));
    }

    #[test]
    fn prop_wrong_secret_fails(
        secret1 in "[a-zA-Z0-9_-]{1,64}",
        secret2 in "[a-zA-Z0-9_-]{1,64}",
        body in proptest::collection::vec(proptest::num::u8::ANY, 1..500)
    ) {
        prop_assume!(secret1 != secret2);
        let signature = sign_payload(&secret1, &body);
        prop_assert!(!verify(&body, &signature, &secret2));
    }

    #[test]
    fn prop_arbitrary_header_never_panics(
        header in "\\PC{0,200}",
        body in proptest::collection::vec(proptest::num::u8::ANY, 0..200)
    ) {
        let _ = verify(&body, &header, "secret");
    }
}
