//! Mercado Pago webhook signature verification.
//!
//! The signature is an HMAC-SHA256 of the exact request body, keyed with the
//! shared webhook secret. The `x-signature` header carries it either as a
//! bare hex digest or as `ts=<n>,v1=<hex>` pairs.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::webhook_errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 digest length in bytes.
const DIGEST_LEN: usize = 32;

/// Timestamps above this are milliseconds.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Maximum allowed clock skew for future signatures (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components of the `x-signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp in seconds, when the header carried one.
    pub timestamp: Option<i64>,
    /// v1 signature (HMAC-SHA256).
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses an `x-signature` header value.
    ///
    /// Format: `<hex>` or `ts=<timestamp>,v1=<hex>[,<other>=<value>]`
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::MalformedSignature` if the header format is invalid.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let header = header.trim();
        if header.is_empty() {
            return Err(malformed("empty signature header"));
        }

        if !header.contains('=') && !header.contains(',') {
            return Ok(SignatureHeader {
                timestamp: None,
                v1_signature: decode_digest(header)?,
            });
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| malformed("invalid header format"))?;

            match key.trim() {
                "ts" | "t" => {
                    if timestamp.is_some() {
                        return Err(malformed("duplicate timestamp"));
                    }
                    let ts: i64 = value
                        .trim()
                        .parse()
                        .map_err(|_| malformed("invalid timestamp"))?;
                    timestamp = Some(normalize_timestamp(ts));
                }
                "v1" => {
                    if v1_signature.is_some() {
                        return Err(malformed("duplicate v1 signature"));
                    }
                    v1_signature = Some(decode_digest(value.trim())?);
                }
                _ => {}
            }
        }

        let v1_signature = v1_signature.ok_or_else(|| malformed("missing v1 signature"))?;

        Ok(SignatureHeader {
            timestamp,
            v1_signature,
        })
    }
}

fn malformed(reason: &str) -> WebhookError {
    WebhookError::MalformedSignature(reason.to_string())
}

fn decode_digest(value: &str) -> Result<Vec<u8>, WebhookError> {
    let bytes = hex::decode(value).map_err(|_| malformed("invalid v1 signature hex"))?;
    if bytes.len() != DIGEST_LEN {
        return Err(malformed("unexpected signature length"));
    }
    Ok(bytes)
}

fn normalize_timestamp(ts: i64) -> i64 {
    if ts > MILLIS_THRESHOLD {
        ts / 1000
    } else {
        ts
    }
}

/// Verifier for Mercado Pago webhook signatures.
pub struct WebhookSignatureVerifier {
    secret: SecretString,
    max_age_secs: Option<i64>,
    log_digests: bool,
}

impl WebhookSignatureVerifier {
    /// Creates a verifier for the given webhook secret.
    ///
    /// # Errors
    ///
    /// `MissingSecret` if the secret is blank.
    pub fn new(secret: SecretString) -> Result<Self, WebhookError> {
        if secret.expose_secret().trim().is_empty() {
            return Err(WebhookError::MissingSecret);
        }
        Ok(Self {
            secret,
            max_age_secs: None,
            log_digests: false,
        })
    }

    /// Enables the replay window for headers that carry a timestamp.
    pub fn with_max_age_secs(mut self, max_age_secs: Option<u64>) -> Self {
        self.max_age_secs = max_age_secs.map(|secs| i64::try_from(secs).unwrap_or(i64::MAX));
        self
    }

    /// Logs received and expected digests at debug level on mismatch.
    pub fn with_digest_logging(mut self, enabled: bool) -> Self {
        self.log_digests = enabled;
        self
    }

    /// Checks the signature header against the raw request body.
    ///
    /// # Errors
    ///
    /// - `MalformedSignature` - header could not be parsed
    /// - `SignatureExpired` - timestamp outside the replay window
    /// - `SignatureMismatch` - digest does not match the body
    pub fn check(&self, raw_body: &[u8], signature_header: &str) -> Result<(), WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        if let (Some(max_age), Some(timestamp)) = (self.max_age_secs, header.timestamp) {
            validate_timestamp(timestamp, max_age, chrono::Utc::now().timestamp())?;
        }

        let expected = compute_signature(self.secret.expose_secret().as_bytes(), raw_body);

        if !constant_time_compare(&expected, &header.v1_signature) {
            if self.log_digests {
                tracing::debug!(
                    received = %hex::encode(&header.v1_signature),
                    expected = %hex::encode(&expected),
                    "Webhook signature mismatch"
                );
            }
            return Err(WebhookError::SignatureMismatch);
        }

        Ok(())
    }
}

/// Validates that the timestamp is within the replay window.
fn validate_timestamp(timestamp: i64, max_age_secs: i64, now: i64) -> Result<(), WebhookError> {
    let age = now.saturating_sub(timestamp);

    if age > max_age_secs || age < -MAX_CLOCK_SKEW_SECS {
        return Err(WebhookError::SignatureExpired);
    }

    Ok(())
}

/// Returns true when `signature_header` carries a valid HMAC-SHA256 of
/// `raw_body` under `secret`. Malformed headers and blank secrets verify false.
pub fn verify(raw_body: &[u8], signature_header: &str, secret: &str) -> bool {
    if secret.trim().is_empty() {
        return false;
    }
    match SignatureHeader::parse(signature_header) {
        Ok(header) => constant_time_compare(
            &compute_signature(secret.as_bytes(), raw_body),
            &header.v1_signature,
        ),
        Err(_) => false,
    }
}

/// Hex-encoded HMAC-SHA256 of `payload`, in the bare header format.
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    hex::encode(compute_signature(secret.as_bytes(), payload))
}

fn compute_signature(secret: &[u8], payload: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length; an empty digest never compares equal.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return Vec::new();
    };
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "mp_webhook_test_secret";
    const BODY: &str = r#"{"type":"payment","data":{"id":"123","status":"approved"}}"#;

    fn verifier() -> WebhookSignatureVerifier {
        WebhookSignatureVerifier::new(SecretString::new(TEST_SECRET.to_string())).unwrap()
    }

    // ══════════════════════════════════════════════════════════════
    // SignatureHeader Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_bare_hex_digest() {
        let header = SignatureHeader::parse(&"a".repeat(64)).unwrap();

        assert_eq!(header.timestamp, None);
        assert_eq!(header.v1_signature.len(), 32);
    }

    #[test]
    fn parse_structured_header() {
        let header_str = format!("ts=1704067200,v1={}", "b".repeat(64));

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, Some(1704067200));
        assert_eq!(header.v1_signature.len(), 32);
    }

    #[test]
    fn parse_header_tolerates_spaces() {
        let header_str = format!("ts=1704067200, v1={}", "b".repeat(64));

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, Some(1704067200));
    }

    #[test]
    fn parse_header_converts_millisecond_timestamp() {
        let header_str = format!("ts=1704067200000,v1={}", "b".repeat(64));

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, Some(1704067200));
    }

    #[test]
    fn parse_header_ignores_unknown_fields() {
        let header_str = format!("ts=1,v1={},v2=future,scheme=hmac", "a".repeat(64));

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.v1_signature.len(), 32);
    }

    #[test]
    fn parse_header_without_timestamp_is_accepted() {
        let header_str = format!("v1={}", "a".repeat(64));

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, None);
    }

    #[test]
    fn parse_empty_header_fails() {
        let result = SignatureHeader::parse("   ");

        assert!(matches!(result, Err(WebhookError::MalformedSignature(_))));
    }

    #[test]
    fn parse_header_missing_v1_fails() {
        let result = SignatureHeader::parse("ts=1234567890");

        assert!(matches!(result, Err(WebhookError::MalformedSignature(_))));
    }

    #[test]
    fn parse_header_duplicate_v1_fails() {
        let sig = "a".repeat(64);
        let result = SignatureHeader::parse(&format!("v1={},v1={}", sig, sig));

        assert!(matches!(result, Err(WebhookError::MalformedSignature(_))));
    }

    #[test]
    fn parse_header_segment_without_equals_fails() {
        let result = SignatureHeader::parse(&format!("ts1234567890,v1={}", "a".repeat(64)));

        assert!(matches!(result, Err(WebhookError::MalformedSignature(_))));
    }

    #[test]
    fn parse_header_invalid_hex_fails() {
        let result = SignatureHeader::parse("ts=1234567890,v1=not_valid_hex");

        assert!(matches!(result, Err(WebhookError::MalformedSignature(_))));
    }

    #[test]
    fn parse_header_wrong_length_fails() {
        let result = SignatureHeader::parse(&"a".repeat(40));

        assert!(matches!(result, Err(WebhookError::MalformedSignature(_))));
    }

    #[test]
    fn parse_header_invalid_timestamp_fails() {
        let result =
            SignatureHeader::parse(&format!("ts=not_a_number,v1={}", "a".repeat(64)));

        assert!(matches!(result, Err(WebhookError::MalformedSignature(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // verify() Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_accepts_bare_signature() {
        let signature = sign_payload(TEST_SECRET, BODY.as_bytes());

        assert!(verify(BODY.as_bytes(), &signature, TEST_SECRET));
    }

    #[test]
    fn verify_accepts_uppercase_hex() {
        let signature = sign_payload(TEST_SECRET, BODY.as_bytes()).to_uppercase();

        assert!(verify(BODY.as_bytes(), &signature, TEST_SECRET));
    }

    #[test]
    fn verify_accepts_structured_signature() {
        let signature = sign_payload(TEST_SECRET, BODY.as_bytes());
        let header = format!("ts=1704067200,v1={}", signature);

        assert!(verify(BODY.as_bytes(), &header, TEST_SECRET));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let signature = sign_payload("another_secret", BODY.as_bytes());

        assert!(!verify(BODY.as_bytes(), &signature, TEST_SECRET));
    }

    #[test]
    fn verify_rejects_tampered_body() {
        let signature = sign_payload(TEST_SECRET, BODY.as_bytes());
        let tampered = BODY.replace("123", "124");

        assert!(!verify(tampered.as_bytes(), &signature, TEST_SECRET));
    }

    #[test]
    fn verify_is_byte_exact() {
        let signature = sign_payload(TEST_SECRET, BODY.as_bytes());
        let reformatted = BODY.replace(':', ": ");

        assert!(!verify(reformatted.as_bytes(), &signature, TEST_SECRET));
    }

    #[test]
    fn verify_rejects_malformed_header() {
        assert!(!verify(BODY.as_bytes(), "", TEST_SECRET));
        assert!(!verify(BODY.as_bytes(), "zzzz", TEST_SECRET));
        assert!(!verify(BODY.as_bytes(), "v1=", TEST_SECRET));
    }

    #[test]
    fn verify_rejects_empty_secret() {
        let signature = sign_payload("", BODY.as_bytes());

        assert!(!verify(BODY.as_bytes(), &signature, ""));
    }

    #[test]
    fn verify_rejects_whitespace_secret() {
        let signature = sign_payload("   ", BODY.as_bytes());

        assert!(!verify(BODY.as_bytes(), &signature, "   "));
    }

    // ══════════════════════════════════════════════════════════════
    // WebhookSignatureVerifier Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn new_rejects_blank_secret() {
        let result = WebhookSignatureVerifier::new(SecretString::new("  ".to_string()));

        assert!(matches!(result, Err(WebhookError::MissingSecret)));
    }

    #[test]
    fn check_valid_signature() {
        let signature = sign_payload(TEST_SECRET, BODY.as_bytes());

        assert!(verifier().check(BODY.as_bytes(), &signature).is_ok());
    }

    #[test]
    fn check_mismatch_is_typed() {
        let result = verifier().check(BODY.as_bytes(), &"a".repeat(64));

        assert!(matches!(result, Err(WebhookError::SignatureMismatch)));
    }

    #[test]
    fn check_malformed_is_typed() {
        let result = verifier().check(BODY.as_bytes(), "v1=xyz");

        assert!(matches!(result, Err(WebhookError::MalformedSignature(_))));
    }

    #[test]
    fn check_ignores_old_timestamp_without_window() {
        let signature = sign_payload(TEST_SECRET, BODY.as_bytes());
        let header = format!("ts=1000,v1={}", signature);

        assert!(verifier().check(BODY.as_bytes(), &header).is_ok());
    }

    #[test]
    fn check_rejects_old_timestamp_with_window() {
        let signature = sign_payload(TEST_SECRET, BODY.as_bytes());
        let ts = chrono::Utc::now().timestamp() - 600;
        let header = format!("ts={},v1={}", ts, signature);

        let result = verifier()
            .with_max_age_secs(Some(300))
            .check(BODY.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::SignatureExpired)));
    }

    #[test]
    fn check_accepts_recent_timestamp_with_window() {
        let signature = sign_payload(TEST_SECRET, BODY.as_bytes());
        let ts = chrono::Utc::now().timestamp() - 30;
        let header = format!("ts={},v1={}", ts, signature);

        let result = verifier()
            .with_max_age_secs(Some(300))
            .check(BODY.as_bytes(), &header);

        assert!(result.is_ok());
    }

    #[test]
    fn check_window_skips_bare_header() {
        let signature = sign_payload(TEST_SECRET, BODY.as_bytes());

        let result = verifier()
            .with_max_age_secs(Some(300))
            .check(BODY.as_bytes(), &signature);

        assert!(result.is_ok());
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Validation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn timestamp_at_boundary_succeeds() {
        assert!(validate_timestamp(1_000, 300, 1_300).is_ok());
    }

    #[test]
    fn timestamp_just_past_boundary_fails() {
        let result = validate_timestamp(1_000, 300, 1_301);

        assert!(matches!(result, Err(WebhookError::SignatureExpired)));
    }

    #[test]
    fn timestamp_from_future_within_skew_succeeds() {
        assert!(validate_timestamp(1_030, 300, 1_000).is_ok());
    }

    #[test]
    fn timestamp_too_far_in_future_fails() {
        let result = validate_timestamp(1_120, 300, 1_000);

        assert!(matches!(result, Err(WebhookError::SignatureExpired)));
    }

    #[test]
    fn constant_time_compare_requires_equal_length() {
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2]));
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
    }
}
