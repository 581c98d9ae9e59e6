use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn keyed_mac(key: &[u8], parts: &[&[u8]]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    // Parts are fed back to back: the vendor signs a plain concatenation.
    for part in parts {
        mac.update(part);
    }
    mac
}

/// Compute HMAC-SHA256 over the concatenation of `parts` using `key`.
/// Returns the standard base64 encoding of the MAC, which is what PayTR
/// sends and expects as `paytr_token` / `hash`.
pub fn compute_signature(key: &[u8], parts: &[&[u8]]) -> String {
    let result = keyed_mac(key, parts).finalize();
    STANDARD.encode(result.into_bytes())
}

/// Verify a base64 HMAC-SHA256 signature over the concatenation of `parts`.
///
/// Uses constant-time comparison. Signatures that are not valid base64 are
/// compared against zeros so that malformed input takes the same path as a
/// wrong signature.
pub fn verify_signature(key: &[u8], parts: &[&[u8]], signature: &str) -> bool {
    let mac = keyed_mac(key, parts);

    let expected = STANDARD
        .decode(signature)
        .unwrap_or_else(|_| vec![0u8; 32]);

    // verify_slice is constant-time and rejects length mismatches
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_roundtrip() {
        let key = b"test-secret";
        let parts = [b"merchant".as_slice(), b"ORD1".as_slice(), b"salt".as_slice()];
        let sig = compute_signature(key, &parts);
        assert!(verify_signature(key, &parts, &sig));
    }

    #[test]
    fn test_parts_are_concatenated_without_delimiter() {
        let key = b"test-secret";
        let split = compute_signature(key, &[b"ab".as_slice(), b"cd".as_slice()]);
        let joined = compute_signature(key, &[b"abcd".as_slice()]);
        assert_eq!(split, joined);
    }

    #[test]
    fn test_signature_wrong_key() {
        let sig = compute_signature(b"key-1", &[b"body".as_slice()]);
        assert!(!verify_signature(b"key-2", &[b"body".as_slice()], &sig));
    }

    #[test]
    fn test_signature_tampered_message() {
        let sig = compute_signature(b"key", &[b"original".as_slice()]);
        assert!(!verify_signature(b"key", &[b"tampered".as_slice()], &sig));
    }

    #[test]
    fn test_signature_invalid_base64() {
        assert!(!verify_signature(b"key", &[b"body".as_slice()], "not base64 ***"));
        assert!(!verify_signature(b"key", &[b"body".as_slice()], ""));
    }

    #[test]
    fn test_signature_with_surrounding_whitespace_is_rejected() {
        let parts = [b"body".as_slice()];
        let sig = compute_signature(b"key", &parts);
        assert!(!verify_signature(b"key", &parts, &format!(" {sig}\n")));
        assert!(!verify_signature(b"key", &parts, &format!("{sig} ")));
    }

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2, base64 encoded
        let parts = [b"what do ya want ".as_slice(), b"for nothing?".as_slice()];
        let sig = compute_signature(b"Jefe", &parts);
        assert_eq!(sig, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }
}
