// HMAC-SHA256 receipt signing and multi-candidate verification

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::receipts::keys::KeyRegistry;
use crate::receipts::ReceiptStatus;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded SHA256 of input bytes. Callers hash sensitive input before it
/// reaches transport or storage; the digest is the only reference kept.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Signs and verifies receipt attestations against a key registry.
pub struct ReceiptSigner {
    registry: KeyRegistry,
}

impl ReceiptSigner {
    pub fn new(registry: KeyRegistry) -> Self {
        Self { registry }
    }

    /// Sign the canonical payload `input_hash|timestamp|status` with the
    /// secret resolved for `key_version` (active version when none is
    /// supplied). Returns the lowercase hex signature and the version label
    /// the receipt should carry.
    pub fn sign(
        &self,
        input_hash: &str,
        timestamp: &str,
        status: ReceiptStatus,
        key_version: Option<&str>,
    ) -> (String, String) {
        let version = key_version.unwrap_or_else(|| self.registry.active_version());
        let secret = self.registry.resolve(version);
        let signature = hmac_hex(secret, input_hash, timestamp, status.as_str());
        (signature, version.to_string())
    }

    /// Verify a signature against the supplied version's secret, then the
    /// active secret, then every retired secret. `status` is taken as a free
    /// string so tampered wire input is checked exactly as presented; a
    /// mismatch is an expected outcome, never an error.
    pub fn verify(
        &self,
        input_hash: &str,
        timestamp: &str,
        status: &str,
        signature: &str,
        key_version: &str,
    ) -> bool {
        let candidates = [
            self.registry.resolve(key_version),
            self.registry.active_secret(),
        ];
        for secret in candidates {
            let expected = hmac_hex(secret, input_hash, timestamp, status);
            if digests_match(&expected, signature) {
                return true;
            }
        }
        for retired in self.registry.retired_secrets() {
            let expected = hmac_hex(retired, input_hash, timestamp, status);
            if digests_match(&expected, signature) {
                return true;
            }
        }
        false
    }
}

fn hmac_hex(secret: &str, input_hash: &str, timestamp: &str, status: &str) -> String {
    let payload = format!("{}|{}|{}", input_hash, timestamp, status);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    let digest = mac.finalize().into_bytes();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

// Constant-time comparison of hex digests; unequal lengths compare unequal
fn digests_match(expected: &str, supplied: &str) -> bool {
    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> ReceiptSigner {
        ReceiptSigner::new(KeyRegistry::new("v1", "devsecret", vec![]))
    }

    #[test]
    fn test_sign_and_verify_round_trip() {
        let signer = signer();
        let hash = sha256_hex(b"sensitive input");
        let ts = "2025-01-15T09:30:00.000000Z";

        let (sig, version) = signer.sign(&hash, ts, ReceiptStatus::NotYetDeleted, None);
        assert_eq!(version, "v1");
        assert!(signer.verify(&hash, ts, "not_yet_deleted", &sig, &version));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let signer = signer();
        let (a, _) = signer.sign("abc", "t1", ReceiptStatus::Deleted, None);
        let (b, _) = signer.sign("abc", "t1", ReceiptStatus::Deleted, None);
        assert_eq!(a, b);
        assert_eq!(a, a.to_lowercase());
    }

    #[test]
    fn test_tampered_status_invalidates_signature() {
        let signer = signer();
        let (sig, version) = signer.sign("abc", "t1", ReceiptStatus::NotYetDeleted, None);
        assert!(!signer.verify("abc", "t1", "deleted", &sig, &version));
    }

    #[test]
    fn test_tampered_hash_and_timestamp_invalidate_signature() {
        let signer = signer();
        let (sig, version) = signer.sign("abc", "t1", ReceiptStatus::NotYetDeleted, None);
        assert!(!signer.verify("abd", "t1", "not_yet_deleted", &sig, &version));
        assert!(!signer.verify("abc", "t2", "not_yet_deleted", &sig, &version));
    }

    #[test]
    fn test_retired_secret_still_verifies_after_rotation() {
        let old_signer = signer();
        let (sig, version) = old_signer.sign("abc", "t1", ReceiptStatus::NotYetDeleted, None);

        let mut registry = KeyRegistry::new("v1", "devsecret", vec![]);
        registry.rotate("v2", "newsecret");
        let rotated = ReceiptSigner::new(registry);

        // The receipt still names v1, which now resolves to the new secret;
        // verification falls through to the retired list.
        assert!(rotated.verify("abc", "t1", "not_yet_deleted", &sig, &version));
    }

    #[test]
    fn test_unknown_version_signs_with_active_secret() {
        let signer = signer();
        let (sig, version) = signer.sign("abc", "t1", ReceiptStatus::NotYetDeleted, Some("v9"));
        // The receipt echoes the supplied label even though it resolved to
        // the active secret
        assert_eq!(version, "v9");
        assert!(signer.verify("abc", "t1", "not_yet_deleted", &sig, "v9"));
    }

    #[test]
    fn test_garbage_signature_rejected() {
        let signer = signer();
        assert!(!signer.verify("abc", "t1", "not_yet_deleted", "beef", "v1"));
        assert!(!signer.verify("abc", "t1", "not_yet_deleted", "", "v1"));
    }

    #[test]
    fn test_sha256_hex_format() {
        let digest = sha256_hex(b"hello");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
